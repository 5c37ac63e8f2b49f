//! Development server implementation.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tower_http::services::ServeDir;

use crate::rebuild::{BuildCommand, BuildOutcome};
use crate::watcher::{FileWatcher, WatchEvent, WatchTarget};
use crate::websocket::{
    inject_livereload_script, livereload_client_script, ReloadHub, ReloadMessage,
    LIVERELOAD_PATH, LIVERELOAD_SCRIPT_PATH,
};

/// Configuration for the development server.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Generated site to serve
    pub root: PathBuf,

    /// Sources whose changes trigger a rebuild
    pub watch: Vec<WatchTarget>,

    /// Build configuration file, reported separately when it changes
    pub config_file: Option<PathBuf>,

    /// Command that builds the site once
    pub build: BuildCommand,

    /// Port to listen on
    pub port: u16,

    /// Host to bind to
    pub host: String,

    /// Open browser on start
    pub open: bool,
}

impl DevServerConfig {
    /// Serve `root`, rebuilding with `build`, on the default address.
    pub fn new(root: impl Into<PathBuf>, build: BuildCommand) -> Self {
        Self {
            root: root.into(),
            watch: Vec::new(),
            config_file: None,
            build,
            port: 3000,
            host: "127.0.0.1".to_string(),
            open: false,
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to bind to {0}: {1}")]
    Bind(SocketAddr, String),

    #[error("File watch error: {0}")]
    Watch(String),

    #[error("Failed to start build: {0}")]
    Spawn(String),

    #[error("Server error: {0}")]
    Serve(String),
}

/// Shared server state.
struct ServerState {
    root: PathBuf,
    hub: ReloadHub,
}

/// Development server.
pub struct DevServer {
    config: DevServerConfig,
}

impl DevServer {
    pub fn new(config: DevServerConfig) -> Self {
        Self { config }
    }

    /// Build once, then serve and rebuild on change until the process exits.
    pub async fn start(self) -> Result<(), ServerError> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|_| {
                ServerError::InvalidAddress(format!("{}:{}", self.config.host, self.config.port))
            })?;

        let hub = ReloadHub::new();

        tracing::info!("Running initial build...");
        rebuild_or_report(&self.config.build, &hub).await;

        // ServeDir needs the root even when the first build failed
        tokio::fs::create_dir_all(&self.config.root)
            .await
            .map_err(|e| ServerError::Serve(format!("{}: {}", self.config.root.display(), e)))?;

        let (watcher, rx) = FileWatcher::new(
            &self.config.watch,
            std::slice::from_ref(&self.config.root),
            self.config.config_file.as_deref(),
        )
        .map_err(|e| ServerError::Watch(e.to_string()))?;

        let build = self.config.build.clone();
        let rebuild_hub = hub.clone();
        tokio::spawn(async move {
            rebuild_on_change(rx, &build, &rebuild_hub).await;
            // Keep watcher alive
            drop(watcher);
        });

        let state = Arc::new(ServerState {
            root: self.config.root.clone(),
            hub,
        });

        let app = Router::new()
            .route("/", get(index_handler))
            .route("/index.html", get(index_handler))
            .route(LIVERELOAD_PATH, get(ws_handler))
            .route(LIVERELOAD_SCRIPT_PATH, get(script_handler))
            .fallback_service(ServeDir::new(&self.config.root))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(addr, e.to_string()))?;

        tracing::info!("Serving {} at http://{}", self.config.root.display(), addr);

        if self.config.open {
            let url = format!("http://{}", addr);
            if let Err(e) = open::that(&url) {
                tracing::warn!("Failed to open browser: {}", e);
            }
        }

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Serve(e.to_string()))?;

        Ok(())
    }
}

/// Run one build and tell the browsers how it went.
async fn rebuild(build: &BuildCommand, hub: &ReloadHub) -> Result<BuildOutcome, ServerError> {
    let outcome = build.run().await?;

    match &outcome {
        BuildOutcome::Succeeded { duration } => {
            tracing::info!("Site rebuilt in {}ms", duration.as_millis());
            hub.send(ReloadMessage::Reload);
        }
        BuildOutcome::Failed { code, message } => {
            tracing::error!(
                "Build failed (exit code {}); keeping last good output",
                code.map_or_else(|| "none".to_string(), |c| c.to_string())
            );
            hub.send(ReloadMessage::BuildFailed {
                message: message.clone(),
            });
        }
    }

    Ok(outcome)
}

/// Run one build; a build that cannot even start is reported like a failed one.
async fn rebuild_or_report(build: &BuildCommand, hub: &ReloadHub) {
    if let Err(e) = rebuild(build, hub).await {
        tracing::error!("{}", e);
        hub.send(ReloadMessage::BuildFailed {
            message: e.to_string(),
        });
    }
}

/// Rebuild once per burst of changes, until the watcher goes away.
///
/// Builds never overlap. Changes that arrive while a build runs are merged
/// into a single follow-up build.
async fn rebuild_on_change(
    mut rx: mpsc::Receiver<WatchEvent>,
    build: &BuildCommand,
    hub: &ReloadHub,
) {
    while let Some(event) = rx.recv().await {
        log_event(&event);

        while let Ok(pending) = rx.try_recv() {
            log_event(&pending);
        }

        rebuild_or_report(build, hub).await;
    }
}

fn log_event(event: &WatchEvent) {
    match event {
        WatchEvent::Markdown(path) => tracing::info!("Markdown changed: {}", path.display()),
        WatchEvent::Config(path) => tracing::info!("Config changed: {}", path.display()),
        WatchEvent::Asset(path) => tracing::info!("Asset changed: {}", path.display()),
        WatchEvent::Removed(path) => tracing::info!("Removed: {}", path.display()),
    }
}

/// The generated index with the live-reload script injected.
///
/// Falls back to a placeholder while no build has succeeded yet.
fn render_index(root: &Path) -> String {
    let html = std::fs::read_to_string(root.join("index.html")).unwrap_or_else(|_| {
        "<!DOCTYPE html>\n<html lang=\"en\">\n<body>\n\
         <p>No successful build yet. Fix the errors shown in the terminal.</p>\n\
         </body>\n</html>\n"
            .to_string()
    });

    inject_livereload_script(&html)
}

/// Handler for the index page.
async fn index_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Html(render_index(&state.root))
}

/// Handler for the live-reload client script.
async fn script_handler() -> impl IntoResponse {
    (
        [("content-type", "application/javascript")],
        livereload_client_script(),
    )
}

/// Handler for the live-reload WebSocket endpoint.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Forward reload messages to one client until it disconnects.
async fn handle_ws(mut socket: WebSocket, state: Arc<ServerState>) {
    let mut rx = state.hub.subscribe();

    if send_message(&mut socket, &ReloadMessage::Connected)
        .await
        .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            msg = next_message(&mut rx) => {
                let Some(msg) = msg else { break };
                if send_message(&mut socket, &msg).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                if incoming.is_none() {
                    break;
                }
            }
        }
    }
}

/// Next message for a client; a client that fell behind skips ahead.
async fn next_message(rx: &mut broadcast::Receiver<ReloadMessage>) -> Option<ReloadMessage> {
    loop {
        match rx.recv().await {
            Ok(msg) => return Some(msg),
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!("Live-reload client skipped {} messages", skipped);
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ReloadMessage) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).map_err(axum::Error::new)?;
    socket.send(Message::Text(json.into())).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn creates_server_with_default_address() {
        let config = DevServerConfig::new("docs", BuildCommand::new("folio").arg("build"));
        let server = DevServer::new(config);

        assert_eq!(server.config.port, 3000);
        assert_eq!(server.config.host, "127.0.0.1");
        assert!(!server.config.open);
    }

    #[test]
    fn injects_script_into_built_index() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join("index.html"),
            "<html><body><div class=\"container\"></div></body></html>",
        )
        .unwrap();

        let html = render_index(temp.path());

        assert!(html.contains("<div class=\"container\"></div><script src=\"/__livereload.js\">"));
        // The file on disk is left untouched
        assert!(!fs::read_to_string(temp.path().join("index.html"))
            .unwrap()
            .contains("__livereload"));
    }

    #[test]
    fn placeholder_before_first_build() {
        let temp = tempdir().unwrap();

        let html = render_index(temp.path());

        assert!(html.contains("No successful build yet"));
        assert!(html.contains("/__livereload.js"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_build_broadcasts_without_reload() {
        let hub = ReloadHub::new();
        let mut rx = hub.subscribe();
        let build = BuildCommand::new("sh").arg("-c").arg("echo broken >&2; exit 1");

        let outcome = rebuild(&build, &hub).await.unwrap();

        assert!(!outcome.is_success());
        assert_eq!(
            rx.try_recv().unwrap(),
            ReloadMessage::BuildFailed {
                message: "broken".to_string()
            }
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn coalesces_queued_changes_into_one_build() {
        let temp = tempdir().unwrap();
        let counter = temp.path().join("count");
        let build = BuildCommand::new("sh")
            .arg("-c")
            .arg(format!("echo x >> '{}'", counter.display()));

        let hub = ReloadHub::new();
        let (tx, rx) = mpsc::channel(10);
        for name in ["a.md", "b.md", "c.md"] {
            tx.send(WatchEvent::Markdown(PathBuf::from(name))).await.unwrap();
        }
        drop(tx);

        rebuild_on_change(rx, &build, &hub).await;

        let runs = fs::read_to_string(&counter).unwrap();
        assert_eq!(runs.lines().count(), 1);
    }

    #[tokio::test]
    async fn keeps_rebuilding_after_build_cannot_start() {
        let hub = ReloadHub::new();
        let mut reloads = hub.subscribe();
        let build = BuildCommand::new("/nonexistent/folio").arg("build");
        let (tx, rx) = mpsc::channel(10);

        let rebuild_hub = hub.clone();
        let task = tokio::spawn(async move { rebuild_on_change(rx, &build, &rebuild_hub).await });

        tx.send(WatchEvent::Markdown(PathBuf::from("a.md"))).await.unwrap();
        let first = tokio::time::timeout(Duration::from_secs(5), reloads.recv())
            .await
            .unwrap()
            .unwrap();

        // The loop is still listening after the first failure
        tx.send(WatchEvent::Markdown(PathBuf::from("b.md"))).await.unwrap();
        let second = tokio::time::timeout(Duration::from_secs(5), reloads.recv())
            .await
            .unwrap()
            .unwrap();

        for msg in [first, second] {
            match msg {
                ReloadMessage::BuildFailed { message } => {
                    assert!(message.contains("/nonexistent/folio"), "{message}")
                }
                other => panic!("unexpected message: {other:?}"),
            }
        }

        drop(tx);
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn lagging_client_stays_subscribed() {
        let hub = ReloadHub::new();
        let mut rx = hub.subscribe();

        for _ in 0..200 {
            hub.send(ReloadMessage::Reload);
        }

        hub.send(ReloadMessage::BuildFailed {
            message: "latest".to_string(),
        });

        let mut received = Vec::new();
        while let Ok(Some(msg)) =
            tokio::time::timeout(Duration::from_millis(50), next_message(&mut rx)).await
        {
            received.push(msg);
        }

        assert!(!received.is_empty());
        assert_eq!(
            received.last(),
            Some(&ReloadMessage::BuildFailed {
                message: "latest".to_string()
            })
        );
    }

    #[tokio::test]
    async fn closed_hub_ends_client_stream() {
        let hub = ReloadHub::new();
        let mut rx = hub.subscribe();
        drop(hub);

        assert_eq!(next_message(&mut rx).await, None);
    }
}
