//! WebSocket-based live reload.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// WebSocket endpoint browsers connect to.
pub const LIVERELOAD_PATH: &str = "/__livereload";

/// Path the client script is served from.
pub const LIVERELOAD_SCRIPT_PATH: &str = "/__livereload.js";

/// Messages sent to connected browsers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReloadMessage {
    /// Connection established
    Connected,

    /// A build succeeded; reload the page
    Reload,

    /// A build failed; the page keeps showing the last good output
    BuildFailed {
        /// Error reported by the build
        message: String,
    },
}

/// Hub for broadcasting reload messages to all connected clients.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    sender: broadcast::Sender<ReloadMessage>,
}

impl ReloadHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Send a message to all connected clients.
    pub fn send(&self, msg: ReloadMessage) {
        // No receivers is fine
        let _ = self.sender.send(msg);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.sender.subscribe()
    }

    /// Get the number of connected clients.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Insert the live-reload script tag before `</body>`, or append it.
pub fn inject_livereload_script(html: &str) -> String {
    let tag = format!("<script src=\"{LIVERELOAD_SCRIPT_PATH}\"></script>\n");

    match html.rfind("</body>") {
        Some(pos) => {
            let mut result = String::with_capacity(html.len() + tag.len());
            result.push_str(&html[..pos]);
            result.push_str(&tag);
            result.push_str(&html[pos..]);
            result
        }
        None => format!("{html}{tag}"),
    }
}

/// Generate the client-side live-reload script.
pub fn livereload_client_script() -> String {
    format!(
        r#"
(function() {{
  'use strict';

  const protocol = location.protocol === 'https:' ? 'wss:' : 'ws:';
  const url = protocol + '//' + location.host + '{LIVERELOAD_PATH}';
  let reconnectAttempts = 0;
  const maxReconnectAttempts = 10;

  function connect() {{
    const ws = new WebSocket(url);

    ws.onopen = function() {{
      if (reconnectAttempts > 0) {{
        // Server came back, pick up whatever it built meanwhile
        location.reload();
        return;
      }}
      console.log('[folio] Live reload connected');
    }};

    ws.onmessage = function(event) {{
      const msg = JSON.parse(event.data);

      switch (msg.type) {{
        case 'reload':
          location.reload();
          break;

        case 'build_failed':
          console.error('[folio] Build failed, showing last good output:\n' + msg.message);
          break;

        case 'connected':
          break;
      }}
    }};

    ws.onclose = function() {{
      if (reconnectAttempts < maxReconnectAttempts) {{
        reconnectAttempts++;
        setTimeout(connect, 1000 * reconnectAttempts);
      }} else {{
        console.log('[folio] Live reload disconnected');
      }}
    }};
  }}

  connect();
}})();
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_broadcasts_messages() {
        let hub = ReloadHub::new();
        let mut rx = hub.subscribe();

        hub.send(ReloadMessage::Reload);

        match rx.try_recv() {
            Ok(ReloadMessage::Reload) => {}
            other => panic!("Expected Reload message, got {other:?}"),
        }
    }

    #[test]
    fn send_without_clients_is_silent() {
        let hub = ReloadHub::new();
        assert_eq!(hub.subscriber_count(), 0);

        hub.send(ReloadMessage::Reload);
    }

    #[test]
    fn serializes_messages() {
        let json = serde_json::to_string(&ReloadMessage::BuildFailed {
            message: "Source Markdown file not found".to_string(),
        })
        .unwrap();

        assert_eq!(
            json,
            r#"{"type":"build_failed","message":"Source Markdown file not found"}"#
        );
        assert_eq!(
            serde_json::to_string(&ReloadMessage::Reload).unwrap(),
            r#"{"type":"reload"}"#
        );
    }

    #[test]
    fn injects_before_closing_body() {
        let html = inject_livereload_script("<html><body><p>x</p></body></html>");

        assert_eq!(
            html,
            "<html><body><p>x</p><script src=\"/__livereload.js\"></script>\n</body></html>"
        );
    }

    #[test]
    fn appends_without_body() {
        let html = inject_livereload_script("<p>fragment</p>");

        assert!(html.starts_with("<p>fragment</p><script"));
    }

    #[test]
    fn client_script_targets_endpoint() {
        let js = livereload_client_script();

        assert!(js.contains("'/__livereload'"));
        assert!(js.contains("case 'build_failed':"));
    }
}
