//! Development server command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use folio_server::{BuildCommand, DevServer, DevServerConfig, WatchTarget};

use crate::config::ConfigFile;

/// Run the dev server.
pub async fn run(
    config_path: &Path,
    port: Option<u16>,
    host: Option<String>,
    open: bool,
) -> Result<()> {
    let file_config = ConfigFile::load(config_path)?;

    let exe = std::env::current_exe().context("Failed to locate the folio executable")?;
    let build = BuildCommand::new(exe)
        .arg("--config")
        .arg(config_path)
        .arg("build");

    let config = DevServerConfig {
        root: file_config.output_dir(),
        watch: watch_targets(&file_config, config_path),
        config_file: Some(config_path.to_path_buf()),
        build,
        port: port.unwrap_or(file_config.dev.port),
        host: host.unwrap_or_else(|| file_config.dev.host.clone()),
        open: open || file_config.dev.open,
    };

    tracing::info!("Starting development server on port {}", config.port);

    DevServer::new(config).start().await?;

    Ok(())
}

/// Everything a build reads: manifest directories, meetings, assets and the
/// config file itself.
fn watch_targets(config: &ConfigFile, config_path: &Path) -> Vec<WatchTarget> {
    let mut dirs: Vec<PathBuf> = Vec::new();

    let source_dirs = config.manifest().into_iter().map(|entry| {
        match entry.source.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    });

    for dir in source_dirs.chain([config.meetings_dir(), config.assets_dir()]) {
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }

    let mut targets: Vec<WatchTarget> = dirs.into_iter().map(WatchTarget::dir).collect();
    targets.push(WatchTarget::file(config_path));
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn watches_sources_meetings_assets_and_config() {
        let config = ConfigFile::load(Path::new("missing/folio.toml")).unwrap();

        let targets = watch_targets(&config, Path::new("missing/folio.toml"));

        assert_eq!(
            targets,
            vec![
                WatchTarget::dir("missing/content"),
                WatchTarget::dir("missing/meetings"),
                WatchTarget::dir("missing/static"),
                WatchTarget::file("missing/folio.toml"),
            ]
        );
    }
}
