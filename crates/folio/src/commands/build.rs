//! Static site build command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use folio_site::SiteBuilder;

use crate::config::ConfigFile;

/// Run the build command.
pub fn run(config_path: &Path, output: Option<PathBuf>) -> Result<()> {
    tracing::info!("Building site...");

    let file_config = ConfigFile::load(config_path)?;
    let config = file_config.build_config(output);

    let result = SiteBuilder::new(config)
        .build()
        .context("Build failed")?;

    tracing::info!(
        "Built {} documents and {} assets in {}ms",
        result.units,
        result.assets,
        result.duration_ms
    );

    tracing::info!("Output: {}", result.index_path.display());

    Ok(())
}
