//! Site builder.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use folio_render::{CmarkRenderer, MarkdownRenderer, RenderError, RenderOptions};

use crate::assets::AssetPipeline;
use crate::convert::convert_unit;
use crate::discovery::{discover_meetings, DirectoryLister, FsLister};
use crate::index::IndexSynthesizer;
use crate::unit::{ConversionUnit, ManifestEntry};

/// File name of the aggregate page inside the output directory.
pub const INDEX_FILE: &str = "index.html";

/// Title used when the configuration does not name one.
pub const DEFAULT_TITLE: &str = "DORA AI Paradox Book Club";

/// Configuration for building a site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Fixed documents, in tab order
    pub manifest: Vec<ManifestEntry>,

    /// Directory scanned for `meetingN.md` files
    pub meetings_dir: PathBuf,

    /// Output directory
    pub output_dir: PathBuf,

    /// Static files copied verbatim into the output
    pub assets_dir: Option<PathBuf>,

    /// Site title, used for `<title>` and the page heading
    pub title: String,

    /// Markdown rendering options
    pub render: RenderOptions,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            manifest: default_manifest(),
            meetings_dir: PathBuf::from("meetings"),
            output_dir: PathBuf::from("docs"),
            assets_dir: Some(PathBuf::from("static")),
            title: DEFAULT_TITLE.to_string(),
            render: RenderOptions::default(),
        }
    }
}

/// The three top-level documents every book club site starts with.
pub fn default_manifest() -> Vec<ManifestEntry> {
    vec![
        ManifestEntry::new("content/DORA_AI_Paradox.md", "overview"),
        ManifestEntry::new(
            "content/DORA_AI_Paradox_Facilitator_Guide.md",
            "facilitator-guide",
        ),
        ManifestEntry::new(
            "content/The_AI_Paradox_Visual_Summary.md",
            "visual-summary",
        ),
    ]
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of documents converted
    pub units: usize,

    /// Number of static assets written
    pub assets: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Path of the aggregate page
    pub index_path: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Source Markdown file not found for tab '{tab}': {}", .path.display())]
    SourceNotFound { tab: String, path: PathBuf },

    #[error("Generated HTML file not found for tab '{tab}': {} (was the document converted?)", .path.display())]
    OutputMissing { tab: String, path: PathBuf },

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to scan {}: {source}", .dir.display())]
    Discovery {
        dir: PathBuf,
        source: std::io::Error,
    },

    #[error("Duplicate tab identifier: {0}")]
    DuplicateTab(String),

    #[error("Invalid tab identifier '{0}': use only letters, digits, '-' and '_'")]
    InvalidTab(String),

    #[error("Two documents would be written to {}", .path.display())]
    DuplicateOutput { path: PathBuf },

    #[error("Failed to render {}: {source}", .path.display())]
    Render { path: PathBuf, source: RenderError },

    #[error("Failed to render template: {0}")]
    Template(String),
}

/// Builds the site: discovery, conversion, then index synthesis.
pub struct SiteBuilder {
    config: BuildConfig,
    renderer: Box<dyn MarkdownRenderer>,
    lister: Box<dyn DirectoryLister>,
    index: IndexSynthesizer,
}

impl SiteBuilder {
    /// Create a builder using pulldown-cmark and the real filesystem.
    pub fn new(config: BuildConfig) -> Self {
        let renderer = CmarkRenderer::with_options(config.render.clone());

        Self {
            config,
            renderer: Box::new(renderer),
            lister: Box::new(FsLister),
            index: IndexSynthesizer::new(),
        }
    }

    /// Replace the Markdown renderer.
    pub fn with_renderer(mut self, renderer: impl MarkdownRenderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// Replace the directory lister used for meeting discovery.
    pub fn with_lister(mut self, lister: impl DirectoryLister + 'static) -> Self {
        self.lister = Box::new(lister);
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Compute the ordered conversion units without touching any output.
    ///
    /// Manifest entries come first in manifest order, followed by discovered
    /// meetings in numeric order.
    pub fn plan(&self) -> Result<Vec<ConversionUnit>, BuildError> {
        let output_dir = &self.config.output_dir;

        let mut units: Vec<ConversionUnit> = self
            .config
            .manifest
            .iter()
            .map(|entry| entry.to_unit(output_dir))
            .collect();

        units.extend(discover_meetings(
            self.lister.as_ref(),
            &self.config.meetings_dir,
            output_dir,
        )?);

        validate_plan(&units, &output_dir.join(INDEX_FILE))?;

        Ok(units)
    }

    /// Build the site.
    ///
    /// Stops at the first failing document; the aggregate page is only
    /// written once every document has been converted.
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        let units = self.plan()?;
        tracing::debug!("Planned {} documents", units.len());

        fs::create_dir_all(&self.config.output_dir).map_err(|e| BuildError::Write {
            path: self.config.output_dir.clone(),
            source: e,
        })?;

        tracing::info!("Converting Markdown to HTML...");
        for unit in &units {
            if let Err(e) = convert_unit(self.renderer.as_ref(), unit) {
                tracing::error!("Failed to convert {}", unit.source_path.display());
                return Err(e);
            }
        }
        tracing::info!("Markdown to HTML conversion complete");

        let assets = AssetPipeline::write(
            self.config.assets_dir.as_deref(),
            &self.config.output_dir,
        )?;

        let index_path = self.config.output_dir.join(INDEX_FILE);
        self.index
            .synthesize(&self.config.title, &units, &index_path)?;

        Ok(BuildResult {
            units: units.len(),
            assets,
            duration_ms: start.elapsed().as_millis() as u64,
            index_path,
        })
    }
}

/// Reject a plan that would not give every unit its own tab and fragment.
///
/// Tab ids double as element ids and URL fragments, so they are limited to
/// `[A-Za-z0-9_-]`. No fragment may share a path with another or with the
/// aggregate page.
fn validate_plan(units: &[ConversionUnit], index_path: &Path) -> Result<(), BuildError> {
    let mut tabs = HashSet::new();
    let mut outputs = HashSet::new();

    for unit in units {
        if !is_valid_tab_id(&unit.tab_id) {
            return Err(BuildError::InvalidTab(unit.tab_id.clone()));
        }
        if !tabs.insert(unit.tab_id.as_str()) {
            return Err(BuildError::DuplicateTab(unit.tab_id.clone()));
        }
        if unit.output_path == index_path || !outputs.insert(unit.output_path.as_path()) {
            return Err(BuildError::DuplicateOutput {
                path: unit.output_path.clone(),
            });
        }
    }

    Ok(())
}

fn is_valid_tab_id(tab_id: &str) -> bool {
    !tab_id.is_empty()
        && tab_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
