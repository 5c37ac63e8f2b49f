//! Conversion units and manifest entries.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Extension given to generated fragments.
pub const OUTPUT_EXTENSION: &str = "html";

/// A fixed, hand-listed document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ManifestEntry {
    /// Markdown source path
    pub source: PathBuf,

    /// Tab identifier (element id and navigation key)
    pub tab: String,

    /// Navigation label; derived from `tab` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ManifestEntry {
    pub fn new(source: impl Into<PathBuf>, tab: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            tab: tab.into(),
            label: None,
        }
    }

    /// Set an explicit navigation label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Resolve this entry into a unit writing into `output_dir`.
    pub fn to_unit(&self, output_dir: &Path) -> ConversionUnit {
        ConversionUnit {
            source_path: self.source.clone(),
            output_path: output_path_for(&self.source, output_dir),
            tab_id: self.tab.clone(),
            label: self.label.clone(),
        }
    }
}

/// One source document, its generated fragment and its navigation identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionUnit {
    /// Markdown source
    pub source_path: PathBuf,

    /// Generated HTML fragment
    pub output_path: PathBuf,

    /// Shared key between the navigation control and the content container
    pub tab_id: String,

    /// Explicit navigation label
    pub label: Option<String>,
}

impl ConversionUnit {
    /// Label shown on the navigation control.
    pub fn display_label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| label_from_tab_id(&self.tab_id))
    }
}

/// Map a source file to `<output_dir>/<stem>.html`.
pub fn output_path_for(source: &Path, output_dir: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("index");

    output_dir.join(format!("{stem}.{OUTPUT_EXTENSION}"))
}

/// Turn a tab identifier into a human label.
///
/// `facilitator-guide` becomes `Facilitator Guide`, `meeting-10` becomes `Meeting 10`.
pub fn label_from_tab_id(tab_id: &str) -> String {
    tab_id
        .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Capitalize first letter of a string.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
