//! Configuration file (folio.toml).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use folio_render::RenderOptions;
use folio_site::{default_manifest, BuildConfig, ManifestEntry, DEFAULT_TITLE};
use serde::Deserialize;

/// Configuration file structure.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub site: SiteConfig,

    /// Fixed documents, in tab order
    #[serde(default = "default_manifest")]
    pub documents: Vec<ManifestEntry>,

    #[serde(default)]
    pub dev: DevConfig,

    /// Directory relative paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default = "default_meetings")]
    pub meetings: PathBuf,
    /// Static files copied verbatim into the output
    #[serde(default = "default_assets")]
    pub assets: PathBuf,
    /// Let raw HTML in Markdown through instead of escaping it
    #[serde(default)]
    pub raw_html: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            output: default_output(),
            meetings: default_meetings(),
            assets: default_assets(),
            raw_html: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DevConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub open: bool,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            open: false,
        }
    }
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}
fn default_output() -> PathBuf {
    PathBuf::from("docs")
}
fn default_meetings() -> PathBuf {
    PathBuf::from("meetings")
}
fn default_assets() -> PathBuf {
    PathBuf::from("static")
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    3000
}

impl ConfigFile {
    /// Load configuration from `path` if it exists, defaults otherwise.
    ///
    /// Returns an error if the file exists but is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        if !path.exists() {
            tracing::debug!("No {} found, using defaults", path.display());
            return Ok(Self {
                documents: default_manifest(),
                base_dir,
                ..Default::default()
            });
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.base_dir = base_dir;

        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Resolve a configured path against the config file's directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.base_dir.join(path)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.site.output)
    }

    pub fn meetings_dir(&self) -> PathBuf {
        self.resolve(&self.site.meetings)
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.resolve(&self.site.assets)
    }

    /// Manifest with source paths resolved.
    pub fn manifest(&self) -> Vec<ManifestEntry> {
        self.documents
            .iter()
            .map(|entry| ManifestEntry {
                source: self.resolve(&entry.source),
                ..entry.clone()
            })
            .collect()
    }

    /// Pipeline configuration, with an optional output override.
    pub fn build_config(&self, output: Option<PathBuf>) -> BuildConfig {
        BuildConfig {
            manifest: self.manifest(),
            meetings_dir: self.meetings_dir(),
            output_dir: output.unwrap_or_else(|| self.output_dir()),
            assets_dir: Some(self.assets_dir()),
            title: self.site.title.clone(),
            render: RenderOptions {
                raw_html: self.site.raw_html,
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn missing_file_uses_defaults() {
        let config = ConfigFile::load(Path::new("definitely-missing/folio.toml")).unwrap();

        assert_eq!(config.site.title, DEFAULT_TITLE);
        assert_eq!(config.build_config(None).title, BuildConfig::default().title);
        assert_eq!(config.dev.port, 3000);
        assert_eq!(config.documents, default_manifest());
        assert_eq!(
            config.output_dir(),
            PathBuf::from("definitely-missing/docs")
        );
    }

    #[test]
    fn parses_full_config() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("folio.toml");
        fs::write(
            &path,
            r#"
[site]
title = "Reading Group"
output = "public"
raw_html = true

[[documents]]
source = "content/intro.md"
tab = "intro"
label = "Start Here"

[[documents]]
source = "content/faq.md"
tab = "faq"

[dev]
port = 8080
open = true
"#,
        )
        .unwrap();

        let config = ConfigFile::load(&path).unwrap();
        let build = config.build_config(None);

        assert_eq!(build.title, "Reading Group");
        assert_eq!(build.output_dir, temp.path().join("public"));
        assert_eq!(build.meetings_dir, temp.path().join("meetings"));
        assert!(build.render.raw_html);
        assert_eq!(
            build.manifest,
            vec![
                ManifestEntry::new(temp.path().join("content/intro.md"), "intro")
                    .with_label("Start Here"),
                ManifestEntry::new(temp.path().join("content/faq.md"), "faq"),
            ]
        );
        assert_eq!(config.dev.port, 8080);
        assert!(config.dev.open);
        assert_eq!(config.dev.host, "127.0.0.1");
    }

    #[test]
    fn omitted_documents_use_default_manifest() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("folio.toml");
        fs::write(&path, "[site]\ntitle = \"Club\"\n").unwrap();

        let config = ConfigFile::load(&path).unwrap();

        let tabs: Vec<_> = config.documents.iter().map(|d| d.tab.as_str()).collect();
        assert_eq!(tabs, vec!["overview", "facilitator-guide", "visual-summary"]);
    }

    #[test]
    fn output_override_wins() {
        let config = ConfigFile::load(Path::new("missing.toml")).unwrap();

        let build = config.build_config(Some(PathBuf::from("/tmp/out")));

        assert_eq!(build.output_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("folio.toml");
        fs::write(&path, "[site\ntitle = ").unwrap();

        let err = ConfigFile::load(&path).unwrap_err();

        assert!(err.to_string().contains("Failed to parse"));
    }
}
