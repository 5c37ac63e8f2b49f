//! Static assets: user files copied verbatim, plus built-in fallbacks.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::builder::BuildError;

/// Stylesheet referenced by the aggregate page.
pub const STYLESHEET_FILE: &str = "style.css";

/// Tab controller script referenced by the aggregate page.
pub const SCRIPT_FILE: &str = "main.js";

/// Asset pipeline utilities.
pub struct AssetPipeline;

impl AssetPipeline {
    /// Built-in stylesheet.
    pub fn stylesheet() -> &'static str {
        DEFAULT_CSS
    }

    /// Built-in tab controller.
    pub fn tab_controller() -> &'static str {
        TAB_CONTROLLER_JS
    }

    /// Copy the assets directory into the output and fill in missing defaults.
    ///
    /// Returns the number of files written.
    pub fn write(assets_dir: Option<&Path>, output_dir: &Path) -> Result<usize, BuildError> {
        let mut copied = Vec::new();

        if let Some(dir) = assets_dir {
            if dir.is_dir() {
                copied = Self::copy_dir(dir, output_dir)?;
            } else {
                tracing::debug!("Assets directory not found: {}", dir.display());
            }
        }

        let mut written = copied.len();

        for (name, contents) in [
            (STYLESHEET_FILE, DEFAULT_CSS),
            (SCRIPT_FILE, TAB_CONTROLLER_JS),
        ] {
            let provided = assets_dir.is_some_and(|dir| dir.join(name).is_file());
            if provided {
                continue;
            }

            let path = output_dir.join(name);
            fs::write(&path, contents).map_err(|e| BuildError::Write { path, source: e })?;
            written += 1;
        }

        Ok(written)
    }

    /// Copy every file under `assets_dir` into `output_dir`, keeping the layout.
    ///
    /// Files already inside the output directory are skipped, so the two may
    /// be the same directory or nested.
    pub fn copy_dir(assets_dir: &Path, output_dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
        let assets_root = assets_dir
            .canonicalize()
            .map_err(|e| BuildError::Read {
                path: assets_dir.to_path_buf(),
                source: e,
            })?;
        let output_root = output_dir
            .canonicalize()
            .unwrap_or_else(|_| output_dir.to_path_buf());

        let mut copied = Vec::new();

        for entry in WalkDir::new(&assets_root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !e.path().starts_with(&output_root))
        {
            let entry = entry.map_err(|e| BuildError::Read {
                path: e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| assets_root.clone()),
                source: e.into(),
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&assets_root)
                .unwrap_or(entry.path());
            let target = output_dir.join(relative);

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| BuildError::Write {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }

            fs::copy(entry.path(), &target).map_err(|e| BuildError::Write {
                path: target.clone(),
                source: e,
            })?;

            tracing::debug!("Copied {}", relative.display());
            copied.push(target);
        }

        if !copied.is_empty() {
            tracing::info!(
                "Copied {} static files from {}",
                copied.len(),
                assets_dir.display()
            );
        }

        Ok(copied)
    }
}

const DEFAULT_CSS: &str = r#"/* Folio book club theme */

:root {
  --background: #fdfcf9;
  --foreground: #1f2328;
  --muted: #f1efe9;
  --border: #d9d4c7;
  --primary: #2f5d62;
  --primary-foreground: #ffffff;
  --radius: 0.375rem;
}

* {
  box-sizing: border-box;
}

body {
  margin: 0;
  font-family: system-ui, -apple-system, sans-serif;
  background: var(--background);
  color: var(--foreground);
  line-height: 1.6;
}

.container {
  max-width: 960px;
  margin: 0 auto;
  padding: 2rem 1rem;
}

/* Tabs */
.tab {
  display: flex;
  flex-wrap: wrap;
  gap: 0.25rem;
  border-bottom: 1px solid var(--border);
  margin-bottom: 1.5rem;
}

.tab__button {
  padding: 0.5rem 1rem;
  font: inherit;
  background: var(--muted);
  color: var(--foreground);
  border: 1px solid var(--border);
  border-bottom: none;
  border-radius: var(--radius) var(--radius) 0 0;
  cursor: pointer;
}

.tab__button:hover {
  background: var(--border);
}

.tab__button--active {
  background: var(--primary);
  color: var(--primary-foreground);
}

.tabcontent {
  display: none;
}

.tabcontent--active {
  display: block;
}

/* Tables */
.table {
  width: 100%;
  border-collapse: collapse;
  margin-bottom: 1rem;
}

.table__head {
  background: var(--muted);
}

.table__row:nth-child(even) {
  background: var(--muted);
}

.table__cell {
  padding: 0.5rem 0.75rem;
  border: 1px solid var(--border);
  text-align: left;
  vertical-align: top;
}

.table__cell--header {
  font-weight: 600;
}

/* Content */
pre {
  background: var(--muted);
  border-radius: var(--radius);
  padding: 1rem;
  overflow-x: auto;
}

code {
  font-family: ui-monospace, monospace;
  font-size: 0.875em;
}

blockquote {
  margin: 1rem 0;
  padding-left: 1rem;
  border-left: 4px solid var(--border);
}
"#;

const TAB_CONTROLLER_JS: &str = r#"// Folio tab controller
document.addEventListener('DOMContentLoaded', function () {
  'use strict';

  const buttons = Array.from(document.querySelectorAll('.tab__button'));
  const contents = Array.from(document.querySelectorAll('.tabcontent'));

  if (buttons.length === 0 || contents.length === 0) {
    return;
  }

  const defaultTab = buttons[0].dataset.tab;

  function isKnown(tabId) {
    return contents.some(function (content) {
      return content.id === tabId;
    });
  }

  // Show exactly one container and mark exactly one button active.
  function activateTab(tabId) {
    const target = isKnown(tabId) ? tabId : defaultTab;

    contents.forEach(function (content) {
      const active = content.id === target;
      content.classList.toggle('tabcontent--active', active);
      content.style.display = active ? 'block' : 'none';
    });

    buttons.forEach(function (button) {
      button.classList.toggle('tab__button--active', button.dataset.tab === target);
    });
  }

  function handleHashChange() {
    activateTab(window.location.hash.substring(1));
  }

  buttons.forEach(function (button) {
    button.addEventListener('click', function (event) {
      window.location.hash = event.currentTarget.dataset.tab;
    });
  });

  window.addEventListener('hashchange', handleHashChange);

  handleHashChange();
});
"#;
