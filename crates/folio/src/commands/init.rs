//! Scaffold a new site.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use folio_site::default_manifest;

/// Run the init command.
pub fn run(config_path: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing folio...");

    let root = config_path.parent().unwrap_or(Path::new(""));

    write_file(config_path, DEFAULT_CONFIG, yes)?;

    for entry in default_manifest() {
        let title = entry
            .source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Document")
            .replace('_', " ");
        write_file(&root.join(&entry.source), &format!("# {title}\n"), yes)?;
    }

    write_file(&root.join("meetings/meeting0.md"), DEFAULT_MEETING, yes)?;

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'folio dev' to start the development server.");

    Ok(())
}

/// Write `content` to `path` unless it exists and `overwrite` is false.
fn write_file(path: &Path, content: &str, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        tracing::warn!("{} already exists. Use --yes to overwrite.", path.display());
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Created {}", path.display());

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# Folio Configuration

[site]
# Page title and heading
title = "DORA AI Paradox Book Club"

# Generated site
output = "docs"

# meetingN.md files, appended as tabs in numeric order
meetings = "meetings"

# Files copied verbatim into the output (style.css, main.js, images)
assets = "static"

[[documents]]
source = "content/DORA_AI_Paradox.md"
tab = "overview"

[[documents]]
source = "content/DORA_AI_Paradox_Facilitator_Guide.md"
tab = "facilitator-guide"

[[documents]]
source = "content/The_AI_Paradox_Visual_Summary.md"
tab = "visual-summary"

[dev]
port = 3000
open = false
"#;

const DEFAULT_MEETING: &str = r#"# Meeting 0

## Reading

| Chapter | Pages | Discussion lead |
|---------|:-----:|-----------------|
| 1       | 1-24  | TBD             |

## Questions

1. What surprised you most?
2. Where does this match your team's experience?
"#;
