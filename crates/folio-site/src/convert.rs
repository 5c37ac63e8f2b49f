//! Document conversion: one Markdown source to one HTML fragment.

use std::fs;

use folio_render::MarkdownRenderer;

use crate::builder::BuildError;
use crate::unit::ConversionUnit;

/// Render `unit`'s source and write the fragment to its output path.
///
/// The output file is overwritten unconditionally and parent directories are
/// created as needed. Returns the number of bytes written.
pub fn convert_unit(
    renderer: &dyn MarkdownRenderer,
    unit: &ConversionUnit,
) -> Result<usize, BuildError> {
    if !unit.source_path.exists() {
        return Err(BuildError::SourceNotFound {
            tab: unit.tab_id.clone(),
            path: unit.source_path.clone(),
        });
    }

    let markdown = fs::read_to_string(&unit.source_path).map_err(|e| BuildError::Read {
        path: unit.source_path.clone(),
        source: e,
    })?;

    let html = renderer
        .render(&markdown)
        .map_err(|e| BuildError::Render {
            path: unit.source_path.clone(),
            source: e,
        })?;

    if let Some(parent) = unit.output_path.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::Write {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    fs::write(&unit.output_path, &html).map_err(|e| BuildError::Write {
        path: unit.output_path.clone(),
        source: e,
    })?;

    tracing::info!(
        "Converted {} to {} ({})",
        unit.source_path.display(),
        unit.output_path.display(),
        renderer.name()
    );

    Ok(html.len())
}
