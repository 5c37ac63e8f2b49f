//! Aggregate page synthesis.
//!
//! Every converted fragment is embedded in one `index.html`, inside a
//! `.tabcontent` container whose id is the unit's tab identifier. A matching
//! `.tab__button[data-tab]` is emitted for each unit, in the same order.

use std::fs;
use std::path::{Path, PathBuf};

use minijinja::{context, Environment};
use serde::Serialize;

use crate::assets::{SCRIPT_FILE, STYLESHEET_FILE};
use crate::builder::BuildError;
use crate::unit::ConversionUnit;

/// One tab of the aggregate page.
#[derive(Debug, Clone, Serialize)]
pub struct Tab {
    /// Container id and `data-tab` key
    pub id: String,
    /// Navigation label
    pub label: String,
    /// Generated fragment, embedded verbatim
    pub content: String,
}

/// Read back the generated fragment of every unit, preserving order.
///
/// A missing fragment means the conversion step did not run for that unit.
pub fn collect_tabs(units: &[ConversionUnit]) -> Result<Vec<Tab>, BuildError> {
    units
        .iter()
        .map(|unit| {
            if !unit.output_path.exists() {
                return Err(BuildError::OutputMissing {
                    tab: unit.tab_id.clone(),
                    path: unit.output_path.clone(),
                });
            }

            let content = fs::read_to_string(&unit.output_path).map_err(|e| BuildError::Read {
                path: unit.output_path.clone(),
                source: e,
            })?;

            Ok(Tab {
                id: unit.tab_id.clone(),
                label: unit.display_label(),
                content,
            })
        })
        .collect()
}

/// Renders the aggregate page using minijinja.
pub struct IndexSynthesizer {
    env: Environment<'static>,
}

impl IndexSynthesizer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);

        env.add_template("index.html", INDEX_TEMPLATE)
            .expect("Failed to add index template");

        Self { env }
    }

    /// Render the page for the given tabs.
    pub fn render(&self, title: &str, tabs: &[Tab]) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template("index.html")?;

        tmpl.render(context! {
            title => title,
            stylesheet => STYLESHEET_FILE,
            script => SCRIPT_FILE,
            tabs => tabs,
        })
    }

    /// Collect every fragment and write the aggregate page to `index_path`.
    ///
    /// Nothing is written unless every fragment could be read.
    pub fn synthesize(
        &self,
        title: &str,
        units: &[ConversionUnit],
        index_path: &Path,
    ) -> Result<PathBuf, BuildError> {
        tracing::info!("Generating {}...", index_path.display());

        let tabs = collect_tabs(units)?;
        let html = self
            .render(title, &tabs)
            .map_err(|e| BuildError::Template(e.to_string()))?;

        fs::write(index_path, html).map_err(|e| BuildError::Write {
            path: index_path.to_path_buf(),
            source: e,
        })?;

        tracing::info!("Generated {} with {} tabs", index_path.display(), tabs.len());

        Ok(index_path.to_path_buf())
    }
}

impl Default for IndexSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

const INDEX_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="UTF-8">
        <meta name="viewport" content="width=device-width, initial-scale=1.0">
        <title>{{ title }}</title>
        <link rel="stylesheet" href="{{ stylesheet }}">
    </head>
    <body>
        <div class="container">
            <h1>{{ title }}</h1>

            <div class="tab">
            {% for tab in tabs %}
                <button class="tab__button{% if loop.first %} tab__button--active{% endif %}" type="button" data-tab="{{ tab.id }}">
                    {{ tab.label }}
                </button>
            {% endfor %}
            </div>
            {% for tab in tabs %}

            <div id="{{ tab.id }}" class="tabcontent{% if loop.first %} tabcontent--active{% endif %}">
                {{ tab.content | safe }}
            </div>
            {% endfor %}

            <script src="{{ script }}"></script>
        </div>
    </body>
</html>
"##;
