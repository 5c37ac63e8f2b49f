//! Markdown renderer adapter.

use pulldown_cmark::{html, Event, Options, Parser, Tag, TagEnd};

use crate::table::{rewrite_tables, TableClasses};

/// Options controlling how Markdown is turned into HTML.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Pass raw HTML found in the Markdown through untouched.
    /// When false it is escaped and shown as text.
    pub raw_html: bool,

    /// Classes attached to table markup
    pub table_classes: TableClasses,
}

/// Errors that can occur while rendering.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Render error: {0}")]
    Render(String),
}

/// A Markdown to HTML renderer.
///
/// Implementations are pure: the same input always yields the same fragment.
pub trait MarkdownRenderer: Send + Sync {
    /// Renderer identifier (e.g., "cmark")
    fn name(&self) -> &'static str;

    /// Render a Markdown document into an HTML fragment.
    fn render(&self, markdown: &str) -> Result<String, RenderError>;
}

/// CommonMark renderer backed by pulldown-cmark.
#[derive(Debug, Clone, Default)]
pub struct CmarkRenderer {
    options: RenderOptions,
}

impl CmarkRenderer {
    /// Create a renderer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a renderer with the given options.
    pub fn with_options(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }
}

impl MarkdownRenderer for CmarkRenderer {
    fn name(&self) -> &'static str {
        "cmark"
    }

    fn render(&self, markdown: &str) -> Result<String, RenderError> {
        let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
        let raw_html = self.options.raw_html;

        // Escaped HTML blocks read as text, so they get a paragraph of their own.
        let events = Parser::new_ext(markdown, options).map(|event| match event {
            Event::Html(text) | Event::InlineHtml(text) if !raw_html => Event::Text(text),
            Event::Start(Tag::HtmlBlock) if !raw_html => Event::Start(Tag::Paragraph),
            Event::End(TagEnd::HtmlBlock) if !raw_html => Event::End(TagEnd::Paragraph),
            other => other,
        });

        let events = rewrite_tables(events, &self.options.table_classes);

        let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut html_output, events.into_iter());

        Ok(html_output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_markdown() {
        let html = CmarkRenderer::new().render("# Hello\n\nWorld").unwrap();

        assert_eq!(html, "<h1>Hello</h1>\n<p>World</p>\n");
    }

    #[test]
    fn renders_strikethrough() {
        let html = CmarkRenderer::new().render("~~gone~~").unwrap();

        assert!(html.contains("<del>gone</del>"));
    }

    #[test]
    fn escapes_raw_html_by_default() {
        let html = CmarkRenderer::new()
            .render("Click <span onclick=\"x()\">here</span>")
            .unwrap();

        assert!(!html.contains("<span"));
        assert!(html.contains("&lt;span"));
    }

    #[test]
    fn escaped_html_block_becomes_a_paragraph() {
        let html = CmarkRenderer::new()
            .render("<div>\nhi\n</div>\n\nAfter\n")
            .unwrap();

        assert!(html.starts_with("<p>&lt;div&gt;"), "{html}");
        assert!(html.contains("&lt;/div&gt;\n</p>\n<p>After</p>"), "{html}");
    }

    #[test]
    fn passes_raw_html_block_when_enabled() {
        let renderer = CmarkRenderer::with_options(RenderOptions {
            raw_html: true,
            ..Default::default()
        });

        let html = renderer.render("<div>\nhi\n</div>\n").unwrap();

        assert_eq!(html, "<div>\nhi\n</div>\n");
    }

    #[test]
    fn passes_raw_html_when_enabled() {
        let renderer = CmarkRenderer::with_options(RenderOptions {
            raw_html: true,
            ..Default::default()
        });

        let html = renderer.render("Click <span>here</span>").unwrap();

        assert!(html.contains("<span>here</span>"));
    }

    #[test]
    fn table_markup_survives_html_escaping() {
        let html = CmarkRenderer::new()
            .render("| Week | Chapter |\n|:----:|--------:|\n| 1 | Intro |\n")
            .unwrap();

        assert!(html.starts_with("<table class=\"table\">"));
        assert!(html.contains("<th class=\"table__cell table__cell--header\">Week</th>"));
        assert!(html.contains("<td class=\"table__cell\">Intro</td>"));
        assert!(!html.contains("style="));
    }

    #[test]
    fn uses_custom_table_classes() {
        let renderer = CmarkRenderer::with_options(RenderOptions {
            table_classes: TableClasses {
                table: "grid".to_string(),
                ..Default::default()
            },
            ..Default::default()
        });

        let html = renderer.render("| A |\n|---|\n| 1 |\n").unwrap();

        assert!(html.starts_with("<table class=\"grid\">"));
    }
}
