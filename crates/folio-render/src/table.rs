//! Table markup rewriting.
//!
//! pulldown-cmark emits `style="text-align: ..."` on aligned cells. The rewriter
//! replaces every table event with class-only markup, so the output never
//! carries inline presentation attributes.

use pulldown_cmark::{Event, Tag, TagEnd};

/// CSS class names attached to generated table markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableClasses {
    /// `<table>`
    pub table: String,
    /// `<thead>`
    pub head: String,
    /// `<tbody>`
    pub body: String,
    /// `<tr>`
    pub row: String,
    /// `<th>`
    pub header_cell: String,
    /// `<td>`
    pub data_cell: String,
}

impl Default for TableClasses {
    fn default() -> Self {
        Self {
            table: "table".to_string(),
            head: "table__head".to_string(),
            body: "table__body".to_string(),
            row: "table__row".to_string(),
            header_cell: "table__cell table__cell--header".to_string(),
            data_cell: "table__cell".to_string(),
        }
    }
}

/// Tracks where in a table the event stream currently is.
#[derive(Debug, Default)]
struct TableState {
    in_head: bool,
    body_open: bool,
}

/// Replace table events with class-annotated HTML.
///
/// Non-table events pass through untouched.
pub fn rewrite_tables<'a, I>(events: I, classes: &TableClasses) -> Vec<Event<'a>>
where
    I: IntoIterator<Item = Event<'a>>,
{
    let mut state = TableState::default();
    let mut out = Vec::new();

    for event in events {
        let html = match event {
            Event::Start(Tag::Table(_)) => {
                state = TableState::default();
                format!("<table class=\"{}\">\n", classes.table)
            }
            Event::End(TagEnd::Table) => {
                let mut html = String::new();
                if state.body_open {
                    html.push_str("</tbody>\n");
                }
                html.push_str("</table>\n");
                state = TableState::default();
                html
            }
            Event::Start(Tag::TableHead) => {
                state.in_head = true;
                format!(
                    "<thead class=\"{}\">\n<tr class=\"{}\">\n",
                    classes.head, classes.row
                )
            }
            Event::End(TagEnd::TableHead) => {
                state.in_head = false;
                "</tr>\n</thead>\n".to_string()
            }
            Event::Start(Tag::TableRow) => {
                let mut html = String::new();
                if !state.body_open {
                    state.body_open = true;
                    html.push_str(&format!("<tbody class=\"{}\">\n", classes.body));
                }
                html.push_str(&format!("<tr class=\"{}\">\n", classes.row));
                html
            }
            Event::End(TagEnd::TableRow) => "</tr>\n".to_string(),
            Event::Start(Tag::TableCell) => {
                if state.in_head {
                    format!("<th class=\"{}\">", classes.header_cell)
                } else {
                    format!("<td class=\"{}\">", classes.data_cell)
                }
            }
            Event::End(TagEnd::TableCell) => {
                if state.in_head {
                    "</th>\n".to_string()
                } else {
                    "</td>\n".to_string()
                }
            }
            other => {
                out.push(other);
                continue;
            }
        };

        out.push(Event::Html(html.into()));
    }

    out
}
