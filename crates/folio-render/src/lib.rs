//! Markdown rendering for folio.
//!
//! This crate wraps a Markdown parser behind the [`MarkdownRenderer`] trait and
//! rewrites table markup so that presentation is carried by CSS classes instead
//! of inline alignment attributes.

pub mod renderer;
pub mod table;

pub use renderer::{CmarkRenderer, MarkdownRenderer, RenderError, RenderOptions};
pub use table::TableClasses;
