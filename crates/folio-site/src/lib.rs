//! Site assembly pipeline for folio.
//!
//! Turns a manifest of Markdown documents plus a directory of numbered meeting
//! notes into HTML fragments, then embeds every fragment behind a tabbed
//! navigation in a single `index.html`.

pub mod assets;
pub mod builder;
pub mod convert;
pub mod discovery;
pub mod index;
pub mod unit;

pub use builder::{
    default_manifest, BuildConfig, BuildError, BuildResult, SiteBuilder, DEFAULT_TITLE,
};
pub use discovery::{DirectoryLister, FsLister};
pub use unit::{ConversionUnit, ManifestEntry};
