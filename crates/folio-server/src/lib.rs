//! Development server with live reload for folio sites.
//!
//! Serves the generated output directory, watches the site sources, rebuilds
//! by running the build command as a subprocess, and tells connected browsers
//! to reload once a build succeeds.

pub mod rebuild;
pub mod server;
pub mod watcher;
pub mod websocket;

pub use rebuild::{BuildCommand, BuildOutcome};
pub use server::{DevServer, DevServerConfig, ServerError};
pub use watcher::{FileWatcher, WatchEvent, WatchTarget};
pub use websocket::{ReloadHub, ReloadMessage};
