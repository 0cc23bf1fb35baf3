//! Core library surface for the Beer Tracker TUI application.
//!
//! The persistence pieces live in [`store`] so the `bin` target, the CLI
//! subcommands and the tests all share one implementation of the archive,
//! the image directory and the `.btkr` exchange files.
pub mod cli;
pub mod error;
pub mod logging;
pub mod models;
pub mod store;
pub mod ui;

pub use error::{DecodeError, EncodeError, ExchangeError, ImageError, StoreError};

/// The domain type every other layer manipulates.
pub use models::Beer;

/// Persistence entry points typically used by `main.rs`.
pub use store::{import_from, import_inbox, CollectionStore, DataDirs, ImageStore};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
