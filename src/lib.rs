//! Core library surface for the City Library manager.
//!
//! The catalog and membership records live in a [`RecordStore`], are
//! persisted to two flat files by [`FlatFileStorage`], and are changed only
//! through [`Library`], which keeps the issued flags and the members' issued
//! sets in agreement and flushes after every change. The `ui` module is a
//! thin Ratatui shell over those operations.
pub mod config;
pub mod error;
pub mod library;
pub mod logging;
pub mod models;
pub mod storage;
pub mod store;
pub mod ui;

pub use error::{LibraryError, Record, Result};
pub use library::Library;
pub use models::{Book, BookId, Member, MemberId, SortCriterion};
pub use storage::FlatFileStorage;
pub use store::{RecordStore, Violation};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
