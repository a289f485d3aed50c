#![forbid(unsafe_code)]

//! Core domain model and session logic for the training runner.
//!
//! This crate provides:
//! - Domain types (blocks, intervals, completion records)
//! - The session controller and per-block runners
//! - Rest/interval countdowns and XP rules
//! - Persistence (WAL, CSV rollup, history)
//! - Protocol loading and the exercise catalog

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod rest_timer;
pub mod xp;
pub mod section;
pub mod runner;
pub mod sink;
pub mod wal;
pub mod csv_rollup;
pub mod history;
pub mod catalog;
pub mod protocol;
pub mod controller;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use catalog::{default_catalog, validate_blocks, ExerciseCatalog};
pub use controller::{Notice, NoticeLevel, SessionController, ViewState};
pub use history::{load_recent_records, HistoryIndex};
pub use protocol::{DirectoryProtocolSource, ProtocolSource};
pub use runner::BlockRunner;
pub use sink::{AudioCue, BackgroundSink, CompletionSink, MemorySink, SinkFailure, SinkReport};
pub use wal::JsonlSink;
