//! In-memory grids for the navigation engine
//!
//! `MemoryGrid` implements every collaborator trait of `gridnav-core` over
//! plain vectors, records what it was asked to do, and simulates the
//! virtualized scroll containers (including the chunk-load signal that ends
//! a navigation scroll). Grids are described by JSON fixtures and driven by
//! key scripts through the [`Replayer`].

pub mod config;
pub mod memory;
pub mod replay;

use thiserror::Error;

// Re-exports
pub use config::{ColumnSpec, GridFixture, RecordEntry, RecordSpec, RowDimensionSpec, ViewportSpec};
pub use memory::{HostCall, MemoryGrid};
pub use replay::{Command, Navigator, Replayer, Step};

/// Errors that can occur while loading fixtures or parsing scripts
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid column: {0}")]
    InvalidColumn(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Fixture has no columns")]
    Empty,
}

pub type Result<T> = std::result::Result<T, FixtureError>;
