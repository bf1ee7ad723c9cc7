//! Snapshot persistence trait and implementations (memory, file).

mod file;
mod memory;

use auto_impl::auto_impl;
use thiserror::Error;

use crate::record::ServerRow;

pub use file::FileSnapshotStore;
pub use memory::MemorySnapshotStore;

#[derive(Debug, Error)]
pub enum ServerCacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Whole-table snapshot persistence with auto-impl for &, Box, Arc.
///
/// A snapshot is the complete set of rows; `store` replaces whatever was
/// stored before.
#[auto_impl(&, Box, Arc)]
pub trait SnapshotStore: Send + Sync {
    /// Read the last stored snapshot. A store that was never written yields
    /// an empty snapshot.
    fn load(&self) -> Result<Vec<ServerRow>, ServerCacheError>;

    fn store(&self, rows: &[ServerRow]) -> Result<(), ServerCacheError>;
}
