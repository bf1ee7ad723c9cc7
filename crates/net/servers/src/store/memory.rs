//! In-memory snapshot store (does not persist across restarts).

use parking_lot::Mutex;

use crate::record::ServerRow;

use super::{ServerCacheError, SnapshotStore};

/// In-memory snapshot store for testing.
///
/// Can be told to fail writes, to exercise the dirty-retry path.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    rows: Mutex<Option<Vec<ServerRow>>>,
    fail_writes: Mutex<bool>,
    writes: Mutex<usize>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<ServerRow>) -> Self {
        Self {
            rows: Mutex::new(Some(rows)),
            ..Self::default()
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }

    /// Rows from the last successful write, if any.
    pub fn rows(&self) -> Option<Vec<ServerRow>> {
        self.rows.lock().clone()
    }

    /// Number of successful writes.
    pub fn writes(&self) -> usize {
        *self.writes.lock()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Vec<ServerRow>, ServerCacheError> {
        Ok(self.rows.lock().clone().unwrap_or_default())
    }

    fn store(&self, rows: &[ServerRow]) -> Result<(), ServerCacheError> {
        if *self.fail_writes.lock() {
            return Err(ServerCacheError::Io(std::io::Error::other(
                "memory store configured to fail",
            )));
        }
        *self.rows.lock() = Some(rows.to_vec());
        *self.writes.lock() += 1;
        Ok(())
    }
}
