//! JSON file snapshot store with atomic writes.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::record::ServerRow;

use super::{ServerCacheError, SnapshotStore};

/// JSON array of server rows at a fixed path, used for both reads and writes.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create store, making parent directories if needed.
    pub fn new_with_create_dir(path: impl Into<PathBuf>) -> Result<Self, ServerCacheError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Vec<ServerRow>, ServerCacheError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| ServerCacheError::Serialization(e.to_string()))
    }

    fn store(&self, rows: &[ServerRow]) -> Result<(), ServerCacheError> {
        // Serialize before touching the filesystem
        let bytes = serde_json::to_vec_pretty(rows)
            .map_err(|e| ServerCacheError::Serialization(e.to_string()))?;

        // Write to temp file first, then rename (atomic)
        let tmp_path = self.tmp_path();
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            writer.write_all(&bytes)?;
            writer.flush()?;
        }

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}
