//! In-memory table repository for testing.

use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{
    Result,
    ports::TableRepository,
    q_learning::{QTable, decode_table, encode_table},
};

/// Repository keeping encoded tables in a shared map instead of on disk.
///
/// Tables go through the same binary encoding as the file repository, so a
/// roundtrip exercises the persisted format. Clones share storage.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use tictactoe_rl::{adapters::InMemoryRepository, ports::TableRepository, q_learning::QTable};
///
/// let repo = InMemoryRepository::new();
/// repo.save(&QTable::default(), Path::new("agent"))?;
/// assert!(repo.contains(Path::new("agent")));
/// assert!(repo.load(Path::new("other"))?.is_none());
/// # Ok::<(), tictactoe_rl::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    storage: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn storage(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.storage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored tables.
    pub fn count(&self) -> usize {
        self.storage().len()
    }

    pub fn clear(&self) {
        self.storage().clear();
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.storage().contains_key(&key(path))
    }

    /// Store raw bytes under `path`, bypassing encoding.
    pub fn insert_raw(&self, path: &Path, bytes: Vec<u8>) {
        self.storage().insert(key(path), bytes);
    }
}

fn key(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

impl TableRepository for InMemoryRepository {
    fn save(&self, table: &QTable, path: &Path) -> Result<()> {
        let bytes = encode_table(table)?;
        self.storage().insert(key(path), bytes);
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<Option<QTable>> {
        let bytes = self.storage().get(&key(path)).cloned();
        bytes.map(|bytes| decode_table(&bytes)).transpose()
    }
}
