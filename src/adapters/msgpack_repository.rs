//! MessagePack implementation of the table repository.

use std::{fs, path::Path};

use log::info;

use crate::{
    Result,
    error::Error,
    ports::TableRepository,
    q_learning::{QTable, decode_table, encode_table},
};

/// File-backed repository storing the versioned MessagePack envelope.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use tictactoe_rl::{adapters::MsgPackRepository, ports::TableRepository, q_learning::QTable};
///
/// let repo = MsgPackRepository::new();
/// repo.save(&QTable::default(), Path::new("values.msgpack"))?;
/// let loaded = repo.load(Path::new("values.msgpack"))?;
/// assert!(loaded.is_some());
/// # Ok::<(), tictactoe_rl::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackRepository;

impl MsgPackRepository {
    pub fn new() -> Self {
        Self
    }
}

impl TableRepository for MsgPackRepository {
    fn save(&self, table: &QTable, path: &Path) -> Result<()> {
        let bytes = encode_table(table)?;
        fs::write(path, bytes).map_err(|source| Error::Io {
            operation: format!("write value table to {path:?}"),
            source,
        })?;
        info!("saved {} states to {}", table.len(), path.display());
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<Option<QTable>> {
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(path).map_err(|source| Error::Io {
            operation: format!("read value table from {path:?}"),
            source,
        })?;
        let table = decode_table(&bytes)?;
        info!("loaded {} states from {}", table.len(), path.display());
        Ok(Some(table))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::tictactoe::BoardState;

    #[test]
    fn test_msgpack_roundtrip() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file_path = temp_dir.path().join("values.msgpack");

        let mut table = QTable::default();
        table.get_or_create(&BoardState::default())[4] = 0.42;

        let repo = MsgPackRepository::new();
        repo.save(&table, &file_path).expect("Failed to save");
        let loaded = repo.load(&file_path).expect("Failed to load");

        assert_eq!(loaded, Some(table));
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let repo = MsgPackRepository::new();
        let loaded = repo.load(&temp_dir.path().join("absent.msgpack")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_garbage_returns_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file_path = temp_dir.path().join("garbage.msgpack");
        fs::write(&file_path, b"not a table").unwrap();

        assert!(MsgPackRepository::new().load(&file_path).is_err());
    }

    #[test]
    fn test_save_to_invalid_path_returns_error() {
        let repo = MsgPackRepository::new();
        let result = repo.save(
            &QTable::default(),
            Path::new("/invalid_dir_12345/values.msgpack"),
        );
        assert!(result.is_err());
    }
}
