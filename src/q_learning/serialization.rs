//! Binary persistence format for value tables.

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    q_learning::q_table::QTable,
    tictactoe::BoardState,
};

/// Versioned envelope written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedQTable {
    pub version: u32,
    pub board_size: usize,
    entries: Vec<(BoardState, Vec<f64>)>,
}

impl SavedQTable {
    pub const VERSION: u32 = 1;

    pub fn from_table(table: &QTable) -> Self {
        Self {
            version: Self::VERSION,
            board_size: table.board_size(),
            entries: table
                .iter()
                .map(|(state, values)| (state.clone(), values.clone()))
                .collect(),
        }
    }

    /// Rebuild the table, validating every entry.
    ///
    /// # Errors
    ///
    /// Returns an error on a version mismatch or on any entry whose shape does
    /// not match `board_size`.
    pub fn into_table(self) -> Result<QTable> {
        if self.version != Self::VERSION {
            return Err(Error::UnsupportedVersion {
                found: self.version,
                expected: Self::VERSION,
            });
        }
        if self.board_size == 0 {
            return Err(Error::CorruptTable {
                reason: "board size of zero".to_string(),
            });
        }

        let mut table = QTable::new(self.board_size);
        for (state, values) in self.entries {
            if state.cells().len() != state.size() * state.size() {
                return Err(Error::CorruptTable {
                    reason: format!("malformed state '{}'", state.encode()),
                });
            }
            table.insert(state, values)?;
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        rmp_serde::to_vec(self).map_err(|e| Error::SerializationContext {
            operation: "serialize value table to MessagePack".to_string(),
            message: e.to_string(),
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        rmp_serde::from_slice(bytes).map_err(|e| Error::SerializationContext {
            operation: "deserialize value table from MessagePack".to_string(),
            message: e.to_string(),
        })
    }
}

/// Encode a table to the persisted binary form.
pub fn encode_table(table: &QTable) -> Result<Vec<u8>> {
    SavedQTable::from_table(table).to_bytes()
}

/// Decode a table from the persisted binary form.
pub fn decode_table(bytes: &[u8]) -> Result<QTable> {
    SavedQTable::from_bytes(bytes)?.into_table()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tictactoe::{Action, Player};

    fn trained_table() -> QTable {
        let mut table = QTable::default();
        let root = BoardState::default();
        let next = root.mutate(Action::new(4, Player::X)).unwrap();
        table.get_or_create(&root)[4] = 0.125;
        table.get_or_create(&next)[0] = -0.3;
        table.get_or_create(&next)[8] = 1.0 / 3.0;
        table
    }

    #[test]
    fn test_roundtrip_is_exact() {
        let table = trained_table();
        let bytes = encode_table(&table).unwrap();
        let loaded = decode_table(&bytes).unwrap();
        assert_eq!(loaded, table);
    }

    #[test]
    fn test_truncated_blob_is_rejected() {
        let bytes = encode_table(&trained_table()).unwrap();
        let truncated = &bytes[..bytes.len() / 2];
        assert!(decode_table(truncated).is_err());
    }

    #[test]
    fn test_version_mismatch_is_rejected() {
        let mut saved = SavedQTable::from_table(&trained_table());
        saved.version = 99;
        let err = saved.into_table().unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion { found: 99, .. }));
    }

    #[test]
    fn test_wrong_vector_length_is_rejected() {
        let saved = SavedQTable {
            version: SavedQTable::VERSION,
            board_size: 3,
            entries: vec![(BoardState::default(), vec![0.0; 4])],
        };
        assert!(matches!(
            saved.into_table(),
            Err(Error::CorruptTable { .. })
        ));
    }
}
