//! Repository port for value table persistence.

use std::path::Path;

use crate::{Result, q_learning::QTable};

/// Port for persisting and loading value tables.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use tictactoe_rl::{ports::TableRepository, q_learning::QTable};
///
/// fn restore<R: TableRepository>(repo: &R, path: &Path) -> tictactoe_rl::Result<QTable> {
///     Ok(repo.load(path)?.unwrap_or_default())
/// }
/// ```
pub trait TableRepository {
    /// Write `table` to `path`, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns an error if the location cannot be written or encoding fails.
    fn save(&self, table: &QTable, path: &Path) -> Result<()>;

    /// Read the table stored at `path`.
    ///
    /// Nothing stored at `path` is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored data cannot be read or is not a valid
    /// table.
    fn load(&self, path: &Path) -> Result<Option<QTable>>;
}

impl<T: TableRepository + ?Sized> TableRepository for std::sync::Arc<T> {
    fn save(&self, table: &QTable, path: &Path) -> Result<()> {
        (**self).save(table, path)
    }

    fn load(&self, path: &Path) -> Result<Option<QTable>> {
        (**self).load(path)
    }
}
