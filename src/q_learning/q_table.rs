//! Value table for tabular temporal difference learning

use std::{
    collections::{HashMap, hash_map},
    sync::{Arc, Mutex, MutexGuard},
};

use rand::{Rng, seq::IndexedRandom};

use crate::{
    error::{Error, Result},
    tictactoe::{BoardState, DEFAULT_SIZE},
};

/// Sparse mapping from board state to one value per cell.
///
/// Every vector holds `board_size²` slots, one per cell index, whether or not
/// that cell is free in the keyed state. A key is created lazily on first
/// access and is never removed; resetting zeroes the vectors in place.
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    board_size: usize,
    values: HashMap<BoardState, Vec<f64>>,
}

impl QTable {
    /// Create an empty table for boards of side `board_size`
    pub fn new(board_size: usize) -> Self {
        Self {
            board_size,
            values: HashMap::new(),
        }
    }

    pub fn board_size(&self) -> usize {
        self.board_size
    }

    /// Length of every value vector.
    pub fn columns(&self) -> usize {
        self.board_size * self.board_size
    }

    /// Values for `state`, if the state has been touched.
    pub fn get(&self, state: &BoardState) -> Option<&[f64]> {
        self.values.get(state).map(Vec::as_slice)
    }

    /// Value of a single cell; absent states read as zero.
    pub fn value(&self, state: &BoardState, index: usize) -> f64 {
        self.get(state)
            .and_then(|values| values.get(index).copied())
            .unwrap_or(0.0)
    }

    /// Values for `state`, inserting a zero vector first if needed.
    ///
    /// The key is cloned only when the state is new.
    pub fn get_or_create(&mut self, state: &BoardState) -> &mut [f64] {
        if !self.values.contains_key(state) {
            let columns = self.columns();
            self.values.insert(state.clone(), vec![0.0; columns]);
        }
        // Present after the insert above.
        self.values
            .get_mut(state)
            .map(Vec::as_mut_slice)
            .unwrap_or_default()
    }

    /// Insert a whole vector for `state`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptTable`] when the key or the vector does not fit
    /// this table's board size.
    pub fn insert(&mut self, state: BoardState, values: Vec<f64>) -> Result<()> {
        if state.size() != self.board_size {
            return Err(Error::CorruptTable {
                reason: format!(
                    "state of size {} in a table for size {}",
                    state.size(),
                    self.board_size
                ),
            });
        }
        if values.len() != self.columns() {
            return Err(Error::CorruptTable {
                reason: format!(
                    "value vector of length {} (expected {})",
                    values.len(),
                    self.columns()
                ),
            });
        }
        self.values.insert(state, values);
        Ok(())
    }

    /// Largest value over every slot of `state` (zero for a fresh state).
    pub fn max_value(&mut self, state: &BoardState) -> f64 {
        self.get_or_create(state)
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Highest-valued cell among `available`, ties broken uniformly at random.
    ///
    /// Slots outside `available` are ignored even when they hold the maximum.
    ///
    /// # Panics
    ///
    /// Panics if `available` is empty; callers must check for a terminal state
    /// before asking for a move.
    pub fn query_greedy_action<R: Rng + ?Sized>(
        &mut self,
        state: &BoardState,
        available: &[usize],
        rng: &mut R,
    ) -> usize {
        assert!(
            !available.is_empty(),
            "greedy action requested on a state with no available cells"
        );
        let values = self.get_or_create(state);
        let best = available
            .iter()
            .map(|&idx| values[idx])
            .fold(f64::NEG_INFINITY, f64::max);
        let tied: Vec<usize> = available
            .iter()
            .copied()
            .filter(|&idx| values[idx] >= best)
            .collect();
        // `tied` holds at least the index that produced `best`
        *tied.choose(rng).unwrap_or(&available[0])
    }

    /// Zero every stored vector; keys are kept.
    pub fn reset_all(&mut self) {
        for values in self.values.values_mut() {
            values.iter_mut().for_each(|v| *v = 0.0);
        }
    }

    /// Zero the vector for `state`, creating it if it was absent.
    pub fn reset(&mut self, state: &BoardState) {
        self.get_or_create(state).iter_mut().for_each(|v| *v = 0.0);
    }

    /// Visit every stored state with mutable access to its vector.
    pub fn for_each_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&BoardState, &mut [f64]),
    {
        for (state, values) in self.values.iter_mut() {
            f(state, values);
        }
    }

    pub fn iter(&self) -> hash_map::Iter<'_, BoardState, Vec<f64>> {
        self.values.iter()
    }

    /// Number of stored states
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of slots holding a non-zero value.
    pub fn nonzero_count(&self) -> usize {
        self.values
            .values()
            .flat_map(|values| values.iter())
            .filter(|v| **v != 0.0)
            .count()
    }
}

impl Default for QTable {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE)
    }
}

/// Lock-guarded handle to a [`QTable`] shared by learners and the
/// persistence worker.
///
/// A learner holds the lock for one choose/learn step at a time. Persistence
/// clones the table under the lock and serializes the clone after releasing
/// it, so a save never observes a half-applied update.
#[derive(Debug, Clone, Default)]
pub struct SharedQTable {
    inner: Arc<Mutex<QTable>>,
}

impl SharedQTable {
    pub fn new(table: QTable) -> Self {
        Self {
            inner: Arc::new(Mutex::new(table)),
        }
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, QTable>> {
        self.inner.lock().map_err(|_| Error::PoisonedLock)
    }

    /// Run `f` with exclusive access to the table.
    pub fn with<R>(&self, f: impl FnOnce(&mut QTable) -> R) -> Result<R> {
        let mut guard = self.lock()?;
        Ok(f(&mut guard))
    }

    /// Copy of the current table.
    pub fn snapshot(&self) -> Result<QTable> {
        self.with(|table| table.clone())
    }

    /// Swap in `table` wholesale, returning the previous one.
    pub fn replace(&self, table: QTable) -> Result<QTable> {
        self.with(|current| std::mem::replace(current, table))
    }

    /// Whether both handles refer to the same table.
    pub fn ptr_eq(&self, other: &SharedQTable) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
