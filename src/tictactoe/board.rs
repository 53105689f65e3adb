//! Board state representation and basic operations

use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::OnceLock,
};

use serde::{Deserialize, Serialize};

use super::lines::LineAnalyzer;

/// Side length of the standard board.
pub const DEFAULT_SIZE: usize = 3;

/// Smallest supported side length.
pub const MIN_SIZE: usize = 2;

/// A cell on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    X,
    O,
}

impl Cell {
    pub fn to_char(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::X => 'X',
            Cell::O => 'O',
        }
    }

    pub fn from_char(c: char) -> Option<Cell> {
        match c {
            '.' | '_' | ' ' => Some(Cell::Empty),
            'X' | 'x' => Some(Cell::X),
            'O' | 'o' | '0' => Some(Cell::O),
            _ => None,
        }
    }

    /// The player owning this cell, if any.
    pub fn to_player(self) -> Option<Player> {
        match self {
            Cell::Empty => None,
            Cell::X => Some(Player::X),
            Cell::O => Some(Player::O),
        }
    }
}

/// A player in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    X,
    O,
}

impl Player {
    /// Get the opponent player
    pub fn opponent(self) -> Player {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }

    /// Convert player to cell
    pub fn to_cell(self) -> Cell {
        match self {
            Player::X => Cell::X,
            Player::O => Cell::O,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_cell().to_char())
    }
}

/// Convert a row-major cell index into `(row, col)`.
pub fn index_to_coord(index: usize, size: usize) -> (usize, usize) {
    (index / size, index % size)
}

/// Convert `(row, col)` into a row-major cell index.
pub fn coord_to_index(row: usize, col: usize, size: usize) -> usize {
    row * size + col
}

/// Placing `player`'s mark on cell `index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    pub index: usize,
    pub player: Player,
}

impl Action {
    pub fn new(index: usize, player: Player) -> Self {
        Self { index, player }
    }

    pub fn from_coord(row: usize, col: usize, size: usize, player: Player) -> Self {
        Self::new(coord_to_index(row, col, size), player)
    }

    pub fn coord(&self, size: usize) -> (usize, usize) {
        index_to_coord(self.index, size)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "set cell {} to {}", self.index, self.player)
    }
}

/// Immutable square grid of cells.
///
/// Every move produces a new `BoardState` through [`BoardState::mutate`]; an
/// existing state is never modified after construction. That makes it safe to
/// use as a value-table key and to share between threads. Equality and hashing
/// are structural over the grid contents; the memoized winner is not part of
/// either.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardState {
    size: usize,
    cells: Vec<Cell>,
    #[serde(skip)]
    winner: OnceLock<Option<Player>>,
}

impl BoardState {
    /// Create an empty board with side length `size`.
    ///
    /// # Panics
    ///
    /// Panics if `size` is below [`MIN_SIZE`]; a 1x1 board has no
    /// meaningful lines.
    pub fn new(size: usize) -> Self {
        assert!(size >= MIN_SIZE, "board size must be at least {MIN_SIZE}");
        Self {
            size,
            cells: vec![Cell::Empty; size * size],
            winner: OnceLock::new(),
        }
    }

    /// Build a board from row-major cells.
    ///
    /// # Errors
    ///
    /// Returns an error if `size` is below [`MIN_SIZE`] or `cells` does not
    /// hold exactly `size * size` entries.
    pub fn from_cells(size: usize, cells: Vec<Cell>) -> Result<Self, crate::Error> {
        if size < MIN_SIZE || cells.len() != size * size {
            return Err(crate::Error::InvalidConfiguration {
                message: format!(
                    "a {size}x{size} board needs {} cells, got {}",
                    size * size,
                    cells.len()
                ),
            });
        }
        Ok(Self {
            size,
            cells,
            winner: OnceLock::new(),
        })
    }

    /// Parse a board from a row-major string such as `"XX.OO...."`.
    ///
    /// Whitespace is ignored and the side length is inferred from the number of
    /// cells, which must be a perfect square.
    ///
    /// # Errors
    ///
    /// Returns an error on unknown characters or a non-square cell count.
    pub fn from_string(s: &str) -> Result<Self, crate::Error> {
        let cells = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .enumerate()
            .map(|(i, c)| {
                Cell::from_char(c).ok_or_else(|| crate::Error::InvalidConfiguration {
                    message: format!("invalid character '{c}' at position {i} in '{s}'"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let size = (1..=cells.len())
            .find(|n| n * n >= cells.len())
            .unwrap_or(0);
        Self::from_cells(size, cells)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Bounds-checked read of `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Result<Cell, crate::Error> {
        if row >= self.size || col >= self.size {
            return Err(crate::Error::InvalidPosition {
                position: coord_to_index(row, col, self.size),
                size: self.size,
            });
        }
        Ok(self.cells[coord_to_index(row, col, self.size)])
    }

    /// Cell at row-major `index`, or `None` when out of range.
    pub fn cell(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    /// Apply `action` to a copy of this state.
    ///
    /// Returns `None` when the target cell is occupied or out of range; the
    /// receiver is never modified.
    pub fn mutate(&self, action: Action) -> Option<BoardState> {
        if self.cell(action.index)? != Cell::Empty {
            return None;
        }
        let mut cells = self.cells.clone();
        cells[action.index] = action.player.to_cell();
        Some(Self {
            size: self.size,
            cells,
            winner: OnceLock::new(),
        })
    }

    /// Empty cell indices in row-major order.
    pub fn available_actions(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| **cell == Cell::Empty)
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|&cell| cell != Cell::Empty)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|&cell| cell == Cell::Empty)
    }

    /// Count the number of occupied cells on the board.
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&cell| cell != Cell::Empty).count()
    }

    /// The player with a completed line, computed once per state.
    pub fn winner(&self) -> Option<Player> {
        *self.winner.get_or_init(|| {
            [Player::X, Player::O]
                .into_iter()
                .find(|&player| LineAnalyzer::has_won(self, player))
        })
    }

    /// Full or already won.
    pub fn is_terminal(&self) -> bool {
        self.winner().is_some() || self.is_full()
    }

    pub fn contains_in_row(&self, row: usize, player: Player) -> bool {
        row < self.size
            && (0..self.size)
                .any(|col| self.cells[coord_to_index(row, col, self.size)] == player.to_cell())
    }

    pub fn contains_in_column(&self, col: usize, player: Player) -> bool {
        col < self.size
            && (0..self.size)
                .any(|row| self.cells[coord_to_index(row, col, self.size)] == player.to_cell())
    }

    /// Row-major string encoding, e.g. `"XX.OO...."`.
    pub fn encode(&self) -> String {
        self.cells.iter().map(|cell| cell.to_char()).collect()
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE)
    }
}

impl PartialEq for BoardState {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.cells == other.cells
    }
}

impl Eq for BoardState {}

impl Hash for BoardState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.size.hash(state);
        self.cells.hash(state);
    }
}

impl fmt::Display for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.size) {
            let line: String = row.iter().map(|cell| cell.to_char()).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_new_board() {
        let board = BoardState::default();
        assert_eq!(board.size(), 3);
        assert!(board.is_empty());
        assert_eq!(board.available_actions().len(), 9);
        assert_eq!(board.winner(), None);
    }

    #[test]
    fn test_mutate_returns_new_state() {
        let board = BoardState::default();
        let next = board.mutate(Action::new(4, Player::X)).unwrap();

        assert_eq!(board.get(1, 1).unwrap(), Cell::Empty);
        assert_eq!(next.get(1, 1).unwrap(), Cell::X);
        assert_eq!(next.occupied_count(), 1);
    }

    #[test]
    fn test_mutate_rejects_occupied_cell() {
        let board = BoardState::from_string("X........").unwrap();
        assert!(board.mutate(Action::new(0, Player::O)).is_none());
        assert!(board.mutate(Action::new(9, Player::O)).is_none());
    }

    #[test]
    fn test_mutate_is_pure() {
        let board = BoardState::from_string("X...O....").unwrap();
        let a = board.mutate(Action::new(2, Player::X)).unwrap();
        let b = board.mutate(Action::new(2, Player::X)).unwrap();
        assert_eq!(a, b);
        assert_eq!(board.encode(), "X...O....");
    }

    #[test]
    fn test_available_actions_row_major() {
        let board = BoardState::from_string("X.O.X.O..").unwrap();
        assert_eq!(board.available_actions(), vec![1, 3, 5, 7, 8]);
        assert_eq!(
            board.available_actions().len() + board.occupied_count(),
            board.size() * board.size()
        );
    }

    #[test]
    fn test_single_cell_board_rejected() {
        assert!(BoardState::from_cells(1, vec![Cell::Empty]).is_err());
        assert!(BoardState::from_string(".").is_err());
    }

    #[test]
    #[should_panic(expected = "board size must be at least")]
    fn test_new_single_cell_board_panics() {
        BoardState::new(1);
    }

    #[test]
    fn test_get_out_of_bounds() {
        let board = BoardState::default();
        assert!(board.get(3, 0).is_err());
        assert!(board.get(0, 3).is_err());
    }

    #[test]
    fn test_draw_detection() {
        let board = BoardState::from_string("XOXOXOOXO").unwrap();
        assert!(board.is_full());
        assert_eq!(board.winner(), None);
        assert!(board.is_terminal());
    }

    #[test]
    fn test_winner_memoized() {
        let board = BoardState::from_string("XXXOO....").unwrap();
        assert_eq!(board.winner(), Some(Player::X));
        assert_eq!(board.winner(), Some(Player::X));
        assert!(board.is_terminal());
    }

    #[test]
    fn test_equality_ignores_memo() {
        let a = BoardState::from_string("XXXOO....").unwrap();
        let b = BoardState::from_string("XXXOO....").unwrap();
        let _ = a.winner();

        assert_eq!(a, b);
        let set: HashSet<BoardState> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_coord_mapping() {
        for index in 0..9 {
            let (row, col) = index_to_coord(index, 3);
            assert_eq!(coord_to_index(row, col, 3), index);
        }
        assert_eq!(Action::from_coord(2, 1, 3, Player::O).index, 7);
    }

    #[test]
    fn test_from_string_rejects_non_square() {
        assert!(BoardState::from_string("XO.").is_err());
        assert!(BoardState::from_string("XO.?.....").is_err());
    }

    #[test]
    fn test_larger_board() {
        let board = BoardState::new(4);
        assert_eq!(board.available_actions().len(), 16);
        let board = board.mutate(Action::from_coord(3, 3, 4, Player::O)).unwrap();
        assert_eq!(board.cell(15), Some(Cell::O));
        assert!(board.contains_in_row(3, Player::O));
        assert!(board.contains_in_column(3, Player::O));
        assert!(!board.contains_in_row(0, Player::O));
    }

    #[test]
    fn test_display() {
        let board = BoardState::from_string("XOX.O.X..").unwrap();
        let display = format!("{board}");
        assert!(display.contains("XOX"));
        assert!(display.contains(".O."));
        assert!(display.contains("X.."));
    }
}
