//! Winning line analysis
//!
//! Scans the rows, the columns and the two main diagonals of a square board.
//! Off-diagonals never count as lines, whatever the board size.

use log::trace;

use super::{BoardState, Cell, Player, board::coord_to_index};

/// Line families in scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFamily {
    Row,
    Column,
    MainDiagonal,
    AntiDiagonal,
}

/// A line that reached the requested net count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMatch {
    pub family: LineFamily,
    /// Last empty cell seen on the line, if any.
    pub empty: Option<usize>,
}

/// Stateless win and threat detector
pub struct LineAnalyzer;

impl LineAnalyzer {
    /// All lines of a `size` board: rows, then columns, then the two diagonals.
    pub fn lines(size: usize) -> Vec<(LineFamily, Vec<usize>)> {
        let mut lines = Vec::with_capacity(2 * size + 2);
        for row in 0..size {
            lines.push((
                LineFamily::Row,
                (0..size).map(|col| coord_to_index(row, col, size)).collect(),
            ));
        }
        for col in 0..size {
            lines.push((
                LineFamily::Column,
                (0..size).map(|row| coord_to_index(row, col, size)).collect(),
            ));
        }
        lines.push((
            LineFamily::MainDiagonal,
            (0..size).map(|i| coord_to_index(i, i, size)).collect(),
        ));
        lines.push((
            LineFamily::AntiDiagonal,
            (0..size)
                .map(|i| coord_to_index(i, size - 1 - i, size))
                .collect(),
        ));
        lines
    }

    /// Check if a player has a completed line
    pub fn has_won(state: &BoardState, player: Player) -> bool {
        Self::detect(state, player, state.size()).is_some()
    }

    /// Check if a player has a line one move away from completion
    pub fn one_more_step_to_win(state: &BoardState, player: Player) -> bool {
        Self::detect(state, player, state.size() - 1).is_some()
    }

    /// The empty cell that would complete the first qualifying line.
    ///
    /// Lines are scanned rows first, then columns, then the two diagonals;
    /// the first match wins.
    pub fn find_best_step(state: &BoardState, player: Player) -> Option<usize> {
        Self::detect(state, player, state.size() - 1).and_then(|found| found.empty)
    }

    /// Find the first line whose net count equals `expect`.
    ///
    /// The net count adds one per cell held by `player` and subtracts one per
    /// cell held by the opponent, so a line containing both marks can only
    /// reach `size` or `size - 1` if the opponent is absent.
    pub fn detect(state: &BoardState, player: Player, expect: usize) -> Option<LineMatch> {
        let target = player.to_cell();
        let expect = expect as isize;
        let cells = state.cells();

        for (family, line) in Self::lines(state.size()) {
            let mut collector: isize = 0;
            let mut empty = None;
            for &idx in &line {
                match cells[idx] {
                    c if c == target => collector += 1,
                    Cell::Empty => empty = Some(idx),
                    _ => collector -= 1,
                }
            }
            if collector == expect {
                trace!("{family:?} line {line:?} qualifies for {player} (expect={expect})");
                return Some(LineMatch { family, empty });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(s: &str) -> BoardState {
        BoardState::from_string(s).unwrap()
    }

    #[test]
    fn test_has_won_horizontal() {
        let state = board("XXX......");
        assert!(LineAnalyzer::has_won(&state, Player::X));
        assert!(!LineAnalyzer::has_won(&state, Player::O));
    }

    #[test]
    fn test_has_won_vertical() {
        let state = board("O..O..O..");
        assert!(LineAnalyzer::has_won(&state, Player::O));
        assert!(!LineAnalyzer::has_won(&state, Player::X));
    }

    #[test]
    fn test_has_won_diagonals() {
        assert!(LineAnalyzer::has_won(&board("X...X...X"), Player::X));
        assert!(LineAnalyzer::has_won(&board("..O.O.O.."), Player::O));
    }

    #[test]
    fn test_empty_board_is_neutral() {
        let state = BoardState::default();
        for player in [Player::X, Player::O] {
            assert!(!LineAnalyzer::has_won(&state, player));
            assert!(!LineAnalyzer::one_more_step_to_win(&state, player));
            assert_eq!(LineAnalyzer::find_best_step(&state, player), None);
        }
    }

    #[test]
    fn test_threats_for_both_players() {
        let state = board("XX.OO....");
        assert!(LineAnalyzer::one_more_step_to_win(&state, Player::X));
        assert_eq!(LineAnalyzer::find_best_step(&state, Player::X), Some(2));
        assert!(LineAnalyzer::one_more_step_to_win(&state, Player::O));
        assert_eq!(LineAnalyzer::find_best_step(&state, Player::O), Some(5));
    }

    #[test]
    fn test_blocked_line_is_not_a_threat() {
        let state = board("XXO......");
        assert!(!LineAnalyzer::one_more_step_to_win(&state, Player::X));
        assert_eq!(LineAnalyzer::find_best_step(&state, Player::X), None);
    }

    #[test]
    fn test_scan_order_rows_before_columns() {
        // X X .
        // X . .
        // . . .
        let state = board("XX.X.....");
        let found = LineAnalyzer::detect(&state, Player::X, 2).unwrap();
        assert_eq!(found.family, LineFamily::Row);
        assert_eq!(LineAnalyzer::find_best_step(&state, Player::X), Some(2));
    }

    #[test]
    fn test_diagonal_threat() {
        let state = board("..X.X....");
        assert_eq!(LineAnalyzer::find_best_step(&state, Player::X), Some(6));
        let found = LineAnalyzer::detect(&state, Player::X, 2).unwrap();
        assert_eq!(found.family, LineFamily::AntiDiagonal);
    }

    #[test]
    fn test_four_by_four_lines() {
        let lines = LineAnalyzer::lines(4);
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[8].1, vec![0, 5, 10, 15]);
        assert_eq!(lines[9].1, vec![3, 6, 9, 12]);

        let state = board("OOO. .... .... ....");
        assert_eq!(LineAnalyzer::find_best_step(&state, Player::O), Some(3));
        assert!(!LineAnalyzer::has_won(&state, Player::O));
    }
}
