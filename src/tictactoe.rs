//! Tic-Tac-Toe game implementation

pub mod board;
pub mod game;
pub mod lines;

pub use board::{
    Action, BoardState, Cell, DEFAULT_SIZE, MIN_SIZE, Player, coord_to_index, index_to_coord,
};
pub use game::Outcome;
pub use lines::{LineAnalyzer, LineFamily, LineMatch};
