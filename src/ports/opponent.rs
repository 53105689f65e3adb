//! Opponent port - anything that can pick a cell for a mark

use crate::{Result, tictactoe::BoardState, tictactoe::Player};

/// A player the learning agent can be trained against.
///
/// # Examples
///
/// ```
/// use tictactoe_rl::{ports::Opponent, tictactoe::{BoardState, Player}};
///
/// struct FirstFree;
///
/// impl Opponent for FirstFree {
///     fn select_move(&mut self, state: &BoardState, _mark: Player) -> tictactoe_rl::Result<usize> {
///         state
///             .available_actions()
///             .first()
///             .copied()
///             .ok_or(tictactoe_rl::Error::GameOver)
///     }
///
///     fn name(&self) -> &str {
///         "first-free"
///     }
/// }
///
/// let mut opponent = FirstFree;
/// assert_eq!(opponent.select_move(&BoardState::default(), Player::X).unwrap(), 0);
/// ```
pub trait Opponent: Send {
    /// Pick a free cell for `mark` on `state`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::GameOver`] when no cell is free.
    fn select_move(&mut self, state: &BoardState, mark: Player) -> Result<usize>;

    /// Name used in logs and summaries.
    fn name(&self) -> &str;

    /// Seed the opponent's random stream. Deterministic opponents ignore it.
    fn set_rng_seed(&mut self, _seed: u64) {}
}
