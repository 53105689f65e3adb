//! Observer port for monitoring training runs
//!
//! Methods are called in this order:
//! 1. `on_training_start(total_games)`
//! 2. For each game: `on_game_start`, `on_agent_move` per agent move,
//!    `on_game_end`
//! 3. `on_training_end()`

use crate::{
    Result,
    tictactoe::{BoardState, Outcome},
};

/// Observer trait for monitoring training
///
/// Every method defaults to a no-op.
///
/// # Examples
///
/// ```
/// use tictactoe_rl::{ports::Observer, tictactoe::Outcome};
///
/// #[derive(Default)]
/// struct WinCounter {
///     wins: usize,
/// }
///
/// impl Observer for WinCounter {
///     fn on_game_end(&mut self, _game: usize, outcome: Outcome) -> tictactoe_rl::Result<()> {
///         if outcome == Outcome::AgentWin {
///             self.wins += 1;
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Observer: Send {
    fn on_training_start(&mut self, _total_games: usize) -> Result<()> {
        Ok(())
    }

    fn on_game_start(&mut self, _game: usize) -> Result<()> {
        Ok(())
    }

    /// Called after the agent has moved.
    ///
    /// `state` is the board after the move and `cell` the index played.
    fn on_agent_move(
        &mut self,
        _game: usize,
        _step: usize,
        _state: &BoardState,
        _cell: usize,
    ) -> Result<()> {
        Ok(())
    }

    /// Called once the game reaches a terminal outcome.
    fn on_game_end(&mut self, _game: usize, _outcome: Outcome) -> Result<()> {
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        Ok(())
    }
}
