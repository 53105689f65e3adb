//! Episode controller: drives one game between the learning agent and an
//! outside opponent.
//!
//! The caller submits opponent moves; the controller answers with the
//! agent's move, runs the engine's learning step and reports the outcome.

use log::{debug, info, warn};
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    app::{AgentConfig, config::check_unit},
    error::{Error, Result},
    q_learning::{Engine, EngineKind, QTable, SharedQTable, Transition},
    tictactoe::{Action, BoardState, Outcome, Player},
};

/// Callback invoked with the cell the agent just filled.
pub type MoveListener = Box<dyn FnMut(usize) + Send>;

fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// Owns the current board and one agent (engine + table handle).
pub struct EpisodeController {
    config: AgentConfig,
    table: SharedQTable,
    engine: Engine,
    state: BoardState,
    rng: StdRng,
    listener: Option<MoveListener>,
    last_agent_action: Option<Action>,
}

impl EpisodeController {
    /// Create a controller with a fresh, empty value table.
    pub fn new(config: AgentConfig) -> Result<Self> {
        let table = SharedQTable::new(QTable::new(config.board_size));
        Self::with_table(config, table)
    }

    /// Create a controller that learns into an existing table handle.
    ///
    /// Several controllers may share one handle; each still owns its own
    /// board, engine state and random stream.
    pub fn with_table(config: AgentConfig, table: SharedQTable) -> Result<Self> {
        config.validate()?;
        let table_size = table.with(|t| t.board_size())?;
        if table_size != config.board_size {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "value table is for a {table_size}x{table_size} board, agent plays {0}x{0}",
                    config.board_size
                ),
            });
        }

        Ok(Self {
            engine: Engine::new(config.engine, config.board_size),
            state: BoardState::new(config.board_size),
            rng: build_rng(config.seed),
            table,
            config,
            listener: None,
            last_agent_action: None,
        })
    }

    /// Register the callback fired after every agent move.
    pub fn set_listener(&mut self, listener: MoveListener) {
        self.listener = Some(listener);
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn table(&self) -> &SharedQTable {
        &self.table
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn mark(&self) -> Player {
        self.config.mark
    }

    pub fn opponent_mark(&self) -> Player {
        self.config.opponent_mark()
    }

    pub fn epsilon(&self) -> f64 {
        self.config.epsilon
    }

    /// Change the greedy probability; takes effect on the next agent move.
    pub fn set_epsilon(&mut self, epsilon: f64) -> Result<()> {
        check_unit("epsilon", epsilon)?;
        self.config.epsilon = epsilon;
        Ok(())
    }

    /// Switch learning rule, dropping any pending transition and trace.
    pub fn set_engine(&mut self, kind: EngineKind) {
        info!("switching engine to {}", kind.name());
        self.config.engine = kind;
        self.engine = Engine::new(kind, self.config.board_size);
    }

    /// Reseed the agent's random stream.
    pub fn set_rng_seed(&mut self, seed: u64) {
        self.config.seed = Some(seed);
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// The agent's most recent move in this episode.
    pub fn last_agent_action(&self) -> Option<Action> {
        self.last_agent_action
    }

    /// Outcome of the current board without playing.
    pub fn outcome(&self) -> Outcome {
        match self.state.winner() {
            Some(winner) if winner == self.config.mark => Outcome::AgentWin,
            Some(_) => Outcome::OpponentWin,
            None if self.state.is_full() => Outcome::Draw,
            None => Outcome::InProgress,
        }
    }

    /// Start a new episode on an empty board.
    pub fn reset_episode(&mut self) {
        info!("episode reset");
        self.state = BoardState::new(self.config.board_size);
        self.engine.reset_episode();
        self.last_agent_action = None;
    }

    /// Start a new episode from a position already in progress.
    ///
    /// # Errors
    ///
    /// Fails if `state` has the wrong size or is already decided.
    pub fn start_from(&mut self, state: BoardState) -> Result<()> {
        if state.size() != self.config.board_size {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "board of size {} for an agent playing size {}",
                    state.size(),
                    self.config.board_size
                ),
            });
        }
        if state.is_terminal() {
            return Err(Error::GameOver);
        }
        self.reset_episode();
        self.state = state;
        Ok(())
    }

    /// Apply the opponent's move and, unless the game ended, answer it.
    ///
    /// A move onto an occupied cell is ignored and reported as
    /// [`Outcome::InProgress`].
    ///
    /// # Errors
    ///
    /// Fails if the episode is already over, if `action` carries the agent's
    /// own mark, or if the value table lock is poisoned.
    pub fn apply_opponent_move(&mut self, action: Action) -> Result<Outcome> {
        if self.outcome().is_terminal() {
            return Err(Error::GameOver);
        }
        if action.player != self.opponent_mark() {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "opponent plays {}, got a move for {}",
                    self.opponent_mark(),
                    action.player
                ),
            });
        }

        debug!("opponent {action}");
        let Some(next) = self.state.mutate(action) else {
            warn!("rejected opponent move onto cell {}", action.index);
            return Ok(Outcome::InProgress);
        };
        self.state = next;

        let outcome = if self.state.winner() == Some(self.opponent_mark()) {
            Outcome::OpponentWin
        } else if self.state.is_full() {
            Outcome::Draw
        } else {
            return self.play_agent_turn();
        };

        // The agent's last move will never see a next action.
        let params = self.config.params;
        let mut table = self.table.lock()?;
        self.engine.finish_episode(&mut table, &params);
        Ok(outcome)
    }

    /// Let the agent move without a preceding opponent move, e.g. to open
    /// the episode.
    ///
    /// # Errors
    ///
    /// Fails if the episode is already over or the table lock is poisoned.
    pub fn agent_move(&mut self) -> Result<Outcome> {
        if self.outcome().is_terminal() {
            return Err(Error::GameOver);
        }
        self.play_agent_turn()
    }

    fn play_agent_turn(&mut self) -> Result<Outcome> {
        let params = self.config.params;
        let mark = self.config.mark;
        let state = self.state.clone();

        let (action, next_state) = {
            let mut table = self.table.lock()?;
            let action =
                Engine::choose_action(&mut table, &state, mark, self.config.epsilon, &mut self.rng);
            self.engine
                .complete_pending(&mut table, &params, Some(action));

            let (next_state, reward) = Engine::step(&state, action, &params)?;
            let transition = Transition {
                state,
                action,
                next_state: next_state.clone(),
                reward,
            };
            self.engine
                .do_learning(&mut table, &params, &transition, None);
            self.engine.remember(transition);
            (action, next_state)
        };

        self.state = next_state;
        self.last_agent_action = Some(action);
        if let Some(listener) = self.listener.as_mut() {
            listener(action.index);
        }

        Ok(if self.state.winner() == Some(mark) {
            Outcome::AgentWin
        } else if self.state.is_full() {
            Outcome::Draw
        } else {
            Outcome::InProgress
        })
    }
}
