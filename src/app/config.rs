//! Configuration types for agent creation.

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    q_learning::{EngineKind, LearningParams, UpdateRule},
    tictactoe::{DEFAULT_SIZE, MIN_SIZE, Player},
};

/// Configuration for creating a learning agent.
///
/// # Examples
///
/// ```
/// use tictactoe_rl::app::AgentConfig;
/// use tictactoe_rl::q_learning::EngineKind;
///
/// let config = AgentConfig::new(EngineKind::SarsaLambda)
///     .with_epsilon(0.8)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Learning rule
    pub engine: EngineKind,
    /// Side length of the board
    pub board_size: usize,
    /// Mark placed by the agent; the opponent plays the other one
    pub mark: Player,
    /// Probability of playing the greedy move (the rest is uniform exploration)
    pub epsilon: f64,
    pub params: LearningParams,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl AgentConfig {
    /// Create a configuration for `engine` with the standard constants:
    /// 3x3 board, agent plays O, ε = 0.9, α = 0.1, γ = 0.9, λ = 0.7.
    pub fn new(engine: EngineKind) -> Self {
        Self {
            engine,
            board_size: DEFAULT_SIZE,
            mark: Player::O,
            epsilon: 0.9,
            params: LearningParams::default(),
            seed: None,
        }
    }

    pub fn with_board_size(mut self, size: usize) -> Self {
        self.board_size = size;
        self
    }

    pub fn with_mark(mut self, mark: Player) -> Self {
        self.mark = mark;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_learning_rate(mut self, alpha: f64) -> Self {
        self.params.learning_rate = alpha;
        self
    }

    pub fn with_discount(mut self, gamma: f64) -> Self {
        self.params.discount = gamma;
        self
    }

    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.params.lambda = lambda;
        self
    }

    pub fn with_update_rule(mut self, rule: UpdateRule) -> Self {
        self.params.update_rule = rule;
        self
    }

    pub fn with_rewards(mut self, win_reward: f64, threat_penalty: f64) -> Self {
        self.params.win_reward = win_reward;
        self.params.threat_penalty = threat_penalty;
        self
    }

    /// Set the random seed for deterministic behavior.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// The mark the agent plays against.
    pub fn opponent_mark(&self) -> Player {
        self.mark.opponent()
    }

    /// Check ranges of every parameter.
    pub fn validate(&self) -> Result<()> {
        if self.board_size < MIN_SIZE {
            return Err(Error::InvalidConfiguration {
                message: format!("board size must be at least {MIN_SIZE}, got {}", self.board_size),
            });
        }
        check_unit("epsilon", self.epsilon)?;
        check_unit("learning rate", self.params.learning_rate)?;
        check_unit("discount", self.params.discount)?;
        check_unit("lambda", self.params.lambda)?;
        if !self.params.win_reward.is_finite() || !self.params.threat_penalty.is_finite() {
            return Err(Error::InvalidConfiguration {
                message: "rewards must be finite".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new(EngineKind::default())
    }
}

pub(crate) fn check_unit(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidConfiguration {
            message: format!("{name} must be within [0, 1], got {value}"),
        })
    }
}
