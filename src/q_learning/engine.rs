//! Learning engines: Q-learning, SARSA and SARSA(λ)
//!
//! All three variants share the ε-greedy policy and the reward rule and differ
//! only in how a transition updates the value table.

use log::debug;
use rand::{Rng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    q_learning::q_table::QTable,
    tictactoe::{Action, BoardState, LineAnalyzer, Player},
};

/// Engine selector used by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    #[default]
    QLearning,
    Sarsa,
    SarsaLambda,
}

impl EngineKind {
    pub fn name(self) -> &'static str {
        match self {
            EngineKind::QLearning => "Q-Learning",
            EngineKind::Sarsa => "SARSA",
            EngineKind::SarsaLambda => "SARSA(λ)",
        }
    }
}

/// How the Q-learning rule writes its correction back into the table.
///
/// `Assign` stores `α·(target − predict)` and discards the previous value;
/// `Accumulate` is the textbook `predict + α·(target − predict)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateRule {
    #[default]
    Assign,
    Accumulate,
}

/// Step sizes and reward constants shared by every engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LearningParams {
    /// α
    pub learning_rate: f64,
    /// γ
    pub discount: f64,
    /// λ, only read by SARSA(λ)
    pub lambda: f64,
    pub update_rule: UpdateRule,
    /// Reward for completing a line
    pub win_reward: f64,
    /// Reward for leaving the opponent a one-move win
    pub threat_penalty: f64,
}

impl Default for LearningParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount: 0.9,
            lambda: 0.7,
            update_rule: UpdateRule::default(),
            win_reward: 1.0,
            threat_penalty: -1.0,
        }
    }
}

/// One agent move and its consequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: BoardState,
    pub action: Action,
    pub next_state: BoardState,
    pub reward: f64,
}

/// A learning rule together with the per-episode state it needs.
#[derive(Debug, Clone)]
pub enum Engine {
    QLearning,
    Sarsa {
        last: Option<Transition>,
    },
    SarsaLambda {
        last: Option<Transition>,
        trace: QTable,
    },
}

impl Engine {
    pub fn new(kind: EngineKind, board_size: usize) -> Self {
        match kind {
            EngineKind::QLearning => Engine::QLearning,
            EngineKind::Sarsa => Engine::Sarsa { last: None },
            EngineKind::SarsaLambda => Engine::SarsaLambda {
                last: None,
                trace: QTable::new(board_size),
            },
        }
    }

    pub fn kind(&self) -> EngineKind {
        match self {
            Engine::QLearning => EngineKind::QLearning,
            Engine::Sarsa { .. } => EngineKind::Sarsa,
            Engine::SarsaLambda { .. } => EngineKind::SarsaLambda,
        }
    }

    /// Forget the pending transition and zero the eligibility trace.
    pub fn reset_episode(&mut self) {
        match self {
            Engine::QLearning => {}
            Engine::Sarsa { last } => *last = None,
            Engine::SarsaLambda { last, trace } => {
                *last = None;
                trace.reset_all();
            }
        }
    }

    /// The transition still waiting for its next action.
    pub fn pending(&self) -> Option<&Transition> {
        match self {
            Engine::QLearning => None,
            Engine::Sarsa { last } | Engine::SarsaLambda { last, .. } => last.as_ref(),
        }
    }

    /// Eligibility trace, for SARSA(λ) only.
    pub fn trace(&self) -> Option<&QTable> {
        match self {
            Engine::SarsaLambda { trace, .. } => Some(trace),
            _ => None,
        }
    }

    /// ε-greedy move for `mark`.
    ///
    /// With probability `epsilon` the table's greedy cell is played (ties
    /// broken at random); otherwise a uniformly random free cell.
    ///
    /// # Panics
    ///
    /// Panics if `state` has no free cell.
    pub fn choose_action<R: Rng + ?Sized>(
        table: &mut QTable,
        state: &BoardState,
        mark: Player,
        epsilon: f64,
        rng: &mut R,
    ) -> Action {
        let available = state.available_actions();
        assert!(
            !available.is_empty(),
            "choose_action called on a full board; check for a terminal state first"
        );

        let index = if rng.random::<f64>() < epsilon {
            table.query_greedy_action(state, &available, rng)
        } else {
            *available.choose(rng).unwrap_or(&available[0])
        };
        Action::new(index, mark)
    }

    /// Apply `action` and score the resulting state for the mover.
    ///
    /// The reward is `win_reward` when the mover completes a line,
    /// `threat_penalty` when the opponent is left one move from a win, and
    /// zero otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMove`] if the target cell is occupied.
    pub fn step(
        state: &BoardState,
        action: Action,
        params: &LearningParams,
    ) -> Result<(BoardState, f64)> {
        let next = state.mutate(action).ok_or(Error::InvalidMove {
            position: action.index,
        })?;

        let reward = if LineAnalyzer::has_won(&next, action.player) {
            params.win_reward
        } else if LineAnalyzer::one_more_step_to_win(&next, action.player.opponent()) {
            params.threat_penalty
        } else {
            0.0
        };
        debug!("agent {action}: reward={reward}");
        Ok((next, reward))
    }

    /// Update `table` for `transition`.
    ///
    /// The SARSA variants need the action taken from the next state; when
    /// `next_action` is `None` and the next state is not terminal the update
    /// is skipped and left for [`Engine::complete_pending`].
    pub fn do_learning(
        &mut self,
        table: &mut QTable,
        params: &LearningParams,
        transition: &Transition,
        next_action: Option<Action>,
    ) {
        let terminal = transition.next_state.is_terminal();
        self.learn(table, params, transition, next_action, terminal);
    }

    fn learn(
        &mut self,
        table: &mut QTable,
        params: &LearningParams,
        transition: &Transition,
        next_action: Option<Action>,
        terminal: bool,
    ) {
        let Transition {
            state,
            action,
            next_state,
            reward,
        } = transition;
        let predict = table.get_or_create(state)[action.index];

        match self {
            Engine::QLearning => {
                let target = if terminal {
                    *reward
                } else {
                    reward + params.discount * table.max_value(next_state)
                };
                let delta = params.learning_rate * (target - predict);
                let slot = &mut table.get_or_create(state)[action.index];
                match params.update_rule {
                    UpdateRule::Assign => *slot = delta,
                    UpdateRule::Accumulate => *slot += delta,
                }
            }
            Engine::Sarsa { .. } => {
                let Some(target) = sarsa_target(table, params, transition, next_action, terminal)
                else {
                    return;
                };
                table.get_or_create(state)[action.index] +=
                    params.learning_rate * (target - predict);
            }
            Engine::SarsaLambda { trace, .. } => {
                let Some(target) = sarsa_target(table, params, transition, next_action, terminal)
                else {
                    return;
                };
                trace.get_or_create(state)[action.index] = 1.0;

                // Only traced states can change.
                let step = params.learning_rate * (target - predict);
                for (visited, eligibility) in trace.iter() {
                    let values = table.get_or_create(visited);
                    for (value, e) in values.iter_mut().zip(eligibility) {
                        *value += step * e;
                    }
                }

                let decay = params.discount * params.lambda;
                trace.for_each_mut(|_, values| values.iter_mut().for_each(|e| *e *= decay));
            }
        }
    }

    /// Remember `transition` so the next agent move can complete it.
    pub fn remember(&mut self, transition: Transition) {
        match self {
            Engine::QLearning => {}
            Engine::Sarsa { last } | Engine::SarsaLambda { last, .. } => {
                *last = Some(transition);
            }
        }
    }

    /// Finish the pending SARSA update now that `next_action` is known.
    ///
    /// With `None` the pending transition stays deferred unless it already
    /// ended the episode. Returns whether an update was applied.
    pub fn complete_pending(
        &mut self,
        table: &mut QTable,
        params: &LearningParams,
        next_action: Option<Action>,
    ) -> bool {
        let ready = match self.pending() {
            Some(pending) => next_action.is_some() || pending.next_state.is_terminal(),
            None => false,
        };
        if !ready {
            return false;
        }

        let pending = match self {
            Engine::QLearning => None,
            Engine::Sarsa { last } | Engine::SarsaLambda { last, .. } => last.take(),
        };
        match pending {
            Some(transition) => {
                self.do_learning(table, params, &transition, next_action);
                true
            }
            None => false,
        }
    }

    /// Close the pending SARSA transition when the episode ended on the
    /// opponent's move.
    ///
    /// The opponent's move ends the episode, so the pending target is its bare
    /// reward with no bootstrap. Returns whether an update was applied.
    pub fn finish_episode(&mut self, table: &mut QTable, params: &LearningParams) -> bool {
        let pending = match self {
            Engine::QLearning => None,
            Engine::Sarsa { last } | Engine::SarsaLambda { last, .. } => last.take(),
        };
        match pending {
            Some(transition) => {
                self.learn(table, params, &transition, None, true);
                true
            }
            None => false,
        }
    }
}

fn sarsa_target(
    table: &QTable,
    params: &LearningParams,
    transition: &Transition,
    next_action: Option<Action>,
    terminal: bool,
) -> Option<f64> {
    if terminal {
        return Some(transition.reward);
    }
    let next = next_action?;
    Some(transition.reward + params.discount * table.value(&transition.next_state, next.index))
}
