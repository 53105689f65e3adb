//! Tabular temporal difference learning
//!
//! A [`QTable`] maps every visited board to one value per cell. Three
//! [`Engine`] variants write into it:
//!
//! | Engine | Target | Update |
//! |--------|--------|--------|
//! | Q-learning | `r + γ·max Q(s')` | one slot |
//! | SARSA | `r + γ·Q(s', a')` | one slot, deferred until `a'` is known |
//! | SARSA(λ) | `r + γ·Q(s', a')` | every slot weighted by its eligibility |
//!
//! Terminal transitions use the bare reward as target.
//!
//! ## Usage Example
//!
//! ```
//! use rand::{SeedableRng, rngs::StdRng};
//! use tictactoe_rl::q_learning::{Engine, EngineKind, LearningParams, QTable, Transition};
//! use tictactoe_rl::tictactoe::{BoardState, Player};
//!
//! let mut table = QTable::default();
//! let mut engine = Engine::new(EngineKind::QLearning, 3);
//! let params = LearningParams::default();
//! let mut rng = StdRng::seed_from_u64(0);
//!
//! let state = BoardState::default();
//! let action = Engine::choose_action(&mut table, &state, Player::X, 0.9, &mut rng);
//! let (next_state, reward) = Engine::step(&state, action, &params).unwrap();
//! let transition = Transition { state, action, next_state, reward };
//! engine.do_learning(&mut table, &params, &transition, None);
//! ```

pub mod engine;
pub mod q_table;
pub mod serialization;

pub use engine::{Engine, EngineKind, LearningParams, Transition, UpdateRule};
pub use q_table::{QTable, SharedQTable};
pub use serialization::{SavedQTable, decode_table, encode_table};
