//! Tabular reinforcement learning for tic-tac-toe
//!
//! This crate provides:
//! - An immutable board with win and one-move-threat detection on N×N boards
//! - A sparse value table and three learning engines (Q-learning, SARSA,
//!   SARSA(λ)) sharing one ε-greedy policy
//! - An episode controller that answers opponent moves and learns per move
//! - Rule-based opponents, a training pipeline with self-play, and binary
//!   persistence of learned tables

pub mod adapters;
pub mod app;
pub mod cli;
pub mod episode;
pub mod error;
pub mod pipeline;
pub mod ports;
pub mod q_learning;
pub mod strategy;
pub mod tictactoe;

pub use episode::EpisodeController;
pub use error::{Error, Result};
