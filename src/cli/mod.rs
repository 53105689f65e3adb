//! Command-line interface for training, playing against and inspecting
//! learning agents.

pub mod commands;
pub mod config;
pub mod output;
