//! Tic-tac-toe reinforcement learning CLI
//!
//! - Train an agent against rule-based opponents or itself
//! - Play against a trained agent
//! - Inspect a saved value table

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use tictactoe_rl::cli::commands::{inspect, play, train};

#[derive(Parser)]
#[command(name = "tictactoe-rl")]
#[command(version, about = "Tabular reinforcement learning for tic-tac-toe", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train an agent and save its value table
    Train(Box<train::TrainArgs>),

    /// Play against the agent in the terminal
    Play(Box<play::PlayArgs>),

    /// Summarize a saved value table
    Inspect(inspect::InspectArgs),
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Train(args) => train::execute(*args),
        Commands::Play(args) => play::execute(*args),
        Commands::Inspect(args) => inspect::execute(args),
    }
}
