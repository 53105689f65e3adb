//! Play command - play against the agent from the terminal

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use anyhow::{Context, Result, anyhow};
use clap::Parser;

use crate::{
    app::App,
    cli::{config::AgentArgs, output::print_section},
    tictactoe::{Action, BoardState, Outcome, coord_to_index},
};

#[derive(Parser, Debug)]
#[command(about = "Play against the agent", allow_negative_numbers = true)]
pub struct PlayArgs {
    #[command(flatten)]
    pub agent: AgentArgs,

    /// Value table file; loaded when it exists and saved after each game
    #[arg(long, short = 't', default_value = "q_table.msgpack")]
    pub table: PathBuf,

    /// Let the agent make the first move
    #[arg(long)]
    pub agent_first: bool,

    /// Do not write the table back
    #[arg(long)]
    pub no_save: bool,
}

/// Parse `row col` (zero-based) or a single cell index.
fn parse_move(line: &str, size: usize) -> Result<usize> {
    let numbers: Vec<usize> = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| token.parse::<usize>())
        .collect::<std::result::Result<_, _>>()
        .with_context(|| format!("could not read '{}' as a move", line.trim()))?;

    let index = match numbers.as_slice() {
        [index] => *index,
        [row, col] if *row < size && *col < size => coord_to_index(*row, *col, size),
        [_, _] => return Err(anyhow!("row and column must be below {size}")),
        _ => return Err(anyhow!("enter a cell index or 'row col'")),
    };
    if index >= size * size {
        return Err(anyhow!("cell {index} is off the board"));
    }
    Ok(index)
}

fn print_board(state: &BoardState) {
    println!("\n{state}");
}

pub fn execute(args: PlayArgs) -> Result<()> {
    let app = App::new();
    let config = args.agent.to_config()?;
    let mut agent = app.create_agent(config)?;
    if app.load_into(agent.table(), &args.table)? {
        println!("Loaded table from {}", args.table.display());
    }

    let size = agent.config().board_size;
    let human = agent.opponent_mark();
    print_section(&format!(
        "You play {human}, the agent plays {} ({})",
        agent.mark(),
        agent.engine().kind().name()
    ));

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        agent.reset_episode();
        let mut outcome = if args.agent_first {
            agent.agent_move()?
        } else {
            Outcome::InProgress
        };

        while !outcome.is_terminal() {
            print_board(agent.state());
            print!("Your move (index or 'row col', 'q' to quit): ");
            io::stdout().flush()?;

            let Some(line) = lines.next() else {
                return finish(&app, &agent, &args);
            };
            let line = line?;
            if line.trim().eq_ignore_ascii_case("q") {
                return finish(&app, &agent, &args);
            }

            let cell = match parse_move(&line, size) {
                Ok(cell) => cell,
                Err(e) => {
                    println!("{e}");
                    continue;
                }
            };
            if agent.state().cell(cell).and_then(|c| c.to_player()).is_some() {
                println!("Cell {cell} is taken");
                continue;
            }
            outcome = agent.apply_opponent_move(Action::new(cell, human))?;
        }

        print_board(agent.state());
        match outcome {
            Outcome::AgentWin => println!("The agent wins."),
            Outcome::OpponentWin => println!("You win!"),
            _ => println!("Draw."),
        }
        if !args.no_save {
            app.save_table(agent.table(), &args.table)?;
        }

        print!("Play again? [y/N] ");
        io::stdout().flush()?;
        match lines.next() {
            Some(Ok(answer)) if answer.trim().eq_ignore_ascii_case("y") => {}
            _ => return Ok(()),
        }
    }
}

fn finish(app: &App, agent: &crate::episode::EpisodeController, args: &PlayArgs) -> Result<()> {
    if !args.no_save {
        app.save_table(agent.table(), &args.table)?;
    }
    Ok(())
}
