//! Inspect command - summarize a saved value table

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;

use crate::{
    app::App,
    cli::output::{format_number, format_value_grid, print_kv, print_section},
    q_learning::QTable,
    tictactoe::BoardState,
};

#[derive(Parser, Debug)]
#[command(about = "Summarize a saved value table")]
pub struct InspectArgs {
    /// Value table file
    #[arg(default_value = "q_table.msgpack")]
    pub table: PathBuf,

    /// Show the values stored for this board, e.g. "XX.OO...."
    #[arg(long, short = 's')]
    pub state: Option<String>,
}

/// Smallest and largest stored value.
fn value_range(table: &QTable) -> Option<(f64, f64)> {
    table
        .iter()
        .flat_map(|(_, values)| values.iter().copied())
        .fold(None, |range, v| match range {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

pub fn execute(args: InspectArgs) -> Result<()> {
    let app = App::new();
    let table = app
        .load_table(&args.table)?
        .ok_or_else(|| anyhow!("no value table at {}", args.table.display()))?;

    print_section(&format!("Value table {}", args.table.display()));
    print_kv("Board size", &table.board_size().to_string());
    print_kv("States", &format_number(table.len()));
    print_kv("Non-zero values", &format_number(table.nonzero_count()));
    if let Some((lo, hi)) = value_range(&table) {
        print_kv("Value range", &format!("{lo:.4} .. {hi:.4}"));
    }

    if let Some(encoded) = &args.state {
        let state = BoardState::from_string(encoded)?;
        println!();
        match table.get(&state) {
            Some(values) => println!("{}", format_value_grid(&state, values)),
            None => println!("  state {encoded} has not been visited"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_range() {
        let mut table = QTable::default();
        assert_eq!(value_range(&table), None);

        let state = BoardState::default();
        table.get_or_create(&state)[0] = -0.5;
        table.get_or_create(&state)[8] = 0.25;
        assert_eq!(value_range(&table), Some((-0.5, 0.25)));
    }
}
