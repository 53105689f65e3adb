//! Output formatting for CLI

use crate::tictactoe::{BoardState, index_to_coord};

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:20} {}", format!("{}:", key), value);
}

/// Format a number with thousands separators
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i.is_multiple_of(3) {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}

/// Format a percentage with one decimal
pub fn format_rate(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

/// Lay out per-cell values as a grid; occupied cells show their mark.
pub fn format_value_grid(state: &BoardState, values: &[f64]) -> String {
    let size = state.size();
    let mut rows = vec![String::new(); size];
    for (index, value) in values.iter().enumerate() {
        let (row, _) = index_to_coord(index, size);
        let cell = match state.cell(index) {
            Some(cell) if cell.to_player().is_some() => format!("{:>8}", cell.to_char()),
            _ => format!("{value:>8.3}"),
        };
        rows[row].push_str(&cell);
    }
    rows.join("\n")
}
