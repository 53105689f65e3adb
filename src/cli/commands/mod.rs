//! CLI subcommands

pub mod inspect;
pub mod play;
pub mod train;
