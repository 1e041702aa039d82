//! CLI subcommand implementations.

pub mod menu;
pub mod migrate;
