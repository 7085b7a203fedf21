// Command definitions for the `mercado-perf` binary
pub mod commands;

pub use commands::{Cli, Commands};
