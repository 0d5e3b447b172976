//! Tempo worklog CLI library.
//!
//! Argument parsing, configuration and the command implementations for the
//! `twl` binary.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, CreateCommand};
pub use config::Config;
