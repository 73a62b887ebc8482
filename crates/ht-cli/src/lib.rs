//! Hour tracker CLI library.
//!
//! This crate provides the CLI interface for the hour tracker.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, EntryArgs, EntryChanges, EventAction};
pub use config::Config;
