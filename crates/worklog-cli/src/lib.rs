//! Work log generator CLI library.
//!
//! This crate provides the command-line interface over `worklog-core`
//! and `worklog-gitlab`.

mod cli;
pub mod commands;
mod config;
mod render;

pub use cli::{Cli, Commands};
pub use config::Config;
