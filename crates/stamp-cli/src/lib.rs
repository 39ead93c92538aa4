//! Command-line host for timestamped log regions.
//!
//! Treats a text file as the editor buffer and exposes each editor operation
//! as a subcommand.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, LineTarget, TemplateKind};
pub use config::Config;
