//! CLI subcommand implementations.

pub mod edit;
pub mod now;
pub mod regions;
pub mod toggle;
pub mod util;
