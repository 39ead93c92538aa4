//! Toggle command for automatic stamping.

use std::io::Write;

use anyhow::Result;
use stamp_core::commands;

use crate::Config;

/// Flips `auto_stamp`, persists it, and reports the new state.
pub fn run<W: Write>(writer: &mut W, config: &mut Config) -> Result<()> {
    let enabled = commands::toggle_auto_stamp(&mut config.settings);
    config.persist_auto_stamp()?;

    let state = if enabled { "on" } else { "off" };
    writeln!(writer, "Auto stamp: {state}")?;
    if let Some(path) = &config.file {
        writeln!(writer, "Saved to:   {}", path.display())?;
    }
    Ok(())
}
