//! Shared utilities for CLI commands.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use stamp_core::{Document, FixedClock, LineBuffer, StampConfig, TimestampFormatter};

/// Parses an RFC 3339 instant, keeping its offset.
pub fn parse_instant(s: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Invalid time: {s}. Use RFC 3339 (e.g., 2024-01-15T14:30:00+01:00)"))
}

/// Builds a formatter on the system clock, or frozen at `at` when given.
pub fn formatter(config: &StampConfig, at: Option<&str>) -> Result<TimestampFormatter> {
    let formatter = TimestampFormatter::new(config);
    Ok(match at {
        Some(at) => formatter.with_clock(FixedClock(parse_instant(at)?)),
        None => formatter,
    })
}

pub fn open_document(path: &Path) -> Result<LineBuffer> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(LineBuffer::from_text(&text))
}

/// Converts a 1-based line number into an index into `doc`.
pub fn line_index(doc: &LineBuffer, line: usize) -> Result<usize> {
    if line == 0 || line > doc.line_count() {
        anyhow::bail!(
            "line {line} is out of range (document has {} lines)",
            doc.line_count()
        );
    }
    Ok(line - 1)
}

/// Writes the document back to `path`, or prints it when `dry_run` is set.
pub fn emit<W: Write>(writer: &mut W, path: &Path, doc: &LineBuffer, dry_run: bool) -> Result<()> {
    let text = doc.to_text();
    if dry_run {
        write!(writer, "{text}")?;
        return Ok(());
    }
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::debug!(path = %path.display(), "document saved");
    Ok(())
}
