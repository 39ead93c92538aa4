//! Editor operations exposed to a command layer.
//!
//! Each operation resolves the active document through [`Host`] and is a
//! no-op when there is none.

use crate::document::{Cursor, Host};
use crate::formatter::TimestampFormatter;
use crate::region::{Region, RegionClassifier};
use crate::rewriter::{LineRewriter, Rewrite};
use crate::settings::{Settings, StampConfig};

/// Text inserted for a new heading-delimited log region.
pub fn header_template(config: &StampConfig, formatter: &TimestampFormatter) -> String {
    format!("\n{}\n{}", config.heading_text, formatter.stamp())
}

/// Text inserted for a new fenced log region.
pub fn fence_template(config: &StampConfig, formatter: &TimestampFormatter) -> String {
    format!(
        "\n```{}\n{}\n```\n",
        config.fence_language,
        formatter.stamp()
    )
}

fn insert(host: &mut dyn Host, text: &str, what: &str) -> bool {
    let Some(doc) = host.active_document() else {
        tracing::debug!(what, "no active document");
        return false;
    };
    doc.insert_at_cursor(text);
    true
}

/// Inserts the decorated stamp at the caret.
pub fn insert_timestamp(host: &mut dyn Host, formatter: &TimestampFormatter) -> bool {
    insert(host, &formatter.stamp(), "timestamp")
}

/// Inserts a heading, followed by a stamped first entry, at the caret.
pub fn insert_header_region(
    host: &mut dyn Host,
    config: &StampConfig,
    formatter: &TimestampFormatter,
) -> bool {
    insert(host, &header_template(config, formatter), "header region")
}

/// Inserts a log fence with a stamped first entry at the caret.
pub fn insert_fence_region(
    host: &mut dyn Host,
    config: &StampConfig,
    formatter: &TimestampFormatter,
) -> bool {
    insert(host, &fence_template(config, formatter), "fence region")
}

/// Flips automatic stamping and returns the new value.
pub fn toggle_auto_stamp(settings: &mut Settings) -> bool {
    settings.auto_stamp = !settings.auto_stamp;
    tracing::debug!(auto_stamp = settings.auto_stamp, "auto stamp toggled");
    settings.auto_stamp
}

/// Stamps the caret line regardless of region membership.
pub fn stamp_current_line(host: &mut dyn Host, rewriter: &LineRewriter) -> Option<Rewrite> {
    let doc = host.active_document()?;
    let line = doc.cursor().line;
    let rewrite = rewriter.rewrite(doc.line(line)?);
    if rewrite.changed {
        if let Err(err) = doc.set_line(line, &rewrite.text) {
            tracing::debug!(%err, "stamp dropped");
            return None;
        }
    }
    doc.set_cursor(Cursor::new(line, rewrite.caret));
    Some(rewrite)
}

/// All log regions of the active document.
pub fn list_regions(host: &mut dyn Host, classifier: &RegionClassifier) -> Vec<Region> {
    host.active_document()
        .map(|doc| classifier.regions(doc))
        .unwrap_or_default()
}
