//! Region listing and line membership checks.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;
use stamp_core::{Document, LineBuffer, Region, RegionClassifier, RegionKind, commands};

/// A region as shown to users, with 1-based line numbers.
#[derive(Debug, Clone, Serialize)]
pub struct RegionEntry {
    pub kind: RegionKind,
    /// Line of the heading or opening fence.
    pub marker_line: Option<usize>,
    pub marker: String,
    pub first_line: usize,
    pub last_line: usize,
    pub entries: usize,
}

impl RegionEntry {
    fn new(region: &Region, doc: &LineBuffer) -> Self {
        let marker_line = region.marker_line();
        Self {
            kind: region.kind,
            marker_line: marker_line.map(|n| n + 1),
            marker: marker_line
                .and_then(|n| doc.line(n))
                .unwrap_or_default()
                .trim()
                .to_string(),
            first_line: region.start_line + 1,
            last_line: region.end_line + 1,
            entries: region.lines().count(),
        }
    }

    fn span(&self) -> String {
        if self.entries == 0 {
            "empty".to_string()
        } else {
            format!("lines {}-{}", self.first_line, self.last_line)
        }
    }
}

const fn kind_label(kind: RegionKind) -> &'static str {
    match kind {
        RegionKind::Header => "header",
        RegionKind::Fence => "fence",
    }
}

/// Formats the region listing as text.
pub fn format_regions(entries: &[RegionEntry]) -> String {
    if entries.is_empty() {
        return "No log regions.\n".to_string();
    }
    entries
        .iter()
        .map(|entry| {
            format!(
                "{:<6} {:<10} {}\n",
                kind_label(entry.kind),
                entry.span(),
                entry.marker
            )
        })
        .collect()
}

pub fn run<W: Write>(
    writer: &mut W,
    classifier: &RegionClassifier,
    doc: LineBuffer,
    json: bool,
) -> Result<()> {
    let mut host = Some(doc);
    let regions = commands::list_regions(&mut host, classifier);
    let Some(doc) = host else {
        return Ok(());
    };
    let entries: Vec<RegionEntry> = regions.iter().map(|r| RegionEntry::new(r, &doc)).collect();

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&entries)?)?;
    } else {
        write!(writer, "{}", format_regions(&entries))?;
    }
    Ok(())
}

/// Describes whether the line at `index` is inside a log region.
pub fn describe_line(classifier: &RegionClassifier, doc: &LineBuffer, index: usize) -> String {
    let line = index + 1;
    if !classifier.is_in_region(doc, index) {
        return format!("line {line}: outside log regions");
    }
    match classifier.find_boundaries(doc, index) {
        Some(region) => {
            let entry = RegionEntry::new(&region, doc);
            format!(
                "line {line}: in {} region {} ({})",
                kind_label(entry.kind),
                entry.span(),
                entry.marker
            )
        }
        None => format!("line {line}: in log region"),
    }
}

pub fn check<W: Write>(
    writer: &mut W,
    classifier: &RegionClassifier,
    doc: &LineBuffer,
    index: usize,
) -> Result<()> {
    writeln!(writer, "{}", describe_line(classifier, doc, index))?;
    Ok(())
}
