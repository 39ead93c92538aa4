//! Commands that modify a document: stamping, line breaks, inserts and
//! region templates.
//!
//! The file plays the part of the editor buffer. Each command places the
//! caret the way an editor user would, then runs the matching core operation.

use std::io::Write;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use stamp_core::{
    AutoStampController, Cursor, Document, LineBuffer, LineRewriter, StampConfig, StampOutcome,
    TimestampFormatter, commands,
};

use crate::cli::TemplateKind;

/// A list item with content: indent, bullet or ordinal, then text.
static LIST_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)(?:([-*+])|(\d+)\.)\s+\S").unwrap());

/// The marker an editor puts on the line after `line`, if it is a list item.
pub fn list_continuation(line: &str) -> Option<String> {
    let caps = LIST_ITEM_RE.captures(line)?;
    let indent = &caps[1];
    if let Some(bullet) = caps.get(2) {
        return Some(format!("{indent}{} ", bullet.as_str()));
    }
    let n: u64 = caps[3].parse().ok()?;
    Some(format!("{indent}{}. ", n + 1))
}

fn place_caret(doc: &mut LineBuffer, index: usize, ch: usize) {
    doc.set_cursor(Cursor::new(index, ch));
}

fn line_len(doc: &LineBuffer, index: usize) -> usize {
    doc.line(index).map_or(0, |l| l.chars().count())
}

/// Stamps line `index` on demand.
pub fn stamp<W: Write>(
    writer: &mut W,
    rewriter: &LineRewriter,
    mut doc: LineBuffer,
    index: usize,
) -> Result<LineBuffer> {
    place_caret(&mut doc, index, 0);
    let mut host = Some(doc);
    let rewrite = commands::stamp_current_line(&mut host, rewriter);
    let doc = host.context("document closed while stamping")?;

    match rewrite {
        Some(r) if r.changed => writeln!(writer, "line {}: stamped", index + 1)?,
        _ => writeln!(writer, "line {}: already stamped", index + 1)?,
    }
    Ok(doc)
}

/// Breaks the line after `index`, as pressing Enter at its end would.
///
/// The controller sees the line break first; list continuation is applied
/// afterwards, and only then does the deferred stamp run.
pub fn newline<W: Write>(
    writer: &mut W,
    controller: &mut AutoStampController,
    mut doc: LineBuffer,
    index: usize,
) -> Result<LineBuffer> {
    let continuation = doc.line(index).and_then(list_continuation);
    let new_line = index + 1;
    doc.insert_line(new_line, "");
    place_caret(&mut doc, new_line, 0);

    let armed = controller.on_text_change(&doc, "\n");

    if let Some(marker) = continuation {
        doc.set_line(new_line, &marker)?;
        place_caret(&mut doc, new_line, marker.chars().count());
    }

    let mut host = Some(doc);
    let outcomes = controller.run_deferred(&mut host);
    let doc = host.context("document closed during line break")?;

    let line = new_line + 1;
    if !armed {
        writeln!(writer, "line {line}: not in a log region")?;
    }
    for outcome in outcomes {
        match outcome {
            StampOutcome::Stamped { line, caret } => {
                writeln!(writer, "line {}: stamped (caret at {caret})", line + 1)?;
            }
            StampOutcome::Unchanged { line } => {
                writeln!(writer, "line {}: left as is", line + 1)?;
            }
            StampOutcome::Abandoned(reason) => {
                writeln!(writer, "line {line}: stamp abandoned ({reason:?})")?;
            }
        }
    }
    Ok(doc)
}

/// Inserts a stamp at `column` of line `index` (end of line by default).
pub fn insert<W: Write>(
    writer: &mut W,
    formatter: &TimestampFormatter,
    mut doc: LineBuffer,
    index: usize,
    column: Option<usize>,
) -> Result<LineBuffer> {
    let ch = column.unwrap_or_else(|| line_len(&doc, index));
    place_caret(&mut doc, index, ch);
    let mut host = Some(doc);
    commands::insert_timestamp(&mut host, formatter);
    let doc = host.context("document closed while inserting")?;
    writeln!(writer, "line {}: timestamp inserted", index + 1)?;
    Ok(doc)
}

/// Inserts a new region after line `index`.
pub fn template<W: Write>(
    writer: &mut W,
    kind: TemplateKind,
    config: &StampConfig,
    formatter: &TimestampFormatter,
    mut doc: LineBuffer,
    index: usize,
) -> Result<LineBuffer> {
    let end = line_len(&doc, index);
    place_caret(&mut doc, index, end);
    let mut host = Some(doc);
    match kind {
        TemplateKind::Header => commands::insert_header_region(&mut host, config, formatter),
        TemplateKind::Fence => commands::insert_fence_region(&mut host, config, formatter),
    };
    let doc = host.context("document closed while inserting")?;
    writeln!(writer, "line {}: {kind:?} region inserted", index + 2)?;
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::util;
    use stamp_core::{DetectionMode, Settings};

    const AT: &str = "2024-01-15T14:30:00Z";

    fn setup(settings: &Settings) -> (StampConfig, TimestampFormatter) {
        let config = StampConfig::from_settings(settings);
        let formatter = util::formatter(&config, Some(AT)).unwrap();
        (config, formatter)
    }

    fn controller(settings: &Settings) -> AutoStampController {
        let (config, formatter) = setup(settings);
        AutoStampController::new(config, formatter)
    }

    #[test]
    fn test_list_continuation() {
        assert_eq!(list_continuation("- item").as_deref(), Some("- "));
        assert_eq!(list_continuation("  * item").as_deref(), Some("  * "));
        assert_eq!(list_continuation("9. nine").as_deref(), Some("10. "));
        assert_eq!(list_continuation("- "), None);
        assert_eq!(list_continuation("plain"), None);
        assert_eq!(list_continuation("*bold*"), None);
    }

    #[test]
    fn test_newline_in_header_region() {
        let mut c = controller(&Settings::default());
        let doc = LineBuffer::from_text("## Log\n[09:00] standup\n");
        let mut out = Vec::new();

        let doc = newline(&mut out, &mut c, doc, 1).unwrap();
        assert_eq!(
            doc.to_text(),
            "## Log\n[09:00] standup\n[2024-01-15 14:30] \n"
        );
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "line 3: stamped (caret at 19)\n"
        );
    }

    #[test]
    fn test_newline_continues_list_then_stamps() {
        let mut c = controller(&Settings::default());
        let doc = LineBuffer::from_text("```timestamp-log\n- [09:00] one\n```\n");
        let mut out = Vec::new();

        let doc = newline(&mut out, &mut c, doc, 1).unwrap();
        assert_eq!(
            doc.lines(),
            [
                "```timestamp-log",
                "- [09:00] one",
                "- [2024-01-15 14:30] ",
                "```"
            ]
        );
        assert_eq!(doc.cursor(), Cursor::new(2, 21));
    }

    #[test]
    fn test_newline_outside_region() {
        let mut c = controller(&Settings::default());
        let doc = LineBuffer::from_text("```timestamp-log\nx\n```\n");
        let mut out = Vec::new();

        let doc = newline(&mut out, &mut c, doc, 2).unwrap();
        assert_eq!(doc.lines(), ["```timestamp-log", "x", "```", ""]);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "line 4: not in a log region\n"
        );
    }

    #[test]
    fn test_newline_respects_detection_mode() {
        let settings = Settings {
            detection_mode: DetectionMode::Fence,
            ..Settings::default()
        };
        let mut c = controller(&settings);
        let doc = LineBuffer::from_text("## Log\nentry\n");
        let doc = newline(&mut Vec::new(), &mut c, doc, 1).unwrap();
        assert_eq!(doc.line(2), Some(""));
    }

    #[test]
    fn test_stamp_on_demand_is_idempotent() {
        let (config, formatter) = setup(&Settings::default());
        let rewriter = LineRewriter::new(&config, formatter);
        let doc = LineBuffer::from_text("note one\n");

        let mut out = Vec::new();
        let doc = stamp(&mut out, &rewriter, doc, 0).unwrap();
        let doc = stamp(&mut out, &rewriter, doc, 0).unwrap();
        assert_eq!(doc.to_text(), "[2024-01-15 14:30] note one\n");
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "line 1: stamped\nline 1: already stamped\n"
        );
    }

    #[test]
    fn test_edits_keep_crlf_line_endings() {
        let mut c = controller(&Settings::default());
        let doc = LineBuffer::from_text("## Log\r\nentry\r\n");
        let doc = newline(&mut Vec::new(), &mut c, doc, 1).unwrap();
        assert_eq!(
            doc.to_text(),
            "## Log\r\nentry\r\n[2024-01-15 14:30] \r\n"
        );
    }

    #[test]
    fn test_insert_defaults_to_end_of_line() {
        let (_, formatter) = setup(&Settings::default());
        let doc = LineBuffer::from_text("done at ");
        let doc = insert(&mut Vec::new(), &formatter, doc, 0, None).unwrap();
        assert_eq!(doc.to_text(), "done at [2024-01-15 14:30] ");

        let doc = LineBuffer::from_text("ab");
        let doc = insert(&mut Vec::new(), &formatter, doc, 0, Some(1)).unwrap();
        assert_eq!(doc.to_text(), "a[2024-01-15 14:30] b");
    }

    #[test]
    fn test_templates_after_line() {
        let (config, formatter) = setup(&Settings::default());
        let doc = LineBuffer::from_text("# Day\nend\n");
        let doc = template(
            &mut Vec::new(),
            TemplateKind::Fence,
            &config,
            &formatter,
            doc,
            0,
        )
        .unwrap();
        assert_eq!(
            doc.lines(),
            [
                "# Day",
                "```timestamp-log",
                "[2024-01-15 14:30] ",
                "```",
                "",
                "end"
            ]
        );

        let doc = LineBuffer::from_text("# Day\n");
        let doc = template(
            &mut Vec::new(),
            TemplateKind::Header,
            &config,
            &formatter,
            doc,
            0,
        )
        .unwrap();
        assert_eq!(doc.lines(), ["# Day", "## Log", "[2024-01-15 14:30] "]);
    }
}
