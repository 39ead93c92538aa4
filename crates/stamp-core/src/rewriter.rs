//! Stamping of individual lines.

use std::sync::LazyLock;

use regex::Regex;

use crate::formatter::TimestampFormatter;
use crate::settings::StampConfig;

/// A bullet (`-`, `*`, `+`) or ordinal (`12.`) followed by whitespace or the
/// end of the content.
static LIST_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*+]|\d+\.)(?:\s+|$)").unwrap());

/// Outcome of rewriting a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    /// Character column the caret should move to.
    pub caret: usize,
    pub changed: bool,
}

impl Rewrite {
    fn unchanged(line: &str, caret: usize) -> Self {
        Self {
            text: line.to_string(),
            caret,
            changed: false,
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Inserts stamps into lines without disturbing indentation, list markers or
/// existing stamps.
#[derive(Debug, Clone)]
pub struct LineRewriter {
    formatter: TimestampFormatter,
    prefix: String,
    suffix: String,
    suffix_search_window: usize,
    stamp_empty_lines: bool,
}

impl LineRewriter {
    pub fn new(config: &StampConfig, formatter: TimestampFormatter) -> Self {
        Self {
            formatter,
            prefix: config.prefix.clone(),
            suffix: config.suffix.clone(),
            suffix_search_window: config.suffix_search_window,
            stamp_empty_lines: config.stamp_empty_lines,
        }
    }

    pub fn update_config(&mut self, config: &StampConfig) {
        self.formatter.update_config(config);
        config.prefix.clone_into(&mut self.prefix);
        config.suffix.clone_into(&mut self.suffix);
        self.suffix_search_window = config.suffix_search_window;
        self.stamp_empty_lines = config.stamp_empty_lines;
    }

    pub const fn formatter(&self) -> &TimestampFormatter {
        &self.formatter
    }

    /// Character length of the stamp at the start of `text`, if it has one.
    ///
    /// Leading whitespace is skipped and counted. An empty prefix never
    /// detects anything.
    fn stamp_len(&self, text: &str) -> Option<usize> {
        if self.prefix.is_empty() {
            return None;
        }
        let trimmed = text.trim_start();
        let after = trimmed.strip_prefix(self.prefix.as_str())?;
        let head = char_len(text) - char_len(trimmed) + char_len(&self.prefix);
        if self.suffix.is_empty() {
            return Some(head);
        }
        let window: String = after.chars().take(self.suffix_search_window).collect();
        let found = window.find(self.suffix.as_str())?;
        Some(head + char_len(&window[..found]) + char_len(&self.suffix))
    }

    /// Heuristic check for an existing stamp at the start of `line`.
    pub fn has_timestamp(&self, line: &str) -> bool {
        self.stamp_len(line).is_some()
    }

    /// Stamps `line`, returning the new text and caret column.
    ///
    /// Checks run in a fixed order: existing stamp, list marker, empty
    /// content, plain content. A bare `- ` bullet therefore gets its stamp
    /// after the bullet.
    pub fn rewrite(&self, line: &str) -> Rewrite {
        if let Some(end) = self.stamp_len(line) {
            return Rewrite::unchanged(line, end);
        }

        let content = line.trim_start();
        let indent = &line[..line.len() - content.len()];

        if let Some(m) = LIST_MARKER_RE.find(content) {
            let rest = &content[m.end()..];
            let mut marker = m.as_str().to_string();
            if let Some(end) = self.stamp_len(rest) {
                return Rewrite::unchanged(line, char_len(indent) + char_len(&marker) + end);
            }
            if !marker.ends_with(char::is_whitespace) {
                marker.push(' ');
            }
            let stamp = self.formatter.stamp();
            let caret = char_len(indent) + char_len(&marker) + char_len(&stamp);
            return Rewrite {
                text: format!("{indent}{marker}{stamp}{rest}"),
                caret,
                changed: true,
            };
        }

        if content.is_empty() {
            if !self.stamp_empty_lines {
                tracing::debug!("empty line left unstamped");
                return Rewrite::unchanged(line, char_len(line));
            }
            let text = format!("{indent}{}", self.formatter.stamp());
            let caret = char_len(&text);
            return Rewrite {
                text,
                caret,
                changed: true,
            };
        }

        let stamp = self.formatter.stamp();
        Rewrite {
            caret: char_len(indent) + char_len(&stamp),
            text: format!("{indent}{stamp}{content}"),
            changed: true,
        }
    }
}
