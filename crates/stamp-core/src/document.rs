//! Line-addressable document access.
//!
//! The engine never owns text. Hosts expose their buffer through
//! [`Document`]; [`LineBuffer`] is the in-memory implementation.

use thiserror::Error;

/// Errors raised by document accessors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// The requested line does not exist.
    #[error("line {line} out of range (document has {count} lines)")]
    LineOutOfRange { line: usize, count: usize },
}

/// Caret position. `ch` is a character column, not a byte offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor {
    pub line: usize,
    pub ch: usize,
}

impl Cursor {
    pub const fn new(line: usize, ch: usize) -> Self {
        Self { line, ch }
    }
}

/// A text buffer addressed by 0-based line number.
pub trait Document {
    /// Returns line `n` without its line terminator.
    fn line(&self, n: usize) -> Option<&str>;

    fn line_count(&self) -> usize;

    /// Replaces the content of line `n`.
    fn set_line(&mut self, n: usize, text: &str) -> Result<(), DocumentError>;

    fn cursor(&self) -> Cursor;

    /// Moves the caret, clamping it to the document.
    fn set_cursor(&mut self, cursor: Cursor);

    /// Inserts `text` (which may contain line breaks) at the caret and moves
    /// the caret to the end of the inserted text.
    fn insert_at_cursor(&mut self, text: &str);

    /// Index of the last line; 0 for an empty document.
    fn last_line(&self) -> usize {
        self.line_count().saturating_sub(1)
    }
}

/// Gives deferred work access to whichever document is active when it runs.
pub trait Host {
    /// The focused document, if any.
    fn active_document(&mut self) -> Option<&mut dyn Document>;
}

impl<D: Document> Host for Option<D> {
    fn active_document(&mut self) -> Option<&mut dyn Document> {
        self.as_mut().map(|doc| doc as &mut dyn Document)
    }
}

/// Converts a character column into a byte offset within `line`.
pub(crate) fn byte_offset(line: &str, ch: usize) -> usize {
    line.char_indices().nth(ch).map_or(line.len(), |(i, _)| i)
}

/// In-memory document backed by a vector of lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineBuffer {
    lines: Vec<String>,
    cursor: Cursor,
    trailing_newline: bool,
    crlf: bool,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self {
            lines: vec![String::new()],
            cursor: Cursor::default(),
            trailing_newline: false,
            crlf: false,
        }
    }
}

impl LineBuffer {
    /// Splits `text` on `\n`, stripping `\r` from CRLF endings.
    ///
    /// The line ending of the first line decides how [`Self::to_text`] joins
    /// lines back together.
    pub fn from_text(text: &str) -> Self {
        let trailing_newline = text.ends_with('\n');
        let crlf = text
            .find('\n')
            .is_some_and(|i| text[..i].ends_with('\r'));
        let body = text.strip_suffix('\n').unwrap_or(text);
        let lines = body
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
            .collect();
        Self {
            lines,
            cursor: Cursor::default(),
            trailing_newline,
            crlf,
        }
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        if lines.is_empty() {
            lines.push(String::new());
        }
        Self {
            lines,
            cursor: Cursor::default(),
            trailing_newline: false,
            crlf: false,
        }
    }

    /// Joins the lines back together with the source's line ending,
    /// restoring a trailing newline if the source had one.
    pub fn to_text(&self) -> String {
        let eol = if self.crlf { "\r\n" } else { "\n" };
        let mut text = self.lines.join(eol);
        if self.trailing_newline {
            text.push_str(eol);
        }
        text
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Inserts a new line at index `n`, shifting later lines down.
    pub fn insert_line(&mut self, n: usize, text: impl Into<String>) {
        let n = n.min(self.lines.len());
        self.lines.insert(n, text.into());
    }

    fn clamp(&self, cursor: Cursor) -> Cursor {
        let line = cursor.line.min(self.lines.len().saturating_sub(1));
        let len = self.lines.get(line).map_or(0, |l| l.chars().count());
        Cursor::new(line, cursor.ch.min(len))
    }
}

impl Document for LineBuffer {
    fn line(&self, n: usize) -> Option<&str> {
        self.lines.get(n).map(String::as_str)
    }

    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn set_line(&mut self, n: usize, text: &str) -> Result<(), DocumentError> {
        let count = self.lines.len();
        let slot = self
            .lines
            .get_mut(n)
            .ok_or(DocumentError::LineOutOfRange { line: n, count })?;
        text.clone_into(slot);
        Ok(())
    }

    fn cursor(&self) -> Cursor {
        self.cursor
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = self.clamp(cursor);
    }

    fn insert_at_cursor(&mut self, text: &str) {
        let Cursor { line, ch } = self.clamp(self.cursor);
        let current = &self.lines[line];
        let split = byte_offset(current, ch);
        let head = current[..split].to_string();
        let tail = current[split..].to_string();

        let mut pieces: Vec<&str> = text.split('\n').collect();
        let last = pieces.pop().unwrap_or_default();

        let cursor = if pieces.is_empty() {
            self.lines[line] = format!("{head}{last}{tail}");
            Cursor::new(line, ch + last.chars().count())
        } else {
            let mut replacement = Vec::with_capacity(pieces.len() + 1);
            replacement.push(format!("{head}{}", pieces[0]));
            replacement.extend(pieces[1..].iter().map(|p| (*p).to_string()));
            replacement.push(format!("{last}{tail}"));
            let end_line = line + replacement.len() - 1;
            self.lines.splice(line..=line, replacement);
            Cursor::new(end_line, last.chars().count())
        };
        self.cursor = cursor;
    }
}
