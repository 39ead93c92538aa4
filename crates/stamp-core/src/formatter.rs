//! Timestamp formatting.
//!
//! Format specs use moment-style tokens (`YYYY-MM-DD HH:mm`), rendered with
//! `chrono`. Text inside `[...]` is copied literally, as is any character that
//! is not a token.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Datelike, FixedOffset, Local};

use crate::settings::StampConfig;

/// Source of the current point in time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// Tokens in match order; longer tokens must precede their prefixes.
const TOKENS: &[(&str, &str)] = &[
    ("YYYY", "%Y"),
    ("YY", "%y"),
    ("MMMM", "%B"),
    ("MMM", "%b"),
    ("MM", "%m"),
    ("M", "%-m"),
    ("Do", ""),
    ("DD", "%d"),
    ("D", "%-d"),
    ("dddd", "%A"),
    ("ddd", "%a"),
    ("d", "%w"),
    ("HH", "%H"),
    ("H", "%-H"),
    ("hh", "%I"),
    ("h", "%-I"),
    ("mm", "%M"),
    ("m", "%-M"),
    ("ss", "%S"),
    ("s", "%-S"),
    ("A", "%p"),
    ("a", ""),
    ("ZZ", "%z"),
    ("Z", "%:z"),
];

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Renders `at` according to a moment-style format spec.
pub fn format_timestamp(at: &DateTime<FixedOffset>, spec: &str) -> String {
    let mut out = String::with_capacity(spec.len() + 8);
    let mut rest = spec;

    while let Some(c) = rest.chars().next() {
        if c == '[' {
            if let Some(close) = rest.find(']') {
                out.push_str(&rest[1..close]);
                rest = &rest[close + 1..];
                continue;
            }
        }

        if let Some((token, strftime)) = TOKENS.iter().find(|(t, _)| rest.starts_with(t)) {
            match *token {
                "Do" => {
                    let day = at.day();
                    out.push_str(&day.to_string());
                    out.push_str(ordinal_suffix(day));
                }
                "a" => out.push_str(&at.format("%p").to_string().to_lowercase()),
                _ => out.push_str(&at.format(strftime).to_string()),
            }
            rest = &rest[token.len()..];
            continue;
        }

        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    out
}

/// Produces decorated timestamps from the configured format, prefix and suffix.
#[derive(Clone)]
pub struct TimestampFormatter {
    format: String,
    prefix: String,
    suffix: String,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TimestampFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimestampFormatter")
            .field("format", &self.format)
            .field("prefix", &self.prefix)
            .field("suffix", &self.suffix)
            .finish_non_exhaustive()
    }
}

impl TimestampFormatter {
    /// Creates a formatter reading the system clock.
    pub fn new(config: &StampConfig) -> Self {
        Self {
            format: config.timestamp_format.clone(),
            prefix: config.prefix.clone(),
            suffix: config.suffix.clone(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock, mainly for deterministic output.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn update_config(&mut self, config: &StampConfig) {
        config.timestamp_format.clone_into(&mut self.format);
        config.prefix.clone_into(&mut self.prefix);
        config.suffix.clone_into(&mut self.suffix);
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.clock.now()
    }

    /// Formats `at` with the configured spec, undecorated.
    pub fn format(&self, at: &DateTime<FixedOffset>) -> String {
        format_timestamp(at, &self.format)
    }

    /// Wraps an already formatted timestamp in the prefix and suffix.
    pub fn decorate(&self, formatted: &str) -> String {
        format!("{}{formatted}{}", self.prefix, self.suffix)
    }

    /// The full decorated stamp for the current time.
    pub fn stamp(&self) -> String {
        self.decorate(&self.format(&self.now()))
    }

    /// `content` preceded by the current stamp.
    pub fn stamped_line(&self, content: &str) -> String {
        format!("{}{content}", self.stamp())
    }
}
