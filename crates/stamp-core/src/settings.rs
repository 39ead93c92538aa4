//! Persisted settings and the validated configuration snapshot built from them.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of characters after the prefix searched for the suffix.
pub const DEFAULT_SUFFIX_SEARCH_WINDOW: usize = 50;

/// Errors raised while interpreting settings values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// The detection mode string is not one of the known modes.
    #[error("unknown detection mode: {0} (expected header, fence or both)")]
    UnknownDetectionMode(String),

    /// The settings record could not be parsed.
    #[error("invalid settings: {0}")]
    Parse(String),
}

/// Which region detection strategies are active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DetectionMode {
    /// Regions start at a log heading.
    Header,
    /// Regions are fenced code blocks tagged with the log language.
    Fence,
    /// Either strategy may claim a line.
    #[default]
    Both,
}

impl DetectionMode {
    /// String representation used in persisted settings.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Fence => "fence",
            Self::Both => "both",
        }
    }

    /// Whether heading-based detection is active.
    pub const fn uses_header(self) -> bool {
        matches!(self, Self::Header | Self::Both)
    }

    /// Whether fence-based detection is active.
    pub const fn uses_fence(self) -> bool {
        matches!(self, Self::Fence | Self::Both)
    }
}

impl fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DetectionMode {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "header" | "heading" => Ok(Self::Header),
            "fence" | "codeblock" => Ok(Self::Fence),
            "both" => Ok(Self::Both),
            _ => Err(SettingsError::UnknownDetectionMode(s.to_string())),
        }
    }
}

impl Serialize for DetectionMode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DetectionMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The persisted, flat settings record.
///
/// Every key is optional on disk: missing keys take the defaults below, so a
/// partially populated record always loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Moment-style format spec, e.g. `YYYY-MM-DD HH:mm`.
    pub timestamp_format: String,
    pub detection_mode: DetectionMode,
    /// Literal log heading line, e.g. `## Log`.
    pub heading_text: String,
    /// Optional regular expression that replaces the literal heading comparison.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading_pattern: Option<String>,
    /// Info string that tags a log fence (`` ```timestamp-log ``).
    pub fence_language: String,
    pub prefix: String,
    pub suffix: String,
    /// React to line breaks inside log regions.
    pub auto_stamp: bool,
    /// Stamp new lines that have no content.
    pub stamp_empty_lines: bool,
    /// How far past the prefix the suffix may appear for a line to count as stamped.
    pub suffix_search_window: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timestamp_format: "YYYY-MM-DD HH:mm".to_string(),
            detection_mode: DetectionMode::Both,
            heading_text: "## Log".to_string(),
            heading_pattern: None,
            fence_language: "timestamp-log".to_string(),
            prefix: "[".to_string(),
            suffix: "] ".to_string(),
            auto_stamp: true,
            stamp_empty_lines: true,
            suffix_search_window: DEFAULT_SUFFIX_SEARCH_WINDOW,
        }
    }
}

impl Settings {
    /// Parses a JSON settings record, filling in defaults for missing keys.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        serde_json::from_str(json).map_err(|e| SettingsError::Parse(e.to_string()))
    }
}

/// Decides whether a structural heading is the log heading.
#[derive(Debug, Clone)]
pub enum HeadingMatcher {
    /// Trimmed line equals the text.
    Exact(String),
    /// Line matches the compiled expression.
    Pattern(Regex),
}

impl HeadingMatcher {
    /// Builds a matcher, falling back to the literal heading when the pattern
    /// does not compile.
    pub fn new(literal: &str, pattern: Option<&str>) -> Self {
        match pattern.filter(|p| !p.is_empty()) {
            Some(p) => match Regex::new(p) {
                Ok(re) => Self::Pattern(re),
                Err(err) => {
                    tracing::warn!(pattern = p, %err, "invalid heading pattern, using literal heading");
                    Self::Exact(literal.trim().to_string())
                }
            },
            None => Self::Exact(literal.trim().to_string()),
        }
    }

    /// Returns true if `line` is the log heading.
    pub fn matches(&self, line: &str) -> bool {
        match self {
            Self::Exact(text) => line.trim() == text,
            Self::Pattern(re) => re.is_match(line),
        }
    }
}

/// Validated, immutable configuration snapshot consumed by the engine.
#[derive(Debug, Clone)]
pub struct StampConfig {
    pub timestamp_format: String,
    pub detection_mode: DetectionMode,
    pub heading: HeadingMatcher,
    /// Literal heading line used when writing new header regions.
    pub heading_text: String,
    pub fence_language: String,
    pub prefix: String,
    pub suffix: String,
    pub auto_stamp: bool,
    pub stamp_empty_lines: bool,
    pub suffix_search_window: usize,
}

impl StampConfig {
    /// Validates settings into a configuration snapshot.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            timestamp_format: settings.timestamp_format.clone(),
            detection_mode: settings.detection_mode,
            heading: HeadingMatcher::new(
                &settings.heading_text,
                settings.heading_pattern.as_deref(),
            ),
            heading_text: settings.heading_text.clone(),
            fence_language: settings.fence_language.trim().to_string(),
            prefix: settings.prefix.clone(),
            suffix: settings.suffix.clone(),
            auto_stamp: settings.auto_stamp,
            stamp_empty_lines: settings.stamp_empty_lines,
            suffix_search_window: settings.suffix_search_window,
        }
    }
}

impl Default for StampConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl From<&Settings> for StampConfig {
    fn from(settings: &Settings) -> Self {
        Self::from_settings(settings)
    }
}
