//! Log region classification.
//!
//! Two independent strategies decide whether a line belongs to a log region:
//!
//! - **Header**: the nearest structural heading at or above the line is the
//!   log heading. Any other heading found first ends the search.
//! - **Fence**: the line sits inside a fenced block whose info string starts
//!   with the configured fence language. Unterminated fences run to the end of
//!   the document.
//!
//! Regions are recomputed from the document on every query; a query is a
//! linear scan over the lines.

use std::ops::RangeInclusive;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::document::Document;
use crate::settings::StampConfig;

/// A structural heading: 1-6 `#` followed by whitespace.
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#{1,6})\s").unwrap());

const FENCE: &str = "```";

/// Which strategy produced a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    Header,
    Fence,
}

/// Content lines of a log region, excluding the heading or opening fence.
///
/// `end_line` is inclusive. A region with no content lines has
/// `end_line == start_line - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Region {
    pub start_line: usize,
    pub end_line: usize,
    pub kind: RegionKind,
}

impl Region {
    /// Builds a region, collapsing an inverted span to the empty one at `start`.
    fn new(start_line: usize, end_line: usize, kind: RegionKind) -> Self {
        let end_line = end_line.max(start_line.saturating_sub(1));
        Self {
            start_line,
            end_line,
            kind,
        }
    }

    pub const fn lines(&self) -> RangeInclusive<usize> {
        self.start_line..=self.end_line
    }

    pub const fn is_empty(&self) -> bool {
        self.end_line < self.start_line
    }

    pub const fn contains(&self, line: usize) -> bool {
        line >= self.start_line && line <= self.end_line
    }

    /// The heading or opening fence line that introduces the region.
    ///
    /// `None` only for a region starting at line 0, which the classifier never
    /// produces.
    pub const fn marker_line(&self) -> Option<usize> {
        self.start_line.checked_sub(1)
    }
}

/// Depth of a structural heading, or `None` if `line` is not one.
pub fn heading_depth(line: &str) -> Option<usize> {
    HEADING_RE.captures(line).map(|caps| caps[1].len())
}

/// Result of the forward fence scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FenceScan {
    inside: bool,
    /// Opening line of the fence that was open after the last processed line.
    open_line: Option<usize>,
}

/// Determines membership and boundaries of log regions.
#[derive(Debug, Clone)]
pub struct RegionClassifier {
    config: StampConfig,
    fence_open: String,
}

impl RegionClassifier {
    pub fn new(config: StampConfig) -> Self {
        let fence_open = format!("{FENCE}{}", config.fence_language);
        Self { config, fence_open }
    }

    /// Replaces the configuration snapshot.
    pub fn update_config(&mut self, config: StampConfig) {
        *self = Self::new(config);
    }

    pub const fn config(&self) -> &StampConfig {
        &self.config
    }

    /// Whether `line` lies inside a log region under any active strategy.
    pub fn is_in_region(&self, doc: &dyn Document, line: usize) -> bool {
        if line >= doc.line_count() {
            return false;
        }
        let mode = self.config.detection_mode;
        (mode.uses_header() && self.log_heading_above(doc, line).is_some())
            || (mode.uses_fence() && self.scan_fence(doc, line).inside)
    }

    /// Resolves the region containing `line`, trying fences before headings.
    pub fn find_boundaries(&self, doc: &dyn Document, line: usize) -> Option<Region> {
        if line >= doc.line_count() {
            return None;
        }
        let mode = self.config.detection_mode;
        let fence = mode
            .uses_fence()
            .then(|| self.fence_boundaries(doc, line))
            .flatten();
        fence.or_else(|| {
            mode.uses_header()
                .then(|| self.header_boundaries(doc, line))
                .flatten()
        })
    }

    /// Walks upward from `line` (inclusive) to the nearest structural heading.
    ///
    /// Returns `(heading_line, depth)` only if that heading is the log heading.
    fn log_heading_above(&self, doc: &dyn Document, line: usize) -> Option<(usize, usize)> {
        for n in (0..=line).rev() {
            let Some(text) = doc.line(n) else { continue };
            if let Some(depth) = heading_depth(text) {
                return self.config.heading.matches(text).then_some((n, depth));
            }
        }
        None
    }

    fn is_fence_open(&self, text: &str) -> bool {
        text.trim().starts_with(&self.fence_open)
    }

    fn is_fence_close(text: &str) -> bool {
        text.trim() == FENCE
    }

    /// Tracks fence state from the top of the document through `line`.
    fn scan_fence(&self, doc: &dyn Document, line: usize) -> FenceScan {
        let mut scan = FenceScan {
            inside: false,
            open_line: None,
        };
        for n in 0..=line.min(doc.last_line()) {
            let Some(text) = doc.line(n) else { break };
            match scan.open_line {
                Some(open) if scan.inside => {
                    if n > open && Self::is_fence_close(text) {
                        scan.inside = false;
                        scan.open_line = None;
                    }
                }
                _ => {
                    if self.is_fence_open(text) {
                        scan.inside = true;
                        scan.open_line = Some(n);
                    }
                }
            }
        }
        scan
    }

    fn fence_boundaries(&self, doc: &dyn Document, line: usize) -> Option<Region> {
        let scan = self.scan_fence(doc, line);
        let open = scan.open_line.filter(|_| scan.inside)?;
        let last = doc.last_line();
        let end = (open + 1..=last)
            .find(|&n| doc.line(n).is_some_and(Self::is_fence_close))
            .map_or(last, |close| close - 1);
        Some(Region::new(open + 1, end, RegionKind::Fence))
    }

    fn header_boundaries(&self, doc: &dyn Document, line: usize) -> Option<Region> {
        let (heading, depth) = self.log_heading_above(doc, line)?;
        let last = doc.last_line();
        let end = (line + 1..=last)
            .find(|&n| {
                doc.line(n)
                    .and_then(heading_depth)
                    .is_some_and(|d| d <= depth)
            })
            .map_or(last, |next| next - 1);
        Some(Region::new(heading + 1, end, RegionKind::Header))
    }

    /// Every distinct region in the document, in document order.
    pub fn regions(&self, doc: &dyn Document) -> Vec<Region> {
        let mut regions: Vec<Region> = Vec::new();
        for n in 0..doc.line_count() {
            let Some(region) = self.find_boundaries(doc, n) else {
                continue;
            };
            if !regions.contains(&region) {
                regions.push(region);
            }
        }
        regions
    }
}
