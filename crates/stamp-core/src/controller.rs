//! Automatic stamping of new lines inside log regions.
//!
//! The controller is a small state machine:
//!
//! ```text
//! Idle --line break in region--> Armed --deferred tick--> Stamping --> Idle
//! ```
//!
//! Stamping never runs inside the change notification. The host first applies
//! its own reaction to the line break (list continuation and the like), then
//! calls [`AutoStampController::run_deferred`] on its next event loop turn.

use std::collections::VecDeque;

use crate::document::{Cursor, Document, Host};
use crate::formatter::TimestampFormatter;
use crate::region::RegionClassifier;
use crate::rewriter::LineRewriter;
use crate::settings::StampConfig;

/// Where the controller is in its reaction to a line break.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StampState {
    #[default]
    Idle,
    /// A stamp for `line` is waiting for the next tick.
    Armed { line: usize },
    Stamping { line: usize },
}

/// Why a deferred stamp was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbandonReason {
    /// The host had no active document when the tick ran.
    NoDocument,
    /// The caret line no longer exists.
    LineOutOfRange,
}

/// Result of one deferred stamping step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StampOutcome {
    Stamped { line: usize, caret: usize },
    /// The line already carried a stamp or the empty-line policy declined it.
    Unchanged { line: usize },
    Abandoned(AbandonReason),
}

/// Work queued for the next turn of the host's event loop.
#[derive(Debug, Clone)]
pub struct DeferredQueue<T> {
    tasks: VecDeque<T>,
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self {
            tasks: VecDeque::new(),
        }
    }
}

impl<T> DeferredQueue<T> {
    pub fn push(&mut self, task: T) {
        self.tasks.push_back(task);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.tasks.pop_front()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingStamp {
    line: usize,
}

/// Reacts to line breaks by stamping the new line when it continues a log
/// region.
#[derive(Debug)]
pub struct AutoStampController {
    classifier: RegionClassifier,
    rewriter: LineRewriter,
    auto_stamp: bool,
    state: StampState,
    deferred: DeferredQueue<PendingStamp>,
}

impl AutoStampController {
    pub fn new(config: StampConfig, formatter: TimestampFormatter) -> Self {
        let rewriter = LineRewriter::new(&config, formatter);
        Self {
            auto_stamp: config.auto_stamp,
            classifier: RegionClassifier::new(config),
            rewriter,
            state: StampState::Idle,
            deferred: DeferredQueue::default(),
        }
    }

    /// Applies a new configuration snapshot. Pending stamps are kept.
    pub fn update_config(&mut self, config: StampConfig) {
        self.auto_stamp = config.auto_stamp;
        self.rewriter.update_config(&config);
        self.classifier.update_config(config);
    }

    pub const fn state(&self) -> StampState {
        self.state
    }

    pub const fn classifier(&self) -> &RegionClassifier {
        &self.classifier
    }

    pub const fn rewriter(&self) -> &LineRewriter {
        &self.rewriter
    }

    /// Number of stamps waiting for the next tick.
    pub fn pending(&self) -> usize {
        self.deferred.len()
    }

    /// Handles a text change reported by the host.
    ///
    /// Arms a stamp when `inserted` contains a line break, auto stamping is
    /// on, and both the line the caret left and the line it entered are in a
    /// log region. Returns whether a stamp was armed.
    pub fn on_text_change(&mut self, doc: &dyn Document, inserted: &str) -> bool {
        if !inserted.contains('\n') || !self.auto_stamp {
            return false;
        }

        let line = doc.cursor().line;
        let Some(previous) = line.checked_sub(1) else {
            return false;
        };

        if !self.classifier.is_in_region(doc, previous) {
            tracing::debug!(line = previous, "line break outside log region");
            return false;
        }
        if !self.classifier.is_in_region(doc, line) {
            tracing::debug!(line, "new line falls outside log region");
            return false;
        }

        tracing::debug!(line, "stamp armed");
        self.deferred.push(PendingStamp { line });
        self.state = StampState::Armed { line };
        true
    }

    /// Runs every armed stamp. Call once the host has finished its own
    /// line-break handling.
    pub fn run_deferred(&mut self, host: &mut dyn Host) -> Vec<StampOutcome> {
        let mut outcomes = Vec::with_capacity(self.deferred.len());
        while let Some(task) = self.deferred.pop() {
            self.state = StampState::Stamping { line: task.line };
            outcomes.push(self.stamp(host, task));
            self.state = StampState::Idle;
        }
        outcomes
    }

    /// Rewrites the line holding the caret when the tick runs, which may
    /// differ from the line that armed the stamp.
    fn stamp(&self, host: &mut dyn Host, task: PendingStamp) -> StampOutcome {
        let Some(doc) = host.active_document() else {
            tracing::debug!(armed = task.line, "no active document, stamp abandoned");
            return StampOutcome::Abandoned(AbandonReason::NoDocument);
        };
        let line = doc.cursor().line;
        let Some(text) = doc.line(line) else {
            tracing::debug!(line, armed = task.line, "caret line gone, stamp abandoned");
            return StampOutcome::Abandoned(AbandonReason::LineOutOfRange);
        };

        let rewrite = self.rewriter.rewrite(text);
        if !rewrite.changed {
            return StampOutcome::Unchanged { line };
        }
        if let Err(err) = doc.set_line(line, &rewrite.text) {
            tracing::debug!(%err, "stamp abandoned");
            return StampOutcome::Abandoned(AbandonReason::LineOutOfRange);
        }
        doc.set_cursor(Cursor::new(line, rewrite.caret));
        tracing::debug!(line, caret = rewrite.caret, "line stamped");
        StampOutcome::Stamped {
            line,
            caret: rewrite.caret,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::LineBuffer;
    use crate::formatter::FixedClock;
    use crate::settings::{DetectionMode, Settings};
    use chrono::{FixedOffset, TimeZone};

    const STAMP: &str = "[2024-01-15 14:30] ";

    fn controller_with(settings: &Settings) -> AutoStampController {
        let config = StampConfig::from_settings(settings);
        let clock = FixedClock(
            FixedOffset::east_opt(0)
                .unwrap()
                .with_ymd_and_hms(2024, 1, 15, 14, 30, 0)
                .unwrap(),
        );
        let formatter = TimestampFormatter::new(&config).with_clock(clock);
        AutoStampController::new(config, formatter)
    }

    fn controller() -> AutoStampController {
        controller_with(&Settings::default())
    }

    /// Simulates the editor splitting `line` at its end and moving the caret.
    fn press_enter(doc: &mut LineBuffer, line: usize, continuation: &str) {
        doc.insert_line(line + 1, continuation);
        doc.set_cursor(Cursor::new(line + 1, continuation.len()));
    }

    #[test]
    fn new_line_in_header_region_is_stamped() {
        let mut c = controller();
        let mut doc = Some(LineBuffer::from_lines(["## Log", "first"]));
        let buffer = doc.as_mut().unwrap();
        press_enter(buffer, 1, "");

        assert!(c.on_text_change(buffer, "\n"));
        assert_eq!(c.state(), StampState::Armed { line: 2 });

        let outcomes = c.run_deferred(&mut doc);
        assert_eq!(
            outcomes,
            [StampOutcome::Stamped {
                line: 2,
                caret: STAMP.len()
            }]
        );
        assert_eq!(c.state(), StampState::Idle);
        let buffer = doc.as_ref().unwrap();
        assert_eq!(buffer.line(2), Some(STAMP));
        assert_eq!(buffer.cursor(), Cursor::new(2, STAMP.len()));
    }

    #[test]
    fn enter_on_log_heading_stamps_first_entry() {
        let mut c = controller();
        let mut doc = Some(LineBuffer::from_lines(["## Log"]));
        let buffer = doc.as_mut().unwrap();
        press_enter(buffer, 0, "");
        assert!(c.on_text_change(buffer, "\n"));
        c.run_deferred(&mut doc);
        assert_eq!(doc.unwrap().lines(), ["## Log", STAMP]);
    }

    #[test]
    fn stamping_waits_for_host_list_continuation() {
        let mut c = controller();
        let mut doc = Some(LineBuffer::from_lines(["## Log", "- [09:00] one"]));
        let buffer = doc.as_mut().unwrap();
        press_enter(buffer, 1, "");
        assert!(c.on_text_change(buffer, "\n"));

        // Host continues the list before the deferred step runs.
        buffer.set_line(2, "- ").unwrap();
        c.run_deferred(&mut doc);
        assert_eq!(doc.unwrap().line(2), Some(format!("- {STAMP}").as_str()));
    }

    #[test]
    fn break_after_closing_fence_is_ignored() {
        let mut c = controller();
        let mut doc = LineBuffer::from_lines(["```timestamp-log", "x", "```"]);
        press_enter(&mut doc, 2, "");
        assert!(!c.on_text_change(&doc, "\n"));
        assert_eq!(c.state(), StampState::Idle);
        assert_eq!(c.pending(), 0);
    }

    #[test]
    fn break_inside_fence_is_stamped() {
        let mut c = controller();
        let mut doc = Some(LineBuffer::from_lines(["```timestamp-log", "x", "```"]));
        let buffer = doc.as_mut().unwrap();
        press_enter(buffer, 1, "");
        assert!(c.on_text_change(buffer, "\n"));
        c.run_deferred(&mut doc);
        assert_eq!(doc.unwrap().lines(), ["```timestamp-log", "x", STAMP, "```"]);
    }

    #[test]
    fn break_outside_any_region_is_ignored() {
        let mut c = controller();
        let mut doc = LineBuffer::from_lines(["# Notes", "plain"]);
        press_enter(&mut doc, 1, "");
        assert!(!c.on_text_change(&doc, "\n"));
    }

    #[test]
    fn non_newline_changes_are_ignored() {
        let mut c = controller();
        let mut doc = LineBuffer::from_lines(["## Log", "a", "b"]);
        doc.set_cursor(Cursor::new(2, 1));
        assert!(!c.on_text_change(&doc, "b"));
    }

    #[test]
    fn disabled_auto_stamp_never_arms() {
        let settings = Settings {
            auto_stamp: false,
            ..Settings::default()
        };
        let mut c = controller_with(&settings);
        let mut doc = LineBuffer::from_lines(["## Log", "a"]);
        press_enter(&mut doc, 1, "");
        assert!(!c.on_text_change(&doc, "\n"));
    }

    #[test]
    fn update_config_toggles_auto_stamp() {
        let mut c = controller();
        let mut doc = LineBuffer::from_lines(["## Log", "a"]);
        press_enter(&mut doc, 1, "");
        let off = Settings {
            auto_stamp: false,
            ..Settings::default()
        };
        c.update_config(StampConfig::from_settings(&off));
        assert!(!c.on_text_change(&doc, "\n"));
        c.update_config(StampConfig::default());
        assert!(c.on_text_change(&doc, "\n"));
    }

    #[test]
    fn missing_document_abandons_silently() {
        let mut c = controller();
        let mut doc = LineBuffer::from_lines(["## Log", "a"]);
        press_enter(&mut doc, 1, "");
        assert!(c.on_text_change(&doc, "\n"));

        let mut closed: Option<LineBuffer> = None;
        let outcomes = c.run_deferred(&mut closed);
        assert_eq!(outcomes, [StampOutcome::Abandoned(AbandonReason::NoDocument)]);
        assert_eq!(c.state(), StampState::Idle);
        assert_eq!(c.pending(), 0);
    }

    /// A document whose caret can point past its last line, as a host's
    /// stale selection might.
    struct StaleCaret {
        inner: LineBuffer,
        cursor: Cursor,
    }

    impl Document for StaleCaret {
        fn line(&self, n: usize) -> Option<&str> {
            self.inner.line(n)
        }

        fn line_count(&self) -> usize {
            self.inner.line_count()
        }

        fn set_line(&mut self, n: usize, text: &str) -> Result<(), crate::DocumentError> {
            self.inner.set_line(n, text)
        }

        fn cursor(&self) -> Cursor {
            self.cursor
        }

        fn set_cursor(&mut self, cursor: Cursor) {
            self.cursor = cursor;
        }

        fn insert_at_cursor(&mut self, text: &str) {
            self.inner.insert_at_cursor(text);
        }
    }

    #[test]
    fn vanished_line_abandons_silently() {
        let mut c = controller();
        let mut doc = LineBuffer::from_lines(["## Log", "a"]);
        press_enter(&mut doc, 1, "");
        assert!(c.on_text_change(&doc, "\n"));

        let mut shorter = Some(StaleCaret {
            inner: LineBuffer::from_lines(["## Log"]),
            cursor: Cursor::new(2, 0),
        });
        let outcomes = c.run_deferred(&mut shorter);
        assert_eq!(outcomes, [StampOutcome::Abandoned(AbandonReason::LineOutOfRange)]);
        assert_eq!(shorter.unwrap().inner.lines(), ["## Log"]);
    }

    #[test]
    fn deferred_stamp_follows_caret_after_document_shifts() {
        let mut c = controller();
        let mut armed = LineBuffer::from_lines(["## Log", "a"]);
        press_enter(&mut armed, 1, "");
        assert!(c.on_text_change(&armed, "\n"));
        assert_eq!(c.state(), StampState::Armed { line: 2 });

        // Another edit removed "a" and appended a heading before the tick.
        let mut shifted = LineBuffer::from_lines(["## Log", "", "## Other"]);
        shifted.set_cursor(Cursor::new(1, 0));
        let mut doc = Some(shifted);

        let outcomes = c.run_deferred(&mut doc);
        assert_eq!(
            outcomes,
            [StampOutcome::Stamped {
                line: 1,
                caret: STAMP.len()
            }]
        );
        let buffer = doc.unwrap();
        assert_eq!(buffer.lines(), ["## Log", STAMP, "## Other"]);
        assert_eq!(buffer.cursor(), Cursor::new(1, STAMP.len()));
    }

    #[test]
    fn already_stamped_line_is_unchanged() {
        let mut c = controller();
        let mut doc = Some(LineBuffer::from_lines(["## Log", "a"]));
        let buffer = doc.as_mut().unwrap();
        press_enter(buffer, 1, "");
        assert!(c.on_text_change(buffer, "\n"));
        buffer.set_line(2, "[08:00] typed fast").unwrap();

        let outcomes = c.run_deferred(&mut doc);
        assert_eq!(outcomes, [StampOutcome::Unchanged { line: 2 }]);
        assert_eq!(doc.unwrap().line(2), Some("[08:00] typed fast"));
    }

    #[test]
    fn empty_line_policy_applies_to_auto_stamp() {
        let settings = Settings {
            stamp_empty_lines: false,
            detection_mode: DetectionMode::Header,
            ..Settings::default()
        };
        let mut c = controller_with(&settings);
        let mut doc = Some(LineBuffer::from_lines(["## Log", "a"]));
        let buffer = doc.as_mut().unwrap();
        press_enter(buffer, 1, "");
        assert!(c.on_text_change(buffer, "\n"));
        let outcomes = c.run_deferred(&mut doc);
        assert_eq!(outcomes, [StampOutcome::Unchanged { line: 2 }]);
    }

    #[test]
    fn run_deferred_without_pending_is_noop() {
        let mut c = controller();
        let mut doc = Some(LineBuffer::from_lines(["## Log"]));
        assert!(c.run_deferred(&mut doc).is_empty());
        assert_eq!(c.state(), StampState::Idle);
    }

    #[test]
    fn deferred_queue_is_fifo() {
        let mut queue = DeferredQueue::default();
        assert!(queue.is_empty());
        queue.push(1);
        queue.push(2);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), None);
    }
}
