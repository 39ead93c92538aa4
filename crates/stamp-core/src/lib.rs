//! Core engine for timestamped log regions.
//!
//! This crate contains:
//! - Region classification: deciding whether a line sits under a log heading
//!   or inside a log fence, and where that region starts and ends
//! - Line rewriting: placing a timestamp on a line without disturbing list
//!   markers or stamping twice
//! - Auto stamping: reacting to line breaks inside log regions
//! - Editor commands built on the above

pub mod commands;
mod controller;
pub mod document;
pub mod formatter;
mod region;
mod rewriter;
pub mod settings;

pub use controller::{AbandonReason, AutoStampController, DeferredQueue, StampOutcome, StampState};
pub use document::{Cursor, Document, DocumentError, Host, LineBuffer};
pub use formatter::{Clock, FixedClock, SystemClock, TimestampFormatter, format_timestamp};
pub use region::{Region, RegionClassifier, RegionKind, heading_depth};
pub use rewriter::{LineRewriter, Rewrite};
pub use settings::{DetectionMode, HeadingMatcher, Settings, SettingsError, StampConfig};
