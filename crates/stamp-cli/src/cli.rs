//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Timestamped log regions for plain-text notes.
///
/// Lines under a log heading (`## Log`) or inside a log fence
/// (```` ```timestamp-log ````) are journal entries: new lines there get a
/// timestamp in front.
#[derive(Debug, Parser)]
#[command(name = "stamp", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Use this instant (RFC 3339) instead of the current time.
    #[arg(long, global = true, value_name = "TIME")]
    pub at: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// A document and a 1-based line in it.
#[derive(Debug, Args)]
pub struct LineTarget {
    /// The text file to operate on.
    pub file: PathBuf,

    /// Line number, starting at 1.
    #[arg(short, long)]
    pub line: usize,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print a stamp for the current time.
    Now {
        /// Print only the formatted time, without prefix and suffix.
        #[arg(long)]
        bare: bool,
    },

    /// List the log regions of a file.
    Regions {
        file: PathBuf,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Report whether a line is inside a log region.
    Check {
        #[command(flatten)]
        target: LineTarget,
    },

    /// Stamp a line, whether or not it is in a log region.
    Stamp {
        #[command(flatten)]
        target: LineTarget,

        /// Print the document instead of writing it back.
        #[arg(long)]
        dry_run: bool,
    },

    /// Press Enter at the end of a line, as an editor would.
    ///
    /// The new line continues any list marker and is stamped when both it
    /// and the line above are inside a log region.
    Newline {
        #[command(flatten)]
        target: LineTarget,

        /// Print the document instead of writing it back.
        #[arg(long)]
        dry_run: bool,
    },

    /// Insert a stamp at a column of a line.
    Insert {
        #[command(flatten)]
        target: LineTarget,

        /// Character column, starting at 0. Defaults to the end of the line.
        #[arg(long)]
        column: Option<usize>,

        /// Print the document instead of writing it back.
        #[arg(long)]
        dry_run: bool,
    },

    /// Insert a new log region after a line.
    Template {
        #[arg(value_enum)]
        kind: TemplateKind,

        #[command(flatten)]
        target: LineTarget,

        /// Print the document instead of writing it back.
        #[arg(long)]
        dry_run: bool,
    },

    /// Turn automatic stamping on or off and save the setting.
    Toggle,
}

/// Region templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TemplateKind {
    /// A log heading followed by a first entry.
    Header,
    /// A log fence holding a first entry.
    Fence,
}
