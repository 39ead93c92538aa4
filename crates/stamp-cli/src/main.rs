use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use stamp_cli::commands::{edit, now, regions, toggle, util};
use stamp_cli::{Cli, Commands, Config, LineTarget};
use stamp_core::{AutoStampController, LineBuffer, LineRewriter, RegionClassifier};

/// Opens the target file and resolves its 1-based line.
fn open_target(target: &LineTarget) -> Result<(LineBuffer, usize)> {
    let doc = util::open_document(&target.file)?;
    let index = util::line_index(&doc, target.line)?;
    Ok((doc, index))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let mut config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let stamp_config = config.stamp_config();
    let formatter = util::formatter(&stamp_config, cli.at.as_deref())?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Some(Commands::Now { bare }) => now::run(&mut out, &formatter, bare)?,
        Some(Commands::Regions { file, json }) => {
            let doc = util::open_document(&file)?;
            let classifier = RegionClassifier::new(stamp_config);
            regions::run(&mut out, &classifier, doc, json)?;
        }
        Some(Commands::Check { target }) => {
            let (doc, index) = open_target(&target)?;
            let classifier = RegionClassifier::new(stamp_config);
            regions::check(&mut out, &classifier, &doc, index)?;
        }
        Some(Commands::Stamp { target, dry_run }) => {
            let (doc, index) = open_target(&target)?;
            let rewriter = LineRewriter::new(&stamp_config, formatter);
            let mut log = Vec::new();
            let doc = edit::stamp(&mut log, &rewriter, doc, index)?;
            finish(&mut out, &log, &target, &doc, dry_run)?;
        }
        Some(Commands::Newline { target, dry_run }) => {
            let (doc, index) = open_target(&target)?;
            let mut controller = AutoStampController::new(stamp_config, formatter);
            let mut log = Vec::new();
            let doc = edit::newline(&mut log, &mut controller, doc, index)?;
            finish(&mut out, &log, &target, &doc, dry_run)?;
        }
        Some(Commands::Insert {
            target,
            column,
            dry_run,
        }) => {
            let (doc, index) = open_target(&target)?;
            let mut log = Vec::new();
            let doc = edit::insert(&mut log, &formatter, doc, index, column)?;
            finish(&mut out, &log, &target, &doc, dry_run)?;
        }
        Some(Commands::Template {
            kind,
            target,
            dry_run,
        }) => {
            let (doc, index) = open_target(&target)?;
            let mut log = Vec::new();
            let doc = edit::template(&mut log, kind, &stamp_config, &formatter, doc, index)?;
            finish(&mut out, &log, &target, &doc, dry_run)?;
        }
        Some(Commands::Toggle) => toggle::run(&mut out, &mut config)?,
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}

/// Saves or prints the edited document.
///
/// A dry run prints only the document; otherwise the file is written and the
/// command's report goes to stdout.
fn finish<W: Write>(
    out: &mut W,
    report: &[u8],
    target: &LineTarget,
    doc: &LineBuffer,
    dry_run: bool,
) -> Result<()> {
    if dry_run {
        std::io::stderr().write_all(report)?;
    } else {
        out.write_all(report)?;
    }
    util::emit(out, &target.file, doc, dry_run)
}
