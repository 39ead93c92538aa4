//! Now command: prints a stamp for the current time.

use std::io::Write;

use anyhow::Result;
use stamp_core::TimestampFormatter;

pub fn run<W: Write>(writer: &mut W, formatter: &TimestampFormatter, bare: bool) -> Result<()> {
    let formatted = formatter.format(&formatter.now());
    if bare {
        writeln!(writer, "{formatted}")?;
    } else {
        writeln!(writer, "{}", formatter.decorate(&formatted))?;
    }
    Ok(())
}
