//! Renders a nested TAP 13 stream for humans.
//!
//! Usage: `some-suite | tap-pretty` or `tap-pretty results.tap`

use clap::Parser;
use miette::{IntoDiagnostic, WrapErr};
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::{fs, process};
use suite_tooth::tap::pretty::PrettySink;
use suite_tooth::tap::LineSink;

#[derive(Debug, Parser)]
#[command(name = "tap-pretty", version, about = "Pretty-print nested TAP output.")]
struct Args {
    /// TAP file to read. Reads stdin when omitted.
    input: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long)]
    no_color: bool,
}

fn main() -> miette::Result<()> {
    let args = Args::parse();
    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            fs::File::open(path)
                .into_diagnostic()
                .wrap_err_with(|| format!("could not open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let use_colors = !args.no_color && atty::is(atty::Stream::Stdout);
    let mut sink = PrettySink::stdout(use_colors);
    for line in reader.lines() {
        let line = line.into_diagnostic().wrap_err("could not read TAP input")?;
        sink.emit(&line);
    }
    sink.finish();

    if sink.failed() > 0 {
        process::exit(1);
    }
    Ok(())
}
