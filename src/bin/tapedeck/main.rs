//! tapedeck CLI: parse a JSON file onto a tape and print document statistics.

mod stats;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process;

use tapedeck::PaddedBytes;

#[derive(Debug, Parser)]
#[command(name = "tapedeck")]
#[command(about = "Reads JSON, prints tape statistics", long_about = None)]
#[command(version)]
struct Cli {
    /// Input JSON file
    file: PathBuf,

    /// Dump the raw tape instead of statistics
    #[arg(long)]
    tape: bool,

    /// Quiet mode: exit code only, no output
    #[arg(short, long)]
    quiet: bool,

    /// Force color output even when not a TTY
    #[arg(short = 'C', long = "color")]
    color: bool,

    /// Disable color output
    #[arg(short = 'M', long = "no-color")]
    no_color: bool,
}

/// Exit codes for the tool.
mod exit_codes {
    /// The file parsed successfully.
    pub const SUCCESS: i32 = 0;
    /// The file is not valid JSON.
    pub const INVALID: i32 = 1;
    /// I/O error (file not found, permission denied, etc.).
    pub const IO_ERROR: i32 = 2;
}

/// ANSI color codes for error output.
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const ERROR: &str = "\x1b[1;31m"; // Bold red
}

/// Color scheme that can be disabled.
struct ColorScheme {
    error: &'static str,
    reset: &'static str,
}

impl ColorScheme {
    fn new(use_color: bool) -> Self {
        if use_color {
            Self {
                error: colors::ERROR,
                reset: colors::RESET,
            }
        } else {
            Self { error: "", reset: "" }
        }
    }
}

fn main() {
    let args = Cli::parse();
    match run(&args) {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            process::exit(exit_codes::IO_ERROR);
        }
    }
}

fn run(args: &Cli) -> Result<i32> {
    let use_color = if args.no_color {
        false
    } else if args.color {
        true
    } else {
        atty::is(atty::Stream::Stderr)
    };
    let scheme = ColorScheme::new(use_color);

    let input = match PaddedBytes::load(&args.file) {
        Ok(input) => input,
        Err(err) => {
            if !args.quiet {
                eprintln!(
                    "{}error{}: {}: {}",
                    scheme.error,
                    scheme.reset,
                    args.file.display(),
                    err
                );
            }
            return Ok(exit_codes::IO_ERROR);
        }
    };

    let mut parser = tapedeck::Parser::new();
    if let Err(err) = parser.parse_padded(&input) {
        if !args.quiet {
            eprintln!(
                "{}error{}: {}: {}",
                scheme.error,
                scheme.reset,
                args.file.display(),
                err
            );
        }
        return Ok(exit_codes::INVALID);
    }

    let doc = match parser.document() {
        Ok(doc) => doc,
        Err(err) => {
            if !args.quiet {
                eprintln!("{}error{}: {}", scheme.error, scheme.reset, err);
            }
            return Ok(exit_codes::INVALID);
        }
    };
    if args.tape {
        print!("{doc:?}");
    } else if !args.quiet {
        let stats = stats::compute(doc, &input, parser.n_structural_indexes());
        stats::print(&stats);
    }
    Ok(exit_codes::SUCCESS)
}
