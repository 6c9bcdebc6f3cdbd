//! Command-line driver: reads address lists from files or stdin, merges them
//! and prints the minimal CIDR list.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser as ClapParser, ValueHint};
use log::warn;
use thiserror::Error;

use crate::format::{write_blocks, AddressStyle};
use crate::merger::RangeMerger;
use crate::parser::Parser;
use crate::MergeSummary;

const STDIN_NAME: &str = "-";

/// Merge IP addresses, CIDR blocks and ranges into a minimal CIDR list.
///
/// Input lines hold `address`, `address/prefix` or `first-last`, IPv4 or IPv6.
/// `#` starts a comment and empty lines are ignored.
#[derive(ClapParser, Debug)]
#[command(name = "ipmerge", version)]
struct Cli {
    /// Input files (default: stdin, `-` also reads stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    inputs: Vec<PathBuf>,

    /// Write the result to FILE instead of stdout.
    #[arg(short = 'o', long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Print a merge summary to stderr; twice also logs every merge.
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,

    /// Print IPv6 addresses fully expanded.
    #[arg(long)]
    exploded: bool,

    /// Reject `address/prefix` when the address is not the network address.
    #[arg(long)]
    strict: bool,

    /// Log and skip lines that do not parse instead of failing.
    #[arg(long = "skip-invalid")]
    skip_invalid: bool,
}

#[derive(Debug)]
struct Options {
    inputs: Vec<PathBuf>,
    output: Option<PathBuf>,
    verbose: u8,
    style: AddressStyle,
    parser: Parser,
    skip_invalid: bool,
}

fn resolve_options(cli: Cli) -> Options {
    let inputs = if cli.inputs.is_empty() {
        vec![PathBuf::from(STDIN_NAME)]
    } else {
        cli.inputs
    };
    Options {
        inputs,
        output: cli.output,
        verbose: cli.verbose,
        style: if cli.exploded {
            AddressStyle::Exploded
        } else {
            AddressStyle::Compressed
        },
        parser: Parser::new().strict(cli.strict),
        skip_invalid: cli.skip_invalid,
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("{}:{line}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        source: crate::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> CliError + '_ {
    move |source| CliError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn read_input(opts: &Options, path: &Path, merger: &mut RangeMerger) -> Result<(), CliError> {
    let reader: Box<dyn BufRead> = if path.as_os_str() == STDIN_NAME {
        Box::new(io::stdin().lock())
    } else {
        Box::new(BufReader::new(File::open(path).map_err(io_error(path))?))
    };

    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(io_error(path))?;
        match opts.parser.parse_line(&line) {
            Ok(Some(range)) => merger.insert(range),
            Ok(None) => {}
            Err(source) if opts.skip_invalid => {
                warn!("{}:{}: skipping: {}", path.display(), i + 1, source);
            }
            Err(source) => {
                return Err(CliError::Parse {
                    path: path.to_path_buf(),
                    line: i + 1,
                    source,
                })
            }
        }
    }
    Ok(())
}

fn open_output(path: &Path) -> Result<Box<dyn Write>, CliError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(io_error(dir))?;
    }
    let file = File::create(path).map_err(io_error(path))?;
    Ok(Box::new(BufWriter::new(file)))
}

fn execute(opts: &Options) -> Result<MergeSummary, CliError> {
    let mut merger = RangeMerger::new();
    for path in &opts.inputs {
        read_input(opts, path, &mut merger)?;
    }
    let original = merger.len();
    let set = merger.finish();

    let out_name = opts
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(STDIN_NAME));
    let mut out: Box<dyn Write> = match &opts.output {
        Some(path) => open_output(path)?,
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    let merged = write_blocks(&mut out, &set, opts.style).map_err(io_error(&out_name))?;
    out.flush().map_err(io_error(&out_name))?;

    Ok(MergeSummary { original, merged })
}

/// Main CLI entry point.
pub fn run() -> ! {
    let cli = Cli::parse();
    let opts = resolve_options(cli);

    let level = match opts.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();

    match execute(&opts) {
        Ok(summary) => {
            if opts.verbose > 0 {
                eprint!("{}", summary);
            }
            process::exit(0)
        }
        Err(e) => {
            eprintln!("ipmerge: {}", e);
            process::exit(1)
        }
    }
}
