//! Command-line interface parsing for xrate
//!
//! Handles parsing of CLI arguments using clap. A wrong number of arguments is
//! reported with the plain usage text rather than clap's error output.

use clap::error::ErrorKind;
use clap::Parser;

/// Usage text printed when the arguments are wrong
pub const USAGE: &str = "
A simple CLI command to print the amount of CURRENCY that $1 USD would buy at today's rates.

Usage: xrate CURRENCY

CURRENCY is the fiat currency's ticker symbol e.g. NZD, AUD, EUR
";

/// xrate - Print how much of a currency one US dollar buys today
#[derive(Parser, Debug)]
#[command(name = "xrate")]
#[command(about = "Print the amount of CURRENCY that $1 USD would buy at today's rates")]
#[command(version)]
pub struct Cli {
    /// The fiat currency's ticker symbol, e.g. NZD, AUD, EUR
    #[arg(value_name = "CURRENCY")]
    pub currency: String,

    /// Fetch today's rates even if they are already cached
    #[arg(short, long)]
    pub refresh: bool,
}

/// Outcome of parsing the command line
#[derive(Debug)]
pub enum Invocation {
    /// Arguments are valid: look up a rate
    Run(Cli),
    /// `--help` or `--version` was requested; the error carries the output
    Info(clap::Error),
    /// Arguments are wrong: print `USAGE` and fail
    Usage,
}

impl Invocation {
    /// Parses an argument list whose first item is the program name
    pub fn from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        match Cli::try_parse_from(args) {
            Ok(cli) => Invocation::Run(cli),
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                Invocation::Info(e)
            }
            Err(_) => Invocation::Usage,
        }
    }
}
