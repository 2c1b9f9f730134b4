//! xrate - Print the amount of a currency that one US dollar buys today
//!
//! Rates come from openexchangerates.org and are cached on disk for the rest
//! of the day.

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use xrate::cli::{Cli, Invocation, USAGE};
use xrate::config::Paths;
use xrate::rates::{ExchangeRates, OpenExchangeRates};

/// Installs a stderr logger filtered by `RUST_LOG`, defaulting to warnings
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the cache, looks up the rate, and saves the cache
async fn run(cli: &Cli) -> Result<f64, xrate::Error> {
    let paths = Paths::from_environment()?;
    let source = OpenExchangeRates::new(paths.config_file);
    let mut rates = ExchangeRates::new(paths.cache_file, source);

    rates.load()?;
    let rate = rates.get_rate(&cli.currency, cli.refresh).await?;
    rates.save()?;

    Ok(rate)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_logging();

    let cli = match Invocation::from_args(std::env::args_os()) {
        Invocation::Run(cli) => cli,
        Invocation::Info(e) => e.exit(),
        Invocation::Usage => {
            print!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    match run(&cli).await {
        Ok(rate) => {
            println!("{rate:.2}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
