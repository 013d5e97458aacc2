//! Rate desk CLI - price medical-transport trips from the command line.

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use medtrans_rates::config::AppConfig;
use medtrans_rates::AppError;

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    // Loads .env, so RUST_LOG from there is honoured below
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let default_filter = if cli.verbose {
        "medtrans_rates=debug"
    } else {
        "medtrans_rates=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = commands::execute(cli, config) {
        match e.downcast_ref::<AppError>() {
            Some(denial) if denial.is_denial() => eprintln!("{}", denial),
            _ => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}
