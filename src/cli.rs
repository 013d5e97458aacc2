//! CLI definition using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Parser)]
#[command(name = "medtrans-rates")]
#[command(version)]
#[command(about = "Price medical-transport trips and manage the rate table")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding the desk's store (overrides MEDTRANS_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(long, short = 'f', global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Price a trip
    Quote(QuoteArgs),

    /// View or edit the rate table
    Rates {
        #[command(subcommand)]
        action: RatesAction,
    },

    /// Staff roster and user switching
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },

    /// Show recent audit entries
    Audit {
        /// Number of entries to show
        #[arg(long, short = 'n', default_value_t = 20)]
        limit: usize,
    },
}

/// Trip fields. Numbers are read leniently: anything unparseable counts as 0.
#[derive(Args, Debug, Default)]
pub struct QuoteArgs {
    /// Read the whole request from a JSON file instead of flags
    #[arg(long, conflicts_with_all = ["service", "rate", "trip", "miles"])]
    pub request: Option<PathBuf>,

    /// ambulatory, wheelchair or stretcher
    #[arg(long, default_value = "ambulatory")]
    pub service: String,

    /// regular, offHours, holiday or regular+offHours
    #[arg(long, default_value = "regular")]
    pub rate: String,

    /// oneway or roundtrip
    #[arg(long, default_value = "oneway")]
    pub trip: String,

    /// Trip distance in miles
    #[arg(long, default_value = "0")]
    pub miles: String,

    /// Empty-vehicle miles
    #[arg(long, default_value = "0")]
    pub deadhead: String,

    /// Deadhead multiplier (1, 2 or 4)
    #[arg(long, default_value = "1")]
    pub deadhead_multiplier: String,

    /// Wheelchair ramp
    #[arg(long)]
    pub ramp: bool,

    /// Wait time in minutes
    #[arg(long, default_value = "0")]
    pub wait: String,

    /// Second driver
    #[arg(long)]
    pub second_driver: bool,

    /// Number of companions riding along
    #[arg(long, default_value = "0")]
    pub companions: String,

    /// Escort hours
    #[arg(long, default_value = "0")]
    pub escort_hours: String,

    /// Airport meet & greet (ORD, MDW)
    #[arg(long, default_value = "")]
    pub airport: String,

    /// Number of stop overs
    #[arg(long, default_value = "0")]
    pub stop_overs: String,

    /// Number of extra destination legs
    #[arg(long, default_value = "0")]
    pub legs: String,

    /// Markup type: none, dollar or percent
    #[arg(long, default_value = "none")]
    pub markup_type: String,

    /// Markup amount (dollars or percent)
    #[arg(long, default_value = "0")]
    pub markup: String,
}

#[derive(Subcommand)]
pub enum RatesAction {
    /// Print the rate table
    Show,

    /// Replace the rate table from a JSON file
    Set {
        /// Path to the rate table JSON
        #[arg(long)]
        file: PathBuf,
    },

    /// Restore the default rate table
    Reset,

    /// Worked example per service
    Preview {
        #[arg(long, default_value = "10")]
        miles: String,

        #[arg(long, default_value = "5")]
        deadhead: String,
    },

    /// Regular-rate ranges across services
    Overview,
}

#[derive(Subcommand)]
pub enum UsersAction {
    /// List staff and who is online
    List,

    /// Show the current user
    Whoami,

    /// Switch the current user
    Switch {
        /// User id
        id: u32,
    },
}
