//! Top-level argument parsing

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands;

#[derive(Parser, Debug)]
#[command(
    name = "bdt",
    version,
    about = "Record and analyze blower-door airtightness tests as plain-text YAML files",
    long_about = "bdt keeps blower-door test sessions as YAML files that live in your \
                  project directory and diff cleanly under version control. Record building \
                  data, weather, and fan readings in the field, then fit the leakage curve \
                  and check the result against your jurisdiction's ACH50 limit."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Output format
    #[arg(
        long = "output",
        short = 'o',
        global = true,
        value_enum,
        default_value_t = OutputFormat::Auto
    )]
    pub format: OutputFormat,

    /// Run as if started in this directory
    #[arg(long = "directory", short = 'C', global = true, value_name = "DIR")]
    pub directory: Option<std::path::PathBuf>,
}

/// Machine-readable and human output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pick a sensible format for the command
    Auto,
    /// Aligned table
    Table,
    /// Tab-separated values
    Tsv,
    /// Comma-separated values
    Csv,
    /// JSON
    Json,
    /// Raw YAML
    Yaml,
    /// Full entity IDs only, one per line
    Id,
    /// File paths only, one per line
    Path,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a bdt project in the current directory
    Init(commands::init::InitArgs),

    /// Create, list, and inspect test sessions
    #[command(subcommand)]
    Session(commands::session::SessionCommands),

    /// Record the building under test
    #[command(subcommand)]
    Building(commands::building::BuildingCommands),

    /// Record weather conditions for optional flow corrections
    #[command(subcommand)]
    Weather(commands::weather::WeatherCommands),

    /// Record and manage fan pressure readings
    #[command(subcommand)]
    Point(commands::point::PointCommands),

    /// Fit the leakage curve and evaluate compliance
    Calc(commands::calc::CalcArgs),

    /// Show the fan calibration table
    Rings(commands::rings::RingsArgs),

    /// Check every session file in the project
    Validate(commands::validate::ValidateArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}
