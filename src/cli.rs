use clap::{Parser, Subcommand};
use fertiplan::config::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "fertiplan",
    version,
    about = "Deterministic fertilizer dosing recommendations"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the reference settings bundle (overrides the config)
    #[arg(short, long, global = true)]
    pub settings: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute a recommendation for a project file (JSON or YAML)
    Recommend {
        /// Project input file
        project: PathBuf,

        /// Run with one of the project's alternative scenarios
        #[arg(long)]
        scenario: Option<String>,

        /// Output format (defaults to the configured one)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Load and validate the settings bundle
    Check,
    /// List regions named by the reference tables
    Regions,
    /// List crops named by the reference tables
    Crops,
    /// Write seed settings, demo tables and a config file
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },
}
