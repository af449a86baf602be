//! Vulnera Scan CLI - Command-line interface for remote artifact scans
//!
//! Uploads a build artifact to the Vulnera analysis service, waits for the
//! scan to finish and writes its results.
//!
//! ## Features
//! - Summary output as a table or JSON
//! - SARIF and summary files for CI artifact upload
//! - Bounded waiting: `--timeout` and Ctrl+C hang the scan up cleanly
//! - CI mode: non-interactive, token required, status-coded exits

mod commands;
mod context;
mod output;

pub use context::CliContext;
pub use output::{OutputFormat, OutputWriter};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Vulnera Scan - Remote artifact scanning from the command line
#[derive(Parser, Debug)]
#[command(
    name = "vulnera-scan",
    author = "Vulnera Team",
    version,
    about = "Scan build artifacts with the Vulnera analysis service",
    long_about = "Vulnera Scan uploads a build artifact to the Vulnera analysis service, \
                  starts a scan of it and waits for the results.\n\n\
                  The API token is read from VULNERA_SCAN_API_TOKEN or the configuration file."
)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// CI mode: require an API token from the environment, exit with status codes
    #[arg(long, global = true, env = "VULNERA_CI")]
    pub ci: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Organization owning the project (overrides configuration)
    #[arg(long, global = true)]
    pub organization_id: Option<String>,

    /// Project the artifact belongs to (overrides configuration)
    #[arg(long, global = true)]
    pub project_id: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload an artifact, scan it and wait for the results
    #[command(visible_alias = "s")]
    Scan(commands::scan::ScanArgs),

    /// Show the current state of a scan
    Status(commands::status::StatusArgs),
}

/// CLI application runner
pub struct CliApp {
    cli: Cli,
    context: CliContext,
}

impl CliApp {
    /// Create a new CLI application instance
    pub fn new() -> anyhow::Result<Self> {
        Self::from_cli(Cli::parse())
    }

    /// Create an application from already parsed arguments
    pub fn from_cli(cli: Cli) -> anyhow::Result<Self> {
        let context = CliContext::new(&cli)?;
        Ok(Self { cli, context })
    }

    /// Run the CLI application
    pub async fn run(self) -> anyhow::Result<i32> {
        let exit_code = match self.cli.command {
            Commands::Scan(ref args) => commands::scan::run(&self.context, args).await,
            Commands::Status(ref args) => commands::status::run(&self.context, args).await,
        }?;

        Ok(exit_code)
    }
}

/// Exit codes for CI integration
pub mod exit_codes {
    use vulnera_scan_core::{ScanError, TransportError};

    /// Success
    pub const SUCCESS: i32 = 0;
    /// Scan completed with findings and `--fail-on-findings` was set
    pub const FINDINGS_FOUND: i32 = 1;
    /// Configuration or input error
    pub const CONFIG_ERROR: i32 = 2;
    /// The analysis service could not be reached or answered with an error
    pub const NETWORK_ERROR: i32 = 3;
    /// The remote scan failed
    pub const SCAN_FAILED: i32 = 4;
    /// Authentication required but not provided, or rejected
    pub const AUTH_REQUIRED: i32 = 5;
    /// The scan was cancelled remotely, hung up or timed out
    pub const CANCELLED: i32 = 6;
    /// Internal error
    pub const INTERNAL_ERROR: i32 = 99;

    /// Map a scan error to the exit code reported for it
    pub fn for_scan_error(err: &ScanError) -> i32 {
        match err {
            ScanError::Transport(e) => for_transport_error(e),
            ScanError::Failed { .. } => SCAN_FAILED,
            ScanError::Cancelled { .. } => CANCELLED,
            ScanError::Precondition(_) => CONFIG_ERROR,
            ScanError::Io(_) | ScanError::Internal(_) => INTERNAL_ERROR,
        }
    }

    pub fn for_transport_error(err: &TransportError) -> i32 {
        match err {
            TransportError::Unauthorized(_) => AUTH_REQUIRED,
            TransportError::Configuration(_) => CONFIG_ERROR,
            TransportError::Io(_) => CONFIG_ERROR,
            _ => NETWORK_ERROR,
        }
    }

}
