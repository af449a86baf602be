//! CLI Context - Configuration and services shared by every command

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use vulnera_scan_core::config::{API_TOKEN_ENV, ScanConfig};
use vulnera_scan_core::{HttpScanTransport, TransportError, init_tracing};

use crate::cli::Cli;
use crate::cli::output::OutputWriter;

/// Context for CLI operations
pub struct CliContext {
    /// Application configuration with command-line overrides applied
    pub config: ScanConfig,

    /// Output writer configured based on CLI flags
    pub output: OutputWriter,

    /// Whether we're running in CI mode
    pub ci_mode: bool,

    /// Directory relative artifact paths are resolved against
    pub working_dir: PathBuf,
}

impl CliContext {
    /// Create a new CLI context from parsed CLI arguments
    pub fn new(cli: &Cli) -> Result<Self> {
        let mut config = Self::load_config(cli.config.as_deref())?;
        Self::apply_overrides(&mut config, cli);

        if let Err(e) = init_tracing(&config.logging) {
            // Only happens when a subscriber is already installed
            tracing::debug!("Tracing already initialized: {}", e);
        }

        let output = OutputWriter::new(cli.format, cli.quiet, cli.verbose);

        let working_dir =
            std::env::current_dir().context("Failed to determine current working directory")?;

        Ok(Self {
            config,
            output,
            ci_mode: cli.ci,
            working_dir,
        })
    }

    /// Load configuration from an explicit file or the default locations
    fn load_config(config_path: Option<&Path>) -> Result<ScanConfig> {
        let config = match config_path {
            Some(path) => ScanConfig::load_from(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
            None => ScanConfig::load().context("Failed to load configuration")?,
        };
        Ok(config)
    }

    fn apply_overrides(config: &mut ScanConfig, cli: &Cli) {
        if let Some(organization_id) = &cli.organization_id {
            config.service.organization_id = organization_id.clone();
        }
        if let Some(project_id) = &cli.project_id {
            config.service.project_id = project_id.clone();
        }

        if cli.verbose {
            config.logging.level = "debug".to_string();
        } else if cli.quiet {
            config.logging.level = "error".to_string();
        }
    }

    /// Whether an API token is configured
    pub fn is_authenticated(&self) -> bool {
        self.config.service.api_token.is_some()
    }

    /// Fail early in CI mode when no token is available.
    ///
    /// Returns the message to report, or `None` when the command may proceed.
    pub fn missing_token_message(&self) -> Option<String> {
        if self.is_authenticated() {
            return None;
        }
        if self.ci_mode {
            Some(format!("CI mode requires an API token; set {}", API_TOKEN_ENV))
        } else {
            self.output.warn(&format!(
                "No API token configured; set {} if the service requires one",
                API_TOKEN_ENV
            ));
            None
        }
    }

    /// Build the HTTP transport for the configured service
    pub fn transport(&self) -> Result<Arc<HttpScanTransport>, TransportError> {
        HttpScanTransport::from_config(&self.config.service).map(Arc::new)
    }

    /// Resolve a command-line path against the working directory
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }
}
