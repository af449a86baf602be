//! Scan Command - Upload an artifact and wait for its scan results
//!
//! Runs the full remote flow: upload, start, poll until terminal, then fetch
//! the summary and optionally write the summary and SARIF files.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tokio::runtime::Handle;
use tokio::time::Instant;
use vulnera_scan_core::{ArtifactScanner, ScanError};

use crate::cli::context::CliContext;
use crate::cli::exit_codes;

/// Arguments for the scan command
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Path to the build artifact to upload
    pub artifact: PathBuf,

    /// Label attached to the scan (defaults to the artifact file name)
    #[arg(long)]
    pub label: Option<String>,

    /// Write the SARIF output of the scan to this file
    #[arg(long)]
    pub sarif_output: Option<PathBuf>,

    /// Write the scan summary as JSON to this file
    #[arg(long)]
    pub results_output: Option<PathBuf>,

    /// Seconds between status polls (overrides configuration)
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Stop waiting for the scan after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Exit with a non-zero status if the scan reports findings
    #[arg(long)]
    pub fail_on_findings: bool,
}

/// Run the scan command
pub async fn run(ctx: &CliContext, args: &ScanArgs) -> Result<i32> {
    let path = ctx.resolve_path(&args.artifact);
    if !path.is_file() {
        ctx.output
            .error(&format!("Artifact does not exist: {}", path.display()));
        return Ok(exit_codes::CONFIG_ERROR);
    }

    if args.timeout == Some(0) {
        ctx.output.error("--timeout must be greater than 0");
        return Ok(exit_codes::CONFIG_ERROR);
    }

    if let Some(message) = ctx.missing_token_message() {
        ctx.output.error(&message);
        return Ok(exit_codes::AUTH_REQUIRED);
    }

    let transport = match ctx.transport() {
        Ok(transport) => transport,
        Err(e) => {
            ctx.output.error(&e.to_string());
            return Ok(exit_codes::for_transport_error(&e));
        }
    };

    let poll_interval = args
        .poll_interval
        .map(Duration::from_secs)
        .unwrap_or_else(|| ctx.config.polling.interval());
    let timeout = args
        .timeout
        .map(Duration::from_secs)
        .or_else(|| ctx.config.polling.timeout());

    let scanner = match ArtifactScanner::new(
        Handle::current(),
        transport,
        &ctx.config.service.organization_id,
        &ctx.config.service.project_id,
        poll_interval,
    ) {
        Ok(scanner) => scanner,
        Err(e) => return Ok(report(ctx, &e)),
    };

    let label = args
        .label
        .clone()
        .unwrap_or_else(|| default_label(&path));

    ctx.output.header("Artifact Scan");
    ctx.output.info(&format!("Uploading: {}", path.display()));

    let operation = match scanner.scan_artifact(&path, &label).await {
        Ok(operation) => operation,
        Err(e) => return Ok(report(ctx, &e)),
    };

    ctx.output.info(&format!(
        "Scan {} started, waiting for results...",
        operation.id()
    ));
    ctx.output
        .debug(&format!("Polling every {}s", poll_interval.as_secs()));

    let deadline = timeout.map(Deadline::after);
    let hangup = || operation.hangup();

    let scan = match interruptible(deadline, operation.completion(), hangup).await {
        Ok(scan) => scan,
        Err(e) => return Ok(report(ctx, &e)),
    };

    let summary = match interruptible(deadline, operation.summary(), hangup).await {
        Ok(summary) => summary,
        Err(e) => return Ok(report(ctx, &e)),
    };

    ctx.output.success(&format!("Scan {} completed", scan.id()));
    ctx.output.summary(&scan, &summary)?;

    if let Some(target) = &args.results_output {
        let target = ctx.resolve_path(target);
        let saved = operation.save_results_to_file(&target);
        if let Err(e) = interruptible(deadline, saved, hangup).await {
            return Ok(report(ctx, &e));
        }
        ctx.output
            .info(&format!("Summary written to {}", target.display()));
    }

    if let Some(target) = &args.sarif_output {
        let target = ctx.resolve_path(target);
        let saved = operation.save_sarif_to_file(&target);
        if let Err(e) = interruptible(deadline, saved, hangup).await {
            return Ok(report(ctx, &e));
        }
        ctx.output
            .info(&format!("SARIF written to {}", target.display()));
    }

    let exit_code = if args.fail_on_findings && summary.has_findings() {
        exit_codes::FINDINGS_FOUND
    } else {
        exit_codes::SUCCESS
    };

    Ok(exit_code)
}

/// Point in time after which the command stops waiting for the scan
#[derive(Debug, Clone, Copy)]
struct Deadline {
    limit: Duration,
    at: Instant,
}

impl Deadline {
    fn after(limit: Duration) -> Self {
        Self {
            limit,
            at: Instant::now() + limit,
        }
    }
}

/// Await `work` until `deadline` or Ctrl+C, calling `on_error` if it fails
async fn interruptible<T, F>(
    deadline: Option<Deadline>,
    work: F,
    on_error: impl FnOnce(),
) -> Result<T, ScanError>
where
    F: Future<Output = Result<T, ScanError>>,
{
    let bounded = async {
        match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline.at, work).await {
                Ok(result) => result,
                Err(_) => Err(ScanError::Cancelled {
                    message: format!(
                        "Timed out after {}s waiting for scan",
                        deadline.limit.as_secs()
                    ),
                }),
            },
            None => work.await,
        }
    };

    let result = tokio::select! {
        result = bounded => result,
        Ok(()) = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, hanging up scan");
            Err(ScanError::hung_up())
        }
    };

    if result.is_err() {
        on_error();
    }
    result
}

/// Report a scan error and return its exit code
fn report(ctx: &CliContext, err: &ScanError) -> i32 {
    ctx.output.error(&err.to_string());
    exit_codes::for_scan_error(err)
}

fn default_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string())
}
