//! Status Command - Show the current state of a scan

use anyhow::Result;
use clap::Args;
use vulnera_scan_core::{ScanError, ScanTransport};

use crate::cli::context::CliContext;
use crate::cli::exit_codes;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Identifier of the scan
    pub scan_id: String,
}

/// Run the status command
pub async fn run(ctx: &CliContext, args: &StatusArgs) -> Result<i32> {
    let service = &ctx.config.service;
    for (flag, value) in [
        ("--organization-id", &service.organization_id),
        ("--project-id", &service.project_id),
        ("scan id", &args.scan_id),
    ] {
        if value.trim().is_empty() {
            ctx.output.error(&format!("{} must not be empty", flag));
            return Ok(exit_codes::CONFIG_ERROR);
        }
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

    let scan = match transport
        .get_scan_by_id(&service.organization_id, &service.project_id, &args.scan_id)
        .await
    {
        Ok(scan) => scan,
        Err(e) => {
            let err = ScanError::from(e);
            ctx.output.error(&err.to_string());
            return Ok(exit_codes::for_scan_error(&err));
        }
    };

    ctx.output.scan(&scan)?;
    Ok(exit_codes::SUCCESS)
}
