//! Output formatting for CLI results
//!
//! Human-readable messages go to stdout in table mode. In JSON mode stdout
//! carries nothing but the JSON document, so scripts can pipe it directly.
//! Warnings and errors always go to stderr.

use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;
use vulnera_scan_core::{Scan, ScanSummary};

/// Output format for CLI results
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table (default)
    #[default]
    Table,
    /// JSON output for machine processing
    Json,
}

/// Writes command results according to the global output flags
#[derive(Debug, Clone)]
pub struct OutputWriter {
    format: OutputFormat,
    quiet: bool,
    verbose: bool,
}

impl OutputWriter {
    pub fn new(format: OutputFormat, quiet: bool, verbose: bool) -> Self {
        Self {
            format,
            quiet,
            verbose,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    fn chatty(&self) -> bool {
        !self.quiet && self.format == OutputFormat::Table
    }

    pub fn header(&self, title: &str) {
        if self.chatty() {
            println!("\n{}\n{}", title, "=".repeat(title.len()));
        }
    }

    pub fn info(&self, message: &str) {
        if self.chatty() {
            println!("{}", message);
        }
    }

    pub fn debug(&self, message: &str) {
        if self.chatty() && self.verbose {
            println!("  {}", message);
        }
    }

    pub fn success(&self, message: &str) {
        if self.chatty() {
            println!("✓ {}", message);
        }
    }

    pub fn warn(&self, message: &str) {
        if !self.quiet {
            eprintln!("warning: {}", message);
        }
    }

    pub fn error(&self, message: &str) {
        eprintln!("error: {}", message);
    }

    /// Print a value as pretty JSON on stdout
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, value)?;
        writeln!(stdout)?;
        Ok(())
    }

    /// Render a scan snapshot
    pub fn scan(&self, scan: &Scan) -> Result<()> {
        match self.format {
            OutputFormat::Json => self.json(scan),
            OutputFormat::Table => {
                if self.quiet {
                    return Ok(());
                }
                println!("{}", render_scan(scan));
                Ok(())
            }
        }
    }

    /// Render a scan summary; `scan` is included in JSON output
    pub fn summary(&self, scan: &Scan, summary: &ScanSummary) -> Result<()> {
        match self.format {
            OutputFormat::Json => self.json(&SummaryReport { scan, summary }),
            OutputFormat::Table => {
                if self.quiet {
                    return Ok(());
                }
                println!("{}", render_summary(summary));
                Ok(())
            }
        }
    }
}

#[derive(Serialize)]
struct SummaryReport<'a> {
    scan: &'a Scan,
    summary: &'a ScanSummary,
}

fn render_scan(scan: &Scan) -> String {
    let mut rows = vec![
        ("Scan", scan.id().to_string()),
        ("Organization", scan.organization_id().to_string()),
        ("Project", scan.project_id().to_string()),
        ("Status", scan.status().to_string()),
    ];
    if let Some(message) = scan.error_message() {
        rows.push(("Message", message.to_string()));
    }
    render_rows(&rows)
}

fn render_summary(summary: &ScanSummary) -> String {
    render_rows(&[
        ("Total findings", summary.total_findings.to_string()),
        ("Critical", summary.critical.to_string()),
        ("High", summary.high.to_string()),
        ("Medium", summary.medium.to_string()),
        ("Low", summary.low.to_string()),
        ("Info", summary.info.to_string()),
    ])
}

fn render_rows(rows: &[(&str, String)]) -> String {
    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    rows.iter()
        .map(|(label, value)| format!("{:<width$}  {}", label, value, width = width))
        .collect::<Vec<_>>()
        .join("\n")
}
