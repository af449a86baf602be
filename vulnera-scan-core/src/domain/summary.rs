//! Scan summary value object

use serde::{Deserialize, Serialize};

/// Aggregated result of a completed scan.
///
/// Only fetched once the scan reached `COMPLETED`. Unknown fields sent by the
/// service are kept in `details` so nothing is lost when writing results out.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScanSummary {
    pub total_findings: u64,
    pub critical: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
    pub info: u64,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl ScanSummary {
    pub fn has_findings(&self) -> bool {
        [
            self.total_findings,
            self.critical,
            self.high,
            self.medium,
            self.low,
            self.info,
        ]
        .iter()
        .any(|&count| count > 0)
    }
}
