//! Common test utilities and a scripted Scan Transport

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::time::Instant;
use vulnera_scan_core::{
    CodeArtifactId, Scan, ScanStatus, ScanSummary, ScanTransport, TransportError,
};

pub const ORG_ID: &str = "org-id";
pub const PROJECT_ID: &str = "project-id";
pub const SCAN_ID: &str = "scan-id";
pub const ARTIFACT_ID: &str = "code-artifact-id";

/// Transport operation recorded by [`MockScanTransport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    CreateCodeArtifact,
    StartScan,
    GetScanById,
    GetScanSummary,
    GetSarif,
}

/// Scripted transport.
///
/// Poll responses are served in order; the last one repeats forever, so a
/// single `Running` entry keeps a scan running until the test stops it.
pub struct MockScanTransport {
    artifact: Result<String, TransportError>,
    start: Result<Scan, TransportError>,
    polls: Mutex<VecDeque<Result<Scan, TransportError>>>,
    summary: Result<ScanSummary, TransportError>,
    sarif: Result<Bytes, TransportError>,
    /// Time a poll spends in flight before answering
    poll_latency: Duration,
    /// Time a summary or SARIF fetch spends in flight before answering
    fetch_latency: Duration,
    calls: Arc<Mutex<Vec<(Call, Instant)>>>,
    started_with: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockScanTransport {
    pub fn new() -> Self {
        Self {
            artifact: Ok(ARTIFACT_ID.to_string()),
            start: Ok(scan(ScanStatus::Waiting)),
            polls: Mutex::new(VecDeque::new()),
            summary: Ok(sample_summary()),
            sarif: Ok(Bytes::from_static(SAMPLE_SARIF)),
            poll_latency: Duration::ZERO,
            fetch_latency: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
            started_with: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Transport whose scan reports each status in turn
    pub fn with_statuses(statuses: &[ScanStatus]) -> Self {
        Self::new().with_polls(statuses.iter().map(|s| Ok(scan(*s))).collect())
    }

    pub fn with_polls(self, polls: Vec<Result<Scan, TransportError>>) -> Self {
        *self.polls.lock().unwrap() = polls.into();
        self
    }

    pub fn with_artifact(mut self, artifact: Result<String, TransportError>) -> Self {
        self.artifact = artifact;
        self
    }

    pub fn with_start(mut self, start: Result<Scan, TransportError>) -> Self {
        self.start = start;
        self
    }

    pub fn with_summary(mut self, summary: Result<ScanSummary, TransportError>) -> Self {
        self.summary = summary;
        self
    }

    pub fn with_sarif(mut self, sarif: Result<Bytes, TransportError>) -> Self {
        self.sarif = sarif;
        self
    }

    pub fn with_poll_latency(mut self, latency: Duration) -> Self {
        self.poll_latency = latency;
        self
    }

    pub fn with_fetch_latency(mut self, latency: Duration) -> Self {
        self.fetch_latency = latency;
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Operations in the order they were issued
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().iter().map(|(c, _)| *c).collect()
    }

    /// Instants at which status polls were issued
    pub fn poll_times(&self) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| *c == Call::GetScanById)
            .map(|(_, at)| *at)
            .collect()
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls.lock().unwrap().iter().filter(|(c, _)| *c == call).count()
    }

    /// `(artifact id, label)` pairs passed to `start_scan`
    pub fn started_with(&self) -> Vec<(String, String)> {
        self.started_with.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push((call, Instant::now()));
    }

    fn next_poll(&self) -> Result<Scan, TransportError> {
        let mut polls = self.polls.lock().unwrap();
        match polls.len() {
            0 => Err(TransportError::InvalidResponse("no scripted poll".to_string())),
            1 => polls[0].clone(),
            _ => polls.pop_front().unwrap(),
        }
    }
}

#[async_trait]
impl ScanTransport for MockScanTransport {
    async fn create_code_artifact(
        &self,
        _organization_id: &str,
        _project_id: &str,
        _path: &Path,
    ) -> Result<CodeArtifactId, TransportError> {
        self.record(Call::CreateCodeArtifact);
        let id = self.artifact.clone()?;
        Ok(CodeArtifactId::new(id).unwrap())
    }

    async fn start_scan(
        &self,
        _organization_id: &str,
        _project_id: &str,
        artifact_id: &CodeArtifactId,
        label: &str,
    ) -> Result<Scan, TransportError> {
        self.record(Call::StartScan);
        self.started_with
            .lock()
            .unwrap()
            .push((artifact_id.to_string(), label.to_string()));
        self.start.clone()
    }

    async fn get_scan_by_id(
        &self,
        _organization_id: &str,
        _project_id: &str,
        _scan_id: &str,
    ) -> Result<Scan, TransportError> {
        self.record(Call::GetScanById);
        if !self.poll_latency.is_zero() {
            tokio::time::sleep(self.poll_latency).await;
        }
        self.next_poll()
    }

    async fn get_scan_summary(
        &self,
        _organization_id: &str,
        _project_id: &str,
        _scan_id: &str,
    ) -> Result<ScanSummary, TransportError> {
        self.record(Call::GetScanSummary);
        if !self.fetch_latency.is_zero() {
            tokio::time::sleep(self.fetch_latency).await;
        }
        self.summary.clone()
    }

    async fn get_sarif(
        &self,
        _organization_id: &str,
        _project_id: &str,
        _scan_id: &str,
    ) -> Result<Bytes, TransportError> {
        self.record(Call::GetSarif);
        if !self.fetch_latency.is_zero() {
            tokio::time::sleep(self.fetch_latency).await;
        }
        self.sarif.clone()
    }
}

pub const SAMPLE_SARIF: &[u8] =
    br#"{"version":"2.1.0","runs":[{"tool":{"driver":{"name":"vulnera"}},"results":[]}]}"#;

pub fn scan(status: ScanStatus) -> Scan {
    Scan::with_status(SCAN_ID, PROJECT_ID, ORG_ID, status, None).unwrap()
}

pub fn failed_scan(message: Option<&str>) -> Scan {
    Scan::with_status(
        SCAN_ID,
        PROJECT_ID,
        ORG_ID,
        ScanStatus::Failed,
        message.map(str::to_string),
    )
    .unwrap()
}

pub fn sample_summary() -> ScanSummary {
    ScanSummary {
        total_findings: 3,
        critical: 1,
        high: 2,
        ..Default::default()
    }
}

/// Let every runnable task make progress
pub async fn settle_tasks() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
