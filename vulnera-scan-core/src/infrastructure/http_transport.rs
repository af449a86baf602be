//! HTTP implementation of the Scan Transport
//!
//! Talks to the analysis service REST API:
//!
//! | Operation | Method | Path (under `/api/v1/organizations/{org}/projects/{project}`) |
//! |-----------|--------|------------------------------------------------------------------|
//! | upload artifact | POST | `/code-artifacts` (multipart, field `file`) |
//! | start scan | POST | `/scans` |
//! | scan status | GET | `/scans/{id}` |
//! | summary | GET | `/scans/{id}/summary` |
//! | SARIF | GET | `/scans/{id}/sarif` |
//!
//! Requests are never retried here; the orchestration layer decides what a
//! failure means.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use url::Url;

use crate::config::ServiceConfig;
use crate::domain::{
    CodeArtifactId, Scan, ScanStatus, ScanSummary, ScanTransport, TransportError,
};

const USER_AGENT: &str = concat!("vulnera-scan/", env!("CARGO_PKG_VERSION"));

/// Scan Transport backed by the service's REST API
#[derive(Clone)]
pub struct HttpScanTransport {
    client: Client,
    base_url: Url,
    api_token: Option<String>,
}

impl HttpScanTransport {
    /// Create a transport with default timeout and no proxy
    pub fn new(base_url: &str, api_token: Option<String>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
            api_token,
        })
    }

    /// Create a transport from the service configuration section
    pub fn from_config(config: &ServiceConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(USER_AGENT);

        if let Some(proxy_url) = &config.proxy_url {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| TransportError::Configuration(format!("Invalid proxy: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url: parse_base_url(&config.base_url)?,
            api_token: config.api_token.clone(),
        })
    }

    /// Build the URL of a project scoped endpoint
    fn endpoint(
        &self,
        organization_id: &str,
        project_id: &str,
        tail: &[&str],
    ) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                TransportError::Configuration(format!("{} cannot be a base URL", self.base_url))
            })?;
            segments
                .pop_if_empty()
                .extend(["api", "v1", "organizations", organization_id])
                .extend(["projects", project_id])
                .extend(tail);
        }
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, TransportError> {
        let response = self.authorized(request).send().await?;
        check_status(response).await
    }

    async fn fetch_scan(&self, request: RequestBuilder) -> Result<Scan, TransportError> {
        let response = self.send(request).await?;
        let dto: ScanDto = response.json().await?;
        dto.into_scan()
    }
}

#[async_trait]
impl ScanTransport for HttpScanTransport {
    async fn create_code_artifact(
        &self,
        organization_id: &str,
        project_id: &str,
        path: &Path,
    ) -> Result<CodeArtifactId, TransportError> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| TransportError::Io(format!("{} is not a file", path.display())))?;

        // Read before sending anything so a missing artifact never reaches the service
        let contents = tokio::fs::read(path)
            .await
            .map_err(|e| TransportError::Io(format!("{}: {}", path.display(), e)))?;

        let url = self.endpoint(organization_id, project_id, &["code-artifacts"])?;
        debug!(url = %url, file_name = %file_name, bytes = contents.len(), "Uploading code artifact");

        let part = Part::bytes(contents)
            .file_name(file_name)
            .mime_str("application/octet-stream")
            .map_err(|e| TransportError::Configuration(e.to_string()))?;
        let form = Form::new().part("file", part);

        let response = self.send(self.client.post(url).multipart(form)).await?;
        let dto: CodeArtifactDto = response.json().await?;

        CodeArtifactId::new(dto.id)
            .map_err(|_| TransportError::InvalidResponse("empty code artifact id".to_string()))
    }

    async fn start_scan(
        &self,
        organization_id: &str,
        project_id: &str,
        artifact_id: &CodeArtifactId,
        label: &str,
    ) -> Result<Scan, TransportError> {
        let url = self.endpoint(organization_id, project_id, &["scans"])?;
        debug!(url = %url, artifact_id = %artifact_id, "Starting scan");

        let body = StartScanRequest {
            code_artifact_id: artifact_id.as_str(),
            label,
        };
        self.fetch_scan(self.client.post(url).json(&body)).await
    }

    async fn get_scan_by_id(
        &self,
        organization_id: &str,
        project_id: &str,
        scan_id: &str,
    ) -> Result<Scan, TransportError> {
        let url = self.endpoint(organization_id, project_id, &["scans", scan_id])?;
        debug!(url = %url, "Fetching scan status");
        self.fetch_scan(self.client.get(url)).await
    }

    async fn get_scan_summary(
        &self,
        organization_id: &str,
        project_id: &str,
        scan_id: &str,
    ) -> Result<ScanSummary, TransportError> {
        let url = self.endpoint(organization_id, project_id, &["scans", scan_id, "summary"])?;
        debug!(url = %url, "Fetching scan summary");
        let response = self.send(self.client.get(url)).await?;
        Ok(response.json().await?)
    }

    async fn get_sarif(
        &self,
        organization_id: &str,
        project_id: &str,
        scan_id: &str,
    ) -> Result<Bytes, TransportError> {
        let url = self.endpoint(organization_id, project_id, &["scans", scan_id, "sarif"])?;
        debug!(url = %url, "Fetching SARIF output");
        let response = self.send(self.client.get(url)).await?;
        Ok(response.bytes().await?)
    }
}

fn parse_base_url(base_url: &str) -> Result<Url, TransportError> {
    let url = Url::parse(base_url)
        .map_err(|e| TransportError::Configuration(format!("Invalid base URL: {}", e)))?;
    if url.cannot_be_a_base() {
        return Err(TransportError::Configuration(format!(
            "{} cannot be a base URL",
            base_url
        )));
    }
    Ok(url)
}

async fn check_status(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(TransportError::Unauthorized(format!("{}: {}", status, text)))
        }
        _ => {
            error!(status = %status, "Analysis service error: {}", text);
            Err(TransportError::api(status.as_u16(), text))
        }
    }
}

// === Service API Types ===

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartScanRequest<'a> {
    code_artifact_id: &'a str,
    label: &'a str,
}

#[derive(Debug, Deserialize)]
struct CodeArtifactDto {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScanDto {
    id: String,
    project_id: String,
    organization_id: String,
    status: ScanStatus,
    #[serde(default)]
    error_message: Option<String>,
}

impl ScanDto {
    fn into_scan(self) -> Result<Scan, TransportError> {
        Scan::with_status(
            self.id,
            self.project_id,
            self.organization_id,
            self.status,
            self.error_message,
        )
        .map_err(|e| TransportError::InvalidResponse(e.message()))
    }
}
