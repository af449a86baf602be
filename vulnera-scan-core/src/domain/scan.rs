//! Scan snapshot value objects

use serde::{Deserialize, Serialize};

use super::error::ScanError;

/// Lifecycle state of a remote scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanStatus {
    /// Scan accepted by the service, not yet picked up
    Waiting,
    /// Scan is being executed remotely
    Running,
    /// Scan finished and results are available
    Completed,
    /// Scan finished with an error
    Failed,
    /// Scan was cancelled before it finished
    Cancelled,
}

impl ScanStatus {
    /// Returns the set of valid target states from the current state.
    ///
    /// ```text
    /// Waiting ──► Running ──► Completed
    ///   │  │         │  └──► Failed
    ///   │  └─────────┴─────► Cancelled
    ///   └──► Completed | Failed
    /// ```
    ///
    /// A scan may finish between two polls, so `Waiting` can be observed
    /// directly followed by a finished state.
    pub fn valid_transitions(&self) -> &[ScanStatus] {
        match self {
            Self::Waiting => &[
                Self::Running,
                Self::Completed,
                Self::Failed,
                Self::Cancelled,
            ],
            Self::Running => &[Self::Completed, Self::Failed, Self::Cancelled],
            Self::Completed | Self::Failed | Self::Cancelled => &[],
        }
    }

    /// Check whether transitioning to `target` is allowed from the current state.
    pub fn can_transition_to(&self, target: &ScanStatus) -> bool {
        self.valid_transitions().contains(target)
    }

    /// Whether this status represents a terminal (final) state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "WAITING"),
            Self::Running => write!(f, "RUNNING"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Error returned when an invalid status transition is attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid scan transition from {from} to {to}")]
pub struct ScanTransitionError {
    pub from: ScanStatus,
    pub to: ScanStatus,
}

/// Identifier of an uploaded code artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeArtifactId(String);

impl CodeArtifactId {
    pub fn new(id: impl Into<String>) -> Result<Self, ScanError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ScanError::precondition("code artifact id must not be empty"));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CodeArtifactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Point-in-time snapshot of a remote scan.
///
/// Snapshots are never mutated. Progress is represented by producing a new
/// value, which keeps every snapshot safe to hand across tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scan {
    id: String,
    project_id: String,
    organization_id: String,
    status: ScanStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
}

impl Scan {
    /// Create a snapshot in the `Waiting` state.
    pub fn new(
        id: impl Into<String>,
        project_id: impl Into<String>,
        organization_id: impl Into<String>,
    ) -> Result<Self, ScanError> {
        Self::with_status(id, project_id, organization_id, ScanStatus::Waiting, None)
    }

    /// Create a snapshot with an explicit status, as reported by the service.
    pub fn with_status(
        id: impl Into<String>,
        project_id: impl Into<String>,
        organization_id: impl Into<String>,
        status: ScanStatus,
        error_message: Option<String>,
    ) -> Result<Self, ScanError> {
        let id = require_non_empty("scan id", id.into())?;
        let project_id = require_non_empty("project id", project_id.into())?;
        let organization_id = require_non_empty("organization id", organization_id.into())?;

        // Only failures carry a message; cancellations may carry a reason
        let error_message = match status {
            ScanStatus::Failed | ScanStatus::Cancelled => error_message,
            _ => None,
        };

        Ok(Self {
            id,
            project_id,
            organization_id,
            status,
            error_message,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    pub fn status(&self) -> ScanStatus {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn to_running(&self) -> Result<Scan, ScanTransitionError> {
        self.transition(ScanStatus::Running, None)
    }

    pub fn to_completed(&self) -> Result<Scan, ScanTransitionError> {
        self.transition(ScanStatus::Completed, None)
    }

    pub fn to_failed(&self, message: impl Into<String>) -> Result<Scan, ScanTransitionError> {
        self.transition(ScanStatus::Failed, Some(message.into()))
    }

    pub fn to_cancelled(&self) -> Result<Scan, ScanTransitionError> {
        self.transition(ScanStatus::Cancelled, None)
    }

    fn transition(
        &self,
        to: ScanStatus,
        error_message: Option<String>,
    ) -> Result<Scan, ScanTransitionError> {
        if !self.status.can_transition_to(&to) {
            return Err(ScanTransitionError {
                from: self.status,
                to,
            });
        }

        Ok(Scan {
            id: self.id.clone(),
            project_id: self.project_id.clone(),
            organization_id: self.organization_id.clone(),
            status: to,
            error_message,
        })
    }
}

fn require_non_empty(field: &str, value: String) -> Result<String, ScanError> {
    if value.trim().is_empty() {
        return Err(ScanError::precondition(format!("{} must not be empty", field)));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waiting() -> Scan {
        Scan::new("scan-id", "project-id", "org-id").unwrap()
    }

    #[test]
    fn test_new_scan_is_waiting() {
        let scan = waiting();
        assert_eq!(scan.status(), ScanStatus::Waiting);
        assert!(!scan.is_terminal());
        assert_eq!(scan.error_message(), None);
    }

    #[test]
    fn test_empty_identifiers_rejected() {
        assert!(Scan::new("", "project-id", "org-id").is_err());
        assert!(Scan::new("scan-id", " ", "org-id").is_err());
        let err = Scan::new("scan-id", "project-id", "").unwrap_err();
        assert!(matches!(err, ScanError::Precondition(_)));
    }

    #[test]
    fn test_transitions_produce_new_values() {
        let scan = waiting();
        let running = scan.to_running().unwrap();
        let completed = running.to_completed().unwrap();

        assert_eq!(scan.status(), ScanStatus::Waiting);
        assert_eq!(running.status(), ScanStatus::Running);
        assert_eq!(completed.status(), ScanStatus::Completed);
        assert_eq!(completed.id(), "scan-id");
        assert!(completed.is_terminal());
    }

    #[test]
    fn test_failed_carries_message() {
        let failed = waiting().to_running().unwrap().to_failed("boom").unwrap();
        assert_eq!(failed.status(), ScanStatus::Failed);
        assert_eq!(failed.error_message(), Some("boom"));
    }

    #[test]
    fn test_no_transition_out_of_terminal_state() {
        let completed = waiting().to_completed().unwrap();
        let err = completed.to_running().unwrap_err();
        assert_eq!(err.from, ScanStatus::Completed);
        assert_eq!(err.to, ScanStatus::Running);

        let cancelled = waiting().to_cancelled().unwrap();
        assert!(cancelled.to_failed("late").is_err());
    }

    #[test]
    fn test_non_failure_status_drops_error_message() {
        let scan = Scan::with_status(
            "scan-id",
            "project-id",
            "org-id",
            ScanStatus::Running,
            Some("stale".to_string()),
        )
        .unwrap();
        assert_eq!(scan.error_message(), None);
    }

    #[test]
    fn test_status_serializes_upper_case() {
        let json = serde_json::to_string(&ScanStatus::Cancelled).unwrap();
        assert_eq!(json, "\"CANCELLED\"");
        let status: ScanStatus = serde_json::from_str("\"RUNNING\"").unwrap();
        assert_eq!(status, ScanStatus::Running);
    }
}
