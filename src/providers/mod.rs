pub mod jira;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::issue::IssuePayload;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIssue {
    pub id: String,
    pub key: String,
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("credentials rejected (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("request rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

/// The operations an import needs from an issue tracker.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    fn name(&self) -> &str;
    /// Check the credentials before anything is created.
    async fn verify(&self) -> Result<(), TrackerError>;
    async fn create_issue(&self, payload: &IssuePayload) -> Result<CreatedIssue, TrackerError>;
}
