use std::io::Write;

use crate::config::FailurePolicy;
use crate::error::ImportError;
use crate::model::issue::IssuePayload;
use crate::model::table::Table;
use crate::providers::{IssueTracker, TrackerError};

#[derive(Debug)]
pub struct FailedRow {
    pub row: usize,
    pub error: TrackerError,
}

/// What happened to every row of a submission pass. Row numbers are 1-based data rows.
#[derive(Debug, Default)]
pub struct SubmissionReport {
    /// Keys of the created issues, in row order.
    pub created: Vec<String>,
    pub failed: Vec<FailedRow>,
    pub skipped: usize,
}

impl SubmissionReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty() || self.skipped > 0
    }

    /// The error that stopped the run because the tracker refused the credentials mid-way.
    pub fn credentials_rejected(&self) -> Option<&TrackerError> {
        self.failed
            .iter()
            .map(|f| &f.error)
            .find(|e| matches!(e, TrackerError::Unauthorized { .. }))
    }

    pub fn summary(&self) -> String {
        let mut line = format!(
            "Created {} issue(s), {} failed",
            self.created.len(),
            self.failed.len()
        );
        if !self.failed.is_empty() {
            let rows: Vec<String> = self.failed.iter().map(|f| f.row.to_string()).collect();
            line.push_str(&format!(" (rows {})", rows.join(", ")));
        }
        if self.skipped > 0 {
            line.push_str(&format!(", {} skipped", self.skipped));
        }
        line
    }
}

/// Check the credentials once, then create one issue per row in table order.
///
/// A rejected row is reported and handled per `policy`. Rejected credentials are fatal: before
/// the first row nothing is created, and mid-run the remaining rows are left untouched.
pub async fn submit_tickets<W: Write>(
    table: &Table,
    tracker: &dyn IssueTracker,
    issue_type_id: &str,
    policy: FailurePolicy,
    out: &mut W,
) -> Result<SubmissionReport, ImportError> {
    tracing::info!(tracker = tracker.name(), "verifying credentials");
    tracker.verify().await.map_err(|e| match e {
        TrackerError::Unauthorized { .. } => ImportError::Authentication(e.to_string()),
        other => ImportError::Tracker(other.to_string()),
    })?;

    let mut report = SubmissionReport::default();
    let total = table.len();

    for (idx, row) in table.rows().iter().enumerate() {
        let row_number = idx + 1;
        let payload = IssuePayload::from_row(row, issue_type_id);

        match tracker.create_issue(&payload).await {
            Ok(issue) => {
                tracing::info!(
                    row = row_number,
                    key = %issue.key,
                    id = %issue.id,
                    "created issue"
                );
                writeln!(out, "Created issue {}", issue.key)?;
                report.created.push(issue.key);
            }
            Err(error) => {
                tracing::warn!(row = row_number, %error, "failed to create issue");
                writeln!(out, "Failed to create issue for row {row_number}: {error}")?;

                let unauthorized = matches!(error, TrackerError::Unauthorized { .. });
                report.failed.push(FailedRow {
                    row: row_number,
                    error,
                });

                if unauthorized || policy == FailurePolicy::Halt {
                    report.skipped = total - row_number;
                    tracing::warn!(skipped = report.skipped, "stopping submission");
                    break;
                }
            }
        }
    }

    writeln!(out, "{}", report.summary())?;
    Ok(report)
}
