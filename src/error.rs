use std::path::PathBuf;
use std::process::ExitCode;

use thiserror::Error;

/// Errors that end an import run. Each maps to a distinct process exit code.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cannot read {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid CSV: {message}", path.display())]
    Format { path: PathBuf, message: String },

    #[error("input aborted: {0}")]
    Input(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("issue tracker unavailable: {0}")]
    Tracker(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("cannot write output: {0}")]
    Output(#[from] std::io::Error),
}

impl ImportError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ImportError::Config(_) | ImportError::Tracker(_) | ImportError::Output(_) => {
                ExitCode::from(1)
            }
            ImportError::File { .. } | ImportError::Format { .. } => ExitCode::from(3),
            ImportError::Input(_) => ExitCode::from(4),
            ImportError::Authentication(_) => ExitCode::from(5),
        }
    }
}

/// How a run finished when no fatal error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    DryRun,
    Cancelled,
    CompletedWithFailures,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Completed | Outcome::DryRun => ExitCode::SUCCESS,
            Outcome::Cancelled => ExitCode::from(2),
            Outcome::CompletedWithFailures => ExitCode::from(6),
        }
    }
}
