use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MigrateError>;

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("config error in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("unmapped usernames referenced by the export: {}", .usernames.join(", "))]
    Validation { usernames: Vec<String> },

    #[error("issue {issue}: malformed note {chunk:?}")]
    MalformedNotes { issue: u64, chunk: String },

    #[error("project {0} not found on the GitLab instance")]
    ProjectNotFound(String),

    #[error("{action}: {source}")]
    Remote {
        action: String,
        #[source]
        source: GatewayError,
    },
}

impl MigrateError {
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn remote(action: impl Into<String>, source: GatewayError) -> Self {
        Self::Remote {
            action: action.into(),
            source,
        }
    }
}

/// Failure talking to the GitLab API.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{method} {path} returned {status}: {body}")]
    Status {
        method: String,
        path: String,
        status: u16,
        body: String,
    },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl GatewayError {
    /// The operator's token lacks permission for the request.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Status { status: 403, .. })
    }
}
