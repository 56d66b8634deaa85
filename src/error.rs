// Error types for failmap.
// Covers configuration, GitHub API, cache, and log parsing failures.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FailmapError {
    #[error("Missing required configuration: {}", .0.join(", "))]
    MissingConfig(Vec<&'static str>),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("GitHub API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Authentication failed: invalid or expired token")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: String },

    #[error("HTTP {status} from {url}: {body}")]
    Http {
        status: StatusCode,
        url: String,
        body: String,
    },

    #[error("Unexpected response from {url}: HTTP {status}")]
    UnexpectedResponse { status: StatusCode, url: String },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cache IO error at {}: {source}", path.display())]
    CacheIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed log line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FailmapError {
    /// Attach a cache path to an IO error.
    pub fn cache_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FailmapError::CacheIo {
            path: path.into(),
            source,
        }
    }

    /// Whether this error came from the GitHub API itself.
    pub fn is_http(&self) -> bool {
        matches!(
            self,
            FailmapError::Api(_)
                | FailmapError::Unauthorized
                | FailmapError::NotFound(_)
                | FailmapError::RateLimited { .. }
                | FailmapError::Http { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FailmapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_lists_names() {
        let err = FailmapError::MissingConfig(vec!["owner", "token"]);
        assert_eq!(
            err.to_string(),
            "Missing required configuration: owner, token"
        );
    }

    #[test]
    fn test_http_classification() {
        assert!(FailmapError::Unauthorized.is_http());
        assert!(FailmapError::NotFound("x".into()).is_http());
        assert!(
            !FailmapError::UnexpectedResponse {
                status: StatusCode::OK,
                url: "x".into()
            }
            .is_http()
        );
        assert!(!FailmapError::MissingConfig(vec!["repo"]).is_http());
    }
}
