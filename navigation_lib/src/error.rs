use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One failed validation rule, addressed by the path of the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub path: Vec<String>,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: &[&str], message: impl Into<String>) -> Self {
        Self {
            path: path.iter().map(|segment| segment.to_string()).collect(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NavError {
    /// Malformed or missing request fields. Always raised before any external call.
    #[error("{message}")]
    InvalidInput {
        message: String,
        issues: Vec<ValidationIssue>,
    },
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    NoRoute(String),
    /// Bad or missing provider credentials. The message names the misconfiguration.
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Unavailable(String),
    #[error("{0}")]
    Unexpected(String),
}

impl NavError {
    /// Single-issue validation error.
    pub fn invalid_input(path: &[&str], message: impl Into<String>) -> Self {
        let issue = ValidationIssue::new(path, message);
        NavError::InvalidInput {
            message: issue.message.clone(),
            issues: vec![issue],
        }
    }

    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let message = issues
            .iter()
            .map(|issue| issue.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");

        NavError::InvalidInput { message, issues }
    }

    /// Stable identifier carried in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            NavError::InvalidInput { .. } => "InvalidInput",
            NavError::NotFound(_) => "NotFound",
            NavError::NoRoute(_) => "NoRoute",
            NavError::Unauthorized(_) => "Unauthorized",
            NavError::Unavailable(_) => "Unavailable",
            NavError::Unexpected(_) => "Unexpected",
        }
    }

    /// Rebuilds an error from a code and message received over the wire.
    /// Unknown codes collapse into `Unexpected`.
    pub fn from_code(code: &str, message: String, issues: Vec<ValidationIssue>) -> Self {
        match code {
            "InvalidInput" => NavError::InvalidInput { message, issues },
            "NotFound" => NavError::NotFound(message),
            "NoRoute" => NavError::NoRoute(message),
            "Unauthorized" => NavError::Unauthorized(message),
            "Unavailable" => NavError::Unavailable(message),
            _ => NavError::Unexpected(message),
        }
    }
}
