// Error handling types for the console

use serde::Deserialize;
use std::fmt;

use super::validation::ValidationResult;

/// Backend operations the console invokes. Each carries the message shown
/// when a failure arrives without a backend-provided explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListCandidates,
    LoadCandidate,
    RequestDocuments,
    SubmitDocument,
    UploadResume,
    FetchDocument,
}

impl Operation {
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Operation::ListCandidates => "Failed to load candidates",
            Operation::LoadCandidate => "Failed to load candidate",
            Operation::RequestDocuments => "Failed to request documents",
            Operation::SubmitDocument => "Failed to upload document",
            Operation::UploadResume => "Failed to upload resume",
            Operation::FetchDocument => "Failed to load document",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::ListCandidates => "list_candidates",
            Operation::LoadCandidate => "load_candidate",
            Operation::RequestDocuments => "request_documents",
            Operation::SubmitDocument => "submit_document",
            Operation::UploadResume => "upload_resume",
            Operation::FetchDocument => "fetch_document",
        };
        f.write_str(name)
    }
}

/// Console error taxonomy.
///
/// An empty listing is not represented here; it is a normal view state.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// Client-side precondition failure. Raised before any network call.
    #[error("Validation Error: {0}")]
    Validation(ValidationResult),

    /// Backend unreachable, timed out, answered non-2xx, or answered with a
    /// body that could not be decoded.
    #[error("{operation} failed{}: {}", status_suffix(.status), describe(.operation, .message))]
    Transport {
        operation: Operation,
        status: Option<u16>,
        message: Option<String>,
    },

    /// The requested candidate or document does not exist.
    #[error("Not Found: {}", describe(.operation, .message))]
    NotFound {
        operation: Operation,
        message: Option<String>,
    },
}

fn describe<'a>(operation: &Operation, message: &'a Option<String>) -> &'a str {
    message
        .as_deref()
        .unwrap_or_else(|| operation.fallback_message())
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" with status {}", code),
        None => String::new(),
    }
}

impl ConsoleError {
    pub fn transport(operation: Operation, message: impl Into<String>) -> Self {
        ConsoleError::Transport {
            operation,
            status: None,
            message: Some(message.into()),
        }
    }

    /// Message suitable for showing to the operator: the backend's own text
    /// when it sent one, otherwise the per-operation fallback.
    pub fn user_message(&self) -> String {
        match self {
            ConsoleError::Validation(result) => result.to_string(),
            ConsoleError::Transport {
                operation, message, ..
            }
            | ConsoleError::NotFound { operation, message } => message
                .clone()
                .unwrap_or_else(|| operation.fallback_message().to_string()),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ConsoleError::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ConsoleError::NotFound { .. })
    }
}

impl From<ValidationResult> for ConsoleError {
    fn from(result: ValidationResult) -> Self {
        ConsoleError::Validation(result)
    }
}

/// JSON error body returned by the backend. Either field may carry the
/// human-readable text.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorResponse {
    /// Parses an error body, returning the first non-blank message exactly
    /// as the backend wrote it.
    pub fn message_from_body(body: &[u8]) -> Option<String> {
        let parsed: ErrorResponse = serde_json::from_slice(body).ok()?;
        parsed
            .error
            .into_iter()
            .chain(parsed.message)
            .find(|m| !m.trim().is_empty())
    }
}
