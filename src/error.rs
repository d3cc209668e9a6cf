//! Error types for the estimation pipeline.

use std::time::Duration;

/// Errors that reach the caller of the orchestrator.
///
/// Anything that goes wrong inside a tier is absorbed there and turns into a
/// lower-fidelity estimate, so only input and resolution problems surface.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EstimateError {
    /// Malformed identifier, coordinate or attribute input.
    #[error("Invalid request: {reason}")]
    Validation { reason: String },

    /// The building could not be located, so no tier can run.
    #[error("No data available for building {building_id}: {reason}")]
    Resolution { building_id: String, reason: String },

    /// The last-resort tier failed to produce a value.
    #[error("Estimation failed: {reason}")]
    Internal { reason: String },
}

impl EstimateError {
    pub fn validation(reason: impl Into<String>) -> Self {
        EstimateError::Validation {
            reason: reason.into(),
        }
    }

    pub fn resolution(building_id: impl Into<String>, reason: impl Into<String>) -> Self {
        EstimateError::Resolution {
            building_id: building_id.into(),
            reason: reason.into(),
        }
    }
}

/// Failure of a single external collaborator call. Always local to one tier.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExternalServiceError {
    #[error("{service} timed out after {timeout:?}")]
    Timeout {
        service: &'static str,
        timeout: Duration,
    },

    #[error("{service} returned HTTP {status}")]
    Status { service: &'static str, status: u16 },

    #[error("{service} returned a malformed payload: {reason}")]
    Malformed {
        service: &'static str,
        reason: String,
    },

    #[error("{service} request failed: {reason}")]
    Transport {
        service: &'static str,
        reason: String,
    },

    /// The collaborator answered, but has no record for the location.
    #[error("{service} has no record for this location")]
    NotFound { service: &'static str },
}

impl ExternalServiceError {
    pub fn malformed(service: &'static str, reason: impl Into<String>) -> Self {
        ExternalServiceError::Malformed {
            service,
            reason: reason.into(),
        }
    }

    /// Map a reqwest failure for the named service.
    pub fn from_reqwest(service: &'static str, e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            ExternalServiceError::Status {
                service,
                status: status.as_u16(),
            }
        } else if e.is_decode() {
            ExternalServiceError::malformed(service, e.to_string())
        } else {
            ExternalServiceError::Transport {
                service,
                reason: e.to_string(),
            }
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown coefficient set '{0}'")]
    UnknownCoefficients(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, EstimateError>;
