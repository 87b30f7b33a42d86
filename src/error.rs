//! Error types and HTTP mapping for the AirWatch service
//!
//! [`AirWatchError`] unifies the service failure modes and converts them
//! into the client-facing JSON error shape via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. External
//! failures are always caught at the boundary and converted here; raw
//! provider errors never reach the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::geocode::{self, GeocodeError};
use crate::pollution::FetchError;

/// Main error type for the AirWatch service
#[derive(Error, Debug)]
pub enum AirWatchError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config {
        /// What is wrong with the configuration
        message: String,
    },

    /// Input validation errors (bad/missing input, low GPS accuracy,
    /// unparseable numbers)
    #[error("Invalid input: {message}")]
    Validation {
        /// User-correctable description
        message: String,
    },

    /// Geocoding found nothing for the query
    #[error("{message}")]
    Resolution {
        /// User-facing message
        message: String,
        /// Actionable hints shown alongside the message
        suggestions: Vec<String>,
        /// Machine-distinguishable reason for operators
        debug: String,
    },

    /// The pollution provider was unreachable or errored
    #[error("Failed to fetch data")]
    Fetch(#[from] FetchError),

    /// Record store failures
    #[error("Database error: {message}")]
    Database {
        /// Underlying storage error description
        message: String,
    },
}

impl AirWatchError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new database error
    pub fn database<S: Into<String>>(message: S) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Build a resolution error for a failed geocode of `query`.
    ///
    /// The message wording distinguishes the credential-missing case so the
    /// user knows local lookup was already attempted.
    #[must_use]
    pub fn resolution(query: &str, source: &GeocodeError) -> Self {
        let message = match source {
            GeocodeError::CredentialMissingNoLocalMatch => {
                format!("Location '{query}' not in local database and API Key is missing.")
            }
            _ => format!("Location '{query}' not recognized."),
        };

        Self::Resolution {
            message,
            suggestions: geocode::suggestions(),
            debug: source.to_string(),
        }
    }
}

impl IntoResponse for AirWatchError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Validation { message } => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "status": "error", "message": message }),
            ),
            Self::Resolution {
                message,
                suggestions,
                debug,
            } => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({
                    "status": "error",
                    "message": message,
                    "suggestions": suggestions,
                    "debug": debug,
                }),
            ),
            Self::Fetch(source) => {
                // Not user-correctable; keep the detail server-side
                error!(error = %source, "pollution fetch failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "status": "error", "message": "Failed to fetch data" }),
                )
            }
            Self::Database { message } => {
                error!(error = %message, "record store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "status": "error", "message": "Internal server error" }),
                )
            }
            Self::Config { message } => {
                error!(error = %message, "configuration error surfaced in request path");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "status": "error", "message": "Internal server error" }),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}
