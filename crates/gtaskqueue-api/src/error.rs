//! Error types for API client operations.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Result alias for API client operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Primary error type for API client operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("request to {path} failed: {source}")]
    Transport {
        /// Resource path being requested.
        path: String,
        /// Underlying transport error.
        source: reqwest::Error,
    },
    /// The service answered with a non-success status.
    #[error("{message} (status {status})")]
    Status {
        /// HTTP status returned by the service.
        status: StatusCode,
        /// Message extracted from the error body.
        message: String,
    },
    /// The response body did not match the expected shape.
    #[error("failed to decode response from {path}: {reason}")]
    Decode {
        /// Resource path being requested.
        path: String,
        /// Decoder message.
        reason: String,
    },
    /// A request URL could not be assembled.
    #[error("invalid request URL: {reason}")]
    InvalidUrl {
        /// Why the URL was rejected.
        reason: String,
    },
    /// The developer key file does not exist.
    #[error(
        "Please generate a developer key from the Google API Console and store it in {}",
        .path.display()
    )]
    DeveloperKeyMissing {
        /// Expected location of the key.
        path: PathBuf,
    },
    /// The developer key file exists but could not be used.
    #[error("error loading developer key from file {}: {source}", .path.display())]
    DeveloperKeyRead {
        /// Location of the key.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The service-account key file could not be read.
    #[error("failed to read service account file {}: {source}", .path.display())]
    CredentialsRead {
        /// Location of the key file.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The service-account key file is not a usable key.
    #[error("invalid service account file {}: {reason}", .path.display())]
    CredentialsInvalid {
        /// Location of the key file.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },
    /// Signing the token assertion failed.
    #[error("failed to sign token assertion: {source}")]
    Signing {
        /// Underlying JWT error.
        source: jsonwebtoken::errors::Error,
    },
    /// The token endpoint rejected the exchange.
    #[error("token exchange failed: {message}")]
    TokenExchange {
        /// Message from the token endpoint or transport.
        message: String,
    },
}

impl ApiError {
    /// HTTP status for errors that carry one.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
