//! services/site/src/error.rs
//!
//! Defines the primary error type for the entire site service.

use crate::config::ConfigError;
use meadowlark_core::ports::PortError;

/// The primary error type for the `site` service.
///
/// Any of these reaching the request boundary becomes the generic 500 page;
/// the message is logged, never sent to the client.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// The request body could not be read.
    #[error("Request body error: {0}")]
    Body(#[from] axum::Error),

    /// A multipart upload could not be parsed.
    #[error("Upload error: {0}")]
    Upload(String),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// A convenience type alias for `Result<T, SiteError>`.
pub type SiteResult<T> = Result<T, SiteError>;
