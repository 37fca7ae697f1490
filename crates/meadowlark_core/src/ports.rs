//! crates/meadowlark_core/src/ports.rs
//!
//! Defines the service contracts (traits) the site depends on.
//! These traits form the boundary of the hexagonal architecture, so the web
//! layer never knows whether sessions live in memory, which template engine
//! renders a page or where uploads are written.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{SessionData, SignupRecord, StoredUpload, UploadedFile, WeatherContext};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., disk, templates).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Server-side session persistence.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the session stored under `id`, or `None` if it is unknown or expired.
    async fn get(&self, id: &str) -> PortResult<Option<SessionData>>;

    async fn put(&self, id: &str, session: SessionData) -> PortResult<()>;

    async fn delete(&self, id: &str) -> PortResult<()>;
}

#[async_trait]
pub trait NewsletterService: Send + Sync {
    /// Persists a validated signup.
    async fn save(&self, record: &SignupRecord) -> PortResult<()>;
}

#[async_trait]
pub trait UploadService: Send + Sync {
    /// Stores `files` under `namespace` and reports where each one landed.
    async fn store(&self, namespace: &str, files: Vec<UploadedFile>)
        -> PortResult<Vec<StoredUpload>>;
}

#[async_trait]
pub trait ViewRenderer: Send + Sync {
    /// Renders the named view with `data` into a complete HTML document.
    async fn render(&self, view: &str, data: &Value) -> PortResult<String>;
}

pub trait WeatherService: Send + Sync {
    /// Returns the current weather snapshot. Called once per request.
    fn weather_data(&self) -> WeatherContext;
}

pub trait FortuneService: Send + Sync {
    fn fortune(&self) -> String;
}
