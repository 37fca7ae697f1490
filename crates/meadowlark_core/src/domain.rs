//! crates/meadowlark_core/src/domain.rs
//!
//! Defines the pure, core data structures for the site.
//! These structs are independent of the web framework and of any storage.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

//=========================================================================================
// Flash Messages
//=========================================================================================

/// The visual category of a flash message. Serialized in lowercase so views
/// can use it directly as a CSS modifier (`alert-danger`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Danger,
    Info,
    Warning,
}

/// A one-time notice carried across a redirect in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    #[serde(rename = "type")]
    pub kind: FlashKind,
    pub intro: String,
    pub message: String,
}

impl FlashMessage {
    pub fn new(kind: FlashKind, intro: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            intro: intro.into(),
            message: message.into(),
        }
    }
}

//=========================================================================================
// Sessions
//=========================================================================================

/// Server-side state for one visitor, keyed by the id in their session cookie.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionData {
    fields: HashMap<String, Value>,
    flash: Option<FlashMessage>,
    expires_at: Option<DateTime<Utc>>,
}

impl SessionData {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Stores `message` as the pending flash, replacing any unread one.
    pub fn set_flash(&mut self, message: FlashMessage) {
        self.flash = Some(message);
    }

    /// Returns the pending flash and clears it.
    pub fn take_flash(&mut self) -> Option<FlashMessage> {
        self.flash.take()
    }

    pub fn has_flash(&self) -> bool {
        self.flash.is_some()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn set_expires_at(&mut self, at: DateTime<Utc>) {
        self.expires_at = Some(at);
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

//=========================================================================================
// Newsletter
//=========================================================================================

/// A newsletter signup as submitted by a visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRecord {
    pub name: String,
    pub email: String,
}

//=========================================================================================
// Ambient Render Data
//=========================================================================================

/// Current conditions for one of the locations shown in the weather widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherLocation {
    pub name: String,
    pub forecast_url: String,
    pub icon_url: String,
    pub weather: String,
    pub temp: String,
}

/// The snapshot injected into every page as `partials.weatherContext`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherContext {
    pub locations: Vec<WeatherLocation>,
}

//=========================================================================================
// Uploads
//=========================================================================================

/// One file part taken from a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Where an uploaded file ended up and how it can be fetched back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUpload {
    pub name: String,
    pub size: usize,
    #[serde(skip)]
    pub path: String,
    pub url: String,
}
