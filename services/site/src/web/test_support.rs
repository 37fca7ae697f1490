//! Fakes and request builders shared by the unit tests of the `web` module.

use async_trait::async_trait;
use axum::http::{Method, Request};
use bytes::Bytes;
use meadowlark_core::domain::{SignupRecord, StoredUpload, UploadedFile, WeatherContext};
use meadowlark_core::ports::{
    FortuneService, NewsletterService, PortResult, UploadService, ViewRenderer, WeatherService,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};

use crate::adapters::MemorySessionStore;
use crate::config::{Config, Environment};
use crate::web::cookies::CookieSigner;
use crate::web::request::SiteRequest;
use crate::web::state::AppState;

pub const BOUNDARY: &str = "meadowlark-boundary";

/// Renders `view|<data as JSON>` so tests can inspect what a page received.
pub struct EchoRenderer;

#[async_trait]
impl ViewRenderer for EchoRenderer {
    async fn render(&self, view: &str, data: &Value) -> PortResult<String> {
        Ok(format!("{}|{}", view, data))
    }
}

#[derive(Default)]
pub struct RecordingNewsletter {
    pub saved: Mutex<Vec<SignupRecord>>,
}

#[async_trait]
impl NewsletterService for RecordingNewsletter {
    async fn save(&self, record: &SignupRecord) -> PortResult<()> {
        self.saved.lock().unwrap().push(record.clone());
        Ok(())
    }
}

pub struct MemoryUploads;

#[async_trait]
impl UploadService for MemoryUploads {
    async fn store(&self, namespace: &str, files: Vec<UploadedFile>) -> PortResult<Vec<StoredUpload>> {
        Ok(files
            .into_iter()
            .map(|f| StoredUpload {
                url: format!("/uploads/{}/{}", namespace, f.file_name),
                path: format!("uploads/{}/{}", namespace, f.file_name),
                size: f.bytes.len(),
                name: f.file_name,
            })
            .collect())
    }
}

pub struct NoWeather;

impl WeatherService for NoWeather {
    fn weather_data(&self) -> WeatherContext {
        WeatherContext::default()
    }
}

pub struct FixedFortune;

impl FortuneService for FixedFortune {
    fn fortune(&self) -> String {
        "Rivers need springs.".to_string()
    }
}

pub fn state_for(environment: Environment) -> Arc<AppState> {
    let config = Arc::new(Config::for_environment(environment));
    Arc::new(AppState {
        signer: CookieSigner::new(&config.cookie_secret),
        sessions: Arc::new(MemorySessionStore::new(config.session_ttl)),
        newsletter: Arc::new(RecordingNewsletter::default()),
        uploads: Arc::new(MemoryUploads),
        views: Arc::new(EchoRenderer),
        weather: Arc::new(NoWeather),
        fortune: Arc::new(FixedFortune),
        config,
    })
}

pub fn test_state() -> Arc<AppState> {
    state_for(Environment::Test)
}

pub fn request_with(method: Method, uri: &str, headers: &[(&str, &str)], body: String) -> SiteRequest {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let (parts, ()) = builder.body(()).unwrap().into_parts();
    SiteRequest::new(parts, Bytes::from(body))
}

pub fn request(method: Method, uri: &str) -> SiteRequest {
    request_with(method, uri, &[], String::new())
}

/// Builds a `multipart/form-data` body from `(field, file name, content)` parts.
pub fn multipart_body(parts: &[(&str, Option<&str>, &str)]) -> String {
    let mut body = String::new();
    for (field, file_name, content) in parts {
        body.push_str(&format!("--{}\r\n", BOUNDARY));
        match file_name {
            Some(file_name) => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                field, file_name
            )),
            None => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                field
            )),
        }
        body.push_str(content);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{}--\r\n", BOUNDARY));
    body
}
