//! services/site/src/web/uploads.rs
//!
//! Multipart form parsing and the upload intercept that owns every request
//! below the configured upload prefix.

use axum::body::Body;
use axum::extract::{FromRequest, Multipart};
use axum::http::{header, Request};
use chrono::Utc;
use meadowlark_core::domain::{StoredUpload, UploadedFile};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;
use utoipa::ToSchema;

use crate::error::{SiteError, SiteResult};
use crate::web::request::SiteRequest;
use crate::web::response::Reply;
use crate::web::state::AppState;

//=========================================================================================
// Multipart Parsing
//=========================================================================================

/// The text fields and file parts of a `multipart/form-data` body.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: Vec<UploadedFile>,
}

pub fn is_multipart(req: &SiteRequest) -> bool {
    req.content_type()
        .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
}

/// Parses the request body as `multipart/form-data`. Parts with a file name
/// become files; everything else is a text field.
///
/// The original request's extensions travel along, so the body limit set on
/// the app applies here instead of axum's built-in default.
pub async fn read_multipart(req: &SiteRequest) -> SiteResult<MultipartForm> {
    let content_type = req
        .content_type()
        .ok_or_else(|| SiteError::Upload("missing content type".to_string()))?;
    let mut request = Request::builder()
        .method(req.method().clone())
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(req.body().clone()))
        .map_err(|e| SiteError::Internal(e.to_string()))?;
    *request.extensions_mut() = req.extensions().clone();

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| SiteError::Upload(e.to_string()))?;

    let mut form = MultipartForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| SiteError::Upload(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) if !file_name.is_empty() => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| SiteError::Upload(e.to_string()))?;
                form.files.push(UploadedFile {
                    field: name,
                    file_name,
                    content_type,
                    bytes,
                });
            }
            _ => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| SiteError::Upload(e.to_string()))?;
                form.fields.entry(name).or_insert(text);
            }
        }
    }
    Ok(form)
}

//=========================================================================================
// Upload Intercept
//=========================================================================================

/// One stored file as reported back to the uploader.
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadedFileSummary {
    pub name: String,
    pub size: usize,
    pub url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub files: Vec<UploadedFileSummary>,
}

impl From<StoredUpload> for UploadedFileSummary {
    fn from(stored: StoredUpload) -> Self {
        Self {
            name: stored.name,
            size: stored.size,
            url: stored.url,
        }
    }
}

/// True when `path` is `prefix` itself or lies below it.
pub fn is_under_prefix(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Stores every file in the request under a namespace named after the
/// current time in milliseconds.
pub async fn intercept(state: &AppState, req: &SiteRequest) -> SiteResult<Reply> {
    let namespace = Utc::now().timestamp_millis().to_string();
    let files = if is_multipart(req) {
        read_multipart(req).await?.files
    } else {
        Vec::new()
    };

    let stored = state.uploads.store(&namespace, files).await?;
    info!(namespace = %namespace, count = stored.len(), path = %req.path(), "upload intercepted");

    Reply::json(UploadResponse {
        files: stored.into_iter().map(UploadedFileSummary::from).collect(),
    })
}
