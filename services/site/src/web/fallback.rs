//! services/site/src/web/fallback.rs
//!
//! The not-found and server-error pages.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::web::response::Reply;

pub fn not_found() -> Reply {
    Reply::render("404", json!({})).with_status(StatusCode::NOT_FOUND)
}

/// The generic error page. Carries no detail about the fault.
pub fn server_error() -> Reply {
    Reply::render("500", json!({})).with_status(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Last resort when even the error view cannot be rendered.
pub fn plain_server_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "500 - Server Error").into_response()
}
