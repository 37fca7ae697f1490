//! services/site/src/web/response.rs
//!
//! What a handler hands back, and how it becomes an HTTP response.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{SiteError, SiteResult};
use crate::web::cookies::SetCookie;
use crate::web::request::Locals;
use crate::web::state::AppState;

/// The four kinds of reply a handler can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    /// A named view rendered with `data` layered over the request's locals.
    Render { view: String, data: Value },
    Redirect(String),
    Json(Value),
    Text { content_type: String, body: String },
}

#[derive(Debug, Clone)]
pub struct Reply {
    status: StatusCode,
    body: ReplyBody,
    cookies: Vec<SetCookie>,
}

impl Reply {
    fn with_body(status: StatusCode, body: ReplyBody) -> Self {
        Self {
            status,
            body,
            cookies: Vec::new(),
        }
    }

    pub fn render(view: impl Into<String>, data: Value) -> Self {
        Self::with_body(
            StatusCode::OK,
            ReplyBody::Render {
                view: view.into(),
                data,
            },
        )
    }

    /// A `303 See Other` redirect.
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::with_body(StatusCode::SEE_OTHER, ReplyBody::Redirect(location.into()))
    }

    pub fn json(payload: impl Serialize) -> SiteResult<Self> {
        let value = serde_json::to_value(payload).map_err(|e| SiteError::Internal(e.to_string()))?;
        Ok(Self::with_body(StatusCode::OK, ReplyBody::Json(value)))
    }

    pub fn text(content_type: impl Into<String>, body: impl Into<String>) -> Self {
        Self::with_body(
            StatusCode::OK,
            ReplyBody::Text {
                content_type: content_type.into(),
                body: body.into(),
            },
        )
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_cookie(mut self, cookie: SetCookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &ReplyBody {
        &self.body
    }

    pub fn cookies(&self) -> &[SetCookie] {
        &self.cookies
    }

    /// Produces the final response. Views are rendered through the
    /// `ViewRenderer` port with the request's locals underneath `data`.
    pub async fn into_http(self, state: &AppState, locals: &Locals) -> SiteResult<Response> {
        let mut response = match self.body {
            ReplyBody::Render { view, data } => {
                let html = state.views.render(&view, &merge_render_data(locals, data)).await?;
                Html(html).into_response()
            }
            ReplyBody::Redirect(location) => {
                let mut response = Response::new(axum::body::Body::empty());
                let location = HeaderValue::from_str(&location)
                    .map_err(|e| SiteError::Internal(format!("bad redirect target: {}", e)))?;
                response.headers_mut().insert(header::LOCATION, location);
                response
            }
            ReplyBody::Json(value) => Json(value).into_response(),
            ReplyBody::Text { content_type, body } => {
                let content_type = HeaderValue::from_str(&content_type)
                    .map_err(|e| SiteError::Internal(format!("bad content type: {}", e)))?;
                ([(header::CONTENT_TYPE, content_type)], body).into_response()
            }
        };
        *response.status_mut() = self.status;

        for cookie in self.cookies {
            match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(e) => warn!(cookie = cookie.name(), error = %e, "dropping unencodable cookie"),
            }
        }
        Ok(response)
    }
}

/// Layers handler data over the per-request locals; handler keys win.
pub fn merge_render_data(locals: &Locals, data: Value) -> Value {
    let mut merged = match locals.to_value() {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    if let Value::Object(map) = data {
        merged.extend(map);
    }
    Value::Object(merged)
}
