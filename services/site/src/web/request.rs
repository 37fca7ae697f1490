//! services/site/src/web/request.rs
//!
//! The request type seen by the enrichment chain and by route handlers.

use axum::http::{request::Parts, Extensions, HeaderMap, Method};
use bytes::Bytes;
use meadowlark_core::domain::{FlashMessage, WeatherContext};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::web::cookies::{parse_cookies, CookieSigner};
use crate::web::negotiation::is_machine_readable;
use crate::web::session::SessionHandle;

//=========================================================================================
// Render Context
//=========================================================================================

/// Per-request values every view can rely on, filled in by the enrichment chain.
#[derive(Debug, Clone, Default)]
pub struct Locals {
    pub show_tests: bool,
    pub flash: Option<FlashMessage>,
    pub weather: Option<WeatherContext>,
}

impl Locals {
    /// The base render data that handler data is layered on top of.
    pub fn to_value(&self) -> Value {
        json!({
            "showTests": self.show_tests,
            "flash": self.flash,
            "partials": { "weatherContext": self.weather },
        })
    }
}

//=========================================================================================
// SiteRequest
//=========================================================================================

/// An incoming request with its body already read.
pub struct SiteRequest {
    method: Method,
    path: String,
    query: HashMap<String, String>,
    headers: HeaderMap,
    extensions: Extensions,
    cookies: HashMap<String, String>,
    form: HashMap<String, String>,
    body: Bytes,
    params: HashMap<String, String>,
    session: SessionHandle,
    locals: Locals,
}

fn decode_pairs(input: &[u8]) -> HashMap<String, String> {
    let mut pairs = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(input) {
        pairs.entry(key.into_owned()).or_insert_with(|| value.into_owned());
    }
    pairs
}

impl SiteRequest {
    pub fn new(parts: Parts, body: Bytes) -> Self {
        let query = parts
            .uri
            .query()
            .map(|q| decode_pairs(q.as_bytes()))
            .unwrap_or_default();
        let cookies = parse_cookies(&parts.headers);
        Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query,
            headers: parts.headers,
            extensions: parts.extensions,
            cookies,
            form: HashMap::new(),
            body,
            params: HashMap::new(),
            session: SessionHandle::fresh(),
            locals: Locals::default(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Extensions set on the request by outer layers, such as the body limit.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// The verified value of a signed cookie, if present and untampered.
    pub fn signed_cookie(&self, signer: &CookieSigner, name: &str) -> Option<String> {
        self.cookie(name).and_then(|raw| signer.unsign(raw))
    }

    /// A field from a form-encoded body.
    pub fn form(&self, key: &str) -> Option<&str> {
        self.form.get(key).map(String::as_str)
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// A named path parameter. For `/contest/:year`, `param("year")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn locals(&self) -> &Locals {
        &self.locals
    }

    pub fn is_machine_readable(&self) -> bool {
        is_machine_readable(&self.headers)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub(crate) fn parse_form_body(&mut self) {
        self.form = decode_pairs(&self.body);
    }

    pub(crate) fn set_session(&mut self, session: SessionHandle) {
        self.session = session;
    }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }

    pub(crate) fn locals_mut(&mut self) -> &mut Locals {
        &mut self.locals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn request(uri: &str, headers: &[(&str, &str)], body: &'static str) -> SiteRequest {
        let mut builder = Request::builder().method(Method::POST).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        SiteRequest::new(parts, Bytes::from_static(body.as_bytes()))
    }

    #[test]
    fn decodes_query_and_form() {
        let mut req = request(
            "/newsletter?test=1&style=bold%20blue",
            &[("content-type", "application/x-www-form-urlencoded")],
            "name=Ada+Lovelace&email=ada%40example.com",
        );
        req.parse_form_body();

        assert_eq!(req.path(), "/newsletter");
        assert_eq!(req.query("test"), Some("1"));
        assert_eq!(req.query("style"), Some("bold blue"));
        assert_eq!(req.form("name"), Some("Ada Lovelace"));
        assert_eq!(req.form("email"), Some("ada@example.com"));
    }

    #[test]
    fn headers_and_cookies_are_case_insensitive_and_parsed() {
        let req = request("/", &[("X-Custom", "yes"), ("Cookie", "userid=42")], "");
        assert_eq!(req.header("x-custom"), Some("yes"));
        assert_eq!(req.cookie("userid"), Some("42"));
    }

    #[test]
    fn signed_cookies_require_a_valid_signature() {
        let signer = CookieSigner::new("secret");
        let cookie = format!("monster={}; forged=s:nom.bad", signer.sign("nom"));
        let mut builder = Request::builder().uri("/");
        builder = builder.header("cookie", cookie);
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        let req = SiteRequest::new(parts, Bytes::new());

        assert_eq!(req.signed_cookie(&signer, "monster").as_deref(), Some("nom"));
        assert_eq!(req.signed_cookie(&signer, "forged"), None);
    }

    #[test]
    fn locals_expose_weather_as_a_partial() {
        let locals = Locals {
            show_tests: true,
            flash: None,
            weather: Some(WeatherContext::default()),
        };
        let value = locals.to_value();
        assert_eq!(value["showTests"], true);
        assert!(value["flash"].is_null());
        assert!(value["partials"]["weatherContext"]["locations"].is_array());
    }
}
