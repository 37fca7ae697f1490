//! services/site/src/web/router.rs
//!
//! The route table: `(method, pattern) -> handler`, scanned in registration
//! order. Patterns are `/`-separated; a segment starting with `:` binds any
//! non-empty path segment to a named parameter.

use axum::http::Method;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use crate::error::SiteResult;
use crate::web::fallback;
use crate::web::request::SiteRequest;
use crate::web::response::Reply;
use crate::web::state::AppState;

//=========================================================================================
// Handlers
//=========================================================================================

pub type HandlerFuture = BoxFuture<'static, SiteResult<Reply>>;

/// Anything that can answer a routed request. Implemented for every
/// `async fn(Arc<AppState>, SiteRequest) -> SiteResult<Reply>`.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, state: Arc<AppState>, req: SiteRequest) -> HandlerFuture;
}

impl<F, Fut> Handler for F
where
    F: Fn(Arc<AppState>, SiteRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = SiteResult<Reply>> + Send + 'static,
{
    fn call(&self, state: Arc<AppState>, req: SiteRequest) -> HandlerFuture {
        Box::pin((self)(state, req))
    }
}

//=========================================================================================
// Patterns
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled path pattern such as `/contest/vacation-photo/:year/:month`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    segments: Vec<Segment>,
}

/// Splits a path into segments, ignoring the leading and one trailing slash.
fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

impl Pattern {
    pub fn parse(pattern: &str) -> Self {
        let segments = split_path(pattern)
            .into_iter()
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) if !name.is_empty() => Segment::Param(name.to_string()),
                _ => Segment::Literal(segment.to_string()),
            })
            .collect();
        Self { segments }
    }

    /// Returns the bound parameters if `path` matches this pattern.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let parts = split_path(path);
        if parts.len() != self.segments.len() {
            return None;
        }
        let mut params = HashMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Param(name) if !part.is_empty() => {
                    params.insert(name.clone(), part.to_string());
                }
                _ => return None,
            }
        }
        Some(params)
    }
}

//=========================================================================================
// Route Table
//=========================================================================================

struct Route {
    method: Method,
    pattern: Pattern,
    handler: Arc<dyn Handler>,
}

/// Ordered routes; the first registered match wins.
#[derive(Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a route. Returns `self` so registrations chain.
    pub fn register(mut self, method: Method, pattern: &str, handler: impl Handler) -> Self {
        self.routes.push(Route {
            method,
            pattern: Pattern::parse(pattern),
            handler: Arc::new(handler),
        });
        self
    }

    pub fn get(self, pattern: &str, handler: impl Handler) -> Self {
        self.register(Method::GET, pattern, handler)
    }

    pub fn post(self, pattern: &str, handler: impl Handler) -> Self {
        self.register(Method::POST, pattern, handler)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Finds the first route for `method` and `path`. `HEAD` falls back to
    /// `GET` routes.
    pub fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(Arc<dyn Handler>, HashMap<String, String>)> {
        self.routes.iter().find_map(|route| {
            let method_ok = route.method == *method
                || (*method == Method::HEAD && route.method == Method::GET);
            if !method_ok {
                return None;
            }
            route
                .pattern
                .matches(path)
                .map(|params| (Arc::clone(&route.handler), params))
        })
    }

    /// Runs the matching handler, or renders the not-found page.
    pub async fn dispatch(&self, state: Arc<AppState>, mut req: SiteRequest) -> SiteResult<Reply> {
        match self.lookup(req.method(), req.path()) {
            Some((handler, params)) => {
                req.set_params(params);
                handler.call(state, req).await
            }
            None => Ok(fallback::not_found()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::response::ReplyBody;
    use crate::web::test_support::{request, test_state};
    use axum::http::StatusCode;
    use serde_json::json;

    async fn first(_: Arc<AppState>, _: SiteRequest) -> SiteResult<Reply> {
        Ok(Reply::text("text/plain", "first"))
    }

    async fn second(_: Arc<AppState>, _: SiteRequest) -> SiteResult<Reply> {
        Ok(Reply::text("text/plain", "second"))
    }

    async fn echo_params(_: Arc<AppState>, req: SiteRequest) -> SiteResult<Reply> {
        Reply::json(json!({ "year": req.param("year"), "month": req.param("month") }))
    }

    fn text_of(reply: &Reply) -> &str {
        match reply.body() {
            ReplyBody::Text { body, .. } => body,
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn patterns_bind_named_segments() {
        let pattern = Pattern::parse("/contest/vacation-photo/:year/:month");
        let params = pattern.matches("/contest/vacation-photo/2026/10").unwrap();
        assert_eq!(params.get("year").map(String::as_str), Some("2026"));
        assert_eq!(params.get("month").map(String::as_str), Some("10"));

        assert!(pattern.matches("/contest/vacation-photo/2026").is_none());
        assert!(pattern.matches("/contest/vacation-photo//10").is_none());
        assert!(pattern.matches("/contest/other-photo/2026/10").is_none());
    }

    #[test]
    fn root_and_trailing_slashes() {
        assert!(Pattern::parse("/").matches("/").is_some());
        assert!(Pattern::parse("/").matches("/about").is_none());
        assert!(Pattern::parse("/about").matches("/about/").is_some());
    }

    #[test]
    fn methods_must_match_except_head_for_get() {
        let table = RouteTable::new().get("/about", first).post("/process", second);
        assert!(table.lookup(&Method::GET, "/about").is_some());
        assert!(table.lookup(&Method::HEAD, "/about").is_some());
        assert!(table.lookup(&Method::POST, "/about").is_none());
        assert!(table.lookup(&Method::GET, "/process").is_none());
        assert_eq!(table.len(), 2);
    }

    #[tokio::test]
    async fn first_registered_match_wins() {
        let state = test_state();
        let table = RouteTable::new()
            .get("/tours/:name", first)
            .get("/tours/hood-river", second);

        let reply = table.dispatch(state.clone(), request(Method::GET, "/tours/hood-river")).await.unwrap();
        assert_eq!(text_of(&reply), "first");

        let swapped = RouteTable::new()
            .get("/tours/hood-river", second)
            .get("/tours/:name", first);
        let reply = swapped.dispatch(state, request(Method::GET, "/tours/hood-river")).await.unwrap();
        assert_eq!(text_of(&reply), "second");
    }

    #[tokio::test]
    async fn params_reach_the_handler() {
        let table = RouteTable::new().post("/contest/vacation-photo/:year/:month", echo_params);
        let reply = table
            .dispatch(test_state(), request(Method::POST, "/contest/vacation-photo/2026/10"))
            .await
            .unwrap();
        assert_eq!(reply.body(), &ReplyBody::Json(json!({ "year": "2026", "month": "10" })));
    }

    #[tokio::test]
    async fn unmatched_requests_get_the_not_found_page() {
        let table = RouteTable::new().get("/", first);
        let reply = table.dispatch(test_state(), request(Method::GET, "/nowhere")).await.unwrap();
        assert_eq!(reply.status(), StatusCode::NOT_FOUND);
        assert!(matches!(reply.body(), ReplyBody::Render { view, .. } if view == "404"));
    }
}
