//! services/site/src/web/pipeline.rs
//!
//! The request pipeline: read the body, run the enrichment chain, dispatch to
//! the route table, persist the session and turn the reply into a response.
//! Every error or panic on the way is logged and becomes the 500 page.

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::response::Response;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error};

use crate::error::SiteResult;
use crate::web::cookies::{SetCookie, SESSION_COOKIE};
use crate::web::fallback;
use crate::web::request::{Locals, SiteRequest};
use crate::web::response::Reply;
use crate::web::router::RouteTable;
use crate::web::session::SessionHandle;
use crate::web::state::AppState;
use crate::web::uploads;

//=========================================================================================
// Enrichment Stages
//=========================================================================================

/// What a stage wants to happen next.
#[derive(Debug)]
pub enum Flow {
    Continue,
    /// Stop the chain and answer with this reply; the router is skipped.
    Respond(Reply),
}

/// One step of the enrichment chain.
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn apply(&self, state: &AppState, req: &mut SiteRequest) -> SiteResult<Flow>;
}

/// Parses `application/x-www-form-urlencoded` bodies into form fields.
pub struct BodyParser;

#[async_trait]
impl Stage for BodyParser {
    fn name(&self) -> &'static str {
        "body-parser"
    }

    async fn apply(&self, _state: &AppState, req: &mut SiteRequest) -> SiteResult<Flow> {
        let is_form = req.content_type().is_some_and(|ct| {
            ct.trim_start()
                .to_ascii_lowercase()
                .starts_with("application/x-www-form-urlencoded")
        });
        if is_form {
            req.parse_form_body();
        }
        Ok(Flow::Continue)
    }
}

/// Attaches the visitor's session, or a fresh unsaved one.
pub struct SessionLoader;

#[async_trait]
impl Stage for SessionLoader {
    fn name(&self) -> &'static str {
        "session"
    }

    async fn apply(&self, state: &AppState, req: &mut SiteRequest) -> SiteResult<Flow> {
        let session = match req.signed_cookie(&state.signer, SESSION_COOKIE) {
            Some(id) => match state.sessions.get(&id).await? {
                Some(data) => SessionHandle::existing(id, data),
                None => SessionHandle::fresh(),
            },
            None => SessionHandle::fresh(),
        };
        req.set_session(session);
        Ok(Flow::Continue)
    }
}

/// Moves the pending flash out of the session into the render context.
pub struct FlashTaker;

#[async_trait]
impl Stage for FlashTaker {
    fn name(&self) -> &'static str {
        "flash"
    }

    async fn apply(&self, _state: &AppState, req: &mut SiteRequest) -> SiteResult<Flow> {
        let flash = req.session().take_flash().await;
        req.locals_mut().flash = flash;
        Ok(Flow::Continue)
    }
}

/// Hands requests under the upload prefix to the upload intercept.
pub struct UploadInterceptor;

#[async_trait]
impl Stage for UploadInterceptor {
    fn name(&self) -> &'static str {
        "upload-intercept"
    }

    async fn apply(&self, state: &AppState, req: &mut SiteRequest) -> SiteResult<Flow> {
        if !uploads::is_under_prefix(req.path(), &state.config.upload_prefix) {
            return Ok(Flow::Continue);
        }
        Ok(Flow::Respond(uploads::intercept(state, req).await?))
    }
}

/// Turns on the in-page test suites with `?test=1`, except in production.
pub struct TestModeFlag;

#[async_trait]
impl Stage for TestModeFlag {
    fn name(&self) -> &'static str {
        "test-mode"
    }

    async fn apply(&self, state: &AppState, req: &mut SiteRequest) -> SiteResult<Flow> {
        let show_tests = !state.config.environment.is_production() && req.query("test") == Some("1");
        req.locals_mut().show_tests = show_tests;
        Ok(Flow::Continue)
    }
}

/// Adds the current weather snapshot to the render context.
pub struct WeatherInjector;

#[async_trait]
impl Stage for WeatherInjector {
    fn name(&self) -> &'static str {
        "weather"
    }

    async fn apply(&self, state: &AppState, req: &mut SiteRequest) -> SiteResult<Flow> {
        req.locals_mut().weather = Some(state.weather.weather_data());
        Ok(Flow::Continue)
    }
}

//=========================================================================================
// Enrichment Chain
//=========================================================================================

pub struct EnrichmentChain {
    stages: Vec<Box<dyn Stage>>,
}

impl EnrichmentChain {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// The site's chain, in the order every request goes through it.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(BodyParser),
            Box::new(SessionLoader),
            Box::new(FlashTaker),
            Box::new(UploadInterceptor),
            Box::new(TestModeFlag),
            Box::new(WeatherInjector),
        ])
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub async fn run(&self, state: &AppState, req: &mut SiteRequest) -> SiteResult<Flow> {
        for stage in &self.stages {
            if let Flow::Respond(reply) = stage.apply(state, req).await? {
                debug!(stage = stage.name(), path = %req.path(), "chain stopped early");
                return Ok(Flow::Respond(reply));
            }
        }
        Ok(Flow::Continue)
    }
}

//=========================================================================================
// The Site Service
//=========================================================================================

/// Everything the catch-all axum handler needs.
pub struct Site {
    state: Arc<AppState>,
    chain: EnrichmentChain,
    routes: RouteTable,
}

/// Session and render context captured from a request once the chain ran.
#[derive(Default)]
struct Captured {
    session: Option<SessionHandle>,
    locals: Locals,
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}

impl Site {
    pub fn new(state: Arc<AppState>, chain: EnrichmentChain, routes: RouteTable) -> Self {
        Self {
            state,
            chain,
            routes,
        }
    }

    async fn handle(&self, request: Request, captured: &mut Captured) -> SiteResult<Reply> {
        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, self.state.config.body_limit).await?;
        let mut req = SiteRequest::new(parts, body);

        let flow = self.chain.run(&self.state, &mut req).await;
        captured.session = Some(req.session().clone());
        captured.locals = req.locals().clone();

        match flow? {
            Flow::Respond(reply) => Ok(reply),
            Flow::Continue => self.routes.dispatch(Arc::clone(&self.state), req).await,
        }
    }

    /// Writes a changed session back to the store. Every write restarts the
    /// session's lifetime, so the cookie is issued again with a fresh `Max-Age`.
    async fn persist(&self, session: &SessionHandle) -> SiteResult<Option<SetCookie>> {
        let Some(data) = session.changes().await else {
            return Ok(None);
        };
        self.state.sessions.put(session.id(), data).await?;
        let cookie = SetCookie::new(SESSION_COOKIE, self.state.signer.sign(session.id()))
            .max_age(self.state.config.session_ttl)
            .http_only();
        Ok(Some(cookie))
    }

    async fn finish(&self, mut reply: Reply, captured: &Captured) -> Response {
        if let Some(session) = &captured.session {
            match self.persist(session).await {
                Ok(Some(cookie)) => reply = reply.with_cookie(cookie),
                Ok(None) => {}
                Err(e) => {
                    error!(error = %e, "failed to save session");
                    reply = fallback::server_error();
                }
            }
        }

        match reply.into_http(&self.state, &captured.locals).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "failed to build response");
                match fallback::server_error().into_http(&self.state, &captured.locals).await {
                    Ok(response) => response,
                    Err(e) => {
                        error!(error = %e, "failed to render the error page");
                        fallback::plain_server_error()
                    }
                }
            }
        }
    }
}

/// The catch-all axum handler running every dynamic request.
pub async fn serve(State(site): State<Arc<Site>>, request: Request) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let mut captured = Captured::default();
    let outcome = AssertUnwindSafe(site.handle(request, &mut captured))
        .catch_unwind()
        .await;

    let reply = match outcome {
        Ok(Ok(reply)) => reply,
        Ok(Err(e)) => {
            error!(%method, %path, error = %e, "request failed");
            fallback::server_error()
        }
        Err(panic) => {
            error!(%method, %path, panic = %panic_message(panic.as_ref()), "request handler panicked");
            fallback::server_error()
        }
    };
    site.finish(reply, &captured).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::web::response::ReplyBody;
    use crate::web::test_support::{
        multipart_body, request, request_with, state_for, test_state, BOUNDARY,
    };
    use axum::http::Method;
    use meadowlark_core::domain::{FlashKind, FlashMessage, SessionData};

    #[test]
    fn standard_chain_order() {
        assert_eq!(
            EnrichmentChain::standard().stage_names(),
            ["body-parser", "session", "flash", "upload-intercept", "test-mode", "weather"]
        );
    }

    #[tokio::test]
    async fn body_parser_only_reads_form_bodies() {
        let state = test_state();
        let mut form = request_with(
            Method::POST,
            "/newsletter",
            &[("content-type", "application/x-www-form-urlencoded")],
            "email=a%40b.com".to_string(),
        );
        BodyParser.apply(&state, &mut form).await.unwrap();
        assert_eq!(form.form("email"), Some("a@b.com"));

        let mut json = request_with(
            Method::POST,
            "/newsletter",
            &[("content-type", "application/json")],
            "email=a%40b.com".to_string(),
        );
        BodyParser.apply(&state, &mut json).await.unwrap();
        assert_eq!(json.form("email"), None);
    }

    #[tokio::test]
    async fn session_loader_restores_signed_sessions_only() {
        let state = test_state();
        let mut data = SessionData::default();
        data.insert("username", serde_json::json!("ada"));
        state.sessions.put("known", data).await.unwrap();

        let cookie = format!("sid={}", state.signer.sign("known"));
        let mut req = request_with(Method::GET, "/", &[("cookie", cookie.as_str())], String::new());
        SessionLoader.apply(&state, &mut req).await.unwrap();
        assert_eq!(req.session().id(), "known");
        assert!(!req.session().is_new());

        let mut forged = request_with(Method::GET, "/", &[("cookie", "sid=s:known.bogus")], String::new());
        SessionLoader.apply(&state, &mut forged).await.unwrap();
        assert_ne!(forged.session().id(), "known");
        assert!(forged.session().is_new());
    }

    #[tokio::test]
    async fn flash_is_taken_exactly_once() {
        let state = test_state();
        let mut req = request(Method::GET, "/newsletter/archive");
        let mut data = SessionData::default();
        data.set_flash(FlashMessage::new(FlashKind::Danger, "Validation error!", "bad"));
        req.set_session(SessionHandle::existing("abc", data));

        FlashTaker.apply(&state, &mut req).await.unwrap();
        assert_eq!(req.locals().flash.as_ref().map(|f| f.kind), Some(FlashKind::Danger));
        assert!(req.session().take_flash().await.is_none());
    }

    #[tokio::test]
    async fn test_mode_requires_the_query_flag_outside_production() {
        let dev = state_for(Environment::Development);
        let mut on = request(Method::GET, "/about?test=1");
        TestModeFlag.apply(&dev, &mut on).await.unwrap();
        assert!(on.locals().show_tests);

        let mut off = request(Method::GET, "/about?test=0");
        TestModeFlag.apply(&dev, &mut off).await.unwrap();
        assert!(!off.locals().show_tests);

        let prod = state_for(Environment::Production);
        let mut prod_req = request(Method::GET, "/about?test=1");
        TestModeFlag.apply(&prod, &mut prod_req).await.unwrap();
        assert!(!prod_req.locals().show_tests);
    }

    #[tokio::test]
    async fn upload_prefix_stops_the_chain() {
        let state = test_state();
        let body = multipart_body(&[("files", Some("beach.jpg"), "jpeg")]);
        let content_type = format!("multipart/form-data; boundary={}", BOUNDARY);
        let mut req = request_with(
            Method::POST,
            "/upload/photos",
            &[("content-type", content_type.as_str())],
            body,
        );

        let flow = EnrichmentChain::standard().run(&state, &mut req).await.unwrap();
        let Flow::Respond(reply) = flow else {
            panic!("upload requests must not reach the router");
        };
        let ReplyBody::Json(json) = reply.body() else {
            panic!("expected a JSON reply");
        };
        let url = json["files"][0]["url"].as_str().unwrap();
        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with("/beach.jpg"));
        assert!(req.locals().weather.is_none());
    }

    #[tokio::test]
    async fn other_paths_run_every_stage() {
        let state = test_state();
        let mut req = request(Method::GET, "/uploads/123/beach.jpg");
        let flow = EnrichmentChain::standard().run(&state, &mut req).await.unwrap();
        assert!(matches!(flow, Flow::Continue));
        assert!(req.locals().weather.is_some());
    }

    #[tokio::test]
    async fn every_session_write_renews_the_cookie() {
        let state = test_state();
        let site = Site::new(state.clone(), EnrichmentChain::standard(), RouteTable::new());

        let untouched = SessionHandle::existing("abc", SessionData::default());
        assert!(site.persist(&untouched).await.unwrap().is_none());

        let renewed = SessionHandle::existing("abc", SessionData::default());
        renewed.insert("username", serde_json::json!("ada")).await;
        let cookie = site.persist(&renewed).await.unwrap().expect("a renewed cookie");
        let expected = format!(
            "sid={}; Path=/; Max-Age={}; HttpOnly",
            state.signer.sign("abc"),
            state.config.session_ttl.as_secs()
        );
        assert!(cookie.to_string().starts_with(&expected), "{}", cookie);
        assert!(state.sessions.get("abc").await.unwrap().is_some());
    }

    #[test]
    fn panic_messages_are_extracted() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let owned: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(owned.as_ref()), "bang");
    }
}
