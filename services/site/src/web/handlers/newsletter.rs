//! services/site/src/web/handlers/newsletter.rs
//!
//! The newsletter signup flow. Browser submissions get a flash message and a
//! redirect to the archive; AJAX submissions get a JSON verdict instead.

use meadowlark_core::domain::{FlashKind, FlashMessage, SignupRecord};
use meadowlark_core::validation::{is_valid_email, redact_email};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::error::SiteResult;
use crate::web::cookies::SetCookie;
use crate::web::request::SiteRequest;
use crate::web::response::Reply;
use crate::web::state::AppState;

const ARCHIVE: &str = "/newsletter/archive";
const MONSTER_COOKIE: &str = "signed_monster";
const MONSTER_VALUE: &str = "nom-nom";
const MONSTER_MAX_AGE: Duration = Duration::from_secs(60);

//=========================================================================================
// Payloads
//=========================================================================================

/// The signup form, posted as `application/x-www-form-urlencoded`.
#[derive(Debug, Clone, Default, ToSchema)]
pub struct SignupForm {
    pub name: Option<String>,
    pub email: String,
}

impl SignupForm {
    fn from_request(req: &SiteRequest) -> Self {
        Self {
            name: req.form("name").map(str::to_string),
            email: req.form("email").unwrap_or_default().to_string(),
        }
    }

    fn into_record(self) -> SignupRecord {
        SignupRecord {
            name: self.name.unwrap_or_default(),
            email: self.email,
        }
    }
}

/// The JSON verdict for machine-readable form posts.
#[derive(Debug, Serialize, ToSchema)]
pub struct FormResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FormResponse {
    fn success() -> Self {
        Self {
            success: Some(true),
            error: None,
        }
    }

    fn error(message: &str) -> Self {
        Self {
            success: None,
            error: Some(message.to_string()),
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// The signup page. Also sets a short-lived signed demo cookie.
pub async fn newsletter_form(state: Arc<AppState>, _req: SiteRequest) -> SiteResult<Reply> {
    let monster = SetCookie::new(MONSTER_COOKIE, state.signer.sign(MONSTER_VALUE)).max_age(MONSTER_MAX_AGE);
    Ok(Reply::render("newsletter", json!({ "csrf": "CSRF token goes here" })).with_cookie(monster))
}

/// Sign up for the newsletter.
///
/// Machine-readable requests get a JSON verdict; browsers are redirected to
/// the archive with a flash message describing the outcome.
#[utoipa::path(
    post,
    path = "/newsletter",
    request_body(content = SignupForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Verdict for AJAX submissions", body = FormResponse),
        (status = 303, description = "Browser submissions are redirected to the archive")
    )
)]
pub async fn newsletter_signup(state: Arc<AppState>, req: SiteRequest) -> SiteResult<Reply> {
    let record = SignupForm::from_request(&req).into_record();
    let machine = req.is_machine_readable();
    let email = redact_email(&record.email);

    // 1. Reject malformed addresses before touching the store.
    if !is_valid_email(&record.email) {
        warn!(%email, "rejected newsletter signup");
        if machine {
            return Reply::json(FormResponse::error("Invalid name email address."));
        }
        req.session()
            .set_flash(FlashMessage::new(
                FlashKind::Danger,
                "Validation error!",
                "The email address you entered was not valid.",
            ))
            .await;
        return Ok(Reply::redirect(ARCHIVE));
    }

    // 2. Save, reporting store failures to the visitor instead of the 500 page.
    if let Err(e) = state.newsletter.save(&record).await {
        error!(%email, error = %e, "failed to save newsletter signup");
        if machine {
            return Reply::json(FormResponse::error("Database error."));
        }
        req.session()
            .set_flash(FlashMessage::new(
                FlashKind::Danger,
                "Database error!",
                "There was a database error; please try again later.",
            ))
            .await;
        return Ok(Reply::redirect(ARCHIVE));
    }

    // 3. Success.
    info!(%email, "newsletter signup accepted");
    if machine {
        return Reply::json(FormResponse::success());
    }
    req.session()
        .set_flash(FlashMessage::new(
            FlashKind::Success,
            "Thank you!",
            "You have now been signed up for the newsletter.",
        ))
        .await;
    Ok(Reply::redirect(ARCHIVE))
}

pub async fn newsletter_archive(_state: Arc<AppState>, _req: SiteRequest) -> SiteResult<Reply> {
    Ok(Reply::render("newsletter/archive", json!({})))
}

/// Generic form sink used by the AJAX newsletter widget.
#[utoipa::path(
    post,
    path = "/process",
    responses(
        (status = 200, description = "AJAX submissions", body = FormResponse),
        (status = 303, description = "Browser submissions are redirected to the thank-you page")
    )
)]
pub async fn process(_state: Arc<AppState>, req: SiteRequest) -> SiteResult<Reply> {
    info!(
        form = ?req.query("form"),
        name = ?req.form("name"),
        email = ?req.form("email").map(redact_email),
        "form processed"
    );
    if req.is_machine_readable() {
        return Reply::json(FormResponse::success());
    }
    Ok(Reply::redirect("/thank-you"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::response::ReplyBody;
    use crate::web::test_support::{request, request_with, test_state};
    use async_trait::async_trait;
    use axum::http::{Method, StatusCode};
    use meadowlark_core::ports::{NewsletterService, PortError, PortResult};

    struct BrokenNewsletter;

    #[async_trait]
    impl NewsletterService for BrokenNewsletter {
        async fn save(&self, _record: &SignupRecord) -> PortResult<()> {
            Err(PortError::Unavailable("mailing list offline".to_string()))
        }
    }

    fn broken_state() -> Arc<AppState> {
        let base = test_state();
        Arc::new(AppState {
            newsletter: Arc::new(BrokenNewsletter),
            ..(*base).clone()
        })
    }

    fn signup(email: &str, headers: &[(&str, &str)]) -> SiteRequest {
        let mut all = vec![("content-type", "application/x-www-form-urlencoded")];
        all.extend_from_slice(headers);
        let mut req = request_with(
            Method::POST,
            "/newsletter",
            &all,
            format!("name=Ada&email={}", email),
        );
        req.parse_form_body();
        req
    }

    const XHR: (&str, &str) = ("x-requested-with", "XMLHttpRequest");
    const BROWSER: (&str, &str) = ("accept", "text/html,application/xhtml+xml,*/*;q=0.8");

    #[tokio::test]
    async fn invalid_email_json() {
        let reply = newsletter_signup(test_state(), signup("not-an-email", &[XHR])).await.unwrap();
        assert_eq!(
            reply.body(),
            &ReplyBody::Json(json!({ "error": "Invalid name email address." }))
        );
    }

    #[tokio::test]
    async fn invalid_email_browser_flashes_and_redirects() {
        let req = signup("a%40b", &[BROWSER]);
        let session = req.session().clone();
        let reply = newsletter_signup(test_state(), req).await.unwrap();

        assert_eq!(reply.status(), StatusCode::SEE_OTHER);
        assert_eq!(reply.body(), &ReplyBody::Redirect(ARCHIVE.to_string()));
        let flash = session.take_flash().await.unwrap();
        assert_eq!(flash.kind, FlashKind::Danger);
        assert_eq!(flash.intro, "Validation error!");
    }

    #[tokio::test]
    async fn save_failure_json_and_browser() {
        let reply = newsletter_signup(broken_state(), signup("ada%40example.com", &[XHR])).await.unwrap();
        assert_eq!(reply.body(), &ReplyBody::Json(json!({ "error": "Database error." })));

        let req = signup("ada%40example.com", &[BROWSER]);
        let session = req.session().clone();
        let reply = newsletter_signup(broken_state(), req).await.unwrap();
        assert_eq!(reply.body(), &ReplyBody::Redirect(ARCHIVE.to_string()));
        assert_eq!(session.take_flash().await.unwrap().intro, "Database error!");
    }

    #[tokio::test]
    async fn success_json_and_browser() {
        let reply = newsletter_signup(test_state(), signup("ada%40example.com", &[XHR])).await.unwrap();
        assert_eq!(reply.body(), &ReplyBody::Json(json!({ "success": true })));

        let req = signup("ada%40example.com", &[BROWSER]);
        let session = req.session().clone();
        let reply = newsletter_signup(test_state(), req).await.unwrap();
        assert_eq!(reply.body(), &ReplyBody::Redirect(ARCHIVE.to_string()));
        let flash = session.take_flash().await.unwrap();
        assert_eq!(flash.kind, FlashKind::Success);
        assert_eq!(flash.message, "You have now been signed up for the newsletter.");
    }

    #[tokio::test]
    async fn form_page_sets_the_signed_monster_cookie() {
        let state = test_state();
        let reply = newsletter_form(state.clone(), request(Method::GET, "/newsletter")).await.unwrap();
        let cookie = reply.cookies()[0].to_string();
        let expected = format!("signed_monster={}; Path=/; Max-Age=60", state.signer.sign("nom-nom"));
        assert!(cookie.starts_with(&expected), "{}", cookie);
        assert!(matches!(reply.body(), ReplyBody::Render { view, .. } if view == "newsletter"));
    }

    #[tokio::test]
    async fn process_branches_on_the_client() {
        let reply = process(test_state(), request_with(Method::POST, "/process", &[XHR], String::new()))
            .await
            .unwrap();
        assert_eq!(reply.body(), &ReplyBody::Json(json!({ "success": true })));

        let reply = process(test_state(), request_with(Method::POST, "/process", &[BROWSER], String::new()))
            .await
            .unwrap();
        assert_eq!(reply.body(), &ReplyBody::Redirect("/thank-you".to_string()));
    }
}
