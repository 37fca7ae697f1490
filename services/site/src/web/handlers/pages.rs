//! services/site/src/web/handlers/pages.rs
//!
//! Plain content pages. Each one renders a view, sometimes with a little data.

use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::SiteResult;
use crate::web::request::SiteRequest;
use crate::web::response::Reply;
use crate::web::state::AppState;

pub async fn home(_state: Arc<AppState>, _req: SiteRequest) -> SiteResult<Reply> {
    Ok(Reply::render("home", json!({})))
}

/// The about page, with a fortune and its in-page test script.
pub async fn about(state: Arc<AppState>, _req: SiteRequest) -> SiteResult<Reply> {
    Ok(Reply::render(
        "about",
        json!({
            "fortune": state.fortune.fortune(),
            "pageTestScript": "/qa/tests-about.js",
        }),
    ))
}

pub async fn contacts(_state: Arc<AppState>, _req: SiteRequest) -> SiteResult<Reply> {
    Ok(Reply::render("contacts", json!({})))
}

pub async fn hood_river(_state: Arc<AppState>, _req: SiteRequest) -> SiteResult<Reply> {
    Ok(Reply::render("tours/hood-river", json!({})))
}

pub async fn oregon_coast(_state: Arc<AppState>, _req: SiteRequest) -> SiteResult<Reply> {
    Ok(Reply::render("tours/oregon-coast", json!({})))
}

pub async fn request_group_rate(_state: Arc<AppState>, _req: SiteRequest) -> SiteResult<Reply> {
    Ok(Reply::render("tours/request-group-rate", json!({})))
}

/// Renders the about view as a greeting. `userid` comes from the plain
/// cookie of that name and `username` from the session; either may be
/// missing.
pub async fn greeting(_state: Arc<AppState>, req: SiteRequest) -> SiteResult<Reply> {
    let username = req.session().get("username").await.unwrap_or(Value::Null);
    Ok(Reply::render(
        "about",
        json!({
            "message": "welcome",
            "style": req.query("style"),
            "userid": req.cookie("userid"),
            "username": username,
        }),
    ))
}

pub async fn nursery_rhyme(_state: Arc<AppState>, _req: SiteRequest) -> SiteResult<Reply> {
    Ok(Reply::render("nursery-rhyme", json!({})))
}

pub async fn thank_you(_state: Arc<AppState>, _req: SiteRequest) -> SiteResult<Reply> {
    Ok(Reply::render("thank-you", json!({})))
}

pub async fn error_page(_state: Arc<AppState>, _req: SiteRequest) -> SiteResult<Reply> {
    Ok(Reply::render("error", json!({})))
}
