//! services/site/src/web/handlers/contest.rs
//!
//! The vacation photo contest: an entry form and its multipart submission.

use chrono::{Datelike, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::SiteResult;
use crate::web::request::SiteRequest;
use crate::web::response::Reply;
use crate::web::state::AppState;
use crate::web::uploads::read_multipart;

/// The entry form, pre-filled with the current year and month (1 to 12).
pub async fn vacation_photo_form(_state: Arc<AppState>, _req: SiteRequest) -> SiteResult<Reply> {
    let now = Utc::now();
    Ok(Reply::render(
        "contest/vacation-photo",
        json!({ "year": now.year(), "month": now.month() }),
    ))
}

/// Receive a contest entry.
///
/// The photo is parsed but not kept. Unreadable submissions are sent to the
/// error page.
#[utoipa::path(
    post,
    path = "/contest/vacation-photo/{year}/{month}",
    params(
        ("year" = String, Path, description = "Contest year"),
        ("month" = String, Path, description = "Contest month")
    ),
    request_body(content_type = "multipart/form-data", description = "The entrant's details and photo."),
    responses(
        (status = 303, description = "Redirect to /thank-you, or to /error when the upload is unreadable")
    )
)]
pub async fn vacation_photo_entry(_state: Arc<AppState>, req: SiteRequest) -> SiteResult<Reply> {
    let year = req.param("year").unwrap_or_default();
    let month = req.param("month").unwrap_or_default();

    match read_multipart(&req).await {
        Ok(form) => {
            info!(
                year,
                month,
                fields = ?form.fields,
                files = form.files.len(),
                "vacation photo entry received"
            );
            Ok(Reply::redirect("/thank-you"))
        }
        Err(e) => {
            warn!(year, month, error = %e, "unreadable vacation photo entry");
            Ok(Reply::redirect("/error"))
        }
    }
}
