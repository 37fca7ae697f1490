//! services/site/src/web/handlers/diagnostics.rs
//!
//! Small endpoints used by the front-end and for debugging.

use serde::Serialize;
use std::fmt::Write;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::SiteResult;
use crate::web::request::SiteRequest;
use crate::web::response::Reply;
use crate::web::state::AppState;

/// The words the nursery-rhyme page fills in client-side.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NurseryRhyme {
    pub animal: String,
    pub body_part: String,
    pub adjective: String,
    pub noun: String,
}

/// Data for the nursery-rhyme page.
#[utoipa::path(
    get,
    path = "/data/nursery-rhyme",
    responses(
        (status = 200, description = "The rhyme's words", body = NurseryRhyme)
    )
)]
pub async fn nursery_rhyme_data(_state: Arc<AppState>, _req: SiteRequest) -> SiteResult<Reply> {
    Reply::json(NurseryRhyme {
        animal: "squirrel".to_string(),
        body_part: "tail".to_string(),
        adjective: "bushy".to_string(),
        noun: "heck".to_string(),
    })
}

/// Echoes the request headers as `name: value` lines.
#[utoipa::path(
    get,
    path = "/headers",
    responses(
        (status = 200, description = "One line per request header", body = String, content_type = "text/plain")
    )
)]
pub async fn headers_dump(_state: Arc<AppState>, req: SiteRequest) -> SiteResult<Reply> {
    let mut dump = String::new();
    for (name, value) in req.headers() {
        let value = String::from_utf8_lossy(value.as_bytes());
        // Writing into a String cannot fail.
        let _ = writeln!(dump, "{}: {}", name, value);
    }
    Ok(Reply::text("text/plain; charset=utf-8", dump))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::response::ReplyBody;
    use crate::web::test_support::{request, request_with, test_state};
    use axum::http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn rhyme_uses_camel_case_keys() {
        let reply = nursery_rhyme_data(test_state(), request(Method::GET, "/data/nursery-rhyme"))
            .await
            .unwrap();
        assert_eq!(
            reply.body(),
            &ReplyBody::Json(json!({
                "animal": "squirrel",
                "bodyPart": "tail",
                "adjective": "bushy",
                "noun": "heck",
            }))
        );
    }

    #[tokio::test]
    async fn headers_are_listed_one_per_line() {
        let req = request_with(
            Method::GET,
            "/headers",
            &[("x-trip", "coast"), ("accept", "text/html")],
            String::new(),
        );
        let reply = headers_dump(test_state(), req).await.unwrap();
        let ReplyBody::Text { content_type, body } = reply.body() else {
            panic!("expected plain text");
        };
        assert!(content_type.starts_with("text/plain"));
        assert!(body.lines().any(|line| line == "x-trip: coast"));
        assert!(body.lines().any(|line| line == "accept: text/html"));
        assert_eq!(body.lines().count(), 2);
    }
}
