//! services/site/src/web/api_docs.rs
//!
//! The OpenAPI description of the site's JSON endpoints.

use utoipa::OpenApi;

use crate::web::handlers::{contest, diagnostics, newsletter};
use crate::web::uploads::{UploadResponse, UploadedFileSummary};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        diagnostics::nursery_rhyme_data,
        diagnostics::headers_dump,
        newsletter::newsletter_signup,
        newsletter::process,
        contest::vacation_photo_entry,
        upload_files,
    ),
    components(
        schemas(
            diagnostics::NurseryRhyme,
            newsletter::SignupForm,
            newsletter::FormResponse,
            UploadResponse,
            UploadedFileSummary,
        )
    ),
    tags(
        (name = "Meadowlark Travel", description = "JSON and form endpoints of the Meadowlark Travel site.")
    )
)]
pub struct ApiDoc;

/// Upload files.
///
/// Every request below the upload prefix is answered here, whatever the
/// remaining path. Files are stored under a fresh timestamped directory.
#[utoipa::path(
    post,
    path = "/upload/{path}",
    params(("path" = String, Path, description = "Ignored")),
    request_body(content_type = "multipart/form-data", description = "Any number of file parts."),
    responses(
        (status = 200, description = "The stored files", body = UploadResponse),
        (status = 500, description = "The upload could not be parsed or stored")
    )
)]
#[allow(dead_code)]
fn upload_files() {}
