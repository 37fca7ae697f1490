//! services/site/src/web/routes.rs
//!
//! The site's route table.

use crate::web::handlers::{contest, diagnostics, newsletter, pages};
use crate::web::router::RouteTable;

pub fn site_routes() -> RouteTable {
    RouteTable::new()
        .get("/", pages::home)
        .get("/about", pages::about)
        .get("/contacts", pages::contacts)
        .get("/tours/hood-river", pages::hood_river)
        .get("/tours/oregon-coast", pages::oregon_coast)
        .get("/tours/request-group-rate", pages::request_group_rate)
        .get("/greeting", pages::greeting)
        .get("/nursery-rhyme", pages::nursery_rhyme)
        .get("/data/nursery-rhyme", diagnostics::nursery_rhyme_data)
        .get("/headers", diagnostics::headers_dump)
        .get("/newsletter", newsletter::newsletter_form)
        .post("/newsletter", newsletter::newsletter_signup)
        .get("/newsletter/archive", newsletter::newsletter_archive)
        .post("/process", newsletter::process)
        .get("/contest/vacation-photo", contest::vacation_photo_form)
        .post("/contest/vacation-photo/:year/:month", contest::vacation_photo_entry)
        .get("/thank-you", pages::thank_you)
        .get("/error", pages::error_page)
}
