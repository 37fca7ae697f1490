//! services/site/src/web/mod.rs
//!
//! The HTTP front of the site. Axum hosts everything: static files are tried
//! first, and whatever they do not answer goes through the request pipeline.

pub mod api_docs;
pub mod cookies;
pub mod fallback;
pub mod handlers;
pub mod negotiation;
pub mod pipeline;
pub mod request;
pub mod response;
pub mod router;
pub mod routes;
pub mod session;
pub mod state;
pub mod uploads;

#[cfg(test)]
pub(crate) mod test_support;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::web::api_docs::ApiDoc;
use crate::web::pipeline::{EnrichmentChain, Site};
use crate::web::router::RouteTable;
use crate::web::state::AppState;

/// Builds the full application with the site's own routes.
pub fn app(state: Arc<AppState>) -> Router {
    app_with_routes(state, routes::site_routes())
}

/// Builds the application around an arbitrary route table.
pub fn app_with_routes(state: Arc<AppState>, routes: RouteTable) -> Router {
    let public_path = state.config.public_path.clone();
    let body_limit = state.config.body_limit;
    let production = state.config.environment.is_production();

    let site = Arc::new(Site::new(state, EnrichmentChain::standard(), routes));
    let dynamic = Router::new().fallback(pipeline::serve).with_state(site);
    let files = ServeDir::new(public_path)
        .call_fallback_on_method_not_allowed(true)
        .fallback(dynamic);

    let mut app = Router::new();
    if !production {
        app = app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }
    app.fallback_service(files)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
}
