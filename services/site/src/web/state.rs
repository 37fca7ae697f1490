//! services/site/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::adapters::{
    DiskUploadStore, FortuneCookies, LoggingNewsletter, MemorySessionStore, StaticWeather,
    TemplateRenderer,
};
use crate::config::Config;
use crate::web::cookies::CookieSigner;
use meadowlark_core::ports::{
    FortuneService, NewsletterService, SessionStore, UploadService, ViewRenderer, WeatherService,
};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub signer: CookieSigner,
    pub sessions: Arc<dyn SessionStore>,
    pub newsletter: Arc<dyn NewsletterService>,
    pub uploads: Arc<dyn UploadService>,
    pub views: Arc<dyn ViewRenderer>,
    pub weather: Arc<dyn WeatherService>,
    pub fortune: Arc<dyn FortuneService>,
}

impl AppState {
    /// Wires the default adapters: in-memory sessions, templates from
    /// `views_path`, uploads written below the public directory.
    pub fn with_default_adapters(config: Arc<Config>) -> Self {
        let uploads_url = config
            .uploads_path
            .strip_prefix(&config.public_path)
            .ok()
            .and_then(|relative| relative.to_str())
            .map(|relative| format!("/{}", relative.trim_start_matches('/')))
            .unwrap_or_else(|| "/uploads".to_string());

        Self {
            signer: CookieSigner::new(&config.cookie_secret),
            sessions: Arc::new(MemorySessionStore::new(config.session_ttl)),
            newsletter: Arc::new(LoggingNewsletter),
            uploads: Arc::new(DiskUploadStore::new(config.uploads_path.clone(), uploads_url)),
            views: Arc::new(TemplateRenderer::new(config.views_path.clone())),
            weather: Arc::new(StaticWeather),
            fortune: Arc::new(FortuneCookies),
            config,
        }
    }
}
