pub mod domain;
pub mod ports;
pub mod validation;

pub use domain::{
    FlashKind, FlashMessage, SessionData, SignupRecord, StoredUpload, UploadedFile,
    WeatherContext, WeatherLocation,
};
pub use ports::{
    FortuneService, NewsletterService, PortError, PortResult, SessionStore, UploadService,
    ViewRenderer, WeatherService,
};
pub use validation::{is_valid_email, redact_email};
