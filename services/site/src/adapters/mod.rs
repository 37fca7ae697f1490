pub mod fortune;
pub mod newsletter;
pub mod session_store;
pub mod uploads;
pub mod views;
pub mod weather;

pub use fortune::FortuneCookies;
pub use newsletter::LoggingNewsletter;
pub use session_store::MemorySessionStore;
pub use uploads::DiskUploadStore;
pub use views::TemplateRenderer;
pub use weather::StaticWeather;
