//! services/site/src/adapters/newsletter.rs
//!
//! Newsletter persistence. There is no mailing-list backend yet, so the
//! adapter records the signup in the log and reports success.

use async_trait::async_trait;
use meadowlark_core::domain::SignupRecord;
use meadowlark_core::ports::{NewsletterService, PortResult};
use meadowlark_core::validation::redact_email;
use tracing::info;

/// An adapter that implements the `NewsletterService` port by logging signups.
#[derive(Clone, Default)]
pub struct LoggingNewsletter;

#[async_trait]
impl NewsletterService for LoggingNewsletter {
    async fn save(&self, record: &SignupRecord) -> PortResult<()> {
        info!(email = %redact_email(&record.email), "newsletter signup received");
        Ok(())
    }
}
