//! Mailbox probing over SMTP.

mod client;
mod error;
mod result;

pub use client::{test_smtp_connectivity, SmtpProber};
pub use result::ProbeOutcome;

use async_trait::async_trait;

/// Asks one mail host whether it accepts a recipient.
///
/// Implementations never fail: every problem is folded into
/// [`ProbeOutcome::Inconclusive`].
#[async_trait]
pub trait MailboxProber: Send + Sync {
    async fn probe(&self, host: &str, address: &str) -> ProbeOutcome;
}
