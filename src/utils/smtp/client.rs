//! lettre-backed mailbox prober.

use super::error::{classify_smtp_error, SmtpStage};
use super::result::{code_value, ProbeOutcome};
use super::MailboxProber;
use crate::core::config::Config;
use crate::core::error::{AppError, Result};

use async_trait::async_trait;
use lettre::transport::smtp::client::{SmtpConnection, TlsParameters};
use lettre::transport::smtp::commands::{Mail, Rcpt};
use lettre::transport::smtp::extension::ClientId;
use lettre::Address;
use std::net::ToSocketAddrs;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

const SMTP_PORT: u16 = 25;

/// Probes recipients over plain SMTP on port 25, upgrading with STARTTLS
/// when the server offers it. No message body is ever sent.
#[derive(Clone)]
pub struct SmtpProber {
    config: Arc<Config>,
}

impl SmtpProber {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl MailboxProber for SmtpProber {
    async fn probe(&self, host: &str, address: &str) -> ProbeOutcome {
        let host = host.to_string();
        let address = address.to_string();
        let sender = self.config.smtp_sender_email.clone();
        let helo = self.config.smtp_helo_name.clone();
        let timeout = self.config.smtp_timeout;

        tracing::debug!(target: "smtp_task", "Probing <{}> via {}", address, host);

        // Connect, greet, MAIL and RCPT each get `timeout`; bound the whole session as well.
        let session_deadline = timeout.saturating_mul(4);
        let task_host = host.clone();
        let task = tokio::task::spawn_blocking(move || {
            run_session(&task_host, &address, &sender, &helo, timeout)
        });

        match tokio::time::timeout(session_deadline, task).await {
            Ok(Ok(outcome)) => {
                tracing::debug!(target: "smtp_task", "Probe via {} finished: {:?}", host, outcome);
                outcome
            }
            Ok(Err(join_err)) => {
                tracing::error!(target: "smtp_task", "SMTP probe task for {} failed: {}", host, join_err);
                ProbeOutcome::inconclusive(format!("Probe task failed: {}", join_err))
            }
            Err(_) => {
                tracing::warn!(target: "smtp_task", "SMTP session with {} exceeded {:?}", host, session_deadline);
                ProbeOutcome::inconclusive(format!("Session with {} timed out", host))
            }
        }
    }
}

/// One blocking SMTP conversation: greeting, optional STARTTLS, MAIL FROM,
/// RCPT TO, QUIT.
fn run_session(
    host: &str,
    recipient: &str,
    sender: &str,
    helo: &str,
    timeout: Duration,
) -> ProbeOutcome {
    let recipient_address = match Address::from_str(recipient) {
        Ok(addr) => addr,
        Err(e) => return ProbeOutcome::inconclusive(format!("Unusable recipient address: {}", e)),
    };
    let sender_address = match Address::from_str(sender) {
        Ok(addr) => addr,
        Err(e) => return ProbeOutcome::inconclusive(format!("Unusable sender address: {}", e)),
    };

    let socket_addr = match (host, SMTP_PORT).to_socket_addrs().map(|mut a| a.next()) {
        Ok(Some(addr)) => addr,
        Ok(None) | Err(_) => {
            tracing::warn!(target: "smtp_task", "Could not resolve mail host {}", host);
            return ProbeOutcome::inconclusive(format!("Could not resolve mail host {}", host));
        }
    };

    let client_id = ClientId::Domain(helo.to_string());
    let mut conn = match SmtpConnection::connect(socket_addr, Some(timeout), &client_id, None, None)
    {
        Ok(conn) => conn,
        Err(e) => return classify_smtp_error(&e, host, SmtpStage::Connect),
    };

    if conn.can_starttls() {
        let upgraded = TlsParameters::new(host.to_string())
            .and_then(|params| conn.starttls(&params, &client_id));
        if let Err(e) = upgraded {
            conn.abort();
            return classify_smtp_error(&e, host, SmtpStage::StartTls);
        }
        tracing::debug!(target: "smtp_task", "Upgraded session with {} to TLS", host);
    }

    if let Err(e) = conn.command(Mail::new(Some(sender_address), vec![])) {
        conn.quit().ok();
        return classify_smtp_error(&e, host, SmtpStage::MailFrom);
    }

    let outcome = match conn.command(Rcpt::new(recipient_address, vec![])) {
        Ok(response) if response.is_positive() => ProbeOutcome::Accepted {
            code: code_value(&response.code()),
            message: response.message().collect::<Vec<&str>>().join(" "),
        },
        Ok(response) => ProbeOutcome::inconclusive(format!(
            "Unexpected RCPT reply {}",
            response.code()
        )),
        Err(e) => classify_smtp_error(&e, host, SmtpStage::RcptTo),
    };

    if let Err(e) = conn.quit() {
        tracing::debug!(target: "smtp_task", "QUIT to {} failed: {}", host, e);
    }
    outcome
}

/// Checks that outbound port 25 is usable by greeting a well-known public MX.
pub async fn test_smtp_connectivity(config: &Config) -> Result<()> {
    let test_server = "gmail-smtp-in.l.google.com";
    tracing::info!("Testing outbound SMTP (port 25) connectivity to {}...", test_server);

    let helo = config.smtp_helo_name.clone();
    let timeout = config.smtp_timeout.min(Duration::from_secs(5));

    let task = tokio::task::spawn_blocking(move || -> Result<()> {
        let socket_addr = (test_server, SMTP_PORT)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                AppError::Config(format!("Could not resolve any IP address for {}", test_server))
            })?;
        let client_id = ClientId::Domain(helo);
        let mut conn = SmtpConnection::connect(socket_addr, Some(timeout), &client_id, None, None)?;
        conn.quit().ok();
        Ok(())
    });

    match tokio::time::timeout(timeout + Duration::from_secs(1), task).await {
        Ok(Ok(Ok(()))) => {
            tracing::info!("SMTP connectivity test successful (connected to {}).", test_server);
            Ok(())
        }
        Ok(Ok(Err(e))) => {
            tracing::error!("SMTP connectivity test failed: {}", e);
            Err(e)
        }
        Ok(Err(join_err)) => Err(AppError::SmtpInconclusive(format!(
            "Connectivity test task failed: {}",
            join_err
        ))),
        Err(_) => {
            tracing::error!(
                "SMTP connectivity test timed out connecting to {}. Outbound port 25 is likely blocked.",
                test_server
            );
            Err(AppError::SmtpInconclusive(
                "SMTP connection timed out - port 25 is likely blocked.".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn malformed_recipient_is_inconclusive_without_network() {
        let prober = SmtpProber::new(Arc::new(Config::default()));
        let outcome = prober.probe("mx.acme.test", "not an address").await;
        assert!(matches!(outcome, ProbeOutcome::Inconclusive { .. }));
    }

    #[test]
    fn malformed_sender_is_inconclusive() {
        let outcome = run_session(
            "mx.acme.test",
            "jane@acme.test",
            "nobody",
            "localhost",
            Duration::from_secs(1),
        );
        assert!(matches!(outcome, ProbeOutcome::Inconclusive { .. }));
    }
}
