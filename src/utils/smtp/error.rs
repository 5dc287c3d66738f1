//! Maps lettre errors onto probe outcomes.

use super::result::{code_value, ProbeOutcome};
use lettre::transport::smtp::Error as SmtpError;

/// Protocol step an error happened in. Only a refusal at `RCPT TO` says
/// anything about the mailbox itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SmtpStage {
    Connect,
    StartTls,
    MailFrom,
    RcptTo,
}

/// Interprets a lettre error raised during `stage` against `server`.
pub(crate) fn classify_smtp_error(error: &SmtpError, server: &str, stage: SmtpStage) -> ProbeOutcome {
    let err_string = error.to_string();
    let lower = err_string.to_lowercase();

    if stage == SmtpStage::RcptTo && error.is_permanent() {
        let code = error.status().map(|c| code_value(&c)).unwrap_or(550);
        tracing::info!(target: "smtp_task", "{} refused recipient: {}", server, error);
        return ProbeOutcome::Rejected {
            code,
            message: err_string,
        };
    }

    if error.is_transient() {
        tracing::warn!(target: "smtp_task", "Transient SMTP reply from {} during {:?}: {}", server, stage, error);
        return ProbeOutcome::inconclusive(format!("Temporary failure (4xx): {}", err_string));
    }

    if lower.contains("starttls") || (lower.contains("530") && lower.contains("5.7.0")) {
        tracing::warn!(target: "smtp_task", "{} appears to require STARTTLS: {}", server, error);
        return ProbeOutcome::inconclusive(format!("Server requires TLS: {}", err_string));
    }

    if lower.contains("timed out")
        || lower.contains("connection refused")
        || lower.contains("network is unreachable")
    {
        tracing::warn!(target: "smtp_task",
            "SMTP connection to {} failed: {}. Port 25 may be blocked.", server, error);
        return ProbeOutcome::inconclusive(format!("Connection failed ({}), port 25 blocked?", err_string));
    }

    if error.is_permanent() {
        tracing::warn!(target: "smtp_task", "{} refused {:?}: {}", server, stage, error);
        return ProbeOutcome::inconclusive(format!("{:?} refused: {}", stage, err_string));
    }

    tracing::debug!(target: "smtp_task", "SMTP error from {} during {:?}: {}", server, stage, error);
    ProbeOutcome::inconclusive(format!("SMTP error during {:?}: {}", stage, err_string))
}
