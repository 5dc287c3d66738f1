//! Outcome of a single mailbox probe against one mail host.

use lettre::transport::smtp::response::Code;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The host answered `RCPT TO` with a 2xx code.
    Accepted { code: u16, message: String },
    /// The host permanently refused the recipient (5xx).
    Rejected { code: u16, message: String },
    /// Nothing definitive: connect failure, timeout, 4xx, TLS trouble, sender refused.
    Inconclusive { reason: String },
}

impl ProbeOutcome {
    pub(crate) fn inconclusive(reason: impl Into<String>) -> Self {
        ProbeOutcome::Inconclusive {
            reason: reason.into(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ProbeOutcome::Accepted { code, message } => {
                format!("SMTP accepted recipient: {} {}", code, message)
            }
            ProbeOutcome::Rejected { code, message } => {
                format!("SMTP rejected recipient: {} {}", code, message)
            }
            ProbeOutcome::Inconclusive { reason } => format!("SMTP inconclusive: {}", reason),
        }
    }
}

/// Numeric form of a reply code, e.g. `550`.
pub(crate) fn code_value(code: &Code) -> u16 {
    code.to_string().parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lettre::transport::smtp::response::{Category, Detail, Severity};

    #[test]
    fn code_value_reads_three_digits() {
        let code = Code::new(
            Severity::PermanentNegativeCompletion,
            Category::MailSystem,
            Detail::Zero,
        );
        assert_eq!(code_value(&code), 550);
    }
}
