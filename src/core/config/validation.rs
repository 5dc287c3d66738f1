//! Contains validation logic for the final Config struct.

use super::Config;
use crate::core::error::{AppError, Result};
use std::time::Duration;

/// Validates the configuration after loading and overrides.
/// Clamps recoverable values with a warning; rejects the rest.
pub(crate) fn validate_config(config: &mut Config) -> Result<()> {
    if config.sleep_between_requests.0 < 0.0 || config.sleep_between_requests.1 < 0.0 {
        return Err(AppError::Config(
            "Sleep durations cannot be negative.".to_string(),
        ));
    }
    if config.sleep_between_requests.0 > config.sleep_between_requests.1 {
        tracing::warn!(
            "Min sleep ({:.2}s) > Max sleep ({:.2}s). Setting max sleep = min sleep.",
            config.sleep_between_requests.0,
            config.sleep_between_requests.1
        );
        config.sleep_between_requests.1 = config.sleep_between_requests.0;
    }
    if config.crawl_concurrency == 0 {
        tracing::warn!("Crawl concurrency was set to 0. Setting to 1.");
        config.crawl_concurrency = 1;
    }
    if config.max_concurrency == 0 {
        tracing::warn!("Max concurrency was set to 0. Setting to 1.");
        config.max_concurrency = 1;
    }
    if config.max_pages == 0 {
        tracing::warn!("Max pages was set to 0. Setting to 1.");
        config.max_pages = 1;
    }
    if config.crawl_timeout == Duration::ZERO {
        return Err(AppError::Config(
            "Crawl timeout must be greater than zero.".to_string(),
        ));
    }
    if config.user_agents.iter().all(|ua| ua.trim().is_empty()) {
        return Err(AppError::Config(
            "At least one non-empty User-Agent is required.".to_string(),
        ));
    }
    config.user_agents.retain(|ua| !ua.trim().is_empty());
    if config.dns_servers.is_empty() {
        tracing::debug!("DNS servers list is empty. Using system resolver configuration.");
    }
    if !config.smtp_sender_email.contains('@') || !config.smtp_sender_email.contains('.') {
        return Err(AppError::Config(format!(
            "Invalid SMTP sender email format: {}",
            config.smtp_sender_email
        )));
    }
    if config.smtp_helo_name.is_empty() {
        tracing::warn!("HELO name is empty. Using 'localhost'.");
        config.smtp_helo_name = "localhost".to_string();
    }
    if config.enable_mailbox_check {
        tracing::warn!(
            "Mailbox probing is enabled. Aggressive SMTP probing can damage sender reputation."
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_recoverable_values() {
        let mut config = Config {
            crawl_concurrency: 0,
            max_concurrency: 0,
            sleep_between_requests: (2.0, 1.0),
            ..Config::default()
        };
        validate_config(&mut config).unwrap();
        assert_eq!(config.crawl_concurrency, 1);
        assert_eq!(config.max_concurrency, 1);
        assert_eq!(config.sleep_between_requests, (2.0, 2.0));
    }

    #[test]
    fn rejects_bad_sender_and_empty_agents() {
        let mut config = Config {
            smtp_sender_email: "nobody".to_string(),
            ..Config::default()
        };
        assert!(validate_config(&mut config).is_err());

        let mut config = Config {
            user_agents: vec!["  ".to_string()],
            ..Config::default()
        };
        assert!(validate_config(&mut config).is_err());
    }
}
