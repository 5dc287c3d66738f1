//! Handles loading configuration from files and applying it to the Config struct.

use super::{Config, ConfigFile};
use anyhow::Context;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Loads configuration settings from a TOML file.
pub(crate) fn load_config_file(file_path: &str) -> anyhow::Result<ConfigFile> {
    let path = Path::new(file_path);
    if !path.is_file() {
        return Err(anyhow::anyhow!(
            "File not found or is not a file: {}",
            file_path
        ));
    }
    tracing::debug!("Attempting to read config file: {}", file_path);
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", file_path))?;

    let config_file_content: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML configuration from {}", file_path))?;

    tracing::debug!("Successfully parsed configuration file: {}", file_path);
    Ok(config_file_content)
}

/// Merges every value present in `file_config` onto `config`.
pub(crate) fn apply_file_config(config: &mut Config, file_config: &ConfigFile) {
    // Network
    if let Some(timeout) = file_config.network.request_timeout {
        config.request_timeout = Duration::from_secs(timeout);
    }
    if let Some(min_sleep) = file_config.network.min_sleep {
        config.sleep_between_requests.0 = min_sleep;
    }
    if let Some(max_sleep) = file_config.network.max_sleep {
        config.sleep_between_requests.1 = max_sleep;
    }
    if let Some(ref agents) = file_config.network.user_agents {
        config.user_agents = agents.clone();
    }

    // Crawl
    if let Some(concurrency) = file_config.crawl.concurrency {
        config.crawl_concurrency = concurrency;
    }
    if let Some(timeout) = file_config.crawl.timeout {
        config.crawl_timeout = Duration::from_secs(timeout);
    }
    if let Some(max_pages) = file_config.crawl.max_pages {
        config.max_pages = max_pages;
    }
    if let Some(depth) = file_config.crawl.max_link_depth {
        config.max_link_depth = depth;
    }
    if let Some(links) = file_config.crawl.max_links_per_page {
        config.max_links_per_page = links;
    }
    if let Some(ref pages) = file_config.crawl.common_pages {
        config.common_pages = pages.clone();
    }
    if let Some(ref tokens) = file_config.crawl.contact_tokens {
        if !tokens.is_empty() {
            config.contact_tokens = tokens.iter().map(|t| t.to_lowercase()).collect();
        }
    }

    // DNS
    if let Some(timeout) = file_config.dns.dns_timeout {
        config.dns_timeout = Duration::from_secs(timeout);
    }
    if let Some(ref servers) = file_config.dns.dns_servers {
        config.dns_servers = servers.clone();
    }

    // SMTP
    if let Some(timeout) = file_config.smtp.smtp_timeout {
        config.smtp_timeout = Duration::from_secs(timeout);
    }
    if let Some(ref sender) = file_config.smtp.smtp_sender_email {
        config.smtp_sender_email = sender.trim().to_string();
    }
    if let Some(ref helo) = file_config.smtp.helo_name {
        config.smtp_helo_name = helo.trim().to_string();
    }

    // Verification
    if let Some(enable) = file_config.verification.enable_mailbox_check {
        config.enable_mailbox_check = enable;
    }
    if let Some(concurrency) = file_config.verification.max_concurrency {
        config.max_concurrency = concurrency;
    }

    // WHOIS
    if let Some(enable) = file_config.whois.enabled {
        config.enable_whois = enable;
    }
    if let Some(timeout) = file_config.whois.timeout {
        config.whois_timeout = Duration::from_secs(timeout);
    }
}
