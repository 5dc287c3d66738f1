//! Runtime configuration for the hunter.
//!
//! [`Config`] holds the resolved values. [`ConfigFile`] mirrors the optional
//! TOML file layout, and [`ConfigBuilder`] merges defaults, file contents and
//! programmatic overrides before validating the result.

mod builder;
mod loading;
mod validation;

pub use builder::ConfigBuilder;

use crate::core::error::Result;
use rand::Rng;
use serde::Deserialize;
use std::time::Duration;

pub(crate) const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
];

pub(crate) const DEFAULT_COMMON_PAGES: &[&str] =
    &["contact", "about", "team", "leadership", "staff", "faculty"];

pub(crate) const DEFAULT_CONTACT_TOKENS: &[&str] = &["contact", "about", "team"];

/// Resolved configuration used by every component.
#[derive(Debug, Clone)]
pub struct Config {
    // Network
    pub request_timeout: Duration,
    /// Per-host politeness delay range in seconds (min, max).
    pub sleep_between_requests: (f32, f32),
    pub user_agents: Vec<String>,

    // Crawl
    pub crawl_concurrency: usize,
    pub crawl_timeout: Duration,
    pub max_pages: usize,
    /// Seed pages are depth 0; links are followed while depth stays at or below this.
    pub max_link_depth: u32,
    pub max_links_per_page: usize,
    pub common_pages: Vec<String>,
    pub contact_tokens: Vec<String>,

    // DNS
    pub dns_timeout: Duration,
    /// Empty means "use the system resolver configuration".
    pub dns_servers: Vec<String>,

    // SMTP
    pub smtp_timeout: Duration,
    pub smtp_sender_email: String,
    pub smtp_helo_name: String,

    // Verification
    /// Mailbox probing risks sender-reputation damage and stays off unless asked for.
    pub enable_mailbox_check: bool,
    /// Concurrent lookups in batch mode.
    pub max_concurrency: usize,

    // WHOIS
    pub enable_whois: bool,
    pub whois_timeout: Duration,

    pub loaded_config_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            sleep_between_requests: (1.0, 1.5),
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),

            crawl_concurrency: 3,
            crawl_timeout: Duration::from_secs(60),
            max_pages: 30,
            max_link_depth: 1,
            max_links_per_page: 3,
            common_pages: DEFAULT_COMMON_PAGES.iter().map(|s| s.to_string()).collect(),
            contact_tokens: DEFAULT_CONTACT_TOKENS
                .iter()
                .map(|s| s.to_string())
                .collect(),

            dns_timeout: Duration::from_secs(5),
            dns_servers: vec![
                "8.8.8.8".to_string(),
                "8.8.4.4".to_string(),
                "1.1.1.1".to_string(),
            ],

            smtp_timeout: Duration::from_secs(10),
            smtp_sender_email: "verify@gmail.com".to_string(),
            smtp_helo_name: "localhost".to_string(),

            enable_mailbox_check: false,
            max_concurrency: 4,

            enable_whois: true,
            whois_timeout: Duration::from_secs(10),

            loaded_config_path: None,
        }
    }
}

impl Config {
    /// Default configuration, validated. Shorthand for `ConfigBuilder::new().build()`
    /// without the file lookup side effects.
    pub fn validated_default() -> Result<Self> {
        let mut config = Self::default();
        validation::validate_config(&mut config)?;
        Ok(config)
    }
}

/// Picks a politeness delay uniformly from the configured range.
pub(crate) fn get_random_sleep_duration(config: &Config) -> Duration {
    let (min, max) = config.sleep_between_requests;
    if max <= 0.0 {
        return Duration::ZERO;
    }
    let secs = if max > min {
        rand::thread_rng().gen_range(min..=max)
    } else {
        min
    };
    Duration::from_secs_f32(secs.max(0.0))
}

/// Layout of the optional TOML configuration file. Every field is optional;
/// absent values keep whatever the builder already holds.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub network: NetworkSection,
    pub crawl: CrawlSection,
    pub dns: DnsSection,
    pub smtp: SmtpSection,
    pub verification: VerificationSection,
    pub whois: WhoisSection,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkSection {
    pub request_timeout: Option<u64>,
    pub min_sleep: Option<f32>,
    pub max_sleep: Option<f32>,
    pub user_agents: Option<Vec<String>>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlSection {
    pub concurrency: Option<usize>,
    pub timeout: Option<u64>,
    pub max_pages: Option<usize>,
    pub max_link_depth: Option<u32>,
    pub max_links_per_page: Option<usize>,
    pub common_pages: Option<Vec<String>>,
    pub contact_tokens: Option<Vec<String>>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct DnsSection {
    pub dns_timeout: Option<u64>,
    pub dns_servers: Option<Vec<String>>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct SmtpSection {
    pub smtp_timeout: Option<u64>,
    pub smtp_sender_email: Option<String>,
    pub helo_name: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct VerificationSection {
    pub enable_mailbox_check: Option<bool>,
    pub max_concurrency: Option<usize>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct WhoisSection {
    pub enabled: Option<bool>,
    pub timeout: Option<u64>,
}
