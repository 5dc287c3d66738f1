//! Provides the `ConfigBuilder` for fluent configuration construction.

use super::loading::{apply_file_config, load_config_file};
use super::validation::validate_config;
use super::{Config, ConfigFile};
use crate::core::error::{AppError, Result};
use std::path::Path;
use std::time::Duration;

const DEFAULT_CONFIG_LOCATIONS: &[&str] = &["./email-hunter.toml", "./config.toml"];

/// Builder pattern for creating `Config` instances fluently.
///
/// Loads an optional file, applies overrides on top and validates the result.
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
    config_file_path: Option<String>,
    skip_default_locations: bool,
    overrides: ConfigFile,
}

impl ConfigBuilder {
    /// Creates a new builder with default configuration values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Specify an optional configuration file path to load.
    pub fn config_file(mut self, path: impl Into<String>) -> Self {
        self.config_file_path = Some(path.into());
        self
    }

    /// Do not probe `./email-hunter.toml` / `./config.toml` when no explicit file is set.
    pub fn skip_default_locations(mut self) -> Self {
        self.skip_default_locations = true;
        self
    }

    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.overrides.network.request_timeout = Some(duration.as_secs());
        self
    }
    pub fn sleep_between_requests(mut self, min: f32, max: f32) -> Self {
        self.overrides.network.min_sleep = Some(min);
        self.overrides.network.max_sleep = Some(max);
        self
    }
    pub fn user_agents(mut self, agents: Vec<String>) -> Self {
        self.overrides.network.user_agents = Some(agents);
        self
    }
    pub fn crawl_concurrency(mut self, value: usize) -> Self {
        self.overrides.crawl.concurrency = Some(value);
        self
    }
    pub fn crawl_timeout(mut self, duration: Duration) -> Self {
        self.overrides.crawl.timeout = Some(duration.as_secs());
        self
    }
    pub fn max_pages(mut self, value: usize) -> Self {
        self.overrides.crawl.max_pages = Some(value);
        self
    }
    pub fn max_link_depth(mut self, value: u32) -> Self {
        self.overrides.crawl.max_link_depth = Some(value);
        self
    }
    pub fn common_pages(mut self, pages: Vec<String>) -> Self {
        self.overrides.crawl.common_pages = Some(pages);
        self
    }
    pub fn dns_timeout(mut self, duration: Duration) -> Self {
        self.overrides.dns.dns_timeout = Some(duration.as_secs());
        self
    }
    pub fn dns_servers(mut self, servers: Vec<String>) -> Self {
        self.overrides.dns.dns_servers = Some(servers);
        self
    }
    pub fn smtp_timeout(mut self, duration: Duration) -> Self {
        self.overrides.smtp.smtp_timeout = Some(duration.as_secs());
        self
    }
    pub fn smtp_sender_email(mut self, value: impl Into<String>) -> Self {
        self.overrides.smtp.smtp_sender_email = Some(value.into());
        self
    }
    pub fn helo_name(mut self, value: impl Into<String>) -> Self {
        self.overrides.smtp.helo_name = Some(value.into());
        self
    }
    pub fn enable_mailbox_check(mut self, enable: bool) -> Self {
        self.overrides.verification.enable_mailbox_check = Some(enable);
        self
    }
    pub fn max_concurrency(mut self, value: usize) -> Self {
        self.overrides.verification.max_concurrency = Some(value);
        self
    }
    pub fn enable_whois(mut self, enable: bool) -> Self {
        self.overrides.whois.enabled = Some(enable);
        self
    }

    /// Builds the final `Config` object, applying defaults, file settings, overrides, and validation.
    pub fn build(mut self) -> Result<Config> {
        let mut loaded_path: Option<String> = None;

        if let Some(ref path) = self.config_file_path {
            match load_config_file(path) {
                Ok(file_config) => {
                    apply_file_config(&mut self.config, &file_config);
                    loaded_path = Some(path.clone());
                    tracing::info!("Loaded base configuration from specified file: {}", path);
                }
                Err(e) => {
                    tracing::error!("Failed to load specified config file '{}': {}", path, e);
                    return Err(AppError::Config(format!(
                        "Failed to load specified configuration file '{}': {}",
                        path, e
                    )));
                }
            }
        } else if !self.skip_default_locations {
            tracing::debug!("No config file specified, checking default locations.");
            for path_str in DEFAULT_CONFIG_LOCATIONS {
                if !Path::new(path_str).exists() {
                    continue;
                }
                match load_config_file(path_str) {
                    Ok(file_config) => {
                        apply_file_config(&mut self.config, &file_config);
                        loaded_path = Some(path_str.to_string());
                        tracing::info!(
                            "Loaded base configuration from default location: {}",
                            path_str
                        );
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load or parse default config '{}': {}", path_str, e);
                    }
                }
            }
            if loaded_path.is_none() {
                tracing::debug!("No configuration file found. Using default values and overrides.");
            }
        }

        apply_file_config(&mut self.config, &self.overrides);
        self.config.loaded_config_path = loaded_path;
        validate_config(&mut self.config)?;

        tracing::debug!("Final configuration built successfully.");
        Ok(self.config)
    }
}
