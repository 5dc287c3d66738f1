//! DNS lookups for mail routing.
//!
//! The resolver reports expected failures as a [`DnsOutcome`] so callers can
//! tell an authoritative "this domain has no such records" apart from a
//! timeout or SERVFAIL.

use crate::core::config::Config;
use crate::core::error::{AppError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::net::IpAddr;
use std::time::Duration;
use trust_dns_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};
use trust_dns_resolver::proto::op::ResponseCode;
use trust_dns_resolver::TokioAsyncResolver;

/// One MX record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailServer {
    /// Exchange host name without the trailing dot.
    pub exchange: String,
    pub preference: u16,
}

/// Authoritative reasons a lookup produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegativeAnswer {
    NxDomain,
    NoAnswer,
    NoNameservers,
}

impl std::fmt::Display for NegativeAnswer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NegativeAnswer::NxDomain => write!(f, "domain does not exist (NXDOMAIN)"),
            NegativeAnswer::NoAnswer => write!(f, "no records of the requested type"),
            NegativeAnswer::NoNameservers => write!(f, "no nameservers could answer"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DnsOutcome<T> {
    /// At least one record was returned.
    Records(T),
    Negative(NegativeAnswer),
    /// Timeout, SERVFAIL or I/O trouble. Says nothing about the domain.
    Transient(String),
}

/// Resolves the record sets the verifier needs.
#[async_trait]
pub trait MailResolver: Send + Sync {
    async fn mx_records(&self, domain: &str) -> DnsOutcome<Vec<MailServer>>;
    async fn a_records(&self, domain: &str) -> DnsOutcome<Vec<IpAddr>>;
}

/// [`MailResolver`] backed by trust-dns.
pub struct TrustDnsResolver {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl TrustDnsResolver {
    pub fn new(resolver: TokioAsyncResolver, timeout: Duration) -> Self {
        Self { resolver, timeout }
    }
}

/// Creates the async resolver from the configured nameservers, or from the
/// system configuration when the list is empty.
pub(crate) fn create_resolver(config: &Config) -> Result<TokioAsyncResolver> {
    let mut opts = ResolverOpts::default();
    opts.timeout = config.dns_timeout;
    opts.attempts = 2;

    if config.dns_servers.is_empty() {
        tracing::debug!(target: "dns_task", "Using system DNS configuration");
        return TokioAsyncResolver::tokio_from_system_conf().map_err(|e| {
            AppError::Initialization(format!("Failed to read system DNS configuration: {}", e))
        });
    }

    let ips: Vec<IpAddr> = config
        .dns_servers
        .iter()
        .filter_map(|s| match s.trim().parse::<IpAddr>() {
            Ok(ip) => Some(ip),
            Err(_) => {
                tracing::warn!(target: "dns_task", "Ignoring invalid DNS server address '{}'", s);
                None
            }
        })
        .collect();
    if ips.is_empty() {
        return Err(AppError::Initialization(
            "No valid DNS server addresses configured".to_string(),
        ));
    }

    let group = NameServerConfigGroup::from_ips_clear(&ips, 53, true);
    let resolver_config = ResolverConfig::from_parts(None, vec![], group);
    tracing::debug!(target: "dns_task", "Using DNS servers: {:?}", ips);
    Ok(TokioAsyncResolver::tokio(resolver_config, opts))
}

fn classify_resolve_error<T>(domain: &str, error: &ResolveError) -> DnsOutcome<T> {
    match error.kind() {
        ResolveErrorKind::NoRecordsFound { response_code, .. } => match *response_code {
            ResponseCode::NXDomain => DnsOutcome::Negative(NegativeAnswer::NxDomain),
            ResponseCode::NoError => DnsOutcome::Negative(NegativeAnswer::NoAnswer),
            other => DnsOutcome::Transient(format!("{} answered {}", domain, other)),
        },
        ResolveErrorKind::NoConnections => DnsOutcome::Negative(NegativeAnswer::NoNameservers),
        _ => DnsOutcome::Transient(error.to_string()),
    }
}

#[async_trait]
impl MailResolver for TrustDnsResolver {
    async fn mx_records(&self, domain: &str) -> DnsOutcome<Vec<MailServer>> {
        tracing::debug!(target: "dns_task", "Looking up MX records for {}", domain);
        let lookup = match tokio::time::timeout(self.timeout, self.resolver.mx_lookup(domain)).await
        {
            Err(_) => {
                tracing::warn!(target: "dns_task", "MX lookup for {} timed out", domain);
                return DnsOutcome::Transient(format!("MX lookup for {} timed out", domain));
            }
            Ok(Err(e)) => {
                let outcome = classify_resolve_error(domain, &e);
                tracing::debug!(target: "dns_task", "MX lookup for {} failed: {}", domain, e);
                return outcome;
            }
            Ok(Ok(lookup)) => lookup,
        };

        let mut servers: Vec<MailServer> = lookup
            .iter()
            .map(|mx| MailServer {
                exchange: mx.exchange().to_utf8().trim_end_matches('.').to_string(),
                preference: mx.preference(),
            })
            .filter(|mx| !mx.exchange.is_empty())
            .collect();
        if servers.is_empty() {
            return DnsOutcome::Negative(NegativeAnswer::NoAnswer);
        }
        servers.sort_by_key(|mx| mx.preference);
        tracing::debug!(target: "dns_task", "{} has {} MX record(s)", domain, servers.len());
        DnsOutcome::Records(servers)
    }

    async fn a_records(&self, domain: &str) -> DnsOutcome<Vec<IpAddr>> {
        tracing::debug!(target: "dns_task", "Looking up address records for {}", domain);
        match tokio::time::timeout(self.timeout, self.resolver.lookup_ip(domain)).await {
            Err(_) => {
                tracing::warn!(target: "dns_task", "Address lookup for {} timed out", domain);
                DnsOutcome::Transient(format!("Address lookup for {} timed out", domain))
            }
            Ok(Err(e)) => {
                tracing::debug!(target: "dns_task", "Address lookup for {} failed: {}", domain, e);
                classify_resolve_error(domain, &e)
            }
            Ok(Ok(lookup)) => {
                let ips: Vec<IpAddr> = lookup.iter().collect();
                if ips.is_empty() {
                    DnsOutcome::Negative(NegativeAnswer::NoAnswer)
                } else {
                    DnsOutcome::Records(ips)
                }
            }
        }
    }
}
