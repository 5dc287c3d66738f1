//! # Email Hunter Core Library
//!
//! Discovers professional email addresses for a domain by crawling its public
//! pages, inferring the organisation's address pattern, and checking candidate
//! addresses against DNS and (optionally) the domain's mail servers.
//!
//! It is designed to be used either directly as a library or via the
//! `email-hunter` command-line tool (which uses this library).

mod core;
pub mod crawl;
pub mod utils;
pub mod verification;

pub use crate::core::config::{Config, ConfigBuilder, ConfigFile};
pub use crate::core::error::{AppError, Result};
pub use crate::core::hunter::EmailHunter;
pub use crate::core::models::{
    CandidateSource, EmailCandidate, FindOneRequest, LookupResult, CONFIDENCE_ALTERNATE_PATTERN,
    CONFIDENCE_GUESS, CONFIDENCE_PATTERN, CONFIDENCE_WEBSITE, CONFIDENCE_WEBSITE_UNPARSED,
};
pub use crate::core::profile::{company_name_from_html, CompanyNameSource, DomainProfile};
pub use crate::crawl::{FetchOutcome, HttpFetcher, PageFetcher};
pub use crate::utils::dns::{DnsOutcome, MailResolver, MailServer, NegativeAnswer};
pub use crate::utils::patterns::{DetectedPattern, Pattern};
pub use crate::utils::smtp::{MailboxProber, ProbeOutcome};
pub use crate::utils::whois::{WhoisInfo, WhoisLookup};
pub use crate::verification::{DomainCheck, MailboxStatus, Verdict, VerificationResult, Verifier};

use crate::utils::smtp::test_smtp_connectivity;
use futures::stream::{FuturesUnordered, StreamExt};

/// Builds an [`EmailHunter`] backed by the real HTTP, DNS, SMTP and WHOIS clients.
pub async fn initialize_hunter(config: Config) -> Result<EmailHunter> {
    EmailHunter::new(config).await
}

/// Performs an early check for outbound SMTP connectivity.
pub async fn check_smtp_connectivity(config: &Config) -> Result<()> {
    test_smtp_connectivity(config).await
}

/// Every address found on `domain`'s own pages.
pub async fn find_bulk(hunter: &EmailHunter, domain: &str) -> Result<Vec<EmailCandidate>> {
    hunter.find_bulk(domain).await
}

/// The single best address for one person at a domain.
pub async fn find_one(hunter: &EmailHunter, request: &FindOneRequest) -> Result<EmailCandidate> {
    hunter.find_one(request).await
}

pub async fn verify_email(hunter: &EmailHunter, address: &str) -> VerificationResult {
    hunter.verify_email(address).await
}

pub async fn domain_profile(hunter: &EmailHunter, domain: &str) -> Result<DomainProfile> {
    hunter.domain_profile(domain).await
}

/// Runs [`EmailHunter::find_one`] for every request, at most
/// `config.max_concurrency` at a time.
///
/// Returns exactly one [`LookupResult`] per request, in input order. Requests
/// missing a domain or both names are answered without spawning a task.
pub async fn process_lookups(
    hunter: &EmailHunter,
    requests: Vec<FindOneRequest>,
) -> Vec<LookupResult> {
    let total = requests.len();
    if total == 0 {
        return Vec::new();
    }
    let max_concurrency = hunter.config().max_concurrency.max(1);

    let mut slots: Vec<Option<LookupResult>> = vec![None; total];
    let mut tasks = FuturesUnordered::new();

    for (index, request) in requests.iter().enumerate() {
        if let Err(reason) = validate_request(request) {
            tracing::warn!(target: "find_one_task",
                "Skipping request #{} for '{}': {}", index, request.domain, reason);
            slots[index] = Some(LookupResult::failed(request.clone(), reason));
            continue;
        }

        while tasks.len() >= max_concurrency {
            match tasks.next().await {
                Some(joined) => store_joined(&mut slots, joined),
                None => {
                    tracing::warn!("Task queue unexpectedly empty while limiting concurrency.");
                    break;
                }
            }
        }

        let hunter = hunter.clone();
        let request = request.clone();
        tasks.push(tokio::spawn(async move {
            let result = match hunter.find_one(&request).await {
                Ok(candidate) => LookupResult::found(request, candidate),
                Err(e) => {
                    tracing::warn!(target: "find_one_task",
                        "Lookup for '{}' failed: {}", request.domain, e);
                    LookupResult::failed(request, e.to_string())
                }
            };
            (index, result)
        }));
    }

    while let Some(joined) = tasks.next().await {
        store_joined(&mut slots, joined);
    }

    slots
        .into_iter()
        .zip(requests)
        .map(|(slot, request)| {
            slot.unwrap_or_else(|| {
                LookupResult::failed(request, "Lookup task did not complete".to_string())
            })
        })
        .collect()
}

fn store_joined(
    slots: &mut [Option<LookupResult>],
    joined: std::result::Result<(usize, LookupResult), tokio::task::JoinError>,
) {
    match joined {
        Ok((index, result)) => slots[index] = Some(result),
        Err(e) => tracing::error!("A lookup task failed to join: {}", e),
    }
}

fn validate_request(request: &FindOneRequest) -> std::result::Result<(), String> {
    let present = |value: &Option<String>| value.as_deref().is_some_and(|s| !s.trim().is_empty());

    let mut missing_parts = Vec::new();
    if request.domain.trim().is_empty() {
        missing_parts.push("domain");
    }
    if !present(&request.first_name) && !present(&request.last_name) {
        missing_parts.push("first or last name");
    }
    if missing_parts.is_empty() {
        Ok(())
    } else {
        Err(format!("Missing {}", missing_parts.join(", ")))
    }
}
