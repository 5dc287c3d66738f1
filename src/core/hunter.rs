//! The discovery orchestrator.

use crate::core::config::Config;
use crate::core::error::{AppError, Result};
use crate::core::models::{
    CandidateSource, EmailCandidate, FindOneRequest, CONFIDENCE_ALTERNATE_PATTERN,
    CONFIDENCE_GUESS, CONFIDENCE_PATTERN, CONFIDENCE_WEBSITE, CONFIDENCE_WEBSITE_UNPARSED,
};
use crate::core::profile::{infer_company_name, DomainProfile};
use crate::crawl::{CrawlPlan, CrawlState, Crawler, FetchOutcome, HttpFetcher, PageFetcher};
use crate::utils::dns::{create_resolver, MailResolver, TrustDnsResolver};
use crate::utils::domain::{get_domain_from_url, seed_urls};
use crate::utils::patterns::{
    detect_pattern, generate_address, sanitize_name_part, split_name, DetectedPattern, Pattern,
};
use crate::utils::smtp::{MailboxProber, SmtpProber};
use crate::utils::whois::{parse_whois, WhoisLookup, WhoisRustLookup};
use crate::verification::{DomainCheck, VerificationResult, Verifier};

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;

/// Finds, guesses and verifies addresses for a domain.
///
/// Cloning is cheap and every operation owns its own [`DiscoveryRun`], so one
/// hunter can serve concurrent lookups for different domains.
#[derive(Clone)]
pub struct EmailHunter {
    config: Arc<Config>,
    fetcher: Arc<dyn PageFetcher>,
    crawler: Arc<Crawler>,
    verifier: Verifier,
    whois: Arc<dyn WhoisLookup>,
}

impl EmailHunter {
    /// Builds the hunter with the real HTTP, DNS, SMTP and WHOIS clients.
    pub async fn new(config: Config) -> Result<Self> {
        tracing::debug!("Initializing EmailHunter components...");
        let fetcher = Arc::new(HttpFetcher::new(&config)?);
        let resolver = Arc::new(TrustDnsResolver::new(
            create_resolver(&config)?,
            config.dns_timeout,
        ));
        tracing::debug!("DNS resolver initialized.");
        let config = Arc::new(config);
        let prober = Arc::new(SmtpProber::new(Arc::clone(&config)));
        let whois = Arc::new(WhoisRustLookup::new(config.whois_timeout));

        tracing::info!("EmailHunter initialized successfully.");
        Ok(Self::assemble(config, fetcher, resolver, prober, whois))
    }

    /// Builds the hunter over caller-supplied capabilities.
    pub fn from_parts(
        config: Config,
        fetcher: Arc<dyn PageFetcher>,
        resolver: Arc<dyn MailResolver>,
        prober: Arc<dyn MailboxProber>,
        whois: Arc<dyn WhoisLookup>,
    ) -> Self {
        Self::assemble(Arc::new(config), fetcher, resolver, prober, whois)
    }

    fn assemble(
        config: Arc<Config>,
        fetcher: Arc<dyn PageFetcher>,
        resolver: Arc<dyn MailResolver>,
        prober: Arc<dyn MailboxProber>,
        whois: Arc<dyn WhoisLookup>,
    ) -> Self {
        Self {
            crawler: Arc::new(Crawler::new(Arc::clone(&fetcher), Arc::clone(&config))),
            verifier: Verifier::new(resolver, prober, Arc::clone(&config)),
            config,
            fetcher,
            whois,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Crawls `domain` and returns every address found on it, each with a
    /// guessed name. Only a malformed domain is an error.
    pub async fn find_bulk(&self, domain: &str) -> Result<Vec<EmailCandidate>> {
        let domain = validate_domain(domain)?;
        let run = DiscoveryRun::new(&domain, &self.config);
        Ok(run.bulk_candidates(self).await)
    }

    /// Targeted lookup of one person.
    ///
    /// Tries the detected (or supplied) pattern, then the other built-in
    /// patterns, then names found by a full crawl, and finally returns the
    /// unverified pattern guess. Only invalid input is an error.
    pub async fn find_one(&self, request: &FindOneRequest) -> Result<EmailCandidate> {
        let domain = validate_domain(&request.domain)?;
        let first = request.first_name.clone().unwrap_or_default();
        let last = request.last_name.clone().unwrap_or_default();
        let first_norm = sanitize_name_part(&first);
        let last_norm = sanitize_name_part(&last);
        if first_norm.is_empty() && last_norm.is_empty() {
            return Err(AppError::InvalidInput(
                "At least one of first or last name is required".to_string(),
            ));
        }
        let supplied: Option<Pattern> = request
            .pattern
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(str::parse::<Pattern>)
            .transpose()?;

        let task_label = format!("{} {}@{}", first.trim(), last.trim(), domain);
        tracing::info!(target: "find_one_task", "[{}] Starting lookup", task_label);
        let start = Instant::now();
        let run = DiscoveryRun::new(&domain, &self.config);

        let pattern = match supplied {
            Some(pattern) => pattern,
            None => run.detected_pattern(self).await.pattern,
        };
        let names = (Some(first.trim().to_string()), Some(last.trim().to_string()));
        let build = |address: &str, source, confidence| {
            EmailCandidate::new(address, source, confidence)
                .with_names(names.0.clone(), names.1.clone())
                .with_position(request.position.clone())
        };

        let primary = generate_address(pattern, &first, &last, &domain);
        let check = run.domain_check(self).await;
        if self.verifier.verify_against(&primary, check, false).await.is_valid() {
            tracing::info!(target: "find_one_task",
                "[{}] {} passes the domain check ({:?})", task_label, primary, start.elapsed());
            return Ok(build(&primary, CandidateSource::Pattern, CONFIDENCE_PATTERN).verified(true));
        }

        let mut tried: HashSet<String> = HashSet::from([primary.clone()]);
        let alternates = if check.is_reachable() {
            Pattern::BUILTIN_ORDER.to_vec()
        } else {
            tracing::debug!(target: "find_one_task",
                "[{}] {} cannot receive mail; skipping alternate patterns", task_label, domain);
            Vec::new()
        };
        for alternate in alternates.into_iter().filter(|p| *p != pattern) {
            let address = generate_address(alternate, &first, &last, &domain);
            if !tried.insert(address.clone()) {
                continue;
            }
            if self.verifier.verify_against(&address, check, false).await.is_valid() {
                tracing::info!(target: "find_one_task",
                    "[{}] Alternate pattern {} gives {}", task_label, alternate, address);
                return Ok(
                    build(&address, CandidateSource::Pattern, CONFIDENCE_ALTERNATE_PATTERN)
                        .verified(true),
                );
            }
        }

        tracing::debug!(target: "find_one_task",
            "[{}] No pattern passed the domain check; crawling for a name match", task_label);
        let crawled = run.bulk_candidates(self).await;
        if let Some(found) = crawled
            .into_iter()
            .find(|c| name_matches(c, &first_norm, &last_norm))
        {
            tracing::info!(target: "find_one_task",
                "[{}] Matched crawled address {}", task_label, found.address);
            let position = found.position.clone().or_else(|| request.position.clone());
            return Ok(found.with_position(position));
        }

        tracing::info!(target: "find_one_task",
            "[{}] Falling back to unverified guess {} ({:?})", task_label, primary, start.elapsed());
        Ok(build(&primary, CandidateSource::Guess, CONFIDENCE_GUESS))
    }

    /// Runs every verification stage on `address`. Never fails; inspect the verdict.
    pub async fn verify_email(&self, address: &str) -> VerificationResult {
        tracing::info!(target: "verify_task", "Verifying <{}>", address.trim());
        self.verifier.verify(address).await
    }

    /// Detected pattern, company name and WHOIS data for `domain`.
    pub async fn domain_profile(&self, domain: &str) -> Result<DomainProfile> {
        let domain = validate_domain(domain)?;
        let run = DiscoveryRun::new(&domain, &self.config);
        Ok(run.profile(self).await.clone())
    }

    async fn fetch_home_page(&self, domain: &str) -> Option<String> {
        for url in seed_urls(domain) {
            let user_agent = crate::crawl::fetcher::pick_user_agent(&self.config);
            match self
                .fetcher
                .fetch(&url, user_agent, self.config.request_timeout)
                .await
            {
                FetchOutcome::Page { body, .. } => return Some(body),
                other => {
                    tracing::debug!("Home page {} unavailable: {:?}", url, other);
                }
            }
        }
        None
    }
}

fn validate_domain(domain: &str) -> Result<String> {
    get_domain_from_url(domain)
        .map_err(|e| AppError::InvalidInput(format!("Invalid domain '{}': {}", domain.trim(), e)))
}

/// A requested non-empty name component must occur in the candidate's.
fn name_matches(candidate: &EmailCandidate, first: &str, last: &str) -> bool {
    let contains = |have: &Option<String>, want: &str| {
        !want.is_empty()
            && have
                .as_deref()
                .is_some_and(|h| h.to_lowercase().contains(want))
    };
    contains(&candidate.first_name, first) || contains(&candidate.last_name, last)
}

/// Turns crawled addresses into scored candidates, sorted by address.
fn website_candidates(emails: HashSet<String>) -> Vec<EmailCandidate> {
    let mut emails: Vec<String> = emails.into_iter().collect();
    emails.sort();
    emails
        .into_iter()
        .map(|address| {
            let local = address.split('@').next().unwrap_or_default().to_string();
            match split_name(&local) {
                Some((first, last)) => {
                    EmailCandidate::new(&address, CandidateSource::Website, CONFIDENCE_WEBSITE)
                        .with_names(Some(first), Some(last))
                }
                None => EmailCandidate::new(
                    &address,
                    CandidateSource::Website,
                    CONFIDENCE_WEBSITE_UNPARSED,
                ),
            }
        })
        .collect()
}

/// State owned by a single public operation: the crawl's visited set and
/// address accumulator plus lazily computed per-domain facts.
pub(crate) struct DiscoveryRun {
    domain: String,
    crawl: CrawlState,
    pattern: OnceCell<DetectedPattern>,
    domain_check: OnceCell<DomainCheck>,
    profile: OnceCell<DomainProfile>,
}

impl DiscoveryRun {
    pub(crate) fn new(domain: &str, config: &Config) -> Self {
        Self {
            domain: domain.to_string(),
            crawl: CrawlState::new(domain, config.max_pages),
            pattern: OnceCell::new(),
            domain_check: OnceCell::new(),
            profile: OnceCell::new(),
        }
    }

    async fn bulk_candidates(&self, hunter: &EmailHunter) -> Vec<EmailCandidate> {
        let report = hunter.crawler.crawl(&self.crawl, CrawlPlan::Full).await;
        let candidates = website_candidates(report.emails);
        tracing::info!(target: "crawl_task",
            "{} candidate(s) found on {}", candidates.len(), self.domain);
        candidates
    }

    async fn detected_pattern(&self, hunter: &EmailHunter) -> &DetectedPattern {
        self.pattern
            .get_or_init(|| async {
                let report = hunter
                    .crawler
                    .crawl(&self.crawl, CrawlPlan::PatternProbe)
                    .await;
                detect_pattern(&report.emails)
            })
            .await
    }

    async fn domain_check(&self, hunter: &EmailHunter) -> &DomainCheck {
        self.domain_check
            .get_or_init(|| hunter.verifier.check_domain(&self.domain))
            .await
    }

    async fn profile(&self, hunter: &EmailHunter) -> &DomainProfile {
        self.profile
            .get_or_init(|| async {
                let pattern = *self.detected_pattern(hunter).await;
                let whois = if hunter.config.enable_whois {
                    hunter.whois.lookup(&self.domain).await.map(|raw| parse_whois(&raw))
                } else {
                    None
                };
                let home_page = if whois.as_ref().and_then(|w| w.organization.as_ref()).is_some() {
                    None
                } else {
                    hunter.fetch_home_page(&self.domain).await
                };
                let (company_name, company_name_source) =
                    infer_company_name(&self.domain, whois.as_ref(), home_page.as_deref());
                let mut observed_emails: Vec<String> = self.crawl.emails().into_iter().collect();
                observed_emails.sort();
                DomainProfile {
                    domain: self.domain.clone(),
                    pattern,
                    company_name,
                    company_name_source,
                    whois,
                    observed_emails,
                }
            })
            .await
    }
}
