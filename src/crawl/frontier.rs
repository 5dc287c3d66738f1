//! Bounded breadth-first traversal of a domain's contact pages.

use super::extractor::{extract_emails, extract_links};
use super::fetcher::{pick_user_agent, FetchOutcome, PageFetcher};
use super::throttle::HostThrottle;
use crate::core::config::Config;
use crate::utils::domain::{is_same_site, page_key, seed_urls};

use futures::stream::{FuturesUnordered, StreamExt};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use url::Url;

/// Slugs probed by the pattern-discovery pass.
const PROBE_SLUGS: &[&str] = &["contact", "about", "team"];

/// How much of the site a crawl covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPlan {
    /// Seeds, every configured slug, and contact-looking links one hop out.
    Full,
    /// Seeds plus the contact/about/team slugs. No link following.
    PatternProbe,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    pub url: Url,
    /// Seeds are depth 0.
    pub depth: u32,
    pub same_site: bool,
}

impl CrawlTarget {
    /// Visited-set key: no fragment, no trailing slash on non-root paths.
    pub fn key(&self) -> String {
        page_key(&self.url)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlReport {
    pub emails: HashSet<String>,
    pub pages_fetched: usize,
    pub pages_failed: usize,
    /// The deadline cut the crawl short; `emails` holds what was found until then.
    pub timed_out: bool,
}

/// Pending targets and every key ever scheduled.
struct Frontier {
    visited: HashSet<String>,
    queue: VecDeque<CrawlTarget>,
    max_pages: usize,
}

impl Frontier {
    fn schedule(&mut self, domain: &str, url: Url, depth: u32) -> bool {
        let target = CrawlTarget {
            same_site: is_same_site(&url, domain),
            url,
            depth,
        };
        if !target.same_site {
            tracing::trace!(target: "crawl_task", "Skipping off-site URL {}", target.url);
            return false;
        }
        if self.visited.len() >= self.max_pages {
            tracing::debug!(target: "crawl_task", "Page budget reached, not scheduling {}", target.url);
            return false;
        }
        if !self.visited.insert(target.key()) {
            return false;
        }
        self.queue.push_back(target);
        true
    }
}

/// A page fetched by a plan that does not follow links, kept so a later
/// [`CrawlPlan::Full`] pass over the same state can still expand it.
struct UnexpandedPage {
    target: CrawlTarget,
    final_url: Url,
    body: String,
}

/// Visited set, address accumulator and host throttle for one discovery run.
///
/// Shared by every fetch task of every crawl in that run, so a page is
/// fetched at most once per run even across crawl plans.
#[derive(Clone)]
pub struct CrawlState {
    domain: String,
    frontier: Arc<Mutex<Frontier>>,
    found: Arc<Mutex<HashSet<String>>>,
    unexpanded: Arc<Mutex<Vec<UnexpandedPage>>>,
    throttle: Arc<HostThrottle>,
}

impl CrawlState {
    pub fn new(domain: &str, max_pages: usize) -> Self {
        Self {
            domain: domain.to_lowercase(),
            frontier: Arc::new(Mutex::new(Frontier {
                visited: HashSet::new(),
                queue: VecDeque::new(),
                max_pages: max_pages.max(1),
            })),
            found: Arc::new(Mutex::new(HashSet::new())),
            unexpanded: Arc::new(Mutex::new(Vec::new())),
            throttle: Arc::new(HostThrottle::new()),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Queues `url` unless it is off-site, already scheduled, or over budget.
    /// The key is recorded here, before any fetch starts.
    pub fn schedule(&self, url: Url, depth: u32) -> bool {
        self.frontier.lock().schedule(&self.domain, url, depth)
    }

    fn next_target(&self) -> Option<CrawlTarget> {
        self.frontier.lock().queue.pop_front()
    }

    fn record(&self, emails: HashSet<String>) -> usize {
        let mut found = self.found.lock();
        let before = found.len();
        found.extend(emails);
        found.len() - before
    }

    fn defer_expansion(&self, page: UnexpandedPage) {
        self.unexpanded.lock().push(page);
    }

    fn take_unexpanded(&self) -> Vec<UnexpandedPage> {
        std::mem::take(&mut *self.unexpanded.lock())
    }

    pub fn emails(&self) -> HashSet<String> {
        self.found.lock().clone()
    }

    pub fn visited_count(&self) -> usize {
        self.frontier.lock().visited.len()
    }
}

#[derive(Default)]
struct CrawlStats {
    fetched: AtomicUsize,
    failed: AtomicUsize,
}

/// Drives fetches over a [`CrawlState`] with a bounded worker pool.
pub struct Crawler {
    fetcher: Arc<dyn PageFetcher>,
    config: Arc<Config>,
}

impl Crawler {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: Arc<Config>) -> Self {
        Self { fetcher, config }
    }

    /// Crawls `state`'s domain according to `plan` and returns everything
    /// the run has found so far. Never fails; hitting the crawl deadline
    /// returns partial results with `timed_out` set.
    pub async fn crawl(&self, state: &CrawlState, plan: CrawlPlan) -> CrawlReport {
        let domain = state.domain().to_string();
        tracing::info!(target: "crawl_task", "Starting {:?} crawl of {}", plan, domain);

        let seeds = seed_urls(&domain);
        for seed in &seeds {
            state.schedule(seed.clone(), 0);
        }
        let slugs: Vec<&str> = match plan {
            CrawlPlan::Full => self.config.common_pages.iter().map(String::as_str).collect(),
            CrawlPlan::PatternProbe => PROBE_SLUGS.to_vec(),
        };
        for seed in &seeds {
            for slug in &slugs {
                if let Ok(url) = seed.join(slug.trim_start_matches('/')) {
                    state.schedule(url, 1);
                }
            }
        }
        if plan == CrawlPlan::Full {
            for page in state.take_unexpanded() {
                self.follow_links(state, &page.target, &page.final_url, &page.body);
            }
        }

        let stats = CrawlStats::default();
        let concurrency = self.config.crawl_concurrency.max(1);
        let work = async {
            let mut in_flight = FuturesUnordered::new();
            loop {
                while in_flight.len() < concurrency {
                    match state.next_target() {
                        Some(target) => in_flight.push(self.visit(state, target, plan, &stats)),
                        None => break,
                    }
                }
                if in_flight.next().await.is_none() {
                    break;
                }
            }
        };

        let timed_out = tokio::time::timeout(self.config.crawl_timeout, work)
            .await
            .is_err();
        if timed_out {
            tracing::warn!(target: "crawl_task",
                "Crawl of {} hit the {:?} deadline; returning partial results", domain, self.config.crawl_timeout);
        }

        let report = CrawlReport {
            emails: state.emails(),
            pages_fetched: stats.fetched.load(Ordering::Relaxed),
            pages_failed: stats.failed.load(Ordering::Relaxed),
            timed_out,
        };
        tracing::info!(target: "crawl_task",
            "Crawl of {} done: {} page(s) fetched, {} failed, {} address(es)",
            domain, report.pages_fetched, report.pages_failed, report.emails.len());
        report
    }

    async fn visit(&self, state: &CrawlState, target: CrawlTarget, plan: CrawlPlan, stats: &CrawlStats) {
        let host = target.url.host_str().unwrap_or_default().to_string();
        state.throttle.wait_turn(&host, &self.config).await;

        let user_agent = pick_user_agent(&self.config);
        tracing::debug!(target: "crawl_task", "Fetching {} (depth {})", target.url, target.depth);
        let (final_url, body) = match self
            .fetcher
            .fetch(&target.url, user_agent, self.config.request_timeout)
            .await
        {
            FetchOutcome::Page { final_url, body } => (final_url, body),
            FetchOutcome::HttpStatus(code) => {
                tracing::debug!(target: "crawl_task", "{} answered HTTP {}", target.url, code);
                stats.failed.fetch_add(1, Ordering::Relaxed);
                return;
            }
            FetchOutcome::Failed(reason) => {
                tracing::warn!(target: "crawl_task", "Fetch failed for {}: {}", target.url, reason);
                stats.failed.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };
        stats.fetched.fetch_add(1, Ordering::Relaxed);

        let new = state.record(extract_emails(&body, state.domain()));
        if new > 0 {
            tracing::debug!(target: "crawl_task", "{} new address(es) on {}", new, target.url);
        }

        if target.depth >= self.config.max_link_depth {
            return;
        }
        if plan != CrawlPlan::Full {
            state.defer_expansion(UnexpandedPage {
                target,
                final_url,
                body,
            });
            return;
        }
        self.follow_links(state, &target, &final_url, &body);
    }

    /// Queues same-site links from `body` whose URL or text looks like a contact page.
    fn follow_links(&self, state: &CrawlState, target: &CrawlTarget, final_url: &Url, body: &str) {
        if target.depth >= self.config.max_link_depth {
            return;
        }
        let tokens = &self.config.contact_tokens;
        let followed = extract_links(body, final_url)
            .into_iter()
            .filter(|link| is_same_site(&link.url, state.domain()))
            .filter(|link| {
                let href = link.url.as_str().to_lowercase();
                let text = link.text.to_lowercase();
                tokens.iter().any(|t| href.contains(t.as_str()) || text.contains(t.as_str()))
            })
            .take(self.config.max_links_per_page)
            .filter(|link| state.schedule(link.url.clone(), target.depth + 1))
            .count();
        if followed > 0 {
            tracing::debug!(target: "crawl_task", "Queued {} contact link(s) from {}", followed, target.url);
        }
    }
}
