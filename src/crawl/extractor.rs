//! Pulls addresses and links out of page markup. No network access.

use crate::verification::format::is_valid_format;
use percent_encoding::percent_decode_str;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap()
});

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// A hyperlink found on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    /// Absolute target, resolved against the page URL.
    pub url: Url,
    /// Visible anchor text, whitespace-collapsed.
    pub text: String,
}

fn domain_matches(address: &str, domain: &str) -> bool {
    address
        .rsplit_once('@')
        .is_some_and(|(_, d)| d.eq_ignore_ascii_case(domain))
}

/// Collects the distinct addresses on `domain` found in `html`.
///
/// Literal `local@domain` text and `mailto:` link targets are both harvested.
/// Addresses on any other domain, subdomains and lookalike suffixes included,
/// are dropped. Results are lower-cased.
pub fn extract_emails(html: &str, domain: &str) -> HashSet<String> {
    let domain = domain.trim().trim_end_matches('.');
    let mut found: HashSet<String> = EMAIL_RE
        .find_iter(html)
        .map(|m| m.as_str().trim_end_matches('.'))
        .filter(|addr| domain_matches(addr, domain))
        .map(str::to_lowercase)
        .collect();

    let document = Html::parse_document(html);
    for element in document.select(&ANCHOR_SELECTOR) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        let Some(target) = href
            .get(..7)
            .filter(|scheme| scheme.eq_ignore_ascii_case("mailto:"))
            .map(|_| &href[7..])
        else {
            continue;
        };
        let target = target.split('?').next().unwrap_or_default();
        let decoded = percent_decode_str(target).decode_utf8_lossy();
        for candidate in decoded.split(',') {
            let candidate = candidate.trim().to_lowercase();
            if is_valid_format(&candidate) && domain_matches(&candidate, domain) {
                found.insert(candidate);
            } else if !candidate.is_empty() {
                tracing::trace!(target: "crawl_task", "Ignoring mailto target '{}'", candidate);
            }
        }
    }

    found
}

/// Lists the followable links in `html`, resolved against `base`.
/// `mailto:`, `tel:`, `javascript:` and fragment-only links are skipped.
pub fn extract_links(html: &str, base: &Url) -> Vec<PageLink> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();
    for element in document.select(&ANCHOR_SELECTOR) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        let lower = href.to_lowercase();
        if href.is_empty()
            || href.starts_with('#')
            || lower.starts_with("mailto:")
            || lower.starts_with("tel:")
            || lower.starts_with("javascript:")
        {
            continue;
        }
        let Ok(url) = base.join(href) else {
            tracing::trace!(target: "crawl_task", "Unresolvable href '{}' on {}", href, base);
            continue;
        };
        if url.scheme() != "http" && url.scheme() != "https" {
            continue;
        }
        let text = element
            .text()
            .collect::<Vec<_>>()
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        links.push(PageLink { url, text });
    }
    links
}
