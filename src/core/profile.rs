//! Domain profile: detected naming pattern, company name and registry data.

use crate::utils::domain::domain_label_title;
use crate::utils::patterns::DetectedPattern;
use crate::utils::whois::WhoisInfo;
use scraper::{Html, Selector};
use serde::Serialize;
use std::sync::LazyLock;

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static META_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta[name][content]").unwrap());
static LOGO_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img[alt][src]").unwrap());

const TITLE_NOISE: &[&str] = &["Homepage", "Home", "Welcome to", "Official Site"];
const OWNER_META_NAMES: &[&str] = &["author", "publisher", "owner"];

/// Where the company name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyNameSource {
    Whois,
    PageTitle,
    MetaTag,
    LogoAlt,
    DomainLabel,
}

#[derive(Debug, Clone, Serialize)]
pub struct DomainProfile {
    pub domain: String,
    pub pattern: DetectedPattern,
    pub company_name: String,
    pub company_name_source: CompanyNameSource,
    pub whois: Option<WhoisInfo>,
    /// Addresses seen while detecting the pattern, sorted.
    pub observed_emails: Vec<String>,
}

fn long_enough(s: &str) -> bool {
    s.chars().count() > 2
}

fn clean_title(raw: &str) -> String {
    let mut title = raw.to_string();
    for noise in TITLE_NOISE {
        title = title.replace(noise, "");
    }
    title
        .trim_matches(|c: char| c == ' ' || c == '|' || c == ':' || c == '-' || c.is_whitespace())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Looks for a company name in home-page markup: the cleaned `<title>`,
/// then an author/publisher/owner meta tag, then the alt text of a logo image.
pub fn company_name_from_html(html: &str) -> Option<(String, CompanyNameSource)> {
    let document = Html::parse_document(html);

    if let Some(title) = document.select(&TITLE_SELECTOR).next() {
        let title = clean_title(&title.text().collect::<String>());
        if long_enough(&title) {
            return Some((title, CompanyNameSource::PageTitle));
        }
    }

    for meta in document.select(&META_SELECTOR) {
        let name = meta.value().attr("name").unwrap_or_default().to_lowercase();
        if !OWNER_META_NAMES.contains(&name.as_str()) {
            continue;
        }
        let content = meta.value().attr("content").unwrap_or_default().trim();
        if long_enough(content) {
            return Some((content.to_string(), CompanyNameSource::MetaTag));
        }
    }

    document
        .select(&LOGO_SELECTOR)
        .filter(|img| {
            img.value()
                .attr("src")
                .is_some_and(|src| src.to_lowercase().contains("logo"))
        })
        .filter_map(|img| img.value().attr("alt").map(str::trim))
        .find(|alt| long_enough(alt))
        .map(|alt| (alt.to_string(), CompanyNameSource::LogoAlt))
}

/// Picks the company name: WHOIS organisation, then home-page hints, then the
/// title-cased first label of the domain.
pub(crate) fn infer_company_name(
    domain: &str,
    whois: Option<&WhoisInfo>,
    home_page: Option<&str>,
) -> (String, CompanyNameSource) {
    if let Some(org) = whois.and_then(|w| w.organization.as_deref()) {
        return (org.to_string(), CompanyNameSource::Whois);
    }
    if let Some(found) = home_page.and_then(company_name_from_html) {
        return found;
    }
    (domain_label_title(domain), CompanyNameSource::DomainLabel)
}
