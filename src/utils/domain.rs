//! Utility functions for handling domain names and URLs.

use crate::core::error::{AppError, Result};
use url::Url;

/// Extracts the bare domain (e.g. "example.com") from a URL or domain string.
///
/// Adds an `https://` scheme when missing, takes the host, drops a leading
/// `www.` and lower-cases the result. Fails when no usable host remains.
pub(crate) fn get_domain_from_url(website_url_or_domain: &str) -> Result<String> {
    let trimmed_input = website_url_or_domain.trim();
    if trimmed_input.is_empty() {
        return Err(AppError::DomainExtraction(
            "Input string is empty".to_string(),
        ));
    }

    let url_str_with_scheme = if !trimmed_input.contains("://") {
        format!("https://{}", trimmed_input)
    } else {
        trimmed_input.to_string()
    };

    let url = match Url::parse(&url_str_with_scheme) {
        Ok(parsed_url) => parsed_url,
        Err(e) => {
            tracing::debug!(
                "Failed to parse '{}' as URL (original: '{}'): {}",
                url_str_with_scheme,
                trimmed_input,
                e
            );
            return Err(AppError::UrlParse(e));
        }
    };

    let host = url.host_str().ok_or_else(|| {
        AppError::DomainExtraction(format!("Could not extract host from parsed URL: {}", url))
    })?;

    let domain = host.strip_prefix("www.").unwrap_or(host).to_lowercase();

    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(AppError::DomainExtraction(format!(
            "Extracted domain appears invalid: {}",
            domain
        )));
    }

    tracing::trace!("Extracted domain '{}' from '{}'", domain, trimmed_input);
    Ok(domain)
}

/// The two crawl roots for a domain: the bare host and its `www.` variant, over HTTPS.
pub(crate) fn seed_urls(domain: &str) -> Vec<Url> {
    [format!("https://{}/", domain), format!("https://www.{}/", domain)]
        .iter()
        .filter_map(|s| Url::parse(s).ok())
        .collect()
}

/// Whether `url` belongs to `domain`: the host must equal the domain or be a
/// subdomain of it. `notacme.test` is not part of `acme.test`.
pub(crate) fn is_same_site(url: &Url, domain: &str) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.trim_end_matches('.').to_lowercase();
    let domain = domain.trim_end_matches('.').to_lowercase();
    host == domain || host.ends_with(&format!(".{}", domain))
}

/// Canonical string key for a page URL: no fragment, no trailing slash on non-root paths.
pub(crate) fn page_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }
    url.to_string()
}

/// Title-cases the leftmost label of a domain ("acme-corp.com" -> "Acme-corp").
pub(crate) fn domain_label_title(domain: &str) -> String {
    let label = domain.split('.').next().unwrap_or(domain);
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
