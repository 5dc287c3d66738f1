//! WHOIS registry lookups used by domain profiling.

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use whois_rust::{WhoIs, WhoIsLookupOptions};

const FALLBACK_SERVERS: &str = r#"{
    "com": "whois.verisign-grs.com",
    "net": "whois.verisign-grs.com",
    "org": "whois.pir.org",
    "io": "whois.nic.io",
    "edu": "whois.educause.edu",
    "": "whois.iana.org"
}"#;

/// Fetches the raw WHOIS text for a domain. `None` when nothing usable came back.
#[async_trait]
pub trait WhoisLookup: Send + Sync {
    async fn lookup(&self, domain: &str) -> Option<String>;
}

/// [`WhoisLookup`] backed by the `whois-rust` client.
pub struct WhoisRustLookup {
    client: Option<Arc<WhoIs>>,
    timeout: Duration,
}

impl WhoisRustLookup {
    pub fn new(timeout: Duration) -> Self {
        let client = WhoIs::from_path("whois-servers.json")
            .or_else(|_| WhoIs::from_string(FALLBACK_SERVERS))
            .map_err(|e| tracing::warn!("WHOIS client unavailable: {}", e))
            .ok()
            .map(Arc::new);
        Self { client, timeout }
    }
}

#[async_trait]
impl WhoisLookup for WhoisRustLookup {
    async fn lookup(&self, domain: &str) -> Option<String> {
        let whois = Arc::clone(self.client.as_ref()?);
        let options = match WhoIsLookupOptions::from_string(domain) {
            Ok(options) => options,
            Err(e) => {
                tracing::debug!("Invalid domain for WHOIS lookup '{}': {}", domain, e);
                return None;
            }
        };

        match tokio::time::timeout(
            self.timeout,
            tokio::task::spawn_blocking(move || whois.lookup(options)),
        )
        .await
        {
            Ok(Ok(Ok(text))) => {
                tracing::debug!("WHOIS lookup successful for {}", domain);
                Some(text)
            }
            Ok(Ok(Err(e))) => {
                tracing::debug!("WHOIS lookup failed for {}: {}", domain, e);
                None
            }
            Ok(Err(_)) => {
                tracing::warn!("WHOIS lookup task panicked for {}", domain);
                None
            }
            Err(_) => {
                tracing::debug!("WHOIS lookup timed out for {}", domain);
                None
            }
        }
    }
}

/// Registry metadata pulled out of raw WHOIS text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WhoisInfo {
    pub registrar: Option<String>,
    pub creation_date: Option<String>,
    pub expiration_date: Option<String>,
    pub updated_date: Option<String>,
    pub name_servers: Vec<String>,
    pub organization: Option<String>,
}

static REGISTRAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*(?:Registrar|Sponsoring Registrar|Registrar Name):\s*(.+)$").unwrap()
});
static CREATED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*(?:Creation Date|Created On|Created|Registered on):\s*(.+)$").unwrap()
});
static EXPIRES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^\s*(?:Registry Expiry Date|Registrar Registration Expiration Date|Expiration Date|Expiry Date|Expires On|Expires):\s*(.+)$",
    )
    .unwrap()
});
static UPDATED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*(?:Updated Date|Last Updated On|Last Modified|Changed):\s*(.+)$").unwrap()
});
static NAME_SERVER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*(?:Name Server|nserver):\s*(\S+)").unwrap()
});
static ORG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*(?:Registrant Organization|Organization|OrgName|org-name|organisation|Registrant):\s*(.+)$")
        .unwrap()
});

const PLACEHOLDERS: &[&str] = &[
    "redacted",
    "data protected",
    "not disclosed",
    "privacy",
    "withheld",
];

fn is_placeholder(value: &str) -> bool {
    let lower = value.to_lowercase();
    lower == "n/a" || lower == "none" || PLACEHOLDERS.iter().any(|p| lower.contains(p))
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures_iter(text)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().trim().to_string()))
        .find(|v| !v.is_empty() && !is_placeholder(v))
}

/// Parses the fields we care about. Redacted values are treated as absent.
pub fn parse_whois(raw: &str) -> WhoisInfo {
    let mut name_servers: Vec<String> = Vec::new();
    for cap in NAME_SERVER_RE.captures_iter(raw) {
        if let Some(ns) = cap.get(1) {
            let ns = ns.as_str().trim_end_matches('.').to_lowercase();
            if !ns.is_empty() && !name_servers.contains(&ns) {
                name_servers.push(ns);
            }
        }
    }

    WhoisInfo {
        registrar: first_capture(&REGISTRAR_RE, raw),
        creation_date: first_capture(&CREATED_RE, raw),
        expiration_date: first_capture(&EXPIRES_RE, raw),
        updated_date: first_capture(&UPDATED_RE, raw),
        name_servers,
        organization: first_capture(&ORG_RE, raw),
    }
}
