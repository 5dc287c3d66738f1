//! In-memory capabilities for driving the hunter without network access.
#![allow(dead_code)]

use async_trait::async_trait;
use email_hunter_core::{
    Config, DnsOutcome, EmailHunter, FetchOutcome, MailResolver, MailServer, MailboxProber,
    NegativeAnswer, PageFetcher, ProbeOutcome, WhoisLookup,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Config with no politeness delay and short deadlines.
pub fn fast_config() -> Config {
    Config {
        sleep_between_requests: (0.0, 0.0),
        crawl_timeout: Duration::from_secs(5),
        request_timeout: Duration::from_secs(2),
        ..Config::default()
    }
}

/// Serves fixed bodies by exact URL and answers 404 for everything else.
#[derive(Default)]
pub struct SiteFetcher {
    pages: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl SiteFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().clone()
    }
}

#[async_trait]
impl PageFetcher for SiteFetcher {
    async fn fetch(&self, url: &Url, _user_agent: &str, _timeout: Duration) -> FetchOutcome {
        self.requested.lock().push(url.to_string());
        match self.pages.get(url.as_str()) {
            Some(body) => FetchOutcome::Page {
                final_url: url.clone(),
                body: body.clone(),
            },
            None => FetchOutcome::HttpStatus(404),
        }
    }
}

/// Answers from fixed tables; unknown domains are NXDOMAIN.
#[derive(Default)]
pub struct TableResolver {
    mx: HashMap<String, DnsOutcome<Vec<MailServer>>>,
    a: HashMap<String, DnsOutcome<Vec<IpAddr>>>,
}

impl TableResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mx(mut self, domain: &str, exchange: &str) -> Self {
        self.mx.insert(
            domain.to_string(),
            DnsOutcome::Records(vec![MailServer {
                exchange: exchange.to_string(),
                preference: 10,
            }]),
        );
        self
    }

    pub fn no_mx(mut self, domain: &str) -> Self {
        self.mx.insert(
            domain.to_string(),
            DnsOutcome::Negative(NegativeAnswer::NoAnswer),
        );
        self
    }

    pub fn a(mut self, domain: &str) -> Self {
        self.a.insert(
            domain.to_string(),
            DnsOutcome::Records(vec![IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10))]),
        );
        self
    }

    pub fn no_a(mut self, domain: &str) -> Self {
        self.a.insert(
            domain.to_string(),
            DnsOutcome::Negative(NegativeAnswer::NoAnswer),
        );
        self
    }

    pub fn mx_transient(mut self, domain: &str) -> Self {
        self.mx.insert(
            domain.to_string(),
            DnsOutcome::Transient("SERVFAIL".to_string()),
        );
        self
    }
}

#[async_trait]
impl MailResolver for TableResolver {
    async fn mx_records(&self, domain: &str) -> DnsOutcome<Vec<MailServer>> {
        self.mx
            .get(domain)
            .cloned()
            .unwrap_or(DnsOutcome::Negative(NegativeAnswer::NxDomain))
    }

    async fn a_records(&self, domain: &str) -> DnsOutcome<Vec<IpAddr>> {
        self.a
            .get(domain)
            .cloned()
            .unwrap_or(DnsOutcome::Negative(NegativeAnswer::NxDomain))
    }
}

/// Returns a fixed outcome per address; anything else is inconclusive.
#[derive(Default)]
pub struct ScriptedProber {
    answers: HashMap<String, ProbeOutcome>,
    probes: Mutex<Vec<(String, String)>>,
}

impl ScriptedProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, address: &str, outcome: ProbeOutcome) -> Self {
        self.answers.insert(address.to_string(), outcome);
        self
    }

    /// `(host, address)` pairs in probe order.
    pub fn probes(&self) -> Vec<(String, String)> {
        self.probes.lock().clone()
    }
}

#[async_trait]
impl MailboxProber for ScriptedProber {
    async fn probe(&self, host: &str, address: &str) -> ProbeOutcome {
        self.probes
            .lock()
            .push((host.to_string(), address.to_string()));
        self.answers
            .get(address)
            .cloned()
            .unwrap_or(ProbeOutcome::Inconclusive {
                reason: "no scripted answer".to_string(),
            })
    }
}

pub struct StaticWhois(pub Option<String>);

#[async_trait]
impl WhoisLookup for StaticWhois {
    async fn lookup(&self, _domain: &str) -> Option<String> {
        self.0.clone()
    }
}

/// Home page and team page of `acme.test` listing two staff addresses.
pub fn acme_site() -> SiteFetcher {
    SiteFetcher::new()
        .page(
            "https://acme.test/",
            r#"<html><head><title>Acme Corp | Home</title></head>
               <body><a href="/team">Our team</a>
               <p>Write to <a href="mailto:jane.doe@acme.test">Jane</a></p></body></html>"#,
        )
        .page(
            "https://acme.test/team",
            r#"<ul><li>Jane Doe - jane.doe@acme.test</li>
               <li>J. Smith - <a href="mailto:J.Smith@Acme.test?subject=hi">email</a></li>
               <li>Partner: bob@partner.example</li></ul>"#,
        )
}

pub fn hunter_with(
    config: Config,
    fetcher: Arc<dyn PageFetcher>,
    resolver: TableResolver,
    prober: ScriptedProber,
    whois: Option<&str>,
) -> EmailHunter {
    EmailHunter::from_parts(
        config,
        fetcher,
        Arc::new(resolver),
        Arc::new(prober),
        Arc::new(StaticWhois(whois.map(str::to_string))),
    )
}

/// `acme.test` with an MX host and the two-address site.
pub fn acme_hunter() -> EmailHunter {
    hunter_with(
        fast_config(),
        Arc::new(acme_site()),
        TableResolver::new().mx("acme.test", "mx.acme.test"),
        ScriptedProber::new(),
        None,
    )
}
