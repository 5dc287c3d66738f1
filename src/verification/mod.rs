//! Address verification: format, then domain reachability, then an optional
//! SMTP mailbox probe. Each stage guards the next.

pub mod format;

use crate::core::config::Config;
use crate::utils::dns::{DnsOutcome, MailResolver, NegativeAnswer};
use crate::utils::smtp::{MailboxProber, ProbeOutcome};
use format::format_problem;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MailboxStatus {
    /// Probing is disabled or an earlier stage ended verification.
    NotChecked,
    Confirmed,
    Rejected,
    /// Every host was tried without a definitive answer.
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Valid,
    Invalid,
    /// Verification could not decide. Not the same as `Invalid`.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationResult {
    pub address: String,
    pub format_valid: bool,
    pub domain_reachable: bool,
    pub mx_hosts: Vec<String>,
    pub mailbox: MailboxStatus,
    pub verdict: Verdict,
    pub message: String,
}

impl VerificationResult {
    fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            format_valid: false,
            domain_reachable: false,
            mx_hosts: Vec::new(),
            mailbox: MailboxStatus::NotChecked,
            verdict: Verdict::Invalid,
            message: String::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.verdict == Verdict::Valid
    }
}

/// Outcome of the domain stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainCheck {
    /// Mail hosts in preference order. The bare domain when only address records exist.
    Reachable(Vec<String>),
    /// NXDOMAIN, no records, or no nameservers: the domain cannot receive mail.
    Unreachable(String),
    /// The lookup failed transiently.
    Inconclusive(String),
}

impl DomainCheck {
    pub fn is_reachable(&self) -> bool {
        matches!(self, DomainCheck::Reachable(_))
    }
}

/// Runs the verification stages against injected DNS and SMTP capabilities.
#[derive(Clone)]
pub struct Verifier {
    resolver: Arc<dyn MailResolver>,
    prober: Arc<dyn MailboxProber>,
    config: Arc<Config>,
}

impl Verifier {
    pub fn new(
        resolver: Arc<dyn MailResolver>,
        prober: Arc<dyn MailboxProber>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            resolver,
            prober,
            config,
        }
    }

    /// Resolves MX records for `domain`, falling back to address records.
    pub async fn check_domain(&self, domain: &str) -> DomainCheck {
        let domain = domain.trim().trim_end_matches('.').to_lowercase();
        let negative = match self.resolver.mx_records(&domain).await {
            DnsOutcome::Records(servers) => {
                let hosts: Vec<String> = servers.into_iter().map(|mx| mx.exchange).collect();
                tracing::debug!(target: "verify_task", "{} mail hosts: {:?}", domain, hosts);
                return DomainCheck::Reachable(hosts);
            }
            DnsOutcome::Negative(NegativeAnswer::NxDomain) => {
                tracing::info!(target: "verify_task", "{} does not exist", domain);
                return DomainCheck::Unreachable(format!(
                    "{}: {}",
                    domain,
                    NegativeAnswer::NxDomain
                ));
            }
            DnsOutcome::Negative(kind) => kind,
            DnsOutcome::Transient(reason) => {
                tracing::warn!(target: "verify_task", "MX lookup for {} inconclusive: {}", domain, reason);
                return DomainCheck::Inconclusive(reason);
            }
        };

        tracing::debug!(target: "verify_task",
            "No MX for {} ({}); trying address records", domain, negative);
        match self.resolver.a_records(&domain).await {
            DnsOutcome::Records(_) => DomainCheck::Reachable(vec![domain]),
            DnsOutcome::Negative(kind) => {
                tracing::info!(target: "verify_task", "{} has no mail route: {}", domain, kind);
                DomainCheck::Unreachable(format!("{}: no MX or address records ({})", domain, kind))
            }
            DnsOutcome::Transient(reason) => {
                tracing::warn!(target: "verify_task", "Address lookup for {} inconclusive: {}", domain, reason);
                DomainCheck::Inconclusive(reason)
            }
        }
    }

    /// Full verification of one address. Mailbox probing follows the configuration.
    pub async fn verify(&self, address: &str) -> VerificationResult {
        let address = address.trim().to_lowercase();
        if let Some(problem) = format_problem(&address) {
            let mut result = VerificationResult::new(&address);
            result.message = problem;
            return result;
        }
        let domain = address.rsplit_once('@').map(|(_, d)| d).unwrap_or_default();
        let check = self.check_domain(domain).await;
        self.verify_against(&address, &check, self.config.enable_mailbox_check)
            .await
    }

    /// Verifies `address` using an already computed domain check for its domain.
    pub(crate) async fn verify_against(
        &self,
        address: &str,
        check: &DomainCheck,
        probe_mailbox: bool,
    ) -> VerificationResult {
        let mut result = VerificationResult::new(address);
        if let Some(problem) = format_problem(address) {
            result.message = problem;
            return result;
        }
        result.format_valid = true;

        let hosts = match check {
            DomainCheck::Reachable(hosts) => hosts,
            DomainCheck::Unreachable(reason) => {
                result.message = reason.clone();
                return result;
            }
            DomainCheck::Inconclusive(reason) => {
                result.verdict = Verdict::Unknown;
                result.message = format!("DNS lookup inconclusive: {}", reason);
                return result;
            }
        };
        result.domain_reachable = true;
        result.mx_hosts = hosts.clone();

        if !probe_mailbox {
            result.verdict = Verdict::Valid;
            result.message = "Domain accepts mail; mailbox not checked".to_string();
            return result;
        }

        let mut last_reason = String::from("No mail hosts to probe");
        for host in hosts {
            match self.prober.probe(host, address).await {
                outcome @ ProbeOutcome::Accepted { .. } => {
                    tracing::info!(target: "verify_task", "<{}> accepted by {}", address, host);
                    result.mailbox = MailboxStatus::Confirmed;
                    result.verdict = Verdict::Valid;
                    result.message = outcome.describe();
                    return result;
                }
                outcome @ ProbeOutcome::Rejected { .. } => {
                    tracing::info!(target: "verify_task", "<{}> rejected by {}", address, host);
                    result.mailbox = MailboxStatus::Rejected;
                    result.verdict = Verdict::Invalid;
                    result.message = outcome.describe();
                    return result;
                }
                ProbeOutcome::Inconclusive { reason } => {
                    tracing::debug!(target: "verify_task",
                        "Probe of <{}> via {} inconclusive: {}", address, host, reason);
                    last_reason = reason;
                }
            }
        }

        result.mailbox = MailboxStatus::Unknown;
        result.verdict = Verdict::Unknown;
        result.message = format!("No mail host gave a definitive answer ({})", last_reason);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::dns::MailServer;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::net::{IpAddr, Ipv4Addr};

    struct FakeResolver {
        mx: DnsOutcome<Vec<MailServer>>,
        a: DnsOutcome<Vec<IpAddr>>,
    }

    #[async_trait]
    impl MailResolver for FakeResolver {
        async fn mx_records(&self, _domain: &str) -> DnsOutcome<Vec<MailServer>> {
            self.mx.clone()
        }
        async fn a_records(&self, _domain: &str) -> DnsOutcome<Vec<IpAddr>> {
            self.a.clone()
        }
    }

    /// Replies per host and records the order hosts were probed in.
    struct ScriptedProber {
        replies: Vec<(&'static str, ProbeOutcome)>,
        probed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MailboxProber for ScriptedProber {
        async fn probe(&self, host: &str, _address: &str) -> ProbeOutcome {
            self.probed.lock().push(host.to_string());
            self.replies
                .iter()
                .find(|(h, _)| *h == host)
                .map(|(_, o)| o.clone())
                .unwrap_or_else(|| ProbeOutcome::inconclusive("connection refused"))
        }
    }

    fn mx(hosts: &[(&str, u16)]) -> DnsOutcome<Vec<MailServer>> {
        DnsOutcome::Records(
            hosts
                .iter()
                .map(|(h, p)| MailServer {
                    exchange: h.to_string(),
                    preference: *p,
                })
                .collect(),
        )
    }

    fn verifier(
        resolver: FakeResolver,
        replies: Vec<(&'static str, ProbeOutcome)>,
        probe: bool,
    ) -> (Verifier, Arc<ScriptedProber>) {
        let prober = Arc::new(ScriptedProber {
            replies,
            probed: Mutex::new(Vec::new()),
        });
        let config = Config {
            enable_mailbox_check: probe,
            ..Config::default()
        };
        (
            Verifier::new(Arc::new(resolver), prober.clone(), Arc::new(config)),
            prober,
        )
    }

    fn no_records() -> FakeResolver {
        FakeResolver {
            mx: DnsOutcome::Negative(NegativeAnswer::NoAnswer),
            a: DnsOutcome::Negative(NegativeAnswer::NoAnswer),
        }
    }

    #[tokio::test]
    async fn malformed_address_is_invalid_without_lookups() {
        let (v, prober) = verifier(no_records(), vec![], true);
        let result = v.verify("not-an-email").await;
        assert!(!result.format_valid);
        assert_eq!(result.verdict, Verdict::Invalid);
        assert!(prober.probed.lock().is_empty());
    }

    #[tokio::test]
    async fn domain_without_records_is_invalid() {
        let (v, _) = verifier(no_records(), vec![], false);
        let result = v.verify("a@b.co").await;
        assert!(result.format_valid);
        assert!(!result.domain_reachable);
        assert_eq!(result.verdict, Verdict::Invalid);
    }

    #[tokio::test]
    async fn address_records_make_the_domain_its_own_mail_host() {
        let resolver = FakeResolver {
            mx: DnsOutcome::Negative(NegativeAnswer::NoAnswer),
            a: DnsOutcome::Records(vec![IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1))]),
        };
        let (v, _) = verifier(resolver, vec![], false);
        let result = v.verify("Jane@Acme.test").await;
        assert_eq!(result.verdict, Verdict::Valid);
        assert_eq!(result.mx_hosts, vec!["acme.test".to_string()]);
        assert_eq!(result.mailbox, MailboxStatus::NotChecked);
    }

    #[tokio::test]
    async fn transient_dns_failure_is_unknown_not_invalid() {
        let resolver = FakeResolver {
            mx: DnsOutcome::Transient("SERVFAIL".to_string()),
            a: DnsOutcome::Negative(NegativeAnswer::NoAnswer),
        };
        let (v, _) = verifier(resolver, vec![], false);
        let result = v.verify("jane@acme.test").await;
        assert_eq!(result.verdict, Verdict::Unknown);
        assert!(!result.domain_reachable);
    }

    #[tokio::test]
    async fn probe_advances_past_inconclusive_hosts() {
        let resolver = FakeResolver {
            mx: mx(&[("mx1.acme.test", 10), ("mx2.acme.test", 20)]),
            a: DnsOutcome::Negative(NegativeAnswer::NoAnswer),
        };
        let accepted = ProbeOutcome::Accepted {
            code: 250,
            message: "OK".to_string(),
        };
        let (v, prober) = verifier(resolver, vec![("mx2.acme.test", accepted)], true);
        let result = v.verify("jane@acme.test").await;
        assert_eq!(result.mailbox, MailboxStatus::Confirmed);
        assert_eq!(result.verdict, Verdict::Valid);
        assert_eq!(
            *prober.probed.lock(),
            vec!["mx1.acme.test".to_string(), "mx2.acme.test".to_string()]
        );
    }

    #[tokio::test]
    async fn rejection_is_authoritative_and_stops_probing() {
        let resolver = FakeResolver {
            mx: mx(&[("mx1.acme.test", 10), ("mx2.acme.test", 20)]),
            a: DnsOutcome::Negative(NegativeAnswer::NoAnswer),
        };
        let rejected = ProbeOutcome::Rejected {
            code: 550,
            message: "no such user".to_string(),
        };
        let (v, prober) = verifier(resolver, vec![("mx1.acme.test", rejected)], true);
        let result = v.verify("ghost@acme.test").await;
        assert_eq!(result.mailbox, MailboxStatus::Rejected);
        assert_eq!(result.verdict, Verdict::Invalid);
        assert_eq!(prober.probed.lock().len(), 1);
    }

    #[tokio::test]
    async fn exhausted_hosts_give_unknown() {
        let resolver = FakeResolver {
            mx: mx(&[("mx1.acme.test", 10)]),
            a: DnsOutcome::Negative(NegativeAnswer::NoAnswer),
        };
        let (v, _) = verifier(resolver, vec![], true);
        let result = v.verify("jane@acme.test").await;
        assert!(result.domain_reachable);
        assert_eq!(result.mailbox, MailboxStatus::Unknown);
        assert_eq!(result.verdict, Verdict::Unknown);
    }
}
