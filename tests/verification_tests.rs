mod common;

use common::{fast_config, hunter_with, ScriptedProber, SiteFetcher, TableResolver};
use email_hunter_core::{
    Config, EmailHunter, MailboxStatus, ProbeOutcome, Verdict, VerificationResult,
};
use std::sync::Arc;

fn verifying_hunter(config: Config, resolver: TableResolver, prober: ScriptedProber) -> EmailHunter {
    hunter_with(config, Arc::new(SiteFetcher::new()), resolver, prober, None)
}

async fn verify(resolver: TableResolver, address: &str) -> VerificationResult {
    verifying_hunter(fast_config(), resolver, ScriptedProber::new())
        .verify_email(address)
        .await
}

#[tokio::test]
async fn malformed_address_fails_at_format_stage() {
    let result = verify(TableResolver::new(), "not-an-email").await;
    assert!(!result.format_valid);
    assert!(!result.domain_reachable);
    assert_eq!(result.verdict, Verdict::Invalid);
}

#[tokio::test]
async fn domain_with_mx_is_valid_without_probing() {
    let result = verify(TableResolver::new().mx("b.co", "mx.b.co"), "A@B.co").await;
    assert_eq!(result.address, "a@b.co");
    assert!(result.format_valid);
    assert!(result.domain_reachable);
    assert_eq!(result.mx_hosts, vec!["mx.b.co"]);
    assert_eq!(result.mailbox, MailboxStatus::NotChecked);
    assert_eq!(result.verdict, Verdict::Valid);
}

#[tokio::test]
async fn address_records_stand_in_for_missing_mx() {
    let resolver = TableResolver::new().no_mx("aonly.test").a("aonly.test");
    let result = verify(resolver, "info@aonly.test").await;
    assert_eq!(result.verdict, Verdict::Valid);
    assert_eq!(result.mx_hosts, vec!["aonly.test"]);
}

#[tokio::test]
async fn domain_without_mx_or_a_records_is_invalid() {
    let resolver = TableResolver::new().no_mx("dead.test").no_a("dead.test");
    let result = verify(resolver, "info@dead.test").await;
    assert!(result.format_valid);
    assert!(!result.domain_reachable);
    assert_eq!(result.verdict, Verdict::Invalid);

    let result = verify(TableResolver::new(), "info@missing.test").await;
    assert_eq!(result.verdict, Verdict::Invalid);
}

#[tokio::test]
async fn transient_dns_failure_is_unknown_not_invalid() {
    let result = verify(TableResolver::new().mx_transient("flaky.test"), "x@flaky.test").await;
    assert!(!result.domain_reachable);
    assert_eq!(result.verdict, Verdict::Unknown);
}

#[tokio::test]
async fn mailbox_rejection_is_authoritative_when_probing_enabled() {
    let config = Config {
        enable_mailbox_check: true,
        ..fast_config()
    };
    let prober = ScriptedProber::new().answer(
        "ghost@acme.test",
        ProbeOutcome::Rejected {
            code: 550,
            message: "5.1.1 user unknown".to_string(),
        },
    );
    let hunter = verifying_hunter(
        config,
        TableResolver::new().mx("acme.test", "mx.acme.test"),
        prober,
    );

    let result = hunter.verify_email("ghost@acme.test").await;
    assert_eq!(result.mailbox, MailboxStatus::Rejected);
    assert_eq!(result.verdict, Verdict::Invalid);
    assert!(result.message.contains("550"));

    let result = hunter.verify_email("someone@acme.test").await;
    assert_eq!(result.mailbox, MailboxStatus::Unknown);
    assert_eq!(result.verdict, Verdict::Unknown);
}

#[tokio::test]
async fn probing_is_skipped_for_unreachable_domains() {
    let config = Config {
        enable_mailbox_check: true,
        ..fast_config()
    };
    let prober = Arc::new(ScriptedProber::new());
    let hunter = EmailHunter::from_parts(
        config,
        Arc::new(SiteFetcher::new()),
        Arc::new(TableResolver::new()),
        prober.clone(),
        Arc::new(common::StaticWhois(None)),
    );

    let result = hunter.verify_email("jane@gone.test").await;
    assert_eq!(result.verdict, Verdict::Invalid);
    assert_eq!(result.mailbox, MailboxStatus::NotChecked);
    assert!(prober.probes().is_empty());
}
