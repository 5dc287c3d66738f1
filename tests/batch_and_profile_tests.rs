mod common;

use common::{acme_hunter, acme_site, fast_config, hunter_with, ScriptedProber, TableResolver};
use email_hunter_core::{
    domain_profile, process_lookups, CandidateSource, CompanyNameSource, Config, FindOneRequest,
    Pattern,
};
use std::sync::Arc;

const ACME_WHOIS: &str = "\
Domain Name: ACME.TEST
Registrar: Example Registrar, Inc.
Creation Date: 2001-02-03T00:00:00Z
Registry Expiry Date: 2031-02-03T00:00:00Z
Registrant Organization: Acme Corporation
Name Server: NS1.ACME.TEST
";

#[tokio::test]
async fn batch_results_follow_input_order() {
    let config = Config {
        max_concurrency: 2,
        ..fast_config()
    };
    let hunter = hunter_with(
        config,
        Arc::new(acme_site()),
        TableResolver::new().mx("acme.test", "mx.acme.test"),
        ScriptedProber::new(),
        None,
    );
    let requests = vec![
        FindOneRequest::new("acme.test").first_name("Jane").last_name("Doe"),
        FindOneRequest::new("acme.test"),
        FindOneRequest::new("nodot").first_name("Jane"),
        FindOneRequest::new("acme.test").first_name("John").last_name("Q"),
        FindOneRequest::new("acme.test")
            .first_name("Jane")
            .pattern("{nope}"),
    ];

    let results = process_lookups(&hunter, requests.clone()).await;

    assert_eq!(results.len(), requests.len());
    for (result, request) in results.iter().zip(&requests) {
        assert_eq!(&result.request, request);
    }
    assert_eq!(
        results[0].candidate.as_ref().map(|c| c.address.as_str()),
        Some("jane.doe@acme.test")
    );
    assert_eq!(results[1].error.as_deref(), Some("Missing first or last name"));
    assert!(results[2].candidate.is_none() && results[2].error.is_some());
    assert_eq!(
        results[3].candidate.as_ref().map(|c| c.address.as_str()),
        Some("john.q@acme.test")
    );
    assert!(results[4].error.is_some());
}

#[tokio::test]
async fn empty_batch_is_empty() {
    assert!(process_lookups(&acme_hunter(), Vec::new()).await.is_empty());
}

#[tokio::test]
async fn profile_prefers_whois_organisation() {
    let hunter = hunter_with(
        fast_config(),
        Arc::new(acme_site()),
        TableResolver::new(),
        ScriptedProber::new(),
        Some(ACME_WHOIS),
    );

    let profile = domain_profile(&hunter, "www.acme.test").await.unwrap();

    assert_eq!(profile.domain, "acme.test");
    assert_eq!(profile.company_name, "Acme Corporation");
    assert_eq!(profile.company_name_source, CompanyNameSource::Whois);
    assert_eq!(profile.pattern.pattern, Pattern::FirstDotLast);
    assert_eq!(profile.pattern.samples, 2);
    assert_eq!(
        profile.observed_emails,
        vec!["j.smith@acme.test", "jane.doe@acme.test"]
    );
    let whois = profile.whois.unwrap();
    assert_eq!(whois.registrar.as_deref(), Some("Example Registrar, Inc."));
    assert_eq!(whois.name_servers, vec!["ns1.acme.test"]);
}

#[tokio::test]
async fn profile_without_whois_reads_the_home_page() {
    let config = Config {
        enable_whois: false,
        ..fast_config()
    };
    let hunter = hunter_with(
        config,
        Arc::new(acme_site()),
        TableResolver::new(),
        ScriptedProber::new(),
        Some(ACME_WHOIS),
    );

    let profile = hunter.domain_profile("acme.test").await.unwrap();

    assert!(profile.whois.is_none());
    assert_eq!(profile.company_name, "Acme Corp");
    assert_eq!(profile.company_name_source, CompanyNameSource::PageTitle);
}

#[tokio::test]
async fn profile_of_empty_site_uses_domain_label() {
    let hunter = hunter_with(
        fast_config(),
        Arc::new(common::SiteFetcher::new()),
        TableResolver::new(),
        ScriptedProber::new(),
        None,
    );

    let profile = hunter.domain_profile("globex.test").await.unwrap();

    assert_eq!(profile.company_name, "Globex");
    assert_eq!(profile.company_name_source, CompanyNameSource::DomainLabel);
    assert_eq!(profile.pattern.samples, 0);
    assert_eq!(profile.pattern.confidence, 0.0);
    assert!(profile.observed_emails.is_empty());
}

#[tokio::test]
async fn serialized_candidate_uses_lowercase_source() {
    let candidate = acme_hunter()
        .find_one(&FindOneRequest::new("acme.test").first_name("Jane").last_name("Doe"))
        .await
        .unwrap();
    assert_eq!(candidate.source, CandidateSource::Pattern);

    let json = serde_json::to_value(&candidate).unwrap();
    assert_eq!(json["source"], "pattern");
    assert_eq!(json["address"], "jane.doe@acme.test");
}
