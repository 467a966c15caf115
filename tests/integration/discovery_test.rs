// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use leadrs::application::use_cases::discover_leads::DiscoverLeadsUseCase;
use leadrs::domain::repositories::lead_repository::LeadRepository;
use leadrs::domain::services::decision_maker_service::DecisionMakerFinder;
use leadrs::engines::reqwest_engine::ReqwestEngine;
use leadrs::infrastructure::repositories::jsonl_lead_repo::JsonlLeadRepository;
use leadrs::infrastructure::search::google::GoogleSearchEngine;
use leadrs::utils::retry_policy::RetryPolicy;
use leadrs::workers::crawl_worker::{CrawlConfig, CrawlOrchestrator};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::helpers::{unthrottled, AllowListVerifier};

fn engine() -> Arc<ReqwestEngine> {
    Arc::new(ReqwestEngine::new(vec!["leadrs-test/1.0".to_string()]).unwrap())
}

fn config() -> CrawlConfig {
    CrawlConfig {
        request_timeout: Duration::from_secs(5),
        retry_policy: RetryPolicy::immediate(1),
        ..CrawlConfig::default()
    }
}

async fn write_seeds(dir: &std::path::Path, seeds: &str) -> std::path::PathBuf {
    let path = dir.join("business_leads.json");
    tokio::fs::write(&path, seeds).await.unwrap();
    path
}

#[tokio::test]
async fn test_homepage_email_is_written_to_store() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><a href="/about">About</a><p>Say hello: hello@acmebakery.test</p></body></html>"#,
        ))
        .expect(1)
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>about</p>"))
        .expect(0)
        .mount(&site)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let seeds = write_seeds(
        dir.path(),
        &format!(r#"[{{"Name": "Acme Bakery", "Website": "{}/"}}]"#, site.uri()),
    )
    .await;
    let repository = Arc::new(JsonlLeadRepository::new(dir.path().join("leads.jsonl")));

    let orchestrator = CrawlOrchestrator::new(
        engine(),
        unthrottled(),
        Arc::new(AllowListVerifier::new(&[])),
        repository.clone(),
        config(),
        CancellationToken::new(),
    );
    let summary = DiscoverLeadsUseCase::new(orchestrator, seeds).execute().await.unwrap();

    assert_eq!(summary.resolved_by_crawl, 1);
    let leads = repository.read_all().await.unwrap();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].email.as_deref(), Some("hello@acmebakery.test"));
}

#[tokio::test]
async fn test_contact_page_found_after_dead_branch() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a href="/about">About</a><a href="/contact">Contact</a>"#,
        ))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/contact"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<p>Reach us at office@cornerstore.test</p>"),
        )
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&site)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let seeds = write_seeds(
        dir.path(),
        &format!(r#"[{{"Name": "Corner Store", "Website": "{}"}}]"#, site.uri()),
    )
    .await;
    let repository = Arc::new(JsonlLeadRepository::new(dir.path().join("leads.jsonl")));

    let orchestrator = CrawlOrchestrator::new(
        engine(),
        unthrottled(),
        Arc::new(AllowListVerifier::new(&[])),
        repository.clone(),
        config(),
        CancellationToken::new(),
    );
    DiscoverLeadsUseCase::new(orchestrator, seeds).execute().await.unwrap();

    let leads = repository.read_all().await.unwrap();
    assert_eq!(leads[0].email.as_deref(), Some("office@cornerstore.test"));
}

#[tokio::test]
async fn test_decision_maker_guess_skips_crawl() {
    let search = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Acme Bakery linkedin"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<div><a href="https://linkedin.test/in/janedoe"><h3>Jane Doe - Acme Bakery</h3></a></div>"#,
        ))
        .expect(1)
        .mount(&search)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let seeds = write_seeds(
        dir.path(),
        r#"[{"Name": "Acme Bakery", "Website": "https://www.acmebakery.test"}]"#,
    )
    .await;
    let repository = Arc::new(JsonlLeadRepository::new(dir.path().join("leads.jsonl")));
    let verifier = Arc::new(AllowListVerifier::new(&["jane.doe@acmebakery.test"]));

    let finder = DecisionMakerFinder::new(
        Arc::new(GoogleSearchEngine::new(search.uri(), Duration::from_secs(5)).unwrap()),
        "",
        10,
    );
    let orchestrator = CrawlOrchestrator::new(
        engine(),
        unthrottled(),
        verifier.clone(),
        repository.clone(),
        config(),
        CancellationToken::new(),
    )
    .with_decision_maker_finder(finder);

    let summary = DiscoverLeadsUseCase::new(orchestrator, seeds).execute().await.unwrap();

    assert_eq!(summary.resolved_by_guess, 1);
    assert_eq!(verifier.checked.lock().len(), 1);
    let leads = repository.read_all().await.unwrap();
    assert_eq!(leads[0].email.as_deref(), Some("jane.doe@acmebakery.test"));
    assert_eq!(leads[0].decision_maker.as_deref(), Some("Jane Doe"));
}
