// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use leadrs::application::use_cases::run_campaign::{build_content_generator, RunCampaignUseCase};
use leadrs::config::settings::Settings;
use leadrs::domain::models::classification::Classification;
use leadrs::domain::models::lead::{LeadRecord, ResponseState, SendState};
use leadrs::domain::repositories::lead_repository::LeadRepository;
use leadrs::domain::services::content_service::ResilientContentGenerator;
use leadrs::infrastructure::content::template::TemplateContentGenerator;
use leadrs::infrastructure::mail::memory_mailbox::InMemoryMailbox;
use leadrs::infrastructure::repositories::jsonl_lead_repo::JsonlLeadRepository;
use leadrs::workers::campaign_status::TracingStatusSink;
use leadrs::workers::outreach_worker::{OutreachConfig, OutreachScheduler};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::helpers::lead_with_email;

fn campaign(
    mailbox: Arc<InMemoryMailbox>,
    repository: Arc<JsonlLeadRepository>,
) -> RunCampaignUseCase {
    let template = Arc::new(TemplateContentGenerator::new());
    let content = Arc::new(ResilientContentGenerator::new(
        template.clone(),
        template,
        Duration::from_secs(10),
    ));
    let config = OutreachConfig {
        min_daily_emails: 5,
        max_daily_emails: 5,
        sender_name: "Sam Sender".into(),
        sender_site: "https://sender.test".into(),
        rng_seed: Some(11),
        ..OutreachConfig::default()
    };
    let scheduler = OutreachScheduler::new(
        mailbox.clone(),
        mailbox,
        content,
        Arc::new(TracingStatusSink),
        "sam@sender.test",
        config,
        CancellationToken::new(),
    );
    RunCampaignUseCase::new(scheduler, repository)
}

#[tokio::test(start_paused = true)]
async fn test_campaign_persists_state_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let repository = Arc::new(JsonlLeadRepository::new(dir.path().join("leads.jsonl")));
    repository
        .append(&lead_with_email("Acme Bakery", "https://acmebakery.test", "hello@acmebakery.test"))
        .await
        .unwrap();
    repository
        .append(&lead_with_email("Bolt Hardware", "https://bolt.test", "info@bolt.test"))
        .await
        .unwrap();
    repository
        .append(&LeadRecord::new("No Email Co", "https://none.test"))
        .await
        .unwrap();

    let mailbox = Arc::new(InMemoryMailbox::new());
    let use_case = campaign(mailbox.clone(), repository.clone());

    let first = use_case.execute().await.unwrap();
    assert_eq!(first.sent, 2);
    assert_eq!(first.skipped, 1);

    let stored = repository.read_all().await.unwrap();
    assert_eq!(stored[0].name, "Acme Bakery");
    assert_eq!(stored[0].email_sent, SendState::Sent);
    assert!(stored[0].last_email_date.is_some());
    assert_eq!(stored[2].email_sent, SendState::NotSent);

    mailbox.deliver("Jane <hello@acmebakery.test>", "Sounds good, let's talk next week");

    let second = use_case.execute().await.unwrap();
    assert_eq!(second.sent, 0);
    assert_eq!(second.responses_ingested, 1);
    assert_eq!(second.follow_ups_sent, 1);
    assert_eq!(mailbox.sent_to("hello@acmebakery.test"), 2);
    assert_eq!(mailbox.sent_to("info@bolt.test"), 1);

    let stored = repository.read_all().await.unwrap();
    let acme = &stored[0];
    assert_eq!(acme.response_state, ResponseState::Received);
    assert_eq!(acme.follow_up_count, 1);
    assert_eq!(acme.last_email_classification, Some(Classification::Interested));
}

#[tokio::test]
async fn test_llm_outage_falls_back_to_template() {
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&llm)
        .await;

    let mut settings = Settings::new().unwrap();
    settings.outreach.content_provider = "llm".to_string();
    settings.llm.api_key = Some("sk-test".to_string());
    settings.llm.api_base_url = llm.uri();

    let content = build_content_generator(&settings).unwrap();

    assert_eq!(
        content.classify_response("Please remove me from your list").await,
        Classification::NotInterested
    );
    assert_eq!(
        content.personalize_offer(&llm.uri(), "Free audit").await,
        "Free audit"
    );
}
