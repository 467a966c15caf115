// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use leadrs::application::use_cases::export_leads::ExportLeadsUseCase;
use leadrs::domain::models::lead::LeadRecord;
use leadrs::domain::repositories::lead_repository::LeadRepository;
use leadrs::infrastructure::repositories::jsonl_lead_repo::JsonlLeadRepository;

use super::helpers::lead_with_email;

#[tokio::test]
async fn test_export_yields_one_record_per_email() {
    let dir = tempfile::tempdir().unwrap();
    let repository = Arc::new(JsonlLeadRepository::new(dir.path().join("leads.jsonl")));

    // at-least-once appends from the crawler can repeat a business
    let appended = vec![
        lead_with_email("Acme Bakery", "https://acmebakery.test", "hello@acmebakery.test"),
        lead_with_email("Bolt Hardware", "https://bolt.test", "info@bolt.test"),
        lead_with_email("Acme Bakery", "https://acmebakery.test", "hello@acmebakery.test"),
        lead_with_email("Acme Catering", "https://acmecatering.test", "Hello@AcmeBakery.test "),
        LeadRecord::new("No Email Co", "https://none.test"),
    ];
    for lead in &appended {
        repository.append(lead).await.unwrap();
    }

    let report = ExportLeadsUseCase::new(repository.clone()).execute(None).await.unwrap();

    let leads = repository.read_all().await.unwrap();
    let names: Vec<&str> = leads.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["Acme Bakery", "Bolt Hardware", "No Email Co"]);
    assert_eq!(report.dropped, 2);
    assert_eq!(report.collisions.len(), 1);
    assert_eq!(
        report.collisions[0].businesses,
        vec!["Acme Bakery".to_string(), "Acme Bakery".to_string(), "Acme Catering".to_string()]
    );
}
