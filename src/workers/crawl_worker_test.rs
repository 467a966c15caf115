#[cfg(test)]
mod tests {
    use crate::domain::models::business::Business;
    use crate::domain::models::verification::{FailureReason, VerificationResult};
    use crate::domain::search::engine::{SearchEngine, SearchError, SearchResult};
    use crate::domain::services::decision_maker_service::DecisionMakerFinder;
    use crate::domain::services::verification_service::AddressVerifier;
    use crate::engines::host_throttle::{HostThrottle, ThrottleConfig};
    use crate::engines::traits::{EngineError, FetchRequest, FetchResponse, PageFetcher};
    use crate::infrastructure::repositories::memory_lead_repo::InMemoryLeadRepository;
    use crate::utils::retry_policy::RetryPolicy;
    use crate::workers::crawl_worker::{CrawlConfig, CrawlOrchestrator};
    use async_trait::async_trait;
    use mockall::mock;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    mock! {
        pub Fetcher {}

        #[async_trait]
        impl PageFetcher for Fetcher {
            async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, EngineError>;
            fn name(&self) -> &'static str;
        }
    }

    struct OnlyDeliverable {
        address: &'static str,
        checked: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AddressVerifier for OnlyDeliverable {
        async fn verify(&self, address: &str) -> VerificationResult {
            self.checked.lock().push(address.to_string());
            if address == self.address {
                VerificationResult::deliverable(address)
            } else {
                VerificationResult::failed(address, FailureReason::RecipientRefused(550))
            }
        }
    }

    struct ProfileSearch;

    #[async_trait]
    impl SearchEngine for ProfileSearch {
        async fn search(&self, query: &str, _limit: u32) -> Result<Vec<SearchResult>, SearchError> {
            assert_eq!(query, "Acme Bakery linkedin");
            Ok(vec![SearchResult {
                title: "Jane Doe - Acme Bakery".to_string(),
                url: String::new(),
            }])
        }

        fn name(&self) -> &'static str {
            "profile"
        }
    }

    fn page(request: &FetchRequest, html: String) -> Result<FetchResponse, EngineError> {
        Ok(FetchResponse {
            status_code: 200,
            content: html,
            final_url: request.url.clone(),
            response_time_ms: 5,
        })
    }

    fn unthrottled() -> HostThrottle {
        HostThrottle::new(ThrottleConfig {
            global_concurrency: 4,
            per_host_concurrency: 2,
            download_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            target_concurrency: 1.0,
        })
    }

    fn config() -> CrawlConfig {
        CrawlConfig {
            retry_policy: RetryPolicy::immediate(2),
            ..CrawlConfig::default()
        }
    }

    fn nobody() -> Arc<OnlyDeliverable> {
        Arc::new(OnlyDeliverable {
            address: "",
            checked: Mutex::new(Vec::new()),
        })
    }

    fn orchestrator(
        fetcher: MockFetcher,
        verifier: Arc<OnlyDeliverable>,
        repository: Arc<InMemoryLeadRepository>,
        cancel: CancellationToken,
    ) -> CrawlOrchestrator {
        CrawlOrchestrator::new(Arc::new(fetcher), unthrottled(), verifier, repository, config(), cancel)
    }

    #[tokio::test]
    async fn test_homepage_email_resolves_without_follow_on_fetches() {
        let mut fetcher = MockFetcher::new();
        fetcher.expect_fetch().times(1).returning(|request| {
            page(
                request,
                r#"<html><body><a href="/about">About</a><p>Write to hello@acmebakery.test</p></body></html>"#
                    .to_string(),
            )
        });
        let repository = Arc::new(InMemoryLeadRepository::new());

        let summary = orchestrator(fetcher, nobody(), repository.clone(), CancellationToken::new())
            .run(vec![Business::new("Acme Bakery", "https://acmebakery.test")])
            .await;

        assert_eq!(summary.resolved_by_crawl, 1);
        let leads = repository.snapshot();
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].email.as_deref(), Some("hello@acmebakery.test"));
        assert!(leads[0].decision_maker.is_none());
    }

    #[tokio::test]
    async fn test_never_fetches_more_than_ten_pages() {
        let links: String = (0..30)
            .map(|i| format!(r#"<a href="/page/{}">p{}</a>"#, i, i))
            .collect();
        let html = format!("<html><body>{}</body></html>", links);

        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .times(10)
            .returning(move |request| page(request, html.clone()));
        let repository = Arc::new(InMemoryLeadRepository::new());

        let summary = orchestrator(fetcher, nobody(), repository.clone(), CancellationToken::new())
            .run(vec![Business::new("Bolt Hardware", "bolthardware.test")])
            .await;

        assert_eq!(summary.exhausted, 1);
        assert_eq!(summary.unresolved, vec!["Bolt Hardware".to_string()]);
        assert!(repository.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_priority_links_are_fetched_first() {
        let visited = Arc::new(Mutex::new(Vec::new()));
        let seen = visited.clone();

        let mut fetcher = MockFetcher::new();
        fetcher.expect_fetch().returning(move |request| {
            seen.lock().push(request.url.path().to_string());
            match request.url.path() {
                "/" => page(
                    request,
                    r#"<a href="/blog">Blog</a><a href="/broken">Broken</a><a href="/contact-us">Contact</a>"#
                        .to_string(),
                ),
                "/broken" => Err(EngineError::HttpStatus(404)),
                "/contact-us" => page(request, "<p>Nothing here</p>".to_string()),
                "/blog" => page(request, "<p>team@cornerstore.test</p>".to_string()),
                _ => Err(EngineError::HttpStatus(404)),
            }
        });
        let repository = Arc::new(InMemoryLeadRepository::new());

        let summary = orchestrator(fetcher, nobody(), repository.clone(), CancellationToken::new())
            .run(vec![Business::new("Corner Store", "https://www.cornerstore.test")])
            .await;

        assert_eq!(summary.resolved_by_crawl, 1);
        assert_eq!(*visited.lock(), vec!["/", "/contact-us", "/blog"]);
        assert_eq!(repository.snapshot()[0].email.as_deref(), Some("team@cornerstore.test"));
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let attempts = Arc::new(Mutex::new(0u32));
        let counter = attempts.clone();

        let mut fetcher = MockFetcher::new();
        fetcher.expect_fetch().returning(move |request| {
            let mut n = counter.lock();
            *n += 1;
            if *n < 3 {
                Err(EngineError::HttpStatus(503))
            } else {
                page(request, "<p>info@retry.test</p>".to_string())
            }
        });
        let repository = Arc::new(InMemoryLeadRepository::new());

        let summary = orchestrator(fetcher, nobody(), repository.clone(), CancellationToken::new())
            .run(vec![Business::new("Retry Co", "https://retry.test")])
            .await;

        assert_eq!(summary.resolved_by_crawl, 1);
        assert_eq!(*attempts.lock(), 3);
    }

    #[tokio::test]
    async fn test_verified_guess_skips_crawl() {
        let mut fetcher = MockFetcher::new();
        fetcher.expect_fetch().times(0);
        let verifier = Arc::new(OnlyDeliverable {
            address: "jane.doe@acmebakery.test",
            checked: Mutex::new(Vec::new()),
        });
        let repository = Arc::new(InMemoryLeadRepository::new());

        let summary = orchestrator(fetcher, verifier.clone(), repository.clone(), CancellationToken::new())
            .with_decision_maker_finder(DecisionMakerFinder::new(Arc::new(ProfileSearch), "", 10))
            .run(vec![Business::new("Acme Bakery", "https://www.acmebakery.test")])
            .await;

        assert_eq!(summary.resolved_by_guess, 1);
        assert_eq!(verifier.checked.lock()[0], "jane.doe@acmebakery.test");

        let lead = &repository.snapshot()[0];
        assert_eq!(lead.email.as_deref(), Some("jane.doe@acmebakery.test"));
        assert_eq!(lead.decision_maker.as_deref(), Some("Jane Doe"));
    }

    #[tokio::test]
    async fn test_cancelled_run_starts_nothing() {
        let mut fetcher = MockFetcher::new();
        fetcher.expect_fetch().times(0);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = orchestrator(fetcher, nobody(), Arc::new(InMemoryLeadRepository::new()), cancel)
            .run(vec![
                Business::new("A", "https://a.test"),
                Business::new("B", "https://b.test"),
            ])
            .await;

        assert_eq!(summary.cancelled, 2);
        assert_eq!(summary.resolved(), 0);
    }
}
