// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::search::engine::{SearchEngine, SearchError, SearchResult};

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h3").expect("valid h3 selector"));

const SEARCH_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Google 搜索引擎实现
///
/// 请求 HTML 结果页并按顺序读取 `h3` 标题；基础地址可配置以便测试
pub struct GoogleSearchEngine {
    client: Client,
    base_url: String,
}

impl GoogleSearchEngine {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SearchError> {
        let client = Client::builder()
            .user_agent(SEARCH_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self, query: &str, limit: u32) -> String {
        format!(
            "{}/search?q={}&num={}&ie=utf8&oe=utf8",
            self.base_url,
            urlencoding::encode(query),
            limit
        )
    }

    /// 解析结果页中的标题，保持页面顺序
    pub fn parse_results(html: &str, limit: u32) -> Vec<SearchResult> {
        let document = Html::parse_document(html);
        document
            .select(&TITLE_SELECTOR)
            .filter_map(|h3| {
                let title = h3.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ");
                if title.is_empty() {
                    return None;
                }
                Some(SearchResult {
                    url: enclosing_link(h3).unwrap_or_default(),
                    title,
                })
            })
            .take(limit as usize)
            .collect()
    }
}

/// 标题所在的 `<a href>`（Google 结果中标题包在链接内）
fn enclosing_link(element: ElementRef<'_>) -> Option<String> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "a")
        .and_then(|a| a.value().attr("href"))
        .map(|href| href.to_string())
}

#[async_trait]
impl SearchEngine for GoogleSearchEngine {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchResult>, SearchError> {
        let url = self.search_url(query, limit);
        debug!(query, "Google search request");

        let response = self
            .client
            .get(&url)
            .header("Accept", "text/html,application/xhtml+xml")
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout
                } else {
                    SearchError::NetworkError(format!("HTTP request failed: {}", e))
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(SearchError::RateLimitExceeded);
        }
        if !status.is_success() {
            return Err(SearchError::EngineError(format!(
                "Google search returned status: {}",
                status
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| SearchError::NetworkError(format!("Failed to read response body: {}", e)))?;

        let results = Self::parse_results(&html, limit);
        if results.is_empty() {
            warn!(query, "Google search returned no parsable titles");
        }
        Ok(results)
    }

    fn name(&self) -> &'static str {
        "google"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RESULTS_PAGE: &str = r#"
        <html><body>
            <div class="g"><a href="https://www.linkedin.com/in/janedoe"><h3 class="LC20lb">Jane Doe - Acme Bakery</h3></a></div>
            <div class="g"><a href="https://acmebakery.test"><h3>Acme   Bakery | Home</h3></a></div>
            <h3>   </h3>
        </body></html>
    "#;

    #[test]
    fn test_parse_results_keeps_order() {
        let results = GoogleSearchEngine::parse_results(RESULTS_PAGE, 10);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Jane Doe - Acme Bakery");
        assert_eq!(results[0].url, "https://www.linkedin.com/in/janedoe");
        assert_eq!(results[1].title, "Acme Bakery | Home");

        assert_eq!(GoogleSearchEngine::parse_results(RESULTS_PAGE, 1).len(), 1);
    }

    #[tokio::test]
    async fn test_search_against_mock_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "Acme Bakery linkedin"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
            .mount(&server)
            .await;

        let engine = GoogleSearchEngine::new(server.uri(), Duration::from_secs(5)).unwrap();
        let results = engine.search("Acme Bakery linkedin", 10).await.unwrap();
        assert_eq!(results[0].title, "Jane Doe - Acme Bakery");
    }

    #[tokio::test]
    async fn test_rate_limited_search() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let engine = GoogleSearchEngine::new(server.uri(), Duration::from_secs(5)).unwrap();
        let err = engine.search("anything", 10).await.unwrap_err();
        assert!(matches!(err, SearchError::RateLimitExceeded));
    }
}
