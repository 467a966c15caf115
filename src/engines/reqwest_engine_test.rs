// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#[cfg(test)]
mod tests {
    use crate::engines::reqwest_engine::ReqwestEngine;
    use crate::engines::traits::{EngineError, FetchRequest, PageFetcher};
    use std::time::Duration;
    use url::Url;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(server: &MockServer, route: &str, timeout: Duration) -> FetchRequest {
        FetchRequest {
            url: Url::parse(&format!("{}{}", server.uri(), route)).unwrap(),
            timeout,
        }
    }

    #[tokio::test]
    async fn test_reqwest_engine_basic_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/test"))
            .and(header("user-agent", "leadrs-test-agent"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<html><body>Test content</body></html>"),
            )
            .mount(&server)
            .await;

        let engine = ReqwestEngine::new(vec!["leadrs-test-agent".to_string()]).unwrap();
        let response = engine
            .fetch(&request(&server, "/test", Duration::from_secs(10)))
            .await
            .unwrap();

        assert_eq!(response.status_code, 200);
        assert!(response.content.contains("Test content"));
        assert_eq!(response.final_url.path(), "/test");
    }

    #[tokio::test]
    async fn test_reqwest_engine_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/error"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let engine = ReqwestEngine::new(Vec::new()).unwrap();

        let err = engine
            .fetch(&request(&server, "/error", Duration::from_secs(10)))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::HttpStatus(503)));
        assert!(err.is_retryable());

        let err = engine
            .fetch(&request(&server, "/missing", Duration::from_secs(10)))
            .await
            .unwrap_err();
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_reqwest_engine_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let engine = ReqwestEngine::new(Vec::new()).unwrap();
        let err = engine
            .fetch(&request(&server, "/slow", Duration::from_millis(200)))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Timeout));
        assert!(err.is_retryable());
    }
}
