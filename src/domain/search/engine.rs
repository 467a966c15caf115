// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use thiserror::Error;

use crate::utils::errors::LeadError;

/// 搜索错误
///
/// 网络与超时属于瞬时错误，其余（限流、页面异常）按服务不可用处理
#[derive(Debug, Error, Clone)]
pub enum SearchError {
    #[error("Search engine error: {0}")]
    EngineError(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Rate limit exceeded")]
    RateLimitExceeded,
    #[error("Timeout")]
    Timeout,
}

impl From<SearchError> for LeadError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::NetworkError(_) | SearchError::Timeout => {
                LeadError::TransientNetwork(err.to_string())
            }
            _ => LeadError::ServiceUnavailable(err.to_string()),
        }
    }
}

/// 单条搜索结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// 结果标题
    pub title: String,
    /// 结果链接（解析不到时为空）
    pub url: String,
}

#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Perform a search query, results ranked as returned by the engine
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchResult>, SearchError>;

    /// Get the name of the search engine
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::errors::ErrorKind;

    #[test]
    fn test_search_errors_map_to_lead_error_kinds() {
        let timeout: LeadError = SearchError::Timeout.into();
        assert_eq!(timeout.kind(), ErrorKind::TransientNetwork);

        let limited: LeadError = SearchError::RateLimitExceeded.into();
        assert_eq!(limited.kind(), ErrorKind::ServiceUnavailable);
    }
}
