// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::utils::errors::LeadError;

/// 需要重试的 HTTP 状态码
pub const RETRYABLE_STATUS_CODES: &[u16] = &[408, 429, 500, 502, 503, 504, 522, 524];

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 非 2xx 响应
    #[error("HTTP status {0}")]
    HttpStatus(u16),
    /// 超时
    #[error("Timeout")]
    Timeout,
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

impl EngineError {
    /// 判断错误是否可重试
    ///
    /// # 返回值
    ///
    /// 超时、连接失败（含 DNS 解析失败）以及可重试状态码返回true，否则返回false
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::RequestFailed(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status()
                        .is_some_and(|s| RETRYABLE_STATUS_CODES.contains(&s.as_u16()))
            }
            EngineError::HttpStatus(code) => RETRYABLE_STATUS_CODES.contains(code),
            EngineError::Timeout => true,
            EngineError::Other(_) => false,
        }
    }
}

impl From<EngineError> for LeadError {
    fn from(err: EngineError) -> Self {
        if err.is_retryable() {
            LeadError::TransientNetwork(err.to_string())
        } else {
            LeadError::ServiceUnavailable(err.to_string())
        }
    }
}

/// 页面抓取请求
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// 目标URL
    pub url: Url,
    /// 超时时间
    pub timeout: Duration,
}

/// 页面抓取响应
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP状态码
    pub status_code: u16,
    /// 响应内容
    pub content: String,
    /// 跟随重定向后的最终地址
    pub final_url: Url,
    /// 响应时间（毫秒）
    pub response_time_ms: u64,
}

/// 页面抓取特质
///
/// 非 2xx 响应以 [`EngineError::HttpStatus`] 返回
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// 执行抓取
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, EngineError>;

    /// 引擎名称
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        for code in [408, 429, 500, 502, 503, 504, 522, 524] {
            assert!(EngineError::HttpStatus(code).is_retryable(), "{}", code);
        }
        for code in [400, 401, 403, 404, 410] {
            assert!(!EngineError::HttpStatus(code).is_retryable(), "{}", code);
        }
        assert!(EngineError::Timeout.is_retryable());
        assert!(!EngineError::Other("bad url".into()).is_retryable());
    }

    #[test]
    fn test_lead_error_mapping() {
        let err: LeadError = EngineError::HttpStatus(503).into();
        assert_eq!(err.kind(), crate::utils::errors::ErrorKind::TransientNetwork);
        let err: LeadError = EngineError::HttpStatus(404).into();
        assert_eq!(err.kind(), crate::utils::errors::ErrorKind::ServiceUnavailable);
    }
}
