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

use crate::engines::traits::{EngineError, FetchRequest, FetchResponse, PageFetcher};
use async_trait::async_trait;
use rand::seq::IndexedRandom;
use reqwest::header::USER_AGENT;
use std::time::Instant;

const FALLBACK_USER_AGENT: &str = "Mozilla/5.0 (compatible; leadrs/0.1)";

/// 抓取引擎
///
/// 基于reqwest实现的基本HTTP抓取引擎，所有请求共享一个连接池，
/// 每个请求从 User-Agent 列表中随机选择一个
pub struct ReqwestEngine {
    client: reqwest::Client,
    user_agents: Vec<String>,
}

impl ReqwestEngine {
    /// 创建抓取引擎
    ///
    /// # 参数
    ///
    /// * `user_agents` - 轮换使用的 User-Agent 列表，为空时使用内置值
    pub fn new(user_agents: Vec<String>) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self {
            client,
            user_agents,
        })
    }

    fn pick_user_agent(&self) -> &str {
        self.user_agents
            .choose(&mut rand::rng())
            .map(String::as_str)
            .unwrap_or(FALLBACK_USER_AGENT)
    }
}

#[async_trait]
impl PageFetcher for ReqwestEngine {
    /// 执行HTTP抓取
    ///
    /// # 参数
    ///
    /// * `request` - 抓取请求
    ///
    /// # 返回值
    ///
    /// * `Ok(FetchResponse)` - 2xx 响应
    /// * `Err(EngineError)` - 网络错误、超时或非 2xx 状态
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, EngineError> {
        let user_agent = self.pick_user_agent().to_string();

        let start = Instant::now();
        let response = self
            .client
            .get(request.url.clone())
            .header(USER_AGENT, user_agent)
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EngineError::Timeout
                } else {
                    EngineError::RequestFailed(e)
                }
            })?;

        let status_code = response.status().as_u16();
        if !response.status().is_success() {
            return Err(EngineError::HttpStatus(status_code));
        }

        let final_url = response.url().clone();
        let content = response.text().await?;

        Ok(FetchResponse {
            status_code,
            content,
            final_url,
            response_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
