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

use futures::stream::{self, StreamExt};
use metrics::counter;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::config::settings::MAX_PAGES_PER_BUSINESS;
use crate::domain::models::business::Business;
use crate::domain::models::crawl_task::CrawlTask;
use crate::domain::models::lead::LeadRecord;
use crate::domain::repositories::lead_repository::LeadRepository;
use crate::domain::services::candidate_generator::CandidateGenerator;
use crate::domain::services::crawl_service::analyze_page;
use crate::domain::services::decision_maker_service::DecisionMakerFinder;
use crate::domain::services::verification_service::AddressVerifier;
use crate::engines::host_throttle::HostThrottle;
use crate::engines::traits::{FetchRequest, FetchResponse, PageFetcher};
use crate::infrastructure::observability::metrics::{LEADS_RESOLVED_TOTAL, PAGES_FETCHED_TOTAL};
use crate::queue::crawl_queue::CrawlQueue;
use crate::utils::retry_policy::RetryPolicy;
use crate::utils::url_utils::{host_key, parse_website, root_domain};

/// 爬取编排器配置
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// 每个商家最多抓取的页面数（含首页），不超过 10
    pub max_pages_per_business: usize,
    /// 首页的剩余链接深度
    pub max_link_depth: u32,
    /// 同时处理的商家数
    pub max_concurrent_businesses: usize,
    /// 单次请求超时
    pub request_timeout: Duration,
    /// 瞬时错误的重试策略
    pub retry_policy: RetryPolicy,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages_per_business: MAX_PAGES_PER_BUSINESS,
            max_link_depth: 3,
            max_concurrent_businesses: 8,
            request_timeout: Duration::from_secs(60),
            retry_policy: RetryPolicy::with_max_retries(3),
        }
    }
}

/// 单个商家的终态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// 通过决策人猜测并验证得到邮箱
    ResolvedByGuess,
    /// 通过爬取网站得到邮箱
    ResolvedByCrawl,
    /// 页面预算或队列耗尽，没有邮箱
    Exhausted,
    /// 运行被取消
    Cancelled,
}

enum CrawlState {
    Found(String),
    Exhausted,
    Cancelled,
}

/// 一次运行的汇总
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub resolved_by_guess: usize,
    pub resolved_by_crawl: usize,
    pub exhausted: usize,
    pub cancelled: usize,
    /// 没有找到邮箱的商家名
    pub unresolved: Vec<String>,
}

impl CrawlSummary {
    fn record(&mut self, business: String, outcome: CrawlOutcome) {
        match outcome {
            CrawlOutcome::ResolvedByGuess => self.resolved_by_guess += 1,
            CrawlOutcome::ResolvedByCrawl => self.resolved_by_crawl += 1,
            CrawlOutcome::Exhausted => {
                self.exhausted += 1;
                self.unresolved.push(business);
            }
            CrawlOutcome::Cancelled => {
                self.cancelled += 1;
                self.unresolved.push(business);
            }
        }
    }

    pub fn resolved(&self) -> usize {
        self.resolved_by_guess + self.resolved_by_crawl
    }
}

/// 爬取编排器
///
/// 对每个种子商家执行：查找决策人 -> 猜测并验证邮箱 -> 否则爬取网站。
/// 多个商家并发处理，对同一主机的请求由 [`HostThrottle`] 限速；
/// 解析到邮箱的记录立即追加到仓库。
pub struct CrawlOrchestrator {
    fetcher: Arc<dyn PageFetcher>,
    throttle: HostThrottle,
    verifier: Arc<dyn AddressVerifier>,
    finder: Option<DecisionMakerFinder>,
    repository: Arc<dyn LeadRepository>,
    config: CrawlConfig,
    cancel: CancellationToken,
}

impl CrawlOrchestrator {
    /// 创建新的编排器
    ///
    /// # 参数
    ///
    /// * `fetcher` - 页面抓取引擎
    /// * `throttle` - 主机级限速器
    /// * `verifier` - 地址验证器
    /// * `repository` - 线索仓库
    /// * `config` - 爬取配置
    /// * `cancel` - 取消令牌，取消后不再开始新商家或新页面
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        throttle: HostThrottle,
        verifier: Arc<dyn AddressVerifier>,
        repository: Arc<dyn LeadRepository>,
        config: CrawlConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            fetcher,
            throttle,
            verifier,
            finder: None,
            repository,
            config,
            cancel,
        }
    }

    /// 启用决策人查找（猜测路径）
    pub fn with_decision_maker_finder(mut self, finder: DecisionMakerFinder) -> Self {
        self.finder = Some(finder);
        self
    }

    /// 处理全部种子商家，返回汇总
    pub async fn run(&self, businesses: Vec<Business>) -> CrawlSummary {
        let total = businesses.len();
        info!(businesses = total, "Crawl started");

        let outcomes: Vec<(String, CrawlOutcome)> = stream::iter(businesses.into_iter().enumerate())
            .map(|(owner, business)| async move {
                let name = business.name.clone();
                let outcome = self.process_business(owner, business).await;
                (name, outcome)
            })
            .buffer_unordered(self.config.max_concurrent_businesses.max(1))
            .collect()
            .await;

        let mut summary = CrawlSummary::default();
        for (name, outcome) in outcomes {
            summary.record(name, outcome);
        }

        for name in &summary.unresolved {
            info!(business = %name, "No email found");
        }
        info!(
            businesses = total,
            resolved_by_guess = summary.resolved_by_guess,
            resolved_by_crawl = summary.resolved_by_crawl,
            exhausted = summary.exhausted,
            cancelled = summary.cancelled,
            "Crawl finished"
        );
        summary
    }

    #[instrument(skip(self, business), fields(business = %business.name))]
    async fn process_business(&self, owner: usize, business: Business) -> CrawlOutcome {
        if self.cancel.is_cancelled() {
            return CrawlOutcome::Cancelled;
        }

        let mut lead = business.into_lead();
        let Some(domain) = root_domain(&lead.website) else {
            warn!(website = %lead.website, stage = "seed", "Invalid website, skipping business");
            return CrawlOutcome::Exhausted;
        };

        if let Some(finder) = &self.finder {
            if let Some(person) = finder.find(&lead.name).await {
                info!(decision_maker = %person, "Found potential decision maker");
                if let Some(email) = self.guess_and_verify(&person, &domain).await {
                    lead.decision_maker = Some(person);
                    lead.resolve_email(email);
                    self.persist(&lead, "guess").await;
                    return CrawlOutcome::ResolvedByGuess;
                }
                info!("No verified email for decision maker, crawling website");
            }
        }

        match self.crawl_site(owner, &lead, &domain).await {
            CrawlState::Found(email) => {
                lead.resolve_email(email);
                self.persist(&lead, "crawl").await;
                CrawlOutcome::ResolvedByCrawl
            }
            CrawlState::Exhausted => CrawlOutcome::Exhausted,
            CrawlState::Cancelled => CrawlOutcome::Cancelled,
        }
    }

    /// 按优先级验证候选地址，返回第一个可投递的地址
    async fn guess_and_verify(&self, person: &str, domain: &str) -> Option<String> {
        for candidate in CandidateGenerator::generate(person, domain) {
            if self.cancel.is_cancelled() {
                return None;
            }
            let result = self.verifier.verify(&candidate).await;
            if result.deliverable {
                info!(email = %candidate, "Verified guessed email");
                return Some(candidate);
            }
            debug!(candidate = %candidate, reason = ?result.failure_reason, "Candidate not deliverable");
        }
        None
    }

    async fn crawl_site(&self, owner: usize, lead: &LeadRecord, domain: &str) -> CrawlState {
        let homepage = match parse_website(&lead.website) {
            Ok(url) => url,
            Err(e) => {
                warn!(website = %lead.website, error = %e, stage = "seed", "Invalid website URL");
                return CrawlState::Exhausted;
            }
        };

        let page_cap = self.config.max_pages_per_business.min(MAX_PAGES_PER_BUSINESS);
        let mut queue = CrawlQueue::new(
            CrawlTask::homepage(homepage, owner, self.config.max_link_depth),
            page_cap,
        );

        loop {
            if self.cancel.is_cancelled() {
                return CrawlState::Cancelled;
            }
            let Some(task) = queue.next_task() else {
                break;
            };

            let Some(page) = self.fetch_page(&task.url, &lead.name).await else {
                continue;
            };

            let analysis = analyze_page(&page.content, &page.final_url, domain);
            if let Some(email) = analysis.email {
                info!(email = %email, url = %page.final_url, pages = queue.pages_dequeued(), "Found email");
                return CrawlState::Found(email);
            }

            let mut enqueued = 0;
            for link in analysis.links {
                if let Some(child) = task.child(link.url, link.priority) {
                    if queue.push(child) {
                        enqueued += 1;
                    }
                }
            }
            debug!(url = %task.url, enqueued, pending = queue.pending(), "Page analyzed");
        }

        debug!(pages = queue.pages_dequeued(), cap_reached = queue.cap_reached(), "Crawl budget exhausted");
        CrawlState::Exhausted
    }

    /// 抓取单个页面，瞬时错误按重试策略重试；失败时返回 None（死分支）
    async fn fetch_page(&self, url: &Url, business: &str) -> Option<FetchResponse> {
        let host = host_key(url);
        let request = FetchRequest {
            url: url.clone(),
            timeout: self.config.request_timeout,
        };
        let policy = &self.config.retry_policy;
        let mut attempt = 0;

        loop {
            let permit = match self.throttle.acquire(&host).await {
                Ok(permit) => permit,
                Err(e) => {
                    error!(business, url = %url, stage = "throttle", error = %e, "Failed to acquire fetch permit");
                    return None;
                }
            };
            let started = Instant::now();
            let result = self.fetcher.fetch(&request).await;
            let latency = started.elapsed();
            drop(permit);
            counter!(PAGES_FETCHED_TOTAL).increment(1);

            match result {
                Ok(response) => {
                    self.throttle.record(&host, latency, true);
                    debug!(url = %url, status = response.status_code, elapsed_ms = response.response_time_ms, "Page fetched");
                    return Some(response);
                }
                Err(e) => {
                    let retryable = e.is_retryable();
                    self.throttle.record(&host, latency, !retryable);
                    if retryable && policy.should_retry(attempt) && !self.cancel.is_cancelled() {
                        attempt += 1;
                        let backoff = policy.calculate_backoff(attempt);
                        debug!(url = %url, attempt, ?backoff, error = %e, "Retrying page fetch");
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                    warn!(business, url = %url, stage = "fetch", error = %e, "Page fetch failed, dropping branch");
                    return None;
                }
            }
        }
    }

    async fn persist(&self, lead: &LeadRecord, path: &'static str) {
        counter!(LEADS_RESOLVED_TOTAL, "path" => path).increment(1);
        match self.repository.append(lead).await {
            Ok(()) => info!(lead = %lead.label(), path, "Lead resolved"),
            Err(e) => error!(lead = %lead.label(), stage = "persist", error = %e, "Failed to append lead"),
        }
    }
}

#[cfg(test)]
#[path = "crawl_worker_test.rs"]
mod tests;
