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

use dashmap::DashMap;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};
use tracing::debug;

/// 主机级限速配置
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// 全局并发上限
    pub global_concurrency: usize,
    /// 单主机并发上限
    pub per_host_concurrency: usize,
    /// 同一主机两次请求的基础间隔
    pub download_delay: Duration,
    /// 自适应间隔上限
    pub max_delay: Duration,
    /// 目标并发（自适应间隔 = 延迟 / 目标并发）
    pub target_concurrency: f64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            global_concurrency: 8,
            per_host_concurrency: 2,
            download_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
            target_concurrency: 1.0,
        }
    }
}

/// 抓取许可，释放时归还全局与主机并发名额
#[derive(Debug)]
pub struct HostPermit {
    _global: OwnedSemaphorePermit,
    _host: OwnedSemaphorePermit,
}

/// 主机级限速器
///
/// - 全局信号量限制总并发
/// - 每个主机一个信号量限制单主机并发
/// - governor 按主机限制基础请求间隔
/// - 自适应间隔根据响应延迟与错误只增不减地放慢请求，不改变并发
#[derive(Clone)]
pub struct HostThrottle {
    config: ThrottleConfig,
    global: Arc<Semaphore>,
    hosts: Arc<DashMap<String, Arc<Semaphore>>>,
    limiter: Option<Arc<DefaultKeyedRateLimiter<String>>>,
    delays: Arc<DashMap<String, Duration>>,
}

impl HostThrottle {
    pub fn new(config: ThrottleConfig) -> Self {
        let limiter = Quota::with_period(config.download_delay)
            .map(|quota| Arc::new(RateLimiter::keyed(quota)));
        Self {
            global: Arc::new(Semaphore::new(config.global_concurrency.max(1))),
            hosts: Arc::new(DashMap::new()),
            limiter,
            delays: Arc::new(DashMap::new()),
            config,
        }
    }

    /// 获取对某主机发起一次请求的许可
    ///
    /// 依次等待主机名额、基础间隔以及自适应附加间隔，最后才占用全局名额，
    /// 被放慢的主机不会占着全局名额空等
    pub async fn acquire(&self, host: &str) -> Result<HostPermit, AcquireError> {
        let host_permit = self.host_semaphore(host).acquire_owned().await?;

        if let Some(limiter) = &self.limiter {
            limiter.until_key_ready(&host.to_string()).await;
        }

        let extra = self.current_delay(host).saturating_sub(self.config.download_delay);
        if !extra.is_zero() {
            tokio::time::sleep(extra).await;
        }

        let global = self.global.clone().acquire_owned().await?;
        Ok(HostPermit {
            _global: global,
            _host: host_permit,
        })
    }

    /// 记录一次请求结果，调整该主机的自适应间隔
    ///
    /// 成功时向 `latency / target_concurrency` 靠拢，失败时加倍；
    /// 结果始终落在 `[download_delay, max_delay]` 内
    pub fn record(&self, host: &str, latency: Duration, success: bool) {
        let baseline = self.config.download_delay;
        let ceiling = self.config.max_delay.max(baseline);
        let mut entry = self.delays.entry(host.to_string()).or_insert(baseline);
        let current = *entry;

        let next = if success {
            let target = latency.div_f64(self.config.target_concurrency.max(0.1));
            (current + target) / 2
        } else {
            current.max(Duration::from_millis(100)) * 2
        };
        let next = next.clamp(baseline, ceiling);

        if next != current {
            debug!(host, ?current, ?next, success, "Adjusted host delay");
        }
        *entry = next;
    }

    /// 主机当前的请求间隔
    pub fn current_delay(&self, host: &str) -> Duration {
        self.delays
            .get(host)
            .map(|d| *d)
            .unwrap_or(self.config.download_delay)
    }

    fn host_semaphore(&self, host: &str) -> Arc<Semaphore> {
        self.hosts
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(self.config.per_host_concurrency.max(1))))
            .clone()
    }
}
