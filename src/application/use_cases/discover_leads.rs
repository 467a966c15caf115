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

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::settings::Settings;
use crate::domain::models::business::Business;
use crate::domain::repositories::lead_repository::LeadRepository;
use crate::domain::services::decision_maker_service::DecisionMakerFinder;
use crate::domain::services::verification_service::EmailVerifier;
use crate::engines::host_throttle::HostThrottle;
use crate::engines::reqwest_engine::ReqwestEngine;
use crate::infrastructure::search::google::GoogleSearchEngine;
use crate::infrastructure::verification::dns_resolver::DnsMailRouteResolver;
use crate::infrastructure::verification::smtp_probe::SmtpRecipientProbe;
use crate::workers::crawl_worker::{CrawlOrchestrator, CrawlSummary};

/// 线索发现用例
///
/// 读取种子商家列表，交给爬取编排器解析邮箱；结果由编排器逐条追加到线索仓库
pub struct DiscoverLeadsUseCase {
    orchestrator: CrawlOrchestrator,
    seeds_path: PathBuf,
}

impl DiscoverLeadsUseCase {
    pub fn new(orchestrator: CrawlOrchestrator, seeds_path: impl Into<PathBuf>) -> Self {
        Self {
            orchestrator,
            seeds_path: seeds_path.into(),
        }
    }

    /// 按配置组装抓取引擎、限速器、验证器与决策人查找
    pub fn from_settings(
        settings: &Settings,
        repository: Arc<dyn LeadRepository>,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let fetcher = ReqwestEngine::new(settings.crawl.user_agents.clone())
            .context("Failed to build page fetcher")?;

        let probe_config = settings.probe_config();
        let resolver = DnsMailRouteResolver::from_system(probe_config.connect_timeout);
        let verifier = EmailVerifier::new(
            Arc::new(resolver),
            Arc::new(SmtpRecipientProbe::new(probe_config)),
        );

        let search = GoogleSearchEngine::new(
            settings.search.base_url.clone(),
            Duration::from_secs(settings.search.timeout_secs),
        )
        .context("Failed to build search engine")?;
        let finder = DecisionMakerFinder::new(
            Arc::new(search),
            settings.search.location.clone(),
            settings.search.result_limit,
        );

        let orchestrator = CrawlOrchestrator::new(
            Arc::new(fetcher),
            HostThrottle::new(settings.throttle_config()),
            Arc::new(verifier),
            repository,
            settings.crawl_config(),
            cancel,
        )
        .with_decision_maker_finder(finder);

        Ok(Self::new(orchestrator, &settings.storage.seeds_path))
    }

    pub async fn execute(&self) -> Result<CrawlSummary> {
        let seeds = load_seeds(&self.seeds_path).await?;
        info!(seeds = seeds.len(), path = %self.seeds_path.display(), "Loaded seed businesses");
        Ok(self.orchestrator.run(seeds).await)
    }
}

/// 读取种子商家（`{Name, Website}` 对象组成的 JSON 数组）
pub async fn load_seeds(path: &Path) -> Result<Vec<Business>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read seeds from {}", path.display()))?;
    let seeds: Vec<Business> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid seed file {}", path.display()))?;
    Ok(seeds
        .into_iter()
        .filter(|b| !b.website.trim().is_empty())
        .collect())
}
