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
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use leadrs::application::use_cases::discover_leads::DiscoverLeadsUseCase;
use leadrs::application::use_cases::export_leads::ExportLeadsUseCase;
use leadrs::application::use_cases::run_campaign::RunCampaignUseCase;
use leadrs::config::settings::Settings;
use leadrs::domain::repositories::lead_repository::LeadRepository;
use leadrs::infrastructure::observability::metrics;
use leadrs::infrastructure::repositories::jsonl_lead_repo::JsonlLeadRepository;
use leadrs::utils::telemetry;
use leadrs::workers::campaign_status::TracingStatusSink;

#[derive(Parser, Debug)]
#[command(name = "leadrs", version, about = "Lead discovery and paced email outreach")]
struct Cli {
    /// 额外的配置文件（覆盖 config/default 与 config/{APP_ENVIRONMENT}）
    #[arg(long, global = true, env = "LEADRS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 爬取种子商家并解析联系邮箱
    Discover,
    /// 执行一次外联活动（首发、拉取回复、跟进）
    Campaign,
    /// 按邮箱去重线索文件
    Export {
        /// 输出文件，缺省时原地重写
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// 主函数
///
/// 加载配置、初始化日志，按子命令执行对应用例
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load configuration
    let config_file = cli.config.as_ref().map(|p| p.to_string_lossy().into_owned());
    let settings = Settings::load(config_file.as_deref()).context("Failed to load configuration")?;

    // 2. Initialize logging and metric descriptions
    telemetry::init_telemetry(settings.log.json);
    metrics::describe_metrics();
    info!("Starting leadrs...");

    // 3. Ctrl-C cancels the run; in-flight work drains
    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }
        shutdown.cancel();
    });

    let repository: Arc<dyn LeadRepository> =
        Arc::new(JsonlLeadRepository::new(&settings.storage.leads_path));

    match cli.command {
        Command::Discover => {
            settings.validate_for_discovery()?;
            let use_case = DiscoverLeadsUseCase::from_settings(&settings, repository.clone(), cancel)?;
            let summary = use_case.execute().await?;
            let dedup = ExportLeadsUseCase::new(repository).execute(None).await?;
            info!(
                resolved = summary.resolved(),
                exhausted = summary.exhausted,
                cancelled = summary.cancelled,
                duplicates_dropped = dedup.dropped,
                "Discovery complete"
            );
        }
        Command::Campaign => {
            settings.validate_for_campaign()?;
            let use_case = RunCampaignUseCase::from_settings(
                &settings,
                repository,
                Arc::new(TracingStatusSink),
                cancel,
            )
            .await?;
            let report = use_case.execute().await?;
            info!(
                target_sends = report.target,
                sent = report.sent,
                failed = report.failed,
                follow_ups = report.follow_ups_sent,
                "Campaign complete"
            );
        }
        Command::Export { output } => {
            let report = ExportLeadsUseCase::new(repository).execute(output).await?;
            info!(
                kept = report.kept,
                dropped = report.dropped,
                shared_addresses = report.collisions.len(),
                "Export complete"
            );
        }
    }

    Ok(())
}
