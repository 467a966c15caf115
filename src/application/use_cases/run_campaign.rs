// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::settings::Settings;
use crate::domain::repositories::lead_repository::{dedup_by_email, LeadRepository};
use crate::domain::services::content_service::{ContentGenerator, ResilientContentGenerator};
use crate::domain::services::mail_service::{MailTransport, Mailbox};
use crate::infrastructure::content::llm::LlmContentGenerator;
use crate::infrastructure::content::template::TemplateContentGenerator;
use crate::infrastructure::mail::file_mailbox::FileMailbox;
use crate::infrastructure::mail::smtp_transport::SmtpMailer;
use crate::workers::campaign_status::CampaignStatusSink;
use crate::workers::outreach_worker::{CampaignReport, OutreachScheduler};

/// 外联活动用例
///
/// 读取线索 -> 按邮箱去重 -> 执行一次外联 -> 原子重写线索文件
pub struct RunCampaignUseCase {
    scheduler: OutreachScheduler,
    repository: Arc<dyn LeadRepository>,
}

impl RunCampaignUseCase {
    pub fn new(scheduler: OutreachScheduler, repository: Arc<dyn LeadRepository>) -> Self {
        Self {
            scheduler,
            repository,
        }
    }

    /// 按配置组装内容生成、收件箱与 SMTP 会话
    ///
    /// SMTP 连接在此建立并测试，随用例一起释放
    pub async fn from_settings(
        settings: &Settings,
        repository: Arc<dyn LeadRepository>,
        status: Arc<dyn CampaignStatusSink>,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let content = Arc::new(build_content_generator(settings)?);
        let mailbox: Arc<dyn Mailbox> = Arc::new(FileMailbox::new(&settings.mailbox.dir));
        let transport: Arc<dyn MailTransport> = Arc::new(
            SmtpMailer::connect(
                &settings.smtp,
                Duration::from_secs(settings.outreach.send_timeout_secs),
            )
            .await
            .context("Failed to open SMTP session")?,
        );

        let scheduler = OutreachScheduler::new(
            transport,
            mailbox,
            content,
            status,
            settings.smtp.sender_address(),
            settings.outreach_config(),
            cancel,
        );
        Ok(Self::new(scheduler, repository))
    }

    pub async fn execute(&self) -> Result<CampaignReport> {
        let leads = self
            .repository
            .read_all()
            .await
            .context("Failed to read leads")?;
        let (mut leads, dedup) = dedup_by_email(leads);
        if dedup.dropped > 0 {
            info!(dropped = dedup.dropped, "Duplicate addresses removed before campaign");
        }

        let report = self.scheduler.run(&mut leads).await;

        self.repository
            .rewrite_all(&leads)
            .await
            .context("Failed to persist lead state")?;
        Ok(report)
    }
}

/// 构造带降级的内容生成器：主实现由 `outreach.content_provider` 决定，降级始终为模板
pub fn build_content_generator(settings: &Settings) -> Result<ResilientContentGenerator> {
    let template: Arc<dyn ContentGenerator> = Arc::new(TemplateContentGenerator::new());
    let primary: Arc<dyn ContentGenerator> = match settings.outreach.content_provider.as_str() {
        "llm" => {
            let api_key = settings
                .llm
                .api_key
                .clone()
                .context("llm.api_key is required for the llm content provider")?;
            Arc::new(
                LlmContentGenerator::new(
                    api_key,
                    settings.llm.model.clone(),
                    settings.llm.api_base_url.clone(),
                    Duration::from_secs(settings.llm.timeout_secs),
                )
                .context("Failed to build LLM content generator")?,
            )
        }
        _ => template.clone(),
    };

    Ok(ResilientContentGenerator::new(
        primary,
        template,
        Duration::from_secs(settings.outreach.content_timeout_secs),
    ))
}
