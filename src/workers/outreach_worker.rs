// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Utc;
use metrics::counter;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::models::classification::Classification;
use crate::domain::models::lead::{LeadRecord, MAX_FOLLOW_UPS};
use crate::domain::services::content_service::{
    EmailDraft, FollowUpRequest, InitialEmailRequest, ResilientContentGenerator,
};
use crate::domain::services::mail_service::{MailTransport, Mailbox, OutgoingEmail};
use crate::infrastructure::observability::metrics::EMAILS_SENT_TOTAL;
use crate::workers::campaign_status::{CampaignStatusSink, CampaignUpdate};

/// 外联调度器配置
#[derive(Debug, Clone)]
pub struct OutreachConfig {
    /// 每日目标发送数下限
    pub min_daily_emails: u32,
    /// 每日目标发送数上限
    pub max_daily_emails: u32,
    /// 发送时间窗口
    pub window: Duration,
    /// 间隔抖动（正负）
    pub jitter: Duration,
    /// 单次间隔上限
    pub max_delay: Duration,
    /// 跟进邮件上限，不超过 4
    pub follow_up_cap: u8,
    /// 每成功发送多少封推送一次快照
    pub status_every: u32,
    pub sender_name: String,
    pub sender_site: String,
    pub custom_offer: String,
    /// 固定随机种子时发送顺序与间隔可复现
    pub rng_seed: Option<u64>,
}

impl Default for OutreachConfig {
    fn default() -> Self {
        Self {
            min_daily_emails: 180,
            max_daily_emails: 220,
            window: Duration::from_secs(8 * 60 * 60),
            jitter: Duration::from_secs(5),
            max_delay: Duration::from_secs(600),
            follow_up_cap: MAX_FOLLOW_UPS,
            status_every: 2,
            sender_name: String::new(),
            sender_site: String::new(),
            custom_offer: String::new(),
            rng_seed: None,
        }
    }
}

/// 发送节奏
#[derive(Debug, Clone, PartialEq)]
pub struct PacingPlan {
    /// 本次目标发送数
    pub target: u32,
    /// 平均间隔 = 窗口 / 目标数
    pub interval: Duration,
    jitter: Duration,
    max_delay: Duration,
}

impl PacingPlan {
    pub fn new(target: u32, window: Duration, jitter: Duration, max_delay: Duration) -> Self {
        let interval = if target == 0 { window } else { window / target };
        Self {
            target,
            interval,
            jitter,
            max_delay,
        }
    }

    /// 在配置范围内均匀随机选取目标数
    pub fn choose<R: Rng + ?Sized>(config: &OutreachConfig, rng: &mut R) -> Self {
        let low = config.min_daily_emails.min(config.max_daily_emails);
        let high = config.min_daily_emails.max(config.max_daily_emails);
        let target = rng.random_range(low..=high);
        Self::new(target, config.window, config.jitter, config.max_delay)
    }

    /// 下一次发送前的等待时间：`interval ± jitter`，落在 `[0, max_delay]` 内
    pub fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let jitter = self.jitter.as_secs_f64();
        let offset = if jitter > 0.0 {
            rng.random_range(-jitter..=jitter)
        } else {
            0.0
        };
        let secs = (self.interval.as_secs_f64() + offset).clamp(0.0, self.max_delay.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

/// 一次外联活动的报告
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CampaignReport {
    pub target: u32,
    pub sent: u32,
    pub failed: u32,
    pub skipped: u32,
    pub responses_ingested: u32,
    pub follow_ups_sent: u32,
    pub cancelled: bool,
}

/// 外联调度器
///
/// 一次运行按顺序执行：首发邮件（限速）-> 拉取回复 -> 发送跟进邮件。
/// 同一时刻只有一封邮件在发送；只有发送成功后才标记已发送。
pub struct OutreachScheduler {
    transport: Arc<dyn MailTransport>,
    mailbox: Arc<dyn Mailbox>,
    content: Arc<ResilientContentGenerator>,
    status: Arc<dyn CampaignStatusSink>,
    sender_address: String,
    config: OutreachConfig,
    cancel: CancellationToken,
}

impl OutreachScheduler {
    /// 创建调度器
    ///
    /// # 参数
    ///
    /// * `transport` - 发信通道（整个运行期间共用一个会话）
    /// * `mailbox` - 收件箱，用于拉取回复与已发送线程
    /// * `content` - 带降级的内容生成器
    /// * `status` - 状态更新接收方
    /// * `sender_address` - 发件地址
    /// * `config` - 调度配置
    /// * `cancel` - 取消令牌
    pub fn new(
        transport: Arc<dyn MailTransport>,
        mailbox: Arc<dyn Mailbox>,
        content: Arc<ResilientContentGenerator>,
        status: Arc<dyn CampaignStatusSink>,
        sender_address: impl Into<String>,
        config: OutreachConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            transport,
            mailbox,
            content,
            status,
            sender_address: sender_address.into(),
            config,
            cancel,
        }
    }

    /// 执行一次完整的外联活动，原地更新线索状态
    ///
    /// 线索切片保持原有顺序，只打乱访问顺序
    pub async fn run(&self, leads: &mut [LeadRecord]) -> CampaignReport {
        let mut rng = match self.config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let plan = PacingPlan::choose(&self.config, &mut rng);
        let mut report = CampaignReport {
            target: plan.target,
            ..CampaignReport::default()
        };
        info!(
            leads = leads.len(),
            target_sends = plan.target,
            interval_secs = plan.interval.as_secs_f64(),
            "Starting outreach campaign"
        );

        let offer = self
            .content
            .personalize_offer(&self.config.sender_site, &self.config.custom_offer)
            .await;
        let mut exemplar: Option<String> = None;

        self.primary_pass(leads, &plan, &mut rng, &offer, exemplar.as_deref(), &mut report)
            .await;

        self.status
            .publish(CampaignUpdate::Snapshot {
                leads: leads.to_vec(),
                sent: report.sent,
                target: plan.target,
                final_pass: true,
            })
            .await;
        info!(sent = report.sent, failed = report.failed, skipped = report.skipped, "Primary pass finished");

        if self.cancel.is_cancelled() {
            report.cancelled = true;
            info!("Campaign cancelled, skipping response polling and follow-ups");
            return report;
        }

        report.responses_ingested = self.ingest_responses(leads).await;
        report.follow_ups_sent = self.follow_up_pass(leads, &offer, &mut exemplar).await;

        info!(
            sent = report.sent,
            responses = report.responses_ingested,
            follow_ups = report.follow_ups_sent,
            "Outreach campaign finished"
        );
        report
    }

    async fn primary_pass(
        &self,
        leads: &mut [LeadRecord],
        plan: &PacingPlan,
        rng: &mut StdRng,
        offer: &str,
        exemplar: Option<&str>,
        report: &mut CampaignReport,
    ) {
        let mut order: Vec<usize> = (0..leads.len()).collect();
        order.shuffle(rng);

        for index in order {
            if report.sent >= plan.target || self.cancel.is_cancelled() {
                break;
            }
            let lead = &mut leads[index];
            if lead.is_sent() {
                debug!(lead = %lead.label(), "Email already sent, skipping");
                report.skipped += 1;
                continue;
            }
            let Some(address) = lead.email.clone() else {
                info!(business = %lead.name, "No email address, skipping");
                report.skipped += 1;
                continue;
            };

            let draft = self.initial_draft(lead, offer, exemplar).await;
            match self.send(&address, &draft).await {
                Ok(()) => {
                    lead.mark_sent(Utc::now());
                    report.sent += 1;
                    counter!(EMAILS_SENT_TOTAL, "kind" => "initial").increment(1);
                    self.status
                        .publish(CampaignUpdate::Sent {
                            business: lead.name.clone(),
                            email: address,
                            sent: report.sent,
                            target: plan.target,
                        })
                        .await;

                    if self.config.status_every > 0 && report.sent % self.config.status_every == 0 {
                        self.status
                            .publish(CampaignUpdate::Snapshot {
                                leads: leads.to_vec(),
                                sent: report.sent,
                                target: plan.target,
                                final_pass: false,
                            })
                            .await;
                    }
                }
                Err(error) => {
                    report.failed += 1;
                    warn!(business = %lead.name, email = %address, stage = "send", error = %error, "Initial email failed");
                    self.status
                        .publish(CampaignUpdate::SendFailed {
                            business: lead.name.clone(),
                            email: address,
                            error,
                        })
                        .await;
                }
            }

            if report.sent >= plan.target {
                break;
            }
            self.pause(plan.next_delay(rng)).await;
        }
    }

    async fn initial_draft(&self, lead: &LeadRecord, offer: &str, exemplar: Option<&str>) -> EmailDraft {
        let prospect_summary = self.content.personalize_prospect(&lead.website).await;
        let request = InitialEmailRequest {
            offer_summary: offer.to_string(),
            prospect_summary,
            sender_name: self.config.sender_name.clone(),
            sender_site: self.config.sender_site.clone(),
            prospect_name: prospect_name(lead),
            last_positive_reply: exemplar.map(str::to_string),
        };
        self.content.craft_initial_email(&request).await
    }

    /// 拉取回复：未回复的线索记录首次回复，已回复的刷新内容
    async fn ingest_responses(&self, leads: &mut [LeadRecord]) -> u32 {
        let mut ingested = 0;
        for lead in leads.iter_mut() {
            let Some(address) = lead.email.clone() else {
                continue;
            };
            let messages = match self.mailbox.fetch_unread_from(&address).await {
                Ok(messages) => messages,
                Err(e) => {
                    warn!(lead = %lead.label(), stage = "poll", error = %e, "Failed to check for responses");
                    continue;
                }
            };
            let Some(newest) = messages.into_iter().next() else {
                continue;
            };

            if lead.record_response(newest.body.clone(), newest.received_at) {
                ingested += 1;
                info!(lead = %lead.label(), "Response received");
            } else {
                lead.refresh_response_content(newest.body);
            }
        }
        ingested
    }

    async fn follow_up_pass(
        &self,
        leads: &mut [LeadRecord],
        offer: &str,
        exemplar: &mut Option<String>,
    ) -> u32 {
        let mut sent = 0;
        for lead in leads.iter_mut() {
            if self.cancel.is_cancelled() {
                break;
            }
            if !lead.can_follow_up(self.config.follow_up_cap) {
                continue;
            }
            let (Some(address), Some(response)) = (lead.email.clone(), lead.response_content.clone())
            else {
                continue;
            };

            let thread = match self.mailbox.fetch_thread_to(&address).await {
                Ok(thread) => thread,
                Err(e) => {
                    warn!(lead = %lead.label(), stage = "thread", error = %e, "Failed to retrieve email thread");
                    Vec::new()
                }
            };
            let classification = self.content.classify_response(&response).await;
            let positive_reply = self.content.extract_last_positive_reply(&thread).await;
            let prospect_summary = self.content.personalize_prospect(&lead.website).await;

            let request = FollowUpRequest {
                offer_summary: offer.to_string(),
                prospect_summary,
                sender_name: self.config.sender_name.clone(),
                sender_site: self.config.sender_site.clone(),
                prospect_name: prospect_name(lead),
                thread,
                classification,
                last_positive_reply: positive_reply.clone().or_else(|| exemplar.clone()),
            };
            let draft = self.content.craft_follow_up(&request).await;

            match self.send(&address, &draft).await {
                Ok(()) => match lead.record_follow_up(classification, Utc::now()) {
                    Ok(count) => {
                        sent += 1;
                        counter!(EMAILS_SENT_TOTAL, "kind" => "follow_up").increment(1);
                        info!(lead = %lead.label(), count, %classification, "Follow-up sent");
                    }
                    Err(e) => warn!(lead = %lead.label(), error = %e, "Follow-up not recorded"),
                },
                Err(error) => {
                    warn!(lead = %lead.label(), stage = "follow_up", error = %error, "Follow-up failed")
                }
            }

            if classification == Classification::Interested {
                if let Some(reply) = positive_reply {
                    *exemplar = Some(reply);
                }
            }
        }
        sent
    }

    async fn send(&self, to: &str, draft: &EmailDraft) -> Result<(), String> {
        let email = OutgoingEmail {
            from: self.sender_address.clone(),
            to: to.to_string(),
            subject: draft.subject.clone(),
            body: draft.body.clone(),
        };
        self.transport.send(&email).await.map_err(|e| e.to_string())
    }

    /// 可被取消打断的等待
    async fn pause(&self, delay: Duration) {
        if delay.is_zero() {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = self.cancel.cancelled() => debug!("Pacing sleep interrupted"),
        }
    }
}

fn prospect_name(lead: &LeadRecord) -> String {
    lead.decision_maker
        .clone()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| lead.name.clone())
}

#[cfg(test)]
#[path = "outreach_worker_test.rs"]
mod tests;
