// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::models::lead::LeadRecord;

/// 外联活动状态更新
#[derive(Debug, Clone)]
pub enum CampaignUpdate {
    /// 一封首发邮件发送成功
    Sent {
        business: String,
        email: String,
        sent: u32,
        target: u32,
    },
    /// 发送失败，线索保持未发送
    SendFailed {
        business: String,
        email: String,
        error: String,
    },
    /// 当前全部线索记录
    Snapshot {
        leads: Vec<LeadRecord>,
        sent: u32,
        target: u32,
        final_pass: bool,
    },
}

/// 状态更新接收方
#[async_trait]
pub trait CampaignStatusSink: Send + Sync {
    async fn publish(&self, update: CampaignUpdate);
}

/// 写入日志的状态接收方
#[derive(Debug, Default, Clone)]
pub struct TracingStatusSink;

#[async_trait]
impl CampaignStatusSink for TracingStatusSink {
    async fn publish(&self, update: CampaignUpdate) {
        match update {
            CampaignUpdate::Sent {
                business,
                email,
                sent,
                target,
            } => info!(business = %business, email = %email, sent, target_sends = target, "Email sent"),
            CampaignUpdate::SendFailed {
                business,
                email,
                error,
            } => warn!(business = %business, email = %email, error = %error, "Failed to send email"),
            CampaignUpdate::Snapshot {
                leads,
                sent,
                target,
                final_pass,
            } => {
                let responded = leads.iter().filter(|l| l.has_response()).count();
                info!(leads = leads.len(), responded, sent, target_sends = target, final_pass, "Campaign status update");
            }
        }
    }
}

/// 通过 mpsc 通道转发的状态接收方，供前端或嵌入方消费
#[derive(Debug, Clone)]
pub struct ChannelStatusSink {
    tx: mpsc::Sender<CampaignUpdate>,
}

impl ChannelStatusSink {
    /// 创建接收方与对应的接收端
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<CampaignUpdate>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl CampaignStatusSink for ChannelStatusSink {
    async fn publish(&self, update: CampaignUpdate) {
        if self.tx.send(update).await.is_err() {
            debug!("Status receiver dropped, update discarded");
        }
    }
}
