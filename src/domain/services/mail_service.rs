// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::errors::LeadError;

/// 待发送邮件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// 收件箱中的来信
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub from: String,
    #[serde(default)]
    pub subject: String,
    pub body: String,
    pub received_at: DateTime<Utc>,
    /// 是否已读
    #[serde(default)]
    pub seen: bool,
}

/// 已发送线程中的一封邮件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub to: String,
    #[serde(default)]
    pub subject: String,
    pub body: String,
    pub date: DateTime<Utc>,
}

/// 发信错误
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    /// 连接或认证失败
    #[error("connection failed: {0}")]
    Connection(String),
    /// 服务器拒绝投递
    #[error("message rejected: {0}")]
    Rejected(String),
    /// 无法构造邮件（地址非法等）
    #[error("invalid message: {0}")]
    InvalidMessage(String),
    #[error("send timed out")]
    Timeout,
}

impl From<TransportError> for LeadError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Connection(_) | TransportError::Timeout => {
                LeadError::TransientNetwork(err.to_string())
            }
            TransportError::InvalidMessage(_) => LeadError::ValidationRejection(err.to_string()),
            TransportError::Rejected(_) => LeadError::ServiceUnavailable(err.to_string()),
        }
    }
}

/// 收件箱错误
#[derive(Error, Debug, Clone)]
pub enum MailboxError {
    #[error("mailbox unavailable: {0}")]
    Unavailable(String),
    #[error("mailbox data malformed: {0}")]
    Malformed(String),
}

impl From<MailboxError> for LeadError {
    fn from(err: MailboxError) -> Self {
        LeadError::ServiceUnavailable(err.to_string())
    }
}

/// 发信通道
///
/// 一次活动只持有一个已认证会话，发送串行进行
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), TransportError>;
}

/// 收件箱轮询接口
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// 获取来自某地址的未读邮件，最新的在前
    async fn fetch_unread_from(&self, address: &str) -> Result<Vec<InboundMessage>, MailboxError>;

    /// 获取发往某地址的已发送邮件，最新的在前
    async fn fetch_thread_to(&self, address: &str) -> Result<Vec<ThreadMessage>, MailboxError>;
}
