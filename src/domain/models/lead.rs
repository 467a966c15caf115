// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::models::classification::Classification;

/// 自动跟进邮件上限
pub const MAX_FOLLOW_UPS: u8 = 4;

/// 回复状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ResponseState {
    /// 尚未收到回复
    #[default]
    #[serde(rename = "None")]
    NoResponse,
    /// 已收到回复
    Received,
}

/// 首封邮件发送状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SendState {
    /// 未发送
    #[default]
    #[serde(rename = "None")]
    NotSent,
    /// 已发送
    Sent,
}

/// 线索状态变更错误
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LeadStateError {
    #[error("follow-up cap of {0} reached")]
    FollowUpCapReached(u8),
    #[error("lead has not responded")]
    NoResponse,
}

/// 商家线索记录
///
/// 字段的状态迁移只能通过本类型的方法完成：
/// - `email` 在一次爬取中只写入一次（首个有效命中）
/// - `email_sent` 只会 NotSent -> Sent 一次
/// - `response_state` 只会 NoResponse -> Received 一次
/// - `follow_up_count` 不会超过 [`MAX_FOLLOW_UPS`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Website")]
    pub website: String,
    #[serde(rename = "Email", default)]
    pub email: Option<String>,
    #[serde(rename = "Decision Maker", default)]
    pub decision_maker: Option<String>,
    #[serde(rename = "Response", default)]
    pub response_state: ResponseState,
    #[serde(rename = "ResponseDate", default)]
    pub response_date: Option<DateTime<Utc>>,
    #[serde(rename = "ResponseContent", default)]
    pub response_content: Option<String>,
    #[serde(rename = "EmailSent", default)]
    pub email_sent: SendState,
    #[serde(rename = "LastEmailDate", default)]
    pub last_email_date: Option<DateTime<Utc>>,
    #[serde(rename = "LastEmailClassification", default)]
    pub last_email_classification: Option<Classification>,
    #[serde(rename = "FollowUpCount", default)]
    pub follow_up_count: u8,
}

impl LeadRecord {
    /// 从种子商家创建记录
    pub fn new(name: impl Into<String>, website: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            website: website.into(),
            email: None,
            decision_maker: None,
            response_state: ResponseState::NoResponse,
            response_date: None,
            response_content: None,
            email_sent: SendState::NotSent,
            last_email_date: None,
            last_email_classification: None,
            follow_up_count: 0,
        }
    }

    /// 日志中使用的线索标识
    pub fn label(&self) -> String {
        match &self.email {
            Some(email) => format!("{} <{}>", self.name, email),
            None => self.name.clone(),
        }
    }

    /// 写入解析到的邮箱，已存在时保持原值并返回 false
    pub fn resolve_email(&mut self, email: impl Into<String>) -> bool {
        if self.email.is_some() {
            return false;
        }
        self.email = Some(email.into());
        true
    }

    pub fn is_sent(&self) -> bool {
        self.email_sent == SendState::Sent
    }

    /// 标记首封邮件已发送，重复调用返回 false
    pub fn mark_sent(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_sent() {
            return false;
        }
        self.email_sent = SendState::Sent;
        self.last_email_date = Some(at);
        true
    }

    pub fn has_response(&self) -> bool {
        self.response_state == ResponseState::Received
    }

    /// 记录首次回复，已收到过回复时返回 false
    pub fn record_response(&mut self, content: impl Into<String>, at: DateTime<Utc>) -> bool {
        if self.has_response() {
            return false;
        }
        self.response_state = ResponseState::Received;
        self.response_date = Some(at);
        self.response_content = Some(content.into());
        true
    }

    /// 重新检查收件箱后刷新回复内容（不改变状态与日期）
    pub fn refresh_response_content(&mut self, content: impl Into<String>) {
        if self.has_response() {
            self.response_content = Some(content.into());
        }
    }

    /// 是否可以继续发送跟进邮件
    pub fn can_follow_up(&self, cap: u8) -> bool {
        self.has_response() && self.follow_up_count < cap.min(MAX_FOLLOW_UPS)
    }

    /// 记录一次已发送的跟进邮件，返回新的跟进计数
    pub fn record_follow_up(
        &mut self,
        classification: Classification,
        at: DateTime<Utc>,
    ) -> Result<u8, LeadStateError> {
        if !self.has_response() {
            return Err(LeadStateError::NoResponse);
        }
        if self.follow_up_count >= MAX_FOLLOW_UPS {
            return Err(LeadStateError::FollowUpCapReached(MAX_FOLLOW_UPS));
        }
        self.follow_up_count += 1;
        self.last_email_date = Some(at);
        self.last_email_classification = Some(classification);
        Ok(self.follow_up_count)
    }
}
