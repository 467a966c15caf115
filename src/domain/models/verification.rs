// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::fmt;

/// 地址验证失败原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// 命中过滤规则（占位域名、数字后缀、图片后缀等）
    Rejected,
    /// 非 ASCII 地址
    Encoding,
    /// MX 查询失败
    DnsFailure,
    /// 域名没有 MX 记录
    NoMailRoute,
    ConnectFailed,
    Timeout,
    /// 收件人被拒绝，附带 SMTP 状态码
    RecipientRefused(u16),
    Protocol(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Rejected => f.write_str("rejected"),
            FailureReason::Encoding => f.write_str("encoding"),
            FailureReason::DnsFailure => f.write_str("dns_failure"),
            FailureReason::NoMailRoute => f.write_str("no_mail_route"),
            FailureReason::ConnectFailed => f.write_str("connect_failed"),
            FailureReason::Timeout => f.write_str("timeout"),
            FailureReason::RecipientRefused(code) => write!(f, "recipient_refused({})", code),
            FailureReason::Protocol(msg) => write!(f, "protocol({})", msg),
        }
    }
}

/// 单个地址的验证结果，只在本轮爬取中存在
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub address: String,
    pub deliverable: bool,
    pub failure_reason: Option<FailureReason>,
}

impl VerificationResult {
    pub fn deliverable(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            deliverable: true,
            failure_reason: None,
        }
    }

    pub fn failed(address: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            address: address.into(),
            deliverable: false,
            failure_reason: Some(reason),
        }
    }

    /// 指标标签
    pub fn outcome(&self) -> &'static str {
        match &self.failure_reason {
            None => "deliverable",
            Some(FailureReason::Rejected) | Some(FailureReason::Encoding) => "rejected",
            Some(FailureReason::DnsFailure) | Some(FailureReason::NoMailRoute) => "no_route",
            Some(FailureReason::RecipientRefused(_)) => "refused",
            Some(_) => "error",
        }
    }
}
