// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use dashmap::DashMap;
use metrics::counter;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::domain::models::verification::{FailureReason, VerificationResult};
use crate::domain::services::email_filter::EmailFilter;
use crate::utils::errors::LeadError;

/// 探测错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// MX 查询失败
    #[error("dns lookup failed: {0}")]
    Dns(String),
    /// 无法连接邮件服务器
    #[error("connection failed: {0}")]
    Connect(String),
    /// 超时
    #[error("probe timed out")]
    Timeout,
    /// SMTP 会话异常
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl ProbeError {
    pub fn failure_reason(&self) -> FailureReason {
        match self {
            ProbeError::Dns(_) => FailureReason::DnsFailure,
            ProbeError::Connect(_) => FailureReason::ConnectFailed,
            ProbeError::Timeout => FailureReason::Timeout,
            ProbeError::Protocol(msg) => FailureReason::Protocol(msg.clone()),
        }
    }
}

impl From<ProbeError> for LeadError {
    fn from(err: ProbeError) -> Self {
        LeadError::TransientNetwork(err.to_string())
    }
}

/// 邮件路由解析特质
#[async_trait]
pub trait MailRouteResolver: Send + Sync {
    /// 返回 preference 最小的 MX 主机（去掉末尾的根点），没有 MX 记录时返回 `None`
    async fn primary_mail_host(&self, domain: &str) -> Result<Option<String>, ProbeError>;
}

/// 收件人探测特质
///
/// 实现只做 HELO / MAIL FROM / RCPT TO 握手，绝不发送邮件内容
#[async_trait]
pub trait RecipientProbe: Send + Sync {
    /// 返回 RCPT TO 的 SMTP 响应码
    async fn probe_recipient(&self, mail_host: &str, address: &str) -> Result<u16, ProbeError>;
}

/// 地址验证特质
///
/// 永不返回错误：所有失败都折算为不可投递
#[async_trait]
pub trait AddressVerifier: Send + Sync {
    async fn verify(&self, address: &str) -> VerificationResult;

    async fn is_deliverable(&self, address: &str) -> bool {
        self.verify(address).await.deliverable
    }
}

/// 组合式邮箱验证器
///
/// 过滤规则 -> MX 解析 -> RCPT 探测。结果按地址缓存，同一验证器生命周期内
/// 同一地址只探测一次。
pub struct EmailVerifier {
    resolver: Arc<dyn MailRouteResolver>,
    probe: Arc<dyn RecipientProbe>,
    cache: DashMap<String, VerificationResult>,
}

impl EmailVerifier {
    pub fn new(resolver: Arc<dyn MailRouteResolver>, probe: Arc<dyn RecipientProbe>) -> Self {
        Self {
            resolver,
            probe,
            cache: DashMap::new(),
        }
    }

    async fn verify_uncached(&self, address: &str) -> VerificationResult {
        if let Err(reason) = EmailFilter::check(address) {
            return VerificationResult::failed(address, reason);
        }

        let Some((_, domain)) = address.rsplit_once('@') else {
            return VerificationResult::failed(address, FailureReason::Rejected);
        };

        let mail_host = match self.resolver.primary_mail_host(domain).await {
            Ok(Some(host)) => host,
            Ok(None) => return VerificationResult::failed(address, FailureReason::NoMailRoute),
            Err(e) => {
                debug!(address, error = %e, stage = "mx_lookup", "Mail route resolution failed");
                return VerificationResult::failed(address, e.failure_reason());
            }
        };

        match self.probe.probe_recipient(&mail_host, address).await {
            Ok(code) if (200..300).contains(&code) => VerificationResult::deliverable(address),
            Ok(code) => VerificationResult::failed(address, FailureReason::RecipientRefused(code)),
            Err(e) => {
                debug!(address, mail_host, error = %e, stage = "smtp_probe", "Recipient probe failed");
                VerificationResult::failed(address, e.failure_reason())
            }
        }
    }
}

#[async_trait]
impl AddressVerifier for EmailVerifier {
    async fn verify(&self, address: &str) -> VerificationResult {
        let key = address.trim().to_lowercase();
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }

        let result = self.verify_uncached(&key).await;
        counter!("leadrs_verification_total", "outcome" => result.outcome()).increment(1);
        debug!(
            address = %key,
            deliverable = result.deliverable,
            reason = ?result.failure_reason,
            "Address verified"
        );
        self.cache.insert(key, result.clone());
        result
    }
}

#[cfg(test)]
#[path = "verification_service_test.rs"]
mod tests;
