// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use lettre::transport::smtp::client::SmtpConnection;
use lettre::transport::smtp::commands::{Mail, Rcpt};
use lettre::transport::smtp::extension::ClientId;
use lettre::transport::smtp::response::Code;
use lettre::Address;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::domain::services::verification_service::{ProbeError, RecipientProbe};

const SMTP_PORT: u16 = 25;

/// SMTP 探测配置
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// 连接超时；整个会话的截止时间为其两倍
    pub connect_timeout: Duration,
    /// EHLO 使用的主机名
    pub helo_name: String,
    /// MAIL FROM 地址，`None` 表示空发件人 `<>`
    pub sender: Option<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            helo_name: "localhost".to_string(),
            sender: None,
        }
    }
}

/// 基于 lettre 的收件人探测
///
/// lettre 的 `SmtpConnection` 是阻塞的，因此握手在阻塞线程池中执行，
/// 外层再套一个总截止时间。只发送 EHLO / MAIL FROM / RCPT TO / QUIT，不发送邮件内容。
pub struct SmtpRecipientProbe {
    config: ProbeConfig,
}

impl SmtpRecipientProbe {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RecipientProbe for SmtpRecipientProbe {
    async fn probe_recipient(&self, mail_host: &str, address: &str) -> Result<u16, ProbeError> {
        let config = self.config.clone();
        let host = mail_host.to_string();
        let recipient = address.to_string();
        let deadline = config.connect_timeout * 2;

        let handle = tokio::task::spawn_blocking(move || run_handshake(&config, &host, &recipient));
        match tokio::time::timeout(deadline, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(ProbeError::Protocol(format!("probe task failed: {}", join_error))),
            Err(_) => Err(ProbeError::Timeout),
        }
    }
}

fn run_handshake(config: &ProbeConfig, mail_host: &str, address: &str) -> Result<u16, ProbeError> {
    let recipient = Address::from_str(address).map_err(|e| ProbeError::Protocol(e.to_string()))?;
    let sender = match &config.sender {
        Some(sender) => Some(Address::from_str(sender).map_err(|e| ProbeError::Protocol(e.to_string()))?),
        None => None,
    };
    let helo = ClientId::Domain(config.helo_name.clone());

    let mut conn = SmtpConnection::connect(
        (mail_host, SMTP_PORT),
        Some(config.connect_timeout),
        &helo,
        None,
        None,
    )
    .map_err(|e| {
        if e.is_timeout() {
            ProbeError::Timeout
        } else {
            ProbeError::Connect(e.to_string())
        }
    })?;

    let result = conn
        .command(Mail::new(sender, vec![]))
        .map_err(classify_command_error)
        .and_then(|_| match conn.command(Rcpt::new(recipient, vec![])) {
            Ok(response) => Ok(code_value(response.code())),
            // lettre reports 4xx/5xx replies as errors carrying the status
            Err(e) => match e.status() {
                Some(code) => Ok(code_value(code)),
                None => Err(classify_command_error(e)),
            },
        });

    debug!(mail_host, address, result = ?result, "SMTP probe finished");
    let _ = conn.quit();
    result
}

fn classify_command_error(e: lettre::transport::smtp::Error) -> ProbeError {
    if e.is_timeout() {
        ProbeError::Timeout
    } else {
        ProbeError::Protocol(e.to_string())
    }
}

fn code_value(code: Code) -> u16 {
    code.to_string().parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lettre::transport::smtp::response::{Category, Detail, Severity};

    #[test]
    fn test_code_value() {
        let code = Code::new(Severity::PositiveCompletion, Category::MailSystem, Detail::Zero);
        assert_eq!(code_value(code), 250);
        let code = Code::new(Severity::PermanentNegativeCompletion, Category::MailSystem, Detail::Zero);
        assert_eq!(code_value(code), 550);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_an_error() {
        let probe = SmtpRecipientProbe::new(ProbeConfig {
            connect_timeout: Duration::from_millis(500),
            ..ProbeConfig::default()
        });
        // Reserved TEST-NET address, never routable
        let result = probe.probe_recipient("192.0.2.1", "jane@acme.test").await;
        assert!(result.is_err());
    }
}
