// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox as Recipient;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::PoolConfig;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::settings::SmtpSettings;
use crate::domain::services::mail_service::{MailTransport, OutgoingEmail, TransportError};

/// SMTP 发信器
///
/// 整个活动只保持一个已认证连接（连接池大小为 1），并用互斥锁保证同一时间只有一封邮件在发送。
/// 每次发送都有单独的超时；连接中途断开只会让当次发送失败。
pub struct SmtpMailer {
    transport: Mutex<AsyncSmtpTransport<Tokio1Executor>>,
    send_timeout: Duration,
}

impl SmtpMailer {
    /// 建立并测试认证连接
    ///
    /// # 参数
    ///
    /// * `settings` - SMTP 配置（STARTTLS 中继）
    /// * `send_timeout` - 单次发送超时
    pub async fn connect(settings: &SmtpSettings, send_timeout: Duration) -> Result<Self, TransportError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .map_err(|e| TransportError::Connection(e.to_string()))?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .pool_config(PoolConfig::new().max_size(1))
            .timeout(Some(send_timeout))
            .build();

        let connected = tokio::time::timeout(send_timeout, transport.test_connection())
            .await
            .map_err(|_| TransportError::Timeout)?
            .map_err(classify_smtp_error)?;
        if !connected {
            return Err(TransportError::Connection(format!(
                "SMTP server {}:{} did not accept the connection",
                settings.host, settings.port
            )));
        }

        info!(host = %settings.host, port = settings.port, "SMTP session established");
        Ok(Self {
            transport: Mutex::new(transport),
            send_timeout,
        })
    }
}

/// 构造纯文本邮件
pub fn build_message(email: &OutgoingEmail) -> Result<Message, TransportError> {
    let from: Recipient = email
        .from
        .parse()
        .map_err(|e| TransportError::InvalidMessage(format!("from '{}': {}", email.from, e)))?;
    let to: Recipient = email
        .to
        .parse()
        .map_err(|e| TransportError::InvalidMessage(format!("to '{}': {}", email.to, e)))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(email.subject.clone())
        .header(ContentType::TEXT_PLAIN)
        .body(email.body.clone())
        .map_err(|e| TransportError::InvalidMessage(e.to_string()))
}

fn classify_smtp_error(e: lettre::transport::smtp::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.status().is_some() {
        TransportError::Rejected(e.to_string())
    } else {
        TransportError::Connection(e.to_string())
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), TransportError> {
        let message = build_message(email)?;
        let transport = self.transport.lock().await;

        tokio::time::timeout(self.send_timeout, transport.send(message))
            .await
            .map_err(|_| TransportError::Timeout)?
            .map_err(classify_smtp_error)?;

        debug!(to = %email.to, subject = %email.subject, "Email submitted");
        Ok(())
    }
}
