// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashSet;

use crate::domain::services::mail_service::{
    InboundMessage, MailTransport, Mailbox, MailboxError, OutgoingEmail, ThreadMessage, TransportError,
};
use crate::infrastructure::mail::file_mailbox::address_matches;

/// 内存收件箱
///
/// 同时实现发信与收件箱接口：发出的邮件进入已发送线程，来信通过 [`InMemoryMailbox::deliver`] 注入
#[derive(Default)]
pub struct InMemoryMailbox {
    inbox: Mutex<Vec<InboundMessage>>,
    sent: Mutex<Vec<ThreadMessage>>,
    outbox: Mutex<Vec<OutgoingEmail>>,
    failing_recipients: Mutex<HashSet<String>>,
}

impl InMemoryMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注入一封来信
    pub fn deliver(&self, from: &str, body: &str) {
        self.inbox.lock().push(InboundMessage {
            from: from.to_string(),
            subject: String::new(),
            body: body.to_string(),
            received_at: Utc::now(),
            seen: false,
        });
    }

    /// 发往该地址的邮件一律失败
    pub fn fail_sends_to(&self, address: &str) {
        self.failing_recipients.lock().insert(address.to_lowercase());
    }

    /// 已发出的邮件（按发送顺序）
    pub fn sent_messages(&self) -> Vec<OutgoingEmail> {
        self.outbox.lock().clone()
    }

    pub fn sent_to(&self, address: &str) -> usize {
        self.outbox
            .lock()
            .iter()
            .filter(|m| address_matches(&m.to, address))
            .count()
    }
}

#[async_trait]
impl MailTransport for InMemoryMailbox {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), TransportError> {
        if self.failing_recipients.lock().contains(&email.to.to_lowercase()) {
            return Err(TransportError::Connection("simulated disconnect".to_string()));
        }
        self.sent.lock().push(ThreadMessage {
            to: email.to.clone(),
            subject: email.subject.clone(),
            body: email.body.clone(),
            date: Utc::now(),
        });
        self.outbox.lock().push(email.clone());
        Ok(())
    }
}

#[async_trait]
impl Mailbox for InMemoryMailbox {
    async fn fetch_unread_from(&self, address: &str) -> Result<Vec<InboundMessage>, MailboxError> {
        let mut messages: Vec<InboundMessage> = self
            .inbox
            .lock()
            .iter()
            .filter(|m| !m.seen && address_matches(&m.from, address))
            .cloned()
            .collect();
        messages.reverse();
        Ok(messages)
    }

    async fn fetch_thread_to(&self, address: &str) -> Result<Vec<ThreadMessage>, MailboxError> {
        let mut thread: Vec<ThreadMessage> = self
            .sent
            .lock()
            .iter()
            .filter(|m| address_matches(&m.to, address))
            .cloned()
            .collect();
        thread.reverse();
        Ok(thread)
    }
}
