// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::domain::services::mail_service::{InboundMessage, Mailbox, MailboxError, ThreadMessage};

const INBOX_FILE: &str = "inbox.json";
const SENT_FILE: &str = "sent.json";

/// 文件收件箱
///
/// 读取外部轮询程序导出的 `inbox.json`（来信）与 `sent.json`（已发送），
/// 两者都是 JSON 数组；文件不存在视为空
pub struct FileMailbox {
    dir: PathBuf,
}

impl FileMailbox {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn load<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>, MailboxError> {
        let path = self.dir.join(file);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(MailboxError::Unavailable(format!("{}: {}", path.display(), e))),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content)
            .map_err(|e| MailboxError::Malformed(format!("{}: {}", path.display(), e)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// 判断邮件头中的地址（可能是 `Name <addr>` 形式）是否为目标地址
pub fn address_matches(header: &str, address: &str) -> bool {
    let header = header.trim();
    let bare = match (header.rfind('<'), header.rfind('>')) {
        (Some(start), Some(end)) if start < end => &header[start + 1..end],
        _ => header,
    };
    bare.trim().eq_ignore_ascii_case(address.trim())
}

#[async_trait]
impl Mailbox for FileMailbox {
    async fn fetch_unread_from(&self, address: &str) -> Result<Vec<InboundMessage>, MailboxError> {
        let mut messages: Vec<InboundMessage> = self
            .load::<InboundMessage>(INBOX_FILE)
            .await?
            .into_iter()
            .filter(|m| !m.seen && address_matches(&m.from, address))
            .collect();
        messages.sort_by(|a, b| b.received_at.cmp(&a.received_at));
        Ok(messages)
    }

    async fn fetch_thread_to(&self, address: &str) -> Result<Vec<ThreadMessage>, MailboxError> {
        let mut thread: Vec<ThreadMessage> = self
            .load::<ThreadMessage>(SENT_FILE)
            .await?
            .into_iter()
            .filter(|m| address_matches(&m.to, address))
            .collect();
        thread.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(thread)
    }
}
