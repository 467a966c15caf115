// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::models::lead::LeadRecord;
use crate::domain::repositories::lead_repository::{LeadRepository, RepositoryError};

/// JSON Lines 线索仓库
///
/// 每行一条 [`LeadRecord`]，追加时整行一次写入，进程内写入由互斥锁串行化
pub struct JsonlLeadRepository {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlLeadRepository {
    /// 创建新的仓库实例
    ///
    /// # 参数
    ///
    /// * `path` - 线索文件路径，不存在时在首次写入时创建
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn ensure_parent(&self) -> Result<(), RepositoryError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }
}

/// 解析 JSON Lines 内容，空行跳过，行号从 1 开始
///
/// 追加写入总以换行结尾；末尾没有换行且无法解析的一行视为写入中断的残留，
/// 记录告警后跳过
pub fn parse_lines(content: &str) -> Result<Vec<LeadRecord>, RepositoryError> {
    let unterminated = !content.is_empty() && !content.ends_with('\n');
    let last_line = content.lines().count();
    let mut leads = Vec::new();

    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<LeadRecord>(line) {
            Ok(lead) => leads.push(lead),
            Err(e) if unterminated && index + 1 == last_line => {
                warn!(line = index + 1, error = %e, "Skipping truncated trailing lead record");
            }
            Err(e) => {
                return Err(RepositoryError::CorruptRecord {
                    line: index + 1,
                    message: e.to_string(),
                })
            }
        }
    }
    Ok(leads)
}

#[async_trait]
impl LeadRepository for JsonlLeadRepository {
    async fn append(&self, lead: &LeadRecord) -> Result<(), RepositoryError> {
        let mut line = serde_json::to_string(lead)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        self.ensure_parent().await?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        debug!(business = %lead.name, path = %self.path.display(), "Lead appended");
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<LeadRecord>, RepositoryError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => parse_lines(&content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn rewrite_all(&self, leads: &[LeadRecord]) -> Result<(), RepositoryError> {
        let mut content = String::new();
        for lead in leads {
            content.push_str(&serde_json::to_string(lead)?);
            content.push('\n');
        }

        let _guard = self.write_lock.lock().await;
        self.ensure_parent().await?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, content.as_bytes()).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(records = leads.len(), path = %self.path.display(), "Lead store rewritten");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_append_then_read_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonlLeadRepository::new(dir.path().join("data/leads.jsonl"));

        assert!(repo.read_all().await.unwrap().is_empty());

        repo.append(&LeadRecord::new("Acme Bakery", "https://acmebakery.test")).await.unwrap();
        repo.append(&LeadRecord::new("Bolt Hardware", "https://bolt.test")).await.unwrap();

        let leads = repo.read_all().await.unwrap();
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0].name, "Acme Bakery");
        assert_eq!(leads[1].name, "Bolt Hardware");
    }

    #[tokio::test]
    async fn test_concurrent_appends_never_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Arc::new(JsonlLeadRepository::new(dir.path().join("leads.jsonl")));

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    let mut lead = LeadRecord::new(format!("Business {}", i), "https://b.test");
                    lead.resolve_email(format!("owner{}@b.test", i));
                    repo.append(&lead).await.unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(repo.read_all().await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn test_rewrite_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonlLeadRepository::new(dir.path().join("leads.jsonl"));
        repo.append(&LeadRecord::new("Old", "https://old.test")).await.unwrap();

        repo.rewrite_all(&[LeadRecord::new("New", "https://new.test")]).await.unwrap();

        let leads = repo.read_all().await.unwrap();
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].name, "New");
    }

    #[test]
    fn test_truncated_trailing_line_is_skipped() {
        let content = "{\"Name\":\"A\",\"Website\":\"https://a.test\"}\n{\"Name\":\"B\",\"Web";
        let leads = parse_lines(content).unwrap();
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].name, "A");
    }

    #[tokio::test]
    async fn test_read_all_survives_interrupted_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.jsonl");
        let repo = JsonlLeadRepository::new(&path);
        repo.append(&LeadRecord::new("Acme Bakery", "https://acmebakery.test")).await.unwrap();

        let mut content = tokio::fs::read_to_string(&path).await.unwrap();
        content.push_str("{\"Name\":\"Bolt Hard");
        tokio::fs::write(&path, content).await.unwrap();

        let leads = repo.read_all().await.unwrap();
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].name, "Acme Bakery");
    }

    #[test]
    fn test_corrupt_line_is_reported() {
        let content = "{\"Name\":\"A\",\"Website\":\"https://a.test\"}\n\nnot json\n";
        match parse_lines(content) {
            Err(RepositoryError::CorruptRecord { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected: {:?}", other.map(|v| v.len())),
        }
    }
}
