// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::domain::repositories::lead_repository::{dedup_by_email, DedupReport, LeadRepository};
use crate::infrastructure::repositories::jsonl_lead_repo::JsonlLeadRepository;

/// 导出用例
///
/// 按邮箱去重（首次出现的记录保留），写回原文件或写到指定文件
pub struct ExportLeadsUseCase {
    repository: Arc<dyn LeadRepository>,
}

impl ExportLeadsUseCase {
    pub fn new(repository: Arc<dyn LeadRepository>) -> Self {
        Self { repository }
    }

    /// 执行导出
    ///
    /// # 参数
    ///
    /// * `output` - 输出文件；为 None 时原地重写线索文件
    ///
    /// # 返回值
    ///
    /// 去重报告，包含被共用的邮箱
    pub async fn execute(&self, output: Option<PathBuf>) -> Result<DedupReport> {
        let leads = self
            .repository
            .read_all()
            .await
            .context("Failed to read leads")?;
        let (unique, report) = dedup_by_email(leads);

        match output {
            Some(path) => {
                JsonlLeadRepository::new(&path)
                    .rewrite_all(&unique)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!(path = %path.display(), records = unique.len(), "Leads exported");
            }
            None => {
                self.repository
                    .rewrite_all(&unique)
                    .await
                    .context("Failed to rewrite leads")?;
                info!(records = unique.len(), "Leads deduplicated in place");
            }
        }
        Ok(report)
    }
}
