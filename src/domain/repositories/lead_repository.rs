// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::models::lead::LeadRecord;
use crate::utils::errors::LeadError;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// 存储文件第 N 行无法解析
    #[error("Corrupt record at line {line}: {message}")]
    CorruptRecord { line: usize, message: String },
}

impl From<RepositoryError> for LeadError {
    fn from(err: RepositoryError) -> Self {
        LeadError::ServiceUnavailable(format!("lead store: {}", err))
    }
}

/// 线索仓库特质
///
/// 支持并发追加（一次写入即一条完整记录）、全量读取与原子重写
#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// 追加一条记录
    ///
    /// # 参数
    ///
    /// * `lead` - 要写入的线索记录
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 记录已完整写入
    /// * `Err(RepositoryError)` - 写入失败
    async fn append(&self, lead: &LeadRecord) -> Result<(), RepositoryError>;

    /// 按写入顺序读取全部记录
    async fn read_all(&self) -> Result<Vec<LeadRecord>, RepositoryError>;

    /// 用给定记录原子地替换全部内容
    async fn rewrite_all(&self, leads: &[LeadRecord]) -> Result<(), RepositoryError>;
}

/// 多个商家共用同一邮箱
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailCollision {
    pub email: String,
    /// 共用该邮箱的商家名，首个为保留的记录
    pub businesses: Vec<String>,
}

/// 去重报告
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupReport {
    pub kept: usize,
    pub dropped: usize,
    pub collisions: Vec<EmailCollision>,
}

/// 按邮箱去重，保留首次出现的记录
///
/// 邮箱比较忽略大小写与首尾空白；没有邮箱的记录全部保留。
/// 不同商家共用邮箱时不会静默合并，而是记录日志并写入报告。
pub fn dedup_by_email(leads: Vec<LeadRecord>) -> (Vec<LeadRecord>, DedupReport) {
    let mut first_index: HashMap<String, usize> = HashMap::new();
    let mut sharers: HashMap<String, Vec<String>> = HashMap::new();
    let mut kept = Vec::with_capacity(leads.len());
    let mut dropped = 0;

    for lead in leads {
        let Some(key) = lead
            .email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
        else {
            kept.push(lead);
            continue;
        };

        if first_index.contains_key(&key) {
            dropped += 1;
            sharers.entry(key).or_default().push(lead.name);
            continue;
        }

        first_index.insert(key.clone(), kept.len());
        sharers.insert(key, vec![lead.name.clone()]);
        kept.push(lead);
    }

    let mut collisions: Vec<EmailCollision> = sharers
        .into_iter()
        .filter(|(_, names)| {
            names.len() > 1 && names.iter().any(|n| !n.eq_ignore_ascii_case(&names[0]))
        })
        .map(|(email, businesses)| EmailCollision { email, businesses })
        .collect();
    collisions.sort_by_key(|c| first_index.get(&c.email).copied().unwrap_or(usize::MAX));

    for collision in &collisions {
        warn!(
            email = %collision.email,
            businesses = ?collision.businesses,
            "Multiple businesses share one email, keeping the first"
        );
    }
    info!(kept = kept.len(), dropped, "Export dedup finished");

    let report = DedupReport {
        kept: kept.len(),
        dropped,
        collisions,
    };
    (kept, report)
}
