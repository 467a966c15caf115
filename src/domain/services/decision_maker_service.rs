// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::search::engine::SearchEngine;

static PROFILE_TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([\w\s]+) - (.+)$").expect("valid profile title regex"));

/// 决策人查找服务
///
/// 通过搜索 `"<商家名> <地区> linkedin"` 并解析结果标题
/// `"姓名 - 公司"` 找到可能的决策人
pub struct DecisionMakerFinder {
    engine: Arc<dyn SearchEngine>,
    location: String,
    result_limit: u32,
}

impl DecisionMakerFinder {
    pub fn new(engine: Arc<dyn SearchEngine>, location: impl Into<String>, result_limit: u32) -> Self {
        Self {
            engine,
            location: location.into(),
            result_limit,
        }
    }

    /// 构造搜索查询，多余空白会被合并
    pub fn query_for(&self, business_name: &str) -> String {
        format!("{} {} linkedin", business_name, self.location)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// 查找决策人，搜索失败视为未找到
    pub async fn find(&self, business_name: &str) -> Option<String> {
        let query = self.query_for(business_name);
        let results = match self.engine.search(&query, self.result_limit).await {
            Ok(results) => results,
            Err(e) => {
                warn!(
                    business = business_name,
                    engine = self.engine.name(),
                    stage = "decision_maker_lookup",
                    error = %e,
                    "Decision maker lookup failed"
                );
                return None;
            }
        };

        let name = results
            .iter()
            .find_map(|r| match_profile_title(&r.title, business_name));
        if let Some(name) = &name {
            info!(business = business_name, decision_maker = %name, "Potential decision maker found");
        }
        name
    }
}

/// 匹配 `"姓名 - 公司"` 标题，公司部分需包含商家名中的任意一个词（不区分大小写）
pub fn match_profile_title(title: &str, business_name: &str) -> Option<String> {
    let captures = PROFILE_TITLE_RE.captures(title.trim())?;
    let person = captures.get(1)?.as_str().trim();
    let company = captures.get(2)?.as_str().to_lowercase();
    if person.is_empty() {
        return None;
    }

    let business = business_name.to_lowercase();
    if business.split_whitespace().any(|part| company.contains(part)) {
        Some(person.to_string())
    } else {
        None
    }
}
