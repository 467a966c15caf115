// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

use crate::domain::models::lead::LeadRecord;

/// 种子商家
///
/// 种子文件为 `{Name, Website}` 对象组成的 JSON 数组，多余字段会被忽略
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Business {
    #[serde(rename = "Name", alias = "name")]
    pub name: String,
    #[serde(rename = "Website", alias = "website")]
    pub website: String,
}

impl Business {
    pub fn new(name: impl Into<String>, website: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            website: website.into(),
        }
    }

    /// 首次见到商家时创建对应的线索记录
    pub fn into_lead(self) -> LeadRecord {
        LeadRecord::new(self.name, self.website)
    }
}
