// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 回复意图分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    Interested,
    NeedMoreInfo,
    NotInterested,
    WrongPerson,
    OutOfOffice,
    Other,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Interested => "Interested",
            Classification::NeedMoreInfo => "Need More Info",
            Classification::NotInterested => "Not Interested",
            Classification::WrongPerson => "Wrong Person",
            Classification::OutOfOffice => "Out of Office",
            Classification::Other => "Other",
        }
    }

    /// 从自由文本解析分类
    ///
    /// 接受 `Classification: Need More Info` 这类格式，也接受裸标签；
    /// 大小写、空格、连字符不敏感，无法识别时返回 `Other`
    pub fn parse(text: &str) -> Self {
        let line = text
            .lines()
            .find(|l| l.to_lowercase().contains("classification"))
            .unwrap_or(text);
        let label = match line.split_once(':') {
            Some((_, rest)) => rest,
            None => line,
        };
        let normalized: String = label
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();

        // "notinterested" contains "interested", so check negatives first
        if normalized.starts_with("notinterested") {
            Classification::NotInterested
        } else if normalized.starts_with("needmoreinfo") || normalized.starts_with("moreinfo") {
            Classification::NeedMoreInfo
        } else if normalized.starts_with("wrongperson") {
            Classification::WrongPerson
        } else if normalized.starts_with("outofoffice") {
            Classification::OutOfOffice
        } else if normalized.starts_with("interested") {
            Classification::Interested
        } else {
            Classification::Other
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
