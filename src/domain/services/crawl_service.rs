// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

use crate::domain::models::crawl_task::LinkPriority;
use crate::domain::services::email_filter::EmailFilter;
use crate::utils::url_utils;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("valid email regex")
});
static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid anchor selector"));

const PRIORITY_KEYWORDS: &[&str] = &["about", "team", "contact", "people"];

/// 页面分析结果
#[derive(Debug, Clone, Default)]
pub struct PageAnalysis {
    /// 首个通过过滤的邮箱
    pub email: Option<String>,
    /// 同域链接（已去重、已标注优先级）
    pub links: Vec<DiscoveredLink>,
}

/// 页面上发现的链接
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredLink {
    pub url: Url,
    pub priority: LinkPriority,
}

/// 分析抓取到的页面：先找邮箱，找不到再收集站内链接
///
/// # 参数
///
/// * `html` - 页面内容
/// * `page_url` - 页面地址，用于解析相对链接
/// * `domain` - 商家根域名（不含 `www.`）
pub fn analyze_page(html: &str, page_url: &Url, domain: &str) -> PageAnalysis {
    if let Some(email) = EmailExtractor::first_valid(html) {
        return PageAnalysis {
            email: Some(email),
            links: Vec::new(),
        };
    }
    PageAnalysis {
        email: None,
        links: LinkDiscoverer::same_domain_links(html, page_url, domain),
    }
}

/// 邮箱提取器
pub struct EmailExtractor;

impl EmailExtractor {
    /// 按出现顺序提取所有邮箱形态的子串（小写、去重）
    pub fn extract_all(text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        EMAIL_RE
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .filter(|email| seen.insert(email.clone()))
            .collect()
    }

    /// 返回第一个通过过滤规则的邮箱
    pub fn first_valid(text: &str) -> Option<String> {
        Self::extract_all(text)
            .into_iter()
            .find(|email| EmailFilter::is_valid(email))
    }
}

/// 链接发现器
///
/// 负责从HTML内容中提取和过滤链接
pub struct LinkDiscoverer;

impl LinkDiscoverer {
    /// 从HTML内容中提取链接
    ///
    /// # 参数
    ///
    /// * `html_content` - HTML内容
    /// * `base_url` - 基础URL
    ///
    /// # 返回值
    ///
    /// 按文档顺序排列、去掉片段并去重后的 http(s) 链接
    pub fn extract_links(html_content: &str, base_url: &Url) -> Vec<Url> {
        let fragment = Html::parse_document(html_content);
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for element in fragment.select(&ANCHOR_SELECTOR) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let href = href.trim();
            // Ignore fragment identifiers, mailto, tel and javascript links
            if href.is_empty()
                || href.starts_with('#')
                || href.starts_with("mailto:")
                || href.starts_with("javascript:")
                || href.starts_with("tel:")
            {
                continue;
            }

            if let Ok(mut url) = url_utils::resolve_url(base_url, href) {
                if url.scheme() != "http" && url.scheme() != "https" {
                    continue;
                }
                url.set_fragment(None);
                if seen.insert(url.to_string()) {
                    links.push(url);
                }
            }
        }

        links
    }

    /// 提取同域链接并标注优先级
    pub fn same_domain_links(html_content: &str, base_url: &Url, domain: &str) -> Vec<DiscoveredLink> {
        Self::extract_links(html_content, base_url)
            .into_iter()
            .filter(|url| url_utils::is_same_domain(url, domain))
            .map(|url| DiscoveredLink {
                priority: Self::priority_of(&url),
                url,
            })
            .collect()
    }

    /// 路径包含 about / team / contact / people 的链接优先抓取
    pub fn priority_of(url: &Url) -> LinkPriority {
        let path = url.path().to_lowercase();
        if PRIORITY_KEYWORDS.iter().any(|k| path.contains(k)) {
            LinkPriority::High
        } else {
            LinkPriority::Normal
        }
    }
}

#[cfg(test)]
#[path = "crawl_service_test.rs"]
mod tests;
