// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::{ParseError, Url};

/// 将可能为相对路径的URL转换为绝对路径URL
pub fn resolve_url(base_url: &Url, path: &str) -> Result<Url, ParseError> {
    base_url.join(path)
}

/// 解析网站地址，缺少协议时补全为 https
pub fn parse_website(website: &str) -> Result<Url, ParseError> {
    let trimmed = website.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("https://{}", trimmed))
    }
}

/// 去掉主机名前缀 `www.` 并转为小写
pub fn strip_www(host: &str) -> String {
    let host = host.trim_end_matches('.').to_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

/// 获取网站的根域名（去掉协议与 `www.`）
///
/// `https://www.acmebakery.test/about` -> `acmebakery.test`
pub fn root_domain(website: &str) -> Option<String> {
    let url = parse_website(website).ok()?;
    let host = url.host_str()?;
    let domain = strip_www(host);
    if domain.is_empty() {
        None
    } else {
        Some(domain)
    }
}

/// 判断URL是否属于给定根域名
pub fn is_same_domain(url: &Url, domain: &str) -> bool {
    url.host_str()
        .map(|host| strip_www(host) == domain)
        .unwrap_or(false)
}

/// 获取用于限流的主机键
pub fn host_key(url: &Url) -> String {
    url.host_str().map(strip_www).unwrap_or_default()
}
