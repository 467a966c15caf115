// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::models::verification::FailureReason;

static ADDRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid address regex")
});
static LEADING_NON_LETTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^a-zA-Z]").expect("valid leading regex"));
static DIGITS_BEFORE_AT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{2,}@").expect("valid digits regex"));
static NON_WORD_BEFORE_AT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\W@").expect("valid non-word regex"));

const PLACEHOLDER_DOMAINS: &[&str] = &["example.com", "example.org", "example.net", "google.com"];
const PLACEHOLDER_LOCAL_PARTS: &[&str] = &[
    "test", "filler", "name", "example", "email", "yourname", "your",
];
const IMAGE_SUFFIXES: &[&str] = &[".jpg", ".jpeg", ".png", ".webp", ".gif", ".bmp", ".svg"];

/// 邮箱地址过滤器
///
/// 在进行任何网络探测之前拒绝明显无效或占位性质的地址
pub struct EmailFilter;

impl EmailFilter {
    /// 检查地址，返回拒绝原因
    pub fn check(address: &str) -> Result<(), FailureReason> {
        if !address.is_ascii() {
            return Err(FailureReason::Encoding);
        }
        let address = address.trim();
        if !ADDRESS_RE.is_match(address) {
            return Err(FailureReason::Rejected);
        }

        let lower = address.to_lowercase();
        let Some((local, domain)) = lower.rsplit_once('@') else {
            return Err(FailureReason::Rejected);
        };

        // site-builder artefacts can sit on either side of the @
        if PLACEHOLDER_DOMAINS.contains(&domain) || lower.contains("wix") {
            return Err(FailureReason::Rejected);
        }
        if PLACEHOLDER_LOCAL_PARTS.iter().any(|p| local.ends_with(p)) {
            return Err(FailureReason::Rejected);
        }
        if LEADING_NON_LETTER_RE.is_match(&lower)
            || DIGITS_BEFORE_AT_RE.is_match(&lower)
            || NON_WORD_BEFORE_AT_RE.is_match(&lower)
        {
            return Err(FailureReason::Rejected);
        }
        if IMAGE_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix)) {
            return Err(FailureReason::Rejected);
        }
        Ok(())
    }

    pub fn is_valid(address: &str) -> bool {
        Self::check(address).is_ok()
    }
}
