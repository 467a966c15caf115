// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use deunicode::deunicode;

/// 候选邮箱生成器
///
/// 根据联系人姓名与域名，按固定优先级生成可能的邮箱地址。
/// 纯函数，结果只依赖输入。
pub struct CandidateGenerator;

impl CandidateGenerator {
    /// 生成候选地址
    ///
    /// # 参数
    ///
    /// * `name` - 联系人姓名，至少包含名与姓两个词
    /// * `domain` - 邮箱域名
    ///
    /// # 返回值
    ///
    /// 按优先级排列的候选地址；姓名不足两个词或规范化后为空时返回空列表
    pub fn generate(name: &str, domain: &str) -> Vec<String> {
        let domain = domain.trim().trim_end_matches('.').to_lowercase();
        if domain.is_empty() {
            return Vec::new();
        }

        let tokens: Vec<&str> = name.split_whitespace().collect();
        if tokens.len() < 2 {
            return Vec::new();
        }

        let (first, last) = match (
            tokens.first().map(|t| normalize_token(t)),
            tokens.last().map(|t| normalize_token(t)),
        ) {
            (Some(first), Some(last)) if !first.is_empty() && !last.is_empty() => (first, last),
            _ => return Vec::new(),
        };

        // Both tokens are non-empty ASCII, so slicing the first byte is safe
        let f = &first[..1];
        let l = &last[..1];

        let local_parts = [
            format!("{}.{}", first, last),
            format!("{}{}", first, last),
            format!("{}_{}", first, last),
            format!("{}-{}", first, last),
            first.clone(),
            last.clone(),
            format!("{}{}", f, last),
            format!("{}.{}", f, last),
            format!("{}{}", first, l),
            format!("{}.{}", first, l),
        ];

        let mut candidates: Vec<String> = Vec::with_capacity(local_parts.len());
        for local in local_parts {
            let address = format!("{}@{}", local, domain);
            if !candidates.contains(&address) {
                candidates.push(address);
            }
        }
        candidates
    }
}

fn normalize_token(token: &str) -> String {
    deunicode(token)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        let candidates = CandidateGenerator::generate("Jane Doe", "acmebakery.test");
        assert_eq!(
            candidates,
            vec![
                "jane.doe@acmebakery.test",
                "janedoe@acmebakery.test",
                "jane_doe@acmebakery.test",
                "jane-doe@acmebakery.test",
                "jane@acmebakery.test",
                "doe@acmebakery.test",
                "jdoe@acmebakery.test",
                "j.doe@acmebakery.test",
                "janed@acmebakery.test",
                "jane.d@acmebakery.test",
            ]
        );
    }

    #[test]
    fn test_single_token_yields_nothing() {
        assert!(CandidateGenerator::generate("Cher", "acme.test").is_empty());
        assert!(CandidateGenerator::generate("   ", "acme.test").is_empty());
        assert!(CandidateGenerator::generate("", "acme.test").is_empty());
    }

    #[test]
    fn test_first_dot_last_precedes_first() {
        for (name, dotted, bare) in [
            ("Ann Lee", "ann.lee@shop.test", "ann@shop.test"),
            ("María José García", "maria.garcia@shop.test", "maria@shop.test"),
            ("O'Neil Smith-Jones", "oneil.smithjones@shop.test", "oneil@shop.test"),
        ] {
            let candidates = CandidateGenerator::generate(name, "shop.test");
            let dotted_pos = candidates.iter().position(|c| c == dotted).unwrap();
            let bare_pos = candidates.iter().position(|c| c == bare).unwrap();
            assert_eq!(dotted_pos, 0);
            assert!(dotted_pos < bare_pos);
        }
    }

    #[test]
    fn test_middle_names_and_transliteration() {
        let candidates = CandidateGenerator::generate("José  Luis Núñez", "cafe.test");
        assert_eq!(candidates[0], "jose.nunez@cafe.test");
        assert_eq!(candidates[6], "jnunez@cafe.test");
    }

    #[test]
    fn test_duplicates_are_removed() {
        let candidates = CandidateGenerator::generate("Bo Bo", "b.test");
        assert_eq!(candidates.iter().filter(|c| *c == "bo@b.test").count(), 1);
        assert_eq!(candidates[0], "bo.bo@b.test");
    }

    #[test]
    fn test_token_without_letters_is_invalid() {
        assert!(CandidateGenerator::generate("!!! Doe", "acme.test").is_empty());
    }
}
