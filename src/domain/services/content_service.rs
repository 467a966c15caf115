// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::domain::models::classification::Classification;
use crate::domain::services::mail_service::ThreadMessage;
use crate::utils::errors::LeadError;

/// 内容生成错误
#[derive(Error, Debug, Clone)]
pub enum ContentError {
    #[error("content service unavailable: {0}")]
    Unavailable(String),
    #[error("content service returned an invalid response: {0}")]
    InvalidResponse(String),
    #[error("content service timed out")]
    Timeout,
}

impl From<ContentError> for LeadError {
    fn from(err: ContentError) -> Self {
        LeadError::ServiceUnavailable(err.to_string())
    }
}

/// 邮件草稿
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailDraft {
    pub subject: String,
    pub body: String,
}

impl EmailDraft {
    /// 解析生成的整封邮件文本
    ///
    /// 第一行是主题（可带 `Subject:` 前缀），其余为正文
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let (first, rest) = match text.split_once('\n') {
            Some((first, rest)) => (first, rest),
            None => (text, ""),
        };
        let subject = match first.split_once(": ") {
            Some((_, subject)) => subject,
            None => first,
        };
        Self {
            subject: subject.trim().to_string(),
            body: rest.trim().to_string(),
        }
    }
}

/// 首封邮件生成参数
#[derive(Debug, Clone, Default)]
pub struct InitialEmailRequest {
    pub offer_summary: String,
    pub prospect_summary: String,
    pub sender_name: String,
    pub sender_site: String,
    pub prospect_name: String,
    /// 最近一次积极回复，作为语气参考
    pub last_positive_reply: Option<String>,
}

/// 跟进邮件生成参数
#[derive(Debug, Clone)]
pub struct FollowUpRequest {
    pub offer_summary: String,
    pub prospect_summary: String,
    pub sender_name: String,
    pub sender_site: String,
    pub prospect_name: String,
    /// 已发送线程，最新的在前
    pub thread: Vec<ThreadMessage>,
    pub classification: Classification,
    pub last_positive_reply: Option<String>,
}

/// 内容生成服务特质
///
/// 外部服务不可靠；调用方应通过 [`ResilientContentGenerator`] 使用
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// 基于发件人网站与自定义说明生成优惠摘要
    async fn personalize_offer(&self, site_url: &str, custom_offer: &str) -> Result<String, ContentError>;

    /// 基于潜在客户网站生成客户摘要
    async fn personalize_prospect(&self, site_url: &str) -> Result<String, ContentError>;

    async fn craft_initial_email(&self, request: &InitialEmailRequest) -> Result<EmailDraft, ContentError>;

    async fn classify_response(&self, content: &str) -> Result<Classification, ContentError>;

    /// 从线程中提取最近一次积极回复，没有时返回 `None`
    async fn extract_last_positive_reply(
        &self,
        thread: &[ThreadMessage],
    ) -> Result<Option<String>, ContentError>;

    async fn craft_follow_up(&self, request: &FollowUpRequest) -> Result<EmailDraft, ContentError>;

    fn name(&self) -> &'static str;
}

/// 带超时与降级的内容生成器
///
/// 每次调用先交给主实现，超时或出错时使用降级实现；两者都失败时返回中性文本。
/// 因此本类型的所有方法都不会返回错误。
pub struct ResilientContentGenerator {
    primary: Arc<dyn ContentGenerator>,
    fallback: Arc<dyn ContentGenerator>,
    timeout: Duration,
}

impl ResilientContentGenerator {
    pub fn new(
        primary: Arc<dyn ContentGenerator>,
        fallback: Arc<dyn ContentGenerator>,
        timeout: Duration,
    ) -> Self {
        Self {
            primary,
            fallback,
            timeout,
        }
    }

    async fn call<T, F, Fut>(&self, operation: &'static str, call: F) -> Option<T>
    where
        F: Fn(Arc<dyn ContentGenerator>) -> Fut,
        Fut: Future<Output = Result<T, ContentError>>,
    {
        for generator in [self.primary.clone(), self.fallback.clone()] {
            let name = generator.name();
            let result = match tokio::time::timeout(self.timeout, call(generator)).await {
                Ok(result) => result,
                Err(_) => Err(ContentError::Timeout),
            };
            match result {
                Ok(value) => return Some(value),
                Err(e) => {
                    warn!(generator = name, operation, error = %e, stage = "content", "Content generation failed")
                }
            }
        }
        None
    }

    pub async fn personalize_offer(&self, site_url: &str, custom_offer: &str) -> String {
        self.call("personalize_offer", |g| async move {
            g.personalize_offer(site_url, custom_offer).await
        })
        .await
        .unwrap_or_else(|| neutral_offer(custom_offer))
    }

    pub async fn personalize_prospect(&self, site_url: &str) -> String {
        self.call("personalize_prospect", |g| async move {
            g.personalize_prospect(site_url).await
        })
        .await
        .unwrap_or_default()
    }

    pub async fn craft_initial_email(&self, request: &InitialEmailRequest) -> EmailDraft {
        self.call("craft_initial_email", |g| async move {
            g.craft_initial_email(request).await
        })
        .await
        .unwrap_or_else(|| neutral_draft(&request.prospect_name, &request.sender_name, &request.sender_site))
    }

    pub async fn classify_response(&self, content: &str) -> Classification {
        self.call("classify_response", |g| async move {
            g.classify_response(content).await
        })
        .await
        .unwrap_or(Classification::Other)
    }

    pub async fn extract_last_positive_reply(&self, thread: &[ThreadMessage]) -> Option<String> {
        self.call("extract_last_positive_reply", |g| async move {
            g.extract_last_positive_reply(thread).await
        })
        .await
        .flatten()
    }

    pub async fn craft_follow_up(&self, request: &FollowUpRequest) -> EmailDraft {
        self.call("craft_follow_up", |g| async move { g.craft_follow_up(request).await })
            .await
            .unwrap_or_else(|| {
                neutral_draft(&request.prospect_name, &request.sender_name, &request.sender_site)
            })
    }
}

fn neutral_offer(custom_offer: &str) -> String {
    if custom_offer.trim().is_empty() {
        "A short conversation about how we could help your business.".to_string()
    } else {
        custom_offer.trim().to_string()
    }
}

fn neutral_draft(prospect_name: &str, sender_name: &str, sender_site: &str) -> EmailDraft {
    let greeting = if prospect_name.trim().len() < 3 {
        "Hi there,".to_string()
    } else {
        format!("Hi {},", prospect_name.trim())
    };
    EmailDraft {
        subject: "Quick question".to_string(),
        body: format!(
            "{}\n\nI came across your business and thought we might be able to help. \
             Would you be open to a short call next week?\n\nBest,\n{}\n{}",
            greeting, sender_name, sender_site
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;
    struct Slow;
    struct Fixed;

    #[async_trait]
    impl ContentGenerator for Failing {
        async fn personalize_offer(&self, _: &str, _: &str) -> Result<String, ContentError> {
            Err(ContentError::Unavailable("down".into()))
        }
        async fn personalize_prospect(&self, _: &str) -> Result<String, ContentError> {
            Err(ContentError::Unavailable("down".into()))
        }
        async fn craft_initial_email(&self, _: &InitialEmailRequest) -> Result<EmailDraft, ContentError> {
            Err(ContentError::Unavailable("down".into()))
        }
        async fn classify_response(&self, _: &str) -> Result<Classification, ContentError> {
            Err(ContentError::Unavailable("down".into()))
        }
        async fn extract_last_positive_reply(&self, _: &[ThreadMessage]) -> Result<Option<String>, ContentError> {
            Err(ContentError::Unavailable("down".into()))
        }
        async fn craft_follow_up(&self, _: &FollowUpRequest) -> Result<EmailDraft, ContentError> {
            Err(ContentError::Unavailable("down".into()))
        }
        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[async_trait]
    impl ContentGenerator for Slow {
        async fn personalize_offer(&self, _: &str, _: &str) -> Result<String, ContentError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".into())
        }
        async fn personalize_prospect(&self, _: &str) -> Result<String, ContentError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".into())
        }
        async fn craft_initial_email(&self, _: &InitialEmailRequest) -> Result<EmailDraft, ContentError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(ContentError::Timeout)
        }
        async fn classify_response(&self, _: &str) -> Result<Classification, ContentError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Classification::NotInterested)
        }
        async fn extract_last_positive_reply(&self, _: &[ThreadMessage]) -> Result<Option<String>, ContentError> {
            Ok(None)
        }
        async fn craft_follow_up(&self, _: &FollowUpRequest) -> Result<EmailDraft, ContentError> {
            Err(ContentError::Timeout)
        }
        fn name(&self) -> &'static str {
            "slow"
        }
    }

    #[async_trait]
    impl ContentGenerator for Fixed {
        async fn personalize_offer(&self, _: &str, _: &str) -> Result<String, ContentError> {
            Ok("fallback offer".into())
        }
        async fn personalize_prospect(&self, _: &str) -> Result<String, ContentError> {
            Ok("fallback prospect".into())
        }
        async fn craft_initial_email(&self, _: &InitialEmailRequest) -> Result<EmailDraft, ContentError> {
            Ok(EmailDraft::parse("Subject: Hello\nBody"))
        }
        async fn classify_response(&self, _: &str) -> Result<Classification, ContentError> {
            Ok(Classification::Interested)
        }
        async fn extract_last_positive_reply(&self, _: &[ThreadMessage]) -> Result<Option<String>, ContentError> {
            Ok(Some("Yes please".into()))
        }
        async fn craft_follow_up(&self, _: &FollowUpRequest) -> Result<EmailDraft, ContentError> {
            Ok(EmailDraft::parse("Re: Hello\nFollow-up body"))
        }
        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    #[test]
    fn test_parse_draft() {
        let draft = EmailDraft::parse("Subject: Quick question\n\nHi Jane,\nThanks!");
        assert_eq!(draft.subject, "Quick question");
        assert_eq!(draft.body, "Hi Jane,\nThanks!");

        let draft = EmailDraft::parse("Coffee next week?");
        assert_eq!(draft.subject, "Coffee next week?");
        assert_eq!(draft.body, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back() {
        let generator = ResilientContentGenerator::new(Arc::new(Slow), Arc::new(Fixed), Duration::from_secs(30));

        assert_eq!(generator.personalize_offer("https://me.test", "").await, "fallback offer");
        assert_eq!(generator.classify_response("yes!").await, Classification::Interested);
    }

    #[tokio::test]
    async fn test_both_failing_yields_neutral_output() {
        let generator =
            ResilientContentGenerator::new(Arc::new(Failing), Arc::new(Failing), Duration::from_secs(5));

        assert_eq!(generator.classify_response("whatever").await, Classification::Other);
        assert_eq!(generator.personalize_prospect("https://p.test").await, "");
        assert!(generator.extract_last_positive_reply(&[]).await.is_none());

        let request = InitialEmailRequest {
            prospect_name: "Jane Doe".into(),
            sender_name: "Sam".into(),
            sender_site: "https://sam.test".into(),
            ..Default::default()
        };
        let draft = generator.craft_initial_email(&request).await;
        assert_eq!(draft.subject, "Quick question");
        assert!(draft.body.starts_with("Hi Jane Doe,"));
        assert_eq!(generator.personalize_offer("https://me.test", "20% off").await, "20% off");
    }
}
