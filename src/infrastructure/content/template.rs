// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use url::Url;

use crate::domain::models::classification::Classification;
use crate::domain::services::content_service::{
    ContentError, ContentGenerator, EmailDraft, FollowUpRequest, InitialEmailRequest,
};
use crate::domain::services::mail_service::ThreadMessage;

const OUT_OF_OFFICE: &[&str] = &["out of office", "out of the office", "automatic reply", "auto-reply", "on vacation", "on leave"];
const NOT_INTERESTED: &[&str] = &["not interested", "no thanks", "no thank you", "unsubscribe", "remove me", "stop emailing"];
const WRONG_PERSON: &[&str] = &["wrong person", "not the right person", "no longer works", "not responsible for"];
const NEED_MORE_INFO: &[&str] = &["more info", "more information", "pricing", "how much", "details", "send me", "what does"];
const INTERESTED: &[&str] = &["interested", "sounds good", "sounds great", "let's talk", "let's chat", "schedule", "call me", "yes"];

/// 规则模板内容生成器
///
/// 不依赖外部服务：按关键词分类回复，用固定模板拼装邮件
#[derive(Debug, Clone, Default)]
pub struct TemplateContentGenerator;

impl TemplateContentGenerator {
    pub fn new() -> Self {
        Self
    }

    /// 关键词分类，按“否定优先”的顺序匹配
    pub fn classify(content: &str) -> Classification {
        let text = content.to_lowercase();
        let contains_any = |words: &[&str]| words.iter().any(|w| text.contains(w));

        if contains_any(OUT_OF_OFFICE) {
            Classification::OutOfOffice
        } else if contains_any(NOT_INTERESTED) {
            Classification::NotInterested
        } else if contains_any(WRONG_PERSON) {
            Classification::WrongPerson
        } else if contains_any(NEED_MORE_INFO) {
            Classification::NeedMoreInfo
        } else if contains_any(INTERESTED) {
            Classification::Interested
        } else {
            Classification::Other
        }
    }
}

fn greeting(prospect_name: &str) -> String {
    let name = prospect_name.trim();
    if name.len() < 3 {
        "Hi there,".to_string()
    } else {
        format!("Hi {},", name)
    }
}

fn signature(sender_name: &str, sender_site: &str) -> String {
    format!("Best,\n{}\n{}", sender_name, sender_site)
}

fn follow_up_line(classification: Classification) -> &'static str {
    match classification {
        Classification::Interested => {
            "Great to hear from you! Would a 15 minute call later this week work to go through the details?"
        }
        Classification::NeedMoreInfo => {
            "Happy to share more. In short, here is what we would do for you and what it would take on your side."
        }
        Classification::NotInterested => {
            "Thanks for letting me know, I appreciate the reply. If anything changes, my door is always open."
        }
        Classification::WrongPerson => {
            "Thanks for the heads-up. Could you point me to the right person to talk to about this?"
        }
        Classification::OutOfOffice => "No rush at all, I will check back once you are back in the office.",
        Classification::Other => "Thanks for getting back to me. Let me know what would be most useful for you.",
    }
}

#[async_trait]
impl ContentGenerator for TemplateContentGenerator {
    async fn personalize_offer(&self, _site_url: &str, custom_offer: &str) -> Result<String, ContentError> {
        let offer = custom_offer.trim();
        if offer.is_empty() {
            Ok("A short, no-commitment conversation about how we could help your business grow.".to_string())
        } else {
            Ok(offer.to_string())
        }
    }

    async fn personalize_prospect(&self, site_url: &str) -> Result<String, ContentError> {
        let host = Url::parse(site_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
            .unwrap_or_else(|| site_url.trim().to_string());
        Ok(format!("the team behind {}", host))
    }

    async fn craft_initial_email(&self, request: &InitialEmailRequest) -> Result<EmailDraft, ContentError> {
        let mut body = format!(
            "{}\n\nI came across {} and really liked what you are doing.",
            greeting(&request.prospect_name),
            if request.prospect_summary.trim().is_empty() {
                "your business"
            } else {
                request.prospect_summary.trim()
            }
        );
        if !request.offer_summary.trim().is_empty() {
            body.push_str(&format!("\n\n{}", request.offer_summary.trim()));
        }
        body.push_str("\n\nWould you be open to a quick chat next week?\n\n");
        body.push_str(&signature(&request.sender_name, &request.sender_site));

        Ok(EmailDraft {
            subject: "Quick question".to_string(),
            body,
        })
    }

    async fn classify_response(&self, content: &str) -> Result<Classification, ContentError> {
        Ok(Self::classify(content))
    }

    async fn extract_last_positive_reply(
        &self,
        thread: &[ThreadMessage],
    ) -> Result<Option<String>, ContentError> {
        Ok(thread
            .iter()
            .find(|m| Self::classify(&m.body) == Classification::Interested)
            .map(|m| m.body.trim().to_string()))
    }

    async fn craft_follow_up(&self, request: &FollowUpRequest) -> Result<EmailDraft, ContentError> {
        let subject = request
            .thread
            .first()
            .map(|m| m.subject.trim())
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s.to_lowercase().starts_with("re:") {
                    s.to_string()
                } else {
                    format!("Re: {}", s)
                }
            })
            .unwrap_or_else(|| "Following up".to_string());

        let body = format!(
            "{}\n\n{}\n\n{}",
            greeting(&request.prospect_name),
            follow_up_line(request.classification),
            signature(&request.sender_name, &request.sender_site)
        );
        Ok(EmailDraft { subject, body })
    }

    fn name(&self) -> &'static str {
        "template"
    }
}
