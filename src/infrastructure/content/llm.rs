// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::domain::models::classification::Classification;
use crate::domain::services::content_service::{
    ContentError, ContentGenerator, EmailDraft, FollowUpRequest, InitialEmailRequest,
};
use crate::domain::services::mail_service::ThreadMessage;

static TEXT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p, h1, h2, h3, li, span, div").expect("valid text selector"));

const SITE_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const MAX_SITE_WORDS: usize = 2000;
const NO_POSITIVE_REPLY: &str = "no positive reply found";

/// 基于 LLM 的内容生成器
///
/// # 功能
///
/// 通过 OpenAI 兼容的 chat-completions 接口生成个性化内容、邮件草稿与回复分类；
/// 个性化前先抓取网站可见文本（前 2000 个词）作为上下文
pub struct LlmContentGenerator {
    client: Client,
    api_key: String,
    model: String,
    api_base_url: String,
}

impl LlmContentGenerator {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        api_base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ContentError> {
        let client = Client::builder()
            .user_agent(SITE_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ContentError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn site_text(&self, url: &str) -> Result<String, ContentError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ContentError::Unavailable(format!("{}: {}", url, e)))?;
        if !response.status().is_success() {
            return Err(ContentError::Unavailable(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }
        let html = response
            .text()
            .await
            .map_err(|e| ContentError::Unavailable(format!("{}: {}", url, e)))?;
        let text = visible_text(&html);
        if text.is_empty() {
            return Err(ContentError::Unavailable(format!("{} has no readable text", url)));
        }
        Ok(text)
    }

    /// 调用 chat-completions 接口并返回第一条回复内容
    ///
    /// # 参数
    ///
    /// * `system` - 系统角色设定
    /// * `prompt` - 用户提示词
    ///
    /// # 返回值
    ///
    /// * `Ok(String)` - 去除首尾空白后的回复
    /// * `Err(ContentError)` - 网络失败、非 2xx 或响应结构不符
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ContentError> {
        let request_body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt }
            ],
            "temperature": 0.7
        });

        let url = format!("{}/chat/completions", self.api_base_url);
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ContentError::Timeout
                } else {
                    ContentError::Unavailable(format!("Failed to send request to LLM API: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ContentError::Unavailable(format!(
                "LLM API returned error: {} - {}",
                status, error_text
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ContentError::InvalidResponse(format!("Failed to parse LLM API response: {}", e)))?;

        match body["choices"][0]["message"]["content"].as_str() {
            Some(content) if !content.trim().is_empty() => {
                debug!(model = %self.model, chars = content.len(), "LLM completion received");
                Ok(content.trim().to_string())
            }
            _ => Err(ContentError::InvalidResponse(
                "Invalid response format from LLM API".to_string(),
            )),
        }
    }
}

/// 提取页面可见文本，只保留前 2000 个词
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let words: Vec<&str> = document
        .select(&TEXT_SELECTOR)
        .flat_map(|element| element.text())
        .flat_map(str::split_whitespace)
        .take(MAX_SITE_WORDS)
        .collect();
    words.join(" ")
}

/// 把邮件线程格式化为提示词文本（最新的在前）
pub fn format_thread(thread: &[ThreadMessage]) -> String {
    thread
        .iter()
        .map(|m| {
            format!(
                "To: {}\nDate: {}\nSubject: {}\n\n{}",
                m.to,
                m.date.to_rfc3339(),
                m.subject,
                m.body
            )
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}

/// 解析“最近一次积极回复”的输出，未找到时返回 None
pub fn parse_positive_reply(output: &str) -> Option<String> {
    let text = match output.split_once(':') {
        Some((label, rest)) if label.to_lowercase().contains("positive reply") => rest,
        _ => output,
    };
    let text = text.trim().trim_matches('"').trim();
    let lowered = text.to_lowercase();
    if text.is_empty() || lowered == "none" || lowered.contains(NO_POSITIVE_REPLY) {
        None
    } else {
        Some(text.to_string())
    }
}

fn greeting_name(prospect_name: &str) -> &str {
    if prospect_name.trim().len() < 3 {
        "use business name"
    } else {
        prospect_name.trim()
    }
}

fn exemplar_section(last_positive_reply: Option<&str>, kind: &str) -> String {
    match last_positive_reply {
        Some(reply) => format!(
            "\n\nLast Positive Reply Example:\n{}\n\nUse this positive reply as inspiration for the tone and content of your {}.",
            reply, kind
        ),
        None => String::new(),
    }
}

#[async_trait]
impl ContentGenerator for LlmContentGenerator {
    async fn personalize_offer(&self, site_url: &str, custom_offer: &str) -> Result<String, ContentError> {
        let content = self.site_text(site_url).await?;
        let custom = if custom_offer.trim().is_empty() {
            String::new()
        } else {
            format!("\n---------THE USER WANTS TO: {}", custom_offer.trim())
        };
        let prompt = format!(
            "Analyze the following website content and create a focused, compelling offer based on the user's website. \
             Highlight key benefits and a clear value proposition.\n\n{}{}\n\n\
             Expected output:\n1. Unique Value Proposition (1 sentence)\n2. Key Benefits (2-3 bullet points)\n\
             3. Target Audience Pain Point (1 sentence)\n4. Call-to-Action (1 concise sentence)",
            content, custom
        );
        self.complete(
            "You are an expert in distilling complex information into clear, impactful marketing messages.",
            &prompt,
        )
        .await
    }

    async fn personalize_prospect(&self, site_url: &str) -> Result<String, ContentError> {
        let content = self.site_text(site_url).await?;
        let prompt = format!(
            "Analyze the following website content and identify the most relevant details about the prospect's business \
             for a personalized email.\n\n{}\n\n\
             Expected output:\n1. Main product/service focus (1 sentence)\n2. Target audience or market (1 sentence)\n\
             3. Recent achievement or news (if any) (1 sentence)\n4. Potential pain point or challenge (1-2 sentences)\n\
             5. Language of the website:",
            content
        );
        self.complete(
            "You excel at identifying crucial business details for targeted, relevant communication.",
            &prompt,
        )
        .await
    }

    async fn craft_initial_email(&self, request: &InitialEmailRequest) -> Result<EmailDraft, ContentError> {
        let prompt = format!(
            "Craft a short and concise friendly, intriguing ready to send email (no brackets to fill data) that feels like \
             it's from a helpful acquaintance and must not feel like a sale.\n\
             Sender: {}\nSender website: {}, put it once only.\nProspect name: {}\nOffer: {}\n\nProspect Info: {}\n\n\
             Guidelines:\nWrite the email in the language of the prospect's website.\n\
             1. First line: \"Subject: \" followed by an intriguing, casual subject under 40 characters\n\
             2. Opening: personalized, friendly sentence showing understanding of the prospect's situation\n\
             3. Body: focus on solving pain points with a specific, tangible offer\n\
             4. Call-to-Action: one clear, low-pressure ask for a future appointment{}",
            request.sender_name,
            request.sender_site,
            greeting_name(&request.prospect_name),
            request.offer_summary,
            request.prospect_summary,
            exemplar_section(request.last_positive_reply.as_deref(), "email"),
        );
        let output = self
            .complete(
                "You write impactful emails that are casual and focus on solving pain points rather than listing features.",
                &prompt,
            )
            .await?;
        Ok(EmailDraft::parse(&output))
    }

    async fn classify_response(&self, content: &str) -> Result<Classification, ContentError> {
        let prompt = format!(
            "Classify the following email based on its content and intent.\n\nEmail Content:\n{}\n\n\
             Possible Classifications:\n1. Interested\n2. Need More Info\n3. Not Interested\n4. Wrong Person\n\
             5. Out of Office\n6. Other\n\n\
             Answer in the form:\nClassification: [one of the above]\nExplanation: [1-2 sentences]",
            content
        );
        let output = self
            .complete(
                "You are an expert in understanding email communications and their underlying intents.",
                &prompt,
            )
            .await?;
        Ok(Classification::parse(&output))
    }

    async fn extract_last_positive_reply(
        &self,
        thread: &[ThreadMessage],
    ) -> Result<Option<String>, ContentError> {
        if thread.is_empty() {
            return Ok(None);
        }
        let prompt = format!(
            "Analyze the following email thread and identify the most recent positive reply from the prospect. \
             A positive reply shows interest, asks for more information, or expresses willingness to engage further.\n\n\
             Email Thread:\n{}\n\n\
             If there are no positive replies, return \"No positive reply found\".\n\
             Answer in the form:\nMost recent positive reply: [content]",
            format_thread(thread)
        );
        let output = self
            .complete(
                "You are an expert in analyzing email sentiment and identifying positive responses.",
                &prompt,
            )
            .await?;
        Ok(parse_positive_reply(&output))
    }

    async fn craft_follow_up(&self, request: &FollowUpRequest) -> Result<EmailDraft, ContentError> {
        let prompt = format!(
            "Craft a personalized follow-up email based on the previous interaction and the prospect's response classification.\n\n\
             Sender: {}\nSender Website: {}\nProspect Name: {}\nOffer: {}\nProspect Info: {}\n\
             Previous Emails:\n{}\nEmail Classification: {}\n\n\
             Guidelines:\n1. First line: \"Subject: \" followed by the subject\n\
             2. Tailor the follow-up to the classification and previous interactions\n\
             3. Address any concerns or questions raised in the prospect's response\n\
             4. Include a clear but low-pressure call-to-action\n\
             5. Use the same language as the prospect's website{}",
            request.sender_name,
            request.sender_site,
            greeting_name(&request.prospect_name),
            request.offer_summary,
            request.prospect_summary,
            format_thread(&request.thread),
            request.classification,
            exemplar_section(request.last_positive_reply.as_deref(), "follow-up email"),
        );
        let output = self
            .complete(
                "You are an expert in nurturing leads through thoughtful and targeted follow-up communications.",
                &prompt,
            )
            .await?;
        Ok(EmailDraft::parse(&output))
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}
