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

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::engines::host_throttle::ThrottleConfig;
use crate::infrastructure::verification::smtp_probe::ProbeConfig;
use crate::utils::errors::LeadError;
use crate::utils::retry_policy::RetryPolicy;
use crate::workers::crawl_worker::CrawlConfig;
use crate::workers::outreach_worker::OutreachConfig;

/// 单个商家最多抓取的页面数（含首页）
pub const MAX_PAGES_PER_BUSINESS: usize = 10;

/// 应用程序配置设置
///
/// 所有组件在构造时接收由此转换出的不可变配置，不存在进程级可变全局状态
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Settings {
    /// 爬取配置
    #[validate(nested)]
    pub crawl: CrawlSettings,
    /// 地址验证配置
    #[validate(nested)]
    pub verification: VerificationSettings,
    /// 搜索配置（决策人查找）
    pub search: SearchSettings,
    /// 外联活动配置
    #[validate(nested)]
    pub outreach: OutreachSettings,
    /// 发信 SMTP 配置
    pub smtp: SmtpSettings,
    /// 收件箱配置
    pub mailbox: MailboxSettings,
    /// LLM 配置
    #[validate(nested)]
    pub llm: LlmSettings,
    /// 存储配置
    pub storage: StorageSettings,
    /// 日志配置
    pub log: LogSettings,
}

/// 爬取配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CrawlSettings {
    /// 每个商家最多抓取的页面数（含首页）
    #[validate(range(min = 1, max = 10))]
    pub max_pages_per_business: usize,
    /// 首页的剩余链接深度
    pub max_link_depth: u32,
    /// 全局并发上限
    #[validate(range(min = 1))]
    pub global_concurrency: usize,
    /// 单主机并发上限
    #[validate(range(min = 1))]
    pub per_host_concurrency: usize,
    /// 同时处理的商家数
    #[validate(range(min = 1))]
    pub max_concurrent_businesses: usize,
    /// 同一主机两次请求的基础间隔（毫秒）
    pub download_delay_ms: u64,
    /// 自适应限速的最大间隔（毫秒）
    pub autothrottle_max_delay_ms: u64,
    /// 自适应限速的目标并发
    #[validate(range(min = 0.1))]
    pub autothrottle_target_concurrency: f64,
    /// 瞬时错误重试次数
    pub retry_times: u32,
    /// 请求超时时间（秒）
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,
    /// 轮换使用的 User-Agent 列表
    pub user_agents: Vec<String>,
}

/// 地址验证配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VerificationSettings {
    /// SMTP 连接超时（秒）
    #[validate(range(min = 1))]
    pub smtp_timeout_secs: u64,
    /// HELO 主机名
    pub helo_name: String,
    /// MAIL FROM 地址，空字符串表示空发件人 `<>`
    pub sender: String,
}

/// 搜索配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    /// 搜索页基础地址
    pub base_url: String,
    /// 附加在查询中的地区
    pub location: String,
    /// 请求超时（秒）
    pub timeout_secs: u64,
    /// 读取的结果条数
    pub result_limit: u32,
}

/// 外联活动配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_daily_range"))]
pub struct OutreachSettings {
    /// 每日目标发送数下限
    #[validate(range(min = 1))]
    pub min_daily_emails: u32,
    /// 每日目标发送数上限
    #[validate(range(min = 1))]
    pub max_daily_emails: u32,
    /// 发送时间窗口（秒）
    #[validate(range(min = 1))]
    pub window_seconds: u64,
    /// 间隔抖动（秒）
    #[validate(range(min = 0.0))]
    pub jitter_seconds: f64,
    /// 单次间隔上限（秒）
    #[validate(range(min = 0.0))]
    pub max_delay_seconds: f64,
    /// 跟进邮件上限
    #[validate(range(min = 0, max = 4))]
    pub follow_up_cap: u8,
    /// 每成功发送多少封推送一次状态快照
    #[validate(range(min = 1))]
    pub status_every: u32,
    /// 发件人姓名
    pub sender_name: String,
    /// 发件人网站
    pub sender_site: String,
    /// 自定义优惠说明
    pub custom_offer: String,
    /// 内容生成调用超时（秒）
    #[validate(range(min = 1))]
    pub content_timeout_secs: u64,
    /// 单次发送超时（秒）
    #[validate(range(min = 1))]
    pub send_timeout_secs: u64,
    /// 内容生成实现：`template` 或 `llm`
    pub content_provider: String,
    /// 随机种子（可复现的发送顺序）
    pub rng_seed: Option<u64>,
}

fn validate_daily_range(settings: &OutreachSettings) -> Result<(), ValidationError> {
    if settings.min_daily_emails > settings.max_daily_emails {
        return Err(ValidationError::new("min_daily_emails_exceeds_max"));
    }
    Ok(())
}

/// SMTP 发信配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpSettings {
    /// SMTP 服务器
    pub host: String,
    /// 端口（STARTTLS）
    pub port: u16,
    /// 用户名
    pub username: String,
    /// 密码
    pub password: String,
    /// 发件地址，缺省时使用用户名
    pub from_address: Option<String>,
}

impl SmtpSettings {
    /// 实际使用的发件地址
    pub fn sender_address(&self) -> &str {
        self.from_address
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.username)
    }
}

/// 收件箱配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MailboxSettings {
    /// 外部轮询程序导出 `inbox.json` / `sent.json` 的目录
    pub dir: String,
}

/// LLM 配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LlmSettings {
    /// API 密钥
    pub api_key: Option<String>,
    /// 模型名称
    pub model: String,
    /// API 基础地址
    pub api_base_url: String,
    /// 请求超时（秒）
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
}

/// 存储配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// 线索文件（JSON Lines）
    pub leads_path: String,
    /// 种子商家列表（JSON 数组）
    pub seeds_path: String,
}

/// 日志配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// 是否输出 JSON 日志
    pub json: bool,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从默认值、配置文件与环境变量加载配置
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// 加载配置，`config_file` 覆盖默认的配置文件
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let mut builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false));

        if let Some(path) = config_file {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder
            .add_source(Environment::with_prefix("LEADRS").separator("__"))
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            // Crawl
            .set_default("crawl.max_pages_per_business", MAX_PAGES_PER_BUSINESS as u64)?
            .set_default("crawl.max_link_depth", 3)?
            .set_default("crawl.global_concurrency", 8)?
            .set_default("crawl.per_host_concurrency", 2)?
            .set_default("crawl.max_concurrent_businesses", 8)?
            .set_default("crawl.download_delay_ms", 2000)?
            .set_default("crawl.autothrottle_max_delay_ms", 60000)?
            .set_default("crawl.autothrottle_target_concurrency", 1.0)?
            .set_default("crawl.retry_times", 3)?
            .set_default("crawl.request_timeout_secs", 60)?
            .set_default("crawl.user_agents", default_user_agents())?
            // Verification
            .set_default("verification.smtp_timeout_secs", 10)?
            .set_default("verification.helo_name", "localhost")?
            .set_default("verification.sender", "")?
            // Search
            .set_default("search.base_url", "https://www.google.com")?
            .set_default("search.location", "")?
            .set_default("search.timeout_secs", 30)?
            .set_default("search.result_limit", 10)?
            // Outreach
            .set_default("outreach.min_daily_emails", 180)?
            .set_default("outreach.max_daily_emails", 220)?
            .set_default("outreach.window_seconds", 8 * 60 * 60)?
            .set_default("outreach.jitter_seconds", 5.0)?
            .set_default("outreach.max_delay_seconds", 600.0)?
            .set_default("outreach.follow_up_cap", 4)?
            .set_default("outreach.status_every", 2)?
            .set_default("outreach.sender_name", "")?
            .set_default("outreach.sender_site", "")?
            .set_default("outreach.custom_offer", "")?
            .set_default("outreach.content_timeout_secs", 60)?
            .set_default("outreach.send_timeout_secs", 30)?
            .set_default("outreach.content_provider", "template")?
            // SMTP
            .set_default("smtp.host", "smtp.gmail.com")?
            .set_default("smtp.port", 587)?
            .set_default("smtp.username", "")?
            .set_default("smtp.password", "")?
            // Mailbox
            .set_default("mailbox.dir", "./mailbox")?
            // LLM
            .set_default("llm.model", "gpt-4o-mini")?
            .set_default("llm.api_base_url", "https://api.openai.com/v1")?
            .set_default("llm.timeout_secs", 60)?
            // Storage
            .set_default("storage.leads_path", "./data/business_leads_with_emails.jsonl")?
            .set_default("storage.seeds_path", "./data/business_leads.json")?
            // Log
            .set_default("log.json", false)
    }

    /// 校验 `discover` 命令所需配置
    pub fn validate_for_discovery(&self) -> Result<(), LeadError> {
        self.validate_fields()?;
        require("storage.seeds_path", &self.storage.seeds_path)?;
        require("storage.leads_path", &self.storage.leads_path)?;
        if self.crawl.user_agents.is_empty() {
            return Err(LeadError::FatalConfiguration(
                "crawl.user_agents must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// 校验 `campaign` 命令所需配置（凭据、发件人身份、内容生成实现）
    pub fn validate_for_campaign(&self) -> Result<(), LeadError> {
        self.validate_fields()?;
        require("storage.leads_path", &self.storage.leads_path)?;
        require("smtp.host", &self.smtp.host)?;
        require("smtp.username", &self.smtp.username)?;
        require("smtp.password", &self.smtp.password)?;
        require("outreach.sender_name", &self.outreach.sender_name)?;
        require("outreach.sender_site", &self.outreach.sender_site)?;

        match self.outreach.content_provider.as_str() {
            "template" => Ok(()),
            "llm" => {
                let key = self.llm.api_key.as_deref().unwrap_or("");
                require("llm.api_key", key)
            }
            other => Err(LeadError::FatalConfiguration(format!(
                "unknown outreach.content_provider '{}'",
                other
            ))),
        }
    }

    fn validate_fields(&self) -> Result<(), LeadError> {
        self.validate()
            .map_err(|e| LeadError::FatalConfiguration(e.to_string()))
    }

    /// 爬取编排器配置
    pub fn crawl_config(&self) -> CrawlConfig {
        CrawlConfig {
            max_pages_per_business: self.crawl.max_pages_per_business.min(MAX_PAGES_PER_BUSINESS),
            max_link_depth: self.crawl.max_link_depth,
            max_concurrent_businesses: self.crawl.max_concurrent_businesses,
            request_timeout: Duration::from_secs(self.crawl.request_timeout_secs),
            retry_policy: RetryPolicy::with_max_retries(self.crawl.retry_times),
        }
    }

    /// 主机级限速配置
    pub fn throttle_config(&self) -> ThrottleConfig {
        ThrottleConfig {
            global_concurrency: self.crawl.global_concurrency,
            per_host_concurrency: self.crawl.per_host_concurrency,
            download_delay: Duration::from_millis(self.crawl.download_delay_ms),
            max_delay: Duration::from_millis(self.crawl.autothrottle_max_delay_ms),
            target_concurrency: self.crawl.autothrottle_target_concurrency,
        }
    }

    /// SMTP 探测配置
    pub fn probe_config(&self) -> ProbeConfig {
        let sender = self.verification.sender.trim();
        ProbeConfig {
            connect_timeout: Duration::from_secs(self.verification.smtp_timeout_secs),
            helo_name: self.verification.helo_name.clone(),
            sender: if sender.is_empty() {
                None
            } else {
                Some(sender.to_string())
            },
        }
    }

    /// 外联调度器配置
    pub fn outreach_config(&self) -> OutreachConfig {
        OutreachConfig {
            min_daily_emails: self.outreach.min_daily_emails,
            max_daily_emails: self.outreach.max_daily_emails,
            window: Duration::from_secs(self.outreach.window_seconds),
            jitter: Duration::from_secs_f64(self.outreach.jitter_seconds),
            max_delay: Duration::from_secs_f64(self.outreach.max_delay_seconds),
            follow_up_cap: self.outreach.follow_up_cap,
            status_every: self.outreach.status_every,
            sender_name: self.outreach.sender_name.clone(),
            sender_site: self.outreach.sender_site.clone(),
            custom_offer: self.outreach.custom_offer.clone(),
            rng_seed: self.outreach.rng_seed,
        }
    }
}

fn require(key: &str, value: &str) -> Result<(), LeadError> {
    if value.trim().is_empty() {
        return Err(LeadError::FatalConfiguration(format!(
            "missing required setting '{}'",
            key
        )));
    }
    Ok(())
}

fn default_user_agents() -> Vec<String> {
    [
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_14_6) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
