// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::time::Duration;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::ResolveErrorKind;
use trust_dns_resolver::proto::rr::rdata::MX;
use trust_dns_resolver::TokioAsyncResolver;

use crate::domain::services::verification_service::{MailRouteResolver, ProbeError};

/// 基于 trust-dns 的 MX 解析器
pub struct DnsMailRouteResolver {
    resolver: TokioAsyncResolver,
}

impl DnsMailRouteResolver {
    /// 使用系统 DNS 配置，读取失败时退回公共默认配置
    pub fn from_system(timeout: Duration) -> Self {
        let resolver = match TokioAsyncResolver::tokio_from_system_conf() {
            Ok(resolver) => resolver,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read system DNS config, using defaults");
                let mut opts = ResolverOpts::default();
                opts.timeout = timeout;
                TokioAsyncResolver::tokio(ResolverConfig::default(), opts)
            }
        };
        Self { resolver }
    }
}

/// 选出 preference 最小的 MX 主机并去掉末尾的根点
pub fn primary_exchange<'a>(records: impl IntoIterator<Item = &'a MX>) -> Option<String> {
    records
        .into_iter()
        .min_by_key(|mx| mx.preference())
        .map(|mx| mx.exchange().to_utf8().trim_end_matches('.').to_lowercase())
        .filter(|host| !host.is_empty())
}

#[async_trait]
impl MailRouteResolver for DnsMailRouteResolver {
    async fn primary_mail_host(&self, domain: &str) -> Result<Option<String>, ProbeError> {
        match self.resolver.mx_lookup(domain).await {
            Ok(lookup) => Ok(primary_exchange(lookup.iter())),
            Err(e) => match e.kind() {
                ResolveErrorKind::NoRecordsFound { .. } => Ok(None),
                _ => Err(ProbeError::Dns(e.to_string())),
            },
        }
    }
}
