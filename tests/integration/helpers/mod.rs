// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use leadrs::domain::models::lead::LeadRecord;
use leadrs::domain::models::verification::{FailureReason, VerificationResult};
use leadrs::domain::services::verification_service::AddressVerifier;
use leadrs::engines::host_throttle::{HostThrottle, ThrottleConfig};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::time::Duration;

/// 只认可给定地址的验证器，记录每次验证
pub struct AllowListVerifier {
    allowed: HashSet<String>,
    pub checked: Mutex<Vec<String>>,
}

impl AllowListVerifier {
    pub fn new(allowed: &[&str]) -> Self {
        Self {
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
            checked: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AddressVerifier for AllowListVerifier {
    async fn verify(&self, address: &str) -> VerificationResult {
        self.checked.lock().push(address.to_string());
        if self.allowed.contains(address) {
            VerificationResult::deliverable(address)
        } else {
            VerificationResult::failed(address, FailureReason::RecipientRefused(550))
        }
    }
}

pub fn unthrottled() -> HostThrottle {
    HostThrottle::new(ThrottleConfig {
        global_concurrency: 8,
        per_host_concurrency: 4,
        download_delay: Duration::ZERO,
        max_delay: Duration::ZERO,
        target_concurrency: 1.0,
    })
}

pub fn lead_with_email(name: &str, website: &str, email: &str) -> LeadRecord {
    let mut lead = LeadRecord::new(name, website);
    lead.resolve_email(email);
    lead
}
