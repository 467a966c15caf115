// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::describe_counter;

pub const PAGES_FETCHED_TOTAL: &str = "leadrs_pages_fetched_total";
pub const LEADS_RESOLVED_TOTAL: &str = "leadrs_leads_resolved_total";
pub const EMAILS_SENT_TOTAL: &str = "leadrs_emails_sent_total";
pub const VERIFICATION_TOTAL: &str = "leadrs_verification_total";

/// 注册指标描述
///
/// 只登记描述，不安装导出器；嵌入方可自行安装 recorder
pub fn describe_metrics() {
    describe_counter!(PAGES_FETCHED_TOTAL, "Total number of pages fetched while crawling");
    describe_counter!(
        LEADS_RESOLVED_TOTAL,
        "Total number of businesses resolved to an email address, by path (guess/crawl)"
    );
    describe_counter!(
        EMAILS_SENT_TOTAL,
        "Total number of outreach emails sent, by kind (initial/follow_up)"
    );
    describe_counter!(
        VERIFICATION_TOTAL,
        "Total number of address verifications, by outcome"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_without_recorder() {
        describe_metrics();
    }
}
