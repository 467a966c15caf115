// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 两个长时间运行的流程：
/// - 爬取编排器：从种子商家解析联系邮箱
/// - 外联调度器：限速发送首发邮件、拉取回复并发送跟进邮件
pub mod campaign_status;
pub mod crawl_worker;
pub mod outreach_worker;
