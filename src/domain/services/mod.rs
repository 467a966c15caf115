// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 该模块包含线索发现与外联的核心业务服务：
/// - 候选邮箱生成（candidate_generator）
/// - 邮箱过滤规则（email_filter）
/// - 地址可投递性验证（verification_service）
/// - 页面邮箱提取与链接发现（crawl_service）
/// - 决策人查找（decision_maker_service）
/// - 内容生成接口（content_service）
/// - 发信与收件箱接口（mail_service）
pub mod candidate_generator;
pub mod content_service;
pub mod crawl_service;
pub mod decision_maker_service;
pub mod email_filter;
pub mod mail_service;
pub mod verification_service;
