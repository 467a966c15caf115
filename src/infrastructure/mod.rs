// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 领域层接口的具体实现，负责与外部系统交互：
/// - 内容生成（content）：LLM 与本地模板
/// - 邮件（mail）：SMTP 发信与收件箱
/// - 可观测性（observability）：指标描述
/// - 仓库实现（repositories）：JSON Lines 与内存线索存储
/// - 搜索（search）：决策人查找使用的搜索引擎
/// - 验证（verification）：MX 解析与 SMTP 收件人探测
pub mod content;
pub mod mail;
pub mod observability;
pub mod repositories;
pub mod search;
pub mod verification;
