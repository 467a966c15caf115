// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 线索记录（lead）：每个商家一条，贯穿发现与外联两个阶段
/// - 种子商家（business）：待发现的输入行
/// - 爬取任务（crawl_task）：单个待抓取页面
/// - 验证结果（verification）：地址可投递性探测的结果
/// - 回复分类（classification）：外联回复的意图标签
pub mod business;
pub mod classification;
pub mod crawl_task;
pub mod lead;
pub mod verification;
