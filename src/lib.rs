// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 发现、外联与导出用例
pub mod application;

/// 配置模块
///
/// 分层加载配置并转换为各组件的不可变配置
pub mod config;

/// 领域模块
///
/// 线索模型、领域服务与仓库接口
pub mod domain;

/// 引擎模块
///
/// 页面抓取引擎与主机级限速
pub mod engines;

/// 基础设施模块
///
/// 领域接口的具体实现：存储、邮件、搜索、验证、内容生成
pub mod infrastructure;

/// 队列模块
///
/// 单个商家的有界爬取队列
pub mod queue;

/// 工具模块
pub mod utils;

/// 工作器模块
///
/// 爬取编排器与外联调度器
pub mod workers;
