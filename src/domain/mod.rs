// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：线索记录及其状态迁移
/// - 仓库接口（repositories）：线索持久化抽象接口
/// - 搜索接口（search）：决策人查找使用的搜索面
/// - 服务（services）：候选生成、验证、页面分析与外联协作接口
///
/// 领域层是系统的核心，不依赖于任何外部实现，
/// 体现了纯粹的业务逻辑和业务规则。
pub mod models;
pub mod repositories;
pub mod search;
pub mod services;
