// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 搜索领域模块
///
/// 定义决策人查找所用的搜索引擎接口与搜索结果
pub mod engine;
