// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 内容生成实现
///
/// - `llm`: OpenAI 兼容接口
/// - `template`: 本地规则模板，亦作为降级实现
pub mod llm;
pub mod template;
