// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 组装领域服务与基础设施，实现发现、外联与导出三个用例
pub mod use_cases;
