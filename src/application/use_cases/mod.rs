// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 用例模块
///
/// 每个用例对应一个命令行子命令
pub mod discover_leads;
pub mod export_leads;
pub mod run_campaign;
