// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 线索仓库实现
pub mod jsonl_lead_repo;
pub mod memory_lead_repo;
