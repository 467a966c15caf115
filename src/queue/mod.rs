// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 爬取编排器使用的单商家有界工作队列
pub mod crawl_queue;
