// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 抓取引擎模块
///
/// 页面抓取接口、基于 reqwest 的实现以及主机级限速
pub mod host_throttle;
pub mod reqwest_engine;
pub mod traits;
