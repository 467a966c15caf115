// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 地址验证基础设施
///
/// MX 解析（trust-dns）与 SMTP 收件人探测（lettre）
pub mod dns_resolver;
pub mod smtp_probe;
