// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 邮件基础设施
///
/// - SMTP 发信（smtp_transport）
/// - 外部轮询程序导出的文件收件箱（file_mailbox）
/// - 内存收件箱，用于测试与嵌入（memory_mailbox）
pub mod file_mailbox;
pub mod memory_mailbox;
pub mod smtp_transport;
