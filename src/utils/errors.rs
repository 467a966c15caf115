// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

/// 错误分类
///
/// 所有组件级错误最终都归入以下四类之一，调用方据此决定重试、过滤、降级还是中止
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 瞬时网络错误（超时、DNS失败、连接被拒绝），有限次重试后放弃当前页面/发送
    TransientNetwork,
    /// 地址校验拒绝（格式错误、占位地址），静默过滤，不重试
    ValidationRejection,
    /// 外部服务不可用（内容生成、搜索），记录日志并使用中性降级文本
    ServiceUnavailable,
    /// 致命配置错误，在任何副作用发生前中止运行
    FatalConfiguration,
}

/// 顶层错误类型
#[derive(Error, Debug)]
pub enum LeadError {
    #[error("transient network error: {0}")]
    TransientNetwork(String),

    #[error("address rejected: {0}")]
    ValidationRejection(String),

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("fatal configuration error: {0}")]
    FatalConfiguration(String),
}

impl LeadError {
    /// 获取错误分类
    pub fn kind(&self) -> ErrorKind {
        match self {
            LeadError::TransientNetwork(_) => ErrorKind::TransientNetwork,
            LeadError::ValidationRejection(_) => ErrorKind::ValidationRejection,
            LeadError::ServiceUnavailable(_) => ErrorKind::ServiceUnavailable,
            LeadError::FatalConfiguration(_) => ErrorKind::FatalConfiguration,
        }
    }

    /// 只有配置错误允许中止整个运行
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::FatalConfiguration
    }
}
