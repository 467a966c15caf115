// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::Url;

/// 链接优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPriority {
    /// 路径包含 about / team / contact / people
    High,
    Normal,
}

/// 待抓取页面
///
/// 只由爬取编排器持有，抓取完成或深度耗尽后即丢弃
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    /// 目标地址
    pub url: Url,
    /// 所属线索在本轮中的下标
    pub owner: usize,
    /// 剩余链接深度
    pub depth_remaining: u32,
    pub priority: LinkPriority,
}

impl CrawlTask {
    /// 首页任务
    pub fn homepage(url: Url, owner: usize, max_depth: u32) -> Self {
        Self {
            url,
            owner,
            depth_remaining: max_depth,
            priority: LinkPriority::High,
        }
    }

    /// 从当前页面派生子链接任务，深度耗尽时返回 None
    pub fn child(&self, url: Url, priority: LinkPriority) -> Option<Self> {
        if self.depth_remaining == 0 {
            return None;
        }
        Some(Self {
            url,
            owner: self.owner,
            depth_remaining: self.depth_remaining - 1,
            priority,
        })
    }
}
