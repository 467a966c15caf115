// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::{HashSet, VecDeque};

use crate::domain::models::crawl_task::{CrawlTask, LinkPriority};

/// 单个商家的有界抓取队列
///
/// 高优先级链接总是先于普通链接出队；每个 URL 只入队一次；
/// 出队总数（含首页）不超过页面上限。
#[derive(Debug)]
pub struct CrawlQueue {
    high: VecDeque<CrawlTask>,
    normal: VecDeque<CrawlTask>,
    seen: HashSet<String>,
    page_cap: usize,
    dequeued: usize,
}

impl CrawlQueue {
    /// 以首页任务创建队列
    pub fn new(homepage: CrawlTask, page_cap: usize) -> Self {
        let mut queue = Self {
            high: VecDeque::new(),
            normal: VecDeque::new(),
            seen: HashSet::new(),
            page_cap,
            dequeued: 0,
        };
        queue.push(homepage);
        queue
    }

    /// 入队任务，已见过的 URL 返回 false
    pub fn push(&mut self, task: CrawlTask) -> bool {
        if !self.seen.insert(task.url.as_str().to_string()) {
            return false;
        }
        match task.priority {
            LinkPriority::High => self.high.push_back(task),
            LinkPriority::Normal => self.normal.push_back(task),
        }
        true
    }

    /// 取出下一个任务；达到页面上限或队列为空时返回 None
    pub fn next_task(&mut self) -> Option<CrawlTask> {
        if self.dequeued >= self.page_cap {
            return None;
        }
        let task = self.high.pop_front().or_else(|| self.normal.pop_front())?;
        self.dequeued += 1;
        Some(task)
    }

    /// 已出队（即已尝试抓取）的页面数
    pub fn pages_dequeued(&self) -> usize {
        self.dequeued
    }

    pub fn pending(&self) -> usize {
        self.high.len() + self.normal.len()
    }

    pub fn cap_reached(&self) -> bool {
        self.dequeued >= self.page_cap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn task(path: &str, priority: LinkPriority) -> CrawlTask {
        CrawlTask {
            url: Url::parse(&format!("https://acme.test{}", path)).unwrap(),
            owner: 0,
            depth_remaining: 2,
            priority,
        }
    }

    #[test]
    fn test_priority_links_first() {
        let mut queue = CrawlQueue::new(task("/", LinkPriority::High), 10);
        assert_eq!(queue.next_task().unwrap().url.path(), "/");

        queue.push(task("/menu", LinkPriority::Normal));
        queue.push(task("/gallery", LinkPriority::Normal));
        queue.push(task("/contact", LinkPriority::High));

        assert_eq!(queue.next_task().unwrap().url.path(), "/contact");
        assert_eq!(queue.next_task().unwrap().url.path(), "/menu");
        assert_eq!(queue.next_task().unwrap().url.path(), "/gallery");
        assert!(queue.next_task().is_none());
    }

    #[test]
    fn test_each_url_enqueued_once() {
        let mut queue = CrawlQueue::new(task("/", LinkPriority::High), 10);
        assert!(!queue.push(task("/", LinkPriority::Normal)));
        assert!(queue.push(task("/about", LinkPriority::High)));
        assert!(!queue.push(task("/about", LinkPriority::High)));
        assert_eq!(queue.pending(), 2);
    }

    #[test]
    fn test_page_cap_bounds_dequeues() {
        let mut queue = CrawlQueue::new(task("/", LinkPriority::High), 10);
        for i in 0..50 {
            queue.push(task(&format!("/p{}", i), LinkPriority::Normal));
        }

        let mut fetched = 0;
        while queue.next_task().is_some() {
            fetched += 1;
        }
        assert_eq!(fetched, 10);
        assert!(queue.cap_reached());
        assert_eq!(queue.pages_dequeued(), 10);
    }
}
