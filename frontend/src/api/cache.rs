//! 查询缓存 - 纯数据结构
//!
//! 显式的缓存表：键为 (操作名, 序列化参数)，另维护
//! tag -> 键集合 的倒排索引供失效使用。不依赖任何响应式框架，
//! 失效契约在这里就能被完整单测。

use super::error::ApiError;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use topnotes_shared::protocol::{ApiOperation, Tag};

/// 缓存键：操作名 + 序列化后的调用参数
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub op: &'static str,
    pub args: String,
}

impl QueryKey {
    /// 由操作实例生成缓存键
    pub fn of<Op: ApiOperation>(op: &Op) -> Result<Self, serde_json::Error> {
        Ok(Self {
            op: Op::NAME,
            args: serialize_args(op)?,
        })
    }
}

fn serialize_args<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(value)
}

/// 单条缓存的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// 已订阅但尚未发起过请求
    Idle,
    /// 请求在途
    Pending,
    /// 最近一次请求成功
    Ready,
    /// 最近一次请求失败（不自动重试）
    Failed,
}

/// 缓存条目
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub status: EntryStatus,
    /// 最近一次成功响应（Pending 期间保留旧值）
    pub data: Option<serde_json::Value>,
    pub error: Option<ApiError>,
    pub tags: &'static [Tag],
    /// 被 tag 失效命中后置位，重取成功前不得当新鲜数据使用
    pub stale: bool,
    /// 失效计数：在途响应只有代数吻合才允许洗掉 stale
    pub generation: u64,
    /// 当前挂载的订阅者数量
    pub subscribers: usize,
}

impl CacheEntry {
    fn new(tags: &'static [Tag]) -> Self {
        Self {
            status: EntryStatus::Idle,
            data: None,
            error: None,
            tags,
            stale: false,
            generation: 0,
            subscribers: 0,
        }
    }
}

/// `begin_fetch` 的判定结果
#[derive(Debug, Clone, PartialEq)]
pub enum FetchDecision {
    /// 缓存新鲜，直接使用
    Cached(serde_json::Value),
    /// 已有同键请求在途，本次去重
    InFlight,
    /// 需要真正发出请求（条目已置为 Pending），携带发起时的代数
    Fetch(u64),
}

/// 进程级共享的查询缓存
#[derive(Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, CacheEntry>,
    tag_index: HashMap<Tag, HashSet<QueryKey>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 组件挂载时订阅某个键
    pub fn subscribe(&mut self, key: &QueryKey, tags: &'static [Tag]) {
        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::new(tags));
        entry.subscribers += 1;
        self.index_tags(key, tags);
    }

    /// 组件卸载时退订；订阅数归零则回收条目
    pub fn unsubscribe(&mut self, key: &QueryKey) {
        let Some(entry) = self.entries.get_mut(key) else {
            return;
        };
        entry.subscribers = entry.subscribers.saturating_sub(1);
        if entry.subscribers == 0 {
            let tags = entry.tags;
            self.entries.remove(key);
            for tag in tags {
                if let Some(keys) = self.tag_index.get_mut(tag) {
                    keys.remove(key);
                }
            }
        }
    }

    /// 判定某次查询是否需要发出请求
    ///
    /// 同键并发查询在此去重为单个在途请求。
    pub fn begin_fetch(&mut self, key: &QueryKey, tags: &'static [Tag]) -> FetchDecision {
        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::new(tags));

        match entry.status {
            EntryStatus::Pending => FetchDecision::InFlight,
            EntryStatus::Ready if !entry.stale => match &entry.data {
                Some(data) => FetchDecision::Cached(data.clone()),
                None => {
                    entry.status = EntryStatus::Pending;
                    FetchDecision::Fetch(entry.generation)
                }
            },
            _ => {
                entry.status = EntryStatus::Pending;
                FetchDecision::Fetch(entry.generation)
            }
        }
    }

    /// 请求成功：写入数据；仅当代数未变时清除 stale 标记
    ///
    /// 条目可能在请求期间被回收（订阅者全部卸载），此时静默丢弃。
    /// 返回 false 表示响应在途期间发生过失效：数据落盘但仍算过期，
    /// 调用方必须再发一轮请求。
    pub fn complete_ok(&mut self, key: &QueryKey, data: serde_json::Value, generation: u64) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            return true;
        };
        entry.status = EntryStatus::Ready;
        entry.data = Some(data);
        entry.error = None;
        if entry.generation == generation {
            entry.stale = false;
            true
        } else {
            false
        }
    }

    /// 请求失败：记录错误，保留旧数据
    pub fn complete_err(&mut self, key: &QueryKey, error: ApiError) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.status = EntryStatus::Failed;
            entry.error = Some(error);
        }
    }

    /// 按 tag 失效
    ///
    /// 命中的条目全部标记 stale；返回其中仍有订阅者的键，
    /// 调用方必须立即对它们发起重取。无订阅者的条目留待
    /// 下次订阅时重取。
    pub fn invalidate(&mut self, tags: &[Tag]) -> Vec<QueryKey> {
        let mut hit: HashSet<QueryKey> = HashSet::new();
        for tag in tags {
            if let Some(keys) = self.tag_index.get(tag) {
                hit.extend(keys.iter().cloned());
            }
        }

        let mut refetch_now = Vec::new();
        for key in hit {
            if let Some(entry) = self.entries.get_mut(&key) {
                entry.stale = true;
                entry.generation += 1;
                if entry.subscribers > 0 {
                    refetch_now.push(key);
                }
            }
        }
        refetch_now
    }

    pub fn get(&self, key: &QueryKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    fn index_tags(&mut self, key: &QueryKey, tags: &'static [Tag]) {
        for tag in tags {
            self.tag_index.entry(*tag).or_default().insert(key.clone());
        }
    }
}

// =========================================================
// 单元测试
// =========================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use topnotes_shared::NoteStatus;
    use topnotes_shared::protocol::ListNotesRequest;

    fn notes_key() -> QueryKey {
        QueryKey::of(&ListNotesRequest::with_status(NoteStatus::UnderReview)).unwrap()
    }

    const NOTES_TAGS: &[Tag] = &[Tag::Notes];

    fn expect_fetch(cache: &mut QueryCache, key: &QueryKey) -> u64 {
        match cache.begin_fetch(key, NOTES_TAGS) {
            FetchDecision::Fetch(generation) => generation,
            other => panic!("expected fetch, got {other:?}"),
        }
    }

    #[test]
    fn key_includes_operation_arguments() {
        let pending = notes_key();
        let mut with_search = ListNotesRequest::with_status(NoteStatus::UnderReview);
        with_search.search = Some("algebra".to_string());
        let searched = QueryKey::of(&with_search).unwrap();

        assert_eq!(pending.op, searched.op);
        assert_ne!(pending, searched);
    }

    #[test]
    fn concurrent_identical_queries_deduplicate() {
        let mut cache = QueryCache::new();
        let key = notes_key();

        let generation = expect_fetch(&mut cache, &key);
        // 第二个同键请求在途去重
        assert_eq!(cache.begin_fetch(&key, NOTES_TAGS), FetchDecision::InFlight);

        assert!(cache.complete_ok(&key, json!([1, 2]), generation));
        assert_eq!(cache.begin_fetch(&key, NOTES_TAGS), FetchDecision::Cached(json!([1, 2])));
    }

    #[test]
    fn invalidation_marks_stale_and_reports_subscribed_keys() {
        let mut cache = QueryCache::new();
        let key = notes_key();

        cache.subscribe(&key, NOTES_TAGS);
        let generation = expect_fetch(&mut cache, &key);
        assert!(cache.complete_ok(&key, json!(["n1"]), generation));

        let refetch = cache.invalidate(&[Tag::Notes]);
        assert_eq!(refetch, vec![key.clone()]);
        assert!(cache.get(&key).unwrap().stale);

        // 失效后的 begin_fetch 必须重新请求而不是供给旧值
        let next = expect_fetch(&mut cache, &key);
        assert!(cache.complete_ok(&key, json!([]), next));
        assert!(!cache.get(&key).unwrap().stale);
    }

    #[test]
    fn invalidation_without_subscribers_defers_refetch() {
        let mut cache = QueryCache::new();
        let key = notes_key();

        let generation = expect_fetch(&mut cache, &key);
        assert!(cache.complete_ok(&key, json!(["n1"]), generation));

        // 无订阅者：标记 stale，但不要求立即重取
        let refetch = cache.invalidate(&[Tag::Notes]);
        assert!(refetch.is_empty());
        assert!(matches!(cache.begin_fetch(&key, NOTES_TAGS), FetchDecision::Fetch(_)));
    }

    #[test]
    fn unrelated_tags_do_not_invalidate() {
        let mut cache = QueryCache::new();
        let key = notes_key();
        cache.subscribe(&key, NOTES_TAGS);
        let generation = expect_fetch(&mut cache, &key);
        cache.complete_ok(&key, json!([]), generation);

        assert!(cache.invalidate(&[Tag::Toppers]).is_empty());
        assert!(!cache.get(&key).unwrap().stale);
    }

    #[test]
    fn unsubscribe_to_zero_collects_entry() {
        let mut cache = QueryCache::new();
        let key = notes_key();

        cache.subscribe(&key, NOTES_TAGS);
        cache.subscribe(&key, NOTES_TAGS);
        cache.unsubscribe(&key);
        assert!(cache.get(&key).is_some());

        cache.unsubscribe(&key);
        assert!(cache.get(&key).is_none());
        // 回收后同 tag 的失效不再命中
        assert!(cache.invalidate(&[Tag::Notes]).is_empty());
    }

    #[test]
    fn unsubscribe_on_absent_key_is_noop() {
        let mut cache = QueryCache::new();
        cache.unsubscribe(&notes_key());
    }

    #[test]
    fn completion_after_collection_is_dropped() {
        let mut cache = QueryCache::new();
        let key = notes_key();

        cache.subscribe(&key, NOTES_TAGS);
        let generation = expect_fetch(&mut cache, &key);
        cache.unsubscribe(&key);

        // 卸载后的迟到响应被丢弃，不复活条目；也不要求重取
        assert!(cache.complete_ok(&key, json!(["late"]), generation));
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn stale_mark_survives_a_response_that_was_already_in_flight() {
        let mut cache = QueryCache::new();
        let key = notes_key();
        cache.subscribe(&key, NOTES_TAGS);

        let generation = expect_fetch(&mut cache, &key);
        // 响应落地前发生变更：条目作废，同键的重取去重进在途请求
        let _ = cache.invalidate(&[Tag::Notes]);
        assert_eq!(cache.begin_fetch(&key, NOTES_TAGS), FetchDecision::InFlight);

        // 变更前发出的响应不得把条目洗成新鲜
        assert!(!cache.complete_ok(&key, json!(["before"]), generation));
        assert!(cache.get(&key).unwrap().stale);
        assert!(matches!(cache.begin_fetch(&key, NOTES_TAGS), FetchDecision::Fetch(_)));
    }

    #[test]
    fn failure_keeps_previous_data_and_does_not_retry() {
        let mut cache = QueryCache::new();
        let key = notes_key();

        let generation = expect_fetch(&mut cache, &key);
        cache.complete_ok(&key, json!(["n1"]), generation);
        let _ = cache.invalidate(&[Tag::Notes]);

        expect_fetch(&mut cache, &key);
        cache.complete_err(&key, ApiError::Network("offline".into()));

        let entry = cache.get(&key).unwrap();
        assert_eq!(entry.status, EntryStatus::Failed);
        assert_eq!(entry.data, Some(json!(["n1"])));
        assert!(entry.error.is_some());
    }
}
