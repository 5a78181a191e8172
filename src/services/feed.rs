//! 实时推送：事件总线 + 以 id 为键的报名缓存

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::{Submission, WinRecord};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "action", content = "record", rename_all = "snake_case")]
pub enum SubmissionEvent {
    Inserted(Submission),
    Updated(Submission),
    Deleted { id: String },
    Cleared,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "action", content = "record", rename_all = "snake_case")]
pub enum RaffleEvent {
    WinRecorded(WinRecord),
    /// 通知失败只作为警告推送，不影响抽奖结果
    NotificationFailed {
        win_id: String,
        recipient: String,
        error: String,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum FeedEvent {
    Submission(SubmissionEvent),
    Raffle(RaffleEvent),
}

impl FeedEvent {
    /// SSE `event:` 名称
    pub fn name(&self) -> &'static str {
        match self {
            FeedEvent::Submission(_) => "submission",
            FeedEvent::Raffle(RaffleEvent::WinRecorded(_)) => "win",
            FeedEvent::Raffle(RaffleEvent::NotificationFailed { .. }) => "warning",
        }
    }
}

#[derive(Clone)]
pub struct EventFeed {
    tx: broadcast::Sender<FeedEvent>,
}

impl EventFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// 没有订阅者时发送失败，属于正常情况
    pub fn publish(&self, event: FeedEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.tx.subscribe()
    }
}

/// 报名缓存
///
/// 只接收已经写库成功的事件；重复投递与乱序删除都是安全的。
#[derive(Clone, Default)]
pub struct SubmissionCache {
    inner: Arc<RwLock<HashMap<String, Submission>>>,
}

impl SubmissionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 返回事件是否改变了缓存
    pub fn apply(&self, event: &SubmissionEvent) -> bool {
        let mut map = match self.inner.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        match event {
            SubmissionEvent::Inserted(s) => {
                if map.contains_key(&s.id) {
                    return false;
                }
                map.insert(s.id.clone(), s.clone());
                true
            }
            SubmissionEvent::Updated(s) => map.insert(s.id.clone(), s.clone()).as_ref() != Some(s),
            SubmissionEvent::Deleted { id } => map.remove(id).is_some(),
            SubmissionEvent::Cleared => {
                let changed = !map.is_empty();
                map.clear();
                changed
            }
        }
    }

    /// 用数据库全集替换缓存（启动时）
    pub fn prime(&self, submissions: Vec<Submission>) {
        let mut map = match self.inner.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.clear();
        map.extend(submissions.into_iter().map(|s| (s.id.clone(), s)));
    }

    /// 按报名时间升序
    pub fn snapshot(&self) -> Vec<Submission> {
        let map = match self.inner.read() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut list: Vec<Submission> = map.values().cloned().collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        list
    }

    pub fn len(&self) -> usize {
        match self.inner.read() {
            Ok(g) => g.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldMap;
    use chrono::{Duration, Utc};

    fn submission(id: &str, offset_secs: i64) -> Submission {
        Submission {
            id: id.to_string(),
            data: FieldMap::new(),
            created_at: Utc::now() + Duration::seconds(offset_secs),
        }
    }

    #[test]
    fn test_duplicate_insert_is_ignored() {
        let cache = SubmissionCache::new();
        let s = submission("a", 0);
        assert!(cache.apply(&SubmissionEvent::Inserted(s.clone())));

        let mut changed = s.clone();
        changed.data.insert("email".into(), "x@y.z".into());
        assert!(!cache.apply(&SubmissionEvent::Inserted(changed)));
        assert_eq!(cache.snapshot(), vec![s]);
    }

    #[test]
    fn test_delete_unknown_id_is_ignored() {
        let cache = SubmissionCache::new();
        cache.apply(&SubmissionEvent::Inserted(submission("a", 0)));
        assert!(!cache.apply(&SubmissionEvent::Deleted { id: "zzz".into() }));
        assert_eq!(cache.len(), 1);
        assert!(cache.apply(&SubmissionEvent::Deleted { id: "a".into() }));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_update_replaces_and_snapshot_is_ordered() {
        let cache = SubmissionCache::new();
        cache.prime(vec![submission("late", 10), submission("early", -10)]);

        let mut updated = submission("late", 10);
        updated.data.insert("fullName".into(), "Bia".into());
        assert!(cache.apply(&SubmissionEvent::Updated(updated.clone())));
        assert!(!cache.apply(&SubmissionEvent::Updated(updated.clone())));

        let ids: Vec<String> = cache.snapshot().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["early", "late"]);
    }

    #[tokio::test]
    async fn test_feed_delivers_to_subscribers() {
        let feed = EventFeed::new(8);
        feed.publish(FeedEvent::Submission(SubmissionEvent::Cleared));

        let mut rx = feed.subscribe();
        feed.publish(FeedEvent::Submission(SubmissionEvent::Deleted { id: "a".into() }));
        let event = rx.recv().await.unwrap();
        assert_eq!(event.name(), "submission");

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "submission");
        assert_eq!(json["payload"]["action"], "deleted");
        assert_eq!(json["payload"]["record"]["id"], "a");
    }
}
