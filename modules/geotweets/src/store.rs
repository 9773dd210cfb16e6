//! Realtime key-path store: the alternative post backend.
//!
//! Paths are `/`-separated (`tweets/Virginia/0000000000000001`). Writing
//! `Value::Null` deletes. Subscribers receive the current value at their path
//! immediately and again after every write that touches it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("invalid store path: {0:?}")]
    InvalidPath(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// What a subscriber sees: either a fresh value or the end of the subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Changed(Option<Value>),
    Cancelled(String),
}

#[async_trait]
pub trait RealtimeStore: Send + Sync {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Store `value` under a new child of `path`; returns the child key.
    /// Keys sort in creation order.
    async fn push(&self, path: &str, value: Value) -> Result<String, StoreError>;

    async fn subscribe(&self, path: &str) -> Result<Subscription, StoreError>;
}

/// Live subscription handle. Dropping it unsubscribes.
pub struct Subscription {
    events: mpsc::UnboundedReceiver<StoreEvent>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(events: mpsc::UnboundedReceiver<StoreEvent>, task: Option<JoinHandle<()>>) -> Self {
        Self { events, task }
    }

    /// Next event, or `None` once the subscription has ended.
    pub async fn recv(&mut self) -> Option<StoreEvent> {
        self.events.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[derive(Debug, Clone)]
enum Change {
    Written(Vec<String>),
    Closed(String),
}

struct Inner {
    root: RwLock<Value>,
    changes: broadcast::Sender<Change>,
    next_key: AtomicU64,
}

impl Inner {
    async fn read(&self, segments: &[String]) -> Option<Value> {
        let root = self.root.read().await;
        let mut node = &*root;
        for segment in segments {
            node = node.get(segment.as_str())?;
        }
        (!node.is_null()).then(|| node.clone())
    }
}

/// In-process store over a single JSON tree.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(Inner {
                root: RwLock::new(Value::Object(Map::new())),
                changes,
                next_key: AtomicU64::new(1),
            }),
        }
    }

    /// End every live subscription with `StoreEvent::Cancelled(reason)`.
    pub fn close_subscriptions(&self, reason: &str) {
        let _ = self.inner.changes.send(Change::Closed(reason.to_string()));
    }
}

#[async_trait]
impl RealtimeStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let segments = parse_path(path)?;
        Ok(self.inner.read(&segments).await)
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let segments = parse_path(path)?;
        let Some((leaf, parents)) = segments.split_last() else {
            return Err(StoreError::InvalidPath(path.to_string()));
        };

        {
            let mut root = self.inner.root.write().await;
            if value.is_null() {
                remove_path(&mut root, &segments);
            } else {
                let mut node = &mut *root;
                for segment in parents {
                    node = child_mut(node, segment);
                }
                *child_mut(node, leaf) = value;
            }
        }

        tracing::debug!(path, "Store write");
        let _ = self.inner.changes.send(Change::Written(segments));
        Ok(())
    }

    async fn push(&self, path: &str, value: Value) -> Result<String, StoreError> {
        let key = format!("{:016}", self.inner.next_key.fetch_add(1, Ordering::Relaxed));
        let child = format!("{}/{}", path.trim_end_matches('/'), key);
        self.set(&child, value).await?;
        Ok(key)
    }

    async fn subscribe(&self, path: &str) -> Result<Subscription, StoreError> {
        let segments = parse_path(path)?;
        let (tx, rx) = mpsc::unbounded_channel();
        // Subscribe before the initial read so no write can slip between them.
        let mut changes = self.inner.changes.subscribe();
        let inner = self.inner.clone();

        let _ = tx.send(StoreEvent::Changed(inner.read(&segments).await));

        let task = tokio::spawn(async move {
            loop {
                let touched = match changes.recv().await {
                    Ok(Change::Written(written)) => overlaps(&segments, &written),
                    Ok(Change::Closed(reason)) => {
                        let _ = tx.send(StoreEvent::Cancelled(reason));
                        break;
                    }
                    // Missed some writes; the current value is still correct.
                    Err(broadcast::error::RecvError::Lagged(_)) => true,
                    Err(broadcast::error::RecvError::Closed) => {
                        let _ = tx.send(StoreEvent::Cancelled("store closed".to_string()));
                        break;
                    }
                };
                if touched && tx.send(StoreEvent::Changed(inner.read(&segments).await)).is_err() {
                    break;
                }
            }
        });

        Ok(Subscription::new(rx, Some(task)))
    }
}

fn parse_path(path: &str) -> Result<Vec<String>, StoreError> {
    let segments: Vec<String> = path
        .trim_matches('/')
        .split('/')
        .map(str::to_string)
        .collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(segments)
}

fn child_mut<'a>(node: &'a mut Value, key: &str) -> &'a mut Value {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        unreachable!("node was just replaced with an object")
    };
    map.entry(key).or_insert(Value::Null)
}

/// Delete the value at `segments`, dropping parents left empty. Missing
/// parents are not created.
fn remove_path(node: &mut Value, segments: &[String]) {
    let (Value::Object(map), Some((head, rest))) = (node, segments.split_first()) else {
        return;
    };
    if rest.is_empty() {
        map.remove(head);
        return;
    }

    let now_empty = match map.get_mut(head) {
        Some(child) => {
            remove_path(child, rest);
            is_vacant(child)
        }
        None => false,
    };
    if now_empty {
        map.remove(head);
    }
}

fn is_vacant(node: &Value) -> bool {
    match node {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// A write affects a subscription when either path is a prefix of the other.
fn overlaps(a: &[String], b: &[String]) -> bool {
    a.iter().zip(b).all(|(x, y)| x == y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    async fn next(sub: &mut Subscription) -> StoreEvent {
        tokio::time::timeout(Duration::from_secs(1), sub.recv())
            .await
            .expect("event within a second")
            .expect("subscription open")
    }

    #[test]
    fn paths_are_validated() {
        assert!(parse_path("").is_err());
        assert!(parse_path("a//b").is_err());
        assert_eq!(parse_path("/a/b/").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn overlap_is_prefix_either_way() {
        let path = |s: &str| parse_path(s).unwrap();
        assert!(overlaps(&path("tweets/VA"), &path("tweets/VA/1")));
        assert!(overlaps(&path("tweets/VA/1"), &path("tweets")));
        assert!(!overlaps(&path("tweets/VA"), &path("tweets/MD/1")));
    }

    #[tokio::test]
    async fn set_then_get() {
        let store = MemoryStore::new();
        store.set("users/u1", json!({"email": "a@b.c"})).await.unwrap();

        assert_eq!(store.get("users/u1/email").await.unwrap(), Some(json!("a@b.c")));
        assert_eq!(store.get("users/u2").await.unwrap(), None);
        assert_eq!(
            store.get("users").await.unwrap(),
            Some(json!({"u1": {"email": "a@b.c"}}))
        );
    }

    #[tokio::test]
    async fn null_deletes() {
        let store = MemoryStore::new();
        store.set("a/b", json!(1)).await.unwrap();
        store.set("a/b", Value::Null).await.unwrap();
        assert_eq!(store.get("a/b").await.unwrap(), None);
        assert_eq!(store.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn null_delete_keeps_siblings() {
        let store = MemoryStore::new();
        store.set("a/b/c", json!(1)).await.unwrap();
        store.set("a/d", json!(2)).await.unwrap();
        store.set("a/b/c", Value::Null).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(json!({"d": 2})));
    }

    #[tokio::test]
    async fn deleting_a_missing_path_leaves_no_placeholders() {
        let store = MemoryStore::new();
        store.set("keep", json!(true)).await.unwrap();
        store.set("x/y/z", Value::Null).await.unwrap();
        assert_eq!(store.get("x").await.unwrap(), None);
        assert_eq!(*store.inner.root.read().await, json!({"keep": true}));
    }

    #[tokio::test]
    async fn writing_below_a_scalar_replaces_it() {
        let store = MemoryStore::new();
        store.set("a", json!("leaf")).await.unwrap();
        store.set("a/b", json!(2)).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(json!({"b": 2})));
    }

    #[tokio::test]
    async fn push_keys_sort_in_creation_order() {
        let store = MemoryStore::new();
        let mut keys = Vec::new();
        for i in 0..12 {
            keys.push(store.push("log", json!(i)).await.unwrap());
        }
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(store.get(&format!("log/{}", keys[11])).await.unwrap(), Some(json!(11)));
    }

    #[tokio::test]
    async fn subscriber_sees_initial_and_changed_values() {
        let store = MemoryStore::new();
        store.set("tweets/VA/1", json!("first")).await.unwrap();

        let mut sub = store.subscribe("tweets/VA").await.unwrap();
        assert_eq!(next(&mut sub).await, StoreEvent::Changed(Some(json!({"1": "first"}))));

        store.set("tweets/MD/1", json!("elsewhere")).await.unwrap();
        store.set("tweets/VA/2", json!("second")).await.unwrap();

        assert_eq!(
            next(&mut sub).await,
            StoreEvent::Changed(Some(json!({"1": "first", "2": "second"})))
        );
    }

    #[tokio::test]
    async fn close_cancels_subscribers() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe("tweets").await.unwrap();
        assert_eq!(next(&mut sub).await, StoreEvent::Changed(None));

        store.close_subscriptions("permission denied");
        assert_eq!(
            next(&mut sub).await,
            StoreEvent::Cancelled("permission denied".to_string())
        );
        assert!(sub.recv().await.is_none());
    }
}
