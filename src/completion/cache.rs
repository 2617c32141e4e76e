//! Process-wide completion memo
//!
//! Bounded map from request key to completion text. When full, the oldest
//! inserted entry is evicted. Concurrent inserts of the same key are
//! last-write-wins.

use std::collections::{HashMap, VecDeque};

use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, String>,
    order: VecDeque<String>,
}

#[derive(Debug)]
pub struct CompletionCache {
    capacity: usize,
    inner: RwLock<CacheInner>,
}

impl CompletionCache {
    /// A capacity of 0 disables memoization.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: RwLock::new(CacheInner::default()),
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        if self.capacity == 0 {
            return None;
        }
        self.inner.read().await.entries.get(key).cloned()
    }

    pub async fn insert(&self, key: String, value: String) {
        if self.capacity == 0 {
            return;
        }

        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.entries.get_mut(&key) {
            *existing = value;
            return;
        }

        while inner.entries.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                }
                None => break,
            }
        }

        inner.order.push_back(key.clone());
        inner.entries.insert(key, value);
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
