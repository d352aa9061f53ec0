//! Bounded extraction history
//!
//! A capacity-limited, newest-first log of past extraction records. Appending
//! beyond capacity evicts the oldest entry. Entries are write-once: nothing
//! mutates or deletes an individual entry after insertion.

use crate::extract::record::ExtractionRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Default number of entries the log retains.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// One retained extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unique entry identifier
    pub id: Uuid,
    /// The record exactly as returned to the caller
    pub record: ExtractionRecord,
    /// Insertion timestamp
    pub created_at: DateTime<Utc>,
}

/// Capacity-bounded, newest-first log of past extractions.
pub struct HistoryLog {
    entries: Arc<RwLock<HistoryInner>>,
}

struct HistoryInner {
    /// Newest first: front = most recent, back = oldest
    order: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl HistoryLog {
    /// Create a log retaining at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HistoryInner {
                order: VecDeque::with_capacity(capacity.min(1024)),
                capacity,
            })),
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }

    /// Store a record as the newest entry, evicting the oldest when over
    /// capacity. Returns the new entry's id.
    pub async fn append(&self, record: ExtractionRecord) -> Uuid {
        let entry = HistoryEntry {
            id: Uuid::new_v4(),
            record,
            created_at: Utc::now(),
        };
        let id = entry.id;

        let mut inner = self.entries.write().await;
        inner.order.push_front(entry);
        while inner.order.len() > inner.capacity {
            inner.order.pop_back();
        }
        id
    }

    /// Up to `n` most recent entries, newest first. Never mutates the log.
    pub async fn recent(&self, n: usize) -> Vec<HistoryEntry> {
        self.entries
            .read()
            .await
            .order
            .iter()
            .take(n)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.order.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.order.is_empty()
    }

    pub async fn capacity(&self) -> usize {
        self.entries.read().await.capacity
    }
}
