//! In-memory link cache
//!
//! The cache publishes immutable [`Snapshot`]s through a watch channel.
//! Readers clone the current `Arc` and never see a half-written list;
//! the refresher swaps in a whole new snapshot on every successful cycle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::models::LinkRecord;

/// An immutable view of the cached links
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Records in API order
    pub records: Vec<LinkRecord>,
    /// When this snapshot was fetched; `None` for the empty startup snapshot
    /// and for snapshots produced by clearing the cache
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by API id
    pub fn find(&self, id: &str) -> Option<&LinkRecord> {
        self.records.iter().find(|r| r.id == id)
    }
}

/// Single-writer, multi-reader holder of the current snapshot
#[derive(Debug)]
pub struct LinkCache {
    tx: watch::Sender<Arc<Snapshot>>,
}

impl LinkCache {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(Snapshot::default()));
        Self { tx }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.tx.borrow().clone()
    }

    /// Publish a freshly fetched list, replacing the previous one
    pub fn replace(&self, records: Vec<LinkRecord>) {
        self.tx.send_replace(Arc::new(Snapshot {
            records,
            refreshed_at: Some(Utc::now()),
        }));
    }

    /// Publish an empty snapshot
    pub fn clear(&self) {
        self.tx.send_replace(Arc::new(Snapshot::default()));
    }

    /// Watch for newly published snapshots
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.tx.subscribe()
    }
}

impl Default for LinkCache {
    fn default() -> Self {
        Self::new()
    }
}
