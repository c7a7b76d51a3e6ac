//! The persisted API call log.

use std::sync::Arc;

use nr_domain::config::StorageConfig;
use nr_domain::trace::TraceEvent;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::bus::{LogEventBus, Subscription};
use crate::entry::{LogEntry, LogStatus, NewLogEntry};
use crate::storage::KeyValueStore;

/// Default eviction cap.
pub const DEFAULT_MAX_ENTRIES: usize = 50;

/// Aggregate view used by the log dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogStats {
    pub total: usize,
    pub pending: usize,
    pub success: usize,
    pub error: usize,
    /// Mean latency over all entries (pending entries count as 0), rounded.
    pub avg_latency_ms: u64,
}

/// Bounded, newest-first log of outbound API calls.
///
/// The collection is stored as one JSON document under `key`. Reads never
/// fail: missing or unparsable data reads as an empty log. Writes are
/// read-modify-write under a store-wide lock, so concurrent settles of
/// different entries cannot overwrite each other.
pub struct ApiLogStore {
    storage: Arc<dyn KeyValueStore>,
    key: String,
    capacity: usize,
    bus: LogEventBus,
    write_lock: Mutex<()>,
}

impl ApiLogStore {
    pub fn new(storage: Arc<dyn KeyValueStore>, key: impl Into<String>, capacity: usize) -> Self {
        Self {
            storage,
            key: key.into(),
            capacity: capacity.max(1),
            bus: LogEventBus::new(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_config(storage: Arc<dyn KeyValueStore>, cfg: &StorageConfig) -> Self {
        Self::new(storage, cfg.log_key.clone(), cfg.max_log_entries)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    // ── Reads ──────────────────────────────────────────────────────

    /// All entries, newest first. Never fails.
    pub fn get_all(&self) -> Vec<LogEntry> {
        let raw = match self.storage.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                self.discarded(format!("read failed: {e}"));
                return Vec::new();
            }
        };

        let values = match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
            Ok(values) => values,
            Err(e) => {
                self.discarded(format!("unparsable log document: {e}"));
                return Vec::new();
            }
        };

        // One malformed entry drops only itself.
        let total = values.len();
        let mut entries: Vec<LogEntry> = values
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect();
        if entries.len() < total {
            self.discarded(format!("dropped {} malformed entries", total - entries.len()));
        }
        entries.truncate(self.capacity);
        entries
    }

    /// Look up one entry by id.
    pub fn get(&self, id: &str) -> Option<LogEntry> {
        self.get_all().into_iter().find(|e| e.id == id)
    }

    pub fn stats(&self) -> LogStats {
        let entries = self.get_all();
        let mut stats = LogStats {
            total: entries.len(),
            ..LogStats::default()
        };
        let mut latency_sum: u64 = 0;
        for e in &entries {
            match e.status {
                LogStatus::Pending => stats.pending += 1,
                LogStatus::Success => stats.success += 1,
                LogStatus::Error => stats.error += 1,
            }
            latency_sum += e.latency;
        }
        if !entries.is_empty() {
            stats.avg_latency_ms =
                (latency_sum as f64 / entries.len() as f64).round() as u64;
        }
        stats
    }

    // ── Writes ─────────────────────────────────────────────────────

    /// Insert `entry` at the front, evict beyond the cap, persist, and
    /// publish it. Returns `false` (and publishes nothing) when the write
    /// fails.
    pub fn append(&self, entry: LogEntry) -> bool {
        let persisted = {
            let _guard = self.write_lock.lock();
            let mut entries = self.get_all();
            entries.insert(0, entry.clone());
            entries.truncate(self.capacity);
            self.persist(&entries)
        };
        if persisted {
            self.bus.publish(&entry);
        }
        persisted
    }

    /// Create a pending entry from `new`, append it, and return its id.
    pub fn record(&self, new: NewLogEntry) -> String {
        let entry = LogEntry::pending(new);
        let id = entry.id.clone();
        self.append(entry);
        id
    }

    /// Settle a pending entry.
    ///
    /// Returns `true` when an entry was updated and persisted. Unknown ids
    /// (including evicted ones), entries that are already terminal, and
    /// requests to set `pending` are no-ops. Nothing is published unless
    /// the write succeeds.
    pub fn update_status(&self, id: &str, status: LogStatus, latency_ms: u64) -> bool {
        if !status.is_terminal() {
            tracing::warn!(log_id = %id, "refusing to move a log entry back to pending");
            return false;
        }

        let updated = {
            let _guard = self.write_lock.lock();
            let mut entries = self.get_all();
            let Some(entry) = entries.iter_mut().find(|e| e.id == id) else {
                tracing::debug!(log_id = %id, "log entry not found (evicted or cleared)");
                return false;
            };
            if entry.status.is_terminal() {
                tracing::warn!(
                    log_id = %id,
                    current = %entry.status,
                    requested = %status,
                    "log entry already settled"
                );
                return false;
            }
            entry.status = status;
            entry.latency = latency_ms;
            let updated = entry.clone();
            if !self.persist(&entries) {
                return false;
            }
            updated
        };

        self.bus.publish(&updated);
        true
    }

    /// Empty the log. Subscribers are not notified.
    pub fn clear(&self) {
        let _guard = self.write_lock.lock();
        if let Err(e) = self.storage.remove(&self.key) {
            tracing::warn!(key = %self.key, error = %e, "failed to clear API log");
            return;
        }
        TraceEvent::ApiLogCleared {
            key: self.key.clone(),
        }
        .emit();
    }

    // ── Notifications ──────────────────────────────────────────────

    /// Run `handler` for every appended or settled entry until the
    /// returned subscription is dropped.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&LogEntry) + Send + Sync + 'static,
    {
        self.bus.subscribe(handler)
    }

    /// Async feed of appended and settled entries.
    pub fn watch(&self) -> broadcast::Receiver<LogEntry> {
        self.bus.watch()
    }

    pub fn bus(&self) -> &LogEventBus {
        &self.bus
    }

    // ── Helpers ────────────────────────────────────────────────────

    fn persist(&self, entries: &[LogEntry]) -> bool {
        let json = match serde_json::to_string(entries) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize API log");
                return false;
            }
        };
        match self.storage.set(&self.key, &json) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "failed to persist API log");
                false
            }
        }
    }

    fn discarded(&self, reason: String) {
        tracing::warn!(key = %self.key, reason = %reason, "treating API log as empty");
        TraceEvent::PersistedDataDiscarded {
            key: self.key.clone(),
            reason,
        }
        .emit();
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStore, MemoryStore};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn store() -> ApiLogStore {
        ApiLogStore::new(Arc::new(MemoryStore::new()), "neura_api_logs", DEFAULT_MAX_ENTRIES)
    }

    fn new_entry(endpoint: &str) -> NewLogEntry {
        NewLogEntry {
            method: "POST".into(),
            endpoint: endpoint.into(),
            page: "Dashboard".into(),
            payload_size: "0KB".into(),
        }
    }

    #[test]
    fn empty_store_reads_empty() {
        assert!(store().get_all().is_empty());
    }

    #[test]
    fn append_is_newest_first() {
        let s = store();
        let first = s.record(new_entry("gemini-api/a"));
        let second = s.record(new_entry("gemini-api/b"));

        let all = s.get_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second);
        assert_eq!(all[1].id, first);
    }

    #[test]
    fn fifty_one_appends_keep_newest_fifty() {
        let s = store();
        let mut ids = Vec::new();
        for i in 0..51 {
            ids.push(s.record(new_entry(&format!("gemini-api/op-{i}"))));
        }

        let all = s.get_all();
        assert_eq!(all.len(), 50);
        assert_eq!(all[0].id, ids[50]);
        assert_eq!(all[49].id, ids[1]);
        assert!(all.iter().all(|e| e.id != ids[0]));
    }

    #[test]
    fn cap_holds_for_many_appends() {
        let s = ApiLogStore::new(Arc::new(MemoryStore::new()), "k", 3);
        let ids: Vec<String> = (0..10).map(|i| s.record(new_entry(&i.to_string()))).collect();
        let got: Vec<String> = s.get_all().into_iter().map(|e| e.id).collect();
        assert_eq!(got, vec![ids[9].clone(), ids[8].clone(), ids[7].clone()]);
    }

    #[test]
    fn update_status_settles_once() {
        let s = store();
        let id = s.record(new_entry("gemini-api/strategic-insight"));

        assert!(s.update_status(&id, LogStatus::Success, 120));
        let entry = s.get(&id).unwrap();
        assert_eq!(entry.status, LogStatus::Success);
        assert_eq!(entry.latency, 120);

        // A second terminal update is rejected.
        assert!(!s.update_status(&id, LogStatus::Error, 999));
        let entry = s.get(&id).unwrap();
        assert_eq!(entry.status, LogStatus::Success);
        assert_eq!(entry.latency, 120);
    }

    #[test]
    fn update_to_pending_is_rejected() {
        let s = store();
        let id = s.record(new_entry("x"));
        assert!(!s.update_status(&id, LogStatus::Pending, 5));
        assert_eq!(s.get(&id).unwrap().latency, 0);
    }

    #[test]
    fn update_unknown_id_is_noop() {
        let s = store();
        s.record(new_entry("x"));
        s.record(new_entry("y"));
        let before = s.get_all();

        assert!(!s.update_status("does-not-exist", LogStatus::Error, 10));
        assert_eq!(s.get_all(), before);
    }

    #[test]
    fn evicted_entry_cannot_be_updated() {
        let s = ApiLogStore::new(Arc::new(MemoryStore::new()), "k", 1);
        let old = s.record(new_entry("old"));
        s.record(new_entry("new"));
        assert!(!s.update_status(&old, LogStatus::Success, 1));
        assert_eq!(s.get_all().len(), 1);
    }

    #[test]
    fn clear_empties() {
        let s = store();
        s.record(new_entry("x"));
        s.clear();
        assert!(s.get_all().is_empty());
    }

    #[test]
    fn repeated_reads_are_identical() {
        let s = store();
        let id = s.record(new_entry("x"));
        s.update_status(&id, LogStatus::Error, 33);
        assert_eq!(s.get_all(), s.get_all());
    }

    #[test]
    fn corrupt_document_reads_empty() {
        let storage = Arc::new(MemoryStore::new());
        storage.set("neura_api_logs", "{not json").unwrap();
        let s = ApiLogStore::new(storage, "neura_api_logs", 50);
        assert!(s.get_all().is_empty());

        // The next append replaces the corrupt document.
        let id = s.record(new_entry("x"));
        assert_eq!(s.get_all()[0].id, id);
    }

    /// Reads from the inner store; writes fail once `fail_writes` is set.
    struct FlakyStore {
        inner: MemoryStore,
        fail_writes: std::sync::atomic::AtomicBool,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> nr_domain::error::Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> nr_domain::error::Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(nr_domain::error::Error::Storage("disk full".into()));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> nr_domain::error::Result<()> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn failed_writes_are_not_published() {
        let storage = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
            fail_writes: std::sync::atomic::AtomicBool::new(false),
        });
        let s = ApiLogStore::new(storage.clone(), "neura_api_logs", 50);
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let _sub = s.subscribe(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        let id = s.record(new_entry("x"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        storage.fail_writes.store(true, Ordering::SeqCst);
        assert!(!s.update_status(&id, LogStatus::Success, 10));
        assert!(!s.append(LogEntry::pending(new_entry("y"))));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let all = s.get_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].status, LogStatus::Pending);

        // Still pending, so a later successful write can settle it.
        storage.fail_writes.store(false, Ordering::SeqCst);
        assert!(s.update_status(&id, LogStatus::Success, 10));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn malformed_entry_drops_only_itself() {
        let storage = Arc::new(MemoryStore::new());
        storage
            .set(
                "neura_api_logs",
                r#"[{"id":"b","status":"bogus"},
                    {"id":"a","timestamp":"2024-03-01T10:15:30Z","method":"POST",
                     "endpoint":"gemini-api/x","status":"success","latency":12.5,
                     "page":"Dashboard"}]"#,
            )
            .unwrap();
        let s = ApiLogStore::new(storage, "neura_api_logs", 50);

        let all = s.get_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "a");
        assert_eq!(all[0].latency, 13);

        s.record(new_entry("new"));
        let ids: Vec<String> = s.get_all().into_iter().skip(1).map(|e| e.id).collect();
        assert_eq!(ids, vec!["a".to_string()]);
    }

    #[test]
    fn append_and_settle_publish_to_subscribers() {
        let s = store();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        let _sub = s.subscribe(move |e| seen2.lock().push((e.id.clone(), e.status)));

        let id = s.record(new_entry("x"));
        s.update_status(&id, LogStatus::Success, 7);
        s.update_status("missing", LogStatus::Success, 7);

        let seen = seen.lock();
        assert_eq!(
            *seen,
            vec![(id.clone(), LogStatus::Pending), (id, LogStatus::Success)]
        );
    }

    #[test]
    fn clear_does_not_notify() {
        let s = store();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let _sub = s.subscribe(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        s.clear();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn subscriber_can_read_store_during_publish() {
        let s = Arc::new(store());
        let reader = s.clone();
        let lens = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let lens2 = lens.clone();
        let _sub = s.subscribe(move |_| lens2.lock().push(reader.get_all().len()));

        s.record(new_entry("x"));
        assert_eq!(*lens.lock(), vec![1]);
    }

    #[test]
    fn stats_summarize_statuses_and_latency() {
        let s = store();
        let a = s.record(new_entry("a"));
        let b = s.record(new_entry("b"));
        s.record(new_entry("c"));
        s.update_status(&a, LogStatus::Success, 100);
        s.update_status(&b, LogStatus::Error, 201);

        let stats = s.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.success, 1);
        assert_eq!(stats.error, 1);
        assert_eq!(stats.avg_latency_ms, 100);
        assert_eq!(store().stats(), LogStats::default());
    }

    #[test]
    fn persists_across_store_instances() {
        let dir = tempfile::tempdir().unwrap();
        let id = {
            let storage = Arc::new(FileStore::open(dir.path()).unwrap());
            let s = ApiLogStore::new(storage, "neura_api_logs", 50);
            let id = s.record(new_entry("gemini-api/executive-reporting"));
            s.update_status(&id, LogStatus::Success, 42);
            id
        };

        let storage = Arc::new(FileStore::open(dir.path()).unwrap());
        let s = ApiLogStore::new(storage, "neura_api_logs", 50);
        let entry = s.get(&id).unwrap();
        assert_eq!(entry.status, LogStatus::Success);
        assert_eq!(entry.latency, 42);
    }

    #[test]
    fn concurrent_settles_do_not_lose_updates() {
        let s = Arc::new(store());
        let ids: Vec<String> = (0..20).map(|i| s.record(new_entry(&i.to_string()))).collect();

        let handles: Vec<_> = ids
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, id)| {
                let s = s.clone();
                std::thread::spawn(move || {
                    let status = if i % 2 == 0 { LogStatus::Success } else { LogStatus::Error };
                    s.update_status(&id, status, i as u64)
                })
            })
            .collect();
        for h in handles {
            assert!(h.join().unwrap());
        }

        let all = s.get_all();
        assert!(all.iter().all(|e| e.status.is_terminal()));
        assert_eq!(s.stats().success, 10);
        assert_eq!(s.stats().error, 10);
    }
}
