//! CRM collections persisted in the profile storage.

use std::sync::Arc;

use nr_apilog::KeyValueStore;
use nr_domain::config::CrmKeys;
use nr_domain::crm::{seed, CrmSnapshot, Deal, Lead, Task};
use nr_domain::error::Result;
use nr_domain::trace::TraceEvent;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Reads and writes the lead, deal, and task documents.
///
/// Reads are fail-soft. A document that was never written reads as the
/// demo records (or empty with seeding off); an unreadable or unparsable
/// one reads as an empty list.
pub struct CrmRepository {
    storage: Arc<dyn KeyValueStore>,
    keys: CrmKeys,
    seed: bool,
}

impl CrmRepository {
    pub fn new(storage: Arc<dyn KeyValueStore>, keys: CrmKeys) -> Self {
        Self {
            storage,
            keys,
            seed: true,
        }
    }

    /// Read absent documents as empty instead of the demo records.
    pub fn without_seed(mut self) -> Self {
        self.seed = false;
        self
    }

    pub fn leads(&self) -> Vec<Lead> {
        self.load(&self.keys.leads, seed::leads)
    }

    pub fn deals(&self) -> Vec<Deal> {
        self.load(&self.keys.deals, seed::deals)
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.load(&self.keys.tasks, seed::tasks)
    }

    pub fn save_leads(&self, leads: &[Lead]) -> Result<()> {
        self.save(&self.keys.leads, leads)
    }

    pub fn save_deals(&self, deals: &[Deal]) -> Result<()> {
        self.save(&self.keys.deals, deals)
    }

    pub fn save_tasks(&self, tasks: &[Task]) -> Result<()> {
        self.save(&self.keys.tasks, tasks)
    }

    pub fn snapshot(&self) -> CrmSnapshot {
        let snapshot = CrmSnapshot {
            leads: self.leads(),
            deals: self.deals(),
            tasks: self.tasks(),
        };
        TraceEvent::CrmSnapshotLoaded {
            leads: snapshot.leads.len(),
            deals: snapshot.deals.len(),
            tasks: snapshot.tasks.len(),
        }
        .emit();
        snapshot
    }

    fn load<T: DeserializeOwned>(&self, key: &str, seeded: fn() -> Vec<T>) -> Vec<T> {
        let raw = match self.storage.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) if self.seed => return seeded(),
            Ok(None) => return Vec::new(),
            Err(e) => {
                discarded(key, format!("read failed: {e}"));
                return Vec::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            discarded(key, format!("unparsable document: {e}"));
            Vec::new()
        })
    }

    fn save<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        let json = serde_json::to_string(items)?;
        self.storage.set(key, &json)
    }
}

fn discarded(key: &str, reason: String) {
    tracing::warn!(key = %key, reason = %reason, "treating CRM document as empty");
    TraceEvent::PersistedDataDiscarded {
        key: key.to_string(),
        reason,
    }
    .emit();
}
