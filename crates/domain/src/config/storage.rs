use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Profile storage
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Durable key-value storage for one profile.
///
/// Every key is an independent JSON document stored as
/// `{path}/{key}.json`. The API log, leads, deals, and tasks each live
/// under their own key; there is no cross-document transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "d_profile_path")]
    pub path: PathBuf,
    /// Key holding the API call log.
    #[serde(default = "d_log_key")]
    pub log_key: String,
    /// Eviction cap for the API call log.
    #[serde(default = "d_50")]
    pub max_log_entries: usize,
    /// Serve the demo leads, deals, and tasks for CRM documents that were
    /// never written.
    #[serde(default = "d_true")]
    pub seed_crm: bool,
    #[serde(default)]
    pub crm_keys: CrmKeys,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: d_profile_path(),
            log_key: d_log_key(),
            max_log_entries: 50,
            seed_crm: true,
            crm_keys: CrmKeys::default(),
        }
    }
}

/// Keys of the CRM collections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmKeys {
    #[serde(default = "d_leads")]
    pub leads: String,
    #[serde(default = "d_deals")]
    pub deals: String,
    #[serde(default = "d_tasks")]
    pub tasks: String,
}

impl Default for CrmKeys {
    fn default() -> Self {
        Self {
            leads: d_leads(),
            deals: d_deals(),
            tasks: d_tasks(),
        }
    }
}

fn d_profile_path() -> PathBuf {
    PathBuf::from("./data/profile")
}
fn d_log_key() -> String {
    "neura_api_logs".into()
}
fn d_50() -> usize {
    50
}
fn d_true() -> bool {
    true
}
fn d_leads() -> String {
    "nova_leads".into()
}
fn d_deals() -> String {
    "nova_deals".into()
}
fn d_tasks() -> String {
    "nova_tasks".into()
}
