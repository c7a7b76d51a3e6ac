use serde::Serialize;

/// Structured trace events emitted across all NEURA crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    ApiCallDispatched {
        log_id: String,
        endpoint: String,
        page: String,
        model: String,
        payload_size: String,
    },
    ApiCallSettled {
        log_id: String,
        endpoint: String,
        status: String,
        latency_ms: u64,
    },
    ApiLogCleared {
        key: String,
    },
    PersistedDataDiscarded {
        key: String,
        reason: String,
    },
    CrmSnapshotLoaded {
        leads: usize,
        deals: usize,
        tasks: usize,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "nr_event");
    }
}
