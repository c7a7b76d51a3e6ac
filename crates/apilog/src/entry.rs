use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Log status
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    Pending,
    Success,
    Error,
}

impl LogStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for LogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Log entry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One outbound API call and its outcome.
///
/// `id` and `timestamp` are fixed at creation. `status` and `latency`
/// change exactly once, from pending to a terminal value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub endpoint: String,
    pub status: LogStatus,
    /// Milliseconds from dispatch to resolution; `0` while pending.
    #[serde(default, deserialize_with = "lenient_ms")]
    pub latency: u64,
    /// UI context the call originated from.
    pub page: String,
    /// Approximate outbound payload size, e.g. `"3KB"`.
    #[serde(default)]
    pub payload_size: String,
}

/// The caller-supplied part of a new entry.
#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub method: String,
    pub endpoint: String,
    pub page: String,
    pub payload_size: String,
}

impl LogEntry {
    /// Build a pending entry with a fresh id and the current time.
    pub fn pending(new: NewLogEntry) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            method: new.method,
            endpoint: new.endpoint,
            status: LogStatus::Pending,
            latency: 0,
            page: new.page,
            payload_size: new.payload_size,
        }
    }
}

/// Browser-written entries may carry any JSON number here.
fn lenient_ms<'de, D: Deserializer<'de>>(de: D) -> Result<u64, D::Error> {
    let ms = Option::<f64>::deserialize(de)?.unwrap_or(0.0);
    if ms.is_finite() && ms > 0.0 {
        Ok(ms.round() as u64)
    } else {
        Ok(0)
    }
}

/// Render a serialized payload length as whole kilobytes, rounded to the
/// nearest KB (`"0KB"` under 512). The length is in UTF-16 code units,
/// which is how the dashboard measures it.
pub fn payload_size_label(serialized_len: usize) -> String {
    let kb = (serialized_len as f64 / 1024.0).round() as u64;
    format!("{kb}KB")
}
