use std::time::Duration;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Intelligence gateway
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Prepended to every logged endpoint label (`{prefix}/{operation}`).
    #[serde(default = "d_prefix")]
    pub endpoint_prefix: String,
    /// Method label recorded on each log entry.
    #[serde(default = "d_method")]
    pub method: String,
    /// Upper bound on a single remote call. `0` disables the timeout.
    #[serde(default = "d_60000")]
    pub default_timeout_ms: u64,
    #[serde(default)]
    pub models: ModelRoles,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint_prefix: d_prefix(),
            method: d_method(),
            default_timeout_ms: 60_000,
            models: ModelRoles::default(),
        }
    }
}

impl GatewayConfig {
    /// The default per-call timeout, or `None` when disabled.
    pub fn default_timeout(&self) -> Option<Duration> {
        (self.default_timeout_ms > 0).then(|| Duration::from_millis(self.default_timeout_ms))
    }
}

/// Model identifiers by role. The gateway passes them through unvalidated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRoles {
    /// Short, latency-sensitive generation (outreach drafts).
    #[serde(default = "d_fast")]
    pub fast: String,
    /// Analysis and conversation.
    #[serde(default = "d_reasoning")]
    pub reasoning: String,
}

impl Default for ModelRoles {
    fn default() -> Self {
        Self {
            fast: d_fast(),
            reasoning: d_reasoning(),
        }
    }
}

fn d_prefix() -> String {
    "gemini-api".into()
}
fn d_method() -> String {
    "POST".into()
}
fn d_60000() -> u64 {
    60_000
}
fn d_fast() -> String {
    "gemini-3-flash-preview".into()
}
fn d_reasoning() -> String {
    "gemini-3-pro-preview".into()
}
