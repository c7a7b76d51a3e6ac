mod gateway;
mod llm;
mod observability;
mod storage;

pub use gateway::*;
pub use llm::*;
pub use observability::*;
pub use storage::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.storage.max_log_entries == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "storage.max_log_entries".into(),
                message: "log cap must be greater than 0".into(),
            });
        }

        if !is_valid_storage_key(&self.storage.log_key) {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "storage.log_key".into(),
                message: "key must be non-empty and use only [A-Za-z0-9_-]".into(),
            });
        }

        let crm_keys = &self.storage.crm_keys;
        for (field, key) in [
            ("storage.crm_keys.leads", &crm_keys.leads),
            ("storage.crm_keys.deals", &crm_keys.deals),
            ("storage.crm_keys.tasks", &crm_keys.tasks),
        ] {
            if !is_valid_storage_key(key) {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: field.into(),
                    message: "key must be non-empty and use only [A-Za-z0-9_-]".into(),
                });
            }
        }

        if self.storage.path.as_os_str().is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "storage.path".into(),
                message: "path must not be empty".into(),
            });
        }

        if self.gateway.endpoint_prefix.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "gateway.endpoint_prefix".into(),
                message: "empty prefix; log endpoints are bare operation names".into(),
            });
        }

        if self.gateway.default_timeout_ms == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "gateway.default_timeout_ms".into(),
                message: "timeout disabled; a hung call stays pending until cancelled".into(),
            });
        }

        for (field, model) in [
            ("gateway.models.fast", &self.gateway.models.fast),
            ("gateway.models.reasoning", &self.gateway.models.reasoning),
        ] {
            if model.is_empty() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: field.into(),
                    message: "model id must not be empty".into(),
                });
            }
        }

        let provider = &self.llm.provider;
        if provider.id.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "llm.provider.id".into(),
                message: "provider id must not be empty".into(),
            });
        }
        if provider.base_url.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "llm.provider.base_url".into(),
                message: "provider base_url must not be empty".into(),
            });
        }
        if provider.auth.key.is_none() && provider.auth.env.is_none() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "llm.provider.auth".into(),
                message: "no API key source configured".into(),
            });
        }

        if !(0.0..=1.0).contains(&self.observability.sample_rate) {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "observability.sample_rate".into(),
                message: "sample_rate must be within 0.0..=1.0".into(),
            });
        }

        errors
    }
}

/// Storage keys double as file names, so they are restricted to a safe
/// character set.
pub fn is_valid_storage_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
