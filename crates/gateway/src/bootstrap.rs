//! Wiring from [`Config`] to the storage, log, CRM, and assistant services.
//!
//! Log and config commands only need [`Profile`]. Assistant commands also
//! need a provider, which requires an API key.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use nr_apilog::{ApiLogStore, FileStore, KeyValueStore};
use nr_domain::config::{Config, ConfigSeverity, ProviderConfig, ProviderKind};
use nr_providers::{GoogleProvider, TextGenerator};

use crate::crm::CrmRepository;
use crate::features::CrmAssistant;
use crate::intelligence::IntelligenceGateway;

/// Storage-backed services for one profile directory.
#[derive(Clone)]
pub struct Profile {
    pub dir: PathBuf,
    pub storage: Arc<dyn KeyValueStore>,
    pub log: Arc<ApiLogStore>,
    pub crm: Arc<CrmRepository>,
}

/// Validate the config and open the profile storage.
pub fn open_profile(config: &Config) -> anyhow::Result<Profile> {
    check_config(config)?;

    let dir = expand_home(&config.storage.path);
    let storage: Arc<dyn KeyValueStore> = Arc::new(
        FileStore::open(&dir).with_context(|| format!("opening profile at {}", dir.display()))?,
    );
    Ok(profile_with_storage(config, dir, storage))
}

/// Build the profile services over an existing store.
pub fn profile_with_storage(config: &Config, dir: PathBuf, storage: Arc<dyn KeyValueStore>) -> Profile {
    let log = Arc::new(ApiLogStore::from_config(storage.clone(), &config.storage));
    let mut crm = CrmRepository::new(storage.clone(), config.storage.crm_keys.clone());
    if !config.storage.seed_crm {
        crm = crm.without_seed();
    }
    let crm = Arc::new(crm);
    tracing::debug!(
        path = %dir.display(),
        log_key = %config.storage.log_key,
        capacity = log.capacity(),
        "profile ready"
    );
    Profile {
        dir,
        storage,
        log,
        crm,
    }
}

/// Construct the configured text generation provider.
pub fn build_provider(cfg: &ProviderConfig) -> anyhow::Result<Arc<dyn TextGenerator>> {
    let provider: Arc<dyn TextGenerator> = match cfg.kind {
        ProviderKind::Google => Arc::new(
            GoogleProvider::from_config(cfg)
                .with_context(|| format!("initializing provider '{}'", cfg.id))?,
        ),
    };
    tracing::debug!(provider = %cfg.id, kind = ?cfg.kind, "provider ready");
    Ok(provider)
}

/// Build the assistant from the configured provider.
pub fn build_assistant(config: &Config, profile: &Profile) -> anyhow::Result<CrmAssistant> {
    let provider = build_provider(&config.llm.provider)?;
    Ok(assistant_with_provider(config, profile, provider))
}

pub fn assistant_with_provider(
    config: &Config,
    profile: &Profile,
    provider: Arc<dyn TextGenerator>,
) -> CrmAssistant {
    let gateway = Arc::new(IntelligenceGateway::new(
        provider,
        profile.log.clone(),
        &config.gateway,
    ));
    CrmAssistant::new(gateway, config.gateway.models.clone())
}

/// Log every config issue and fail on errors.
fn check_config(config: &Config) -> anyhow::Result<()> {
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let errors = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if errors > 0 {
        anyhow::bail!("config validation failed with {errors} error(s)");
    }
    Ok(())
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}
