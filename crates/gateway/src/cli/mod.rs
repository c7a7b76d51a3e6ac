pub mod chat;
pub mod config;
pub mod log;
pub mod run;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

/// NEURA CRM intelligence assistant with an audited API call log.
#[derive(Debug, Parser)]
#[command(name = "neura", version, about)]
pub struct Cli {
    /// Config file (overrides `NEURA_CONFIG`; defaults to `neura.toml`).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Growth-strategy insights for the dashboard.
    Insights,
    /// Draft a follow-up email for a lead.
    Followup {
        /// Lead id as stored in the CRM.
        lead_id: String,
    },
    /// Executive summary of the current CRM metrics.
    Summary,
    /// Ask the assistant a single question.
    Ask {
        query: String,
        /// Model override.
        #[arg(long)]
        model: Option<String>,
    },
    /// Interactive assistant session.
    Chat {
        /// Model override.
        #[arg(long)]
        model: Option<String>,
    },
    /// Inspect the API call log.
    #[command(subcommand)]
    Log(LogCommand),
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
pub enum LogCommand {
    /// Print recorded calls, newest first.
    List {
        /// Show at most this many entries.
        #[arg(long)]
        limit: Option<usize>,
        /// Print the entries as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Status counts and average latency.
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Follow the log and print calls as they are recorded or settle.
    Tail {
        /// Poll interval in milliseconds.
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,
    },
    /// Delete every recorded call.
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Resolve the config path: `--config`, then `NEURA_CONFIG`, then
/// `neura.toml`.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("NEURA_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("neura.toml"))
}

/// Load the configuration. A missing file yields the defaults; a file
/// that does not parse is an error.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<(nr_domain::config::Config, PathBuf)> {
    let path = config_path(explicit);

    let config = if path.exists() {
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {}: {e}", path.display()))?
    } else {
        nr_domain::config::Config::default()
    };

    Ok((config, path))
}
