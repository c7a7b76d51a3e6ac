//! One-shot assistant commands: `insights`, `followup`, `summary`, `ask`.
//!
//! Prints the generated text to stdout. On failure the fallback message is
//! printed instead and the command reports failure; the call is in the
//! API log either way.

use nr_domain::config::Config;
use nr_domain::crm::CrmSnapshot;
use nr_domain::error::Result;
use tokio_util::sync::CancellationToken;

use crate::bootstrap::{self, Profile};
use crate::features::{
    CrmAssistant, CHAT_FALLBACK, FOLLOW_UP_FALLBACK, INSIGHTS_FALLBACK, SUMMARY_FALLBACK,
};

#[derive(Debug, Clone)]
pub enum Feature {
    Insights,
    FollowUp { lead_id: String },
    Summary,
    Ask { query: String, model: Option<String> },
}

/// Run one feature. Returns `false` when the fallback was printed.
pub async fn run(config: &Config, profile: &Profile, feature: Feature) -> anyhow::Result<bool> {
    let cancel = CancellationToken::new();
    let assistant = bootstrap::build_assistant(config, profile)?.with_cancel(cancel.clone());
    let snapshot = profile.crm.snapshot();

    // Ctrl+C settles the in-flight call as an error instead of leaving it pending.
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let outcome = execute(&assistant, &snapshot, &feature).await;
    watcher.abort();

    let (result, fallback) = outcome?;
    match result {
        Ok(text) => {
            println!("{text}");
            Ok(true)
        }
        Err(e) => {
            eprintln!("\x1b[31merror: {e}\x1b[0m");
            println!("{fallback}");
            Ok(false)
        }
    }
}

/// Invoke the feature. The outer error covers input problems found before
/// any call is made.
async fn execute(
    assistant: &CrmAssistant,
    snapshot: &CrmSnapshot,
    feature: &Feature,
) -> anyhow::Result<(Result<String>, &'static str)> {
    Ok(match feature {
        Feature::Insights => (
            assistant
                .dashboard_insights(&snapshot.leads, &snapshot.deals)
                .await,
            INSIGHTS_FALLBACK,
        ),
        Feature::FollowUp { lead_id } => {
            let lead = snapshot
                .find_lead(lead_id)
                .ok_or_else(|| anyhow::anyhow!("no lead with id '{lead_id}'"))?;
            (assistant.follow_up_email(lead).await, FOLLOW_UP_FALLBACK)
        }
        Feature::Summary => (
            assistant.executive_summary(&snapshot.metrics()).await,
            SUMMARY_FALLBACK,
        ),
        Feature::Ask { query, model } => (
            assistant
                .chat_with_model(query, &snapshot.leads, &snapshot.tasks, model.as_deref())
                .await,
            CHAT_FALLBACK,
        ),
    })
}
