//! CRM assistant operations built on the intelligence gateway.

use std::sync::Arc;

use nr_domain::config::ModelRoles;
use nr_domain::crm::{Deal, Lead, ReportMetrics, Task};
use nr_domain::error::Result;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::intelligence::{IntelligenceCall, IntelligenceGateway};

pub const FOLLOW_UP_FALLBACK: &str = "Protocol failure. Unable to synthesize intelligence.";
pub const INSIGHTS_FALLBACK: &str = "Protocol error. Intelligence feed unavailable.";
pub const SUMMARY_FALLBACK: &str = "Unable to synthesize executive summary at this time.";
pub const CHAT_FALLBACK: &str = "Protocol error. Failed to process request.";

/// The four assistant operations exposed to the dashboard pages.
#[derive(Clone)]
pub struct CrmAssistant {
    gateway: Arc<IntelligenceGateway>,
    models: ModelRoles,
    cancel: Option<CancellationToken>,
}

impl CrmAssistant {
    pub fn new(gateway: Arc<IntelligenceGateway>, models: ModelRoles) -> Self {
        Self {
            gateway,
            models,
            cancel: None,
        }
    }

    /// Attach `token` to every call this assistant makes.
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn gateway(&self) -> &Arc<IntelligenceGateway> {
        &self.gateway
    }

    pub fn models(&self) -> &ModelRoles {
        &self.models
    }

    /// Draft a follow-up email for one lead.
    pub async fn follow_up_email(&self, lead: &Lead) -> Result<String> {
        let prompt = format!(
            "Generate a high-conversion follow-up email.\n       Lead: {} from {}\n       Context: {}",
            lead.name, lead.company, lead.notes
        );
        self.run(IntelligenceCall::new(
            &self.models.fast,
            prompt,
            "Leads Matrix",
            "outreach-synthesis",
        ))
        .await
    }

    /// Three growth-strategy bullets from the lead count and pipeline total.
    pub async fn dashboard_insights(&self, leads: &[Lead], deals: &[Deal]) -> Result<String> {
        let pipeline = deals.iter().fold(0.0, |acc, d| acc + d.value);
        let prompt = format!(
            "Analyze CRM state: Leads: {}, Pipeline: ${}. Provide 3 bullet points on growth strategy.",
            leads.len(),
            pipeline
        );
        self.run(IntelligenceCall::new(
            &self.models.reasoning,
            prompt,
            "Dashboard",
            "strategic-insight",
        ))
        .await
    }

    pub async fn executive_summary(&self, metrics: &ReportMetrics) -> Result<String> {
        let json = serde_json::to_string(metrics)?;
        let prompt = format!("Generate executive summary for metrics: {json}");
        self.run(IntelligenceCall::new(
            &self.models.reasoning,
            prompt,
            "Growth Matrix",
            "executive-reporting",
        ))
        .await
    }

    /// Answer a free-form query with the CRM size as system context.
    pub async fn chat(&self, query: &str, leads: &[Lead], tasks: &[Task]) -> Result<String> {
        self.chat_with_model(query, leads, tasks, None).await
    }

    /// [`chat`](Self::chat) with an optional model override.
    pub async fn chat_with_model(
        &self,
        query: &str,
        leads: &[Lead],
        tasks: &[Task],
        model: Option<&str>,
    ) -> Result<String> {
        let model = model.unwrap_or(&self.models.reasoning);
        self.run(
            IntelligenceCall::new(model, query, "NEURA AI", "conversational-nlp")
                .with_system_instruction(chat_context(leads.len(), tasks.len())),
        )
        .await
    }

    async fn run<C: Serialize>(&self, mut call: IntelligenceCall<C>) -> Result<String> {
        if let Some(token) = &self.cancel {
            call = call.with_cancel(token.clone());
        }
        self.gateway.invoke(call).await
    }

    // ── Fallback variants ──────────────────────────────────────────
    //
    // The failure is already in the API log when these fall back.

    pub async fn follow_up_email_or_fallback(&self, lead: &Lead) -> String {
        self.follow_up_email(lead)
            .await
            .unwrap_or_else(|_| FOLLOW_UP_FALLBACK.to_string())
    }

    pub async fn dashboard_insights_or_fallback(&self, leads: &[Lead], deals: &[Deal]) -> String {
        self.dashboard_insights(leads, deals)
            .await
            .unwrap_or_else(|_| INSIGHTS_FALLBACK.to_string())
    }

    pub async fn executive_summary_or_fallback(&self, metrics: &ReportMetrics) -> String {
        self.executive_summary(metrics)
            .await
            .unwrap_or_else(|_| SUMMARY_FALLBACK.to_string())
    }

    pub async fn chat_or_fallback(&self, query: &str, leads: &[Lead], tasks: &[Task]) -> String {
        self.chat(query, leads, tasks)
            .await
            .unwrap_or_else(|_| CHAT_FALLBACK.to_string())
    }
}

fn chat_context(leads: usize, tasks: usize) -> String {
    format!("You are NEURA Core. CRM Context: {leads} leads, {tasks} tasks.")
}
