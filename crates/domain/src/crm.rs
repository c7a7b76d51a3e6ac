//! CRM records shared by the repository and the assistant features.
//!
//! Field names serialize in camelCase to stay compatible with documents
//! written by the browser dashboard.

use serde::{Deserialize, Serialize};

pub mod seed;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Leads
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Lost,
    Won,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub company: String,
    pub email: String,
    pub status: LeadStatus,
    #[serde(default)]
    pub ai_score: u32,
    #[serde(default)]
    pub last_interaction: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub value: f64,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Deals
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DealStage {
    Discovery,
    Proposal,
    Negotiation,
    ClosedWon,
    ClosedLost,
}

impl DealStage {
    pub fn is_closed(self) -> bool {
        matches!(self, Self::ClosedWon | Self::ClosedLost)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: String,
    pub title: String,
    pub lead_id: String,
    pub value: f64,
    pub stage: DealStage,
    #[serde(default)]
    pub expected_close: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tasks
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub completed: bool,
    pub priority: Priority,
    #[serde(default)]
    pub related_to: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Snapshot + derived metrics
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// All three collections read together. Each is read independently, so
/// the snapshot is not a consistent point-in-time view.
#[derive(Debug, Clone, Default)]
pub struct CrmSnapshot {
    pub leads: Vec<Lead>,
    pub deals: Vec<Deal>,
    pub tasks: Vec<Task>,
}

/// Headline numbers for the executive report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetrics {
    /// Sum of closed-won deal values.
    pub revenue: f64,
    /// Sum of open (not closed) deal values.
    pub pipeline: f64,
    /// Won leads as a percentage of all leads, one decimal.
    pub conversion: f64,
    pub open_tasks: usize,
}

impl CrmSnapshot {
    /// Total value of every deal regardless of stage.
    pub fn total_deal_value(&self) -> f64 {
        self.deals.iter().fold(0.0, |acc, d| acc + d.value)
    }

    pub fn find_lead(&self, id: &str) -> Option<&Lead> {
        self.leads.iter().find(|l| l.id == id)
    }

    pub fn metrics(&self) -> ReportMetrics {
        let revenue = self
            .deals
            .iter()
            .filter(|d| d.stage == DealStage::ClosedWon)
            .fold(0.0, |acc, d| acc + d.value);
        let pipeline = self
            .deals
            .iter()
            .filter(|d| !d.stage.is_closed())
            .fold(0.0, |acc, d| acc + d.value);
        let conversion = if self.leads.is_empty() {
            0.0
        } else {
            let won = self
                .leads
                .iter()
                .filter(|l| l.status == LeadStatus::Won)
                .count();
            (won as f64 * 1000.0 / self.leads.len() as f64).round() / 10.0
        };
        let open_tasks = self.tasks.iter().filter(|t| !t.completed).count();

        ReportMetrics {
            revenue,
            pipeline,
            conversion,
            open_tasks,
        }
    }
}
