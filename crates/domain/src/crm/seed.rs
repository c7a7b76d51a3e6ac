//! Demo records a new profile starts with.
//!
//! Used when a CRM document has never been written, matching what the
//! dashboard shows before its first save.

use super::{Deal, DealStage, Lead, LeadStatus, Priority, Task};

#[allow(clippy::too_many_arguments)]
fn lead(
    id: &str,
    name: &str,
    company: &str,
    email: &str,
    status: LeadStatus,
    ai_score: u32,
    last_interaction: &str,
    notes: &str,
    value: f64,
) -> Lead {
    Lead {
        id: id.into(),
        name: name.into(),
        company: company.into(),
        email: email.into(),
        status,
        ai_score,
        last_interaction: last_interaction.into(),
        notes: notes.into(),
        value,
    }
}

pub fn leads() -> Vec<Lead> {
    vec![
        lead(
            "l1",
            "John Doe",
            "TechFlow Inc",
            "john@techflow.com",
            LeadStatus::New,
            85,
            "2023-10-25",
            "Interested in enterprise license",
            5000.0,
        ),
        lead(
            "l2",
            "Sarah Smith",
            "GreenScale",
            "sarah@greenscale.io",
            LeadStatus::Qualified,
            92,
            "2023-10-27",
            "Budget approved. Needs a demo.",
            12000.0,
        ),
        lead(
            "l3",
            "Mike Johnson",
            "BlueSky Ltd",
            "mike@bluesky.com",
            LeadStatus::Contacted,
            45,
            "2023-10-20",
            "Looking for trial access",
            2000.0,
        ),
        lead(
            "l4",
            "Emma Wilson",
            "Nova Labs",
            "emma@novalabs.ai",
            LeadStatus::Won,
            98,
            "2023-10-28",
            "Contract signed yesterday",
            25000.0,
        ),
        lead(
            "l5",
            "David Lee",
            "Pixel Point",
            "david@pixelpoint.co",
            LeadStatus::Lost,
            12,
            "2023-10-15",
            "Price was too high for their budget",
            3000.0,
        ),
    ]
}

pub fn deals() -> Vec<Deal> {
    let deal = |id: &str, title: &str, lead_id: &str, value: f64, stage: DealStage, close: &str| Deal {
        id: id.into(),
        title: title.into(),
        lead_id: lead_id.into(),
        value,
        stage,
        expected_close: close.into(),
    };
    vec![
        deal("d1", "Enterprise Cloud Migration", "l2", 12000.0, DealStage::Proposal, "2023-11-15"),
        deal("d2", "Consulting Workshop", "l3", 2500.0, DealStage::Discovery, "2023-11-20"),
        deal("d3", "Q4 Support Retainer", "l4", 8000.0, DealStage::ClosedWon, "2023-10-31"),
    ]
}

pub fn tasks() -> Vec<Task> {
    let task = |id: &str, title: &str, due: &str, completed: bool, priority: Priority, related: &str| Task {
        id: id.into(),
        title: title.into(),
        due_date: due.into(),
        completed,
        priority,
        related_to: related.into(),
    };
    vec![
        task(
            "t1",
            "Follow up with Sarah Smith regarding GreenScale proposal",
            "2023-11-05",
            false,
            Priority::High,
            "Sarah Smith",
        ),
        task(
            "t2",
            "Send revised pricing to TechFlow Inc",
            "2023-11-06",
            false,
            Priority::Medium,
            "John Doe",
        ),
        task(
            "t3",
            "Initial discovery call with Quantum Base CTO",
            "2023-11-04",
            true,
            Priority::High,
            "Marcus Vance",
        ),
        task(
            "t4",
            "Review marketing collateral for Starlight Media",
            "2023-11-08",
            false,
            Priority::Low,
            "Olivia Taylor",
        ),
        task(
            "t5",
            "Drafting legal agreement for Nova Labs",
            "2023-11-10",
            false,
            Priority::Medium,
            "Emma Wilson",
        ),
        task(
            "t6",
            "Quarterly sales sync with the team",
            "2023-11-01",
            true,
            Priority::Medium,
            "Internal",
        ),
    ]
}
