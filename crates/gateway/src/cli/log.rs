//! `neura log`: inspect the API call log.

use std::collections::HashMap;
use std::time::Duration;

use nr_apilog::{ApiLogStore, LogEntry, LogStatus};

use crate::bootstrap::Profile;
use crate::cli::LogCommand;

pub async fn run(profile: &Profile, cmd: LogCommand) -> anyhow::Result<()> {
    match cmd {
        LogCommand::List { limit, json } => list(&profile.log, limit, json),
        LogCommand::Stats { json } => stats(&profile.log, json),
        LogCommand::Tail { interval_ms } => {
            tail(&profile.log, Duration::from_millis(interval_ms)).await
        }
        LogCommand::Clear => {
            profile.log.clear();
            eprintln!("API log cleared");
            Ok(())
        }
    }
}

fn list(log: &ApiLogStore, limit: Option<usize>, json: bool) -> anyhow::Result<()> {
    let mut entries = log.get_all();
    if let Some(limit) = limit {
        entries.truncate(limit);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        eprintln!("No API calls recorded.");
        return Ok(());
    }
    println!(
        "{:<20} {:<8} {:>8} {:>6}  {:<36} PAGE",
        "TIME", "STATUS", "LATENCY", "SIZE", "ENDPOINT"
    );
    for entry in &entries {
        println!("{}", format_row(entry));
    }
    Ok(())
}

fn stats(log: &ApiLogStore, json: bool) -> anyhow::Result<()> {
    let stats = log.stats();
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("total:       {}", stats.total);
        println!("pending:     {}", stats.pending);
        println!("success:     {}", stats.success);
        println!("error:       {}", stats.error);
        println!("avg latency: {}ms", stats.avg_latency_ms);
    }
    Ok(())
}

/// Poll the persisted log and print entries that are new or changed
/// status. Other processes write the log, so the in-process bus is not
/// enough here.
async fn tail(log: &ApiLogStore, interval: Duration) -> anyhow::Result<()> {
    let mut seen: HashMap<String, LogStatus> = log
        .get_all()
        .into_iter()
        .map(|e| (e.id, e.status))
        .collect();
    eprintln!("Following API log (Ctrl+C to stop)");

    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                let entries = log.get_all();
                for entry in changed_entries(&mut seen, &entries) {
                    println!("{}", format_row(entry));
                }
            }
        }
    }
    Ok(())
}

/// Entries not yet seen with their current status, oldest first. Updates
/// `seen` and forgets ids that fell out of the log.
fn changed_entries<'a>(
    seen: &mut HashMap<String, LogStatus>,
    entries: &'a [LogEntry],
) -> Vec<&'a LogEntry> {
    let mut changed = Vec::new();
    for entry in entries.iter().rev() {
        if seen.get(&entry.id) != Some(&entry.status) {
            seen.insert(entry.id.clone(), entry.status);
            changed.push(entry);
        }
    }
    seen.retain(|id, _| entries.iter().any(|e| &e.id == id));
    changed
}

pub(crate) fn format_row(entry: &LogEntry) -> String {
    let latency = match entry.status {
        LogStatus::Pending => "-".to_string(),
        _ => format!("{}ms", entry.latency),
    };
    format!(
        "{:<20} {:<8} {:>8} {:>6}  {:<36} {}",
        entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        entry.status.as_str(),
        latency,
        entry.payload_size,
        entry.endpoint,
        entry.page
    )
}
