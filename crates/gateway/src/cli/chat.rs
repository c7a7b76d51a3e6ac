//! `neura chat`: interactive assistant REPL.
//!
//! Each line goes to the conversational endpoint with the current CRM
//! counts as context. Settled calls are echoed (dimmed, on stderr) from the
//! API log bus.

use std::future::Future;

use nr_apilog::LogStatus;
use nr_domain::config::Config;
use nr_domain::crm::{Lead, Task};
use tokio_util::sync::CancellationToken;

use crate::bootstrap::{self, Profile};
use crate::cli::log::format_row;
use crate::features::{CrmAssistant, CHAT_FALLBACK};

const HISTORY_FILE: &str = "chat_history.txt";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Public entry point
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn chat(config: &Config, profile: &Profile, mut model: Option<String>) -> anyhow::Result<()> {
    let assistant = bootstrap::build_assistant(config, profile)?;

    let _echo = profile.log.subscribe(|entry| {
        if entry.status.is_terminal() {
            eprintln!(
                "\x1b[2m[{} {} {}ms]\x1b[0m",
                entry.endpoint, entry.status, entry.latency
            );
        }
    });

    let history_path = profile.dir.join(HISTORY_FILE);
    let mut rl = rustyline::DefaultEditor::new()?;
    let _ = rl.load_history(&history_path);

    eprintln!("NEURA Core interactive chat");
    eprintln!("Type /help for commands, Ctrl+D to exit");
    eprintln!();

    loop {
        match rl.readline("you> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(&line).ok();

                if trimmed.starts_with('/') {
                    if handle_slash_command(trimmed, &mut model, profile) {
                        break;
                    }
                    continue;
                }

                let reply = ask(&assistant, profile, trimmed, model.as_deref()).await;
                println!("{reply}");
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                eprintln!("(Use Ctrl+D or /exit to quit)");
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("\x1b[31mreadline error: {e}\x1b[0m");
                break;
            }
        }
    }

    rl.save_history(&history_path).ok();
    eprintln!("Goodbye!");
    Ok(())
}

/// CRM counts are re-read per message so edits made elsewhere show up.
/// Ctrl+C cancels the call and returns to the prompt.
async fn ask(assistant: &CrmAssistant, profile: &Profile, query: &str, model: Option<&str>) -> String {
    let leads = profile.crm.leads();
    let tasks = profile.crm.tasks();
    let interrupt = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    reply_or_fallback(assistant, query, &leads, &tasks, model, interrupt).await
}

/// Run one chat call, cancelling it when `interrupt` resolves first. The
/// cancelled call still settles in the API log.
async fn reply_or_fallback(
    assistant: &CrmAssistant,
    query: &str,
    leads: &[Lead],
    tasks: &[Task],
    model: Option<&str>,
    interrupt: impl Future<Output = ()>,
) -> String {
    let cancel = CancellationToken::new();
    let assistant = assistant.clone().with_cancel(cancel.clone());
    let call = assistant.chat_with_model(query, leads, tasks, model);
    tokio::pin!(call);
    tokio::pin!(interrupt);

    let result = tokio::select! {
        result = &mut call => result,
        () = &mut interrupt => {
            cancel.cancel();
            call.await
        }
    };

    match result {
        Ok(text) => text,
        Err(e) => {
            if e.is_cancelled() {
                eprintln!("(cancelled)");
            }
            CHAT_FALLBACK.to_string()
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Slash command handling
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Returns `true` if the REPL should exit.
fn handle_slash_command(input: &str, model: &mut Option<String>, profile: &Profile) -> bool {
    let (cmd, arg) = match input.split_once(' ') {
        Some((cmd, arg)) => (cmd, Some(arg.trim()).filter(|s| !s.is_empty())),
        None => (input, None),
    };

    match cmd {
        "/exit" | "/quit" => return true,

        "/model" => match arg {
            Some(name) => {
                *model = Some(name.to_string());
                eprintln!("Model set to: {name}");
            }
            None => {
                eprintln!("Current model: {}", model.as_deref().unwrap_or("(reasoning default)"));
                eprintln!("Usage: /model <name>");
            }
        },

        "/log" => {
            let limit = arg.and_then(|a| a.parse().ok()).unwrap_or(10);
            let entries = profile.log.get_all();
            if entries.is_empty() {
                eprintln!("No API calls recorded.");
            }
            for entry in entries.iter().take(limit) {
                eprintln!("{}", format_row(entry));
            }
            let errors = entries.iter().filter(|e| e.status == LogStatus::Error).count();
            if errors > 0 {
                eprintln!("({errors} failed call(s) in the log)");
            }
        }

        "/help" => {
            eprintln!("Commands:");
            eprintln!("  /model <name>    Set the model for following messages");
            eprintln!("  /log [n]         Show the last n API calls (default 10)");
            eprintln!("  /exit, /quit     Exit the chat");
            eprintln!("  /help            Show this help");
        }

        other => {
            eprintln!("Unknown command: {other}  (type /help for a list)");
        }
    }

    false
}
