//! End-to-end gateway behavior against a scripted provider.
//!
//! Time is paused, so provider delays and latencies are deterministic.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use nr_apilog::{ApiLogStore, LogEntry, LogStatus, MemoryStore};
use nr_domain::config::{Config, GatewayConfig};
use nr_domain::crm::{Lead, LeadStatus, ReportMetrics};
use nr_domain::error::{Error, Result};
use nr_gateway::features::{CrmAssistant, CHAT_FALLBACK, INSIGHTS_FALLBACK};
use nr_gateway::{IntelligenceCall, IntelligenceGateway};
use nr_providers::{GenerateRequest, GenerateResponse, TextGenerator};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

// ── Scripted provider ────────────────────────────────────────────────

#[derive(Clone)]
struct Step {
    delay: Duration,
    reply: std::result::Result<Option<String>, String>,
}

impl Step {
    fn ok(delay_ms: u64, text: &str) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            reply: Ok(Some(text.to_string())),
        }
    }

    fn empty(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            reply: Ok(None),
        }
    }

    fn fail(delay_ms: u64, message: &str) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            reply: Err(message.to_string()),
        }
    }

    fn hang() -> Self {
        Self::ok(3_600_000, "too late")
    }
}

/// Picks a step per request and records what it was asked.
struct Scripted {
    script: Box<dyn Fn(&GenerateRequest) -> Step + Send + Sync>,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl Scripted {
    fn new(script: impl Fn(&GenerateRequest) -> Step + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn always(step: Step) -> Arc<Self> {
        Self::new(move |_| step.clone())
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TextGenerator for Scripted {
    async fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(req.clone());
        let step = (self.script)(req);
        tokio::time::sleep(step.delay).await;
        match step.reply {
            Ok(text) => Ok(GenerateResponse {
                text,
                model: req.model.clone().unwrap_or_default(),
                ..GenerateResponse::default()
            }),
            Err(message) => Err(Error::Provider {
                provider: "scripted".into(),
                message,
            }),
        }
    }

    fn provider_id(&self) -> &str {
        "scripted"
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────

fn log_store() -> Arc<ApiLogStore> {
    Arc::new(ApiLogStore::new(
        Arc::new(MemoryStore::new()),
        "neura_api_logs",
        50,
    ))
}

fn gateway_with(provider: Arc<Scripted>, cfg: &GatewayConfig) -> (IntelligenceGateway, Arc<ApiLogStore>) {
    let log = log_store();
    (IntelligenceGateway::new(provider, log.clone(), cfg), log)
}

fn gateway(provider: Arc<Scripted>) -> (IntelligenceGateway, Arc<ApiLogStore>) {
    gateway_with(provider, &GatewayConfig::default())
}

fn insight_call(prompt: &str) -> IntelligenceCall<&str> {
    IntelligenceCall::new("gemini-3-pro-preview", prompt, "Dashboard", "strategic-insight")
}

fn only_entry(log: &ApiLogStore) -> LogEntry {
    let all = log.get_all();
    assert_eq!(all.len(), 1, "expected exactly one entry, got {all:?}");
    all.into_iter().next().unwrap()
}

fn lead(id: &str) -> Lead {
    Lead {
        id: id.into(),
        name: "Sarah Smith".into(),
        company: "GreenScale".into(),
        email: "sarah@greenscale.io".into(),
        status: LeadStatus::New,
        ai_score: 92,
        last_interaction: "2023-10-27".into(),
        notes: "Budget approved. Needs a demo.".into(),
        value: 12000.0,
    }
}

// ── Gateway ──────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn successful_call_logs_success_with_latency() {
    let provider = Scripted::always(Step::ok(120, "Focus on enterprise."));
    let (gw, log) = gateway(provider.clone());

    let text = gw.invoke(insight_call("Analyze CRM state")).await.unwrap();
    assert_eq!(text, "Focus on enterprise.");

    let entry = only_entry(&log);
    assert_eq!(entry.status, LogStatus::Success);
    assert!((120..130).contains(&entry.latency), "latency {}", entry.latency);
    assert_eq!(entry.endpoint, "gemini-api/strategic-insight");
    assert_eq!(entry.method, "POST");
    assert_eq!(entry.page, "Dashboard");
    assert_eq!(provider.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn rejected_call_logs_error_and_propagates() {
    let provider = Scripted::always(Step::fail(40, "HTTP 500 - internal"));
    let (gw, log) = gateway(provider.clone());

    let err = gw.invoke(insight_call("Analyze")).await.unwrap_err();
    match &err {
        Error::RemoteCallFailed { endpoint, source } => {
            assert_eq!(endpoint, "gemini-api/strategic-insight");
            assert!(matches!(**source, Error::Provider { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let entry = only_entry(&log);
    assert_eq!(entry.status, LogStatus::Error);
    assert!(entry.latency >= 40);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn response_without_text_is_empty_success() {
    let (gw, log) = gateway(Scripted::always(Step::empty(5)));
    let text = gw.invoke(insight_call("Analyze")).await.unwrap();
    assert_eq!(text, "");
    assert_eq!(only_entry(&log).status, LogStatus::Success);
}

#[tokio::test(start_paused = true)]
async fn pending_entry_is_visible_while_in_flight() {
    let (gw, log) = gateway(Scripted::always(Step::ok(100, "done")));
    let gw = Arc::new(gw);

    let task = {
        let gw = gw.clone();
        tokio::spawn(async move { gw.invoke(insight_call("Analyze")).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    let entry = only_entry(&log);
    assert_eq!(entry.status, LogStatus::Pending);
    assert_eq!(entry.latency, 0);

    task.await.unwrap().unwrap();
    assert_eq!(only_entry(&log).status, LogStatus::Success);
}

#[tokio::test(start_paused = true)]
async fn concurrent_calls_settle_independently() {
    let provider = Scripted::new(|req| {
        if req.contents.as_str() == Some("slow") {
            Step::ok(200, "slow reply")
        } else {
            Step::fail(50, "boom")
        }
    });
    let (gw, log) = gateway(provider.clone());

    let (slow, fast) = tokio::join!(gw.invoke(insight_call("slow")), gw.invoke(insight_call("fast")));
    assert_eq!(slow.unwrap(), "slow reply");
    assert!(fast.is_err());

    let all = log.get_all();
    assert_eq!(all.len(), 2);
    let slow_entry = all.iter().find(|e| e.status == LogStatus::Success).unwrap();
    let fast_entry = all.iter().find(|e| e.status == LogStatus::Error).unwrap();
    assert!(slow_entry.latency >= 200);
    assert!(fast_entry.latency >= 50 && fast_entry.latency < 200);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn timeout_settles_hung_call_as_error() {
    let provider = Scripted::always(Step::hang());
    let (gw, log) = gateway(provider);

    let err = gw
        .invoke(insight_call("Analyze").with_timeout(Duration::from_millis(250)))
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    let entry = only_entry(&log);
    assert_eq!(entry.status, LogStatus::Error);
    assert!((250..260).contains(&entry.latency), "latency {}", entry.latency);
}

#[tokio::test(start_paused = true)]
async fn configured_default_timeout_applies() {
    let cfg = GatewayConfig {
        default_timeout_ms: 1_000,
        ..GatewayConfig::default()
    };
    let (gw, log) = gateway_with(Scripted::always(Step::hang()), &cfg);

    let err = gw.invoke(insight_call("Analyze")).await.unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(only_entry(&log).status, LogStatus::Error);
}

#[tokio::test(start_paused = true)]
async fn cancellation_settles_call_as_error() {
    let cfg = GatewayConfig {
        default_timeout_ms: 0,
        ..GatewayConfig::default()
    };
    let (gw, log) = gateway_with(Scripted::always(Step::hang()), &cfg);

    let token = CancellationToken::new();
    let canceller = {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            token.cancel();
        })
    };

    let err = gw
        .invoke(insight_call("Analyze").with_cancel(token))
        .await
        .unwrap_err();
    canceller.await.unwrap();
    assert!(err.is_cancelled());

    let entry = only_entry(&log);
    assert_eq!(entry.status, LogStatus::Error);
    assert!(entry.latency >= 30);
}

#[tokio::test(start_paused = true)]
async fn already_cancelled_token_still_logs_one_entry() {
    let (gw, log) = gateway(Scripted::always(Step::ok(10, "x")));
    let token = CancellationToken::new();
    token.cancel();

    let err = gw
        .invoke(insight_call("Analyze").with_cancel(token))
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(only_entry(&log).status, LogStatus::Error);
}

#[tokio::test(start_paused = true)]
async fn system_instruction_and_model_reach_provider() {
    let provider = Scripted::always(Step::ok(1, "ok"));
    let (gw, _log) = gateway(provider.clone());

    gw.invoke(
        IntelligenceCall::new("gemini-3-flash-preview", "hi", "NEURA AI", "conversational-nlp")
            .with_system_instruction("You are NEURA Core."),
    )
    .await
    .unwrap();

    let requests = provider.requests.lock();
    assert_eq!(requests[0].model.as_deref(), Some("gemini-3-flash-preview"));
    assert_eq!(requests[0].system_instruction.as_deref(), Some("You are NEURA Core."));
    assert_eq!(requests[0].contents, serde_json::json!("hi"));
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_pending_then_terminal() {
    let (gw, log) = gateway(Scripted::always(Step::ok(20, "ok")));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen2 = seen.clone();
    let _sub = log.subscribe(move |e| seen2.lock().push(e.status));

    gw.invoke(insight_call("Analyze")).await.unwrap();
    assert_eq!(*seen.lock(), vec![LogStatus::Pending, LogStatus::Success]);
}

#[tokio::test(start_paused = true)]
async fn cleared_log_mid_flight_does_not_resurrect_entry() {
    let (gw, log) = gateway(Scripted::always(Step::ok(100, "ok")));
    let gw = Arc::new(gw);

    let task = {
        let gw = gw.clone();
        tokio::spawn(async move { gw.invoke(insight_call("Analyze")).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    log.clear();

    assert_eq!(task.await.unwrap().unwrap(), "ok");
    assert!(log.get_all().is_empty());
}

// ── Assistant features ───────────────────────────────────────────────

fn assistant(provider: Arc<Scripted>) -> (CrmAssistant, Arc<ApiLogStore>) {
    let (gw, log) = gateway(provider);
    let config = Config::default();
    (
        CrmAssistant::new(Arc::new(gw), config.gateway.models.clone()),
        log,
    )
}

#[tokio::test(start_paused = true)]
async fn follow_up_uses_fast_model_and_lead_details() {
    let provider = Scripted::always(Step::ok(5, "Hi Sarah"));
    let (assistant, log) = assistant(provider.clone());

    let text = assistant.follow_up_email(&lead("l2")).await.unwrap();
    assert_eq!(text, "Hi Sarah");

    let req = provider.requests.lock()[0].clone();
    assert_eq!(req.model.as_deref(), Some("gemini-3-flash-preview"));
    assert_eq!(
        req.contents.as_str().unwrap(),
        "Generate a high-conversion follow-up email.\n       \
         Lead: Sarah Smith from GreenScale\n       \
         Context: Budget approved. Needs a demo."
    );

    let entry = only_entry(&log);
    assert_eq!(entry.page, "Leads Matrix");
    assert_eq!(entry.endpoint, "gemini-api/outreach-synthesis");
}

#[tokio::test(start_paused = true)]
async fn insights_prompt_carries_counts_and_pipeline() {
    let provider = Scripted::always(Step::ok(5, "- grow"));
    let (assistant, log) = assistant(provider.clone());

    assistant
        .dashboard_insights(&[lead("l1"), lead("l2")], &[])
        .await
        .unwrap();

    let req = provider.requests.lock()[0].clone();
    assert_eq!(req.model.as_deref(), Some("gemini-3-pro-preview"));
    assert_eq!(
        req.contents.as_str().unwrap(),
        "Analyze CRM state: Leads: 2, Pipeline: $0. Provide 3 bullet points on growth strategy."
    );
    assert_eq!(only_entry(&log).page, "Dashboard");
}

#[tokio::test(start_paused = true)]
async fn summary_embeds_metrics_json() {
    let provider = Scripted::always(Step::ok(5, "Summary"));
    let (assistant, log) = assistant(provider.clone());
    let metrics = ReportMetrics {
        revenue: 88000.0,
        pipeline: 45000.0,
        conversion: 18.4,
        open_tasks: 3,
    };

    assistant.executive_summary(&metrics).await.unwrap();

    let req = provider.requests.lock()[0].clone();
    let prompt = req.contents.as_str().unwrap();
    assert!(prompt.starts_with("Generate executive summary for metrics: {"));
    assert!(prompt.contains("\"openTasks\":3"));
    let entry = only_entry(&log);
    assert_eq!(entry.page, "Growth Matrix");
    assert_eq!(entry.endpoint, "gemini-api/executive-reporting");
}

#[tokio::test(start_paused = true)]
async fn chat_sends_crm_context_as_system_instruction() {
    let provider = Scripted::always(Step::ok(5, "Hello"));
    let (assistant, log) = assistant(provider.clone());

    let reply = assistant
        .chat("Who should I call first?", &[lead("l1"), lead("l2"), lead("l3")], &[])
        .await
        .unwrap();
    assert_eq!(reply, "Hello");

    let req = provider.requests.lock()[0].clone();
    assert_eq!(req.contents, serde_json::json!("Who should I call first?"));
    assert_eq!(
        req.system_instruction.as_deref(),
        Some("You are NEURA Core. CRM Context: 3 leads, 0 tasks.")
    );
    assert_eq!(only_entry(&log).page, "NEURA AI");
}

#[tokio::test(start_paused = true)]
async fn fallbacks_replace_failures_but_keep_the_error_entry() {
    let provider = Scripted::always(Step::fail(5, "quota exceeded"));
    let (assistant, log) = assistant(provider);

    assert_eq!(
        assistant.dashboard_insights_or_fallback(&[], &[]).await,
        INSIGHTS_FALLBACK
    );
    assert_eq!(assistant.chat_or_fallback("hi", &[], &[]).await, CHAT_FALLBACK);

    let all = log.get_all();
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|e| e.status == LogStatus::Error));
}

#[tokio::test(start_paused = true)]
async fn assistant_cancel_token_applies_to_every_call() {
    let cfg = GatewayConfig {
        default_timeout_ms: 0,
        ..GatewayConfig::default()
    };
    let (gw, log) = gateway_with(Scripted::always(Step::hang()), &cfg);
    let token = CancellationToken::new();
    let assistant = CrmAssistant::new(Arc::new(gw), cfg.models.clone()).with_cancel(token.clone());
    token.cancel();

    assert!(assistant.chat("hi", &[], &[]).await.unwrap_err().is_cancelled());
    assert_eq!(only_entry(&log).status, LogStatus::Error);
}
