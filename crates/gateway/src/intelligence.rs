//! Logged, bounded calls to the text generation provider.
//!
//! Every [`IntelligenceGateway::invoke`] writes exactly one API log entry
//! as `pending`, makes exactly one provider call, and settles the entry
//! exactly once as `success` or `error`. The provider call races an
//! optional timeout and an optional cancellation token, so a hung call
//! still settles.

use std::sync::Arc;
use std::time::Duration;

use nr_apilog::{payload_size_label, ApiLogStore, LogStatus, NewLogEntry};
use nr_domain::config::GatewayConfig;
use nr_domain::error::{Error, Result};
use nr_domain::trace::TraceEvent;
use nr_providers::{GenerateRequest, GenerateResponse, TextGenerator};
use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Call description
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One request to the intelligence provider.
#[derive(Debug, Clone)]
pub struct IntelligenceCall<C> {
    pub model: String,
    /// Anything serializable: a prompt string or structured turns.
    pub contents: C,
    /// UI context recorded on the log entry.
    pub page: String,
    /// Logical operation name, without the endpoint prefix.
    pub endpoint: String,
    pub system_instruction: Option<String>,
    /// Overrides the gateway default when set.
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
}

impl<C: Serialize> IntelligenceCall<C> {
    pub fn new(
        model: impl Into<String>,
        contents: C,
        page: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            contents,
            page: page.into(),
            endpoint: endpoint.into(),
            system_instruction: None,
            timeout: None,
            cancel: None,
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Gateway
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct IntelligenceGateway {
    provider: Arc<dyn TextGenerator>,
    log: Arc<ApiLogStore>,
    endpoint_prefix: String,
    method: String,
    default_timeout: Option<Duration>,
}

impl IntelligenceGateway {
    pub fn new(provider: Arc<dyn TextGenerator>, log: Arc<ApiLogStore>, cfg: &GatewayConfig) -> Self {
        Self {
            provider,
            log,
            endpoint_prefix: cfg.endpoint_prefix.trim_end_matches('/').to_string(),
            method: cfg.method.clone(),
            default_timeout: cfg.default_timeout(),
        }
    }

    pub fn log(&self) -> &Arc<ApiLogStore> {
        &self.log
    }

    pub fn provider_id(&self) -> &str {
        self.provider.provider_id()
    }

    /// Endpoint string recorded in the log, e.g. `gemini-api/strategic-insight`.
    pub fn qualified_endpoint(&self, endpoint: &str) -> String {
        if self.endpoint_prefix.is_empty() {
            endpoint.to_string()
        } else {
            format!("{}/{}", self.endpoint_prefix, endpoint)
        }
    }

    /// Run one logged provider call and return the generated text.
    ///
    /// A response without text yields an empty string. Every failure,
    /// including serialization of `contents`, timeout, and cancellation,
    /// is recorded as `error` and returned as [`Error::RemoteCallFailed`].
    pub async fn invoke<C: Serialize>(&self, call: IntelligenceCall<C>) -> Result<String> {
        let started = Instant::now();
        let endpoint = self.qualified_endpoint(&call.endpoint);

        let (contents, payload_size) = match serde_json::to_value(&call.contents) {
            Ok(value) => {
                let size = payload_size_label(value.to_string().encode_utf16().count());
                (Ok(value), size)
            }
            Err(e) => (Err(Error::Json(e)), payload_size_label(0)),
        };

        let log_id = self.log.record(NewLogEntry {
            method: self.method.clone(),
            endpoint: endpoint.clone(),
            page: call.page.clone(),
            payload_size: payload_size.clone(),
        });

        TraceEvent::ApiCallDispatched {
            log_id: log_id.clone(),
            endpoint: endpoint.clone(),
            page: call.page.clone(),
            model: call.model.clone(),
            payload_size,
        }
        .emit();

        let outcome = match contents {
            Ok(contents) => {
                let req = GenerateRequest {
                    model: Some(call.model.clone()),
                    contents,
                    system_instruction: call.system_instruction.clone(),
                };
                let timeout = call.timeout.or(self.default_timeout);
                self.dispatch(&req, timeout, call.cancel.as_ref()).await
            }
            Err(e) => Err(e),
        };

        let latency_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(resp) => {
                self.settle(&log_id, &endpoint, LogStatus::Success, latency_ms);
                Ok(resp.text.unwrap_or_default())
            }
            Err(e) => {
                tracing::error!(
                    log_id = %log_id,
                    endpoint = %endpoint,
                    model = %call.model,
                    latency_ms,
                    error = %e,
                    "intelligence call failed"
                );
                self.settle(&log_id, &endpoint, LogStatus::Error, latency_ms);
                Err(Error::remote(endpoint, e))
            }
        }
    }

    async fn dispatch(
        &self,
        req: &GenerateRequest,
        timeout: Option<Duration>,
        cancel: Option<&CancellationToken>,
    ) -> Result<GenerateResponse> {
        let bounded = async {
            match timeout {
                Some(limit) => match tokio::time::timeout(limit, self.provider.generate(req)).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::Timeout(format!(
                        "no response within {}ms",
                        limit.as_millis()
                    ))),
                },
                None => self.provider.generate(req).await,
            }
        };

        match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(Error::Cancelled("intelligence call cancelled".into())),
                result = bounded => result,
            },
            None => bounded.await,
        }
    }

    fn settle(&self, log_id: &str, endpoint: &str, status: LogStatus, latency_ms: u64) {
        if !self.log.update_status(log_id, status, latency_ms) {
            // Evicted by newer calls or cleared while in flight.
            tracing::debug!(log_id = %log_id, "settled call no longer in the API log");
        }
        TraceEvent::ApiCallSettled {
            log_id: log_id.to_string(),
            endpoint: endpoint.to_string(),
            status: status.to_string(),
            latency_ms,
        }
        .emit();
    }
}
