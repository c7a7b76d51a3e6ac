use nr_domain::error::Result;
use serde_json::Value;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request / Response types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A provider-agnostic "generate text" request.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    /// Model identifier. When `None`, the provider uses its default.
    pub model: Option<String>,
    /// Prompt content: a plain string or a structured value.
    pub contents: Value,
    /// Optional system instruction sent alongside the contents.
    pub system_instruction: Option<String>,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, contents: impl Into<Value>) -> Self {
        Self {
            model: Some(model.into()),
            contents: contents.into(),
            system_instruction: None,
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }
}

/// Token accounting reported by the provider, when available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A provider-agnostic generation response.
#[derive(Debug, Clone, Default)]
pub struct GenerateResponse {
    /// Generated text. `None` when the response carried no text parts.
    pub text: Option<String>,
    /// The model that actually produced the response.
    pub model: String,
    /// Normalized stop reason (e.g. "stop", "length").
    pub finish_reason: Option<String>,
    pub usage: Option<Usage>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Core provider trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The one remote operation the intelligence gateway depends on.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send a generation request and wait for the full response.
    async fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse>;

    /// A unique identifier for this provider instance.
    fn provider_id(&self) -> &str;
}
