//! Anthropic Messages API provider.

use async_trait::async_trait;
use concierge_core::{
    context::{Completion, Context},
    error::ConciergeError,
    traits::Provider,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Appended to the system prompt when the caller wants JSON back.
const JSON_ONLY: &str = "Respond with a single JSON object and nothing else.";

/// Anthropic Messages API provider.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl AnthropicProvider {
    /// Create from config values.
    pub fn from_config(api_key: String, model: String) -> Self {
        Self {
            client: crate::http_client(),
            api_key,
            model,
        }
    }
}

#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    system: String,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Option<Vec<AnthropicContentBlock>>,
    model: Option<String>,
    usage: Option<AnthropicUsage>,
}

#[derive(Deserialize)]
struct AnthropicContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

fn build_request(context: &Context, model: &str) -> AnthropicRequest {
    let (mut system, api_messages) = context.to_api_messages();
    if context.json_output {
        if !system.is_empty() {
            system.push_str("\n\n");
        }
        system.push_str(JSON_ONLY);
    }

    AnthropicRequest {
        model: model.to_string(),
        max_tokens: context.max_tokens,
        system,
        messages: api_messages
            .into_iter()
            .map(|m| AnthropicMessage {
                role: m.role,
                content: m.content,
            })
            .collect(),
        temperature: context.json_output.then_some(0.0),
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, context: &Context) -> Result<Completion, ConciergeError> {
        let effective_model = context.model.as_deref().unwrap_or(&self.model);
        let start = Instant::now();
        let body = build_request(context, effective_model);

        debug!("anthropic: POST {ANTHROPIC_API_URL} model={effective_model}");

        let resp = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ConciergeError::Provider(format!("anthropic request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(ConciergeError::Provider(format!(
                "anthropic returned {status}: {text}"
            )));
        }

        let parsed: AnthropicResponse = resp.json().await.map_err(|e| {
            ConciergeError::Provider(format!("anthropic: failed to parse response: {e}"))
        })?;

        let text = parsed
            .content
            .as_ref()
            .and_then(|blocks| blocks.first())
            .map(|b| b.text.clone())
            .ok_or_else(|| ConciergeError::Provider("anthropic: empty response".to_string()))?;

        Ok(Completion {
            text,
            model: parsed.model,
            tokens_used: parsed
                .usage
                .as_ref()
                .map(|u| u.input_tokens + u.output_tokens),
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn is_available(&self) -> bool {
        if self.api_key.is_empty() {
            warn!("anthropic: no API key configured");
            return false;
        }
        true
    }
}
