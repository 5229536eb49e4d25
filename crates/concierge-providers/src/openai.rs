//! OpenAI-compatible chat completions provider.
//!
//! Works with OpenAI's API and any endpoint speaking the same protocol.

use async_trait::async_trait;
use concierge_core::{
    context::{ApiMessage, Completion, Context},
    error::ConciergeError,
    traits::Provider,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

/// OpenAI-compatible provider.
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    /// Create from config values.
    pub fn from_config(base_url: String, api_key: String, model: String) -> Self {
        Self {
            client: crate::http_client(),
            base_url,
            api_key,
            model,
        }
    }
}

/// Build OpenAI-format messages (system as a message role).
fn build_messages(system: &str, api_messages: Vec<ApiMessage>) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(api_messages.len() + 1);
    if !system.is_empty() {
        messages.push(ChatMessage {
            role: "system".to_string(),
            content: system.to_string(),
        });
    }
    messages.extend(api_messages.into_iter().map(|m| ChatMessage {
        role: m.role,
        content: m.content,
    }));
    messages
}

#[derive(Serialize, Deserialize, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Option<Vec<ChatChoice>>,
    model: Option<String>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatUsage {
    total_tokens: Option<u64>,
}

fn build_request(context: &Context, model: &str) -> ChatCompletionRequest {
    let (system, api_messages) = context.to_api_messages();
    ChatCompletionRequest {
        model: model.to_string(),
        messages: build_messages(&system, api_messages),
        max_tokens: context.max_tokens,
        temperature: context.json_output.then_some(0.0),
        response_format: context.json_output.then_some(ResponseFormat {
            kind: "json_object",
        }),
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, context: &Context) -> Result<Completion, ConciergeError> {
        let effective_model = context.model.as_deref().unwrap_or(&self.model);
        let start = Instant::now();
        let body = build_request(context, effective_model);

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        debug!("openai: POST {url} model={effective_model}");

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| ConciergeError::Provider(format!("openai request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(ConciergeError::Provider(format!(
                "openai returned {status}: {text}"
            )));
        }

        let parsed: ChatCompletionResponse = resp.json().await.map_err(|e| {
            ConciergeError::Provider(format!("openai: failed to parse response: {e}"))
        })?;

        let text = parsed
            .choices
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.message.as_ref())
            .map(|m| m.content.clone())
            .ok_or_else(|| ConciergeError::Provider("openai: empty response".to_string()))?;

        Ok(Completion {
            text,
            model: parsed.model,
            tokens_used: parsed.usage.and_then(|u| u.total_tokens),
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn is_available(&self) -> bool {
        if self.api_key.is_empty() {
            warn!("openai: no API key configured");
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_messages_puts_system_first() {
        let msgs = build_messages(
            "Be brief.",
            vec![ApiMessage {
                role: "user".into(),
                content: "hi".into(),
            }],
        );
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].role, "system");
        assert_eq!(msgs[1].content, "hi");
    }

    #[test]
    fn test_json_mode_sets_response_format() {
        let mut ctx = Context::new("Classify.", "yes");
        ctx.json_output = true;
        let json = serde_json::to_value(build_request(&ctx, "gpt-4o-mini")).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["temperature"], 0.0);
    }

    #[test]
    fn test_chat_response_parsing() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"{\"intent_type\":\"greeting_smalltalk\"}"}}],"model":"gpt-4o-mini","usage":{"total_tokens":42}}"#;
        let resp: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        let content = resp.choices.unwrap()[0].message.as_ref().unwrap().content.clone();
        assert!(content.contains("greeting_smalltalk"));
        assert_eq!(resp.usage.unwrap().total_tokens, Some(42));
    }
}
