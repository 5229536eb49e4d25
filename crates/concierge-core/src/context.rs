use serde::{Deserialize, Serialize};

/// A single entry in the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    /// "user" or "assistant".
    pub role: String,
    /// The message content.
    pub content: String,
}

impl ContextEntry {
    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }

    pub fn assistant(content: &str) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.to_string(),
        }
    }
}

/// Prompt bundle handed to a reasoning provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    /// System prompt prepended to every request.
    pub system_prompt: String,
    /// Conversation history (oldest first).
    pub history: Vec<ContextEntry>,
    /// The current user message.
    pub current_message: String,
    /// Override the provider's default model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Upper bound on generated tokens.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Ask the provider for a bare JSON object instead of prose.
    #[serde(default)]
    pub json_output: bool,
}

fn default_max_tokens() -> u32 {
    1024
}

/// A structured message for API-based providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    /// "user" or "assistant".
    pub role: String,
    /// The message content.
    pub content: String,
}

/// Text produced by a provider plus bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub text: String,
    pub model: Option<String>,
    pub tokens_used: Option<u64>,
    pub processing_time_ms: u64,
}

impl Context {
    /// Create a context with a system prompt and the current message.
    pub fn new(system_prompt: &str, message: &str) -> Self {
        Self {
            system_prompt: system_prompt.to_string(),
            history: Vec::new(),
            current_message: message.to_string(),
            model: None,
            max_tokens: default_max_tokens(),
            json_output: false,
        }
    }

    /// Attach prior turns (oldest first).
    pub fn with_history(mut self, history: &[ContextEntry]) -> Self {
        self.history = history.to_vec();
        self
    }

    /// Convert context to structured API messages.
    ///
    /// Returns `(system_prompt, messages)`. The system prompt is separated
    /// because the Anthropic API requires it outside the messages array.
    /// Consecutive entries with the same role are merged so the sequence
    /// alternates.
    pub fn to_api_messages(&self) -> (String, Vec<ApiMessage>) {
        let mut messages: Vec<ApiMessage> = Vec::with_capacity(self.history.len() + 1);
        let entries = self
            .history
            .iter()
            .map(|e| (e.role.as_str(), e.content.as_str()))
            .chain(std::iter::once(("user", self.current_message.as_str())));

        for (role, content) in entries {
            let role = if role == "assistant" { "assistant" } else { "user" };
            match messages.last_mut() {
                Some(last) if last.role == role => {
                    last.content.push_str("\n\n");
                    last.content.push_str(content);
                }
                _ => messages.push(ApiMessage {
                    role: role.to_string(),
                    content: content.to_string(),
                }),
            }
        }

        // The API rejects a leading assistant turn.
        if messages.first().is_some_and(|m| m.role == "assistant") {
            messages.remove(0);
        }

        (self.system_prompt.clone(), messages)
    }
}
