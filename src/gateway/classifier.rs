//! Intent classification for messages the phrase router could not place.
//!
//! Whatever backend answers (a reasoning provider or the local heuristics),
//! `enforce_contract` runs last and has the final say.

use super::{
    phrases::{DOC_REFERENCES, EMAIL_ACTION_PATTERNS, GREETINGS, NO_WORDS, REMINDER_HINTS, YES_WORDS},
    router::{kw_match, normalize},
};
use concierge_core::{
    config::ClassifierConfig,
    context::{Context, ContextEntry},
    session::SessionState,
    traits::Provider,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    sync::{Arc, LazyLock},
    time::Duration,
};
use tracing::{debug, warn};

static EMAIL_ACTION_RE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    EMAIL_ACTION_PATTERNS
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    ConfirmationYes,
    ConfirmationNo,
    DocAction,
    SimpleReminder,
    GreetingSmalltalk,
    EmailAction,
    HandoffToOrchestrator,
}

impl IntentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfirmationYes => "confirmation_yes",
            Self::ConfirmationNo => "confirmation_no",
            Self::DocAction => "doc_action",
            Self::SimpleReminder => "simple_reminder",
            Self::GreetingSmalltalk => "greeting_smalltalk",
            Self::EmailAction => "email_action",
            Self::HandoffToOrchestrator => "handoff_to_orchestrator",
        }
    }

    fn is_confirmation(&self) -> bool {
        matches!(self, Self::ConfirmationYes | Self::ConfirmationNo)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentClassification {
    pub intent_type: IntentType,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub reason: String,
}

impl IntentClassification {
    fn new(intent_type: IntentType, confidence: f32, reason: &str) -> Self {
        Self {
            intent_type,
            confidence,
            reason: reason.to_string(),
        }
    }

    /// Low-confidence handoff used for every failure path.
    pub fn fallback(reason: &str) -> Self {
        Self::new(IntentType::HandoffToOrchestrator, 0.2, reason)
    }
}

/// Message with trailing punctuation removed, for exact-word checks.
fn bare(message: &str) -> String {
    normalize(message)
        .trim_end_matches(['.', '!', '?', ',', ' '])
        .to_string()
}

pub fn has_email_action(message: &str) -> bool {
    let lower = normalize(message);
    EMAIL_ACTION_RE.iter().any(|re| re.is_match(&lower))
}

pub fn is_greeting(message: &str) -> bool {
    let b = bare(message);
    if GREETINGS.contains(&b.as_str()) {
        return true;
    }
    // "hi there", "hello again!" but not "hi, move my 3pm".
    b.split_whitespace().count() <= 3
        && GREETINGS.iter().any(|g| {
            b.strip_prefix(g)
                .is_some_and(|rest| rest.starts_with(' ') || rest.starts_with(','))
        })
}

pub fn is_yes(message: &str) -> bool {
    YES_WORDS.contains(&bare(message).as_str())
}

pub fn is_no(message: &str) -> bool {
    NO_WORDS.contains(&bare(message).as_str())
}

/// Post-check applied to every classification, in fixed order.
pub fn enforce_contract(
    mut result: IntentClassification,
    message: &str,
    state: &SessionState,
) -> IntentClassification {
    if has_email_action(message) {
        if result.intent_type != IntentType::EmailAction {
            debug!(
                "classifier: email verb overrides {}",
                result.intent_type.as_str()
            );
        }
        return IntentClassification::new(IntentType::EmailAction, 0.95, "email verb present");
    }

    if result.intent_type.is_confirmation() && is_greeting(message) {
        result = IntentClassification::new(IntentType::GreetingSmalltalk, 0.9, "greeting");
    }

    if result.intent_type.is_confirmation() && state.confirmation_pending.is_none() {
        result = IntentClassification::fallback("no confirmation pending");
    }

    if result.intent_type == IntentType::DocAction && state.last_doc.is_none() {
        result = IntentClassification::fallback("no document in session");
    }

    result.confidence = if result.confidence.is_nan() {
        0.0
    } else {
        result.confidence.clamp(0.0, 1.0)
    };
    result
}

/// Deterministic classification used when no provider is configured.
pub fn heuristic_classify(message: &str, state: &SessionState) -> IntentClassification {
    let lower = normalize(message);
    if has_email_action(message) {
        return IntentClassification::new(IntentType::EmailAction, 0.9, "email verb");
    }
    if is_greeting(message) {
        return IntentClassification::new(IntentType::GreetingSmalltalk, 0.9, "greeting");
    }
    if is_yes(message) {
        return IntentClassification::new(IntentType::ConfirmationYes, 0.9, "affirmative");
    }
    if is_no(message) {
        return IntentClassification::new(IntentType::ConfirmationNo, 0.9, "negative");
    }
    if state.last_doc.is_some() && kw_match(&lower, DOC_REFERENCES) {
        return IntentClassification::new(IntentType::DocAction, 0.7, "refers to the document");
    }
    if kw_match(&lower, REMINDER_HINTS) {
        return IntentClassification::new(IntentType::SimpleReminder, 0.6, "reminder wording");
    }
    IntentClassification::new(IntentType::HandoffToOrchestrator, 0.5, "no rule matched")
}

/// Pull the first JSON object out of a provider reply.
pub fn parse_classification(text: &str) -> Option<IntentClassification> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

fn build_prompt(state: &SessionState) -> String {
    let pending = state
        .confirmation_pending
        .as_ref()
        .map(|c| format!("yes, the assistant asked whether to {}", c.action.describe()))
        .unwrap_or_else(|| "no".to_string());
    let doc = state
        .last_doc
        .as_ref()
        .map(|d| format!("yes, \"{}\"", d.title))
        .unwrap_or_else(|| "no".to_string());

    format!(
        "Classify the user's latest WhatsApp message into exactly one intent.\n\n\
         Intents:\n\
         - confirmation_yes / confirmation_no: a yes/no answer to a pending question\n\
         - doc_action: a question or request about the document in the session\n\
         - simple_reminder: a request to be reminded of something\n\
         - greeting_smalltalk: greetings, thanks, questions about the assistant\n\
         - email_action: sending, writing, replying to or forwarding an email\n\
         - handoff_to_orchestrator: anything else\n\n\
         Rules:\n\
         - Any email verb (email, mail, send/draft an email, tell him/her/them, reply to) \
         means email_action even if the message mentions the document.\n\
         - Greetings are never confirmations.\n\n\
         Confirmation pending: {pending}\n\
         Document in session: {doc}\n\n\
         Respond with JSON only: \
         {{\"intent_type\": \"...\", \"confidence\": 0.0-1.0, \"reason\": \"...\"}}"
    )
}

pub struct IntentClassifier {
    provider: Option<Arc<dyn Provider>>,
    timeout: Duration,
    model: Option<String>,
}

impl IntentClassifier {
    /// `provider` is ignored when the classifier is disabled in config.
    pub fn new(provider: Option<Arc<dyn Provider>>, config: &ClassifierConfig) -> Self {
        Self {
            provider: provider.filter(|_| config.enabled),
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
            model: config.model.clone(),
        }
    }

    /// Heuristics only.
    pub fn heuristic() -> Self {
        Self {
            provider: None,
            timeout: Duration::from_secs(1),
            model: None,
        }
    }

    pub async fn classify(
        &self,
        message: &str,
        history: &[ContextEntry],
        state: &SessionState,
    ) -> IntentClassification {
        let raw = if state.confirmation_pending.is_some() && is_yes(message) {
            IntentClassification::new(IntentType::ConfirmationYes, 1.0, "exact yes")
        } else if state.confirmation_pending.is_some() && is_no(message) {
            IntentClassification::new(IntentType::ConfirmationNo, 1.0, "exact no")
        } else {
            match &self.provider {
                Some(provider) => self.ask_provider(provider.as_ref(), message, history, state).await,
                None => heuristic_classify(message, state),
            }
        };
        enforce_contract(raw, message, state)
    }

    async fn ask_provider(
        &self,
        provider: &dyn Provider,
        message: &str,
        history: &[ContextEntry],
        state: &SessionState,
    ) -> IntentClassification {
        let mut ctx = Context::new(&build_prompt(state), message).with_history(history);
        ctx.json_output = true;
        ctx.max_tokens = 200;
        ctx.model = self.model.clone();

        match tokio::time::timeout(self.timeout, provider.complete(&ctx)).await {
            Ok(Ok(completion)) => parse_classification(&completion.text).unwrap_or_else(|| {
                warn!("classifier: unparseable reply from {}", provider.name());
                IntentClassification::fallback("malformed classifier output")
            }),
            Ok(Err(e)) => {
                warn!("classifier: {} failed: {e}", provider.name());
                IntentClassification::fallback("classifier error")
            }
            Err(_) => {
                warn!(
                    "classifier: {} timed out after {}s",
                    provider.name(),
                    self.timeout.as_secs()
                );
                IntentClassification::fallback("classifier timeout")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use concierge_core::{
        action::Action,
        context::Completion,
        error::ConciergeError,
        session::{DocumentRef, PendingConfirmation},
    };

    struct Scripted(Result<&'static str, ()>);

    #[async_trait]
    impl Provider for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }
        async fn complete(&self, _ctx: &Context) -> Result<Completion, ConciergeError> {
            match self.0 {
                Ok(text) => Ok(Completion {
                    text: text.to_string(),
                    ..Default::default()
                }),
                Err(()) => Err(ConciergeError::Provider("boom".into())),
            }
        }
        async fn is_available(&self) -> bool {
            true
        }
    }

    fn with_doc() -> SessionState {
        SessionState {
            last_doc: Some(DocumentRef {
                id: "d1".into(),
                title: "Lease agreement".into(),
                uploaded_at: Utc::now(),
            }),
            ..Default::default()
        }
    }

    fn with_confirmation() -> SessionState {
        SessionState {
            confirmation_pending: Some(PendingConfirmation {
                action: Action::GmailMarkRead,
                created_at: Utc::now(),
            }),
            ..Default::default()
        }
    }

    fn classifier(reply: Result<&'static str, ()>) -> IntentClassifier {
        IntentClassifier {
            provider: Some(Arc::new(Scripted(reply))),
            timeout: Duration::from_secs(5),
            model: None,
        }
    }

    #[tokio::test]
    async fn test_email_verb_beats_doc_action() {
        let c = classifier(Ok(r#"{"intent_type":"doc_action","confidence":0.9,"reason":"doc"}"#));
        let out = c
            .classify(
                "Email Rohan and tell him the document is approved",
                &[],
                &with_doc(),
            )
            .await;
        assert_eq!(out.intent_type, IntentType::EmailAction);
        assert!(out.confidence >= 0.9);
    }

    #[tokio::test]
    async fn test_yes_without_pending_is_not_confirmation() {
        let c = IntentClassifier::heuristic();
        let out = c.classify("yes", &[], &SessionState::default()).await;
        assert_ne!(out.intent_type, IntentType::ConfirmationYes);
        assert_eq!(out.intent_type, IntentType::HandoffToOrchestrator);
    }

    #[tokio::test]
    async fn test_yes_with_pending_short_circuits() {
        let c = classifier(Err(()));
        let out = c.classify("Yes please!", &[], &with_confirmation()).await;
        assert_eq!(out.intent_type, IntentType::ConfirmationYes);
    }

    #[tokio::test]
    async fn test_greeting_never_confirms() {
        let c = classifier(Ok(r#"{"intent_type":"confirmation_yes","confidence":0.8}"#));
        let out = c.classify("hello", &[], &with_confirmation()).await;
        assert_eq!(out.intent_type, IntentType::GreetingSmalltalk);
    }

    #[tokio::test]
    async fn test_doc_action_without_doc_hands_off() {
        let c = classifier(Ok(r#"{"intent_type":"doc_action","confidence":0.9}"#));
        let out = c
            .classify("what does the document say about fees", &[], &SessionState::default())
            .await;
        assert_eq!(out.intent_type, IntentType::HandoffToOrchestrator);
    }

    #[tokio::test]
    async fn test_backend_failure_hands_off_low_confidence() {
        let out = classifier(Err(()))
            .classify("what's the weather like", &[], &SessionState::default())
            .await;
        assert_eq!(out.intent_type, IntentType::HandoffToOrchestrator);
        assert!(out.confidence < 0.5);

        let out = classifier(Ok("I think it's a greeting"))
            .classify("what's the weather like", &[], &SessionState::default())
            .await;
        assert_eq!(out.intent_type, IntentType::HandoffToOrchestrator);
    }

    #[test]
    fn test_parse_classification_with_prose() {
        let parsed = parse_classification(
            "Sure! {\"intent_type\": \"simple_reminder\", \"confidence\": 0.7, \"reason\": \"r\"} done",
        )
        .unwrap();
        assert_eq!(parsed.intent_type, IntentType::SimpleReminder);
        assert!(parse_classification("{\"intent_type\": \"dance\"}").is_none());
    }

    #[test]
    fn test_confidence_clamped() {
        let raw = IntentClassification::new(IntentType::SimpleReminder, 3.5, "r");
        assert_eq!(enforce_contract(raw, "remind me", &SessionState::default()).confidence, 1.0);
        let raw = IntentClassification::new(IntentType::SimpleReminder, f32::NAN, "r");
        assert_eq!(enforce_contract(raw, "remind me", &SessionState::default()).confidence, 0.0);
    }

    #[test]
    fn test_heuristics() {
        let state = with_doc();
        assert_eq!(
            heuristic_classify("what does the contract say about notice", &state).intent_type,
            IntentType::DocAction
        );
        assert_eq!(
            heuristic_classify("hi there", &state).intent_type,
            IntentType::GreetingSmalltalk
        );
        assert_eq!(
            heuristic_classify("ping me about the invoice later", &state).intent_type,
            IntentType::SimpleReminder
        );
        assert!(!is_greeting("hi, move my 3pm to friday please"));
    }
}
