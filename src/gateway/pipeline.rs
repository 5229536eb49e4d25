//! One turn: session snapshot in, reply text and session patch out.

use super::{
    classifier::{IntentClassifier, IntentType},
    disambiguation::{looks_like_choice, resolve_choice, ChoiceError},
    dispatch::{cancel, resolve_when, Dispatcher, Reply, Turn, HELP_TEXT},
    router::{route, RouteDecision},
};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use chrono_tz::Tz;
use concierge_core::{
    context::{Context, ContextEntry},
    message::IncomingMessage,
    session::{FieldUpdate, SessionPatch, SessionState},
    traits::Provider,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

const CONTEXT_LOST: &str = "I don't have that context anymore, please repeat your request.";

/// Result of processing one message.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutcome {
    pub reply_text: String,
    pub state_updates: SessionPatch,
    pub chosen_route: String,
}

/// A routed request supersedes any open multi-turn question.
fn clear_multi_turn() -> SessionPatch {
    SessionPatch {
        confirmation_pending: FieldUpdate::Clear,
        pending_slots: FieldUpdate::Clear,
        pending_disambiguation: FieldUpdate::Clear,
        ..Default::default()
    }
}

fn greeting_reply(text: &str, name: &str) -> String {
    if text.to_lowercase().contains("thank") {
        return "You're welcome!".to_string();
    }
    format!("Hi! I'm {name}. {HELP_TEXT}")
}

pub struct Pipeline {
    dispatcher: Dispatcher,
    classifier: IntentClassifier,
    /// Free-text fallback for everything the router and classifier hand off.
    orchestrator: Option<Arc<dyn Provider>>,
    tz: Tz,
    assistant_name: String,
}

impl Pipeline {
    pub fn new(
        dispatcher: Dispatcher,
        classifier: IntentClassifier,
        orchestrator: Option<Arc<dyn Provider>>,
        tz: Tz,
        assistant_name: &str,
    ) -> Self {
        Self {
            dispatcher,
            classifier,
            orchestrator,
            tz,
            assistant_name: assistant_name.to_string(),
        }
    }

    pub async fn process_message(
        &self,
        message: &IncomingMessage,
        state: &SessionState,
        history: &[ContextEntry],
    ) -> ProcessOutcome {
        self.process_at(message, state, history, Utc::now()).await
    }

    /// Same as [`Pipeline::process_message`] with an explicit clock.
    pub async fn process_at(
        &self,
        message: &IncomingMessage,
        state: &SessionState,
        history: &[ContextEntry],
        now: DateTime<Utc>,
    ) -> ProcessOutcome {
        let config = self.dispatcher.config();
        let ttl = Duration::seconds(config.disambiguation_ttl_secs);

        // Expire stale pending fields before anything reads them.
        let mut expired =
            state.stale_pending_patch(now, Duration::seconds(config.stale_pending_secs));
        let lost_round = state
            .pending_disambiguation
            .as_ref()
            .filter(|_| state.fresh_disambiguation(now, ttl).is_none());
        if lost_round.is_some() {
            expired.pending_disambiguation = FieldUpdate::Clear;
        }
        let mut effective = state.clone();
        expired.apply(&mut effective);

        let local_now = now.with_timezone(&self.tz).naive_local();
        let turn = Turn {
            user_id: &message.user_id,
            text: message.text.trim(),
            state: &effective,
            now,
            local_now,
        };

        let answers_lost_round = lost_round.is_some_and(|r| looks_like_choice(turn.text, r));
        let (reply, chosen_route) = self
            .decide(&turn, message, history, answers_lost_round)
            .await;
        info!("{}: route={chosen_route}", message.user_id);

        ProcessOutcome {
            reply_text: reply.text,
            state_updates: expired.merge(reply.patch),
            chosen_route,
        }
    }

    async fn decide(
        &self,
        turn: &Turn<'_>,
        message: &IncomingMessage,
        history: &[ContextEntry],
        answers_lost_round: bool,
    ) -> (Reply, String) {
        if let Some(attachment) = message.document() {
            let reply = self.dispatcher.ingest_document(turn, attachment).await;
            return (reply, "document_ingest".to_string());
        }

        let decision = route(turn.text);
        match decision {
            RouteDecision::CancelAction => {
                return (cancel(turn.state), decision.as_str().to_string());
            }
            RouteDecision::NoMatch => {}
            routed => {
                let reply = self.dispatcher.dispatch_route(turn, routed).await;
                let reply = Reply {
                    text: reply.text,
                    patch: clear_multi_turn().merge(reply.patch),
                };
                return (reply, routed.as_str().to_string());
            }
        }

        if let Some(reply) = self.answer_choice(turn).await {
            return (reply, "disambiguation".to_string());
        }
        if answers_lost_round {
            return (Reply::text(CONTEXT_LOST), "disambiguation_expired".to_string());
        }

        if let Some(slots) = &turn.state.pending_slots {
            if let Some(when) = resolve_when(turn.text, turn.local_now) {
                let reply = self.dispatcher.complete_slots(turn, slots, when).await;
                return (reply, "slot_fill".to_string());
            }
        }

        let intent = self
            .classifier
            .classify(turn.text, history, turn.state)
            .await;
        debug!(
            "{}: classified {} ({:.2}): {}",
            turn.user_id,
            intent.intent_type.as_str(),
            intent.confidence,
            intent.reason
        );

        let reply = match intent.intent_type {
            IntentType::ConfirmationYes => self.dispatcher.confirm_yes(turn).await,
            IntentType::ConfirmationNo => self.dispatcher.confirm_no(),
            IntentType::DocAction => self.dispatcher.document_qna(turn).await,
            IntentType::SimpleReminder => self.dispatcher.reminder_create(turn).await,
            IntentType::GreetingSmalltalk => {
                Reply::text(greeting_reply(turn.text, &self.assistant_name))
            }
            IntentType::EmailAction => self.dispatcher.email_compose(turn).await,
            IntentType::HandoffToOrchestrator => {
                Reply::text(self.orchestrate(turn, history).await)
            }
        };
        (reply, intent.intent_type.as_str().to_string())
    }

    /// Resolve a reply against the open disambiguation round, if it reads
    /// like an answer to it.
    async fn answer_choice(&self, turn: &Turn<'_>) -> Option<Reply> {
        let pending = turn.state.pending_disambiguation.as_ref()?;
        if !looks_like_choice(turn.text, pending) {
            return None;
        }
        let ttl = Duration::seconds(self.dispatcher.config().disambiguation_ttl_secs);
        let reply = match resolve_choice(turn.text, Some(pending), turn.now, ttl) {
            Ok(chosen) => {
                self.dispatcher
                    .resolve_selected(turn, &pending.action, chosen)
                    .await
            }
            Err(ChoiceError::OutOfRange { max }) => Reply::text(format!(
                "Please reply with a number between 1 and {max}."
            )),
            Err(ChoiceError::StillAmbiguous) => {
                Reply::text("That matches more than one of them. Please reply with the number.")
            }
            Err(ChoiceError::AllNotAllowed) => Reply::text("Please pick just one of them by number."),
            Err(ChoiceError::Declined) => Reply {
                text: "Okay, I'll leave them as they are.".to_string(),
                patch: SessionPatch {
                    pending_disambiguation: FieldUpdate::Clear,
                    ..Default::default()
                },
            },
            Err(e @ (ChoiceError::NoPending | ChoiceError::Stale | ChoiceError::NoMatch)) => {
                warn!("{}: choice could not be resolved: {e}", turn.user_id);
                Reply {
                    text: CONTEXT_LOST.to_string(),
                    patch: SessionPatch {
                        pending_disambiguation: FieldUpdate::Clear,
                        ..Default::default()
                    },
                }
            }
        };
        Some(reply)
    }

    async fn orchestrate(&self, turn: &Turn<'_>, history: &[ContextEntry]) -> String {
        let Some(provider) = &self.orchestrator else {
            return HELP_TEXT.to_string();
        };
        let ctx = Context::new(&self.system_prompt(turn.local_now), turn.text).with_history(history);
        match provider.complete(&ctx).await {
            Ok(completion) if !completion.text.trim().is_empty() => {
                completion.text.trim().to_string()
            }
            Ok(_) => HELP_TEXT.to_string(),
            Err(e) => {
                warn!("orchestrator {} failed: {e}", provider.name());
                HELP_TEXT.to_string()
            }
        }
    }

    fn system_prompt(&self, local_now: NaiveDateTime) -> String {
        format!(
            "You are {}, a personal assistant chatting on WhatsApp. \
             Reply briefly in plain text without markdown headings. \
             It is {} in the user's timezone ({}). \
             You cannot change calendars, tasks, email or reminders from this reply; \
             if the user wants that, tell them how to ask (for example \
             \"remind me to call mom at 6pm\").",
            self.assistant_name,
            local_now.format("%A %-d %B %Y, %H:%M"),
            self.tz.name()
        )
    }
}
