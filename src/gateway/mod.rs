//! Gateway: turns one inbound message into one reply.
//!
//! Messages from the same user are processed one at a time: the session
//! snapshot read at the start of a turn and the patch written at the end
//! never interleave with another turn for that user. Different users run
//! fully in parallel.

mod classifier;
mod disambiguation;
mod dispatch;
mod extract;
mod phrases;
mod pipeline;
mod router;
mod targeting;

pub use classifier::IntentClassifier;
pub use dispatch::Dispatcher;
pub use pipeline::{Pipeline, ProcessOutcome};
pub use router::{route, RouteDecision};

use chrono::NaiveDateTime;
use concierge_core::{error::ConciergeError, message::IncomingMessage, traits::SessionStore};
use serde::Serialize;
use serde_json::json;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

const APOLOGY: &str = "Sorry, something went wrong on my side. Please try again.";

/// What the transport sends back to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayReply {
    pub reply: String,
    pub route: String,
}

pub struct Gateway {
    pipeline: Pipeline,
    sessions: Arc<dyn SessionStore>,
    history_turns: usize,
    /// One lock per user with a turn in flight.
    active_users: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Gateway {
    pub fn new(pipeline: Pipeline, sessions: Arc<dyn SessionStore>, history_turns: usize) -> Self {
        Self {
            pipeline,
            sessions,
            history_turns,
            active_users: Mutex::new(HashMap::new()),
        }
    }

    /// Process a message and always produce a reply.
    pub async fn handle(&self, message: IncomingMessage) -> GatewayReply {
        let user_lock = {
            let mut users = self.active_users.lock().await;
            users
                .entry(message.user_id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        let result = {
            let _turn = user_lock.lock().await;
            self.process_locked(&message).await
        };
        drop(user_lock);
        self.release(&message.user_id).await;

        match result {
            Ok(reply) => reply,
            Err(e) => {
                error!("turn failed for {}: {e}", message.user_id);
                GatewayReply {
                    reply: APOLOGY.to_string(),
                    route: "error".to_string(),
                }
            }
        }
    }

    async fn process_locked(&self, message: &IncomingMessage) -> Result<GatewayReply, ConciergeError> {
        let user_id = &message.user_id;
        let state = self.sessions.get(user_id).await?;
        let history = self
            .sessions
            .recent_history(user_id, self.history_turns)
            .await?;

        let outcome = self
            .pipeline
            .process_message(message, &state, &history)
            .await;

        self.sessions.upsert(user_id, &outcome.state_updates).await?;
        if let Err(e) = self
            .sessions
            .append_exchange(user_id, &message.text, &outcome.reply_text, &outcome.chosen_route)
            .await
        {
            warn!("failed to record history for {user_id}: {e}");
        }

        Ok(GatewayReply {
            reply: outcome.reply_text,
            route: outcome.chosen_route,
        })
    }

    /// Drop the user's lock entry once no turn holds it.
    async fn release(&self, user_id: &str) {
        let mut users = self.active_users.lock().await;
        if users
            .get(user_id)
            .is_some_and(|l| Arc::strong_count(l) == 1)
        {
            users.remove(user_id);
        }
    }

    /// Number of users with a turn in flight or queued.
    pub async fn active_user_count(&self) -> usize {
        self.active_users.lock().await.len()
    }
}

/// Route plus the entities the dispatcher would extract, for debugging.
pub fn inspect(message: &str, local_now: NaiveDateTime) -> serde_json::Value {
    let decision = route(message);
    let hints = extract::extract_event_hints(message);
    info!("inspect: {} -> {}", message, decision.as_str());
    json!({
        "route": decision,
        "when": dispatch::resolve_when(message, local_now)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string()),
        "duration_minutes": extract::extract_duration(message),
        "event_title": hints.title,
        "person": hints.person,
        "task_title": extract::extract_task_title(message),
        "reminder_text": extract::extract_reminder_text(message),
        "gmail_sender": extract::extract_gmail_search_sender(message),
        "contact": extract::extract_contact_name(message),
        "document": extract::extract_document_name(message),
    })
}

#[cfg(test)]
mod tests;
