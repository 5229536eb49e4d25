//! Reminders served from the local store.

use async_trait::async_trait;
use concierge_core::{
    action::{Action, CapabilityReply, Domain, ReplyEffect},
    error::CapabilityError,
    traits::Capability,
};
use concierge_memory::{ReminderOutcome, Store};
use tracing::info;

const WHEN_FORMAT: &str = "%a %-d %b at %H:%M";

pub struct ReminderCapability {
    store: Store,
}

impl ReminderCapability {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

fn storage_error(e: impl std::fmt::Display) -> CapabilityError {
    CapabilityError::Upstream(format!("reminders: {e}"))
}

#[async_trait]
impl Capability for ReminderCapability {
    fn domain(&self) -> Domain {
        Domain::Reminders
    }

    async fn perform(
        &self,
        user_id: &str,
        action: &Action,
    ) -> Result<CapabilityReply, CapabilityError> {
        match action {
            Action::ReminderCreate { text, due, force } => {
                let outcome = self
                    .store
                    .create_reminder(user_id, text, *due, *force)
                    .await
                    .map_err(storage_error)?;
                match outcome {
                    ReminderOutcome::Created(r) => {
                        info!("reminder {} created for {user_id}", r.id);
                        Ok(CapabilityReply::message(format!(
                            "Got it. I'll remind you to {} on {}.",
                            r.text,
                            r.due_at.format(WHEN_FORMAT)
                        )))
                    }
                    ReminderOutcome::Duplicate(existing) => Ok(CapabilityReply {
                        message: format!(
                            "You already have a reminder \"{}\" on {}.",
                            existing.text,
                            existing.due_at.format(WHEN_FORMAT)
                        ),
                        effect: Some(ReplyEffect::DuplicateReminder {
                            text: text.clone(),
                            due: *due,
                        }),
                    }),
                }
            }
            Action::ReminderSnooze { until } => {
                let snoozed = self
                    .store
                    .snooze_reminder(user_id, *until)
                    .await
                    .map_err(storage_error)?;
                match snoozed {
                    Some(r) => Ok(CapabilityReply::message(format!(
                        "Snoozed \"{}\" until {}.",
                        r.text,
                        r.due_at.format(WHEN_FORMAT)
                    ))),
                    None => Err(CapabilityError::NotFound(
                        "no reminder to snooze".to_string(),
                    )),
                }
            }
            other => Err(CapabilityError::Upstream(format!(
                "reminders cannot {}",
                other.describe()
            ))),
        }
    }
}
