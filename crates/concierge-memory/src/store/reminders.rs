//! Reminder CRUD, duplicate detection and snooze.

use super::Store;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use concierge_core::error::ConciergeError;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

const DUE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Window within which a similar reminder counts as a duplicate.
const DUPLICATE_WINDOW_MINUTES: i64 = 60;

/// How long after delivery a sent reminder can still be snoozed.
const SNOOZE_SENT_WINDOW_MINUTES: i64 = 60;

/// Delivery state of a reminder. Only an external scheduler moves a reminder
/// out of `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    Pending,
    Sent,
    Failed,
}

impl ReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }

    fn parse(s: &str) -> Self {
        match s {
            "sent" => Self::Sent,
            "failed" => Self::Failed,
            _ => Self::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub user_id: String,
    pub text: String,
    /// Local wall-clock time.
    pub due_at: NaiveDateTime,
    pub status: ReminderStatus,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

/// Result of a create request.
#[derive(Debug, Clone, PartialEq)]
pub enum ReminderOutcome {
    Created(Reminder),
    /// Nothing was written; this existing reminder looks the same.
    Duplicate(Reminder),
}

type ReminderRow = (String, String, String, String, String, Option<String>);

const SELECT_COLUMNS: &str = "SELECT id, user_id, text, due_at, status, last_attempt_at FROM reminders";

fn from_row(row: ReminderRow) -> Result<Reminder, ConciergeError> {
    let (id, user_id, text, due_at, status, last_attempt_at) = row;
    let due_at = NaiveDateTime::parse_from_str(&due_at, DUE_FORMAT)
        .map_err(|e| ConciergeError::Memory(format!("bad due_at on reminder {id}: {e}")))?;
    let last_attempt_at = last_attempt_at
        .and_then(|ts| NaiveDateTime::parse_from_str(&ts, DUE_FORMAT).ok())
        .map(|ts| ts.and_utc());
    Ok(Reminder {
        id,
        user_id,
        text,
        due_at,
        status: ReminderStatus::parse(&status),
        last_attempt_at,
    })
}

impl Store {
    /// Create a reminder unless a near-identical pending one exists:
    /// same user, same or similar text, due within an hour of `due_at`.
    /// `force` skips the check.
    pub async fn create_reminder(
        &self,
        user_id: &str,
        text: &str,
        due_at: NaiveDateTime,
        force: bool,
    ) -> Result<ReminderOutcome, ConciergeError> {
        if !force {
            if let Some(existing) = self.find_duplicate_reminder(user_id, text, due_at).await? {
                info!("reminder dedup: {} matches new request", existing.id);
                return Ok(ReminderOutcome::Duplicate(existing));
            }
        }

        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO reminders (id, user_id, text, due_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(user_id)
            .bind(text)
            .bind(due_at.format(DUE_FORMAT).to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| ConciergeError::Memory(format!("create reminder failed: {e}")))?;

        Ok(ReminderOutcome::Created(Reminder {
            id,
            user_id: user_id.to_string(),
            text: text.to_string(),
            due_at,
            status: ReminderStatus::Pending,
            last_attempt_at: None,
        }))
    }

    async fn find_duplicate_reminder(
        &self,
        user_id: &str,
        text: &str,
        due_at: NaiveDateTime,
    ) -> Result<Option<Reminder>, ConciergeError> {
        let lo = due_at - Duration::minutes(DUPLICATE_WINDOW_MINUTES);
        let hi = due_at + Duration::minutes(DUPLICATE_WINDOW_MINUTES);
        let rows: Vec<ReminderRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ? AND status = 'pending' \
             AND due_at BETWEEN ? AND ? ORDER BY due_at"
        ))
        .bind(user_id)
        .bind(lo.format(DUE_FORMAT).to_string())
        .bind(hi.format(DUE_FORMAT).to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ConciergeError::Memory(format!("reminder dedup check failed: {e}")))?;

        for row in rows {
            let reminder = from_row(row)?;
            if texts_match(text, &reminder.text) {
                return Ok(Some(reminder));
            }
        }
        Ok(None)
    }

    /// Pending reminders for a user, soonest first.
    pub async fn pending_reminders(&self, user_id: &str) -> Result<Vec<Reminder>, ConciergeError> {
        let rows: Vec<ReminderRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ? AND status = 'pending' ORDER BY due_at"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ConciergeError::Memory(format!("list reminders failed: {e}")))?;
        rows.into_iter().map(from_row).collect()
    }

    /// Move the reminder the user is most likely talking about to `until`.
    ///
    /// Targets the next pending reminder; when nothing is pending, the one
    /// delivered most recently, if that was within the last hour. The row is
    /// updated in place and goes back to `pending`; no new row is ever
    /// inserted.
    pub async fn snooze_reminder(
        &self,
        user_id: &str,
        until: NaiveDateTime,
    ) -> Result<Option<Reminder>, ConciergeError> {
        let Some(target) = self.snooze_target(user_id).await? else {
            return Ok(None);
        };

        sqlx::query("UPDATE reminders SET due_at = ?, status = 'pending' WHERE id = ?")
            .bind(until.format(DUE_FORMAT).to_string())
            .bind(&target.id)
            .execute(&self.pool)
            .await
            .map_err(|e| ConciergeError::Memory(format!("snooze reminder failed: {e}")))?;

        Ok(Some(Reminder {
            due_at: until,
            status: ReminderStatus::Pending,
            ..target
        }))
    }

    async fn snooze_target(&self, user_id: &str) -> Result<Option<Reminder>, ConciergeError> {
        if let Some(next) = self.pending_reminders(user_id).await?.into_iter().next() {
            return Ok(Some(next));
        }

        let sent: Option<ReminderRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ? AND status = 'sent' \
             AND last_attempt_at >= datetime('now', ?) \
             ORDER BY last_attempt_at DESC, due_at DESC LIMIT 1"
        ))
        .bind(user_id)
        .bind(format!("-{SNOOZE_SENT_WINDOW_MINUTES} minutes"))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ConciergeError::Memory(format!("snooze lookup failed: {e}")))?;

        sent.map(from_row).transpose()
    }

    /// Record a delivery attempt. Called by the delivery scheduler.
    pub async fn mark_reminder(
        &self,
        id: &str,
        status: ReminderStatus,
    ) -> Result<(), ConciergeError> {
        sqlx::query(
            "UPDATE reminders SET status = ?, last_attempt_at = datetime('now') WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| ConciergeError::Memory(format!("mark reminder failed: {e}")))?;
        Ok(())
    }
}

fn normalize(text: &str) -> String {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Identical after normalization, or similar by significant-word overlap.
pub(super) fn texts_match(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b) || descriptions_are_similar(a, b)
}

/// Word-overlap similarity: at least half the significant words of the
/// shorter text appear in the longer one. Needs three significant words on
/// each side.
pub(super) fn descriptions_are_similar(a: &str, b: &str) -> bool {
    let words_a = significant_words(a);
    let words_b = significant_words(b);

    if words_a.len() < 3 || words_b.len() < 3 {
        return false;
    }

    let (smaller, larger) = if words_a.len() <= words_b.len() {
        (&words_a, &words_b)
    } else {
        (&words_b, &words_a)
    };

    let overlap = smaller.iter().filter(|w| larger.contains(w)).count();
    overlap >= smaller.len().div_ceil(2)
}

fn significant_words(text: &str) -> Vec<String> {
    const STOP_WORDS: &[&str] = &[
        "the", "and", "for", "that", "this", "with", "from", "are", "was", "have", "has", "will",
        "about", "into", "after", "before", "remind", "reminder", "please", "me", "to",
    ];
    text.split(|c: char| !c.is_alphanumeric())
        .map(|w| w.to_lowercase())
        .filter(|w| w.len() >= 3 && !STOP_WORDS.contains(&w.as_str()))
        .collect()
}
