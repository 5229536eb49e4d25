//! Per-user conversation state and the partial-update patch applied to it.
//!
//! The gateway reads one `SessionState` snapshot at the start of a turn and
//! produces one `SessionPatch` at the end. Fields a patch does not touch are
//! left as they are in the store.

use crate::action::{Action, Candidate};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reference to the document the user most recently uploaded or recalled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub id: String,
    pub title: String,
    pub uploaded_at: DateTime<Utc>,
}

/// An action described to the user and waiting for yes/no.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingConfirmation {
    pub action: Action,
    pub created_at: DateTime<Utc>,
}

/// A create request still missing its time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SlotDraft {
    Reminder {
        text: String,
    },
    CalendarEvent {
        title: String,
        attendee: Option<String>,
        duration_minutes: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSlots {
    pub draft: SlotDraft,
    pub created_at: DateTime<Utc>,
}

/// What to do with the candidate(s) the user picks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetedAction {
    CalendarUpdate {
        new_start: Option<NaiveDateTime>,
        duration_minutes: Option<i64>,
    },
    CalendarDelete,
    TaskComplete,
    TaskDelete,
}

impl TargetedAction {
    /// Bind the action to a concrete candidate.
    pub fn bind(&self, target: &Candidate) -> Action {
        match self {
            Self::CalendarUpdate {
                new_start,
                duration_minutes,
            } => Action::CalendarUpdate {
                event_id: target.id.clone(),
                title: target.title.clone(),
                new_start: *new_start,
                duration_minutes: *duration_minutes,
            },
            Self::CalendarDelete => Action::CalendarDelete {
                event_id: target.id.clone(),
                title: target.title.clone(),
            },
            Self::TaskComplete => Action::TaskComplete {
                task_id: target.id.clone(),
                title: target.title.clone(),
                list: target.source_list.clone(),
            },
            Self::TaskDelete => Action::TaskDelete {
                task_id: target.id.clone(),
                title: target.title.clone(),
                list: target.source_list.clone(),
            },
        }
    }
}

/// One numbered entry of a disambiguation round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMatch {
    pub item: Candidate,
    pub source_list: Option<String>,
    /// 1-based, stable only within its round.
    pub display_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingDisambiguation {
    pub action: TargetedAction,
    pub matches: Vec<CandidateMatch>,
    /// "both"/"all" is accepted (duplicate completion flow).
    #[serde(default)]
    pub allow_all: bool,
    pub timestamp: DateTime<Utc>,
}

/// Indexed task list last shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TasksSnapshot {
    pub items: Vec<Candidate>,
    /// How many items (from the top) have been displayed so far.
    pub shown: usize,
    pub taken_at: DateTime<Utc>,
}

/// Contact lookup kept around for follow-up turns ("email her").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactsSearch {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// The live session row for one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub confirmation_pending: Option<PendingConfirmation>,
    #[serde(default)]
    pub pending_slots: Option<PendingSlots>,
    #[serde(default)]
    pub pending_disambiguation: Option<PendingDisambiguation>,
    #[serde(default)]
    pub last_doc: Option<DocumentRef>,
    #[serde(default)]
    pub last_doc_summary: Option<String>,
    #[serde(default)]
    pub tasks_snapshot: Option<TasksSnapshot>,
    #[serde(default)]
    pub contacts_search_results: Option<ContactsSearch>,
}

fn is_older(ts: DateTime<Utc>, now: DateTime<Utc>, max_age: Duration) -> bool {
    now.signed_duration_since(ts) > max_age
}

impl SessionState {
    /// Whether any multi-turn question is outstanding.
    pub fn has_pending(&self) -> bool {
        self.confirmation_pending.is_some()
            || self.pending_slots.is_some()
            || self.pending_disambiguation.is_some()
    }

    /// The disambiguation round, unless it is older than `ttl`.
    pub fn fresh_disambiguation(
        &self,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Option<&PendingDisambiguation> {
        self.pending_disambiguation
            .as_ref()
            .filter(|d| !is_older(d.timestamp, now, ttl))
    }

    /// Pending slots, unless older than `ttl`.
    pub fn fresh_slots(&self, now: DateTime<Utc>, ttl: Duration) -> Option<&PendingSlots> {
        self.pending_slots
            .as_ref()
            .filter(|s| !is_older(s.created_at, now, ttl))
    }

    /// Patch clearing every pending field untouched for longer than `max_age`.
    pub fn stale_pending_patch(&self, now: DateTime<Utc>, max_age: Duration) -> SessionPatch {
        let mut patch = SessionPatch::default();
        if let Some(c) = &self.confirmation_pending {
            if is_older(c.created_at, now, max_age) {
                patch.confirmation_pending = FieldUpdate::Clear;
            }
        }
        if let Some(s) = &self.pending_slots {
            if is_older(s.created_at, now, max_age) {
                patch.pending_slots = FieldUpdate::Clear;
            }
        }
        if let Some(d) = &self.pending_disambiguation {
            if is_older(d.timestamp, now, max_age) {
                patch.pending_disambiguation = FieldUpdate::Clear;
            }
        }
        if let Some(c) = &self.contacts_search_results {
            if is_older(c.created_at, now, max_age) {
                patch.contacts_search_results = FieldUpdate::Clear;
            }
        }
        patch
    }
}

/// Update for a single nullable field.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FieldUpdate<T> {
    #[default]
    Keep,
    Set(T),
    Clear,
}

impl<T: Clone> FieldUpdate<T> {
    fn apply_to(&self, slot: &mut Option<T>) {
        match self {
            Self::Keep => {}
            Self::Set(v) => *slot = Some(v.clone()),
            Self::Clear => *slot = None,
        }
    }

    fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }

    fn overlay(&mut self, later: FieldUpdate<T>) {
        if !later.is_keep() {
            *self = later;
        }
    }
}

/// Partial session update produced by one turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionPatch {
    pub confirmation_pending: FieldUpdate<PendingConfirmation>,
    pub pending_slots: FieldUpdate<PendingSlots>,
    pub pending_disambiguation: FieldUpdate<PendingDisambiguation>,
    pub last_doc: FieldUpdate<DocumentRef>,
    pub last_doc_summary: FieldUpdate<String>,
    pub tasks_snapshot: FieldUpdate<TasksSnapshot>,
    pub contacts_search_results: FieldUpdate<ContactsSearch>,
}

impl SessionPatch {
    /// Clear every multi-turn field in one update.
    pub fn clear_all_pending() -> Self {
        Self {
            confirmation_pending: FieldUpdate::Clear,
            pending_slots: FieldUpdate::Clear,
            pending_disambiguation: FieldUpdate::Clear,
            contacts_search_results: FieldUpdate::Clear,
            ..Default::default()
        }
    }

    /// Ask a yes/no question. Drops any open disambiguation.
    pub fn confirm(action: Action, now: DateTime<Utc>) -> Self {
        Self {
            confirmation_pending: FieldUpdate::Set(PendingConfirmation {
                action,
                created_at: now,
            }),
            pending_disambiguation: FieldUpdate::Clear,
            ..Default::default()
        }
    }

    /// Open a disambiguation round. Drops any pending confirmation.
    pub fn disambiguate(pending: PendingDisambiguation) -> Self {
        Self {
            pending_disambiguation: FieldUpdate::Set(pending),
            confirmation_pending: FieldUpdate::Clear,
            ..Default::default()
        }
    }

    /// Make `doc` the active document and drop the cached summary.
    pub fn new_document(doc: DocumentRef) -> Self {
        Self {
            last_doc: FieldUpdate::Set(doc),
            last_doc_summary: FieldUpdate::Clear,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Layer `later` on top of `self`; fields `later` sets win.
    pub fn merge(mut self, later: SessionPatch) -> Self {
        self.confirmation_pending.overlay(later.confirmation_pending);
        self.pending_slots.overlay(later.pending_slots);
        self.pending_disambiguation
            .overlay(later.pending_disambiguation);
        self.last_doc.overlay(later.last_doc);
        self.last_doc_summary.overlay(later.last_doc_summary);
        self.tasks_snapshot.overlay(later.tasks_snapshot);
        self.contacts_search_results
            .overlay(later.contacts_search_results);
        self
    }

    /// Apply to a state in place, keeping the confirmation/disambiguation
    /// exclusivity: whichever one this patch sets clears the other.
    pub fn apply(&self, state: &mut SessionState) {
        self.confirmation_pending
            .apply_to(&mut state.confirmation_pending);
        self.pending_slots.apply_to(&mut state.pending_slots);
        self.pending_disambiguation
            .apply_to(&mut state.pending_disambiguation);
        self.last_doc.apply_to(&mut state.last_doc);
        self.last_doc_summary.apply_to(&mut state.last_doc_summary);
        self.tasks_snapshot.apply_to(&mut state.tasks_snapshot);
        self.contacts_search_results
            .apply_to(&mut state.contacts_search_results);

        if matches!(self.pending_disambiguation, FieldUpdate::Set(_)) {
            state.confirmation_pending = None;
        } else if matches!(self.confirmation_pending, FieldUpdate::Set(_)) {
            state.pending_disambiguation = None;
        }
    }
}
