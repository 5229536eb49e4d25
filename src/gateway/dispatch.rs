//! Route/intent → one capability call → reply text plus a session patch.
//!
//! Capability errors never leave this module: each one becomes a reply.

use super::{
    disambiguation::present_choices,
    extract::{
        extract_contact_name, extract_doc_question, extract_document_name, extract_drive_query,
        extract_duration, extract_event_hints, extract_event_title, extract_gmail_search_query,
        extract_gmail_search_sender, extract_new_time_phrase, extract_reminder_text,
        extract_task_reference, extract_task_title, extract_web_query, is_summary_request, TaskRef,
    },
    router::{RouteDecision, TaskAction},
    targeting::{
        all_same_title, find_event_target, find_task_target, is_generic_title, TargetOutcome,
        TargetQuery,
    },
};
use crate::timeparse::{extract_day, extract_time_from_string, parse_natural_time};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use concierge_capabilities::Capabilities;
use concierge_core::{
    action::{Action, Candidate, CapabilityReply, Domain, ReplyEffect, SearchQuery},
    config::DispatchConfig,
    error::CapabilityError,
    message::Attachment,
    session::{
        ContactsSearch, FieldUpdate, PendingSlots, SessionPatch, SessionState, SlotDraft,
        TargetedAction, TasksSnapshot,
    },
};
use tracing::{info, warn};

/// Everything a handler needs to know about the current turn.
pub struct Turn<'a> {
    pub user_id: &'a str,
    pub text: &'a str,
    /// Session state with stale pending fields already dropped.
    pub state: &'a SessionState,
    pub now: DateTime<Utc>,
    /// Wall-clock time in the assistant's timezone.
    pub local_now: NaiveDateTime,
}

/// Reply text plus the session update it implies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reply {
    pub text: String,
    pub patch: SessionPatch,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            patch: SessionPatch::default(),
        }
    }

    fn with_patch(text: impl Into<String>, patch: SessionPatch) -> Self {
        Self {
            text: text.into(),
            patch,
        }
    }
}

/// User-facing text for a capability failure.
pub fn error_reply(err: &CapabilityError) -> String {
    match err {
        CapabilityError::OAuthNotConnected { service } => format!(
            "Your {service} account isn't connected yet. Please connect it and then try again."
        ),
        CapabilityError::OAuthExpired { service } => format!(
            "Your {service} connection has expired. Please reconnect it and then try again."
        ),
        CapabilityError::NotFound(what) => format!("I couldn't find that: {what}."),
        CapabilityError::Upstream(_) => {
            "Sorry, I couldn't complete that right now. Please try again in a moment.".to_string()
        }
        CapabilityError::Timeout { service } => {
            format!("{service} is taking too long to respond. Please try again in a moment.")
        }
        CapabilityError::NotConfigured { service } => {
            format!("{service} isn't set up for this assistant yet.")
        }
    }
}

/// Day plus clock when both are named ("friday 3pm"), otherwise the
/// general parser.
pub fn resolve_when(text: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    match (extract_day(text, now.date()), extract_time_from_string(text)) {
        (Some(day), Some(time)) => Some(day.and_time(time)),
        _ => parse_natural_time(text, now),
    }
}

fn start_of(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN)
}

/// Range a calendar read covers.
pub fn calendar_read_window(text: &str, now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    let lower = text.to_lowercase();
    let today = now.date();
    let next_monday =
        today + Duration::days(7 - i64::from(today.weekday().num_days_from_monday()));

    if ["next 7 days", "next seven days", "coming 7 days", "coming week"]
        .iter()
        .any(|p| lower.contains(p))
    {
        return (now, now + Duration::days(7));
    }
    if lower.contains("next week") {
        let from = start_of(next_monday);
        return (from, from + Duration::days(7));
    }
    if lower.contains("this week") || lower.contains("rest of the week") {
        return (now, start_of(next_monday));
    }
    let day = extract_day(text, today).unwrap_or(today);
    let from = start_of(day);
    (from, from + Duration::days(1))
}

fn numbered(items: &[Candidate], offset: usize) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {}", offset + i + 1, c.display_line()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn clear_pending_slots() -> SessionPatch {
    SessionPatch {
        pending_slots: FieldUpdate::Clear,
        ..Default::default()
    }
}

pub struct Dispatcher {
    capabilities: Capabilities,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(capabilities: Capabilities, config: DispatchConfig) -> Self {
        Self {
            capabilities,
            config,
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    async fn call(&self, user_id: &str, action: &Action) -> Result<CapabilityReply, CapabilityError> {
        let capability = self.capabilities.get(action.domain())?;
        capability.perform(user_id, action).await
    }

    async fn search(
        &self,
        user_id: &str,
        domain: Domain,
        query: &SearchQuery,
    ) -> Result<Vec<Candidate>, CapabilityError> {
        self.capabilities.get(domain)?.search(user_id, query).await
    }

    /// Perform one action and fold its effect into the session patch.
    pub async fn run(&self, turn: &Turn<'_>, action: Action) -> Reply {
        let domain = action.domain();
        match self.call(turn.user_id, &action).await {
            Ok(reply) => settle(turn, reply),
            Err(e) => {
                warn!("{} failed for {}: {e}", domain.as_str(), turn.user_id);
                Reply::text(error_reply(&e))
            }
        }
    }

    /// Handle a deterministic route. `CancelAction` and `NoMatch` are
    /// resolved by the pipeline before this is reached.
    pub async fn dispatch_route(&self, turn: &Turn<'_>, route: RouteDecision) -> Reply {
        match route {
            RouteDecision::DailyBriefing => {
                self.run(turn, Action::DailyBriefing { date: turn.local_now.date() })
                    .await
            }
            RouteDecision::Tasks {
                action, show_rest, ..
            } => self.tasks(turn, action, show_rest).await,
            RouteDecision::CalendarRead => {
                let (from, to) = calendar_read_window(turn.text, turn.local_now);
                self.run(turn, Action::CalendarRead { from, to }).await
            }
            RouteDecision::CalendarCreate => self.calendar_create(turn).await,
            RouteDecision::CalendarUpdate => self.calendar_update(turn).await,
            RouteDecision::CalendarDelete => {
                self.calendar_target(turn, TargetedAction::CalendarDelete, turn.text)
                    .await
            }
            RouteDecision::GmailCheck => self.run(turn, Action::GmailCheck).await,
            RouteDecision::GmailSearch => {
                let sender = extract_gmail_search_sender(turn.text);
                let query = extract_gmail_search_query(turn.text)
                    .or_else(|| sender.clone())
                    .unwrap_or_else(|| turn.text.to_string());
                self.run(turn, Action::GmailSearch { sender, query }).await
            }
            RouteDecision::GmailMarkRead => self.run(turn, Action::GmailMarkRead).await,
            RouteDecision::ReminderCreate => self.reminder_create(turn).await,
            RouteDecision::ReminderSnooze => {
                let until = resolve_when(turn.text, turn.local_now)
                    .filter(|t| *t > turn.local_now)
                    .unwrap_or(turn.local_now + Duration::minutes(10));
                self.run(turn, Action::ReminderSnooze { until }).await
            }
            RouteDecision::ContactLookup => self.contact_lookup(turn).await,
            RouteDecision::DriveSearch => {
                let query = extract_drive_query(turn.text);
                self.run(turn, Action::DriveSearch { query }).await
            }
            RouteDecision::DocumentList => self.run(turn, Action::DocumentList).await,
            RouteDecision::DocumentRecall => match extract_document_name(turn.text) {
                Some(name) => self.run(turn, Action::DocumentRecall { name }).await,
                None => Reply::text("Which document should I open? Tell me its name."),
            },
            RouteDecision::DocumentQna => self.document_qna(turn).await,
            RouteDecision::WebSearch => {
                let query = extract_web_query(turn.text);
                self.run(turn, Action::WebSearch { query }).await
            }
            RouteDecision::CancelAction => cancel(turn.state),
            RouteDecision::NoMatch => Reply::text(HELP_TEXT),
        }
    }

    // --- tasks ---

    async fn tasks(&self, turn: &Turn<'_>, action: TaskAction, show_rest: bool) -> Reply {
        match action {
            TaskAction::Create => match extract_task_title(turn.text) {
                Some(title) => {
                    let due = resolve_when(turn.text, turn.local_now);
                    self.run(turn, Action::TaskCreate { title, due }).await
                }
                None => Reply::text("What should the task say?"),
            },
            TaskAction::Read if show_rest => self.task_rest(turn).await,
            TaskAction::Read => self.task_list(turn, false).await,
            TaskAction::ReadAll => self.task_list(turn, true).await,
            TaskAction::Complete => self.task_target(turn, TargetedAction::TaskComplete).await,
            TaskAction::Delete => self.task_target(turn, TargetedAction::TaskDelete).await,
        }
    }

    async fn task_list(&self, turn: &Turn<'_>, show_all: bool) -> Reply {
        let items = match self
            .search(turn.user_id, Domain::Tasks, &SearchQuery::OpenTasks)
            .await
        {
            Ok(items) => items,
            Err(e) => return Reply::text(error_reply(&e)),
        };
        if items.is_empty() {
            return Reply::text("You have no open tasks.");
        }

        let shown = if show_all {
            items.len()
        } else {
            items.len().min(self.config.task_page_size.max(1))
        };
        let mut text = format!("Your tasks:\n{}", numbered(&items[..shown], 0));
        let remaining = items.len() - shown;
        if remaining > 0 {
            text.push_str(&format!(
                "\n…and {remaining} more. Say \"show the rest\" to see them."
            ));
        }
        let patch = SessionPatch {
            tasks_snapshot: FieldUpdate::Set(TasksSnapshot {
                items,
                shown,
                taken_at: turn.now,
            }),
            ..Default::default()
        };
        Reply::with_patch(text, patch)
    }

    async fn task_rest(&self, turn: &Turn<'_>) -> Reply {
        let Some(snapshot) = &turn.state.tasks_snapshot else {
            return self.task_list(turn, false).await;
        };
        if snapshot.shown >= snapshot.items.len() {
            return Reply::text("That's all your tasks.");
        }
        let end = snapshot
            .items
            .len()
            .min(snapshot.shown + self.config.task_page_size.max(1));
        let mut text = numbered(&snapshot.items[snapshot.shown..end], snapshot.shown);
        let remaining = snapshot.items.len() - end;
        if remaining > 0 {
            text.push_str(&format!("\n…and {remaining} more."));
        }
        let patch = SessionPatch {
            tasks_snapshot: FieldUpdate::Set(TasksSnapshot {
                shown: end,
                ..snapshot.clone()
            }),
            ..Default::default()
        };
        Reply::with_patch(text, patch)
    }

    async fn task_target(&self, turn: &Turn<'_>, targeted: TargetedAction) -> Reply {
        match extract_task_reference(turn.text) {
            None => Reply::text("Which task? Give me its number from your list or its name."),
            Some(TaskRef::Index(n)) => {
                let Some(snapshot) = &turn.state.tasks_snapshot else {
                    return Reply::text(
                        "I don't have a numbered task list for you yet. Say \"show my tasks\" first.",
                    );
                };
                match n.checked_sub(1).and_then(|i| snapshot.items.get(i)) {
                    Some(task) => self.finish_target(turn, targeted, task.clone()).await,
                    None => Reply::text(format!(
                        "There's no task {n} in your last list (1-{}).",
                        snapshot.items.len()
                    )),
                }
            }
            Some(TaskRef::Title(title)) => {
                let tasks = match self
                    .search(turn.user_id, Domain::Tasks, &SearchQuery::OpenTasks)
                    .await
                {
                    Ok(tasks) => tasks,
                    Err(e) => return Reply::text(error_reply(&e)),
                };
                let query = TargetQuery {
                    title: Some(title),
                    ..Default::default()
                };
                match find_task_target(tasks, &query) {
                    TargetOutcome::Found(task) => self.finish_target(turn, targeted, task).await,
                    TargetOutcome::NotFound(criteria) => {
                        Reply::text(format!("I couldn't find an open task {criteria}."))
                    }
                    TargetOutcome::Ambiguous(candidates) => {
                        let allow_all = targeted == TargetedAction::TaskComplete
                            && all_same_title(&candidates);
                        ask_choice(turn, candidates, targeted, allow_all)
                    }
                }
            }
        }
    }

    // --- calendar ---

    async fn calendar_create(&self, turn: &Turn<'_>) -> Reply {
        let hints = extract_event_hints(turn.text);
        let attendee = hints.person;
        let title = extract_event_title(turn.text, attendee.as_deref()).unwrap_or_else(|| {
            attendee
                .as_ref()
                .map(|p| format!("Meeting with {p}"))
                .unwrap_or_else(|| "Meeting".to_string())
        });
        let duration_minutes =
            extract_duration(turn.text).unwrap_or(self.config.default_event_minutes);

        match resolve_when(turn.text, turn.local_now) {
            Some(start) => {
                self.run(
                    turn,
                    Action::CalendarCreate {
                        title,
                        start,
                        duration_minutes,
                        attendee,
                    },
                )
                .await
            }
            None => {
                let ask = format!("When should I schedule \"{title}\"?");
                let patch = SessionPatch {
                    pending_slots: FieldUpdate::Set(PendingSlots {
                        draft: SlotDraft::CalendarEvent {
                            title,
                            attendee,
                            duration_minutes,
                        },
                        created_at: turn.now,
                    }),
                    ..Default::default()
                };
                Reply::with_patch(ask, patch)
            }
        }
    }

    async fn calendar_update(&self, turn: &Turn<'_>) -> Reply {
        let phrase = extract_new_time_phrase(turn.text);
        let new_start = phrase
            .as_deref()
            .and_then(|p| resolve_when(p, turn.local_now));
        let duration_minutes = extract_duration(turn.text);
        if new_start.is_none() && duration_minutes.is_none() {
            return Reply::text("What time should I move it to?");
        }

        // The day before the new-time phrase names the event's current day.
        let lower = turn.text.to_lowercase();
        let head = phrase
            .as_deref()
            .and_then(|p| lower.rfind(&p.to_lowercase()))
            .map_or(lower.as_str(), |i| &lower[..i]);
        self.calendar_target(
            turn,
            TargetedAction::CalendarUpdate {
                new_start,
                duration_minutes,
            },
            head,
        )
        .await
    }

    /// Find the event `targeted` applies to. `day_text` is the part of the
    /// message that may name the event's day.
    async fn calendar_target(
        &self,
        turn: &Turn<'_>,
        targeted: TargetedAction,
        day_text: &str,
    ) -> Reply {
        let hints = extract_event_hints(turn.text);
        let query = TargetQuery {
            id: None,
            title: hints.title,
            person: hints.person,
            date: extract_day(day_text, turn.local_now.date()),
        };
        let specific_title = query.title.as_deref().is_some_and(|t| !is_generic_title(t));
        if !specific_title && query.person.is_none() && query.date.is_none() {
            return Reply::text("Which event? Tell me its name, who it's with, or the day.");
        }

        let calendar = match self.capabilities.get(Domain::Calendar) {
            Ok(c) => c,
            Err(e) => return Reply::text(error_reply(&e)),
        };
        let outcome = find_event_target(
            calendar.as_ref(),
            turn.user_id,
            &query,
            turn.local_now,
            self.config.search_window_days,
        )
        .await;
        match outcome {
            Ok(TargetOutcome::Found(event)) => self.finish_target(turn, targeted, event).await,
            Ok(TargetOutcome::NotFound(criteria)) => {
                Reply::text(format!("I couldn't find an event {criteria} in your calendar."))
            }
            Ok(TargetOutcome::Ambiguous(events)) => ask_choice(turn, events, targeted, false),
            Err(e) => {
                warn!("calendar search failed for {}: {e}", turn.user_id);
                Reply::text(error_reply(&e))
            }
        }
    }

    /// Act on a single resolved target, asking first for deletes.
    async fn finish_target(
        &self,
        turn: &Turn<'_>,
        targeted: TargetedAction,
        target: Candidate,
    ) -> Reply {
        let action = targeted.bind(&target);
        let is_delete = matches!(
            targeted,
            TargetedAction::CalendarDelete | TargetedAction::TaskDelete
        );
        if is_delete && self.config.confirm_deletes {
            let ask = format!("Should I {}? Reply yes or no.", action.describe());
            return Reply::with_patch(ask, SessionPatch::confirm(action, turn.now));
        }
        self.run(turn, action).await
    }

    /// Apply the disambiguated action to every chosen candidate. Deletes
    /// still go through the yes/no confirmation.
    pub async fn resolve_selected(
        &self,
        turn: &Turn<'_>,
        targeted: &TargetedAction,
        chosen: Vec<Candidate>,
    ) -> Reply {
        let mut texts = Vec::with_capacity(chosen.len());
        let mut patch = SessionPatch {
            pending_disambiguation: FieldUpdate::Clear,
            ..Default::default()
        };
        for candidate in chosen {
            let reply = self.finish_target(turn, targeted.clone(), candidate).await;
            texts.push(reply.text);
            patch = patch.merge(reply.patch);
        }
        Reply::with_patch(texts.join("\n"), patch)
    }

    // --- reminders, slots ---

    pub async fn reminder_create(&self, turn: &Turn<'_>) -> Reply {
        let Some(text) = extract_reminder_text(turn.text) else {
            return Reply::text("What should I remind you about?");
        };
        match resolve_when(turn.text, turn.local_now) {
            Some(due) => {
                self.run(
                    turn,
                    Action::ReminderCreate {
                        text,
                        due,
                        force: false,
                    },
                )
                .await
            }
            None => {
                let ask = format!("When should I remind you to {text}?");
                let patch = SessionPatch {
                    pending_slots: FieldUpdate::Set(PendingSlots {
                        draft: SlotDraft::Reminder { text },
                        created_at: turn.now,
                    }),
                    ..Default::default()
                };
                Reply::with_patch(ask, patch)
            }
        }
    }

    /// Finish a create that was waiting for its time.
    pub async fn complete_slots(
        &self,
        turn: &Turn<'_>,
        slots: &PendingSlots,
        when: NaiveDateTime,
    ) -> Reply {
        let action = match &slots.draft {
            SlotDraft::Reminder { text } => Action::ReminderCreate {
                text: text.clone(),
                due: when,
                force: false,
            },
            SlotDraft::CalendarEvent {
                title,
                attendee,
                duration_minutes,
            } => Action::CalendarCreate {
                title: title.clone(),
                start: when,
                duration_minutes: *duration_minutes,
                attendee: attendee.clone(),
            },
        };
        let reply = self.run(turn, action).await;
        Reply::with_patch(reply.text, clear_pending_slots().merge(reply.patch))
    }

    // --- confirmations ---

    pub async fn confirm_yes(&self, turn: &Turn<'_>) -> Reply {
        let clear = SessionPatch {
            confirmation_pending: FieldUpdate::Clear,
            ..Default::default()
        };
        let Some(pending) = &turn.state.confirmation_pending else {
            return Reply::with_patch("There's nothing waiting for a yes right now.", clear);
        };
        info!("confirmed for {}: {}", turn.user_id, pending.action.describe());
        let reply = self.run(turn, pending.action.clone()).await;
        Reply::with_patch(reply.text, clear.merge(reply.patch))
    }

    pub fn confirm_no(&self) -> Reply {
        Reply::with_patch(
            "Okay, I won't.",
            SessionPatch {
                confirmation_pending: FieldUpdate::Clear,
                ..Default::default()
            },
        )
    }

    // --- contacts, documents, email ---

    async fn contact_lookup(&self, turn: &Turn<'_>) -> Reply {
        let Some(name) = extract_contact_name(turn.text) else {
            return Reply::text("Whose contact details do you need?");
        };
        let reply = self
            .run(turn, Action::ContactLookup { name: name.clone() })
            .await;
        let patch = SessionPatch {
            contacts_search_results: FieldUpdate::Set(ContactsSearch {
                name,
                created_at: turn.now,
            }),
            ..Default::default()
        };
        Reply::with_patch(reply.text, patch.merge(reply.patch))
    }

    pub async fn ingest_document(&self, turn: &Turn<'_>, attachment: &Attachment) -> Reply {
        let action = Action::DocumentIngest {
            url: attachment.url.clone(),
            filename: attachment.filename.clone(),
        };
        self.run(turn, action).await
    }

    pub async fn document_qna(&self, turn: &Turn<'_>) -> Reply {
        let Some(document) = turn.state.last_doc.clone() else {
            return Reply::text("Please send me the document first.");
        };
        let summary = is_summary_request(turn.text);
        if summary {
            if let Some(cached) = &turn.state.last_doc_summary {
                return Reply::text(cached.clone());
            }
        }
        let question = extract_doc_question(turn.text);
        self.run(
            turn,
            Action::DocumentQna {
                document,
                question,
                summary,
            },
        )
        .await
    }

    pub async fn email_compose(&self, turn: &Turn<'_>) -> Reply {
        let action = Action::GmailCompose {
            instruction: turn.text.to_string(),
            document: turn.state.last_doc.clone(),
        };
        self.run(turn, action).await
    }
}

pub const HELP_TEXT: &str = "I can help with your calendar, tasks, Gmail, reminders, contacts, \
     Drive and documents. Try \"what's on my calendar tomorrow?\" or \"remind me to call mom at 6pm\".";

/// Clear every multi-turn field.
pub fn cancel(state: &SessionState) -> Reply {
    let text = if state.has_pending() || state.contacts_search_results.is_some() {
        "Okay, cancelled."
    } else {
        "Nothing to cancel."
    };
    Reply::with_patch(text, SessionPatch::clear_all_pending())
}

fn ask_choice(
    turn: &Turn<'_>,
    candidates: Vec<Candidate>,
    targeted: TargetedAction,
    allow_all: bool,
) -> Reply {
    let (text, pending) = present_choices(candidates, targeted, allow_all, turn.now);
    Reply::with_patch(text, SessionPatch::disambiguate(pending))
}

fn settle(turn: &Turn<'_>, reply: CapabilityReply) -> Reply {
    match reply.effect {
        None => Reply::text(reply.message),
        Some(ReplyEffect::Document(doc)) => {
            Reply::with_patch(reply.message, SessionPatch::new_document(doc))
        }
        Some(ReplyEffect::Summary { text }) => Reply::with_patch(
            reply.message,
            SessionPatch {
                last_doc_summary: FieldUpdate::Set(text),
                ..Default::default()
            },
        ),
        Some(ReplyEffect::DuplicateReminder { text, due }) => Reply::with_patch(
            format!(
                "{}\nDo you want me to set another one anyway?",
                reply.message
            ),
            SessionPatch::confirm(
                Action::ReminderCreate {
                    text,
                    due,
                    force: true,
                },
                turn.now,
            ),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_error_reply_asks_to_reconnect() {
        let text = error_reply(&CapabilityError::OAuthExpired {
            service: "Google Calendar".into(),
        });
        assert!(text.contains("reconnect"));
        assert!(text.contains("Google Calendar"));
        let text = error_reply(&CapabilityError::OAuthNotConnected {
            service: "Gmail".into(),
        });
        assert!(text.contains("isn't connected"));
        let text = error_reply(&CapabilityError::Upstream("502".into()));
        assert!(text.contains("try again"));
        assert!(!text.contains("502"));
    }

    #[test]
    fn test_resolve_when_combines_day_and_clock() {
        // Monday 10:00.
        let now = at(2026, 3, 2, 10, 0);
        assert_eq!(resolve_when("friday 3pm", now), Some(at(2026, 3, 6, 15, 0)));
        assert_eq!(resolve_when("in 2 hours", now), Some(at(2026, 3, 2, 12, 0)));
        assert_eq!(resolve_when("whenever", now), None);
    }

    #[test]
    fn test_calendar_read_windows() {
        let now = at(2026, 3, 4, 10, 0); // Wednesday
        let (from, to) = calendar_read_window("what's on my calendar today", now);
        assert_eq!((from, to), (at(2026, 3, 4, 0, 0), at(2026, 3, 5, 0, 0)));

        let (from, to) = calendar_read_window("what do I have next week", now);
        assert_eq!((from, to), (at(2026, 3, 9, 0, 0), at(2026, 3, 16, 0, 0)));

        let (from, to) = calendar_read_window("my schedule this week", now);
        assert_eq!((from, to), (now, at(2026, 3, 9, 0, 0)));

        let (from, to) = calendar_read_window("events in the next 7 days", now);
        assert_eq!(to - from, Duration::days(7));

        let (from, _) = calendar_read_window("what's on tomorrow", now);
        assert_eq!(from, at(2026, 3, 5, 0, 0));
    }

    #[test]
    fn test_cancel_reply() {
        let idle = cancel(&SessionState::default());
        assert_eq!(idle.text, "Nothing to cancel.");
        assert_eq!(idle.patch, SessionPatch::clear_all_pending());
    }
}
