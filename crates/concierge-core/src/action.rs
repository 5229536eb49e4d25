//! Normalized action vocabulary shared by the dispatcher and capability services.
//!
//! Every downstream call is one `Action` variant, so adding an action is a
//! compile error in every `match` that forgot about it.

use crate::session::DocumentRef;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One integration area served by a capability service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Calendar,
    Tasks,
    Gmail,
    Reminders,
    Contacts,
    Drive,
    Documents,
    WebSearch,
}

impl Domain {
    pub const ALL: [Domain; 8] = [
        Domain::Calendar,
        Domain::Tasks,
        Domain::Gmail,
        Domain::Reminders,
        Domain::Contacts,
        Domain::Drive,
        Domain::Documents,
        Domain::WebSearch,
    ];

    /// Config/wire key (e.g. `web_search`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Calendar => "calendar",
            Self::Tasks => "tasks",
            Self::Gmail => "gmail",
            Self::Reminders => "reminders",
            Self::Contacts => "contacts",
            Self::Drive => "drive",
            Self::Documents => "documents",
            Self::WebSearch => "web_search",
        }
    }

    /// Human-readable service name used in replies.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Calendar => "Google Calendar",
            Self::Tasks => "Google Tasks",
            Self::Gmail => "Gmail",
            Self::Reminders => "reminders",
            Self::Contacts => "Google Contacts",
            Self::Drive => "Google Drive",
            Self::Documents => "documents",
            Self::WebSearch => "web search",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == key)
    }
}

/// A normalized action handed to exactly one capability service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    DailyBriefing {
        date: NaiveDate,
    },
    CalendarRead {
        from: NaiveDateTime,
        to: NaiveDateTime,
    },
    CalendarCreate {
        title: String,
        start: NaiveDateTime,
        duration_minutes: i64,
        attendee: Option<String>,
    },
    CalendarUpdate {
        event_id: String,
        title: String,
        new_start: Option<NaiveDateTime>,
        duration_minutes: Option<i64>,
    },
    CalendarDelete {
        event_id: String,
        title: String,
    },
    TaskCreate {
        title: String,
        due: Option<NaiveDateTime>,
    },
    TaskComplete {
        task_id: String,
        title: String,
        list: Option<String>,
    },
    TaskDelete {
        task_id: String,
        title: String,
        list: Option<String>,
    },
    GmailCheck,
    GmailSearch {
        sender: Option<String>,
        query: String,
    },
    GmailMarkRead,
    GmailCompose {
        instruction: String,
        document: Option<DocumentRef>,
    },
    ReminderCreate {
        text: String,
        due: NaiveDateTime,
        /// Skip the duplicate check (the user already confirmed).
        #[serde(default)]
        force: bool,
    },
    ReminderSnooze {
        until: NaiveDateTime,
    },
    ContactLookup {
        name: String,
    },
    DriveSearch {
        query: String,
    },
    DocumentIngest {
        url: Option<String>,
        filename: Option<String>,
    },
    DocumentList,
    DocumentRecall {
        name: String,
    },
    DocumentQna {
        document: DocumentRef,
        question: String,
        summary: bool,
    },
    WebSearch {
        query: String,
    },
}

impl Action {
    /// The capability that owns this action.
    pub fn domain(&self) -> Domain {
        match self {
            Self::DailyBriefing { .. }
            | Self::CalendarRead { .. }
            | Self::CalendarCreate { .. }
            | Self::CalendarUpdate { .. }
            | Self::CalendarDelete { .. } => Domain::Calendar,
            Self::TaskCreate { .. } | Self::TaskComplete { .. } | Self::TaskDelete { .. } => {
                Domain::Tasks
            }
            Self::GmailCheck
            | Self::GmailSearch { .. }
            | Self::GmailMarkRead
            | Self::GmailCompose { .. } => Domain::Gmail,
            Self::ReminderCreate { .. } | Self::ReminderSnooze { .. } => Domain::Reminders,
            Self::ContactLookup { .. } => Domain::Contacts,
            Self::DriveSearch { .. } => Domain::Drive,
            Self::DocumentIngest { .. }
            | Self::DocumentList
            | Self::DocumentRecall { .. }
            | Self::DocumentQna { .. } => Domain::Documents,
            Self::WebSearch { .. } => Domain::WebSearch,
        }
    }

    /// Short description used in yes/no confirmation prompts.
    pub fn describe(&self) -> String {
        match self {
            Self::CalendarDelete { title, .. } => format!("delete the event \"{title}\""),
            Self::CalendarUpdate {
                title, new_start, ..
            } => match new_start {
                Some(start) => format!(
                    "move \"{title}\" to {}",
                    start.format("%a %-d %b %H:%M")
                ),
                None => format!("update \"{title}\""),
            },
            Self::CalendarCreate { title, start, .. } => {
                format!("create \"{title}\" on {}", start.format("%a %-d %b %H:%M"))
            }
            Self::TaskDelete { title, .. } => format!("delete the task \"{title}\""),
            Self::TaskComplete { title, .. } => format!("mark \"{title}\" as done"),
            Self::ReminderCreate { text, due, .. } => format!(
                "set another reminder \"{text}\" for {}",
                due.format("%a %-d %b %H:%M")
            ),
            other => format!("run {}", other.domain().label()),
        }
    }
}

/// A structured lookup used to find update/delete targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchQuery {
    CalendarEvents {
        from: NaiveDateTime,
        to: NaiveDateTime,
    },
    OpenTasks,
}

/// An event attendee as reported by the calendar service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// One item a search returned (a calendar event or a task).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub title: String,
    /// Task list (or calendar) the item lives in.
    #[serde(default)]
    pub source_list: Option<String>,
    #[serde(default)]
    pub start: Option<NaiveDateTime>,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
}

impl Candidate {
    /// One-line rendering for numbered lists.
    pub fn display_line(&self) -> String {
        let mut line = self.title.clone();
        if let Some(start) = self.start {
            line.push_str(&format!(" — {}", start.format("%a %-d %b %H:%M")));
        }
        if let Some(list) = &self.source_list {
            line.push_str(&format!(" ({list})"));
        }
        line
    }
}

/// Successful result of a capability call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilityReply {
    /// Chat-formatted text for the user.
    pub message: String,
    #[serde(default)]
    pub effect: Option<ReplyEffect>,
}

impl CapabilityReply {
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            message: text.into(),
            effect: None,
        }
    }
}

/// Side information a capability hands back for session bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplyEffect {
    /// A document became the active one (upload or recall).
    Document(DocumentRef),
    /// A summary of the active document, worth caching.
    Summary { text: String },
    /// Creation was skipped because a near-identical reminder exists.
    DuplicateReminder { text: String, due: NaiveDateTime },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_action_serializes_with_type_tag() {
        let action = Action::ReminderCreate {
            text: "call mom".into(),
            due: at(18, 0),
            force: false,
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "reminder_create");
        assert_eq!(json["text"], "call mom");
        assert_eq!(action.domain(), Domain::Reminders);
    }

    #[test]
    fn test_domain_from_key() {
        assert_eq!(Domain::from_key("web_search"), Some(Domain::WebSearch));
        assert_eq!(Domain::from_key("fax"), None);
    }

    #[test]
    fn test_candidate_display_line() {
        let c = Candidate {
            id: "e1".into(),
            title: "Weekly Sync".into(),
            source_list: None,
            start: Some(at(14, 30)),
            attendees: vec![],
        };
        assert_eq!(c.display_line(), "Weekly Sync — Mon 2 Mar 14:30");
    }
}
