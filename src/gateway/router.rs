//! Deterministic phrase router.
//!
//! `route` is pure: no I/O and no session state. Anything it cannot place
//! comes back as `RouteDecision::NoMatch` and goes to the classifier.

use super::phrases::*;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskAction {
    Read,
    ReadAll,
    Create,
    Complete,
    Delete,
}

/// Coarse decision for one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteDecision {
    DailyBriefing,
    Tasks {
        action: TaskAction,
        show_all: bool,
        show_rest: bool,
    },
    CalendarRead,
    CalendarCreate,
    CalendarUpdate,
    CalendarDelete,
    GmailCheck,
    GmailSearch,
    GmailMarkRead,
    ReminderCreate,
    ReminderSnooze,
    ContactLookup,
    DriveSearch,
    DocumentQna,
    DocumentList,
    DocumentRecall,
    WebSearch,
    CancelAction,
    #[serde(rename = "none")]
    NoMatch,
}

impl RouteDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DailyBriefing => "daily_briefing",
            Self::Tasks { .. } => "tasks",
            Self::CalendarRead => "calendar_read",
            Self::CalendarCreate => "calendar_create",
            Self::CalendarUpdate => "calendar_update",
            Self::CalendarDelete => "calendar_delete",
            Self::GmailCheck => "gmail_check",
            Self::GmailSearch => "gmail_search",
            Self::GmailMarkRead => "gmail_mark_read",
            Self::ReminderCreate => "reminder_create",
            Self::ReminderSnooze => "reminder_snooze",
            Self::ContactLookup => "contact_lookup",
            Self::DriveSearch => "drive_search",
            Self::DocumentQna => "document_qna",
            Self::DocumentList => "document_list",
            Self::DocumentRecall => "document_recall",
            Self::WebSearch => "web_search",
            Self::CancelAction => "cancel_action",
            Self::NoMatch => "none",
        }
    }

    fn tasks(action: TaskAction) -> Self {
        Self::Tasks {
            action,
            show_all: action == TaskAction::ReadAll,
            show_rest: false,
        }
    }
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("valid phrase pattern"))
        .collect()
}

static TASK_SHOW_REST_RE: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile(TASK_SHOW_REST_PATTERNS));
static CALENDAR_READ_RE: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(CALENDAR_READ_PATTERNS));
static CONTACT_RE: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(CONTACT_PATTERNS));
static DOCUMENT_RECALL_RE: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile(DOCUMENT_RECALL_PATTERNS));
static DOCUMENT_QNA_RE: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile(DOCUMENT_QNA_PATTERNS));

static TASK_COMPLETE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:please\s+)?(?:mark|complete|finish|tick off|check off)\b.*\btasks?\b")
        .expect("valid regex")
});

static CALENDAR_DELETE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?:please\s+)?(?:can you\s+)?(?:cancel|delete|remove)\b.*\b{EVENT_NOUNS}\b"
    ))
    .expect("valid regex")
});

static CALENDAR_UPDATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?:please\s+)?(?:can you\s+)?(?:move|push|shift|bump|change|update)\b.*\b{EVENT_NOUNS}\b"
    ))
    .expect("valid regex")
});

static CALENDAR_CREATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:please\s+)?(?:can you\s+)?(?:schedule|book)\b").expect("valid regex")
});

static WEB_SEARCH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:google|search for|look up)\s+\S").expect("valid regex")
});

/// Lowercase, straighten apostrophes, collapse whitespace.
pub fn normalize(msg: &str) -> String {
    msg.replace(['\u{2019}', '\u{2018}'], "'")
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Check if any phrase in the list is contained in the lowercased message.
pub(super) fn kw_match(msg_lower: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| msg_lower.contains(p))
}

fn any_regex(msg_lower: &str, patterns: &[Regex]) -> bool {
    patterns.iter().any(|re| re.is_match(msg_lower))
}

/// `phrase` opens `msg` and ends on a word boundary.
fn starts_with_phrase(msg: &str, phrase: &str) -> bool {
    msg.strip_prefix(phrase)
        .is_some_and(|rest| rest.chars().next().is_none_or(|c| !c.is_alphanumeric()))
}

/// Whether the message is an abort.
pub fn is_cancel(msg: &str) -> bool {
    let lower = normalize(msg);
    let bare = lower.trim_end_matches(['.', '!', '?', ',', ' ']);
    CANCEL_EXACT.contains(&bare) || CANCEL_AT_START.iter().any(|p| starts_with_phrase(bare, p))
}

fn route_tasks(m: &str) -> Option<RouteDecision> {
    if kw_match(m, TASK_CREATE) {
        return Some(RouteDecision::tasks(TaskAction::Create));
    }
    if kw_match(m, TASK_DELETE) {
        return Some(RouteDecision::tasks(TaskAction::Delete));
    }
    if kw_match(m, TASK_COMPLETE) || TASK_COMPLETE_RE.is_match(m) {
        return Some(RouteDecision::tasks(TaskAction::Complete));
    }
    if kw_match(m, TASK_SHOW_ALL) {
        return Some(RouteDecision::tasks(TaskAction::ReadAll));
    }
    if kw_match(m, TASK_SHOW_REST) || any_regex(m, &TASK_SHOW_REST_RE) {
        return Some(RouteDecision::Tasks {
            action: TaskAction::Read,
            show_all: false,
            show_rest: true,
        });
    }
    if kw_match(m, TASK_READ) {
        return Some(RouteDecision::tasks(TaskAction::Read));
    }
    None
}

fn route_calendar(m: &str) -> Option<RouteDecision> {
    // Mutations first: "reschedule" contains "schedule", and "cancel my
    // meeting" carries no read phrase at all.
    if kw_match(m, CALENDAR_DELETE) || CALENDAR_DELETE_RE.is_match(m) {
        return Some(RouteDecision::CalendarDelete);
    }
    if kw_match(m, CALENDAR_UPDATE) || CALENDAR_UPDATE_RE.is_match(m) {
        return Some(RouteDecision::CalendarUpdate);
    }
    if kw_match(m, CALENDAR_CREATE) || CALENDAR_CREATE_RE.is_match(m) {
        return Some(RouteDecision::CalendarCreate);
    }
    if kw_match(m, CALENDAR_READ) || any_regex(m, &CALENDAR_READ_RE) {
        return Some(RouteDecision::CalendarRead);
    }
    None
}

fn route_gmail(m: &str) -> Option<RouteDecision> {
    if kw_match(m, GMAIL_MARK_READ) {
        Some(RouteDecision::GmailMarkRead)
    } else if kw_match(m, GMAIL_SEARCH) {
        Some(RouteDecision::GmailSearch)
    } else if kw_match(m, GMAIL_CHECK) {
        Some(RouteDecision::GmailCheck)
    } else {
        None
    }
}

fn route_reminders(m: &str) -> Option<RouteDecision> {
    if kw_match(m, REMINDER_SNOOZE) {
        Some(RouteDecision::ReminderSnooze)
    } else if kw_match(m, REMINDER_CREATE) {
        Some(RouteDecision::ReminderCreate)
    } else {
        None
    }
}

fn route_documents(m: &str) -> Option<RouteDecision> {
    if kw_match(m, DOCUMENT_LIST) {
        Some(RouteDecision::DocumentList)
    } else if any_regex(m, &DOCUMENT_RECALL_RE) {
        Some(RouteDecision::DocumentRecall)
    } else if kw_match(m, DOCUMENT_QNA) || any_regex(m, &DOCUMENT_QNA_RE) {
        Some(RouteDecision::DocumentQna)
    } else {
        None
    }
}

/// Map a raw message to a route. Evaluation order is fixed: cancel,
/// briefing, tasks, calendar, gmail, reminders, contacts, drive, documents,
/// web search.
pub fn route(message: &str) -> RouteDecision {
    if is_cancel(message) {
        return RouteDecision::CancelAction;
    }

    let m = normalize(message);
    if m.is_empty() {
        return RouteDecision::NoMatch;
    }

    if kw_match(&m, BRIEFING) {
        return RouteDecision::DailyBriefing;
    }
    if let Some(r) = route_tasks(&m) {
        return r;
    }
    if let Some(r) = route_calendar(&m) {
        return r;
    }
    if let Some(r) = route_gmail(&m) {
        return r;
    }
    if let Some(r) = route_reminders(&m) {
        return r;
    }
    if any_regex(&m, &CONTACT_RE) {
        return RouteDecision::ContactLookup;
    }
    if kw_match(&m, DRIVE) {
        return RouteDecision::DriveSearch;
    }
    if let Some(r) = route_documents(&m) {
        return r;
    }
    if kw_match(&m, WEB_SEARCH) || WEB_SEARCH_RE.is_match(&m) {
        return RouteDecision::WebSearch;
    }
    RouteDecision::NoMatch
}
