//! Entity extraction from raw messages.
//!
//! Each extractor runs ordered regex alternatives against the original text
//! (case-insensitively, so names keep the user's casing) and returns the
//! first capture, trimmed.

use super::phrases::{
    CONTACT_PATTERNS, DOCUMENT_QNA_PATTERNS, DOCUMENT_RECALL_PATTERNS, GENERIC_TITLES,
    WEB_SEARCH_PREFIXES,
};
use crate::timeparse::parse_duration;
use regex::Regex;
use std::sync::LazyLock;

fn compile_ci(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("(?i){p}")).expect("valid extraction pattern"))
        .collect()
}

static CONTACT_RE: LazyLock<Vec<Regex>> = LazyLock::new(|| compile_ci(CONTACT_PATTERNS));

static DOCUMENT_NAME_RE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let mut patterns = DOCUMENT_RECALL_PATTERNS.to_vec();
    patterns.push(r#"\b(?:called|named|titled)\s+["']?(.+?)["']?\s*[?.!]*$"#);
    compile_ci(&patterns)
});

static DOC_QUESTION_RE: LazyLock<Vec<Regex>> = LazyLock::new(|| compile_ci(DOCUMENT_QNA_PATTERNS));

static GMAIL_SENDER_RE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_ci(&[
        r"\b(?:emails?|e-mails?|mails?|messages?)\s+from\s+(.+?)(?:\s+(?:about|regarding|re|on|since|this|last|today|yesterday|in|with|that)\b.*)?\s*[?.!]*$",
        r"\bdid\s+(.+?)\s+(?:email|e-mail|mail|write|send)(?:ed)?\b",
        r"\bfrom\s+([\w.@+'-]+)",
    ])
});

static GMAIL_QUERY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:about|regarding|re:?)\s+(.+?)\s*[?.!]*$").expect("valid regex")
});

static TASK_INDEX_RE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_ci(&[
        r"\btask\s*(?:#|number\s+|no\.?\s*)?(\d+)\b",
        r"#(\d+)\b",
        r"^(?:please\s+)?(?:mark|complete|finish|tick off|check off|delete|remove)\s+(?:number\s+|no\.?\s*)?(\d+)\b",
    ])
});

static TASK_TITLE_RE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_ci(&[
        r#"^(?:please\s+)?(?:mark|tick off|check off)\s+(?:the\s+)?(?:task\s+)?["']?(.+?)["']?\s+(?:task\s+)?(?:as\s+)?(?:done|complete|completed|finished)\b"#,
        r#"^(?:please\s+)?(?:tick off|check off)\s+(?:the\s+)?(?:task\s+)?["']?(.+?)["']?\s*[.!?]*$"#,
        r#"^(?:please\s+)?(?:complete|finish)\s+(?:the\s+)?(?:task\s+)?["']?(.+?)["']?(?:\s+task)?\s*[.!?]*$"#,
        r#"^(?:please\s+)?(?:delete|remove)\s+(?:the\s+|my\s+)?(?:task\s+)?["']?(.+?)["']?\s+from\s+my\s+(?:tasks|task list|to-?do(?: list)?)\b"#,
        r#"^(?:please\s+)?(?:delete|remove)\s+(?:the\s+|my\s+)?task\s+["']?(.+?)["']?\s*[.!?]*$"#,
        r#"^(?:please\s+)?(?:delete|remove)\s+(?:the\s+|my\s+)?["']?(.+?)["']?\s+task\s*[.!?]*$"#,
        r#"\bdone with\s+(?:the\s+)?(?:task\s+)?["']?(.+?)["']?\s*[.!?]*$"#,
    ])
});

static TASK_CREATE_RE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_ci(&[
        r#"^(?:please\s+)?add\s+["']?(.+?)["']?\s+to\s+my\s+(?:tasks|task list|to-?do(?: list)?)\b"#,
        r"\badd to my (?:tasks|task list|to-?do(?: list)?)\s*[:\-]?\s*(.+)$",
        r"^(?:please\s+)?(?:add|create)\s+(?:a\s+)?(?:new\s+)?task\s*[:\-]?\s*(?:to\s+)?(.+)$",
        r"^(?:please\s+)?new task\s*[:\-]?\s*(.+)$",
    ])
});

static REMINDER_TEXT_RE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_ci(&[
        r"\bremind me\s+(?:at|on|in|tomorrow|tonight|today|next|this)\b.*?\s+to\s+(.+)$",
        r"\bremind me\s+(?:to|about|that)\s+(.+)$",
        r"\b(?:set|create|add)\s+(?:a\s+)?reminder\s+(?:to|for|about)\s+(.+)$",
        r"\breminder\s+(?:to|for|about)\s+(.+)$",
        r"\bdon'?t let me forget\s+(?:to\s+)?(.+)$",
    ])
});

static TIME_PHRASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\s+(?:on|at|by|for|due|before|from))?\s+(?:today|tonight|tomorrow(?:\s+(?:morning|afternoon|evening|night))?|day after tomorrow|this (?:morning|afternoon|evening|week)|(?:next|this)\s+(?:week|month|mon|tue|tues|wed|thu|thur|thurs|fri|sat|sun|monday|tuesday|wednesday|thursday|friday|saturday|sunday)|(?:mon|tues|wednes|thurs|fri|satur|sun)day|in\s+(?:half\s+an?|an?|\d+(?:\.\d+)?)\s*(?:hours?|hrs?|minutes?|mins?)|\d{1,2}(?::\d{2})?\s*(?:am|pm)|\d{1,2}:\d{2}|noon|midnight)\b",
    )
    .expect("valid regex")
});

static CLOCK_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d{1,2}(?::\d{2})?\s*(?:am|pm)\b\s*").expect("valid regex")
});

static PERSON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bwith\s+([a-z][\w.'@-]*)").expect("valid regex")
});

static TARGET_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:please\s+)?(?:can you\s+)?(?:cancel|delete|remove|reschedule|move|push(?:\s+back)?|shift|postpone|change|update|bump|extend|rename|call off)\s+(?:the\s+|my\s+|our\s+|that\s+)?(.+?)(?:\s+(?:with|on|at|to|for|from|by|tomorrow|today|tonight|next|this|until|in)\b.*)?\s*[?.!]*$",
    )
    .expect("valid regex")
});

static CREATE_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:please\s+)?(?:can you\s+)?(?:schedule|book|set\s?up|create|add|put|block(?:\s+off)?(?:\s+time)?(?:\s+for)?)\s+(?:a\s+|an\s+|the\s+|my\s+)?(?:new\s+)?(.+?)(?:\s+(?:with|on|at|for|from|tomorrow|today|tonight|next|this|in|to my calendar|on my calendar)\b.*)?\s*[?.!]*$",
    )
    .expect("valid regex")
});

static NEW_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i).*\b(?:to|until|till)\s+(.+?)\s*[?.!]*$").expect("valid regex")
});

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bfor\s+(half\s+an?\s+hour|an?\s+hour|\d+(?:\.\d+)?\s*(?:hours?|hrs?|h|minutes?|mins?|m)\b(?:\s*(?:and\s+)?\d+\s*(?:minutes?|mins?|m)\b)?)",
    )
    .expect("valid regex")
});

static DRIVE_NOISE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*\b(?:in|on|from)\s+(?:my\s+)?(?:google\s+)?drive\b|\bgoogle drive\b")
        .expect("valid regex")
});

static DRIVE_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:please\s+)?(?:find|search(?:\s+for)?|look\s+for|get|open|show me)\s+(?:me\s+)?(?:the\s+|a\s+|my\s+)?(?:files?\s+)?(?:called\s+|named\s+|about\s+)?")
        .expect("valid regex")
});

/// How the user pointed at a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskRef {
    /// 1-based position in the last task list shown.
    Index(usize),
    Title(String),
}

/// Who and what a calendar mutation refers to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventHints {
    pub title: Option<String>,
    pub person: Option<String>,
}

/// Straighten apostrophes and collapse whitespace, keeping case.
fn clean(msg: &str) -> String {
    msg.replace(['\u{2019}', '\u{2018}'], "'")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn trim_value(s: &str) -> String {
    s.trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '?' | '.' | '!' | ',' | ':'))
        .trim()
        .to_string()
}

fn first_capture(text: &str, patterns: &[Regex]) -> Option<String> {
    patterns
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|c| c.get(1))
        .map(|m| trim_value(m.as_str()))
        .filter(|s| !s.is_empty())
}

fn is_pronoun(s: &str) -> bool {
    matches!(
        s.to_lowercase().as_str(),
        "it" | "this" | "that" | "them" | "these" | "those" | "one"
    )
}

/// Uppercase the first letter of each word.
pub fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remove trailing/embedded time phrases ("tomorrow at 6pm") from a title.
pub fn strip_time_phrases(text: &str) -> String {
    let padded = format!(" {text}");
    let stripped = TIME_PHRASE_RE.replace_all(&padded, "");
    trim_value(&stripped)
}

pub fn extract_gmail_search_sender(msg: &str) -> Option<String> {
    let text = clean(msg);
    first_capture(&text, &GMAIL_SENDER_RE).filter(|s| !is_pronoun(s))
}

pub fn extract_gmail_search_query(msg: &str) -> Option<String> {
    let text = clean(msg);
    first_capture(&text, std::slice::from_ref(&*GMAIL_QUERY_RE))
}

pub fn extract_contact_name(msg: &str) -> Option<String> {
    let text = clean(msg);
    first_capture(&text, &CONTACT_RE).map(|name| title_case(&name))
}

pub fn extract_document_name(msg: &str) -> Option<String> {
    let text = clean(msg);
    first_capture(&text, &DOCUMENT_NAME_RE)
}

/// The topic of a document question, or the whole message.
pub fn extract_doc_question(msg: &str) -> String {
    let text = clean(msg);
    first_capture(&text, &DOC_QUESTION_RE).unwrap_or(text)
}

pub fn is_summary_request(msg: &str) -> bool {
    let lower = msg.to_lowercase();
    ["summar", "tl;dr", "tldr", "key points", "main points", "gist"]
        .iter()
        .any(|k| lower.contains(k))
}

pub fn extract_task_reference(msg: &str) -> Option<TaskRef> {
    let text = clean(msg);
    if let Some(n) = first_capture(&text, &TASK_INDEX_RE).and_then(|n| n.parse().ok()) {
        return Some(TaskRef::Index(n));
    }
    first_capture(&text, &TASK_TITLE_RE)
        .filter(|t| !is_pronoun(t))
        .map(TaskRef::Title)
}

/// Title for a new task, time phrases removed.
pub fn extract_task_title(msg: &str) -> Option<String> {
    let text = clean(msg);
    first_capture(&text, &TASK_CREATE_RE)
        .map(|t| strip_time_phrases(&t))
        .filter(|t| !t.is_empty())
}

/// What to be reminded of, time phrases removed.
pub fn extract_reminder_text(msg: &str) -> Option<String> {
    let text = clean(msg);
    first_capture(&text, &REMINDER_TEXT_RE)
        .map(|t| strip_time_phrases(&t))
        .filter(|t| !t.is_empty())
}

/// `text` with an ASCII `prefix` removed, compared case-insensitively.
fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

/// `text` with an ASCII `suffix` removed, compared case-insensitively.
fn strip_suffix_ci<'a>(text: &'a str, suffix: &str) -> Option<&'a str> {
    let start = text.len().checked_sub(suffix.len())?;
    let tail = text.get(start..)?;
    tail.eq_ignore_ascii_case(suffix).then(|| &text[..start])
}

fn drop_generic_suffix(title: &str) -> String {
    for generic in GENERIC_TITLES {
        if let Some(rest) = strip_suffix_ci(title, &format!(" {generic}")) {
            if !rest.trim().is_empty() {
                return rest.trim().to_string();
            }
        }
    }
    title.to_string()
}

/// Title and person for an update/delete target.
pub fn extract_event_hints(msg: &str) -> EventHints {
    let text = clean(msg);
    let person = PERSON_RE
        .captures(&text)
        .map(|c| trim_value(&c[1]))
        .filter(|p| !matches!(p.to_lowercase().as_str(), "the" | "my" | "a" | "an" | "our"));

    let title = TARGET_TITLE_RE
        .captures(&text)
        .map(|c| CLOCK_TOKEN_RE.replace_all(&c[1], "").to_string())
        .map(|t| drop_generic_suffix(&trim_value(&t)))
        .filter(|t| !t.is_empty() && !is_pronoun(t));

    EventHints { title, person }
}

/// Title for a new event. A generic noun with a person becomes
/// "Call with Priya".
pub fn extract_event_title(msg: &str, person: Option<&str>) -> Option<String> {
    let text = clean(msg);
    let raw = CREATE_TITLE_RE
        .captures(&text)
        .map(|c| trim_value(&CLOCK_TOKEN_RE.replace_all(&c[1], "")))
        .filter(|t| !t.is_empty())?;
    let is_generic = GENERIC_TITLES.contains(&raw.to_lowercase().as_str());
    Some(match person {
        Some(p) if is_generic => format!("{} with {}", title_case(&raw), title_case(p)),
        _ if is_generic => title_case(&raw),
        _ => raw,
    })
}

/// The phrase after the last "to"/"until" ("move it to friday 3pm").
pub fn extract_new_time_phrase(msg: &str) -> Option<String> {
    let text = clean(msg);
    NEW_TIME_RE
        .captures(&text)
        .map(|c| trim_value(&c[1]))
        .filter(|s| !s.is_empty())
}

/// "for 45 minutes" → 45.
pub fn extract_duration(msg: &str) -> Option<i64> {
    let text = clean(msg);
    DURATION_RE
        .captures(&text)
        .and_then(|c| parse_duration(&c[1]))
}

pub fn extract_web_query(msg: &str) -> String {
    let text = clean(msg);
    let query = WEB_SEARCH_PREFIXES
        .iter()
        .find_map(|prefix| strip_prefix_ci(&text, prefix))
        .unwrap_or(&text);
    trim_value(query)
}

pub fn extract_drive_query(msg: &str) -> String {
    let text = clean(msg);
    let without_noise = DRIVE_NOISE_RE.replace_all(&text, "");
    let query = DRIVE_PREFIX_RE.replace(&without_noise, "");
    let query = trim_value(&query);
    if query.is_empty() {
        trim_value(&text)
    } else {
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gmail_sender() {
        assert_eq!(
            extract_gmail_search_sender("any emails from Rohan about the invoice?").as_deref(),
            Some("Rohan")
        );
        assert_eq!(
            extract_gmail_search_sender("find email from jane@acme.com").as_deref(),
            Some("jane@acme.com")
        );
        assert_eq!(
            extract_gmail_search_sender("did Priya email me yesterday").as_deref(),
            Some("Priya")
        );
        assert_eq!(extract_gmail_search_sender("check my email"), None);
        assert_eq!(
            extract_gmail_search_query("emails from Rohan about the invoice?").as_deref(),
            Some("the invoice")
        );
    }

    #[test]
    fn test_contact_name() {
        assert_eq!(extract_contact_name("What's Priya's email?").as_deref(), Some("Priya"));
        assert_eq!(
            extract_contact_name("phone number of john smith").as_deref(),
            Some("John Smith")
        );
        assert_eq!(extract_contact_name("hello there"), None);
    }

    #[test]
    fn test_document_name_and_question() {
        assert_eq!(
            extract_document_name("open the pdf called Lease Agreement").as_deref(),
            Some("Lease Agreement")
        );
        assert_eq!(
            extract_document_name("use the doc from last week").as_deref(),
            Some("last week")
        );
        assert_eq!(
            extract_doc_question("what does it say about termination?"),
            "termination"
        );
        assert!(is_summary_request("Summarise this please"));
        assert!(!is_summary_request("what's the deadline"));
    }

    #[test]
    fn test_task_reference() {
        assert_eq!(extract_task_reference("mark task 3 done"), Some(TaskRef::Index(3)));
        assert_eq!(extract_task_reference("complete #2"), Some(TaskRef::Index(2)));
        assert_eq!(
            extract_task_reference("mark pay rent as done"),
            Some(TaskRef::Title("pay rent".into()))
        );
        assert_eq!(
            extract_task_reference("remove Buy milk from my tasks"),
            Some(TaskRef::Title("Buy milk".into()))
        );
        assert_eq!(extract_task_reference("mark it as done"), None);
    }

    #[test]
    fn test_task_title() {
        assert_eq!(
            extract_task_title("add task: renew passport by friday").as_deref(),
            Some("renew passport")
        );
        assert_eq!(
            extract_task_title("Add Buy milk to my tasks").as_deref(),
            Some("Buy milk")
        );
    }

    #[test]
    fn test_reminder_text() {
        assert_eq!(
            extract_reminder_text("remind me to call mom at 6pm").as_deref(),
            Some("call mom")
        );
        assert_eq!(
            extract_reminder_text("Remind me tomorrow at 9 to send the deck").as_deref(),
            Some("send the deck")
        );
        assert_eq!(
            extract_reminder_text("set a reminder to water the plants tomorrow morning").as_deref(),
            Some("water the plants")
        );
        assert_eq!(extract_reminder_text("remind me"), None);
    }

    #[test]
    fn test_event_hints() {
        let hints = extract_event_hints("cancel my meeting with Priya tomorrow");
        assert_eq!(hints.title.as_deref(), Some("meeting"));
        assert_eq!(hints.person.as_deref(), Some("Priya"));

        let hints = extract_event_hints("reschedule the design review meeting to friday 3pm");
        assert_eq!(hints.title.as_deref(), Some("design review"));
        assert_eq!(hints.person, None);

        let hints = extract_event_hints("delete my 3pm call");
        assert_eq!(hints.title.as_deref(), Some("call"));
    }

    #[test]
    fn test_event_title_and_times() {
        assert_eq!(
            extract_event_title("schedule a call with priya tomorrow at 3pm", Some("priya"))
                .as_deref(),
            Some("Call with Priya")
        );
        assert_eq!(
            extract_event_title("book a dentist appointment on friday at 10am", None).as_deref(),
            Some("dentist appointment")
        );
        assert_eq!(
            extract_new_time_phrase("move my meeting with Sam to 4pm").as_deref(),
            Some("4pm")
        );
        assert_eq!(extract_duration("schedule a call for 45 minutes"), Some(45));
        assert_eq!(extract_duration("extend it for 1.5 hours"), Some(90));
    }

    #[test]
    fn test_case_folding_keeps_char_boundaries() {
        // U+212A KELVIN SIGN lowercases to a one-byte 'k'.
        assert_eq!(extract_web_query("Search the web for \u{212A}elvin scale"), "\u{212A}elvin scale");
        assert_eq!(extract_web_query("\u{212A}\u{212A} search for x"), "\u{212A}\u{212A} search for x");
        assert_eq!(drop_generic_suffix("\u{130}zmir Sync"), "\u{130}zmir");
        assert_eq!(drop_generic_suffix("\u{130}\u{130}"), "\u{130}\u{130}");
    }

    #[test]
    fn test_search_queries() {
        assert_eq!(extract_web_query("google best ramen in Tokyo"), "best ramen in Tokyo");
        assert_eq!(extract_web_query("search the web for rust 2024 edition?"), "rust 2024 edition");
        assert_eq!(extract_drive_query("find the budget spreadsheet in google drive"), "budget spreadsheet");
    }
}
