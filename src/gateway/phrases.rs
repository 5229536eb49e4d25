//! Static phrase tables for the deterministic router.
//!
//! All entries are lowercase. Within a category the more specific list is
//! consulted first; see `router::route` for the evaluation order.

// --- Cancel ---

/// Whole-message cancel phrases (after trimming punctuation).
pub(super) const CANCEL_EXACT: &[&str] = &[
    "cancel",
    "stop",
    "abort",
    "nevermind",
    "never mind",
    "forget it",
    "forget that",
    "cancel that",
    "cancel it",
    "cancel this",
    "no thanks",
    "quit",
];

/// Phrases that cancel when they open the message. Bare "cancel" is not
/// here: "cancel the meeting" is a calendar delete.
pub(super) const CANCEL_AT_START: &[&str] = &[
    "cancel that",
    "cancel this",
    "cancel it",
    "never mind",
    "nevermind",
    "forget it",
    "forget that",
    "abort",
    "stop that",
];

// --- Daily briefing ---

pub(super) const BRIEFING: &[&str] = &[
    "daily briefing",
    "morning briefing",
    "my briefing",
    "brief me",
    "what's my day",
    "whats my day",
    "how does my day look",
    "how's my day looking",
    "plan for today",
    "today's agenda",
    "todays agenda",
    "agenda for today",
    "summary of my day",
    "summarize my day",
    "what's on today",
    "whats on today",
];

// --- Tasks ---

pub(super) const TASK_CREATE: &[&str] = &[
    "add task",
    "add a task",
    "create task",
    "create a task",
    "new task",
    "add to my tasks",
    "add to my task list",
    "add to my to-do",
    "add to my todo",
    "to my task list",
    "to my to-do list",
    "to my todo list",
    "to my tasks",
];

pub(super) const TASK_COMPLETE: &[&str] = &[
    "mark task",
    "complete task",
    "complete the task",
    "mark as done",
    "mark it done",
    "mark it as done",
    "as done",
    "as complete",
    "as completed",
    "task done",
    "tick off",
    "check off",
    "finished task",
    "done with task",
    "done with the task",
];

pub(super) const TASK_DELETE: &[&str] = &[
    "delete task",
    "delete the task",
    "delete my task",
    "remove task",
    "remove the task",
    "remove my task",
    "from my tasks",
    "from my to-do",
    "from my todo",
    "from my task list",
];

pub(super) const TASK_SHOW_ALL: &[&str] = &[
    "show all tasks",
    "show all my tasks",
    "show me all my tasks",
    "show me all tasks",
    "list all tasks",
    "list all my tasks",
    "all my tasks",
    "all of my tasks",
    "every task",
    "full task list",
    "entire task list",
];

pub(super) const TASK_SHOW_REST: &[&str] = &[
    "rest of my tasks",
    "rest of the tasks",
    "remaining tasks",
    "more tasks",
    "show more tasks",
    "next page of tasks",
    "show the rest",
    "show me the rest",
    "the rest of them",
    "show me more",
];

/// "the other 5 tasks", "next 10 tasks", "remaining 3 tasks".
pub(super) const TASK_SHOW_REST_PATTERNS: &[&str] = &[
    r"\bthe other \d+ tasks?\b",
    r"\b(?:next|remaining|other) \d+ tasks?\b",
];

pub(super) const TASK_READ: &[&str] = &[
    "my tasks",
    "my task list",
    "my to-do",
    "my todo",
    "my to do",
    "to-do list",
    "todo list",
    "task list",
    "pending tasks",
    "open tasks",
    "what tasks",
    "show tasks",
    "list tasks",
    "list my tasks",
    "any tasks",
];

// --- Calendar ---

/// Nouns that make a mutation verb a calendar mutation.
pub(super) const EVENT_NOUNS: &str =
    r"(?:meeting|event|call|appointment|sync|1:1|one on one|standup|stand-up|interview|session)";

pub(super) const CALENDAR_DELETE: &[&str] = &[
    "cancel the meeting",
    "cancel my meeting",
    "cancel the call",
    "cancel my call",
    "cancel the event",
    "cancel my event",
    "cancel the appointment",
    "cancel my appointment",
    "delete the meeting",
    "delete my meeting",
    "delete meeting",
    "delete the event",
    "delete event",
    "delete the appointment",
    "remove the meeting",
    "remove meeting",
    "remove the event",
    "remove event",
    "call off",
];

pub(super) const CALENDAR_UPDATE: &[&str] = &[
    "reschedule",
    "postpone",
    "move my meeting",
    "move the meeting",
    "move my call",
    "move the call",
    "move the event",
    "push my meeting",
    "push the meeting",
    "push back",
    "change the meeting",
    "change my meeting",
    "change the time of",
    "shift the meeting",
    "rename the meeting",
    "extend the meeting",
    "extend my meeting",
];

pub(super) const CALENDAR_CREATE: &[&str] = &[
    "schedule a",
    "schedule an",
    "schedule meeting",
    "schedule call",
    "book a meeting",
    "book a call",
    "book an appointment",
    "set up a meeting",
    "set up a call",
    "setup a meeting",
    "add to my calendar",
    "add to calendar",
    "add an event",
    "create an event",
    "create event",
    "create a meeting",
    "new meeting",
    "new event",
    "put on my calendar",
    "block time",
    "block off",
];

pub(super) const CALENDAR_READ: &[&str] = &[
    "my calendar",
    "my schedule",
    "on my calendar",
    "my meetings",
    "my events",
    "my agenda",
    "what meetings",
    "any meetings",
    "am i free",
    "am i busy",
    "what's on tomorrow",
    "whats on tomorrow",
    "what do i have",
    "next 7 days",
    "next seven days",
    "week ahead",
    "upcoming meetings",
    "upcoming events",
    "when is my",
    "when's my",
];

/// Week-range synonyms only count next to a calendar word.
pub(super) const CALENDAR_READ_PATTERNS: &[&str] = &[
    r"\b(?:meetings?|events?|calendar|schedule|busy|free)\b.*\b(?:this|next|coming) week\b",
    r"\b(?:this|next|coming) week'?s? (?:meetings?|events?|calendar|schedule)\b",
];

// --- Gmail ---

pub(super) const GMAIL_MARK_READ: &[&str] = &[
    "mark as read",
    "mark all as read",
    "mark emails as read",
    "mark my emails as read",
    "mark them as read",
    "mark it as read",
    "mark email as read",
    "mark them read",
    "mark read",
];

pub(super) const GMAIL_SEARCH: &[&str] = &[
    "emails from",
    "email from",
    "mail from",
    "messages from",
    "search my email",
    "search my inbox",
    "search emails",
    "search email",
    "find emails",
    "find email",
    "find the email",
    "look for emails",
    "did i get an email",
    "any email from",
    "emails about",
    "email about",
];

pub(super) const GMAIL_CHECK: &[&str] = &[
    "check my email",
    "check email",
    "check my inbox",
    "check mail",
    "check my mail",
    "my inbox",
    "new emails",
    "new email",
    "unread emails",
    "unread email",
    "any emails",
    "any new mail",
    "read my emails",
    "my emails",
    "my mail",
];

// --- Reminders ---

pub(super) const REMINDER_SNOOZE: &[&str] = &[
    "snooze",
    "remind me again",
    "remind me later",
    "later please",
];

pub(super) const REMINDER_CREATE: &[&str] = &[
    "remind me",
    "set a reminder",
    "set reminder",
    "create a reminder",
    "add a reminder",
    "reminder to",
    "reminder for",
    "don't let me forget",
    "dont let me forget",
];

// --- Contacts ---

/// Each pattern captures the contact name in group 1.
pub(super) const CONTACT_PATTERNS: &[&str] = &[
    r"\bwhat(?:'s| is)\s+([a-z][\w .'-]*?)'s\s+(?:email|e-mail|phone|number|mobile|contact|address)",
    r"\b(?:find|get|look up|lookup|search for|show me|give me)\s+([a-z][\w .'-]*?)'s\s+(?:email|e-mail|phone|number|mobile|contact|details|address)",
    r"^(?:what(?:'s| is)\s+|find\s+|get\s+|give me\s+)?(?:the\s+)?(?:email address|email|e-mail|phone number|phone|number|mobile|contact details|contact info|contact)\s+(?:of|for)\s+([a-z][\w .'-]*?)\s*\??$",
    r"^(?:find|look up|lookup|search for|search)\s+(?:the\s+)?contact\s+(?:for\s+)?([a-z][\w .'-]*?)\s*\??$",
    r"^how (?:do i|can i) (?:reach|contact)\s+([a-z][\w .'-]*?)\s*\??$",
];

// --- Drive ---

pub(super) const DRIVE: &[&str] = &[
    "google drive",
    "my drive",
    "in drive",
    "on drive",
    "from drive",
    "search drive",
    "find file",
    "find the file",
    "find a file",
    "my files",
    "in my docs",
    "the spreadsheet",
    "the slides",
    "the deck",
];

// --- Documents ---

pub(super) const DOCUMENT_LIST: &[&str] = &[
    "my documents",
    "list documents",
    "list my documents",
    "list my docs",
    "documents i uploaded",
    "documents i've uploaded",
    "documents i sent",
    "uploaded documents",
    "uploaded files",
    "what documents",
    "which documents",
    "files i sent",
    "pdfs i sent",
    "my pdfs",
    "my uploads",
];

/// "open the pdf from last week", "use the doc called lease". Group 1 is
/// the document name.
pub(super) const DOCUMENT_RECALL_PATTERNS: &[&str] = &[
    r"\b(?:open|use|load|pull up|bring up|go back to|switch to)\s+(?:the|my|that)\s+(?:pdf|doc|document|file|contract|report)\s+(?:from|called|named|titled|about)\s+(.+?)\s*[?.!]*$",
];

pub(super) const DOCUMENT_QNA: &[&str] = &[
    "summarize",
    "summarise",
    "summary of",
    "what does this say",
    "what does it say",
    "what does the document say",
    "what does the doc say",
    "what does the pdf say",
    "key points",
    "main points",
    "tl;dr",
    "tldr",
    "in this document",
    "in the document",
    "in this pdf",
    "in the pdf",
    "according to the document",
];

/// "what does it say about termination". Group 1 is the topic.
pub(super) const DOCUMENT_QNA_PATTERNS: &[&str] = &[
    r"\bwhat does (?:it|this|the (?:document|doc|pdf|file|contract)) say about\s+(.+?)\s*[?.!]*$",
];

// --- Web search ---

pub(super) const WEB_SEARCH: &[&str] = &[
    "search the web",
    "search online",
    "search the internet",
    "web search",
    "google for",
    "look up online",
    "find online",
    "latest news",
    "news about",
    "what's the weather",
    "whats the weather",
    "weather in",
    "weather forecast",
];

/// Prefixes stripped from a web query. Longest first.
pub(super) const WEB_SEARCH_PREFIXES: &[&str] = &[
    "search the internet for",
    "search the web for",
    "search online for",
    "look up online",
    "find online",
    "search the web",
    "search online",
    "web search",
    "google for",
    "search for",
    "google",
    "look up",
];

// --- Classifier vocabulary ---

pub(super) const YES_WORDS: &[&str] = &[
    "yes",
    "y",
    "yeah",
    "yep",
    "yup",
    "sure",
    "ok",
    "okay",
    "confirm",
    "confirmed",
    "do it",
    "go ahead",
    "please do",
    "yes please",
    "sounds good",
];

pub(super) const NO_WORDS: &[&str] = &[
    "no", "n", "nope", "nah", "don't", "dont", "do not", "no way", "not now",
];

pub(super) const GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "hiya",
    "good morning",
    "good afternoon",
    "good evening",
    "who are you",
    "what can you do",
    "what are you",
    "thanks",
    "thank you",
    "how are you",
];

/// Email verbs that force `email_action` over any document reading.
pub(super) const EMAIL_ACTION_PATTERNS: &[&str] = &[
    r"\be-?mail\s",
    r"\bmail\s",
    r"\b(?:send|write|draft|compose)\s+(?:an?\s+|the\s+)?(?:e-?mail|mail|reply)\b",
    r"\b(?:message|tell|inform|ping|notify)\s+(?:him|her|them)\b",
    r"\blet\s+(?:him|her|them)\s+know\b",
    r"\breply\s+to\b",
    r"\brespond\s+to\b",
];

/// Phrasing that points at "the document" without naming it.
pub(super) const DOC_REFERENCES: &[&str] = &[
    "this document",
    "the document",
    "this doc",
    "the doc",
    "this pdf",
    "the pdf",
    "this file",
    "the file",
    "the attachment",
    "the contract",
    "it say",
    "this say",
    "in it",
    "about it",
];

pub(super) const REMINDER_HINTS: &[&str] = &["remind", "reminder", "alert me", "ping me", "nudge me"];

/// Titles too generic to filter candidates by.
pub(super) const GENERIC_TITLES: &[&str] = &["meeting", "call", "appointment", "event", "sync"];
