use super::*;
use async_trait::async_trait;
use chrono::Utc;
use concierge_capabilities::{Capabilities, ReminderCapability};
use concierge_core::{
    action::{Action, Attendee, Candidate, CapabilityReply, Domain, ReplyEffect, SearchQuery},
    config::DispatchConfig,
    error::CapabilityError,
    message::{Attachment, AttachmentType},
    session::{DocumentRef, FieldUpdate, PendingDisambiguation, SessionState, TargetedAction},
    traits::Capability,
};
use concierge_memory::Store;

/// Capability double: records every action, answers searches from a fixed
/// list, optionally fails every call.
struct MockCapability {
    domain: Domain,
    items: Vec<Candidate>,
    error: Option<CapabilityError>,
    effect: Option<ReplyEffect>,
    performed: std::sync::Mutex<Vec<Action>>,
}

impl MockCapability {
    fn new(domain: Domain) -> Self {
        Self {
            domain,
            items: Vec::new(),
            error: None,
            effect: None,
            performed: std::sync::Mutex::new(Vec::new()),
        }
    }

    fn with_items(mut self, items: Vec<Candidate>) -> Self {
        self.items = items;
        self
    }

    fn failing(mut self, error: CapabilityError) -> Self {
        self.error = Some(error);
        self
    }

    fn with_effect(mut self, effect: ReplyEffect) -> Self {
        self.effect = Some(effect);
        self
    }

    fn performed(&self) -> Vec<Action> {
        self.performed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Capability for MockCapability {
    fn domain(&self) -> Domain {
        self.domain
    }

    async fn perform(
        &self,
        _user_id: &str,
        action: &Action,
    ) -> Result<CapabilityReply, CapabilityError> {
        self.performed.lock().unwrap().push(action.clone());
        if let Some(e) = &self.error {
            return Err(e.clone());
        }
        Ok(CapabilityReply {
            message: format!("done: {}", action.describe()),
            effect: self.effect.clone(),
        })
    }

    async fn search(
        &self,
        _user_id: &str,
        _query: &SearchQuery,
    ) -> Result<Vec<Candidate>, CapabilityError> {
        match &self.error {
            Some(e) => Err(e.clone()),
            None => Ok(self.items.clone()),
        }
    }
}

fn item(id: &str, title: &str, attendee: Option<&str>) -> Candidate {
    Candidate {
        id: id.into(),
        title: title.into(),
        source_list: None,
        start: None,
        attendees: attendee
            .map(|email| {
                vec![Attendee {
                    email: email.into(),
                    display_name: None,
                }]
            })
            .unwrap_or_default(),
    }
}

fn pipeline(store: &Store, mocks: Vec<Arc<MockCapability>>) -> Pipeline {
    let mut caps = Capabilities::new();
    caps.register(Arc::new(ReminderCapability::new(store.clone())));
    for mock in mocks {
        caps.register(mock);
    }
    Pipeline::new(
        Dispatcher::new(caps, DispatchConfig::default()),
        IntentClassifier::heuristic(),
        None,
        chrono_tz::UTC,
        "Concierge",
    )
}

async fn build(mocks: Vec<Arc<MockCapability>>) -> (Gateway, Store) {
    let store = Store::open_in_memory().await.unwrap();
    let gateway = Gateway::new(pipeline(&store, mocks), Arc::new(store.clone()), 6);
    (gateway, store)
}

async fn say(gateway: &Gateway, text: &str) -> GatewayReply {
    gateway.handle(IncomingMessage::text("u1", text)).await
}

fn priya_calendar() -> Arc<MockCapability> {
    Arc::new(MockCapability::new(Domain::Calendar).with_items(vec![
        item("e1", "Weekly Sync with Priya", None),
        item("e2", "Priya 1:1", None),
        item("e3", "Hiring debrief", Some("priya@acme.com")),
        item("e4", "Dentist", None),
    ]))
}

#[tokio::test]
async fn test_disambiguation_round_trip() {
    let calendar = priya_calendar();
    let (gateway, store) = build(vec![calendar.clone()]).await;

    let first = say(&gateway, "move my meeting with Priya to friday 3pm").await;
    assert_eq!(first.route, "calendar_update");
    assert!(first.reply.contains("1. Weekly Sync with Priya"));
    assert!(first.reply.contains("2. Priya 1:1"));
    assert!(first.reply.contains("3. Hiring debrief"));
    assert!(!first.reply.contains("Dentist"));
    assert!(calendar.performed().is_empty());

    let pick = say(&gateway, "2").await;
    assert_eq!(pick.route, "disambiguation");
    let performed = calendar.performed();
    assert_eq!(performed.len(), 1);
    assert!(matches!(
        &performed[0],
        Action::CalendarUpdate { event_id, new_start: Some(_), .. } if event_id == "e2"
    ));
    assert!(store.load_session("u1").await.unwrap().pending_disambiguation.is_none());

    // The old round must not answer a later bare number.
    let again = say(&gateway, "2").await;
    assert_ne!(again.route, "disambiguation");
    assert_eq!(calendar.performed().len(), 1);
}

#[tokio::test]
async fn test_out_of_range_keeps_round_open() {
    let (gateway, store) = build(vec![priya_calendar()]).await;
    say(&gateway, "move my meeting with Priya to friday 3pm").await;

    let reply = say(&gateway, "7").await;
    assert!(reply.reply.contains("between 1 and 3"));
    assert!(store.load_session("u1").await.unwrap().pending_disambiguation.is_some());
}

#[tokio::test]
async fn test_new_request_supersedes_disambiguation() {
    let gmail = Arc::new(MockCapability::new(Domain::Gmail));
    let (gateway, store) = build(vec![priya_calendar(), gmail.clone()]).await;
    say(&gateway, "move my meeting with Priya to friday 3pm").await;

    let reply = say(&gateway, "check my email").await;
    assert_eq!(reply.route, "gmail_check");
    assert!(store.load_session("u1").await.unwrap().pending_disambiguation.is_none());
}

#[tokio::test]
async fn test_greeting_during_delete_round_deletes_nothing() {
    let calendar = priya_calendar();
    let (gateway, _store) = build(vec![calendar.clone()]).await;

    let list = say(&gateway, "cancel my meeting with Priya").await;
    assert_eq!(list.route, "calendar_delete");
    assert!(list.reply.contains("3. Hiring debrief"));

    let hi = say(&gateway, "hi").await;
    assert_ne!(hi.route, "disambiguation");
    assert!(calendar.performed().is_empty());

    // Picking from the list still asks before deleting.
    let pick = say(&gateway, "3").await;
    assert_eq!(pick.route, "disambiguation");
    assert!(pick.reply.contains("Should I delete the event \"Hiring debrief\"?"));
    assert!(calendar.performed().is_empty());

    say(&gateway, "yes").await;
    assert!(matches!(
        &calendar.performed()[..],
        [Action::CalendarDelete { event_id, .. }] if event_id == "e3"
    ));
}

#[tokio::test]
async fn test_declining_every_candidate_drops_round() {
    let calendar = priya_calendar();
    let (gateway, store) = build(vec![calendar.clone()]).await;
    say(&gateway, "cancel my meeting with Priya").await;

    let none = say(&gateway, "none of them").await;
    assert_eq!(none.route, "disambiguation");
    assert_eq!(none.reply, "Okay, I'll leave them as they are.");
    assert!(store.load_session("u1").await.unwrap().pending_disambiguation.is_none());
    assert!(calendar.performed().is_empty());
}

#[tokio::test]
async fn test_number_after_round_expired_asks_to_repeat() {
    let store = Store::open_in_memory().await.unwrap();
    let calendar = priya_calendar();
    let pipeline = pipeline(&store, vec![calendar.clone()]);
    let now = Utc::now();

    let (_, round) = super::disambiguation::present_choices(
        calendar.items.clone(),
        TargetedAction::CalendarDelete,
        false,
        now - chrono::Duration::minutes(6),
    );
    let state = SessionState {
        pending_disambiguation: Some(round.clone()),
        ..Default::default()
    };
    let outcome = pipeline
        .process_at(&IncomingMessage::text("u1", "2"), &state, &[], now)
        .await;
    assert_eq!(
        outcome.reply_text,
        "I don't have that context anymore, please repeat your request."
    );
    assert_eq!(outcome.chosen_route, "disambiguation_expired");
    assert_eq!(outcome.state_updates.pending_disambiguation, FieldUpdate::Clear);
    assert!(calendar.performed().is_empty());

    // The same round four minutes old still resolves.
    let fresh = SessionState {
        pending_disambiguation: Some(PendingDisambiguation {
            timestamp: now - chrono::Duration::minutes(4),
            ..round
        }),
        ..Default::default()
    };
    let outcome = pipeline
        .process_at(&IncomingMessage::text("u1", "2"), &fresh, &[], now)
        .await;
    assert_eq!(outcome.chosen_route, "disambiguation");
    assert!(outcome.reply_text.contains("Priya 1:1"));
}

#[tokio::test]
async fn test_single_match_delete_asks_then_performs_on_yes() {
    let calendar = priya_calendar();
    let (gateway, _store) = build(vec![calendar.clone()]).await;

    let ask = say(&gateway, "delete my meeting with Sam").await;
    assert!(ask.reply.contains("couldn't find an event"));

    let ask = say(&gateway, "delete the dentist appointment").await;
    assert_eq!(ask.route, "calendar_delete");
    assert!(ask.reply.contains("Should I delete the event \"Dentist\"?"));
    assert!(calendar.performed().is_empty());

    let yes = say(&gateway, "yes").await;
    assert_eq!(yes.route, "confirmation_yes");
    assert!(matches!(
        &calendar.performed()[..],
        [Action::CalendarDelete { event_id, .. }] if event_id == "e4"
    ));

    // Nothing is pending any more.
    let yes_again = say(&gateway, "yes").await;
    assert_ne!(yes_again.route, "confirmation_yes");
    assert_eq!(calendar.performed().len(), 1);
}

#[tokio::test]
async fn test_no_declines_pending_confirmation() {
    let calendar = priya_calendar();
    let (gateway, store) = build(vec![calendar.clone()]).await;
    say(&gateway, "delete the dentist appointment").await;

    let no = say(&gateway, "no").await;
    assert_eq!(no.route, "confirmation_no");
    assert_eq!(no.reply, "Okay, I won't.");
    assert!(calendar.performed().is_empty());
    assert!(store.load_session("u1").await.unwrap().confirmation_pending.is_none());
}

#[tokio::test]
async fn test_yes_without_pending_is_not_a_confirmation() {
    let (gateway, _store) = build(vec![]).await;
    let reply = say(&gateway, "yes").await;
    assert_ne!(reply.route, "confirmation_yes");
    assert_eq!(reply.route, "handoff_to_orchestrator");
}

#[tokio::test]
async fn test_email_verb_wins_over_document() {
    let doc = DocumentRef {
        id: "doc-7".into(),
        title: "Vendor contract".into(),
        uploaded_at: Utc::now(),
    };
    let documents = Arc::new(
        MockCapability::new(Domain::Documents).with_effect(ReplyEffect::Document(doc.clone())),
    );
    let gmail = Arc::new(MockCapability::new(Domain::Gmail));
    let (gateway, store) = build(vec![documents.clone(), gmail.clone()]).await;

    let mut upload = IncomingMessage::text("u1", "");
    upload.attachments.push(Attachment {
        file_type: AttachmentType::Document,
        url: Some("https://files.example/contract.pdf".into()),
        filename: Some("contract.pdf".into()),
    });
    let ingested = gateway.handle(upload).await;
    assert_eq!(ingested.route, "document_ingest");
    assert_eq!(store.load_session("u1").await.unwrap().last_doc, Some(doc.clone()));

    let reply = say(&gateway, "Email Rohan and tell him the document is approved").await;
    assert_eq!(reply.route, "email_action");
    assert!(matches!(
        &gmail.performed()[..],
        [Action::GmailCompose { document: Some(d), .. }] if d.id == "doc-7"
    ));
    assert_eq!(documents.performed().len(), 1);
}

#[tokio::test]
async fn test_summary_is_cached_per_document() {
    let doc = DocumentRef {
        id: "doc-1".into(),
        title: "Lease".into(),
        uploaded_at: Utc::now(),
    };
    let documents = Arc::new(MockCapability::new(Domain::Documents).with_effect(
        ReplyEffect::Summary {
            text: "Twelve month lease, two months notice.".into(),
        },
    ));
    let (gateway, store) = build(vec![documents.clone()]).await;
    store
        .apply_patch(
            "u1",
            &concierge_core::session::SessionPatch::new_document(doc),
        )
        .await
        .unwrap();

    say(&gateway, "summarize this document").await;
    let cached = say(&gateway, "summarize this document").await;
    assert_eq!(cached.reply, "Twelve month lease, two months notice.");
    assert_eq!(documents.performed().len(), 1);
}

#[tokio::test]
async fn test_document_question_without_document() {
    let (gateway, _store) = build(vec![Arc::new(MockCapability::new(Domain::Documents))]).await;
    let reply = say(&gateway, "what does the document say about fees").await;
    assert_eq!(reply.route, "document_qna");
    assert_eq!(reply.reply, "Please send me the document first.");
}

#[tokio::test]
async fn test_duplicate_reminder_asks_then_forces() {
    let (gateway, store) = build(vec![]).await;

    let first = say(&gateway, "remind me to call mom tomorrow at 6pm").await;
    assert_eq!(first.route, "reminder_create");
    assert!(first.reply.contains("call mom"));

    let dup = say(&gateway, "remind me to call mom tomorrow at 6pm").await;
    assert!(dup.reply.contains("Do you want me to set another one anyway?"));
    assert_eq!(store.pending_reminders("u1").await.unwrap().len(), 1);
    let session = store.load_session("u1").await.unwrap();
    assert!(matches!(
        session.confirmation_pending.map(|c| c.action),
        Some(Action::ReminderCreate { force: true, .. })
    ));

    let yes = say(&gateway, "yes").await;
    assert!(yes.reply.starts_with("Got it."));
    assert_eq!(store.pending_reminders("u1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_missing_time_is_filled_on_next_turn() {
    let (gateway, store) = build(vec![]).await;

    let ask = say(&gateway, "remind me to water the plants").await;
    assert!(ask.reply.contains("When should I remind you"));
    assert!(store.load_session("u1").await.unwrap().pending_slots.is_some());

    let filled = say(&gateway, "tomorrow at 8am").await;
    assert_eq!(filled.route, "slot_fill");
    let reminders = store.pending_reminders("u1").await.unwrap();
    assert_eq!(reminders.len(), 1);
    assert_eq!(reminders[0].text, "water the plants");
    assert!(store.load_session("u1").await.unwrap().pending_slots.is_none());
}

#[tokio::test]
async fn test_absurd_offset_asks_for_a_time() {
    let (gateway, store) = build(vec![]).await;
    let reply = say(&gateway, "remind me to stretch in 999999999999 minutes").await;
    assert_eq!(reply.route, "reminder_create");
    assert!(reply.reply.contains("When should I remind you"));
    assert!(store.pending_reminders("u1").await.unwrap().is_empty());
    assert_eq!(gateway.active_user_count().await, 0);
}

#[tokio::test]
async fn test_cancel_clears_everything_pending() {
    let (gateway, store) = build(vec![]).await;
    say(&gateway, "remind me to water the plants").await;

    let cancel = say(&gateway, "never mind").await;
    assert_eq!(cancel.route, "cancel_action");
    assert_eq!(cancel.reply, "Okay, cancelled.");
    assert!(!store.load_session("u1").await.unwrap().has_pending());

    let idle = say(&gateway, "cancel").await;
    assert_eq!(idle.reply, "Nothing to cancel.");
}

#[tokio::test]
async fn test_task_pages() {
    let tasks: Vec<Candidate> = (1..=12)
        .map(|i| item(&format!("t{i}"), &format!("Task {i}"), None))
        .collect();
    let (gateway, _store) =
        build(vec![Arc::new(MockCapability::new(Domain::Tasks).with_items(tasks))]).await;

    let first = say(&gateway, "show my tasks").await;
    assert!(first.reply.contains("10. Task 10"));
    assert!(!first.reply.contains("11. Task 11"));
    assert!(first.reply.contains("2 more"));

    let rest = say(&gateway, "show me the rest").await;
    assert!(rest.reply.contains("11. Task 11"));
    assert!(rest.reply.contains("12. Task 12"));
    assert!(!rest.reply.contains("1. Task 1\n"));

    let done = say(&gateway, "show me the rest").await;
    assert_eq!(done.reply, "That's all your tasks.");

    let all = say(&gateway, "show all tasks").await;
    assert!(all.reply.contains("12. Task 12"));
}

#[tokio::test]
async fn test_complete_task_by_index_uses_snapshot() {
    let tasks = Arc::new(MockCapability::new(Domain::Tasks).with_items(vec![
        item("t1", "Buy milk", None),
        item("t2", "Pay rent", None),
    ]));
    let (gateway, _store) = build(vec![tasks.clone()]).await;

    say(&gateway, "show my tasks").await;
    say(&gateway, "mark task 2 as done").await;
    assert!(matches!(
        &tasks.performed()[..],
        [Action::TaskComplete { task_id, .. }] if task_id == "t2"
    ));
}

#[tokio::test]
async fn test_duplicate_task_titles_accept_both() {
    let mut home = item("t1", "Pay rent", None);
    home.source_list = Some("Home".into());
    let mut work = item("t2", "Pay rent", None);
    work.source_list = Some("Work".into());
    let tasks = Arc::new(MockCapability::new(Domain::Tasks).with_items(vec![home, work]));
    let (gateway, _store) = build(vec![tasks.clone()]).await;

    let ask = say(&gateway, "mark pay rent as done").await;
    assert!(ask.reply.contains("\"both\""));

    say(&gateway, "both").await;
    assert_eq!(tasks.performed().len(), 2);
}

#[tokio::test]
async fn test_expired_oauth_asks_to_reconnect() {
    let gmail = Arc::new(MockCapability::new(Domain::Gmail).failing(
        CapabilityError::OAuthExpired {
            service: "Gmail".into(),
        },
    ));
    let (gateway, _store) = build(vec![gmail]).await;
    let reply = say(&gateway, "check my email").await;
    assert_eq!(reply.route, "gmail_check");
    assert!(reply.reply.contains("reconnect"));
}

#[tokio::test]
async fn test_unconfigured_capability_still_replies() {
    let (gateway, _store) = build(vec![]).await;
    let reply = say(&gateway, "find the file budget on google drive").await;
    assert_eq!(reply.route, "drive_search");
    assert!(reply.reply.contains("isn't set up"));
}

#[tokio::test]
async fn test_history_is_recorded() {
    let (gateway, store) = build(vec![]).await;
    say(&gateway, "hello").await;
    let history = store.history_for("u1", 10).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content, "hello");
    assert_eq!(history[1].role, "assistant");
}

#[tokio::test]
async fn test_concurrent_turns_release_locks() {
    let (gateway, _store) = build(vec![]).await;
    let (a, b, c) = tokio::join!(
        say(&gateway, "hello"),
        say(&gateway, "thanks"),
        gateway.handle(IncomingMessage::text("u2", "hi")),
    );
    assert_eq!(a.route, "greeting_smalltalk");
    assert_eq!(b.reply, "You're welcome!");
    assert_eq!(c.route, "greeting_smalltalk");
    assert_eq!(gateway.active_user_count().await, 0);
}

#[test]
fn test_inspect_reports_route_and_entities() {
    let now = chrono::NaiveDate::from_ymd_opt(2026, 3, 2)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap();
    let v = inspect("remind me to call mom tomorrow at 6pm", now);
    assert_eq!(v["route"]["type"], "reminder_create");
    assert_eq!(v["reminder_text"], "call mom");
    assert_eq!(v["when"], "2026-03-03 18:00");
}
