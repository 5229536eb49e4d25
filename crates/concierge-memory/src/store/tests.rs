use super::reminders::{descriptions_are_similar, texts_match};
use super::*;
use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use concierge_core::{
    action::Action,
    session::{DocumentRef, FieldUpdate, SessionPatch},
    traits::SessionStore,
};

async fn test_store() -> Store {
    Store::open_in_memory().await.unwrap()
}

fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, day)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

#[tokio::test]
async fn test_session_created_lazily_and_empty() {
    let store = test_store().await;
    assert_eq!(store.session_count().await.unwrap(), 0);
    let state = store.get("u1").await.unwrap();
    assert!(!state.has_pending());
    assert_eq!(store.session_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_upsert_leaves_unrelated_fields() {
    let store = test_store().await;
    let doc = DocumentRef {
        id: "d1".into(),
        title: "Lease.pdf".into(),
        uploaded_at: Utc::now(),
    };
    store
        .upsert("u1", &SessionPatch::new_document(doc.clone()))
        .await
        .unwrap();
    store
        .upsert(
            "u1",
            &SessionPatch {
                last_doc_summary: FieldUpdate::Set("two pages".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    store
        .upsert("u1", &SessionPatch::confirm(Action::GmailMarkRead, Utc::now()))
        .await
        .unwrap();

    let state = store.get("u1").await.unwrap();
    assert_eq!(state.last_doc, Some(doc));
    assert_eq!(state.last_doc_summary.as_deref(), Some("two pages"));
    assert!(state.confirmation_pending.is_some());
}

#[tokio::test]
async fn test_clear_all_pending_is_one_update() {
    let store = test_store().await;
    store
        .upsert("u1", &SessionPatch::confirm(Action::GmailCheck, Utc::now()))
        .await
        .unwrap();
    store
        .upsert("u1", &SessionPatch::clear_all_pending())
        .await
        .unwrap();
    assert!(!store.get("u1").await.unwrap().has_pending());
}

#[tokio::test]
async fn test_sessions_are_per_user() {
    let store = test_store().await;
    store
        .upsert("u1", &SessionPatch::confirm(Action::GmailCheck, Utc::now()))
        .await
        .unwrap();
    assert!(store.get("u2").await.unwrap().confirmation_pending.is_none());
}

#[tokio::test]
async fn test_history_returns_latest_oldest_first() {
    let store = test_store().await;
    for i in 0..4 {
        store
            .append_exchange("u1", &format!("q{i}"), &format!("a{i}"), "none")
            .await
            .unwrap();
    }
    let history = store.recent_history("u1", 4).await.unwrap();
    let contents: Vec<&str> = history.iter().map(|e| e.content.as_str()).collect();
    assert_eq!(contents, vec!["q2", "a2", "q3", "a3"]);
    assert_eq!(history[0].role, "user");
    assert_eq!(store.last_route("u1").await.unwrap().as_deref(), Some("none"));
}

#[tokio::test]
async fn test_duplicate_reminder_within_hour() {
    let store = test_store().await;
    let first = store
        .create_reminder("u1", "Call mom", at(2, 18, 0), false)
        .await
        .unwrap();
    assert!(matches!(first, ReminderOutcome::Created(_)));

    let second = store
        .create_reminder("u1", "call mom", at(2, 18, 30), false)
        .await
        .unwrap();
    assert!(matches!(second, ReminderOutcome::Duplicate(ref r) if r.text == "Call mom"));
    assert_eq!(store.pending_reminders("u1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_reminder_outside_window_or_other_user_is_not_duplicate() {
    let store = test_store().await;
    store
        .create_reminder("u1", "Call mom", at(2, 18, 0), false)
        .await
        .unwrap();
    let later = store
        .create_reminder("u1", "Call mom", at(2, 19, 30), false)
        .await
        .unwrap();
    assert!(matches!(later, ReminderOutcome::Created(_)));
    let other = store
        .create_reminder("u2", "Call mom", at(2, 18, 0), false)
        .await
        .unwrap();
    assert!(matches!(other, ReminderOutcome::Created(_)));
}

#[tokio::test]
async fn test_forced_reminder_skips_dedup() {
    let store = test_store().await;
    store
        .create_reminder("u1", "Call mom", at(2, 18, 0), false)
        .await
        .unwrap();
    let forced = store
        .create_reminder("u1", "Call mom", at(2, 18, 0), true)
        .await
        .unwrap();
    assert!(matches!(forced, ReminderOutcome::Created(_)));
    assert_eq!(store.pending_reminders("u1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_snooze_updates_sent_reminder_in_place() {
    let store = test_store().await;
    let ReminderOutcome::Created(r) = store
        .create_reminder("u1", "Water the plants", at(2, 9, 0), false)
        .await
        .unwrap()
    else {
        panic!("expected a new reminder");
    };
    store.mark_reminder(&r.id, ReminderStatus::Sent).await.unwrap();

    let until = at(2, 9, 0) + Duration::minutes(10);
    let snoozed = store.snooze_reminder("u1", until).await.unwrap().unwrap();
    assert_eq!(snoozed.id, r.id);
    assert_eq!(snoozed.due_at, until);

    let pending = store.pending_reminders("u1").await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, r.id);
    assert_eq!(pending[0].due_at, until);
}

#[tokio::test]
async fn test_snooze_prefers_pending_over_old_sent_reminder() {
    let store = test_store().await;
    let ReminderOutcome::Created(old) = store
        .create_reminder("u1", "Water the plants", at(1, 9, 0), false)
        .await
        .unwrap()
    else {
        panic!("expected a new reminder");
    };
    store.mark_reminder(&old.id, ReminderStatus::Sent).await.unwrap();
    sqlx::query("UPDATE reminders SET last_attempt_at = datetime('now', '-3 days') WHERE id = ?")
        .bind(&old.id)
        .execute(&store.pool)
        .await
        .unwrap();
    store
        .create_reminder("u1", "Call the bank", at(2, 15, 0), false)
        .await
        .unwrap();

    let until = at(2, 15, 30);
    let snoozed = store.snooze_reminder("u1", until).await.unwrap().unwrap();
    assert_eq!(snoozed.text, "Call the bank");
    assert_eq!(snoozed.due_at, until);

    let pending = store.pending_reminders("u1").await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].text, "Call the bank");
}

#[tokio::test]
async fn test_snooze_ignores_stale_sent_reminder() {
    let store = test_store().await;
    let ReminderOutcome::Created(old) = store
        .create_reminder("u1", "Water the plants", at(1, 9, 0), false)
        .await
        .unwrap()
    else {
        panic!("expected a new reminder");
    };
    store.mark_reminder(&old.id, ReminderStatus::Sent).await.unwrap();
    sqlx::query("UPDATE reminders SET last_attempt_at = datetime('now', '-2 hours') WHERE id = ?")
        .bind(&old.id)
        .execute(&store.pool)
        .await
        .unwrap();

    assert!(store.snooze_reminder("u1", at(2, 10, 0)).await.unwrap().is_none());
    assert!(store.pending_reminders("u1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_snooze_without_reminders_returns_none() {
    let store = test_store().await;
    assert!(store.snooze_reminder("u1", at(2, 10, 0)).await.unwrap().is_none());
}

#[test]
fn test_texts_match() {
    assert!(texts_match("Call mom!", "call   MOM"));
    assert!(!texts_match("Call mom", "Call dad"));
}

#[test]
fn test_descriptions_are_similar() {
    assert!(descriptions_are_similar(
        "submit the quarterly expense report",
        "quarterly expense report submit now"
    ));
    assert!(!descriptions_are_similar("buy milk", "buy milk"));
}
