//! Finding the one calendar event or task an update/delete refers to.

use super::phrases::GENERIC_TITLES;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use concierge_core::{
    action::{Candidate, SearchQuery},
    error::CapabilityError,
    traits::Capability,
};

/// What the user said about the target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetQuery {
    pub id: Option<String>,
    pub title: Option<String>,
    pub person: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TargetOutcome {
    Found(Candidate),
    /// Nothing matched; carries the criteria for the reply.
    NotFound(String),
    Ambiguous(Vec<Candidate>),
}

/// Titles like "meeting" say nothing about which event is meant.
pub fn is_generic_title(title: &str) -> bool {
    let t = title.trim().to_lowercase();
    GENERIC_TITLES.contains(&t.as_str())
}

/// Case-insensitive containment in either direction.
///
/// Kept behind one function so a fuzzier matcher can replace it.
pub fn title_matches(query: &str, title: &str) -> bool {
    let q = query.trim().to_lowercase();
    let t = title.trim().to_lowercase();
    !q.is_empty() && !t.is_empty() && (t.contains(&q) || q.contains(&t))
}

/// Person named in the title, or an attendee whose email or display name
/// contains them.
pub fn person_matches(person: &str, candidate: &Candidate) -> bool {
    let p = person.trim().to_lowercase();
    if p.is_empty() {
        return false;
    }
    candidate.title.to_lowercase().contains(&p)
        || candidate.attendees.iter().any(|a| {
            a.email.to_lowercase().contains(&p)
                || a.display_name
                    .as_ref()
                    .is_some_and(|n| n.to_lowercase().contains(&p))
        })
}

/// Person filter first, then title only when the title is specific.
pub fn filter_candidates(candidates: Vec<Candidate>, query: &TargetQuery) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|c| query.person.as_deref().is_none_or(|p| person_matches(p, c)))
        .filter(|c| match query.title.as_deref() {
            Some(t) if !is_generic_title(t) => title_matches(t, &c.title),
            _ => true,
        })
        .collect()
}

/// One explicit day, or `now` through `now + window_days`.
pub fn search_window(
    date: Option<NaiveDate>,
    now: NaiveDateTime,
    window_days: i64,
) -> (NaiveDateTime, NaiveDateTime) {
    match date {
        Some(day) => {
            let start = day.and_time(NaiveTime::MIN);
            (start, start + Duration::days(1))
        }
        None => (now, now + Duration::days(window_days)),
    }
}

/// Human-readable echo of the search criteria.
pub fn describe_criteria(query: &TargetQuery) -> String {
    let mut parts = Vec::new();
    if let Some(t) = &query.title {
        parts.push(format!("\"{t}\""));
    }
    if let Some(p) = &query.person {
        parts.push(format!("with {p}"));
    }
    if let Some(d) = query.date {
        parts.push(format!("on {}", d.format("%a %-d %b")));
    }
    if parts.is_empty() {
        "matching your request".to_string()
    } else {
        parts.join(" ")
    }
}

fn classify(filtered: Vec<Candidate>, query: &TargetQuery) -> TargetOutcome {
    match filtered.len() {
        0 => TargetOutcome::NotFound(describe_criteria(query)),
        1 => filtered
            .into_iter()
            .next()
            .map(TargetOutcome::Found)
            .unwrap_or_else(|| TargetOutcome::NotFound(describe_criteria(query))),
        _ => TargetOutcome::Ambiguous(filtered),
    }
}

fn explicit(query: &TargetQuery) -> Option<TargetOutcome> {
    query.id.as_ref().map(|id| {
        TargetOutcome::Found(Candidate {
            id: id.clone(),
            title: query.title.clone().unwrap_or_default(),
            source_list: None,
            start: None,
            attendees: Vec::new(),
        })
    })
}

/// Resolve a calendar event target.
pub async fn find_event_target(
    calendar: &dyn Capability,
    user_id: &str,
    query: &TargetQuery,
    now: NaiveDateTime,
    window_days: i64,
) -> Result<TargetOutcome, CapabilityError> {
    if let Some(found) = explicit(query) {
        return Ok(found);
    }
    let (from, to) = search_window(query.date, now, window_days);
    let events = calendar
        .search(user_id, &SearchQuery::CalendarEvents { from, to })
        .await?;
    Ok(classify(filter_candidates(events, query), query))
}

/// Resolve a task target among `tasks` (already fetched or snapshotted).
pub fn find_task_target(tasks: Vec<Candidate>, query: &TargetQuery) -> TargetOutcome {
    if let Some(found) = explicit(query) {
        return found;
    }
    let filtered = match query.title.as_deref() {
        Some(t) => tasks
            .into_iter()
            .filter(|c| title_matches(t, &c.title))
            .collect(),
        None => Vec::new(),
    };
    classify(filtered, query)
}

/// All candidates share one title (the same task in two lists).
pub fn all_same_title(candidates: &[Candidate]) -> bool {
    candidates
        .split_first()
        .is_some_and(|(first, rest)| {
            rest.iter()
                .all(|c| c.title.trim().eq_ignore_ascii_case(first.title.trim()))
        })
}
