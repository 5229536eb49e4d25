//! Numbered-choice rounds for ambiguous update/delete targets.

use super::{
    classifier::{is_greeting, is_no, is_yes},
    router::normalize,
};
use chrono::{DateTime, Duration, Utc};
use concierge_core::{
    action::Candidate,
    session::{CandidateMatch, PendingDisambiguation, TargetedAction},
};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static NUMBER_REPLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:number |option |no\.? ?|#)?(\d{1,3})(?:st|nd|rd|th)?(?: one)?$")
        .expect("valid regex")
});

const ORDINALS: &[(&str, usize)] = &[
    ("first", 1),
    ("second", 2),
    ("third", 3),
    ("fourth", 4),
    ("fifth", 5),
    ("sixth", 6),
    ("seventh", 7),
    ("eighth", 8),
    ("ninth", 9),
    ("tenth", 10),
];

const ALL_WORDS: &[&str] = &["both", "all", "all of them", "both of them", "both please", "all please"];

/// Replies that drop the round without picking anything.
const DECLINE_WORDS: &[&str] = &[
    "no",
    "none",
    "neither",
    "none of them",
    "neither of them",
    "none of those",
    "neither of those",
    "no thanks",
];

/// Words a restated title may carry around the name itself.
const FILLER_WORDS: &[&str] = &["the", "a", "an", "one", "please", "in", "on", "from", "my", "list"];

/// Why a reply did not resolve the open round.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChoiceError {
    #[error("no pending disambiguation")]
    NoPending,
    #[error("pending disambiguation expired")]
    Stale,
    #[error("choice out of range 1..={max}")]
    OutOfRange { max: usize },
    #[error("reply does not name any candidate")]
    NoMatch,
    #[error("reply matches more than one candidate")]
    StillAmbiguous,
    #[error("\"both\"/\"all\" is not accepted here")]
    AllNotAllowed,
    #[error("user declined every candidate")]
    Declined,
}

/// Number the candidates and build the pending round.
pub fn present_choices(
    candidates: Vec<Candidate>,
    action: TargetedAction,
    allow_all: bool,
    now: DateTime<Utc>,
) -> (String, PendingDisambiguation) {
    let matches: Vec<CandidateMatch> = candidates
        .into_iter()
        .enumerate()
        .map(|(i, item)| CandidateMatch {
            source_list: item.source_list.clone(),
            item,
            display_index: i + 1,
        })
        .collect();

    let mut text = format!(
        "I found {} matches. Which one did you mean?\n",
        matches.len()
    );
    for m in &matches {
        text.push_str(&format!("{}. {}\n", m.display_index, m.item.display_line()));
    }
    if allow_all {
        text.push_str("Reply with a number, or \"both\" to do all of them.");
    } else {
        text.push_str("Reply with the number.");
    }

    let pending = PendingDisambiguation {
        action,
        matches,
        allow_all,
        timestamp: now,
    };
    (text, pending)
}

fn bare(reply: &str) -> String {
    let lower = normalize(reply);
    let trimmed = lower.trim_end_matches(['.', '!', '?', ',', ' ']);
    trimmed
        .strip_prefix("the ")
        .unwrap_or(trimmed)
        .to_string()
}

fn index_of(reply: &str) -> Option<usize> {
    if let Some(c) = NUMBER_REPLY.captures(reply) {
        return c[1].parse().ok();
    }
    let first_word = reply.split_whitespace().next()?;
    if reply.split_whitespace().count() > 2 {
        return None;
    }
    ORDINALS
        .iter()
        .find(|(word, _)| *word == first_word)
        .map(|(_, n)| *n)
}

fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(String::from)
        .collect()
}

/// A reply names a candidate when its words are whole words of the title
/// (or the list it lives in), or when it restates the whole title.
fn names_candidate(reply: &str, m: &CandidateMatch) -> bool {
    if is_greeting(reply) || is_yes(reply) || is_no(reply) {
        return false;
    }
    let said: Vec<String> = words(reply)
        .into_iter()
        .filter(|w| !FILLER_WORDS.contains(&w.as_str()))
        .collect();
    if said.is_empty() {
        return false;
    }
    let title = words(&m.item.title);
    let list = m.source_list.as_deref().map(words).unwrap_or_default();

    let all_in = |haystack: &[String]| said.iter().all(|w| haystack.contains(w));
    let restates = |needle: &[String]| !needle.is_empty() && needle.iter().all(|w| said.contains(w));

    all_in(&title) || restates(&title) || restates(&list)
}

fn is_decline(b: &str) -> bool {
    DECLINE_WORDS.contains(&b)
}

/// Whether a reply reads like an answer to a numbered question.
pub fn looks_like_choice(reply: &str, pending: &PendingDisambiguation) -> bool {
    let b = bare(reply);
    index_of(&b).is_some()
        || ALL_WORDS.contains(&b.as_str())
        || is_decline(&b)
        || b == "last"
        || b == "last one"
        || pending.matches.iter().any(|m| names_candidate(&b, m))
}

/// Resolve a reply against the open round.
///
/// Returns one candidate, or all of them for an accepted "both".
pub fn resolve_choice(
    reply: &str,
    pending: Option<&PendingDisambiguation>,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<Vec<Candidate>, ChoiceError> {
    let pending = pending.ok_or(ChoiceError::NoPending)?;
    if now.signed_duration_since(pending.timestamp) > ttl {
        return Err(ChoiceError::Stale);
    }
    let max = pending.matches.len();
    let b = bare(reply);

    if is_decline(&b) {
        return Err(ChoiceError::Declined);
    }

    if ALL_WORDS.contains(&b.as_str()) {
        return if pending.allow_all {
            Ok(pending.matches.iter().map(|m| m.item.clone()).collect())
        } else {
            Err(ChoiceError::AllNotAllowed)
        };
    }

    let index = if b == "last" || b == "last one" {
        Some(max)
    } else {
        index_of(&b)
    };
    if let Some(n) = index {
        return pending
            .matches
            .iter()
            .find(|m| m.display_index == n)
            .map(|m| vec![m.item.clone()])
            .ok_or(ChoiceError::OutOfRange { max });
    }

    let named: Vec<&CandidateMatch> = pending
        .matches
        .iter()
        .filter(|m| names_candidate(&b, m))
        .collect();
    match named.as_slice() {
        [] => Err(ChoiceError::NoMatch),
        [one] => Ok(vec![one.item.clone()]),
        _ => Err(ChoiceError::StillAmbiguous),
    }
}
