//! Natural-language time and duration parsing.
//!
//! Everything works on naive wall-clock time in the assistant's timezone;
//! callers convert `Utc::now()` with [`local_now`] first. A `None` result
//! means "ask the user", never "use now".

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use regex::Regex;
use std::sync::LazyLock;

static ISO_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{4})-(\d{2})-(\d{2})(?:[Tt ](\d{1,2}):(\d{2})(?::(\d{2}))?)?")
        .expect("valid regex")
});

static CLOCK_12H: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})(?::(\d{2}))?\s*(am|pm)\b").expect("valid regex")
});

static CLOCK_24H: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([01]?\d|2[0-3]):([0-5]\d)\b").expect("valid regex"));

static NEXT_WEEKDAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bnext\s+(monday|tuesday|wednesday|thursday|friday|saturday|sunday|mon|tue|tues|wed|thu|thur|thurs|fri|sat|sun)\b")
        .expect("valid regex")
});

static THIS_WEEKDAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bthis\s+(monday|tuesday|wednesday|thursday|friday|saturday|sunday|mon|tue|tues|wed|thu|thur|thurs|fri|sat|sun)\b")
        .expect("valid regex")
});

static BARE_WEEKDAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b")
        .expect("valid regex")
});

static IN_RELATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bin\s+((?:half\s+an?|an?|\d+(?:\.\d+)?)\s*(?:hours?|hrs?|h|minutes?|mins?|m)\b(?:\s*(?:and\s+)?\d+\s*(?:minutes?|mins?|m)\b)?)")
        .expect("valid regex")
});

static HOURS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d+(?:\.\d+)?|an?)\s*(?:hours?|hrs?|h)\b").expect("valid regex")
});

static MINUTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+)\s*(?:minutes?|mins?|m)\b").expect("valid regex"));

static NOON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:noon|midday)\b").expect("valid regex"));

static BARE_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*$").expect("valid regex"));

/// Longest duration accepted, about ten years.
const MAX_DURATION_MINUTES: i64 = 10 * 366 * 24 * 60;

/// Current wall-clock time in `tz`.
pub fn local_now(tz: Tz) -> NaiveDateTime {
    Utc::now().with_timezone(&tz).naive_local()
}

fn normalize(text: &str) -> String {
    text.to_lowercase()
        .replace("a.m.", "am")
        .replace("p.m.", "pm")
}

fn hm(h: u32, m: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(h, m, 0)
}

fn weekday_from(name: &str) -> Option<Weekday> {
    match name {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thur" | "thurs" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Days until the next `target`, 7 when today is `target`.
fn days_until_next(today: Weekday, target: Weekday) -> i64 {
    let delta = (target.num_days_from_monday() as i64 - today.num_days_from_monday() as i64)
        .rem_euclid(7);
    if delta == 0 {
        7
    } else {
        delta
    }
}

/// Days until `target` within this week. A day already past rolls to next
/// week; today stays today.
fn days_until_this(today: Weekday, target: Weekday) -> i64 {
    let delta = target.num_days_from_monday() as i64 - today.num_days_from_monday() as i64;
    if delta < 0 {
        delta + 7
    } else {
        delta
    }
}

/// Clock time a day word implies when no explicit time is given.
fn default_time_for(text: &str) -> NaiveTime {
    let (h, m) = if text.contains("tonight") {
        (20, 0)
    } else if text.contains("morning") {
        (9, 0)
    } else if text.contains("afternoon") {
        (14, 0)
    } else if text.contains("evening") {
        (19, 0)
    } else if text.contains("night") {
        (21, 0)
    } else {
        (9, 0)
    };
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
}

/// Extract a clock time: `3:30pm`, `3 pm`, `15:30`, `noon`, `midnight`.
pub fn extract_time_from_string(text: &str) -> Option<NaiveTime> {
    let text = normalize(text);

    if let Some(caps) = CLOCK_12H.captures(&text) {
        let h: u32 = caps[1].parse().ok()?;
        let m: u32 = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
        if (1..=12).contains(&h) {
            let h = match (&caps[3], h) {
                ("am", 12) => 0,
                ("am", h) => h,
                ("pm", 12) => 12,
                (_, h) => h + 12,
            };
            return hm(h, m);
        }
    }

    if let Some(caps) = CLOCK_24H.captures(&text) {
        let h: u32 = caps[1].parse().ok()?;
        let m: u32 = caps[2].parse().ok()?;
        return hm(h, m);
    }

    if NOON.is_match(&text) {
        return hm(12, 0);
    }
    if text.contains("midnight") {
        return hm(0, 0);
    }
    None
}

/// The calendar day a message refers to, if it names one.
///
/// Shares the day rules of [`parse_natural_time`] without needing a clock
/// time; used to bound searches ("cancel my meeting on friday").
pub fn extract_day(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let text = normalize(text);

    if let Some(caps) = ISO_PREFIX.captures(&text) {
        return NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        );
    }
    if text.contains("day after tomorrow") {
        return Some(today + Duration::days(2));
    }
    if text.contains("tomorrow") {
        return Some(today + Duration::days(1));
    }
    if text.contains("today") || text.contains("tonight") {
        return Some(today);
    }
    if let Some(caps) = NEXT_WEEKDAY.captures(&text) {
        let target = weekday_from(&caps[1])?;
        return Some(today + Duration::days(days_until_next(today.weekday(), target)));
    }
    if let Some(caps) = THIS_WEEKDAY.captures(&text) {
        let target = weekday_from(&caps[1])?;
        return Some(today + Duration::days(days_until_this(today.weekday(), target)));
    }
    if let Some(caps) = BARE_WEEKDAY.captures(&text) {
        let target = weekday_from(&caps[1])?;
        return Some(today + Duration::days(days_until_next(today.weekday(), target)));
    }
    None
}

/// Resolve a natural-language time against `now`.
///
/// Order: ISO prefix, relative day words, `next <weekday>`,
/// `this <weekday>`, `in N hours/minutes`, a bare clock time (rolled to
/// tomorrow once passed), then a bare weekday.
pub fn parse_natural_time(text: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let text = normalize(text);
    let today = now.date();
    let clock = extract_time_from_string(&text);

    if let Some(caps) = ISO_PREFIX.captures(&text) {
        let date = NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        )?;
        let time = match caps.get(4) {
            Some(h) => {
                let sec = caps.get(6).map_or(Some(0), |s| s.as_str().parse().ok())?;
                NaiveTime::from_hms_opt(h.as_str().parse().ok()?, caps[5].parse().ok()?, sec)?
            }
            None => {
                let rest = &text[caps.get(0).map_or(0, |m| m.end())..];
                extract_time_from_string(rest).unwrap_or_else(|| default_time_for(""))
            }
        };
        return Some(date.and_time(time));
    }

    let day_offset = if text.contains("day after tomorrow") {
        Some(2)
    } else if text.contains("tomorrow") {
        Some(1)
    } else if text.contains("today")
        || text.contains("tonight")
        || text.contains("this morning")
        || text.contains("this afternoon")
        || text.contains("this evening")
    {
        Some(0)
    } else {
        None
    };
    if let Some(offset) = day_offset {
        let time = clock.unwrap_or_else(|| default_time_for(&text));
        return Some((today + Duration::days(offset)).and_time(time));
    }

    if let Some(caps) = NEXT_WEEKDAY.captures(&text) {
        let target = weekday_from(&caps[1])?;
        let date = today + Duration::days(days_until_next(today.weekday(), target));
        return Some(date.and_time(clock.unwrap_or_else(|| default_time_for(&text))));
    }

    if let Some(caps) = THIS_WEEKDAY.captures(&text) {
        let target = weekday_from(&caps[1])?;
        let date = today + Duration::days(days_until_this(today.weekday(), target));
        return Some(date.and_time(clock.unwrap_or_else(|| default_time_for(&text))));
    }

    if let Some(caps) = IN_RELATIVE.captures(&text) {
        if let Some(minutes) = parse_duration(&caps[1]) {
            return Duration::try_minutes(minutes).and_then(|d| now.checked_add_signed(d));
        }
    }

    if let Some(time) = clock {
        let candidate = today.and_time(time);
        return Some(if candidate <= now {
            candidate + Duration::days(1)
        } else {
            candidate
        });
    }

    if let Some(caps) = BARE_WEEKDAY.captures(&text) {
        let target = weekday_from(&caps[1])?;
        let date = today + Duration::days(days_until_next(today.weekday(), target));
        return Some(date.and_time(default_time_for(&text)));
    }

    None
}

/// Parse a duration into whole minutes.
///
/// Accepts hour phrases (fractional hours round to the nearest minute),
/// minute phrases, both combined, or a bare integer taken as minutes.
pub fn parse_duration(text: &str) -> Option<i64> {
    let text = normalize(text);

    if text.contains("half an hour") || text.contains("half a hour") {
        return Some(30);
    }

    let mut total: Option<f64> = None;
    if let Some(caps) = HOURS.captures(&text) {
        let hours = match &caps[1] {
            "a" | "an" => 1.0,
            n => n.parse::<f64>().ok()?,
        };
        total = Some(hours * 60.0);
    }
    if let Some(caps) = MINUTES.captures(&text) {
        let minutes: f64 = caps[1].parse().ok()?;
        total = Some(total.unwrap_or(0.0) + minutes);
    }
    if let Some(t) = total {
        let t = t.round();
        return (t.is_finite() && (0.0..=MAX_DURATION_MINUTES as f64).contains(&t))
            .then_some(t as i64);
    }

    BARE_INT
        .captures(&text)
        .and_then(|caps| caps[1].parse::<i64>().ok())
        .filter(|m| *m <= MAX_DURATION_MINUTES)
}
