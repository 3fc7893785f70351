//! Best-effort natural-language date parsing.
//!
//! The temporal parser only falls back to this after the unambiguous unit
//! forms have failed. It is a trait so callers can swap in a different
//! natural-language engine without touching the scheduler.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Weekday,
};
use chrono_tz::Tz;

/// Result of a fuzzy parse: either a wall-clock time that still needs a zone,
/// or an instant that carried its own offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuzzyDate {
    Naive(NaiveDateTime),
    Fixed(DateTime<FixedOffset>),
}

/// Turns a lower-cased, trimmed phrase into a date-time.
///
/// `now` is the current instant in the caller's zone; relative words such as
/// "tomorrow" are resolved against its calendar date.
pub trait FuzzyDateParser: Send + Sync {
    fn parse(&self, text: &str, now: &DateTime<Tz>) -> Option<FuzzyDate>;
}

/// Default phrase parser: ISO/RFC 3339 timestamps, `today`/`tomorrow`/`tonight`,
/// weekday and month names, and clock times such as `3pm` or `15:30`.
///
/// Phrases containing any word it does not know (for example "next week")
/// are rejected rather than guessed at.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalDateParser;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dt%H:%M:%S",
    "%Y-%m-%dt%H:%M",
    "%Y/%m/%d %H:%M",
];

const FILLER: &[&str] = &["on", "the", "of"];

impl FuzzyDateParser for NaturalDateParser {
    fn parse(&self, text: &str, now: &DateTime<Tz>) -> Option<FuzzyDate> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(&text.to_ascii_uppercase()) {
            return Some(FuzzyDate::Fixed(dt));
        }
        for fmt in NAIVE_DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
                return Some(FuzzyDate::Naive(dt));
            }
        }

        parse_phrase(text, now.date_naive()).map(FuzzyDate::Naive)
    }
}

/// Word-by-word parse of phrases like "tomorrow at 3pm" or "dec 25 10:00".
fn parse_phrase(text: &str, today: NaiveDate) -> Option<NaiveDateTime> {
    let cleaned = text.replace(',', " ");
    let tokens: Vec<&str> = cleaned
        .split_whitespace()
        .filter(|t| !FILLER.contains(t))
        .collect();

    let mut date: Option<NaiveDate> = None;
    let mut time: Option<NaiveTime> = None;
    let mut default_time: Option<NaiveTime> = None;
    let mut month: Option<u32> = None;
    let mut day: Option<u32> = None;
    let mut year: Option<i32> = None;
    let mut after_at = false;
    let mut next_marker = false;

    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];
        let following = tokens.get(i + 1).copied();

        if token == "at" {
            after_at = true;
            i += 1;
            continue;
        }

        if token == "next" {
            next_marker = true;
            i += 1;
            continue;
        }

        if next_marker && parse_weekday(token).is_none() {
            return None;
        }

        match token {
            "today" => set_once(&mut date, today)?,
            "tomorrow" => set_once(&mut date, today + Duration::days(1))?,
            "tonight" => {
                set_once(&mut date, today)?;
                default_time = NaiveTime::from_hms_opt(20, 0, 0);
            }
            _ => {
                if let Some(wd) = parse_weekday(token) {
                    set_once(&mut date, next_weekday(today, wd, next_marker))?;
                    next_marker = false;
                } else if let Some(m) = parse_month(token) {
                    if month.replace(m).is_some() {
                        return None;
                    }
                } else if let Ok(d) = NaiveDate::parse_from_str(token, "%Y-%m-%d") {
                    set_once(&mut date, d)?;
                } else if let Some(meridiem) = following.and_then(parse_meridiem_word) {
                    // "3 pm" split across two tokens.
                    set_once(&mut time, parse_clock(&format!("{token}{meridiem}"))?)?;
                    i += 1;
                } else if is_clock_token(token) {
                    set_once(&mut time, parse_clock(token)?)?;
                } else if let Ok(n) = token.parse::<u32>() {
                    if after_at && time.is_none() && n <= 23 {
                        time = NaiveTime::from_hms_opt(n, 0, 0);
                    } else if n >= 1000 {
                        if year.replace(n as i32).is_some() {
                            return None;
                        }
                    } else if (1..=31).contains(&n) && day.is_none() {
                        day = Some(n);
                    } else {
                        return None;
                    }
                } else if let Some(n) = strip_ordinal(token) {
                    if day.replace(n).is_some() {
                        return None;
                    }
                } else {
                    return None;
                }
            }
        }
        after_at = false;
        i += 1;
    }

    if next_marker {
        return None;
    }

    match (month, day) {
        (Some(m), Some(d)) => {
            let calendar = NaiveDate::from_ymd_opt(year.unwrap_or_else(|| today.year()), m, d)?;
            set_once(&mut date, calendar)?;
        }
        (None, None) if year.is_none() => {}
        _ => return None,
    }

    if date.is_none() && time.is_none() {
        return None;
    }

    let date = date.unwrap_or(today);
    let time = time.or(default_time).unwrap_or_default();
    Some(date.and_time(time))
}

fn set_once<T>(slot: &mut Option<T>, value: T) -> Option<()> {
    if slot.is_some() {
        return None;
    }
    *slot = Some(value);
    Some(())
}

/// Parse a clock time: `9`, `9am`, `9:30`, `9:30pm`, `21:00:15`, `noon`, `midnight`.
///
/// Spaces are ignored, so `"9 am"` works too.
pub fn parse_clock(text: &str) -> Option<NaiveTime> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    match compact.as_str() {
        "noon" => return NaiveTime::from_hms_opt(12, 0, 0),
        "midnight" => return Some(NaiveTime::default()),
        _ => {}
    }

    let (digits, pm) = if let Some(rest) = strip_meridiem(&compact, "am") {
        (rest, Some(false))
    } else if let Some(rest) = strip_meridiem(&compact, "pm") {
        (rest, Some(true))
    } else {
        (compact.as_str(), None)
    };

    let mut parts = digits.split(':');
    let hour: u32 = parts.next()?.parse().ok()?;
    let minute: u32 = match parts.next() {
        Some(m) if m.len() == 2 => m.parse().ok()?,
        Some(_) => return None,
        None => 0,
    };
    let second: u32 = match parts.next() {
        Some(s) if s.len() == 2 => s.parse().ok()?,
        Some(_) => return None,
        None => 0,
    };
    if parts.next().is_some() {
        return None;
    }

    let hour = match pm {
        Some(is_pm) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            hour % 12 + if is_pm { 12 } else { 0 }
        }
        None => hour,
    };
    NaiveTime::from_hms_opt(hour, minute, second)
}

fn strip_meridiem<'a>(text: &'a str, suffix: &str) -> Option<&'a str> {
    text.strip_suffix(suffix)
        .or_else(|| match suffix {
            "am" => text.strip_suffix("a.m."),
            _ => text.strip_suffix("p.m."),
        })
        .filter(|rest| !rest.is_empty())
}

fn parse_meridiem_word(token: &str) -> Option<&'static str> {
    match token {
        "am" | "a.m." => Some("am"),
        "pm" | "p.m." => Some("pm"),
        _ => None,
    }
}

fn is_clock_token(token: &str) -> bool {
    token == "noon"
        || token == "midnight"
        || token.contains(':')
        || ((token.ends_with("am") || token.ends_with("pm") || token.ends_with('.'))
            && token.starts_with(|c: char| c.is_ascii_digit()))
}

fn strip_ordinal(token: &str) -> Option<u32> {
    ["st", "nd", "rd", "th"]
        .iter()
        .find_map(|suffix| token.strip_suffix(suffix))
        .and_then(|n| n.parse::<u32>().ok())
        .filter(|n| (1..=31).contains(n))
}

fn parse_weekday(token: &str) -> Option<Weekday> {
    let wd = match token {
        "monday" | "mon" => Weekday::Mon,
        "tuesday" | "tue" | "tues" => Weekday::Tue,
        "wednesday" | "wed" => Weekday::Wed,
        "thursday" | "thu" | "thurs" => Weekday::Thu,
        "friday" | "fri" => Weekday::Fri,
        "saturday" | "sat" => Weekday::Sat,
        "sunday" | "sun" => Weekday::Sun,
        _ => return None,
    };
    Some(wd)
}

fn parse_month(token: &str) -> Option<u32> {
    let m = match token.trim_end_matches('.') {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sep" | "sept" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(m)
}

/// Next date falling on `weekday`, today included unless `strictly_after`.
fn next_weekday(today: NaiveDate, weekday: Weekday, strictly_after: bool) -> NaiveDate {
    let current = today.weekday().num_days_from_monday() as i64;
    let target = weekday.num_days_from_monday() as i64;
    let mut ahead = (target - current).rem_euclid(7);
    if ahead == 0 && strictly_after {
        ahead = 7;
    }
    today + Duration::days(ahead)
}
