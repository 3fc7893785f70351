//! Recurrence patterns compiled into triggers.
//!
//! A pattern is matched against an ordered rule table; the first rule whose
//! predicate accepts the lower-cased text builds the trigger. The cron path is
//! last so that phrases like "every hour" never reach the cron parser.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;

use crate::error::{ParseError, PATTERN_HELP};
use crate::fuzzy::parse_clock;
use crate::parse::resolve_timezone;

/// Hour used by the daily and weekly rules when the pattern names no time.
pub const DEFAULT_HOUR: u32 = 9;

/// A compiled recurrence, evaluated in its own zone.
#[derive(Debug, Clone)]
pub struct Trigger {
    rule: Rule,
    tz: Tz,
}

#[derive(Debug, Clone)]
enum Rule {
    Daily { hour: u32, minute: u32 },
    Weekly { weekday: Weekday, hour: u32, minute: u32 },
    Hourly { minute: u32 },
    Cron { schedule: cron::Schedule, expr: String },
    #[cfg(test)]
    Every { period: Duration },
    #[cfg(test)]
    Broken,
}

impl Trigger {
    /// First fire instant strictly after `after`, or `None` if the
    /// recurrence has no further occurrence.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match &self.rule {
            Rule::Daily { hour, minute } => {
                self.next_wall_clock(after, 2, NaiveTime::from_hms_opt(*hour, *minute, 0)?, None)
            }
            Rule::Weekly {
                weekday,
                hour,
                minute,
            } => self.next_wall_clock(
                after,
                14,
                NaiveTime::from_hms_opt(*hour, *minute, 0)?,
                Some(*weekday),
            ),
            Rule::Hourly { minute } => {
                let local = after.with_timezone(&self.tz);
                let into_hour = Duration::seconds(i64::from(local.minute() * 60 + local.second()))
                    + Duration::nanoseconds(i64::from(local.nanosecond()));
                let mut next = after - into_hour + Duration::minutes(i64::from(*minute));
                if next <= after {
                    next += Duration::hours(1);
                }
                Some(next)
            }
            Rule::Cron { schedule, .. } => schedule
                .after(&after.with_timezone(&self.tz))
                .next()
                .map(|dt| dt.with_timezone(&Utc)),
            #[cfg(test)]
            Rule::Every { period } => Some(after + *period),
            #[cfg(test)]
            Rule::Broken => panic!("trigger evaluation failed"),
        }
    }

    /// Short normalised description, e.g. `daily at 09:00 (UTC)`.
    pub fn describe(&self) -> String {
        self.to_string()
    }

    /// Walk local calendar days from `after`'s date and return the first
    /// existing wall-clock `time` later than `after`. Days where `time` falls
    /// in a DST gap are skipped.
    fn next_wall_clock(
        &self,
        after: DateTime<Utc>,
        horizon_days: i64,
        time: NaiveTime,
        weekday: Option<Weekday>,
    ) -> Option<DateTime<Utc>> {
        let start = after.with_timezone(&self.tz).date_naive();
        (0..=horizon_days)
            .filter_map(|offset| start.checked_add_signed(Duration::days(offset)))
            .filter(|day| weekday.map_or(true, |w| day.weekday() == w))
            .filter_map(|day| self.tz.from_local_datetime(&day.and_time(time)).earliest())
            .map(|dt| dt.with_timezone(&Utc))
            .find(|dt| *dt > after)
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.rule {
            Rule::Daily { hour, minute } => write!(f, "daily at {hour:02}:{minute:02}")?,
            Rule::Weekly {
                weekday,
                hour,
                minute,
            } => write!(f, "weekly on {weekday} at {hour:02}:{minute:02}")?,
            Rule::Hourly { minute } => write!(f, "hourly at :{minute:02}")?,
            Rule::Cron { expr, .. } => write!(f, "cron '{expr}'")?,
            #[cfg(test)]
            Rule::Every { period } => write!(f, "every {}ms", period.num_milliseconds())?,
            #[cfg(test)]
            Rule::Broken => write!(f, "broken")?,
        }
        write!(f, " ({})", self.tz)
    }
}

#[cfg(test)]
impl Trigger {
    /// Fires every `period`, for exercising the engine at sub-second scale.
    pub(crate) fn every(period: Duration) -> Self {
        Self {
            rule: Rule::Every { period },
            tz: Tz::UTC,
        }
    }

    /// Panics whenever the next instant is requested.
    pub(crate) fn broken() -> Self {
        Self {
            rule: Rule::Broken,
            tz: Tz::UTC,
        }
    }
}

/// Compile `pattern` for the zone named by `timezone`.
pub fn compile_pattern(pattern: &str, timezone: &str) -> Result<Trigger, ParseError> {
    compile_pattern_in(pattern, resolve_timezone(timezone)?)
}

/// Compile `pattern` for an already resolved zone.
pub fn compile_pattern_in(pattern: &str, tz: Tz) -> Result<Trigger, ParseError> {
    let text = pattern.trim().to_lowercase();
    let rule = RULES
        .iter()
        .find(|r| (r.applies)(&text))
        .ok_or_else(unrecognized)
        .and_then(|r| (r.build)(&text))?;
    Ok(Trigger { rule, tz })
}

struct RecurrenceRule {
    applies: fn(&str) -> bool,
    build: fn(&str) -> Result<Rule, ParseError>,
}

/// Evaluated top to bottom; first match wins.
const RULES: &[RecurrenceRule] = &[
    RecurrenceRule {
        applies: is_daily,
        build: build_daily,
    },
    RecurrenceRule {
        applies: is_weekly,
        build: build_weekly,
    },
    RecurrenceRule {
        applies: is_hourly,
        build: build_hourly,
    },
    RecurrenceRule {
        applies: is_cron_line,
        build: build_cron,
    },
];

fn is_daily(text: &str) -> bool {
    text.contains("daily") || text.contains("every day")
}

fn is_weekly(text: &str) -> bool {
    text.contains("monday") || text.contains("weekly")
}

fn is_hourly(text: &str) -> bool {
    text.contains("hour")
}

fn is_cron_line(text: &str) -> bool {
    text.split_whitespace().count() == 5
}

fn build_daily(text: &str) -> Result<Rule, ParseError> {
    Ok(Rule::Daily {
        hour: hour_after_at(text)?,
        minute: 0,
    })
}

fn build_weekly(text: &str) -> Result<Rule, ParseError> {
    Ok(Rule::Weekly {
        weekday: Weekday::Mon,
        hour: hour_after_at(text)?,
        minute: 0,
    })
}

fn build_hourly(_text: &str) -> Result<Rule, ParseError> {
    Ok(Rule::Hourly { minute: 0 })
}

fn build_cron(text: &str) -> Result<Rule, ParseError> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    let dow = unix_weekdays_to_cron(fields[4]).ok_or_else(|| {
        ParseError::Unrecognized(format!(
            "Invalid cron expression: bad day-of-week '{}'. {PATTERN_HELP}",
            fields[4]
        ))
    })?;
    // The cron crate wants seconds first and an optional trailing year.
    let expr = format!(
        "0 {} {} {} {} {} *",
        fields[0], fields[1], fields[2], fields[3], dow
    );
    let schedule = cron::Schedule::from_str(&expr).map_err(|e| {
        ParseError::Unrecognized(format!("Invalid cron expression: {e}. {PATTERN_HELP}"))
    })?;
    Ok(Rule::Cron {
        schedule,
        expr: fields.join(" "),
    })
}

/// Hour named after a standalone `at` word, or [`DEFAULT_HOUR`] if there is none.
fn hour_after_at(text: &str) -> Result<u32, ParseError> {
    let words: Vec<&str> = text.split_whitespace().collect();
    match words.iter().position(|w| *w == "at") {
        None => Ok(DEFAULT_HOUR),
        Some(i) => parse_clock(&words[i + 1..].join(" "))
            .map(|t| t.hour())
            .ok_or_else(unrecognized),
    }
}

/// Rewrite a Unix day-of-week field (0 or 7 = Sunday) into the cron crate's
/// numbering (1 = Sunday .. 7 = Saturday). Names pass through unchanged.
/// Ranges that wrap past Saturday are split in two; wrapped ranges with a step
/// have no equivalent and are rejected.
fn unix_weekdays_to_cron(field: &str) -> Option<String> {
    let parts = field
        .split(',')
        .map(|part| {
            let (range, step) = match part.split_once('/') {
                Some((range, step)) => (range, Some(step)),
                None => (part, None),
            };
            if range == "*" || range == "?" || range.chars().any(|c| c.is_ascii_alphabetic()) {
                return Some(part.to_string());
            }
            let suffix = step.map(|s| format!("/{s}")).unwrap_or_default();
            match range.split_once('-') {
                None => Some(format!("{}{suffix}", unix_day(range)?)),
                Some((lo, hi)) => {
                    let (lo, hi) = (unix_day(lo)?, unix_day(hi)?);
                    if lo <= hi {
                        Some(format!("{lo}-{hi}{suffix}"))
                    } else if step.is_none() {
                        Some(format!("{lo}-7,1-{hi}"))
                    } else {
                        None
                    }
                }
            }
        })
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join(","))
}

fn unix_day(text: &str) -> Option<u32> {
    let n: u32 = text.parse().ok()?;
    (n <= 7).then_some(n % 7 + 1)
}

fn unrecognized() -> ParseError {
    ParseError::Unrecognized(PATTERN_HELP.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn next(pattern: &str, tz: &str, after: DateTime<Utc>) -> DateTime<Utc> {
        compile_pattern(pattern, tz)
            .unwrap()
            .next_after(after)
            .unwrap()
    }

    #[test]
    fn daily_defaults_to_nine() {
        // 2026-10-16 is a Friday.
        assert_eq!(next("daily", "UTC", utc(2026, 10, 16, 8, 0)), utc(2026, 10, 16, 9, 0));
        assert_eq!(next("every day", "UTC", utc(2026, 10, 16, 9, 0)), utc(2026, 10, 17, 9, 0));
    }

    #[test]
    fn daily_at_reads_the_hour_only() {
        assert_eq!(
            next("Daily at 5:45pm", "UTC", utc(2026, 10, 16, 8, 0)),
            utc(2026, 10, 16, 17, 0)
        );
    }

    #[test]
    fn weekly_fires_on_monday() {
        assert_eq!(
            next("every monday at 10am", "UTC", utc(2026, 10, 16, 12, 0)),
            utc(2026, 10, 19, 10, 0)
        );
        assert_eq!(next("weekly", "UTC", utc(2026, 10, 19, 8, 0)), utc(2026, 10, 19, 9, 0));
        assert_eq!(next("weekly", "UTC", utc(2026, 10, 19, 9, 0)), utc(2026, 10, 26, 9, 0));
    }

    #[test]
    fn hourly_fires_on_the_hour() {
        assert_eq!(next("every hour", "UTC", utc(2026, 10, 16, 8, 15)), utc(2026, 10, 16, 9, 0));
        assert_eq!(next("hourly", "UTC", utc(2026, 10, 16, 9, 0)), utc(2026, 10, 16, 10, 0));
    }

    #[test]
    fn hourly_follows_local_hour_boundaries() {
        // Kolkata is UTC+05:30, so local :00 is UTC :30.
        assert_eq!(
            next("every hour", "Asia/Kolkata", utc(2026, 10, 16, 8, 0)),
            utc(2026, 10, 16, 8, 30)
        );
    }

    #[test]
    fn daily_is_evaluated_in_zone_across_dst() {
        // 09:00 EDT on Oct 16, then 09:00 EST after the Nov 1 change.
        assert_eq!(
            next("daily at 9am", "America/New_York", utc(2026, 10, 16, 10, 0)),
            utc(2026, 10, 16, 13, 0)
        );
        assert_eq!(
            next("daily at 9am", "America/New_York", utc(2026, 10, 31, 14, 0)),
            utc(2026, 11, 1, 14, 0)
        );
    }

    #[test]
    fn daily_skips_a_missing_wall_clock_hour() {
        // 02:00 does not exist in Berlin on 2027-03-28.
        assert_eq!(
            next("daily at 2am", "Europe/Berlin", utc(2027, 3, 27, 12, 0)),
            utc(2027, 3, 29, 0, 0)
        );
    }

    #[test]
    fn cron_line_uses_unix_weekdays() {
        assert_eq!(
            next("30 8 * * 1-5", "UTC", utc(2026, 10, 16, 7, 0)),
            utc(2026, 10, 16, 8, 30)
        );
        assert_eq!(
            next("30 8 * * 1-5", "UTC", utc(2026, 10, 16, 10, 0)),
            utc(2026, 10, 19, 8, 30)
        );
        assert_eq!(next("0 9 * * 0", "UTC", utc(2026, 10, 16, 10, 0)), utc(2026, 10, 18, 9, 0));
        assert_eq!(next("0 9 * * 7", "UTC", utc(2026, 10, 16, 10, 0)), utc(2026, 10, 18, 9, 0));
        assert_eq!(
            next("*/15 * * * *", "UTC", utc(2026, 10, 16, 10, 0)),
            utc(2026, 10, 16, 10, 15)
        );
    }

    #[test]
    fn cron_line_is_evaluated_in_zone() {
        assert_eq!(
            next("0 9 * * *", "Asia/Tokyo", utc(2026, 10, 16, 10, 0)),
            utc(2026, 10, 17, 0, 0)
        );
    }

    #[test]
    fn weekday_field_translation() {
        assert_eq!(unix_weekdays_to_cron("1-5").as_deref(), Some("2-6"));
        assert_eq!(unix_weekdays_to_cron("0,6").as_deref(), Some("1,7"));
        assert_eq!(unix_weekdays_to_cron("5-1").as_deref(), Some("6-7,1-2"));
        assert_eq!(unix_weekdays_to_cron("mon-fri").as_deref(), Some("mon-fri"));
        assert_eq!(unix_weekdays_to_cron("*/2").as_deref(), Some("*/2"));
        assert_eq!(unix_weekdays_to_cron("5-1/2"), None);
        assert_eq!(unix_weekdays_to_cron("8"), None);
    }

    #[test]
    fn rule_order_prefers_phrases_over_cron() {
        // Five words, but "daily" wins.
        let trigger = compile_pattern("remind me daily at noon", "UTC").unwrap();
        assert_eq!(trigger.describe(), "daily at 12:00 (UTC)");
    }

    #[test]
    fn at_marker_is_a_whole_word() {
        // "saturday" contains "at" but is not a marker; weekly rule, default hour.
        let trigger = compile_pattern("weekly saturday", "UTC").unwrap();
        assert_eq!(trigger.describe(), "weekly on Mon at 09:00 (UTC)");
    }

    #[test]
    fn bad_time_after_at_is_unrecognized() {
        assert!(matches!(
            compile_pattern("daily at teatime", "UTC"),
            Err(ParseError::Unrecognized(_))
        ));
    }

    #[test]
    fn invalid_cron_carries_reason() {
        match compile_pattern("99 * * * *", "UTC") {
            Err(ParseError::Unrecognized(msg)) => assert!(msg.starts_with("Invalid cron expression")),
            other => panic!("expected Unrecognized, got {other:?}"),
        }
    }

    #[test]
    fn unknown_forms_list_help() {
        assert_eq!(
            compile_pattern("whenever", "UTC").unwrap_err(),
            ParseError::Unrecognized(PATTERN_HELP.to_string())
        );
        assert_eq!(
            compile_pattern("daily", "Nowhere/Land").unwrap_err(),
            ParseError::UnknownTimezone("Nowhere/Land".to_string())
        );
    }

    proptest! {
        #[test]
        fn daily_nine_is_next_nine(offset in 0i64..86_400 * 60) {
            let trigger = compile_pattern("daily at 9am", "UTC").unwrap();
            let t = utc(2026, 1, 1, 0, 0) + Duration::seconds(offset);
            let fire = trigger.next_after(t).unwrap();
            let nine_today = t.date_naive().and_hms_opt(9, 0, 0).unwrap().and_utc();
            let expected = if t < nine_today { nine_today } else { nine_today + Duration::days(1) };
            prop_assert_eq!(fire, expected);
        }
    }
}
