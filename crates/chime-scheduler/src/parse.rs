use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{ParseError, INSTANT_HELP};
use crate::fuzzy::{FuzzyDate, FuzzyDateParser, NaturalDateParser};

/// Resolve an IANA zone name such as `"America/New_York"` or `"UTC"`.
pub fn resolve_timezone(name: &str) -> Result<Tz, ParseError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ParseError::UnknownTimezone(name.to_string()))
}

/// Parse `expression` into an instant in `timezone`, relative to the current time.
///
/// The result is not checked against "now"; callers creating jobs reject past
/// instants themselves with [`ensure_future`].
pub fn parse_instant(expression: &str, timezone: &str) -> Result<DateTime<Tz>, ParseError> {
    let tz = resolve_timezone(timezone)?;
    parse_instant_at(expression, Utc::now().with_timezone(&tz), &NaturalDateParser)
}

/// Clock-injected core of [`parse_instant`].
///
/// Strategies, first match wins:
/// 1. shorthand units: `30s`, `5m`, `1.5h`, `2d`
/// 2. spelled-out units: `5 minutes`, `2 hours from now`, `1 week`
/// 3. the fuzzy phrase parser, localised to `now`'s zone when it yields no offset
pub fn parse_instant_at(
    expression: &str,
    now: DateTime<Tz>,
    fuzzy: &dyn FuzzyDateParser,
) -> Result<DateTime<Tz>, ParseError> {
    let lowered = expression.trim().to_lowercase();
    let when = lowered
        .strip_prefix("in ")
        .map(str::trim)
        .unwrap_or(lowered.as_str());

    if let Some(delta) = shorthand_offset(when).or_else(|| spelled_offset(when)) {
        return now.checked_add_signed(delta).ok_or_else(unrecognized);
    }

    let tz = now.timezone();
    match fuzzy.parse(when, &now) {
        Some(FuzzyDate::Fixed(dt)) => Ok(dt.with_timezone(&tz)),
        // A wall-clock time inside a DST gap has no instant; treat it as not understood.
        Some(FuzzyDate::Naive(naive)) => tz
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(unrecognized),
        None => Err(unrecognized()),
    }
}

/// Reject instants that are not strictly later than `now`.
pub fn ensure_future(at: &DateTime<Tz>, now: &DateTime<Tz>) -> Result<(), ParseError> {
    if at > now {
        Ok(())
    } else {
        Err(ParseError::PastInstant)
    }
}

fn unrecognized() -> ParseError {
    ParseError::Unrecognized(INSTANT_HELP.to_string())
}

/// `"<number><s|m|h|d>"`, e.g. `30s` or `0.5h`.
fn shorthand_offset(when: &str) -> Option<Duration> {
    let unit = when.chars().last()?;
    if when.len() < 2 {
        return None;
    }
    let secs_per_unit = match unit {
        's' => 1.0,
        'm' => 60.0,
        'h' => 3_600.0,
        'd' => 86_400.0,
        _ => return None,
    };
    let value: f64 = when[..when.len() - 1].trim().parse().ok()?;
    seconds_to_duration(value * secs_per_unit)
}

/// `"<number> <unit-word> ..."`, e.g. `5 minutes` or `2 hours from now`.
fn spelled_offset(when: &str) -> Option<Duration> {
    let mut parts = when.split_whitespace();
    let value: f64 = parts.next()?.parse().ok()?;
    let secs_per_unit = match parts.next()? {
        "second" | "seconds" | "sec" | "secs" => 1.0,
        "minute" | "minutes" | "min" | "mins" => 60.0,
        "hour" | "hours" | "hr" | "hrs" => 3_600.0,
        "day" | "days" => 86_400.0,
        "week" | "weeks" => 604_800.0,
        _ => return None,
    };
    seconds_to_duration(value * secs_per_unit)
}

fn seconds_to_duration(secs: f64) -> Option<Duration> {
    if !secs.is_finite() {
        return None;
    }
    let millis = (secs * 1_000.0).round();
    if millis.abs() >= i64::MAX as f64 {
        return None;
    }
    Duration::try_milliseconds(millis as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn now() -> DateTime<Tz> {
        Tz::UTC.with_ymd_and_hms(2026, 10, 16, 10, 0, 0).unwrap()
    }

    fn parse(expr: &str) -> Result<DateTime<Tz>, ParseError> {
        parse_instant_at(expr, now(), &NaturalDateParser)
    }

    #[test]
    fn shorthand_units() {
        assert_eq!(parse("30s").unwrap(), now() + Duration::seconds(30));
        assert_eq!(parse("5m").unwrap(), now() + Duration::minutes(5));
        assert_eq!(parse("2h").unwrap(), now() + Duration::hours(2));
        assert_eq!(parse("3d").unwrap(), now() + Duration::days(3));
        assert_eq!(parse("1.5h").unwrap(), now() + Duration::minutes(90));
    }

    #[test]
    fn in_prefix_and_case_are_ignored() {
        assert_eq!(parse("in 5m").unwrap(), now() + Duration::minutes(5));
        assert_eq!(parse("  IN 10S ").unwrap(), now() + Duration::seconds(10));
    }

    #[test]
    fn spelled_out_units() {
        assert_eq!(parse("5 minutes").unwrap(), now() + Duration::minutes(5));
        assert_eq!(parse("in 2 hours").unwrap(), now() + Duration::hours(2));
        assert_eq!(parse("1 week").unwrap(), now() + Duration::weeks(1));
        assert_eq!(parse("45 secs").unwrap(), now() + Duration::seconds(45));
        assert_eq!(parse("2 hrs from now").unwrap(), now() + Duration::hours(2));
    }

    #[test]
    fn clock_suffixes_are_not_shorthand() {
        // "5pm" ends in 'm' but is a clock time, not five minutes.
        let at = parse("5pm").unwrap();
        assert_eq!(at, Tz::UTC.with_ymd_and_hms(2026, 10, 16, 17, 0, 0).unwrap());
    }

    #[test]
    fn fuzzy_result_is_localised() {
        let tz: Tz = "America/New_York".parse().unwrap();
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 10, 0, 0).unwrap().with_timezone(&tz);
        let at = parse_instant_at("tomorrow at 3pm", now, &NaturalDateParser).unwrap();
        // 15:00 EDT is 19:00 UTC.
        assert_eq!(
            at.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2026, 10, 17, 19, 0, 0).unwrap()
        );
    }

    #[test]
    fn explicit_offset_is_respected() {
        let at = parse("2026-12-25T10:00:00+01:00").unwrap();
        assert_eq!(
            at.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2026, 12, 25, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn dst_gap_is_unrecognised() {
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        let now = Utc.with_ymd_and_hms(2027, 3, 27, 12, 0, 0).unwrap().with_timezone(&tz);
        // 2027-03-28 02:30 does not exist in Berlin.
        let err = parse_instant_at("2027-03-28 02:30", now, &NaturalDateParser).unwrap_err();
        assert!(matches!(err, ParseError::Unrecognized(_)));
    }

    #[test]
    fn garbage_lists_accepted_forms() {
        match parse("whenever you like") {
            Err(ParseError::Unrecognized(help)) => {
                assert!(help.contains("30s"));
                assert!(help.contains("tomorrow at 3pm"));
            }
            other => panic!("expected Unrecognized, got {other:?}"),
        }
    }

    #[test]
    fn non_finite_magnitudes_fall_through() {
        assert!(parse("infs").is_err());
        assert!(parse("nan minutes").is_err());
        assert!(parse("1e300d").is_err());
    }

    #[test]
    fn unknown_timezone_is_an_error() {
        assert_eq!(
            parse_instant("5m", "Mars/Olympus_Mons"),
            Err(ParseError::UnknownTimezone("Mars/Olympus_Mons".to_string()))
        );
    }

    #[test]
    fn past_instants_are_flagged_by_the_caller_check() {
        let past = parse("2020-01-01 00:00").unwrap();
        assert_eq!(ensure_future(&past, &now()), Err(ParseError::PastInstant));
        assert_eq!(ensure_future(&now(), &now()), Err(ParseError::PastInstant));
        assert!(ensure_future(&(now() + Duration::seconds(1)), &now()).is_ok());
    }

    proptest! {
        #[test]
        fn shorthand_matches_arithmetic(n in 1u32..100_000, unit_idx in 0usize..4, upper in any::<bool>()) {
            let (unit, secs) = [('s', 1i64), ('m', 60), ('h', 3_600), ('d', 86_400)][unit_idx];
            let mut expr = format!("{n}{unit}");
            if upper {
                expr = expr.to_uppercase();
            }
            let at = parse(&expr).unwrap();
            prop_assert_eq!(at, now() + Duration::seconds(n as i64 * secs));
        }
    }
}
