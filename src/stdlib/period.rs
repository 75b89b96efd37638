//! The `period` namespace: ISO-8601 `PnYnMnDTnHnMnS` strings, calendar
//! periods between dates, and the unit accumulators.

use super::common::*;
use crate::error::{Error, Result};
use crate::value::Value;
use chrono::Datelike;
use once_cell::sync::Lazy;
use regex::Regex;

static PERIOD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<sign>[+-]?)P(?:(?P<years>[+-]?\d+)Y)?(?:(?P<months>[+-]?\d+)M)?(?:(?P<days>[+-]?\d+)D)?(?:(?P<time>T)(?:(?P<hours>[+-]?\d+)H)?(?:(?P<minutes>[+-]?\d+)M)?(?:(?P<seconds>[+-]?\d+)S)?)?$",
    )
    .unwrap()
});

/// A parsed ISO-8601 period/duration. `has_time` records whether a `T`
/// section was present, which drives the calendar-vs-duration dispatch in
/// `datetime.plus`/`datetime.minus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IsoPeriod {
    pub years: i64,
    pub months: i64,
    pub days: i64,
    pub seconds: i64,
    pub has_time: bool,
}

pub(crate) fn parse_period(s: &str) -> Result<IsoPeriod> {
    let captures = PERIOD_PATTERN
        .captures(s)
        .ok_or_else(|| Error::Domain(format!("Could not parse period: {}", s)))?;
    let component = |name: &str| -> i64 {
        captures
            .name(name)
            .and_then(|m| m.as_str().parse::<i64>().ok())
            .unwrap_or(0)
    };
    let mut period = IsoPeriod {
        years: component("years"),
        months: component("months"),
        days: component("days"),
        seconds: component("hours") * 3600 + component("minutes") * 60 + component("seconds"),
        has_time: captures.name("time").is_some(),
    };
    let empty = period.years == 0
        && period.months == 0
        && period.days == 0
        && period.seconds == 0
        && !period.has_time;
    if empty && s != "P0D" {
        return Err(Error::Domain(format!("Could not parse period: {}", s)));
    }
    if captures.name("sign").map(|m| m.as_str()) == Some("-") {
        period.years = -period.years;
        period.months = -period.months;
        period.days = -period.days;
        period.seconds = -period.seconds;
    }
    Ok(period)
}

pub(crate) fn render_calendar(years: i64, months: i64, days: i64) -> String {
    if years == 0 && months == 0 && days == 0 {
        return "P0D".to_string();
    }
    let mut out = String::from("P");
    if years != 0 {
        out.push_str(&format!("{}Y", years));
    }
    if months != 0 {
        out.push_str(&format!("{}M", months));
    }
    if days != 0 {
        out.push_str(&format!("{}D", days));
    }
    out
}

pub(crate) fn render_duration(total_seconds: i64) -> String {
    if total_seconds == 0 {
        return "PT0S".to_string();
    }
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    let mut out = String::from("PT");
    if hours != 0 {
        out.push_str(&format!("{}H", hours));
    }
    if minutes != 0 {
        out.push_str(&format!("{}M", minutes));
    }
    if seconds != 0 {
        out.push_str(&format!("{}S", seconds));
    }
    out
}

/// The calendar period between two datetimes' date parts; negative when the
/// first is later.
/// Usage: between("2020-01-01T00:00:00Z", "2020-03-15T00:00:00Z") -> "P2M14D"
pub fn between(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let start = super::datetime::parse_iso(as_str(&args[0])?)?.date_naive();
    let end = super::datetime::parse_iso(as_str(&args[1])?)?.date_naive();

    let mut total_months = (end.year() as i64 * 12 + end.month0() as i64)
        - (start.year() as i64 * 12 + start.month0() as i64);
    let mut days = end.day() as i64 - start.day() as i64;
    if total_months > 0 && days < 0 {
        total_months -= 1;
        let shifted = super::datetime::shift_months_naive(start, total_months)?;
        days = (end - shifted).num_days();
    } else if total_months < 0 && days > 0 {
        total_months += 1;
        days -= days_in_month(end.year(), end.month());
    }
    Ok(Value::string(render_calendar(
        total_months / 12,
        total_months % 12,
        days,
    )))
}

fn days_in_month(year: i32, month: u32) -> i64 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let first = chrono::NaiveDate::from_ymd_opt(year, month, 1);
    let next = chrono::NaiveDate::from_ymd_opt(next_year, next_month, 1);
    match (first, next) {
        (Some(first), Some(next)) => (next - first).num_days(),
        _ => 30,
    }
}

/// Accumulate `days`/`hours`/`minutes`/`seconds` fields into a duration.
/// Usage: duration({days: 1, hours: 1}) -> "PT25H"
pub fn duration(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let obj = as_obj(&args[0])?;
    let mut total = 0i64;
    for (key, member) in obj.visible_entries() {
        let amount = as_int(&member.value.force()?)?;
        total += match key {
            "days" => amount * 86_400,
            "hours" => amount * 3_600,
            "minutes" => amount * 60,
            "seconds" => amount,
            other => {
                return Err(Error::Domain(format!(
                    "Unknown duration field: {}",
                    other
                )))
            }
        };
    }
    Ok(Value::string(render_duration(total)))
}

/// Accumulate `years`/`months`/`days` fields into a calendar period.
/// Usage: period({years: 1, months: 2}) -> "P1Y2M"
pub fn period(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let obj = as_obj(&args[0])?;
    let mut years = 0i64;
    let mut months = 0i64;
    let mut days = 0i64;
    for (key, member) in obj.visible_entries() {
        let amount = as_int(&member.value.force()?)?;
        match key {
            "years" => years += amount,
            "months" => months += amount,
            "days" => days += amount,
            other => {
                return Err(Error::Domain(format!("Unknown period field: {}", other)))
            }
        }
    }
    Ok(Value::string(render_calendar(years, months, days)))
}

/// Usage: years(2) -> "P2Y"
pub fn years(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::string(render_calendar(as_int(&args[0])?, 0, 0)))
}

/// Usage: months(3) -> "P3M"
pub fn months(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::string(render_calendar(0, as_int(&args[0])?, 0)))
}

/// Usage: days(5) -> "P5D"
pub fn days(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::string(render_calendar(0, 0, as_int(&args[0])?)))
}

/// Usage: hours(5) -> "PT5H"
pub fn hours(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::string(render_duration(as_int(&args[0])? * 3_600)))
}

/// Usage: minutes(5) -> "PT5M"
pub fn minutes(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::string(render_duration(as_int(&args[0])? * 60)))
}

/// Usage: seconds(5) -> "PT5S"
pub fn seconds(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::string(render_duration(as_int(&args[0])?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::string(text)
    }

    fn num(n: f64) -> Value {
        Value::Num(n)
    }

    fn obj(pairs: Vec<(&str, Value)>) -> Value {
        Value::object_from_pairs(
            pairs
                .into_iter()
                .map(|(key, value)| (key.to_string(), value)),
        )
    }

    #[test]
    fn test_parse_period_components() {
        let p = parse_period("P1Y2M3DT4H5M6S").unwrap();
        assert_eq!(p.years, 1);
        assert_eq!(p.months, 2);
        assert_eq!(p.days, 3);
        assert_eq!(p.seconds, 4 * 3600 + 5 * 60 + 6);
        assert!(p.has_time);

        let p = parse_period("P5D").unwrap();
        assert!(!p.has_time);
        assert_eq!(p.days, 5);

        let p = parse_period("-P1M").unwrap();
        assert_eq!(p.months, -1);

        assert!(parse_period("5 days").is_err());
        assert!(parse_period("P").is_err());
    }

    #[test]
    fn test_between_forward_and_backward() {
        assert_eq!(
            between(&[s("2020-01-01T00:00:00Z"), s("2020-03-15T00:00:00Z")]).unwrap(),
            s("P2M14D")
        );
        assert_eq!(
            between(&[s("2020-03-15T00:00:00Z"), s("2020-01-01T00:00:00Z")]).unwrap(),
            s("P-2M-14D")
        );
        assert_eq!(
            between(&[s("2020-01-01T00:00:00Z"), s("2020-01-01T10:00:00Z")]).unwrap(),
            s("P0D")
        );
    }

    #[test]
    fn test_between_borrows_days_from_month() {
        // Jan 31 -> Mar 1: one month (Jan 31 -> Feb 29 in a leap year), then one day
        assert_eq!(
            between(&[s("2020-01-31T00:00:00Z"), s("2020-03-01T00:00:00Z")]).unwrap(),
            s("P1M1D")
        );
    }

    #[test]
    fn test_duration_accumulates_into_hours() {
        assert_eq!(
            duration(&[obj(vec![("days", num(1.0)), ("hours", num(1.0))])]).unwrap(),
            s("PT25H")
        );
        assert_eq!(
            duration(&[obj(vec![("minutes", num(90.0))])]).unwrap(),
            s("PT1H30M")
        );
        assert_eq!(duration(&[obj(vec![])]).unwrap(), s("PT0S"));
    }

    #[test]
    fn test_period_accumulates() {
        assert_eq!(
            period(&[obj(vec![("years", num(1.0)), ("months", num(2.0))])]).unwrap(),
            s("P1Y2M")
        );
        assert_eq!(period(&[obj(vec![])]).unwrap(), s("P0D"));
    }

    #[test]
    fn test_unit_helpers() {
        assert_eq!(years(&[num(2.0)]).unwrap(), s("P2Y"));
        assert_eq!(months(&[num(3.0)]).unwrap(), s("P3M"));
        assert_eq!(days(&[num(5.0)]).unwrap(), s("P5D"));
        assert_eq!(hours(&[num(5.0)]).unwrap(), s("PT5H"));
        assert_eq!(minutes(&[num(5.0)]).unwrap(), s("PT5M"));
        assert_eq!(seconds(&[num(5.0)]).unwrap(), s("PT5S"));
        assert_eq!(days(&[num(-5.0)]).unwrap(), s("P-5D"));
        assert_eq!(hours(&[num(-2.0)]).unwrap(), s("PT-2H"));
    }

    #[test]
    fn test_negative_duration_rendering() {
        assert_eq!(render_duration(-5400), "PT-1H-30M");
    }
}
