//! The `datetime` namespace. Every datetime value is an ISO offset string
//! (`YYYY-MM-DDTHH:MM:SS[.fraction](Z|±HH:MM)`); functions parse, operate
//! via chrono, and re-serialize to the same shape.

use super::common::*;
use super::period::{parse_period, IsoPeriod};
use crate::error::{Error, Result};
use crate::value::Value;
use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, SecondsFormat,
    TimeZone, Utc,
};
use chrono_tz::Tz;

pub(crate) fn parse_iso(s: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s)
        .map_err(|e| Error::Domain(format!("Could not parse datetime {}: {}", s, e)))
}

pub(crate) fn format_iso(dt: &DateTime<FixedOffset>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn with_local(dt: &DateTime<FixedOffset>, local: NaiveDateTime) -> Result<DateTime<FixedOffset>> {
    dt.offset()
        .from_local_datetime(&local)
        .single()
        .ok_or_else(|| Error::Domain(format!("Invalid local time: {}", local)))
}

/// Clamp-aware month shifting on a date (Jan 31 + 1 month = Feb 28/29).
pub(crate) fn shift_months_naive(date: NaiveDate, months: i64) -> Result<NaiveDate> {
    let total = date.year() as i64 * 12 + date.month0() as i64 + months;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    let year = i32::try_from(year)
        .map_err(|_| Error::Domain(format!("Date out of range: year {}", year)))?;
    let mut day = date.day();
    loop {
        if let Some(shifted) = NaiveDate::from_ymd_opt(year, month, day) {
            return Ok(shifted);
        }
        if day <= 28 {
            return Err(Error::Domain(format!(
                "Date out of range: {}-{}-{}",
                year, month, day
            )));
        }
        day -= 1;
    }
}

/// Usage: atBeginningOfDay("2020-12-31T23:19:35Z") -> "2020-12-31T00:00:00Z"
pub fn at_beginning_of_day(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let dt = parse_iso(as_str(&args[0])?)?;
    let start = start_of_day(&dt, dt.date_naive())?;
    Ok(Value::string(format_iso(&start)))
}

/// Usage: atBeginningOfHour("2020-12-31T23:19:35Z") -> "2020-12-31T23:00:00Z"
pub fn at_beginning_of_hour(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let dt = parse_iso(as_str(&args[0])?)?;
    let local = dt
        .date_naive()
        .and_hms_opt(chrono::Timelike::hour(&dt), 0, 0)
        .ok_or_else(|| Error::Domain("Invalid time".to_string()))?;
    Ok(Value::string(format_iso(&with_local(&dt, local)?)))
}

/// Usage: atBeginningOfMonth("2020-12-31T23:19:35Z") -> "2020-12-01T00:00:00Z"
pub fn at_beginning_of_month(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let dt = parse_iso(as_str(&args[0])?)?;
    let first = dt
        .date_naive()
        .with_day(1)
        .ok_or_else(|| Error::Domain("Invalid date".to_string()))?;
    Ok(Value::string(format_iso(&start_of_day(&dt, first)?)))
}

/// Subtract the ISO day-of-week number (Mon=1..Sun=7), so a Sunday rolls
/// back a full week.
/// Usage: atBeginningOfWeek("2020-12-31T23:19:35Z") -> "2020-12-27T00:00:00Z"
pub fn at_beginning_of_week(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let dt = parse_iso(as_str(&args[0])?)?;
    let back = dt.weekday().number_from_monday() as i64;
    let date = dt.date_naive() - Duration::days(back);
    Ok(Value::string(format_iso(&start_of_day(&dt, date)?)))
}

/// Usage: atBeginningOfYear("2020-12-31T23:19:35Z") -> "2020-01-01T00:00:00Z"
pub fn at_beginning_of_year(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let dt = parse_iso(as_str(&args[0])?)?;
    let first = NaiveDate::from_ymd_opt(dt.year(), 1, 1)
        .ok_or_else(|| Error::Domain("Invalid date".to_string()))?;
    Ok(Value::string(format_iso(&start_of_day(&dt, first)?)))
}

fn start_of_day(dt: &DateTime<FixedOffset>, date: NaiveDate) -> Result<DateTime<FixedOffset>> {
    let local = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| Error::Domain("Invalid date".to_string()))?;
    with_local(dt, local)
}

/// Re-zone an instant into an IANA timezone.
/// Usage: changeTimeZone("2020-12-31T10:00:00Z", "America/New_York")
pub fn change_time_zone(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let dt = parse_iso(as_str(&args[0])?)?;
    let zone = parse_zone(as_str(&args[1])?)?;
    let moved = dt.with_timezone(&zone);
    let fixed = moved.with_timezone(&moved.offset().fix());
    Ok(Value::string(format_iso(&fixed)))
}

fn parse_zone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| Error::Domain(format!("Unknown timezone: {}", name)))
}

/// Instant comparison: -1, 0, or 1.
/// Usage: compare("2020-01-01T00:00:00Z", "2020-01-02T00:00:00Z") -> -1
pub fn compare(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let a = parse_iso(as_str(&args[0])?)?;
    let b = parse_iso(as_str(&args[1])?)?;
    Ok(Value::Num(match a.cmp(&b) {
        std::cmp::Ordering::Less => -1.0,
        std::cmp::Ordering::Equal => 0.0,
        std::cmp::Ordering::Greater => 1.0,
    }))
}

/// Build a datetime from `{year, month, day, hour, minute, second,
/// timezone}` parts; missing parts default to zero and `Z`.
/// Usage: date({year: 2020, month: 12, day: 31}) -> "2020-12-31T00:00:00Z"
pub fn date(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let obj = as_obj(&args[0])?;
    let mut year = 0i64;
    let mut month = 1i64;
    let mut day = 1i64;
    let mut hour = 0i64;
    let mut minute = 0i64;
    let mut second = 0i64;
    let mut timezone = "Z".to_string();
    for (key, member) in obj.visible_entries() {
        let value = member.value.force()?;
        match key {
            "year" => year = as_int(&value)?,
            "month" => month = as_int(&value)?,
            "day" => day = as_int(&value)?,
            "hour" => hour = as_int(&value)?,
            "minute" => minute = as_int(&value)?,
            "second" => second = as_int(&value)?,
            "timezone" => timezone = as_str(&value)?.to_string(),
            other => return Err(Error::Domain(format!("Unknown date field: {}", other))),
        }
    }
    let naive = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
        .and_then(|d| d.and_hms_opt(hour as u32, minute as u32, second as u32))
        .ok_or_else(|| {
            Error::Domain(format!(
                "Invalid date parts: {}-{}-{} {}:{}:{}",
                year, month, day, hour, minute, second
            ))
        })?;
    let offset = parse_offset(&timezone)?;
    let dt = offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| Error::Domain(format!("Invalid local time: {}", naive)))?;
    Ok(Value::string(format_iso(&dt)))
}

fn parse_offset(timezone: &str) -> Result<FixedOffset> {
    if timezone == "Z" || timezone == "z" {
        return FixedOffset::east_opt(0)
            .ok_or_else(|| Error::Domain("Invalid offset".to_string()));
    }
    if let Ok(zone) = timezone.parse::<Tz>() {
        // an IANA name: use its standard offset
        return zone
            .with_ymd_and_hms(2000, 1, 1, 0, 0, 0)
            .single()
            .map(|dt| dt.offset().fix())
            .ok_or_else(|| Error::Domain(format!("Unknown timezone: {}", timezone)));
    }
    let synthetic = format!("2000-01-01T00:00:00{}", timezone);
    Ok(*parse_iso(&synthetic)?.offset())
}

/// Whole days between two instants, as an absolute count.
/// Usage: daysBetween("2019-09-20T00:00:00Z", "2019-09-14T00:00:00Z") -> 6
pub fn days_between(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let a = parse_iso(as_str(&args[0])?)?;
    let b = parse_iso(as_str(&args[1])?)?;
    Ok(Value::Num((a - b).num_days().abs() as f64))
}

/// Render with a chrono format pattern.
/// Usage: format("2020-12-31T23:19:35Z", "%Y/%m/%d") -> "2020/12/31"
pub fn format(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let dt = parse_iso(as_str(&args[0])?)?;
    let pattern = as_str(&args[1])?;
    let mut out = String::new();
    use std::fmt::Write;
    write!(out, "{}", dt.format(pattern))
        .map_err(|_| Error::Domain(format!("Invalid format pattern: {}", pattern)))?;
    Ok(Value::string(out))
}

/// Usage: isLeapYear("2020-12-31T23:19:35Z") -> true
pub fn is_leap_year(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let year = parse_iso(as_str(&args[0])?)?.year();
    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    Ok(Value::Bool(leap))
}

/// Add an ISO-8601 period. A `T` section means duration arithmetic in
/// seconds; a date-only period means calendar arithmetic.
/// Usage: plus("2020-01-31T00:00:00Z", "P1M") -> "2020-02-29T00:00:00Z"
pub fn plus(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let dt = parse_iso(as_str(&args[0])?)?;
    let period = parse_period(as_str(&args[1])?)?;
    Ok(Value::string(format_iso(&shift(dt, period, 1)?)))
}

/// Usage: minus("2020-03-01T00:00:00Z", "P1D") -> "2020-02-29T00:00:00Z"
pub fn minus(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let dt = parse_iso(as_str(&args[0])?)?;
    let period = parse_period(as_str(&args[1])?)?;
    Ok(Value::string(format_iso(&shift(dt, period, -1)?)))
}

fn shift(
    dt: DateTime<FixedOffset>,
    period: IsoPeriod,
    direction: i64,
) -> Result<DateTime<FixedOffset>> {
    if period.has_time {
        if period.years != 0 || period.months != 0 {
            return Err(Error::Domain(
                "Durations cannot carry years or months".to_string(),
            ));
        }
        let seconds = direction * (period.days * 86_400 + period.seconds);
        return Ok(dt + Duration::seconds(seconds));
    }
    let months = direction * (period.years * 12 + period.months);
    let shifted_date = shift_months_naive(dt.date_naive(), months)?;
    let local = shifted_date
        .and_time(dt.time())
        .checked_add_signed(Duration::days(direction * period.days))
        .ok_or_else(|| Error::Domain("Date out of range".to_string()))?;
    with_local(&dt, local)
}

/// Parse with a chrono pattern, or the case-insensitive specials
/// `"epoch"`/`"timestamp"` (seconds since 1970-01-01T00:00:00Z). A parse
/// without zone information defaults to `Z`.
/// Usage: parse("2020/12/31", "%Y/%m/%d") -> "2020-12-31T00:00:00Z"
pub fn parse(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let pattern = as_str(&args[1])?;
    if pattern.eq_ignore_ascii_case("epoch") || pattern.eq_ignore_ascii_case("timestamp") {
        let seconds = match &args[0] {
            Value::Num(n) => *n as i64,
            Value::Str(s) => s
                .parse::<i64>()
                .map_err(|_| Error::Domain(format!("Could not parse epoch seconds: {}", s)))?,
            other => return Err(Error::type_mismatch("String or Number", other.pretty_name())),
        };
        let dt = Utc
            .timestamp_opt(seconds, 0)
            .single()
            .ok_or_else(|| Error::Domain(format!("Epoch out of range: {}", seconds)))?;
        return Ok(Value::string(format_iso(&dt.fixed_offset())));
    }

    let input = as_str(&args[0])?;
    if let Ok(dt) = DateTime::parse_from_str(input, pattern) {
        return Ok(Value::string(format_iso(&dt)));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(input, pattern) {
        let dt = Utc.from_utc_datetime(&naive);
        return Ok(Value::string(format_iso(&dt.fixed_offset())));
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, pattern) {
        let naive = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| Error::Domain("Invalid date".to_string()))?;
        let dt = Utc.from_utc_datetime(&naive);
        return Ok(Value::string(format_iso(&dt.fixed_offset())));
    }
    Err(Error::Domain(format!(
        "Could not parse datetime {} with format {}",
        input, pattern
    )))
}

/// The current instant in UTC.
pub fn now(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 0)?;
    Ok(Value::string(format_iso(&Utc::now().fixed_offset())))
}

/// Today at the beginning of the day, UTC.
pub fn today(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 0)?;
    start_of_utc_day(0)
}

pub fn tomorrow(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 0)?;
    start_of_utc_day(1)
}

pub fn yesterday(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 0)?;
    start_of_utc_day(-1)
}

fn start_of_utc_day(offset_days: i64) -> Result<Value> {
    let date = Utc::now().date_naive() + Duration::days(offset_days);
    let naive = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| Error::Domain("Invalid date".to_string()))?;
    Ok(Value::string(format_iso(
        &Utc.from_utc_datetime(&naive).fixed_offset(),
    )))
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

    #[test]
    fn test_at_beginning_of_week_sunday_rollback() {
        // Thursday rolls back four days to the previous Sunday
        assert_eq!(
            at_beginning_of_week(&[s("2020-12-31T23:19:35Z")]).unwrap(),
            s("2020-12-27T00:00:00Z")
        );
        // a Sunday rolls back a full week
        assert_eq!(
            at_beginning_of_week(&[s("2020-12-27T10:00:00Z")]).unwrap(),
            s("2020-12-20T00:00:00Z")
        );
    }

    #[test]
    fn test_beginning_of_family() {
        let input = s("2020-12-31T23:19:35+02:00");
        assert_eq!(
            at_beginning_of_day(&[input.clone()]).unwrap(),
            s("2020-12-31T00:00:00+02:00")
        );
        assert_eq!(
            at_beginning_of_hour(&[input.clone()]).unwrap(),
            s("2020-12-31T23:00:00+02:00")
        );
        assert_eq!(
            at_beginning_of_month(&[input.clone()]).unwrap(),
            s("2020-12-01T00:00:00+02:00")
        );
        assert_eq!(
            at_beginning_of_year(&[input]).unwrap(),
            s("2020-01-01T00:00:00+02:00")
        );
    }

    #[test]
    fn test_calendar_plus_clamps_month_ends() {
        assert_eq!(
            plus(&[s("2020-01-31T00:00:00Z"), s("P1M")]).unwrap(),
            s("2020-02-29T00:00:00Z")
        );
        assert_eq!(
            minus(&[s("2020-03-01T00:00:00Z"), s("P1D")]).unwrap(),
            s("2020-02-29T00:00:00Z")
        );
    }

    #[test]
    fn test_duration_plus_uses_seconds() {
        assert_eq!(
            plus(&[s("2020-12-31T23:00:00Z"), s("PT90M")]).unwrap(),
            s("2021-01-01T00:30:00Z")
        );
        assert_eq!(
            minus(&[s("2020-01-01T00:00:00Z"), s("PT1S")]).unwrap(),
            s("2019-12-31T23:59:59Z")
        );
        // a duration with days folds them into seconds
        assert_eq!(
            plus(&[s("2020-01-01T00:00:00Z"), s("P1DT1H")]).unwrap(),
            s("2020-01-02T01:00:00Z")
        );
    }

    #[test]
    fn test_parse_epoch_and_patterns() {
        assert_eq!(
            parse(&[num(1609459200.0), s("epoch")]).unwrap(),
            s("2021-01-01T00:00:00Z")
        );
        assert_eq!(
            parse(&[s("1609459200"), s("TIMESTAMP")]).unwrap(),
            s("2021-01-01T00:00:00Z")
        );
        assert_eq!(
            parse(&[s("2020/12/31"), s("%Y/%m/%d")]).unwrap(),
            s("2020-12-31T00:00:00Z")
        );
        assert_eq!(
            parse(&[s("31-12-2020 14:30:00"), s("%d-%m-%Y %H:%M:%S")]).unwrap(),
            s("2020-12-31T14:30:00Z")
        );
        assert!(parse(&[s("nonsense"), s("%Y/%m/%d")]).is_err());
    }

    #[test]
    fn test_compare_and_days_between() {
        assert_eq!(
            compare(&[s("2020-01-01T00:00:00Z"), s("2020-01-02T00:00:00Z")]).unwrap(),
            num(-1.0)
        );
        assert_eq!(
            compare(&[s("2020-01-01T00:00:00Z"), s("2020-01-01T01:00:00+01:00")]).unwrap(),
            num(0.0)
        );
        assert_eq!(
            days_between(&[s("2019-09-20T00:00:00Z"), s("2019-09-14T00:00:00Z")]).unwrap(),
            num(6.0)
        );
        assert_eq!(
            days_between(&[s("2019-09-14T00:00:00Z"), s("2019-09-20T00:00:00Z")]).unwrap(),
            num(6.0)
        );
    }

    #[test]
    fn test_change_time_zone() {
        assert_eq!(
            change_time_zone(&[s("2020-12-31T10:00:00Z"), s("America/New_York")]).unwrap(),
            s("2020-12-31T05:00:00-05:00")
        );
        assert!(change_time_zone(&[s("2020-12-31T10:00:00Z"), s("Nowhere/City")]).is_err());
    }

    #[test]
    fn test_date_from_parts() {
        let parts = Value::object_from_pairs(vec![
            ("year".to_string(), num(2020.0)),
            ("month".to_string(), num(12.0)),
            ("day".to_string(), num(31.0)),
            ("hour".to_string(), num(23.0)),
        ]);
        assert_eq!(date(&[parts]).unwrap(), s("2020-12-31T23:00:00Z"));
    }

    #[test]
    fn test_format_pattern() {
        assert_eq!(
            format(&[s("2020-12-31T23:19:35Z"), s("%Y/%m/%d")]).unwrap(),
            s("2020/12/31")
        );
    }

    #[test]
    fn test_is_leap_year() {
        assert_eq!(is_leap_year(&[s("2020-06-01T00:00:00Z")]).unwrap(), Value::Bool(true));
        assert_eq!(is_leap_year(&[s("1900-06-01T00:00:00Z")]).unwrap(), Value::Bool(false));
        assert_eq!(is_leap_year(&[s("2000-06-01T00:00:00Z")]).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_fraction_preserved() {
        assert_eq!(
            at_beginning_of_day(&[s("2020-12-31T23:19:35.123Z")]).unwrap(),
            s("2020-12-31T00:00:00Z")
        );
        assert_eq!(
            plus(&[s("2020-12-31T23:19:35.500Z"), s("PT1S")]).unwrap(),
            s("2020-12-31T23:19:36.500Z")
        );
    }
}
