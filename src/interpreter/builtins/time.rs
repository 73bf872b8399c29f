//! Time constructors and the `time` namespace.
//!
//! Times carry a fixed UTC offset. Durations are integer nanoseconds; layouts are
//! strftime patterns.

use std::thread;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};

use crate::error::ErrorKind;
use crate::interpreter::executor::RuntimeResult;
use crate::interpreter::value::Object;

use super::{Arity, CallContext, Registry};

/// Location codes accepted by newTime and newDate.
pub const UTC: i64 = 0;
pub const LOCAL: i64 = 1;

pub const NANOSECOND: i64 = 1;
pub const MICROSECOND: i64 = 1_000;
pub const MILLISECOND: i64 = 1_000_000;
pub const SECOND: i64 = 1_000_000_000;
pub const MINUTE: i64 = 60 * SECOND;
pub const HOUR: i64 = 60 * MINUTE;

/// Default layout of toStr and format.
pub const DEFAULT_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

const LAYOUTS: &[(&str, &str)] = &[
    ("ANSIC", "%a %b %e %H:%M:%S %Y"),
    ("UnixDate", "%a %b %e %H:%M:%S %Z %Y"),
    ("RFC822", "%d %b %y %H:%M %Z"),
    ("RFC822Z", "%d %b %y %H:%M %z"),
    ("RFC850", "%A, %d-%b-%y %H:%M:%S %Z"),
    ("RFC1123", "%a, %d %b %Y %H:%M:%S %Z"),
    ("RFC1123Z", "%a, %d %b %Y %H:%M:%S %z"),
    ("RFC3339", "%Y-%m-%dT%H:%M:%S%:z"),
    ("RFC3339Nano", "%Y-%m-%dT%H:%M:%S%.9f%:z"),
    ("Kitchen", "%-I:%M%p"),
    ("Stamp", "%b %e %H:%M:%S"),
    ("StampMilli", "%b %e %H:%M:%S%.3f"),
    ("StampMicro", "%b %e %H:%M:%S%.6f"),
    ("StampNano", "%b %e %H:%M:%S%.9f"),
];

/// The instant 0001-01-01 00:00:00 UTC, what an unset time holds.
pub fn zero_time() -> DateTime<FixedOffset> {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive).fixed_offset())
        .unwrap_or_else(|| DateTime::<Utc>::MIN_UTC.fixed_offset())
}

/// Calendar date with out-of-range months and days carried over, so that
/// month 13 is January of the next year and day 0 is the last day of the
/// previous month.
pub fn normalized_date(year: i64, month: i64, day: i64) -> Option<NaiveDate> {
    let months = year.checked_mul(12)?.checked_add(month.checked_sub(1)?)?;
    let year = i32::try_from(months.div_euclid(12)).ok()?;
    let month = u32::try_from(months.rem_euclid(12) + 1).ok()?;
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    first.checked_add_signed(TimeDelta::try_days(day.checked_sub(1)?)?)
}

/// Wall-clock time from components, normalized the same way as the date.
pub fn normalized_datetime(parts: [i64; 7]) -> Option<NaiveDateTime> {
    let [year, month, day, hour, minute, second, nanos] = parts;
    let midnight = normalized_date(year, month, day)?.and_hms_opt(0, 0, 0)?;
    midnight
        .checked_add_signed(TimeDelta::try_hours(hour)?)?
        .checked_add_signed(TimeDelta::try_minutes(minute)?)?
        .checked_add_signed(TimeDelta::try_seconds(second)?)?
        .checked_add_signed(TimeDelta::nanoseconds(nanos))
}

/// Interpret a wall-clock time in the location given by `code`.
pub fn in_location(naive: &NaiveDateTime, code: i64) -> Option<DateTime<FixedOffset>> {
    if code == UTC {
        return Some(Utc.from_utc_datetime(naive).fixed_offset());
    }
    Local.from_local_datetime(naive).earliest().map(|t| t.fixed_offset())
}

/// Parse `value` with a strftime `layout`. Without an offset in the layout the
/// time is taken as UTC; without a time of day, as midnight.
pub fn parse_time(layout: &str, value: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(time) = DateTime::parse_from_str(value, layout) {
        return Some(time);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, layout) {
        return Some(Utc.from_utc_datetime(&naive).fixed_offset());
    }
    NaiveDate::parse_from_str(value, layout)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive).fixed_offset())
}

/// Block the calling task for `nanos` nanoseconds; negative values return at once.
pub fn sleep_nanos(nanos: i64) {
    if let Ok(nanos) = u64::try_from(nanos) {
        thread::sleep(Duration::from_nanos(nanos));
    }
}

fn location_arg(ctx: &CallContext<'_>, args: &[Object], position: usize) -> RuntimeResult<i64> {
    match args.get(position) {
        None => Ok(LOCAL),
        Some(Object::Integer(code)) if *code == UTC || *code == LOCAL => Ok(*code),
        Some(Object::Integer(code)) => ctx.fail(ErrorKind::InvalidArgument(format!("location {}", code))),
        Some(other) => ctx.param_type(position, "*Integer", other),
    }
}

/// Register newTime, newDate, unixTime and the `time` namespace.
pub fn register_time_builtins(registry: &mut Registry) {
    // newTime(location?) - the current instant in UTC or local time
    registry.define("newTime", |ctx, args| {
        ctx.check_arity(Arity::OneOf(&[0, 1]), &args)?;
        let now = Utc::now();
        Ok(Object::Time(match location_arg(ctx, &args, 0)? {
            UTC => now.fixed_offset(),
            _ => now.with_timezone(&Local).fixed_offset(),
        }))
    });

    // newDate(year, month, day, hour, min, sec, nsec, location?)
    registry.define("newDate", |ctx, args| {
        ctx.check_arity(Arity::OneOf(&[7, 8]), &args)?;
        let mut parts = [0i64; 7];
        for (position, part) in parts.iter_mut().enumerate() {
            *part = match &args[position] {
                Object::Integer(n) => *n,
                other => return ctx.param_type(position, "*Integer", other),
            };
        }
        let location = location_arg(ctx, &args, 7)?;
        normalized_datetime(parts)
            .and_then(|naive| in_location(&naive, location))
            .map(Object::Time)
            .ok_or_else(|| ctx.error(ErrorKind::InvalidArgument(format!("{:?}", parts))))
    });

    // unixTime(seconds, nanoseconds?)
    registry.define("unixTime", |ctx, args| {
        ctx.check_arity(Arity::OneOf(&[1, 2]), &args)?;
        let seconds = match &args[0] {
            Object::Integer(n) => *n,
            other => return ctx.param_type(0, "*Integer", other),
        };
        let nanos = match args.get(1) {
            None => 0,
            Some(Object::Integer(n)) => *n,
            Some(other) => return ctx.param_type(1, "*Integer", other),
        };
        let seconds = seconds.saturating_add(nanos.div_euclid(1_000_000_000));
        let nanos = nanos.rem_euclid(1_000_000_000) as u32;
        match Local.timestamp_opt(seconds, nanos).single() {
            Some(time) => Ok(Object::Time(time.fixed_offset())),
            None => ctx.fail(ErrorKind::InvalidArgument(format!("{}.{:09}", seconds, nanos))),
        }
    });

    registry.define_in("time", "now", |ctx, args| {
        ctx.check_arity(Arity::Exact(0), &args)?;
        Ok(Object::Time(Local::now().fixed_offset()))
    });

    // time.sleep(nanoseconds)
    registry.define_in("time", "sleep", |ctx, args| {
        ctx.check_arity(Arity::Exact(1), &args)?;
        sleep_nanos(ctx.int_arg(&args, 0)?);
        Ok(Object::Nil)
    });

    // time.parse(layout, value) - nil when value does not match
    registry.define_in("time", "parse", |ctx, args| {
        ctx.check_arity(Arity::Exact(2), &args)?;
        let layout = ctx.string_arg(&args, 0)?;
        let value = ctx.string_arg(&args, 1)?;
        Ok(parse_time(&layout, &value).map(Object::Time).unwrap_or(Object::Nil))
    });

    registry.define_var("time", "UTC", Object::Integer(UTC));
    registry.define_var("time", "LOCAL", Object::Integer(LOCAL));
    registry.define_var("time", "NANO_SECOND", Object::Integer(NANOSECOND));
    registry.define_var("time", "MICRO_SECOND", Object::Integer(MICROSECOND));
    registry.define_var("time", "MILLI_SECOND", Object::Integer(MILLISECOND));
    registry.define_var("time", "SECOND", Object::Integer(SECOND));
    registry.define_var("time", "MINUTE", Object::Integer(MINUTE));
    registry.define_var("time", "HOUR", Object::Integer(HOUR));
    for (name, layout) in LAYOUTS {
        registry.define_var("time", name, Object::string(*layout));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dates_carry_overflow() {
        assert_eq!(normalized_date(2023, 13, 1), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(normalized_date(2024, 3, 0), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(normalized_date(2023, 1, 31 + 28 + 1), NaiveDate::from_ymd_opt(2023, 3, 1));
        assert_eq!(normalized_date(2023, 0, 1), NaiveDate::from_ymd_opt(2022, 12, 1));
        assert_eq!(normalized_date(i64::MAX, 1, 1), None);
    }

    #[test]
    fn test_datetime_in_utc() {
        let naive = normalized_datetime([2021, 6, 15, 25, 0, 0, 500]).unwrap();
        let time = in_location(&naive, UTC).unwrap();
        assert_eq!((time.day(), time.hour(), time.nanosecond()), (16, 1, 500));
        assert_eq!(time.offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_parse_layouts() {
        let time = parse_time("%Y-%m-%d %H:%M:%S", "2020-02-29 12:30:00").unwrap();
        assert_eq!(time.timestamp(), 1_582_979_400);
        let time = parse_time("%Y-%m-%dT%H:%M:%S%:z", "2020-02-29T12:30:00+02:00").unwrap();
        assert_eq!(time.offset().local_minus_utc(), 7200);
        assert!(parse_time("%Y-%m-%d", "2020-02-29").is_some());
        assert!(parse_time("%Y-%m-%d", "yesterday").is_none());
    }

    #[test]
    fn test_zero_time() {
        let zero = zero_time();
        assert_eq!((zero.year(), zero.month(), zero.day()), (1, 1, 1));
    }
}
