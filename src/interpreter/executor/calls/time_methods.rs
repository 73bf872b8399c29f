//! Method call evaluation - Time values.
//!
//! Times are values: methods that shift or convert return a new Time and leave
//! the receiver alone. Durations are integer nanoseconds.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Datelike, DurationRound, FixedOffset, Local, TimeDelta, TimeZone, Timelike, Utc};

use crate::error::ErrorKind;
use crate::interpreter::builtins::time::{
    normalized_date, parse_time, sleep_nanos, zero_time, DEFAULT_LAYOUT,
};
use crate::interpreter::builtins::{Arity, CallContext};
use crate::interpreter::executor::RuntimeResult;
use crate::interpreter::value::Object;

pub(super) const TIME_METHODS: &[&str] = &[
    "utc", "local", "unix", "unixNano", "unixLocal", "unixLocalNano", "fromEpoch", "toEpoch",
    "toStr", "toUTCStr", "toISOStr", "toGMTStr", "toDateStr", "toTimeStr", "year", "fullYear",
    "month", "date", "day", "yearDay", "weekDay", "hour", "hours", "minute", "minutes", "second",
    "seconds", "milliseconds", "add", "addDate", "after", "before", "equal", "sub", "appendFormat",
    "clock", "format", "isoWeek", "isZero", "round", "truncate", "parse", "setValid", "sleep",
    "strftime", "string",
];

type Time = DateTime<FixedOffset>;

/// Specifiers strftime accepts.
const STRFTIME_SPECIFIERS: &str = "aAbCdDeFHIMmnpPrRStTYzZ%";

/// Format with a strftime layout; INVALID_ARGUMENT when the layout is malformed.
fn render(ctx: &CallContext<'_>, time: &Time, layout: &str) -> RuntimeResult<String> {
    let items: Vec<Item<'_>> = StrftimeItems::new(layout).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return ctx.fail(ErrorKind::InvalidArgument(layout.to_string()));
    }
    Ok(time.format_with_items(items.into_iter()).to_string())
}

/// Format with the classic strftime conversion set only.
fn strftime(time: &Time, format: &str) -> Option<String> {
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c == '%' && !STRFTIME_SPECIFIERS.contains(chars.next()?) {
            return None;
        }
    }
    Some(time.format(format).to_string())
}

fn time_arg(ctx: &CallContext<'_>, args: &[Object], position: usize) -> RuntimeResult<Time> {
    match args.get(position) {
        Some(Object::Time(time)) => Ok(*time),
        Some(other) => ctx.param_type(position, "*Time", other),
        None => ctx.fail(ErrorKind::arguments((position + 1).to_string(), args.len())),
    }
}

fn utc(time: &Time) -> Time {
    time.with_timezone(&Utc).fixed_offset()
}

/// The wall-clock reading of `time` taken as local time.
fn local_reading(time: &Time) -> Option<DateTime<Local>> {
    Local.from_local_datetime(&time.naive_local()).earliest()
}

fn add_date(time: &Time, years: i64, months: i64, days: i64) -> Option<Time> {
    let naive = time.naive_local();
    let date = normalized_date(
        i64::from(naive.year()).checked_add(years)?,
        i64::from(naive.month()).checked_add(months)?,
        i64::from(naive.day()).checked_add(days)?,
    )?;
    time.offset().from_local_datetime(&date.and_time(naive.time())).single()
}

fn epoch_millis(ctx: &CallContext<'_>, value: &Object) -> RuntimeResult<f64> {
    match value {
        Object::Integer(n) => Ok(*n as f64),
        Object::UInteger(n) => Ok(*n as f64),
        Object::Float(f) => Ok(*f),
        other => ctx.param_type(0, "*Integer|*UInteger|*Float", other),
    }
}

fn ints(values: &[i64]) -> Object {
    Object::array(values.iter().map(|n| Object::Integer(*n)).collect())
}

pub(super) fn call(ctx: &CallContext<'_>, time: &Time, args: Vec<Object>) -> RuntimeResult<Object> {
    match ctx.name {
        "toStr" | "format" => {
            ctx.check_arity(Arity::OneOf(&[0, 1]), &args)?;
            let layout = match args.first() {
                None => DEFAULT_LAYOUT.to_string(),
                Some(_) => ctx.string_arg(&args, 0)?,
            };
            return render(ctx, time, &layout).map(Object::String);
        }
        // appendFormat(prefix, layout)
        "appendFormat" => {
            ctx.check_arity(Arity::Exact(2), &args)?;
            let mut text = ctx.string_arg(&args, 0)?;
            text.push_str(&render(ctx, time, &ctx.string_arg(&args, 1)?)?);
            return Ok(Object::String(text));
        }
        // strftime(format) - nil on an unknown conversion
        "strftime" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let format = ctx.string_arg(&args, 0)?;
            return Ok(strftime(time, &format).map(Object::String).unwrap_or(Object::Nil));
        }
        // fromEpoch(milliseconds) - nil when not a finite instant
        "fromEpoch" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let millis = epoch_millis(ctx, &args[0])?;
            if !millis.is_finite() {
                return Ok(Object::Nil);
            }
            return Ok(DateTime::<Utc>::from_timestamp_millis(millis as i64)
                .map(|t| Object::Time(t.fixed_offset()))
                .unwrap_or(Object::Nil));
        }
        "add" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let nanos = ctx.int_arg(&args, 0)?;
            return time
                .checked_add_signed(TimeDelta::nanoseconds(nanos))
                .map(Object::Time)
                .ok_or_else(|| ctx.error(ErrorKind::InvalidArgument(nanos.to_string())));
        }
        // addDate(years, months, days) - overflowing fields carry over
        "addDate" => {
            ctx.check_arity(Arity::Exact(3), &args)?;
            let (years, months, days) = (ctx.int_arg(&args, 0)?, ctx.int_arg(&args, 1)?, ctx.int_arg(&args, 2)?);
            return add_date(time, years, months, days)
                .map(Object::Time)
                .ok_or_else(|| ctx.error(ErrorKind::InvalidArgument(format!("{}, {}, {}", years, months, days))));
        }
        "after" | "before" | "equal" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let other = time_arg(ctx, &args, 0)?;
            return Ok(Object::Boolean(match ctx.name {
                "after" => *time > other,
                "before" => *time < other,
                _ => *time == other,
            }));
        }
        // sub(other) - nanoseconds from other to this time
        "sub" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let other = time_arg(ctx, &args, 0)?;
            return (*time - other)
                .num_nanoseconds()
                .map(Object::Integer)
                .ok_or_else(|| ctx.error(ErrorKind::InvalidArgument(other.to_string())));
        }
        // round(d) / truncate(d) - to a multiple of d nanoseconds; d <= 0 leaves the time as is
        "round" | "truncate" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let nanos = ctx.int_arg(&args, 0)?;
            if nanos <= 0 {
                return Ok(Object::Time(*time));
            }
            let step = TimeDelta::nanoseconds(nanos);
            let rounded = if ctx.name == "round" {
                time.duration_round(step)
            } else {
                time.duration_trunc(step)
            };
            return rounded
                .map(Object::Time)
                .map_err(|err| ctx.error(ErrorKind::InvalidArgument(err.to_string())));
        }
        // parse(layout, value) - nil when value does not match
        "parse" => {
            ctx.check_arity(Arity::Exact(2), &args)?;
            let layout = ctx.string_arg(&args, 0)?;
            let value = ctx.string_arg(&args, 1)?;
            return Ok(parse_time(&layout, &value).map(Object::Time).unwrap_or(Object::Nil));
        }
        // setValid() - the zero time; setValid(t) - a copy of t
        "setValid" => {
            ctx.check_arity(Arity::OneOf(&[0, 1]), &args)?;
            if args.is_empty() {
                return Ok(Object::Time(zero_time()));
            }
            return time_arg(ctx, &args, 0).map(Object::Time);
        }
        "sleep" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            sleep_nanos(ctx.int_arg(&args, 0)?);
            return Ok(Object::Nil);
        }
        _ => {}
    }

    ctx.check_arity(Arity::Exact(0), &args)?;
    Ok(match ctx.name {
        "utc" => Object::Time(utc(time)),
        "local" => Object::Time(time.with_timezone(&Local).fixed_offset()),
        "unix" => Object::Integer(time.timestamp()),
        "unixNano" => time.timestamp_nanos_opt().map(Object::Integer).unwrap_or(Object::Nil),
        "unixLocal" => local_reading(time)
            .map(|t| Object::Integer(t.timestamp()))
            .unwrap_or(Object::Nil),
        "unixLocalNano" => local_reading(time)
            .and_then(|t| t.timestamp_nanos_opt())
            .map(Object::Integer)
            .unwrap_or(Object::Nil),
        "toEpoch" => Object::Float(time.timestamp_millis() as f64),
        "toUTCStr" => Object::String(utc(time).format("%a, %d %b %Y %H:%M:%S UTC").to_string()),
        "toGMTStr" => Object::String(utc(time).format("%a, %d %b %Y %H:%M:%S GMT").to_string()),
        "toISOStr" => Object::String(utc(time).format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()),
        "toDateStr" => Object::String(time.format("%a, %d %b %Y").to_string()),
        "toTimeStr" => Object::String(time.format("%H:%M:%S %z").to_string()),
        "year" | "fullYear" => Object::Integer(i64::from(time.year())),
        "month" => Object::Integer(i64::from(time.month())),
        "day" => Object::Integer(i64::from(time.day())),
        "date" => ints(&[i64::from(time.year()), i64::from(time.month()), i64::from(time.day())]),
        "yearDay" => Object::Integer(i64::from(time.ordinal())),
        "weekDay" => Object::String(time.format("%A").to_string()),
        "hour" | "hours" => Object::Integer(i64::from(time.hour())),
        "minute" | "minutes" => Object::Integer(i64::from(time.minute())),
        "second" | "seconds" => Object::Integer(i64::from(time.second())),
        "milliseconds" => Object::Integer(i64::from(time.nanosecond() / 1_000_000)),
        "clock" => ints(&[i64::from(time.hour()), i64::from(time.minute()), i64::from(time.second())]),
        "isoWeek" => {
            let week = time.iso_week();
            ints(&[i64::from(week.year()), i64::from(week.week())])
        }
        "isZero" => Object::Boolean(*time == zero_time()),
        "string" => Object::String(Object::Time(*time).inspect()),
        other => return ctx.fail(ErrorKind::no_method(other, "TIME")),
    })
}
