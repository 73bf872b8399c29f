//! Type conversion builtins.

use std::str::FromStr;

use crate::decimal::Decimal;
use crate::error::ErrorKind;
use crate::interpreter::executor::RuntimeResult;
use crate::interpreter::value::{HashKey, HashMapObj, Object};

use super::{Arity, CallContext, Registry};

/// Split an optional sign and radix prefix off an integer literal.
fn split_radix(text: &str) -> (bool, u32, &str) {
    let text = text.trim();
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let lower = rest.get(..2).map(|p| p.to_ascii_lowercase());
    match lower.as_deref() {
        Some("0x") => (negative, 16, &rest[2..]),
        Some("0o") => (negative, 8, &rest[2..]),
        Some("0b") => (negative, 2, &rest[2..]),
        _ => (negative, 10, rest),
    }
}

pub fn parse_int(text: &str) -> Option<i64> {
    let (negative, radix, digits) = split_radix(text);
    let digits = digits.replace('_', "");
    if digits.is_empty() {
        return None;
    }
    let magnitude = i128::from_str_radix(&digits, radix).ok()?;
    let value = if negative { -magnitude } else { magnitude };
    i64::try_from(value).ok()
}

pub fn parse_uint(text: &str) -> Option<u64> {
    let (negative, radix, digits) = split_radix(text);
    let digits = digits.replace('_', "");
    if negative || digits.is_empty() {
        return None;
    }
    u64::from_str_radix(&digits, radix).ok()
}

pub fn parse_float(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let (_, radix, _) = split_radix(trimmed);
    if radix != 10 {
        return parse_int(trimmed).map(|n| n as f64);
    }
    trimmed.replace('_', "").parse::<f64>().ok()
}

fn to_int(ctx: &CallContext<'_>, value: &Object) -> RuntimeResult<Object> {
    let n = match value {
        Object::Integer(n) => *n,
        Object::UInteger(n) => *n as i64,
        Object::Float(f) => *f as i64,
        Object::Decimal(d) => d.int_part(),
        Object::Boolean(b) => i64::from(*b),
        Object::String(s) => match parse_int(s) {
            Some(n) => n,
            None => {
                return ctx.fail(ErrorKind::InputError {
                    input: s.clone(),
                    func: ctx.name.to_string(),
                })
            }
        },
        other => return ctx.param_type(0, "*Integer|*UInteger|*Float|*Decimal|*Boolean|*String", other),
    };
    Ok(Object::Integer(n))
}

fn to_uint(ctx: &CallContext<'_>, value: &Object) -> RuntimeResult<Object> {
    let n = match value {
        Object::Integer(n) => *n as u64,
        Object::UInteger(n) => *n,
        Object::Float(f) => *f as u64,
        Object::Decimal(d) => d.int_part() as u64,
        Object::Boolean(b) => u64::from(*b),
        Object::String(s) => match parse_uint(s) {
            Some(n) => n,
            None => {
                return ctx.fail(ErrorKind::InputError {
                    input: s.clone(),
                    func: ctx.name.to_string(),
                })
            }
        },
        other => return ctx.param_type(0, "*Integer|*UInteger|*Float|*Decimal|*Boolean|*String", other),
    };
    Ok(Object::UInteger(n))
}

fn to_float(ctx: &CallContext<'_>, value: &Object) -> RuntimeResult<Object> {
    let f = match value {
        Object::Integer(n) => *n as f64,
        Object::UInteger(n) => *n as f64,
        Object::Float(f) => *f,
        Object::Decimal(d) => d.to_f64(),
        Object::Boolean(b) => f64::from(u8::from(*b)),
        Object::String(s) => match parse_float(s) {
            Some(f) => f,
            None => {
                return ctx.fail(ErrorKind::InputError {
                    input: s.clone(),
                    func: ctx.name.to_string(),
                })
            }
        },
        other => return ctx.param_type(0, "*Integer|*UInteger|*Float|*Decimal|*Boolean|*String", other),
    };
    Ok(Object::Float(f))
}

/// Convert a number or numeric string to a decimal.
pub fn to_decimal(ctx: &CallContext<'_>, value: &Object, position: usize) -> RuntimeResult<Decimal> {
    match value {
        Object::Integer(n) => Ok(Decimal::from_i64(*n)),
        Object::UInteger(n) => Ok(Decimal::from_u64(*n)),
        Object::Float(f) => Decimal::from_f64(*f).map_err(|err| ctx.error(ErrorKind::generic(err.to_string()))),
        Object::Decimal(d) => Ok(d.clone()),
        Object::String(s) => Decimal::from_str(s).map_err(|_| {
            ctx.error(ErrorKind::InputError {
                input: s.clone(),
                func: ctx.name.to_string(),
            })
        }),
        other => ctx.param_type(position, "*Integer|*UInteger|*Float|*Decimal|*String", other),
    }
}

/// Elements of a collection; hashes yield `(key, value)` tuples.
fn collect_items(ctx: &CallContext<'_>, value: &Object) -> RuntimeResult<Vec<Object>> {
    if let Object::Hash(map) = value {
        return Ok(map
            .read()
            .iter()
            .map(|(k, v)| Object::tuple(vec![k.to_object(), v.clone()]))
            .collect());
    }
    match value.iter_items() {
        Some(items) => Ok(items),
        None => ctx.param_type(0, "*Array|*Tuple|*String|*Hash", value),
    }
}

fn pairs_to_hash(ctx: &CallContext<'_>, items: Vec<Object>) -> RuntimeResult<Object> {
    let mut map = HashMapObj::new();
    for item in items {
        let pair = match item.iter_items() {
            Some(pair) if pair.len() == 2 && !matches!(item, Object::String(_)) => pair,
            _ => return ctx.fail(ErrorKind::InvalidArgument(item.inspect())),
        };
        let key = HashKey::from_object(&pair[0])
            .ok_or_else(|| ctx.error(ErrorKind::KeyError(pair[0].type_name())))?;
        map.insert(key, pair[1].clone());
    }
    Ok(Object::hash(map))
}

/// Register conversion builtins.
pub fn register_type_builtins(registry: &mut Registry) {
    registry.define("int", |ctx, args| {
        ctx.check_arity(Arity::Exact(1), &args)?;
        to_int(ctx, &args[0])
    });

    registry.define("uint", |ctx, args| {
        ctx.check_arity(Arity::Exact(1), &args)?;
        to_uint(ctx, &args[0])
    });

    registry.define("float", |ctx, args| {
        ctx.check_arity(Arity::Exact(1), &args)?;
        to_float(ctx, &args[0])
    });

    registry.define("str", |ctx, args| {
        ctx.check_arity(Arity::Exact(1), &args)?;
        Ok(Object::String(args[0].inspect()))
    });

    registry.define("decimal", |ctx, args| {
        ctx.check_arity(Arity::Exact(1), &args)?;
        to_decimal(ctx, &args[0], 0).map(Object::Decimal)
    });

    // array(x?) - copy of a collection as an array
    registry.define("array", |ctx, args| {
        ctx.check_arity(Arity::OneOf(&[0, 1]), &args)?;
        match args.first() {
            None => Ok(Object::array(Vec::new())),
            Some(value) => collect_items(ctx, value).map(Object::array),
        }
    });

    registry.define("tuple", |ctx, args| {
        ctx.check_arity(Arity::OneOf(&[0, 1]), &args)?;
        match args.first() {
            None => Ok(Object::tuple(Vec::new())),
            Some(value) => collect_items(ctx, value).map(Object::tuple),
        }
    });

    // hash(x?) - copy of a hash, or a hash built from key/value pairs
    registry.define("hash", |ctx, args| {
        ctx.check_arity(Arity::OneOf(&[0, 1]), &args)?;
        match args.first() {
            None => Ok(Object::hash(HashMapObj::new())),
            Some(Object::Hash(map)) => Ok(Object::hash(map.read().clone())),
            Some(value @ (Object::Array(_) | Object::Tuple(_))) => {
                let items = value.iter_items().unwrap_or_default();
                pairs_to_hash(ctx, items)
            }
            Some(other) => ctx.param_type(0, "*Hash|*Array|*Tuple", other),
        }
    });
}
