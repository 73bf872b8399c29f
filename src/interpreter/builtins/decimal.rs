//! The `decimal` namespace: constructors, aggregates and the global decimal settings.
//!
//! The same functions answer as methods on any decimal value, so
//! `decimal.fromString("1.5")` and `decimal(0).fromString("1.5")` agree.

use std::str::FromStr;

use crate::config;
use crate::decimal::{self as engine, Decimal};
use crate::error::ErrorKind;
use crate::interpreter::executor::RuntimeResult;
use crate::interpreter::value::Object;

use super::{Arity, CallContext, Registry};

/// Functions shared by the namespace and decimal values.
pub const NAMESPACE_FUNCTIONS: &[&str] = &[
    "new",
    "fromString",
    "fromFloat",
    "fromFloatWithExponent",
    "avg",
    "max",
    "min",
    "sum",
    "setDivisionPrecision",
    "getDivisionPrecision",
    "setMarshalJSONWithoutQuotes",
    "getMarshalJSONWithoutQuotes",
];

/// Coerce an arithmetic operand. Anything that is not a number or numeric string is
/// an invalid argument.
pub fn operand(ctx: &CallContext<'_>, value: &Object) -> RuntimeResult<Decimal> {
    let invalid = || ctx.error(ErrorKind::InvalidArgument(value.inspect()));
    match value {
        Object::Integer(n) => Ok(Decimal::from_i64(*n)),
        Object::UInteger(n) => Ok(Decimal::from_u64(*n)),
        Object::Float(f) => Decimal::from_f64(*f).map_err(|_| invalid()),
        Object::String(s) => Decimal::from_str(s).map_err(|_| invalid()),
        Object::Decimal(d) => Ok(d.clone()),
        _ => Err(invalid()),
    }
}

fn int_or_uint(ctx: &CallContext<'_>, args: &[Object], position: usize) -> RuntimeResult<i64> {
    match &args[position] {
        Object::Integer(n) => Ok(*n),
        Object::UInteger(n) => i64::try_from(*n).map_err(|_| ctx.error(ErrorKind::InvalidArgument(n.to_string()))),
        other => ctx.param_type(position, "*Integer|*UInteger", other),
    }
}

/// Integer argument that must fit a decimal exponent or precision.
fn exponent_arg(ctx: &CallContext<'_>, args: &[Object], position: usize) -> RuntimeResult<i32> {
    let n = match &args[position] {
        Object::Integer(n) => *n,
        other => return ctx.param_type(position, "*Integer", other),
    };
    i32::try_from(n).map_err(|_| ctx.error(ErrorKind::InvalidArgument(format!("{} is out of the i32 range", n))))
}

fn float_like(ctx: &CallContext<'_>, args: &[Object], position: usize) -> RuntimeResult<f64> {
    match &args[position] {
        Object::Integer(n) => Ok(*n as f64),
        Object::UInteger(n) => Ok(*n as f64),
        Object::Float(f) => Ok(*f),
        other => ctx.param_type(position, "*Float|*Integer|*UInteger", other),
    }
}

fn all_decimals(ctx: &CallContext<'_>, args: &[Object]) -> RuntimeResult<Vec<Decimal>> {
    args.iter()
        .enumerate()
        .map(|(i, arg)| match arg {
            Object::Decimal(d) => Ok(d.clone()),
            other => ctx.param_type(i, "*Decimal", other),
        })
        .collect()
}

/// Run namespace function `name`. Unknown names are NO_METHOD on the namespace.
pub fn call_function(ctx: &CallContext<'_>, name: &str, args: Vec<Object>) -> RuntimeResult<Object> {
    let engine_err = |err: engine::DecimalError| ctx.error(ErrorKind::InvalidArgument(err.to_string()));
    match name {
        "new" => {
            ctx.check_arity(Arity::Exact(2), &args)?;
            let value = match &args[0] {
                Object::Integer(n) => *n,
                other => return ctx.param_type(0, "*Integer", other),
            };
            let exp = exponent_arg(ctx, &args, 1)?;
            Ok(Object::Decimal(Decimal::new(value, exp)))
        }
        "fromString" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let text = ctx.string_arg(&args, 0)?;
            Decimal::from_str(&text).map(Object::Decimal).map_err(engine_err)
        }
        "fromFloat" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let value = float_like(ctx, &args, 0)?;
            Decimal::from_f64(value).map(Object::Decimal).map_err(engine_err)
        }
        "fromFloatWithExponent" => {
            ctx.check_arity(Arity::Exact(2), &args)?;
            let value = float_like(ctx, &args, 0)?;
            let exp = exponent_arg(ctx, &args, 1)?;
            Decimal::from_f64_with_exponent(value, exp)
                .map(Object::Decimal)
                .map_err(engine_err)
        }
        "avg" | "max" | "min" | "sum" => {
            ctx.check_arity(Arity::AtLeast(1), &args)?;
            let values = all_decimals(ctx, &args)?;
            let (first, rest) = (&values[0], &values[1..]);
            let result = match name {
                "avg" => engine::avg(first, rest),
                "max" => engine::max(first, rest),
                "min" => engine::min(first, rest),
                _ => engine::sum(first, rest),
            };
            Ok(Object::Decimal(result))
        }
        "setDivisionPrecision" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let precision = int_or_uint(ctx, &args, 0)?;
            let precision = i32::try_from(precision)
                .map_err(|_| ctx.error(ErrorKind::InvalidArgument(format!("{} is out of the i32 range", precision))))?;
            config::set_division_precision(precision);
            Ok(Object::Nil)
        }
        "getDivisionPrecision" => {
            ctx.check_arity(Arity::Exact(0), &args)?;
            Ok(Object::Integer(config::division_precision() as i64))
        }
        "setMarshalJSONWithoutQuotes" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            match &args[0] {
                Object::Boolean(b) => {
                    config::set_marshal_json_without_quotes(*b);
                    Ok(Object::Nil)
                }
                other => ctx.param_type(0, "*Boolean", other),
            }
        }
        "getMarshalJSONWithoutQuotes" => {
            ctx.check_arity(Arity::Exact(0), &args)?;
            Ok(Object::Boolean(config::marshal_json_without_quotes()))
        }
        other => ctx.fail(ErrorKind::no_method(other, "decimal")),
    }
}

/// Register the `decimal` namespace.
pub fn register_decimal_builtins(registry: &mut Registry) {
    for name in NAMESPACE_FUNCTIONS {
        registry.define_in("decimal", name, move |ctx, args| call_function(ctx, name, args));
    }
}
