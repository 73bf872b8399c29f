//! Method call evaluation - Decimal methods.
//!
//! Arithmetic operands may be any number or numeric string. The `decimal` namespace
//! functions are answered here too.

use std::cmp::Ordering;

use crate::decimal::Decimal;
use crate::error::ErrorKind;
use crate::interpreter::builtins::decimal::{call_function, operand, NAMESPACE_FUNCTIONS};
use crate::interpreter::builtins::{Arity, CallContext};
use crate::interpreter::executor::RuntimeResult;
use crate::interpreter::value::Object;

pub(super) const DECIMAL_METHODS: &[&str] = &[
    "neg", "abs", "add", "sub", "mul", "div", "divRound", "mod", "pow", "ceil", "round", "trunc", "truncate",
    "floor", "cmp", "equal", "greaterThan", "greaterThanOrEqual", "lessThan", "lessThanOrEqual", "stringFixed",
    "stringScaled", "string", "sign", "exponent", "intPart", "float", "isZero",
    // namespace functions
    "new", "fromString", "fromFloat", "fromFloatWithExponent", "avg", "max", "min", "sum",
    "setDivisionPrecision", "getDivisionPrecision", "setMarshalJSONWithoutQuotes",
    "getMarshalJSONWithoutQuotes",
];

fn places(ctx: &CallContext<'_>, args: &[Object], position: usize) -> RuntimeResult<i32> {
    let n = ctx.int_arg(args, position)?;
    i32::try_from(n).map_err(|_| ctx.error(ErrorKind::InvalidArgument(n.to_string())))
}

fn non_zero(ctx: &CallContext<'_>, args: &[Object], position: usize) -> RuntimeResult<Decimal> {
    let divisor = operand(ctx, &args[position])?;
    if divisor.is_zero() {
        return ctx.fail(ErrorKind::DivideByZero);
    }
    Ok(divisor)
}

pub(super) fn call(ctx: &CallContext<'_>, d: &Decimal, args: Vec<Object>) -> RuntimeResult<Object> {
    if NAMESPACE_FUNCTIONS.contains(&ctx.name) {
        return call_function(ctx, ctx.name, args);
    }

    // Unary methods
    if let Some(result) = unary(d, ctx.name) {
        ctx.check_arity(Arity::Exact(0), &args)?;
        return Ok(result);
    }

    match ctx.name {
        "add" | "sub" | "mul" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let other = operand(ctx, &args[0])?;
            let result = match ctx.name {
                "add" => d.add(&other),
                "sub" => d.sub(&other),
                _ => d.mul(&other),
            };
            Ok(Object::Decimal(result))
        }
        "pow" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let exponent = operand(ctx, &args[0])?;
            d.pow(&exponent)
                .map(Object::Decimal)
                .map_err(|_| ctx.error(ErrorKind::DivideByZero))
        }
        "div" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let divisor = non_zero(ctx, &args, 0)?;
            d.checked_div(&divisor)
                .map(Object::Decimal)
                .ok_or_else(|| ctx.error(ErrorKind::DivideByZero))
        }
        "mod" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let divisor = non_zero(ctx, &args, 0)?;
            Ok(Object::Decimal(d.modulo(&divisor)))
        }
        // divRound(divisor, precision)
        "divRound" => {
            ctx.check_arity(Arity::Exact(2), &args)?;
            let divisor = non_zero(ctx, &args, 0)?;
            let precision = places(ctx, &args, 1)?;
            Ok(Object::Decimal(d.div_round(&divisor, precision)))
        }
        "round" | "truncate" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let places = places(ctx, &args, 0)?;
            Ok(Object::Decimal(if ctx.name == "round" {
                d.round(places)
            } else {
                d.truncate(places)
            }))
        }
        "stringFixed" | "stringScaled" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let places = places(ctx, &args, 0)?;
            Ok(Object::String(if ctx.name == "stringFixed" {
                d.string_fixed(places)
            } else {
                d.string_scaled(places)
            }))
        }
        "cmp" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let other = operand(ctx, &args[0])?;
            Ok(Object::Integer(match d.cmp(&other) {
                Ordering::Less => -1,
                Ordering::Equal => 0,
                Ordering::Greater => 1,
            }))
        }
        "equal" | "greaterThan" | "greaterThanOrEqual" | "lessThan" | "lessThanOrEqual" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let other = operand(ctx, &args[0])?;
            let ordering = d.cmp(&other);
            Ok(Object::Boolean(match ctx.name {
                "equal" => ordering == Ordering::Equal,
                "greaterThan" => ordering == Ordering::Greater,
                "greaterThanOrEqual" => ordering != Ordering::Less,
                "lessThan" => ordering == Ordering::Less,
                _ => ordering != Ordering::Greater,
            }))
        }
        other => ctx.fail(ErrorKind::no_method(other, "DECIMAL")),
    }
}

fn unary(d: &Decimal, name: &str) -> Option<Object> {
    let result = match name {
        "neg" => Object::Decimal(d.neg()),
        "abs" => Object::Decimal(d.abs()),
        "ceil" => Object::Decimal(d.ceil()),
        "floor" => Object::Decimal(d.floor()),
        "trunc" => Object::Decimal(d.truncate(0)),
        "string" => Object::String(d.to_string()),
        "sign" => Object::Integer(d.sign() as i64),
        "exponent" => Object::Integer(d.exponent() as i64),
        "intPart" => Object::Integer(d.int_part()),
        "float" => Object::Float(d.to_f64()),
        "isZero" => Object::Boolean(d.is_zero()),
        _ => return None,
    };
    Some(result)
}
