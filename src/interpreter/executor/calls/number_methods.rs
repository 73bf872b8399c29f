//! Method call evaluation - Integer, UInteger and Float methods.

use crate::decimal::Decimal;
use crate::error::ErrorKind;
use crate::interpreter::builtins::{Arity, CallContext};
use crate::interpreter::executor::RuntimeResult;
use crate::interpreter::value::Object;

pub(super) const INTEGER_METHODS: &[&str] = &["abs", "str", "float", "uint", "decimal", "isEven", "isOdd"];
pub(super) const UINTEGER_METHODS: &[&str] = &["str", "float", "int", "decimal", "isEven", "isOdd"];
pub(super) const FLOAT_METHODS: &[&str] = &["abs", "str", "int", "round", "floor", "ceil", "decimal", "isNaN"];

pub(super) fn call(ctx: &CallContext<'_>, receiver: &Object, args: Vec<Object>) -> RuntimeResult<Object> {
    match receiver {
        Object::Integer(n) => integer_method(ctx, *n, args),
        Object::UInteger(n) => uinteger_method(ctx, *n, args),
        Object::Float(f) => float_method(ctx, *f, args),
        other => ctx.fail(ErrorKind::no_method(ctx.name, other.type_name())),
    }
}

fn integer_method(ctx: &CallContext<'_>, n: i64, args: Vec<Object>) -> RuntimeResult<Object> {
    ctx.check_arity(Arity::Exact(0), &args)?;
    Ok(match ctx.name {
        "abs" => Object::Integer(n.wrapping_abs()),
        "str" => Object::String(n.to_string()),
        "float" => Object::Float(n as f64),
        "uint" => Object::UInteger(n as u64),
        "decimal" => Object::Decimal(Decimal::from_i64(n)),
        "isEven" => Object::Boolean(n % 2 == 0),
        "isOdd" => Object::Boolean(n % 2 != 0),
        other => return ctx.fail(ErrorKind::no_method(other, "INTEGER")),
    })
}

fn uinteger_method(ctx: &CallContext<'_>, n: u64, args: Vec<Object>) -> RuntimeResult<Object> {
    ctx.check_arity(Arity::Exact(0), &args)?;
    Ok(match ctx.name {
        "str" => Object::String(n.to_string()),
        "float" => Object::Float(n as f64),
        "int" => Object::Integer(n as i64),
        "decimal" => Object::Decimal(Decimal::from_u64(n)),
        "isEven" => Object::Boolean(n % 2 == 0),
        "isOdd" => Object::Boolean(n % 2 != 0),
        other => return ctx.fail(ErrorKind::no_method(other, "UINTEGER")),
    })
}

fn float_method(ctx: &CallContext<'_>, f: f64, args: Vec<Object>) -> RuntimeResult<Object> {
    // round(places?) is the only method taking an argument
    if ctx.name == "round" {
        ctx.check_arity(Arity::OneOf(&[0, 1]), &args)?;
        let places = if args.is_empty() { 0 } else { ctx.int_arg(&args, 0)? };
        let factor = 10f64.powi(places.clamp(-308, 308) as i32);
        return Ok(Object::Float((f * factor).round() / factor));
    }
    ctx.check_arity(Arity::Exact(0), &args)?;
    Ok(match ctx.name {
        "abs" => Object::Float(f.abs()),
        "str" => Object::String(Object::Float(f).inspect()),
        "int" => Object::Integer(f as i64),
        "floor" => Object::Float(f.floor()),
        "ceil" => Object::Float(f.ceil()),
        "isNaN" => Object::Boolean(f.is_nan()),
        "decimal" => match Decimal::from_f64(f) {
            Ok(d) => Object::Decimal(d),
            Err(err) => return ctx.fail(ErrorKind::InvalidArgument(err.to_string())),
        },
        other => return ctx.fail(ErrorKind::no_method(other, "FLOAT")),
    })
}
