//! Numeric builtins and the `math` namespace.
//!
//! Provides range, absolute value and character code conversion.

use crate::error::ErrorKind;
use crate::interpreter::executor::RuntimeResult;
use crate::interpreter::value::Object;

use super::{Arity, CallContext, Registry};

fn int_or_uint(ctx: &CallContext<'_>, args: &[Object], position: usize) -> RuntimeResult<i64> {
    match &args[position] {
        Object::Integer(n) => Ok(*n),
        Object::UInteger(n) => i64::try_from(*n).map_err(|_| ctx.error(ErrorKind::InvalidArgument(n.to_string()))),
        other => ctx.param_type(position, "*Integer|*UInteger", other),
    }
}

/// `[0, step, 2*step, ...]` below `end`.
pub fn stepped_range(end: i64, step: i64) -> Vec<Object> {
    let mut items = Vec::new();
    let mut k = 0i64;
    while k < end {
        items.push(Object::Integer(k));
        match k.checked_add(step) {
            Some(next) => k = next,
            None => break,
        }
    }
    items
}

/// Register math builtins.
pub fn register_math_builtins(registry: &mut Registry) {
    // range(n, step?) - integers from 0 up to n, exclusive
    registry.define("range", |ctx, args| {
        ctx.check_arity(Arity::OneOf(&[1, 2]), &args)?;
        let end = int_or_uint(ctx, &args, 0)?;
        let step = if args.len() == 2 {
            let step = int_or_uint(ctx, &args, 1)?;
            if step <= 0 {
                return ctx.generic("second parameter of 'range' should be >0");
            }
            step
        } else {
            1
        };
        if end <= 0 {
            return Ok(Object::array(Vec::new()));
        }
        Ok(Object::array(stepped_range(end, step)))
    });

    registry.define("abs", |ctx, args| {
        ctx.check_arity(Arity::Exact(1), &args)?;
        match &args[0] {
            Object::Integer(n) => Ok(Object::Integer(n.wrapping_abs())),
            Object::UInteger(n) => Ok(Object::UInteger(*n)),
            Object::Float(f) => Ok(Object::Float(f.abs())),
            Object::Decimal(d) => Ok(Object::Decimal(d.abs())),
            other => ctx.param_type(0, "*Integer|*UInteger|*Float|*Decimal", other),
        }
    });

    // chr(code) - the character with that code point
    registry.define("chr", |ctx, args| {
        ctx.check_arity(Arity::Exact(1), &args)?;
        let code = int_or_uint(ctx, &args, 0)?;
        match u32::try_from(code).ok().and_then(char::from_u32) {
            Some(c) => Ok(Object::String(c.to_string())),
            None => ctx.fail(ErrorKind::InputError {
                input: code.to_string(),
                func: "chr".to_string(),
            }),
        }
    });

    // ord(char) - code point of a one-character string
    registry.define("ord", |ctx, args| {
        ctx.check_arity(Arity::Exact(1), &args)?;
        let s = ctx.string_arg(&args, 0)?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Object::Integer(c as i64)),
            _ => ctx.fail(ErrorKind::InputLength {
                func: "ord".to_string(),
                max: 1,
                got: s.chars().count(),
            }),
        }
    });

    registry.define_var("math", "PI", Object::Float(std::f64::consts::PI));
    registry.define_var("math", "E", Object::Float(std::f64::consts::E));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_stepped_range() {
        assert_eq!(
            stepped_range(10, 3),
            vec![Object::Integer(0), Object::Integer(3), Object::Integer(6), Object::Integer(9)]
        );
        assert_eq!(stepped_range(0, 1), vec![]);
        assert_eq!(stepped_range(i64::MAX, i64::MAX).len(), 1);
    }
}
