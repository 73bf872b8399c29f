//! General-purpose builtins: output, lengths, introspection and small helpers.

use crate::error::ErrorKind;
use crate::interpreter::executor::calls::method_names;
use crate::interpreter::executor::RuntimeResult;
use crate::interpreter::value::Object;

use super::{Arity, CallContext, Registry};

fn joined(args: &[Object]) -> String {
    args.iter().map(Object::inspect).collect::<Vec<_>>().join(" ")
}

fn print_line(ctx: &CallContext<'_>, args: Vec<Object>) -> RuntimeResult<Object> {
    let mut line = joined(&args);
    line.push('\n');
    ctx.write(&line)?;
    Ok(Object::Nil)
}

/// Register output, length and introspection builtins.
pub fn register_common_builtins(registry: &mut Registry) {
    // print(...) - values separated by a space, no newline
    registry.define("print", |ctx, args| {
        ctx.write(&joined(&args))?;
        Ok(Object::Nil)
    });

    registry.define("println", print_line);
    registry.define("say", print_line);

    // len(string|array|tuple|hash|list|channel)
    registry.define("len", |ctx, args| {
        ctx.check_arity(Arity::Exact(1), &args)?;
        let len = match &args[0] {
            Object::String(s) => s.chars().count(),
            Object::Array(items) => items.read().len(),
            Object::Tuple(items) => items.len(),
            Object::Hash(map) => map.read().len(),
            Object::List(items) => items.read().len(),
            Object::Channel(ch) => ch.len(),
            other => return ctx.param_type(0, "*String|*Array|*Tuple|*Hash|*List|*Channel", other),
        };
        Ok(Object::Integer(len as i64))
    });

    // newList() - an empty double-ended list
    registry.define("newList", |ctx, args| {
        ctx.check_arity(Arity::Exact(0), &args)?;
        Ok(Object::list(Default::default()))
    });

    // methods(x) - names of the methods x answers to
    registry.define("methods", |ctx, args| {
        ctx.check_arity(Arity::Exact(1), &args)?;
        let names = method_names(&args[0]);
        Ok(Object::array(names.into_iter().map(Object::String).collect()))
    });

    registry.define("type", |ctx, args| {
        ctx.check_arity(Arity::Exact(1), &args)?;
        Ok(Object::string(args[0].type_tag().as_str()))
    });

    // assert(cond, message?)
    registry.define("assert", |ctx, args| {
        ctx.check_arity(Arity::OneOf(&[1, 2]), &args)?;
        if args[0].is_truthy() {
            return Ok(Object::Boolean(true));
        }
        if let Some(message) = args.get(1) {
            tracing::debug!(message = %message, "assertion failed");
        }
        ctx.fail(ErrorKind::AssertionError)
    });

    // reverse(string|array|tuple) - reversed copy
    registry.define("reverse", |ctx, args| {
        ctx.check_arity(Arity::Exact(1), &args)?;
        match &args[0] {
            Object::String(s) => Ok(Object::String(s.chars().rev().collect())),
            Object::Array(items) => Ok(Object::array(items.read().iter().rev().cloned().collect())),
            Object::Tuple(items) => Ok(Object::tuple(items.iter().rev().cloned().collect())),
            other => ctx.param_type(0, "*String|*Array|*Tuple", other),
        }
    });

    // iff(cond, a, b) - eager conditional
    registry.define("iff", |ctx, mut args| {
        ctx.check_arity(Arity::Exact(3), &args)?;
        let cond = match &args[0] {
            Object::Boolean(b) => *b,
            other => return ctx.param_type(0, "*Boolean", other),
        };
        let otherwise = args.remove(2);
        let then = args.remove(1);
        Ok(if cond { then } else { otherwise })
    });

    // newArray(n, items...) - items (arrays flattened) padded with nil up to n
    registry.define("newArray", |ctx, args| {
        ctx.check_arity(Arity::AtLeast(1), &args)?;
        let count = match &args[0] {
            Object::Integer(n) => *n,
            Object::UInteger(n) => *n as i64,
            other => return ctx.param_type(0, "*Integer|*UInteger", other),
        };
        if count < 0 {
            return ctx.generic("Parameter of 'newArray' is less than zero.");
        }
        let mut items = Vec::new();
        for arg in &args[1..] {
            match arg {
                Object::Array(inner) => items.extend(inner.read().iter().cloned()),
                other => items.push(other.clone()),
            }
        }
        let count = count as usize;
        if items.len() < count {
            items.resize(count, Object::Nil);
        }
        Ok(Object::array(items))
    });

    registry.define("deepEqual", |ctx, args| {
        ctx.check_arity(Arity::Exact(2), &args)?;
        Ok(Object::Boolean(args[0] == args[1]))
    });
}
