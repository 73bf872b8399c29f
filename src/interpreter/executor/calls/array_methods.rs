//! Method call evaluation - Array and Tuple methods.

use crate::error::ErrorKind;
use crate::interpreter::builtins::{Arity, CallContext};
use crate::interpreter::executor::RuntimeResult;
use crate::interpreter::value::Object;

pub(super) const ARRAY_METHODS: &[&str] = &[
    "len", "push", "pop", "shift", "first", "last", "join", "contains", "indexOf", "reverse", "slice", "map",
    "filter", "each", "reduce",
];

pub(super) const TUPLE_METHODS: &[&str] = &["len", "get", "contains", "toArray"];

fn position_of(items: &[Object], needle: &Object) -> i64 {
    items.iter().position(|item| item == needle).map(|p| p as i64).unwrap_or(-1)
}

pub(super) fn call(ctx: &CallContext<'_>, receiver: &Object, args: Vec<Object>) -> RuntimeResult<Object> {
    match receiver {
        Object::Array(items) => array_method(ctx, receiver, items, args),
        Object::Tuple(items) => tuple_method(ctx, items, args),
        other => ctx.fail(ErrorKind::no_method(ctx.name, other.type_name())),
    }
}

fn array_method(
    ctx: &CallContext<'_>,
    receiver: &Object,
    items: &parking_lot::RwLock<Vec<Object>>,
    args: Vec<Object>,
) -> RuntimeResult<Object> {
    match ctx.name {
        "len" => {
            ctx.check_arity(Arity::Exact(0), &args)?;
            Ok(Object::Integer(items.read().len() as i64))
        }
        // push(values...) - appends in place and returns the array
        "push" => {
            ctx.check_arity(Arity::AtLeast(1), &args)?;
            items.write().extend(args);
            Ok(receiver.clone())
        }
        "pop" => {
            ctx.check_arity(Arity::Exact(0), &args)?;
            Ok(items.write().pop().unwrap_or(Object::Nil))
        }
        "shift" => {
            ctx.check_arity(Arity::Exact(0), &args)?;
            let mut items = items.write();
            Ok(if items.is_empty() { Object::Nil } else { items.remove(0) })
        }
        "first" | "last" => {
            ctx.check_arity(Arity::Exact(0), &args)?;
            let items = items.read();
            let item = if ctx.name == "first" { items.first() } else { items.last() };
            Ok(item.cloned().unwrap_or(Object::Nil))
        }
        // join(sep?) - items rendered with inspect
        "join" => {
            ctx.check_arity(Arity::OneOf(&[0, 1]), &args)?;
            let sep = if args.is_empty() { String::new() } else { ctx.string_arg(&args, 0)? };
            let parts: Vec<String> = items.read().iter().map(Object::inspect).collect();
            Ok(Object::String(parts.join(&sep)))
        }
        "contains" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            Ok(Object::Boolean(items.read().contains(&args[0])))
        }
        "indexOf" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            Ok(Object::Integer(position_of(&items.read(), &args[0])))
        }
        "reverse" => {
            ctx.check_arity(Arity::Exact(0), &args)?;
            Ok(Object::array(items.read().iter().rev().cloned().collect()))
        }
        // slice(start, end?) - copy of [start, end)
        "slice" => {
            ctx.check_arity(Arity::OneOf(&[1, 2]), &args)?;
            let items = items.read();
            let len = items.len() as i64;
            let start = ctx.int_arg(&args, 0)?;
            let end = if args.len() == 2 { ctx.int_arg(&args, 1)? } else { len };
            if start < 0 || end > len || start > end {
                return ctx.fail(ErrorKind::SliceError { start, end });
            }
            Ok(Object::array(items[start as usize..end as usize].to_vec()))
        }
        "map" | "filter" | "each" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let callback = &args[0];
            // Snapshot so the callback may modify the array.
            let snapshot = items.read().clone();
            let mut out = Vec::new();
            for item in snapshot {
                let result = ctx.call(callback, vec![item.clone()])?;
                match ctx.name {
                    "map" => out.push(result),
                    "filter" if result.is_truthy() => out.push(item),
                    _ => {}
                }
            }
            Ok(match ctx.name {
                "each" => receiver.clone(),
                _ => Object::array(out),
            })
        }
        // reduce(fn(acc, item), initial?) - the first item seeds the accumulator when no initial is given
        "reduce" => {
            ctx.check_arity(Arity::OneOf(&[1, 2]), &args)?;
            let snapshot = items.read().clone();
            let mut rest = snapshot.into_iter();
            let mut acc = match args.get(1) {
                Some(initial) => initial.clone(),
                None => match rest.next() {
                    Some(first) => first,
                    None => return Ok(Object::Nil),
                },
            };
            for item in rest {
                acc = ctx.call(&args[0], vec![acc, item])?;
            }
            Ok(acc)
        }
        other => ctx.fail(ErrorKind::no_method(other, "ARRAY")),
    }
}

fn tuple_method(ctx: &CallContext<'_>, items: &[Object], args: Vec<Object>) -> RuntimeResult<Object> {
    match ctx.name {
        "len" => {
            ctx.check_arity(Arity::Exact(0), &args)?;
            Ok(Object::Integer(items.len() as i64))
        }
        "get" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let index = ctx.int_arg(&args, 0)?;
            usize::try_from(index)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .ok_or_else(|| ctx.error(ErrorKind::IndexError(index)))
        }
        "contains" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            Ok(Object::Boolean(items.contains(&args[0])))
        }
        "toArray" => {
            ctx.check_arity(Arity::Exact(0), &args)?;
            Ok(Object::array(items.to_vec()))
        }
        other => ctx.fail(ErrorKind::no_method(other, "TUPLE")),
    }
}
