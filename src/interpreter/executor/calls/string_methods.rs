//! Method call evaluation - String methods.

use crate::error::ErrorKind;
use crate::interpreter::builtins::{Arity, CallContext};
use crate::interpreter::executor::operators::repeat_string;
use crate::interpreter::executor::RuntimeResult;
use crate::interpreter::value::Object;

pub(super) const STRING_METHODS: &[&str] = &[
    "len",
    "upper",
    "lower",
    "trim",
    "split",
    "contains",
    "startsWith",
    "endsWith",
    "replace",
    "index",
    "chars",
    "reverse",
    "repeat",
];

pub(super) fn call(ctx: &CallContext<'_>, s: &str, args: Vec<Object>) -> RuntimeResult<Object> {
    match ctx.name {
        "len" => {
            ctx.check_arity(Arity::Exact(0), &args)?;
            Ok(Object::Integer(s.chars().count() as i64))
        }
        "upper" => {
            ctx.check_arity(Arity::Exact(0), &args)?;
            Ok(Object::String(s.to_uppercase()))
        }
        "lower" => {
            ctx.check_arity(Arity::Exact(0), &args)?;
            Ok(Object::String(s.to_lowercase()))
        }
        "trim" => {
            ctx.check_arity(Arity::OneOf(&[0, 1]), &args)?;
            if args.is_empty() {
                return Ok(Object::String(s.trim().to_string()));
            }
            let cutset = ctx.string_arg(&args, 0)?;
            Ok(Object::String(s.trim_matches(|c: char| cutset.contains(c)).to_string()))
        }
        // split(sep?) - whitespace-separated fields without a separator
        "split" => {
            ctx.check_arity(Arity::OneOf(&[0, 1]), &args)?;
            let parts: Vec<Object> = if args.is_empty() {
                s.split_whitespace().map(Object::string).collect()
            } else {
                let sep = ctx.string_arg(&args, 0)?;
                if sep.is_empty() {
                    s.chars().map(|c| Object::String(c.to_string())).collect()
                } else {
                    s.split(sep.as_str()).map(Object::string).collect()
                }
            };
            Ok(Object::array(parts))
        }
        "contains" | "startsWith" | "endsWith" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let needle = ctx.string_arg(&args, 0)?;
            let found = match ctx.name {
                "contains" => s.contains(needle.as_str()),
                "startsWith" => s.starts_with(needle.as_str()),
                _ => s.ends_with(needle.as_str()),
            };
            Ok(Object::Boolean(found))
        }
        // replace(old, new, n?) - n < 0 or absent replaces every occurrence
        "replace" => {
            ctx.check_arity(Arity::OneOf(&[2, 3]), &args)?;
            let old = ctx.string_arg(&args, 0)?;
            let new = ctx.string_arg(&args, 1)?;
            let count = if args.len() == 3 { ctx.int_arg(&args, 2)? } else { -1 };
            let replaced = if count < 0 {
                s.replace(old.as_str(), &new)
            } else {
                s.replacen(old.as_str(), &new, count as usize)
            };
            Ok(Object::String(replaced))
        }
        // index(sub) - character position of the first match, -1 when absent
        "index" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let needle = ctx.string_arg(&args, 0)?;
            let position = s
                .find(needle.as_str())
                .map(|byte| s[..byte].chars().count() as i64)
                .unwrap_or(-1);
            Ok(Object::Integer(position))
        }
        "chars" => {
            ctx.check_arity(Arity::Exact(0), &args)?;
            Ok(Object::array(s.chars().map(|c| Object::String(c.to_string())).collect()))
        }
        "reverse" => {
            ctx.check_arity(Arity::Exact(0), &args)?;
            Ok(Object::String(s.chars().rev().collect()))
        }
        "repeat" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let times = ctx.int_arg(&args, 0)?;
            repeat_string(s, times).map(Object::String).map_err(|kind| ctx.error(kind))
        }
        other => ctx.fail(ErrorKind::no_method(other, "STRING")),
    }
}
