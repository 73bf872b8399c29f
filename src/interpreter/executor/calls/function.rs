//! Methods of functions and builtins.

use crate::error::ErrorKind;
use crate::interpreter::builtins::{Arity, CallContext};
use crate::interpreter::executor::RuntimeResult;
use crate::interpreter::value::Object;

pub(super) const FUNCTION_METHODS: &[&str] = &["call", "name"];

pub(super) fn call(ctx: &CallContext<'_>, callee: &Object, args: Vec<Object>) -> RuntimeResult<Object> {
    match ctx.name {
        // f.call(args...) is f(args...)
        "call" => ctx.call(callee, args),
        "name" => {
            ctx.check_arity(Arity::Exact(0), &args)?;
            let name = match callee {
                Object::Function(func) => func.name.clone(),
                Object::Builtin(native) => native.name.clone(),
                _ => String::new(),
            };
            Ok(Object::String(name))
        }
        other => ctx.fail(ErrorKind::no_method(other, callee.type_name())),
    }
}
