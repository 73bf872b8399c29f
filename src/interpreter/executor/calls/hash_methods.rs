//! Method call evaluation - Hash methods.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::ErrorKind;
use crate::interpreter::builtins::{Arity, CallContext};
use crate::interpreter::executor::RuntimeResult;
use crate::interpreter::value::{HashKey, HashMapObj, Object};

pub(super) const HASH_METHODS: &[&str] = &["len", "keys", "values", "get", "set", "has", "delete", "merge", "each"];

fn key_arg(ctx: &CallContext<'_>, value: &Object) -> RuntimeResult<HashKey> {
    HashKey::from_object(value).ok_or_else(|| ctx.error(ErrorKind::KeyError(value.type_name())))
}

pub(super) fn call(ctx: &CallContext<'_>, map: &Arc<RwLock<HashMapObj>>, args: Vec<Object>) -> RuntimeResult<Object> {
    match ctx.name {
        "len" => {
            ctx.check_arity(Arity::Exact(0), &args)?;
            Ok(Object::Integer(map.read().len() as i64))
        }
        "keys" => {
            ctx.check_arity(Arity::Exact(0), &args)?;
            Ok(Object::array(map.read().keys().map(HashKey::to_object).collect()))
        }
        "values" => {
            ctx.check_arity(Arity::Exact(0), &args)?;
            Ok(Object::array(map.read().values().cloned().collect()))
        }
        // get(key, default?)
        "get" => {
            ctx.check_arity(Arity::OneOf(&[1, 2]), &args)?;
            let key = key_arg(ctx, &args[0])?;
            let fallback = args.get(1).cloned().unwrap_or(Object::Nil);
            Ok(map.read().get(&key).cloned().unwrap_or(fallback))
        }
        "set" => {
            ctx.check_arity(Arity::Exact(2), &args)?;
            let key = key_arg(ctx, &args[0])?;
            map.write().insert(key, args[1].clone());
            Ok(Object::Hash(Arc::clone(map)))
        }
        "has" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let key = key_arg(ctx, &args[0])?;
            Ok(Object::Boolean(map.read().contains_key(&key)))
        }
        // delete(key) - the removed value, or nil
        "delete" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let key = key_arg(ctx, &args[0])?;
            Ok(map.write().shift_remove(&key).unwrap_or(Object::Nil))
        }
        // merge(other) - a new hash; keys from `other` win
        "merge" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let other = match &args[0] {
                Object::Hash(other) => other.read().clone(),
                other => return ctx.param_type(0, "*Hash", other),
            };
            let mut merged = map.read().clone();
            merged.extend(other);
            Ok(Object::hash(merged))
        }
        "each" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let entries: Vec<(Object, Object)> = map.read().iter().map(|(k, v)| (k.to_object(), v.clone())).collect();
            for (key, value) in entries {
                ctx.call(&args[0], vec![key, value])?;
            }
            Ok(Object::Hash(Arc::clone(map)))
        }
        other => ctx.fail(ErrorKind::no_method(other, "HASH")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_table_has_no_duplicates() {
        let mut sorted = HASH_METHODS.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), HASH_METHODS.len());
    }
}
