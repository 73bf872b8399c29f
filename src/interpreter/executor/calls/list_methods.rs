//! Method call evaluation - double-ended lists.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::ErrorKind;
use crate::interpreter::builtins::{Arity, CallContext};
use crate::interpreter::executor::RuntimeResult;
use crate::interpreter::value::Object;

pub(super) const LIST_METHODS: &[&str] = &[
    "pushBack", "pushFront", "popBack", "popFront", "front", "back", "len", "isEmpty", "clear",
    "toArray", "get", "insert", "remove",
];

type List = Arc<RwLock<VecDeque<Object>>>;

/// Position `index` in a list of `len` items; negative counts from the back.
fn position(index: i64, len: usize) -> Option<usize> {
    let resolved = if index < 0 { index.checked_add(len as i64)? } else { index };
    usize::try_from(resolved).ok()
}

pub(super) fn call(ctx: &CallContext<'_>, list: &List, args: Vec<Object>) -> RuntimeResult<Object> {
    match ctx.name {
        // pushBack(values...) / pushFront(values...) - the list
        "pushBack" | "pushFront" => {
            ctx.check_arity(Arity::AtLeast(1), &args)?;
            let mut items = list.write();
            for value in args {
                if ctx.name == "pushBack" {
                    items.push_back(value);
                } else {
                    items.push_front(value);
                }
            }
            drop(items);
            Ok(Object::List(Arc::clone(list)))
        }
        "get" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let index = ctx.int_arg(&args, 0)?;
            let items = list.read();
            let item = position(index, items.len()).and_then(|i| items.get(i).cloned());
            item.ok_or_else(|| ctx.error(ErrorKind::IndexError(index)))
        }
        // insert(index, value) - index may equal len to append
        "insert" => {
            ctx.check_arity(Arity::Exact(2), &args)?;
            let index = ctx.int_arg(&args, 0)?;
            let mut items = list.write();
            match position(index, items.len()) {
                Some(i) if i <= items.len() => items.insert(i, args[1].clone()),
                _ => return ctx.fail(ErrorKind::IndexError(index)),
            }
            drop(items);
            Ok(Object::List(Arc::clone(list)))
        }
        "remove" => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let index = ctx.int_arg(&args, 0)?;
            let mut items = list.write();
            let len = items.len();
            let removed = position(index, len).and_then(|i| items.remove(i));
            removed.ok_or_else(|| ctx.error(ErrorKind::IndexError(index)))
        }
        _ => {
            ctx.check_arity(Arity::Exact(0), &args)?;
            Ok(match ctx.name {
                // pops and peeks give nil on an empty list
                "popBack" => list.write().pop_back().unwrap_or(Object::Nil),
                "popFront" => list.write().pop_front().unwrap_or(Object::Nil),
                "front" => list.read().front().cloned().unwrap_or(Object::Nil),
                "back" => list.read().back().cloned().unwrap_or(Object::Nil),
                "len" => Object::Integer(list.read().len() as i64),
                "isEmpty" => Object::Boolean(list.read().is_empty()),
                "clear" => {
                    list.write().clear();
                    Object::List(Arc::clone(list))
                }
                "toArray" => Object::array(list.read().iter().cloned().collect()),
                other => return ctx.fail(ErrorKind::no_method(other, "LIST")),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_positions_count_from_back() {
        assert_eq!(position(0, 3), Some(0));
        assert_eq!(position(-1, 3), Some(2));
        assert_eq!(position(-3, 3), Some(0));
        assert_eq!(position(-4, 3), None);
        assert_eq!(position(7, 3), Some(7));
    }
}
