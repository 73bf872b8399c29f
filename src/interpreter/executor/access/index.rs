//! Index access evaluation (array[index], hash[key], s[start:end]).

use crate::ast::Expr;
use crate::error::{ErrorKind, RuntimeError};
use crate::interpreter::executor::{Interpreter, RuntimeResult};
use crate::interpreter::value::{HashKey, Object};
use crate::span::Span;

/// Position of `index` in a sequence of `len` items. Negative indexes count from the end.
fn position(index: i64, len: usize) -> Option<usize> {
    let resolved = if index < 0 { len as i64 + index } else { index };
    (0..len as i64).contains(&resolved).then_some(resolved as usize)
}

fn integer_index(index: &Object, span: Span) -> RuntimeResult<i64> {
    index
        .as_int()
        .ok_or_else(|| RuntimeError::new(ErrorKind::InvalidArgument(index.inspect()), span))
}

fn hash_key(key: &Object, span: Span) -> RuntimeResult<HashKey> {
    HashKey::from_object(key).ok_or_else(|| RuntimeError::new(ErrorKind::KeyError(key.type_name()), span))
}

/// Clamp slice bounds; `None` when they fall outside the sequence.
fn slice_bounds(start: Option<i64>, end: Option<i64>, len: usize) -> Option<(usize, usize)> {
    let len = len as i64;
    let resolve = |bound: i64| if bound < 0 { len + bound } else { bound };
    let start = resolve(start.unwrap_or(0));
    let end = resolve(end.unwrap_or(len));
    (0 <= start && start <= end && end <= len).then_some((start as usize, end as usize))
}

impl Interpreter {
    /// Evaluate index access expression: object[index]
    pub(crate) fn evaluate_index(&mut self, object: &Expr, index: &Expr, span: Span) -> RuntimeResult<Object> {
        let container = self.evaluate_operand(object)?;
        let index = self.evaluate_operand(index)?;
        self.index_value(&container, &index, span)
    }

    pub(crate) fn index_value(&mut self, container: &Object, index: &Object, span: Span) -> RuntimeResult<Object> {
        match container {
            Object::Array(items) => {
                let i = integer_index(index, span)?;
                let items = items.read();
                position(i, items.len())
                    .map(|p| items[p].clone())
                    .ok_or_else(|| RuntimeError::new(ErrorKind::IndexError(i), span))
            }
            Object::Tuple(items) => {
                let i = integer_index(index, span)?;
                position(i, items.len())
                    .map(|p| items[p].clone())
                    .ok_or_else(|| RuntimeError::new(ErrorKind::IndexError(i), span))
            }
            Object::String(s) => {
                let i = integer_index(index, span)?;
                let chars: Vec<char> = s.chars().collect();
                position(i, chars.len())
                    .map(|p| Object::String(chars[p].to_string()))
                    .ok_or_else(|| RuntimeError::new(ErrorKind::IndexError(i), span))
            }
            Object::Hash(map) => {
                let key = hash_key(index, span)?;
                Ok(map.read().get(&key).cloned().unwrap_or(Object::Nil))
            }
            Object::Instance(instance) => self.indexer_get(instance, index.clone(), span),
            other => Err(RuntimeError::new(ErrorKind::NoIndex(other.type_name()), span)),
        }
    }

    pub(crate) fn set_index_value(&mut self, container: &Object, index: Object, value: Object, span: Span) -> RuntimeResult<()> {
        match container {
            Object::Array(items) => {
                let i = integer_index(&index, span)?;
                let mut items = items.write();
                let p = position(i, items.len()).ok_or_else(|| RuntimeError::new(ErrorKind::IndexError(i), span))?;
                items[p] = value;
                Ok(())
            }
            Object::Hash(map) => {
                let key = hash_key(&index, span)?;
                map.write().insert(key, value);
                Ok(())
            }
            Object::Instance(instance) => self.indexer_set(instance, index, value, span),
            Object::Tuple(_) | Object::String(_) => Err(RuntimeError::generic(
                format!("cannot assign to an element of immutable {}", container.type_name()),
                span,
            )),
            other => Err(RuntimeError::new(ErrorKind::NoIndex(other.type_name()), span)),
        }
    }

    /// Evaluate object[start:end]; either bound may be omitted.
    pub(crate) fn evaluate_slice(
        &mut self,
        object: &Expr,
        start: Option<&Expr>,
        end: Option<&Expr>,
        span: Span,
    ) -> RuntimeResult<Object> {
        let container = self.evaluate_operand(object)?;
        let mut bound = |expr: Option<&Expr>| -> RuntimeResult<Option<i64>> {
            match expr {
                Some(expr) => {
                    let value = self.evaluate_operand(expr)?;
                    integer_index(&value, expr.span).map(Some)
                }
                None => Ok(None),
            }
        };
        let (start, end) = (bound(start)?, bound(end)?);
        let out_of_range = || {
            RuntimeError::new(
                ErrorKind::SliceError {
                    start: start.unwrap_or(0),
                    end: end.unwrap_or(-1),
                },
                span,
            )
        };

        match &container {
            Object::Array(items) => {
                let items = items.read();
                let (from, to) = slice_bounds(start, end, items.len()).ok_or_else(out_of_range)?;
                Ok(Object::array(items[from..to].to_vec()))
            }
            Object::Tuple(items) => {
                let (from, to) = slice_bounds(start, end, items.len()).ok_or_else(out_of_range)?;
                Ok(Object::tuple(items[from..to].to_vec()))
            }
            Object::String(s) => {
                let chars: Vec<char> = s.chars().collect();
                let (from, to) = slice_bounds(start, end, chars.len()).ok_or_else(out_of_range)?;
                Ok(Object::String(chars[from..to].iter().collect()))
            }
            other => Err(RuntimeError::new(ErrorKind::NoIndex(other.type_name()), span)),
        }
    }
}
