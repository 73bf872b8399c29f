//! Expression evaluation.

use std::str::FromStr;
use std::sync::Arc;

use crate::ast::{Expr, ExprKind, InfixOp};
use crate::decimal::Decimal;
use crate::error::{ErrorKind, RuntimeError};
use crate::interpreter::builtins;
use crate::interpreter::class::{builtin_class, builtin_class_names};
use crate::interpreter::stack::ensure_sufficient_stack;
use crate::interpreter::suggest;
use crate::interpreter::value::{Function, HashKey, HashMapObj, Object};
use crate::span::Span;

use super::{Interpreter, RuntimeResult};

impl Interpreter {
    /// Evaluate an expression to a value.
    pub(crate) fn evaluate(&mut self, expr: &Expr) -> RuntimeResult<Object> {
        ensure_sufficient_stack(|| self.evaluate_expr(expr))
    }

    fn evaluate_expr(&mut self, expr: &Expr) -> RuntimeResult<Object> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Nil => Ok(Object::Nil),
            ExprKind::Bool(b) => Ok(Object::Boolean(*b)),
            ExprKind::Int(n) => Ok(Object::Integer(*n)),
            ExprKind::UInt(n) => Ok(Object::UInteger(*n)),
            ExprKind::Float(f) => Ok(Object::Float(*f)),
            ExprKind::Decimal(text) => Decimal::from_str(text)
                .map(Object::Decimal)
                .map_err(|err| RuntimeError::new(ErrorKind::InvalidArgument(err.to_string()), span)),
            ExprKind::Str(s) => Ok(Object::String(s.clone())),

            ExprKind::Array(items) => Ok(Object::array(self.evaluate_arguments(items)?)),
            ExprKind::Tuple(items) => Ok(Object::tuple(self.evaluate_arguments(items)?)),
            ExprKind::Hash(pairs) => {
                let mut map = HashMapObj::with_capacity(pairs.len());
                for (key_expr, value_expr) in pairs {
                    let key = self.evaluate_operand(key_expr)?;
                    let key = HashKey::from_object(&key)
                        .ok_or_else(|| RuntimeError::new(ErrorKind::KeyError(key.type_name()), key_expr.span))?;
                    let value = self.evaluate(value_expr)?;
                    map.insert(key, value);
                }
                Ok(Object::hash(map))
            }

            ExprKind::Identifier(name) => self.lookup_identifier(name, span),

            ExprKind::Prefix { op, operand } => {
                let operand = self.evaluate_operand(operand)?;
                self.apply_prefix(*op, operand, span)
            }

            ExprKind::Infix { left, op, right } => match op {
                InfixOp::And => {
                    let left = self.evaluate_operand(left)?;
                    if !left.is_truthy() {
                        return Ok(Object::Boolean(false));
                    }
                    Ok(Object::Boolean(self.evaluate_operand(right)?.is_truthy()))
                }
                InfixOp::Or => {
                    let left = self.evaluate_operand(left)?;
                    if left.is_truthy() {
                        return Ok(Object::Boolean(true));
                    }
                    Ok(Object::Boolean(self.evaluate_operand(right)?.is_truthy()))
                }
                _ => {
                    let left = self.evaluate_operand(left)?;
                    let right = self.evaluate_operand(right)?;
                    self.apply_infix(*op, left, right, span)
                }
            },

            ExprKind::Postfix { op, operand } => self.evaluate_postfix(*op, operand, span),

            ExprKind::Assign { target, op, value } => self.evaluate_assign(target, *op, value, span),

            ExprKind::Range { start, end } => {
                let start = self.range_bound(start)?;
                let end = self.range_bound(end)?;
                Ok(Object::array((start..end).map(Object::Integer).collect()))
            }

            ExprKind::Index { object, index } => self.evaluate_index(object, index, span),

            ExprKind::Slice { object, start, end } => {
                self.evaluate_slice(object, start.as_deref(), end.as_deref(), span)
            }

            ExprKind::Member { object, name } => self.evaluate_member(object, name, span),

            ExprKind::MethodCall {
                object,
                method,
                arguments,
            } => self.evaluate_method_call(object, method, arguments, span),

            ExprKind::Call { callee, arguments } => {
                let callee = self.evaluate_operand(callee)?;
                let args = self.evaluate_arguments(arguments)?;
                self.call_value(&callee, args, span)
            }

            ExprKind::Function { name, params, body } => {
                let name = name.clone().unwrap_or_else(|| "<anonymous>".to_string());
                let func = Function::new(name, params.clone(), body.clone(), self.scope.clone(), span);
                Ok(Object::Function(Arc::new(func)))
            }

            ExprKind::New { class, arguments } => self.evaluate_new(class, arguments, span),

            ExprKind::Super { method, arguments } => self.evaluate_super(method, arguments, span),

            ExprKind::Spawn(task) => self.evaluate_spawn(task, span),

            ExprKind::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate_operand(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }
        }
    }

    /// Evaluate a value that takes part in an operation. Error objects are not valid
    /// operands.
    pub(crate) fn evaluate_operand(&mut self, expr: &Expr) -> RuntimeResult<Object> {
        let value = self.evaluate(expr)?;
        if let Object::Error(err) = &value {
            return Err(RuntimeError::generic(
                format!("error value used as an operand: {}", err),
                expr.span,
            ));
        }
        Ok(value)
    }

    pub(crate) fn evaluate_arguments(&mut self, arguments: &[Expr]) -> RuntimeResult<Vec<Object>> {
        arguments.iter().map(|arg| self.evaluate(arg)).collect()
    }

    fn range_bound(&mut self, expr: &Expr) -> RuntimeResult<i64> {
        match self.evaluate_operand(expr)? {
            Object::Integer(n) => Ok(n),
            Object::UInteger(n) => i64::try_from(n)
                .map_err(|_| RuntimeError::new(ErrorKind::InvalidArgument(n.to_string()), expr.span)),
            other => Err(RuntimeError::new(
                ErrorKind::RangeType {
                    expected: "INTEGER".to_string(),
                    got: other.type_name(),
                },
                expr.span,
            )),
        }
    }

    /// Scope chain, then builtin classes, then the builtin registry.
    pub(crate) fn lookup_identifier(&self, name: &str, span: Span) -> RuntimeResult<Object> {
        if let Some(value) = self.scope.get(name) {
            return Ok(value);
        }
        if let Some(class) = builtin_class(name) {
            return Ok(Object::Class(class));
        }
        if let Some(builtin) = builtins::lookup(name) {
            return Ok(builtin);
        }
        let mut candidates = self.scope.visible_names();
        candidates.extend(builtins::names());
        candidates.extend(builtin_class_names());
        let suggestions = suggest::similar(name, candidates.iter().map(String::as_str));
        let kind = if suggestions.is_empty() {
            ErrorKind::UnknownIdent(name.to_string())
        } else {
            ErrorKind::UnknownIdentEx {
                name: name.to_string(),
                suggestions: suggest::render(&suggestions),
            }
        };
        Err(RuntimeError::new(kind, span))
    }

    /// `ns` in `ns.member` when it names a registry namespace rather than a binding.
    pub(crate) fn namespace_of(&self, object: &Expr) -> Option<String> {
        match &object.kind {
            ExprKind::Identifier(name) if self.scope.get(name).is_none() && builtins::has_namespace(name) => {
                Some(name.clone())
            }
            _ => None,
        }
    }
}
