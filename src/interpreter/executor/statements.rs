//! Statement execution.

use std::sync::Arc;

use crate::ast::{CatchClause, Expr, Stmt, StmtKind};
use crate::error::{ErrorKind, RuntimeError};
use crate::interpreter::stack::ensure_sufficient_stack;
use crate::interpreter::value::{Function, Object};
use crate::span::Span;

use super::{ControlFlow, Interpreter, RuntimeResult};

impl Interpreter {
    /// Execute a statement, returning control flow information.
    pub(crate) fn execute(&mut self, stmt: &Stmt) -> RuntimeResult<ControlFlow> {
        ensure_sufficient_stack(|| self.execute_stmt(stmt))
    }

    fn execute_stmt(&mut self, stmt: &Stmt) -> RuntimeResult<ControlFlow> {
        self.notify_statement(stmt.span);
        match &stmt.kind {
            StmtKind::Expression(expr) => Ok(ControlFlow::Normal(self.evaluate(expr)?)),

            StmtKind::Let { name, value } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Object::Nil,
                };
                self.scope
                    .set(name, value)
                    .map_err(|_| RuntimeError::new(ErrorKind::ConstNotAssign(name.clone()), stmt.span))?;
                Ok(ControlFlow::Normal(Object::Nil))
            }

            StmtKind::Const { name, value } => {
                let value = self.evaluate(value)?;
                self.scope
                    .set_const(name, value)
                    .map_err(|_| RuntimeError::new(ErrorKind::ConstNotAssign(name.clone()), stmt.span))?;
                Ok(ControlFlow::Normal(Object::Nil))
            }

            StmtKind::Block(statements) => {
                let scope = self.scope.child();
                self.execute_block(statements, scope)
            }

            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = self.evaluate_operand(condition)?;
                let scope = self.scope.child();
                if condition.is_truthy() {
                    self.execute_block(then_branch, scope)
                } else if let Some(else_branch) = else_branch {
                    self.execute_block(else_branch, scope)
                } else {
                    Ok(ControlFlow::Normal(Object::Nil))
                }
            }

            StmtKind::While { condition, body } => {
                while self.evaluate_operand(condition)?.is_truthy() {
                    let scope = self.scope.child();
                    match self.execute_block(body, scope)? {
                        ControlFlow::Break => break,
                        flow @ ControlFlow::Return(_) => return Ok(flow),
                        ControlFlow::Normal(_) | ControlFlow::Continue => {}
                    }
                }
                Ok(ControlFlow::Normal(Object::Nil))
            }

            StmtKind::ForIn {
                key,
                value,
                iterable,
                body,
            } => self.execute_for_in(key.as_deref(), value, iterable, body),

            StmtKind::Break => Ok(ControlFlow::Break),
            StmtKind::Continue => Ok(ControlFlow::Continue),

            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Object::Nil,
                };
                Ok(ControlFlow::Return(value))
            }

            StmtKind::Throw(expr) => {
                let value = self.evaluate(expr)?;
                match value {
                    Object::String(message) => Err(RuntimeError::new(ErrorKind::ThrowNotHandled(message), stmt.span)),
                    other => Err(RuntimeError::new(ErrorKind::ThrowError(other.type_name()), stmt.span)),
                }
            }

            StmtKind::Try { body, catch, finally } => self.execute_try(body, catch.as_ref(), finally.as_deref(), stmt.span),

            StmtKind::Defer(expr) => {
                self.register_defer(expr, stmt.span)?;
                Ok(ControlFlow::Normal(Object::Nil))
            }

            StmtKind::Function(decl) => {
                let func = Function::new(
                    decl.name.clone(),
                    decl.params.clone(),
                    decl.body.clone(),
                    self.scope.clone(),
                    decl.span,
                );
                self.scope
                    .set(&decl.name, Object::Function(Arc::new(func)))
                    .map_err(|_| RuntimeError::new(ErrorKind::ConstNotAssign(decl.name.clone()), stmt.span))?;
                Ok(ControlFlow::Normal(Object::Nil))
            }

            StmtKind::Class(decl) => {
                self.declare_class(decl)?;
                Ok(ControlFlow::Normal(Object::Nil))
            }

            StmtKind::Import(decl) => {
                self.execute_import(decl, stmt.span)?;
                Ok(ControlFlow::Normal(Object::Nil))
            }
        }
    }

    /// Pairs of (key, value) to bind on each iteration. Channels are consumed lazily
    /// by the loop itself and never reach here.
    fn iteration_items(&self, iterable: &Object, span: Span) -> RuntimeResult<Vec<(Object, Object)>> {
        match iterable {
            Object::Hash(map) => Ok(map.read().iter().map(|(k, v)| (k.to_object(), v.clone())).collect()),
            Object::Array(_) | Object::Tuple(_) | Object::String(_) => Ok(iterable
                .iter_items()
                .unwrap_or_default()
                .into_iter()
                .enumerate()
                .map(|(i, item)| (Object::Integer(i as i64), item))
                .collect()),
            other => Err(RuntimeError::new(ErrorKind::NotIterable(other.type_name()), span)),
        }
    }

    fn execute_for_in(
        &mut self,
        key: Option<&str>,
        value: &str,
        iterable: &Expr,
        body: &[Stmt],
    ) -> RuntimeResult<ControlFlow> {
        let collection = self.evaluate_operand(iterable)?;
        let loop_vars = LoopVars {
            key,
            value,
            walks_keys: matches!(collection, Object::Hash(_)),
            span: iterable.span,
        };

        if let Object::Channel(channel) = &collection {
            // Each received value runs the body before the next receive.
            let mut index = 0;
            while let Some(item) = channel.recv() {
                if let Some(flow) = self.run_iteration(&loop_vars, Object::Integer(index), item, body)? {
                    return Ok(flow);
                }
                index += 1;
            }
            return Ok(ControlFlow::Normal(Object::Nil));
        }

        for (k, v) in self.iteration_items(&collection, iterable.span)? {
            if let Some(flow) = self.run_iteration(&loop_vars, k, v, body)? {
                return Ok(flow);
            }
        }
        Ok(ControlFlow::Normal(Object::Nil))
    }

    /// Bind the loop variables and run the body once. `Some` ends the loop with that flow.
    fn run_iteration(
        &mut self,
        vars: &LoopVars<'_>,
        k: Object,
        v: Object,
        body: &[Stmt],
    ) -> RuntimeResult<Option<ControlFlow>> {
        let scope = self.scope.child();
        let bind = |name: &str, item: Object| {
            scope
                .set(name, item)
                .map_err(|_| RuntimeError::new(ErrorKind::ConstNotAssign(name.to_string()), vars.span))
        };
        match vars.key {
            Some(key) => {
                bind(key, k)?;
                bind(vars.value, v)?;
            }
            // A single variable walks the keys of a hash and the items of anything else.
            None if vars.walks_keys => bind(vars.value, k)?,
            None => bind(vars.value, v)?,
        }
        match self.execute_block(body, scope)? {
            ControlFlow::Break => Ok(Some(ControlFlow::Normal(Object::Nil))),
            flow @ ControlFlow::Return(_) => Ok(Some(flow)),
            ControlFlow::Normal(_) | ControlFlow::Continue => Ok(None),
        }
    }

    fn execute_try(
        &mut self,
        body: &[Stmt],
        catch: Option<&CatchClause>,
        finally: Option<&[Stmt]>,
        span: Span,
    ) -> RuntimeResult<ControlFlow> {
        let scope = self.scope.child();
        let mut result = self.execute_block(body, scope);

        let handler = match (&result, catch) {
            (Err(err), Some(clause)) => {
                let caught = match &err.kind {
                    ErrorKind::ThrowNotHandled(message) => Object::String(message.clone()),
                    _ => Object::error(err.clone()),
                };
                Some((clause, caught))
            }
            _ => None,
        };
        if let Some((clause, caught)) = handler {
            let scope = self.scope.child();
            result = match scope.set(&clause.name, caught) {
                Ok(()) => self.execute_block(&clause.body, scope),
                Err(_) => Err(RuntimeError::new(ErrorKind::ConstNotAssign(clause.name.clone()), span)),
            };
        }

        if let Some(finally) = finally {
            let scope = self.scope.child();
            match self.execute_block(finally, scope)? {
                ControlFlow::Normal(_) => {}
                flow => return Ok(flow),
            }
        }
        result
    }
}

/// Names a `for ... in` loop binds on each iteration.
struct LoopVars<'a> {
    key: Option<&'a str>,
    value: &'a str,
    walks_keys: bool,
    span: Span,
}
