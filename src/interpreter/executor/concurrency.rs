//! `defer` and `spawn`.
//!
//! Both capture a call: the callee and its arguments are evaluated where the
//! statement appears, and the call itself runs later (frame exit) or elsewhere
//! (a new thread).

use std::thread;

use crate::ast::{Expr, ExprKind};
use crate::error::{ErrorKind, RuntimeError};
use crate::interpreter::builtins;
use crate::interpreter::environment::DeferredCall;
use crate::interpreter::executor::{Interpreter, RuntimeResult};
use crate::interpreter::value::Object;
use crate::span::Span;

/// Host stack for spawned tasks; deep script recursion needs more than the default.
const TASK_STACK_SIZE: usize = 32 * 1024 * 1024;

impl Interpreter {
    /// Evaluate the callee and arguments of a call expression without calling it.
    /// `None` when `expr` is not a call or a function literal.
    fn capture_call(&mut self, expr: &Expr) -> RuntimeResult<Option<(Object, Vec<Object>)>> {
        let captured = match &expr.kind {
            ExprKind::Call { callee, arguments } => {
                let callee = self.evaluate(callee)?;
                (callee, self.evaluate_arguments(arguments)?)
            }
            ExprKind::MethodCall {
                object,
                method,
                arguments,
            } => {
                let callee = match self.namespace_of(object) {
                    Some(namespace) => builtins::lookup_in(&namespace, method).ok_or_else(|| {
                        RuntimeError::new(ErrorKind::no_method(method.clone(), namespace.clone()), expr.span)
                    })?,
                    None => {
                        let receiver = self.evaluate(object)?;
                        self.bound_method(&receiver, method, expr.span)
                    }
                };
                (callee, self.evaluate_arguments(arguments)?)
            }
            ExprKind::Function { .. } => (self.evaluate(expr)?, Vec::new()),
            _ => return Ok(None),
        };
        Ok(Some(captured))
    }

    /// Register a call to run when the current function returns.
    pub(crate) fn register_defer(&mut self, expr: &Expr, span: Span) -> RuntimeResult<()> {
        let task = self.scope.task_id();
        let call_stack = self.scope.call_stack();
        if call_stack.lock().current(task).is_none() {
            return Err(RuntimeError::new(ErrorKind::DeferError, span));
        }
        let (callee, args) = self
            .capture_call(expr)?
            .ok_or_else(|| RuntimeError::new(ErrorKind::DeferError, span))?;
        if !matches!(callee, Object::Function(_) | Object::Builtin(_)) {
            return Err(RuntimeError::new(ErrorKind::DeferError, span));
        }
        let mut stack = call_stack.lock();
        let frame = stack
            .current_mut(task)
            .ok_or_else(|| RuntimeError::new(ErrorKind::DeferError, span))?;
        frame.defers.push(DeferredCall { callee, args, span });
        Ok(())
    }

    /// Run a frame's deferred calls, most recent first. A failing body keeps its
    /// error; otherwise the first failing deferred call becomes the result.
    pub(crate) fn run_deferred(
        &mut self,
        defers: Vec<DeferredCall>,
        result: RuntimeResult<Object>,
    ) -> RuntimeResult<Object> {
        let mut result = result;
        for deferred in defers {
            if let Err(err) = self.call_value(&deferred.callee, deferred.args, deferred.span) {
                if result.is_ok() {
                    result = Err(err);
                } else {
                    tracing::warn!(error = %err, "deferred call failed");
                }
            }
        }
        result
    }

    /// Start a call on a new thread sharing the current scope chain.
    pub(crate) fn evaluate_spawn(&mut self, task: &Expr, span: Span) -> RuntimeResult<Object> {
        let (callee, args) = self
            .capture_call(task)?
            .ok_or_else(|| RuntimeError::new(ErrorKind::SpawnError, span))?;
        if !matches!(callee, Object::Function(_) | Object::Builtin(_)) {
            return Err(RuntimeError::new(ErrorKind::SpawnError, span));
        }

        let mut worker = self.with_scope(self.scope.task());
        thread::Builder::new()
            .name("aeroscript-task".to_string())
            .stack_size(TASK_STACK_SIZE)
            .spawn(move || {
                if let Err(err) = worker.call_value(&callee, args, span) {
                    tracing::warn!(error = %err, line = span.line, "spawned task failed");
                }
            })
            .map_err(|err| RuntimeError::generic(format!("cannot start task: {}", err), span))?;
        tracing::trace!(line = span.line, "task spawned");
        Ok(Object::Nil)
    }
}
