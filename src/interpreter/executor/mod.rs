//! Tree-walking interpreter for AeroScript.
//!
//! Every evaluation function returns [`RuntimeResult`]; the first error short-circuits
//! through `?`. [`Interpreter::eval`] turns an escaping error into an `Error` object.

mod assignment;
mod concurrency;
mod expressions;
mod imports;
mod operators;
mod statements;

pub mod access;
pub mod calls;
pub mod objects;

use std::sync::Arc;

use crate::ast::{Program, Stmt};
use crate::error::{ErrorKind, RuntimeError};
use crate::interpreter::builtins::CallContext;
use crate::interpreter::class::Class;
use crate::interpreter::environment::{CallFrame, Scope};
use crate::interpreter::listener::{EvalListener, FrameInfo};
use crate::interpreter::module::{ModuleLoader, ModuleRegistry};
use crate::interpreter::value::{Function, Object};
use crate::span::Span;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Frames deeper than this fail instead of overflowing the host stack.
pub const MAX_CALL_DEPTH: usize = 512;

/// Outcome of executing a statement.
#[derive(Debug, Clone)]
pub(crate) enum ControlFlow {
    Normal(Object),
    Return(Object),
    Break,
    Continue,
}

/// What a function body runs against besides its arguments.
#[derive(Clone, Default)]
pub(crate) struct Binding {
    /// Bound to `self` and `this`.
    pub receiver: Option<Object>,
    /// Class the method was declared in.
    pub class: Option<Arc<Class>>,
}

/// The AeroScript interpreter. Cheap to clone: clones share the same scope chain.
#[derive(Clone)]
pub struct Interpreter {
    pub(crate) scope: Scope,
    listener: Option<Arc<dyn EvalListener>>,
    modules: Option<Arc<ModuleRegistry>>,
}

impl Interpreter {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            listener: None,
            modules: None,
        }
    }

    /// Interpreter over a fresh root scope printing to stdout.
    pub fn stdout() -> Self {
        Self::new(Scope::stdout())
    }

    pub fn with_listener(mut self, listener: Arc<dyn EvalListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Resolve `import` statements through `loader`.
    pub fn with_loader(mut self, loader: Arc<dyn ModuleLoader>) -> Self {
        self.modules = Some(Arc::new(ModuleRegistry::new(loader)));
        self
    }

    /// Same listener and modules, different scope.
    pub(crate) fn with_scope(&self, scope: Scope) -> Self {
        Self {
            scope,
            listener: self.listener.clone(),
            modules: self.modules.clone(),
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Run a program. The value of its last statement, or of a top-level `return`,
    /// is the result.
    pub fn run(&mut self, program: &Program) -> RuntimeResult<Object> {
        match self.execute_statements(&program.statements)? {
            ControlFlow::Normal(value) | ControlFlow::Return(value) => Ok(value),
            ControlFlow::Break => Err(RuntimeError::generic("'break' outside of a loop", Span::default())),
            ControlFlow::Continue => Err(RuntimeError::generic("'continue' outside of a loop", Span::default())),
        }
    }

    /// Run a program, reporting failure as an `Error` object.
    pub fn eval(&mut self, program: &Program) -> Object {
        match self.run(program) {
            Ok(value) => value,
            Err(err) => Object::error(err),
        }
    }

    /// Execute statements in the current scope.
    pub(crate) fn execute_statements(&mut self, statements: &[Stmt]) -> RuntimeResult<ControlFlow> {
        let mut last = ControlFlow::Normal(Object::Nil);
        for stmt in statements {
            last = self.execute(stmt)?;
            if !matches!(last, ControlFlow::Normal(_)) {
                break;
            }
        }
        Ok(last)
    }

    /// Execute statements with `scope` as the current scope, restoring the previous one after.
    pub(crate) fn execute_block(&mut self, statements: &[Stmt], scope: Scope) -> RuntimeResult<ControlFlow> {
        let previous = std::mem::replace(&mut self.scope, scope);
        let result = self.execute_statements(statements);
        self.scope = previous;
        result
    }

    /// Evaluate `f` with `scope` as the current scope.
    pub(crate) fn within<T>(&mut self, scope: Scope, f: impl FnOnce(&mut Self) -> T) -> T {
        let previous = std::mem::replace(&mut self.scope, scope);
        let result = f(self);
        self.scope = previous;
        result
    }

    pub(crate) fn notify_statement(&self, span: Span) {
        if let Some(listener) = &self.listener {
            listener.on_statement(span, &self.scope);
        }
    }

    pub(crate) fn context<'a>(&'a self, span: Span, name: &'a str) -> CallContext<'a> {
        CallContext::new(self, span, name)
    }

    /// Call anything callable: script functions and builtins.
    pub fn call_value(&mut self, callee: &Object, args: Vec<Object>, span: Span) -> RuntimeResult<Object> {
        match callee {
            Object::Function(func) => self.call_function(func, args, span, Binding::default()),
            Object::Builtin(native) => {
                let ctx = self.context(span, &native.name);
                (native.func)(&ctx, args)
            }
            Object::Class(class) => Err(RuntimeError::new(ErrorKind::ClassCreate(class.name.clone()), span)),
            other => Err(RuntimeError::generic(format!("not a function: {}", other.type_name()), span)),
        }
    }

    /// Invoke a script function: push a frame, bind arguments, run the body, then run
    /// the frame's deferred calls.
    pub(crate) fn call_function(
        &mut self,
        func: &Arc<Function>,
        args: Vec<Object>,
        span: Span,
        binding: Binding,
    ) -> RuntimeResult<Object> {
        if args.len() < func.required_arity() || args.len() > func.arity() {
            return Err(RuntimeError::new(ErrorKind::arguments(func.arity_label(), args.len()), span));
        }

        let task = self.scope.task_id();
        let call_stack = self.scope.call_stack();
        let depth = call_stack.lock().depth(task);
        if depth >= MAX_CALL_DEPTH {
            return Err(RuntimeError::generic(
                format!("maximum call depth of {} exceeded in '{}'", MAX_CALL_DEPTH, func.name),
                span,
            ));
        }

        let scope = Scope::enclosed(&func.closure, &self.scope, binding.class.clone());
        if let Some(receiver) = &binding.receiver {
            bind_receiver(&scope, receiver, span)?;
        }

        call_stack.lock().push(CallFrame::new(func.name.clone(), scope.clone(), span));
        let frame = FrameInfo {
            function: func.name.clone(),
            call_span: span,
            depth: depth + 1,
        };
        tracing::debug!(function = %func.name, depth = frame.depth, "push frame");
        if let Some(listener) = &self.listener {
            listener.on_call(&frame);
        }

        let result = self.within(scope, |interp| {
            interp.bind_parameters(func, args)?;
            match interp.execute_statements(&func.body)? {
                ControlFlow::Normal(value) | ControlFlow::Return(value) => Ok(value),
                ControlFlow::Break | ControlFlow::Continue => Err(RuntimeError::generic(
                    format!("'break' or 'continue' escaped function '{}'", func.name),
                    span,
                )),
            }
        });

        let defers = call_stack.lock().pop(task).map(|mut f| f.take_defers()).unwrap_or_default();
        tracing::debug!(function = %func.name, deferred = defers.len(), "pop frame");
        let result = self.run_deferred(defers, result);

        if let Some(listener) = &self.listener {
            listener.on_return(&frame);
        }
        result
    }

    fn bind_parameters(&mut self, func: &Function, mut args: Vec<Object>) -> RuntimeResult<()> {
        let supplied = args.len();
        args.reverse();
        for (i, param) in func.params.iter().enumerate() {
            let value = if i < supplied {
                args.pop().unwrap_or(Object::Nil)
            } else {
                match &param.default_value {
                    Some(default) => self.evaluate(default)?,
                    None => Object::Nil,
                }
            };
            self.scope
                .set(&param.name, value)
                .map_err(|_| RuntimeError::new(ErrorKind::ConstNotAssign(param.name.clone()), func.span))?;
        }
        Ok(())
    }
}

/// Bind `self` and `this` in a method's frame.
pub(crate) fn bind_receiver(scope: &Scope, receiver: &Object, span: Span) -> RuntimeResult<()> {
    for name in ["self", "this"] {
        scope
            .set(name, receiver.clone())
            .map_err(|_| RuntimeError::new(ErrorKind::ConstNotAssign(name.to_string()), span))?;
    }
    Ok(())
}
