//! Evaluation hooks for step and breakpoint tooling built outside the interpreter.

use crate::interpreter::environment::Scope;
use crate::span::Span;

/// A function frame as seen by a listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameInfo {
    pub function: String,
    pub call_span: Span,
    /// Number of frames on the stack including this one.
    pub depth: usize,
}

/// Receives notifications while a program runs. Every method defaults to a no-op.
pub trait EvalListener: Send + Sync {
    /// Called before each statement executes.
    fn on_statement(&self, _span: Span, _scope: &Scope) {}

    /// Called after a frame is pushed.
    fn on_call(&self, _frame: &FrameInfo) {}

    /// Called after a frame is popped and its deferred calls have run.
    fn on_return(&self, _frame: &FrameInfo) {}
}
