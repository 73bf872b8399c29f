//! Lexical scopes, the call stack, and the shared output sink.
//!
//! A [`Scope`] is a cheap handle to a reference-counted node. Children keep their
//! parent alive, so a closure that outlives the call that created it still sees the
//! bindings it captured. Each node guards its own bindings with a reader/writer
//! lock; walking the chain takes one node's lock at a time, so tasks sharing an
//! ancestor only contend on the node they actually touch.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;

use crate::interpreter::class::Class;
use crate::interpreter::value::Object;
use crate::span::Span;

/// Output sink shared by a root scope, its descendants and spawned tasks.
pub type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Identifies the task a call frame belongs to. The main program is task 0.
pub type TaskId = u64;

static NEXT_TASK: AtomicU64 = AtomicU64::new(1);

/// Error returned by the mutating scope operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignError {
    /// The binding was declared with `const`.
    #[error("'{0}' is read-only")]
    ReadOnly(String),
}

#[derive(Default)]
struct Bindings {
    values: HashMap<String, Object>,
    readonly: HashSet<String>,
}

struct ScopeNode {
    bindings: RwLock<Bindings>,
    parent: Option<Scope>,
    writer: SharedWriter,
    call_stack: Arc<Mutex<CallStack>>,
    task: TaskId,
    /// Class whose method body this scope belongs to, if any.
    class_context: Option<Arc<Class>>,
}

/// Handle to a lexical environment node.
#[derive(Clone)]
pub struct Scope(Arc<ScopeNode>);

impl Scope {
    /// A root scope with its own call stack.
    pub fn new_root(writer: SharedWriter) -> Self {
        Self::build(None, writer, Arc::new(Mutex::new(CallStack::default())), 0, None)
    }

    /// A root scope printing to stdout.
    pub fn stdout() -> Self {
        Self::new_root(Arc::new(Mutex::new(Box::new(io::stdout()))))
    }

    /// A root scope that captures everything printed into `buffer`.
    pub fn with_buffer(buffer: &OutputBuffer) -> Self {
        Self::new_root(buffer.writer())
    }

    fn build(
        parent: Option<Scope>,
        writer: SharedWriter,
        call_stack: Arc<Mutex<CallStack>>,
        task: TaskId,
        class_context: Option<Arc<Class>>,
    ) -> Self {
        Scope(Arc::new(ScopeNode {
            bindings: RwLock::new(Bindings::default()),
            parent,
            writer,
            call_stack,
            task,
            class_context,
        }))
    }

    /// Block scope: same call stack and writer as `self`.
    pub fn child(&self) -> Self {
        Self::build(
            Some(self.clone()),
            Arc::clone(&self.0.writer),
            Arc::clone(&self.0.call_stack),
            self.0.task,
            None,
        )
    }

    /// Scope for a function body: lexically nested in `closure`, but running on the
    /// caller's call stack.
    pub(crate) fn enclosed(closure: &Scope, caller: &Scope, class_context: Option<Arc<Class>>) -> Self {
        Self::build(
            Some(closure.clone()),
            Arc::clone(&caller.0.writer),
            Arc::clone(&caller.0.call_stack),
            caller.0.task,
            class_context,
        )
    }

    /// Child scope for a spawned task. It shares the call stack of `self`, but
    /// the frames it pushes are tagged with a new task id.
    pub(crate) fn task(&self) -> Self {
        Self::build(
            Some(self.clone()),
            Arc::clone(&self.0.writer),
            Arc::clone(&self.0.call_stack),
            NEXT_TASK.fetch_add(1, Ordering::Relaxed),
            None,
        )
    }

    /// Root scope for a module body. Bindings start empty; output, call stack and
    /// task are those of `self`.
    pub(crate) fn module_root(&self) -> Self {
        Self::build(
            None,
            Arc::clone(&self.0.writer),
            Arc::clone(&self.0.call_stack),
            self.0.task,
            None,
        )
    }

    /// Task whose frames this scope pushes.
    pub fn task_id(&self) -> TaskId {
        self.0.task
    }

    pub fn parent(&self) -> Option<&Scope> {
        self.0.parent.as_ref()
    }

    /// Look `name` up from this scope outward.
    pub fn get(&self, name: &str) -> Option<Object> {
        let mut current = Some(self);
        while let Some(scope) = current {
            if let Some(value) = scope.0.bindings.read().values.get(name) {
                return Some(value.clone());
            }
            current = scope.parent();
        }
        None
    }

    /// Bind `name` in this scope, replacing any local binding.
    pub fn set(&self, name: &str, value: Object) -> Result<(), AssignError> {
        let mut bindings = self.0.bindings.write();
        if bindings.readonly.contains(name) {
            return Err(AssignError::ReadOnly(name.to_string()));
        }
        bindings.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Bind `name` in this scope and mark it read-only.
    pub fn set_const(&self, name: &str, value: Object) -> Result<(), AssignError> {
        let mut bindings = self.0.bindings.write();
        if bindings.readonly.contains(name) {
            return Err(AssignError::ReadOnly(name.to_string()));
        }
        bindings.values.insert(name.to_string(), value);
        bindings.readonly.insert(name.to_string());
        Ok(())
    }

    /// Rewrite the nearest scope that already holds `name`; if none does, bind it here.
    pub fn reset(&self, name: &str, value: Object) -> Result<(), AssignError> {
        let mut current = Some(self);
        while let Some(scope) = current {
            let mut bindings = scope.0.bindings.write();
            if bindings.values.contains_key(name) {
                if bindings.readonly.contains(name) {
                    return Err(AssignError::ReadOnly(name.to_string()));
                }
                bindings.values.insert(name.to_string(), value);
                return Ok(());
            }
            drop(bindings);
            current = scope.parent();
        }
        self.set(name, value)
    }

    /// Whether the nearest binding of `name` is read-only.
    pub fn is_read_only(&self, name: &str) -> bool {
        let mut current = Some(self);
        while let Some(scope) = current {
            let bindings = scope.0.bindings.read();
            if bindings.values.contains_key(name) {
                return bindings.readonly.contains(name);
            }
            current = scope.parent();
        }
        false
    }

    /// Whether `name` is bound directly in this scope.
    pub fn has_local(&self, name: &str) -> bool {
        self.0.bindings.read().values.contains_key(name)
    }

    /// Every name visible from this scope, innermost first, without duplicates.
    pub fn visible_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        let mut current = Some(self);
        while let Some(scope) = current {
            for name in scope.0.bindings.read().values.keys() {
                if seen.insert(name.clone()) {
                    names.push(name.clone());
                }
            }
            current = scope.parent();
        }
        names
    }

    /// The class whose method body encloses this scope, if any.
    pub fn current_class(&self) -> Option<Arc<Class>> {
        let mut current = Some(self);
        while let Some(scope) = current {
            if let Some(class) = &scope.0.class_context {
                return Some(Arc::clone(class));
            }
            current = scope.parent();
        }
        None
    }

    pub fn writer(&self) -> SharedWriter {
        Arc::clone(&self.0.writer)
    }

    /// Write `text` to the shared sink.
    pub fn write_str(&self, text: &str) -> io::Result<()> {
        let mut writer = self.0.writer.lock();
        writer.write_all(text.as_bytes())?;
        writer.flush()
    }

    pub fn call_stack(&self) -> Arc<Mutex<CallStack>> {
        Arc::clone(&self.0.call_stack)
    }

    /// True for scopes that share the same node.
    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bindings = self.0.bindings.read();
        let mut names: Vec<&String> = bindings.values.keys().collect();
        names.sort();
        f.debug_struct("Scope")
            .field("names", &names)
            .field("has_parent", &self.0.parent.is_some())
            .finish()
    }
}

/// A call registered with `defer`, run when its frame exits.
#[derive(Clone)]
pub struct DeferredCall {
    pub callee: Object,
    pub args: Vec<Object>,
    pub span: Span,
}

/// One active function invocation.
pub struct CallFrame {
    pub function: String,
    pub scope: Scope,
    pub call_span: Span,
    pub task: TaskId,
    pub(crate) defers: Vec<DeferredCall>,
}

impl CallFrame {
    /// Frame for a call made from `scope`'s task.
    pub fn new(function: impl Into<String>, scope: Scope, call_span: Span) -> Self {
        Self {
            function: function.into(),
            task: scope.task_id(),
            scope,
            call_span,
            defers: Vec::new(),
        }
    }

    /// Pending deferred calls, most recently registered first.
    pub(crate) fn take_defers(&mut self) -> Vec<DeferredCall> {
        let mut defers = std::mem::take(&mut self.defers);
        defers.reverse();
        defers
    }
}

/// Frames of every task running from one root scope, in push order.
///
/// Tasks interleave their pushes, so every per-call query is scoped to a task:
/// a task only ever sees and pops its own frames.
#[derive(Default)]
pub struct CallStack {
    frames: Vec<CallFrame>,
}

impl CallStack {
    pub fn push(&mut self, frame: CallFrame) {
        self.frames.push(frame);
    }

    /// Remove the innermost frame of `task`.
    pub fn pop(&mut self, task: TaskId) -> Option<CallFrame> {
        let idx = self.frames.iter().rposition(|frame| frame.task == task)?;
        Some(self.frames.remove(idx))
    }

    /// Frames of `task`.
    pub fn depth(&self, task: TaskId) -> usize {
        self.frames.iter().filter(|frame| frame.task == task).count()
    }

    /// Frames of every task.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn current(&self, task: TaskId) -> Option<&CallFrame> {
        self.frames.iter().rev().find(|frame| frame.task == task)
    }

    pub fn current_mut(&mut self, task: TaskId) -> Option<&mut CallFrame> {
        self.frames.iter_mut().rev().find(|frame| frame.task == task)
    }

    /// The frame that invoked the current one.
    pub fn caller(&self, task: TaskId) -> Option<&CallFrame> {
        self.frames.iter().rev().filter(|frame| frame.task == task).nth(1)
    }

    /// Function names of `task` from the outermost call inward.
    pub fn backtrace(&self, task: TaskId) -> Vec<String> {
        self.frames
            .iter()
            .filter(|frame| frame.task == task)
            .map(|frame| frame.function.clone())
            .collect()
    }
}

/// In-memory sink for program output.
#[derive(Clone, Default)]
pub struct OutputBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writer(&self) -> SharedWriter {
        Arc::new(Mutex::new(Box::new(self.clone())))
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }
}

impl Write for OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn root() -> Scope {
        Scope::with_buffer(&OutputBuffer::new())
    }

    #[test]
    fn test_get_walks_parents() {
        let outer = root();
        outer.set("x", Object::Integer(1)).unwrap();
        let inner = outer.child().child();
        assert_eq!(inner.get("x"), Some(Object::Integer(1)));
        assert_eq!(inner.get("missing"), None);
    }

    #[test]
    fn test_set_shadows_locally() {
        let outer = root();
        outer.set("x", Object::Integer(1)).unwrap();
        let inner = outer.child();
        inner.set("x", Object::Integer(2)).unwrap();
        assert_eq!(inner.get("x"), Some(Object::Integer(2)));
        assert_eq!(outer.get("x"), Some(Object::Integer(1)));
    }

    #[test]
    fn test_const_rejects_set_and_keeps_value() {
        let scope = root();
        scope.set_const("x", Object::Integer(1)).unwrap();
        assert_eq!(
            scope.set("x", Object::Integer(2)),
            Err(AssignError::ReadOnly("x".into()))
        );
        assert_eq!(scope.get("x"), Some(Object::Integer(1)));
        assert!(scope.is_read_only("x"));
    }

    #[test]
    fn test_reset_rewrites_nearest_holder() {
        let outer = root();
        outer.set("count", Object::Integer(0)).unwrap();
        let inner = outer.child();
        inner.reset("count", Object::Integer(5)).unwrap();
        assert!(!inner.has_local("count"));
        assert_eq!(outer.get("count"), Some(Object::Integer(5)));
    }

    #[test]
    fn test_reset_falls_back_to_local_binding() {
        let outer = root();
        let inner = outer.child();
        inner.reset("fresh", Object::Boolean(true)).unwrap();
        assert!(inner.has_local("fresh"));
        assert_eq!(outer.get("fresh"), None);
    }

    #[test]
    fn test_reset_on_const_in_ancestor_is_rejected() {
        let outer = root();
        outer.set_const("limit", Object::Integer(3)).unwrap();
        let inner = outer.child();
        assert!(inner.reset("limit", Object::Integer(4)).is_err());
        assert_eq!(inner.get("limit"), Some(Object::Integer(3)));
    }

    #[test]
    fn test_children_share_writer_and_stack() {
        let buffer = OutputBuffer::new();
        let scope = Scope::with_buffer(&buffer);
        let child = scope.child();
        child.write_str("hello").unwrap();
        assert_eq!(buffer.contents(), "hello");
        assert!(Arc::ptr_eq(&scope.call_stack(), &child.call_stack()));
        let task = scope.task();
        assert!(Arc::ptr_eq(&scope.call_stack(), &task.call_stack()));
        assert_ne!(scope.task_id(), task.task_id());
        assert_eq!(task.child().task_id(), task.task_id());
    }

    #[test]
    fn test_concurrent_resets_on_shared_parent() {
        let scope = root();
        scope.set("n", Object::Integer(0)).unwrap();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let task = scope.task();
                std::thread::spawn(move || {
                    task.reset(&format!("t{}", i), Object::Integer(i)).unwrap();
                    task.get("n")
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(Object::Integer(0)));
        }
    }

    #[test]
    fn test_call_stack_frames() {
        let scope = root();
        let mut stack = CallStack::default();
        stack.push(CallFrame::new("outer", scope.clone(), Span::at_line(1)));
        stack.push(CallFrame::new("inner", scope, Span::at_line(2)));
        assert_eq!(stack.caller(0).map(|f| f.function.as_str()), Some("outer"));
        assert_eq!(stack.backtrace(0), vec!["outer".to_string(), "inner".to_string()]);
        assert_eq!(stack.pop(0).map(|f| f.call_span.line), Some(2));
        assert_eq!(stack.depth(0), 1);
    }

    #[test]
    fn test_tasks_share_stack_but_own_their_frames() {
        let main = root();
        let worker = main.task();
        let stack = main.call_stack();
        let mut frames = stack.lock();
        frames.push(CallFrame::new("main", main.clone(), Span::at_line(1)));
        frames.push(CallFrame::new("work", worker.clone(), Span::at_line(2)));
        frames.push(CallFrame::new("helper", main.clone(), Span::at_line(3)));

        assert_eq!(frames.len(), 3);
        assert_eq!(frames.depth(worker.task_id()), 1);
        assert_eq!(frames.current(worker.task_id()).map(|f| f.function.as_str()), Some("work"));
        assert_eq!(frames.caller(main.task_id()).map(|f| f.function.as_str()), Some("main"));

        // The worker returns while the main task is still inside `helper`.
        assert_eq!(frames.pop(worker.task_id()).map(|f| f.function), Some("work".to_string()));
        assert_eq!(frames.backtrace(main.task_id()), vec!["main".to_string(), "helper".to_string()]);
        assert!(frames.pop(worker.task_id()).is_none());
    }
}
