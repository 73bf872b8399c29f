//! Built-in functions for AeroScript.
//!
//! Builtins live in a process-wide registry: global functions plus namespaces holding
//! functions and constant values. Names are matched case-insensitively. Each submodule
//! contributes one `register_*_builtins` batch; hosts add their own batches with
//! [`register_functions`] and [`register_vars`] before running a program.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::RwLock;

use crate::error::{ErrorKind, RuntimeError};
use crate::interpreter::environment::Scope;
use crate::interpreter::executor::{Interpreter, RuntimeResult};
use crate::interpreter::value::{NativeFunction, Object};
use crate::span::Span;

pub mod classes;
pub mod common;
pub mod decimal;
pub mod format;
pub mod io;
pub mod json;
pub mod math;
pub mod sync;
pub mod time;
pub mod types;
pub mod xml;

#[derive(Default)]
struct Namespace {
    functions: HashMap<String, Arc<NativeFunction>>,
    vars: HashMap<String, Object>,
}

/// Global functions and namespaces.
#[derive(Default)]
pub struct Registry {
    functions: HashMap<String, Arc<NativeFunction>>,
    namespaces: HashMap<String, Namespace>,
}

impl Registry {
    fn with_defaults() -> Self {
        let mut registry = Registry::default();
        common::register_common_builtins(&mut registry);
        types::register_type_builtins(&mut registry);
        math::register_math_builtins(&mut registry);
        format::register_format_builtins(&mut registry);
        classes::register_class_builtins(&mut registry);
        sync::register_sync_builtins(&mut registry);
        io::register_io_builtins(&mut registry);
        time::register_time_builtins(&mut registry);
        decimal::register_decimal_builtins(&mut registry);
        json::register_json_builtins(&mut registry);
        xml::register_xml_builtins(&mut registry);
        registry
    }

    /// Define a global function.
    pub fn define<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&CallContext<'_>, Vec<Object>) -> RuntimeResult<Object> + Send + Sync + 'static,
    {
        self.functions
            .insert(name.to_lowercase(), Arc::new(NativeFunction::new(name, func)));
    }

    /// Define `namespace.name`.
    pub fn define_in<F>(&mut self, namespace: &str, name: &str, func: F)
    where
        F: Fn(&CallContext<'_>, Vec<Object>) -> RuntimeResult<Object> + Send + Sync + 'static,
    {
        let qualified = format!("{}.{}", namespace, name);
        self.namespace(namespace)
            .functions
            .insert(name.to_lowercase(), Arc::new(NativeFunction::new(qualified, func)));
    }

    /// Define the constant `namespace.name`.
    pub fn define_var(&mut self, namespace: &str, name: &str, value: Object) {
        self.namespace(namespace).vars.insert(name.to_lowercase(), value);
    }

    fn namespace(&mut self, name: &str) -> &mut Namespace {
        self.namespaces.entry(name.to_lowercase()).or_default()
    }

    fn add_functions(&mut self, namespace: &str, batch: Vec<NativeFunction>) {
        for func in batch {
            let key = func.name.to_lowercase();
            let func = Arc::new(func);
            if namespace.is_empty() {
                self.functions.insert(key, func);
            } else {
                self.namespace(namespace).functions.insert(key, func);
            }
        }
    }
}

lazy_static! {
    static ref REGISTRY: RwLock<Registry> = RwLock::new(Registry::with_defaults());
}

/// Add a batch of native functions. An empty namespace registers them globally.
/// Later registrations replace earlier ones with the same name.
pub fn register_functions(namespace: &str, batch: Vec<NativeFunction>) {
    tracing::debug!(namespace, count = batch.len(), "registering builtin functions");
    REGISTRY.write().add_functions(namespace, batch);
}

/// Add a batch of constant values under `namespace`.
pub fn register_vars(namespace: &str, batch: Vec<(String, Object)>) {
    tracing::debug!(namespace, count = batch.len(), "registering builtin variables");
    let mut registry = REGISTRY.write();
    for (name, value) in batch {
        registry.define_var(namespace, &name, value);
    }
}

/// Global builtin function `name`.
pub fn lookup(name: &str) -> Option<Object> {
    REGISTRY
        .read()
        .functions
        .get(&name.to_lowercase())
        .map(|func| Object::Builtin(Arc::clone(func)))
}

/// Function or variable `name` inside `namespace`.
pub fn lookup_in(namespace: &str, name: &str) -> Option<Object> {
    let registry = REGISTRY.read();
    let ns = registry.namespaces.get(&namespace.to_lowercase())?;
    let key = name.to_lowercase();
    ns.functions
        .get(&key)
        .map(|func| Object::Builtin(Arc::clone(func)))
        .or_else(|| ns.vars.get(&key).cloned())
}

pub fn has_namespace(namespace: &str) -> bool {
    REGISTRY.read().namespaces.contains_key(&namespace.to_lowercase())
}

/// Names of every global builtin.
pub fn names() -> Vec<String> {
    REGISTRY.read().functions.values().map(|f| f.name.clone()).collect()
}

/// Member names of `namespace`.
pub fn namespace_members(namespace: &str) -> Vec<String> {
    let registry = REGISTRY.read();
    match registry.namespaces.get(&namespace.to_lowercase()) {
        Some(ns) => ns.functions.keys().chain(ns.vars.keys()).cloned().collect(),
        None => Vec::new(),
    }
}

/// Accepted argument counts of a builtin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    OneOf(&'static [usize]),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, got: usize) -> bool {
        match self {
            Arity::Exact(n) => got == *n,
            Arity::OneOf(counts) => counts.contains(&got),
            Arity::AtLeast(n) => got >= *n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::OneOf(counts) => {
                let counts: Vec<String> = counts.iter().map(|n| n.to_string()).collect();
                write!(f, "{}", counts.join("|"))
            }
            Arity::AtLeast(n) => write!(f, ">={}", n),
        }
    }
}

/// English ordinal for a zero-based argument position.
pub fn ordinal(position: usize) -> String {
    const NAMES: [&str; 10] = [
        "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth", "tenth",
    ];
    NAMES
        .get(position)
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("{}th", position + 1))
}

/// What a builtin sees of the call that invoked it.
pub struct CallContext<'a> {
    pub interp: &'a Interpreter,
    pub span: Span,
    pub name: &'a str,
}

impl<'a> CallContext<'a> {
    pub fn new(interp: &'a Interpreter, span: Span, name: &'a str) -> Self {
        Self { interp, span, name }
    }

    pub fn scope(&self) -> &Scope {
        self.interp.scope()
    }

    pub fn error(&self, kind: ErrorKind) -> RuntimeError {
        RuntimeError::new(kind, self.span)
    }

    pub fn fail<T>(&self, kind: ErrorKind) -> RuntimeResult<T> {
        Err(self.error(kind))
    }

    pub fn generic<T>(&self, message: impl Into<String>) -> RuntimeResult<T> {
        self.fail(ErrorKind::generic(message))
    }

    /// ARGUMENT_ERROR unless `args` has an accepted length.
    pub fn check_arity(&self, arity: Arity, args: &[Object]) -> RuntimeResult<()> {
        if arity.accepts(args.len()) {
            Ok(())
        } else {
            self.fail(ErrorKind::arguments(arity.to_string(), args.len()))
        }
    }

    /// PARAM_TYPE_ERROR for the argument at `position`.
    pub fn param_type<T>(&self, position: usize, expected: &str, got: &Object) -> RuntimeResult<T> {
        self.fail(ErrorKind::ParamTypeError {
            ordinal: ordinal(position),
            func: self.name.to_string(),
            expected: expected.to_string(),
            got: got.type_name(),
        })
    }

    pub fn string_arg(&self, args: &[Object], position: usize) -> RuntimeResult<String> {
        match args.get(position) {
            Some(Object::String(s)) => Ok(s.clone()),
            Some(other) => self.param_type(position, "*String", other),
            None => self.fail(ErrorKind::arguments((position + 1).to_string(), args.len())),
        }
    }

    pub fn int_arg(&self, args: &[Object], position: usize) -> RuntimeResult<i64> {
        match args.get(position) {
            Some(value @ (Object::Integer(_) | Object::UInteger(_))) => match value.as_int() {
                Some(n) => Ok(n),
                None => self.fail(ErrorKind::InvalidArgument(value.inspect())),
            },
            Some(other) => self.param_type(position, "*Integer", other),
            None => self.fail(ErrorKind::arguments((position + 1).to_string(), args.len())),
        }
    }

    /// Call a script or native function from inside a builtin.
    pub fn call(&self, callee: &Object, args: Vec<Object>) -> RuntimeResult<Object> {
        self.interp.clone().call_value(callee, args, self.span)
    }

    /// Write to the program's output sink.
    pub fn write(&self, text: &str) -> RuntimeResult<()> {
        self.scope()
            .write_str(text)
            .map_err(|err| self.error(ErrorKind::generic(err.to_string())))
    }
}
