//! Method call evaluation.
//!
//! Instances and classes dispatch through their class chain; every other object
//! answers from its variant's builtin method table. A name outside the table is
//! NO_METHOD, with "did you mean" suggestions when close names exist.

mod array_methods;
mod database_methods;
mod decimal_methods;
mod function;
mod hash_methods;
mod list_methods;
mod number_methods;
mod resource_methods;
mod string_methods;
mod sync_methods;
mod time_methods;

use std::sync::Arc;

use crate::ast::Expr;
use crate::error::{ErrorKind, RuntimeError};
use crate::interpreter::builtins;
use crate::interpreter::executor::objects::classes::CLASS_METHODS;
use crate::interpreter::executor::{Interpreter, RuntimeResult};
use crate::interpreter::suggest;
use crate::interpreter::value::{NativeFunction, Object};
use crate::span::Span;

/// Builtin method table of a non-instance object.
fn method_table(value: &Object) -> &'static [&'static str] {
    match value {
        Object::Nil | Object::Boolean(_) | Object::Instance(_) | Object::Class(_) | Object::Module(_) => &[],
        Object::Integer(_) => number_methods::INTEGER_METHODS,
        Object::UInteger(_) => number_methods::UINTEGER_METHODS,
        Object::Float(_) => number_methods::FLOAT_METHODS,
        Object::Decimal(_) => decimal_methods::DECIMAL_METHODS,
        Object::String(_) => string_methods::STRING_METHODS,
        Object::Array(_) => array_methods::ARRAY_METHODS,
        Object::Tuple(_) => array_methods::TUPLE_METHODS,
        Object::Hash(_) => hash_methods::HASH_METHODS,
        Object::List(_) => list_methods::LIST_METHODS,
        Object::Function(_) | Object::Builtin(_) => function::FUNCTION_METHODS,
        Object::Error(_) => resource_methods::ERROR_METHODS,
        Object::Mutex(_) => sync_methods::MUTEX_METHODS,
        Object::RwLock(_) => sync_methods::RWMUTEX_METHODS,
        Object::Cond(_) => sync_methods::COND_METHODS,
        Object::Once(_) => sync_methods::ONCE_METHODS,
        Object::WaitGroup(_) => sync_methods::WAITGROUP_METHODS,
        Object::Channel(_) => sync_methods::CHANNEL_METHODS,
        Object::File(_) => resource_methods::FILE_METHODS,
        Object::Socket(_) => resource_methods::SOCKET_METHODS,
        Object::Logger(_) => resource_methods::LOGGER_METHODS,
        Object::CsvReader(_) => resource_methods::CSV_READER_METHODS,
        Object::CsvWriter(_) => resource_methods::CSV_WRITER_METHODS,
        Object::Pipe(_) => resource_methods::PIPE_METHODS,
        Object::Database(_) => database_methods::DATABASE_METHODS,
        Object::Time(_) => time_methods::TIME_METHODS,
    }
}

/// Names of the methods `value` answers to, sorted.
pub fn method_names(value: &Object) -> Vec<String> {
    let mut names: Vec<String> = match value {
        Object::Instance(instance) => instance.class.method_names(),
        Object::Class(class) => {
            let mut names: Vec<String> = class
                .chain()
                .iter()
                .flat_map(|c| {
                    c.methods
                        .iter()
                        .filter(|(_, m)| m.is_static)
                        .map(|(name, _)| name.clone())
                        .collect::<Vec<_>>()
                })
                .collect();
            names.extend(CLASS_METHODS.iter().map(|m| m.to_string()));
            names
        }
        Object::Module(module) => module.exports().into_iter().map(|(name, _)| name).collect(),
        other => method_table(other).iter().map(|m| m.to_string()).collect(),
    };
    names.sort();
    names.dedup();
    names
}

impl Interpreter {
    /// NO_METHOD for `name` on `receiver`, upgraded with suggestions when any are close.
    pub(crate) fn no_method_error(&self, receiver: &Object, name: &str, span: Span) -> RuntimeError {
        let candidates = method_names(receiver);
        let suggestions = suggest::similar(name, candidates.iter().map(String::as_str));
        let kind = if suggestions.is_empty() {
            ErrorKind::no_method(name, receiver.type_name())
        } else {
            ErrorKind::NoMethodEx {
                method: name.to_string(),
                object: receiver.type_name(),
                suggestions: suggest::render(&suggestions),
            }
        };
        RuntimeError::new(kind, span)
    }

    /// Evaluate `object.method(args)`.
    pub(crate) fn evaluate_method_call(
        &mut self,
        object: &Expr,
        method: &str,
        arguments: &[Expr],
        span: Span,
    ) -> RuntimeResult<Object> {
        if let Some(namespace) = self.namespace_of(object) {
            let callee = builtins::lookup_in(&namespace, method)
                .ok_or_else(|| RuntimeError::new(ErrorKind::no_method(method, namespace.clone()), span))?;
            let args = self.evaluate_arguments(arguments)?;
            return self.call_value(&callee, args, span);
        }
        // Error objects are valid receivers: they answer message(), kind() and line().
        let receiver = self.evaluate(object)?;
        let args = self.evaluate_arguments(arguments)?;
        self.invoke_method(&receiver, method, args, span)
    }

    /// Dispatch `name` on `receiver`.
    pub(crate) fn invoke_method(&mut self, receiver: &Object, name: &str, args: Vec<Object>, span: Span) -> RuntimeResult<Object> {
        match receiver {
            Object::Instance(instance) => return self.call_instance_method(instance, name, args, span),
            Object::Class(class) => return self.call_class_method(class, name, args, span),
            Object::Module(module) => {
                let callee = module.export(name).map_err(|kind| RuntimeError::new(kind, span))?;
                return self.call_value(&callee, args, span);
            }
            _ => {}
        }
        if !method_table(receiver).contains(&name) {
            return Err(self.no_method_error(receiver, name, span));
        }
        let ctx = self.context(span, name);
        match receiver {
            Object::Integer(_) | Object::UInteger(_) | Object::Float(_) => number_methods::call(&ctx, receiver, args),
            Object::Decimal(d) => decimal_methods::call(&ctx, d, args),
            Object::String(s) => string_methods::call(&ctx, s, args),
            Object::Array(_) | Object::Tuple(_) => array_methods::call(&ctx, receiver, args),
            Object::Hash(map) => hash_methods::call(&ctx, map, args),
            Object::List(list) => list_methods::call(&ctx, list, args),
            Object::Database(db) => database_methods::call(&ctx, db, args),
            Object::Time(time) => time_methods::call(&ctx, time, args),
            Object::Function(_) | Object::Builtin(_) => function::call(&ctx, receiver, args),
            Object::Mutex(_)
            | Object::RwLock(_)
            | Object::Cond(_)
            | Object::Once(_)
            | Object::WaitGroup(_)
            | Object::Channel(_) => sync_methods::call(&ctx, receiver, args),
            _ => resource_methods::call(&ctx, receiver, args),
        }
    }

    /// `receiver.name` packaged as a callable value.
    pub(crate) fn bound_method(&self, receiver: &Object, name: &str, span: Span) -> Object {
        let interp = self.clone();
        let receiver = receiver.clone();
        let method = name.to_string();
        let label = format!("{}.{}", receiver.type_name(), name);
        Object::Builtin(Arc::new(NativeFunction::new(label, move |_ctx, args| {
            interp.clone().invoke_method(&receiver, &method, args, span)
        })))
    }
}
