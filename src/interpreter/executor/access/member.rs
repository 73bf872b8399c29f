//! Member access evaluation (obj.name, ns.name).

use crate::ast::Expr;
use crate::error::{ErrorKind, RuntimeError};
use crate::interpreter::builtins;
use crate::interpreter::executor::{Interpreter, RuntimeResult};
use crate::interpreter::value::{HashKey, Object};
use crate::span::Span;

impl Interpreter {
    /// Evaluate member access: object.name
    pub(crate) fn evaluate_member(&mut self, object: &Expr, name: &str, span: Span) -> RuntimeResult<Object> {
        if let Some(namespace) = self.namespace_of(object) {
            return builtins::lookup_in(&namespace, name).ok_or_else(|| {
                RuntimeError::new(ErrorKind::UnknownIdent(format!("{}.{}", namespace, name)), span)
            });
        }
        let receiver = self.evaluate_operand(object)?;
        self.member_value(&receiver, name, span)
    }

    pub(crate) fn member_value(&mut self, receiver: &Object, name: &str, span: Span) -> RuntimeResult<Object> {
        match receiver {
            Object::Instance(instance) => self.instance_member(instance, name, span),
            Object::Class(class) => self.static_member(class, name, span),
            Object::Hash(map) => Ok(map
                .read()
                .get(&HashKey::Str(name.to_string()))
                .cloned()
                .unwrap_or(Object::Nil)),
            Object::Module(module) => module.export(name).map_err(|kind| RuntimeError::new(kind, span)),
            other => Err(self.no_method_error(other, name, span)),
        }
    }

    pub(crate) fn set_member_value(&mut self, receiver: &Object, name: &str, value: Object, span: Span) -> RuntimeResult<()> {
        match receiver {
            Object::Instance(instance) => self.set_instance_member(instance, name, value, span),
            Object::Class(class) => self.set_static_member(class, name, value, span),
            Object::Hash(map) => {
                map.write().insert(HashKey::Str(name.to_string()), value);
                Ok(())
            }
            other => Err(RuntimeError::generic(
                format!("cannot assign member '{}' on {}", name, other.type_name()),
                span,
            )),
        }
    }
}
