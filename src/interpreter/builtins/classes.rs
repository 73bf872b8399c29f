//! Class introspection builtins.

use crate::interpreter::class::Instance;
use crate::interpreter::value::Object;

use super::{Arity, Registry};

/// Whether `instance` is of class `name` or one of its subclasses.
pub fn instance_of(name: &str, instance: &Instance) -> bool {
    instance.class.chain().iter().any(|class| class.name == name)
}

/// Register is_a, instanceOf and classOf.
pub fn register_class_builtins(registry: &mut Registry) {
    for name in ["is_a", "instanceOf"] {
        registry.define(name, |ctx, args| {
            ctx.check_arity(Arity::Exact(2), &args)?;
            let instance = match &args[0] {
                Object::Instance(instance) => instance,
                _ => return Ok(Object::Boolean(false)),
            };
            match &args[1] {
                Object::String(class) => Ok(Object::Boolean(instance_of(class, instance))),
                Object::Class(class) => Ok(Object::Boolean(instance.class.is_subclass_of(class))),
                _ => ctx.generic("is_a/instanceOf expected a class or string for second argument"),
            }
        });
    }

    // classOf(x) - class name of an instance, "" for anything else
    registry.define("classOf", |ctx, args| {
        ctx.check_arity(Arity::Exact(1), &args)?;
        match &args[0] {
            Object::Instance(instance) => Ok(Object::String(instance.class.name.clone())),
            _ => Ok(Object::string("")),
        }
    });
}
