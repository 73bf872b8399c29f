//! Instance and static member access, properties and indexers.

use std::sync::Arc;

use crate::error::{ErrorKind, RuntimeError};
use crate::interpreter::class::{Class, ClassIndexer, Instance};
use crate::interpreter::executor::{Binding, Interpreter, RuntimeResult};
use crate::interpreter::value::Object;
use crate::span::Span;

fn member_use(member: &str, class: &Class, span: Span) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::MemberUse {
            member: member.to_string(),
            class: class.name.clone(),
        },
        span,
    )
}

fn member_private(member: &str, class: &Class, span: Span) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::ClsMemberPrivate {
            member: member.to_string(),
            class: class.name.clone(),
        },
        span,
    )
}

fn property_use(property: &str, class: &Class, span: Span) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::PropertyUse {
            property: property.to_string(),
            class: class.name.clone(),
        },
        span,
    )
}

impl Interpreter {
    /// Read `instance.name`: a field, a property getter, or a bound method.
    pub(crate) fn instance_member(&mut self, instance: &Arc<Instance>, name: &str, span: Span) -> RuntimeResult<Object> {
        let class = &instance.class;
        let receiver = Object::Instance(Arc::clone(instance));

        if let Some((declaring, visibility)) = class.find_field(name) {
            if !self.can_access(&declaring, visibility) {
                return Err(member_private(name, &declaring, span));
            }
            return Ok(instance.get_field(name).unwrap_or(Object::Nil));
        }

        if let Some((declaring, property)) = class.find_property(name) {
            if !self.can_access(&declaring, property.visibility) {
                return Err(member_private(name, &declaring, span));
            }
            let getter = property.getter.ok_or_else(|| property_use(name, &declaring, span))?;
            let binding = Binding {
                receiver: Some(receiver),
                class: Some(declaring),
            };
            return self.call_function(&getter, Vec::new(), span, binding);
        }

        match class.find_method(name) {
            Some((declaring, method)) if !method.is_static => {
                if !self.can_access(&declaring, method.visibility) {
                    return Err(RuntimeError::new(
                        ErrorKind::ClsCallPrivate {
                            method: name.to_string(),
                            class: declaring.name.clone(),
                        },
                        span,
                    ));
                }
                Ok(self.bound_method(&receiver, name, span))
            }
            _ => Err(member_use(name, class, span)),
        }
    }

    /// Write `instance.name = value`: a declared field or a property setter.
    pub(crate) fn set_instance_member(
        &mut self,
        instance: &Arc<Instance>,
        name: &str,
        value: Object,
        span: Span,
    ) -> RuntimeResult<()> {
        let class = &instance.class;

        if let Some((declaring, visibility)) = class.find_field(name) {
            if !self.can_access(&declaring, visibility) {
                return Err(member_private(name, &declaring, span));
            }
            instance.set_field(name, value);
            return Ok(());
        }

        if let Some((declaring, property)) = class.find_property(name) {
            if !self.can_access(&declaring, property.visibility) {
                return Err(member_private(name, &declaring, span));
            }
            let setter = property.setter.ok_or_else(|| property_use(name, &declaring, span))?;
            let binding = Binding {
                receiver: Some(Object::Instance(Arc::clone(instance))),
                class: Some(declaring),
            };
            self.call_function(&setter, vec![value], span, binding)?;
            return Ok(());
        }

        Err(member_use(name, class, span))
    }

    /// Read `Class.name`: a static field or a bound static method.
    pub(crate) fn static_member(&mut self, class: &Arc<Class>, name: &str, span: Span) -> RuntimeResult<Object> {
        if let Some(holder) = class.find_static_holder(name) {
            let visibility = holder.static_visibility.get(name).copied().unwrap_or_default();
            if !self.can_access(&holder, visibility) {
                return Err(member_private(name, &holder, span));
            }
            return Ok(holder.static_fields.read().get(name).cloned().unwrap_or(Object::Nil));
        }
        match class.find_method(name) {
            Some((_, method)) if method.is_static => Ok(self.bound_method(&Object::Class(Arc::clone(class)), name, span)),
            _ => Err(member_use(name, class, span)),
        }
    }

    pub(crate) fn set_static_member(&mut self, class: &Arc<Class>, name: &str, value: Object, span: Span) -> RuntimeResult<()> {
        let holder = class
            .find_static_holder(name)
            .ok_or_else(|| member_use(name, class, span))?;
        let visibility = holder.static_visibility.get(name).copied().unwrap_or_default();
        if !self.can_access(&holder, visibility) {
            return Err(member_private(name, &holder, span));
        }
        holder.static_fields.write().insert(name.to_string(), value);
        Ok(())
    }

    /// `instance[index]` through the class indexer.
    pub(crate) fn indexer_get(&mut self, instance: &Arc<Instance>, index: Object, span: Span) -> RuntimeResult<Object> {
        let (declaring, indexer) = self.indexer_of(instance, &index, span)?;
        let getter = indexer
            .getter
            .ok_or_else(|| RuntimeError::new(ErrorKind::IndexerUse(instance.class.name.clone()), span))?;
        let binding = Binding {
            receiver: Some(Object::Instance(Arc::clone(instance))),
            class: Some(declaring),
        };
        self.call_function(&getter, vec![index], span, binding)
    }

    /// `instance[index] = value` through the class indexer.
    pub(crate) fn indexer_set(&mut self, instance: &Arc<Instance>, index: Object, value: Object, span: Span) -> RuntimeResult<()> {
        let (declaring, indexer) = self.indexer_of(instance, &index, span)?;
        let setter = indexer
            .setter
            .ok_or_else(|| RuntimeError::new(ErrorKind::IndexerUse(instance.class.name.clone()), span))?;
        let binding = Binding {
            receiver: Some(Object::Instance(Arc::clone(instance))),
            class: Some(declaring),
        };
        self.call_function(&setter, vec![index, value], span, binding)?;
        Ok(())
    }

    fn indexer_of(
        &self,
        instance: &Arc<Instance>,
        index: &Object,
        span: Span,
    ) -> RuntimeResult<(Arc<Class>, ClassIndexer)> {
        let class = &instance.class;
        let found = class
            .find_indexer()
            .ok_or_else(|| RuntimeError::new(ErrorKind::IndexNotFound(class.name.clone()), span))?;
        if !matches!(index, Object::Integer(_)) {
            return Err(RuntimeError::new(ErrorKind::IndexerType(class.name.clone()), span));
        }
        Ok(found)
    }
}
