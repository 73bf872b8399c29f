//! Class declaration and instantiation evaluation (class, new, super).

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::ast::{ClassCategory, ClassDecl, Expr, ExprKind, MemberKind, Parameter, Visibility};
use crate::error::{ErrorKind, RuntimeError};
use crate::interpreter::class::{
    base_class, builtin_class, AnnotationMarker, Class, ClassField, ClassIndexer, ClassMethod, ClassProperty, Instance,
};
use crate::interpreter::environment::Scope;
use crate::interpreter::executor::{bind_receiver, Binding, Interpreter, RuntimeResult};
use crate::interpreter::value::{Function, Object};
use crate::span::Span;

/// Methods every class value answers besides its static methods.
pub const CLASS_METHODS: &[&str] = &["name", "parent", "new"];

/// Indexer parameter types accepted in declarations.
const INTEGER_TYPES: &[&str] = &["int", "integer", "Integer"];

impl Interpreter {
    /// Class named `name`: scope bindings shadow the builtin classes.
    fn resolve_class(&self, name: &str, span: Span) -> RuntimeResult<Option<Arc<Class>>> {
        match self.scope.get(name) {
            Some(Object::Class(class)) => Ok(Some(class)),
            Some(_) => Err(RuntimeError::new(ErrorKind::NotClass(name.to_string()), span)),
            None => Ok(builtin_class(name)),
        }
    }

    fn resolve_annotation(&self, name: &str, span: Span) -> RuntimeResult<Arc<Class>> {
        let class = self
            .resolve_class(name, span)?
            .ok_or_else(|| RuntimeError::new(ErrorKind::ClassNotDefined(name.to_string()), span))?;
        if class.category != ClassCategory::Annotation {
            return Err(RuntimeError::new(
                ErrorKind::ClassCategory {
                    class: name.to_string(),
                    category: ClassCategory::Annotation.to_string(),
                },
                span,
            ));
        }
        Ok(class)
    }

    fn resolve_parent(&self, decl: &ClassDecl) -> RuntimeResult<Option<Arc<Class>>> {
        let name = match &decl.parent {
            Some(name) => name,
            None if decl.category == ClassCategory::Annotation => return Ok(None),
            None => return Ok(base_class()),
        };
        let parent = self
            .resolve_class(name, decl.span)?
            .ok_or_else(|| RuntimeError::new(ErrorKind::ParentNotDeclared(name.clone()), decl.span))?;
        match (decl.category, parent.category) {
            (ClassCategory::Annotation, ClassCategory::Normal) => Err(RuntimeError::new(
                ErrorKind::ParentNotAnnotation {
                    annotation: decl.name.clone(),
                    parent: parent.name.clone(),
                },
                decl.span,
            )),
            (ClassCategory::Normal, ClassCategory::Annotation) => Err(RuntimeError::new(
                ErrorKind::ClassCategory {
                    class: parent.name.clone(),
                    category: ClassCategory::Normal.to_string(),
                },
                decl.span,
            )),
            _ => Ok(Some(parent)),
        }
    }

    /// Evaluate a class declaration and bind the class in the current scope.
    pub(crate) fn declare_class(&mut self, decl: &ClassDecl) -> RuntimeResult<()> {
        let parent = self.resolve_parent(decl)?;
        let closure = self.scope.clone();

        let mut methods = HashMap::new();
        let mut properties = HashMap::new();
        let mut fields = Vec::new();
        let mut static_inits = Vec::new();
        let mut static_visibility = HashMap::new();
        let mut indexer = None;

        for member in &decl.members {
            match &member.kind {
                MemberKind::Field { name, initializer } if member.is_static => {
                    static_visibility.insert(name.clone(), member.visibility);
                    static_inits.push((name.clone(), initializer.clone()));
                }
                MemberKind::Field { name, initializer } => fields.push(ClassField {
                    name: name.clone(),
                    visibility: member.visibility,
                    initializer: initializer.clone(),
                }),
                MemberKind::Method(func) => {
                    let annotations = member
                        .annotations
                        .iter()
                        .map(|name| self.resolve_annotation(name, member.span))
                        .collect::<RuntimeResult<Vec<_>>>()?;
                    let function = Function::new(
                        func.name.clone(),
                        func.params.clone(),
                        func.body.clone(),
                        closure.clone(),
                        func.span,
                    );
                    methods.insert(
                        func.name.clone(),
                        ClassMethod {
                            func: Arc::new(function),
                            visibility: member.visibility,
                            is_static: member.is_static,
                            annotations,
                        },
                    );
                }
                MemberKind::Property { name, getter, setter } => {
                    let getter = getter.as_ref().map(|body| {
                        Arc::new(Function::new(name.clone(), Vec::new(), body.clone(), closure.clone(), member.span))
                    });
                    let setter = setter.as_ref().map(|accessor| {
                        Arc::new(Function::new(
                            name.clone(),
                            vec![Parameter::new(accessor.param.clone())],
                            accessor.body.clone(),
                            closure.clone(),
                            member.span,
                        ))
                    });
                    properties.insert(
                        name.clone(),
                        ClassProperty {
                            visibility: member.visibility,
                            getter,
                            setter,
                        },
                    );
                }
                MemberKind::Indexer {
                    param,
                    param_type,
                    getter,
                    setter,
                } => {
                    if member.is_static {
                        return Err(RuntimeError::new(ErrorKind::IndexerStatic(decl.name.clone()), member.span));
                    }
                    if !INTEGER_TYPES.contains(&param_type.as_str()) {
                        return Err(RuntimeError::new(ErrorKind::IndexerType(decl.name.clone()), member.span));
                    }
                    let index_param = Parameter::new(param.clone());
                    let getter = getter.as_ref().map(|body| {
                        Arc::new(Function::new("this[]", vec![index_param.clone()], body.clone(), closure.clone(), member.span))
                    });
                    let setter = setter.as_ref().map(|accessor| {
                        let params = vec![index_param.clone(), Parameter::new(accessor.param.clone())];
                        Arc::new(Function::new("this[]=", params, accessor.body.clone(), closure.clone(), member.span))
                    });
                    indexer = Some(ClassIndexer { getter, setter });
                }
            }
        }

        let class = Arc::new(Class {
            name: decl.name.clone(),
            parent,
            category: decl.category,
            methods,
            properties,
            fields,
            static_fields: RwLock::new(IndexMap::new()),
            static_visibility,
            indexer,
            scope: Some(closure),
            marker: None,
        });
        tracing::debug!(class = %class.name, parent = ?class.parent.as_ref().map(|p| p.name.clone()), "declare class");

        self.scope
            .set(&decl.name, Object::Class(Arc::clone(&class)))
            .map_err(|_| RuntimeError::new(ErrorKind::ConstNotAssign(decl.name.clone()), decl.span))?;

        // Static initializers run after the class is bound so they may refer to it.
        for (name, initializer) in static_inits {
            let value = match initializer {
                Some(expr) => self.evaluate(&expr)?,
                None => Object::Nil,
            };
            class.static_fields.write().insert(name, value);
        }
        Ok(())
    }

    /// Evaluate `new Class(args)`.
    pub(crate) fn evaluate_new(&mut self, class: &Expr, arguments: &[Expr], span: Span) -> RuntimeResult<Object> {
        let value = match &class.kind {
            ExprKind::Identifier(name) => self
                .resolve_class(name, span)?
                .map(Object::Class)
                .ok_or_else(|| RuntimeError::new(ErrorKind::ClassNotDefined(name.clone()), span))?,
            _ => self.evaluate_operand(class)?,
        };
        let class = match value {
            Object::Class(class) => class,
            other => return Err(RuntimeError::new(ErrorKind::NotClass(other.inspect()), span)),
        };
        let args = self.evaluate_arguments(arguments)?;
        self.instantiate(&class, args, span)
    }

    /// Create an instance: fields root to leaf, then `init`.
    pub(crate) fn instantiate(&mut self, class: &Arc<Class>, args: Vec<Object>, span: Span) -> RuntimeResult<Object> {
        if class.category == ClassCategory::Annotation {
            return Err(RuntimeError::new(
                ErrorKind::ClassCategory {
                    class: class.name.clone(),
                    category: ClassCategory::Normal.to_string(),
                },
                span,
            ));
        }
        let instance = Arc::new(Instance::new(Arc::clone(class)));
        let receiver = Object::Instance(Arc::clone(&instance));

        for declaring in class.chain().iter().rev() {
            for field in &declaring.fields {
                let value = match &field.initializer {
                    Some(expr) => {
                        let closure = declaring.scope.clone().unwrap_or_else(|| self.scope.clone());
                        let scope = Scope::enclosed(&closure, &self.scope, Some(Arc::clone(declaring)));
                        bind_receiver(&scope, &receiver, span)?;
                        self.within(scope, |interp| interp.evaluate(expr))?
                    }
                    None => Object::Nil,
                };
                instance.set_field(&field.name, value);
            }
        }

        match class.find_method("init") {
            Some((declaring, method)) => {
                self.invoke_class_method(Some(receiver.clone()), &declaring, &method, args, span)?;
            }
            None if !args.is_empty() => {
                return Err(RuntimeError::new(ErrorKind::arguments("0", args.len()), span));
            }
            None => {}
        }
        Ok(receiver)
    }

    /// True when code running in the current class may use a member of `declaring`.
    pub(crate) fn can_access(&self, declaring: &Arc<Class>, visibility: Visibility) -> bool {
        let current = self.scope.current_class();
        match visibility {
            Visibility::Public => true,
            Visibility::Private => current.is_some_and(|c| Arc::ptr_eq(&c, declaring)),
            Visibility::Protected => current.is_some_and(|c| c.is_subclass_of(declaring)),
        }
    }

    /// Enforce annotations, then run the method body with `self` bound.
    pub(crate) fn invoke_class_method(
        &mut self,
        receiver: Option<Object>,
        declaring: &Arc<Class>,
        method: &ClassMethod,
        args: Vec<Object>,
        span: Span,
    ) -> RuntimeResult<Object> {
        let name = &method.func.name;
        for annotation in &method.annotations {
            match annotation.annotation_marker() {
                Some(AnnotationMarker::Override) if declaring.find_inherited_method(name).is_none() => {
                    return Err(RuntimeError::new(
                        ErrorKind::Override {
                            method: name.clone(),
                            class: declaring.name.clone(),
                        },
                        span,
                    ));
                }
                Some(AnnotationMarker::NotNull) => {
                    if let Some(i) = args.iter().position(Object::is_nil) {
                        let param = method.func.params.get(i).map(|p| p.name.clone()).unwrap_or_else(|| name.clone());
                        return Err(RuntimeError::new(ErrorKind::Nullable(param), span));
                    }
                }
                Some(AnnotationMarker::NotEmpty) => {
                    if let Some(i) = args.iter().position(|arg| !arg.is_nil() && arg.is_empty()) {
                        let param = method.func.params.get(i).map(|p| p.name.as_str()).unwrap_or(name.as_str());
                        return Err(RuntimeError::generic(
                            format!("argument '{}' of method '{}' must not be empty", param, name),
                            span,
                        ));
                    }
                }
                _ => {}
            }
        }
        let binding = Binding {
            receiver,
            class: Some(Arc::clone(declaring)),
        };
        self.call_function(&method.func, args, span, binding)
    }

    /// Dispatch `instance.name(args)` along the class chain.
    pub(crate) fn call_instance_method(
        &mut self,
        instance: &Arc<Instance>,
        name: &str,
        args: Vec<Object>,
        span: Span,
    ) -> RuntimeResult<Object> {
        let receiver = Object::Instance(Arc::clone(instance));
        let (declaring, method) = match instance.class.find_method(name) {
            Some(found) => found,
            None => {
                // A field holding a callable is invoked directly.
                return match instance.get_field(name) {
                    Some(callee @ (Object::Function(_) | Object::Builtin(_))) => self.call_value(&callee, args, span),
                    _ => Err(self.no_method_error(&receiver, name, span)),
                };
            }
        };
        if method.is_static {
            return Err(RuntimeError::new(
                ErrorKind::MemberUse {
                    member: name.to_string(),
                    class: declaring.name.clone(),
                },
                span,
            ));
        }
        if !self.can_access(&declaring, method.visibility) {
            return Err(RuntimeError::new(
                ErrorKind::ClsCallPrivate {
                    method: name.to_string(),
                    class: declaring.name.clone(),
                },
                span,
            ));
        }
        self.invoke_class_method(Some(receiver), &declaring, &method, args, span)
    }

    /// Dispatch `Class.name(args)`: static methods, then the builtin class methods.
    pub(crate) fn call_class_method(
        &mut self,
        class: &Arc<Class>,
        name: &str,
        args: Vec<Object>,
        span: Span,
    ) -> RuntimeResult<Object> {
        let receiver = Object::Class(Arc::clone(class));
        if let Some((declaring, method)) = class.find_method(name) {
            if !method.is_static {
                return Err(RuntimeError::new(
                    ErrorKind::CallNonStatic {
                        method: name.to_string(),
                        class: class.name.clone(),
                    },
                    span,
                ));
            }
            if !self.can_access(&declaring, method.visibility) {
                return Err(RuntimeError::new(
                    ErrorKind::ClsCallPrivate {
                        method: name.to_string(),
                        class: declaring.name.clone(),
                    },
                    span,
                ));
            }
            return self.invoke_class_method(Some(receiver), &declaring, &method, args, span);
        }

        match name {
            "new" => self.instantiate(class, args, span),
            "name" | "parent" if !args.is_empty() => {
                Err(RuntimeError::new(ErrorKind::arguments("0", args.len()), span))
            }
            "name" => Ok(Object::String(class.name.clone())),
            "parent" => Ok(class.parent.clone().map(Object::Class).unwrap_or(Object::Nil)),
            _ => Err(self.no_method_error(&receiver, name, span)),
        }
    }

    /// Evaluate `super.method(args)` from inside a method body.
    pub(crate) fn evaluate_super(&mut self, method: &str, arguments: &[Expr], span: Span) -> RuntimeResult<Object> {
        let current = self
            .scope
            .current_class()
            .ok_or_else(|| RuntimeError::generic("'super' used outside of a class method", span))?;
        let receiver = self.scope.get("self");
        let args = self.evaluate_arguments(arguments)?;

        let found = current.parent.as_ref().and_then(|parent| parent.find_method(method));
        let (declaring, class_method) = match found {
            Some(found) => found,
            // An implicit parent constructor accepts no arguments.
            None if method == "init" && args.is_empty() => return Ok(Object::Nil),
            None => {
                let parent = current.parent.as_ref().map(|p| p.name.clone()).unwrap_or_default();
                return Err(RuntimeError::new(ErrorKind::no_method(method, parent), span));
            }
        };
        if !self.can_access(&declaring, class_method.visibility) {
            return Err(RuntimeError::new(
                ErrorKind::ClsCallPrivate {
                    method: method.to_string(),
                    class: declaring.name.clone(),
                },
                span,
            ));
        }
        self.invoke_class_method(receiver, &declaring, &class_method, args, span)
    }
}
