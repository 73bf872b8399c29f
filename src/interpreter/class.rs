//! Classes, instances and annotation markers.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use lazy_static::lazy_static;
use parking_lot::RwLock;

use crate::ast::{ClassCategory, Expr, Visibility};
use crate::interpreter::environment::Scope;
use crate::interpreter::value::{FieldMap, Function, Object};

/// Name of the implicit root of every ordinary class.
pub const BASE_CLASS: &str = "object";

/// Behaviour attached to the builtin annotation classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationMarker {
    /// The method must redefine an ancestor method.
    Override,
    /// No argument may be nil.
    NotNull,
    /// No string or collection argument may be empty.
    NotEmpty,
}

#[derive(Clone)]
pub struct ClassMethod {
    pub func: Arc<Function>,
    pub visibility: Visibility,
    pub is_static: bool,
    pub annotations: Vec<Arc<Class>>,
}

#[derive(Clone)]
pub struct ClassProperty {
    pub visibility: Visibility,
    pub getter: Option<Arc<Function>>,
    pub setter: Option<Arc<Function>>,
}

/// `this[i]` accessors. The getter takes the index, the setter the index and value.
#[derive(Clone)]
pub struct ClassIndexer {
    pub getter: Option<Arc<Function>>,
    pub setter: Option<Arc<Function>>,
}

#[derive(Clone)]
pub struct ClassField {
    pub name: String,
    pub visibility: Visibility,
    pub initializer: Option<Expr>,
}

pub struct Class {
    pub name: String,
    pub parent: Option<Arc<Class>>,
    pub category: ClassCategory,
    pub methods: HashMap<String, ClassMethod>,
    pub properties: HashMap<String, ClassProperty>,
    pub fields: Vec<ClassField>,
    pub static_fields: RwLock<IndexMap<String, Object>>,
    pub static_visibility: HashMap<String, Visibility>,
    pub indexer: Option<ClassIndexer>,
    /// Scope the declaration was evaluated in; field initializers run here.
    pub scope: Option<Scope>,
    pub marker: Option<AnnotationMarker>,
}

impl Class {
    fn builtin(name: &str, parent: Option<Arc<Class>>, category: ClassCategory, marker: Option<AnnotationMarker>) -> Self {
        Self {
            name: name.to_string(),
            parent,
            category,
            methods: HashMap::new(),
            properties: HashMap::new(),
            fields: Vec::new(),
            static_fields: RwLock::new(IndexMap::new()),
            static_visibility: HashMap::new(),
            indexer: None,
            scope: None,
            marker,
        }
    }

    /// This class followed by each ancestor up to the root.
    pub fn chain(self: &Arc<Self>) -> Vec<Arc<Class>> {
        let mut chain = vec![Arc::clone(self)];
        let mut current = self.parent.clone();
        while let Some(class) = current {
            current = class.parent.clone();
            chain.push(class);
        }
        chain
    }

    /// First definition of method `name` along the chain, with its declaring class.
    pub fn find_method(self: &Arc<Self>, name: &str) -> Option<(Arc<Class>, ClassMethod)> {
        self.chain()
            .into_iter()
            .find_map(|class| class.methods.get(name).cloned().map(|m| (Arc::clone(&class), m)))
    }

    /// Method `name` defined by a strict ancestor.
    pub fn find_inherited_method(&self, name: &str) -> Option<(Arc<Class>, ClassMethod)> {
        self.parent.as_ref().and_then(|parent| parent.find_method(name))
    }

    pub fn find_property(self: &Arc<Self>, name: &str) -> Option<(Arc<Class>, ClassProperty)> {
        self.chain()
            .into_iter()
            .find_map(|class| class.properties.get(name).cloned().map(|p| (Arc::clone(&class), p)))
    }

    pub fn find_indexer(self: &Arc<Self>) -> Option<(Arc<Class>, ClassIndexer)> {
        self.chain()
            .into_iter()
            .find_map(|class| class.indexer.clone().map(|ix| (Arc::clone(&class), ix)))
    }

    /// Declared instance field `name` and the class declaring it.
    pub fn find_field(self: &Arc<Self>, name: &str) -> Option<(Arc<Class>, Visibility)> {
        self.chain().into_iter().find_map(|class| {
            class
                .fields
                .iter()
                .find(|field| field.name == name)
                .map(|field| (Arc::clone(&class), field.visibility))
        })
    }

    /// Class holding static field `name`, searching up the chain.
    pub fn find_static_holder(self: &Arc<Self>, name: &str) -> Option<Arc<Class>> {
        self.chain()
            .into_iter()
            .find(|class| class.static_fields.read().contains_key(name))
    }

    pub fn is_subclass_of(&self, other: &Class) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        let mut current = self.parent.as_ref();
        while let Some(class) = current {
            if std::ptr::eq(class.as_ref(), other) {
                return true;
            }
            current = class.parent.as_ref();
        }
        false
    }

    /// Builtin behaviour inherited by an annotation class.
    pub fn annotation_marker(&self) -> Option<AnnotationMarker> {
        if self.marker.is_some() {
            return self.marker;
        }
        let mut current = self.parent.as_ref();
        while let Some(class) = current {
            if class.marker.is_some() {
                return class.marker;
            }
            current = class.parent.as_ref();
        }
        None
    }

    /// Names of every method reachable from this class.
    pub fn method_names(self: &Arc<Self>) -> Vec<String> {
        let mut names: Vec<String> = self
            .chain()
            .iter()
            .flat_map(|class| class.methods.keys().cloned().collect::<Vec<_>>())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// An object created with `new`.
pub struct Instance {
    pub class: Arc<Class>,
    pub fields: RwLock<FieldMap>,
}

impl Instance {
    pub fn new(class: Arc<Class>) -> Self {
        Self {
            class,
            fields: RwLock::new(FieldMap::new()),
        }
    }

    pub fn get_field(&self, name: &str) -> Option<Object> {
        self.fields.read().get(name).cloned()
    }

    pub fn set_field(&self, name: &str, value: Object) {
        self.fields.write().insert(name.to_string(), value);
    }
}

lazy_static! {
    /// Classes every program can see without declaring them.
    static ref BUILTIN_CLASSES: HashMap<String, Arc<Class>> = {
        let base = Arc::new(Class::builtin(BASE_CLASS, None, ClassCategory::Normal, None));
        let mut classes = HashMap::new();
        for (name, marker) in [
            ("Override", AnnotationMarker::Override),
            ("NotNull", AnnotationMarker::NotNull),
            ("NotEmpty", AnnotationMarker::NotEmpty),
        ] {
            let class = Class::builtin(name, None, ClassCategory::Annotation, Some(marker));
            classes.insert(name.to_string(), Arc::new(class));
        }
        classes.insert(BASE_CLASS.to_string(), base);
        classes
    };
}

pub fn builtin_class(name: &str) -> Option<Arc<Class>> {
    BUILTIN_CLASSES.get(name).cloned()
}

pub fn base_class() -> Option<Arc<Class>> {
    builtin_class(BASE_CLASS)
}

pub fn builtin_class_names() -> Vec<String> {
    BUILTIN_CLASSES.keys().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_annotations_carry_markers() {
        let override_class = builtin_class("Override").unwrap();
        assert_eq!(override_class.category, ClassCategory::Annotation);
        assert_eq!(override_class.annotation_marker(), Some(AnnotationMarker::Override));
        assert!(builtin_class("object").unwrap().annotation_marker().is_none());
    }

    #[test]
    fn test_subclass_walk() {
        let base = base_class().unwrap();
        let child = Arc::new(Class::builtin("Child", Some(Arc::clone(&base)), ClassCategory::Normal, None));
        assert!(child.is_subclass_of(&base));
        assert!(!base.is_subclass_of(&child));
        assert_eq!(child.chain().len(), 2);
    }
}
