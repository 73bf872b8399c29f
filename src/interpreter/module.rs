//! Modules brought in by `import`.
//!
//! The host supplies a [`ModuleLoader`] that turns an import path into a program
//! tree. Each module runs once, in its own root scope, and is cached by path.
//! Names starting with an uppercase letter are exported; everything else stays
//! private to the module.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::ast::Program;
use crate::error::ErrorKind;
use crate::interpreter::environment::Scope;
use crate::interpreter::value::Object;

/// Resolves import paths to programs.
pub trait ModuleLoader: Send + Sync {
    /// The program at `path`, or why it cannot be loaded.
    fn load(&self, path: &str) -> Result<Program, String>;
}

/// Loader over programs registered up front.
#[derive(Default)]
pub struct MemoryLoader {
    programs: RwLock<HashMap<String, Program>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: &str, program: Program) {
        self.programs.write().insert(path.to_string(), program);
    }
}

impl ModuleLoader for MemoryLoader {
    fn load(&self, path: &str) -> Result<Program, String> {
        self.programs
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| format!("module not found: {}", path))
    }
}

/// An evaluated module.
pub struct Module {
    pub name: String,
    pub path: String,
    scope: Scope,
}

impl Module {
    pub(crate) fn new(path: &str, scope: Scope) -> Self {
        Self {
            name: module_name(path),
            path: path.to_string(),
            scope,
        }
    }

    pub fn is_exported(name: &str) -> bool {
        name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
    }

    /// Exported binding `name`.
    pub fn export(&self, name: &str) -> Result<Object, ErrorKind> {
        if !Self::is_exported(name) {
            return Err(ErrorKind::NameNotExported {
                module: self.name.clone(),
                name: name.to_string(),
            });
        }
        self.scope
            .get(name)
            .ok_or_else(|| ErrorKind::UnknownIdent(format!("{}.{}", self.name, name)))
    }

    /// Every exported binding, sorted by name.
    pub fn exports(&self) -> Vec<(String, Object)> {
        let mut names: Vec<String> = self
            .scope
            .visible_names()
            .into_iter()
            .filter(|name| Self::is_exported(name))
            .collect();
        names.sort();
        names
            .into_iter()
            .filter_map(|name| self.scope.get(&name).map(|value| (name, value)))
            .collect()
    }
}

/// `lib/geometry.aero` -> `geometry`
fn module_name(path: &str) -> String {
    let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match file.split_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => file.to_string(),
    }
}

/// Loaded modules and the imports currently being evaluated.
pub struct ModuleRegistry {
    loader: Arc<dyn ModuleLoader>,
    loaded: Mutex<HashMap<String, Arc<Module>>>,
    resolving: Mutex<Vec<String>>,
}

impl ModuleRegistry {
    pub fn new(loader: Arc<dyn ModuleLoader>) -> Self {
        Self {
            loader,
            loaded: Mutex::new(HashMap::new()),
            resolving: Mutex::new(Vec::new()),
        }
    }

    pub fn cached(&self, path: &str) -> Option<Arc<Module>> {
        self.loaded.lock().get(path).cloned()
    }

    pub fn load(&self, path: &str) -> Result<Program, String> {
        self.loader.load(path)
    }

    /// Mark `path` as being evaluated. Fails with the import chain when `path`
    /// is already on it.
    pub fn enter(&self, path: &str) -> Result<(), Vec<String>> {
        let mut resolving = self.resolving.lock();
        if let Some(start) = resolving.iter().position(|p| p == path) {
            let mut cycle = resolving[start..].to_vec();
            cycle.push(path.to_string());
            return Err(cycle);
        }
        resolving.push(path.to_string());
        Ok(())
    }

    pub fn leave(&self, path: &str) {
        let mut resolving = self.resolving.lock();
        if let Some(pos) = resolving.iter().rposition(|p| p == path) {
            resolving.remove(pos);
        }
    }

    pub fn store(&self, module: Arc<Module>) {
        self.loaded.lock().insert(module.path.clone(), module);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::environment::OutputBuffer;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_module_names() {
        assert_eq!(module_name("lib/geometry.aero"), "geometry");
        assert_eq!(module_name("util"), "util");
        assert_eq!(module_name("a\\b\\c.tar.gz"), "c");
    }

    #[test]
    fn test_exports_follow_capitalization() {
        let buffer = OutputBuffer::new();
        let scope = Scope::with_buffer(&buffer);
        scope.set("Area", Object::Integer(1)).unwrap();
        scope.set("helper", Object::Integer(2)).unwrap();
        let module = Module::new("shapes.aero", scope);

        assert_eq!(module.export("Area"), Ok(Object::Integer(1)));
        assert_eq!(module.export("helper").unwrap_err().to_string(), "Cannot refer to unexported name 'shapes.helper'");
        assert_eq!(module.export("Missing").unwrap_err().to_string(), "unknown identifier: 'shapes.Missing' is not defined");
        assert_eq!(module.exports(), vec![("Area".to_string(), Object::Integer(1))]);
    }

    #[test]
    fn test_cycle_detection_reports_the_chain() {
        let registry = ModuleRegistry::new(Arc::new(MemoryLoader::new()));
        registry.enter("a").unwrap();
        registry.enter("b").unwrap();
        assert_eq!(registry.enter("a"), Err(vec!["a".to_string(), "b".to_string(), "a".to_string()]));
        registry.leave("b");
        registry.leave("a");
        assert!(registry.enter("a").is_ok());
        assert_eq!(registry.load("missing"), Err("module not found: missing".to_string()));
    }
}
