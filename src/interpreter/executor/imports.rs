//! Import statement execution.

use std::sync::Arc;

use crate::ast::{ImportDecl, ImportSpecifier};
use crate::error::{ErrorKind, RuntimeError};
use crate::interpreter::module::{Module, ModuleRegistry};
use crate::interpreter::value::Object;
use crate::span::Span;

use super::{Interpreter, RuntimeResult};

fn import_error(message: String, span: Span) -> RuntimeError {
    RuntimeError::new(ErrorKind::ImportError(message), span)
}

impl Interpreter {
    pub(crate) fn execute_import(&mut self, decl: &ImportDecl, span: Span) -> RuntimeResult<()> {
        let module = self.resolve_module(&decl.path, span)?;
        match &decl.specifier {
            ImportSpecifier::Namespace(alias) => self.bind_import(alias, Object::Module(module), span),
            ImportSpecifier::All => {
                for (name, value) in module.exports() {
                    self.bind_import(&name, value, span)?;
                }
                Ok(())
            }
            ImportSpecifier::Named(items) => {
                for item in items {
                    let value = module.export(&item.name).map_err(|kind| RuntimeError::new(kind, span))?;
                    self.bind_import(item.alias.as_deref().unwrap_or(&item.name), value, span)?;
                }
                Ok(())
            }
        }
    }

    fn bind_import(&self, name: &str, value: Object, span: Span) -> RuntimeResult<()> {
        self.scope
            .set(name, value)
            .map_err(|_| RuntimeError::new(ErrorKind::ConstNotAssign(name.to_string()), span))
    }

    /// The module at `path`, evaluating it on first use.
    fn resolve_module(&mut self, path: &str, span: Span) -> RuntimeResult<Arc<Module>> {
        let modules = match &self.modules {
            Some(modules) => Arc::clone(modules),
            None => return Err(import_error(format!("no module loader for '{}'", path), span)),
        };
        if let Some(module) = modules.cached(path) {
            return Ok(module);
        }
        modules
            .enter(path)
            .map_err(|cycle| import_error(format!("circular import: {}", cycle.join(" -> ")), span))?;
        let result = self.evaluate_module(&modules, path, span);
        modules.leave(path);
        result
    }

    fn evaluate_module(&mut self, modules: &ModuleRegistry, path: &str, span: Span) -> RuntimeResult<Arc<Module>> {
        let program = modules.load(path).map_err(|message| import_error(message, span))?;
        tracing::debug!(path, statements = program.statements.len(), "evaluating module");
        let mut body = self.with_scope(self.scope.module_root());
        body.run(&program).map_err(|err| {
            if err.code() == "IMPORT_ERROR" {
                return RuntimeError::new(err.kind, span);
            }
            import_error(format!("{}: {}", path, err), span)
        })?;
        let module = Arc::new(Module::new(path, body.scope));
        modules.store(Arc::clone(&module));
        Ok(module)
    }
}
