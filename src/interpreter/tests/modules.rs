use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::{error_code, run_capture};
use crate::ast::build::*;
use crate::ast::{InfixOp, Program, Stmt};
use crate::interpreter::environment::{OutputBuffer, Scope};
use crate::interpreter::executor::{Interpreter, RuntimeResult};
use crate::interpreter::module::MemoryLoader;
use crate::interpreter::value::Object;

/// Run `statements` with `modules` available to import.
fn run_with_modules(modules: Vec<(&str, Vec<Stmt>)>, statements: Vec<Stmt>) -> (RuntimeResult<Object>, String) {
    let loader = MemoryLoader::new();
    for (path, body) in modules {
        loader.insert(path, Program::new(body));
    }
    let buffer = OutputBuffer::new();
    let mut interp = Interpreter::new(Scope::with_buffer(&buffer)).with_loader(Arc::new(loader));
    let result = interp.run(&Program::new(statements));
    (result, buffer.contents())
}

/// fn Area(w, h) { return w * h }, fn helper() { return 0 }, let Unit = "cm"
fn geometry() -> Vec<Stmt> {
    vec![
        expr_stmt(call_named("println", vec![string("loading")])),
        fn_decl("Area", &["w", "h"], vec![ret(infix(ident("w"), InfixOp::Multiply, ident("h")))]),
        fn_decl("helper", &[], vec![ret(int(0))]),
        let_("Unit", string("cm")),
    ]
}

fn import_error_message(result: RuntimeResult<Object>) -> String {
    match result {
        Ok(value) => panic!("expected an import error, got {}", value),
        Err(err) => {
            assert_eq!(err.code(), "IMPORT_ERROR");
            err.kind.to_string()
        }
    }
}

#[test]
fn test_namespace_import_reaches_exports() {
    let program = vec![
        import_as("lib/geometry.aero", "geo"),
        expr_stmt(tuple(vec![
            method(ident("geo"), "Area", vec![int(2), int(3)]),
            member(ident("geo"), "Unit"),
            call_named("type", vec![ident("geo")]),
        ])),
    ];
    let (result, out) = run_with_modules(vec![("lib/geometry.aero", geometry())], program);
    assert_eq!(
        result,
        Ok(Object::tuple(vec![Object::Integer(6), Object::string("cm"), Object::string("MODULE")]))
    );
    assert_eq!(out, "loading\n");
}

#[test]
fn test_named_and_wildcard_imports() {
    let program = vec![
        import_names("geometry", &[("Area", Some("area")), ("Unit", None)]),
        expr_stmt(tuple(vec![call_named("area", vec![int(4), int(5)]), ident("Unit")])),
    ];
    let (result, _) = run_with_modules(vec![("geometry", geometry())], program);
    assert_eq!(result, Ok(Object::tuple(vec![Object::Integer(20), Object::string("cm")])));

    let program = vec![import_all("geometry"), expr_stmt(call_named("Area", vec![int(1), int(7)]))];
    let (result, _) = run_with_modules(vec![("geometry", geometry())], program);
    assert_eq!(result, Ok(Object::Integer(7)));

    // wildcard imports leave private names behind
    let program = vec![import_all("geometry"), expr_stmt(call_named("helper", vec![]))];
    let (result, _) = run_with_modules(vec![("geometry", geometry())], program);
    assert!(result.unwrap_err().code().starts_with("UNKNOWN_IDENT"));
}

#[test]
fn test_modules_evaluate_once() {
    let program = vec![
        import_as("geometry", "a"),
        import_as("geometry", "b"),
        expr_stmt(infix(member(ident("a"), "Unit"), InfixOp::Equal, member(ident("b"), "Unit"))),
    ];
    let (result, out) = run_with_modules(vec![("geometry", geometry())], program);
    assert_eq!(result, Ok(Object::Boolean(true)));
    assert_eq!(out, "loading\n");
}

#[test]
fn test_lowercase_names_are_private() {
    let (result, _) = run_with_modules(
        vec![("geometry", geometry())],
        vec![import_names("geometry", &[("helper", None)])],
    );
    assert_eq!(result.unwrap_err().code(), "NAME_NOT_EXPORTED");

    let (result, _) = run_with_modules(
        vec![("geometry", geometry())],
        vec![import_as("geometry", "geo"), expr_stmt(method(ident("geo"), "helper", vec![]))],
    );
    let err = result.unwrap_err();
    assert_eq!(err.code(), "NAME_NOT_EXPORTED");
    assert_eq!(err.kind.to_string(), "Cannot refer to unexported name 'geometry.helper'");
}

#[test]
fn test_import_failures() {
    // no loader configured
    assert_eq!(error_code(vec![import_all("geometry")]), "IMPORT_ERROR");
    let (result, _) = run_capture(vec![import_all("geometry")]);
    assert_eq!(import_error_message(result), "Import error: no module loader for 'geometry'");

    let (result, _) = run_with_modules(vec![], vec![import_all("missing.aero")]);
    assert_eq!(import_error_message(result), "Import error: module not found: missing.aero");

    // a module whose body fails
    let broken = vec![let_("X", infix(int(1), InfixOp::Divide, int(0)))];
    let (result, _) = run_with_modules(vec![("broken.aero", broken)], vec![import_all("broken.aero")]);
    assert!(import_error_message(result).starts_with("Import error: broken.aero: "));
}

#[test]
fn test_circular_imports_name_the_chain() {
    let modules = vec![
        ("a.aero", vec![import_all("b.aero"), let_("A", int(1))]),
        ("b.aero", vec![import_all("a.aero"), let_("B", int(2))]),
    ];
    let (result, _) = run_with_modules(modules, vec![import_all("a.aero")]);
    assert_eq!(
        import_error_message(result),
        "Import error: circular import: a.aero -> b.aero -> a.aero"
    );
}
