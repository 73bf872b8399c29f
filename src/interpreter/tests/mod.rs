//! End-to-end evaluation tests over hand-built program trees.

mod classes;
mod concurrency;
mod decimals;
mod modules;
mod resources;

use crate::ast::{Program, Stmt};
use crate::interpreter::environment::{OutputBuffer, Scope};
use crate::interpreter::executor::{Interpreter, RuntimeResult};
use crate::interpreter::value::Object;

/// Run `statements` on a fresh interpreter, returning the result and everything printed.
fn run_capture(statements: Vec<Stmt>) -> (RuntimeResult<Object>, String) {
    let buffer = OutputBuffer::new();
    let mut interp = Interpreter::new(Scope::with_buffer(&buffer));
    let result = interp.run(&Program::new(statements));
    (result, buffer.contents())
}

fn run(statements: Vec<Stmt>) -> RuntimeResult<Object> {
    run_capture(statements).0
}

fn output(statements: Vec<Stmt>) -> String {
    let (result, out) = run_capture(statements);
    if let Err(err) = result {
        panic!("program failed: {}", err);
    }
    out
}

/// Code of the error the program fails with.
fn error_code(statements: Vec<Stmt>) -> &'static str {
    match run(statements) {
        Ok(value) => panic!("expected an error, got {}", value),
        Err(err) => err.code(),
    }
}
