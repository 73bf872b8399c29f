//! AeroScript: the evaluation engine of a dynamically typed, class-based scripting
//! language with native concurrency and arbitrary-precision decimals.
//!
//! The crate consumes an already built program tree ([`ast::Program`]) and produces
//! runtime [`Object`](interpreter::Object)s or structured [`RuntimeError`](error::RuntimeError)s.
//! Tokenizing and parsing belong to the host.
//!
//! ```ignore
//! use aeroscript::ast::build::{call, expr_stmt, ident, string};
//! use aeroscript::ast::Program;
//!
//! let program = Program::new(vec![expr_stmt(call(ident("println"), vec![string("hi")]))]);
//! std::process::exit(aeroscript::driver::run(&program));
//! ```

// Allow some clippy lints that are stylistic and not critical
#![allow(clippy::module_inception)]
#![allow(clippy::result_large_err)]
#![allow(clippy::type_complexity)]
#![allow(clippy::new_without_default)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::len_without_is_empty)]

pub mod ast;
pub mod config;
pub mod decimal;
pub mod driver;
pub mod error;
pub mod interpreter;
pub mod span;

pub use error::{ErrorKind, RuntimeError};
pub use interpreter::{Interpreter, Object};
