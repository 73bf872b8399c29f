//! The AeroScript evaluation engine.
//!
//! [`Interpreter`] walks a [`Program`](crate::ast::Program) against a [`Scope`] chain.
//! Values are [`Object`]s; builtins live in a process-wide registry (see [`builtins`]).

pub mod builtins;
pub mod class;
pub mod database;
pub mod environment;
pub mod executor;
pub mod listener;
pub mod module;
pub mod resources;
pub mod stack;
pub mod suggest;
pub mod sync;
pub mod value;

#[cfg(test)]
mod tests;

pub use class::{AnnotationMarker, Class, Instance};
pub use environment::{CallFrame, CallStack, OutputBuffer, Scope};
pub use executor::{Interpreter, RuntimeResult, MAX_CALL_DEPTH};
pub use listener::{EvalListener, FrameInfo};
pub use module::{MemoryLoader, ModuleLoader};
pub use value::{HashKey, Object, ObjectType};
