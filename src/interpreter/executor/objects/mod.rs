//! Class declaration, instantiation and member dispatch.

pub mod classes;
mod members;
