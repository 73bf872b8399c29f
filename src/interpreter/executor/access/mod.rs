//! Index, slice and member access.

pub mod index;
pub mod member;
