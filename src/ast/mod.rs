//! Program tree consumed by the evaluator.
//!
//! Nodes are produced by an external parser (or assembled directly through
//! [`build`]); every node carries a [`Span`](crate::span::Span) for diagnostics.

pub mod build;
pub mod expr;
pub mod stmt;

pub use expr::{AssignOp, Expr, ExprKind, InfixOp, PostfixOp, PrefixOp};
pub use stmt::{
    Accessor, CatchClause, ClassCategory, ClassDecl, ClassMember, FunctionDecl, ImportDecl,
    ImportItem, ImportSpecifier, MemberKind, Parameter, Program, Stmt, StmtKind, Visibility,
};
