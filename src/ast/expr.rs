//! Expression nodes.

use crate::ast::stmt::{Parameter, Stmt};
use crate::span::Span;

/// An expression in the program tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Same node with its span moved to `line`.
    pub fn at(mut self, line: usize) -> Self {
        self.span = Span::at_line(line);
        self
    }
}

/// All expression variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Nil,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    /// Decimal literal kept as source text: 1.005d
    Decimal(String),
    Str(String),

    /// [a, b, c]
    Array(Vec<Expr>),
    /// (a, b, c)
    Tuple(Vec<Expr>),
    /// {k: v, ...}
    Hash(Vec<(Expr, Expr)>),

    Identifier(String),

    /// -x, !x, +x
    Prefix { op: PrefixOp, operand: Box<Expr> },

    /// a + b
    Infix {
        left: Box<Expr>,
        op: InfixOp,
        right: Box<Expr>,
    },

    /// x++, x--
    Postfix { op: PostfixOp, operand: Box<Expr> },

    /// target = value, target += value, ...
    Assign {
        target: Box<Expr>,
        op: AssignOp,
        value: Box<Expr>,
    },

    /// start..end (end exclusive)
    Range { start: Box<Expr>, end: Box<Expr> },

    /// obj[index]
    Index { object: Box<Expr>, index: Box<Expr> },

    /// obj[start:end]
    Slice {
        object: Box<Expr>,
        start: Option<Box<Expr>>,
        end: Option<Box<Expr>>,
    },

    /// obj.name
    Member { object: Box<Expr>, name: String },

    /// obj.method(args)
    MethodCall {
        object: Box<Expr>,
        method: String,
        arguments: Vec<Expr>,
    },

    /// callee(args)
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },

    /// fn(params) { body }
    Function {
        name: Option<String>,
        params: Vec<Parameter>,
        body: Vec<Stmt>,
    },

    /// new Class(args)
    New {
        class: Box<Expr>,
        arguments: Vec<Expr>,
    },

    /// super.method(args)
    Super { method: String, arguments: Vec<Expr> },

    /// spawn expr
    Spawn(Box<Expr>),

    /// cond ? a : b
    Conditional {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOp {
    Negate,
    Not,
    Plus,
}

impl std::fmt::Display for PrefixOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrefixOp::Negate => write!(f, "-"),
            PrefixOp::Not => write!(f, "!"),
            PrefixOp::Plus => write!(f, "+"),
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

impl std::fmt::Display for InfixOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InfixOp::Add => write!(f, "+"),
            InfixOp::Subtract => write!(f, "-"),
            InfixOp::Multiply => write!(f, "*"),
            InfixOp::Divide => write!(f, "/"),
            InfixOp::Modulo => write!(f, "%"),
            InfixOp::Power => write!(f, "**"),
            InfixOp::Equal => write!(f, "=="),
            InfixOp::NotEqual => write!(f, "!="),
            InfixOp::Less => write!(f, "<"),
            InfixOp::LessEqual => write!(f, "<="),
            InfixOp::Greater => write!(f, ">"),
            InfixOp::GreaterEqual => write!(f, ">="),
            InfixOp::And => write!(f, "&&"),
            InfixOp::Or => write!(f, "||"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostfixOp {
    Increment,
    Decrement,
}

impl std::fmt::Display for PostfixOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostfixOp::Increment => write!(f, "++"),
            PostfixOp::Decrement => write!(f, "--"),
        }
    }
}

/// Assignment operators. Compound forms apply the matching infix operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl AssignOp {
    pub fn infix(&self) -> Option<InfixOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some(InfixOp::Add),
            AssignOp::Subtract => Some(InfixOp::Subtract),
            AssignOp::Multiply => Some(InfixOp::Multiply),
            AssignOp::Divide => Some(InfixOp::Divide),
            AssignOp::Modulo => Some(InfixOp::Modulo),
        }
    }
}

impl std::fmt::Display for AssignOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.infix() {
            Some(op) => write!(f, "{}=", op),
            None => write!(f, "="),
        }
    }
}
