//! Statement nodes and declarations.

use crate::ast::expr::Expr;
use crate::span::Span;

/// A statement in the program tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Same node with its span moved to `line`.
    pub fn at(mut self, line: usize) -> Self {
        self.span = Span::at_line(line);
        self
    }
}

/// All statement variants.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Expression(Expr),

    /// let name = value
    Let { name: String, value: Option<Expr> },

    /// const name = value
    Const { name: String, value: Expr },

    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
    },

    While { condition: Expr, body: Vec<Stmt> },

    /// for value in iterable / for key, value in iterable
    ForIn {
        key: Option<String>,
        value: String,
        iterable: Expr,
        body: Vec<Stmt>,
    },

    Break,
    Continue,
    Return(Option<Expr>),
    Throw(Expr),

    Try {
        body: Vec<Stmt>,
        catch: Option<CatchClause>,
        finally: Option<Vec<Stmt>>,
    },

    /// defer call(...) / defer fn() { ... }
    Defer(Expr),

    Function(FunctionDecl),
    Class(ClassDecl),

    /// import "path" / import { a, b as c } from "path" / import * as m from "path"
    Import(ImportDecl),
}

/// What an import binds in the importing scope.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportSpecifier {
    /// Every exported name.
    All,
    /// The listed exported names.
    Named(Vec<ImportItem>),
    /// The module itself, under the given name.
    Namespace(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportItem {
    pub name: String,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub path: String,
    pub specifier: ImportSpecifier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub name: String,
    pub body: Vec<Stmt>,
}

/// Function declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Parameter>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// Function parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub default_value: Option<Expr>,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_value: None,
        }
    }

    pub fn with_default(name: impl Into<String>, value: Expr) -> Self {
        Self {
            name: name.into(),
            default_value: Some(value),
        }
    }
}

/// Visibility modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Protected,
}

/// Whether a class is an ordinary class or an annotation used to decorate methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassCategory {
    #[default]
    Normal,
    Annotation,
}

impl std::fmt::Display for ClassCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassCategory::Normal => write!(f, "class"),
            ClassCategory::Annotation => write!(f, "annotation"),
        }
    }
}

/// Class declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub parent: Option<String>,
    pub category: ClassCategory,
    pub members: Vec<ClassMember>,
    pub span: Span,
}

/// One member of a class body with its modifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMember {
    pub visibility: Visibility,
    pub is_static: bool,
    pub annotations: Vec<String>,
    pub kind: MemberKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberKind {
    /// let name = initializer
    Field {
        name: String,
        initializer: Option<Expr>,
    },
    Method(FunctionDecl),
    /// property name { get { ... } set(value) { ... } }
    Property {
        name: String,
        getter: Option<Vec<Stmt>>,
        setter: Option<Accessor>,
    },
    /// property this[param: param_type] { get { ... } set(value) { ... } }
    Indexer {
        param: String,
        param_type: String,
        getter: Option<Vec<Stmt>>,
        setter: Option<Accessor>,
    },
}

/// A setter body and the name its incoming value is bound to.
#[derive(Debug, Clone, PartialEq)]
pub struct Accessor {
    pub param: String,
    pub body: Vec<Stmt>,
}

/// A complete program.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }
}
