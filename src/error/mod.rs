//! Runtime error taxonomy.
//!
//! Every failure a script can trigger is an [`ErrorKind`]: the variant picks the
//! message template, the fields fill it in. A [`RuntimeError`] pairs the kind with
//! the span of the node that raised it.

use crate::span::Span;
use thiserror::Error;

/// The fixed set of runtime error kinds.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    #[error("unsupported operator for prefix expression:'{op}' and type: {operand}")]
    PrefixOp { op: String, operand: String },

    #[error("unsupported operator for infix expression: {left} '{op}' {right}")]
    InfixOp {
        left: String,
        op: String,
        right: String,
    },

    #[error("unsupported operator for postfix expression:'{op}' and type: {operand}")]
    PostfixOp { op: String, operand: String },

    #[error("unsupported operator for compound assignment: {left} '{op}' {right}")]
    ModAssignOp {
        left: String,
        op: String,
        right: String,
    },

    #[error("unknown identifier: '{0}' is not defined")]
    UnknownIdent(String),

    #[error("identifier '{name}' not found. \n\nDid you mean one of: \n\n  {suggestions}\n")]
    UnknownIdentEx { name: String, suggestions: String },

    #[error("undefined method '{method}' for object {object}")]
    NoMethod { method: String, object: String },

    #[error("undefined method '{method}' for object '{object}'. \n\nDid you mean one of: \n\n  {suggestions}\n")]
    NoMethodEx {
        method: String,
        object: String,
        suggestions: String,
    },

    #[error("index error: type {0} is not indexable")]
    NoIndex(String),

    #[error("key error: type {0} is not hashable")]
    KeyError(String),

    #[error("index error: '{0}' out of range")]
    IndexError(i64),

    #[error("index error: slice '{start}:{end}' out of range")]
    SliceError { start: i64, end: i64 },

    #[error("wrong number of arguments. expected={expected}, got={got}")]
    ArgumentError { expected: String, got: usize },

    #[error("unsupported input type '{input}' for function or method: {func}")]
    InputError { input: String, func: String },

    #[error("{ordinal} argument for '{func}' should be type {expected}. got={got}")]
    ParamTypeError {
        ordinal: String,
        func: String,
        expected: String,
        got: String,
    },

    #[error("function {func} takes input with max length {max}, got={got}")]
    InputLength {
        func: String,
        max: usize,
        got: usize,
    },

    #[error("invalid argument supplied: {0}")]
    InvalidArgument(String),

    #[error("divide by zero")]
    DivideByZero,

    #[error("only string type can be thrown, got={0}")]
    ThrowError(String),

    #[error("throw object '{0}' not handled")]
    ThrowNotHandled(String),

    #[error("foreach's operating type must be iterable, got={0}")]
    NotIterable(String),

    #[error("range(..) type should be {expected} type, got='{got}'")]
    RangeType { expected: String, got: String },

    #[error("defer outside function or defer statement not a function")]
    DeferError,

    #[error("spawn must be followed by a function")]
    SpawnError,

    #[error("assertion failed")]
    AssertionError,

    #[error("'{0}' is null")]
    Nullable(String),

    #[error("json error: {0}")]
    JsonError(String),

    #[error("callback function must have {expected} arguments, got={got}")]
    FuncCallback { expected: String, got: usize },

    #[error("unknown file mode supplied: '{0}'")]
    FileMode(String),

    #[error("file open error: {0}")]
    FileOpen(String),

    #[error("'{0}' is not a class")]
    NotClass(String),

    #[error("Parent class {0} not declared")]
    ParentNotDeclared(String),

    #[error("Class {0} not defined")]
    ClassNotDefined(String),

    #[error("Variable({member}) of class({class}) is private")]
    ClsMemberPrivate { member: String, class: String },

    #[error("Method ({method}) of class({class}) is private")]
    ClsCallPrivate { method: String, class: String },

    #[error("Invalid use of Property({property}) of class({class})")]
    PropertyUse { property: String, class: String },

    #[error("Invalid use of member({member}) of class({class})")]
    MemberUse { member: String, class: String },

    #[error("Invalid use of Indexer of class({0})")]
    IndexerUse(String),

    #[error("Invalid use of Indexer of class({0}), Only interger type of Indexer is supported")]
    IndexerType(String),

    #[error("Invalid use of Indexer of class({0}), Indexer cannot declared as static")]
    IndexerStatic(String),

    #[error("Indexer not found for class({0})")]
    IndexNotFound(String),

    #[error("Non-static method '{method}' of class({class}) cannot be called through the class")]
    CallNonStatic { method: String, class: String },

    #[error("No class({class}) found for category({category})")]
    ClassCategory { class: String, category: String },

    #[error("You must use 'new' to create class('{0}')")]
    ClassCreate(String),

    #[error("Annotation class '{annotation}' must have an annotation parent, got '{parent}'")]
    ParentNotAnnotation { annotation: String, parent: String },

    #[error("Method({method}) of class({class}) must override a superclass method")]
    Override { method: String, class: String },

    #[error("Const variable '{0}' cannot be modified")]
    ConstNotAssign(String),

    #[error("Cannot refer to unexported name '{module}.{name}'")]
    NameNotExported { module: String, name: String },

    #[error("Import error: {0}")]
    ImportError(String),

    #[error("scan type not supported: {0}")]
    DbScanError(String),

    #[error("database error: {0}")]
    DbError(String),

    #[error("xml error: {0}")]
    XmlError(String),

    #[error("{0}")]
    Generic(String),
}

impl ErrorKind {
    /// Stable identifier of the kind, independent of the rendered message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::PrefixOp { .. } => "PREFIX_OP",
            Self::InfixOp { .. } => "INFIX_OP",
            Self::PostfixOp { .. } => "POSTFIX_OP",
            Self::ModAssignOp { .. } => "MOD_ASSIGN_OP",
            Self::UnknownIdent(_) => "UNKNOWN_IDENT",
            Self::UnknownIdentEx { .. } => "UNKNOWN_IDENT_EX",
            Self::NoMethod { .. } => "NO_METHOD",
            Self::NoMethodEx { .. } => "NO_METHOD_EX",
            Self::NoIndex(_) => "NO_INDEX",
            Self::KeyError(_) => "KEY_ERROR",
            Self::IndexError(_) => "INDEX_ERROR",
            Self::SliceError { .. } => "SLICE_ERROR",
            Self::ArgumentError { .. } => "ARGUMENT_ERROR",
            Self::InputError { .. } => "INPUT_ERROR",
            Self::ParamTypeError { .. } => "PARAM_TYPE_ERROR",
            Self::InputLength { .. } => "INPUT_LENGTH_ERROR",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::DivideByZero => "DIVIDE_BY_ZERO",
            Self::ThrowError(_) => "THROW_ERROR",
            Self::ThrowNotHandled(_) => "THROW_NOT_HANDLED",
            Self::NotIterable(_) => "NOT_ITERABLE",
            Self::RangeType { .. } => "RANGE_TYPE_ERROR",
            Self::DeferError => "DEFER_ERROR",
            Self::SpawnError => "SPAWN_ERROR",
            Self::AssertionError => "ASSERTION_ERROR",
            Self::Nullable(_) => "NULLABLE_ERROR",
            Self::JsonError(_) => "JSON_ERROR",
            Self::FuncCallback { .. } => "FUNC_CALLBACK_ERROR",
            Self::FileMode(_) => "FILE_MODE_ERROR",
            Self::FileOpen(_) => "FILE_OPEN_ERROR",
            Self::NotClass(_) => "NOT_CLASS_ERROR",
            Self::ParentNotDeclared(_) => "PARENT_NOT_DECLARED",
            Self::ClassNotDefined(_) => "CLASS_NOT_DEFINED",
            Self::ClsMemberPrivate { .. } => "CLS_MEMBER_PRIVATE",
            Self::ClsCallPrivate { .. } => "CLS_CALL_PRIVATE",
            Self::PropertyUse { .. } => "PROPERTY_USE_ERROR",
            Self::MemberUse { .. } => "MEMBER_USE_ERROR",
            Self::IndexerUse(_) => "INDEXER_USE_ERROR",
            Self::IndexerType(_) => "INDEXER_TYPE_ERROR",
            Self::IndexerStatic(_) => "INDEXER_STATIC_ERROR",
            Self::IndexNotFound(_) => "INDEX_NOT_FOUND_ERROR",
            Self::CallNonStatic { .. } => "CALL_NON_STATIC_ERROR",
            Self::ClassCategory { .. } => "CLASS_CATEGORY_ERROR",
            Self::ClassCreate(_) => "CLASS_CREATE_ERROR",
            Self::ParentNotAnnotation { .. } => "PARENT_NOT_ANNOTATION",
            Self::Override { .. } => "OVERRIDE_ERROR",
            Self::ConstNotAssign(_) => "CONST_NOT_ASSIGN_ERROR",
            Self::NameNotExported { .. } => "NAME_NOT_EXPORTED",
            Self::ImportError(_) => "IMPORT_ERROR",
            Self::DbScanError(_) => "DB_SCAN_ERROR",
            Self::DbError(_) => "DB_ERROR",
            Self::XmlError(_) => "XML_ERROR",
            Self::Generic(_) => "GENERIC",
        }
    }

    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic(message.into())
    }

    pub fn arguments(expected: impl Into<String>, got: usize) -> Self {
        Self::ArgumentError {
            expected: expected.into(),
            got,
        }
    }

    pub fn no_method(method: impl Into<String>, object: impl Into<String>) -> Self {
        Self::NoMethod {
            method: method.into(),
            object: object.into(),
        }
    }

    pub fn infix(left: impl Into<String>, op: impl Into<String>, right: impl Into<String>) -> Self {
        Self::InfixOp {
            left: left.into(),
            op: op.into(),
            right: right.into(),
        }
    }
}

/// A runtime error raised at a specific node.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at line {line}", line = .span.line)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub span: Span,
}

impl RuntimeError {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn generic(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::generic(message), span)
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Rendered message including the source line.
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn line(&self) -> usize {
        self.span.line
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// True when this error carries an uncaught `throw`.
    pub fn is_throw(&self) -> bool {
        matches!(self.kind, ErrorKind::ThrowNotHandled(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_argument_error_message() {
        let err = RuntimeError::new(ErrorKind::arguments("0|1", 3), Span::at_line(7));
        assert_eq!(
            err.to_string(),
            "wrong number of arguments. expected=0|1, got=3 at line 7"
        );
        assert_eq!(err.code(), "ARGUMENT_ERROR");
    }

    #[test]
    fn test_param_type_error_message() {
        let kind = ErrorKind::ParamTypeError {
            ordinal: "second".into(),
            func: "range".into(),
            expected: "INTEGER".into(),
            got: "STRING".into(),
        };
        assert_eq!(
            kind.to_string(),
            "second argument for 'range' should be type INTEGER. got=STRING"
        );
    }

    #[test]
    fn test_host_boundary_error_codes() {
        let kind = ErrorKind::NameNotExported {
            module: "geo".into(),
            name: "helper".into(),
        };
        assert_eq!(kind.to_string(), "Cannot refer to unexported name 'geo.helper'");
        assert_eq!(kind.code(), "NAME_NOT_EXPORTED");
        assert_eq!(ErrorKind::ImportError("x".into()).code(), "IMPORT_ERROR");
        assert_eq!(ErrorKind::DbScanError("ARRAY".into()).code(), "DB_SCAN_ERROR");
        assert_eq!(ErrorKind::XmlError("bad".into()).to_string(), "xml error: bad");
    }

    #[test]
    fn test_throw_detection() {
        let err = RuntimeError::new(ErrorKind::ThrowNotHandled("boom".into()), Span::at_line(1));
        assert!(err.is_throw());
        assert_eq!(err.code(), "THROW_NOT_HANDLED");
    }
}
