//! Constructors for program trees.
//!
//! Parsers and embedding hosts assemble nodes with these helpers; every node gets a
//! default span that callers can move with `.at(line)`.

use crate::ast::expr::{AssignOp, Expr, ExprKind, InfixOp, PostfixOp, PrefixOp};
use crate::ast::stmt::{
    Accessor, CatchClause, ClassCategory, ClassDecl, ClassMember, FunctionDecl, ImportDecl,
    ImportItem, ImportSpecifier, MemberKind, Parameter, Stmt, StmtKind, Visibility,
};
use crate::span::Span;

fn expr(kind: ExprKind) -> Expr {
    Expr::new(kind, Span::default())
}

fn stmt(kind: StmtKind) -> Stmt {
    Stmt::new(kind, Span::default())
}

fn params(names: &[&str]) -> Vec<Parameter> {
    names.iter().map(|name| Parameter::new(*name)).collect()
}

pub fn nil() -> Expr {
    expr(ExprKind::Nil)
}

pub fn boolean(value: bool) -> Expr {
    expr(ExprKind::Bool(value))
}

pub fn int(value: i64) -> Expr {
    expr(ExprKind::Int(value))
}

pub fn uint(value: u64) -> Expr {
    expr(ExprKind::UInt(value))
}

pub fn float(value: f64) -> Expr {
    expr(ExprKind::Float(value))
}

pub fn decimal(text: &str) -> Expr {
    expr(ExprKind::Decimal(text.to_string()))
}

pub fn string(value: &str) -> Expr {
    expr(ExprKind::Str(value.to_string()))
}

pub fn array(items: Vec<Expr>) -> Expr {
    expr(ExprKind::Array(items))
}

pub fn tuple(items: Vec<Expr>) -> Expr {
    expr(ExprKind::Tuple(items))
}

pub fn hash(pairs: Vec<(Expr, Expr)>) -> Expr {
    expr(ExprKind::Hash(pairs))
}

pub fn ident(name: &str) -> Expr {
    expr(ExprKind::Identifier(name.to_string()))
}

pub fn prefix(op: PrefixOp, operand: Expr) -> Expr {
    expr(ExprKind::Prefix {
        op,
        operand: Box::new(operand),
    })
}

pub fn infix(left: Expr, op: InfixOp, right: Expr) -> Expr {
    expr(ExprKind::Infix {
        left: Box::new(left),
        op,
        right: Box::new(right),
    })
}

pub fn postfix(op: PostfixOp, operand: Expr) -> Expr {
    expr(ExprKind::Postfix {
        op,
        operand: Box::new(operand),
    })
}

pub fn assign(target: Expr, value: Expr) -> Expr {
    compound(target, AssignOp::Assign, value)
}

pub fn compound(target: Expr, op: AssignOp, value: Expr) -> Expr {
    expr(ExprKind::Assign {
        target: Box::new(target),
        op,
        value: Box::new(value),
    })
}

pub fn range(start: Expr, end: Expr) -> Expr {
    expr(ExprKind::Range {
        start: Box::new(start),
        end: Box::new(end),
    })
}

pub fn index(object: Expr, idx: Expr) -> Expr {
    expr(ExprKind::Index {
        object: Box::new(object),
        index: Box::new(idx),
    })
}

pub fn slice(object: Expr, start: Option<Expr>, end: Option<Expr>) -> Expr {
    expr(ExprKind::Slice {
        object: Box::new(object),
        start: start.map(Box::new),
        end: end.map(Box::new),
    })
}

pub fn member(object: Expr, name: &str) -> Expr {
    expr(ExprKind::Member {
        object: Box::new(object),
        name: name.to_string(),
    })
}

pub fn method(object: Expr, name: &str, arguments: Vec<Expr>) -> Expr {
    expr(ExprKind::MethodCall {
        object: Box::new(object),
        method: name.to_string(),
        arguments,
    })
}

pub fn call(callee: Expr, arguments: Vec<Expr>) -> Expr {
    expr(ExprKind::Call {
        callee: Box::new(callee),
        arguments,
    })
}

/// Call of a named function or builtin.
pub fn call_named(name: &str, arguments: Vec<Expr>) -> Expr {
    call(ident(name), arguments)
}

pub fn func(param_names: &[&str], body: Vec<Stmt>) -> Expr {
    expr(ExprKind::Function {
        name: None,
        params: params(param_names),
        body,
    })
}

pub fn new_instance(class: &str, arguments: Vec<Expr>) -> Expr {
    expr(ExprKind::New {
        class: Box::new(ident(class)),
        arguments,
    })
}

pub fn super_call(method: &str, arguments: Vec<Expr>) -> Expr {
    expr(ExprKind::Super {
        method: method.to_string(),
        arguments,
    })
}

pub fn spawn(task: Expr) -> Expr {
    expr(ExprKind::Spawn(Box::new(task)))
}

pub fn conditional(condition: Expr, then_branch: Expr, else_branch: Expr) -> Expr {
    expr(ExprKind::Conditional {
        condition: Box::new(condition),
        then_branch: Box::new(then_branch),
        else_branch: Box::new(else_branch),
    })
}

pub fn expr_stmt(e: Expr) -> Stmt {
    stmt(StmtKind::Expression(e))
}

pub fn let_(name: &str, value: Expr) -> Stmt {
    stmt(StmtKind::Let {
        name: name.to_string(),
        value: Some(value),
    })
}

pub fn const_(name: &str, value: Expr) -> Stmt {
    stmt(StmtKind::Const {
        name: name.to_string(),
        value,
    })
}

pub fn block(body: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::Block(body))
}

pub fn if_(condition: Expr, then_branch: Vec<Stmt>, else_branch: Option<Vec<Stmt>>) -> Stmt {
    stmt(StmtKind::If {
        condition,
        then_branch,
        else_branch,
    })
}

pub fn while_(condition: Expr, body: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::While { condition, body })
}

pub fn for_in(value: &str, iterable: Expr, body: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::ForIn {
        key: None,
        value: value.to_string(),
        iterable,
        body,
    })
}

pub fn for_kv(key: &str, value: &str, iterable: Expr, body: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::ForIn {
        key: Some(key.to_string()),
        value: value.to_string(),
        iterable,
        body,
    })
}

pub fn break_() -> Stmt {
    stmt(StmtKind::Break)
}

pub fn continue_() -> Stmt {
    stmt(StmtKind::Continue)
}

pub fn ret(value: Expr) -> Stmt {
    stmt(StmtKind::Return(Some(value)))
}

pub fn throw(value: Expr) -> Stmt {
    stmt(StmtKind::Throw(value))
}

pub fn try_catch(body: Vec<Stmt>, name: &str, handler: Vec<Stmt>, finally: Option<Vec<Stmt>>) -> Stmt {
    stmt(StmtKind::Try {
        body,
        catch: Some(CatchClause {
            name: name.to_string(),
            body: handler,
        }),
        finally,
    })
}

pub fn defer(call: Expr) -> Stmt {
    stmt(StmtKind::Defer(call))
}

pub fn fn_decl(name: &str, param_names: &[&str], body: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::Function(FunctionDecl {
        name: name.to_string(),
        params: params(param_names),
        body,
        span: Span::default(),
    }))
}

/// import "path"
pub fn import_all(path: &str) -> Stmt {
    stmt(StmtKind::Import(ImportDecl {
        path: path.to_string(),
        specifier: ImportSpecifier::All,
    }))
}

/// import { name, other as alias } from "path"
pub fn import_names(path: &str, names: &[(&str, Option<&str>)]) -> Stmt {
    let items = names
        .iter()
        .map(|(name, alias)| ImportItem {
            name: name.to_string(),
            alias: alias.map(str::to_string),
        })
        .collect();
    stmt(StmtKind::Import(ImportDecl {
        path: path.to_string(),
        specifier: ImportSpecifier::Named(items),
    }))
}

/// import * as alias from "path"
pub fn import_as(path: &str, alias: &str) -> Stmt {
    stmt(StmtKind::Import(ImportDecl {
        path: path.to_string(),
        specifier: ImportSpecifier::Namespace(alias.to_string()),
    }))
}

/// Incrementally assembled class declaration.
#[derive(Debug, Clone)]
pub struct ClassBuilder {
    decl: ClassDecl,
}

impl ClassBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            decl: ClassDecl {
                name: name.to_string(),
                parent: None,
                category: ClassCategory::Normal,
                members: Vec::new(),
                span: Span::default(),
            },
        }
    }

    pub fn parent(mut self, parent: &str) -> Self {
        self.decl.parent = Some(parent.to_string());
        self
    }

    pub fn annotation(mut self) -> Self {
        self.decl.category = ClassCategory::Annotation;
        self
    }

    pub fn member(mut self, member: ClassMember) -> Self {
        self.decl.members.push(member);
        self
    }

    fn push(self, visibility: Visibility, is_static: bool, annotations: &[&str], kind: MemberKind) -> Self {
        self.member(ClassMember {
            visibility,
            is_static,
            annotations: annotations.iter().map(|a| a.to_string()).collect(),
            kind,
            span: Span::default(),
        })
    }

    pub fn field(self, visibility: Visibility, name: &str, initializer: Option<Expr>) -> Self {
        let kind = MemberKind::Field {
            name: name.to_string(),
            initializer,
        };
        self.push(visibility, false, &[], kind)
    }

    pub fn static_field(self, visibility: Visibility, name: &str, initializer: Option<Expr>) -> Self {
        let kind = MemberKind::Field {
            name: name.to_string(),
            initializer,
        };
        self.push(visibility, true, &[], kind)
    }

    pub fn method(self, visibility: Visibility, name: &str, param_names: &[&str], body: Vec<Stmt>) -> Self {
        self.annotated_method(visibility, &[], name, param_names, body)
    }

    pub fn static_method(self, visibility: Visibility, name: &str, param_names: &[&str], body: Vec<Stmt>) -> Self {
        let kind = MemberKind::Method(FunctionDecl {
            name: name.to_string(),
            params: params(param_names),
            body,
            span: Span::default(),
        });
        self.push(visibility, true, &[], kind)
    }

    pub fn annotated_method(
        self,
        visibility: Visibility,
        annotations: &[&str],
        name: &str,
        param_names: &[&str],
        body: Vec<Stmt>,
    ) -> Self {
        let kind = MemberKind::Method(FunctionDecl {
            name: name.to_string(),
            params: params(param_names),
            body,
            span: Span::default(),
        });
        self.push(visibility, false, annotations, kind)
    }

    pub fn property(self, visibility: Visibility, name: &str, getter: Option<Vec<Stmt>>, setter: Option<(&str, Vec<Stmt>)>) -> Self {
        let kind = MemberKind::Property {
            name: name.to_string(),
            getter,
            setter: setter.map(|(param, body)| Accessor {
                param: param.to_string(),
                body,
            }),
        };
        self.push(visibility, false, &[], kind)
    }

    pub fn indexer(
        self,
        param: &str,
        param_type: &str,
        getter: Option<Vec<Stmt>>,
        setter: Option<(&str, Vec<Stmt>)>,
        is_static: bool,
    ) -> Self {
        let kind = MemberKind::Indexer {
            param: param.to_string(),
            param_type: param_type.to_string(),
            getter,
            setter: setter.map(|(p, body)| Accessor {
                param: p.to_string(),
                body,
            }),
        };
        self.push(Visibility::Public, is_static, &[], kind)
    }

    pub fn build(self) -> Stmt {
        stmt(StmtKind::Class(self.decl))
    }
}
