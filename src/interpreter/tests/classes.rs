use pretty_assertions::assert_eq;

use super::{error_code, run};
use crate::ast::build::*;
use crate::ast::{InfixOp, Visibility};
use crate::interpreter::value::Object;

/// class Point { let x; let y; fn init(x, y) { self.x = x; self.y = y } fn sum() { return self.x + self.y } }
fn point_class() -> crate::ast::Stmt {
    ClassBuilder::new("Point")
        .field(Visibility::Public, "x", None)
        .field(Visibility::Public, "y", Some(int(0)))
        .method(
            Visibility::Public,
            "init",
            &["x", "y"],
            vec![
                expr_stmt(assign(member(ident("self"), "x"), ident("x"))),
                expr_stmt(assign(member(ident("self"), "y"), ident("y"))),
            ],
        )
        .method(
            Visibility::Public,
            "sum",
            &[],
            vec![ret(infix(member(ident("self"), "x"), InfixOp::Add, member(ident("this"), "y")))],
        )
        .build()
}

#[test]
fn test_new_runs_init() {
    let program = vec![
        point_class(),
        let_("p", new_instance("Point", vec![int(2), int(5)])),
        expr_stmt(method(ident("p"), "sum", vec![])),
    ];
    assert_eq!(run(program), Ok(Object::Integer(7)));
}

#[test]
fn test_fields_initialise_root_to_leaf() {
    // class Base { let tag = "base" } class Child extends Base { let label = self.tag + "!" }
    let program = vec![
        ClassBuilder::new("Base").field(Visibility::Public, "tag", Some(string("base"))).build(),
        ClassBuilder::new("Child")
            .parent("Base")
            .field(
                Visibility::Public,
                "label",
                Some(infix(member(ident("self"), "tag"), InfixOp::Add, string("!"))),
            )
            .build(),
        expr_stmt(member(new_instance("Child", vec![]), "label")),
    ];
    assert_eq!(run(program), Ok(Object::string("base!")));
}

#[test]
fn test_calling_class_directly_fails() {
    let program = vec![point_class(), expr_stmt(call_named("Point", vec![int(1), int(2)]))];
    assert_eq!(error_code(program), "CLASS_CREATE_ERROR");
}

#[test]
fn test_new_on_non_class() {
    let program = vec![let_("Thing", int(1)), expr_stmt(new_instance("Thing", vec![]))];
    assert_eq!(error_code(program), "NOT_CLASS_ERROR");
    assert_eq!(error_code(vec![expr_stmt(new_instance("Ghost", vec![]))]), "CLASS_NOT_DEFINED");
}

#[test]
fn test_parent_must_be_declared() {
    let program = vec![ClassBuilder::new("Orphan").parent("Missing").build()];
    assert_eq!(error_code(program), "PARENT_NOT_DECLARED");
}

#[test]
fn test_protected_reaches_subclasses_only() {
    let program = |tail: Vec<crate::ast::Stmt>| {
        let mut stmts = vec![
            ClassBuilder::new("Vault")
                .field(Visibility::Protected, "secret", Some(int(42)))
                .method(Visibility::Private, "hidden", &[], vec![ret(int(0))])
                .build(),
            ClassBuilder::new("Heir")
                .parent("Vault")
                .method(Visibility::Public, "reveal", &[], vec![ret(member(ident("self"), "secret"))])
                .method(Visibility::Public, "peek", &[], vec![ret(method(ident("self"), "hidden", vec![]))])
                .build(),
            let_("h", new_instance("Heir", vec![])),
        ];
        stmts.extend(tail);
        stmts
    };
    assert_eq!(
        run(program(vec![expr_stmt(method(ident("h"), "reveal", vec![]))])),
        Ok(Object::Integer(42))
    );
    assert_eq!(error_code(program(vec![expr_stmt(member(ident("h"), "secret"))])), "CLS_MEMBER_PRIVATE");
    assert_eq!(error_code(program(vec![expr_stmt(method(ident("h"), "peek", vec![]))])), "CLS_CALL_PRIVATE");
}

#[test]
fn test_protected_method_callable_from_subclass_only() {
    // class Base { protected fn m() { return "m" } }
    // class Derived : Base { fn callM() { return self.m() } }
    let program = |tail: Vec<crate::ast::Stmt>| {
        let mut stmts = vec![
            ClassBuilder::new("Base")
                .method(Visibility::Protected, "m", &[], vec![ret(string("m"))])
                .build(),
            ClassBuilder::new("Derived")
                .parent("Base")
                .method(Visibility::Public, "callM", &[], vec![ret(method(ident("self"), "m", vec![]))])
                .build(),
            let_("d", new_instance("Derived", vec![])),
        ];
        stmts.extend(tail);
        stmts
    };
    assert_eq!(
        run(program(vec![expr_stmt(method(ident("d"), "callM", vec![]))])),
        Ok(Object::string("m"))
    );
    assert_eq!(error_code(program(vec![expr_stmt(method(ident("d"), "m", vec![]))])), "CLS_CALL_PRIVATE");
    assert_eq!(
        error_code(program(vec![expr_stmt(method(new_instance("Base", vec![]), "m", vec![]))])),
        "CLS_CALL_PRIVATE"
    );
}

#[test]
fn test_super_dispatches_to_parent() {
    let program = vec![
        ClassBuilder::new("Animal")
            .method(Visibility::Public, "sound", &[], vec![ret(string("..."))])
            .build(),
        ClassBuilder::new("Dog")
            .parent("Animal")
            .method(
                Visibility::Public,
                "sound",
                &[],
                vec![ret(infix(super_call("sound", vec![]), InfixOp::Add, string("woof")))],
            )
            .build(),
        expr_stmt(method(new_instance("Dog", vec![]), "sound", vec![])),
    ];
    assert_eq!(run(program), Ok(Object::string("...woof")));
}

#[test]
fn test_override_annotation_requires_parent_method() {
    let program = vec![
        ClassBuilder::new("Shape").build(),
        ClassBuilder::new("Square")
            .parent("Shape")
            .annotated_method(Visibility::Public, &["Override"], "area", &[], vec![ret(int(4))])
            .build(),
        expr_stmt(method(new_instance("Square", vec![]), "area", vec![])),
    ];
    assert_eq!(error_code(program), "OVERRIDE_ERROR");
}

#[test]
fn test_not_null_annotation() {
    let program = vec![
        ClassBuilder::new("Greeter")
            .annotated_method(Visibility::Public, &["NotNull"], "greet", &["name"], vec![ret(ident("name"))])
            .build(),
        expr_stmt(method(new_instance("Greeter", vec![]), "greet", vec![nil()])),
    ];
    assert_eq!(error_code(program), "NULLABLE_ERROR");
}

#[test]
fn test_annotation_must_be_annotation_class() {
    let program = vec![
        ClassBuilder::new("Plain").build(),
        ClassBuilder::new("User")
            .annotated_method(Visibility::Public, &["Plain"], "go", &[], vec![])
            .build(),
    ];
    assert_eq!(error_code(program), "CLASS_CATEGORY_ERROR");

    let program = vec![
        ClassBuilder::new("Plain").build(),
        ClassBuilder::new("Marker").annotation().parent("Plain").build(),
    ];
    assert_eq!(error_code(program), "PARENT_NOT_ANNOTATION");
}

#[test]
fn test_static_members() {
    let program = vec![
        ClassBuilder::new("Config")
            .static_field(Visibility::Public, "retries", Some(int(3)))
            .static_method(Visibility::Public, "twice", &["n"], vec![ret(infix(ident("n"), InfixOp::Multiply, int(2)))])
            .method(Visibility::Public, "instanceOnly", &[], vec![])
            .build(),
        expr_stmt(method(ident("Config"), "twice", vec![member(ident("Config"), "retries")])),
    ];
    assert_eq!(run(program), Ok(Object::Integer(6)));

    let program = vec![
        ClassBuilder::new("Config").method(Visibility::Public, "instanceOnly", &[], vec![]).build(),
        expr_stmt(method(ident("Config"), "instanceOnly", vec![])),
    ];
    assert_eq!(error_code(program), "CALL_NON_STATIC_ERROR");
}

#[test]
fn test_properties_and_indexers() {
    // class Bag { let items = []; property count { get { return self.items.len() } }
    //             property this[i: int] { get { return self.items[i] } set(v) { self.items[i] = v } } }
    let bag = ClassBuilder::new("Bag")
        .field(Visibility::Public, "items", Some(array(vec![int(1), int(2)])))
        .property(
            Visibility::Public,
            "count",
            Some(vec![ret(method(member(ident("self"), "items"), "len", vec![]))]),
            None,
        )
        .indexer(
            "i",
            "int",
            Some(vec![ret(index(member(ident("self"), "items"), ident("i")))]),
            Some(("v", vec![expr_stmt(assign(index(member(ident("self"), "items"), ident("i")), ident("v")))])),
            false,
        )
        .build();

    let program = vec![
        bag.clone(),
        let_("b", new_instance("Bag", vec![])),
        expr_stmt(assign(index(ident("b"), int(1)), int(9))),
        expr_stmt(infix(index(ident("b"), int(1)), InfixOp::Add, member(ident("b"), "count"))),
    ];
    assert_eq!(run(program), Ok(Object::Integer(11)));

    let program = vec![
        bag.clone(),
        expr_stmt(assign(member(new_instance("Bag", vec![]), "count"), int(1))),
    ];
    assert_eq!(error_code(program), "PROPERTY_USE_ERROR");

    let program = vec![bag, expr_stmt(index(new_instance("Bag", vec![]), string("x")))];
    assert_eq!(error_code(program), "INDEXER_TYPE_ERROR");
}

#[test]
fn test_indexer_declaration_rules() {
    let program = vec![ClassBuilder::new("Bad").indexer("k", "string", Some(vec![]), None, false).build()];
    assert_eq!(error_code(program), "INDEXER_TYPE_ERROR");
    let program = vec![ClassBuilder::new("Bad").indexer("i", "int", Some(vec![]), None, true).build()];
    assert_eq!(error_code(program), "INDEXER_STATIC_ERROR");
    let program = vec![
        ClassBuilder::new("NoIndex").build(),
        expr_stmt(index(new_instance("NoIndex", vec![]), int(0))),
    ];
    assert_eq!(error_code(program), "INDEX_NOT_FOUND_ERROR");
}
