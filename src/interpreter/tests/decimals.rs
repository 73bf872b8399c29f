use pretty_assertions::assert_eq;

use super::{error_code, run};
use crate::ast::build::*;
use crate::ast::InfixOp;
use crate::interpreter::value::Object;

fn from_string(text: &str) -> crate::ast::Expr {
    method(ident("decimal"), "fromString", vec![string(text)])
}

#[test]
fn test_rounding_is_exact() {
    // decimal(0).add(decimal.fromString("1.005")).round(2).string()
    let sum = method(call_named("decimal", vec![int(0)]), "add", vec![from_string("1.005")]);
    let program = vec![expr_stmt(method(method(sum, "round", vec![int(2)]), "string", vec![]))];
    assert_eq!(run(program), Ok(Object::string("1.01")));
}

#[test]
fn test_arithmetic_accepts_mixed_operands() {
    let program = vec![expr_stmt(method(
        method(from_string("0.1"), "add", vec![float(0.2)]),
        "string",
        vec![],
    ))];
    assert_eq!(run(program), Ok(Object::string("0.3")));

    let program = vec![expr_stmt(method(
        method(from_string("2.5"), "mul", vec![string("4")]),
        "string",
        vec![],
    ))];
    assert_eq!(run(program), Ok(Object::string("10")));
}

#[test]
fn test_division() {
    let _guard = crate::decimal::tests::PRECISION_LOCK.lock();
    let program = vec![expr_stmt(method(
        method(call_named("decimal", vec![int(1)]), "div", vec![int(3)]),
        "string",
        vec![],
    ))];
    assert_eq!(run(program), Ok(Object::string("0.3333333333333333")));

    let program = vec![expr_stmt(method(call_named("decimal", vec![int(1)]), "div", vec![int(0)]))];
    assert_eq!(error_code(program), "DIVIDE_BY_ZERO");
}

#[test]
fn test_comparisons() {
    let program = vec![expr_stmt(tuple(vec![
        method(from_string("1.50"), "cmp", vec![from_string("1.5")]),
        method(from_string("2"), "cmp", vec![int(3)]),
        method(from_string("2"), "greaterThan", vec![float(1.5)]),
    ]))];
    assert_eq!(
        run(program),
        Ok(Object::tuple(vec![Object::Integer(0), Object::Integer(-1), Object::Boolean(true)]))
    );
}

#[test]
fn test_invalid_operand() {
    let program = vec![expr_stmt(method(from_string("1"), "add", vec![string("abc")]))];
    assert_eq!(error_code(program), "INVALID_ARGUMENT");
    assert_eq!(error_code(vec![expr_stmt(from_string("1.2.3"))]), "INVALID_ARGUMENT");
}

#[test]
fn test_namespace_aggregates() {
    let _guard = crate::decimal::tests::PRECISION_LOCK.lock();
    let program = vec![expr_stmt(method(
        method(ident("decimal"), "avg", vec![from_string("1"), from_string("2"), from_string("6")]),
        "string",
        vec![],
    ))];
    assert_eq!(run(program), Ok(Object::string("3")));

    let program = vec![expr_stmt(method(ident("decimal"), "sum", vec![int(1)]))];
    assert_eq!(error_code(program), "PARAM_TYPE_ERROR");
}

#[test]
fn test_namespace_functions_answer_on_values() {
    let program = vec![expr_stmt(method(
        method(call_named("decimal", vec![int(0)]), "fromString", vec![string("4.25")]),
        "stringFixed",
        vec![int(1)],
    ))];
    assert_eq!(run(program), Ok(Object::string("4.3")));
}

#[test]
fn test_zero_to_negative_power_fails() {
    let program = vec![expr_stmt(method(call_named("decimal", vec![int(0)]), "pow", vec![int(-1)]))];
    assert_eq!(error_code(program), "DIVIDE_BY_ZERO");

    let program = vec![expr_stmt(infix(from_string("0"), InfixOp::Power, decimal("-2")))];
    assert_eq!(error_code(program), "DIVIDE_BY_ZERO");

    let program = vec![expr_stmt(method(
        method(from_string("2"), "pow", vec![int(-2)]),
        "string",
        vec![],
    ))];
    assert_eq!(run(program), Ok(Object::string("0.25")));
}

#[test]
fn test_exponent_arguments_must_fit_i32() {
    let program = vec![expr_stmt(method(ident("decimal"), "new", vec![int(1), int(1 << 40)]))];
    assert_eq!(error_code(program), "INVALID_ARGUMENT");

    let program = vec![expr_stmt(method(
        ident("decimal"),
        "fromFloatWithExponent",
        vec![float(1.5), int(-(1 << 33))],
    ))];
    assert_eq!(error_code(program), "INVALID_ARGUMENT");

    let program = vec![expr_stmt(method(ident("decimal"), "setDivisionPrecision", vec![uint(u64::MAX)]))];
    assert_eq!(error_code(program), "INVALID_ARGUMENT");

    let program = vec![expr_stmt(method(
        method(ident("decimal"), "new", vec![int(12_345), int(-2)]),
        "string",
        vec![],
    ))];
    assert_eq!(run(program), Ok(Object::string("123.45")));
}
