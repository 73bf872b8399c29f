//! Interpreter benchmarks over hand-built programs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use aeroscript::ast::build::*;
use aeroscript::ast::{AssignOp, InfixOp, Program, Stmt, Visibility};
use aeroscript::interpreter::{Interpreter, OutputBuffer, Scope};

fn run_program(statements: &[Stmt]) {
    let buffer = OutputBuffer::new();
    let mut interpreter = Interpreter::new(Scope::with_buffer(&buffer));
    interpreter.run(&Program::new(statements.to_vec())).expect("runtime error");
}

/// fn fib(n) { if n < 2 { return n } return fib(n - 1) + fib(n - 2) } fib(n)
fn fib_program(n: i64) -> Vec<Stmt> {
    let recurse = |k| call_named("fib", vec![infix(ident("n"), InfixOp::Subtract, int(k))]);
    vec![
        fn_decl(
            "fib",
            &["n"],
            vec![
                if_(infix(ident("n"), InfixOp::Less, int(2)), vec![ret(ident("n"))], None),
                ret(infix(recurse(1), InfixOp::Add, recurse(2))),
            ],
        ),
        expr_stmt(call_named("fib", vec![int(n)])),
    ]
}

/// let total = 0 for i in 0..n { total += i }
fn loop_program(n: i64) -> Vec<Stmt> {
    vec![
        let_("total", int(0)),
        for_in(
            "i",
            range(int(0), int(n)),
            vec![expr_stmt(compound(ident("total"), AssignOp::Add, ident("i")))],
        ),
    ]
}

fn collection_program(n: i64) -> Vec<Stmt> {
    vec![
        let_("items", array(vec![])),
        let_("index", hash(vec![])),
        for_in(
            "i",
            range(int(0), int(n)),
            vec![
                expr_stmt(method(ident("items"), "push", vec![ident("i")])),
                expr_stmt(assign(index(ident("index"), ident("i")), infix(ident("i"), InfixOp::Multiply, int(2)))),
            ],
        ),
        expr_stmt(method(
            method(ident("items"), "map", vec![func(&["x"], vec![ret(index(ident("index"), ident("x")))])]),
            "len",
            vec![],
        )),
    ]
}

fn class_program(n: i64) -> Vec<Stmt> {
    vec![
        ClassBuilder::new("Counter")
            .field(Visibility::Private, "count", Some(int(0)))
            .method(
                Visibility::Public,
                "tick",
                &[],
                vec![expr_stmt(compound(member(ident("self"), "count"), AssignOp::Add, int(1)))],
            )
            .build(),
        let_("c", new_instance("Counter", vec![])),
        for_in("i", range(int(0), int(n)), vec![expr_stmt(method(ident("c"), "tick", vec![]))]),
    ]
}

fn decimal_program(n: i64) -> Vec<Stmt> {
    vec![
        let_("sum", call_named("decimal", vec![int(0)])),
        for_in(
            "i",
            range(int(0), int(n)),
            vec![expr_stmt(assign(
                ident("sum"),
                method(ident("sum"), "add", vec![method(ident("decimal"), "fromString", vec![string("0.01")])]),
            ))],
        ),
        expr_stmt(method(ident("sum"), "stringFixed", vec![int(2)])),
    ]
}

fn fibonacci_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("fibonacci");
    for n in [10, 15, 20] {
        let program = fib_program(n);
        group.bench_with_input(BenchmarkId::new("recursive", n), &program, |b, program| {
            b.iter(|| run_program(black_box(program)))
        });
    }
    group.finish();
}

fn loop_benchmarks(c: &mut Criterion) {
    let program = loop_program(10_000);
    c.bench_function("loops/sum_10000", |b| b.iter(|| run_program(black_box(&program))));
}

fn collection_benchmarks(c: &mut Criterion) {
    let program = collection_program(1_000);
    c.bench_function("collections/array_hash_1000", |b| b.iter(|| run_program(black_box(&program))));
}

fn class_benchmarks(c: &mut Criterion) {
    let program = class_program(1_000);
    c.bench_function("classes/method_1000", |b| b.iter(|| run_program(black_box(&program))));
}

fn decimal_benchmarks(c: &mut Criterion) {
    let program = decimal_program(1_000);
    c.bench_function("decimal/add_1000", |b| b.iter(|| run_program(black_box(&program))));
}

criterion_group!(
    benches,
    fibonacci_benchmarks,
    loop_benchmarks,
    collection_benchmarks,
    class_benchmarks,
    decimal_benchmarks
);
criterion_main!(benches);
