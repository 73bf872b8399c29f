use pretty_assertions::assert_eq;

use super::{error_code, output, run};
use crate::ast::build::*;
use crate::ast::InfixOp;
use crate::interpreter::value::Object;

#[test]
fn test_spawned_tasks_share_state_under_mutex() {
    // fn work() { for i in 0..10000 { m.lock(); counter = counter + 1; m.unlock() } wg.done() }
    let work = fn_decl(
        "work",
        &[],
        vec![
            for_in(
                "i",
                range(int(0), int(10_000)),
                vec![
                    expr_stmt(method(ident("m"), "lock", vec![])),
                    expr_stmt(assign(ident("counter"), infix(ident("counter"), InfixOp::Add, int(1)))),
                    expr_stmt(method(ident("m"), "unlock", vec![])),
                ],
            ),
            expr_stmt(method(ident("wg"), "done", vec![])),
        ],
    );
    let program = vec![
        let_("counter", int(0)),
        let_("m", call_named("newMutex", vec![])),
        let_("wg", call_named("newWaitGroup", vec![])),
        expr_stmt(method(ident("wg"), "add", vec![int(2)])),
        work,
        expr_stmt(spawn(call_named("work", vec![]))),
        expr_stmt(spawn(call_named("work", vec![]))),
        expr_stmt(method(ident("wg"), "wait", vec![])),
        expr_stmt(ident("counter")),
    ];
    assert_eq!(run(program), Ok(Object::Integer(20_000)));
}

#[test]
fn test_spawn_returns_nil_immediately() {
    let program = vec![
        let_("ch", call_named("chan", vec![])),
        let_("r", spawn(method(ident("ch"), "send", vec![int(5)]))),
        expr_stmt(tuple(vec![ident("r"), method(ident("ch"), "recv", vec![])])),
    ];
    assert_eq!(run(program), Ok(Object::tuple(vec![Object::Nil, Object::Integer(5)])));
}

#[test]
fn test_spawn_requires_a_call() {
    assert_eq!(error_code(vec![expr_stmt(spawn(int(1)))]), "SPAWN_ERROR");
}

#[test]
fn test_channel_iteration_until_closed() {
    // producer sends 1..3 then closes; the main task sums what it receives.
    let producer = func(
        &[],
        vec![
            for_in("i", range(int(1), int(4)), vec![expr_stmt(method(ident("ch"), "send", vec![ident("i")]))]),
            expr_stmt(method(ident("ch"), "close", vec![])),
        ],
    );
    let program = vec![
        let_("ch", call_named("chan", vec![int(1)])),
        let_("total", int(0)),
        expr_stmt(spawn(producer)),
        for_in(
            "v",
            ident("ch"),
            vec![expr_stmt(compound(ident("total"), crate::ast::AssignOp::Add, ident("v")))],
        ),
        expr_stmt(ident("total")),
    ];
    assert_eq!(run(program), Ok(Object::Integer(6)));
}

#[test]
fn test_try_recv_on_empty_channel() {
    let program = vec![
        let_("ch", call_named("chan", vec![])),
        expr_stmt(method(ident("ch"), "tryRecv", vec![])),
    ];
    assert_eq!(run(program), Ok(Object::Nil));
}

#[test]
fn test_once_runs_a_single_time() {
    let program = vec![
        let_("once", call_named("newOnce", vec![])),
        let_("f", func(&[], vec![expr_stmt(call_named("print", vec![string("x")]))])),
        expr_stmt(method(ident("once"), "do", vec![ident("f")])),
        expr_stmt(method(ident("once"), "do", vec![ident("f")])),
    ];
    assert_eq!(output(program), "x");
}

#[test]
fn test_unlocking_an_unlocked_mutex_fails() {
    let program = vec![
        let_("m", call_named("newMutex", vec![])),
        expr_stmt(method(ident("m"), "unlock", vec![])),
    ];
    assert_eq!(error_code(program), "GENERIC");
}

#[test]
fn test_channel_loop_breaks_while_channel_open() {
    // ch = chan(1); ch.send(7); for v in ch { print(v); break }
    let program = vec![
        let_("ch", call_named("chan", vec![int(1)])),
        expr_stmt(method(ident("ch"), "send", vec![int(7)])),
        for_in(
            "v",
            ident("ch"),
            vec![expr_stmt(call_named("print", vec![ident("v")])), break_()],
        ),
        expr_stmt(method(ident("ch"), "len", vec![])),
    ];
    assert_eq!(run(program), Ok(Object::Integer(0)));
}

#[test]
fn test_channel_loop_body_runs_per_item() {
    // The producer waits for an acknowledgement of each value before sending the next.
    let producer = func(
        &[],
        vec![
            for_in(
                "i",
                range(int(1), int(4)),
                vec![
                    expr_stmt(method(ident("ch"), "send", vec![ident("i")])),
                    expr_stmt(method(ident("ack"), "recv", vec![])),
                ],
            ),
            expr_stmt(method(ident("ch"), "close", vec![])),
        ],
    );
    let program = vec![
        let_("ch", call_named("chan", vec![int(1)])),
        let_("ack", call_named("chan", vec![int(1)])),
        expr_stmt(spawn(producer)),
        for_in(
            "v",
            ident("ch"),
            vec![
                expr_stmt(call_named("print", vec![ident("v")])),
                expr_stmt(method(ident("ack"), "send", vec![ident("v")])),
            ],
        ),
    ];
    assert_eq!(output(program), "123");
}

#[test]
fn test_spawned_task_defers_run_on_its_own_frames() {
    // fn worker() { defer ch.send("deferred"); ch.send("body") }
    // fn main() { defer ch.send("main deferred"); spawn worker(); return [ch.recv(), ch.recv()] }
    let program = vec![
        let_("ch", call_named("chan", vec![int(4)])),
        fn_decl(
            "worker",
            &[],
            vec![
                defer(method(ident("ch"), "send", vec![string("deferred")])),
                expr_stmt(method(ident("ch"), "send", vec![string("body")])),
            ],
        ),
        fn_decl(
            "main",
            &[],
            vec![
                defer(method(ident("ch"), "send", vec![string("main deferred")])),
                expr_stmt(spawn(call_named("worker", vec![]))),
                ret(array(vec![
                    method(ident("ch"), "recv", vec![]),
                    method(ident("ch"), "recv", vec![]),
                ])),
            ],
        ),
        let_("seen", call_named("main", vec![])),
        expr_stmt(tuple(vec![ident("seen"), method(ident("ch"), "recv", vec![])])),
    ];
    assert_eq!(
        run(program),
        Ok(Object::tuple(vec![
            Object::array(vec![Object::string("body"), Object::string("deferred")]),
            Object::string("main deferred"),
        ]))
    );
}

#[test]
fn test_pipe_hands_writes_to_a_reader() {
    let writer = func(
        &[],
        vec![
            expr_stmt(method(ident("p"), "write", vec![string("ab")])),
            expr_stmt(method(ident("p"), "write", vec![int(12)])),
            expr_stmt(method(ident("p"), "close", vec![])),
        ],
    );
    let program = vec![
        let_("p", call_named("newPipe", vec![])),
        expr_stmt(spawn(call(writer, vec![]))),
        expr_stmt(tuple(vec![method(ident("p"), "read", vec![]), method(ident("p"), "readAll", vec![])])),
    ];
    assert_eq!(
        run(program),
        Ok(Object::tuple(vec![Object::string("ab"), Object::string("12")]))
    );
}
