use pretty_assertions::assert_eq;
use tempfile::TempDir;

use super::{error_code, output, run};
use crate::ast::build::*;
use crate::ast::Expr;
use crate::interpreter::value::{HashKey, Object};

fn path_in(dir: &TempDir, name: &str) -> String {
    dir.path().join(name).to_string_lossy().into_owned()
}

#[test]
fn test_file_write_then_read() {
    let dir = TempDir::new().unwrap();
    let path = path_in(&dir, "notes.txt");
    let program = vec![
        let_("f", call_named("open", vec![string(&path), string("w")])),
        expr_stmt(method(ident("f"), "writeLine", vec![string("first")])),
        expr_stmt(method(ident("f"), "write", vec![int(2)])),
        expr_stmt(method(ident("f"), "close", vec![])),
        let_("g", call_named("open", vec![string(&path)])),
        expr_stmt(tuple(vec![
            method(ident("g"), "readLine", vec![]),
            method(ident("g"), "readLine", vec![]),
            method(ident("g"), "readLine", vec![]),
        ])),
    ];
    assert_eq!(
        run(program),
        Ok(Object::tuple(vec![Object::string("first"), Object::string("2"), Object::Nil]))
    );
}

#[test]
fn test_open_errors() {
    let dir = TempDir::new().unwrap();
    let missing = path_in(&dir, "missing.txt");
    assert_eq!(error_code(vec![expr_stmt(call_named("open", vec![string(&missing)]))]), "FILE_OPEN_ERROR");
    assert_eq!(
        error_code(vec![expr_stmt(call_named("open", vec![string(&missing), string("rw")]))]),
        "FILE_MODE_ERROR"
    );
}

#[test]
fn test_csv_round_trip_through_files() {
    let dir = TempDir::new().unwrap();
    let path = path_in(&dir, "rows.csv");
    let program = vec![
        let_("w", call_named("newCsvWriter", vec![string(&path), string(";")])),
        expr_stmt(method(
            ident("w"),
            "writeAll",
            vec![array(vec![
                array(vec![string("name"), string("qty")]),
                array(vec![string("bolt"), int(12)]),
            ])],
        )),
        let_("r", call_named("newCsvReader", vec![string(&path), string(";")])),
        let_("first", method(ident("r"), "read", vec![])),
        let_("rest", method(ident("r"), "readAll", vec![])),
        expr_stmt(call_named(
            "print",
            vec![
                method(ident("first"), "join", vec![string("|")]),
                method(index(ident("rest"), int(0)), "join", vec![string("|")]),
                method(ident("r"), "read", vec![]),
            ],
        )),
    ];
    assert_eq!(output(program), "name|qty bolt|12 nil");
}

#[test]
fn test_csv_delimiter_must_be_one_char() {
    let dir = TempDir::new().unwrap();
    let path = path_in(&dir, "rows.csv");
    let program = vec![expr_stmt(call_named("newCsvWriter", vec![string(&path), string(";;")]))];
    assert_eq!(error_code(program), "INPUT_LENGTH_ERROR");
}

#[test]
fn test_logger_writes_to_file() {
    let dir = TempDir::new().unwrap();
    let path = path_in(&dir, "app.log");
    let program = vec![
        let_("f", call_named("open", vec![string(&path), string("w+")])),
        let_("log", call_named("newLogger", vec![ident("f"), string("app: "), int(0)])),
        expr_stmt(method(ident("log"), "println", vec![string("started"), int(3)])),
        expr_stmt(method(ident("log"), "printf", vec![string("%d%%"), int(50)])),
        expr_stmt(method(ident("f"), "close", vec![])),
    ];
    run(program).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, "app: started 3\napp: 50%\n");
}

#[test]
fn test_logger_defaults_to_script_output() {
    let program = vec![
        let_("log", call_named("newLogger", vec![nil(), string("> "), int(0)])),
        expr_stmt(method(ident("log"), "print", vec![string("a"), string("b")])),
    ];
    assert_eq!(output(program), "> ab\n");
}

#[test]
fn test_time_format() {
    // mid-2000 in every time zone
    let program = vec![
        let_("t", call_named("unixTime", vec![int(963_000_000)])),
        expr_stmt(tuple(vec![
            method(ident("t"), "format", vec![string("%Y")]),
            method(ident("t"), "year", vec![]),
        ])),
    ];
    assert_eq!(
        run(program),
        Ok(Object::tuple(vec![Object::string("2000"), Object::Integer(2000)]))
    );

    let program = vec![
        let_("t", call_named("unixTime", vec![int(0)])),
        expr_stmt(method(ident("t"), "format", vec![string("%Q")])),
    ];
    assert_eq!(error_code(program), "INVALID_ARGUMENT");
}

fn jan31() -> Expr {
    // 2024-01-31 00:00:00 UTC
    call_named(
        "newDate",
        vec![int(2024), int(1), int(31), int(0), int(0), int(0), int(0), member(ident("time"), "UTC")],
    )
}

#[test]
fn test_time_calendar_methods() {
    let program = vec![
        let_("t", jan31()),
        expr_stmt(tuple(vec![
            method(method(ident("t"), "addDate", vec![int(0), int(1), int(0)]), "toStr", vec![]),
            method(ident("t"), "toISOStr", vec![]),
            method(ident("t"), "weekDay", vec![]),
            method(ident("t"), "yearDay", vec![]),
            method(ident("t"), "isoWeek", vec![]),
            method(ident("t"), "date", vec![]),
        ])),
    ];
    assert_eq!(
        run(program),
        Ok(Object::tuple(vec![
            Object::string("2024-03-02 00:00:00"),
            Object::string("2024-01-31T00:00:00.000Z"),
            Object::string("Wednesday"),
            Object::Integer(31),
            Object::array(vec![Object::Integer(2024), Object::Integer(5)]),
            Object::array(vec![Object::Integer(2024), Object::Integer(1), Object::Integer(31)]),
        ]))
    );
}

#[test]
fn test_time_arithmetic_and_rounding() {
    let ninety_minutes = 90 * 60 * 1_000_000_000;
    let hour = member(ident("time"), "HOUR");
    let program = vec![
        let_("t", jan31()),
        let_("later", method(ident("t"), "add", vec![int(ninety_minutes)])),
        expr_stmt(tuple(vec![
            method(ident("later"), "clock", vec![]),
            method(ident("later"), "sub", vec![ident("t")]),
            method(ident("later"), "after", vec![ident("t")]),
            method(method(ident("later"), "truncate", vec![hour.clone()]), "hour", vec![]),
            method(method(ident("later"), "round", vec![hour]), "hour", vec![]),
            method(ident("t"), "hour", vec![]),
        ])),
    ];
    assert_eq!(
        run(program),
        Ok(Object::tuple(vec![
            Object::array(vec![Object::Integer(1), Object::Integer(30), Object::Integer(0)]),
            Object::Integer(ninety_minutes),
            Object::Boolean(true),
            Object::Integer(1),
            Object::Integer(2),
            Object::Integer(0),
        ]))
    );
}

#[test]
fn test_time_zero_epoch_and_strftime() {
    let program = vec![
        let_("t", jan31()),
        expr_stmt(tuple(vec![
            method(ident("t"), "isZero", vec![]),
            method(method(ident("t"), "setValid", vec![]), "isZero", vec![]),
            method(ident("t"), "toEpoch", vec![]),
            method(method(ident("t"), "fromEpoch", vec![int(86_400_000)]), "toISOStr", vec![]),
            method(ident("t"), "strftime", vec![string("%d/%m/%Y")]),
            method(ident("t"), "strftime", vec![string("%Q")]),
        ])),
    ];
    assert_eq!(
        run(program),
        Ok(Object::tuple(vec![
            Object::Boolean(false),
            Object::Boolean(true),
            Object::Float(1_706_659_200_000.0),
            Object::string("1970-01-02T00:00:00.000Z"),
            Object::string("31/01/2024"),
            Object::Nil,
        ]))
    );
}

#[test]
fn test_new_date_validates_components() {
    let program = vec![expr_stmt(call_named(
        "newDate",
        vec![int(2024), string("1"), int(1), int(0), int(0), int(0), int(0)],
    ))];
    assert_eq!(error_code(program), "PARAM_TYPE_ERROR");
    let program = vec![expr_stmt(call_named(
        "newDate",
        vec![int(2024), int(1), int(1), int(0), int(0), int(0), int(0), int(9)],
    ))];
    assert_eq!(error_code(program), "INVALID_ARGUMENT");
}

#[test]
fn test_list_operations() {
    let program = vec![
        let_("l", call_named("newList", vec![])),
        expr_stmt(method(ident("l"), "pushBack", vec![int(2), int(3)])),
        expr_stmt(method(ident("l"), "pushFront", vec![int(1)])),
        expr_stmt(method(ident("l"), "insert", vec![int(-1), string("x")])),
        expr_stmt(tuple(vec![
            method(ident("l"), "toArray", vec![]),
            method(ident("l"), "popBack", vec![]),
            method(ident("l"), "popFront", vec![]),
            call_named("len", vec![ident("l")]),
            method(ident("l"), "get", vec![int(-1)]),
            call_named("type", vec![ident("l")]),
        ])),
    ];
    assert_eq!(
        run(program),
        Ok(Object::tuple(vec![
            Object::array(vec![Object::Integer(1), Object::Integer(2), Object::string("x"), Object::Integer(3)]),
            Object::Integer(3),
            Object::Integer(1),
            Object::Integer(2),
            Object::string("x"),
            Object::string("LIST"),
        ]))
    );

    let program = vec![
        let_("l", call_named("newList", vec![])),
        expr_stmt(tuple(vec![method(ident("l"), "front", vec![]), method(ident("l"), "isEmpty", vec![])])),
    ];
    assert_eq!(run(program), Ok(Object::tuple(vec![Object::Nil, Object::Boolean(true)])));
    let program = vec![expr_stmt(method(call_named("newList", vec![]), "get", vec![int(0)]))];
    assert_eq!(error_code(program), "INDEX_ERROR");
}

#[test]
fn test_sscanf_builtin() {
    let program = vec![expr_stmt(tuple(vec![
        call_named("sscanf", vec![string("7 apples at 0.5"), string("%d %s at %f")]),
        call_named("sscanf", vec![string("seven"), string("%d")]),
    ]))];
    assert_eq!(
        run(program),
        Ok(Object::tuple(vec![
            Object::array(vec![Object::Integer(7), Object::string("apples"), Object::Float(0.5)]),
            Object::Nil,
        ]))
    );
}

#[test]
fn test_database_exec_and_query() {
    let program = vec![
        let_("db", call_named("dbOpen", vec![string("sqlite3"), string(":memory:")])),
        expr_stmt(method(
            ident("db"),
            "exec",
            vec![string("CREATE TABLE parts (id INTEGER PRIMARY KEY, name TEXT, price REAL, note TEXT)")],
        )),
        let_(
            "changed",
            method(
                ident("db"),
                "exec",
                vec![string("INSERT INTO parts (name, price, note) VALUES (?, ?, ?)"), string("bolt"), float(0.25), nil()],
            ),
        ),
        let_("row", method(ident("db"), "queryRow", vec![string("SELECT name, price, note FROM parts WHERE id = ?"), int(1)])),
        expr_stmt(tuple(vec![
            ident("changed"),
            method(ident("db"), "lastInsertId", vec![]),
            ident("row"),
            method(ident("db"), "queryRow", vec![string("SELECT name FROM parts WHERE id = ?"), int(9)]),
            call_named("len", vec![method(ident("db"), "query", vec![string("SELECT * FROM parts")])]),
        ])),
    ];
    let mut row = crate::interpreter::value::HashMapObj::new();
    row.insert(HashKey::Str("name".into()), Object::string("bolt"));
    row.insert(HashKey::Str("price".into()), Object::Float(0.25));
    row.insert(HashKey::Str("note".into()), Object::Nil);
    assert_eq!(
        run(program),
        Ok(Object::tuple(vec![
            Object::Integer(1),
            Object::Integer(1),
            Object::hash(row),
            Object::Nil,
            Object::Integer(1),
        ]))
    );
}

#[test]
fn test_database_errors() {
    assert_eq!(
        error_code(vec![expr_stmt(call_named("dbOpen", vec![string("oracle"), string("x")]))]),
        "DB_ERROR"
    );
    let open = || let_("db", call_named("dbOpen", vec![string("sqlite"), string(":memory:")]));
    let program = vec![open(), expr_stmt(method(ident("db"), "query", vec![string("SELECT * FROM nowhere")]))];
    assert_eq!(error_code(program), "DB_ERROR");
    let program = vec![
        open(),
        expr_stmt(method(ident("db"), "query", vec![string("SELECT ?"), array(vec![int(1)])])),
    ];
    assert_eq!(error_code(program), "DB_SCAN_ERROR");
    let program = vec![
        open(),
        expr_stmt(method(ident("db"), "query", vec![string("SELECT x'ff' AS raw")])),
    ];
    assert_eq!(error_code(program), "DB_SCAN_ERROR");
    let program = vec![
        open(),
        expr_stmt(method(ident("db"), "close", vec![])),
        expr_stmt(tuple(vec![method(ident("db"), "ping", vec![]), method(ident("db"), "driver", vec![])])),
    ];
    assert_eq!(run(program), Ok(Object::tuple(vec![Object::Boolean(false), Object::string("sqlite")])));
}

#[test]
fn test_xml_namespace() {
    let program = vec![
        let_(
            "doc",
            method(
                ident("xml"),
                "marshal",
                vec![hash(vec![(string("sku"), string("B-1")), (string("qty"), int(3))]), string("part")],
            ),
        ),
        expr_stmt(tuple(vec![ident("doc"), method(ident("xml"), "unmarshal", vec![ident("doc")])])),
    ];
    let mut part = crate::interpreter::value::HashMapObj::new();
    part.insert(HashKey::Str("sku".into()), Object::string("B-1"));
    part.insert(HashKey::Str("qty".into()), Object::string("3"));
    let mut root = crate::interpreter::value::HashMapObj::new();
    root.insert(HashKey::Str("part".into()), Object::hash(part));
    assert_eq!(
        run(program),
        Ok(Object::tuple(vec![
            Object::string("<part><sku>B-1</sku><qty>3</qty></part>"),
            Object::hash(root),
        ]))
    );
    let program = vec![expr_stmt(method(ident("xml"), "unmarshal", vec![string("<a><b></a>")]))];
    assert_eq!(error_code(program), "XML_ERROR");
    let program = vec![expr_stmt(method(ident("xml"), "marshal", vec![call_named("newList", vec![]), string("no root")]))];
    assert_eq!(error_code(program), "XML_ERROR");
}

#[test]
fn test_udp_sockets_from_scripts() {
    let program = vec![expr_stmt(call_named("dialUDP", vec![string("tcp"), string("127.0.0.1:9")]))];
    assert_eq!(error_code(program), "INVALID_ARGUMENT");
    let program = vec![expr_stmt(call_named("dialUnix", vec![string("udp"), string("/tmp/x.sock")]))];
    assert_eq!(error_code(program), "INVALID_ARGUMENT");
    let program = vec![
        let_("s", call_named("dialUDP", vec![string("udp"), string("127.0.0.1:9")])),
        expr_stmt(call_named("type", vec![ident("s")])),
    ];
    assert_eq!(run(program), Ok(Object::string("SOCKET")));
}
