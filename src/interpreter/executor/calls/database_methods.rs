//! Method call evaluation - database handles.
//!
//! Parameters bind positionally to `?` placeholders. Rows come back as hashes
//! keyed by column name, in select order.

use rusqlite::types::Value;

use crate::error::ErrorKind;
use crate::interpreter::builtins::{Arity, CallContext};
use crate::interpreter::database::{DatabaseError, DatabaseHandle, Row};
use crate::interpreter::executor::RuntimeResult;
use crate::interpreter::value::{HashKey, HashMapObj, Object};

pub(super) const DATABASE_METHODS: &[&str] = &["exec", "query", "queryRow", "lastInsertId", "ping", "close", "driver"];

fn db_error(ctx: &CallContext<'_>, err: DatabaseError) -> crate::error::RuntimeError {
    ctx.error(ErrorKind::DbError(err.to_string()))
}

/// Script value bound to a statement parameter.
fn bind(ctx: &CallContext<'_>, value: &Object) -> RuntimeResult<Value> {
    Ok(match value {
        Object::Nil => Value::Null,
        Object::Boolean(b) => Value::Integer(i64::from(*b)),
        Object::Integer(n) => Value::Integer(*n),
        Object::UInteger(n) => match i64::try_from(*n) {
            Ok(n) => Value::Integer(n),
            Err(_) => Value::Text(n.to_string()),
        },
        Object::Float(f) => Value::Real(*f),
        Object::Decimal(d) => Value::Text(d.to_string()),
        Object::String(s) => Value::Text(s.clone()),
        Object::Time(t) => Value::Text(t.to_rfc3339()),
        other => return ctx.fail(ErrorKind::DbScanError(other.type_name())),
    })
}

/// Column value as a script object. Blobs must hold UTF-8 text.
fn scan(ctx: &CallContext<'_>, value: Value) -> RuntimeResult<Object> {
    Ok(match value {
        Value::Null => Object::Nil,
        Value::Integer(n) => Object::Integer(n),
        Value::Real(f) => Object::Float(f),
        Value::Text(s) => Object::String(s),
        Value::Blob(bytes) => match String::from_utf8(bytes) {
            Ok(text) => Object::String(text),
            Err(_) => return ctx.fail(ErrorKind::DbScanError("BLOB".to_string())),
        },
    })
}

fn row_object(ctx: &CallContext<'_>, row: Row) -> RuntimeResult<Object> {
    let mut map = HashMapObj::with_capacity(row.len());
    for (column, value) in row {
        map.insert(HashKey::Str(column), scan(ctx, value)?);
    }
    Ok(Object::hash(map))
}

/// The statement text and its bound parameters.
fn statement(ctx: &CallContext<'_>, args: &[Object]) -> RuntimeResult<(String, Vec<Value>)> {
    ctx.check_arity(Arity::AtLeast(1), args)?;
    let sql = ctx.string_arg(args, 0)?;
    let params = args[1..].iter().map(|value| bind(ctx, value)).collect::<RuntimeResult<Vec<_>>>()?;
    Ok((sql, params))
}

pub(super) fn call(ctx: &CallContext<'_>, db: &DatabaseHandle, args: Vec<Object>) -> RuntimeResult<Object> {
    match ctx.name {
        // exec(sql, params...) - rows changed
        "exec" => {
            let (sql, params) = statement(ctx, &args)?;
            let changed = db.exec(&sql, params).map_err(|e| db_error(ctx, e))?;
            Ok(Object::Integer(changed as i64))
        }
        // query(sql, params...) - array of row hashes
        "query" => {
            let (sql, params) = statement(ctx, &args)?;
            let rows = db.query(&sql, params).map_err(|e| db_error(ctx, e))?;
            let rows = rows.into_iter().map(|row| row_object(ctx, row)).collect::<RuntimeResult<Vec<_>>>()?;
            Ok(Object::array(rows))
        }
        // queryRow(sql, params...) - first row hash, or nil
        "queryRow" => {
            let (sql, params) = statement(ctx, &args)?;
            let rows = db.query(&sql, params).map_err(|e| db_error(ctx, e))?;
            match rows.into_iter().next() {
                Some(row) => row_object(ctx, row),
                None => Ok(Object::Nil),
            }
        }
        "lastInsertId" => {
            ctx.check_arity(Arity::Exact(0), &args)?;
            db.last_insert_id().map(Object::Integer).map_err(|e| db_error(ctx, e))
        }
        "ping" => {
            ctx.check_arity(Arity::Exact(0), &args)?;
            Ok(Object::Boolean(db.ping()))
        }
        "close" => {
            ctx.check_arity(Arity::Exact(0), &args)?;
            db.close();
            Ok(Object::Nil)
        }
        "driver" => {
            ctx.check_arity(Arity::Exact(0), &args)?;
            Ok(Object::String(db.driver.clone()))
        }
        other => ctx.fail(ErrorKind::no_method(other, "DATABASE")),
    }
}
