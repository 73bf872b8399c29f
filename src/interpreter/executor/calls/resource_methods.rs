//! Method call evaluation - Error values and host resources.

use crate::error::ErrorKind;
use crate::interpreter::builtins::format::sprintf;
use crate::interpreter::builtins::{Arity, CallContext};
use crate::interpreter::executor::RuntimeResult;
use crate::interpreter::resources::ResourceError;
use crate::interpreter::value::Object;

pub(super) const ERROR_METHODS: &[&str] = &["message", "kind", "line"];
pub(super) const FILE_METHODS: &[&str] = &["read", "readLine", "write", "writeLine", "close", "name"];
pub(super) const SOCKET_METHODS: &[&str] = &["read", "readLine", "write", "accept", "close", "addr"];
pub(super) const LOGGER_METHODS: &[&str] = &["print", "println", "printf", "prefix", "setPrefix", "flags", "setFlags"];
pub(super) const CSV_READER_METHODS: &[&str] = &["read", "readAll", "close"];
pub(super) const CSV_WRITER_METHODS: &[&str] = &["write", "writeAll", "flush"];
pub(super) const PIPE_METHODS: &[&str] = &["write", "read", "readAll", "close"];

const DEFAULT_SOCKET_READ: usize = 4096;

fn io_error(ctx: &CallContext<'_>, err: ResourceError) -> crate::error::RuntimeError {
    ctx.error(ErrorKind::generic(err.to_string()))
}

fn text_line(line: Option<String>) -> Object {
    match line {
        Some(line) => Object::String(line.trim_end_matches(['\n', '\r']).to_string()),
        None => Object::Nil,
    }
}

fn record_arg(ctx: &CallContext<'_>, value: &Object, position: usize) -> RuntimeResult<Vec<String>> {
    match value {
        Object::Array(_) | Object::Tuple(_) => Ok(value
            .iter_items()
            .unwrap_or_default()
            .iter()
            .map(Object::inspect)
            .collect()),
        other => ctx.param_type(position, "*Array", other),
    }
}

fn record_object(record: Vec<String>) -> Object {
    Object::array(record.into_iter().map(Object::String).collect())
}

pub(super) fn call(ctx: &CallContext<'_>, receiver: &Object, args: Vec<Object>) -> RuntimeResult<Object> {
    match receiver {
        Object::Error(err) => {
            ctx.check_arity(Arity::Exact(0), &args)?;
            match ctx.name {
                "message" => Ok(Object::String(err.kind.to_string())),
                "kind" => Ok(Object::string(err.code())),
                "line" => Ok(Object::Integer(err.line() as i64)),
                other => ctx.fail(ErrorKind::no_method(other, "ERROR")),
            }
        }
        Object::File(file) => match ctx.name {
            "read" => {
                ctx.check_arity(Arity::Exact(0), &args)?;
                file.read_to_string().map(Object::String).map_err(|e| io_error(ctx, e))
            }
            "readLine" => {
                ctx.check_arity(Arity::Exact(0), &args)?;
                file.read_line().map(text_line).map_err(|e| io_error(ctx, e))
            }
            // write(text) / writeLine(text) - bytes written
            "write" | "writeLine" => {
                ctx.check_arity(Arity::Exact(1), &args)?;
                let mut text = args[0].inspect();
                if ctx.name == "writeLine" {
                    text.push('\n');
                }
                let written = file.write(&text).map_err(|e| io_error(ctx, e))?;
                Ok(Object::Integer(written as i64))
            }
            "close" => {
                ctx.check_arity(Arity::Exact(0), &args)?;
                file.close();
                Ok(Object::Nil)
            }
            "name" => {
                ctx.check_arity(Arity::Exact(0), &args)?;
                Ok(Object::String(file.path.clone()))
            }
            other => ctx.fail(ErrorKind::no_method(other, "FILE")),
        },
        Object::Socket(socket) => match ctx.name {
            // read(max?) - up to `max` bytes
            "read" => {
                ctx.check_arity(Arity::OneOf(&[0, 1]), &args)?;
                let max = match args.first() {
                    None => DEFAULT_SOCKET_READ,
                    Some(_) => usize::try_from(ctx.int_arg(&args, 0)?).unwrap_or(DEFAULT_SOCKET_READ),
                };
                socket.read(max).map(Object::String).map_err(|e| io_error(ctx, e))
            }
            "readLine" => {
                ctx.check_arity(Arity::Exact(0), &args)?;
                socket.read_line().map(text_line).map_err(|e| io_error(ctx, e))
            }
            "write" => {
                ctx.check_arity(Arity::Exact(1), &args)?;
                let written = socket.write(&args[0].inspect()).map_err(|e| io_error(ctx, e))?;
                Ok(Object::Integer(written as i64))
            }
            "accept" => {
                ctx.check_arity(Arity::Exact(0), &args)?;
                let conn = socket.accept().map_err(|e| io_error(ctx, e))?;
                Ok(Object::Socket(std::sync::Arc::new(conn)))
            }
            "close" => {
                ctx.check_arity(Arity::Exact(0), &args)?;
                socket.close();
                Ok(Object::Nil)
            }
            "addr" => {
                ctx.check_arity(Arity::Exact(0), &args)?;
                Ok(Object::string(socket.addr()))
            }
            other => ctx.fail(ErrorKind::no_method(other, "SOCKET")),
        },
        Object::Logger(logger) => match ctx.name {
            "print" | "println" => {
                let parts: Vec<String> = args.iter().map(Object::inspect).collect();
                let sep = if ctx.name == "println" { " " } else { "" };
                logger.output(&parts.join(sep)).map_err(|e| io_error(ctx, e))?;
                Ok(Object::Nil)
            }
            "printf" => {
                ctx.check_arity(Arity::AtLeast(1), &args)?;
                let template = ctx.string_arg(&args, 0)?;
                logger
                    .output(&sprintf(&template, &args[1..]))
                    .map_err(|e| io_error(ctx, e))?;
                Ok(Object::Nil)
            }
            "prefix" => {
                ctx.check_arity(Arity::Exact(0), &args)?;
                Ok(Object::String(logger.prefix()))
            }
            "setPrefix" => {
                ctx.check_arity(Arity::Exact(1), &args)?;
                logger.set_prefix(&ctx.string_arg(&args, 0)?);
                Ok(Object::Nil)
            }
            "flags" => {
                ctx.check_arity(Arity::Exact(0), &args)?;
                Ok(Object::Integer(logger.flags()))
            }
            "setFlags" => {
                ctx.check_arity(Arity::Exact(1), &args)?;
                logger.set_flags(ctx.int_arg(&args, 0)?);
                Ok(Object::Nil)
            }
            other => ctx.fail(ErrorKind::no_method(other, "LOGGER")),
        },
        Object::CsvReader(reader) => {
            ctx.check_arity(Arity::Exact(0), &args)?;
            match ctx.name {
                // nil at end of input
                "read" => Ok(reader
                    .read()
                    .map_err(|e| io_error(ctx, e))?
                    .map(record_object)
                    .unwrap_or(Object::Nil)),
                "readAll" => {
                    let rows = reader.read_all().map_err(|e| io_error(ctx, e))?;
                    Ok(Object::array(rows.into_iter().map(record_object).collect()))
                }
                "close" => {
                    reader.close();
                    Ok(Object::Nil)
                }
                other => ctx.fail(ErrorKind::no_method(other, "CSV_READER")),
            }
        }
        Object::CsvWriter(writer) => match ctx.name {
            "write" => {
                ctx.check_arity(Arity::Exact(1), &args)?;
                let record = record_arg(ctx, &args[0], 0)?;
                writer.write(&record).map_err(|e| io_error(ctx, e))?;
                Ok(Object::Nil)
            }
            "writeAll" => {
                ctx.check_arity(Arity::Exact(1), &args)?;
                let rows = match args[0].iter_items() {
                    Some(rows) if !matches!(args[0], Object::String(_)) => rows,
                    _ => return ctx.param_type(0, "*Array", &args[0]),
                };
                let records = rows
                    .iter()
                    .map(|row| record_arg(ctx, row, 0))
                    .collect::<RuntimeResult<Vec<_>>>()?;
                writer.write_all(&records).map_err(|e| io_error(ctx, e))?;
                Ok(Object::Nil)
            }
            "flush" => {
                ctx.check_arity(Arity::Exact(0), &args)?;
                writer.flush().map_err(|e| io_error(ctx, e))?;
                Ok(Object::Nil)
            }
            other => ctx.fail(ErrorKind::no_method(other, "CSV_WRITER")),
        },
        Object::Pipe(pipe) => match ctx.name {
            // write(text) blocks until a reader takes the chunk
            "write" => {
                ctx.check_arity(Arity::Exact(1), &args)?;
                let written = pipe.write(&args[0].inspect()).map_err(|e| io_error(ctx, e))?;
                Ok(Object::Integer(written as i64))
            }
            // nil once the writer is closed
            "read" => {
                ctx.check_arity(Arity::Exact(0), &args)?;
                Ok(pipe.read().map(Object::String).unwrap_or(Object::Nil))
            }
            "readAll" => {
                ctx.check_arity(Arity::Exact(0), &args)?;
                Ok(Object::String(pipe.read_all()))
            }
            "close" => {
                ctx.check_arity(Arity::Exact(0), &args)?;
                pipe.close();
                Ok(Object::Nil)
            }
            other => ctx.fail(ErrorKind::no_method(other, "PIPE")),
        },
        other => ctx.fail(ErrorKind::no_method(ctx.name, other.type_name())),
    }
}
