//! Host resource constructors: files, CSV streams, loggers, sockets, pipes and
//! database handles.

use std::sync::Arc;

use crate::error::ErrorKind;
use crate::interpreter::database::DatabaseHandle;
use crate::interpreter::executor::RuntimeResult;
use crate::interpreter::resources::{
    log_flags, CsvReaderHandle, CsvWriterHandle, FileHandle, FileMode, FileSink, LogSink, PipeHandle,
    ScriptLogger, SocketHandle,
};
use crate::interpreter::value::Object;

use super::{Arity, CallContext, Registry};

fn open_file(ctx: &CallContext<'_>, args: Vec<Object>) -> RuntimeResult<Object> {
    ctx.check_arity(Arity::OneOf(&[1, 2]), &args)?;
    let path = ctx.string_arg(&args, 0)?;
    let mode = if args.len() == 2 {
        let mode = ctx.string_arg(&args, 1)?;
        FileMode::parse(&mode).ok_or_else(|| ctx.error(ErrorKind::FileMode(mode.clone())))?
    } else {
        FileMode::Read
    };
    let file = FileHandle::open(&path, mode)
        .map_err(|err| ctx.error(ErrorKind::FileOpen(format!("{}: {}", path, err))))?;
    Ok(Object::File(Arc::new(file)))
}

/// Optional one-character delimiter argument, ',' by default.
fn delimiter(ctx: &CallContext<'_>, args: &[Object], position: usize) -> RuntimeResult<u8> {
    if args.len() <= position {
        return Ok(b',');
    }
    let text = ctx.string_arg(args, position)?;
    match text.as_bytes() {
        [byte] => Ok(*byte),
        _ => ctx.fail(ErrorKind::InputLength {
            func: ctx.name.to_string(),
            max: 1,
            got: text.len(),
        }),
    }
}

/// The address argument of a `(network, address)` pair, once `network` is one of `networks`.
fn address(ctx: &CallContext<'_>, args: &[Object], networks: &[&str]) -> RuntimeResult<String> {
    ctx.check_arity(Arity::Exact(2), args)?;
    let network = ctx.string_arg(args, 0)?;
    if !networks.contains(&network.as_str()) {
        return ctx.fail(ErrorKind::InvalidArgument(network));
    }
    ctx.string_arg(args, 1)
}

fn socket(ctx: &CallContext<'_>, result: std::io::Result<SocketHandle>) -> RuntimeResult<Object> {
    result
        .map(|socket| Object::Socket(Arc::new(socket)))
        .map_err(|err| ctx.error(ErrorKind::generic(err.to_string())))
}

const TCP: &[&str] = &["tcp", "tcp4", "tcp6"];
const UDP: &[&str] = &["udp", "udp4", "udp6"];
const UNIX: &[&str] = &["unix"];

/// Register file, CSV, logger and socket constructors.
pub fn register_io_builtins(registry: &mut Registry) {
    // open(path, mode?) / newFile(path, mode?)
    registry.define("open", open_file);
    registry.define("newFile", open_file);

    // newCsvReader(path, delimiter?)
    registry.define("newCsvReader", |ctx, args| {
        ctx.check_arity(Arity::OneOf(&[1, 2]), &args)?;
        let path = ctx.string_arg(&args, 0)?;
        let delimiter = delimiter(ctx, &args, 1)?;
        let reader = CsvReaderHandle::open(&path, delimiter)
            .map_err(|err| ctx.error(ErrorKind::FileOpen(format!("{}: {}", path, err))))?;
        Ok(Object::CsvReader(Arc::new(reader)))
    });

    // newCsvWriter(file|path, delimiter?)
    registry.define("newCsvWriter", |ctx, args| {
        ctx.check_arity(Arity::OneOf(&[1, 2]), &args)?;
        let delimiter = delimiter(ctx, &args, 1)?;
        let writer = match &args[0] {
            Object::File(file) => CsvWriterHandle::from_writer(Box::new(FileSink(Arc::clone(file))), delimiter),
            Object::String(path) => CsvWriterHandle::create(path, delimiter)
                .map_err(|err| ctx.error(ErrorKind::FileOpen(format!("{}: {}", path, err))))?,
            other => return ctx.param_type(0, "*File|*String", other),
        };
        Ok(Object::CsvWriter(Arc::new(writer)))
    });

    // newLogger() or newLogger(out, prefix, flags)
    registry.define("newLogger", |ctx, args| {
        ctx.check_arity(Arity::OneOf(&[0, 3]), &args)?;
        if args.is_empty() {
            let sink = LogSink::Writer(ctx.scope().writer());
            return Ok(Object::Logger(Arc::new(ScriptLogger::new(sink, "", log_flags::STD))));
        }
        let sink = match &args[0] {
            Object::Nil => LogSink::Writer(ctx.scope().writer()),
            Object::File(file) => LogSink::File(Arc::clone(file)),
            Object::String(name) if name == "stdout" => LogSink::Writer(ctx.scope().writer()),
            Object::String(name) if name == "stderr" => LogSink::Stderr,
            other => return ctx.param_type(0, "Writable", other),
        };
        let prefix = ctx.string_arg(&args, 1)?;
        let flags = ctx.int_arg(&args, 2)?;
        Ok(Object::Logger(Arc::new(ScriptLogger::new(sink, &prefix, flags))))
    });

    // dialTCP(network, address)
    registry.define("dialTCP", |ctx, args| {
        let addr = address(ctx, &args, TCP)?;
        socket(ctx, SocketHandle::dial(&addr))
    });

    // listenTCP(network, address)
    registry.define("listenTCP", |ctx, args| {
        let addr = address(ctx, &args, TCP)?;
        socket(ctx, SocketHandle::listen(&addr))
    });

    // dialUDP(network, address) - a connected datagram socket
    registry.define("dialUDP", |ctx, args| {
        let addr = address(ctx, &args, UDP)?;
        socket(ctx, SocketHandle::dial_udp(&addr))
    });

    // dialUnix("unix", path)
    registry.define("dialUnix", |ctx, args| {
        let path = address(ctx, &args, UNIX)?;
        socket(ctx, SocketHandle::dial_unix(&path))
    });

    // listenUnix("unix", path)
    registry.define("listenUnix", |ctx, args| {
        let path = address(ctx, &args, UNIX)?;
        socket(ctx, SocketHandle::listen_unix(&path))
    });

    // newPipe() - synchronous in-memory pipe
    registry.define("newPipe", |ctx, args| {
        ctx.check_arity(Arity::Exact(0), &args)?;
        Ok(Object::Pipe(Arc::new(PipeHandle::new())))
    });

    // dbOpen(driver, dsn)
    registry.define("dbOpen", |ctx, args| {
        ctx.check_arity(Arity::Exact(2), &args)?;
        let driver = ctx.string_arg(&args, 0)?;
        let dsn = ctx.string_arg(&args, 1)?;
        let db = DatabaseHandle::open(&driver, &dsn).map_err(|err| ctx.error(ErrorKind::DbError(err.to_string())))?;
        Ok(Object::Database(Arc::new(db)))
    });
}
