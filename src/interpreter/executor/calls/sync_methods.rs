//! Method call evaluation - locks, condition variables, gates, wait groups and channels.
//!
//! Blocking methods block only the calling task.

use crate::error::ErrorKind;
use crate::interpreter::builtins::{Arity, CallContext};
use crate::interpreter::executor::RuntimeResult;
use crate::interpreter::sync::SyncError;
use crate::interpreter::value::Object;

pub(super) const MUTEX_METHODS: &[&str] = &["lock", "unlock", "tryLock"];
pub(super) const RWMUTEX_METHODS: &[&str] = &["lock", "unlock", "rLock", "rUnlock"];
pub(super) const COND_METHODS: &[&str] = &["wait", "signal", "broadcast"];
pub(super) const ONCE_METHODS: &[&str] = &["do"];
pub(super) const WAITGROUP_METHODS: &[&str] = &["add", "done", "wait"];
pub(super) const CHANNEL_METHODS: &[&str] = &["send", "recv", "trySend", "tryRecv", "close", "len"];

fn sync_result(ctx: &CallContext<'_>, result: Result<(), SyncError>) -> RuntimeResult<Object> {
    result
        .map(|_| Object::Nil)
        .map_err(|err| ctx.error(ErrorKind::generic(err.to_string())))
}

pub(super) fn call(ctx: &CallContext<'_>, receiver: &Object, args: Vec<Object>) -> RuntimeResult<Object> {
    match (receiver, ctx.name) {
        // Once.do(fn) is the only method taking a callback
        (Object::Once(once), "do") => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let callee = &args[0];
            if !matches!(callee, Object::Function(_) | Object::Builtin(_)) {
                return ctx.param_type(0, "*Function", callee);
            }
            match once.run(|| ctx.call(callee, Vec::new())) {
                Some(result) => result,
                None => Ok(Object::Nil),
            }
        }
        (Object::WaitGroup(group), "add") => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            let delta = ctx.int_arg(&args, 0)?;
            sync_result(ctx, group.add(delta))
        }
        (Object::Channel(channel), "send") => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            sync_result(ctx, channel.send(args[0].clone()))
        }
        (Object::Channel(channel), "trySend") => {
            ctx.check_arity(Arity::Exact(1), &args)?;
            channel
                .try_send(args[0].clone())
                .map(Object::Boolean)
                .map_err(|err| ctx.error(ErrorKind::generic(err.to_string())))
        }
        _ => {
            ctx.check_arity(Arity::Exact(0), &args)?;
            no_argument_method(ctx, receiver)
        }
    }
}

fn no_argument_method(ctx: &CallContext<'_>, receiver: &Object) -> RuntimeResult<Object> {
    match (receiver, ctx.name) {
        (Object::Mutex(mutex), "lock") => {
            mutex.lock();
            Ok(Object::Nil)
        }
        (Object::Mutex(mutex), "unlock") => sync_result(ctx, mutex.unlock()),
        (Object::Mutex(mutex), "tryLock") => Ok(Object::Boolean(mutex.try_lock())),
        (Object::RwLock(lock), "lock") => {
            lock.lock();
            Ok(Object::Nil)
        }
        (Object::RwLock(lock), "unlock") => sync_result(ctx, lock.unlock()),
        (Object::RwLock(lock), "rLock") => {
            lock.read_lock();
            Ok(Object::Nil)
        }
        (Object::RwLock(lock), "rUnlock") => sync_result(ctx, lock.read_unlock()),
        (Object::Cond(cond), "wait") => sync_result(ctx, cond.wait()),
        (Object::Cond(cond), "signal") => {
            cond.signal();
            Ok(Object::Nil)
        }
        (Object::Cond(cond), "broadcast") => {
            cond.broadcast();
            Ok(Object::Nil)
        }
        (Object::WaitGroup(group), "done") => sync_result(ctx, group.done()),
        (Object::WaitGroup(group), "wait") => {
            group.wait();
            Ok(Object::Nil)
        }
        // recv blocks until a value arrives; nil once closed and drained
        (Object::Channel(channel), "recv") => Ok(channel.recv().unwrap_or(Object::Nil)),
        (Object::Channel(channel), "tryRecv") => Ok(channel.try_recv().unwrap_or(Object::Nil)),
        (Object::Channel(channel), "close") => {
            channel.close();
            Ok(Object::Nil)
        }
        (Object::Channel(channel), "len") => Ok(Object::Integer(channel.len() as i64)),
        (other, name) => ctx.fail(ErrorKind::no_method(name, other.type_name())),
    }
}
