//! Constructors for the concurrency primitives.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::interpreter::sync::{
    CondLock, ScriptChannel, ScriptCond, ScriptMutex, ScriptOnce, ScriptRwLock, ScriptWaitGroup,
};
use crate::interpreter::value::Object;

use super::{Arity, Registry};

/// Register chan, the lock constructors and sleep.
pub fn register_sync_builtins(registry: &mut Registry) {
    // chan() unbounded, chan(n) bounded to n pending values
    registry.define("chan", |ctx, args| {
        ctx.check_arity(Arity::OneOf(&[0, 1]), &args)?;
        if args.is_empty() {
            return Ok(Object::Channel(Arc::new(ScriptChannel::unbounded())));
        }
        let capacity = match &args[0] {
            Object::Integer(n) if *n >= 0 => *n as usize,
            Object::UInteger(n) => *n as usize,
            other => return ctx.param_type(0, "*Integer|*UInteger", other),
        };
        Ok(Object::Channel(Arc::new(ScriptChannel::bounded(capacity))))
    });

    registry.define("newMutex", |ctx, args| {
        ctx.check_arity(Arity::Exact(0), &args)?;
        Ok(Object::Mutex(Arc::new(ScriptMutex::new())))
    });

    registry.define("newRWMutex", |ctx, args| {
        ctx.check_arity(Arity::Exact(0), &args)?;
        Ok(Object::RwLock(Arc::new(ScriptRwLock::new())))
    });

    // newCond(lock) - lock must be a Mutex or RWMutex
    registry.define("newCond", |ctx, args| {
        ctx.check_arity(Arity::Exact(1), &args)?;
        let lock = match &args[0] {
            Object::Mutex(m) => CondLock::Mutex(Arc::clone(m)),
            Object::RwLock(rw) => CondLock::RwLock(Arc::clone(rw)),
            other => return ctx.param_type(0, "*Mutex|*RWMutex", other),
        };
        Ok(Object::Cond(Arc::new(ScriptCond::new(lock))))
    });

    registry.define("newOnce", |ctx, args| {
        ctx.check_arity(Arity::Exact(0), &args)?;
        Ok(Object::Once(Arc::new(ScriptOnce::new())))
    });

    registry.define("newWaitGroup", |ctx, args| {
        ctx.check_arity(Arity::Exact(0), &args)?;
        Ok(Object::WaitGroup(Arc::new(ScriptWaitGroup::new())))
    });

    // sleep(ms)
    registry.define("sleep", |ctx, args| {
        ctx.check_arity(Arity::Exact(1), &args)?;
        let millis = match &args[0] {
            Object::Integer(n) => (*n).max(0) as u64,
            Object::UInteger(n) => *n,
            Object::Float(f) if *f >= 0.0 => *f as u64,
            other => return ctx.param_type(0, "*Integer|*UInteger|*Float", other),
        };
        thread::sleep(Duration::from_millis(millis));
        Ok(Object::Nil)
    });
}
