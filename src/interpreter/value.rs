//! Runtime values for the AeroScript interpreter.
//!
//! [`Object`] is a closed sum type: every value a script can touch is one of its
//! variants. Shared mutable variants (arrays, hashes, instances, sync primitives)
//! sit behind `Arc` so they can cross into spawned tasks.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::ast::{Parameter, Stmt};
use crate::decimal::Decimal;
use crate::error::RuntimeError;
use crate::interpreter::builtins::CallContext;
use crate::interpreter::class::{Class, Instance};
use crate::interpreter::database::DatabaseHandle;
use crate::interpreter::environment::Scope;
use crate::interpreter::executor::RuntimeResult;
use crate::interpreter::module::Module;
use crate::interpreter::resources::{CsvReaderHandle, CsvWriterHandle, FileHandle, PipeHandle, ScriptLogger, SocketHandle};
use crate::interpreter::sync::{ScriptChannel, ScriptCond, ScriptMutex, ScriptOnce, ScriptRwLock, ScriptWaitGroup};
use crate::span::Span;

pub type HashMapObj = IndexMap<HashKey, Object>;

/// Stable kind tag of an object, used in type checks and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Nil,
    Boolean,
    Integer,
    UInteger,
    Float,
    Decimal,
    String,
    Array,
    Tuple,
    Hash,
    List,
    Function,
    Builtin,
    Class,
    Instance,
    Error,
    Mutex,
    RwLock,
    Cond,
    Once,
    WaitGroup,
    Channel,
    File,
    Socket,
    Logger,
    CsvReader,
    CsvWriter,
    Pipe,
    Database,
    Module,
    Time,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Nil => "NIL",
            ObjectType::Boolean => "BOOLEAN",
            ObjectType::Integer => "INTEGER",
            ObjectType::UInteger => "UINTEGER",
            ObjectType::Float => "FLOAT",
            ObjectType::Decimal => "DECIMAL",
            ObjectType::String => "STRING",
            ObjectType::Array => "ARRAY",
            ObjectType::Tuple => "TUPLE",
            ObjectType::Hash => "HASH",
            ObjectType::List => "LIST",
            ObjectType::Function => "FUNCTION",
            ObjectType::Builtin => "BUILTIN",
            ObjectType::Class => "CLASS",
            ObjectType::Instance => "INSTANCE",
            ObjectType::Error => "ERROR",
            ObjectType::Mutex => "MUTEX",
            ObjectType::RwLock => "RWMUTEX",
            ObjectType::Cond => "COND",
            ObjectType::Once => "ONCE",
            ObjectType::WaitGroup => "WAITGROUP",
            ObjectType::Channel => "CHANNEL",
            ObjectType::File => "FILE",
            ObjectType::Socket => "SOCKET",
            ObjectType::Logger => "LOGGER",
            ObjectType::CsvReader => "CSV_READER",
            ObjectType::CsvWriter => "CSV_WRITER",
            ObjectType::Pipe => "PIPE",
            ObjectType::Database => "DATABASE",
            ObjectType::Module => "MODULE",
            ObjectType::Time => "TIME",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of a hash entry. Only integers, booleans and strings are hashable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    Int(i64),
    UInt(u64),
    Bool(bool),
    Str(String),
}

impl HashKey {
    pub fn from_object(value: &Object) -> Option<HashKey> {
        match value {
            Object::Integer(n) => Some(HashKey::Int(*n)),
            Object::UInteger(n) => Some(HashKey::UInt(*n)),
            Object::Boolean(b) => Some(HashKey::Bool(*b)),
            Object::String(s) => Some(HashKey::Str(s.clone())),
            _ => None,
        }
    }

    pub fn to_object(&self) -> Object {
        match self {
            HashKey::Int(n) => Object::Integer(*n),
            HashKey::UInt(n) => Object::UInteger(*n),
            HashKey::Bool(b) => Object::Boolean(*b),
            HashKey::Str(s) => Object::String(s.clone()),
        }
    }
}

impl fmt::Display for HashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashKey::Int(n) => write!(f, "{}", n),
            HashKey::UInt(n) => write!(f, "{}", n),
            HashKey::Bool(b) => write!(f, "{}", b),
            HashKey::Str(s) => write!(f, "{}", s),
        }
    }
}

/// A runtime value.
#[derive(Clone)]
pub enum Object {
    Nil,
    Boolean(bool),
    Integer(i64),
    UInteger(u64),
    Float(f64),
    Decimal(Decimal),
    String(String),
    Array(Arc<RwLock<Vec<Object>>>),
    Tuple(Arc<Vec<Object>>),
    Hash(Arc<RwLock<HashMapObj>>),
    /// Double-ended list.
    List(Arc<RwLock<VecDeque<Object>>>),
    Function(Arc<Function>),
    Builtin(Arc<NativeFunction>),
    Class(Arc<Class>),
    Instance(Arc<Instance>),
    Error(Arc<RuntimeError>),
    Mutex(Arc<ScriptMutex>),
    RwLock(Arc<ScriptRwLock>),
    Cond(Arc<ScriptCond>),
    Once(Arc<ScriptOnce>),
    WaitGroup(Arc<ScriptWaitGroup>),
    Channel(Arc<ScriptChannel>),
    File(Arc<FileHandle>),
    Socket(Arc<SocketHandle>),
    Logger(Arc<ScriptLogger>),
    CsvReader(Arc<CsvReaderHandle>),
    CsvWriter(Arc<CsvWriterHandle>),
    Pipe(Arc<PipeHandle>),
    Database(Arc<DatabaseHandle>),
    Module(Arc<Module>),
    Time(DateTime<FixedOffset>),
}

impl Object {
    pub fn string(s: impl Into<String>) -> Self {
        Object::String(s.into())
    }

    pub fn array(items: Vec<Object>) -> Self {
        Object::Array(Arc::new(RwLock::new(items)))
    }

    pub fn tuple(items: Vec<Object>) -> Self {
        Object::Tuple(Arc::new(items))
    }

    pub fn hash(map: HashMapObj) -> Self {
        Object::Hash(Arc::new(RwLock::new(map)))
    }

    pub fn list(items: VecDeque<Object>) -> Self {
        Object::List(Arc::new(RwLock::new(items)))
    }

    pub fn error(err: RuntimeError) -> Self {
        Object::Error(Arc::new(err))
    }

    pub fn type_tag(&self) -> ObjectType {
        match self {
            Object::Nil => ObjectType::Nil,
            Object::Boolean(_) => ObjectType::Boolean,
            Object::Integer(_) => ObjectType::Integer,
            Object::UInteger(_) => ObjectType::UInteger,
            Object::Float(_) => ObjectType::Float,
            Object::Decimal(_) => ObjectType::Decimal,
            Object::String(_) => ObjectType::String,
            Object::Array(_) => ObjectType::Array,
            Object::Tuple(_) => ObjectType::Tuple,
            Object::Hash(_) => ObjectType::Hash,
            Object::List(_) => ObjectType::List,
            Object::Function(_) => ObjectType::Function,
            Object::Builtin(_) => ObjectType::Builtin,
            Object::Class(_) => ObjectType::Class,
            Object::Instance(_) => ObjectType::Instance,
            Object::Error(_) => ObjectType::Error,
            Object::Mutex(_) => ObjectType::Mutex,
            Object::RwLock(_) => ObjectType::RwLock,
            Object::Cond(_) => ObjectType::Cond,
            Object::Once(_) => ObjectType::Once,
            Object::WaitGroup(_) => ObjectType::WaitGroup,
            Object::Channel(_) => ObjectType::Channel,
            Object::File(_) => ObjectType::File,
            Object::Socket(_) => ObjectType::Socket,
            Object::Logger(_) => ObjectType::Logger,
            Object::CsvReader(_) => ObjectType::CsvReader,
            Object::CsvWriter(_) => ObjectType::CsvWriter,
            Object::Pipe(_) => ObjectType::Pipe,
            Object::Database(_) => ObjectType::Database,
            Object::Module(_) => ObjectType::Module,
            Object::Time(_) => ObjectType::Time,
        }
    }

    /// Name used in messages: the kind tag, or the class name for instances.
    pub fn type_name(&self) -> String {
        match self {
            Object::Instance(inst) => inst.class.name.clone(),
            other => other.type_tag().to_string(),
        }
    }

    /// Human-readable rendering used by print and error messages.
    pub fn inspect(&self) -> String {
        self.to_string()
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Object::Nil => false,
            Object::Boolean(b) => *b,
            Object::Integer(n) => *n != 0,
            Object::UInteger(n) => *n != 0,
            Object::Float(f) => *f != 0.0,
            Object::Decimal(d) => !d.is_zero(),
            Object::String(s) => !s.is_empty(),
            Object::Array(items) => !items.read().is_empty(),
            Object::Tuple(items) => !items.is_empty(),
            Object::Hash(map) => !map.read().is_empty(),
            Object::List(items) => !items.read().is_empty(),
            _ => true,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Object::Nil)
    }

    /// Empty string, collection or nil.
    pub fn is_empty(&self) -> bool {
        match self {
            Object::Nil => true,
            Object::String(s) => s.is_empty(),
            Object::Array(items) => items.read().is_empty(),
            Object::Tuple(items) => items.is_empty(),
            Object::Hash(map) => map.read().is_empty(),
            Object::List(items) => items.read().is_empty(),
            _ => false,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Object::Integer(n) => Some(*n),
            Object::UInteger(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    /// Elements of an array, tuple or the characters of a string.
    pub fn iter_items(&self) -> Option<Vec<Object>> {
        match self {
            Object::Array(items) => Some(items.read().clone()),
            Object::Tuple(items) => Some(items.as_ref().clone()),
            Object::List(items) => Some(items.read().iter().cloned().collect()),
            Object::String(s) => Some(s.chars().map(|c| Object::String(c.to_string())).collect()),
            _ => None,
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Object]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Nil => write!(f, "nil"),
            Object::Boolean(b) => write!(f, "{}", b),
            Object::Integer(n) => write!(f, "{}", n),
            Object::UInteger(n) => write!(f, "{}", n),
            Object::Float(n) => write!(f, "{}", n),
            Object::Decimal(d) => write!(f, "{}", d),
            Object::String(s) => write!(f, "{}", s),
            Object::Array(items) => {
                write!(f, "[")?;
                write_items(f, &items.read())?;
                write!(f, "]")
            }
            Object::Tuple(items) => {
                write!(f, "(")?;
                write_items(f, items)?;
                write!(f, ")")
            }
            Object::Hash(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.read().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} => {}", key, value)?;
                }
                write!(f, "}}")
            }
            Object::List(items) => {
                write!(f, "list[")?;
                let items: Vec<Object> = items.read().iter().cloned().collect();
                write_items(f, &items)?;
                write!(f, "]")
            }
            Object::Function(func) => write!(f, "<fn {}>", func.name),
            Object::Builtin(func) => write!(f, "<builtin {}>", func.name),
            Object::Class(class) => write!(f, "<class {}>", class.name),
            Object::Instance(inst) => write!(f, "<{} instance>", inst.class.name),
            Object::Error(err) => write!(f, "Runtime Error: {}", err),
            Object::Mutex(_) => write!(f, "<mutex>"),
            Object::RwLock(_) => write!(f, "<rwmutex>"),
            Object::Cond(_) => write!(f, "<cond>"),
            Object::Once(_) => write!(f, "<once>"),
            Object::WaitGroup(wg) => write!(f, "<waitgroup {}>", wg.count()),
            Object::Channel(ch) => write!(f, "<channel {}>", ch.len()),
            Object::File(file) => write!(f, "<file {}>", file.path),
            Object::Socket(sock) => write!(f, "<socket {}>", sock.addr()),
            Object::Logger(logger) => write!(f, "<logger {}>", logger.prefix()),
            Object::CsvReader(_) => write!(f, "<csv reader>"),
            Object::CsvWriter(_) => write!(f, "<csv writer>"),
            Object::Pipe(_) => write!(f, "<pipe>"),
            Object::Database(db) => write!(f, "<database {}>", db.driver),
            Object::Module(module) => write!(f, "<module {}>", module.name),
            Object::Time(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S%.f %z")),
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::String(s) => write!(f, "{:?}", s),
            other => write!(f, "{}({})", other.type_tag(), other),
        }
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Nil, Object::Nil) => true,
            (Object::Boolean(a), Object::Boolean(b)) => a == b,
            (Object::Integer(a), Object::Integer(b)) => a == b,
            (Object::UInteger(a), Object::UInteger(b)) => a == b,
            (Object::Integer(a), Object::UInteger(b)) | (Object::UInteger(b), Object::Integer(a)) => {
                *a >= 0 && *a as u64 == *b
            }
            (Object::Float(a), Object::Float(b)) => a == b,
            (Object::Integer(a), Object::Float(b)) | (Object::Float(b), Object::Integer(a)) => {
                (*a as f64) == *b
            }
            (Object::Decimal(a), Object::Decimal(b)) => a == b,
            (Object::String(a), Object::String(b)) => a == b,
            (Object::Array(a), Object::Array(b)) => {
                if Arc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.read(), b.read());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            (Object::Tuple(a), Object::Tuple(b)) => a == b,
            (Object::Hash(a), Object::Hash(b)) => {
                if Arc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.read(), b.read());
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
            }
            (Object::List(a), Object::List(b)) => {
                if Arc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.read(), b.read());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            (Object::Function(a), Object::Function(b)) => Arc::ptr_eq(a, b),
            (Object::Builtin(a), Object::Builtin(b)) => a.name == b.name,
            (Object::Class(a), Object::Class(b)) => Arc::ptr_eq(a, b),
            (Object::Instance(a), Object::Instance(b)) => Arc::ptr_eq(a, b),
            (Object::Error(a), Object::Error(b)) => a == b,
            (Object::Mutex(a), Object::Mutex(b)) => Arc::ptr_eq(a, b),
            (Object::RwLock(a), Object::RwLock(b)) => Arc::ptr_eq(a, b),
            (Object::Cond(a), Object::Cond(b)) => Arc::ptr_eq(a, b),
            (Object::Once(a), Object::Once(b)) => Arc::ptr_eq(a, b),
            (Object::WaitGroup(a), Object::WaitGroup(b)) => Arc::ptr_eq(a, b),
            (Object::Channel(a), Object::Channel(b)) => Arc::ptr_eq(a, b),
            (Object::File(a), Object::File(b)) => Arc::ptr_eq(a, b),
            (Object::Socket(a), Object::Socket(b)) => Arc::ptr_eq(a, b),
            (Object::Logger(a), Object::Logger(b)) => Arc::ptr_eq(a, b),
            (Object::CsvReader(a), Object::CsvReader(b)) => Arc::ptr_eq(a, b),
            (Object::CsvWriter(a), Object::CsvWriter(b)) => Arc::ptr_eq(a, b),
            (Object::Pipe(a), Object::Pipe(b)) => Arc::ptr_eq(a, b),
            (Object::Database(a), Object::Database(b)) => Arc::ptr_eq(a, b),
            (Object::Module(a), Object::Module(b)) => Arc::ptr_eq(a, b),
            (Object::Time(a), Object::Time(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Object {
    fn from(value: bool) -> Self {
        Object::Boolean(value)
    }
}

impl From<i64> for Object {
    fn from(value: i64) -> Self {
        Object::Integer(value)
    }
}

impl From<f64> for Object {
    fn from(value: f64) -> Self {
        Object::Float(value)
    }
}

impl From<&str> for Object {
    fn from(value: &str) -> Self {
        Object::String(value.to_string())
    }
}

impl From<String> for Object {
    fn from(value: String) -> Self {
        Object::String(value)
    }
}

impl From<Decimal> for Object {
    fn from(value: Decimal) -> Self {
        Object::Decimal(value)
    }
}

/// A user-defined function closing over the scope it was created in.
pub struct Function {
    pub name: String,
    pub params: Vec<Parameter>,
    pub body: Arc<Vec<Stmt>>,
    pub closure: Scope,
    pub span: Span,
}

impl Function {
    pub fn new(name: impl Into<String>, params: Vec<Parameter>, body: Vec<Stmt>, closure: Scope, span: Span) -> Self {
        Self {
            name: name.into(),
            params,
            body: Arc::new(body),
            closure,
            span,
        }
    }

    /// Same code bound to a different closure scope.
    pub fn rebind(&self, closure: Scope) -> Self {
        Self {
            name: self.name.clone(),
            params: self.params.clone(),
            body: Arc::clone(&self.body),
            closure,
            span: self.span,
        }
    }

    /// Number of parameters without a default value.
    pub fn required_arity(&self) -> usize {
        self.params.iter().filter(|p| p.default_value.is_none()).count()
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Accepted argument counts rendered the way arity errors report them.
    pub fn arity_label(&self) -> String {
        let (min, max) = (self.required_arity(), self.arity());
        if min == max {
            min.to_string()
        } else {
            (min..=max).map(|n| n.to_string()).collect::<Vec<_>>().join("|")
        }
    }
}

pub type NativeFn = dyn Fn(&CallContext<'_>, Vec<Object>) -> RuntimeResult<Object> + Send + Sync;

/// A builtin function implemented in Rust.
#[derive(Clone)]
pub struct NativeFunction {
    pub name: String,
    pub func: Arc<NativeFn>,
}

impl NativeFunction {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&CallContext<'_>, Vec<Object>) -> RuntimeResult<Object> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<builtin {}>", self.name)
    }
}

/// Field store of an instance.
pub type FieldMap = HashMap<String, Object>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_inspect_collections() {
        let arr = Object::array(vec![Object::Integer(1), Object::string("a"), Object::Nil]);
        assert_eq!(arr.inspect(), "[1, a, nil]");

        let mut map = HashMapObj::new();
        map.insert(HashKey::Str("k".into()), Object::Boolean(true));
        map.insert(HashKey::Int(2), Object::tuple(vec![Object::Float(1.5)]));
        assert_eq!(Object::hash(map).inspect(), "{k => true, 2 => (1.5)}");
        let list = Object::list(VecDeque::from(vec![Object::Integer(1), Object::Integer(2)]));
        assert_eq!(list.inspect(), "list[1, 2]");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Object::Nil.is_truthy());
        assert!(!Object::Integer(0).is_truthy());
        assert!(!Object::string("").is_truthy());
        assert!(!Object::array(vec![]).is_truthy());
        assert!(Object::string("x").is_truthy());
        assert!(Object::Float(0.1).is_truthy());
    }

    #[test]
    fn test_structural_equality() {
        let a = Object::array(vec![Object::Integer(1), Object::string("x")]);
        let b = Object::array(vec![Object::Integer(1), Object::string("x")]);
        assert_eq!(a, b);
        assert_eq!(Object::Integer(3), Object::Float(3.0));
        assert_eq!(Object::Integer(3), Object::UInteger(3));
        assert_ne!(Object::Integer(-1), Object::UInteger(u64::MAX));
        assert_ne!(Object::string("1"), Object::Integer(1));
    }

    #[test]
    fn test_hash_keys() {
        assert_eq!(HashKey::from_object(&Object::string("a")), Some(HashKey::Str("a".into())));
        assert_eq!(HashKey::from_object(&Object::Float(1.0)), None);
        assert_eq!(HashKey::Bool(true).to_object(), Object::Boolean(true));
    }

    #[test]
    fn test_type_tags() {
        assert_eq!(Object::Nil.type_tag().to_string(), "NIL");
        assert_eq!(Object::Decimal(Decimal::zero()).type_name(), "DECIMAL");
        assert_eq!(Object::tuple(vec![]).type_tag(), ObjectType::Tuple);
        assert_eq!(Object::list(VecDeque::new()).type_tag().as_str(), "LIST");
    }
}
