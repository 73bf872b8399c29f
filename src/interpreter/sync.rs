//! Concurrency primitives exposed to scripts.
//!
//! Scripts lock and unlock explicitly, so these cannot be RAII guards. Each lock is
//! a small state machine over a `parking_lot` mutex and condition variable.

use crossbeam::channel::{self, select, Receiver, Sender, TryRecvError, TrySendError};
use parking_lot::{Condvar, Mutex};
use thiserror::Error;

use crate::interpreter::value::Object;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("unlock of unlocked mutex")]
    NotLocked,
    #[error("read unlock of unlocked rwmutex")]
    NotReadLocked,
    #[error("negative WaitGroup counter")]
    NegativeCounter,
    #[error("send on closed channel")]
    Closed,
}

/// Mutual exclusion lock.
#[derive(Default)]
pub struct ScriptMutex {
    locked: Mutex<bool>,
    released: Condvar,
}

impl ScriptMutex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) {
        let mut locked = self.locked.lock();
        while *locked {
            self.released.wait(&mut locked);
        }
        *locked = true;
    }

    pub fn try_lock(&self) -> bool {
        let mut locked = self.locked.lock();
        if *locked {
            return false;
        }
        *locked = true;
        true
    }

    pub fn unlock(&self) -> Result<(), SyncError> {
        let mut locked = self.locked.lock();
        if !*locked {
            return Err(SyncError::NotLocked);
        }
        *locked = false;
        self.released.notify_one();
        Ok(())
    }
}

#[derive(Default)]
struct RwState {
    writer: bool,
    readers: usize,
}

/// Reader/writer lock.
#[derive(Default)]
pub struct ScriptRwLock {
    state: Mutex<RwState>,
    changed: Condvar,
}

impl ScriptRwLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) {
        let mut state = self.state.lock();
        while state.writer || state.readers > 0 {
            self.changed.wait(&mut state);
        }
        state.writer = true;
    }

    pub fn unlock(&self) -> Result<(), SyncError> {
        let mut state = self.state.lock();
        if !state.writer {
            return Err(SyncError::NotLocked);
        }
        state.writer = false;
        self.changed.notify_all();
        Ok(())
    }

    pub fn read_lock(&self) {
        let mut state = self.state.lock();
        while state.writer {
            self.changed.wait(&mut state);
        }
        state.readers += 1;
    }

    pub fn read_unlock(&self) -> Result<(), SyncError> {
        let mut state = self.state.lock();
        if state.readers == 0 {
            return Err(SyncError::NotReadLocked);
        }
        state.readers -= 1;
        if state.readers == 0 {
            self.changed.notify_all();
        }
        Ok(())
    }
}

/// The lock a condition variable releases while waiting.
#[derive(Clone)]
pub enum CondLock {
    Mutex(std::sync::Arc<ScriptMutex>),
    RwLock(std::sync::Arc<ScriptRwLock>),
}

impl CondLock {
    fn lock(&self) {
        match self {
            CondLock::Mutex(m) => m.lock(),
            CondLock::RwLock(rw) => rw.lock(),
        }
    }

    fn unlock(&self) -> Result<(), SyncError> {
        match self {
            CondLock::Mutex(m) => m.unlock(),
            CondLock::RwLock(rw) => rw.unlock(),
        }
    }
}

#[derive(Default)]
struct CondState {
    waiters: usize,
    wakeups: usize,
}

/// Condition variable over a script lock.
pub struct ScriptCond {
    lock: CondLock,
    state: Mutex<CondState>,
    signal: Condvar,
}

impl ScriptCond {
    pub fn new(lock: CondLock) -> Self {
        Self {
            lock,
            state: Mutex::new(CondState::default()),
            signal: Condvar::new(),
        }
    }

    /// Release the lock, block until signalled, then reacquire it.
    /// The caller must hold the lock.
    pub fn wait(&self) -> Result<(), SyncError> {
        let mut state = self.state.lock();
        state.waiters += 1;
        // Registered as a waiter before releasing, so a signal cannot slip past.
        if let Err(err) = self.lock.unlock() {
            state.waiters -= 1;
            return Err(err);
        }
        while state.wakeups == 0 {
            self.signal.wait(&mut state);
        }
        state.wakeups -= 1;
        state.waiters -= 1;
        drop(state);
        self.lock.lock();
        Ok(())
    }

    pub fn signal(&self) {
        let mut state = self.state.lock();
        if state.waiters > state.wakeups {
            state.wakeups += 1;
            self.signal.notify_one();
        }
    }

    pub fn broadcast(&self) {
        let mut state = self.state.lock();
        if state.waiters > state.wakeups {
            state.wakeups = state.waiters;
            self.signal.notify_all();
        }
    }
}

/// One-shot gate: the first `run` executes, later ones return immediately.
#[derive(Default)]
pub struct ScriptOnce {
    done: Mutex<bool>,
}

impl ScriptOnce {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` unless a previous call already did. Concurrent callers wait for the
    /// first one to finish.
    pub fn run<T, F>(&self, f: F) -> Option<T>
    where
        F: FnOnce() -> T,
    {
        let mut done = self.done.lock();
        if *done {
            return None;
        }
        *done = true;
        Some(f())
    }

    pub fn is_done(&self) -> bool {
        *self.done.lock()
    }
}

/// Countdown latch.
#[derive(Default)]
pub struct ScriptWaitGroup {
    count: Mutex<i64>,
    zero: Condvar,
}

impl ScriptWaitGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, delta: i64) -> Result<(), SyncError> {
        let mut count = self.count.lock();
        let next = *count + delta;
        if next < 0 {
            return Err(SyncError::NegativeCounter);
        }
        *count = next;
        if next == 0 {
            self.zero.notify_all();
        }
        Ok(())
    }

    pub fn done(&self) -> Result<(), SyncError> {
        self.add(-1)
    }

    pub fn wait(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.zero.wait(&mut count);
        }
    }

    pub fn count(&self) -> i64 {
        *self.count.lock()
    }
}

/// Synchronized queue. Closing drops the sending side; receivers drain what is left.
///
/// Blocked senders and receivers also wait on `closed`, whose only sender is dropped
/// by [`ScriptChannel::close`], so closing wakes them.
pub struct ScriptChannel {
    senders: Mutex<Option<(Sender<Object>, Sender<()>)>>,
    receiver: Receiver<Object>,
    closed: Receiver<()>,
    capacity: Option<usize>,
}

impl ScriptChannel {
    fn from_parts(tx: Sender<Object>, rx: Receiver<Object>, capacity: Option<usize>) -> Self {
        let (close_tx, closed) = channel::bounded(0);
        Self {
            senders: Mutex::new(Some((tx, close_tx))),
            receiver: rx,
            closed,
            capacity,
        }
    }

    pub fn unbounded() -> Self {
        let (tx, rx) = channel::unbounded();
        Self::from_parts(tx, rx, None)
    }

    /// Capacity 0 makes every send wait for a receiver.
    pub fn bounded(capacity: usize) -> Self {
        let (tx, rx) = channel::bounded(capacity);
        Self::from_parts(tx, rx, Some(capacity))
    }

    fn sender(&self) -> Result<Sender<Object>, SyncError> {
        match &*self.senders.lock() {
            Some((tx, _)) => Ok(tx.clone()),
            None => Err(SyncError::Closed),
        }
    }

    /// Blocks while the queue is full; fails if the channel is or becomes closed.
    pub fn send(&self, value: Object) -> Result<(), SyncError> {
        let sender = self.sender()?;
        select! {
            send(sender, value) -> sent => sent.map_err(|_| SyncError::Closed),
            recv(self.closed) -> _ => Err(SyncError::Closed),
        }
    }

    /// Returns false when the queue is full.
    pub fn try_send(&self, value: Object) -> Result<bool, SyncError> {
        match self.sender()?.try_send(value) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(_)) => Ok(false),
            Err(TrySendError::Disconnected(_)) => Err(SyncError::Closed),
        }
    }

    /// Blocks for the next value; `None` once closed and drained.
    pub fn recv(&self) -> Option<Object> {
        select! {
            recv(self.receiver) -> value => value.ok(),
            recv(self.closed) -> _ => self.receiver.try_recv().ok(),
        }
    }

    pub fn try_recv(&self) -> Option<Object> {
        match self.receiver.try_recv() {
            Ok(value) => Some(value),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn close(&self) {
        self.senders.lock().take();
    }

    pub fn is_closed(&self) -> bool {
        self.senders.lock().is_none()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_mutex_unlock_requires_lock() {
        let m = ScriptMutex::new();
        assert_eq!(m.unlock(), Err(SyncError::NotLocked));
        m.lock();
        assert!(!m.try_lock());
        assert_eq!(m.unlock(), Ok(()));
        assert!(m.try_lock());
    }

    #[test]
    fn test_mutex_serializes_threads() {
        let m = Arc::new(ScriptMutex::new());
        let counter = Arc::new(Mutex::new(0u32));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let (m, counter) = (Arc::clone(&m), Arc::clone(&counter));
                thread::spawn(move || {
                    for _ in 0..1000 {
                        m.lock();
                        *counter.lock() += 1;
                        m.unlock().unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(*counter.lock(), 4000);
    }

    #[test]
    fn test_rwlock_readers_share() {
        let rw = ScriptRwLock::new();
        rw.read_lock();
        rw.read_lock();
        assert_eq!(rw.read_unlock(), Ok(()));
        assert_eq!(rw.read_unlock(), Ok(()));
        assert_eq!(rw.read_unlock(), Err(SyncError::NotReadLocked));
        rw.lock();
        assert_eq!(rw.unlock(), Ok(()));
    }

    #[test]
    fn test_cond_wakes_waiter() {
        let m = Arc::new(ScriptMutex::new());
        let cond = Arc::new(ScriptCond::new(CondLock::Mutex(Arc::clone(&m))));
        let ready = Arc::new(Mutex::new(false));

        let waiter = {
            let (m, cond, ready) = (Arc::clone(&m), Arc::clone(&cond), Arc::clone(&ready));
            thread::spawn(move || {
                m.lock();
                while !*ready.lock() {
                    cond.wait().unwrap();
                }
                m.unlock().unwrap();
            })
        };

        m.lock();
        *ready.lock() = true;
        cond.broadcast();
        m.unlock().unwrap();
        waiter.join().unwrap();
    }

    #[test]
    fn test_wait_group_counts_down() {
        let wg = Arc::new(ScriptWaitGroup::new());
        wg.add(3).unwrap();
        let handles: Vec<_> = (0..3)
            .map(|_| {
                let wg = Arc::clone(&wg);
                thread::spawn(move || wg.done().unwrap())
            })
            .collect();
        wg.wait();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(wg.count(), 0);
        assert_eq!(wg.done(), Err(SyncError::NegativeCounter));
    }

    #[test]
    fn test_once_runs_first_call_only() {
        let once = ScriptOnce::new();
        assert_eq!(once.run(|| 1), Some(1));
        assert_eq!(once.run(|| 2), None);
        assert!(once.is_done());
    }

    #[test]
    fn test_channel_close_drains() {
        let ch = ScriptChannel::bounded(2);
        ch.send(Object::Integer(1)).unwrap();
        assert_eq!(ch.try_send(Object::Integer(2)), Ok(true));
        assert_eq!(ch.try_send(Object::Integer(3)), Ok(false));
        ch.close();
        assert_eq!(ch.send(Object::Nil), Err(SyncError::Closed));
        assert_eq!(ch.recv(), Some(Object::Integer(1)));
        assert_eq!(ch.recv(), Some(Object::Integer(2)));
        assert_eq!(ch.recv(), None);
    }

    #[test]
    fn test_close_wakes_blocked_receiver() {
        let ch = Arc::new(ScriptChannel::unbounded());
        let receiver = {
            let ch = Arc::clone(&ch);
            thread::spawn(move || ch.recv())
        };
        thread::sleep(std::time::Duration::from_millis(20));
        ch.close();
        assert_eq!(receiver.join().unwrap(), None);
    }

    #[test]
    fn test_close_wakes_blocked_sender() {
        let ch = Arc::new(ScriptChannel::bounded(0));
        let sender = {
            let ch = Arc::clone(&ch);
            thread::spawn(move || ch.send(Object::Integer(1)))
        };
        thread::sleep(std::time::Duration::from_millis(20));
        ch.close();
        assert_eq!(sender.join().unwrap(), Err(SyncError::Closed));
    }
}
