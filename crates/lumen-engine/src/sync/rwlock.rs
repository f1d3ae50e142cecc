use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct LockState {
    /// Read locks held, per thread.
    readers: HashMap<ThreadId, usize>,
    /// Write owner and nesting depth.
    writer: Option<(ThreadId, usize)>,
    waiting_writers: usize,
    /// Live shared borrows of the data (read guards and `with` calls).
    shared_borrows: usize,
    /// A `with_mut` call is running.
    exclusive_borrow: bool,
}

#[derive(Copy, Clone)]
enum Wait {
    Block,
    Try,
    Until(Instant),
}

/// Reader/writer lock that a thread may re-enter.
///
/// - Any number of threads may hold read locks at once, or one thread the
///   write lock.
/// - The write owner may nest further read and write locks.
/// - Asking for the write lock while holding only read locks fails with
///   [`Error::InvalidLockTransition`] instead of deadlocking.
/// - A waiting writer holds back threads that do not already read.
///
/// Data is reached through guards. Read guards deref to `&T`; write guards
/// hand out `&mut T` only inside [`WriteGuard::with_mut`], which fails while
/// the same thread holds any other borrow of the data.
///
/// The data itself sits in a std [`RwLock`] that is only taken after the
/// bookkeeping above has admitted the caller, so it never blocks for long.
pub struct ReentrantRwLock<T> {
    state: Mutex<LockState>,
    cond: Condvar,
    strict: bool,
    data: RwLock<T>,
}

impl<T: Default> Default for ReentrantRwLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> fmt::Debug for ReentrantRwLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock_state();
        f.debug_struct("ReentrantRwLock")
            .field("readers", &state.readers.values().sum::<usize>())
            .field("writer", &state.writer.is_some())
            .field("waiting_writers", &state.waiting_writers)
            .finish_non_exhaustive()
    }
}

impl<T> ReentrantRwLock<T> {
    pub fn new(value: T) -> Self {
        Self::with_strict(value, false)
    }

    /// With `strict` set, lock-discipline violations also trip a debug
    /// assertion before the error is returned.
    pub fn with_strict(value: T, strict: bool) -> Self {
        Self { state: Mutex::new(LockState::default()), cond: Condvar::new(), strict, data: RwLock::new(value) }
    }

    pub fn into_inner(self) -> T {
        self.data.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Direct access through exclusive ownership; no locking needed.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_state(&self) -> MutexGuard<'_, LockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn violation(&self, what: &str) -> Error {
        log::debug!("lock discipline violation: {what}");
        if self.strict {
            debug_assert!(false, "lock discipline violation: {what}");
        }
        Error::InvalidLockTransition
    }

    /// Blocks until `ready` holds. Returns the state guard, or `None` when
    /// the wait mode gives up first.
    fn wait_until<'a>(
        &'a self,
        mut state: MutexGuard<'a, LockState>,
        wait: Wait,
        ready: impl Fn(&LockState) -> bool,
    ) -> Option<MutexGuard<'a, LockState>> {
        while !ready(&state) {
            match wait {
                Wait::Try => return None,
                Wait::Block => {
                    state = self.cond.wait(state).unwrap_or_else(PoisonError::into_inner);
                }
                Wait::Until(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return None;
                    }
                    state = self
                        .cond
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                }
            }
        }
        Some(state)
    }

    fn acquire_read(&self, wait: Wait) -> Result<Option<ReadGuard<'_, T>>> {
        let me = thread::current().id();
        let state = self.lock_state();
        if state.exclusive_borrow && state.writer.is_some_and(|(t, _)| t == me) {
            return Err(self.violation("read lock requested inside with_mut"));
        }
        let reentrant = state.writer.is_some_and(|(t, _)| t == me) || state.readers.contains_key(&me);
        let ready = |s: &LockState| reentrant || (s.writer.is_none() && s.waiting_writers == 0);
        let Some(mut state) = self.wait_until(state, wait, ready) else {
            return Ok(None);
        };
        *state.readers.entry(me).or_insert(0) += 1;
        state.shared_borrows += 1;
        drop(state);
        let release = ReadRelease { lock: self };
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(Some(ReadGuard { data, _release: release }))
    }

    fn acquire_write(&self, wait: Wait) -> Result<Option<WriteGuard<'_, T>>> {
        let me = thread::current().id();
        let mut state = self.lock_state();
        if let Some((owner, depth)) = state.writer.as_mut() {
            if *owner == me {
                *depth += 1;
                return Ok(Some(WriteGuard { lock: self, _thread_bound: PhantomData }));
            }
        }
        if state.readers.contains_key(&me) {
            return Err(self.violation("write lock requested while holding a read lock"));
        }

        state.waiting_writers += 1;
        let acquired = self.wait_until(state, wait, |s| s.writer.is_none() && s.readers.is_empty());
        let mut state = match acquired {
            Some(state) => state,
            None => {
                let mut state = self.lock_state();
                state.waiting_writers -= 1;
                // Readers held back by this writer may proceed.
                self.cond.notify_all();
                return Ok(None);
            }
        };
        state.waiting_writers -= 1;
        state.writer = Some((me, 1));
        Ok(Some(WriteGuard { lock: self, _thread_bound: PhantomData }))
    }

    /// Blocks until a read lock is available.
    pub fn read(&self) -> Result<ReadGuard<'_, T>> {
        self.acquire_read(Wait::Block)?.ok_or(Error::Timeout)
    }

    /// Read lock if available without waiting.
    pub fn try_read(&self) -> Result<Option<ReadGuard<'_, T>>> {
        self.acquire_read(Wait::Try)
    }

    /// Read lock, or [`Error::Timeout`] once `timeout` elapses.
    pub fn read_timeout(&self, timeout: Duration) -> Result<ReadGuard<'_, T>> {
        self.acquire_read(Wait::Until(Instant::now() + timeout))?.ok_or(Error::Timeout)
    }

    /// Blocks until the write lock is available.
    pub fn write(&self) -> Result<WriteGuard<'_, T>> {
        self.acquire_write(Wait::Block)?.ok_or(Error::Timeout)
    }

    /// Write lock if available without waiting.
    pub fn try_write(&self) -> Result<Option<WriteGuard<'_, T>>> {
        self.acquire_write(Wait::Try)
    }

    /// Write lock, or [`Error::Timeout`] once `timeout` elapses.
    pub fn write_timeout(&self, timeout: Duration) -> Result<WriteGuard<'_, T>> {
        self.acquire_write(Wait::Until(Instant::now() + timeout))?.ok_or(Error::Timeout)
    }

    fn release_read(&self) {
        let me = thread::current().id();
        let mut state = self.lock_state();
        state.shared_borrows -= 1;
        if let Some(n) = state.readers.get_mut(&me) {
            *n -= 1;
            if *n == 0 {
                state.readers.remove(&me);
            }
        }
        drop(state);
        self.cond.notify_all();
    }

    fn release_write(&self) {
        let mut state = self.lock_state();
        if let Some((_, depth)) = state.writer.as_mut() {
            *depth -= 1;
            if *depth == 0 {
                state.writer = None;
            }
        }
        drop(state);
        self.cond.notify_all();
    }
}

/// Shared access. Releases its read lock on drop.
pub struct ReadGuard<'a, T> {
    // Dropped before `_release`, so the data is free once the lock is.
    data: RwLockReadGuard<'a, T>,
    _release: ReadRelease<'a, T>,
}

struct ReadRelease<'a, T> {
    lock: &'a ReentrantRwLock<T>,
}

impl<T> Drop for ReadRelease<'_, T> {
    fn drop(&mut self) {
        self.lock.release_read();
    }
}

impl<T> Deref for ReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

/// Exclusive lock. Releases one level of write nesting on drop.
pub struct WriteGuard<'a, T> {
    lock: &'a ReentrantRwLock<T>,
    _thread_bound: PhantomData<*const ()>,
}

/// Resets the borrow flags when an access closure returns or unwinds.
struct BorrowReset<'a, T> {
    lock: &'a ReentrantRwLock<T>,
    exclusive: bool,
}

impl<T> Drop for BorrowReset<'_, T> {
    fn drop(&mut self) {
        let mut state = self.lock.lock_state();
        if self.exclusive {
            state.exclusive_borrow = false;
        } else {
            state.shared_borrows -= 1;
        }
    }
}

impl<T> WriteGuard<'_, T> {
    /// Runs `f` with shared access to the data.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R> {
        {
            let mut state = self.lock.lock_state();
            if state.exclusive_borrow {
                return Err(self.lock.violation("shared access inside with_mut"));
            }
            state.shared_borrows += 1;
        }
        let _reset = BorrowReset { lock: self.lock, exclusive: false };
        let data = self.lock.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(f(&data))
    }

    /// Runs `f` with exclusive access to the data. Fails while the calling
    /// thread holds a read guard or is already inside `with`/`with_mut`.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        {
            let mut state = self.lock.lock_state();
            if state.exclusive_borrow || state.shared_borrows > 0 {
                return Err(self.lock.violation("exclusive access while the data is borrowed"));
            }
            state.exclusive_borrow = true;
        }
        let _reset = BorrowReset { lock: self.lock, exclusive: true };
        let mut data = self.lock.data.write().unwrap_or_else(PoisonError::into_inner);
        Ok(f(&mut data))
    }
}

impl<T> Drop for WriteGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.release_write();
    }
}
