//! Locking for resources shared between canvases.

mod rwlock;

pub use rwlock::{ReadGuard, ReentrantRwLock, WriteGuard};
