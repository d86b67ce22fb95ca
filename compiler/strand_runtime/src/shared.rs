//! Thread-safe shared state wrapper.

use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared mutable state: `Arc<RwLock<T>>` behind a newtype.
///
/// Clones share the same underlying value.
pub struct SharedMutable<T>(Arc<RwLock<T>>);

impl<T> SharedMutable<T> {
    pub fn new(value: T) -> Self {
        SharedMutable(Arc::new(RwLock::new(value)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.0.write()
    }

    /// Whether two handles share the same value.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Clone for SharedMutable<T> {
    fn clone(&self) -> Self {
        SharedMutable(Arc::clone(&self.0))
    }
}

impl<T: Default> Default for SharedMutable<T> {
    fn default() -> Self {
        SharedMutable::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for SharedMutable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedMutable({:?})", &*self.0.read())
    }
}
