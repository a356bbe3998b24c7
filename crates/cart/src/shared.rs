//! Shared cart handle for concurrent callers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use kebab_core::CartLine;
use rust_decimal::Decimal;

use crate::store::CartStore;

/// Cloneable handle to one [`CartStore`].
///
/// Each mutation holds the lock for the whole apply-then-persist step, so
/// mutations from different tasks are applied one at a time in lock order and
/// none is lost. The lock is never held across an `.await`.
#[derive(Debug, Clone)]
pub struct SharedCart {
    inner: Arc<Mutex<CartStore>>,
}

impl SharedCart {
    /// Wrap a store.
    #[must_use]
    pub fn new(store: CartStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CartStore> {
        // Cart operations never leave the store half-updated, so a poisoned
        // lock still guards a consistent cart.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// See [`CartStore::add`].
    pub fn add(&self, line: CartLine) {
        self.lock().add(line);
    }

    /// See [`CartStore::increment`].
    pub fn increment(&self, id: &str) {
        self.lock().increment(id);
    }

    /// See [`CartStore::decrement`].
    pub fn decrement(&self, id: &str) {
        self.lock().decrement(id);
    }

    /// See [`CartStore::remove`].
    pub fn remove(&self, id: &str) {
        self.lock().remove(id);
    }

    /// See [`CartStore::clear`].
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Run a read-only closure against a consistent view of the cart.
    pub fn read<T>(&self, f: impl FnOnce(&CartStore) -> T) -> T {
        f(&self.lock())
    }

    /// Copy of the current lines.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CartLine> {
        self.lock().snapshot()
    }

    /// Total number of units.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lock().item_count()
    }

    /// Order total including delivery.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lock().total()
    }
}

impl From<CartStore> for SharedCart {
    fn from(store: CartStore) -> Self {
        Self::new(store)
    }
}
