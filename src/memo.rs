//! Caching the successful results of fallible functions.
//!
//! [`memoize`] wraps a function of one argument in a [`Memoized`] handle that
//! remembers every value it computed, keyed by the argument. Failures are
//! never cached, so a failed call is retried the next time.
//!
//! The cache sits behind a single mutex that is held while a missing value is
//! computed. Concurrent callers, whatever their key, wait for that
//! computation to finish before they look at the cache. A function is
//! therefore never computed twice for the same key, at the price of
//! serializing unrelated keys. For the same reason the function must not
//! call its own [`Memoized`] handle: that call would wait on itself.
//!
//! # Example
//!
//! ```
//! use backstop::memoize;
//! use std::cell::Cell;
//!
//! let calls = Cell::new(0);
//! let square = memoize(|n: &u64| {
//!     calls.set(calls.get() + 1);
//!     Ok(n * n)
//! });
//!
//! assert_eq!(square.call(12).unwrap(), 144);
//! assert_eq!(square.call(12).unwrap(), 144);
//! assert_eq!(calls.get(), 1);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::fallible::attempt;
use crate::failure::Fallible;

/// A function together with the cache of its successful results.
pub struct Memoized<K, V, F> {
    function: F,
    cache: Mutex<HashMap<K, V>>,
}

/// Memoize a one-argument function.
pub fn memoize<K, V, F>(function: F) -> Memoized<K, V, F>
where
    K: Eq + Hash,
    V: Clone,
    F: Fn(&K) -> Fallible<V>,
{
    Memoized {
        function,
        cache: Mutex::new(HashMap::new()),
    }
}

/// Memoize a two-argument function; the cache key is the argument pair.
///
/// ```
/// use backstop::memo::memoize2;
///
/// let join = memoize2(|a: &String, b: &u8| Ok(format!("{}{}", a, b)));
/// assert_eq!(join.call(("x".to_string(), 1)).unwrap(), "x1");
/// assert_eq!(join.len(), 1);
/// ```
pub fn memoize2<A, B, V, F>(
    function: F,
) -> Memoized<(A, B), V, impl Fn(&(A, B)) -> Fallible<V>>
where
    A: Eq + Hash,
    B: Eq + Hash,
    V: Clone,
    F: Fn(&A, &B) -> Fallible<V>,
{
    memoize(move |(a, b): &(A, B)| function(a, b))
}

/// Memoize a supplier: it is computed at most once successfully.
///
/// ```
/// use backstop::memo::singleton;
///
/// let config = singleton(|| Ok(String::from("loaded")));
/// assert_eq!(config.get().unwrap(), "loaded");
/// ```
pub fn singleton<V, F>(function: F) -> Memoized<(), V, impl Fn(&()) -> Fallible<V>>
where
    V: Clone,
    F: Fn() -> Fallible<V>,
{
    memoize(move |_: &()| function())
}

impl<K, V, F> Memoized<K, V, F>
where
    K: Eq + Hash,
    V: Clone,
    F: Fn(&K) -> Fallible<V>,
{
    /// The cached value for `key`, computing and storing it on a miss.
    ///
    /// A failure (or panic) of the function is returned and nothing is
    /// stored.
    pub fn call(&self, key: K) -> Fallible<V> {
        let mut cache = self.lock();
        if let Some(value) = cache.get(&key) {
            tracing::trace!(size = cache.len(), "memo cache hit");
            return Ok(value.clone());
        }
        tracing::trace!(size = cache.len(), "memo cache miss");
        let value = attempt(|| (self.function)(&key))?;
        cache.insert(key, value.clone());
        Ok(value)
    }

    /// Memoizing an already memoized function returns it unchanged.
    pub fn memoize(self) -> Self {
        self
    }
}

impl<K, V, F> Memoized<K, V, F>
where
    K: Eq + Hash,
{
    /// Number of cached values.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop the cached value for `key`, returning it.
    pub fn forget(&self, key: &K) -> Option<V> {
        self.lock().remove(key)
    }

    /// Drop every cached value.
    pub fn clear(&self) {
        self.lock().clear();
    }

    // A panic while the lock was held cannot leave a half-written entry.
    fn lock(&self) -> MutexGuard<'_, HashMap<K, V>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V, F> Memoized<(), V, F>
where
    V: Clone,
    F: Fn(&()) -> Fallible<V>,
{
    /// The value of a memoized supplier.
    pub fn get(&self) -> Fallible<V> {
        self.call(())
    }
}

impl<K, V, F> fmt::Debug for Memoized<K, V, F>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized")
            .field("function", &"<function>")
            .field("cached", &self.len())
            .finish()
    }
}
