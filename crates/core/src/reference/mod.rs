//! Lazily computed values shared by the catalogue and its users.
//!
//! [`Lazy`] runs its producer at most once and caches whatever it returned,
//! including an absent value when `T` is an `Option`. Single-assignment slots
//! use [`once_cell::unsync::OnceCell`] directly.

use std::fmt;

use once_cell::unsync::Lazy as Cached;

/// Lazily computed value whose producer runs at most once, on first access.
///
/// A producer returning `None` is cached like any other result: the cell is
/// filled with `None` and never asks the producer again.
pub struct Lazy<T, F = Box<dyn FnOnce() -> T>> {
    inner: Cached<T, F>,
}

impl<T, F: FnOnce() -> T> Lazy<T, F> {
    pub fn new(producer: F) -> Self {
        Self {
            inner: Cached::new(producer),
        }
    }

    /// Returns `true` once the producer has run (or the value was supplied up front).
    pub fn is_set(&self) -> bool {
        Cached::get(&self.inner).is_some()
    }

    /// Returns the cached value without running the producer.
    pub fn peek(&self) -> Option<&T> {
        Cached::get(&self.inner)
    }

    pub fn get(&self) -> &T {
        Cached::force(&self.inner)
    }

    pub fn get_mut(&mut self) -> &mut T {
        Cached::force_mut(&mut self.inner)
    }

    pub fn into_inner(self) -> T {
        match Cached::into_value(self.inner) {
            Ok(value) => value,
            Err(producer) => producer(),
        }
    }
}

impl<T: 'static> Lazy<T> {
    /// Creates an already computed reference.
    pub fn ready(value: T) -> Self {
        let lazy = Self::boxed(move || value);
        lazy.get();
        lazy
    }

    /// Boxes the producer so differently built references share one type.
    pub fn boxed(producer: impl FnOnce() -> T + 'static) -> Self {
        Self::new(Box::new(producer))
    }
}

impl<T: fmt::Debug, F: FnOnce() -> T> fmt::Debug for Lazy<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.peek() {
            Some(value) => f.debug_tuple("Lazy").field(value).finish(),
            None => f.write_str("Lazy(<unset>)"),
        }
    }
}
