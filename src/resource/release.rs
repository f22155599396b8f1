//! The release capability and the adapters that provide it.

use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::fallible::attempt;
use crate::failure::Fallible;
use crate::resource::stack::settle;

/// A resource that must be released exactly once.
///
/// `release` consumes the resource, so a second release cannot compile.
/// A release failure is a real failure: [`ResourceChain`](crate::ResourceChain)
/// reports it, or attaches it to the failure already pending.
///
/// # Example
///
/// ```
/// use backstop::{Fallible, Release};
///
/// struct Connection {
///     open: bool,
/// }
///
/// impl Release for Connection {
///     fn release(mut self) -> Fallible {
///         self.open = false;
///         Ok(())
///     }
/// }
/// ```
pub trait Release {
    /// Give the resource back.
    fn release(self) -> Fallible;
}

/// Pairs release their second element first.
///
/// This is what makes the left-nested tuples built by
/// [`ResourceChain::and`](crate::ResourceChain::and) release in reverse
/// acquisition order. When both releases fail, the second element's failure
/// is the primary one and the first element's is suppressed under it.
impl<A, B> Release for (A, B)
where
    A: Release,
    B: Release,
{
    fn release(self) -> Fallible {
        let (first, second) = self;
        let released = attempt(|| second.release());
        settle(released, attempt(|| first.release()))
    }
}

/// A value paired with the closure that releases it.
///
/// Use this for types that do not implement [`Release`] themselves.
///
/// ```
/// use backstop::{Managed, ResourceChain};
///
/// let lines = ResourceChain::with(|| {
///     Ok(Managed::new(vec!["a", "b"], |v| {
///         assert_eq!(v.len(), 2);
///         Ok(())
///     }))
/// })
/// .apply(|lines| Ok(lines.len()));
///
/// assert_eq!(lines.get().unwrap(), 2);
/// ```
pub struct Managed<T, F = fn(T) -> Fallible> {
    value: T,
    release: F,
}

impl<T, F> Managed<T, F>
where
    F: FnOnce(T) -> Fallible,
{
    /// Pair `value` with its release closure.
    pub fn new(value: T, release: F) -> Self {
        Managed { value, release }
    }

    /// Borrow the managed value.
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Mutably borrow the managed value.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T> Managed<T> {
    /// Manage a value whose cleanup is its `Drop` implementation.
    pub fn dropping(value: T) -> Self {
        Managed {
            value,
            release: |value| {
                drop(value);
                Ok(())
            },
        }
    }
}

impl<T, F> Deref for Managed<T, F> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T, F> DerefMut for Managed<T, F> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T, F> Release for Managed<T, F>
where
    F: FnOnce(T) -> Fallible,
{
    fn release(self) -> Fallible {
        (self.release)(self.value)
    }
}

impl<T: fmt::Debug, F> fmt::Debug for Managed<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Managed")
            .field("value", &self.value)
            .field("release", &"<function>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::Failure;
    use std::cell::RefCell;

    #[test]
    fn pair_releases_second_then_first() {
        let order = RefCell::new(Vec::new());
        let pair = (
            Managed::new("first", |name| {
                order.borrow_mut().push(name);
                Ok(())
            }),
            Managed::new("second", |name| {
                order.borrow_mut().push(name);
                Ok(())
            }),
        );

        pair.release().unwrap();
        assert_eq!(*order.borrow(), vec!["second", "first"]);
    }

    #[test]
    fn pair_suppresses_first_failure_under_second() {
        let pair = (
            Managed::new((), |_| Err(Failure::msg("first"))),
            Managed::new((), |_| Err(Failure::msg("second"))),
        );

        let failure = pair.release().unwrap_err();
        assert_eq!(failure.to_string(), "second");
        assert_eq!(failure.suppressed().len(), 1);
        assert_eq!(failure.suppressed()[0].to_string(), "first");
    }

    #[test]
    fn pair_still_releases_first_after_second_panics() {
        let released = RefCell::new(false);
        let pair = (
            Managed::new((), |_| {
                *released.borrow_mut() = true;
                Ok(())
            }),
            Managed::new((), |_| panic!("second release")),
        );

        let failure = pair.release().unwrap_err();
        assert!(*released.borrow());
        assert_eq!(failure.kind(), crate::FailureKind::Panic);
    }

    #[test]
    fn managed_derefs_to_value() {
        let mut managed = Managed::dropping(vec![1, 2]);
        managed.push(3);
        assert_eq!(managed.get(), &vec![1, 2, 3]);
        assert_eq!(managed.len(), 3);
        managed.release().unwrap();
    }
}
