//! Running fallible operations and moving failures across infallible interfaces.
//!
//! [`attempt`] is the capture point: it runs an operation and turns both a
//! returned error and a panic into a [`Failure`]. [`raise`] is the opposite
//! direction: it lets a failure escape through code whose signature has no
//! room for an error (an iterator adapter, a trait method returning `T`),
//! and the next [`attempt`] up the stack gets the very same failure back.
//!
//! # Example
//!
//! ```
//! use backstop::{attempt, unchecked, Fallible};
//!
//! fn parse(input: &str) -> Fallible<i32> {
//!     Ok(input.trim().parse::<i32>()?)
//! }
//!
//! let total = attempt(|| Ok(["1", "2", "3"].into_iter().map(unchecked(parse)).sum::<i32>()));
//! assert_eq!(total.unwrap(), 6);
//!
//! let broken = attempt(|| Ok(["1", "x"].into_iter().map(unchecked(parse)).sum::<i32>()));
//! assert!(broken.unwrap_err().is::<std::num::ParseIntError>());
//! ```

use std::panic::{self, AssertUnwindSafe};

use crate::failure::{Failure, Fallible};

/// Run `op`, converting a panic into a [`Failure`].
///
/// A panic raised through [`raise`] comes back as the original failure.
pub fn attempt<T, F>(op: F) -> Fallible<T>
where
    F: FnOnce() -> Fallible<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(op)) {
        Ok(result) => result,
        Err(payload) => Err(Failure::from_panic(payload)),
    }
}

/// Propagate `failure` without a `Result` in the signature.
///
/// Unwinds with the failure itself as payload and without running the panic
/// hook; [`attempt`] (and therefore every `Outcome` constructor) restores it.
pub fn raise(failure: Failure) -> ! {
    panic::resume_unwind(Box::new(failure))
}

/// Adapt a fallible one-argument function to an infallible signature.
///
/// A failure propagates through [`raise`].
pub fn unchecked<A, T, F>(f: F) -> impl Fn(A) -> T
where
    F: Fn(A) -> Fallible<T>,
{
    move |a| match f(a) {
        Ok(value) => value,
        Err(failure) => raise(failure),
    }
}

/// Two-argument form of [`unchecked`].
pub fn unchecked2<A, B, T, F>(f: F) -> impl Fn(A, B) -> T
where
    F: Fn(A, B) -> Fallible<T>,
{
    move |a, b| match f(a, b) {
        Ok(value) => value,
        Err(failure) => raise(failure),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::{FailureKind, PanicError};

    #[test]
    fn attempt_passes_results_through() {
        assert_eq!(attempt(|| Ok(5)).unwrap(), 5);

        let failure = attempt::<i32, _>(|| Err(Failure::msg("nope"))).unwrap_err();
        assert_eq!(failure.to_string(), "nope");
    }

    #[test]
    fn attempt_captures_panics() {
        let failure = attempt::<(), _>(|| panic!("exploded")).unwrap_err();
        assert_eq!(failure.kind(), FailureKind::Panic);
        assert_eq!(
            failure.downcast_ref::<PanicError>().map(PanicError::message),
            Some("exploded")
        );
    }

    #[test]
    fn raise_keeps_failure_identity() {
        let failure = attempt::<(), _>(|| raise(Failure::fatal(std::fmt::Error))).unwrap_err();
        assert_eq!(failure.kind(), FailureKind::Fatal);
        assert!(failure.is::<std::fmt::Error>());
    }

    #[test]
    fn unchecked2_raises_original_failure() {
        let divide = unchecked2(|a: i32, b: i32| {
            if b == 0 {
                Err(Failure::msg("division by zero"))
            } else {
                Ok(a / b)
            }
        });

        assert_eq!(divide(10, 2), 5);
        let failure = attempt(|| Ok(divide(1, 0))).unwrap_err();
        assert_eq!(failure.to_string(), "division by zero");
    }
}
