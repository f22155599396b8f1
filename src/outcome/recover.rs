//! Recovery, defaulting and cause wrapping.
//!
//! All of these act on `Failed` only and share one rule: a fatal failure is
//! never handled. It is logged and re-raised through [`raise`] before any
//! caller-supplied recovery, default or wrapping logic runs.

use std::error::Error as StdError;

use super::Outcome;
use crate::fallible::raise;
use crate::failure::{Failure, Fallible};

/// Re-raise `failure` if it belongs to the fatal class, otherwise hand it back.
fn escalate_fatal(failure: Failure) -> Failure {
    if failure.is_fatal() {
        tracing::error!(
            kind = %failure.kind(),
            "fatal failure bypasses recovery: {:#}",
            failure
        );
        raise(failure);
    }
    failure
}

impl<V> Outcome<V> {
    /// Recover from any failure.
    ///
    /// Equivalent to `recover_if(|_| true, f)`. If `f` fails, the result is a
    /// new `Failed` carrying that failure.
    ///
    /// # Panics
    ///
    /// Re-raises fatal failures instead of calling `f`.
    ///
    /// ```
    /// use backstop::{Failure, Outcome};
    ///
    /// let outcome = Outcome::<String>::failure(Failure::msg("intentional"))
    ///     .recover(|_| Ok("x".to_string()));
    /// assert_eq!(outcome.get().unwrap(), "x");
    /// ```
    pub fn recover<F>(self, f: F) -> Self
    where
        F: FnOnce(Failure) -> Fallible<V>,
    {
        self.recover_if(|_| true, f)
    }

    /// Recover from failures accepted by `predicate`.
    ///
    /// A failure the predicate rejects passes through unchanged.
    ///
    /// # Panics
    ///
    /// Re-raises fatal failures instead of calling `predicate` or `f`.
    pub fn recover_if<P, F>(self, predicate: P, f: F) -> Self
    where
        P: FnOnce(&Failure) -> bool,
        F: FnOnce(Failure) -> Fallible<V>,
    {
        self.recover_with_if(predicate, |failure| Outcome::apply(|| f(failure)))
    }

    /// Recover from failures whose error is of type `X`.
    ///
    /// `f` receives the error by value.
    ///
    /// # Panics
    ///
    /// Re-raises fatal failures, whatever their error type.
    ///
    /// ```
    /// use backstop::Outcome;
    /// use std::num::ParseIntError;
    ///
    /// let outcome = Outcome::apply(|| Ok("abc".parse::<i32>()?))
    ///     .recover_from(|_: ParseIntError| Ok(0));
    /// assert_eq!(outcome.get().unwrap(), 0);
    /// ```
    pub fn recover_from<X, F>(self, f: F) -> Self
    where
        X: StdError + 'static,
        F: FnOnce(X) -> Fallible<V>,
    {
        self.recover_with_from(|error: X| Outcome::apply(|| f(error)))
    }

    /// Recover from any failure with a computation producing an outcome.
    ///
    /// # Panics
    ///
    /// Re-raises fatal failures instead of calling `f`.
    pub fn recover_with<F>(self, f: F) -> Self
    where
        F: FnOnce(Failure) -> Outcome<V>,
    {
        self.recover_with_if(|_| true, f)
    }

    /// Recover from failures accepted by `predicate` with a computation
    /// producing an outcome.
    ///
    /// A panic in `predicate` or `f` becomes the cause of a new `Failed`.
    ///
    /// # Panics
    ///
    /// Re-raises fatal failures instead of calling `predicate` or `f`.
    pub fn recover_with_if<P, F>(self, predicate: P, f: F) -> Self
    where
        P: FnOnce(&Failure) -> bool,
        F: FnOnce(Failure) -> Outcome<V>,
    {
        match self {
            Outcome::Succeeded(value) => Outcome::Succeeded(value),
            Outcome::Failed(failure) => {
                let failure = escalate_fatal(failure);
                Outcome::apply(move || {
                    if predicate(&failure) {
                        f(failure).get()
                    } else {
                        Err(failure)
                    }
                })
            }
        }
    }

    /// Recover from failures whose error is of type `X` with a computation
    /// producing an outcome.
    ///
    /// # Panics
    ///
    /// Re-raises fatal failures, whatever their error type.
    pub fn recover_with_from<X, F>(self, f: F) -> Self
    where
        X: StdError + 'static,
        F: FnOnce(X) -> Outcome<V>,
    {
        match self {
            Outcome::Succeeded(value) => Outcome::Succeeded(value),
            Outcome::Failed(failure) => match escalate_fatal(failure).downcast::<X>() {
                Ok(error) => Outcome::apply(|| f(error).get()),
                Err(failure) => Outcome::Failed(failure),
            },
        }
    }

    /// The value, or `default` if the outcome failed.
    ///
    /// # Panics
    ///
    /// Re-raises a fatal failure instead of returning `default`.
    pub fn unwrap_or(self, default: V) -> V {
        match self {
            Outcome::Succeeded(value) => value,
            Outcome::Failed(failure) => {
                escalate_fatal(failure);
                default
            }
        }
    }

    /// The value, or the result of `default` if the outcome failed.
    ///
    /// `default` is only evaluated for a failed outcome.
    ///
    /// # Panics
    ///
    /// Re-raises a fatal failure instead of calling `default`.
    pub fn unwrap_or_else<F>(self, default: F) -> V
    where
        F: FnOnce() -> V,
    {
        match self {
            Outcome::Succeeded(value) => value,
            Outcome::Failed(failure) => {
                escalate_fatal(failure);
                default()
            }
        }
    }

    /// Replace the failure with `mapper(failure)`.
    ///
    /// # Panics
    ///
    /// Re-raises fatal failures instead of calling `mapper`.
    pub fn wrap_cause<F>(self, mapper: F) -> Self
    where
        F: FnOnce(Failure) -> Failure,
    {
        self.wrap_cause_if(|_| true, mapper)
    }

    /// Replace the failure with `mapper(failure)` when `predicate` accepts it.
    ///
    /// A panic in `predicate` or `mapper` becomes the cause of a new `Failed`.
    ///
    /// # Panics
    ///
    /// Re-raises fatal failures instead of calling `predicate` or `mapper`.
    ///
    /// ```
    /// use backstop::{Failure, Outcome};
    ///
    /// let outcome = Outcome::<()>::apply(|| Ok(std::fs::remove_file("/no/such/file")?))
    ///     .wrap_cause_if(
    ///         |f| f.is::<std::io::Error>(),
    ///         |f| Failure::msg("cleanup failed").caused_by(f),
    ///     );
    /// assert_eq!(outcome.cause().unwrap().to_string(), "cleanup failed");
    /// ```
    pub fn wrap_cause_if<P, F>(self, predicate: P, mapper: F) -> Self
    where
        P: FnOnce(&Failure) -> bool,
        F: FnOnce(Failure) -> Failure,
    {
        match self {
            Outcome::Succeeded(value) => Outcome::Succeeded(value),
            Outcome::Failed(failure) => {
                let failure = escalate_fatal(failure);
                Outcome::apply(move || {
                    if predicate(&failure) {
                        Err(mapper(failure))
                    } else {
                        Err(failure)
                    }
                })
            }
        }
    }

    /// Replace the failure with the one it wraps, when `predicate` accepts it.
    ///
    /// Exactly one layer is removed, and only when the outer failure matches
    /// and has a cause; otherwise the outcome passes through unchanged. Fatal
    /// failures are not re-raised here.
    pub fn unwrap_cause_if<P>(self, predicate: P) -> Self
    where
        P: FnOnce(&Failure) -> bool,
    {
        match self {
            Outcome::Succeeded(value) => Outcome::Succeeded(value),
            Outcome::Failed(failure) => Outcome::apply(move || {
                if failure.cause().is_some() && predicate(&failure) {
                    match failure.peel() {
                        Ok(inner) | Err(inner) => Err(inner),
                    }
                } else {
                    Err(failure)
                }
            }),
        }
    }

    /// Strip one wrapper layer whose error is of type `W`.
    ///
    /// ```
    /// use backstop::{Failure, Outcome};
    ///
    /// #[derive(Debug)]
    /// struct Invocation;
    /// impl std::fmt::Display for Invocation {
    ///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    ///         f.write_str("invocation failed")
    ///     }
    /// }
    /// impl std::error::Error for Invocation {}
    ///
    /// let outcome = Outcome::<()>::failure(Failure::new(Invocation).caused_by(Failure::msg("bad argument")))
    ///     .unwrap_cause::<Invocation>();
    /// assert_eq!(outcome.cause().unwrap().to_string(), "bad argument");
    /// ```
    pub fn unwrap_cause<W>(self) -> Self
    where
        W: StdError + 'static,
    {
        self.unwrap_cause_if(|failure| failure.is::<W>())
    }
}
