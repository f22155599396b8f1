//! The outcome of a fallible computation.
//!
//! [`Outcome`] is a two-variant value: `Succeeded(value)` or
//! `Failed(failure)`. It is created by running an operation with
//! [`Outcome::apply`] or [`Outcome::run`], which capture every failure the
//! operation produces (returned errors and panics alike), and it is never
//! mutated afterwards: every combinator consumes the outcome and returns a new
//! one.
//!
//! Nothing in this module raises a failure on its own. A failure only leaves
//! an outcome through the surfacing methods ([`get`](Outcome::get),
//! [`check`](Outcome::check), [`or_else_raise`](Outcome::or_else_raise)) or
//! when a recovery combinator meets a fatal failure, which it re-raises rather
//! than handling.
//!
//! # Example
//!
//! ```
//! use backstop::Outcome;
//!
//! let port = Outcome::apply(|| Ok("80x".parse::<u16>()?))
//!     .recover_from(|_: std::num::ParseIntError| Ok(8080))
//!     .map(|port| port + 1);
//!
//! assert_eq!(port.get().unwrap(), 8081);
//! ```
//!
//! Recovery, defaulting and cause wrapping live in a separate impl block
//! (`outcome/recover.rs`) because they share the fatal-failure policy.

mod recover;


use crate::fallible::attempt;
use crate::failure::{Failure, Fallible};

/// Success or failure of a computation.
///
/// Exactly one variant is populated. A `Failed` outcome that is dropped
/// without being inspected loses its failure, hence `#[must_use]`.
#[must_use = "a failed outcome is lost unless it is inspected or surfaced"]
#[derive(Debug)]
pub enum Outcome<V> {
    /// The computation produced a value.
    Succeeded(V),
    /// The computation failed.
    Failed(Failure),
}

impl<V> Outcome<V> {
    /// A succeeded outcome.
    #[inline]
    pub fn success(value: V) -> Self {
        Outcome::Succeeded(value)
    }

    /// A failed outcome.
    #[inline]
    pub fn failure(failure: impl Into<Failure>) -> Self {
        Outcome::Failed(failure.into())
    }

    /// Run `op` and capture its result.
    ///
    /// Returned errors and panics both become `Failed`, including fatal
    /// failures; only the recovery combinators treat those specially.
    ///
    /// # Example
    ///
    /// ```
    /// use backstop::Outcome;
    ///
    /// let ok = Outcome::apply(|| Ok("OK"));
    /// assert!(ok.is_success());
    ///
    /// let failed = Outcome::apply(|| Ok(std::fs::read_to_string("/definitely/missing")?));
    /// assert!(failed.is_failure());
    /// ```
    pub fn apply<F>(op: F) -> Self
    where
        F: FnOnce() -> Fallible<V>,
    {
        attempt(op).into()
    }

    /// Returns `true` for `Succeeded`.
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded(_))
    }

    /// Returns `true` for `Failed`.
    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    /// Borrow the value of a succeeded outcome.
    pub fn value(&self) -> Option<&V> {
        match self {
            Outcome::Succeeded(value) => Some(value),
            Outcome::Failed(_) => None,
        }
    }

    /// Borrow the failure of a failed outcome.
    pub fn cause(&self) -> Option<&Failure> {
        match self {
            Outcome::Succeeded(_) => None,
            Outcome::Failed(failure) => Some(failure),
        }
    }

    /// Consume the outcome and return its failure, if any.
    pub fn into_cause(self) -> Option<Failure> {
        match self {
            Outcome::Succeeded(_) => None,
            Outcome::Failed(failure) => Some(failure),
        }
    }

    /// Surface the outcome: the value, or the failure as an error.
    ///
    /// ```
    /// use backstop::{Fallible, Outcome};
    ///
    /// fn load() -> Fallible<u16> {
    ///     let port = Outcome::apply(|| Ok("8080".parse::<u16>()?)).get()?;
    ///     Ok(port)
    /// }
    /// assert_eq!(load().unwrap(), 8080);
    /// ```
    pub fn get(self) -> Fallible<V> {
        self.into()
    }

    /// Surface the failure only, discarding a successful value.
    pub fn check(self) -> Fallible<()> {
        match self {
            Outcome::Succeeded(_) => Ok(()),
            Outcome::Failed(failure) => Err(failure),
        }
    }

    /// Surface the outcome, replacing the failure with `mapper(failure)`.
    pub fn or_else_raise<F>(self, mapper: F) -> Fallible<V>
    where
        F: FnOnce(Failure) -> Failure,
    {
        match self {
            Outcome::Succeeded(value) => Ok(value),
            Outcome::Failed(failure) => Err(mapper(failure)),
        }
    }

    /// The value, or `None` if the outcome failed.
    pub fn ok(self) -> Option<V> {
        match self {
            Outcome::Succeeded(value) => Some(value),
            Outcome::Failed(_) => None,
        }
    }

    /// Collapse both variants into one value.
    pub fn fold<T, S, F>(self, on_success: S, on_failure: F) -> T
    where
        S: FnOnce(V) -> T,
        F: FnOnce(Failure) -> T,
    {
        match self {
            Outcome::Succeeded(value) => on_success(value),
            Outcome::Failed(failure) => on_failure(failure),
        }
    }

    /// Transform the value of a succeeded outcome.
    ///
    /// A panic inside `f` turns the result into `Failed` with that panic as
    /// the cause. A failed outcome passes through without calling `f`.
    pub fn map<T, F>(self, f: F) -> Outcome<T>
    where
        F: FnOnce(V) -> T,
    {
        self.try_map(|value| Ok(f(value)))
    }

    /// Transform the value with a fallible function.
    ///
    /// ```
    /// use backstop::Outcome;
    ///
    /// let parsed = Outcome::success("42").try_map(|s| Ok(s.parse::<i32>()?));
    /// assert_eq!(parsed.get().unwrap(), 42);
    ///
    /// let broken = Outcome::success("4x2").try_map(|s| Ok(s.parse::<i32>()?));
    /// assert!(broken.cause().unwrap().is::<std::num::ParseIntError>());
    /// ```
    pub fn try_map<T, F>(self, f: F) -> Outcome<T>
    where
        F: FnOnce(V) -> Fallible<T>,
    {
        match self {
            Outcome::Succeeded(value) => Outcome::apply(|| f(value)),
            Outcome::Failed(failure) => Outcome::Failed(failure),
        }
    }

    /// Chain a computation that itself produces an outcome (`flatMap`).
    pub fn and_then<T, F>(self, f: F) -> Outcome<T>
    where
        F: FnOnce(V) -> Outcome<T>,
    {
        self.try_map(|value| f(value).get())
    }

    /// Observe the value of a succeeded outcome.
    ///
    /// The outcome passes through unchanged. A panic in `action` propagates
    /// to the caller.
    pub fn on_success<F>(self, action: F) -> Self
    where
        F: FnOnce(&V),
    {
        if let Outcome::Succeeded(value) = &self {
            action(value);
        }
        self
    }

    /// Observe the failure of a failed outcome.
    ///
    /// The outcome passes through unchanged. A panic in `action` propagates
    /// to the caller.
    pub fn on_failure<F>(self, action: F) -> Self
    where
        F: FnOnce(&Failure),
    {
        if let Outcome::Failed(failure) = &self {
            action(failure);
        }
        self
    }

    /// Always run `action` with `(Some(value), None)` or `(None, Some(failure))`.
    ///
    /// Unlike the other observers, a failure of `action` (returned or
    /// panicked) replaces the outcome with a new `Failed`.
    ///
    /// ```
    /// use backstop::{Failure, Outcome};
    ///
    /// let outcome = Outcome::success(1).on_complete(|value, failure| {
    ///     assert_eq!(value, Some(&1));
    ///     assert!(failure.is_none());
    ///     Err(Failure::msg("audit log unavailable"))
    /// });
    /// assert_eq!(outcome.cause().unwrap().to_string(), "audit log unavailable");
    /// ```
    pub fn on_complete<F>(self, action: F) -> Self
    where
        F: FnOnce(Option<&V>, Option<&Failure>) -> Fallible,
    {
        match attempt(|| action(self.value(), self.cause())) {
            Ok(()) => self,
            Err(failure) => Outcome::Failed(failure),
        }
    }

    /// Always run `action`, like a `finally` block.
    ///
    /// A failure of `action` replaces the outcome with a new `Failed`.
    pub fn finally<F>(self, action: F) -> Self
    where
        F: FnOnce() -> Fallible,
    {
        self.on_complete(|_, _| action())
    }
}

impl Outcome<()> {
    /// Run a side-effecting operation and capture its failure.
    ///
    /// ```
    /// use backstop::Outcome;
    ///
    /// let outcome = Outcome::run(|| {
    ///     std::fs::remove_file("/definitely/missing/file")?;
    ///     Ok(())
    /// });
    /// assert!(outcome.is_failure());
    /// ```
    pub fn run<F>(op: F) -> Self
    where
        F: FnOnce() -> Fallible,
    {
        Outcome::apply(op)
    }
}

impl<V, E> From<Result<V, E>> for Outcome<V>
where
    E: Into<Failure>,
{
    fn from(result: Result<V, E>) -> Self {
        match result {
            Ok(value) => Outcome::Succeeded(value),
            Err(error) => Outcome::Failed(error.into()),
        }
    }
}

impl<V> From<Outcome<V>> for Result<V, Failure> {
    fn from(outcome: Outcome<V>) -> Self {
        match outcome {
            Outcome::Succeeded(value) => Ok(value),
            Outcome::Failed(failure) => Err(failure),
        }
    }
}
