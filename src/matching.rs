//! Value classification by ordered rules.
//!
//! [`when`] starts a list of `(predicate, producer)` rules over one value.
//! Rules are tested in the order they were added and the first match wins.
//! When no rule matches, the terminals report it explicitly: `None` from
//! [`to_option`](When::to_option), a [`NoMatch`] failure from
//! [`get`](When::get), or a caller-supplied default.
//!
//! # Example
//!
//! ```
//! use backstop::when;
//!
//! let status = |code: u16| {
//!     when(code)
//!         .is(200, "ok")
//!         .is(404, "missing")
//!         .matches(|c| *c >= 500, |_| Ok("server error"))
//!         .unwrap_or("unknown")
//! };
//!
//! assert_eq!(status(404).unwrap(), "missing");
//! assert_eq!(status(503).unwrap(), "server error");
//! assert_eq!(status(302).unwrap(), "unknown");
//! ```

use std::error::Error as StdError;
use std::fmt;

use crate::failure::{Failure, Fallible};

type Predicate<'a, V> = Box<dyn Fn(&V) -> bool + 'a>;
type Producer<'a, V, R> = Box<dyn FnOnce(&V) -> Fallible<R> + 'a>;

/// No rule matched the value.
///
/// Distinct from any failure raised by a producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoMatch;

impl fmt::Display for NoMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("no rule matched")
    }
}

impl StdError for NoMatch {}

/// An ordered list of rules over one value.
pub struct When<'a, V, R> {
    value: V,
    rules: Vec<(Predicate<'a, V>, Producer<'a, V, R>)>,
}

/// Start classifying `value`.
pub fn when<'a, V, R>(value: V) -> When<'a, V, R> {
    When {
        value,
        rules: Vec::new(),
    }
}

impl<'a, V, R> When<'a, V, R>
where
    V: 'a,
    R: 'a,
{
    /// Produce `result` when the value equals `expected`.
    pub fn is(self, expected: V, result: R) -> Self
    where
        V: PartialEq,
    {
        self.is_with(expected, move || Ok(result))
    }

    /// Run `producer` when the value equals `expected`.
    pub fn is_with<F>(self, expected: V, producer: F) -> Self
    where
        V: PartialEq,
        F: FnOnce() -> Fallible<R> + 'a,
    {
        self.matches(move |value| *value == expected, move |_| producer())
    }

    /// Run `producer` on the value when `predicate` accepts it.
    pub fn matches<P, F>(mut self, predicate: P, producer: F) -> Self
    where
        P: Fn(&V) -> bool + 'a,
        F: FnOnce(&V) -> Fallible<R> + 'a,
    {
        self.rules.push((Box::new(predicate), Box::new(producer)));
        self
    }

    /// The first matching rule's result, or `None` if nothing matched.
    ///
    /// A producer failure is returned as is.
    pub fn to_option(self) -> Fallible<Option<R>> {
        let When { value, rules } = self;
        for (predicate, producer) in rules {
            if predicate(&value) {
                return producer(&value).map(Some);
            }
        }
        Ok(None)
    }

    /// The first matching rule's result, or a [`NoMatch`] failure.
    ///
    /// ```
    /// use backstop::{when, NoMatch};
    ///
    /// let failure = when::<_, &str>('x').is('a', "A").get().unwrap_err();
    /// assert!(failure.is::<NoMatch>());
    /// ```
    pub fn get(self) -> Fallible<R> {
        self.or_else_raise(|| Failure::new(NoMatch))
    }

    /// The first matching rule's result, or `default`.
    pub fn unwrap_or(self, default: R) -> Fallible<R> {
        Ok(self.to_option()?.unwrap_or(default))
    }

    /// The first matching rule's result, or the result of `default`.
    pub fn unwrap_or_else<F>(self, default: F) -> Fallible<R>
    where
        F: FnOnce() -> Fallible<R>,
    {
        match self.to_option()? {
            Some(result) => Ok(result),
            None => default(),
        }
    }

    /// The first matching rule's result, or the failure built by `error`.
    pub fn or_else_raise<F>(self, error: F) -> Fallible<R>
    where
        F: FnOnce() -> Failure,
    {
        let rules = self.rules.len();
        match self.to_option()? {
            Some(result) => Ok(result),
            None => {
                tracing::debug!(rules, "no rule matched");
                Err(error())
            }
        }
    }
}

impl<V: fmt::Debug, R> fmt::Debug for When<'_, V, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("When")
            .field("value", &self.value)
            .field("rules", &self.rules.len())
            .finish()
    }
}
