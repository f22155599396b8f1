//! Testing utilities for code built on backstop.
//!
//! This module provides assertion macros for [`Outcome`](crate::Outcome)
//! values, instrumented resources that record when they are released, and
//! `proptest` strategies (behind the `proptest` feature).
//!
//! # Examples
//!
//! ## Assertion Macros
//!
//! ```rust
//! use backstop::{assert_failed, assert_succeeded, Outcome};
//!
//! assert_succeeded!(Outcome::apply(|| Ok(42)), 42);
//! assert_failed!(Outcome::<i32>::apply(|| Ok("x".parse::<i32>()?)));
//! ```
//!
//! ## Release Probes
//!
//! ```rust
//! use backstop::testing::ReleaseLog;
//! use backstop::ResourceChain;
//!
//! let log = ReleaseLog::new();
//! let outcome = ResourceChain::of(log.probe("conn"))
//!     .map({
//!         let log = log.clone();
//!         move |_| Ok(log.probe("stmt"))
//!     })
//!     .run(|_| Ok(()));
//!
//! assert!(outcome.is_success());
//! assert_eq!(log.released(), vec!["stmt", "conn"]);
//! assert_eq!(log.open(), 0);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::failure::{Failure, Fallible};
use crate::resource::Release;

/// Shared record of released [`Probe`]s.
///
/// Clones share the same record, so a log can be moved into factories and
/// mappers and inspected afterwards.
#[derive(Debug, Clone, Default)]
pub struct ReleaseLog {
    released: Arc<Mutex<Vec<String>>>,
    open: Arc<AtomicUsize>,
}

impl ReleaseLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// A new open resource that records its release here.
    pub fn probe(&self, name: impl Into<String>) -> Probe {
        self.open.fetch_add(1, Ordering::SeqCst);
        Probe {
            name: name.into(),
            log: self.clone(),
            failure: None,
        }
    }

    /// A probe whose release is recorded and then fails with `message`.
    pub fn failing_probe(&self, name: impl Into<String>, message: impl Into<String>) -> Probe {
        Probe {
            failure: Some(message.into()),
            ..self.probe(name)
        }
    }

    /// Names of released probes, in release order.
    pub fn released(&self) -> Vec<String> {
        self.released
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of probes created but not yet released.
    pub fn open(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

/// An instrumented resource created by [`ReleaseLog::probe`].
#[derive(Debug)]
pub struct Probe {
    name: String,
    log: ReleaseLog,
    failure: Option<String>,
}

impl Probe {
    /// The name the probe was created with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A new probe on the same log, for dependent resources.
    pub fn derive(&self, name: impl Into<String>) -> Probe {
        self.log.probe(name)
    }
}

impl Release for Probe {
    fn release(self) -> Fallible {
        self.log.open.fetch_sub(1, Ordering::SeqCst);
        self.log
            .released
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(self.name);
        match self.failure {
            Some(message) => Err(Failure::msg(message)),
            None => Ok(()),
        }
    }
}

/// Assert that an outcome succeeded, optionally with a given value.
///
/// This macro will panic if the outcome is `Failed`.
///
/// # Example
///
/// ```rust
/// use backstop::{assert_succeeded, Outcome};
///
/// assert_succeeded!(Outcome::success(1));
/// assert_succeeded!(Outcome::success("OK"), "OK");
/// ```
#[macro_export]
macro_rules! assert_succeeded {
    ($outcome:expr) => {
        match $outcome {
            $crate::Outcome::Succeeded(_) => {}
            $crate::Outcome::Failed(f) => {
                panic!("Expected Succeeded, got Failed: {:#}", f);
            }
        }
    };
    ($outcome:expr, $expected:expr) => {
        match $outcome {
            $crate::Outcome::Succeeded(v) => {
                assert_eq!(v, $expected);
            }
            $crate::Outcome::Failed(f) => {
                panic!("Expected Succeeded({:?}), got Failed: {:#}", $expected, f);
            }
        }
    };
}

/// Assert that an outcome failed.
///
/// This macro will panic if the outcome is `Succeeded`.
///
/// # Example
///
/// ```rust
/// use backstop::{assert_failed, Failure, Outcome};
///
/// assert_failed!(Outcome::<i32>::failure(Failure::msg("boom")));
/// ```
#[macro_export]
macro_rules! assert_failed {
    ($outcome:expr) => {
        match $outcome {
            $crate::Outcome::Failed(_) => {}
            $crate::Outcome::Succeeded(v) => {
                panic!("Expected Failed, got Succeeded: {:?}", v);
            }
        }
    };
}

/// Assert that an outcome failed with an error of the given type.
///
/// This macro will panic if the outcome is `Succeeded` or if its failure
/// holds a different error type.
///
/// # Example
///
/// ```rust
/// use backstop::{assert_failed_with, Outcome};
/// use std::num::ParseIntError;
///
/// let outcome = Outcome::apply(|| Ok("x".parse::<i32>()?));
/// assert_failed_with!(outcome, ParseIntError);
/// ```
#[macro_export]
macro_rules! assert_failed_with {
    ($outcome:expr, $error:ty) => {
        match $outcome {
            $crate::Outcome::Failed(f) => {
                if !f.is::<$error>() {
                    panic!(
                        "Expected failure of type {}, got: {:#}",
                        stringify!($error),
                        f
                    );
                }
            }
            $crate::Outcome::Succeeded(v) => {
                panic!(
                    "Expected failure of type {}, got Succeeded: {:?}",
                    stringify!($error),
                    v
                );
            }
        }
    };
}

#[cfg(feature = "proptest")]
use proptest::prelude::*;

#[cfg(feature = "proptest")]
impl<V> Arbitrary for crate::Outcome<V>
where
    V: Arbitrary + 'static,
{
    type Parameters = V::Parameters;
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(args: Self::Parameters) -> Self::Strategy {
        prop_oneof![
            any_with::<V>(args).prop_map(crate::Outcome::success),
            "[a-z ]{1,24}".prop_map(|message| crate::Outcome::failure(Failure::msg(message))),
        ]
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Outcome, ResourceChain};

    #[test]
    fn probes_track_open_and_released() {
        let log = ReleaseLog::new();
        let a = log.probe("a");
        let b = a.derive("b");
        assert_eq!(log.open(), 2);
        assert_eq!(b.name(), "b");

        b.release().unwrap();
        a.release().unwrap();
        assert_eq!(log.released(), vec!["b", "a"]);
        assert_eq!(log.open(), 0);
    }

    #[test]
    fn failing_probe_records_then_fails() {
        let log = ReleaseLog::new();
        let failure = log.failing_probe("a", "close failed").release().unwrap_err();
        assert_eq!(failure.to_string(), "close failed");
        assert_eq!(log.released(), vec!["a"]);
        assert_eq!(log.open(), 0);
    }

    #[test]
    fn probes_in_a_chain() {
        let log = ReleaseLog::new();
        let outcome = ResourceChain::of(log.probe("conn"))
            .map(|conn| Ok(conn.derive("stmt")))
            .map(|stmt| Ok(stmt.derive("rows")))
            .apply(|rows| Ok(rows.name().to_string()));

        assert_succeeded!(outcome, "rows");
        assert_eq!(log.released(), vec!["rows", "stmt", "conn"]);
    }

    #[test]
    fn assert_succeeded_macro() {
        assert_succeeded!(Outcome::success(42));
        assert_succeeded!(Outcome::success(42), 42);
    }

    #[test]
    fn assert_failed_macro() {
        assert_failed!(Outcome::<i32>::failure(Failure::msg("error")));
    }

    #[test]
    fn assert_failed_with_macro() {
        assert_failed_with!(
            Outcome::<i32>::apply(|| Ok("x".parse::<i32>()?)),
            std::num::ParseIntError
        );
    }

    #[test]
    #[should_panic(expected = "Expected Succeeded, got Failed")]
    fn assert_succeeded_panics_on_failure() {
        assert_succeeded!(Outcome::<i32>::failure(Failure::msg("error")));
    }

    #[test]
    #[should_panic(expected = "Expected Failed, got Succeeded")]
    fn assert_failed_panics_on_success() {
        assert_failed!(Outcome::success(42));
    }

    #[test]
    #[should_panic(expected = "Expected failure of type")]
    fn assert_failed_with_panics_on_other_type() {
        assert_failed_with!(
            Outcome::<i32>::failure(Failure::msg("error")),
            std::num::ParseIntError
        );
    }

    #[cfg(feature = "proptest")]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn outcome_arbitrary_generates_valid_instances(
                outcome in any::<Outcome<i32>>()
            ) {
                match &outcome {
                    Outcome::Succeeded(_) => prop_assert!(outcome.is_success()),
                    Outcome::Failed(_) => prop_assert!(outcome.is_failure()),
                }
            }
        }
    }
}
