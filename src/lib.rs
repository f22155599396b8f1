//! # Backstop
//!
//! > *"Whatever happens, something catches it"*
//!
//! Failure-aware composition for synchronous Rust code.
//!
//! ## Philosophy
//!
//! Every fallible step produces an [`Outcome`]: a value, or a [`Failure`]
//! that keeps the original error intact. Outcomes are combined, recovered and
//! inspected without anything being raised, until the caller decides to
//! surface the failure with [`Outcome::get`].
//!
//! - [`Outcome`] captures returned errors and panics alike, and recovers
//!   selectively. Fatal failures are never recovered.
//! - [`ResourceChain`] acquires resources in order and releases them in
//!   reverse, including after partial acquisition or a panic.
//! - [`memoize`] caches successful results, one critical section per function.
//! - [`when`] classifies a value by ordered rules.
//!
//! ## Quick Example
//!
//! ```rust
//! use backstop::{Outcome, ResourceChain};
//! use backstop::testing::ReleaseLog;
//!
//! let log = ReleaseLog::new();
//!
//! let port = ResourceChain::of(log.probe("config"))
//!     .apply(|config| Ok(config.name().parse::<u16>()?))
//!     .recover_from(|_: std::num::ParseIntError| Ok(8080))
//!     .map(|port| port + 1);
//!
//! assert_eq!(port.get().unwrap(), 8081);
//! assert_eq!(log.released(), vec!["config"]);
//! assert!(Outcome::<()>::apply(|| panic!("caught")).is_failure());
//! ```
//!
//! Failures are logged through [`tracing`]; the crate never installs a
//! subscriber.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod failure;
pub mod fallible;
pub mod matching;
pub mod memo;
pub mod outcome;
pub mod resource;
pub mod testing;

// Re-exports
pub use failure::{Failure, FailureKind, FailureReport, Fallible, PanicError};
pub use fallible::{attempt, raise, unchecked, unchecked2};
pub use matching::{when, NoMatch, When};
pub use memo::{memoize, Memoized};
pub use outcome::Outcome;
pub use resource::{Managed, Release, ResourceChain};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::failure::{Failure, FailureKind, Fallible};
    pub use crate::fallible::{attempt, raise, unchecked};
    pub use crate::matching::when;
    pub use crate::memo::memoize;
    pub use crate::outcome::Outcome;
    pub use crate::resource::{Managed, Release, ResourceChain};
}
