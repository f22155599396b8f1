//! The uniform failure value carried by [`Outcome`](crate::Outcome).
//!
//! Every error that crosses the algebra, whether returned by an operation,
//! raised by a panic, or produced while releasing a resource, is represented
//! as a single [`Failure`]. A failure keeps the original error value intact
//! so callers can still inspect it by type, and adds three things:
//!
//! - a [`FailureKind`] tag separating recoverable failures from fatal ones;
//! - an optional owned *cause*: the failure this one wraps;
//! - a list of *suppressed* failures that happened while this one was
//!   already pending (typically resource release errors).
//!
//! # Example
//!
//! ```
//! use backstop::{Failure, FailureKind};
//!
//! let io = std::io::Error::new(std::io::ErrorKind::NotFound, "config.toml");
//! let failure = Failure::msg("loading configuration").caused_by(io);
//!
//! assert_eq!(failure.kind(), FailureKind::Error);
//! assert_eq!(failure.to_string(), "loading configuration");
//! assert_eq!(format!("{:#}", failure), "loading configuration: config.toml");
//! assert!(failure.cause().unwrap().is::<std::io::Error>());
//! ```

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;

/// Result of a caller-supplied operation.
///
/// Every closure accepted by this crate returns `Fallible<T>`, so `?` works on
/// any error type that implements [`std::error::Error`].
pub type Fallible<T = ()> = Result<T, Failure>;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Classification of a [`Failure`].
///
/// `Interrupted` and `Fatal` form the fatal class: recovery, defaulting and
/// wrapping combinators refuse to handle them and re-raise instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FailureKind {
    /// An error returned by an operation.
    Error,
    /// A panic captured while running an operation.
    Panic,
    /// The operation was interrupted (shutdown, cancellation from outside).
    Interrupted,
    /// The execution state can no longer be trusted.
    Fatal,
}

impl FailureKind {
    /// Returns `true` for the kinds that must never be recovered.
    ///
    /// # Example
    ///
    /// ```
    /// use backstop::FailureKind;
    ///
    /// assert!(FailureKind::Fatal.is_fatal());
    /// assert!(FailureKind::Interrupted.is_fatal());
    /// assert!(!FailureKind::Panic.is_fatal());
    /// ```
    #[inline]
    pub fn is_fatal(self) -> bool {
        matches!(self, FailureKind::Interrupted | FailureKind::Fatal)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Error => "error",
            FailureKind::Panic => "panic",
            FailureKind::Interrupted => "interrupted",
            FailureKind::Fatal => "fatal",
        };
        f.write_str(name)
    }
}

/// A failed computation.
///
/// `Failure` deliberately does not implement [`std::error::Error`]; this is
/// what allows the blanket `From<E: Error>` conversion that makes `?` work
/// inside fallible closures.
pub struct Failure {
    kind: FailureKind,
    error: BoxError,
    cause: Option<Box<Failure>>,
    suppressed: Vec<Failure>,
}

impl Failure {
    /// Wrap an error as a recoverable failure.
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Failure::from_boxed(Box::new(error))
    }

    /// Create a failure from a plain message.
    ///
    /// ```
    /// use backstop::Failure;
    ///
    /// let failure = Failure::msg("connection refused");
    /// assert_eq!(failure.to_string(), "connection refused");
    /// ```
    pub fn msg(message: impl Into<String>) -> Self {
        Failure::new(MessageError(message.into()))
    }

    /// Wrap an already boxed error.
    pub fn from_boxed(error: Box<dyn StdError + Send + Sync + 'static>) -> Self {
        Failure {
            kind: FailureKind::Error,
            error,
            cause: None,
            suppressed: Vec::new(),
        }
    }

    /// Create a failure of kind [`FailureKind::Interrupted`].
    pub fn interrupted<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Failure::new(error).with_kind(FailureKind::Interrupted)
    }

    /// Create a failure of kind [`FailureKind::Fatal`].
    ///
    /// ```
    /// use backstop::Failure;
    ///
    /// let failure = Failure::fatal(std::fmt::Error);
    /// assert!(failure.is_fatal());
    /// ```
    pub fn fatal<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Failure::new(error).with_kind(FailureKind::Fatal)
    }

    /// Replace the kind tag.
    pub fn with_kind(mut self, kind: FailureKind) -> Self {
        self.kind = kind;
        self
    }

    /// Record `cause` as the failure this one wraps.
    ///
    /// The cause is owned, so [`Failure::peel`] and
    /// [`Outcome::unwrap_cause_if`](crate::Outcome::unwrap_cause_if) can hand
    /// it back unchanged.
    pub fn caused_by(mut self, cause: impl Into<Failure>) -> Self {
        self.cause = Some(Box::new(cause.into()));
        self
    }

    /// Attach a secondary failure that happened while this one was pending.
    pub fn with_suppressed(mut self, secondary: Failure) -> Self {
        self.suppressed.push(secondary);
        self
    }

    /// The kind tag.
    #[inline]
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Shorthand for `self.kind().is_fatal()`.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }

    /// The wrapped error value.
    pub fn error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.error
    }

    /// Returns `true` if the wrapped error is of type `E`.
    pub fn is<E>(&self) -> bool
    where
        E: StdError + 'static,
    {
        self.error.is::<E>()
    }

    /// Borrow the wrapped error as `E`, if it is one.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        self.error.downcast_ref::<E>()
    }

    /// Take the wrapped error out as `E`, or get the failure back untouched.
    ///
    /// On success the kind, cause and suppressed list are discarded.
    pub fn downcast<E>(self) -> Result<E, Failure>
    where
        E: StdError + 'static,
    {
        if !self.error.is::<E>() {
            return Err(self);
        }
        match self.error.downcast::<E>() {
            Ok(error) => Ok(*error),
            Err(error) => Err(Failure { error, ..self }),
        }
    }

    /// The failure this one wraps, if any.
    pub fn cause(&self) -> Option<&Failure> {
        self.cause.as_deref()
    }

    /// Consume this failure and return the one it wraps, if any.
    pub fn into_cause(self) -> Option<Failure> {
        self.cause.map(|cause| *cause)
    }

    /// Strip exactly one wrapper layer.
    ///
    /// Returns `Ok(cause)` when there is one and `Err(self)` otherwise.
    ///
    /// ```
    /// use backstop::Failure;
    ///
    /// let wrapped = Failure::msg("outer").caused_by(Failure::msg("inner"));
    /// assert_eq!(wrapped.peel().unwrap().to_string(), "inner");
    ///
    /// let bare = Failure::msg("alone");
    /// assert_eq!(bare.peel().unwrap_err().to_string(), "alone");
    /// ```
    pub fn peel(self) -> Result<Failure, Failure> {
        match self.cause {
            Some(cause) => Ok(*cause),
            None => Err(self),
        }
    }

    /// The innermost failure of the cause chain (`self` if there is none).
    pub fn root_cause(&self) -> &Failure {
        let mut current = self;
        while let Some(cause) = current.cause() {
            current = cause;
        }
        current
    }

    /// Iterate over this failure and every cause below it, outermost first.
    pub fn chain(&self) -> Chain<'_> {
        Chain { next: Some(self) }
    }

    /// Failures suppressed while this one was pending, in the order they happened.
    pub fn suppressed(&self) -> &[Failure] {
        &self.suppressed
    }

    /// Build a failure from a panic payload.
    ///
    /// A payload that is itself a `Failure` (see [`raise`](crate::raise)) is
    /// returned as-is; string payloads become a [`PanicError`].
    pub fn from_panic(payload: Box<dyn Any + Send + 'static>) -> Self {
        let payload = match payload.downcast::<Failure>() {
            Ok(failure) => return *failure,
            Err(payload) => payload,
        };
        let message = if let Some(message) = payload.downcast_ref::<&'static str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "panic with a non-string payload".to_string()
        };
        tracing::debug!(%message, "captured panic as failure");
        Failure::new(PanicError { message }).with_kind(FailureKind::Panic)
    }

    /// A plain snapshot of this failure, suitable for logging or serializing.
    pub fn report(&self) -> FailureReport {
        FailureReport {
            kind: self.kind,
            message: self.error.to_string(),
            causes: self
                .chain()
                .skip(1)
                .map(|cause| cause.error.to_string())
                .collect(),
            suppressed: self.suppressed.iter().map(Failure::report).collect(),
        }
    }
}

impl<E> From<E> for Failure
where
    E: StdError + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Failure::new(error)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        if f.alternate() {
            for cause in self.chain().skip(1) {
                write!(f, ": {}", cause.error)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failure")
            .field("kind", &self.kind)
            .field("error", &self.error)
            .field("cause", &self.cause)
            .field("suppressed", &self.suppressed)
            .finish()
    }
}

/// Iterator over a failure and its causes. Created by [`Failure::chain`].
#[derive(Debug, Clone)]
pub struct Chain<'a> {
    next: Option<&'a Failure>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a Failure;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.cause();
        Some(current)
    }
}

/// Snapshot of a [`Failure`] produced by [`Failure::report`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FailureReport {
    /// Kind of the outer failure.
    pub kind: FailureKind,
    /// Message of the outer failure.
    pub message: String,
    /// Messages of the wrapped causes, outermost first.
    pub causes: Vec<String>,
    /// Reports of the suppressed failures.
    pub suppressed: Vec<FailureReport>,
}

/// Error value of a failure captured from a panic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanicError {
    message: String,
}

impl PanicError {
    /// The panic message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for PanicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "panicked: {}", self.message)
    }
}

impl StdError for PanicError {}

#[derive(Debug)]
struct MessageError(String);

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for MessageError {}
