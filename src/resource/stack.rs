//! Release bookkeeping for acquired resources.

use crate::fallible::attempt;
use crate::failure::Fallible;
use crate::resource::release::Release;

type Releaser<'a> = Box<dyn FnOnce() -> Fallible + 'a>;

/// Combine the pending result with the result of one release.
///
/// A release failure becomes the result when nothing else failed, and is
/// attached as suppressed to the primary failure otherwise.
pub(crate) fn settle<T>(outcome: Fallible<T>, released: Fallible) -> Fallible<T> {
    match (outcome, released) {
        (outcome, Ok(())) => outcome,
        (Ok(_), Err(failure)) => {
            tracing::warn!(suppressed = false, "resource release failed: {:#}", failure);
            Err(failure)
        }
        (Err(primary), Err(secondary)) => {
            tracing::warn!(suppressed = true, "resource release failed: {:#}", secondary);
            Err(primary.with_suppressed(secondary))
        }
    }
}

/// Resources acquired on the way to the exposed one, most recent last.
///
/// Dependent steps push their parent here once the child exists; the stack
/// is unwound in reverse after the chain's function has run. Anything still on
/// the stack when it is dropped is released then, and its failures are logged.
pub(crate) struct ReleaseStack<'a> {
    pending: Vec<Releaser<'a>>,
}

impl<'a> ReleaseStack<'a> {
    pub(crate) fn new() -> Self {
        ReleaseStack {
            pending: Vec::new(),
        }
    }

    pub(crate) fn push<R>(&mut self, resource: R)
    where
        R: Release + 'a,
    {
        self.pending.push(Box::new(move || resource.release()));
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    /// Release everything in reverse push order, folding each release into
    /// `outcome`.
    pub(crate) fn unwind<T>(mut self, mut outcome: Fallible<T>) -> Fallible<T> {
        while let Some(release) = self.pending.pop() {
            tracing::trace!(remaining = self.pending.len(), "releasing resource");
            outcome = settle(outcome, attempt(release));
        }
        outcome
    }
}

impl Drop for ReleaseStack<'_> {
    fn drop(&mut self) {
        while let Some(release) = self.pending.pop() {
            if let Err(failure) = attempt(release) {
                tracing::warn!("resource release failed during drop: {:#}", failure);
            }
        }
    }
}
