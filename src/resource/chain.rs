//! The resource chain builder.

use std::fmt;

use crate::fallible::attempt;
use crate::failure::Fallible;
use crate::outcome::Outcome;
use crate::resource::release::Release;
use crate::resource::stack::{settle, ReleaseStack};

type Acquire<'a, R> = Box<dyn FnOnce(&mut ReleaseStack<'a>) -> Fallible<R> + 'a>;

/// A lazily acquired set of resources.
///
/// Nothing is acquired until [`apply`](ResourceChain::apply) or
/// [`run`](ResourceChain::run). At that point resources are acquired in the
/// order they were declared, the function runs against the exposed resource,
/// and everything acquired is released in reverse order, whatever happened.
///
/// Independent resources are combined with [`and`](ResourceChain::and) into
/// left-nested pairs. Dependent steps are added with
/// [`map`](ResourceChain::map); only the last step's resource is exposed.
///
/// # Example
///
/// ```
/// use backstop::{Managed, ResourceChain};
/// use std::cell::RefCell;
///
/// let released = RefCell::new(Vec::new());
/// let open = |name: &'static str| {
///     let released = &released;
///     move || Ok(Managed::new(name, move |name| {
///         released.borrow_mut().push(name);
///         Ok(())
///     }))
/// };
///
/// let joined = ResourceChain::with(open("input"))
///     .and(open("output"))
///     .apply2(|input, output| Ok(format!("{} -> {}", **input, **output)));
///
/// assert_eq!(joined.get().unwrap(), "input -> output");
/// assert_eq!(*released.borrow(), vec!["output", "input"]);
/// ```
pub struct ResourceChain<'a, R> {
    acquire: Acquire<'a, R>,
    depth: usize,
}

impl<'a, R> ResourceChain<'a, R>
where
    R: Release + 'a,
{
    /// A chain whose resource is produced by `factory` on first use.
    pub fn with<F>(factory: F) -> Self
    where
        F: FnOnce() -> Fallible<R> + 'a,
    {
        ResourceChain {
            acquire: Box::new(move |_: &mut ReleaseStack<'a>| factory()),
            depth: 1,
        }
    }

    /// A chain over an already-built resource.
    ///
    /// A chain that is dropped without being applied only drops its
    /// resource; [`Release::release`] is not called.
    pub fn of(resource: R) -> Self {
        Self::with(move || Ok(resource))
    }

    /// Number of acquisition steps in the chain.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Add an independent resource acquired after the existing ones.
    ///
    /// If `factory` fails, the resources acquired so far are released before
    /// the failure is reported.
    pub fn and<R2, F>(self, factory: F) -> ResourceChain<'a, (R, R2)>
    where
        R2: Release + 'a,
        F: FnOnce() -> Fallible<R2> + 'a,
    {
        let ResourceChain { acquire, depth } = self;
        ResourceChain {
            acquire: Box::new(move |stack: &mut ReleaseStack<'a>| {
                let acquired = acquire(stack)?;
                match attempt(factory) {
                    Ok(next) => Ok((acquired, next)),
                    Err(failure) => {
                        tracing::debug!(step = depth + 1, "resource acquisition failed: {:#}", failure);
                        settle(Err(failure), attempt(|| acquired.release()))
                    }
                }
            }),
            depth: depth + 1,
        }
    }

    /// Add an already-built independent resource.
    pub fn and_of<R2>(self, resource: R2) -> ResourceChain<'a, (R, R2)>
    where
        R2: Release + 'a,
    {
        self.and(move || Ok(resource))
    }

    /// Add a dependent step: derive the next resource from the current one.
    ///
    /// The current resource stays open until the chain's function has run
    /// and the derived resource has been released. If `mapper` fails, the
    /// current resource is released immediately.
    ///
    /// ```
    /// use backstop::{Managed, ResourceChain};
    ///
    /// let rows = ResourceChain::of(Managed::dropping("db://local"))
    ///     .map(|conn| Ok(Managed::dropping(format!("SELECT 1 via {}", **conn))))
    ///     .map(|stmt| Ok(Managed::dropping(vec![stmt.len()])))
    ///     .apply(|rows| Ok(rows[0]));
    ///
    /// assert_eq!(rows.get().unwrap(), "SELECT 1 via db://local".len());
    /// ```
    pub fn map<R2, F>(self, mapper: F) -> ResourceChain<'a, R2>
    where
        R2: Release + 'a,
        F: FnOnce(&mut R) -> Fallible<R2> + 'a,
    {
        let ResourceChain { acquire, depth } = self;
        ResourceChain {
            acquire: Box::new(move |stack: &mut ReleaseStack<'a>| {
                let mut parent = acquire(stack)?;
                match attempt(|| mapper(&mut parent)) {
                    Ok(child) => {
                        stack.push(parent);
                        Ok(child)
                    }
                    Err(failure) => {
                        tracing::debug!(step = depth + 1, "dependent acquisition failed: {:#}", failure);
                        settle(Err(failure), attempt(|| parent.release()))
                    }
                }
            }),
            depth: depth + 1,
        }
    }

    /// Acquire, run `f` against the exposed resource, release everything.
    ///
    /// The first failure wins: an acquisition failure, else a failure of
    /// `f`, else the first release failure. Later release failures are
    /// attached to it as suppressed failures. Nothing is raised from here;
    /// every failure, panics included, ends up in the returned outcome.
    pub fn apply<V, F>(self, f: F) -> Outcome<V>
    where
        F: FnOnce(&mut R) -> Fallible<V>,
    {
        let span = tracing::debug_span!("resource_chain", depth = self.depth);
        let _entered = span.enter();

        let ResourceChain { acquire, .. } = self;
        let mut stack = ReleaseStack::new();
        let result = match attempt(|| acquire(&mut stack)) {
            Ok(mut resource) => {
                let value = attempt(|| f(&mut resource));
                settle(value, attempt(|| resource.release()))
            }
            Err(failure) => {
                tracing::debug!(
                    acquired = stack.len(),
                    "resource acquisition failed: {:#}",
                    failure
                );
                Err(failure)
            }
        };
        stack.unwind(result).into()
    }

    /// [`apply`](ResourceChain::apply) for a function without a result.
    pub fn run<F>(self, f: F) -> Outcome<()>
    where
        F: FnOnce(&mut R) -> Fallible,
    {
        self.apply(f)
    }
}

impl<'a, A, B> ResourceChain<'a, (A, B)>
where
    A: Release + 'a,
    B: Release + 'a,
{
    /// [`apply`](ResourceChain::apply) with the two resources as separate
    /// arguments.
    pub fn apply2<V, F>(self, f: F) -> Outcome<V>
    where
        F: FnOnce(&mut A, &mut B) -> Fallible<V>,
    {
        self.apply(|(a, b)| f(a, b))
    }

    /// [`run`](ResourceChain::run) with the two resources as separate
    /// arguments.
    pub fn run2<F>(self, f: F) -> Outcome<()>
    where
        F: FnOnce(&mut A, &mut B) -> Fallible,
    {
        self.apply2(f)
    }
}

impl<'a, A, B, C> ResourceChain<'a, ((A, B), C)>
where
    A: Release + 'a,
    B: Release + 'a,
    C: Release + 'a,
{
    /// Three-resource form of [`apply2`](ResourceChain::apply2).
    pub fn apply3<V, F>(self, f: F) -> Outcome<V>
    where
        F: FnOnce(&mut A, &mut B, &mut C) -> Fallible<V>,
    {
        self.apply(|((a, b), c)| f(a, b, c))
    }

    /// Three-resource form of [`run2`](ResourceChain::run2).
    pub fn run3<F>(self, f: F) -> Outcome<()>
    where
        F: FnOnce(&mut A, &mut B, &mut C) -> Fallible,
    {
        self.apply3(f)
    }
}

impl<'a, A, B, C, D> ResourceChain<'a, (((A, B), C), D)>
where
    A: Release + 'a,
    B: Release + 'a,
    C: Release + 'a,
    D: Release + 'a,
{
    /// Four-resource form of [`apply2`](ResourceChain::apply2).
    pub fn apply4<V, F>(self, f: F) -> Outcome<V>
    where
        F: FnOnce(&mut A, &mut B, &mut C, &mut D) -> Fallible<V>,
    {
        self.apply(|(((a, b), c), d)| f(a, b, c, d))
    }

    /// Four-resource form of [`run2`](ResourceChain::run2).
    pub fn run4<F>(self, f: F) -> Outcome<()>
    where
        F: FnOnce(&mut A, &mut B, &mut C, &mut D) -> Fallible,
    {
        self.apply4(f)
    }
}

impl<R> fmt::Debug for ResourceChain<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceChain")
            .field("depth", &self.depth)
            .field("acquire", &"<function>")
            .finish()
    }
}

/// Chain two resource factories.
pub fn with2<'a, A, B, FA, FB>(a: FA, b: FB) -> ResourceChain<'a, (A, B)>
where
    A: Release + 'a,
    B: Release + 'a,
    FA: FnOnce() -> Fallible<A> + 'a,
    FB: FnOnce() -> Fallible<B> + 'a,
{
    ResourceChain::with(a).and(b)
}

/// Chain three resource factories.
pub fn with3<'a, A, B, C, FA, FB, FC>(a: FA, b: FB, c: FC) -> ResourceChain<'a, ((A, B), C)>
where
    A: Release + 'a,
    B: Release + 'a,
    C: Release + 'a,
    FA: FnOnce() -> Fallible<A> + 'a,
    FB: FnOnce() -> Fallible<B> + 'a,
    FC: FnOnce() -> Fallible<C> + 'a,
{
    with2(a, b).and(c)
}

/// Chain four resource factories.
pub fn with4<'a, A, B, C, D, FA, FB, FC, FD>(
    a: FA,
    b: FB,
    c: FC,
    d: FD,
) -> ResourceChain<'a, (((A, B), C), D)>
where
    A: Release + 'a,
    B: Release + 'a,
    C: Release + 'a,
    D: Release + 'a,
    FA: FnOnce() -> Fallible<A> + 'a,
    FB: FnOnce() -> Fallible<B> + 'a,
    FC: FnOnce() -> Fallible<C> + 'a,
    FD: FnOnce() -> Fallible<D> + 'a,
{
    with3(a, b, c).and(d)
}

/// Chain two already-built resources.
pub fn of2<'a, A, B>(a: A, b: B) -> ResourceChain<'a, (A, B)>
where
    A: Release + 'a,
    B: Release + 'a,
{
    ResourceChain::of(a).and_of(b)
}

/// Chain three already-built resources.
pub fn of3<'a, A, B, C>(a: A, b: B, c: C) -> ResourceChain<'a, ((A, B), C)>
where
    A: Release + 'a,
    B: Release + 'a,
    C: Release + 'a,
{
    of2(a, b).and_of(c)
}

/// Chain four already-built resources.
pub fn of4<'a, A, B, C, D>(a: A, b: B, c: C, d: D) -> ResourceChain<'a, (((A, B), C), D)>
where
    A: Release + 'a,
    B: Release + 'a,
    C: Release + 'a,
    D: Release + 'a,
{
    of3(a, b, c).and_of(d)
}
