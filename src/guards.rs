//! Navigation guards.
//!
//! A guard is called with the target route, the route being left and a
//! single-use [`Next`] continuation. The navigation does not move on until
//! the guard resolves `Next`, synchronously or later:
//!
//! | Call | Outcome |
//! |------|---------|
//! | [`Next::proceed`] | run the next guard |
//! | [`Next::abort`] | stop with an `Aborted` failure, restore the URL |
//! | [`Next::error`] | stop with a guard error, reported to error callbacks |
//! | [`Next::redirect`] | stop with a `Redirected` failure and navigate to the target |
//! | [`Next::deferred`] | proceed; enter guards keep the callback for the view instance |
//!
//! `Next` is consumed by value, so a guard cannot advance twice. Dropping it
//! without resolving stalls the navigation until a newer one supersedes it.
//!
//! Guards are registered globally ([`Router::before_each`](crate::Router::before_each),
//! [`Router::before_resolve`](crate::Router::before_resolve)), per record
//! ([`RouteConfig::before_enter`](crate::RouteConfig::before_enter)) or per
//! component ([`Component::before_route_enter`](crate::Component::before_route_enter)
//! and friends).
//!
//! # Example
//!
//! ```
//! use navigator_pipeline::{guard_fn, Location};
//!
//! let require_login = guard_fn(|to, _from, next| {
//!     if to.meta().get("auth").map(String::as_str) == Some("required") {
//!         next.redirect(Location::from("/login").query("next", to.full_path()));
//!     } else {
//!         next.proceed();
//!     }
//! });
//! # let _ = require_login;
//! ```

use crate::error::NavigationError;
use crate::location::Location;
use crate::route::Route;
use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::rc::Rc;

// ============================================================================
// NavigationGuard trait
// ============================================================================

/// A step of the guard pipeline.
///
/// For closures use [`guard_fn`].
pub trait NavigationGuard: 'static {
    /// Inspect the navigation and resolve `next`.
    fn run(&self, to: &Route, from: &Route, next: Next);

    /// Guard name for logs.
    fn name(&self) -> &'static str {
        "NavigationGuard"
    }
}

/// Shared handle to a guard.
pub type GuardRef = Rc<dyn NavigationGuard>;

/// Create a guard from a closure.
pub const fn guard_fn<F>(f: F) -> FnGuard<F>
where
    F: Fn(&Route, &Route, Next) + 'static,
{
    FnGuard { f }
}

/// Guard created from a closure.
pub struct FnGuard<F> {
    f: F,
}

impl<F> NavigationGuard for FnGuard<F>
where
    F: Fn(&Route, &Route, Next) + 'static,
{
    fn run(&self, to: &Route, from: &Route, next: Next) {
        (self.f)(to, from, next);
    }

    fn name(&self) -> &'static str {
        "FnGuard"
    }
}

// ============================================================================
// Next / GuardOutcome
// ============================================================================

/// The view instance an entered callback receives.
///
/// Views are owned by the rendering collaborator; the router only passes
/// them through.
pub type ViewInstance = Rc<dyn Any>;

/// Callback registered by an enter guard, run once the view is bound.
pub type EnteredCallback = Box<dyn FnOnce(&ViewInstance)>;

/// What a guard decided.
pub enum GuardOutcome {
    /// Continue with the next guard.
    Proceed,
    /// Stop the navigation.
    Abort,
    /// Stop the navigation and report an error.
    Error(NavigationError),
    /// Stop the navigation and start a new one.
    Redirect(Location),
    /// Continue, running the callback on the view instance after commit.
    Deferred(EnteredCallback),
}

impl fmt::Debug for GuardOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proceed => f.write_str("Proceed"),
            Self::Abort => f.write_str("Abort"),
            Self::Error(err) => f.debug_tuple("Error").field(err).finish(),
            Self::Redirect(location) => f.debug_tuple("Redirect").field(location).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// Single-use continuation handed to every guard.
#[must_use = "a guard must resolve `Next`, otherwise the navigation stalls"]
pub struct Next {
    resolve: Box<dyn FnOnce(GuardOutcome)>,
}

impl Next {
    pub(crate) fn new(resolve: impl FnOnce(GuardOutcome) + 'static) -> Self {
        Self {
            resolve: Box::new(resolve),
        }
    }

    /// Resolve with an explicit outcome.
    pub fn resolve(self, outcome: GuardOutcome) {
        (self.resolve)(outcome);
    }

    /// Let the navigation continue.
    pub fn proceed(self) {
        self.resolve(GuardOutcome::Proceed);
    }

    /// Abort the navigation.
    pub fn abort(self) {
        self.resolve(GuardOutcome::Abort);
    }

    /// Abort the navigation with an application error.
    pub fn error<E>(self, err: E)
    where
        E: StdError + 'static,
    {
        self.resolve(GuardOutcome::Error(NavigationError::guard(err)));
    }

    /// Abort the navigation and navigate to `location` instead.
    ///
    /// The new navigation replaces the history entry when the location is
    /// marked with [`Location::replacing`].
    pub fn redirect(self, location: impl Into<Location>) {
        self.resolve(GuardOutcome::Redirect(location.into()));
    }

    /// Continue, and run `callback` with the view instance once it exists.
    ///
    /// Only enter guards keep the callback; elsewhere it is dropped.
    pub fn deferred(self, callback: impl FnOnce(&ViewInstance) + 'static) {
        self.resolve(GuardOutcome::Deferred(Box::new(callback)));
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}

// ============================================================================
// After hooks and handles
// ============================================================================

/// Hook run after every committed navigation with `(to, from)`.
pub type AfterHook = Rc<dyn Fn(&Route, &Route)>;

/// Identifies a registered global hook, see
/// [`Router::remove_hook`](crate::Router::remove_hook).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookHandle(pub(crate) u64);
