//! The router handle.
//!
//! [`Router`] ties the route table, the navigation state, the registered
//! hooks, the history backend and the view registry together. It is a cheap
//! `Rc` handle: clones share the same router, so guards and callbacks can
//! capture one and navigate re-entrantly.
//!
//! # Example
//!
//! ```
//! use navigator_pipeline::{guard_fn, FailureKind, HistoryBackend, MemoryHistory, RouteConfig, Router};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let history = MemoryHistory::new();
//! let router = Router::builder()
//!     .route(RouteConfig::new("/").name("home"))
//!     .route(RouteConfig::new("/admin").meta("auth", "required"))
//!     .route(RouteConfig::new("/login").name("login"))
//!     .history(history.clone())
//!     .build();
//!
//! router.before_each(guard_fn(|to, _from, next| {
//!     if to.meta().contains_key("auth") {
//!         next.redirect("/login");
//!     } else {
//!         next.proceed();
//!     }
//! }));
//!
//! let failure = Rc::new(RefCell::new(None));
//! let sink = failure.clone();
//! router
//!     .push_with("/admin", |_| {}, move |err| *sink.borrow_mut() = err.failure_kind())
//!     .unwrap();
//!
//! assert_eq!(*failure.borrow(), Some(FailureKind::Redirected));
//! assert_eq!(router.current_route().path(), "/login");
//! assert_eq!(history.current_location(), "/login");
//! ```

#[cfg(feature = "cache")]
use crate::cache::CacheStats;
use crate::error::NavigationError;
use crate::guards::{AfterHook, EnteredCallback, GuardRef, HookHandle, NavigationGuard, ViewInstance};
use crate::history::{strip_base, HistoryBackend};
use crate::location::Location;
use crate::matcher::Matcher;
use crate::navigation::{HistoryOp, NavigationFuture};
use crate::options::{RouterBuilder, RouterOptions};
use crate::record::{RecordId, RouteConfig, RouteRecord};
use crate::route::Route;
use crate::state::{NavigationPhase, NavigationState};
use crate::views::ViewRegistry;
use crate::{debug_log, info_log};
use futures::channel::oneshot;
use futures::task::LocalSpawn;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

// ============================================================================
// Hooks
// ============================================================================

#[derive(Default)]
pub(crate) struct Hooks {
    next_id: u64,
    pub(crate) before_each: Vec<(HookHandle, GuardRef)>,
    pub(crate) before_resolve: Vec<(HookHandle, GuardRef)>,
    pub(crate) after_each: Vec<(HookHandle, AfterHook)>,
}

impl Hooks {
    fn next_handle(&mut self) -> HookHandle {
        self.next_id += 1;
        HookHandle(self.next_id)
    }

    fn remove(&mut self, handle: HookHandle) -> bool {
        let before = self.len();
        self.before_each.retain(|(h, _)| *h != handle);
        self.before_resolve.retain(|(h, _)| *h != handle);
        self.after_each.retain(|(h, _)| *h != handle);
        self.len() != before
    }

    fn len(&self) -> usize {
        self.before_each.len() + self.before_resolve.len() + self.after_each.len()
    }
}

// ============================================================================
// Router
// ============================================================================

pub(crate) struct RouterInner {
    pub(crate) options: RouterOptions,
    pub(crate) matcher: RefCell<Matcher>,
    pub(crate) history: RefCell<Box<dyn HistoryBackend>>,
    pub(crate) spawner: Option<Rc<dyn LocalSpawn>>,
    pub(crate) state: RefCell<NavigationState>,
    pub(crate) hooks: RefCell<Hooks>,
    pub(crate) views: RefCell<ViewRegistry>,
}

/// A matched location together with the URL it would be written as.
#[derive(Debug, Clone)]
pub struct ResolvedLocation {
    /// The route the location matches.
    pub route: Route,
    /// History URL, base included. Uses the redirect origin when the match
    /// went through a redirect.
    pub href: String,
}

/// Navigation controller.
///
/// All state lives behind `RefCell`s that are never borrowed while user
/// code runs, so guards, hooks and callbacks may call back into the router.
#[derive(Clone)]
pub struct Router {
    pub(crate) inner: Rc<RouterInner>,
}

impl Router {
    /// Start assembling a router.
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// A router over `routes` with default options and a [`MemoryHistory`](crate::MemoryHistory).
    pub fn new(routes: impl IntoIterator<Item = RouteConfig>) -> Self {
        Self::builder().routes(routes).build()
    }

    /// Assemble a router from its parts.
    pub fn from_parts(
        options: RouterOptions,
        routes: impl IntoIterator<Item = RouteConfig>,
        history: Box<dyn HistoryBackend>,
        spawner: Option<Rc<dyn LocalSpawn>>,
    ) -> Self {
        let mut matcher = Matcher::new(options.max_redirects(), options.cache_capacity());
        matcher.add_routes(routes);
        debug_log!("Router created with {} record(s), base '{}'", matcher.len(), options.base());
        Self {
            inner: Rc::new(RouterInner {
                options,
                matcher: RefCell::new(matcher),
                history: RefCell::new(history),
                spawner,
                state: RefCell::new(NavigationState::new()),
                hooks: RefCell::new(Hooks::default()),
                views: RefCell::new(ViewRegistry::default()),
            }),
        }
    }

    /// Options the router was built with.
    pub fn options(&self) -> &RouterOptions {
        &self.inner.options
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Navigate to `location`, adding a history entry on success.
    ///
    /// Guard outcomes are not reported here: use [`push_with`](Self::push_with)
    /// or [`navigate`](Self::navigate) to observe them.
    ///
    /// # Errors
    ///
    /// Returns the matching error when `location` cannot be resolved. Error
    /// callbacks are notified too.
    pub fn push(&self, location: impl Into<Location>) -> Result<(), NavigationError> {
        self.transition(&location.into(), HistoryOp::Push, 0, None, None)
    }

    /// Navigate to `location`, replacing the current history entry.
    pub fn replace(&self, location: impl Into<Location>) -> Result<(), NavigationError> {
        self.transition(&location.into(), HistoryOp::Replace, 0, None, None)
    }

    /// [`push`](Self::push) with completion and abort callbacks.
    ///
    /// Exactly one of the two runs, unless a guard never resolves.
    pub fn push_with(
        &self,
        location: impl Into<Location>,
        on_complete: impl FnOnce(&Route) + 'static,
        on_abort: impl FnOnce(NavigationError) + 'static,
    ) -> Result<(), NavigationError> {
        self.transition(
            &location.into(),
            HistoryOp::Push,
            0,
            Some(Box::new(on_complete)),
            Some(Box::new(on_abort)),
        )
    }

    /// [`replace`](Self::replace) with completion and abort callbacks.
    pub fn replace_with(
        &self,
        location: impl Into<Location>,
        on_complete: impl FnOnce(&Route) + 'static,
        on_abort: impl FnOnce(NavigationError) + 'static,
    ) -> Result<(), NavigationError> {
        self.transition(
            &location.into(),
            HistoryOp::Replace,
            0,
            Some(Box::new(on_complete)),
            Some(Box::new(on_abort)),
        )
    }

    /// Push `location` and get a future of the outcome.
    ///
    /// ```
    /// use navigator_pipeline::{RouteConfig, Router};
    /// use futures::executor::block_on;
    ///
    /// let router = Router::new([RouteConfig::new("/users/:id")]);
    /// let route = block_on(router.navigate("/users/3")).unwrap();
    /// assert_eq!(route.params().get_str("id"), Some("3"));
    /// ```
    pub fn navigate(&self, location: impl Into<Location>) -> NavigationFuture {
        self.navigate_with(location.into(), HistoryOp::Push)
    }

    /// Replace with `location` and get a future of the outcome.
    pub fn navigate_replace(&self, location: impl Into<Location>) -> NavigationFuture {
        self.navigate_with(location.into(), HistoryOp::Replace)
    }

    fn navigate_with(&self, location: Location, op: HistoryOp) -> NavigationFuture {
        let (sender, receiver) = oneshot::channel();
        let sender = Rc::new(RefCell::new(Some(sender)));
        let on_abort_sender = Rc::clone(&sender);
        let from = self.current_route().full_path().to_string();

        let started = self.transition(
            &location,
            op,
            0,
            Some(Box::new(move |route: &Route| {
                if let Some(sender) = sender.borrow_mut().take() {
                    let _ = sender.send(Ok(route.clone()));
                }
            })),
            Some(Box::new(move |err: NavigationError| {
                if let Some(sender) = on_abort_sender.borrow_mut().take() {
                    let _ = sender.send(Err(err));
                }
            })),
        );
        match started {
            Ok(()) => NavigationFuture::waiting(receiver, from, &location),
            Err(err) => NavigationFuture::ready(Err(err)),
        }
    }

    /// Move through history by `delta` entries and navigate there.
    ///
    /// Out-of-range moves are ignored.
    pub fn go(&self, delta: isize) -> Result<(), NavigationError> {
        let target = self.inner.history.borrow().peek(delta);
        let Some(url) = target else {
            debug_log!("History has no entry at offset {}", delta);
            return Ok(());
        };
        let location = Location::from(strip_base(&url, self.inner.options.base()));
        self.transition(&location, HistoryOp::Go(delta), 0, None, None)
    }

    /// `go(-1)`.
    pub fn back(&self) -> Result<(), NavigationError> {
        self.go(-1)
    }

    /// `go(1)`.
    pub fn forward(&self) -> Result<(), NavigationError> {
        self.go(1)
    }

    /// Navigate without writing a history entry; the URL is only reconciled
    /// on commit.
    pub fn transition_to(&self, location: impl Into<Location>) -> Result<(), NavigationError> {
        self.transition(&location.into(), HistoryOp::Transition, 0, None, None)
    }

    /// Run the initial navigation to the history's current location.
    pub fn init(&self) -> Result<(), NavigationError> {
        let url = self.inner.history.borrow().current_location();
        let location = strip_base(&url, self.inner.options.base());
        info_log!("Initial navigation to '{}'", location);
        self.transition(&Location::from(location), HistoryOp::Transition, 0, None, None)
    }

    /// Cancel any navigation in flight and reset to the start route.
    ///
    /// Hooks, callbacks and routes stay registered; the listener and the
    /// view registry are dropped.
    pub fn teardown(&self) {
        {
            let mut state = self.inner.state.borrow_mut();
            let cancelled = state.pending.is_some();
            state.cancel_pending();
            state.listener = None;
            state.current = Route::start();
            state.phase = if cancelled {
                NavigationPhase::Cancelled
            } else {
                NavigationPhase::Idle
            };
        }
        self.inner.views.borrow_mut().clear();
        debug_log!("Router torn down");
    }

    /// Match `location` against the current route without navigating.
    pub fn resolve(&self, location: impl Into<Location>) -> Result<ResolvedLocation, NavigationError> {
        let current = self.current_route();
        let route = self
            .inner
            .matcher
            .borrow()
            .match_location(&location.into(), &current, None)?;
        let href = self.href(route.redirected_from().unwrap_or(route.full_path()));
        Ok(ResolvedLocation { route, href })
    }

    // ========================================================================
    // Callbacks and hooks
    // ========================================================================

    /// Call `listener` with every committed route. Replaces any previous
    /// listener.
    pub fn listen(&self, listener: impl Fn(&Route) + 'static) {
        self.inner.state.borrow_mut().listener = Some(Rc::new(listener));
    }

    /// Call `callback` once the first navigation settled, immediately if
    /// it already has.
    ///
    /// A first navigation that fails makes the router ready without calling
    /// the callbacks waiting here.
    pub fn on_ready(&self, callback: impl FnOnce(&Route) + 'static) {
        let current = {
            let mut state = self.inner.state.borrow_mut();
            if !state.ready {
                state.ready_callbacks.push(Box::new(callback));
                return;
            }
            state.current.clone()
        };
        callback(&current);
    }

    /// [`on_ready`](Self::on_ready), plus `on_error` if the first navigation
    /// fails. Exactly one of the two runs for a waiting registration.
    pub fn on_ready_with(
        &self,
        callback: impl FnOnce(&Route) + 'static,
        on_error: impl FnOnce(&NavigationError) + 'static,
    ) {
        let current = {
            let mut state = self.inner.state.borrow_mut();
            if !state.ready {
                state.ready_callbacks.push(Box::new(callback));
                state.ready_error_callbacks.push(Box::new(on_error));
                return;
            }
            state.current.clone()
        };
        callback(&current);
    }

    /// Call `callback` with every navigation error that is not a flow
    /// failure, matching errors included.
    pub fn on_error(&self, callback: impl Fn(&NavigationError) + 'static) {
        self.inner.state.borrow_mut().error_callbacks.push(Rc::new(callback));
    }

    /// Register a guard run before every navigation, after leave guards.
    pub fn before_each(&self, guard: impl NavigationGuard) -> HookHandle {
        let mut hooks = self.inner.hooks.borrow_mut();
        let handle = hooks.next_handle();
        hooks.before_each.push((handle, Rc::new(guard)));
        handle
    }

    /// Register a guard run after in-component enter guards.
    pub fn before_resolve(&self, guard: impl NavigationGuard) -> HookHandle {
        let mut hooks = self.inner.hooks.borrow_mut();
        let handle = hooks.next_handle();
        hooks.before_resolve.push((handle, Rc::new(guard)));
        handle
    }

    /// Register a hook run with `(to, from)` after every commit.
    pub fn after_each(&self, hook: impl Fn(&Route, &Route) + 'static) -> HookHandle {
        let mut hooks = self.inner.hooks.borrow_mut();
        let handle = hooks.next_handle();
        hooks.after_each.push((handle, Rc::new(hook)));
        handle
    }

    /// Unregister a hook. Returns `false` if it was already removed.
    pub fn remove_hook(&self, handle: HookHandle) -> bool {
        self.inner.hooks.borrow_mut().remove(handle)
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// The last committed route.
    pub fn current_route(&self) -> Route {
        self.inner.state.borrow().current.clone()
    }

    /// Target of the navigation in flight.
    pub fn pending_route(&self) -> Option<Route> {
        self.inner.state.borrow().pending.clone()
    }

    /// Phase of the most recent navigation.
    pub fn phase(&self) -> NavigationPhase {
        self.inner.state.borrow().phase
    }

    /// `true` once the first navigation committed or failed.
    ///
    /// A first navigation that redirects leaves this to its target.
    pub fn is_ready(&self) -> bool {
        self.inner.state.borrow().ready
    }

    /// Match cache counters.
    #[cfg(feature = "cache")]
    pub fn cache_stats(&self) -> CacheStats {
        self.inner.matcher.borrow().cache_stats()
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// Bind the view instance rendered for `slot` of `record`.
    ///
    /// Entered callbacks waiting for it run now if `record` is part of the
    /// current route.
    pub fn bind_instance(&self, record: RecordId, slot: &str, instance: ViewInstance) {
        let in_current = self
            .inner
            .state
            .borrow()
            .current
            .matched()
            .iter()
            .any(|matched| matched.id() == record);
        let waiting = {
            let mut views = self.inner.views.borrow_mut();
            views.bind(record, slot, Rc::clone(&instance));
            if in_current {
                views.take_entered(record, slot)
            } else {
                Vec::new()
            }
        };
        for callback in waiting {
            callback(&instance);
        }
    }

    /// Forget the view instance of `slot` of `record`.
    pub fn unbind_instance(&self, record: RecordId, slot: &str) -> Option<ViewInstance> {
        self.inner.views.borrow_mut().unbind(record, slot)
    }

    /// Take the entered callbacks waiting for `slot` of `record`.
    pub fn take_entered_callbacks(&self, record: RecordId, slot: &str) -> Vec<EnteredCallback> {
        self.inner.views.borrow_mut().take_entered(record, slot)
    }

    // ========================================================================
    // Route table
    // ========================================================================

    /// Add a top-level route.
    pub fn add_route(&self, config: RouteConfig) -> RecordId {
        self.inner.matcher.borrow_mut().add_route(config)
    }

    /// Add several top-level routes.
    pub fn add_routes(&self, configs: impl IntoIterator<Item = RouteConfig>) {
        self.inner.matcher.borrow_mut().add_routes(configs);
    }

    /// Add a route under the record named `parent_name`.
    pub fn add_child_route(&self, parent_name: &str, config: RouteConfig) -> Option<RecordId> {
        self.inner.matcher.borrow_mut().add_child_route(parent_name, config)
    }

    /// Records in matching order.
    pub fn get_routes(&self) -> Vec<Rc<RouteRecord>> {
        self.inner.matcher.borrow().get_routes()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("options", &self.inner.options)
            .field("state", &self.inner.state.borrow())
            .field("records", &self.inner.matcher.borrow().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guards::guard_fn;
    use std::cell::Cell;

    #[test]
    fn test_hook_handles_are_unique_and_removable() {
        let router = Router::new([RouteConfig::new("/")]);
        let a = router.before_each(guard_fn(|_, _, next| next.proceed()));
        let b = router.after_each(|_, _| {});
        assert_ne!(a, b);
        assert!(router.remove_hook(a));
        assert!(!router.remove_hook(a));
        assert!(router.remove_hook(b));
    }

    #[test]
    fn test_on_ready_runs_immediately_once_ready() {
        let router = Router::new([RouteConfig::new("/")]);
        router.init().unwrap();
        assert!(router.is_ready());

        let called = Rc::new(Cell::new(false));
        let flag = Rc::clone(&called);
        router.on_ready(move |route| flag.set(route.path() == "/"));
        assert!(called.get());
    }

    #[test]
    fn test_resolve_does_not_navigate() {
        let router = Router::builder()
            .options(RouterOptions::new().with_base("/app"))
            .route(RouteConfig::new("/users/:id").name("user"))
            .build();
        let resolved = router
            .resolve(Location::named("user").param("id", "4"))
            .unwrap();

        assert_eq!(resolved.href, "/app/users/4");
        assert!(router.current_route().is_start());
        assert_eq!(router.phase(), NavigationPhase::Idle);
    }

    #[cfg(feature = "cache")]
    #[test]
    fn test_cache_stats_count_repeated_paths() {
        let router = Router::new([RouteConfig::new("/users/:id")]);
        router.resolve("/users/1").unwrap();
        router.resolve("/users/1").unwrap();

        let stats = router.cache_stats();
        assert_eq!(stats.hits, 1);
        assert!(stats.misses >= 1);
    }
}
