//! Components bound to route records, lazy loading and in-component guards.
//!
//! A record maps each named view slot to a [`ComponentSlot`]: either a
//! ready [`Component`] or a [`LazyComponent`] that is loaded the first time
//! a navigation activates its record. Loaders use one of two conventions:
//!
//! - callback style: the loader receives a [`ComponentResolver`] and calls
//!   [`resolve`](ComponentResolver::resolve) or
//!   [`reject`](ComponentResolver::reject) whenever it is done;
//! - future style: the loader returns a future that is spawned on the
//!   router's [`LocalSpawn`] executor.
//!
//! Both end up in the same settle function, so only the first resolve or
//! reject of a load has any effect.

use crate::error::{LoadError, NavigationError};
use crate::guards::{GuardRef, NavigationGuard};
use crate::record::{RecordId, RouteRecord};
use crate::{debug_log, trace_log, warn_log};
use futures::future::LocalBoxFuture;
use futures::task::{LocalSpawn, LocalSpawnExt};
use futures::FutureExt;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::rc::Rc;

/// Name of the unnamed view slot.
pub const DEFAULT_SLOT: &str = "default";

// ============================================================================
// Component
// ============================================================================

/// A view definition with its in-component guards.
///
/// Cloning is cheap: guards are shared.
///
/// ```
/// use navigator_pipeline::{guard_fn, Component};
///
/// let editor = Component::new("Editor")
///     .before_route_leave(guard_fn(|_to, _from, next| next.proceed()));
/// assert_eq!(editor.name(), "Editor");
/// assert_eq!(editor.leave_guards().len(), 1);
/// ```
#[derive(Clone)]
pub struct Component {
    name: Rc<str>,
    enter: Vec<GuardRef>,
    update: Vec<GuardRef>,
    leave: Vec<GuardRef>,
}

impl Component {
    /// A component without guards.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: Rc::from(name.as_ref()),
            enter: Vec::new(),
            update: Vec::new(),
            leave: Vec::new(),
        }
    }

    /// Component name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a guard run when a navigation enters a record showing this
    /// component. It runs after lazy components are resolved and may
    /// register a deferred callback for the view instance.
    #[must_use]
    pub fn before_route_enter(mut self, guard: impl NavigationGuard) -> Self {
        self.enter.push(Rc::new(guard));
        self
    }

    /// Add a guard run when the record stays matched but the route changes.
    /// Only runs while a view instance is bound.
    #[must_use]
    pub fn before_route_update(mut self, guard: impl NavigationGuard) -> Self {
        self.update.push(Rc::new(guard));
        self
    }

    /// Add a guard run when a navigation leaves the record.
    /// Only runs while a view instance is bound.
    #[must_use]
    pub fn before_route_leave(mut self, guard: impl NavigationGuard) -> Self {
        self.leave.push(Rc::new(guard));
        self
    }

    /// Enter guards in registration order.
    pub fn enter_guards(&self) -> &[GuardRef] {
        &self.enter
    }

    /// Update guards in registration order.
    pub fn update_guards(&self) -> &[GuardRef] {
        &self.update
    }

    /// Leave guards in registration order.
    pub fn leave_guards(&self) -> &[GuardRef] {
        &self.leave
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("enter", &self.enter.len())
            .field("update", &self.update.len())
            .field("leave", &self.leave.len())
            .finish()
    }
}

// ============================================================================
// LazyComponent
// ============================================================================

type CallbackLoader = Box<dyn Fn(ComponentResolver)>;
type FutureLoader = Box<dyn Fn() -> LocalBoxFuture<'static, Result<Component, LoadError>>>;

enum Loader {
    Callback(CallbackLoader),
    Future(FutureLoader),
}

struct LazyInner {
    loader: Loader,
    resolved: RefCell<Option<Component>>,
}

/// A component loaded on first activation.
///
/// Clones share the loader and the resolved component, so a component that
/// is loaded once is never loaded again.
///
/// ```
/// use navigator_pipeline::{Component, LazyComponent};
///
/// let lazy = LazyComponent::with_resolver(|resolver| {
///     resolver.resolve(Component::new("Settings"));
/// });
/// assert!(!lazy.is_resolved());
/// ```
#[derive(Clone)]
pub struct LazyComponent {
    inner: Rc<LazyInner>,
}

impl LazyComponent {
    /// A callback-style loader.
    pub fn with_resolver<F>(loader: F) -> Self
    where
        F: Fn(ComponentResolver) + 'static,
    {
        Self::from_loader(Loader::Callback(Box::new(loader)))
    }

    /// A future-style loader, spawned on the router's executor.
    pub fn with_future<F, Fut>(loader: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<Component, LoadError>> + 'static,
    {
        Self::from_loader(Loader::Future(Box::new(move || loader().boxed_local())))
    }

    fn from_loader(loader: Loader) -> Self {
        Self {
            inner: Rc::new(LazyInner {
                loader,
                resolved: RefCell::new(None),
            }),
        }
    }

    /// The loaded component, if any.
    pub fn resolved(&self) -> Option<Component> {
        self.inner.resolved.borrow().clone()
    }

    /// `true` once a load succeeded.
    pub fn is_resolved(&self) -> bool {
        self.inner.resolved.borrow().is_some()
    }

    /// `true` if both handles share the same loader.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn set_resolved(&self, component: Component) {
        *self.inner.resolved.borrow_mut() = Some(component);
    }
}

impl fmt::Debug for LazyComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.inner.loader {
            Loader::Callback(_) => "callback",
            Loader::Future(_) => "future",
        };
        f.debug_struct("LazyComponent")
            .field("loader", &kind)
            .field("resolved", &self.resolved())
            .finish()
    }
}

// ============================================================================
// ComponentSlot
// ============================================================================

/// What a view slot of a record shows.
#[derive(Debug, Clone)]
pub enum ComponentSlot {
    /// A component available right away.
    Ready(Component),
    /// A component loaded on demand.
    Lazy(LazyComponent),
}

impl ComponentSlot {
    /// The component if it is available now.
    pub fn component(&self) -> Option<Component> {
        match self {
            Self::Ready(component) => Some(component.clone()),
            Self::Lazy(lazy) => lazy.resolved(),
        }
    }

    /// `true` for a lazy slot that has not been loaded yet.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Lazy(lazy) if !lazy.is_resolved())
    }
}

impl From<Component> for ComponentSlot {
    fn from(component: Component) -> Self {
        Self::Ready(component)
    }
}

impl From<LazyComponent> for ComponentSlot {
    fn from(lazy: LazyComponent) -> Self {
        Self::Lazy(lazy)
    }
}

// ============================================================================
// ComponentResolver
// ============================================================================

/// Resolve/reject pair handed to callback-style loaders.
///
/// It can be cloned and called any number of times; only the first call of
/// any clone counts.
#[derive(Clone)]
pub struct ComponentResolver {
    settle: Rc<dyn Fn(Result<Component, LoadError>)>,
}

impl ComponentResolver {
    fn new(settle: Rc<dyn Fn(Result<Component, LoadError>)>) -> Self {
        Self { settle }
    }

    /// Report the loaded component.
    pub fn resolve(&self, component: Component) {
        (self.settle)(Ok(component));
    }

    /// Report a failed load.
    pub fn reject(&self, reason: impl Into<LoadError>) {
        (self.settle)(Err(reason.into()));
    }
}

impl fmt::Debug for ComponentResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentResolver").finish_non_exhaustive()
    }
}

// ============================================================================
// Traversal
// ============================================================================

/// Visit every `(record, slot name, slot)` of `records` in order.
pub(crate) fn flat_map_components<T>(
    records: &[Rc<RouteRecord>],
    mut f: impl FnMut(&Rc<RouteRecord>, &str, &ComponentSlot) -> Vec<T>,
) -> Vec<T> {
    let mut out = Vec::new();
    for record in records {
        for (slot, component) in record.components() {
            out.extend(f(record, slot, component));
        }
    }
    out
}

// ============================================================================
// Async resolution
// ============================================================================

struct PendingLoad {
    lazy: LazyComponent,
    slot: String,
    record: RecordId,
}

struct Batch {
    pending: Cell<usize>,
    finished: Cell<bool>,
    done: RefCell<Option<Box<dyn FnOnce(Result<(), NavigationError>)>>>,
}

impl Batch {
    fn finish(&self, result: Result<(), NavigationError>) {
        if self.finished.replace(true) {
            return;
        }
        let done = self.done.borrow_mut().take();
        if let Some(done) = done {
            done(result);
        }
    }
}

/// Load every unresolved lazy component of `records`.
///
/// Each distinct lazy component is loaded once even when several slots
/// share it. `done` is called exactly once: with `Ok(())` when the last load
/// resolves, or with the first rejection.
pub(crate) fn resolve_async_components(
    records: &[Rc<RouteRecord>],
    spawner: Option<&Rc<dyn LocalSpawn>>,
    done: impl FnOnce(Result<(), NavigationError>) + 'static,
) {
    let mut loads: Vec<PendingLoad> = Vec::new();
    for record in records {
        for (slot, component) in record.components() {
            if let ComponentSlot::Lazy(lazy) = component {
                if lazy.is_resolved() || loads.iter().any(|load| load.lazy.ptr_eq(lazy)) {
                    continue;
                }
                loads.push(PendingLoad {
                    lazy: lazy.clone(),
                    slot: slot.clone(),
                    record: record.id(),
                });
            }
        }
    }

    if loads.is_empty() {
        done(Ok(()));
        return;
    }

    debug_log!("Resolving {} lazy component(s)", loads.len());

    // The counter is set before any loader runs so that synchronous
    // loaders cannot bring it to zero early.
    let batch = Rc::new(Batch {
        pending: Cell::new(loads.len()),
        finished: Cell::new(false),
        done: RefCell::new(Some(Box::new(done))),
    });

    for load in loads {
        start_load(load, &batch, spawner);
    }
}

fn start_load(load: PendingLoad, batch: &Rc<Batch>, spawner: Option<&Rc<dyn LocalSpawn>>) {
    let settled = Rc::new(Cell::new(false));
    let load_settled = Rc::clone(&settled);
    let settle: Rc<dyn Fn(Result<Component, LoadError>)> = {
        let batch = Rc::clone(batch);
        let lazy = load.lazy.clone();
        let slot = load.slot.clone();
        let record = load.record;
        Rc::new(move |result| {
            if settled.replace(true) {
                trace_log!("Ignoring repeated settle for component {} of {}", slot, record);
                return;
            }
            match result {
                Ok(component) => {
                    trace_log!("Lazy component {} of {} resolved", slot, record);
                    lazy.set_resolved(component);
                    let remaining = batch.pending.get().saturating_sub(1);
                    batch.pending.set(remaining);
                    if remaining == 0 {
                        batch.finish(Ok(()));
                    }
                }
                Err(reason) => {
                    warn_log!("Lazy component {} of {} rejected: {}", slot, record, reason);
                    batch.finish(Err(NavigationError::AsyncComponent {
                        slot: slot.clone(),
                        message: reason.message().to_string(),
                    }));
                }
            }
        })
    };

    match &load.lazy.inner.loader {
        Loader::Callback(loader) => {
            let resolver = ComponentResolver::new(Rc::clone(&settle));
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| loader(resolver))) {
                // Past a settle the panic came from the rest of the pipeline.
                if load_settled.get() {
                    resume_unwind(payload);
                }
                settle(Err(LoadError::new(panic_message(payload.as_ref()))));
            }
        }
        Loader::Future(loader) => {
            let Some(spawner) = spawner else {
                settle(Err(LoadError::new("no executor configured for future loaders")));
                return;
            };
            let future = match catch_unwind(AssertUnwindSafe(|| loader())) {
                Ok(future) => future,
                Err(payload) => {
                    settle(Err(LoadError::new(panic_message(payload.as_ref()))));
                    return;
                }
            };
            let on_settle = Rc::clone(&settle);
            let spawned = spawner.spawn_local(async move {
                on_settle(future.await);
            });
            if let Err(err) = spawned {
                settle(Err(LoadError::new(err.to_string())));
            }
        }
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RouteConfig;
    use crate::Matcher;
    use futures::channel::oneshot;
    use futures::executor::LocalPool;

    fn records_for(config: RouteConfig) -> Vec<Rc<RouteRecord>> {
        let mut matcher = Matcher::default();
        matcher.add_route(config);
        matcher.get_routes()
    }

    fn outcome() -> (Rc<RefCell<Vec<Result<(), NavigationError>>>>, impl FnOnce(Result<(), NavigationError>)) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        (seen, move |result| sink.borrow_mut().push(result))
    }

    #[test]
    fn test_no_lazy_components_finishes_immediately() {
        let records = records_for(RouteConfig::new("/a").component(Component::new("A")));
        let (seen, done) = outcome();
        resolve_async_components(&records, None, done);
        assert_eq!(seen.borrow().len(), 1);
        assert!(seen.borrow()[0].is_ok());
    }

    #[test]
    fn test_shared_lazy_component_loads_once() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let lazy = LazyComponent::with_resolver(move |resolver| {
            counter.set(counter.get() + 1);
            resolver.resolve(Component::new("Shared"));
        });
        let records = records_for(
            RouteConfig::new("/a")
                .component(lazy.clone())
                .named_component("side", lazy.clone()),
        );

        let (seen, done) = outcome();
        resolve_async_components(&records, None, done);

        assert_eq!(calls.get(), 1);
        assert_eq!(seen.borrow().len(), 1);
        assert!(lazy.is_resolved());
    }

    #[test]
    fn test_repeated_settle_is_ignored() {
        let lazy = LazyComponent::with_resolver(|resolver| {
            resolver.resolve(Component::new("First"));
            resolver.reject("late failure");
            resolver.resolve(Component::new("Second"));
        });
        let records = records_for(RouteConfig::new("/a").component(lazy.clone()));

        let (seen, done) = outcome();
        resolve_async_components(&records, None, done);

        assert_eq!(seen.borrow().len(), 1);
        assert!(seen.borrow()[0].is_ok());
        assert_eq!(lazy.resolved().map(|c| c.name().to_string()), Some("First".into()));
    }

    #[test]
    fn test_first_rejection_wins() {
        let records = records_for(
            RouteConfig::new("/a")
                .component(LazyComponent::with_resolver(|r| r.reject("offline")))
                .named_component("side", LazyComponent::with_resolver(|r| r.reject("later"))),
        );

        let (seen, done) = outcome();
        resolve_async_components(&records, None, done);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        match &seen[0] {
            Err(NavigationError::AsyncComponent { slot, message }) => {
                assert_eq!(slot, DEFAULT_SLOT);
                assert_eq!(message, "offline");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_panicking_loader_rejects() {
        let records = records_for(
            RouteConfig::new("/a").component(LazyComponent::with_resolver(|_| panic!("boom"))),
        );
        let (seen, done) = outcome();
        resolve_async_components(&records, None, done);
        assert!(matches!(
            &seen.borrow()[0],
            Err(NavigationError::AsyncComponent { message, .. }) if message == "boom"
        ));
    }

    #[test]
    fn test_future_loader_without_executor_rejects() {
        let records = records_for(
            RouteConfig::new("/a")
                .component(LazyComponent::with_future(|| async { Ok(Component::new("A")) })),
        );
        let (seen, done) = outcome();
        resolve_async_components(&records, None, done);
        assert!(matches!(&seen.borrow()[0], Err(NavigationError::AsyncComponent { .. })));
    }

    #[test]
    fn test_future_loaders_out_of_order() {
        let mut pool = LocalPool::new();
        let spawner: Rc<dyn LocalSpawn> = Rc::new(pool.spawner());

        let (tx_a, rx_a) = oneshot::channel::<()>();
        let (tx_b, rx_b) = oneshot::channel::<()>();
        let rx_a = RefCell::new(Some(rx_a));
        let rx_b = RefCell::new(Some(rx_b));

        let a = LazyComponent::with_future(move || {
            let rx = rx_a.borrow_mut().take();
            async move {
                if let Some(rx) = rx {
                    let _ = rx.await;
                }
                Ok(Component::new("A"))
            }
        });
        let b = LazyComponent::with_future(move || {
            let rx = rx_b.borrow_mut().take();
            async move {
                if let Some(rx) = rx {
                    let _ = rx.await;
                }
                Ok(Component::new("B"))
            }
        });
        let records = records_for(
            RouteConfig::new("/a")
                .component(a.clone())
                .named_component("side", b.clone()),
        );

        let (seen, done) = outcome();
        resolve_async_components(&records, Some(&spawner), done);
        pool.run_until_stalled();
        assert!(seen.borrow().is_empty());

        tx_b.send(()).unwrap();
        pool.run_until_stalled();
        assert!(b.is_resolved());
        assert!(seen.borrow().is_empty());

        tx_a.send(()).unwrap();
        pool.run_until_stalled();
        assert_eq!(seen.borrow().len(), 1);
        assert!(seen.borrow()[0].is_ok());
    }
}
