//! The navigation engine.
//!
//! Every call to [`Router::transition_to`] (and `push`, `replace`, `go`)
//! becomes a `Navigation`: the matched target, the route being left, the
//! generation it was started under and the callbacks of the caller. It then
//! runs through two guard queues:
//!
//! 1. **Queue A**: leave guards of deactivated components (child first),
//!    `before_each` hooks, update guards of reused components,
//!    `before_enter` of activated records, then lazy component loading.
//! 2. **Queue B**: enter guards of the now-loaded activated components,
//!    then `before_resolve` hooks.
//!
//! A navigation settles exactly once, either by committing or through
//! an abort. Any newer navigation bumps the generation, and the
//! stale one notices at its next guard boundary and ends as `Cancelled`.

use crate::components::{flat_map_components, panic_message, resolve_async_components, Component};
use crate::error::{FailureKind, NavigationError, NavigationFailure};
use crate::guards::{AfterHook, EnteredCallback, GuardOutcome, GuardRef, Next};
use crate::location::Location;
use crate::matching::clean_path;
use crate::queue::{run_queue, Advance};
use crate::record::{RecordId, RouteRecord};
use crate::route::{is_same_route, Route};
use crate::router::Router;
use crate::state::NavigationPhase;
use crate::{debug_log, error_log, info_log, trace_log, warn_log};
use futures::channel::oneshot;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

pub(crate) type CompleteCallback = Box<dyn FnOnce(&Route)>;
pub(crate) type AbortCallback = Box<dyn FnOnce(NavigationError)>;

/// What a committed navigation writes to history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HistoryOp {
    Push,
    Replace,
    Go(isize),
    /// Initial or externally triggered navigation; the URL is only reconciled.
    Transition,
}

// ============================================================================
// Navigation context
// ============================================================================

/// One navigation attempt.
pub(crate) struct Navigation {
    generation: u64,
    route: Route,
    from: Route,
    op: HistoryOp,
    redirect_depth: usize,
    settled: Cell<bool>,
    activated: RefCell<Vec<RecordId>>,
    entered: RefCell<Vec<(RecordId, String, EnteredCallback)>>,
    on_complete: RefCell<Option<CompleteCallback>>,
    on_abort: RefCell<Option<AbortCallback>>,
}

impl Navigation {
    fn failure(&self, kind: FailureKind) -> NavigationError {
        NavigationFailure::new(kind, self.from.full_path(), self.route.full_path()).into()
    }
}

impl fmt::Debug for Navigation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Navigation")
            .field("generation", &self.generation)
            .field("from", &self.from.full_path())
            .field("to", &self.route.full_path())
            .field("op", &self.op)
            .field("settled", &self.settled.get())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum GuardKind {
    Plain,
    Enter { record: RecordId, slot: String },
}

enum Step {
    Guard { guard: GuardRef, kind: GuardKind },
    Resolve(Vec<Rc<RouteRecord>>),
}

impl Step {
    fn guard(guard: &GuardRef) -> Self {
        Self::Guard {
            guard: Rc::clone(guard),
            kind: GuardKind::Plain,
        }
    }
}

/// Records of two matched chains split by identity.
#[derive(Debug, Default)]
pub(crate) struct RecordDiff {
    pub(crate) updated: Vec<Rc<RouteRecord>>,
    pub(crate) activated: Vec<Rc<RouteRecord>>,
    pub(crate) deactivated: Vec<Rc<RouteRecord>>,
}

/// Split `current` and `next` at their first differing record.
pub(crate) fn resolve_queue(current: &[Rc<RouteRecord>], next: &[Rc<RouteRecord>]) -> RecordDiff {
    let common = current
        .iter()
        .zip(next)
        .take_while(|(a, b)| a.id() == b.id())
        .count();
    RecordDiff {
        updated: next[..common].to_vec(),
        activated: next[common..].to_vec(),
        deactivated: current[common..].to_vec(),
    }
}

fn describe_location(location: &Location) -> String {
    match (&location.name, &location.path) {
        (Some(name), _) => format!("named route '{name}'"),
        (None, Some(path)) => path.clone(),
        (None, None) => "params-only location".to_string(),
    }
}

// ============================================================================
// Engine
// ============================================================================

impl Router {
    /// Match `raw` and run the guard pipeline towards it.
    pub(crate) fn transition(
        &self,
        raw: &Location,
        op: HistoryOp,
        redirect_depth: usize,
        on_complete: Option<CompleteCallback>,
        on_abort: Option<AbortCallback>,
    ) -> Result<(), NavigationError> {
        let (current, previous_phase) = {
            let mut state = self.inner.state.borrow_mut();
            let previous = std::mem::replace(&mut state.phase, NavigationPhase::Matching);
            (state.current.clone(), previous)
        };

        let matched = self.inner.matcher.borrow().match_location(raw, &current, None);
        let route = match matched {
            Ok(route) => route,
            Err(err) => {
                warn_log!("Cannot navigate to {}: {}", describe_location(raw), err);
                let callbacks = {
                    let mut state = self.inner.state.borrow_mut();
                    state.phase = if state.pending.is_some() {
                        previous_phase
                    } else {
                        NavigationPhase::Aborted
                    };
                    state.error_callbacks.clone()
                };
                for callback in callbacks {
                    callback(&err);
                }
                return Err(err);
            }
        };

        info_log!("Navigating from '{}' to '{}'", current.full_path(), route.full_path());
        let generation = self.inner.state.borrow_mut().start_navigation(route.clone());
        let navigation = Rc::new(Navigation {
            generation,
            route,
            from: current,
            op,
            redirect_depth,
            settled: Cell::new(false),
            activated: RefCell::new(Vec::new()),
            entered: RefCell::new(Vec::new()),
            on_complete: RefCell::new(on_complete),
            on_abort: RefCell::new(on_abort),
        });
        self.confirm_transition(&navigation);
        Ok(())
    }

    fn confirm_transition(&self, nav: &Rc<Navigation>) {
        let (route, from) = (&nav.route, &nav.from);
        let same_leaf = route.leaf().map(|record| record.id()) == from.leaf().map(|record| record.id());
        if is_same_route(route, from) && route.matched().len() == from.matched().len() && same_leaf {
            self.abort(nav, nav.failure(FailureKind::Duplicated));
            return;
        }

        let diff = resolve_queue(from.matched(), route.matched());
        debug_log!(
            "Route diff for '{}': {} updated, {} activated, {} deactivated",
            route.full_path(),
            diff.updated.len(),
            diff.activated.len(),
            diff.deactivated.len()
        );
        *nav.activated.borrow_mut() = diff.activated.iter().map(|record| record.id()).collect();

        let queue = self.leave_queue(&diff);
        debug_log!("Queue A built with {} step(s)", queue.len());
        self.set_phase(nav, NavigationPhase::RunningLeaveQueue);

        let step_router = self.clone();
        let step_nav = Rc::clone(nav);
        let done_router = self.clone();
        let done_nav = Rc::clone(nav);
        let activated = diff.activated;
        run_queue(
            queue,
            move |step, advance| step_router.run_step(&step_nav, step, advance),
            move || done_router.run_enter_queue(&done_nav, &activated),
        );
    }

    fn leave_queue(&self, diff: &RecordDiff) -> Vec<Option<Step>> {
        let hooks = self.inner.hooks.borrow();
        let mut queue = self.instance_guards(&diff.deactivated, Component::leave_guards, true);
        queue.extend(hooks.before_each.iter().map(|(_, guard)| Some(Step::guard(guard))));
        queue.extend(self.instance_guards(&diff.updated, Component::update_guards, false));
        queue.extend(
            diff.activated
                .iter()
                .map(|record| record.before_enter().map(Step::guard)),
        );
        queue.push(Some(Step::Resolve(diff.activated.clone())));
        queue
    }

    /// Guards of components with a bound view instance.
    ///
    /// Unbound components contribute `None` placeholders. With `reverse` the
    /// per-component groups run child first while each group keeps its order.
    fn instance_guards(
        &self,
        records: &[Rc<RouteRecord>],
        select: fn(&Component) -> &[GuardRef],
        reverse: bool,
    ) -> Vec<Option<Step>> {
        let views = self.inner.views.borrow();
        let mut groups = flat_map_components(records, |record, slot, component| {
            let group: Vec<Option<Step>> = match component.component() {
                Some(component) => {
                    let bound = views.instance(record.id(), slot).is_some();
                    select(&component)
                        .iter()
                        .map(|guard| bound.then(|| Step::guard(guard)))
                        .collect()
                }
                None => Vec::new(),
            };
            vec![group]
        });
        if reverse {
            groups.reverse();
        }
        groups.into_iter().flatten().collect()
    }

    fn run_enter_queue(&self, nav: &Rc<Navigation>, activated: &[Rc<RouteRecord>]) {
        if nav.settled.get() {
            return;
        }
        let hooks = self.inner.hooks.borrow();
        let mut queue: Vec<Option<Step>> = flat_map_components(activated, |record, slot, component| {
            component
                .component()
                .map(|component| {
                    component
                        .enter_guards()
                        .iter()
                        .map(|guard| {
                            Some(Step::Guard {
                                guard: Rc::clone(guard),
                                kind: GuardKind::Enter {
                                    record: record.id(),
                                    slot: slot.to_string(),
                                },
                            })
                        })
                        .collect()
                })
                .unwrap_or_default()
        });
        queue.extend(hooks.before_resolve.iter().map(|(_, guard)| Some(Step::guard(guard))));
        drop(hooks);
        debug_log!("Queue B built with {} step(s)", queue.len());
        self.set_phase(nav, NavigationPhase::RunningEnterQueue);

        let step_router = self.clone();
        let step_nav = Rc::clone(nav);
        let done_router = self.clone();
        let done_nav = Rc::clone(nav);
        run_queue(
            queue,
            move |step, advance| step_router.run_step(&step_nav, step, advance),
            move || done_router.commit(&done_nav),
        );
    }

    fn run_step(&self, nav: &Rc<Navigation>, step: Step, advance: Advance) {
        if nav.settled.get() {
            return;
        }
        if !self.is_current(nav) {
            self.abort(nav, nav.failure(FailureKind::Cancelled));
            return;
        }

        match step {
            Step::Resolve(records) => {
                let router = self.clone();
                let nav = Rc::clone(nav);
                resolve_async_components(&records, self.inner.spawner.as_ref(), move |result| {
                    let outcome = match result {
                        Ok(()) => GuardOutcome::Proceed,
                        Err(err) => GuardOutcome::Error(err),
                    };
                    router.handle_outcome(&nav, GuardKind::Plain, outcome, advance);
                });
            }
            Step::Guard { guard, kind } => {
                trace_log!("Running {} towards '{}'", guard.name(), nav.route.full_path());
                let router = self.clone();
                let resolved_nav = Rc::clone(nav);
                let next = Next::new(move |outcome| {
                    router.handle_outcome(&resolved_nav, kind, outcome, advance);
                });
                let ran = catch_unwind(AssertUnwindSafe(|| guard.run(&nav.route, &nav.from, next)));
                if let Err(payload) = ran {
                    if nav.settled.get() {
                        resume_unwind(payload);
                    }
                    let message = panic_message(payload.as_ref());
                    error_log!("{} panicked towards '{}': {}", guard.name(), nav.route.full_path(), message);
                    self.abort(nav, NavigationError::GuardPanicked { message });
                }
            }
        }
    }

    fn handle_outcome(&self, nav: &Rc<Navigation>, kind: GuardKind, outcome: GuardOutcome, advance: Advance) {
        if nav.settled.get() {
            trace_log!("Ignoring {:?} for settled navigation to '{}'", outcome, nav.route.full_path());
            return;
        }
        if !self.is_current(nav) {
            self.abort(nav, nav.failure(FailureKind::Cancelled));
            return;
        }
        trace_log!("Guard resolved {:?} towards '{}'", outcome, nav.route.full_path());

        match outcome {
            GuardOutcome::Proceed => advance.advance(),
            GuardOutcome::Deferred(callback) => {
                if let GuardKind::Enter { record, slot } = kind {
                    nav.entered.borrow_mut().push((record, slot, callback));
                }
                advance.advance();
            }
            GuardOutcome::Abort => {
                self.ensure_url(true);
                self.abort(nav, nav.failure(FailureKind::Aborted));
            }
            GuardOutcome::Error(err) => {
                self.ensure_url(true);
                self.abort(nav, err);
            }
            GuardOutcome::Redirect(location) => self.redirect(nav, &location),
        }
    }

    fn redirect(&self, nav: &Navigation, location: &Location) {
        let depth = nav.redirect_depth + 1;
        if depth > self.inner.options.max_redirects() {
            let target = describe_location(location);
            warn_log!("Redirect loop while navigating to '{}' (depth {})", nav.route.full_path(), depth);
            self.ensure_url(true);
            self.abort(nav, NavigationError::RedirectLoop { depth, target });
            return;
        }

        debug_log!(
            "Guard redirected '{}' to {}",
            nav.route.full_path(),
            describe_location(location)
        );
        self.abort(nav, nav.failure(FailureKind::Redirected));
        let op = if location.replace {
            HistoryOp::Replace
        } else {
            HistoryOp::Push
        };
        if let Err(err) = self.transition(location, op, depth, None, None) {
            debug_log!("Redirect target rejected: {}", err);
        }
    }

    fn commit(&self, nav: &Rc<Navigation>) {
        if nav.settled.get() {
            return;
        }
        if !self.is_current(nav) {
            self.abort(nav, nav.failure(FailureKind::Cancelled));
            return;
        }
        nav.settled.set(true);

        let route = nav.route.clone();
        let (previous, listener) = {
            let mut state = self.inner.state.borrow_mut();
            state.phase = NavigationPhase::Committing;
            state.pending = None;
            let previous = std::mem::replace(&mut state.current, route.clone());
            (previous, state.listener.clone())
        };
        info_log!("Navigated to '{}'", route.full_path());

        if let Some(listener) = listener {
            listener(&route);
        }
        self.write_history(nav.op, &route);
        let on_complete = nav.on_complete.borrow_mut().take();
        if let Some(on_complete) = on_complete {
            on_complete(&route);
        }
        self.ensure_url(false);

        let hooks: Vec<AfterHook> = self
            .inner
            .hooks
            .borrow()
            .after_each
            .iter()
            .map(|(_, hook)| Rc::clone(hook))
            .collect();
        for hook in hooks {
            hook(&route, &previous);
        }

        let ready_callbacks = {
            let mut state = self.inner.state.borrow_mut();
            if state.ready {
                Vec::new()
            } else {
                state.ready = true;
                state.ready_error_callbacks.clear();
                std::mem::take(&mut state.ready_callbacks)
            }
        };
        for callback in ready_callbacks {
            callback(&route);
        }

        self.flush_entered(nav);

        let mut state = self.inner.state.borrow_mut();
        if state.is_current(nav.generation) {
            state.phase = NavigationPhase::Idle;
        }
    }

    /// Settle `nav` with `err`. Later calls for the same navigation are no-ops.
    pub(crate) fn abort(&self, nav: &Navigation, err: NavigationError) {
        if nav.settled.replace(true) {
            return;
        }
        nav.entered.borrow_mut().clear();
        {
            let mut state = self.inner.state.borrow_mut();
            if state.is_current(nav.generation) {
                state.pending = None;
                state.phase = NavigationPhase::Aborted;
            }
        }

        match err.failure_kind() {
            Some(FailureKind::Duplicated | FailureKind::Redirected) => {
                debug_log!("{}", err);
            }
            Some(FailureKind::Aborted | FailureKind::Cancelled) => {
                warn_log!("{}", err);
            }
            None => {
                let callbacks = self.inner.state.borrow().error_callbacks.clone();
                if callbacks.is_empty() {
                    error_log!("Uncaught error during navigation to '{}': {}", nav.route.full_path(), err);
                }
                for callback in callbacks {
                    callback(&err);
                }
            }
        }

        if let (HistoryOp::Go(delta), Some(FailureKind::Duplicated)) = (nav.op, err.failure_kind()) {
            self.inner.history.borrow_mut().go(delta);
        }

        let on_abort = nav.on_abort.borrow_mut().take();
        if let Some(on_abort) = on_abort {
            on_abort(err.clone());
        }

        // The first navigation redirecting leaves readiness to its target.
        let initial_redirect = err.is_failure_of(FailureKind::Redirected) && nav.from.is_start();
        let ready_errors = {
            let mut state = self.inner.state.borrow_mut();
            if state.ready || initial_redirect {
                Vec::new()
            } else {
                // The first settled failure also counts as becoming ready.
                state.ready = true;
                state.ready_callbacks.clear();
                std::mem::take(&mut state.ready_error_callbacks)
            }
        };
        for callback in ready_errors {
            callback(&err);
        }
    }

    fn flush_entered(&self, nav: &Navigation) {
        let entered = std::mem::take(&mut *nav.entered.borrow_mut());
        let activated = std::mem::take(&mut *nav.activated.borrow_mut());
        let current = self.inner.state.borrow().current.matched_ids();

        let batches = {
            let mut views = self.inner.views.borrow_mut();
            for record in activated {
                views.clear_entered(record);
            }
            for (record, slot, callback) in entered {
                views.push_entered(record, slot, callback);
            }
            views.drain_bound(&current)
        };
        for (instance, callbacks) in batches {
            for callback in callbacks {
                callback(&instance);
            }
        }
    }

    fn write_history(&self, op: HistoryOp, route: &Route) {
        let href = self.href(route.full_path());
        let mut history = self.inner.history.borrow_mut();
        match op {
            HistoryOp::Push => history.push_entry(&href),
            HistoryOp::Replace => history.replace_entry(&href),
            HistoryOp::Go(delta) => {
                if !history.go(delta) {
                    warn_log!("History cannot move by {}", delta);
                }
            }
            HistoryOp::Transition => {}
        }
    }

    /// Make the history show the current route.
    fn ensure_url(&self, push: bool) {
        let href = {
            let state = self.inner.state.borrow();
            if state.current.is_start() {
                return;
            }
            self.href(state.current.full_path())
        };
        self.inner.history.borrow_mut().ensure_location(&href, push);
    }

    pub(crate) fn href(&self, full_path: &str) -> String {
        clean_path(&format!("{}{}", self.inner.options.base(), full_path))
    }

    fn set_phase(&self, nav: &Navigation, phase: NavigationPhase) {
        let mut state = self.inner.state.borrow_mut();
        if state.is_current(nav.generation) {
            state.phase = phase;
        }
    }

    fn is_current(&self, nav: &Navigation) -> bool {
        self.inner.state.borrow().is_current(nav.generation)
    }
}

// ============================================================================
// NavigationFuture
// ============================================================================

enum FutureState {
    Ready(Option<Result<Route, NavigationError>>),
    Waiting {
        receiver: oneshot::Receiver<Result<Route, NavigationError>>,
        from: String,
        to: String,
    },
}

/// Resolves once a navigation started with [`Router::navigate`] settles.
///
/// A navigation that is dropped without settling, because a guard dropped
/// its [`Next`] and a newer navigation took over, resolves to a
/// `Cancelled` failure.
#[must_use = "futures do nothing unless polled"]
pub struct NavigationFuture {
    state: FutureState,
}

impl NavigationFuture {
    pub(crate) fn ready(result: Result<Route, NavigationError>) -> Self {
        Self {
            state: FutureState::Ready(Some(result)),
        }
    }

    pub(crate) fn waiting(
        receiver: oneshot::Receiver<Result<Route, NavigationError>>,
        from: String,
        to: &Location,
    ) -> Self {
        Self {
            state: FutureState::Waiting {
                receiver,
                from,
                to: describe_location(to),
            },
        }
    }
}

impl Future for NavigationFuture {
    type Output = Result<Route, NavigationError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().state {
            FutureState::Ready(result) => match result.take() {
                Some(result) => Poll::Ready(result),
                None => Poll::Pending,
            },
            FutureState::Waiting { receiver, from, to } => match Pin::new(receiver).poll(cx) {
                Poll::Ready(Ok(result)) => Poll::Ready(result),
                Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(NavigationFailure::new(
                    FailureKind::Cancelled,
                    from.as_str(),
                    to.as_str(),
                )
                .into())),
                Poll::Pending => Poll::Pending,
            },
        }
    }
}

impl fmt::Debug for NavigationFuture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let waiting = matches!(self.state, FutureState::Waiting { .. });
        f.debug_struct("NavigationFuture")
            .field("waiting", &waiting)
            .finish_non_exhaustive()
    }
}
