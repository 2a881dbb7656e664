//! Test utilities for navigation pipeline tests
//!
//! Provides router fixtures, recording guards and outcome capture helpers.

#![allow(dead_code)]

use futures::FutureExt;
use navigator_pipeline::*;
use std::cell::RefCell;
use std::rc::Rc;

/// Shared, ordered record of what ran.
pub type Log = Rc<RefCell<Vec<String>>>;

/// Initialize `env_logger` once per test binary.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

/// Snapshot of a log.
pub fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

/// Guard that records `tag` and proceeds.
pub fn recording_guard(log: &Log, tag: &str) -> impl NavigationGuard {
    let log = Rc::clone(log);
    let tag = tag.to_string();
    guard_fn(move |_to, _from, next| {
        log.borrow_mut().push(tag.clone());
        next.proceed();
    })
}

/// Guard that records `tag` and aborts.
pub fn aborting_guard(log: &Log, tag: &str) -> impl NavigationGuard {
    let log = Rc::clone(log);
    let tag = tag.to_string();
    guard_fn(move |_to, _from, next| {
        log.borrow_mut().push(tag.clone());
        next.abort();
    })
}

/// Component whose enter, update and leave guards record into `log`.
pub fn recording_component(log: &Log, name: &str) -> Component {
    Component::new(name)
        .before_route_enter(recording_guard(log, &format!("enter {name}")))
        .before_route_update(recording_guard(log, &format!("update {name}")))
        .before_route_leave(recording_guard(log, &format!("leave {name}")))
}

/// Router over `routes` with a shared in-memory history.
pub fn router_with(routes: Vec<RouteConfig>) -> (Router, MemoryHistory) {
    init_logger();
    let history = MemoryHistory::new();
    let router = Router::builder()
        .routes(routes)
        .history(history.clone())
        .build();
    (router, history)
}

/// Push `location` and return the outcome if the navigation settled
/// synchronously.
pub fn push_now(router: &Router, location: impl Into<Location>) -> Option<Result<Route, NavigationError>> {
    router.navigate(location).now_or_never()
}

/// Push `location`, expecting the navigation to commit synchronously.
pub fn push_ok(router: &Router, location: impl Into<Location>) -> Route {
    match push_now(router, location) {
        Some(Ok(route)) => route,
        other => panic!("expected a committed navigation, got {other:?}"),
    }
}

/// Failure kind of a settled navigation, `None` if it committed or stalled.
pub fn failure_of(outcome: Option<Result<Route, NavigationError>>) -> Option<FailureKind> {
    match outcome {
        Some(Err(err)) => err.failure_kind(),
        _ => None,
    }
}

/// Captures the abort passed to `push_with`.
#[derive(Clone, Default)]
pub struct AbortSink(Rc<RefCell<Option<NavigationError>>>);

impl AbortSink {
    pub fn callback(&self) -> impl FnOnce(NavigationError) + 'static {
        let slot = Rc::clone(&self.0);
        move |err| *slot.borrow_mut() = Some(err)
    }

    pub fn take(&self) -> Option<NavigationError> {
        self.0.borrow_mut().take()
    }

    pub fn kind(&self) -> Option<FailureKind> {
        self.0.borrow().as_ref().and_then(NavigationError::failure_kind)
    }
}
