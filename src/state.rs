//! Navigation state owned by the router.

use crate::error::NavigationError;
use crate::route::Route;
use std::fmt;
use std::rc::Rc;

/// Where the most recent navigation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NavigationPhase {
    /// Nothing in flight; the last navigation committed or none ran yet.
    #[default]
    Idle,
    /// The target is being matched.
    Matching,
    /// Leave, global, update and enter-record guards plus component loading.
    RunningLeaveQueue,
    /// In-component enter guards and resolve hooks.
    RunningEnterQueue,
    /// The route is being committed.
    Committing,
    /// The last navigation stopped on a failure or an error.
    Aborted,
    /// The last navigation was superseded.
    Cancelled,
}

impl NavigationPhase {
    /// `true` while guards or component loads may still run.
    pub const fn is_in_flight(self) -> bool {
        matches!(
            self,
            Self::Matching | Self::RunningLeaveQueue | Self::RunningEnterQueue | Self::Committing
        )
    }
}

impl fmt::Display for NavigationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Matching => "matching",
            Self::RunningLeaveQueue => "running leave queue",
            Self::RunningEnterQueue => "running enter queue",
            Self::Committing => "committing",
            Self::Aborted => "aborted",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

pub(crate) type ReadyCallback = Box<dyn FnOnce(&Route)>;
pub(crate) type ReadyErrorCallback = Box<dyn FnOnce(&NavigationError)>;
pub(crate) type ErrorCallback = Rc<dyn Fn(&NavigationError)>;
pub(crate) type RouteListener = Rc<dyn Fn(&Route)>;

/// Mutable navigation state.
///
/// Every navigation bumps `generation`; a navigation whose captured
/// generation differs from the current one has been superseded.
pub(crate) struct NavigationState {
    pub(crate) current: Route,
    pub(crate) pending: Option<Route>,
    pub(crate) ready: bool,
    pub(crate) ready_callbacks: Vec<ReadyCallback>,
    pub(crate) ready_error_callbacks: Vec<ReadyErrorCallback>,
    pub(crate) error_callbacks: Vec<ErrorCallback>,
    pub(crate) listener: Option<RouteListener>,
    pub(crate) generation: u64,
    pub(crate) phase: NavigationPhase,
}

impl NavigationState {
    pub(crate) fn new() -> Self {
        Self {
            current: Route::start(),
            pending: None,
            ready: false,
            ready_callbacks: Vec::new(),
            ready_error_callbacks: Vec::new(),
            error_callbacks: Vec::new(),
            listener: None,
            generation: 0,
            phase: NavigationPhase::Idle,
        }
    }

    /// Start a new navigation towards `route` and return its generation.
    pub(crate) fn start_navigation(&mut self, route: Route) -> u64 {
        self.generation += 1;
        self.pending = Some(route);
        self.generation
    }

    /// Invalidate any navigation in flight without starting a new one.
    pub(crate) fn cancel_pending(&mut self) {
        self.generation += 1;
        self.pending = None;
    }

    pub(crate) const fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }
}

impl fmt::Debug for NavigationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationState")
            .field("current", &self.current.full_path())
            .field("pending", &self.pending.as_ref().map(Route::full_path))
            .field("ready", &self.ready)
            .field("generation", &self.generation)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_supersedes() {
        let mut state = NavigationState::new();
        let first = state.start_navigation(Route::start());
        assert!(state.is_current(first));

        let second = state.start_navigation(Route::start());
        assert!(!state.is_current(first));
        assert!(state.is_current(second));
    }

    #[test]
    fn test_cancel_pending() {
        let mut state = NavigationState::new();
        let generation = state.start_navigation(Route::start());
        state.cancel_pending();
        assert!(!state.is_current(generation));
        assert!(state.pending.is_none());
    }

    #[test]
    fn test_initial_state() {
        let state = NavigationState::new();
        assert!(state.current.is_start());
        assert!(!state.ready);
        assert_eq!(state.phase, NavigationPhase::Idle);
        assert!(!state.phase.is_in_flight());
    }
}
