//! Errors and navigation failures.
//!
//! Two families of outcomes can stop a navigation:
//!
//! - [`NavigationFailure`]: flow conditions that are part of normal
//!   operation: the target equals the current route, a newer navigation
//!   superseded this one, a guard redirected or a guard aborted. They are
//!   delivered to the navigation's own abort callback and never reach the
//!   global [`on_error`](crate::Router::on_error) callbacks.
//! - Everything else in [`NavigationError`]: matching errors, guard errors,
//!   guard panics, lazy component failures and redirect loops. These are
//!   defects or environmental problems and are reported to every registered
//!   error callback.
//!
//! # Examples
//!
//! ```
//! use navigator_pipeline::{FailureKind, NavigationError, NavigationFailure};
//!
//! let err = NavigationError::from(NavigationFailure::new(FailureKind::Aborted, "/a", "/b"));
//! assert!(err.is_failure());
//! assert!(err.is_failure_of(FailureKind::Aborted));
//! assert_eq!(
//!     err.to_string(),
//!     "Navigation aborted from \"/a\" to \"/b\" via a navigation guard."
//! );
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

// ============================================================================
// NavigationFailure
// ============================================================================

/// Kind of a [`NavigationFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The target resolves to the route that is already current.
    Duplicated,
    /// A newer navigation started before this one finished.
    Cancelled,
    /// A guard redirected to another location.
    Redirected,
    /// A guard aborted the navigation.
    Aborted,
}

/// A navigation that stopped for a flow reason rather than a defect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationFailure {
    /// Why the navigation stopped.
    pub kind: FailureKind,
    /// Full path of the route the navigation started from.
    pub from: String,
    /// Full path of the route the navigation was heading to.
    pub to: String,
}

impl NavigationFailure {
    /// Create a failure of `kind` between two full paths.
    pub fn new(kind: FailureKind, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            kind,
            from: from.into(),
            to: to.into(),
        }
    }
}

impl fmt::Display for NavigationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FailureKind::Duplicated => {
                write!(f, "Avoided redundant navigation to current location: \"{}\".", self.to)
            }
            FailureKind::Cancelled => write!(
                f,
                "Navigation cancelled from \"{}\" to \"{}\" with a new navigation.",
                self.from, self.to
            ),
            FailureKind::Redirected => write!(
                f,
                "Redirected when going from \"{}\" to \"{}\" via a navigation guard.",
                self.from, self.to
            ),
            FailureKind::Aborted => write!(
                f,
                "Navigation aborted from \"{}\" to \"{}\" via a navigation guard.",
                self.from, self.to
            ),
        }
    }
}

impl StdError for NavigationFailure {}

// ============================================================================
// NavigationError
// ============================================================================

/// Everything that can stop a navigation.
#[derive(Debug, Clone, Error)]
pub enum NavigationError {
    /// A flow condition, see [`NavigationFailure`].
    #[error(transparent)]
    Failure(#[from] NavigationFailure),

    /// The matcher could not build a route (missing required param,
    /// redirect loop inside the route table, ...).
    #[error("Matching failed: {message}")]
    Matching { message: String },

    /// A guard passed an error to its continuation.
    #[error("Navigation guard error: {0}")]
    Guard(Rc<dyn StdError>),

    /// A guard panicked while it was running.
    #[error("Navigation guard panicked: {message}")]
    GuardPanicked { message: String },

    /// A lazy component loader rejected or could not be started.
    #[error("Failed to resolve async component {slot}: {message}")]
    AsyncComponent { slot: String, message: String },

    /// Guards kept redirecting past the configured limit.
    #[error("Redirect loop detected (depth {depth}) while navigating to \"{target}\"")]
    RedirectLoop { depth: usize, target: String },
}

impl NavigationError {
    /// Wrap an application error passed to [`Next::error`](crate::Next::error).
    pub fn guard<E>(err: E) -> Self
    where
        E: StdError + 'static,
    {
        Self::Guard(Rc::new(err))
    }

    /// Create a matching error.
    pub fn matching(message: impl Into<String>) -> Self {
        Self::Matching {
            message: message.into(),
        }
    }

    /// `true` for the four flow conditions.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// The failure kind, if this is a flow condition.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Failure(failure) => Some(failure.kind),
            _ => None,
        }
    }

    /// `true` if this is a flow condition of the given kind.
    pub fn is_failure_of(&self, kind: FailureKind) -> bool {
        self.failure_kind() == Some(kind)
    }
}

// ============================================================================
// LoadError
// ============================================================================

/// Rejection reason reported by a lazy component loader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct LoadError {
    message: String,
}

impl LoadError {
    /// Create a load error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The rejection message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for LoadError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for LoadError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("session expired")]
    struct SessionExpired;

    #[test]
    fn test_failure_display() {
        let failure = NavigationFailure::new(FailureKind::Cancelled, "/a", "/b");
        assert_eq!(
            failure.to_string(),
            "Navigation cancelled from \"/a\" to \"/b\" with a new navigation."
        );

        let failure = NavigationFailure::new(FailureKind::Duplicated, "/a", "/a");
        assert_eq!(
            failure.to_string(),
            "Avoided redundant navigation to current location: \"/a\"."
        );
    }

    #[test]
    fn test_failure_classification() {
        let err = NavigationError::from(NavigationFailure::new(FailureKind::Redirected, "/", "/x"));
        assert!(err.is_failure());
        assert!(err.is_failure_of(FailureKind::Redirected));
        assert!(!err.is_failure_of(FailureKind::Aborted));
    }

    #[test]
    fn test_guard_error_is_not_a_failure() {
        let err = NavigationError::guard(SessionExpired);
        assert!(!err.is_failure());
        assert_eq!(err.failure_kind(), None);
        assert_eq!(err.to_string(), "Navigation guard error: session expired");
    }

    #[test]
    fn test_async_component_display() {
        let err = NavigationError::AsyncComponent {
            slot: "default".into(),
            message: "chunk missing".into(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to resolve async component default: chunk missing"
        );
    }

    #[test]
    fn test_load_error_conversions() {
        let err: LoadError = "offline".into();
        assert_eq!(err.message(), "offline");
        assert_eq!(LoadError::from(String::from("x")).to_string(), "x");
    }
}
