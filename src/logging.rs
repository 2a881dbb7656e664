//! Logging facade.
//!
//! The pipeline logs through a small set of macros that forward to either
//! the [`log`](https://docs.rs/log) or the [`tracing`](https://docs.rs/tracing)
//! crate, selected by Cargo feature. Enable at most one of the two.
//!
//! | Feature    | Backend         | Default |
//! |------------|-----------------|---------|
//! | `log`      | `log` crate     | yes     |
//! | `tracing`  | `tracing` crate | no      |
//!
//! Every record is emitted under the `navigator_pipeline` target so that
//! applications can filter router output independently of their own, e.g.
//! `RUST_LOG=navigator_pipeline=debug`.
//!
//! Levels used by the crate:
//!
//! - `trace_log!`: one line per guard step and outcome.
//! - `debug_log!`: queue construction, record diffs, cache activity.
//! - `info_log!`: navigation start and commit.
//! - `warn_log!`: configuration problems (unknown named route, invalid
//!   redirect, duplicate record) and cancelled/aborted navigations.
//! - `error_log!`: navigation errors nobody subscribed to.
//!
//! ```ignore
//! use navigator_pipeline::{debug_log, warn_log};
//!
//! debug_log!("queue A built with {} steps", len);
//! warn_log!("Route with name '{}' does not exist", name);
//! ```

/// Log target shared by every macro below.
#[doc(hidden)]
pub const LOG_TARGET: &str = "navigator_pipeline";

/// Emit a **trace**-level record under the crate target.
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::trace!(target: $crate::logging::LOG_TARGET, $($arg)*);
        #[cfg(feature = "log")]
        ::log::trace!(target: $crate::logging::LOG_TARGET, $($arg)*);
    };
}

/// Emit a **debug**-level record under the crate target.
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!(target: $crate::logging::LOG_TARGET, $($arg)*);
        #[cfg(feature = "log")]
        ::log::debug!(target: $crate::logging::LOG_TARGET, $($arg)*);
    };
}

/// Emit an **info**-level record under the crate target.
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::info!(target: $crate::logging::LOG_TARGET, $($arg)*);
        #[cfg(feature = "log")]
        ::log::info!(target: $crate::logging::LOG_TARGET, $($arg)*);
    };
}

/// Emit a **warn**-level record under the crate target.
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::warn!(target: $crate::logging::LOG_TARGET, $($arg)*);
        #[cfg(feature = "log")]
        ::log::warn!(target: $crate::logging::LOG_TARGET, $($arg)*);
    };
}

/// Emit an **error**-level record under the crate target.
#[macro_export]
macro_rules! error_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::error!(target: $crate::logging::LOG_TARGET, $($arg)*);
        #[cfg(feature = "log")]
        ::log::error!(target: $crate::logging::LOG_TARGET, $($arg)*);
    };
}
