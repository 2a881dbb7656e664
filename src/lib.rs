//! # navigator-pipeline
//!
//! A client-side navigation pipeline: match a target location against a
//! route table, work out which route records are entered, left and reused,
//! run an ordered chain of asynchronously resolved guards, load lazy
//! components, and commit the new route.
//!
//! ## Features
//!
//! - **Route matching** with `:param`, `:optional?` and `*` segments,
//!   named routes, nested routes, aliases and redirects
//! - **Guards** at three levels: global (`before_each`, `before_resolve`),
//!   per record (`before_enter`) and per component (enter, update, leave)
//! - **Continuation-driven** guard queue: guards resolve [`Next`] now or
//!   later, nothing polls
//! - **Cancellation** of superseded navigations at every guard boundary
//! - **Lazy components** loaded once, through callbacks or futures
//! - **History backends** behind a trait, with an in-memory implementation
//! - **LRU match cache** (feature `cache`)
//! - **Logging** through `log` or `tracing`
//!
//! ## Quick start
//!
//! ```
//! use navigator_pipeline::{guard_fn, Location, RouteConfig, Router};
//!
//! let router = Router::new([
//!     RouteConfig::new("/").name("home"),
//!     RouteConfig::new("/users/:id")
//!         .name("user")
//!         .before_enter(guard_fn(|to, _from, next| {
//!             if to.params().get_str("id") == Some("0") {
//!                 next.abort();
//!             } else {
//!                 next.proceed();
//!             }
//!         })),
//! ]);
//!
//! router.init().unwrap();
//! router.push("/users/0").unwrap();
//! assert_eq!(router.current_route().path(), "/");
//!
//! router.push(Location::named("user").param("id", "42")).unwrap();
//! assert_eq!(router.current_route().path(), "/users/42");
//! ```
//!
//! ## Cargo features
//!
//! | Feature   | Default | Description                          |
//! |-----------|---------|--------------------------------------|
//! | `log`     | yes     | Log through the `log` crate          |
//! | `tracing` | no      | Log through the `tracing` crate      |
//! | `cache`   | yes     | LRU cache of path-scan results       |

#![cfg_attr(docsrs, feature(doc_cfg))]

#[macro_use]
pub mod logging;

#[cfg(feature = "cache")]
#[cfg_attr(docsrs, doc(cfg(feature = "cache")))]
pub mod cache;
mod components;
mod error;
mod guards;
pub mod history;
pub mod location;
mod matcher;
pub mod matching;
mod navigation;
pub mod options;
mod params;
pub mod queue;
mod record;
pub mod route;
mod router;
mod state;
mod views;

#[cfg(feature = "cache")]
pub use cache::{CacheStats, MatchCache};
pub use components::{Component, ComponentResolver, ComponentSlot, LazyComponent, DEFAULT_SLOT};
pub use error::{FailureKind, LoadError, NavigationError, NavigationFailure};
pub use guards::{
    guard_fn, AfterHook, EnteredCallback, FnGuard, GuardOutcome, GuardRef, HookHandle,
    NavigationGuard, Next, ViewInstance,
};
pub use history::{HistoryBackend, MemoryHistory};
pub use location::Location;
pub use matcher::{Matcher, DEFAULT_MAX_REDIRECTS};
pub use matching::{PathPattern, WILDCARD_PARAM};
pub use navigation::NavigationFuture;
pub use options::{RouterBuilder, RouterOptions};
pub use params::{ParamValue, QueryParams, RouteParams};
pub use record::{Meta, RecordId, Redirect, RedirectFn, RedirectTarget, RouteConfig, RouteRecord};
pub use route::{is_same_route, Route};
pub use router::{ResolvedLocation, Router};
pub use state::NavigationPhase;
