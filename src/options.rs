//! Router configuration.
//!
//! ```
//! use navigator_pipeline::{MemoryHistory, RouteConfig, Router, RouterOptions};
//!
//! let history = MemoryHistory::new();
//! let router = Router::builder()
//!     .options(RouterOptions::new().with_base("app/").with_max_redirects(5))
//!     .route(RouteConfig::new("/"))
//!     .route(RouteConfig::new("/users/:id").name("user"))
//!     .history(history.clone())
//!     .build();
//!
//! assert_eq!(router.options().base(), "/app");
//! ```

use crate::history::{HistoryBackend, MemoryHistory};
use crate::matcher::DEFAULT_MAX_REDIRECTS;
use crate::record::RouteConfig;
use crate::router::Router;
use futures::task::LocalSpawn;
use std::fmt;
use std::rc::Rc;

/// Default number of paths kept by the match cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Tunables of a [`Router`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterOptions {
    base: String,
    max_redirects: usize,
    cache_capacity: usize,
}

impl RouterOptions {
    /// Defaults: no base, 10 redirects, 256 cached paths.
    pub fn new() -> Self {
        Self {
            base: String::new(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }

    /// Prefix of every URL written to history, see [`normalize_base`].
    #[must_use]
    pub fn with_base(mut self, base: &str) -> Self {
        self.base = normalize_base(base);
        self
    }

    /// Bound on chained redirects, both in the route table and from guards.
    #[must_use]
    pub const fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Number of paths kept by the match cache.
    #[must_use]
    pub const fn with_cache_capacity(mut self, cache_capacity: usize) -> Self {
        self.cache_capacity = cache_capacity;
        self
    }

    /// Normalized base, empty when unset.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Bound on chained redirects.
    pub const fn max_redirects(&self) -> usize {
        self.max_redirects
    }

    /// Match cache capacity.
    pub const fn cache_capacity(&self) -> usize {
        self.cache_capacity
    }
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Give a base a leading slash and strip its trailing one.
///
/// ```
/// use navigator_pipeline::options::normalize_base;
///
/// assert_eq!(normalize_base("app/"), "/app");
/// assert_eq!(normalize_base("/"), "");
/// assert_eq!(normalize_base(""), "");
/// ```
pub fn normalize_base(base: &str) -> String {
    let base = if base.starts_with('/') {
        base.to_string()
    } else {
        format!("/{base}")
    };
    base.strip_suffix('/').unwrap_or(&base).to_string()
}

/// Assembles a [`Router`].
pub struct RouterBuilder {
    pub(crate) options: RouterOptions,
    pub(crate) routes: Vec<RouteConfig>,
    pub(crate) history: Option<Box<dyn HistoryBackend>>,
    pub(crate) spawner: Option<Rc<dyn LocalSpawn>>,
}

impl RouterBuilder {
    pub(crate) fn new() -> Self {
        Self {
            options: RouterOptions::new(),
            routes: Vec::new(),
            history: None,
            spawner: None,
        }
    }

    /// Use `options`.
    #[must_use]
    pub fn options(mut self, options: RouterOptions) -> Self {
        self.options = options;
        self
    }

    /// Add a top-level route.
    #[must_use]
    pub fn route(mut self, route: RouteConfig) -> Self {
        self.routes.push(route);
        self
    }

    /// Add top-level routes in order.
    #[must_use]
    pub fn routes(mut self, routes: impl IntoIterator<Item = RouteConfig>) -> Self {
        self.routes.extend(routes);
        self
    }

    /// Use `history` instead of a fresh [`MemoryHistory`].
    #[must_use]
    pub fn history(mut self, history: impl HistoryBackend + 'static) -> Self {
        self.history = Some(Box::new(history));
        self
    }

    /// Executor for future-style lazy component loaders.
    #[must_use]
    pub fn spawner(mut self, spawner: impl LocalSpawn + 'static) -> Self {
        self.spawner = Some(Rc::new(spawner));
        self
    }

    /// Build the router. No navigation runs until [`Router::init`] or a push.
    pub fn build(self) -> Router {
        let history = self
            .history
            .unwrap_or_else(|| Box::new(MemoryHistory::new()));
        Router::from_parts(self.options, self.routes, history, self.spawner)
    }
}

impl fmt::Debug for RouterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("options", &self.options)
            .field("routes", &self.routes.len())
            .field("history", &self.history.is_some())
            .field("spawner", &self.spawner.is_some())
            .finish()
    }
}
