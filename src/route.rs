//! Resolved navigation targets.

use crate::params::{QueryParams, RouteParams};
use crate::record::{Meta, RecordId, RouteRecord};
use std::fmt;
use std::rc::Rc;

/// A resolved navigation target.
///
/// Routes are values: every match builds a new one and nothing mutates it
/// afterwards. `matched` lists the records from the root to the deepest one.
#[derive(Clone)]
pub struct Route {
    name: Option<String>,
    path: String,
    hash: String,
    query: QueryParams,
    params: RouteParams,
    full_path: String,
    meta: Meta,
    matched: Vec<Rc<RouteRecord>>,
    redirected_from: Option<String>,
    start: bool,
}

impl Route {
    /// The sentinel route the router starts on. Nothing is matched.
    pub fn start() -> Self {
        Self {
            name: None,
            path: "/".to_string(),
            hash: String::new(),
            query: QueryParams::new(),
            params: RouteParams::new(),
            full_path: "/".to_string(),
            meta: Meta::new(),
            matched: Vec::new(),
            redirected_from: None,
            start: true,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: Option<String>,
        path: String,
        query: QueryParams,
        hash: String,
        params: RouteParams,
        meta: Meta,
        matched: Vec<Rc<RouteRecord>>,
        redirected_from: Option<String>,
    ) -> Self {
        let full_path = full_path(&path, &query, &hash);
        Self {
            name,
            path,
            hash,
            query,
            params,
            full_path,
            meta,
            matched,
            redirected_from,
            start: false,
        }
    }

    /// Route name, from the location or from the deepest record.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Concrete path without query and hash.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Fragment including `#`, or empty.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Query params.
    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    /// Route params.
    pub fn params(&self) -> &RouteParams {
        &self.params
    }

    /// `path` + `?query` + `hash`.
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    /// Meta of the deepest matched record.
    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    /// Matched records, root first.
    pub fn matched(&self) -> &[Rc<RouteRecord>] {
        &self.matched
    }

    /// Ids of the matched records, root first.
    pub fn matched_ids(&self) -> Vec<RecordId> {
        self.matched.iter().map(|record| record.id()).collect()
    }

    /// Full path of the original location when the match followed a redirect.
    pub fn redirected_from(&self) -> Option<&str> {
        self.redirected_from.as_deref()
    }

    /// `true` for [`Route::start`].
    pub const fn is_start(&self) -> bool {
        self.start
    }

    /// `true` when no record matched.
    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }

    /// Deepest matched record.
    pub fn leaf(&self) -> Option<&Rc<RouteRecord>> {
        self.matched.last()
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("full_path", &self.full_path)
            .field("params", &self.params)
            .field("matched", &self.matched_ids())
            .field("redirected_from", &self.redirected_from)
            .field("start", &self.start)
            .finish()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path)
    }
}

/// Build `path?query#hash`.
pub(crate) fn full_path(path: &str, query: &QueryParams, hash: &str) -> String {
    let mut full = if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    };
    if !query.is_empty() {
        full.push('?');
        full.push_str(&query.to_query_string());
    }
    full.push_str(hash);
    full
}

/// Compare two routes the way duplicate detection does.
///
/// Paths are compared ignoring one trailing slash, then hash and query must
/// be equal. Params are not compared: equal paths imply equal params for a
/// given record. The start route is only equal to another start route.
///
/// ```
/// use navigator_pipeline::{route::is_same_route, Route};
///
/// assert!(is_same_route(&Route::start(), &Route::start()));
/// ```
pub fn is_same_route(a: &Route, b: &Route) -> bool {
    if b.is_start() || a.is_start() {
        return a.is_start() && b.is_start();
    }
    if !a.path.is_empty() && !b.path.is_empty() {
        return strip_trailing_slash(&a.path) == strip_trailing_slash(&b.path)
            && a.hash == b.hash
            && a.query == b.query;
    }
    match (&a.name, &b.name) {
        (Some(left), Some(right)) => {
            left == right && a.hash == b.hash && a.query == b.query && a.params == b.params
        }
        _ => false,
    }
}

fn strip_trailing_slash(path: &str) -> &str {
    path.strip_suffix('/').unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(path: &str, query: QueryParams, hash: &str) -> Route {
        Route::new(
            None,
            path.to_string(),
            query,
            hash.to_string(),
            RouteParams::new(),
            Meta::new(),
            Vec::new(),
            None,
        )
    }

    #[test]
    fn test_full_path() {
        let query: QueryParams = [("q", "a b")].into_iter().collect();
        let route = route("/search", query, "#top");
        assert_eq!(route.full_path(), "/search?q=a%20b#top");
    }

    #[test]
    fn test_start_route() {
        let start = Route::start();
        assert!(start.is_start());
        assert!(start.is_empty());
        assert_eq!(start.full_path(), "/");
    }

    #[test]
    fn test_same_route_ignores_trailing_slash() {
        let a = route("/a/", QueryParams::new(), "");
        let b = route("/a", QueryParams::new(), "");
        assert!(is_same_route(&a, &b));
    }

    #[test]
    fn test_same_route_compares_query_and_hash() {
        let query: QueryParams = [("x", "1")].into_iter().collect();
        let a = route("/a", query, "");
        let b = route("/a", QueryParams::new(), "");
        assert!(!is_same_route(&a, &b));

        let c = route("/a", QueryParams::new(), "#h");
        assert!(!is_same_route(&b, &c));
    }

    #[test]
    fn test_start_is_only_same_as_start() {
        let root = route("/", QueryParams::new(), "");
        assert!(!is_same_route(&root, &Route::start()));
        assert!(!is_same_route(&Route::start(), &root));
    }
}
