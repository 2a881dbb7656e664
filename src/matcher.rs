//! Route table and location matching.
//!
//! [`Matcher`] owns the flattened route table: an arena of
//! [`RouteRecord`]s, the ordered path list scanned for path matches, and
//! the path and name indices. [`Matcher::match_location`] turns a raw
//! [`Location`] into a [`Route`]:
//!
//! 1. the location is normalized against the current route;
//! 2. a named location looks its record up by name and fills the record's
//!    path, inheriting required params from the current route;
//! 3. a path location takes the first record in the path list whose pattern
//!    matches;
//! 4. redirects and aliases of the matched record are followed.
//!
//! Nothing matching is not an error: the result is a route with an empty
//! `matched` list.
//!
//! # Example
//!
//! ```
//! use navigator_pipeline::{Location, Matcher, Route, RouteConfig};
//!
//! let mut matcher = Matcher::default();
//! matcher.add_routes([
//!     RouteConfig::new("/a"),
//!     RouteConfig::new("/b/:id").name("b"),
//! ]);
//!
//! let route = matcher
//!     .match_location(&Location::named("b").param("id", "7"), &Route::start(), None)
//!     .unwrap();
//! assert_eq!(route.path(), "/b/7");
//! assert_eq!(route.matched().len(), 1);
//! ```

#[cfg(feature = "cache")]
use crate::cache::{CacheStats, MatchCache};
use crate::error::NavigationError;
use crate::location::{normalize_location, parse_path, resolve_path, Location};
use crate::matching::{clean_path, PathPattern};
use crate::options::DEFAULT_CACHE_CAPACITY;
use crate::params::{QueryParams, RouteParams};
use crate::record::{Redirect, RedirectTarget, RecordId, RouteConfig, RouteRecord};
use crate::route::{full_path, Route};
use crate::{debug_log, trace_log, warn_log};
#[cfg(feature = "cache")]
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Default bound on chained redirects.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// The route table plus the matching algorithm.
pub struct Matcher {
    records: Vec<Rc<RouteRecord>>,
    path_list: Vec<RecordId>,
    path_map: HashMap<String, RecordId>,
    name_map: HashMap<String, RecordId>,
    max_redirects: usize,
    #[cfg(feature = "cache")]
    cache: RefCell<MatchCache>,
}

impl Matcher {
    /// Create an empty table.
    ///
    /// `cache_capacity` is ignored without the `cache` feature.
    pub fn new(max_redirects: usize, cache_capacity: usize) -> Self {
        #[cfg(not(feature = "cache"))]
        let _ = cache_capacity;
        Self {
            records: Vec::new(),
            path_list: Vec::new(),
            path_map: HashMap::new(),
            name_map: HashMap::new(),
            max_redirects,
            #[cfg(feature = "cache")]
            cache: RefCell::new(MatchCache::with_capacity(cache_capacity)),
        }
    }

    // ========================================================================
    // Route table
    // ========================================================================

    /// Add a top-level route and its children. Returns the id of its record.
    pub fn add_route(&mut self, config: RouteConfig) -> RecordId {
        let id = self.add_route_record(&config, None, None);
        self.invalidate();
        id
    }

    /// Add several top-level routes in order.
    pub fn add_routes(&mut self, configs: impl IntoIterator<Item = RouteConfig>) {
        for config in configs {
            self.add_route_record(&config, None, None);
        }
        self.invalidate();
    }

    /// Add a route under the record named `parent_name`.
    ///
    /// Returns `None`, with a warning, when no such record exists.
    pub fn add_child_route(&mut self, parent_name: &str, config: RouteConfig) -> Option<RecordId> {
        let Some(parent) = self.name_map.get(parent_name).copied() else {
            warn_log!("Cannot add child route: parent route '{}' does not exist", parent_name);
            return None;
        };
        let id = self.add_route_record(&config, Some(parent), None);
        self.invalidate();
        Some(id)
    }

    fn add_route_record(
        &mut self,
        config: &RouteConfig,
        parent: Option<RecordId>,
        match_as: Option<String>,
    ) -> RecordId {
        let parent_path = parent.and_then(|id| self.record(id)).map(|r| r.path.clone());
        let path = normalize_record_path(&config.path, parent_path.as_deref());
        let id = RecordId(self.records.len());

        self.records.push(Rc::new(RouteRecord {
            id,
            path: path.clone(),
            pattern: PathPattern::with_case_sensitivity(&path, config.case_sensitive),
            name: config.name.clone(),
            components: config.components.clone(),
            parent,
            redirect: config.redirect.clone(),
            match_as: match_as.clone(),
            before_enter: config.before_enter.clone(),
            meta: config.meta.clone(),
        }));

        // Children go into the path list before their parent, so a child
        // with an empty path wins over the parent's identical pattern.
        for child in &config.children {
            let child_match_as = match_as
                .as_deref()
                .map(|target| clean_path(&format!("{target}/{}", child.path)));
            self.add_route_record(child, Some(id), child_match_as);
        }

        if self.path_map.contains_key(&path) {
            debug_log!("Path '{}' already registered, record {} is not scanned", path, id);
        } else {
            self.path_map.insert(path.clone(), id);
            self.path_list.push(id);
        }

        for alias in &config.aliases {
            if *alias == path {
                warn_log!("Alias '{}' is the same as its route path and is ignored", alias);
                continue;
            }
            let alias_config = RouteConfig {
                path: alias.clone(),
                children: config.children.clone(),
                case_sensitive: config.case_sensitive,
                ..RouteConfig::default()
            };
            self.add_route_record(&alias_config, parent, Some(path.clone()));
        }

        if let Some(name) = &config.name {
            if self.name_map.contains_key(name) {
                warn_log!("Duplicate named route '{}' (path '{}') is ignored", name, path);
            } else {
                self.name_map.insert(name.clone(), id);
            }
        }

        trace_log!("Registered record {} for '{}'", id, path);
        id
    }

    fn invalidate(&self) {
        #[cfg(feature = "cache")]
        self.cache.borrow_mut().clear();
    }

    /// Records in path-list order.
    pub fn get_routes(&self) -> Vec<Rc<RouteRecord>> {
        self.path_list
            .iter()
            .filter_map(|id| self.record(*id).cloned())
            .collect()
    }

    /// Record by id.
    pub fn record(&self, id: RecordId) -> Option<&Rc<RouteRecord>> {
        self.records.get(id.0)
    }

    /// Record by route name.
    pub fn record_by_name(&self, name: &str) -> Option<&Rc<RouteRecord>> {
        self.name_map.get(name).and_then(|id| self.record(*id))
    }

    /// Record registered for an exact full path.
    pub fn record_by_path(&self, path: &str) -> Option<&Rc<RouteRecord>> {
        self.path_map.get(path).and_then(|id| self.record(*id))
    }

    /// Number of records, aliases and shadowed paths included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` when no route was added.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Counters of the path-scan cache.
    #[cfg(feature = "cache")]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.borrow().stats().clone()
    }

    // ========================================================================
    // Matching
    // ========================================================================

    /// Resolve `raw` against the table.
    ///
    /// `current` provides relative paths and inherited params.
    /// `redirected_from` is recorded on the resulting route.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::Matching`] when a required param is
    /// missing, a redirect names an unknown route, or redirects chain past
    /// the configured limit.
    pub fn match_location(
        &self,
        raw: &Location,
        current: &Route,
        redirected_from: Option<&Location>,
    ) -> Result<Route, NavigationError> {
        self.match_at_depth(raw, current, redirected_from, 0)
    }

    fn match_at_depth(
        &self,
        raw: &Location,
        current: &Route,
        redirected_from: Option<&Location>,
        depth: usize,
    ) -> Result<Route, NavigationError> {
        let mut location = normalize_location(raw, current, false)?;

        if let Some(name) = location.name.clone() {
            let Some(record) = self.record_by_name(&name).cloned() else {
                warn_log!("Route with name '{}' does not exist", name);
                return Ok(self.create_route(None, &location, redirected_from));
            };

            for key in record.pattern().required_keys() {
                if location.params.contains(key) {
                    continue;
                }
                if let Some(value) = current.params().get(key) {
                    location.params.insert(key, value.clone());
                }
            }

            let path = record.pattern().fill(&location.params).map_err(|err| {
                NavigationError::matching(format!("missing param for named route \"{name}\": {err}"))
            })?;
            location.path = Some(path);
            return self.route_for_record(&record, location, redirected_from, depth);
        }

        if let Some(path) = location.path.clone() {
            location.params = RouteParams::new();
            if let Some((id, params)) = self.scan(&path) {
                if let Some(record) = self.record(id).cloned() {
                    location.params = params;
                    return self.route_for_record(&record, location, redirected_from, depth);
                }
            }
        }

        Ok(self.create_route(None, &location, None))
    }

    fn scan(&self, path: &str) -> Option<(RecordId, RouteParams)> {
        #[cfg(feature = "cache")]
        if let Some(hit) = self.cache.borrow_mut().get(path) {
            return hit;
        }

        let result = self.path_list.iter().find_map(|id| {
            self.record(*id)
                .and_then(|record| record.pattern().matches(path))
                .map(|params| (*id, params))
        });

        #[cfg(feature = "cache")]
        self.cache.borrow_mut().insert(path.to_string(), result.clone());

        result
    }

    fn route_for_record(
        &self,
        record: &Rc<RouteRecord>,
        location: Location,
        redirected_from: Option<&Location>,
        depth: usize,
    ) -> Result<Route, NavigationError> {
        if let Some(redirect) = record.redirect() {
            // Chained redirects keep the very first location.
            let original = redirected_from.cloned().unwrap_or(location);
            return self.follow_redirect(record, redirect, original, depth);
        }
        if let Some(match_as) = record.match_as() {
            return self.follow_alias(location, match_as, depth);
        }
        Ok(self.create_route(Some(record), &location, redirected_from))
    }

    fn follow_redirect(
        &self,
        record: &Rc<RouteRecord>,
        redirect: &Redirect,
        original: Location,
        depth: usize,
    ) -> Result<Route, NavigationError> {
        if depth >= self.max_redirects {
            return Err(NavigationError::matching(format!(
                "redirect loop: more than {} redirects while matching \"{}\"",
                self.max_redirects,
                location_full_path(&original)
            )));
        }

        let in_progress = self.create_route(Some(record), &original, None);
        let target = match redirect.target(&in_progress)? {
            RedirectTarget::Path(path) => Location::path(path),
            RedirectTarget::Location(location) => location,
            RedirectTarget::Invalid => {
                warn_log!("Invalid redirect option on route '{}'", record.path());
                return Ok(self.create_route(None, &original, None));
            }
        };

        let query = if target.query.is_empty() {
            original.query.clone()
        } else {
            target.query.clone()
        };
        let hash = target.hash.clone().or_else(|| original.hash.clone());
        let params = if target.params.is_empty() {
            original.params.clone()
        } else {
            target.params.clone()
        };

        if let Some(name) = target.name {
            if self.record_by_name(&name).is_none() {
                return Err(NavigationError::matching(format!(
                    "redirect failed: named route \"{name}\" not found."
                )));
            }
            let next = Location {
                name: Some(name),
                params,
                query,
                hash,
                ..Location::default()
            };
            debug_log!("Redirecting '{}' to named route", record.path());
            return self.match_at_depth(&next, &Route::start(), Some(&original), depth + 1);
        }

        if let Some(path) = target.path {
            let parsed = parse_path(&path);
            let parent_path = record
                .parent()
                .and_then(|id| self.record(id))
                .map_or("/", |parent| parent.path());
            let raw_path = resolve_path(parsed.path, parent_path, true);
            let filled = PathPattern::parse(&raw_path).fill(&params).map_err(|err| {
                NavigationError::matching(format!(
                    "missing param for redirect route with path \"{raw_path}\": {err}"
                ))
            })?;

            let mut query = query;
            if !parsed.query.is_empty() {
                query = QueryParams::from_query_string(parsed.query);
            }
            let hash = if parsed.hash.is_empty() {
                hash
            } else {
                Some(parsed.hash.to_string())
            };

            let next = Location {
                path: Some(filled),
                query,
                hash,
                ..Location::default()
            };
            debug_log!("Redirecting '{}' to '{}'", record.path(), raw_path);
            return self.match_at_depth(&next, &Route::start(), Some(&original), depth + 1);
        }

        warn_log!("Invalid redirect option on route '{}': no name or path", record.path());
        Ok(self.create_route(None, &original, None))
    }

    fn follow_alias(
        &self,
        location: Location,
        match_as: &str,
        depth: usize,
    ) -> Result<Route, NavigationError> {
        let aliased_path = PathPattern::parse(match_as)
            .fill(&location.params)
            .map_err(|err| {
                NavigationError::matching(format!(
                    "missing param for aliased route with path \"{match_as}\": {err}"
                ))
            })?;

        let aliased = self.match_at_depth(&Location::path(aliased_path), &Route::start(), None, depth)?;
        match aliased.leaf().cloned() {
            Some(record) => {
                let mut location = location;
                location.params = aliased.params().clone();
                self.route_for_record(&record, location, None, depth)
            }
            None => Ok(self.create_route(None, &location, None)),
        }
    }

    fn create_route(
        &self,
        record: Option<&Rc<RouteRecord>>,
        location: &Location,
        redirected_from: Option<&Location>,
    ) -> Route {
        let name = location
            .name
            .clone()
            .or_else(|| record.and_then(|r| r.name.clone()));
        let meta = record.map(|r| r.meta().clone()).unwrap_or_default();
        let matched = record.map(|r| self.format_match(r)).unwrap_or_default();

        Route::new(
            name,
            location.path.clone().unwrap_or_else(|| "/".to_string()),
            location.query.clone(),
            location.hash.clone().unwrap_or_default(),
            location.params.clone(),
            meta,
            matched,
            redirected_from.map(location_full_path),
        )
    }

    /// The record and its ancestors, root first.
    fn format_match(&self, record: &Rc<RouteRecord>) -> Vec<Rc<RouteRecord>> {
        let mut matched = vec![Rc::clone(record)];
        let mut parent = record.parent();
        while let Some(id) = parent {
            let Some(record) = self.record(id) else {
                break;
            };
            matched.push(Rc::clone(record));
            parent = record.parent();
        }
        matched.reverse();
        matched
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REDIRECTS, DEFAULT_CACHE_CAPACITY)
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher")
            .field("records", &self.records.len())
            .field("path_list", &self.path_list)
            .field("names", &self.name_map.len())
            .field("max_redirects", &self.max_redirects)
            .finish_non_exhaustive()
    }
}

/// Join a configured path with its parent's full path.
fn normalize_record_path(path: &str, parent: Option<&str>) -> String {
    let path = path.strip_suffix('/').unwrap_or(path);
    if path.starts_with('/') {
        return path.to_string();
    }
    match parent {
        Some(parent) => clean_path(&format!("{parent}/{path}")),
        None if path.is_empty() => "/".to_string(),
        None => format!("/{path}"),
    }
}

fn location_full_path(location: &Location) -> String {
    full_path(
        location.path.as_deref().unwrap_or("/"),
        &location.query,
        location.hash.as_deref().unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::WILDCARD_PARAM;

    fn matcher(routes: impl IntoIterator<Item = RouteConfig>) -> Matcher {
        let mut matcher = Matcher::default();
        matcher.add_routes(routes);
        matcher
    }

    fn match_path(matcher: &Matcher, path: &str) -> Route {
        matcher
            .match_location(&Location::from(path), &Route::start(), None)
            .unwrap()
    }

    fn paths(route: &Route) -> Vec<String> {
        route.matched().iter().map(|r| r.path().to_string()).collect()
    }

    #[test]
    fn test_normalize_record_path() {
        assert_eq!(normalize_record_path("/", None), "/");
        assert_eq!(normalize_record_path("a/", None), "/a");
        assert_eq!(normalize_record_path(":id", Some("/users")), "/users/:id");
        assert_eq!(normalize_record_path("", Some("/users")), "/users/");
        assert_eq!(normalize_record_path("/abs", Some("/users")), "/abs");
    }

    #[test]
    fn test_first_match_wins() {
        let m = matcher([
            RouteConfig::new("/users/new").name("new"),
            RouteConfig::new("/users/:id").name("user"),
        ]);
        assert_eq!(match_path(&m, "/users/new").name(), Some("new"));
        assert_eq!(match_path(&m, "/users/3").name(), Some("user"));
    }

    #[test]
    fn test_no_match_is_empty_route() {
        let m = matcher([RouteConfig::new("/a")]);
        let route = match_path(&m, "/missing?x=1#h");
        assert!(route.is_empty());
        assert_eq!(route.full_path(), "/missing?x=1#h");
    }

    #[test]
    fn test_unknown_name_is_empty_route() {
        let m = matcher([RouteConfig::new("/a").name("a")]);
        let route = m
            .match_location(&Location::named("nope"), &Route::start(), None)
            .unwrap();
        assert!(route.is_empty());
        assert_eq!(route.name(), Some("nope"));
    }

    #[test]
    fn test_nested_match_chain() {
        let m = matcher([RouteConfig::new("/users")
            .name("users")
            .child(RouteConfig::new(":id").name("user"))]);
        let route = match_path(&m, "/users/9");
        assert_eq!(paths(&route), vec!["/users", "/users/:id"]);
        assert_eq!(route.params().get_str("id"), Some("9"));
    }

    #[test]
    fn test_default_child_wins_over_parent() {
        let m = matcher([RouteConfig::new("/settings")
            .name("settings")
            .child(RouteConfig::new("").name("settings-home"))]);
        let route = match_path(&m, "/settings");
        assert_eq!(route.name(), Some("settings-home"));
        assert_eq!(route.matched().len(), 2);
    }

    #[test]
    fn test_named_match_inherits_required_params() {
        let m = matcher([
            RouteConfig::new("/org/:org/repo/:repo").name("repo"),
            RouteConfig::new("/org/:org/settings").name("settings"),
        ]);
        let current = match_path(&m, "/org/acme/repo/site");
        let route = m
            .match_location(&Location::named("settings"), &current, None)
            .unwrap();
        assert_eq!(route.path(), "/org/acme/settings");
        assert!(!route.params().contains("repo"));
    }

    #[test]
    fn test_named_match_missing_param_fails() {
        let m = matcher([RouteConfig::new("/b/:id").name("b")]);
        let err = m
            .match_location(&Location::named("b"), &Route::start(), None)
            .unwrap_err();
        assert!(matches!(err, NavigationError::Matching { .. }));
        assert!(err.to_string().contains("\"id\""));
    }

    #[test]
    fn test_params_only_location_reuses_current_name() {
        let m = matcher([RouteConfig::new("/b/:id").name("b")]);
        let current = match_path(&m, "/b/1");
        let route = m
            .match_location(
                &Location::with_params([("id", "2")].into_iter().collect()),
                &current,
                None,
            )
            .unwrap();
        assert_eq!(route.path(), "/b/2");
    }

    #[test]
    fn test_wildcard_records_path_match() {
        let m = matcher([
            RouteConfig::new("/a"),
            RouteConfig::new("*").name("not-found"),
        ]);
        let route = match_path(&m, "/x/y");
        assert_eq!(route.name(), Some("not-found"));
        assert_eq!(route.params().get_str(WILDCARD_PARAM), Some("x/y"));
    }

    #[test]
    fn test_static_redirect() {
        let m = matcher([
            RouteConfig::new("/old").redirect("/new"),
            RouteConfig::new("/new").name("new"),
        ]);
        let route = match_path(&m, "/old?keep=1#frag");
        assert_eq!(route.name(), Some("new"));
        assert_eq!(route.full_path(), "/new?keep=1#frag");
        assert_eq!(route.redirected_from(), Some("/old?keep=1#frag"));
    }

    #[test]
    fn test_relative_redirect_resolves_against_parent() {
        let m = matcher([RouteConfig::new("/p")
            .child(RouteConfig::new("a").redirect("b"))
            .child(RouteConfig::new("b").name("pb"))]);
        let route = match_path(&m, "/p/a");
        assert_eq!(route.name(), Some("pb"));
        assert_eq!(route.path(), "/p/b");
    }

    #[test]
    fn test_redirect_carries_params() {
        let m = matcher([
            RouteConfig::new("/u/:id").redirect("/users/:id"),
            RouteConfig::new("/users/:id").name("user"),
        ]);
        let route = match_path(&m, "/u/5");
        assert_eq!(route.path(), "/users/5");
        assert_eq!(route.params().get_str("id"), Some("5"));
    }

    #[test]
    fn test_named_and_dynamic_redirects() {
        let m = matcher([
            RouteConfig::new("/home").name("home"),
            RouteConfig::new("/start").redirect(Location::named("home")),
            RouteConfig::new("/dyn/:to").redirect(Redirect::dynamic(|route| {
                match route.params().get_str("to") {
                    Some("home") => RedirectTarget::Location(Location::named("home")),
                    _ => RedirectTarget::Invalid,
                }
            })),
        ]);
        assert_eq!(match_path(&m, "/start").name(), Some("home"));
        assert_eq!(match_path(&m, "/dyn/home").name(), Some("home"));
        assert!(match_path(&m, "/dyn/other").is_empty());
    }

    #[test]
    fn test_chained_redirect_keeps_first_origin() {
        let m = matcher([
            RouteConfig::new("/a").redirect("/b"),
            RouteConfig::new("/b").redirect("/c"),
            RouteConfig::new("/c").name("c"),
        ]);
        let route = match_path(&m, "/a");
        assert_eq!(route.name(), Some("c"));
        assert_eq!(route.redirected_from(), Some("/a"));
    }

    #[test]
    fn test_redirect_to_unknown_name_fails() {
        let m = matcher([RouteConfig::new("/a").redirect(Location::named("ghost"))]);
        let err = m
            .match_location(&Location::from("/a"), &Route::start(), None)
            .unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_redirect_loop_is_bounded() {
        let m = matcher([
            RouteConfig::new("/ping").redirect("/pong"),
            RouteConfig::new("/pong").redirect("/ping"),
        ]);
        let err = m
            .match_location(&Location::from("/ping"), &Route::start(), None)
            .unwrap_err();
        assert!(err.to_string().contains("redirect loop"));
    }

    #[test]
    fn test_alias_uses_aliased_records() {
        let m = matcher([RouteConfig::new("/users/:id")
            .name("user")
            .alias("/people/:id")]);
        let route = match_path(&m, "/people/4");
        assert_eq!(route.path(), "/people/4");
        assert_eq!(paths(&route), vec!["/users/:id"]);
        assert_eq!(route.params().get_str("id"), Some("4"));
    }

    #[test]
    fn test_alias_children() {
        let m = matcher([RouteConfig::new("/users")
            .alias("/people")
            .child(RouteConfig::new("profile").name("profile"))]);
        let route = match_path(&m, "/people/profile");
        assert_eq!(route.name(), Some("profile"));
        assert_eq!(paths(&route), vec!["/users", "/users/profile"]);
    }

    #[test]
    fn test_duplicate_name_keeps_first() {
        let m = matcher([
            RouteConfig::new("/first").name("dup"),
            RouteConfig::new("/second").name("dup"),
        ]);
        assert_eq!(m.record_by_name("dup").map(|r| r.path()), Some("/first"));
    }

    #[test]
    fn test_add_child_route() {
        let mut m = matcher([RouteConfig::new("/admin").name("admin")]);
        assert!(m.add_child_route("admin", RouteConfig::new("logs")).is_some());
        assert!(m.add_child_route("missing", RouteConfig::new("x")).is_none());
        let route = match_path(&m, "/admin/logs");
        assert_eq!(paths(&route), vec!["/admin", "/admin/logs"]);
    }

    #[test]
    fn test_get_routes_order() {
        let m = matcher([
            RouteConfig::new("/p").child(RouteConfig::new("c")),
            RouteConfig::new("/q"),
        ]);
        let routes: Vec<_> = m.get_routes().iter().map(|r| r.path().to_string()).collect();
        assert_eq!(routes, vec!["/p/c", "/p", "/q"]);
    }

    #[cfg(feature = "cache")]
    #[test]
    fn test_scan_results_are_cached_and_invalidated() {
        let mut m = matcher([RouteConfig::new("/a")]);
        match_path(&m, "/a");
        match_path(&m, "/a");
        assert_eq!(m.cache_stats().hits, 1);

        m.add_route(RouteConfig::new("/b"));
        let stats = m.cache_stats();
        assert!(stats.invalidations >= 2);
        assert!(!match_path(&m, "/b").is_empty());
    }
}
