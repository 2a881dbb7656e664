//! Raw navigation targets and their normalization.
//!
//! A [`Location`] is what callers hand to the router: a path string
//! (`"/users/1?tab=posts#top"`), a named route with params, or a params-only
//! location that is relative to the current route. [`normalize_location`]
//! turns it into a location carrying either a name or an absolute path,
//! with the query string split out and the hash prefixed with `#`.
//!
//! # Examples
//!
//! ```
//! use navigator_pipeline::Location;
//!
//! let by_path = Location::from("/search?q=rust#results");
//! assert_eq!(by_path.path.as_deref(), Some("/search?q=rust#results"));
//!
//! let by_name = Location::named("user").param("id", "7").query("tab", "posts");
//! assert_eq!(by_name.name.as_deref(), Some("user"));
//! assert_eq!(by_name.params.get_str("id"), Some("7"));
//! ```

use crate::error::NavigationError;
use crate::params::{ParamValue, QueryParams, RouteParams};
use crate::route::Route;

/// A navigation target as requested by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// Route name. Takes precedence over `path` when set.
    pub name: Option<String>,
    /// Path, possibly relative and possibly carrying `?query` and `#hash`.
    pub path: Option<String>,
    /// Route params for named locations or params-only relative locations.
    pub params: RouteParams,
    /// Extra query params, merged over any query found in `path`.
    pub query: QueryParams,
    /// Fragment, with or without the leading `#`.
    pub hash: Option<String>,
    /// Ask a guard redirect to replace the history entry instead of pushing.
    pub replace: bool,
    /// Resolve a relative `path` by appending to the current path.
    pub append: bool,
}

impl Location {
    /// A path location.
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// A named location.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// A params-only location, relative to the current route.
    pub fn with_params(params: RouteParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// Add a route param.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key, value);
        self
    }

    /// Append a query value.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.append(key, value);
        self
    }

    /// Set the fragment.
    #[must_use]
    pub fn hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    /// Mark the location as a replacement.
    #[must_use]
    pub fn replacing(mut self) -> Self {
        self.replace = true;
        self
    }

    /// Resolve a relative path by appending to the current path.
    #[must_use]
    pub fn appending(mut self) -> Self {
        self.append = true;
        self
    }

    /// `true` when neither a name nor a path is set.
    pub fn is_relative_params(&self) -> bool {
        self.name.is_none() && self.path.is_none()
    }
}

impl From<&str> for Location {
    fn from(path: &str) -> Self {
        Self::path(path)
    }
}

impl From<String> for Location {
    fn from(path: String) -> Self {
        Self::path(path)
    }
}

impl From<&String> for Location {
    fn from(path: &String) -> Self {
        Self::path(path.as_str())
    }
}

impl From<&Route> for Location {
    fn from(route: &Route) -> Self {
        Self::path(route.full_path())
    }
}

// ============================================================================
// Path helpers
// ============================================================================

/// A path split into its `path`, `query` and `hash` parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath<'a> {
    /// Everything before `?` and `#`.
    pub path: &'a str,
    /// Query string without the `?`.
    pub query: &'a str,
    /// Fragment including the `#`, or empty.
    pub hash: &'a str,
}

/// Split `path?query#hash`.
///
/// ```
/// use navigator_pipeline::location::parse_path;
///
/// let parsed = parse_path("/a?x=1#top");
/// assert_eq!(parsed.path, "/a");
/// assert_eq!(parsed.query, "x=1");
/// assert_eq!(parsed.hash, "#top");
/// ```
pub fn parse_path(path: &str) -> ParsedPath<'_> {
    let (rest, hash) = match path.find('#') {
        Some(index) => (&path[..index], &path[index..]),
        None => (path, ""),
    };
    let (path, query) = match rest.find('?') {
        Some(index) => (&rest[..index], &rest[index + 1..]),
        None => (rest, ""),
    };
    ParsedPath { path, query, hash }
}

/// Resolve `relative` against `base`.
///
/// Absolute paths are returned as is. `.` and `..` segments are applied.
/// Without `append` the last segment of `base` is replaced.
///
/// ```
/// use navigator_pipeline::location::resolve_path;
///
/// assert_eq!(resolve_path("/x", "/a/b", false), "/x");
/// assert_eq!(resolve_path("c", "/a/b", false), "/a/c");
/// assert_eq!(resolve_path("c", "/a/b", true), "/a/b/c");
/// assert_eq!(resolve_path("../c", "/a/b", true), "/a/c");
/// ```
pub fn resolve_path(relative: &str, base: &str, append: bool) -> String {
    if relative.starts_with('/') {
        return relative.to_string();
    }
    if relative.starts_with('?') || relative.starts_with('#') {
        return format!("{base}{relative}");
    }

    let mut stack: Vec<&str> = base.split('/').collect();
    // An appended path keeps the last base segment, unless base ends in '/'.
    if !append || stack.last().is_some_and(|last| last.is_empty()) {
        stack.pop();
    }

    for segment in relative.trim_start_matches('/').split('/') {
        match segment {
            ".." => {
                stack.pop();
            }
            "." => {}
            segment => stack.push(segment),
        }
    }

    if stack.first() != Some(&"") {
        stack.insert(0, "");
    }
    let resolved = stack.join("/");
    if resolved.is_empty() {
        "/".to_string()
    } else {
        resolved
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// Normalize a raw location against the current route.
///
/// - a named location keeps its name, params, query and hash;
/// - a params-only location reuses the current route's name, or re-fills the
///   path of its deepest matched record with the merged params;
/// - otherwise the path is resolved against `current.path()`, the query found
///   in the path is merged with the explicit query (explicit keys win) and
///   the hash is forced to start with `#`.
///
/// Fails only when a params-only location cannot fill the current record's
/// path.
pub fn normalize_location(
    raw: &Location,
    current: &Route,
    append: bool,
) -> Result<Location, NavigationError> {
    if raw.name.is_some() {
        let mut next = raw.clone();
        next.hash = normalize_hash(next.hash.as_deref());
        return Ok(next);
    }

    if raw.path.is_none() && !raw.params.is_empty() {
        let mut next = raw.clone();
        let params = RouteParams::merge(current.params(), &raw.params);
        if let Some(name) = current.name() {
            next.name = Some(name.to_string());
            next.params = params;
        } else if let Some(record) = current.matched().last() {
            let path = record.pattern().fill(&params).map_err(|err| {
                NavigationError::matching(format!(
                    "missing param for path {}: {}",
                    current.path(),
                    err
                ))
            })?;
            next.path = Some(path);
            next.params = RouteParams::new();
        }
        next.hash = normalize_hash(next.hash.as_deref());
        return Ok(next);
    }

    let raw_path = raw.path.as_deref().unwrap_or_default();
    let parsed = parse_path(raw_path);
    let base_path = if current.path().is_empty() {
        "/"
    } else {
        current.path()
    };
    let path = if parsed.path.is_empty() {
        base_path.to_string()
    } else {
        resolve_path(parsed.path, base_path, append || raw.append)
    };

    let mut query = QueryParams::from_query_string(parsed.query);
    query.extend_overriding(&raw.query);

    let hash = match raw.hash.as_deref() {
        Some(hash) if !hash.is_empty() => normalize_hash(Some(hash)),
        _ => normalize_hash(Some(parsed.hash)),
    };

    Ok(Location {
        name: None,
        path: Some(path),
        params: RouteParams::new(),
        query,
        hash,
        replace: raw.replace,
        append: false,
    })
}

fn normalize_hash(hash: Option<&str>) -> Option<String> {
    match hash {
        None | Some("") => None,
        Some(hash) if hash.starts_with('#') => Some(hash.to_string()),
        Some(hash) => Some(format!("#{hash}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path_without_query_or_hash() {
        let parsed = parse_path("/plain");
        assert_eq!(parsed.path, "/plain");
        assert_eq!(parsed.query, "");
        assert_eq!(parsed.hash, "");
    }

    #[test]
    fn test_parse_path_hash_before_question_mark() {
        let parsed = parse_path("/a#frag?notquery");
        assert_eq!(parsed.path, "/a");
        assert_eq!(parsed.query, "");
        assert_eq!(parsed.hash, "#frag?notquery");
    }

    #[test]
    fn test_resolve_path_query_only() {
        assert_eq!(resolve_path("?x=1", "/a", false), "/a?x=1");
    }

    #[test]
    fn test_resolve_path_dot_segments() {
        assert_eq!(resolve_path("./c", "/a/b", false), "/a/c");
        assert_eq!(resolve_path("../../c", "/a/b", false), "/c");
        assert_eq!(resolve_path("c", "/", false), "/c");
    }

    #[test]
    fn test_normalize_path_location() {
        let current = Route::start();
        let raw = Location::from("users?page=2#list").query("sort", "name");
        let normalized = normalize_location(&raw, &current, false).unwrap();

        assert_eq!(normalized.path.as_deref(), Some("/users"));
        assert_eq!(normalized.query.get("page"), Some("2"));
        assert_eq!(normalized.query.get("sort"), Some("name"));
        assert_eq!(normalized.hash.as_deref(), Some("#list"));
    }

    #[test]
    fn test_explicit_query_overrides_path_query() {
        let raw = Location::from("/a?x=1").query("x", "2");
        let normalized = normalize_location(&raw, &Route::start(), false).unwrap();
        assert_eq!(normalized.query.get_all("x").map(<[String]>::len), Some(1));
        assert_eq!(normalized.query.get("x"), Some("2"));
    }

    #[test]
    fn test_hash_is_prefixed() {
        let raw = Location::from("/a").hash("top");
        let normalized = normalize_location(&raw, &Route::start(), false).unwrap();
        assert_eq!(normalized.hash.as_deref(), Some("#top"));
    }

    #[test]
    fn test_empty_path_keeps_current_path() {
        let raw = Location::default().query("q", "1");
        let normalized = normalize_location(&raw, &Route::start(), false).unwrap();
        assert_eq!(normalized.path.as_deref(), Some("/"));
        assert_eq!(normalized.query.get("q"), Some("1"));
    }

    #[test]
    fn test_named_location_untouched() {
        let raw = Location::named("b").param("id", "7");
        let normalized = normalize_location(&raw, &Route::start(), false).unwrap();
        assert_eq!(normalized.name.as_deref(), Some("b"));
        assert_eq!(normalized.path, None);
        assert_eq!(normalized.params.get_str("id"), Some("7"));
    }
}
