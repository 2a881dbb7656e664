//! Segment-based path patterns.
//!
//! A route record's path is compiled once into a [`PathPattern`]. Patterns
//! are split on `/` and each segment is one of:
//!
//! - a literal (`users`), compared ASCII case-insensitively unless the
//!   record asks for case-sensitive matching,
//! - a named parameter (`:id`), optionally marked optional (`:id?`),
//! - a wildcard (`*`) that swallows the rest of the path; its capture is
//!   stored under the synthetic key [`WILDCARD_PARAM`].
//!
//! Trailing slashes are ignored. Captured values are percent-decoded.
//!
//! # Examples
//!
//! ```
//! use navigator_pipeline::matching::PathPattern;
//!
//! let pattern = PathPattern::parse("/users/:id/:tab?");
//! let params = pattern.matches("/users/42").unwrap();
//! assert_eq!(params.get_str("id"), Some("42"));
//! assert!(!params.contains("tab"));
//!
//! assert_eq!(pattern.fill(&params).unwrap(), "/users/42");
//! ```

use crate::params::{decode_uri_component, ParamValue, RouteParams};
use std::borrow::Cow;

/// Param key under which a wildcard capture is stored.
pub const WILDCARD_PARAM: &str = "pathMatch";

/// One compiled path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the path segment.
    Static(String),
    /// Captures one path segment.
    Param {
        /// Parameter name without the leading `:`.
        name: String,
        /// `true` for `:name?`.
        optional: bool,
    },
    /// Captures every remaining segment.
    Wildcard,
}

/// A parameter declared by a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathKey {
    /// Parameter name (`pathMatch` for the wildcard).
    pub name: String,
    /// Whether the parameter may be absent.
    pub optional: bool,
}

/// A compiled route path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
    keys: Vec<PathKey>,
    case_sensitive: bool,
}

impl PathPattern {
    /// Compile a pattern with case-insensitive literals.
    pub fn parse(path: &str) -> Self {
        Self::with_case_sensitivity(path, false)
    }

    /// Compile a pattern, choosing how literals compare.
    pub fn with_case_sensitivity(path: &str, case_sensitive: bool) -> Self {
        let mut segments = Vec::new();
        let mut keys = Vec::new();

        for raw in split_path(path) {
            if raw == "*" {
                segments.push(Segment::Wildcard);
                keys.push(PathKey {
                    name: WILDCARD_PARAM.to_string(),
                    optional: false,
                });
            } else if let Some(name) = raw.strip_prefix(':') {
                let (name, optional) = match name.strip_suffix('?') {
                    Some(name) => (name, true),
                    None => (name, false),
                };
                segments.push(Segment::Param {
                    name: name.to_string(),
                    optional,
                });
                keys.push(PathKey {
                    name: name.to_string(),
                    optional,
                });
            } else {
                segments.push(Segment::Static(raw.to_string()));
            }
        }

        Self {
            source: path.to_string(),
            segments,
            keys,
            case_sensitive,
        }
    }

    /// The path the pattern was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Compiled segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Declared parameters in path order.
    pub fn keys(&self) -> &[PathKey] {
        &self.keys
    }

    /// Names of the parameters that must be present to fill the pattern.
    pub fn required_keys(&self) -> impl Iterator<Item = &str> {
        self.keys
            .iter()
            .filter(|key| !key.optional)
            .map(|key| key.name.as_str())
    }

    /// Match a concrete path, returning captured params on success.
    pub fn matches(&self, path: &str) -> Option<RouteParams> {
        let segments = split_path(path);
        let mut captures = Vec::new();
        if self.match_from(0, &segments, 0, &mut captures) {
            Some(captures.into_iter().collect())
        } else {
            None
        }
    }

    fn match_from(
        &self,
        pattern_index: usize,
        path: &[&str],
        path_index: usize,
        captures: &mut Vec<(String, ParamValue)>,
    ) -> bool {
        let Some(segment) = self.segments.get(pattern_index) else {
            return path_index == path.len();
        };

        match segment {
            Segment::Static(literal) => {
                let Some(actual) = path.get(path_index) else {
                    return false;
                };
                let equal = if self.case_sensitive {
                    literal == actual
                } else {
                    literal.eq_ignore_ascii_case(actual)
                };
                equal && self.match_from(pattern_index + 1, path, path_index + 1, captures)
            }
            Segment::Param { name, optional } => {
                if let Some(actual) = path.get(path_index) {
                    captures.push((name.clone(), ParamValue::from(decode_uri_component(actual))));
                    if self.match_from(pattern_index + 1, path, path_index + 1, captures) {
                        return true;
                    }
                    captures.pop();
                }
                *optional && self.match_from(pattern_index + 1, path, path_index, captures)
            }
            Segment::Wildcard => {
                // Greedy: try the longest capture first.
                for end in (path_index..=path.len()).rev() {
                    let captured = path[path_index..end]
                        .iter()
                        .map(|s| decode_uri_component(s))
                        .collect::<Vec<_>>()
                        .join("/");
                    captures.push((WILDCARD_PARAM.to_string(), ParamValue::from(captured)));
                    if self.match_from(pattern_index + 1, path, end, captures) {
                        return true;
                    }
                    captures.pop();
                }
                false
            }
        }
    }

    /// Substitute `params` into the pattern.
    ///
    /// Optional params that are missing are dropped together with their
    /// segment. A missing required param is an error naming the param.
    pub fn fill(&self, params: &RouteParams) -> Result<String, String> {
        let mut out: Vec<String> = Vec::with_capacity(self.segments.len());

        for segment in &self.segments {
            match segment {
                Segment::Static(literal) => out.push(literal.clone()),
                Segment::Param { name, optional } => match params.get(name) {
                    Some(value) if !value.is_empty() => out.push(value.to_path_segment()),
                    _ if *optional => {}
                    _ => return Err(format!("Expected \"{name}\" to be defined")),
                },
                Segment::Wildcard => match params.get(WILDCARD_PARAM) {
                    Some(value) => {
                        let value = value.to_path_segment();
                        let value = value.trim_matches('/');
                        if !value.is_empty() {
                            out.push(value.to_string());
                        }
                    }
                    None => return Err(format!("Expected \"{WILDCARD_PARAM}\" to be defined")),
                },
            }
        }

        Ok(format!("/{}", out.join("/")))
    }
}

/// Split a path into its non-empty segments.
///
/// ```
/// use navigator_pipeline::matching::split_path;
///
/// assert_eq!(split_path("/users/123/"), vec!["users", "123"]);
/// assert!(split_path("/").is_empty());
/// ```
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Normalize a path to a leading slash and no trailing slash.
///
/// Returns `Cow::Borrowed` when the input is already normalized.
///
/// ```
/// use navigator_pipeline::matching::normalize_path;
///
/// assert_eq!(normalize_path("dashboard/"), "/dashboard");
/// assert_eq!(normalize_path(""), "/");
/// assert_eq!(normalize_path("/a/b"), "/a/b");
/// ```
#[must_use]
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    if path == "/" {
        return Cow::Borrowed(path);
    }
    if path.starts_with('/') && !path.ends_with('/') && !path.contains("//") {
        return Cow::Borrowed(path);
    }
    let segments = split_path(path);
    if segments.is_empty() {
        Cow::Borrowed("/")
    } else {
        Cow::Owned(format!("/{}", segments.join("/")))
    }
}

/// Collapse repeated slashes (`//a///b` → `/a/b`), keeping a trailing one.
pub fn clean_path(path: &str) -> String {
    let mut cleaned = String::with_capacity(path.len());
    let mut previous_slash = false;
    for c in path.chars() {
        if c == '/' {
            if !previous_slash {
                cleaned.push(c);
            }
            previous_slash = true;
        } else {
            cleaned.push(c);
            previous_slash = false;
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("/users/123"), vec!["users", "123"]);
        assert_eq!(split_path("users"), vec!["users"]);
        assert_eq!(split_path(""), Vec::<&str>::new());
    }

    #[test]
    fn test_keys_and_required_keys() {
        let pattern = PathPattern::parse("/org/:org/repo/:repo?");
        assert_eq!(pattern.keys().len(), 2);
        assert_eq!(pattern.required_keys().collect::<Vec<_>>(), vec!["org"]);
    }

    #[test]
    fn test_literal_match_ignores_case_by_default() {
        let pattern = PathPattern::parse("/About");
        assert!(pattern.matches("/about").is_some());

        let strict = PathPattern::with_case_sensitivity("/About", true);
        assert!(strict.matches("/about").is_none());
        assert!(strict.matches("/About/").is_some());
    }

    #[test]
    fn test_param_capture_is_decoded() {
        let pattern = PathPattern::parse("/tags/:tag");
        let params = pattern.matches("/tags/hello%20world").unwrap();
        assert_eq!(params.get_str("tag"), Some("hello world"));
    }

    #[test]
    fn test_pattern_does_not_match_longer_path() {
        let pattern = PathPattern::parse("/users/:id");
        assert!(pattern.matches("/users/1/edit").is_none());
        assert!(pattern.matches("/users").is_none());
    }

    #[test]
    fn test_wildcard_captures_rest() {
        let pattern = PathPattern::parse("/files/*");
        let params = pattern.matches("/files/a/b/c.txt").unwrap();
        assert_eq!(params.get_str(WILDCARD_PARAM), Some("a/b/c.txt"));

        let catch_all = PathPattern::parse("*");
        let params = catch_all.matches("/").unwrap();
        assert_eq!(params.get_str(WILDCARD_PARAM), Some(""));
    }

    #[test]
    fn test_wildcard_backtracks_for_trailing_literal() {
        let pattern = PathPattern::parse("/docs/*/edit");
        let params = pattern.matches("/docs/a/b/edit").unwrap();
        assert_eq!(params.get_str(WILDCARD_PARAM), Some("a/b"));
    }

    #[test]
    fn test_fill_required_and_optional() {
        let pattern = PathPattern::parse("/b/:id/:tab?");
        let params: RouteParams = [("id", "7")].into_iter().collect();
        assert_eq!(pattern.fill(&params).unwrap(), "/b/7");

        let err = pattern.fill(&RouteParams::new()).unwrap_err();
        assert!(err.contains("\"id\""));
    }

    #[test]
    fn test_fill_wildcard() {
        let pattern = PathPattern::parse("/files/*");
        let params: RouteParams = [(WILDCARD_PARAM, "a/b")].into_iter().collect();
        assert_eq!(pattern.fill(&params).unwrap(), "/files/a/b");
    }

    #[test]
    fn test_root_pattern() {
        let pattern = PathPattern::parse("/");
        assert!(pattern.matches("/").is_some());
        assert!(pattern.matches("").is_some());
        assert_eq!(pattern.fill(&RouteParams::new()).unwrap(), "/");
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path("//app///users"), "/app/users");
        assert_eq!(clean_path("/a/"), "/a/");
    }
}
