//! Route parameters and query strings.
//!
//! - [`RouteParams`]: values captured from dynamic path segments
//!   (`:id` in `/users/:id`) or supplied with a named location. A value is
//!   either a single string or a sequence ([`ParamValue`]); sequences come
//!   from repeatable captures and are joined with `/` when a path is filled.
//! - [`QueryParams`]: the `?key=value&...` part of a location. Keys may
//!   repeat (`?tag=a&tag=b`) and may have no value at all (`?flag`).
//!
//! Both maps are ordered by key so that the full path built from them, and
//! therefore route equality, is deterministic.
//!
//! # Example
//!
//! ```
//! use navigator_pipeline::{QueryParams, RouteParams};
//!
//! let params: RouteParams = [("id", "42")].into_iter().collect();
//! assert_eq!(params.get_as::<u32>("id"), Some(42));
//!
//! let query = QueryParams::from_query_string("page=1&sort=name");
//! assert_eq!(query.get_as::<u32>("page"), Some(1));
//! assert_eq!(query.to_query_string(), "page=1&sort=name");
//! ```

use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// ParamValue
// ============================================================================

/// A single route parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// One string, the common case.
    Single(String),
    /// A repeated capture.
    Multiple(Vec<String>),
}

impl ParamValue {
    /// The value as a string slice, if it is a single value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value),
            Self::Multiple(_) => None,
        }
    }

    /// The value as it appears inside a path (sequences joined by `/`).
    pub fn to_path_segment(&self) -> String {
        match self {
            Self::Single(value) => value.clone(),
            Self::Multiple(values) => values.join("/"),
        }
    }

    /// `true` if the value would produce an empty path segment.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(value) => value.is_empty(),
            Self::Multiple(values) => values.iter().all(String::is_empty),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_path_segment())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::Single(value.clone())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multiple(values)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Multiple(values.into_iter().map(String::from).collect())
    }
}

// ============================================================================
// RouteParams
// ============================================================================

/// Route parameters keyed by name.
///
/// # Example
///
/// ```
/// use navigator_pipeline::{ParamValue, RouteParams};
///
/// let mut params = RouteParams::new();
/// params.insert("id", "123");
/// params.insert("rest", vec!["a", "b"]);
///
/// assert_eq!(params.get_str("id"), Some("123"));
/// assert_eq!(params.get("rest").map(ParamValue::to_path_segment), Some("a/b".to_string()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    params: BTreeMap<String, ParamValue>,
}

impl RouteParams {
    /// Create empty route parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a parameter value by key.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    /// Get a single-valued parameter as a string slice.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.params.get(key)?.as_str()
    }

    /// Get a single-valued parameter parsed as `T`.
    ///
    /// Returns `None` if the parameter is missing, is a sequence, or does not
    /// parse.
    pub fn get_as<T>(&self, key: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        self.get_str(key)?.parse().ok()
    }

    /// Insert or overwrite a parameter.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.params.insert(key.into(), value.into());
    }

    /// Remove a parameter, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.params.remove(key)
    }

    /// Return `true` if the given key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Iterate over all `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.params.iter()
    }

    /// Return `true` if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Return the number of parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Merge two parameter sets; values from `overrides` win.
    ///
    /// Used when a location only carries params and is resolved relative to
    /// the current route.
    ///
    /// ```
    /// use navigator_pipeline::RouteParams;
    ///
    /// let base: RouteParams = [("org", "1"), ("view", "list")].into_iter().collect();
    /// let overrides: RouteParams = [("view", "grid")].into_iter().collect();
    ///
    /// let merged = RouteParams::merge(&base, &overrides);
    /// assert_eq!(merged.get_str("org"), Some("1"));
    /// assert_eq!(merged.get_str("view"), Some("grid"));
    /// ```
    pub fn merge(base: &Self, overrides: &Self) -> Self {
        let mut merged = base.clone();
        for (key, value) in overrides.iter() {
            merged.params.insert(key.clone(), value.clone());
        }
        merged
    }
}

impl<K, V> FromIterator<(K, V)> for RouteParams
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

// ============================================================================
// QueryParams
// ============================================================================

/// Query parameters of a location.
///
/// # Example
///
/// ```
/// use navigator_pipeline::QueryParams;
///
/// let query = QueryParams::from_query_string("tag=rust&tag=router&flag");
///
/// assert_eq!(query.get("tag"), Some("rust"));
/// assert_eq!(query.get_all("tag").map(|v| v.len()), Some(2));
/// assert!(query.contains("flag"));
/// assert_eq!(query.get("flag"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: BTreeMap<String, Vec<String>>,
}

impl QueryParams {
    /// Create empty query parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a query string, with or without the leading `?`.
    pub fn from_query_string(query: &str) -> Self {
        let mut parsed = Self::new();
        let query = query.trim().trim_start_matches(['?', '&']);

        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            match pair.split_once('=') {
                Some((key, value)) => {
                    parsed.append(decode_uri_component(key), decode_uri_component(value));
                }
                None => {
                    parsed.params.entry(decode_uri_component(pair)).or_default();
                }
            }
        }

        parsed
    }

    /// Get the first value for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key)?.first().map(String::as_str)
    }

    /// Get all values for a key.
    pub fn get_all(&self, key: &str) -> Option<&[String]> {
        self.params.get(key).map(Vec::as_slice)
    }

    /// Get the first value for a key parsed as `T`.
    pub fn get_as<T>(&self, key: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        self.get(key)?.parse().ok()
    }

    /// Append a value for the given key, keeping existing values.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.entry(key.into()).or_default().push(value.into());
    }

    /// Replace all values of a key with a single value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), vec![value.into()]);
    }

    /// Return `true` if the given key is present (with or without a value).
    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Overwrite keys of `self` with the keys present in `other`.
    pub fn extend_overriding(&mut self, other: &Self) {
        for (key, values) in &other.params {
            self.params.insert(key.clone(), values.clone());
        }
    }

    /// Iterate over `(key, values)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.params.iter()
    }

    /// Serialize back into a query string without the leading `?`.
    pub fn to_query_string(&self) -> String {
        let mut pairs = Vec::new();
        for (key, values) in &self.params {
            let key = encode_uri_component(key);
            if values.is_empty() {
                pairs.push(key);
                continue;
            }
            for value in values {
                pairs.push(format!("{}={}", key, encode_uri_component(value)));
            }
        }
        pairs.join("&")
    }

    /// Return `true` if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Return the number of distinct keys.
    pub fn len(&self) -> usize {
        self.params.len()
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut query = Self::new();
        for (key, value) in iter {
            query.append(key, value);
        }
        query
    }
}

/// Percent-encode everything outside the unreserved set, byte by byte.
pub(crate) fn encode_uri_component(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(char::from(byte));
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

/// Decode `%XX` escapes and `+`; malformed escapes are kept verbatim.
pub(crate) fn decode_uri_component(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
                match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    Some(byte) => {
                        decoded.push(byte);
                        i += 3;
                    }
                    None => {
                        decoded.push(b'%');
                        i += 1;
                    }
                }
            }
            b'+' => {
                decoded.push(b' ');
                i += 1;
            }
            byte => {
                decoded.push(byte);
                i += 1;
            }
        }
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_params_insert_and_get() {
        let mut params = RouteParams::new();
        params.insert("id", "7");
        assert_eq!(params.get_str("id"), Some("7"));
        assert_eq!(params.get_as::<i32>("id"), Some(7));
        assert!(params.contains("id"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_sequence_param_is_not_a_str() {
        let mut params = RouteParams::new();
        params.insert("path", vec!["a", "b"]);
        assert_eq!(params.get_str("path"), None);
        assert_eq!(params.get("path").unwrap().to_path_segment(), "a/b");
    }

    #[test]
    fn test_route_params_merge_child_wins() {
        let parent: RouteParams = [("workspace", "1"), ("view", "list")].into_iter().collect();
        let child: RouteParams = [("project", "2"), ("view", "grid")].into_iter().collect();

        let merged = RouteParams::merge(&parent, &child);
        assert_eq!(merged.get_str("workspace"), Some("1"));
        assert_eq!(merged.get_str("project"), Some("2"));
        assert_eq!(merged.get_str("view"), Some("grid"));
    }

    #[test]
    fn test_route_params_equality_ignores_insertion_order() {
        let a: RouteParams = [("a", "1"), ("b", "2")].into_iter().collect();
        let b: RouteParams = [("b", "2"), ("a", "1")].into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_query_params_basic() {
        let query = QueryParams::from_query_string("?page=1&sort=name&filter=active");

        assert_eq!(query.get("page"), Some("1"));
        assert_eq!(query.get("sort"), Some("name"));
        assert_eq!(query.get("missing"), None);
        assert_eq!(query.len(), 3);
    }

    #[test]
    fn test_query_params_multiple_values() {
        let query = QueryParams::from_query_string("tag=rust&tag=ui");
        assert_eq!(query.get_all("tag").unwrap(), ["rust", "ui"]);
        assert_eq!(query.get("tag"), Some("rust"));
    }

    #[test]
    fn test_query_params_flag_round_trip() {
        let query = QueryParams::from_query_string("flag&x=1");
        assert!(query.contains("flag"));
        assert_eq!(query.to_query_string(), "flag&x=1");
    }

    #[test]
    fn test_query_params_extend_overriding() {
        let mut base = QueryParams::from_query_string("a=1&b=2");
        let extra = QueryParams::from_query_string("b=3&c=4");
        base.extend_overriding(&extra);
        assert_eq!(base.to_query_string(), "a=1&b=3&c=4");
    }

    #[test]
    fn test_uri_encoding() {
        assert_eq!(encode_uri_component("hello world"), "hello%20world");
        assert_eq!(encode_uri_component("a@b"), "a%40b");
        assert_eq!(encode_uri_component("é"), "%C3%A9");
    }

    #[test]
    fn test_uri_decoding() {
        assert_eq!(decode_uri_component("hello%20world"), "hello world");
        assert_eq!(decode_uri_component("hello+world"), "hello world");
        assert_eq!(decode_uri_component("%C3%A9"), "é");
        assert_eq!(decode_uri_component("100%"), "100%");
        assert_eq!(decode_uri_component("%zz"), "%zz");
    }

    #[test]
    fn test_empty_query_string() {
        assert!(QueryParams::from_query_string("").is_empty());
        assert!(QueryParams::from_query_string("?").is_empty());
    }
}
