//! Route records and their configuration.
//!
//! A [`RouteConfig`] tree is what the application writes. Adding it to the
//! [`Matcher`](crate::Matcher) flattens it into immutable [`RouteRecord`]s
//! stored in an index-stable table; a record points at its parent through a
//! [`RecordId`], never through an owning reference.
//!
//! # Example
//!
//! ```
//! use navigator_pipeline::{Component, RouteConfig};
//!
//! let users = RouteConfig::new("/users")
//!     .name("users")
//!     .component(Component::new("UserList"))
//!     .meta("title", "Users")
//!     .child(
//!         RouteConfig::new(":id")
//!             .name("user")
//!             .component(Component::new("UserDetail")),
//!     )
//!     .alias("/people");
//!
//! assert_eq!(users.path(), "/users");
//! ```

use crate::components::{panic_message, ComponentSlot, DEFAULT_SLOT};
use crate::error::NavigationError;
use crate::guards::{GuardRef, NavigationGuard};
use crate::location::Location;
use crate::matching::PathPattern;
use crate::route::Route;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

/// Free-form record metadata.
pub type Meta = BTreeMap<String, String>;

/// Index of a record in the route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub(crate) usize);

impl RecordId {
    /// Position in the route table.
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// Redirects
// ============================================================================

/// Target produced by a redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectTarget {
    /// A path, resolved relative to the parent of the redirecting record.
    Path(String),
    /// A named or path location. Unset query, hash and params are taken
    /// from the original location.
    Location(Location),
    /// Not a usable target. The match warns and yields an empty route.
    Invalid,
}

impl From<&str> for RedirectTarget {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

impl From<String> for RedirectTarget {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

impl From<Location> for RedirectTarget {
    fn from(location: Location) -> Self {
        Self::Location(location)
    }
}

/// Function deciding a redirect from the route being matched.
///
/// An `Err` message fails the match with [`NavigationError::Matching`].
pub type RedirectFn = Rc<dyn Fn(&Route) -> Result<RedirectTarget, String>>;

/// A record-level redirect.
#[derive(Clone)]
pub enum Redirect {
    /// Fixed target.
    Static(RedirectTarget),
    /// Target computed from the in-progress route.
    Dynamic(RedirectFn),
}

impl Redirect {
    /// A redirect computed from the route being matched.
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&Route) -> RedirectTarget + 'static,
    {
        Self::Dynamic(Rc::new(move |route: &Route| Ok(f(route))))
    }

    /// A redirect computed from the route being matched that may fail.
    ///
    /// ```
    /// use navigator_pipeline::{Redirect, RedirectTarget, Route};
    ///
    /// let redirect = Redirect::try_dynamic(|route| match route.query().get("to") {
    ///     Some(to) => Ok(RedirectTarget::Path(to.to_string())),
    ///     None => Err("missing 'to' query"),
    /// });
    /// assert!(redirect.target(&Route::start()).is_err());
    /// ```
    pub fn try_dynamic<F, E>(f: F) -> Self
    where
        F: Fn(&Route) -> Result<RedirectTarget, E> + 'static,
        E: fmt::Display,
    {
        Self::Dynamic(Rc::new(move |route: &Route| f(route).map_err(|err| err.to_string())))
    }

    /// Evaluate the redirect for `route`.
    ///
    /// A failing or panicking evaluator gives a matching error.
    pub fn target(&self, route: &Route) -> Result<RedirectTarget, NavigationError> {
        let f = match self {
            Self::Static(target) => return Ok(target.clone()),
            Self::Dynamic(f) => f,
        };
        match catch_unwind(AssertUnwindSafe(|| f(route))) {
            Ok(Ok(target)) => Ok(target),
            Ok(Err(message)) => Err(NavigationError::matching(format!(
                "redirect from \"{}\" failed: {message}",
                route.full_path()
            ))),
            Err(payload) => Err(NavigationError::matching(format!(
                "redirect from \"{}\" panicked: {}",
                route.full_path(),
                panic_message(payload.as_ref())
            ))),
        }
    }
}

impl fmt::Debug for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(target) => f.debug_tuple("Static").field(target).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<RedirectTarget> for Redirect {
    fn from(target: RedirectTarget) -> Self {
        Self::Static(target)
    }
}

impl From<&str> for Redirect {
    fn from(path: &str) -> Self {
        Self::Static(path.into())
    }
}

impl From<String> for Redirect {
    fn from(path: String) -> Self {
        Self::Static(path.into())
    }
}

impl From<Location> for Redirect {
    fn from(location: Location) -> Self {
        Self::Static(location.into())
    }
}

// ============================================================================
// RouteConfig
// ============================================================================

/// Builder-style description of a route and its children.
#[derive(Clone, Default)]
pub struct RouteConfig {
    pub(crate) path: String,
    pub(crate) name: Option<String>,
    pub(crate) components: Vec<(String, ComponentSlot)>,
    pub(crate) children: Vec<RouteConfig>,
    pub(crate) redirect: Option<Redirect>,
    pub(crate) aliases: Vec<String>,
    pub(crate) before_enter: Option<GuardRef>,
    pub(crate) meta: Meta,
    pub(crate) case_sensitive: bool,
}

impl RouteConfig {
    /// A route for `path`. Child paths without a leading `/` are relative to
    /// their parent.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Configured path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Name the route for named navigation.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the component of the default view slot.
    #[must_use]
    pub fn component(self, component: impl Into<ComponentSlot>) -> Self {
        self.named_component(DEFAULT_SLOT, component)
    }

    /// Set the component of a named view slot.
    #[must_use]
    pub fn named_component(
        mut self,
        slot: impl Into<String>,
        component: impl Into<ComponentSlot>,
    ) -> Self {
        let slot = slot.into();
        let component = component.into();
        match self.components.iter_mut().find(|(name, _)| *name == slot) {
            Some(entry) => entry.1 = component,
            None => self.components.push((slot, component)),
        }
        self
    }

    /// Add a nested route.
    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Add several nested routes.
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(children);
        self
    }

    /// Redirect every match of this route.
    #[must_use]
    pub fn redirect(mut self, redirect: impl Into<Redirect>) -> Self {
        self.redirect = Some(redirect.into());
        self
    }

    /// Also match `alias`, showing this route's records.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Guard run when a navigation enters this route.
    #[must_use]
    pub fn before_enter(mut self, guard: impl NavigationGuard) -> Self {
        self.before_enter = Some(Rc::new(guard));
        self
    }

    /// Attach metadata.
    #[must_use]
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Compare literal segments case-sensitively.
    #[must_use]
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }
}

impl fmt::Debug for RouteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteConfig")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("children", &self.children.len())
            .field("redirect", &self.redirect)
            .field("aliases", &self.aliases)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// RouteRecord
// ============================================================================

/// One flattened, immutable route table entry.
pub struct RouteRecord {
    pub(crate) id: RecordId,
    pub(crate) path: String,
    pub(crate) pattern: PathPattern,
    pub(crate) name: Option<String>,
    pub(crate) components: Vec<(String, ComponentSlot)>,
    pub(crate) parent: Option<RecordId>,
    pub(crate) redirect: Option<Redirect>,
    pub(crate) match_as: Option<String>,
    pub(crate) before_enter: Option<GuardRef>,
    pub(crate) meta: Meta,
}

impl RouteRecord {
    /// Position in the route table.
    pub const fn id(&self) -> RecordId {
        self.id
    }

    /// Full path pattern, parents included.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Compiled path pattern.
    pub const fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// Route name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Components by view slot, in registration order.
    pub fn components(&self) -> &[(String, ComponentSlot)] {
        &self.components
    }

    /// Component slot by name.
    pub fn component(&self, slot: &str) -> Option<&ComponentSlot> {
        self.components
            .iter()
            .find(|(name, _)| name == slot)
            .map(|(_, component)| component)
    }

    /// Parent record.
    pub const fn parent(&self) -> Option<RecordId> {
        self.parent
    }

    /// Redirect, if any.
    pub const fn redirect(&self) -> Option<&Redirect> {
        self.redirect.as_ref()
    }

    /// Path this alias record stands for.
    pub fn match_as(&self) -> Option<&str> {
        self.match_as.as_deref()
    }

    /// Record-level enter guard.
    pub const fn before_enter(&self) -> Option<&GuardRef> {
        self.before_enter.as_ref()
    }

    /// Metadata.
    pub const fn meta(&self) -> &Meta {
        &self.meta
    }
}

impl fmt::Debug for RouteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteRecord")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("redirect", &self.redirect)
            .field("match_as", &self.match_as)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Component;

    #[test]
    fn test_named_component_replaces_slot() {
        let config = RouteConfig::new("/a")
            .component(Component::new("First"))
            .component(Component::new("Second"))
            .named_component("side", Component::new("Side"));

        assert_eq!(config.components.len(), 2);
        assert_eq!(
            config.components[0].1.component().map(|c| c.name().to_string()),
            Some("Second".to_string())
        );
    }

    #[test]
    fn test_static_redirect_from_str() {
        let redirect: Redirect = "/home".into();
        assert_eq!(
            redirect.target(&Route::start()).unwrap(),
            RedirectTarget::Path("/home".into())
        );
    }

    #[test]
    fn test_dynamic_redirect_sees_route() {
        let redirect = Redirect::dynamic(|route| {
            RedirectTarget::Path(format!("/from{}", route.path()))
        });
        assert_eq!(
            redirect.target(&Route::start()).unwrap(),
            RedirectTarget::Path("/from/".into())
        );
    }

    #[test]
    fn test_failing_redirect_is_a_matching_error() {
        let redirect = Redirect::try_dynamic(|_| Err::<RedirectTarget, _>("no target"));
        let err = redirect.target(&Route::start()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Matching failed: redirect from \"/\" failed: no target"
        );

        let redirect = Redirect::dynamic(|_| panic!("bad redirect"));
        let err = redirect.target(&Route::start()).unwrap_err();
        assert!(matches!(err, NavigationError::Matching { ref message } if message.ends_with("panicked: bad redirect")));
    }

    #[test]
    fn test_record_id_display() {
        assert_eq!(RecordId(3).to_string(), "#3");
        assert_eq!(RecordId(3).index(), 3);
    }
}
