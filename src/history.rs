//! History backends.
//!
//! The router keeps the URL in sync through a [`HistoryBackend`]. It writes
//! entries after a navigation commits and restores the URL when a guard
//! aborts. [`MemoryHistory`] is an in-memory stack suitable for tests,
//! servers and any environment without a real address bar.

use crate::debug_log;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Where the router reads and writes URLs.
///
/// URLs passed in already carry the router base.
pub trait HistoryBackend {
    /// URL of the active entry.
    fn current_location(&self) -> String;

    /// Add an entry after the active one, dropping forward entries.
    fn push_entry(&mut self, url: &str);

    /// Overwrite the active entry.
    fn replace_entry(&mut self, url: &str);

    /// Make the active entry show `url`, pushing or replacing if it differs.
    fn ensure_location(&mut self, url: &str, push: bool) {
        if self.current_location() != url {
            if push {
                self.push_entry(url);
            } else {
                self.replace_entry(url);
            }
        }
    }

    /// URL `delta` entries away from the active one.
    fn peek(&self, delta: isize) -> Option<String>;

    /// Move the active entry by `delta`. Returns `false` when out of range.
    fn go(&mut self, delta: isize) -> bool;
}

/// Remove `base` from the front of a history URL, case-insensitively.
///
/// The result always starts with `/`.
///
/// ```
/// use navigator_pipeline::history::strip_base;
///
/// assert_eq!(strip_base("/app/users?tab=1", "/app"), "/users?tab=1");
/// assert_eq!(strip_base("/APP", "/app"), "/");
/// assert_eq!(strip_base("/other", "/app"), "/other");
/// ```
pub fn strip_base(url: &str, base: &str) -> String {
    let rest = if base.is_empty() {
        url
    } else {
        url.get(..base.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(base))
            .and_then(|_| url.get(base.len()..))
            .unwrap_or(url)
    };
    if rest.starts_with('/') {
        rest.to_string()
    } else {
        format!("/{rest}")
    }
}

#[derive(Debug)]
struct Stack {
    entries: Vec<String>,
    index: usize,
}

impl Stack {
    fn target(&self, delta: isize) -> Option<usize> {
        let target = self.index.checked_add_signed(delta)?;
        (target < self.entries.len()).then_some(target)
    }
}

/// In-memory history stack.
///
/// Clones share the same stack, so a test can keep a handle after giving
/// one to the router.
///
/// ```
/// use navigator_pipeline::{HistoryBackend, MemoryHistory};
///
/// let history = MemoryHistory::new();
/// let mut backend = history.clone();
/// backend.push_entry("/users");
/// backend.push_entry("/users/1");
/// assert!(backend.go(-1));
///
/// assert_eq!(history.current_location(), "/users");
/// assert_eq!(history.entries(), vec!["/", "/users", "/users/1"]);
/// ```
#[derive(Clone)]
pub struct MemoryHistory {
    stack: Rc<RefCell<Stack>>,
}

impl MemoryHistory {
    /// A history whose only entry is `/`.
    pub fn new() -> Self {
        Self::with_initial("/")
    }

    /// A history whose only entry is `url`.
    pub fn with_initial(url: impl Into<String>) -> Self {
        Self {
            stack: Rc::new(RefCell::new(Stack {
                entries: vec![url.into()],
                index: 0,
            })),
        }
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.stack.borrow().entries.clone()
    }

    /// Position of the active entry.
    pub fn index(&self) -> usize {
        self.stack.borrow().index
    }

    /// `true` if there is an entry before the active one.
    pub fn can_go_back(&self) -> bool {
        self.stack.borrow().index > 0
    }

    /// `true` if there is an entry after the active one.
    pub fn can_go_forward(&self) -> bool {
        let stack = self.stack.borrow();
        stack.index + 1 < stack.entries.len()
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryBackend for MemoryHistory {
    fn current_location(&self) -> String {
        let stack = self.stack.borrow();
        stack.entries.get(stack.index).cloned().unwrap_or_else(|| "/".to_string())
    }

    fn push_entry(&mut self, url: &str) {
        let mut stack = self.stack.borrow_mut();
        let keep = stack.index + 1;
        stack.entries.truncate(keep);
        stack.entries.push(url.to_string());
        stack.index = stack.entries.len() - 1;
        debug_log!("History push '{}' (index {})", url, stack.index);
    }

    fn replace_entry(&mut self, url: &str) {
        let mut stack = self.stack.borrow_mut();
        let index = stack.index;
        match stack.entries.get_mut(index) {
            Some(entry) => *entry = url.to_string(),
            None => stack.entries.push(url.to_string()),
        }
        debug_log!("History replace '{}' (index {})", url, index);
    }

    fn peek(&self, delta: isize) -> Option<String> {
        let stack = self.stack.borrow();
        stack.target(delta).map(|index| stack.entries[index].clone())
    }

    fn go(&mut self, delta: isize) -> bool {
        let mut stack = self.stack.borrow_mut();
        match stack.target(delta) {
            Some(index) => {
                stack.index = index;
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for MemoryHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stack = self.stack.borrow();
        f.debug_struct("MemoryHistory")
            .field("entries", &stack.entries)
            .field("index", &stack.index)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_truncates_forward_entries() {
        let mut history = MemoryHistory::new();
        history.push_entry("/a");
        history.push_entry("/b");
        assert!(history.go(-2));
        history.push_entry("/c");

        assert_eq!(history.entries(), vec!["/", "/c"]);
        assert_eq!(history.index(), 1);
        assert!(!history.can_go_forward());
    }

    #[test]
    fn test_replace() {
        let mut history = MemoryHistory::new();
        history.push_entry("/users");
        history.replace_entry("/posts");

        assert_eq!(history.current_location(), "/posts");
        assert_eq!(history.entries().len(), 2);
    }

    #[test]
    fn test_peek_and_go_bounds() {
        let mut history = MemoryHistory::with_initial("/start");
        history.push_entry("/next");

        assert_eq!(history.peek(-1).as_deref(), Some("/start"));
        assert_eq!(history.peek(1), None);
        assert_eq!(history.peek(-2), None);
        assert!(!history.go(5));
        assert_eq!(history.index(), 1);
        assert!(history.can_go_back());
    }

    #[test]
    fn test_strip_base_keeps_query_and_hash() {
        assert_eq!(strip_base("/app?x=1#top", "/app"), "/?x=1#top");
        assert_eq!(strip_base("/users", ""), "/users");
        assert_eq!(strip_base("", ""), "/");
    }

    #[test]
    fn test_ensure_location() {
        let mut history = MemoryHistory::new();
        history.ensure_location("/", true);
        assert_eq!(history.entries().len(), 1);

        history.ensure_location("/a", false);
        assert_eq!(history.entries(), vec!["/a"]);

        history.ensure_location("/b", true);
        assert_eq!(history.entries(), vec!["/a", "/b"]);
    }
}
