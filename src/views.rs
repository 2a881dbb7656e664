//! Bound view instances and their entered-callback buffers.
//!
//! Enter guards may hand [`Next::deferred`](crate::Next::deferred) a callback
//! that needs the view instance of the route being entered. The instance
//! only exists once the navigation committed and the rendering layer bound
//! it, so callbacks wait in a per `(record, slot)` buffer until then.

use crate::guards::{EnteredCallback, ViewInstance};
use crate::record::RecordId;
use std::collections::HashMap;
use std::fmt;

#[derive(Default)]
struct ViewSlot {
    instance: Option<ViewInstance>,
    entered: Vec<EnteredCallback>,
}

/// Per-slot view bookkeeping owned by the router.
#[derive(Default)]
pub(crate) struct ViewRegistry {
    slots: HashMap<(RecordId, String), ViewSlot>,
}

impl ViewRegistry {
    pub(crate) fn instance(&self, record: RecordId, slot: &str) -> Option<ViewInstance> {
        self.slots
            .get(&(record, slot.to_string()))
            .and_then(|view| view.instance.clone())
    }

    pub(crate) fn bind(&mut self, record: RecordId, slot: &str, instance: ViewInstance) {
        self.slots.entry((record, slot.to_string())).or_default().instance = Some(instance);
    }

    pub(crate) fn unbind(&mut self, record: RecordId, slot: &str) -> Option<ViewInstance> {
        self.slots
            .get_mut(&(record, slot.to_string()))
            .and_then(|view| view.instance.take())
    }

    /// Drop callbacks left over from a previous entry of `record`.
    pub(crate) fn clear_entered(&mut self, record: RecordId) {
        for ((id, _), view) in &mut self.slots {
            if *id == record {
                view.entered.clear();
            }
        }
    }

    pub(crate) fn push_entered(&mut self, record: RecordId, slot: String, callback: EnteredCallback) {
        self.slots.entry((record, slot)).or_default().entered.push(callback);
    }

    pub(crate) fn take_entered(&mut self, record: RecordId, slot: &str) -> Vec<EnteredCallback> {
        self.slots
            .get_mut(&(record, slot.to_string()))
            .map(|view| std::mem::take(&mut view.entered))
            .unwrap_or_default()
    }

    /// Drain every buffer of `records` whose slot has a bound instance.
    ///
    /// Buffers are returned in `records` order, each in registration order.
    pub(crate) fn drain_bound(
        &mut self,
        records: &[RecordId],
    ) -> Vec<(ViewInstance, Vec<EnteredCallback>)> {
        let mut keys: Vec<(RecordId, String)> = self
            .slots
            .iter()
            .filter(|((id, _), view)| {
                records.contains(id) && view.instance.is_some() && !view.entered.is_empty()
            })
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort_by_key(|(id, slot)| {
            let position = records.iter().position(|r| r == id).unwrap_or(usize::MAX);
            (position, slot.clone())
        });

        keys.into_iter()
            .filter_map(|key| {
                let view = self.slots.get_mut(&key)?;
                let instance = view.instance.clone()?;
                Some((instance, std::mem::take(&mut view.entered)))
            })
            .collect()
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
    }
}

impl fmt::Debug for ViewRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewRegistry")
            .field("slots", &self.slots.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording(log: &Rc<RefCell<Vec<&'static str>>>, tag: &'static str) -> EnteredCallback {
        let log = Rc::clone(log);
        Box::new(move |_| log.borrow_mut().push(tag))
    }

    #[test]
    fn test_callbacks_wait_for_binding() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut views = ViewRegistry::default();
        views.push_entered(RecordId(0), "default".into(), recording(&log, "first"));
        views.push_entered(RecordId(0), "default".into(), recording(&log, "second"));

        let instance: ViewInstance = Rc::new(5_u32);
        views.bind(RecordId(0), "default", Rc::clone(&instance));
        for callback in views.take_entered(RecordId(0), "default") {
            callback(&instance);
        }

        assert_eq!(*log.borrow(), vec!["first", "second"]);
        assert!(views.take_entered(RecordId(0), "default").is_empty());
        assert!(views.instance(RecordId(0), "default").is_some());
    }

    #[test]
    fn test_drain_bound_skips_unbound_slots() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut views = ViewRegistry::default();
        views.bind(RecordId(1), "default", Rc::new(()));
        views.push_entered(RecordId(1), "default".into(), recording(&log, "bound"));
        views.push_entered(RecordId(1), "side".into(), recording(&log, "unbound"));

        let drained = views.drain_bound(&[RecordId(1)]);
        assert_eq!(drained.len(), 1);
        assert_eq!(views.take_entered(RecordId(1), "side").len(), 1);
    }

    #[test]
    fn test_clear_entered_and_unbind() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut views = ViewRegistry::default();
        views.push_entered(RecordId(2), "default".into(), recording(&log, "stale"));
        views.clear_entered(RecordId(2));
        assert!(views.take_entered(RecordId(2), "default").is_empty());

        views.bind(RecordId(2), "default", Rc::new(()));
        assert!(views.unbind(RecordId(2), "default").is_some());
        assert!(views.instance(RecordId(2), "default").is_none());
    }
}
