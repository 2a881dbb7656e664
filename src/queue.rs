//! Ordered continuation-driven step runner.
//!
//! [`run_queue`] walks a list of steps strictly in order. Each step receives
//! an [`Advance`] continuation and the runner only moves on once it is
//! called, synchronously or at any later time. `None` entries are skipped.
//! The runner knows nothing about what a step means; stopping early is done
//! by simply never advancing.
//!
//! ```
//! use navigator_pipeline::queue::run_queue;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let steps = log.clone();
//! let done = log.clone();
//!
//! run_queue(
//!     vec![Some(1), None, Some(3)],
//!     move |n, advance| {
//!         steps.borrow_mut().push(n);
//!         advance.advance();
//!     },
//!     move || done.borrow_mut().push(0),
//! );
//!
//! assert_eq!(*log.borrow(), vec![1, 3, 0]);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Single-use continuation moving a queue to its next step.
#[must_use = "the queue stops until `advance` is called"]
pub struct Advance {
    next: Box<dyn FnOnce()>,
}

impl Advance {
    fn new(next: impl FnOnce() + 'static) -> Self {
        Self {
            next: Box::new(next),
        }
    }

    /// Run the next step, or the completion callback after the last one.
    pub fn advance(self) {
        (self.next)();
    }
}

impl fmt::Debug for Advance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Advance").finish_non_exhaustive()
    }
}

struct Runner<T, S> {
    steps: RefCell<std::vec::IntoIter<Option<T>>>,
    step: S,
    on_complete: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl<T, S> Runner<T, S>
where
    T: 'static,
    S: Fn(T, Advance) + 'static,
{
    fn run_next(self: Rc<Self>) {
        loop {
            let item = self.steps.borrow_mut().next();
            match item {
                Some(Some(item)) => {
                    let runner = Rc::clone(&self);
                    (self.step)(item, Advance::new(move || runner.run_next()));
                    return;
                }
                Some(None) => continue,
                None => {
                    let on_complete = self.on_complete.borrow_mut().take();
                    if let Some(on_complete) = on_complete {
                        on_complete();
                    }
                    return;
                }
            }
        }
    }
}

/// Run `queue` through `step` in order, then call `on_complete` once.
pub fn run_queue<T, S, C>(queue: Vec<Option<T>>, step: S, on_complete: C)
where
    T: 'static,
    S: Fn(T, Advance) + 'static,
    C: FnOnce() + 'static,
{
    let runner = Rc::new(Runner {
        steps: RefCell::new(queue.into_iter()),
        step,
        on_complete: RefCell::new(Some(Box::new(on_complete))),
    });
    runner.run_next();
}
