// SPDX-License-Identifier: GPL-3.0-only

//! Re-entrancy safe callback registry.
//!
//! Both the logical key's notification stream and the widget's event channels
//! are lists of shared closures that may, while being invoked, read or mutate
//! the object that emitted them or add and remove callbacks. [`CallbackList`]
//! snapshots the registered callbacks before invoking them so the registry is
//! never borrowed while user code runs.
//!
//! Callbacks are `Fn`; state they mutate lives behind `Cell`/`RefCell`. This
//! lets a callback trigger a nested emission on the same list, which reaches
//! every callback again, the running one included.
//!
//! Ordering guarantees:
//!
//! - Callbacks run in registration order.
//! - A callback removed during an emission is not invoked afterwards.
//! - A callback added during an emission is first invoked on the next emission.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};


new_key_type! {
    /// Identifies a registered callback.
    ///
    /// Returned by [`CallbackList::subscribe`] and accepted by
    /// [`CallbackList::unsubscribe`]. Stale ids are rejected.
    pub struct CallbackId;
}

type Callback<A> = Rc<dyn Fn(&mut A)>;

struct Entry<A> {
    /// Registration sequence number, used to keep invocation order stable
    /// when slotmap reuses freed slots.
    seq: u64,
    callback: Callback<A>,
}

/// An ordered list of callbacks receiving `&mut A`.
pub struct CallbackList<A> {
    entries: RefCell<SlotMap<CallbackId, Entry<A>>>,
    next_seq: Cell<u64>,
}

impl<A> Default for CallbackList<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for CallbackList<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackList")
            .field("len", &self.len())
            .finish()
    }
}

impl<A> CallbackList<A> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(SlotMap::with_key()),
            next_seq: Cell::new(0),
        }
    }

    /// Registers a callback and returns its id.
    pub fn subscribe<F>(&self, callback: F) -> CallbackId
    where
        F: Fn(&mut A) + 'static,
    {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        let callback: Callback<A> = Rc::new(callback);
        self.entries.borrow_mut().insert(Entry { seq, callback })
    }

    /// Removes a callback.
    ///
    /// Returns `false` if the id was never registered or was already removed.
    pub fn unsubscribe(&self, id: CallbackId) -> bool {
        self.entries.borrow_mut().remove(id).is_some()
    }

    /// Returns `true` if the id refers to a registered callback.
    pub fn contains(&self, id: CallbackId) -> bool {
        self.entries.borrow().contains_key(id)
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Returns `true` if no callbacks are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Invokes every registered callback with `args`.
    ///
    /// Returns the number of callbacks invoked. Nested emissions triggered
    /// by a running callback are delivered in full before it resumes.
    pub fn emit(&self, args: &mut A) -> usize {
        let mut snapshot: Vec<(u64, CallbackId, Callback<A>)> = self
            .entries
            .borrow()
            .iter()
            .map(|(id, entry)| (entry.seq, id, Rc::clone(&entry.callback)))
            .collect();
        snapshot.sort_by_key(|(seq, _, _)| *seq);

        let mut invoked = 0;
        for (_, id, callback) in snapshot {
            if !self.contains(id) {
                continue;
            }
            callback(args);
            invoked += 1;
        }
        invoked
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Test callbacks run in registration order, including after slot reuse
    #[test]
    fn test_emit_in_registration_order() {
        let list = CallbackList::<Vec<&'static str>>::new();
        let first = list.subscribe(|log| log.push("first"));
        list.subscribe(|log| log.push("second"));

        // Freed slot gets reused by the next insert; order must still follow
        // registration.
        assert!(list.unsubscribe(first));
        list.subscribe(|log| log.push("third"));

        let mut log = Vec::new();
        let invoked = list.emit(&mut log);
        assert_eq!(invoked, 2);
        assert_eq!(log, vec!["second", "third"]);
    }

    /// Test stale ids are rejected
    #[test]
    fn test_unsubscribe_twice() {
        let list = CallbackList::<u32>::new();
        let id = list.subscribe(|n| *n += 1);
        assert!(list.contains(id));
        assert!(list.unsubscribe(id));
        assert!(!list.unsubscribe(id), "Second unsubscribe must report false");
        assert!(list.is_empty());
    }

    /// Test a callback removed mid-emission is not invoked afterwards
    #[test]
    fn test_unsubscribe_during_emit() {
        let list = Rc::new(CallbackList::<Vec<u32>>::new());
        let victim: Rc<Cell<Option<CallbackId>>> = Rc::new(Cell::new(None));

        let list_handle = Rc::downgrade(&list);
        let victim_handle = Rc::clone(&victim);
        list.subscribe(move |log| {
            log.push(1);
            if let (Some(list), Some(id)) = (list_handle.upgrade(), victim_handle.get()) {
                list.unsubscribe(id);
            }
        });
        victim.set(Some(list.subscribe(|log| log.push(2))));

        let mut log = Vec::new();
        list.emit(&mut log);
        assert_eq!(log, vec![1]);
        assert_eq!(list.len(), 1);
    }

    /// Test a callback added mid-emission waits for the next emission
    #[test]
    fn test_subscribe_during_emit() {
        let list = Rc::new(CallbackList::<Vec<u32>>::new());
        let list_handle = Rc::downgrade(&list);
        let added = Rc::new(Cell::new(false));
        let added_handle = Rc::clone(&added);
        list.subscribe(move |log| {
            log.push(1);
            if !added_handle.replace(true) {
                if let Some(list) = list_handle.upgrade() {
                    list.subscribe(|log| log.push(2));
                }
            }
        });

        let mut log = Vec::new();
        list.emit(&mut log);
        assert_eq!(log, vec![1]);

        log.clear();
        list.emit(&mut log);
        assert_eq!(log, vec![1, 2]);
    }

    /// Test a nested emission reaches every callback, the running one included
    #[test]
    fn test_reentrant_emit_reaches_all_callbacks() {
        let list = Rc::new(CallbackList::<Vec<&'static str>>::new());
        let list_handle = Rc::downgrade(&list);
        let nested = Rc::new(Cell::new(0));
        let nested_count = Rc::clone(&nested);
        list.subscribe(move |log| {
            log.push("outer");
            if log.len() == 1 {
                if let Some(list) = list_handle.upgrade() {
                    nested_count.set(list.emit(log));
                }
            }
        });
        list.subscribe(|log| log.push("second"));

        let mut log = Vec::new();
        assert_eq!(list.emit(&mut log), 2);
        assert_eq!(nested.get(), 2, "Nested emission must not skip callbacks");
        assert_eq!(log, vec!["outer", "outer", "second", "second"]);
    }
}
