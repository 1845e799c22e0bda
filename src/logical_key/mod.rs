// SPDX-License-Identifier: GPL-3.0-only

//! Logical keys: what pressing an on-screen key means.
//!
//! A [`LogicalKey`] is a cheap, clonable handle to shared key state. Any number
//! of on-screen widgets may display the same logical key; every one of them
//! receives the key's notifications.
//!
//! # Modifier state
//!
//! The in-effect flag of a modifier is owned by the key. It changes only
//! through the key's own methods:
//!
//! - [`LogicalKey::press`] flips the flag, unless the host [`KeySink`]
//!   reports the authoritative state (e.g. Caps Lock stayed on).
//! - [`LogicalKey::synchronise_key_state`] re-reads the sink after some other
//!   input changed the modifier.
//! - [`LogicalKey::clear_effect`] drops an instantaneous latch once the next
//!   keystroke consumed it.
//!
//! # Example
//!
//! ```rust
//! use oskey::logical_key::LogicalKey;
//!
//! let shift = LogicalKey::instantaneous_modifier("Shift");
//! let subscription = shift.subscribe(|notification| {
//!     if let Some(active) = notification.in_effect_change() {
//!         println!("Shift latched: {}", active);
//!     }
//! });
//!
//! shift.press();
//! assert!(shift.is_in_effect());
//!
//! shift.unsubscribe(subscription);
//! ```

pub mod types;

pub use types::{KeyDescriptor, KeyKind, KeyNotification, KeyProperty, PropertyValue};

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use futures::channel::mpsc;

use crate::app_settings::LOG_TARGET;
use crate::callbacks::{CallbackId, CallbackList};

// ============================================================================
// Key Sink
// ============================================================================

/// Host side of a logical key.
///
/// The sink receives every press so the host can forward it to a real input
/// stream, and may report the authoritative in-effect state of modifiers.
pub trait KeySink {
    /// Called once per [`LogicalKey::press`], before modifier state is updated.
    fn press(&mut self, key: &KeyDescriptor);

    /// Reports whether a modifier is in effect according to the host.
    ///
    /// Returning `None` lets the key track its own state.
    fn is_in_effect(&self, _key: &KeyDescriptor) -> Option<bool> {
        None
    }
}

impl<F> KeySink for F
where
    F: FnMut(&KeyDescriptor),
{
    fn press(&mut self, key: &KeyDescriptor) {
        self(key)
    }
}

// ============================================================================
// Subscriptions
// ============================================================================

/// Handle to a notification subscription on a [`LogicalKey`].
///
/// Subscriptions are not released on drop; pass the handle back to
/// [`LogicalKey::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySubscription(CallbackId);

// ============================================================================
// Logical Key
// ============================================================================

struct KeyState {
    display_name: String,
    kind: KeyKind,
    is_in_effect: bool,
}

struct KeyInner {
    state: RefCell<KeyState>,
    subscribers: CallbackList<KeyNotification>,
    sink: RefCell<Option<Box<dyn KeySink>>>,
}

/// Shared handle to a logical key.
///
/// Clones refer to the same key. Handles are `!Send`; a key lives on the UI
/// thread together with the widgets showing it.
#[derive(Clone)]
pub struct LogicalKey {
    inner: Rc<KeyInner>,
}

impl fmt::Debug for LogicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("LogicalKey")
            .field("display_name", &state.display_name)
            .field("kind", &state.kind)
            .field("is_in_effect", &state.is_in_effect)
            .field("subscribers", &self.inner.subscribers.len())
            .finish()
    }
}

impl LogicalKey {
    /// Creates a key that is not in effect.
    pub fn new(display_name: impl Into<String>, kind: KeyKind) -> Self {
        Self {
            inner: Rc::new(KeyInner {
                state: RefCell::new(KeyState {
                    display_name: display_name.into(),
                    kind,
                    is_in_effect: false,
                }),
                subscribers: CallbackList::new(),
                sink: RefCell::new(None),
            }),
        }
    }

    /// Creates a simple key.
    pub fn simple(display_name: impl Into<String>) -> Self {
        Self::new(display_name, KeyKind::Simple)
    }

    /// Creates a toggling modifier such as Caps Lock.
    pub fn toggling_modifier(display_name: impl Into<String>) -> Self {
        Self::new(display_name, KeyKind::TogglingModifier)
    }

    /// Creates an instantaneous modifier such as Shift.
    pub fn instantaneous_modifier(display_name: impl Into<String>) -> Self {
        Self::new(display_name, KeyKind::InstantaneousModifier)
    }

    /// Attaches a host sink and returns the key.
    #[must_use]
    pub fn with_sink(self, sink: impl KeySink + 'static) -> Self {
        self.set_sink(sink);
        self
    }

    /// Replaces the host sink.
    pub fn set_sink(&self, sink: impl KeySink + 'static) {
        *self.inner.sink.borrow_mut() = Some(Box::new(sink));
    }

    /// Returns `true` if both handles refer to the same key.
    #[must_use]
    pub fn ptr_eq(a: &LogicalKey, b: &LogicalKey) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn display_name(&self) -> String {
        self.inner.state.borrow().display_name.clone()
    }

    pub fn kind(&self) -> KeyKind {
        self.inner.state.borrow().kind
    }

    /// Whether the modifier effect is active. Always `false` for simple keys.
    pub fn is_in_effect(&self) -> bool {
        self.inner.state.borrow().is_in_effect
    }

    /// Returns `true` if the key is a modifier currently in effect.
    pub fn is_modifier_in_effect(&self) -> bool {
        let state = self.inner.state.borrow();
        state.kind.is_modifier() && state.is_in_effect
    }

    /// Snapshot of the key's current state.
    pub fn descriptor(&self) -> KeyDescriptor {
        let state = self.inner.state.borrow();
        KeyDescriptor {
            display_name: state.display_name.clone(),
            kind: state.kind,
            is_in_effect: state.is_in_effect,
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Changes the label and notifies subscribers if it differs.
    pub fn set_display_name(&self, display_name: impl Into<String>) {
        let display_name = display_name.into();
        {
            let mut state = self.inner.state.borrow_mut();
            if state.display_name == display_name {
                return;
            }
            state.display_name = display_name.clone();
        }
        self.notify(KeyNotification::PropertyChanged {
            property: KeyProperty::DisplayName,
            value: PropertyValue::Text(display_name),
        });
    }

    /// Performs the key's action.
    ///
    /// Forwards the press to the sink, updates modifier state and then emits
    /// [`KeyNotification::Pressed`].
    pub fn press(&self) {
        let before = self.descriptor();
        tracing::debug!(
            target: LOG_TARGET,
            "Logical key '{}' pressed ({:?})",
            before.display_name,
            before.kind
        );

        match self.inner.sink.try_borrow_mut() {
            Ok(mut sink) => {
                if let Some(sink) = sink.as_mut() {
                    sink.press(&before);
                }
            }
            Err(_) => {
                tracing::warn!(
                    target: LOG_TARGET,
                    "Key sink for '{}' re-entered press(); skipping sink",
                    before.display_name
                );
            }
        }

        if before.kind.is_modifier() {
            let next = self.sink_state().unwrap_or(!before.is_in_effect);
            self.set_in_effect(next);
        }

        self.notify(KeyNotification::Pressed(self.descriptor()));
    }

    /// Re-reads a modifier's state from the sink.
    ///
    /// Returns `true` if the in-effect flag changed.
    pub fn synchronise_key_state(&self) -> bool {
        if !self.kind().is_modifier() {
            return false;
        }
        match self.sink_state() {
            Some(state) => self.set_in_effect(state),
            None => false,
        }
    }

    /// Takes a modifier out of effect.
    ///
    /// Returns `true` if the in-effect flag changed.
    pub fn clear_effect(&self) -> bool {
        self.set_in_effect(false)
    }

    fn sink_state(&self) -> Option<bool> {
        let descriptor = self.descriptor();
        let sink = self.inner.sink.try_borrow().ok()?;
        sink.as_ref()?.is_in_effect(&descriptor)
    }

    fn set_in_effect(&self, is_in_effect: bool) -> bool {
        {
            let mut state = self.inner.state.borrow_mut();
            if !state.kind.is_modifier() || state.is_in_effect == is_in_effect {
                return false;
            }
            state.is_in_effect = is_in_effect;
            tracing::debug!(
                target: LOG_TARGET,
                "Modifier '{}' in effect: {}",
                state.display_name,
                is_in_effect
            );
        }
        self.notify(KeyNotification::PropertyChanged {
            property: KeyProperty::IsInEffect,
            value: PropertyValue::Bool(is_in_effect),
        });
        true
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    /// Registers a notification callback.
    ///
    /// Callbacks run synchronously, in registration order, and may read or
    /// mutate the key while running. Notifications caused by such a mutation
    /// are delivered to every subscriber before the callback resumes.
    pub fn subscribe<F>(&self, callback: F) -> KeySubscription
    where
        F: Fn(&KeyNotification) + 'static,
    {
        let id = self
            .inner
            .subscribers
            .subscribe(move |notification: &mut KeyNotification| callback(notification));
        KeySubscription(id)
    }

    /// Removes a subscription. Returns `false` if it was already removed.
    pub fn unsubscribe(&self, subscription: KeySubscription) -> bool {
        self.inner.subscribers.unsubscribe(subscription.0)
    }

    /// Returns `true` if the subscription is still registered.
    pub fn is_subscribed(&self, subscription: KeySubscription) -> bool {
        self.inner.subscribers.contains(subscription.0)
    }

    /// Number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    /// Forwards notifications into an unbounded channel.
    ///
    /// Lets an async task observe key activity. The subscription stays active
    /// until it is passed to [`LogicalKey::unsubscribe`]; once the receiver is
    /// dropped, notifications are discarded.
    pub fn notification_channel(
        &self,
    ) -> (KeySubscription, mpsc::UnboundedReceiver<KeyNotification>) {
        let (tx, rx) = mpsc::unbounded();
        let subscription = self.subscribe(move |notification| {
            if tx.unbounded_send(notification.clone()).is_err() {
                tracing::trace!(target: LOG_TARGET, "Notification receiver dropped");
            }
        });
        (subscription, rx)
    }

    fn notify(&self, mut notification: KeyNotification) {
        let delivered = self.inner.subscribers.emit(&mut notification);
        tracing::trace!(
            target: LOG_TARGET,
            "Delivered {:?} to {} subscriber(s)",
            notification,
            delivered
        );
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
