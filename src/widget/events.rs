// SPDX-License-Identifier: GPL-3.0-only

//! Event channels raised by an on-screen key.
//!
//! Every pointer gesture produces a two-stage sequence:
//!
//! 1. A **preview** event ([`OnScreenKeyEventKind::PreviewKeyDown`] or
//!    [`OnScreenKeyEventKind::PreviewKeyUp`]). Handlers may call
//!    [`OnScreenKeyEvent::set_handled`] to veto the widget's default effect.
//! 2. The matching **non-cancelable** event ([`OnScreenKeyEventKind::KeyDown`]
//!    or [`OnScreenKeyEventKind::KeyUp`]), raised whether or not the preview
//!    was vetoed.
//!
//! [`OnScreenKeyEventKind::KeyPressed`] relays the logical key's own press
//! notification and is never cancelable.
//!
//! Dispatch is synchronous: all handlers for an event run, in registration
//! order, before [`EventDispatcher::dispatch`] returns.

use std::fmt;

use crate::app_settings::LOG_TARGET;
use crate::callbacks::{CallbackId, CallbackList};
use crate::logical_key::KeyDescriptor;

// ============================================================================
// Event Types
// ============================================================================

/// The five event channels of an on-screen key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OnScreenKeyEventKind {
    PreviewKeyDown,
    PreviewKeyUp,
    KeyDown,
    KeyUp,
    KeyPressed,
}

impl OnScreenKeyEventKind {
    /// All channels, in declaration order.
    pub const ALL: [OnScreenKeyEventKind; 5] = [
        OnScreenKeyEventKind::PreviewKeyDown,
        OnScreenKeyEventKind::PreviewKeyUp,
        OnScreenKeyEventKind::KeyDown,
        OnScreenKeyEventKind::KeyUp,
        OnScreenKeyEventKind::KeyPressed,
    ];

    /// Returns `true` for the preview channels, whose handlers can veto.
    #[must_use]
    pub fn is_cancelable(self) -> bool {
        matches!(
            self,
            OnScreenKeyEventKind::PreviewKeyDown | OnScreenKeyEventKind::PreviewKeyUp
        )
    }

    fn index(self) -> usize {
        match self {
            OnScreenKeyEventKind::PreviewKeyDown => 0,
            OnScreenKeyEventKind::PreviewKeyUp => 1,
            OnScreenKeyEventKind::KeyDown => 2,
            OnScreenKeyEventKind::KeyUp => 3,
            OnScreenKeyEventKind::KeyPressed => 4,
        }
    }
}

impl fmt::Display for OnScreenKeyEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OnScreenKeyEventKind::PreviewKeyDown => "PreviewOnScreenKeyDown",
            OnScreenKeyEventKind::PreviewKeyUp => "PreviewOnScreenKeyUp",
            OnScreenKeyEventKind::KeyDown => "OnScreenKeyDown",
            OnScreenKeyEventKind::KeyUp => "OnScreenKeyUp",
            OnScreenKeyEventKind::KeyPressed => "OnScreenKeyPress",
        };
        f.write_str(name)
    }
}

/// Arguments passed to event handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnScreenKeyEvent {
    kind: OnScreenKeyEventKind,
    key: KeyDescriptor,
    is_pointer_down: bool,
    handled: bool,
}

impl OnScreenKeyEvent {
    /// Creates an unhandled event.
    pub fn new(kind: OnScreenKeyEventKind, key: KeyDescriptor, is_pointer_down: bool) -> Self {
        Self {
            kind,
            key,
            is_pointer_down,
            handled: false,
        }
    }

    pub fn kind(&self) -> OnScreenKeyEventKind {
        self.kind
    }

    /// The bound logical key as it was when the event was raised.
    ///
    /// For [`OnScreenKeyEventKind::KeyPressed`] this is the payload of the
    /// logical key's notification, unchanged.
    pub fn key(&self) -> &KeyDescriptor {
        &self.key
    }

    /// The widget's pointer-down flag when the event was raised.
    pub fn is_pointer_down(&self) -> bool {
        self.is_pointer_down
    }

    pub fn is_handled(&self) -> bool {
        self.handled
    }

    /// Marks the event handled.
    ///
    /// On a preview event this vetoes the widget's default effect. On any
    /// other event it has no effect on the widget.
    pub fn set_handled(&mut self) {
        self.handled = true;
    }
}

/// Result of raising one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchOutcome {
    /// `true` if a handler vetoed a cancelable event.
    pub handled: bool,
    /// Number of handlers that ran.
    pub handler_count: usize,
}

/// Identifies a registered event handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId {
    kind: OnScreenKeyEventKind,
    id: CallbackId,
}

impl HandlerId {
    /// The channel the handler is registered on.
    pub fn kind(&self) -> OnScreenKeyEventKind {
        self.kind
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Handler registry for the five event channels.
#[derive(Debug)]
pub struct EventDispatcher {
    channels: [CallbackList<OnScreenKeyEvent>; 5],
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            channels: std::array::from_fn(|_| CallbackList::new()),
        }
    }

    /// Registers a handler on one channel.
    pub fn add_handler<F>(&self, kind: OnScreenKeyEventKind, handler: F) -> HandlerId
    where
        F: Fn(&mut OnScreenKeyEvent) + 'static,
    {
        let id = self.channels[kind.index()].subscribe(handler);
        HandlerId { kind, id }
    }

    /// Removes a handler. Returns `false` if it was already removed.
    pub fn remove_handler(&self, handler: HandlerId) -> bool {
        self.channels[handler.kind.index()].unsubscribe(handler.id)
    }

    /// Number of handlers registered on a channel.
    pub fn handler_count(&self, kind: OnScreenKeyEventKind) -> usize {
        self.channels[kind.index()].len()
    }

    /// Raises an event and returns once every handler has run.
    ///
    /// `handled` in the outcome is only ever `true` for cancelable events.
    pub fn dispatch(&self, mut event: OnScreenKeyEvent) -> DispatchOutcome {
        let kind = event.kind;
        let handler_count = self.channels[kind.index()].emit(&mut event);
        let handled = kind.is_cancelable() && event.handled;

        tracing::trace!(
            target: LOG_TARGET,
            "Raised {} for '{}' ({} handler(s), handled: {})",
            kind,
            event.key.display_name,
            handler_count,
            handled
        );

        DispatchOutcome {
            handled,
            handler_count,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
