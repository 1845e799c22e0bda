// SPDX-License-Identifier: GPL-3.0-only

//! Presentation adapter for on-screen keys.
//!
//! The widget never renders anything itself. It tells a [`PresentationAdapter`]
//! which affordance to show and the adapter maps that onto whatever toolkit the
//! host uses. Adapter calls cannot fail: the widget's state is authoritative
//! regardless of what the adapter does with a call.

use std::cell::RefCell;
use std::rc::Rc;

/// How a released affordance should disappear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AffordanceTransition {
    /// Remove the pressed look immediately.
    Instant,
    /// Fade the pressed look out over the toolkit's default duration.
    Fade,
}

/// Outbound visual callbacks made by [`crate::OnScreenKey`].
///
/// Implementations must not call back into the widget that owns them.
pub trait PresentationAdapter {
    /// Show the key as pressed.
    fn show_pressed_affordance(&mut self);

    /// Show the key as released.
    fn show_released_affordance(&mut self, transition: AffordanceTransition);

    /// Highlight the key surface while hovered. Only called when hover
    /// effects are enabled.
    fn show_hover_affordance(&mut self) {}

    /// Remove the hover highlight. Only called when hover effects are enabled.
    fn clear_hover_affordance(&mut self) {}

    /// Display the key's label.
    fn show_label(&mut self, _label: &str) {}
}

/// Adapter that ignores every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPresentation;

impl PresentationAdapter for NoopPresentation {
    fn show_pressed_affordance(&mut self) {}

    fn show_released_affordance(&mut self, _transition: AffordanceTransition) {}
}

// ============================================================================
// Recording Adapter
// ============================================================================

/// A single call received by a [`RecordingPresentation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AffordanceCall {
    Pressed,
    Released(AffordanceTransition),
    HoverShown,
    HoverCleared,
    Label(String),
}

/// Adapter that records every call in order.
///
/// Clones share the same log, so a host can keep one clone and hand the other
/// to a widget.
#[derive(Debug, Clone, Default)]
pub struct RecordingPresentation {
    calls: Rc<RefCell<Vec<AffordanceCall>>>,
}

impl RecordingPresentation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every call recorded so far.
    pub fn calls(&self) -> Vec<AffordanceCall> {
        self.calls.borrow().clone()
    }

    /// Drains the log.
    pub fn take(&self) -> Vec<AffordanceCall> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    /// Number of pressed affordances shown.
    pub fn pressed_count(&self) -> usize {
        self.count(|call| matches!(call, AffordanceCall::Pressed))
    }

    /// Number of released affordances shown.
    pub fn released_count(&self) -> usize {
        self.count(|call| matches!(call, AffordanceCall::Released(_)))
    }

    /// The most recent pressed/released call, ignoring hover and label calls.
    ///
    /// Returns `true` for pressed, `false` for released and `None` if neither
    /// has been recorded.
    pub fn last_shown_pressed(&self) -> Option<bool> {
        self.calls.borrow().iter().rev().find_map(|call| match call {
            AffordanceCall::Pressed => Some(true),
            AffordanceCall::Released(_) => Some(false),
            _ => None,
        })
    }

    fn count(&self, predicate: impl Fn(&AffordanceCall) -> bool) -> usize {
        self.calls.borrow().iter().filter(|call| predicate(call)).count()
    }

    fn record(&self, call: AffordanceCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl PresentationAdapter for RecordingPresentation {
    fn show_pressed_affordance(&mut self) {
        self.record(AffordanceCall::Pressed);
    }

    fn show_released_affordance(&mut self, transition: AffordanceTransition) {
        self.record(AffordanceCall::Released(transition));
    }

    fn show_hover_affordance(&mut self) {
        self.record(AffordanceCall::HoverShown);
    }

    fn clear_hover_affordance(&mut self) {
        self.record(AffordanceCall::HoverCleared);
    }

    fn show_label(&mut self, label: &str) {
        self.record(AffordanceCall::Label(label.to_string()));
    }
}
