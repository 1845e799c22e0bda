// SPDX-License-Identifier: GPL-3.0-only

//! The on-screen key widget.
//!
//! [`OnScreenKey`] owns the press/release lifecycle of one key on a virtual
//! keyboard. It reconciles three sources of state:
//!
//! - pointer input from the host (`on_pointer_*`),
//! - the bound [`LogicalKey`], whose modifier flag can change at any time,
//! - the cancelable [`events`] pipeline, whose handlers may veto a gesture.
//!
//! # Activation
//!
//! ```text
//!            pointer down                 pointer up / pointer leave
//!   Idle ─────────────────► PointerDown ─────────────────────────────► Idle
//! ```
//!
//! Pointer down raises `PreviewKeyDown`; unless a handler vetoes it the widget
//! marks itself down, shows the pressed affordance and presses the logical key.
//! `KeyDown` is raised either way. Pointer up mirrors this with
//! `PreviewKeyUp`/`KeyUp`, except that a modifier still in effect keeps its
//! pressed look. Leaving the key while it is down counts as releasing it.
//!
//! # Example
//!
//! ```rust
//! use oskey::logical_key::LogicalKey;
//! use oskey::widget::events::OnScreenKeyEventKind;
//! use oskey::widget::presentation::RecordingPresentation;
//! use oskey::OnScreenKey;
//!
//! let presentation = RecordingPresentation::new();
//! let mut widget = OnScreenKey::new().with_presentation(presentation.clone());
//! widget.set_key(LogicalKey::simple("A"));
//!
//! widget.add_handler(OnScreenKeyEventKind::PreviewKeyDown, |event| {
//!     if event.key().display_name == "A" {
//!         event.set_handled();
//!     }
//! });
//!
//! widget.on_pointer_down();
//! assert!(!widget.is_pointer_down());
//! assert_eq!(presentation.pressed_count(), 0);
//! ```

pub mod events;
pub mod presentation;

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::app_settings::LOG_TARGET;
use crate::config::KeyOptions;
use crate::logical_key::{
    KeyDescriptor, KeyKind, KeyNotification, KeyProperty, KeySubscription, LogicalKey,
};

use events::{DispatchOutcome, EventDispatcher, HandlerId, OnScreenKeyEvent, OnScreenKeyEventKind};
use presentation::{AffordanceTransition, NoopPresentation, PresentationAdapter};

// ============================================================================
// Activation State
// ============================================================================

/// Activation state of a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ActivationState {
    #[default]
    Idle,
    PointerDown,
}

// ============================================================================
// Shared Widget Internals
// ============================================================================

struct Binding {
    key: LogicalKey,
    subscription: KeySubscription,
}

#[derive(Default)]
struct WidgetState {
    binding: Option<Binding>,
    is_pointer_down: bool,
    options: KeyOptions,
}

/// State reachable from the logical key's notification callback.
///
/// The callback holds a `Weak` reference, so the widget alone keeps this
/// alive. No `RefCell` borrow is held while events are raised or the logical
/// key is pressed.
struct WidgetShared {
    state: RefCell<WidgetState>,
    events: EventDispatcher,
    presentation: RefCell<Box<dyn PresentationAdapter>>,
}

impl WidgetShared {
    fn key(&self) -> Option<LogicalKey> {
        self.state
            .borrow()
            .binding
            .as_ref()
            .map(|binding| binding.key.clone())
    }

    fn is_pointer_down(&self) -> bool {
        self.state.borrow().is_pointer_down
    }

    fn set_pointer_down(&self, is_pointer_down: bool) {
        self.state.borrow_mut().is_pointer_down = is_pointer_down;
    }

    fn options(&self) -> KeyOptions {
        self.state.borrow().options
    }

    fn present(&self, call: impl FnOnce(&mut dyn PresentationAdapter)) {
        match self.presentation.try_borrow_mut() {
            Ok(mut adapter) => call(&mut **adapter),
            Err(_) => {
                tracing::warn!(
                    target: LOG_TARGET,
                    "Presentation adapter re-entered; dropping affordance update"
                );
            }
        }
    }

    fn show_pressed(&self) {
        self.present(|adapter| adapter.show_pressed_affordance());
    }

    /// Shows the released affordance unless the key is a modifier in effect.
    fn show_released(&self) {
        let key = self.key();
        let kind = key.as_ref().map(LogicalKey::kind);

        if key.as_ref().is_some_and(LogicalKey::is_modifier_in_effect) {
            tracing::trace!(
                target: LOG_TARGET,
                "Modifier in effect; keeping pressed affordance"
            );
            return;
        }

        let transition = match kind {
            Some(KeyKind::Simple) if self.options().are_animations_enabled => {
                AffordanceTransition::Fade
            }
            _ => AffordanceTransition::Instant,
        };
        self.present(|adapter| adapter.show_released_affordance(transition));
    }

    fn raise(&self, kind: OnScreenKeyEventKind, key: KeyDescriptor) -> DispatchOutcome {
        let event = OnScreenKeyEvent::new(kind, key, self.is_pointer_down());
        self.events.dispatch(event)
    }

    fn handle_pointer_down(&self, key: &LogicalKey) {
        let was_down = self.is_pointer_down();
        let preview = self.raise(OnScreenKeyEventKind::PreviewKeyDown, key.descriptor());

        if was_down {
            tracing::debug!(
                target: LOG_TARGET,
                "Pointer already down on '{}'; not pressing again",
                key.display_name()
            );
        } else if preview.handled {
            tracing::debug!(
                target: LOG_TARGET,
                "Key down on '{}' vetoed by a preview handler",
                key.display_name()
            );
        } else {
            self.set_pointer_down(true);
            self.show_pressed();
            key.press();
        }

        self.raise(OnScreenKeyEventKind::KeyDown, key.descriptor());
    }

    fn handle_pointer_up(&self, key: &LogicalKey) {
        let preview = self.raise(OnScreenKeyEventKind::PreviewKeyUp, key.descriptor());

        if preview.handled {
            tracing::debug!(
                target: LOG_TARGET,
                "Key up on '{}' vetoed by a preview handler",
                key.display_name()
            );
        } else {
            self.set_pointer_down(false);
            self.show_released();
        }

        self.raise(OnScreenKeyEventKind::KeyUp, key.descriptor());
    }

    fn on_key_notification(&self, notification: &KeyNotification) {
        match notification {
            KeyNotification::PropertyChanged {
                property: KeyProperty::IsInEffect,
                value,
            } => {
                let Some(is_in_effect) = value.as_bool() else {
                    return;
                };
                if !self.key().is_some_and(|key| key.kind().is_modifier()) {
                    return;
                }
                if is_in_effect {
                    self.show_pressed();
                } else if !self.is_pointer_down() {
                    self.show_released();
                }
            }
            KeyNotification::PropertyChanged {
                property: KeyProperty::DisplayName,
                value,
            } => {
                if let Some(label) = value.as_text() {
                    self.present(|adapter| adapter.show_label(label));
                }
            }
            KeyNotification::Pressed(descriptor) => {
                self.raise(OnScreenKeyEventKind::KeyPressed, descriptor.clone());
            }
        }
    }
}

// ============================================================================
// On-Screen Key
// ============================================================================

/// One interactive key on a virtual keyboard.
///
/// A widget starts without a logical key; pointer input is a contract
/// violation until [`OnScreenKey::set_key`] has been called.
pub struct OnScreenKey {
    shared: Rc<WidgetShared>,
}

impl Default for OnScreenKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OnScreenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnScreenKey")
            .field("key", &self.key())
            .field("is_pointer_down", &self.is_pointer_down())
            .field("options", &self.options())
            .finish()
    }
}

impl OnScreenKey {
    /// Creates an unbound widget with default options and no presentation.
    pub fn new() -> Self {
        Self {
            shared: Rc::new(WidgetShared {
                state: RefCell::new(WidgetState::default()),
                events: EventDispatcher::new(),
                presentation: RefCell::new(Box::new(NoopPresentation)),
            }),
        }
    }

    /// Returns the widget with a presentation adapter installed.
    #[must_use]
    pub fn with_presentation(mut self, adapter: impl PresentationAdapter + 'static) -> Self {
        self.set_presentation(adapter);
        self
    }

    /// Returns the widget with the given options.
    #[must_use]
    pub fn with_options(mut self, options: KeyOptions) -> Self {
        self.set_options(options);
        self
    }

    /// Replaces the presentation adapter.
    pub fn set_presentation(&mut self, adapter: impl PresentationAdapter + 'static) {
        *self.shared.presentation.borrow_mut() = Box::new(adapter);
    }

    /// Replaces the presentation options.
    pub fn set_options(&mut self, options: KeyOptions) {
        self.shared.state.borrow_mut().options = options;
    }

    /// The current presentation options.
    pub fn options(&self) -> KeyOptions {
        self.shared.options()
    }

    // ========================================================================
    // Key Binding
    // ========================================================================

    /// Binds a logical key.
    ///
    /// Any previous key is unsubscribed first and the pointer-down flag is
    /// reset. The presentation is then synchronised with the new key's label
    /// and modifier state.
    pub fn set_key(&mut self, key: LogicalKey) {
        self.release_binding();
        self.shared.set_pointer_down(false);

        let weak: Weak<WidgetShared> = Rc::downgrade(&self.shared);
        let subscription = key.subscribe(move |notification| {
            if let Some(shared) = weak.upgrade() {
                shared.on_key_notification(notification);
            }
        });

        tracing::debug!(
            target: LOG_TARGET,
            "Bound on-screen key to '{}' ({:?})",
            key.display_name(),
            key.kind()
        );

        let label = key.display_name();
        let in_effect = key.is_modifier_in_effect();
        self.shared.state.borrow_mut().binding = Some(Binding { key, subscription });

        self.shared.present(|adapter| {
            adapter.show_label(&label);
            if in_effect {
                adapter.show_pressed_affordance();
            } else {
                adapter.show_released_affordance(AffordanceTransition::Instant);
            }
        });
    }

    /// Unbinds the logical key, returning it.
    pub fn clear_key(&mut self) -> Option<LogicalKey> {
        let key = self.release_binding();
        self.shared.set_pointer_down(false);
        key
    }

    /// The bound logical key.
    pub fn key(&self) -> Option<LogicalKey> {
        self.shared.key()
    }

    /// Returns `true` once a logical key is bound.
    pub fn is_configured(&self) -> bool {
        self.shared.state.borrow().binding.is_some()
    }

    fn release_binding(&mut self) -> Option<LogicalKey> {
        let binding = self.shared.state.borrow_mut().binding.take()?;
        binding.key.unsubscribe(binding.subscription);
        tracing::debug!(
            target: LOG_TARGET,
            "Released on-screen key binding to '{}'",
            binding.key.display_name()
        );
        Some(binding.key)
    }

    fn require_key(&self, input: &str) -> LogicalKey {
        match self.key() {
            Some(key) => key,
            None => {
                tracing::error!(
                    target: LOG_TARGET,
                    "On-screen key received {} before a logical key was assigned",
                    input
                );
                panic!("on-screen key received {input} before a logical key was assigned");
            }
        }
    }

    // ========================================================================
    // State Queries
    // ========================================================================

    /// `true` while the pointer is held on the key.
    pub fn is_pointer_down(&self) -> bool {
        self.shared.is_pointer_down()
    }

    pub fn activation_state(&self) -> ActivationState {
        if self.is_pointer_down() {
            ActivationState::PointerDown
        } else {
            ActivationState::Idle
        }
    }

    /// Mirrors the bound key's in-effect flag; `false` when unbound.
    pub fn is_in_effect(&self) -> bool {
        self.key().is_some_and(|key| key.is_in_effect())
    }

    /// Whether the key should currently look pressed.
    ///
    /// True while the pointer is down or while a bound modifier is in effect.
    pub fn is_pressed_affordance_active(&self) -> bool {
        self.is_pointer_down() || self.key().is_some_and(|key| key.is_modifier_in_effect())
    }

    // ========================================================================
    // Event Handlers
    // ========================================================================

    /// Registers an event handler. See [`events`] for the dispatch contract.
    pub fn add_handler<F>(&self, kind: OnScreenKeyEventKind, handler: F) -> HandlerId
    where
        F: Fn(&mut OnScreenKeyEvent) + 'static,
    {
        self.shared.events.add_handler(kind, handler)
    }

    /// Removes an event handler. Returns `false` if it was already removed.
    pub fn remove_handler(&self, handler: HandlerId) -> bool {
        self.shared.events.remove_handler(handler)
    }

    // ========================================================================
    // Pointer Input
    // ========================================================================

    /// Pointer button pressed inside the key.
    ///
    /// A second press while already down raises `PreviewKeyDown` and
    /// `KeyDown` again but does not press the logical key a second time.
    ///
    /// # Panics
    ///
    /// Panics if no logical key is bound.
    pub fn on_pointer_down(&mut self) {
        let key = self.require_key("pointer down");
        self.shared.handle_pointer_down(&key);
    }

    /// Pointer button released inside the key.
    ///
    /// Always raises `PreviewKeyUp` and `KeyUp`, including after a vetoed
    /// key down.
    ///
    /// # Panics
    ///
    /// Panics if no logical key is bound.
    pub fn on_pointer_up(&mut self) {
        let key = self.require_key("pointer up");
        self.shared.handle_pointer_up(&key);
    }

    /// Pointer entered the key bounds.
    ///
    /// # Panics
    ///
    /// Panics if no logical key is bound.
    pub fn on_pointer_enter(&mut self) {
        let _key = self.require_key("pointer enter");
        if self.options().is_hover_effect_enabled {
            self.shared.present(|adapter| adapter.show_hover_affordance());
        }
    }

    /// Pointer left the key bounds.
    ///
    /// Releases the key if it is down; otherwise only the hover affordance
    /// is affected. A toggling modifier in effect keeps its hover highlight.
    ///
    /// # Panics
    ///
    /// Panics if no logical key is bound.
    pub fn on_pointer_leave(&mut self) {
        let key = self.require_key("pointer leave");

        let keeps_highlight = key.kind() == KeyKind::TogglingModifier && key.is_in_effect();
        if self.options().is_hover_effect_enabled && !keeps_highlight {
            self.shared.present(|adapter| adapter.clear_hover_affordance());
        }

        if self.is_pointer_down() {
            self.shared.handle_pointer_up(&key);
        }
    }
}

impl Drop for OnScreenKey {
    fn drop(&mut self) {
        self.release_binding();
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
