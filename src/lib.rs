// SPDX-License-Identifier: GPL-3.0-only

//! oskey - press/release state machine for on-screen keyboard keys
//!
//! This crate models a single interactive key on a virtual keyboard. It tracks
//! pointer press/release, coordinates with the key's logical behavior and
//! raises a cancelable event sequence so a host can intercept key activity
//! before it takes effect. Rendering is left to the host through a
//! presentation adapter.
//!
//! # Architecture
//!
//! Control flows in one direction and feeds back through notifications:
//!
//! 1. **Pointer input** reaches an [`OnScreenKey`] (`on_pointer_down`, ...).
//! 2. The widget raises **preview events**; handlers may veto.
//! 3. Unless vetoed, the widget updates its state, calls the
//!    [`PresentationAdapter`] and presses the [`LogicalKey`].
//! 4. The logical key **notifies** every widget bound to it, which keeps
//!    modifier affordances in sync and relays the press as `KeyPressed`.
//!
//! Everything is single-threaded and synchronous; handles are `!Send`.
//!
//! # Modules
//!
//! - `app_settings`: Crate constants (defaults, property names, log target)
//! - `callbacks`: Re-entrancy safe callback registry
//! - `config`: Presentation options and JSON loading
//! - `logical_key`: Logical keys, their kinds and notifications
//! - `widget`: The on-screen key state machine, its events and presentation

pub mod app_settings;
pub mod callbacks;
pub mod config;
pub mod logical_key;
pub mod widget;

pub use config::{ConfigError, KeyOptions};
pub use logical_key::{KeyKind, KeyNotification, KeySink, LogicalKey};
pub use widget::events::{OnScreenKeyEvent, OnScreenKeyEventKind};
pub use widget::presentation::{AffordanceTransition, PresentationAdapter};
pub use widget::{ActivationState, OnScreenKey};

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod integration_tests {
    use crate::logical_key::KeyDescriptor;
    use crate::widget::presentation::{AffordanceCall, RecordingPresentation};
    use crate::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Integration Test 1: One modifier shown by two widgets
    ///
    /// Both widgets receive the modifier's changes, and neither shares the
    /// other's pointer state.
    #[test]
    fn test_shared_modifier_two_widgets() {
        let caps = LogicalKey::toggling_modifier("Caps");

        let left_view = RecordingPresentation::new();
        let mut left = OnScreenKey::new().with_presentation(left_view.clone());
        left.set_key(caps.clone());

        let right_view = RecordingPresentation::new();
        let mut right = OnScreenKey::new().with_presentation(right_view.clone());
        right.set_key(caps.clone());

        left.on_pointer_down();
        assert!(left.is_pointer_down());
        assert!(!right.is_pointer_down(), "Pointer state is per widget");
        assert_eq!(right_view.last_shown_pressed(), Some(true));

        left.on_pointer_up();
        assert!(caps.is_in_effect());
        assert!(left.is_pressed_affordance_active());
        assert!(right.is_pressed_affordance_active());

        // Toggle off from the other widget
        right.on_pointer_down();
        right.on_pointer_up();
        assert!(!caps.is_in_effect());
        assert_eq!(left_view.last_shown_pressed(), Some(false));
        assert_eq!(right_view.last_shown_pressed(), Some(false));
    }

    /// Integration Test 2: Latched shift consumed by the next simple key
    ///
    /// The host clears instantaneous modifiers when a simple key reports a
    /// press; the shift widget returns to its released look without any
    /// pointer activity of its own.
    #[test]
    fn test_shift_latch_consumed_by_letter() {
        let shift = LogicalKey::instantaneous_modifier("Shift");
        let letter = LogicalKey::simple("a");

        let shift_view = RecordingPresentation::new();
        let mut shift_widget = OnScreenKey::new().with_presentation(shift_view.clone());
        shift_widget.set_key(shift.clone());
        shift_view.take();

        let mut letter_widget = OnScreenKey::new();
        letter_widget.set_key(letter.clone());

        let typed = Rc::new(RefCell::new(String::new()));
        let output = Rc::clone(&typed);
        let latch = shift.clone();
        letter_widget.add_handler(OnScreenKeyEventKind::KeyPressed, move |event| {
            let text = if latch.is_in_effect() {
                event.key().display_name.to_uppercase()
            } else {
                event.key().display_name.clone()
            };
            output.borrow_mut().push_str(&text);
            latch.clear_effect();
        });

        shift_widget.on_pointer_down();
        shift_widget.on_pointer_up();
        assert_eq!(shift_view.released_count(), 0, "Latched shift looks down");

        letter_widget.on_pointer_down();
        letter_widget.on_pointer_up();
        letter_widget.on_pointer_down();
        letter_widget.on_pointer_up();

        assert_eq!(*typed.borrow(), "Aa");
        assert!(!shift.is_in_effect());
        assert_eq!(
            shift_view.calls().last(),
            Some(&AffordanceCall::Released(AffordanceTransition::Instant))
        );
    }

    /// Integration Test 3: Host sink receives presses in order
    ///
    /// A keyboard-wide sink forwards every press, and a preview handler
    /// blocking one key keeps it out of the input stream.
    #[test]
    fn test_sink_receives_unvetoed_presses() {
        let stream = Rc::new(RefCell::new(Vec::new()));
        let make_key = |name: &str| {
            let stream = Rc::clone(&stream);
            LogicalKey::simple(name).with_sink(move |key: &KeyDescriptor| {
                stream.borrow_mut().push(key.display_name.clone());
            })
        };

        let mut widgets: Vec<OnScreenKey> = ["h", "i", "!"]
            .into_iter()
            .map(|name| {
                let mut widget = OnScreenKey::new();
                widget.set_key(make_key(name));
                widget
            })
            .collect();

        widgets[2].add_handler(OnScreenKeyEventKind::PreviewKeyDown, |event| {
            event.set_handled();
        });

        for widget in &mut widgets {
            widget.on_pointer_down();
            widget.on_pointer_leave();
        }

        assert_eq!(*stream.borrow(), vec!["h".to_string(), "i".to_string()]);
        assert!(widgets.iter().all(|w| !w.is_pointer_down()));
    }

    /// Integration Test 4: Options loaded from JSON drive the widget
    #[test]
    fn test_options_from_json_drive_widget() {
        let options = KeyOptions::from_json_str(
            r#"{ "are_animations_enabled": false, "is_hover_effect_enabled": true }"#,
        )
        .expect("valid options");

        let view = RecordingPresentation::new();
        let mut widget = OnScreenKey::new()
            .with_options(options)
            .with_presentation(view.clone());
        widget.set_key(LogicalKey::simple("Enter"));
        view.take();

        widget.on_pointer_enter();
        widget.on_pointer_down();
        widget.on_pointer_leave();

        assert_eq!(
            view.calls(),
            vec![
                AffordanceCall::HoverShown,
                AffordanceCall::Pressed,
                AffordanceCall::HoverCleared,
                AffordanceCall::Released(AffordanceTransition::Instant),
            ]
        );
    }

    /// Integration Test 5: Async observer sees widget-driven activity
    #[tokio::test]
    async fn test_async_observer_of_widget_activity() {
        use futures::StreamExt;

        let caps = LogicalKey::toggling_modifier("Caps");
        let (subscription, mut notifications) = caps.notification_channel();

        let mut widget = OnScreenKey::new();
        widget.set_key(caps.clone());
        widget.on_pointer_down();
        widget.on_pointer_up();
        caps.unsubscribe(subscription);

        let received: Vec<KeyNotification> = notifications.by_ref().collect().await;
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].in_effect_change(), Some(true));
        assert!(matches!(received[1], KeyNotification::Pressed(_)));
    }
}
