// SPDX-License-Identifier: GPL-3.0-only

//! oskey-trace
//!
//! Drives a few on-screen keys through a scripted pointer session and logs
//! every event and affordance change. Useful for checking how a set of key
//! options behaves without a real toolkit.
//!
//! Usage: `oskey-trace [options.json]`
//!
//! Set `RUST_LOG=oskey=trace` to also see dispatch internals.

use oskey::logical_key::KeyDescriptor;
use oskey::{
    app_settings, AffordanceTransition, KeyOptions, LogicalKey, OnScreenKey, OnScreenKeyEventKind,
    PresentationAdapter,
};

/// Presentation adapter that logs instead of drawing.
struct LoggingPresentation {
    name: &'static str,
}

impl PresentationAdapter for LoggingPresentation {
    fn show_pressed_affordance(&mut self) {
        tracing::info!("[{}] affordance: pressed", self.name);
    }

    fn show_released_affordance(&mut self, transition: AffordanceTransition) {
        tracing::info!("[{}] affordance: released ({:?})", self.name, transition);
    }

    fn show_hover_affordance(&mut self) {
        tracing::info!("[{}] affordance: hover", self.name);
    }

    fn clear_hover_affordance(&mut self) {
        tracing::info!("[{}] affordance: hover cleared", self.name);
    }

    fn show_label(&mut self, label: &str) {
        tracing::info!("[{}] label: {}", self.name, label);
    }
}

fn build_widget(name: &'static str, key: LogicalKey, options: KeyOptions) -> OnScreenKey {
    let mut widget = OnScreenKey::new()
        .with_options(options)
        .with_presentation(LoggingPresentation { name });

    for kind in OnScreenKeyEventKind::ALL {
        widget.add_handler(kind, move |event| {
            tracing::info!(
                "[{}] event: {} (pointer down: {}, in effect: {})",
                name,
                event.kind(),
                event.is_pointer_down(),
                event.key().is_in_effect
            );
        });
    }

    widget.set_key(key);
    widget
}

fn main() -> Result<(), oskey::ConfigError> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(app_settings::DEFAULT_LOG_DIRECTIVE.parse().unwrap()),
        )
        .init();

    let options = match std::env::args().nth(1) {
        Some(path) => KeyOptions::from_json_file(path)?,
        None => KeyOptions::default(),
    };
    tracing::info!("Tracing on-screen keys with {:?}", options);

    let shift = LogicalKey::instantaneous_modifier("Shift");
    let caps = LogicalKey::toggling_modifier("Caps");
    let latch = shift.clone();
    let letter = LogicalKey::simple("a").with_sink(move |key: &KeyDescriptor| {
        tracing::info!("[input] typed '{}'", key.display_name);
        latch.clear_effect();
    });

    let mut shift_key = build_widget("shift", shift, options);
    let mut caps_key = build_widget("caps", caps, options);
    let mut letter_key = build_widget("a", letter, options);

    tracing::info!("-- latch shift, then type a letter");
    shift_key.on_pointer_enter();
    shift_key.on_pointer_down();
    shift_key.on_pointer_up();
    letter_key.on_pointer_enter();
    letter_key.on_pointer_down();
    letter_key.on_pointer_up();
    letter_key.on_pointer_leave();

    tracing::info!("-- toggle caps on, drag off the key");
    caps_key.on_pointer_enter();
    caps_key.on_pointer_down();
    caps_key.on_pointer_leave();

    tracing::info!("-- toggle caps off");
    caps_key.on_pointer_down();
    caps_key.on_pointer_up();

    Ok(())
}
