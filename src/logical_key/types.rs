// SPDX-License-Identifier: GPL-3.0-only

//! Value types carried by logical keys and their notifications.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::app_settings;

// ============================================================================
// Key Kind
// ============================================================================

/// Behavior of a logical key.
///
/// - **Simple**: a regular key; never in effect.
/// - **TogglingModifier**: a lock such as Caps Lock; stays in effect until
///   pressed again.
/// - **InstantaneousModifier**: a latch such as Shift; stays in effect until
///   pressed again or cleared once consumed by the next keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    Simple,
    TogglingModifier,
    InstantaneousModifier,
}

impl KeyKind {
    /// Returns `true` for both modifier variants.
    #[must_use]
    pub fn is_modifier(self) -> bool {
        match self {
            KeyKind::Simple => false,
            KeyKind::TogglingModifier | KeyKind::InstantaneousModifier => true,
        }
    }
}

// ============================================================================
// Property Changes
// ============================================================================

/// Observable properties of a logical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyProperty {
    DisplayName,
    IsInEffect,
}

impl KeyProperty {
    /// The property name as reported to observers.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            KeyProperty::DisplayName => app_settings::PROPERTY_DISPLAY_NAME,
            KeyProperty::IsInEffect => app_settings::PROPERTY_IS_IN_EFFECT,
        }
    }
}

impl fmt::Display for KeyProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// New value carried by a property change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Text(String),
    Bool(bool),
}

impl PropertyValue {
    /// Returns the boolean payload, if this is a flag.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(value) => Some(*value),
            PropertyValue::Text(_) => None,
        }
    }

    /// Returns the text payload, if this is a label.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(value) => Some(value),
            PropertyValue::Bool(_) => None,
        }
    }
}

// ============================================================================
// Descriptors and Notifications
// ============================================================================

/// Snapshot of a logical key at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDescriptor {
    /// The label shown on the key
    pub display_name: String,
    /// The key's behavior
    pub kind: KeyKind,
    /// Whether a modifier's effect is active; always `false` for simple keys
    pub is_in_effect: bool,
}

/// Notifications emitted by a logical key to its subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyNotification {
    /// A property changed; carries the new value.
    PropertyChanged {
        property: KeyProperty,
        value: PropertyValue,
    },

    /// The key was pressed, from any cause.
    ///
    /// The descriptor reflects the key state after the press was applied.
    Pressed(KeyDescriptor),
}

impl KeyNotification {
    /// Returns the new in-effect flag if this notification reports one.
    #[must_use]
    pub fn in_effect_change(&self) -> Option<bool> {
        match self {
            KeyNotification::PropertyChanged {
                property: KeyProperty::IsInEffect,
                value,
            } => value.as_bool(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_is_modifier() {
        assert!(!KeyKind::Simple.is_modifier());
        assert!(KeyKind::TogglingModifier.is_modifier());
        assert!(KeyKind::InstantaneousModifier.is_modifier());
    }

    #[test]
    fn test_property_names() {
        assert_eq!(KeyProperty::DisplayName.to_string(), "DisplayName");
        assert_eq!(KeyProperty::IsInEffect.name(), "IsInEffect");
    }

    #[test]
    fn test_in_effect_change_only_matches_flag() {
        let flag = KeyNotification::PropertyChanged {
            property: KeyProperty::IsInEffect,
            value: PropertyValue::Bool(true),
        };
        assert_eq!(flag.in_effect_change(), Some(true));

        let label = KeyNotification::PropertyChanged {
            property: KeyProperty::DisplayName,
            value: PropertyValue::Text("A".into()),
        };
        assert_eq!(label.in_effect_change(), None);
    }

    #[test]
    fn test_kind_serde_names() {
        let json = serde_json::to_string(&KeyKind::InstantaneousModifier).unwrap();
        assert_eq!(json, "\"instantaneous_modifier\"");
        let kind: KeyKind = serde_json::from_str("\"toggling_modifier\"").unwrap();
        assert_eq!(kind, KeyKind::TogglingModifier);
    }
}
