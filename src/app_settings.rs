// SPDX-License-Identifier: GPL-3.0-only

//! Centralized crate settings and constants.

/// Tracing target used by every log statement in this crate.
pub const LOG_TARGET: &str = "oskey";

/// Default tracing directive installed by the `oskey-trace` binary.
pub const DEFAULT_LOG_DIRECTIVE: &str = "oskey=info";

/// Whether release affordances fade out by default.
pub const DEFAULT_ARE_ANIMATIONS_ENABLED: bool = true;

/// Whether hovering a key shows an affordance by default.
pub const DEFAULT_IS_HOVER_EFFECT_ENABLED: bool = false;

/// Property name reported when a logical key's label changes.
pub const PROPERTY_DISPLAY_NAME: &str = "DisplayName";

/// Property name reported when a modifier's in-effect flag changes.
pub const PROPERTY_IS_IN_EFFECT: &str = "IsInEffect";
