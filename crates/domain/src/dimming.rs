//! Percentage ↔ raw value mapping for dimmable resources.
//!
//! A dimmable resource reports `{"dimmingSetting": <int>, "range": "<min>,<max>"}`.
//! Every value the gateway writes stays within `[0, max]`.

use serde_json::Value;

/// `resourceType` of the only resource kind with percentage semantics.
pub const DIMMABLE_RESOURCE_TYPE: &str = "oic.r.light.dimming";

/// Upper bound used when the resource carries no parsable `range`.
pub const DEFAULT_MAX: i64 = 100;

/// Direction of a relative percentage change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Increase,
    Decrease,
}

/// Read `max` from the `range` field (`"<min>,<max>"`) of a raw value.
///
/// Falls back to [`DEFAULT_MAX`] when the field is absent or unparsable.
#[must_use]
pub fn range_max(raw: &Value) -> i64 {
    raw.get("range")
        .and_then(Value::as_str)
        .and_then(|range| range.split(',').nth(1))
        .and_then(|max| max.trim().parse().ok())
        .unwrap_or(DEFAULT_MAX)
}

/// Current `dimmingSetting` of a raw value, `0` when absent.
#[must_use]
pub fn current_setting(raw: &Value) -> i64 {
    raw.get("dimmingSetting").and_then(Value::as_i64).unwrap_or(0)
}

/// Clamp a computed setting into `[0, max]`.
///
/// Never panics, even when `max` is negative (the result is then `0`).
#[must_use]
pub fn clamp(value: i64, max: i64) -> i64 {
    value.min(max).max(0)
}

/// Raw amount corresponding to `percent` of `max`, truncating toward zero.
#[must_use]
pub fn scale(percent: i64, max: i64) -> i64 {
    percent.saturating_mul(max) / 100
}

/// Setting for an absolute "set percentage" request.
#[must_use]
pub fn set_value(percent: i64, max: i64) -> i64 {
    clamp(scale(percent, max), max)
}

/// Setting for a relative "increment/decrement percentage" request.
#[must_use]
pub fn step_value(current: i64, delta_percent: i64, max: i64, step: Step) -> i64 {
    let delta = scale(delta_percent, max);
    let delta = match step {
        Step::Increase => delta,
        Step::Decrease => -delta,
    };
    clamp(current.saturating_add(delta), max)
}

/// Percentage a raw setting represents, `0` when `max` is not positive.
#[must_use]
pub fn to_percent(setting: i64, max: i64) -> i64 {
    if max <= 0 {
        return 0;
    }
    clamp(setting, max).saturating_mul(100) / max
}
