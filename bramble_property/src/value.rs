// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dynamic property values and the default change-detection predicate.

use alloc::string::{String, ToString};
use core::fmt;

/// A dynamically typed property value.
///
/// Reactive element properties are configured declaratively and set at
/// runtime, so their values are carried in a closed dynamic enum rather than
/// as static Rust types. The variants mirror the value space the attribute
/// bridge can convert: booleans, IEEE numbers, strings, and JSON-shaped
/// object/array payloads.
///
/// `Undefined` and `Null` are distinct: reflection skips an `Undefined`
/// result entirely but treats `Null` as "remove the attribute".
///
/// # Equality
///
/// `PartialEq` follows IEEE semantics for numbers: `NaN != NaN`. The
/// scheduler's default change detection layers the NaN-is-unchanged rule on
/// top via [`default_has_changed`].
///
/// # Example
///
/// ```rust
/// use bramble_property::Value;
///
/// let v = Value::Number(5.0);
/// assert_eq!(v.display_string(), "5");
/// assert!(v.is_truthy());
/// assert!(!Value::Null.is_truthy());
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    /// No value has ever been assigned.
    #[default]
    Undefined,
    /// An explicit null.
    Null,
    /// A boolean.
    Bool(bool),
    /// An IEEE double, matching the host language's number semantics.
    Number(f64),
    /// A string.
    String(String),
    /// An object or array payload.
    Json(serde_json::Value),
}

impl Value {
    /// Returns `true` for [`Value::Undefined`].
    #[must_use]
    #[inline]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the contained boolean, if any.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the contained number, if any.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the contained string, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the contained JSON payload, if any.
    #[must_use]
    pub const fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Truthiness, following the host language's coercion rules.
    ///
    /// `Undefined`, `Null`, `false`, `0`, `NaN`, and the empty string are
    /// falsy; object and array payloads are always truthy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            Self::Json(_) => true,
        }
    }

    /// Renders this value as a plain (unquoted) string.
    ///
    /// Used by the default converters when serializing toward an attribute.
    /// Numbers format without a trailing `.0` (`5.0` renders as `"5"`), and
    /// JSON payloads serialize compactly.
    #[must_use]
    pub fn display_string(&self) -> String {
        match self {
            Self::Undefined => String::from("undefined"),
            Self::Null => String::from("null"),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => n.to_string(),
            Self::String(s) => s.clone(),
            Self::Json(v) => v.to_string(),
        }
    }

    /// Converts this value into a JSON value for serialization.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Undefined | Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Json(v) => v.clone(),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(String::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_string())
    }
}

/// Default change-detection predicate.
///
/// Strict inequality, with one carve-out: a property that is `NaN` and is
/// assigned `NaN` again counts as unchanged, so repeated `NaN` writes do not
/// schedule updates.
///
/// # Example
///
/// ```rust
/// use bramble_property::{Value, default_has_changed};
///
/// let nan = Value::Number(f64::NAN);
/// assert!(!default_has_changed(&nan, &nan));
/// assert!(!default_has_changed(&Value::Number(5.0), &Value::Number(5.0)));
/// assert!(default_has_changed(&Value::Number(6.0), &Value::Number(5.0)));
/// ```
#[must_use]
pub fn default_has_changed(new: &Value, old: &Value) -> bool {
    if let (Value::Number(a), Value::Number(b)) = (old, new)
        && a.is_nan()
        && b.is_nan()
    {
        return false;
    }
    old != new
}
