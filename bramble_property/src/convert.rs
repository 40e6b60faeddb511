// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bidirectional attribute/property conversion.
//!
//! Attributes are string-valued; properties carry typed [`Value`]s. Each
//! bound property has a [`Converter`] mapping between the two: either a
//! built-in conversion selected by [`TypeHint`], or a custom function pair.

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use core::fmt;

use crate::value::Value;

/// Converts a raw attribute value into a property [`Value`].
///
/// `None` means the attribute is absent (was removed).
pub type FromAttributeFn = Box<dyn Fn(Option<&str>) -> Result<Value, ConvertError> + Send + Sync>;

/// Serializes a property [`Value`] toward its attribute.
pub type ToAttributeFn = Box<dyn Fn(&Value) -> Result<Reflected, ConvertError> + Send + Sync>;

/// The outcome of serializing a property value toward its attribute.
///
/// Mirrors the three outcomes of a `toAttribute` conversion: an undefined
/// result skips reflection entirely, a null result removes the attribute,
/// and a string result sets it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reflected {
    /// Leave the attribute untouched.
    Skip,
    /// Remove the attribute.
    Remove,
    /// Set the attribute to this string.
    Set(String),
}

/// Selects one of the built-in default conversions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum TypeHint {
    /// Attribute presence maps to `true`; truthy values reflect as `""`,
    /// falsy values remove the attribute.
    Boolean,
    /// Numeric parse; an absent attribute maps to `Null`.
    Number,
    /// Identity; an absent attribute maps to `Null`.
    #[default]
    String,
    /// JSON parse/serialize.
    Object,
    /// JSON parse/serialize.
    Array,
}

/// A conversion failure, surfaced synchronously from the attribute bridge
/// or from the reflection step of an update pass.
#[derive(Clone, PartialEq, Eq)]
pub struct ConvertError {
    /// The attribute or property name involved.
    pub name: String,
    /// What went wrong.
    pub reason: String,
}

impl ConvertError {
    /// Creates a conversion error for the given attribute/property name.
    #[must_use]
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Debug for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConvertError {{ name: {:?}, reason: {:?} }}",
            self.name, self.reason
        )
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conversion failed for {:?}: {}", self.name, self.reason)
    }
}

impl core::error::Error for ConvertError {}

/// How a property converts to and from its attribute.
///
/// The default variant carries only a [`TypeHint`] and dispatches to the
/// built-in conversions; the custom variant carries the caller's function
/// pair. Both directions are always available, so the bridge never inspects
/// value types at conversion time.
pub enum Converter {
    /// Built-in conversion for the given type.
    Default(TypeHint),
    /// Caller-supplied conversion pair.
    Custom {
        /// Attribute string to property value.
        from_attribute: FromAttributeFn,
        /// Property value toward the attribute.
        to_attribute: ToAttributeFn,
    },
}

impl Default for Converter {
    fn default() -> Self {
        Self::Default(TypeHint::default())
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default(hint) => f.debug_tuple("Default").field(hint).finish(),
            Self::Custom { .. } => f.debug_struct("Custom").finish_non_exhaustive(),
        }
    }
}

impl Converter {
    /// Converts a raw attribute value (`None` when absent) into a [`Value`].
    pub fn from_attribute(&self, name: &str, raw: Option<&str>) -> Result<Value, ConvertError> {
        match self {
            Self::Default(hint) => default_from_attribute(*hint, name, raw),
            Self::Custom { from_attribute, .. } => from_attribute(raw),
        }
    }

    /// Serializes a property [`Value`] toward its attribute.
    pub fn to_attribute(&self, name: &str, value: &Value) -> Result<Reflected, ConvertError> {
        match self {
            Self::Default(hint) => default_to_attribute(*hint, name, value),
            Self::Custom { to_attribute, .. } => to_attribute(value),
        }
    }
}

fn default_from_attribute(
    hint: TypeHint,
    name: &str,
    raw: Option<&str>,
) -> Result<Value, ConvertError> {
    match hint {
        TypeHint::Boolean => Ok(Value::Bool(raw.is_some())),
        TypeHint::Number => Ok(match raw {
            None => Value::Null,
            Some(s) if s.trim().is_empty() => Value::Number(0.0),
            Some(s) => Value::Number(s.trim().parse::<f64>().unwrap_or(f64::NAN)),
        }),
        TypeHint::String => Ok(match raw {
            None => Value::Null,
            Some(s) => Value::String(s.to_string()),
        }),
        TypeHint::Object | TypeHint::Array => match raw {
            None => Ok(Value::Null),
            Some(s) => serde_json::from_str(s)
                .map(Value::Json)
                .map_err(|e| ConvertError::new(name, e.to_string())),
        },
    }
}

fn default_to_attribute(
    hint: TypeHint,
    name: &str,
    value: &Value,
) -> Result<Reflected, ConvertError> {
    if value.is_undefined() {
        // Boolean reflection treats undefined as falsy (attribute removal);
        // every other conversion leaves the attribute untouched.
        if hint != TypeHint::Boolean {
            return Ok(Reflected::Skip);
        }
    }
    match hint {
        TypeHint::Boolean => Ok(if value.is_truthy() {
            Reflected::Set(String::new())
        } else {
            Reflected::Remove
        }),
        TypeHint::Number | TypeHint::String => Ok(if value.is_null() {
            Reflected::Remove
        } else {
            Reflected::Set(value.display_string())
        }),
        TypeHint::Object | TypeHint::Array => {
            if value.is_null() {
                return Ok(Reflected::Remove);
            }
            serde_json::to_string(&value.to_json())
                .map(Reflected::Set)
                .map_err(|e| ConvertError::new(name, e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn from(hint: TypeHint, raw: Option<&str>) -> Value {
        Converter::Default(hint).from_attribute("p", raw).unwrap()
    }

    fn to(hint: TypeHint, value: &Value) -> Reflected {
        Converter::Default(hint).to_attribute("p", value).unwrap()
    }

    #[test]
    fn boolean_presence_semantics() {
        assert_eq!(from(TypeHint::Boolean, Some("")), Value::Bool(true));
        assert_eq!(from(TypeHint::Boolean, Some("anything")), Value::Bool(true));
        assert_eq!(from(TypeHint::Boolean, None), Value::Bool(false));

        assert_eq!(
            to(TypeHint::Boolean, &Value::Bool(true)),
            Reflected::Set(String::new())
        );
        assert_eq!(to(TypeHint::Boolean, &Value::Bool(false)), Reflected::Remove);
        assert_eq!(to(TypeHint::Boolean, &Value::Null), Reflected::Remove);
        assert_eq!(to(TypeHint::Boolean, &Value::Undefined), Reflected::Remove);
    }

    #[test]
    fn number_parse_and_format() {
        assert_eq!(from(TypeHint::Number, Some("5")), Value::Number(5.0));
        assert_eq!(from(TypeHint::Number, Some("-1.5")), Value::Number(-1.5));
        assert_eq!(from(TypeHint::Number, Some("")), Value::Number(0.0));
        assert_eq!(from(TypeHint::Number, None), Value::Null);
        // Unparsable input follows the host language's Number() and yields NaN.
        let garbage = from(TypeHint::Number, Some("zzz"));
        assert!(garbage.as_number().unwrap().is_nan());

        assert_eq!(
            to(TypeHint::Number, &Value::Number(0.0)),
            Reflected::Set("0".into())
        );
        assert_eq!(to(TypeHint::Number, &Value::Null), Reflected::Remove);
        assert_eq!(to(TypeHint::Number, &Value::Undefined), Reflected::Skip);
    }

    #[test]
    fn string_identity() {
        assert_eq!(from(TypeHint::String, Some("hi")), Value::String("hi".into()));
        assert_eq!(from(TypeHint::String, None), Value::Null);
        assert_eq!(
            to(TypeHint::String, &Value::String("hi".into())),
            Reflected::Set("hi".into())
        );
        assert_eq!(to(TypeHint::String, &Value::Null), Reflected::Remove);
    }

    #[test]
    fn json_roundtrip() {
        assert_eq!(
            from(TypeHint::Object, Some(r#"{"a":1}"#)),
            Value::Json(json!({"a": 1}))
        );
        assert_eq!(from(TypeHint::Array, None), Value::Null);
        assert_eq!(
            to(TypeHint::Array, &Value::Json(json!([1, 2]))),
            Reflected::Set("[1,2]".into())
        );
        assert_eq!(to(TypeHint::Object, &Value::Null), Reflected::Remove);
        assert_eq!(to(TypeHint::Object, &Value::Undefined), Reflected::Skip);
    }

    #[test]
    fn malformed_json_errors() {
        let err = Converter::Default(TypeHint::Object)
            .from_attribute("payload", Some("{not json"))
            .unwrap_err();
        assert_eq!(err.name, "payload");
        assert!(!err.reason.is_empty());
    }

    #[test]
    fn custom_pair_is_used() {
        let conv = Converter::Custom {
            from_attribute: Box::new(|raw| {
                Ok(Value::Number(raw.map_or(0.0, |s| s.len() as f64)))
            }),
            to_attribute: Box::new(|v| {
                Ok(Reflected::Set(alloc::format!("len:{}", v.display_string())))
            }),
        };
        assert_eq!(conv.from_attribute("p", Some("abc")).unwrap(), Value::Number(3.0));
        assert_eq!(
            conv.to_attribute("p", &Value::Number(3.0)).unwrap(),
            Reflected::Set("len:3".into())
        );
    }

    #[test]
    fn converter_debug() {
        let debug = alloc::format!("{:?}", Converter::Default(TypeHint::Number));
        assert!(debug.contains("Number"));
    }
}
