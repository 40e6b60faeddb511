// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-property declaration options.
//!
//! This module provides [`PropertyOptions`] for configuring how a declared
//! property behaves and [`PropertyOptionsBuilder`] for ergonomic construction.

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

use crate::convert::{Converter, FromAttributeFn, ToAttributeFn, TypeHint};
use crate::value::{Value, default_has_changed};

/// Change-detection predicate: `(new, old)` to "did it change".
pub type HasChangedFn = Box<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

/// How a property binds to a DOM-visible attribute.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum AttributeBinding {
    /// No attribute counterpart; the property is JS-only state.
    None,
    /// Bind to the lowercased property name.
    #[default]
    Lowercased,
    /// Bind to an explicit attribute name.
    Named(&'static str),
}

impl AttributeBinding {
    /// Resolves the attribute name for a property, or `None` when unbound.
    #[must_use]
    pub fn resolve(&self, property_name: &str) -> Option<String> {
        match self {
            Self::None => None,
            Self::Lowercased => Some(property_name.to_lowercase()),
            Self::Named(name) => Some(String::from(*name)),
        }
    }
}

/// Declarative configuration attached to a property at declaration time.
///
/// Immutable once built. Options are shared between a class and its
/// subclasses after finalization, so they carry no per-instance state.
///
/// # Example
///
/// ```rust
/// use bramble_property::{PropertyOptions, TypeHint, Value};
///
/// let options = PropertyOptions::builder()
///     .type_hint(TypeHint::Number)
///     .reflect(true)
///     .default_value(Value::Number(0.0))
///     .build();
///
/// assert!(options.reflect());
/// assert_eq!(options.default_value(), &Value::Number(0.0));
/// ```
pub struct PropertyOptions {
    attribute: AttributeBinding,
    converter: Converter,
    reflect: bool,
    has_changed: Option<HasChangedFn>,
    no_accessor: bool,
    default: Value,
}

impl Default for PropertyOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl PropertyOptions {
    /// Starts building a set of options.
    #[must_use]
    pub fn builder() -> PropertyOptionsBuilder {
        PropertyOptionsBuilder::new()
    }

    /// Returns the attribute binding.
    #[must_use]
    #[inline]
    pub fn attribute(&self) -> AttributeBinding {
        self.attribute
    }

    /// Returns the converter.
    #[must_use]
    #[inline]
    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    /// Returns whether property writes reflect back to the attribute.
    #[must_use]
    #[inline]
    pub fn reflect(&self) -> bool {
        self.reflect
    }

    /// Returns whether the element core skips change detection for writes.
    ///
    /// When set, the caller manages the backing state and requests updates
    /// manually.
    #[must_use]
    #[inline]
    pub fn no_accessor(&self) -> bool {
        self.no_accessor
    }

    /// Returns the initial value assigned at instance initialization.
    ///
    /// [`Value::Undefined`] means no initial assignment happens.
    #[must_use]
    #[inline]
    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// Runs change detection for a write of `new` over `old`.
    ///
    /// Uses the declared predicate when present, [`default_has_changed`]
    /// otherwise.
    #[must_use]
    pub fn changed(&self, new: &Value, old: &Value) -> bool {
        match &self.has_changed {
            Some(predicate) => predicate(new, old),
            None => default_has_changed(new, old),
        }
    }

    /// Returns whether a custom change-detection predicate is set.
    #[must_use]
    #[inline]
    pub fn has_changed_predicate(&self) -> bool {
        self.has_changed.is_some()
    }
}

// Manual Debug impl since the predicate isn't Debug.
impl fmt::Debug for PropertyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyOptions")
            .field("attribute", &self.attribute)
            .field("converter", &self.converter)
            .field("reflect", &self.reflect)
            .field("has_changed", &self.has_changed.is_some())
            .field("no_accessor", &self.no_accessor)
            .field("default", &self.default)
            .finish()
    }
}

/// Builder for [`PropertyOptions`].
///
/// # Example
///
/// ```rust
/// use bramble_property::{AttributeBinding, PropertyOptions, TypeHint};
///
/// let options = PropertyOptions::builder()
///     .attribute(AttributeBinding::Named("aria-label"))
///     .type_hint(TypeHint::String)
///     .has_changed(|new, old| new != old)
///     .build();
/// ```
pub struct PropertyOptionsBuilder {
    attribute: AttributeBinding,
    converter: Converter,
    reflect: bool,
    has_changed: Option<HasChangedFn>,
    no_accessor: bool,
    default: Value,
}

impl Default for PropertyOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// Manual Debug impl since the predicate isn't Debug.
impl fmt::Debug for PropertyOptionsBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyOptionsBuilder")
            .field("attribute", &self.attribute)
            .field("converter", &self.converter)
            .field("reflect", &self.reflect)
            .field("has_changed", &self.has_changed.is_some())
            .field("no_accessor", &self.no_accessor)
            .field("default", &self.default)
            .finish()
    }
}

impl PropertyOptionsBuilder {
    /// Creates a builder with the defaults: lowercased attribute binding,
    /// string conversion, no reflection, default change detection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            attribute: AttributeBinding::default(),
            converter: Converter::default(),
            reflect: false,
            has_changed: None,
            no_accessor: false,
            default: Value::Undefined,
        }
    }

    /// Sets the attribute binding.
    #[must_use]
    pub fn attribute(mut self, binding: AttributeBinding) -> Self {
        self.attribute = binding;
        self
    }

    /// Selects a built-in conversion by type.
    #[must_use]
    pub fn type_hint(mut self, hint: TypeHint) -> Self {
        self.converter = Converter::Default(hint);
        self
    }

    /// Supplies a custom conversion pair.
    #[must_use]
    pub fn converter(mut self, from_attribute: FromAttributeFn, to_attribute: ToAttributeFn) -> Self {
        self.converter = Converter::Custom {
            from_attribute,
            to_attribute,
        };
        self
    }

    /// Sets whether property writes serialize back to the attribute.
    #[must_use]
    pub fn reflect(mut self, reflect: bool) -> Self {
        self.reflect = reflect;
        self
    }

    /// Sets a custom change-detection predicate, `(new, old)`.
    #[must_use]
    pub fn has_changed<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.has_changed = Some(Box::new(predicate));
        self
    }

    /// Suppresses core-managed change detection for this property.
    #[must_use]
    pub fn no_accessor(mut self, no_accessor: bool) -> Self {
        self.no_accessor = no_accessor;
        self
    }

    /// Sets the initial value assigned at instance initialization.
    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = value;
        self
    }

    /// Builds the [`PropertyOptions`].
    #[must_use]
    pub fn build(self) -> PropertyOptions {
        PropertyOptions {
            attribute: self.attribute,
            converter: self.converter,
            reflect: self.reflect,
            has_changed: self.has_changed,
            no_accessor: self.no_accessor,
            default: self.default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn builder_defaults() {
        let options = PropertyOptions::default();
        assert_eq!(options.attribute(), AttributeBinding::Lowercased);
        assert!(!options.reflect());
        assert!(!options.no_accessor());
        assert!(!options.has_changed_predicate());
        assert!(options.default_value().is_undefined());
    }

    // `Default::default()` and the declared-value accessor must both
    // resolve; an inherent `default()` would shadow the trait method.
    #[test]
    fn trait_default_and_declared_default_value_coexist() {
        let options = PropertyOptions::default();
        assert!(options.default_value().is_undefined());

        let options = PropertyOptions::builder()
            .default_value(Value::Bool(true))
            .build();
        assert_eq!(options.default_value(), &Value::Bool(true));
    }

    #[test]
    fn binding_resolution() {
        assert_eq!(AttributeBinding::None.resolve("fooBar"), None);
        assert_eq!(
            AttributeBinding::Lowercased.resolve("fooBar"),
            Some("foobar".into())
        );
        assert_eq!(
            AttributeBinding::Named("data-foo").resolve("fooBar"),
            Some("data-foo".into())
        );
    }

    #[test]
    fn default_change_detection_applies() {
        let options = PropertyOptions::default();
        let nan = Value::Number(f64::NAN);
        assert!(!options.changed(&nan, &nan));
        assert!(options.changed(&Value::Number(1.0), &Value::Number(2.0)));
    }

    #[test]
    fn custom_predicate_wins() {
        // "Only growing values count as changed."
        let options = PropertyOptions::builder()
            .has_changed(|new, old| match (new.as_number(), old.as_number()) {
                (Some(n), Some(o)) => n > o,
                _ => true,
            })
            .build();
        assert!(options.changed(&Value::Number(2.0), &Value::Number(1.0)));
        assert!(!options.changed(&Value::Number(1.0), &Value::Number(2.0)));
    }

    #[test]
    fn options_debug() {
        let debug = format!("{:?}", PropertyOptions::default());
        assert!(debug.contains("PropertyOptions"));
        assert!(debug.contains("Lowercased"));
    }
}
