// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-class property registry and finalization.
//!
//! Properties are declared on a [`PropertyDeclarations`] and finalized once
//! into an immutable [`ElementClass`] holding the merged registration list,
//! the observed-attribute list, and the attribute-to-property reverse map.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use hashbrown::HashMap;

use crate::id::PropertyId;
use crate::options::PropertyOptions;

/// Property names that collide with the host element surface.
///
/// Declaring one of these is a configuration error caught at finalization.
const RESERVED_NAMES: &[&str] = &["attributes", "children", "innerHTML", "tagName"];

/// A configuration error detected at finalization time.
///
/// Finalization fails fast: a bad declaration surfaces here rather than at
/// the first update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FinalizeError {
    /// A property name collides with a reserved host-element member.
    ReservedName {
        /// The offending property name.
        name: &'static str,
    },
    /// Two properties in the merged class resolve to the same attribute.
    DuplicateAttribute {
        /// The contested attribute name.
        attribute: String,
        /// The property that claimed it first.
        first: &'static str,
        /// The property that collided.
        second: &'static str,
    },
}

impl fmt::Display for FinalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReservedName { name } => {
                write!(f, "property {name:?} collides with a reserved element member")
            }
            Self::DuplicateAttribute {
                attribute,
                first,
                second,
            } => write!(
                f,
                "attribute {attribute:?} is claimed by both {first:?} and {second:?}"
            ),
        }
    }
}

impl core::error::Error for FinalizeError {}

/// A finalized registration entry for one property.
pub struct PropertyRegistration {
    name: &'static str,
    options: Rc<PropertyOptions>,
    attribute: Option<String>,
}

impl PropertyRegistration {
    /// Returns the property name.
    #[must_use]
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the declared options.
    #[must_use]
    #[inline]
    pub fn options(&self) -> &PropertyOptions {
        &self.options
    }

    /// Returns the resolved attribute name, or `None` when unbound.
    #[must_use]
    #[inline]
    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref()
    }
}

impl fmt::Debug for PropertyRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyRegistration")
            .field("name", &self.name)
            .field("attribute", &self.attribute)
            .field("options", &self.options)
            .finish()
    }
}

/// The finalized, immutable property registry of one element class.
///
/// Holds every registration of the class and its ancestors (supers first),
/// plus the derived observed-attribute list and reverse map. Shared via
/// `Rc` by every instance of the class and by subclass declarations; never
/// mutated after finalization.
pub struct ElementClass {
    registrations: Vec<PropertyRegistration>,
    by_name: HashMap<&'static str, PropertyId>,
    by_attribute: HashMap<String, PropertyId>,
    observed_attributes: Vec<String>,
}

impl ElementClass {
    /// Returns the number of registered properties.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Returns `true` if no properties are registered.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Looks up a property by name.
    #[must_use]
    pub fn property_id(&self, name: &str) -> Option<PropertyId> {
        self.by_name.get(name).copied()
    }

    /// Looks up the property owning an attribute.
    #[must_use]
    pub fn by_attribute(&self, attribute: &str) -> Option<PropertyId> {
        self.by_attribute.get(attribute).copied()
    }

    /// Returns the registration for a property.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this class.
    #[must_use]
    pub fn registration(&self, id: PropertyId) -> &PropertyRegistration {
        &self.registrations[id.index() as usize]
    }

    /// Returns the attribute names the host must observe, in registration
    /// order.
    #[must_use]
    pub fn observed_attributes(&self) -> &[String] {
        &self.observed_attributes
    }

    /// Returns an iterator over all registrations, supers first.
    pub fn iter(&self) -> impl Iterator<Item = (PropertyId, &PropertyRegistration)> {
        self.registrations.iter().enumerate().map(|(i, r)| {
            #[expect(clippy::cast_possible_truncation, reason = "len bounded at finalize")]
            (PropertyId::new(i as u16), r)
        })
    }

    fn shared_options(&self, id: PropertyId) -> Rc<PropertyOptions> {
        self.registrations[id.index() as usize].options.clone()
    }
}

impl fmt::Debug for ElementClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementClass")
            .field("count", &self.registrations.len())
            .field(
                "properties",
                &self.registrations.iter().map(|r| r.name).collect::<Vec<_>>(),
            )
            .field("observed_attributes", &self.observed_attributes)
            .finish()
    }
}

/// Accumulates property declarations for one class before finalization.
///
/// Declarations follow later-wins semantics: redeclaring a name replaces the
/// earlier declaration (which also makes repeated identical declarations
/// idempotent). A subclass created with [`extending`](Self::extending) sees
/// every ancestor registration at finalize time without mutating the
/// ancestor's class.
///
/// # Example
///
/// ```rust
/// use bramble_property::{PropertyDeclarations, PropertyOptions, TypeHint};
///
/// let mut base = PropertyDeclarations::new();
/// base.declare(
///     "open",
///     PropertyOptions::builder().type_hint(TypeHint::Boolean).build(),
/// );
/// let base_class = base.finalize().unwrap();
///
/// let mut sub = PropertyDeclarations::extending(base_class.clone());
/// sub.declare("label", PropertyOptions::default());
/// let sub_class = sub.finalize().unwrap();
///
/// // The subclass sees the inherited property; the base is untouched.
/// assert!(sub_class.property_id("open").is_some());
/// assert!(base_class.property_id("label").is_none());
/// ```
#[derive(Debug, Default)]
pub struct PropertyDeclarations {
    parent: Option<Rc<ElementClass>>,
    declared: Vec<(&'static str, Rc<PropertyOptions>)>,
}

impl PropertyDeclarations {
    /// Creates an empty declaration set with no superclass.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a declaration set extending a finalized superclass.
    #[must_use]
    pub fn extending(parent: Rc<ElementClass>) -> Self {
        Self {
            parent: Some(parent),
            declared: Vec::new(),
        }
    }

    /// Declares a property, replacing any earlier declaration of the same
    /// name.
    pub fn declare(&mut self, name: &'static str, options: PropertyOptions) -> &mut Self {
        let options = Rc::new(options);
        match self.declared.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = options,
            None => self.declared.push((name, options)),
        }
        self
    }

    /// Returns the number of own (non-inherited) declarations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.declared.len()
    }

    /// Returns `true` if there are no own declarations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }

    /// Finalizes the class: merges the superclass chain (supers first, a
    /// subclass override replacing the inherited entry in place), resolves
    /// attribute names, and computes the observed-attribute list and the
    /// attribute-to-property reverse map.
    ///
    /// Finalizing the same declarations again produces an equivalent class;
    /// the returned class itself is immutable.
    ///
    /// # Errors
    ///
    /// Fails fast on configuration errors: reserved property names and
    /// attribute names claimed by more than one property in the merged
    /// chain.
    pub fn finalize(&self) -> Result<Rc<ElementClass>, FinalizeError> {
        let mut merged: Vec<(&'static str, Rc<PropertyOptions>)> = Vec::new();
        if let Some(parent) = &self.parent {
            for (id, reg) in parent.iter() {
                merged.push((reg.name(), parent.shared_options(id)));
            }
        }
        for (name, options) in &self.declared {
            match merged.iter_mut().find(|(n, _)| n == name) {
                Some(entry) => entry.1 = options.clone(),
                None => merged.push((name, options.clone())),
            }
        }

        let mut registrations = Vec::with_capacity(merged.len());
        let mut by_name = HashMap::with_capacity(merged.len());
        let mut by_attribute = HashMap::new();
        let mut observed_attributes = Vec::new();

        assert!(
            merged.len() <= u16::MAX as usize,
            "too many properties in one class (max {})",
            u16::MAX
        );
        for (index, (name, options)) in merged.into_iter().enumerate() {
            if RESERVED_NAMES.contains(&name) {
                return Err(FinalizeError::ReservedName { name });
            }
            #[expect(clippy::cast_possible_truncation, reason = "checked above")]
            let id = PropertyId::new(index as u16);

            let attribute = options.attribute().resolve(name);
            if let Some(attr) = &attribute {
                if let Some(prior) = by_attribute.insert(attr.clone(), id) {
                    let first: &PropertyRegistration = &registrations[prior.index() as usize];
                    return Err(FinalizeError::DuplicateAttribute {
                        attribute: attr.clone(),
                        first: first.name,
                        second: name,
                    });
                }
                observed_attributes.push(attr.clone());
            }
            by_name.insert(name, id);
            registrations.push(PropertyRegistration {
                name,
                options,
                attribute,
            });
        }

        Ok(Rc::new(ElementClass {
            registrations,
            by_name,
            by_attribute,
            observed_attributes,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::AttributeBinding;
    use crate::convert::TypeHint;
    use crate::value::Value;
    use alloc::format;
    use alloc::vec;

    fn number(reflect: bool) -> PropertyOptions {
        PropertyOptions::builder()
            .type_hint(TypeHint::Number)
            .reflect(reflect)
            .build()
    }

    #[test]
    fn finalize_empty() {
        let class = PropertyDeclarations::new().finalize().unwrap();
        assert!(class.is_empty());
        assert!(class.observed_attributes().is_empty());
    }

    #[test]
    fn finalize_registers_in_declaration_order() {
        let mut decls = PropertyDeclarations::new();
        decls.declare("foo", PropertyOptions::default());
        decls.declare("bar", PropertyOptions::default());
        let class = decls.finalize().unwrap();

        assert_eq!(class.len(), 2);
        assert_eq!(class.property_id("foo"), Some(PropertyId::new(0)));
        assert_eq!(class.property_id("bar"), Some(PropertyId::new(1)));
        assert_eq!(class.property_id("baz"), None);
    }

    #[test]
    fn observed_attributes_and_reverse_map() {
        let mut decls = PropertyDeclarations::new();
        decls.declare("fooBar", PropertyOptions::default());
        decls.declare(
            "hidden",
            PropertyOptions::builder()
                .attribute(AttributeBinding::None)
                .build(),
        );
        decls.declare(
            "label",
            PropertyOptions::builder()
                .attribute(AttributeBinding::Named("data-label"))
                .build(),
        );
        let class = decls.finalize().unwrap();

        assert_eq!(class.observed_attributes(), ["foobar", "data-label"]);
        assert_eq!(class.by_attribute("foobar"), class.property_id("fooBar"));
        assert_eq!(class.by_attribute("data-label"), class.property_id("label"));
        assert_eq!(class.by_attribute("hidden"), None);
    }

    #[test]
    fn redeclaration_is_later_wins() {
        let mut decls = PropertyDeclarations::new();
        decls.declare("count", number(false));
        decls.declare("count", number(true));
        let class = decls.finalize().unwrap();

        assert_eq!(class.len(), 1);
        let id = class.property_id("count").unwrap();
        assert!(class.registration(id).options().reflect());
    }

    #[test]
    fn subclass_inherits_supers_first() {
        let mut base = PropertyDeclarations::new();
        base.declare("open", PropertyOptions::default());
        let base_class = base.finalize().unwrap();

        let mut sub = PropertyDeclarations::extending(base_class.clone());
        sub.declare("label", PropertyOptions::default());
        let sub_class = sub.finalize().unwrap();

        let names: Vec<_> = sub_class.iter().map(|(_, r)| r.name()).collect();
        assert_eq!(names, vec!["open", "label"]);
        assert_eq!(base_class.len(), 1);
    }

    #[test]
    fn subclass_override_does_not_mutate_parent() {
        let mut base = PropertyDeclarations::new();
        base.declare("count", number(false));
        let base_class = base.finalize().unwrap();

        let mut sub = PropertyDeclarations::extending(base_class.clone());
        sub.declare("count", number(true));
        let sub_class = sub.finalize().unwrap();

        // Override keeps the inherited position.
        assert_eq!(sub_class.property_id("count"), Some(PropertyId::new(0)));
        assert!(
            sub_class
                .registration(PropertyId::new(0))
                .options()
                .reflect()
        );
        assert!(
            !base_class
                .registration(PropertyId::new(0))
                .options()
                .reflect()
        );
    }

    #[test]
    fn refinalize_is_idempotent() {
        let mut decls = PropertyDeclarations::new();
        decls.declare("foo", PropertyOptions::default());
        let a = decls.finalize().unwrap();
        let b = decls.finalize().unwrap();
        assert_eq!(a.len(), b.len());
        assert_eq!(a.observed_attributes(), b.observed_attributes());
    }

    #[test]
    fn duplicate_attribute_fails_fast() {
        let mut decls = PropertyDeclarations::new();
        decls.declare("fooBar", PropertyOptions::default());
        decls.declare(
            "other",
            PropertyOptions::builder()
                .attribute(AttributeBinding::Named("foobar"))
                .build(),
        );
        let err = decls.finalize().unwrap_err();
        assert_eq!(
            err,
            FinalizeError::DuplicateAttribute {
                attribute: "foobar".into(),
                first: "fooBar",
                second: "other",
            }
        );
    }

    #[test]
    fn duplicate_attribute_across_chain_fails_fast() {
        let mut base = PropertyDeclarations::new();
        base.declare("fooBar", PropertyOptions::default());
        let base_class = base.finalize().unwrap();

        let mut sub = PropertyDeclarations::extending(base_class);
        sub.declare(
            "clash",
            PropertyOptions::builder()
                .attribute(AttributeBinding::Named("foobar"))
                .build(),
        );
        assert!(matches!(
            sub.finalize(),
            Err(FinalizeError::DuplicateAttribute { .. })
        ));
    }

    #[test]
    fn reserved_name_fails_fast() {
        let mut decls = PropertyDeclarations::new();
        decls.declare("tagName", PropertyOptions::default());
        assert_eq!(
            decls.finalize().unwrap_err(),
            FinalizeError::ReservedName { name: "tagName" }
        );
    }

    #[test]
    fn default_value_is_registered() {
        let mut decls = PropertyDeclarations::new();
        decls.declare(
            "count",
            PropertyOptions::builder()
                .default_value(Value::Number(3.0))
                .build(),
        );
        let class = decls.finalize().unwrap();
        let id = class.property_id("count").unwrap();
        assert_eq!(
            class.registration(id).options().default_value(),
            &Value::Number(3.0)
        );
    }

    #[test]
    fn class_debug() {
        let mut decls = PropertyDeclarations::new();
        decls.declare("foo", PropertyOptions::default());
        let class = decls.finalize().unwrap();
        let debug = format!("{class:?}");
        assert!(debug.contains("ElementClass"));
        assert!(debug.contains("foo"));
    }
}
