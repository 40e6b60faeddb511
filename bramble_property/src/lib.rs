// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bramble Property: declarative property metadata for reactive elements.
//!
//! This crate provides the metadata half of a reactive element system: a
//! per-class registry mapping property names to their declared options
//! (attribute binding, conversion, change detection, reflection), finalized
//! once per class into an immutable [`ElementClass`].
//!
//! ## Core Concepts
//!
//! ### Property Declaration
//!
//! Properties are declared on a [`PropertyDeclarations`] with
//! [`PropertyOptions`] describing how each one behaves:
//!
//! - **Attribute binding** ([`AttributeBinding`]) - whether the property has
//!   a string-valued attribute counterpart, and under what name.
//! - **Conversion** ([`Converter`], [`TypeHint`]) - how attribute strings map
//!   to typed [`Value`]s and back.
//! - **Reflection** - whether property writes serialize back to the attribute.
//! - **Change detection** - a predicate deciding whether a write is a change.
//!
//! ### Finalization
//!
//! [`PropertyDeclarations::finalize`] merges the superclass chain (supers
//! first), resolves attribute names, and computes the observed-attribute list
//! plus the attribute-to-property reverse map. The result is immutable and
//! shared by every instance of the class.
//!
//! ## Quick Start
//!
//! ```rust
//! use bramble_property::{
//!     AttributeBinding, PropertyDeclarations, PropertyOptions, TypeHint, Value,
//! };
//!
//! let mut decls = PropertyDeclarations::new();
//! decls.declare(
//!     "count",
//!     PropertyOptions::builder()
//!         .type_hint(TypeHint::Number)
//!         .reflect(true)
//!         .default_value(Value::Number(0.0))
//!         .build(),
//! );
//! decls.declare(
//!     "label",
//!     PropertyOptions::builder()
//!         .attribute(AttributeBinding::Named("data-label"))
//!         .build(),
//! );
//!
//! let class = decls.finalize().unwrap();
//! assert_eq!(class.observed_attributes(), ["count", "data-label"]);
//!
//! let count = class.property_id("count").unwrap();
//! assert_eq!(class.by_attribute("count"), Some(count));
//! ```
//!
//! ## Inheritance
//!
//! A subclass starts from [`PropertyDeclarations::extending`] and sees every
//! ancestor entry without mutating the ancestor's class: finalization copies
//! ancestor registrations into a fresh owned map, and a subclass override
//! replaces only its own copy.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod convert;
mod id;
mod options;
mod registry;
mod value;

pub use convert::{ConvertError, Converter, FromAttributeFn, Reflected, ToAttributeFn, TypeHint};
pub use id::PropertyId;
pub use options::{AttributeBinding, HasChangedFn, PropertyOptions, PropertyOptionsBuilder};
pub use registry::{ElementClass, FinalizeError, PropertyDeclarations, PropertyRegistration};
pub use value::{Value, default_has_changed};
