// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bramble Element: a reactive element core with a coalescing update
//! scheduler.
//!
//! This crate drives elements declared with [`bramble_property`] through a
//! batched, asynchronous update lifecycle. Property writes run change
//! detection and schedule an update; any number of synchronous writes
//! coalesce into a single pass, which the [`Host`] runs when its queue
//! drains.
//!
//! ## Core Concepts
//!
//! ### The update lifecycle
//!
//! Each pass for an element moves through fixed phases:
//!
//! 1. [`Component::should_update`] gates the pass. A gated pass clears the
//!    change bookkeeping and resolves its cycle as not committed.
//! 2. Queued reflections serialize changed properties to their attributes,
//!    then [`Component::update`] and [`Component::render`] run, and the
//!    [`Renderer`] applies the content.
//! 3. Bookkeeping commits: the changed-property batch resets and
//!    `has_updated` latches.
//! 4. [`Component::first_updated`] (once) and [`Component::updated`] run.
//!    Property writes here open a fresh cycle with its own completion.
//!
//! ### Completion handles
//!
//! [`ElementCore::update_complete`] hands out an [`UpdateCompletion`]
//! observing the current cycle: pending until the pass settles, then
//! resolved `true` (committed), resolved `false` (gated), or failed.
//! Observing never schedules work.
//!
//! ### The host
//!
//! [`Host`] stands in for the document environment: it registers tag names,
//! creates instances (before or after their definition exists), bridges
//! attribute mutations into property writes, and drains the update queue in
//! [`Host::flush`].
//!
//! ## Quick Start
//!
//! ```rust
//! use bramble_element::{
//!     Component, Content, ElementCore, ElementDefinition, Host, NullRenderer,
//! };
//! use bramble_element::property::{
//!     PropertyDeclarations, PropertyOptions, TypeHint, Value,
//! };
//!
//! struct Counter;
//!
//! impl Component for Counter {
//!     fn render(&mut self, core: &ElementCore) -> Content {
//!         let count = core.get("count").unwrap();
//!         Content::new(count.display_string())
//!     }
//! }
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
//!
//! let mut host = Host::new(NullRenderer);
//! host.define(
//!     "my-counter",
//!     ElementDefinition::new(decls.finalize().unwrap(), || Counter),
//! )
//! .unwrap();
//!
//! let id = host.create("my-counter");
//! host.connect(id);
//!
//! // Three synchronous writes coalesce into one pass.
//! host.set_property(id, "count", Value::Number(1.0)).unwrap();
//! host.set_property(id, "count", Value::Number(2.0)).unwrap();
//! host.set_property(id, "count", Value::Number(3.0)).unwrap();
//!
//! let report = host.flush();
//! assert_eq!(report.passes, 1);
//! assert_eq!(host.get_attribute(id, "count"), Some("3"));
//! ```
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod completion;
mod component;
mod element;
mod host;

pub use bramble_property as property;

pub use completion::{CompletionState, UpdateCompletion, UpdateError};
pub use component::{Component, Content, NullRenderer, Renderer};
pub use element::{ChangedProperties, ElementCore, PropertyError};
pub use host::{ElementDefinition, ElementId, FlushReport, Host};
