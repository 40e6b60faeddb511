// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-instance element state: property slots, change accumulation, and the
//! scheduling side of the update lifecycle.

use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use smallvec::SmallVec;

use bramble_property::{ElementClass, PropertyId, Value};

use crate::completion::UpdateCompletion;

/// Inline capacity for property value slots.
///
/// Most elements have fewer than 8 non-default properties set, which keeps
/// slot storage off the heap in the common case.
const INLINE_SLOTS: usize = 8;

static UNDEFINED: Value = Value::Undefined;

/// An error from the property access surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyError {
    /// The name is not declared on this element's class.
    Unknown {
        /// The property name that failed to resolve.
        name: String,
    },
}

impl PropertyError {
    fn unknown(name: &str) -> Self {
        Self::Unknown {
            name: name.to_string(),
        }
    }
}

impl fmt::Display for PropertyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown { name } => write!(f, "property {name:?} is not declared"),
        }
    }
}

impl core::error::Error for PropertyError {}

/// The properties that changed since the last committed update, keyed by
/// property with the value each one held *before* the oldest unflushed
/// write.
///
/// Entries follow first-old-value-wins semantics: writing a property three
/// times before an update commits records the value from before the first
/// write, which is what "changed since the last commit" means.
#[derive(Debug, Default)]
pub struct ChangedProperties {
    entries: Vec<(PropertyId, Value)>,
}

impl ChangedProperties {
    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of changed properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the property changed in this batch.
    #[must_use]
    pub fn contains(&self, id: PropertyId) -> bool {
        self.entries.iter().any(|(pid, _)| *pid == id)
    }

    /// Returns the value the property held before this batch, if it changed.
    #[must_use]
    pub fn old_value(&self, id: PropertyId) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(pid, _)| *pid == id)
            .map(|(_, old)| old)
    }

    /// Iterates over changed properties in write order.
    pub fn iter(&self) -> impl Iterator<Item = (PropertyId, &Value)> {
        self.entries.iter().map(|(id, old)| (*id, old))
    }

    fn insert_if_absent(&mut self, id: PropertyId, old: Value) {
        if !self.contains(id) {
            self.entries.push((id, old));
        }
    }
}

/// Per-instance state of one reactive element.
///
/// `ElementCore` is the stand-in for the element base class: it owns the
/// property value slots, accumulates [`ChangedProperties`], and tracks the
/// lifecycle flags the scheduler sequences. Property writes run change
/// detection and request coalesced updates; N synchronous writes before the
/// host's queue drains produce at most one update pass.
///
/// The core never runs update passes itself — the host pops it from the
/// queue and drives the lifecycle phases.
pub struct ElementCore {
    class: Rc<ElementClass>,
    /// Value slots, sorted by [`PropertyId`] for binary-search lookup.
    slots: SmallVec<[(PropertyId, Value); INLINE_SLOTS]>,
    changed: ChangedProperties,
    /// Properties awaiting reflection in the next update pass.
    pending_reflect: SmallVec<[PropertyId; 4]>,
    completion: UpdateCompletion,
    has_updated: bool,
    update_pending: bool,
    /// This element is currently in the host's microtask queue.
    scheduled: bool,
    /// An update pass is executing; writes during it defer to the next pass.
    updating: bool,
    reschedule: bool,
    connected: bool,
    reflecting_to_property: Option<PropertyId>,
    needs_schedule: bool,
}

impl ElementCore {
    pub(crate) fn new(class: Rc<ElementClass>) -> Self {
        Self {
            class,
            slots: SmallVec::new(),
            changed: ChangedProperties::default(),
            pending_reflect: SmallVec::new(),
            completion: UpdateCompletion::resolved(false),
            has_updated: false,
            update_pending: false,
            scheduled: false,
            updating: false,
            reschedule: false,
            connected: false,
            reflecting_to_property: None,
            needs_schedule: false,
        }
    }

    /// Returns the finalized class of this element.
    #[must_use]
    pub fn class(&self) -> &ElementClass {
        &self.class
    }

    pub(crate) fn class_rc(&self) -> Rc<ElementClass> {
        self.class.clone()
    }

    /// Returns `true` once at least one update has ever committed.
    #[must_use]
    pub fn has_updated(&self) -> bool {
        self.has_updated
    }

    /// Returns `true` if an update is scheduled or in flight.
    #[must_use]
    pub fn update_pending(&self) -> bool {
        self.update_pending
    }

    /// Returns `true` while connected to the host.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Returns the completion handle for the current cycle.
    ///
    /// While an update is pending this observes that cycle; otherwise it is
    /// the settled handle of the most recent cycle (`false` before any
    /// update has ever run). Observing never schedules work.
    #[must_use]
    pub fn update_complete(&self) -> UpdateCompletion {
        self.completion.clone()
    }

    // -------------------------------------------------------------------------
    // Property access
    // -------------------------------------------------------------------------

    /// Returns the current value of a property, [`Value::Undefined`] when
    /// never set.
    ///
    /// # Errors
    ///
    /// Fails if `name` is not declared on this element's class.
    pub fn get(&self, name: &str) -> Result<&Value, PropertyError> {
        let id = self
            .class
            .property_id(name)
            .ok_or_else(|| PropertyError::unknown(name))?;
        Ok(self.get_by_id(id))
    }

    /// Sets a property through the synthesized-accessor path: store, run
    /// change detection, and request a coalesced update when it changed.
    ///
    /// Properties declared `no_accessor` store the value without change
    /// detection; the caller requests updates via
    /// [`request_update_for`](Self::request_update_for).
    ///
    /// # Errors
    ///
    /// Fails if `name` is not declared on this element's class.
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), PropertyError> {
        let id = self
            .class
            .property_id(name)
            .ok_or_else(|| PropertyError::unknown(name))?;
        self.set_by_id(id, value);
        Ok(())
    }

    pub(crate) fn get_by_id(&self, id: PropertyId) -> &Value {
        match self.find_slot(id) {
            Ok(index) => &self.slots[index].1,
            Err(_) => &UNDEFINED,
        }
    }

    pub(crate) fn set_by_id(&mut self, id: PropertyId, value: Value) {
        let class = self.class_rc();
        let registration = class.registration(id);
        let old = self.get_by_id(id).clone();
        self.store(id, value);
        if registration.options().no_accessor() {
            return;
        }
        let changed = registration.options().changed(self.get_by_id(id), &old);
        if changed {
            self.note_change(id, old);
        }
    }

    // -------------------------------------------------------------------------
    // Update requests
    // -------------------------------------------------------------------------

    /// Requests an update pass without naming a property.
    ///
    /// Always schedules; use this for state the metadata system does not
    /// track.
    pub fn request_update(&mut self) {
        self.schedule();
    }

    /// Requests an update for a property whose backing state the caller
    /// manages (`no_accessor`), supplying the previous value.
    ///
    /// Runs the property's change detection against the current value; a
    /// no-change write neither schedules nor records into
    /// [`ChangedProperties`].
    ///
    /// # Errors
    ///
    /// Fails if `name` is not declared on this element's class.
    pub fn request_update_for(&mut self, name: &str, old: Value) -> Result<(), PropertyError> {
        let id = self
            .class
            .property_id(name)
            .ok_or_else(|| PropertyError::unknown(name))?;
        let class = self.class_rc();
        let changed = class
            .registration(id)
            .options()
            .changed(self.get_by_id(id), &old);
        if changed {
            self.note_change(id, old);
        }
        Ok(())
    }

    /// Records a change and schedules, first-old-value-wins.
    fn note_change(&mut self, id: PropertyId, old: Value) {
        self.changed.insert_if_absent(id, old);
        let class = self.class_rc();
        let registration = class.registration(id);
        if registration.options().reflect()
            && registration.attribute().is_some()
            && self.reflecting_to_property != Some(id)
            && !self.pending_reflect.contains(&id)
        {
            self.pending_reflect.push(id);
        }
        self.schedule();
    }

    fn schedule(&mut self) {
        if self.updating {
            // Writes while a pass executes open the next cycle, strictly
            // after this one settles.
            self.reschedule = true;
            return;
        }
        if !self.update_pending {
            self.update_pending = true;
            self.completion = UpdateCompletion::pending();
        }
        if self.connected && !self.scheduled {
            self.scheduled = true;
            self.needs_schedule = true;
        }
    }

    // -------------------------------------------------------------------------
    // Lifecycle plumbing, driven by the host
    // -------------------------------------------------------------------------

    pub(crate) fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
        if connected && self.update_pending && !self.scheduled {
            self.scheduled = true;
            self.needs_schedule = true;
        }
    }

    /// Starts an update pass. Returns `None` when no update is actually
    /// pending (the entry was superseded); otherwise takes the accumulated
    /// changes and the cycle's completion handle.
    pub(crate) fn begin_update(&mut self) -> Option<(ChangedProperties, UpdateCompletion)> {
        self.scheduled = false;
        if !self.update_pending {
            return None;
        }
        self.updating = true;
        let changed = core::mem::take(&mut self.changed);
        Some((changed, self.completion.clone()))
    }

    pub(crate) fn take_pending_reflect(&mut self) -> SmallVec<[PropertyId; 4]> {
        core::mem::take(&mut self.pending_reflect)
    }

    /// Commits the pass bookkeeping. Returns `true` on the first-ever
    /// committed update.
    pub(crate) fn mark_updated(&mut self) -> bool {
        self.updating = false;
        self.update_pending = false;
        let first = !self.has_updated;
        self.has_updated = true;
        first
    }

    /// Clears the pass bookkeeping for a gated (skipped) update.
    pub(crate) fn mark_skipped(&mut self) {
        self.updating = false;
        self.update_pending = false;
        self.pending_reflect.clear();
    }

    /// Finishes a pass: writes deferred from mid-pass open their own cycle.
    pub(crate) fn end_update(&mut self) {
        if core::mem::take(&mut self.reschedule) {
            self.schedule();
        }
    }

    pub(crate) fn take_needs_schedule(&mut self) -> bool {
        core::mem::take(&mut self.needs_schedule)
    }

    pub(crate) fn set_reflecting_to_property(&mut self, property: Option<PropertyId>) {
        self.reflecting_to_property = property;
    }

    fn find_slot(&self, id: PropertyId) -> Result<usize, usize> {
        self.slots.binary_search_by_key(&id, |(pid, _)| *pid)
    }

    fn store(&mut self, id: PropertyId, value: Value) {
        match self.find_slot(id) {
            Ok(index) => self.slots[index].1 = value,
            Err(index) => self.slots.insert(index, (id, value)),
        }
    }
}

impl fmt::Debug for ElementCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementCore")
            .field("class", &self.class)
            .field("slots", &self.slots.len())
            .field("changed", &self.changed)
            .field("has_updated", &self.has_updated)
            .field("update_pending", &self.update_pending)
            .field("connected", &self.connected)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bramble_property::{PropertyDeclarations, PropertyOptions, TypeHint};

    fn test_class() -> Rc<ElementClass> {
        let mut decls = PropertyDeclarations::new();
        decls.declare(
            "count",
            PropertyOptions::builder().type_hint(TypeHint::Number).build(),
        );
        decls.declare(
            "raw",
            PropertyOptions::builder().no_accessor(true).build(),
        );
        decls.finalize().unwrap()
    }

    #[test]
    fn get_defaults_to_undefined() {
        let core = ElementCore::new(test_class());
        assert_eq!(core.get("count").unwrap(), &Value::Undefined);
        assert!(core.get("missing").is_err());
    }

    #[test]
    fn set_stores_and_accumulates_changes() {
        let mut core = ElementCore::new(test_class());
        core.set("count", Value::Number(1.0)).unwrap();
        assert_eq!(core.get("count").unwrap(), &Value::Number(1.0));
        assert!(core.update_pending());

        let id = core.class().property_id("count").unwrap();
        assert_eq!(core.changed.old_value(id), Some(&Value::Undefined));
    }

    #[test]
    fn first_old_value_wins() {
        let mut core = ElementCore::new(test_class());
        core.set("count", Value::Number(1.0)).unwrap();
        core.set("count", Value::Number(2.0)).unwrap();
        core.set("count", Value::Number(3.0)).unwrap();

        let id = core.class().property_id("count").unwrap();
        assert_eq!(core.changed.len(), 1);
        assert_eq!(core.changed.old_value(id), Some(&Value::Undefined));
        assert_eq!(core.get("count").unwrap(), &Value::Number(3.0));
    }

    #[test]
    fn unchanged_write_does_not_schedule() {
        let mut core = ElementCore::new(test_class());
        core.set("count", Value::Number(5.0)).unwrap();
        let (_, completion) = {
            core.set_connected(true);
            core.begin_update().unwrap()
        };
        core.mark_updated();
        core.end_update();
        completion.resolve(true);

        core.set("count", Value::Number(5.0)).unwrap();
        assert!(!core.update_pending());
    }

    #[test]
    fn no_accessor_stores_without_detection() {
        let mut core = ElementCore::new(test_class());
        core.set("raw", Value::Number(1.0)).unwrap();
        assert_eq!(core.get("raw").unwrap(), &Value::Number(1.0));
        assert!(!core.update_pending());

        // Manual request runs change detection against the supplied old.
        core.request_update_for("raw", Value::Undefined).unwrap();
        assert!(core.update_pending());
    }

    #[test]
    fn scheduling_needs_connection() {
        let mut core = ElementCore::new(test_class());
        core.set("count", Value::Number(1.0)).unwrap();
        assert!(core.update_pending());
        assert!(!core.take_needs_schedule());

        core.set_connected(true);
        assert!(core.take_needs_schedule());
    }

    #[test]
    fn begin_update_aborts_when_not_pending() {
        let mut core = ElementCore::new(test_class());
        assert!(core.begin_update().is_none());
    }

    #[test]
    fn writes_during_update_defer_to_next_cycle() {
        let mut core = ElementCore::new(test_class());
        core.set_connected(true);
        core.set("count", Value::Number(1.0)).unwrap();
        assert!(core.take_needs_schedule());

        let (changed, completion) = core.begin_update().unwrap();
        assert_eq!(changed.len(), 1);

        // A write while the pass executes must not fold into this commit.
        core.set("count", Value::Number(2.0)).unwrap();
        core.mark_updated();
        core.end_update();
        completion.resolve(true);

        assert!(core.update_pending());
        assert!(core.take_needs_schedule());
        let id = core.class().property_id("count").unwrap();
        assert_eq!(core.changed.old_value(id), Some(&Value::Number(1.0)));
    }
}
