// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The host environment: element registration, instance storage, the
//! attribute bridge, and the microtask queue that drives update passes.

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use hashbrown::HashMap;
use smallvec::SmallVec;

use bramble_property::{ConvertError, ElementClass, Reflected, Value};

use crate::completion::{UpdateCompletion, UpdateError};
use crate::component::{Component, Renderer};
use crate::element::{ChangedProperties, ElementCore, PropertyError};

/// Identifies one element instance within a [`Host`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

impl ElementId {
    /// Creates an id from a raw index.
    #[must_use]
    #[inline]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// String attributes of one element, sorted by name.
///
/// Every mutation bumps a counter, which lets callers observe whether any
/// attribute write happened across an operation.
#[derive(Debug, Default)]
struct AttributeMap {
    entries: SmallVec<[(String, String); 4]>,
    mutations: u64,
}

impl AttributeMap {
    fn find(&self, name: &str) -> Result<usize, usize> {
        self.entries
            .binary_search_by(|(n, _)| n.as_str().cmp(name))
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.find(name)
            .ok()
            .map(|index| self.entries[index].1.as_str())
    }

    fn set(&mut self, name: &str, value: &str) {
        self.mutations += 1;
        match self.find(name) {
            Ok(index) => self.entries[index].1 = String::from(value),
            Err(index) => self
                .entries
                .insert(index, (String::from(name), String::from(value))),
        }
    }

    fn remove(&mut self, name: &str) {
        if let Ok(index) = self.find(name) {
            self.mutations += 1;
            self.entries.remove(index);
        }
    }
}

/// A registered element kind: its finalized class plus a factory for the
/// per-instance component behavior.
pub struct ElementDefinition {
    class: Rc<ElementClass>,
    factory: Box<dyn Fn() -> Box<dyn Component>>,
}

impl ElementDefinition {
    /// Creates a definition from a finalized class and a component factory.
    pub fn new<C, F>(class: Rc<ElementClass>, factory: F) -> Self
    where
        C: Component + 'static,
        F: Fn() -> C + 'static,
    {
        Self {
            class,
            factory: Box::new(move || Box::new(factory())),
        }
    }

    /// Returns the finalized class.
    #[must_use]
    pub fn class(&self) -> &Rc<ElementClass> {
        &self.class
    }
}

impl fmt::Debug for ElementDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementDefinition")
            .field("class", &self.class)
            .finish_non_exhaustive()
    }
}

/// Instance state: created before its tag is defined, or upgraded.
enum CellState {
    /// No definition yet; property writes are captured for replay.
    Deferred {
        pending: Vec<(String, Value)>,
        connected: bool,
    },
    /// Live reactive element.
    Upgraded {
        core: ElementCore,
        component: Box<dyn Component>,
    },
}

struct ElementCell {
    tag: String,
    attributes: AttributeMap,
    state: CellState,
}

/// Outcome of a [`Host::flush`] call.
#[derive(Debug, Default)]
pub struct FlushReport {
    /// Update passes that ran (committed or gated).
    pub passes: usize,
    /// Failures, one per failed pass. Failed elements stay usable.
    pub errors: Vec<(ElementId, UpdateError)>,
}

impl FlushReport {
    /// Returns `true` if every pass settled without error.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Owns element definitions and instances and drives their update
/// lifecycle.
///
/// The host plays the part of the document environment: it registers tag
/// names, creates and upgrades instances, bridges attribute mutations into
/// property writes, and drains a FIFO queue of scheduled elements in
/// [`flush`](Host::flush). Work scheduled by one element never interleaves
/// with another element's in-flight pass.
///
/// # Example
///
/// ```rust
/// use bramble_element::{
///     Component, Content, ElementCore, ElementDefinition, Host, NullRenderer,
/// };
/// use bramble_element::property::{PropertyDeclarations, PropertyOptions, TypeHint, Value};
///
/// struct Counter;
///
/// impl Component for Counter {
///     fn render(&mut self, core: &ElementCore) -> Content {
///         Content::new(core.get("count").unwrap().display_string())
///     }
/// }
///
/// let mut decls = PropertyDeclarations::new();
/// decls.declare(
///     "count",
///     PropertyOptions::builder()
///         .type_hint(TypeHint::Number)
///         .default_value(Value::Number(0.0))
///         .build(),
/// );
/// let class = decls.finalize().unwrap();
///
/// let mut host = Host::new(NullRenderer);
/// host.define("my-counter", ElementDefinition::new(class, || Counter))
///     .unwrap();
/// let id = host.create("my-counter");
/// host.connect(id);
/// let report = host.flush();
/// assert!(report.is_clean());
/// assert!(host.has_updated(id));
/// ```
pub struct Host<R: Renderer> {
    definitions: HashMap<String, ElementDefinition>,
    cells: Vec<ElementCell>,
    queue: VecDeque<ElementId>,
    renderer: R,
}

impl<R: Renderer> fmt::Debug for Host<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("definitions", &self.definitions.len())
            .field("cells", &self.cells.len())
            .field("queued", &self.queue.len())
            .finish_non_exhaustive()
    }
}

impl<R: Renderer> Host<R> {
    /// Creates an empty host around a renderer.
    pub fn new(renderer: R) -> Self {
        Self {
            definitions: HashMap::new(),
            cells: Vec::new(),
            queue: VecDeque::new(),
            renderer,
        }
    }

    /// Returns the renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Registers a tag name and upgrades every existing element created with
    /// it. Upgraded elements schedule their initial update.
    ///
    /// # Errors
    ///
    /// Fails with the first attribute-import error among the upgraded
    /// elements. Every matching element is upgraded either way; only the
    /// offending attribute's property is left unset.
    ///
    /// # Panics
    ///
    /// Panics if `tag` is already defined.
    pub fn define(
        &mut self,
        tag: impl Into<String>,
        definition: ElementDefinition,
    ) -> Result<(), ConvertError> {
        let tag = tag.into();
        assert!(
            !self.definitions.contains_key(&tag),
            "element {tag:?} is already defined"
        );
        self.definitions.insert(tag.clone(), definition);
        let definition = &self.definitions[&tag];

        let mut first_error = None;
        for (index, cell) in self.cells.iter_mut().enumerate() {
            if cell.tag != tag {
                continue;
            }
            let id = ElementId::new(index);
            if let Err(e) = upgrade_cell(cell, definition, id, &mut self.queue)
                && first_error.is_none()
            {
                first_error = Some(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Creates an element. Undefined tags produce a deferred element that
    /// captures property writes until [`define`](Host::define) upgrades it.
    pub fn create(&mut self, tag: impl Into<String>) -> ElementId {
        let tag = tag.into();
        let id = ElementId::new(self.cells.len());
        self.cells.push(ElementCell {
            tag: tag.clone(),
            attributes: AttributeMap::default(),
            state: CellState::Deferred {
                pending: Vec::new(),
                connected: false,
            },
        });
        if let Some(definition) = self.definitions.get(&tag) {
            let result = upgrade_cell(&mut self.cells[id.index()], definition, id, &mut self.queue);
            debug_assert!(result.is_ok(), "a fresh element has no attributes to import");
        }
        id
    }

    /// Connects an element. A pending update that could not be scheduled
    /// while disconnected enters the queue now.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this host.
    pub fn connect(&mut self, id: ElementId) {
        match &mut self.cells[id.index()].state {
            CellState::Deferred { connected, .. } => *connected = true,
            CellState::Upgraded { core, .. } => core.set_connected(true),
        }
        self.drain_schedule(id);
    }

    /// Disconnects an element. Pending state survives; the update runs on
    /// reconnection.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this host.
    pub fn disconnect(&mut self, id: ElementId) {
        match &mut self.cells[id.index()].state {
            CellState::Deferred { connected, .. } => *connected = false,
            CellState::Upgraded { core, .. } => core.set_connected(false),
        }
    }

    /// Sets a property. Deferred elements capture the write for replay at
    /// upgrade time.
    ///
    /// # Errors
    ///
    /// Fails if the element is upgraded and `name` is not declared.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this host.
    pub fn set_property(
        &mut self,
        id: ElementId,
        name: &str,
        value: Value,
    ) -> Result<(), PropertyError> {
        let result = match &mut self.cells[id.index()].state {
            CellState::Deferred { pending, .. } => {
                pending.push((String::from(name), value));
                Ok(())
            }
            CellState::Upgraded { core, .. } => core.set(name, value),
        };
        self.drain_schedule(id);
        result
    }

    /// Returns a property's current value; for deferred elements, the last
    /// captured write (or [`Value::Undefined`]).
    ///
    /// # Errors
    ///
    /// Fails if the element is upgraded and `name` is not declared.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this host.
    pub fn get_property(&self, id: ElementId, name: &str) -> Result<Value, PropertyError> {
        match &self.cells[id.index()].state {
            CellState::Deferred { pending, .. } => Ok(pending
                .iter()
                .rev()
                .find(|(n, _)| n == name)
                .map_or(Value::Undefined, |(_, v)| v.clone())),
            CellState::Upgraded { core, .. } => core.get(name).cloned(),
        }
    }

    /// Requests an update without naming a property. No-op for deferred
    /// elements, which schedule their initial update at upgrade time anyway.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this host.
    pub fn request_update(&mut self, id: ElementId) {
        if let CellState::Upgraded { core, .. } = &mut self.cells[id.index()].state {
            core.request_update();
        }
        self.drain_schedule(id);
    }

    /// Requests an update for a caller-managed (`no_accessor`) property,
    /// supplying the previous value for change detection.
    ///
    /// # Errors
    ///
    /// Fails if the element is upgraded and `name` is not declared.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this host.
    pub fn request_update_for(
        &mut self,
        id: ElementId,
        name: &str,
        old: Value,
    ) -> Result<(), PropertyError> {
        let result = match &mut self.cells[id.index()].state {
            CellState::Deferred { .. } => Ok(()),
            CellState::Upgraded { core, .. } => core.request_update_for(name, old),
        };
        self.drain_schedule(id);
        result
    }

    /// Returns the completion handle for the element's current update cycle.
    ///
    /// Observing never schedules work. With nothing pending the handle is
    /// already settled; deferred elements report a cycle resolved as not
    /// committed.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this host.
    #[must_use]
    pub fn update_complete(&self, id: ElementId) -> UpdateCompletion {
        match &self.cells[id.index()].state {
            CellState::Deferred { .. } => UpdateCompletion::resolved(false),
            CellState::Upgraded { core, .. } => core.update_complete(),
        }
    }

    /// Returns `true` once the element has committed at least one update.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this host.
    #[must_use]
    pub fn has_updated(&self, id: ElementId) -> bool {
        match &self.cells[id.index()].state {
            CellState::Deferred { .. } => false,
            CellState::Upgraded { core, .. } => core.has_updated(),
        }
    }

    /// Returns the element core, or `None` while deferred.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this host.
    #[must_use]
    pub fn core(&self, id: ElementId) -> Option<&ElementCore> {
        match &self.cells[id.index()].state {
            CellState::Deferred { .. } => None,
            CellState::Upgraded { core, .. } => Some(core),
        }
    }

    /// Sets (`Some`) or removes (`None`) an attribute, then bridges the
    /// mutation into the bound property when one observes it.
    ///
    /// Only external writes reach the bridge; the reflection step of an
    /// update pass writes the attribute store directly. In the other
    /// direction, the bridged property write does not queue a reflection
    /// back to the attribute.
    ///
    /// # Errors
    ///
    /// Fails when the bound property's conversion rejects the raw value.
    /// The attribute itself is written regardless.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this host.
    pub fn set_attribute(
        &mut self,
        id: ElementId,
        name: &str,
        value: Option<&str>,
    ) -> Result<(), ConvertError> {
        let cell = &mut self.cells[id.index()];
        match value {
            Some(raw) => cell.attributes.set(name, raw),
            None => cell.attributes.remove(name),
        }
        if let CellState::Upgraded { core, .. } = &mut cell.state {
            let class = core.class_rc();
            if let Some(pid) = class.by_attribute(name) {
                let registration = class.registration(pid);
                let converted = registration
                    .options()
                    .converter()
                    .from_attribute(registration.name(), value)?;
                core.set_reflecting_to_property(Some(pid));
                core.set_by_id(pid, converted);
                core.set_reflecting_to_property(None);
            }
        }
        self.drain_schedule(id);
        Ok(())
    }

    /// Returns an attribute's raw value.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this host.
    #[must_use]
    pub fn get_attribute(&self, id: ElementId, name: &str) -> Option<&str> {
        self.cells[id.index()].attributes.get(name)
    }

    /// Returns `true` if the attribute is present.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this host.
    #[must_use]
    pub fn has_attribute(&self, id: ElementId, name: &str) -> bool {
        self.get_attribute(id, name).is_some()
    }

    /// Returns the element's attribute mutation count. Each set or
    /// successful removal bumps it, including writes from reflection.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this host.
    #[must_use]
    pub fn attribute_mutations(&self, id: ElementId) -> u64 {
        self.cells[id.index()].attributes.mutations
    }

    /// Drains the queue, running one update pass per queued entry until no
    /// work remains. Post-update hooks that write properties enqueue fresh
    /// cycles, which run before this returns.
    ///
    /// Errors do not stop the drain: the failing element's cycle settles as
    /// failed, the error is collected into the report, and remaining work
    /// proceeds.
    pub fn flush(&mut self) -> FlushReport {
        let mut report = FlushReport::default();
        while let Some(id) = self.queue.pop_front() {
            match self.perform_update(id) {
                Ok(ran) => {
                    if ran {
                        report.passes += 1;
                    }
                }
                Err(error) => {
                    report.passes += 1;
                    report.errors.push((id, error));
                }
            }
            self.drain_schedule(id);
        }
        report
    }

    /// Runs one update pass. `Ok(false)` means the entry was stale (nothing
    /// pending) and nothing ran.
    fn perform_update(&mut self, id: ElementId) -> Result<bool, UpdateError> {
        let Self {
            cells, renderer, ..
        } = self;
        let ElementCell {
            attributes, state, ..
        } = &mut cells[id.index()];
        let CellState::Upgraded { core, component } = state else {
            return Ok(false);
        };
        let Some((changed, completion)) = core.begin_update() else {
            return Ok(false);
        };

        if !component.should_update(core, &changed) {
            core.mark_skipped();
            core.end_update();
            completion.resolve(false);
            return Ok(true);
        }

        let result = run_update(core, component.as_mut(), &changed, attributes, renderer, id);

        // Bookkeeping commits even when the update phase failed, so the
        // element stays schedulable.
        let first = core.mark_updated();
        let result = result.and_then(|()| {
            if first {
                component.first_updated(core, &changed)?;
            }
            component.updated(core, &changed)
        });
        core.end_update();

        match result {
            Ok(()) => {
                completion.resolve(true);
                Ok(true)
            }
            Err(error) => {
                completion.fail(error.clone());
                Err(error)
            }
        }
    }

    /// Moves an element into the queue when its core asked for scheduling.
    fn drain_schedule(&mut self, id: ElementId) {
        if let CellState::Upgraded { core, .. } = &mut self.cells[id.index()].state
            && core.take_needs_schedule()
        {
            self.queue.push_back(id);
        }
    }
}

/// The committed half of an update pass: reflection, the `update` hook, and
/// rendering.
fn run_update<R: Renderer>(
    core: &mut ElementCore,
    component: &mut dyn Component,
    changed: &ChangedProperties,
    attributes: &mut AttributeMap,
    renderer: &mut R,
    id: ElementId,
) -> Result<(), UpdateError> {
    reflect_pending(core, attributes)?;

    component.update(core, changed)?;
    let content = component.render(core);
    renderer.render_into(&content, id);
    Ok(())
}

/// Serializes every property queued for reflection into its attribute.
fn reflect_pending(
    core: &mut ElementCore,
    attributes: &mut AttributeMap,
) -> Result<(), UpdateError> {
    let pending = core.take_pending_reflect();
    let class = core.class_rc();
    for pid in pending {
        let registration = class.registration(pid);
        let Some(attribute) = registration.attribute() else {
            continue;
        };
        match registration
            .options()
            .converter()
            .to_attribute(registration.name(), core.get_by_id(pid))?
        {
            Reflected::Skip => {}
            Reflected::Remove => attributes.remove(attribute),
            Reflected::Set(raw) => attributes.set(attribute, &raw),
        }
    }
    Ok(())
}

/// Replays a deferred element into a live one: defaults, attribute import,
/// captured property writes, initial update request.
fn upgrade_cell(
    cell: &mut ElementCell,
    definition: &ElementDefinition,
    id: ElementId,
    queue: &mut VecDeque<ElementId>,
) -> Result<(), ConvertError> {
    let placeholder = CellState::Deferred {
        pending: Vec::new(),
        connected: false,
    };
    let (pending, connected) = match core::mem::replace(&mut cell.state, placeholder) {
        CellState::Deferred { pending, connected } => (pending, connected),
        upgraded @ CellState::Upgraded { .. } => {
            cell.state = upgraded;
            return Ok(());
        }
    };

    let class = definition.class.clone();
    let mut core = ElementCore::new(class.clone());
    let component = (definition.factory)();

    // Declared defaults run through the accessor path so they participate in
    // change accumulation and first-update reflection.
    for (pid, registration) in class.iter() {
        let default = registration.options().default_value();
        if !default.is_undefined() {
            core.set_by_id(pid, default.clone());
        }
    }

    // Attributes present before upgrade import into their properties; the
    // import must not queue a reflection straight back.
    let mut first_error = None;
    for (pid, registration) in class.iter() {
        let Some(attribute) = registration.attribute() else {
            continue;
        };
        let Some(raw) = cell.attributes.get(attribute) else {
            continue;
        };
        match registration
            .options()
            .converter()
            .from_attribute(registration.name(), Some(raw))
        {
            Ok(value) => {
                core.set_reflecting_to_property(Some(pid));
                core.set_by_id(pid, value);
                core.set_reflecting_to_property(None);
            }
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    // Captured pre-upgrade property writes win over imported attributes.
    for (name, value) in pending {
        // Names that never resolved to a declaration are dropped.
        let _ = core.set(&name, value);
    }

    core.request_update();
    if connected {
        core.set_connected(true);
    }
    let needs_schedule = core.take_needs_schedule();
    cell.state = CellState::Upgraded { core, component };
    if needs_schedule {
        queue.push_back(id);
    }
    first_error.map_or(Ok(()), Err)
}
