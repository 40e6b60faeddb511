// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The user-facing component trait and the rendering seam.

use alloc::string::String;
use core::fmt;

use crate::completion::UpdateError;
use crate::element::{ChangedProperties, ElementCore};
use crate::host::ElementId;

/// Output of a render pass.
///
/// The scheduler treats content as opaque; it only hands it to the
/// [`Renderer`]. A string is enough to exercise the lifecycle without
/// committing to any particular tree representation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Content(String);

impl Content {
    /// Creates content from anything string-like.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self(content.into())
    }

    /// Returns the content as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Behavior of one element kind, driven through the update lifecycle.
///
/// The host calls the hooks in a fixed order for each update pass:
///
/// 1. [`should_update`](Self::should_update) gates the pass. Returning
///    `false` skips everything below, clears the change bookkeeping, and
///    resolves the cycle as not committed.
/// 2. [`update`](Self::update) runs before rendering, with the batch of
///    changed properties.
/// 3. [`render`](Self::render) produces content for the renderer.
/// 4. [`first_updated`](Self::first_updated) runs once, after the first
///    committed pass, before `updated`.
/// 5. [`updated`](Self::updated) runs after every committed pass.
///
/// Property writes from inside `update` or `render` defer to the next pass;
/// writes from `first_updated` or `updated` open a fresh cycle with its own
/// completion handle.
pub trait Component {
    /// Gates the update pass. Defaults to always updating.
    fn should_update(&mut self, core: &mut ElementCore, changed: &ChangedProperties) -> bool {
        let _ = (core, changed);
        true
    }

    /// Runs before rendering, with the changed-property batch.
    ///
    /// # Errors
    ///
    /// A failure settles the cycle as failed; the scheduler stays usable.
    fn update(&mut self, core: &mut ElementCore, changed: &ChangedProperties) -> Result<(), UpdateError> {
        let _ = (core, changed);
        Ok(())
    }

    /// Produces the element's content.
    fn render(&mut self, core: &ElementCore) -> Content;

    /// Runs once after the first committed update, before
    /// [`updated`](Self::updated).
    ///
    /// # Errors
    ///
    /// A failure settles the cycle as failed; bookkeeping is already
    /// committed, so `has_updated` stays `true`.
    fn first_updated(&mut self, core: &mut ElementCore, changed: &ChangedProperties) -> Result<(), UpdateError> {
        let _ = (core, changed);
        Ok(())
    }

    /// Runs after every committed update.
    ///
    /// # Errors
    ///
    /// A failure settles the cycle as failed; bookkeeping is already
    /// committed.
    fn updated(&mut self, core: &mut ElementCore, changed: &ChangedProperties) -> Result<(), UpdateError> {
        let _ = (core, changed);
        Ok(())
    }
}

/// Applies rendered content to an element's root.
///
/// The host calls this exactly once per committed update pass, after the
/// component's `update` hook and before `first_updated`/`updated`.
pub trait Renderer {
    /// Writes `content` into the root of element `root`.
    fn render_into(&mut self, content: &Content, root: ElementId);
}

/// A renderer that discards content.
///
/// Useful for hosts that only exercise the property and scheduling layers.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render_into(&mut self, _content: &Content, _root: ElementId) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn content_construction() {
        let content = Content::new("hi");
        assert_eq!(content.as_str(), "hi");
        assert_eq!(format!("{content}"), "hi");
        assert_eq!(Content::from("hi"), content);
    }

    #[test]
    fn null_renderer_discards() {
        let mut renderer = NullRenderer;
        renderer.render_into(&Content::new("anything"), ElementId::new(0));
    }
}
