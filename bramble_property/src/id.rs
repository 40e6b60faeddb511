// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property identification.

use core::fmt;

/// A compact runtime property identifier.
///
/// A `PropertyId` uniquely identifies a property within one finalized
/// [`ElementClass`](crate::ElementClass). IDs are positional: the first
/// registered property (supers first) is id 0. The u16 representation keeps
/// per-instance value storage compact.
///
/// IDs are only meaningful relative to the class that issued them; two
/// unrelated classes may issue the same id for different properties.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropertyId(u16);

impl PropertyId {
    /// Creates a property ID from an index.
    ///
    /// Normally issued by [`PropertyDeclarations::finalize`](crate::PropertyDeclarations::finalize)
    /// rather than constructed directly.
    #[must_use]
    #[inline]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Returns the positional index of this property within its class.
    #[must_use]
    #[inline]
    pub const fn index(self) -> u16 {
        self.0
    }
}

impl fmt::Debug for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PropertyId").field(&self.0).finish()
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropertyId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn id_roundtrip() {
        let id = PropertyId::new(7);
        assert_eq!(id.index(), 7);
        assert_eq!(id, PropertyId::new(7));
        assert_ne!(id, PropertyId::new(8));
    }

    #[test]
    fn id_ordering_follows_index() {
        assert!(PropertyId::new(1) < PropertyId::new(2));
    }

    #[test]
    fn id_display() {
        assert_eq!(format!("{}", PropertyId::new(3)), "PropertyId(3)");
    }
}
