// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Window identity.

use core::fmt;

/// Sentinel value indicating "no window" in index fields.
pub const INVALID: u32 = u32::MAX;

/// A handle to a window in a [`WindowStore`](super::WindowStore).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after a window is destroyed and the slot is reused. Two
/// handles compare equal only if both parts match, so anything keyed by a
/// `WindowId` (occlusion caches, observation entries) never confuses a
/// destroyed window with the one that later reuses its slot.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowId {
    /// Slot index into the store's arrays.
    pub(crate) idx: u32,
    /// Generation counter; must match the store's generation for this slot.
    pub(crate) generation: u32,
}

impl WindowId {
    /// Builds a handle from raw parts.
    ///
    /// Intended for adapters that mirror an external window system and for
    /// test doubles. Handles built this way are only meaningful to the tree
    /// that issued the parts.
    #[inline]
    #[must_use]
    pub const fn from_raw_parts(idx: u32, generation: u32) -> Self {
        Self { idx, generation }
    }

    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WindowId({}@gen{})", self.idx, self.generation)
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.idx, self.generation)
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;

    use super::*;

    #[test]
    fn generation_distinguishes_reused_slots() {
        let a = WindowId::from_raw_parts(3, 0);
        let b = WindowId::from_raw_parts(3, 1);
        assert_ne!(a, b);
        assert!(a < b, "ordering is by slot, then generation");
    }

    #[test]
    fn debug_and_display_formats() {
        let id = WindowId::from_raw_parts(7, 2);
        assert_eq!(format!("{id:?}"), "WindowId(7@gen2)");
        assert_eq!(format!("{id}"), "7@2");
    }
}
