// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The read-only window tree contract consumed by the occlusion engine.

use alloc::vec::Vec;

use kurbo::Rect;

use super::id::WindowId;

/// Read-only view of a window hierarchy.
///
/// The occlusion engine never owns windows; it only borrows a `WindowTree`
/// for the duration of a call. Every method must tolerate stale handles:
/// a dead window has no parent, no children, contains nothing, and is not
/// alive.
pub trait WindowTree {
    /// Iterator over the direct children of a window.
    type Children<'a>: Iterator<Item = WindowId>
    where
        Self: 'a;

    /// Returns whether `window` refers to a live window.
    fn is_alive(&self, window: WindowId) -> bool;

    /// Returns the parent of `window`, if any.
    fn parent(&self, window: WindowId) -> Option<WindowId>;

    /// Returns the direct children of `window`, bottom-most first.
    fn children(&self, window: WindowId) -> Self::Children<'_>;

    /// Returns whether `window` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: WindowId, window: WindowId) -> bool {
        if !self.is_alive(ancestor) || !self.is_alive(window) {
            return false;
        }
        let mut cursor = Some(window);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }
}

/// Geometry and visibility data needed to compute occlusion.
pub trait WindowGeometry: WindowTree {
    /// Returns the parentless windows, bottom-most first.
    fn roots(&self) -> Vec<WindowId>;

    /// Returns the window's bounds in root coordinates, clipped by every
    /// ancestor. Dead windows report [`Rect::ZERO`].
    fn screen_bounds(&self, window: WindowId) -> Rect;

    /// Returns the window's own shown flag, ignoring ancestors.
    fn is_shown(&self, window: WindowId) -> bool;

    /// Returns whether the window fully covers what is beneath its bounds.
    fn is_opaque(&self, window: WindowId) -> bool;
}
