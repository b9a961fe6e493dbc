// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays window storage with allocation, topology, stacking, and
//! property management.

use alloc::vec::Vec;

use kurbo::Rect;
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::id::{INVALID, WindowId};
use super::traverse::Children;
use super::tree::{WindowGeometry, WindowTree};
use crate::dirty;

/// Per-window boolean flags.
///
/// Setting [`hidden`](Self::hidden) hides the window and its entire subtree.
/// A [`transparent`](Self::transparent) window never occludes what is beneath
/// it, although it can itself be occluded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct WindowFlags {
    /// Whether the window (and its subtree) is hidden.
    pub hidden: bool,
    /// Whether the window lets windows beneath it show through.
    pub transparent: bool,
}

/// Struct-of-arrays storage for all windows.
///
/// Windows are addressed by [`WindowId`] handles. Internally, each window
/// occupies a slot in parallel arrays. Destroyed windows are recycled via a
/// free list, and generation counters prevent stale handle access.
///
/// Children are kept bottom-most first: the last child is stacked on top of
/// its siblings. Bounds are relative to the parent's origin; roots are in
/// screen coordinates.
#[derive(Debug)]
pub struct WindowStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Properties --
    pub(crate) bounds: Vec<Rect>,
    pub(crate) flags: Vec<WindowFlags>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Lifecycle tracking --
    pub(crate) pending_created: Vec<WindowId>,
    pub(crate) pending_destroyed: Vec<WindowId>,
}

impl Default for WindowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowStore {
    /// Creates an empty window store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            bounds: Vec::new(),
            flags: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            pending_created: Vec::new(),
            pending_destroyed: Vec::new(),
        }
    }

    // -- Allocation API --

    /// Creates a new shown, opaque, parentless window and returns its handle.
    pub fn create_window(&mut self, bounds: Rect) -> WindowId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot. The generation was bumped on destroy.
            self.parent[idx as usize] = INVALID;
            self.first_child[idx as usize] = INVALID;
            self.next_sibling[idx as usize] = INVALID;
            self.prev_sibling[idx as usize] = INVALID;
            self.bounds[idx as usize] = bounds;
            self.flags[idx as usize] = WindowFlags::default();
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.bounds.push(bounds);
            self.flags.push(WindowFlags::default());
            self.generation.push(0);
            idx
        };

        let id = WindowId {
            idx,
            generation: self.generation[idx as usize],
        };
        self.pending_created.push(id);
        self.dirty.mark(idx, dirty::TOPOLOGY);
        id
    }

    /// Destroys a window, freeing its slot for reuse.
    ///
    /// The destroyed handle is reported in the next
    /// [`TreeChanges::destroyed`](super::TreeChanges::destroyed).
    ///
    /// # Panics
    ///
    /// Panics if the window has children (use
    /// [`destroy_subtree`](Self::destroy_subtree)) or if the handle is stale.
    pub fn destroy_window(&mut self, id: WindowId) {
        self.validate(id);
        let idx = id.idx;
        assert!(
            self.first_child[idx as usize] == INVALID,
            "cannot destroy window with children"
        );

        let parent = self.parent[idx as usize];
        if parent != INVALID {
            self.unlink_from_parent(idx);
            self.dirty.mark(parent, dirty::TOPOLOGY);
        }

        self.dirty.remove_key(idx);

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;

        self.free_list.push(idx);
        self.pending_destroyed.push(id);
        self.dirty.mark(idx, dirty::TOPOLOGY);
    }

    /// Destroys a window together with all of its descendants.
    ///
    /// Descendants are destroyed before their ancestors, so every handle in
    /// the subtree shows up in the next [`TreeChanges::destroyed`].
    ///
    /// [`TreeChanges::destroyed`]: super::TreeChanges::destroyed
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn destroy_subtree(&mut self, id: WindowId) {
        self.validate(id);
        let mut preorder = Vec::new();
        let mut stack = alloc::vec![id.idx];
        while let Some(idx) = stack.pop() {
            preorder.push(idx);
            let mut child = self.first_child[idx as usize];
            while child != INVALID {
                stack.push(child);
                child = self.next_sibling[child as usize];
            }
        }
        for idx in preorder.into_iter().rev() {
            let handle = WindowId {
                idx,
                generation: self.generation[idx as usize],
            };
            self.destroy_window(handle);
        }
    }

    /// Returns whether the given handle refers to a live window.
    #[must_use]
    pub fn is_alive(&self, id: WindowId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    // -- Topology API --

    /// Adds `child` on top of `parent`'s existing children.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, or if `child` already has a parent.
    pub fn add_child(&mut self, parent: WindowId, child: WindowId) {
        self.validate(parent);
        self.validate(child);
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        self.append_child(parent.idx, c);
    }

    /// Removes `child` from its current parent, making it a root.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the window has no parent.
    pub fn remove_from_parent(&mut self, child: WindowId) {
        self.validate(child);
        let c = child.idx;
        assert!(self.parent[c as usize] != INVALID, "window has no parent");

        let p = self.parent[c as usize];
        self.unlink_from_parent(c);

        self.dirty.remove_dependency(c, p, dirty::GEOMETRY);
        self.dirty.remove_dependency(c, p, dirty::VISIBILITY);

        self.mark_subtree_inherited_dirty(c);
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Moves `child` on top of `new_parent`'s children.
    ///
    /// If `child` already has a parent, it is removed first.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, or if `new_parent` is inside
    /// `child`'s subtree.
    pub fn reparent(&mut self, child: WindowId, new_parent: WindowId) {
        self.validate(child);
        self.validate(new_parent);
        assert!(
            !WindowTree::contains(self, child, new_parent),
            "cannot reparent a window into its own subtree"
        );

        let c = child.idx;
        if self.parent[c as usize] != INVALID {
            let old_p = self.parent[c as usize];
            self.unlink_from_parent(c);
            self.dirty.remove_dependency(c, old_p, dirty::GEOMETRY);
            self.dirty.remove_dependency(c, old_p, dirty::VISIBILITY);
            self.dirty.mark(old_p, dirty::TOPOLOGY);
        }
        self.append_child(new_parent.idx, c);
    }

    /// Inserts `child` directly beneath `sibling`.
    ///
    /// `child` must not already have a parent. `sibling` must have a parent.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, `child` already has a parent, or `sibling`
    /// has no parent.
    pub fn insert_before(&mut self, child: WindowId, sibling: WindowId) {
        self.validate(child);
        self.validate(sibling);
        let c = child.idx;
        let s = sibling.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        let p = self.parent[s as usize];
        assert!(p != INVALID, "sibling has no parent");

        self.link_before(c, s);

        let _ = self.dirty.add_dependency(c, p, dirty::GEOMETRY);
        let _ = self.dirty.add_dependency(c, p, dirty::VISIBILITY);

        self.mark_subtree_inherited_dirty(c);
        self.dirty.mark(p, dirty::TOPOLOGY);
        self.dirty.mark(p, dirty::STACKING);
    }

    /// Restacks `child` above all of its siblings.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the window has no parent.
    pub fn stack_at_top(&mut self, child: WindowId) {
        self.validate(child);
        let c = child.idx;
        let p = self.parent[c as usize];
        assert!(p != INVALID, "window has no parent");
        if self.next_sibling[c as usize] == INVALID {
            return;
        }
        self.unlink_from_parent(c);
        self.link_last(p, c);
        self.dirty.mark(p, dirty::STACKING);
    }

    /// Restacks `child` directly above `sibling`.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, if the windows are the same, or if they do
    /// not share a parent.
    pub fn stack_above(&mut self, child: WindowId, sibling: WindowId) {
        self.validate(child);
        self.validate(sibling);
        let c = child.idx;
        let s = sibling.idx;
        assert!(c != s, "cannot stack a window above itself");
        let p = self.parent[c as usize];
        assert!(
            p != INVALID && p == self.parent[s as usize],
            "windows are not siblings"
        );
        if self.prev_sibling[c as usize] == s {
            return;
        }

        self.unlink_from_parent(c);
        let next = self.next_sibling[s as usize];
        if next == INVALID {
            self.link_last(p, c);
        } else {
            self.link_before(c, next);
        }
        self.dirty.mark(p, dirty::STACKING);
    }

    /// Returns the parent of a window, if any.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn parent(&self, id: WindowId) -> Option<WindowId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        if p == INVALID {
            None
        } else {
            Some(WindowId {
                idx: p,
                generation: self.generation[p as usize],
            })
        }
    }

    /// Returns an iterator over the direct children of a window, bottom-most
    /// first.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn children(&self, id: WindowId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns the root windows (those with no parent), in slot order.
    #[must_use]
    pub fn roots(&self) -> Vec<WindowId> {
        let mut roots = Vec::new();
        for idx in 0..self.len {
            if self.parent[idx as usize] == INVALID && !self.free_list.contains(&idx) {
                roots.push(WindowId {
                    idx,
                    generation: self.generation[idx as usize],
                });
            }
        }
        roots
    }

    // -- Property getters --

    /// Returns the bounds of a window, relative to its parent.
    #[must_use]
    pub fn bounds(&self, id: WindowId) -> Rect {
        self.validate(id);
        self.bounds[id.idx as usize]
    }

    /// Returns the flags of a window.
    #[must_use]
    pub fn flags(&self, id: WindowId) -> WindowFlags {
        self.validate(id);
        self.flags[id.idx as usize]
    }

    /// Returns the window's bounds in root coordinates, clipped by each
    /// ancestor's extent.
    #[must_use]
    pub fn screen_bounds(&self, id: WindowId) -> Rect {
        self.validate(id);
        let mut rect = self.bounds[id.idx as usize];
        let mut p = self.parent[id.idx as usize];
        while p != INVALID {
            let pb = self.bounds[p as usize];
            rect = rect.intersect(Rect::new(0.0, 0.0, pb.width(), pb.height()));
            rect = Rect::new(
                rect.x0 + pb.x0,
                rect.y0 + pb.y0,
                rect.x1 + pb.x0,
                rect.y1 + pb.y0,
            );
            p = self.parent[p as usize];
        }
        rect
    }

    // -- Mutation API (auto-marks dirty) --

    /// Sets the bounds of a window, relative to its parent.
    ///
    /// Marks the GEOMETRY channel dirty with eager propagation to descendants.
    pub fn set_bounds(&mut self, id: WindowId, bounds: Rect) {
        self.validate(id);
        self.bounds[id.idx as usize] = bounds;
        self.dirty.mark_with(id.idx, dirty::GEOMETRY, &EagerPolicy);
    }

    /// Sets the flags of a window.
    ///
    /// Marks the VISIBILITY channel dirty with eager propagation to
    /// descendants.
    pub fn set_flags(&mut self, id: WindowId, flags: WindowFlags) {
        self.validate(id);
        self.flags[id.idx as usize] = flags;
        self.dirty.mark_with(id.idx, dirty::VISIBILITY, &EagerPolicy);
    }

    /// Clears the hidden flag.
    pub fn show(&mut self, id: WindowId) {
        let flags = WindowFlags {
            hidden: false,
            ..self.flags(id)
        };
        self.set_flags(id, flags);
    }

    /// Sets the hidden flag.
    pub fn hide(&mut self, id: WindowId) {
        let flags = WindowFlags {
            hidden: true,
            ..self.flags(id)
        };
        self.set_flags(id, flags);
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    fn validate(&self, id: WindowId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale WindowId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Attaches the parentless `c` as the top-most child of `p` and wires up
    /// inherited dirty propagation.
    fn append_child(&mut self, p: u32, c: u32) {
        self.link_last(p, c);

        // Child depends on parent for GEOMETRY and VISIBILITY.
        let _ = self.dirty.add_dependency(c, p, dirty::GEOMETRY);
        let _ = self.dirty.add_dependency(c, p, dirty::VISIBILITY);

        self.mark_subtree_inherited_dirty(c);
        self.dirty.mark(p, dirty::TOPOLOGY);
        self.dirty.mark(p, dirty::STACKING);
    }

    /// Links the unlinked `c` as the last (top-most) child of `p`.
    fn link_last(&mut self, p: u32, c: u32) {
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            // Walk to last child.
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }
    }

    /// Links the unlinked `c` directly before (beneath) `s`.
    fn link_before(&mut self, c: u32, s: u32) {
        let p = self.parent[s as usize];
        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = self.prev_sibling[s as usize];

        if self.prev_sibling[s as usize] != INVALID {
            self.next_sibling[self.prev_sibling[s as usize] as usize] = c;
        } else {
            // `s` was the bottom-most child.
            self.first_child[p as usize] = c;
        }
        self.prev_sibling[s as usize] = c;
    }

    /// Removes `idx` from its parent's child list without touching dirty state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            // Was first child.
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }

    /// Marks the subtree rooted at `idx` dirty for inherited channels.
    fn mark_subtree_inherited_dirty(&mut self, idx: u32) {
        self.dirty.mark_with(idx, dirty::GEOMETRY, &EagerPolicy);
        self.dirty.mark_with(idx, dirty::VISIBILITY, &EagerPolicy);
    }
}

impl WindowTree for WindowStore {
    type Children<'a> = Children<'a>;

    fn is_alive(&self, window: WindowId) -> bool {
        Self::is_alive(self, window)
    }

    fn parent(&self, window: WindowId) -> Option<WindowId> {
        if Self::is_alive(self, window) {
            Self::parent(self, window)
        } else {
            None
        }
    }

    fn children(&self, window: WindowId) -> Children<'_> {
        if Self::is_alive(self, window) {
            Self::children(self, window)
        } else {
            Children::new(self, INVALID)
        }
    }
}

impl WindowGeometry for WindowStore {
    fn roots(&self) -> Vec<WindowId> {
        Self::roots(self)
    }

    fn screen_bounds(&self, window: WindowId) -> Rect {
        if Self::is_alive(self, window) {
            Self::screen_bounds(self, window)
        } else {
            Rect::ZERO
        }
    }

    fn is_shown(&self, window: WindowId) -> bool {
        Self::is_alive(self, window) && !self.flags[window.idx as usize].hidden
    }

    fn is_opaque(&self, window: WindowId) -> bool {
        Self::is_alive(self, window) && !self.flags[window.idx as usize].transparent
    }
}
