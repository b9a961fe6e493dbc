// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draining window-tree mutations into a change set.
//!
//! Hosts mutate the [`WindowStore`] freely and then call
//! [`evaluate`](WindowStore::evaluate) once per batch. The resulting
//! [`TreeChanges`] tells the occlusion calculator whether a recomputation
//! pass is needed and which windows were destroyed.
//!
//! Geometry, visibility and stacking lists hold raw slot indices (`u32`),
//! matching the store's internal arrays. Lifecycle lists hold full
//! [`WindowId`] handles, because a destroyed slot may already be reused by
//! the time the changes are consumed.

use alloc::vec::Vec;

use super::id::WindowId;
use super::store::WindowStore;
use crate::dirty;

/// The set of changes produced by a single [`WindowStore::evaluate`] call.
#[derive(Clone, Debug, Default)]
pub struct TreeChanges {
    /// Windows whose bounds (or an ancestor's bounds) changed.
    pub geometry: Vec<u32>,
    /// Windows whose flags (or an ancestor's flags) changed.
    pub visibility: Vec<u32>,
    /// Parents whose child stacking order changed.
    pub stacking: Vec<u32>,
    /// Windows created since the last evaluate.
    pub created: Vec<WindowId>,
    /// Windows destroyed since the last evaluate.
    pub destroyed: Vec<WindowId>,
    /// Whether the tree topology changed.
    pub topology_changed: bool,
}

impl TreeChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.geometry.clear();
        self.visibility.clear();
        self.stacking.clear();
        self.created.clear();
        self.destroyed.clear();
        self.topology_changed = false;
    }

    /// Returns whether anything that can affect occlusion changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty()
            && self.visibility.is_empty()
            && self.stacking.is_empty()
            && self.created.is_empty()
            && self.destroyed.is_empty()
            && !self.topology_changed
    }
}

impl WindowStore {
    /// Drains every dirty channel and returns the accumulated changes.
    pub fn evaluate(&mut self) -> TreeChanges {
        let mut changes = TreeChanges::default();
        self.evaluate_into(&mut changes);
        changes
    }

    /// Like [`evaluate`](Self::evaluate), but reuses a caller-provided buffer
    /// to avoid allocation.
    pub fn evaluate_into(&mut self, changes: &mut TreeChanges) {
        changes.clear();

        changes.geometry = self
            .dirty
            .drain(dirty::GEOMETRY)
            .affected()
            .deterministic()
            .run()
            .collect();

        changes.visibility = self
            .dirty
            .drain(dirty::VISIBILITY)
            .affected()
            .deterministic()
            .run()
            .collect();

        changes.stacking = self
            .dirty
            .drain(dirty::STACKING)
            .deterministic()
            .run()
            .collect();

        let topology: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();
        changes.topology_changed = !topology.is_empty();

        // Freed slots can linger in the propagating channels when a subtree
        // was marked and then destroyed in the same batch.
        let free_list = &self.free_list;
        changes.geometry.retain(|idx| !free_list.contains(idx));
        changes.visibility.retain(|idx| !free_list.contains(idx));
        changes.stacking.retain(|idx| !free_list.contains(idx));

        core::mem::swap(&mut self.pending_created, &mut changes.created);
        core::mem::swap(&mut self.pending_destroyed, &mut changes.destroyed);
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::*;
    use crate::window::WindowFlags;

    #[test]
    fn no_change_evaluate_returns_empty() {
        let mut store = WindowStore::new();
        let _root = store.create_window(Rect::ZERO);

        // First evaluate processes initial creation.
        let first = store.evaluate();
        assert!(!first.is_empty());

        let changes = store.evaluate();
        assert!(changes.is_empty());
    }

    #[test]
    fn created_and_destroyed_lifecycle() {
        let mut store = WindowStore::new();
        let id = store.create_window(Rect::ZERO);

        let changes = store.evaluate();
        assert_eq!(changes.created, &[id]);
        assert!(changes.destroyed.is_empty());

        store.destroy_window(id);
        let changes = store.evaluate();
        assert_eq!(changes.destroyed, &[id]);
        assert!(changes.created.is_empty());
        assert!(changes.topology_changed);
    }

    #[test]
    fn set_bounds_propagates_geometry_to_descendants() {
        let mut store = WindowStore::new();
        let parent = store.create_window(Rect::ZERO);
        let child = store.create_window(Rect::ZERO);
        store.add_child(parent, child);
        let _ = store.evaluate();

        store.set_bounds(parent, Rect::new(0.0, 0.0, 5.0, 5.0));
        let changes = store.evaluate();
        assert!(changes.geometry.contains(&parent.index()));
        assert!(changes.geometry.contains(&child.index()));
    }

    #[test]
    fn hide_propagates_visibility_to_descendants() {
        let mut store = WindowStore::new();
        let parent = store.create_window(Rect::ZERO);
        let child = store.create_window(Rect::ZERO);
        store.add_child(parent, child);
        let _ = store.evaluate();

        store.set_flags(
            parent,
            WindowFlags {
                hidden: true,
                transparent: false,
            },
        );
        let changes = store.evaluate();
        assert!(changes.visibility.contains(&parent.index()));
        assert!(changes.visibility.contains(&child.index()));
        assert!(changes.geometry.is_empty());
    }

    #[test]
    fn restacking_marks_only_the_parent() {
        let mut store = WindowStore::new();
        let parent = store.create_window(Rect::ZERO);
        let a = store.create_window(Rect::ZERO);
        let b = store.create_window(Rect::ZERO);
        store.add_child(parent, a);
        store.add_child(parent, b);
        let _ = store.evaluate();

        store.stack_at_top(a);
        let changes = store.evaluate();
        assert_eq!(changes.stacking, &[parent.index()]);
        assert!(changes.geometry.is_empty());
        assert!(!changes.topology_changed);
    }

    #[test]
    fn evaluate_into_reuses_buffer() {
        let mut store = WindowStore::new();
        let a = store.create_window(Rect::ZERO);
        let b = store.create_window(Rect::ZERO);

        let mut changes = TreeChanges::default();
        store.evaluate_into(&mut changes);
        assert_eq!(changes.created.len(), 2);

        store.set_bounds(a, Rect::new(0.0, 0.0, 1.0, 1.0));
        store.evaluate_into(&mut changes);

        assert!(changes.created.is_empty(), "created should be cleared");
        assert!(
            changes.geometry.contains(&a.index()),
            "geometry change should be present"
        );
        assert!(
            !changes.geometry.contains(&b.index()),
            "unchanged window should not appear"
        );
    }
}
