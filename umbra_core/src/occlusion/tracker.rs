// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangle-based occlusion primitive.
//!
//! [`OcclusionTracker`] decides a state for every tracked window from the
//! tree's geometry alone:
//!
//! 1. A window is [`Hidden`](OcclusionState::Hidden) unless it is effectively
//!    shown. A window is effectively shown when it is force-visible, or when
//!    it is shown itself and its parent (if any) is effectively shown.
//! 2. An effectively shown window with an empty screen rectangle is
//!    [`Occluded`](OcclusionState::Occluded).
//! 3. Otherwise its screen rectangle is reduced by the rectangles of every
//!    effectively shown, opaque window painted above it. Windows in its own
//!    subtree are never occluders. If the remaining area exceeds
//!    [`TrackerConfig::min_visible_area`] the window is
//!    [`Visible`](OcclusionState::Visible), otherwise `Occluded`.
//!
//! Paint order is a depth-first pre-order walk from the roots with children
//! visited bottom-most first, so anything later in the walk and outside the
//! window's subtree is painted above it.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;
use core::marker::PhantomData;

use kurbo::Rect;

use super::builder::ChangeBuilder;
use super::primitive::OcclusionPrimitive;
use super::state::OcclusionState;
use crate::window::{WindowGeometry, WindowId, WindowStore};

/// Configuration for [`OcclusionTracker`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackerConfig {
    /// Uncovered area (in square screen units) a window must exceed to count
    /// as visible.
    pub min_visible_area: f64,
}

impl TrackerConfig {
    /// Any uncovered area at all makes a window visible.
    #[must_use]
    pub const fn exact() -> Self {
        Self {
            min_visible_area: 0.0,
        }
    }

    /// Slivers of up to 4x4 units still count as occluded.
    #[must_use]
    pub const fn ignore_slivers() -> Self {
        Self {
            min_visible_area: 16.0,
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::exact()
    }
}

/// Reference counts of force-visible roots, shared with outstanding tokens.
#[derive(Debug, Default)]
struct ForcedVisibility {
    counts: BTreeMap<WindowId, u32>,
    changed: bool,
}

impl ForcedVisibility {
    fn contains(&self, window: WindowId) -> bool {
        self.counts.contains_key(&window)
    }
}

/// Keeps a root force-visible for an [`OcclusionTracker`] until dropped.
#[must_use = "the window stops being force-visible when the token is dropped"]
pub struct ForcedVisible {
    forced: Rc<RefCell<ForcedVisibility>>,
    window: WindowId,
}

impl ForcedVisible {
    /// Returns the window this token keeps visible.
    #[must_use]
    pub fn window(&self) -> WindowId {
        self.window
    }
}

impl fmt::Debug for ForcedVisible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ForcedVisible").field(&self.window).finish()
    }
}

impl Drop for ForcedVisible {
    fn drop(&mut self) {
        let mut forced = self.forced.borrow_mut();
        if let Some(count) = forced.counts.get_mut(&self.window) {
            *count -= 1;
            if *count == 0 {
                forced.counts.remove(&self.window);
                forced.changed = true;
            }
        }
    }
}

/// The bundled [`OcclusionPrimitive`], computing occlusion from window
/// rectangles.
///
/// `T` is the tree type it reads; it defaults to [`WindowStore`].
pub struct OcclusionTracker<T: ?Sized = WindowStore> {
    config: TrackerConfig,
    tracked: BTreeSet<WindowId>,
    forced: Rc<RefCell<ForcedVisibility>>,
    pause_depth: u32,
    dirty: bool,
    _tree: PhantomData<fn(&T)>,
}

impl<T: ?Sized> OcclusionTracker<T> {
    /// Creates a tracker with the given configuration.
    #[must_use]
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            tracked: BTreeSet::new(),
            forced: Rc::default(),
            pause_depth: 0,
            dirty: false,
            _tree: PhantomData,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> TrackerConfig {
        self.config
    }

    /// Returns whether `window` is tracked.
    #[must_use]
    pub fn is_tracked(&self, window: WindowId) -> bool {
        self.tracked.contains(&window)
    }

    /// Returns the number of tracked windows.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    /// Returns whether `window` is currently force-visible.
    #[must_use]
    pub fn is_force_visible(&self, window: WindowId) -> bool {
        self.forced.borrow().contains(window)
    }
}

impl<T: ?Sized> Default for OcclusionTracker<T> {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl<T: ?Sized> fmt::Debug for OcclusionTracker<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcclusionTracker")
            .field("config", &self.config)
            .field("tracked", &self.tracked.len())
            .field("pause_depth", &self.pause_depth)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

impl<T: WindowGeometry + ?Sized> OcclusionPrimitive for OcclusionTracker<T> {
    type Tree = T;
    type ForceVisible = ForcedVisible;

    fn track(&mut self, window: WindowId) {
        debug_assert!(
            !self.tracked.contains(&window),
            "window {window:?} is already tracked"
        );
        self.tracked.insert(window);
        self.dirty = true;
    }

    fn untrack(&mut self, window: WindowId) {
        if self.tracked.remove(&window) {
            self.dirty = true;
        }
    }

    fn window_destroyed(&mut self, window: WindowId) {
        self.tracked.remove(&window);
        self.dirty = true;
    }

    fn force_visible(&mut self, root: WindowId) -> ForcedVisible {
        let mut forced = self.forced.borrow_mut();
        let count = forced.counts.entry(root).or_insert(0);
        *count += 1;
        if *count == 1 {
            forced.changed = true;
        }
        drop(forced);
        ForcedVisible {
            forced: Rc::clone(&self.forced),
            window: root,
        }
    }

    fn pause(&mut self) {
        self.pause_depth += 1;
    }

    fn unpause(&mut self) {
        assert!(self.pause_depth > 0, "unpause without matching pause");
        self.pause_depth -= 1;
    }

    fn is_paused(&self) -> bool {
        self.pause_depth > 0
    }

    fn invalidate(&mut self) {
        self.dirty = true;
    }

    fn needs_pass(&self) -> bool {
        self.dirty || self.forced.borrow().changed
    }

    fn compute(&mut self, tree: &T, builder: &mut dyn ChangeBuilder) {
        self.dirty = false;
        self.forced.borrow_mut().changed = false;
        if self.tracked.is_empty() {
            return;
        }

        let forced = self.forced.borrow();
        let order = paint_order(tree, &forced);
        drop(forced);

        let mut region = Vec::new();
        let mut scratch = Vec::new();
        for (pos, item) in order.iter().enumerate() {
            if !self.tracked.contains(&item.window) {
                continue;
            }
            let state = if !item.shown {
                OcclusionState::Hidden
            } else {
                region.clear();
                region.push(item.bounds);
                let above = order[item.subtree_end..]
                    .iter()
                    .filter(|other| other.shown && other.opaque);
                for occluder in above {
                    subtract_region(&mut region, occluder.bounds, &mut scratch);
                    if region.is_empty() {
                        break;
                    }
                }
                let remaining: f64 = region.iter().map(Rect::area).sum();
                if item.bounds.area() > 0.0 && remaining > self.config.min_visible_area {
                    OcclusionState::Visible
                } else {
                    OcclusionState::Occluded
                }
            };
            log::trace!("window {} at paint position {pos}: {state}", item.window);
            builder.add(item.window, state);
        }
    }
}

/// A window in paint order.
#[derive(Clone, Copy, Debug)]
struct Painted {
    window: WindowId,
    bounds: Rect,
    shown: bool,
    opaque: bool,
    /// One past the paint position of the last window in this subtree.
    subtree_end: usize,
}

/// Flattens the tree into paint order, bottom-most first.
fn paint_order<T: WindowGeometry + ?Sized>(tree: &T, forced: &ForcedVisibility) -> Vec<Painted> {
    let mut order: Vec<Painted> = Vec::new();
    let mut parents: Vec<Option<usize>> = Vec::new();

    // (window, parent position, parent effectively shown)
    let mut stack: Vec<(WindowId, Option<usize>, bool)> = tree
        .roots()
        .into_iter()
        .rev()
        .map(|root| (root, None, true))
        .collect();
    let mut children = Vec::new();

    while let Some((window, parent, parent_shown)) = stack.pop() {
        let shown = forced.contains(window) || (parent_shown && tree.is_shown(window));
        let pos = order.len();
        order.push(Painted {
            window,
            bounds: tree.screen_bounds(window),
            shown,
            opaque: tree.is_opaque(window),
            subtree_end: pos + 1,
        });
        parents.push(parent);

        children.clear();
        children.extend(tree.children(window));
        stack.extend(children.iter().rev().map(|&child| (child, Some(pos), shown)));
    }

    // Children always follow their parent, so a reverse sweep settles every
    // subtree's extent.
    for pos in (0..order.len()).rev() {
        if let Some(parent) = parents[pos] {
            let end = order[pos].subtree_end;
            if end > order[parent].subtree_end {
                order[parent].subtree_end = end;
            }
        }
    }
    order
}

/// Removes `hole` from every rectangle in `region`.
fn subtract_region(region: &mut Vec<Rect>, hole: Rect, scratch: &mut Vec<Rect>) {
    if hole.area() <= 0.0 {
        return;
    }
    scratch.clear();
    for &rect in region.iter() {
        subtract_rect(rect, hole, scratch);
    }
    core::mem::swap(region, scratch);
}

/// Pushes the parts of `rect` not covered by `hole` into `out`, as up to four
/// non-overlapping rectangles.
fn subtract_rect(rect: Rect, hole: Rect, out: &mut Vec<Rect>) {
    let inter = rect.intersect(hole);
    if inter.area() <= 0.0 {
        out.push(rect);
        return;
    }
    let pieces = [
        // Above and below the hole, full width.
        Rect::new(rect.x0, rect.y0, rect.x1, inter.y0),
        Rect::new(rect.x0, inter.y1, rect.x1, rect.y1),
        // Left and right of the hole, hole height.
        Rect::new(rect.x0, inter.y0, inter.x0, inter.y1),
        Rect::new(inter.x1, inter.y0, rect.x1, inter.y1),
    ];
    out.extend(pieces.into_iter().filter(|piece| piece.area() > 0.0));
}
