// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The seam between the calculator and whatever actually computes occlusion.

use super::builder::ChangeBuilder;
use crate::window::{WindowId, WindowTree};

/// An occlusion-computation primitive driven by
/// [`WindowOcclusionCalculator`](super::WindowOcclusionCalculator).
///
/// The primitive owns the expensive part: walking the tree and deciding a
/// state for every tracked window. The calculator owns bookkeeping,
/// deduplication and observer fan-out.
///
/// # Contract
///
/// - [`track`](Self::track) is called at most once per window until that
///   window is untracked or destroyed.
/// - [`pause`](Self::pause) and [`unpause`](Self::unpause) nest. While paused,
///   the primitive only records that a pass is due.
/// - [`compute`](Self::compute) reports results through the builder it is
///   given and never proposes [`Unknown`](super::OcclusionState::Unknown).
///   A pass clears whatever [`needs_pass`](Self::needs_pass) reported.
pub trait OcclusionPrimitive {
    /// The window tree this primitive reads.
    type Tree: WindowTree + ?Sized;

    /// Token that keeps a root force-visible until dropped.
    type ForceVisible;

    /// Starts evaluating occlusion for `window`.
    fn track(&mut self, window: WindowId);

    /// Stops evaluating occlusion for `window`.
    fn untrack(&mut self, window: WindowId);

    /// Forgets everything about a destroyed window.
    fn window_destroyed(&mut self, window: WindowId);

    /// Makes the primitive treat `root` as shown, regardless of its own
    /// visibility, until the returned token is dropped.
    fn force_visible(&mut self, root: WindowId) -> Self::ForceVisible;

    /// Enters a pause scope.
    fn pause(&mut self);

    /// Leaves a pause scope.
    fn unpause(&mut self);

    /// Returns whether at least one pause scope is open.
    fn is_paused(&self) -> bool;

    /// Records that tree content changed and a pass is due.
    fn invalidate(&mut self);

    /// Returns whether something changed since the last pass.
    fn needs_pass(&self) -> bool;

    /// Runs one recomputation pass, proposing states into `builder`.
    fn compute(&mut self, tree: &Self::Tree, builder: &mut dyn ChangeBuilder);
}
