// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-pass collection of occlusion proposals.
//!
//! While resolving stacking and clipping, a primitive may report the same
//! window several times in one pass with transient values. [`PendingChanges`]
//! keeps only the latest value per window and hands the final set back when
//! the pass ends, so observers never see a state that only existed halfway
//! through a computation.

use alloc::collections::{BTreeMap, BTreeSet};

use super::state::OcclusionState;
use crate::window::WindowId;

/// Receives occlusion proposals during one recomputation pass.
///
/// A fresh builder is handed to
/// [`OcclusionPrimitive::compute`](super::OcclusionPrimitive::compute) for
/// every pass.
pub trait ChangeBuilder {
    /// Proposes `state` for `window`, overwriting any earlier proposal made in
    /// the same pass.
    ///
    /// Proposing [`OcclusionState::Unknown`] is a contract violation.
    fn add(&mut self, window: WindowId, state: OcclusionState);

    /// Reports that `window` was destroyed after it was proposed.
    ///
    /// The window's proposal is dropped at the end of the pass.
    fn window_destroyed(&mut self, window: WindowId);
}

/// The [`ChangeBuilder`] used by the calculator.
///
/// Proposals are collected in a map; a separate liveness set records which
/// proposed windows have not been reported destroyed. [`finish`](Self::finish)
/// consumes the builder, so a set of proposals can be flushed at most once.
#[derive(Clone, Debug, Default)]
pub struct PendingChanges {
    proposals: BTreeMap<WindowId, OcclusionState>,
    live: BTreeSet<WindowId>,
    proposal_count: usize,
}

impl PendingChanges {
    /// Creates an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of `add` calls accepted so far, including ones later
    /// overwritten.
    #[must_use]
    pub fn proposal_count(&self) -> usize {
        self.proposal_count
    }

    /// Returns the number of distinct windows proposed so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    /// Returns whether nothing was proposed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    /// Returns the latest proposal for `window`, if any.
    #[must_use]
    pub fn latest(&self, window: WindowId) -> Option<OcclusionState> {
        self.proposals.get(&window).copied()
    }

    /// Ends the pass and returns the final proposals.
    pub fn finish(self) -> FinishedChanges {
        let Self {
            proposals,
            live,
            proposal_count,
        } = self;
        let mut skipped = 0;
        let mut flushed = alloc::vec::Vec::with_capacity(proposals.len());
        for (window, state) in proposals {
            if live.contains(&window) {
                flushed.push((window, state));
            } else {
                skipped += 1;
            }
        }
        FinishedChanges {
            changes: flushed,
            proposal_count,
            skipped,
        }
    }
}

impl ChangeBuilder for PendingChanges {
    fn add(&mut self, window: WindowId, state: OcclusionState) {
        debug_assert_ne!(
            state,
            OcclusionState::Unknown,
            "primitives must not propose Unknown"
        );
        if state == OcclusionState::Unknown {
            return;
        }
        self.proposal_count += 1;
        self.proposals.insert(window, state);
        self.live.insert(window);
    }

    fn window_destroyed(&mut self, window: WindowId) {
        self.live.remove(&window);
    }
}

/// Final values of one pass, with windows destroyed mid-pass removed.
#[derive(Clone, Debug, Default)]
pub struct FinishedChanges {
    /// The last proposal of every window still alive at the end of the pass.
    pub changes: alloc::vec::Vec<(WindowId, OcclusionState)>,
    /// Total number of proposals received during the pass.
    pub proposal_count: usize,
    /// Number of windows dropped because they died mid-pass.
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(idx: u32) -> WindowId {
        WindowId::from_raw_parts(idx, 0)
    }

    #[test]
    fn only_final_value_is_flushed() {
        let mut pending = PendingChanges::new();
        pending.add(w(1), OcclusionState::Occluded);
        pending.add(w(1), OcclusionState::Visible);
        pending.add(w(2), OcclusionState::Hidden);

        assert_eq!(pending.proposal_count(), 3);
        assert_eq!(pending.len(), 2);

        let finished = pending.finish();
        assert_eq!(
            finished.changes,
            &[(w(1), OcclusionState::Visible), (w(2), OcclusionState::Hidden)]
        );
        assert_eq!(finished.skipped, 0);
    }

    #[test]
    fn windows_destroyed_mid_pass_are_skipped() {
        let mut pending = PendingChanges::new();
        pending.add(w(1), OcclusionState::Visible);
        pending.add(w(2), OcclusionState::Visible);
        pending.window_destroyed(w(1));

        let finished = pending.finish();
        assert_eq!(finished.changes, &[(w(2), OcclusionState::Visible)]);
        assert_eq!(finished.skipped, 1);
    }

    #[test]
    fn destroying_unproposed_window_is_harmless() {
        let mut pending = PendingChanges::new();
        pending.window_destroyed(w(9));
        assert!(pending.is_empty());
        assert!(pending.finish().changes.is_empty());
    }

    #[test]
    fn reproposal_after_destruction_revives_window() {
        // Reused slots get a new generation, so this is the same window.
        let mut pending = PendingChanges::new();
        pending.add(w(1), OcclusionState::Visible);
        pending.window_destroyed(w(1));
        pending.add(w(1), OcclusionState::Occluded);
        assert_eq!(pending.latest(w(1)), Some(OcclusionState::Occluded));
        assert_eq!(
            pending.finish().changes,
            &[(w(1), OcclusionState::Occluded)]
        );
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn unknown_proposals_are_ignored_in_release() {
        let mut pending = PendingChanges::new();
        pending.add(w(1), OcclusionState::Unknown);
        assert!(pending.is_empty());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "primitives must not propose Unknown")]
    fn unknown_proposals_assert_in_debug() {
        let mut pending = PendingChanges::new();
        pending.add(w(1), OcclusionState::Unknown);
    }
}
