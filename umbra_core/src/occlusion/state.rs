// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Occlusion state values and the per-window cache.

use alloc::collections::BTreeMap;
use alloc::collections::btree_map::Entry;
use core::fmt;

use crate::window::WindowId;

/// Occlusion state of a window.
///
/// States are only ever compared for equality; there is no ordering between
/// them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OcclusionState {
    /// Never computed, or the window is gone.
    #[default]
    Unknown,
    /// At least part of the window is visible on screen.
    Visible,
    /// The window is shown but entirely covered by other windows.
    Occluded,
    /// The window or one of its ancestors is hidden.
    Hidden,
}

impl OcclusionState {
    /// Returns a short lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Visible => "visible",
            Self::Occluded => "occluded",
            Self::Hidden => "hidden",
        }
    }

    /// Returns whether UI code should treat the window as visible.
    ///
    /// `Unknown` counts as visible: a stale or missing reading must never
    /// cause content to be skipped.
    #[must_use]
    pub const fn is_presumed_visible(self) -> bool {
        matches!(self, Self::Unknown | Self::Visible)
    }
}

impl fmt::Display for OcclusionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last known occlusion state of each window.
///
/// A key is present only while the window is alive and has received at least
/// one real (non-[`Unknown`](OcclusionState::Unknown)) state. Lookups of
/// absent windows return `Unknown`.
#[derive(Clone, Debug, Default)]
pub struct OcclusionMap {
    states: BTreeMap<WindowId, OcclusionState>,
}

impl OcclusionMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached state, or `Unknown` if there is none.
    #[must_use]
    pub fn get(&self, window: WindowId) -> OcclusionState {
        self.states
            .get(&window)
            .copied()
            .unwrap_or(OcclusionState::Unknown)
    }

    /// Returns whether the window has a cached state.
    #[must_use]
    pub fn contains(&self, window: WindowId) -> bool {
        self.states.contains_key(&window)
    }

    /// Returns the number of windows with a cached state.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns whether no window has a cached state.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Iterates over every cached `(window, state)` pair.
    pub fn iter(&self) -> impl Iterator<Item = (WindowId, OcclusionState)> + '_ {
        self.states.iter().map(|(&window, &state)| (window, state))
    }

    /// Stores `state` and returns the previous state if the value changed,
    /// or `None` if it was already equal.
    ///
    /// A window seen for the first time reports a previous state of
    /// `Unknown`.
    pub(crate) fn update(
        &mut self,
        window: WindowId,
        state: OcclusionState,
    ) -> Option<OcclusionState> {
        match self.states.entry(window) {
            Entry::Vacant(slot) => {
                slot.insert(state);
                Some(OcclusionState::Unknown)
            }
            Entry::Occupied(mut slot) => {
                if *slot.get() == state {
                    None
                } else {
                    Some(slot.insert(state))
                }
            }
        }
    }

    pub(crate) fn remove(&mut self, window: WindowId) {
        self.states.remove(&window);
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    fn w(idx: u32) -> WindowId {
        WindowId::from_raw_parts(idx, 0)
    }

    #[test]
    fn absent_windows_are_unknown() {
        let map = OcclusionMap::new();
        assert_eq!(map.get(w(1)), OcclusionState::Unknown);
        assert!(!map.contains(w(1)));
    }

    #[test]
    fn update_reports_only_real_changes() {
        let mut map = OcclusionMap::new();
        assert_eq!(
            map.update(w(1), OcclusionState::Visible),
            Some(OcclusionState::Unknown)
        );
        assert_eq!(map.update(w(1), OcclusionState::Visible), None);
        assert_eq!(
            map.update(w(1), OcclusionState::Occluded),
            Some(OcclusionState::Visible)
        );
        assert_eq!(map.get(w(1)), OcclusionState::Occluded);
    }

    #[test]
    fn remove_restores_unknown() {
        let mut map = OcclusionMap::new();
        let _ = map.update(w(1), OcclusionState::Hidden);
        map.remove(w(1));
        map.remove(w(1));
        assert_eq!(map.get(w(1)), OcclusionState::Unknown);
        assert!(map.is_empty());
    }

    #[test]
    fn unknown_is_presumed_visible() {
        assert!(OcclusionState::Unknown.is_presumed_visible());
        assert!(OcclusionState::Visible.is_presumed_visible());
        assert!(!OcclusionState::Occluded.is_presumed_visible());
        assert!(!OcclusionState::Hidden.is_presumed_visible());
        assert_eq!(OcclusionState::Occluded.to_string(), "occluded");
    }
}
