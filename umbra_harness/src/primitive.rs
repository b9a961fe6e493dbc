// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A scripted [`OcclusionPrimitive`] that counts how it is driven.

use alloc::collections::{BTreeMap, BTreeSet, VecDeque};
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;
use core::fmt;
use core::marker::PhantomData;

use umbra_core::occlusion::{ChangeBuilder, OcclusionPrimitive, OcclusionState};
use umbra_core::window::{WindowId, WindowStore, WindowTree};

/// One scripted action within a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Propose a state for a window.
    Propose(WindowId, OcclusionState),
    /// Report that a window died mid-pass.
    Destroy(WindowId),
}

/// Call counts recorded by [`ScriptedPrimitive`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PrimitiveCounters {
    /// `track` calls.
    pub track: u32,
    /// `untrack` calls.
    pub untrack: u32,
    /// `window_destroyed` calls.
    pub destroyed: u32,
    /// `pause` calls.
    pub pause: u32,
    /// `unpause` calls.
    pub unpause: u32,
    /// `compute` calls.
    pub passes: u32,
}

/// Shared state between the primitive and its force-visible tokens.
#[derive(Debug, Default)]
struct Forced {
    live: Cell<usize>,
    changed: Cell<bool>,
}

/// Force-visible token of [`ScriptedPrimitive`].
#[must_use = "the root stops being force-visible when the token is dropped"]
pub struct ScriptedForceVisible {
    forced: Rc<Forced>,
    root: WindowId,
}

impl ScriptedForceVisible {
    /// Returns the root this token was acquired for.
    #[must_use]
    pub fn root(&self) -> WindowId {
        self.root
    }
}

impl fmt::Debug for ScriptedForceVisible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ScriptedForceVisible").field(&self.root).finish()
    }
}

impl Drop for ScriptedForceVisible {
    fn drop(&mut self) {
        self.forced.live.set(self.forced.live.get() - 1);
        self.forced.changed.set(true);
    }
}

/// An [`OcclusionPrimitive`] whose passes are driven by the test.
///
/// Every pass first proposes the *standing* state (set with
/// [`set_state`](Self::set_state)) of each tracked window that has one, then
/// replays the next queued script, if any. It never looks at geometry.
pub struct ScriptedPrimitive<T: ?Sized = WindowStore> {
    standing: BTreeMap<WindowId, OcclusionState>,
    scripts: VecDeque<Vec<Step>>,
    tracked: BTreeSet<WindowId>,
    forced: Rc<Forced>,
    counters: PrimitiveCounters,
    pause_depth: u32,
    dirty: bool,
    _tree: PhantomData<fn(&T)>,
}

impl<T: ?Sized> Default for ScriptedPrimitive<T> {
    fn default() -> Self {
        Self {
            standing: BTreeMap::new(),
            scripts: VecDeque::new(),
            tracked: BTreeSet::new(),
            forced: Rc::default(),
            counters: PrimitiveCounters::default(),
            pause_depth: 0,
            dirty: false,
            _tree: PhantomData,
        }
    }
}

impl<T: ?Sized> fmt::Debug for ScriptedPrimitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedPrimitive")
            .field("counters", &self.counters)
            .field("tracked", &self.tracked.len())
            .field("queued_scripts", &self.scripts.len())
            .finish_non_exhaustive()
    }
}

impl<T: ?Sized> ScriptedPrimitive<T> {
    /// Creates a primitive with no standing states and no scripts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the state proposed for `window` on every later pass.
    pub fn set_state(&mut self, window: WindowId, state: OcclusionState) {
        self.standing.insert(window, state);
    }

    /// Stops proposing a standing state for `window`.
    pub fn clear_state(&mut self, window: WindowId) {
        self.standing.remove(&window);
    }

    /// Queues steps to replay during one future pass.
    pub fn push_script(&mut self, steps: impl IntoIterator<Item = Step>) {
        self.scripts.push_back(steps.into_iter().collect());
    }

    /// Returns the recorded call counts.
    #[must_use]
    pub fn counters(&self) -> PrimitiveCounters {
        self.counters
    }

    /// Returns whether `window` is tracked.
    #[must_use]
    pub fn is_tracked(&self, window: WindowId) -> bool {
        self.tracked.contains(&window)
    }

    /// Returns the number of outstanding force-visible tokens.
    #[must_use]
    pub fn forced_roots(&self) -> usize {
        self.forced.live.get()
    }
}

impl<T: WindowTree + ?Sized> OcclusionPrimitive for ScriptedPrimitive<T> {
    type Tree = T;
    type ForceVisible = ScriptedForceVisible;

    fn track(&mut self, window: WindowId) {
        assert!(self.tracked.insert(window), "window {window} tracked twice");
        self.counters.track += 1;
        self.dirty = true;
    }

    fn untrack(&mut self, window: WindowId) {
        self.counters.untrack += 1;
        self.tracked.remove(&window);
        self.dirty = true;
    }

    fn window_destroyed(&mut self, window: WindowId) {
        self.counters.destroyed += 1;
        self.tracked.remove(&window);
        self.dirty = true;
    }

    fn force_visible(&mut self, root: WindowId) -> ScriptedForceVisible {
        self.forced.live.set(self.forced.live.get() + 1);
        self.forced.changed.set(true);
        ScriptedForceVisible {
            forced: Rc::clone(&self.forced),
            root,
        }
    }

    fn pause(&mut self) {
        self.counters.pause += 1;
        self.pause_depth += 1;
    }

    fn unpause(&mut self) {
        self.counters.unpause += 1;
        self.pause_depth -= 1;
    }

    fn is_paused(&self) -> bool {
        self.pause_depth > 0
    }

    fn invalidate(&mut self) {
        self.dirty = true;
    }

    fn needs_pass(&self) -> bool {
        self.dirty || self.forced.changed.get()
    }

    fn compute(&mut self, tree: &T, builder: &mut dyn ChangeBuilder) {
        self.counters.passes += 1;
        self.dirty = false;
        self.forced.changed.set(false);

        for (&window, &state) in &self.standing {
            if self.tracked.contains(&window) && tree.is_alive(window) {
                builder.add(window, state);
            }
        }
        for step in self.scripts.pop_front().unwrap_or_default() {
            match step {
                Step::Propose(window, state) => builder.add(window, state),
                Step::Destroy(window) => builder.window_destroyed(window),
            }
        }
    }
}
