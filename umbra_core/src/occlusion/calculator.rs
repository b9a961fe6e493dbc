// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The occlusion calculator: cache, observer registry, and pass driver.
//!
//! [`WindowOcclusionCalculator`] wraps one [`OcclusionPrimitive`]. Each pass
//! the primitive runs gets a fresh [`PendingChanges`]; when the pass ends the
//! final per-window values are diffed against the [`OcclusionMap`] and real
//! transitions are fanned out to the observers of every watched root that
//! contains the changed window.
//!
//! # Observers
//!
//! Observers are held weakly. Dropping the last `Rc` of an observer is
//! enough to stop notifications. Roots left without live observers are
//! released when the next pause scope ends; [`remove_observer`] releases
//! them right away.
//!
//! Callbacks receive the already-updated map, so reading the changed window
//! from inside a callback yields the new state.
//!
//! # Batching
//!
//! Operations that touch many windows run inside a [`ScopedPause`]. The
//! primitive only records that a pass is due while paused; dropping the
//! outermost pause runs at most one pass.
//!
//! [`remove_observer`]: WindowOcclusionCalculator::remove_observer

use alloc::boxed::Box;
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::fmt;
use core::ops::{Deref, DerefMut};

use super::builder::PendingChanges;
use super::primitive::OcclusionPrimitive;
use super::state::{OcclusionMap, OcclusionState};
use crate::trace::{
    EntryChange, EntryEvent, OcclusionTraceSink, PassBeginEvent, PassEndEvent, StateChangeEvent,
    Tracer,
};
use crate::window::{Descendants, TreeChanges, WindowId, WindowTree};

/// Receives occlusion changes for the roots it was registered with.
pub trait OcclusionObserver {
    /// Called once per watched root containing `window`, after `window`'s
    /// cached state changed.
    ///
    /// `occlusion` is the calculator's cache, already holding the new value.
    fn on_window_occlusion_changed(&self, window: WindowId, occlusion: &OcclusionMap);
}

/// What happens to window subscriptions when their root stops being watched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TrackingRetention {
    /// Windows stay tracked, and keep receiving states, after the last
    /// observer of their root is removed. Watching the same root again is
    /// cheap.
    #[default]
    Retain,
    /// Windows not contained by any remaining watched root are untracked and
    /// their cached state is erased.
    Release,
}

/// Configuration for [`WindowOcclusionCalculator`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CalculatorConfig {
    /// Subscription policy for roots that are no longer watched.
    pub retention: TrackingRetention,
}

impl CalculatorConfig {
    /// Keeps subscriptions alive after their root is released.
    #[must_use]
    pub const fn retain() -> Self {
        Self {
            retention: TrackingRetention::Retain,
        }
    }

    /// Drops subscriptions as soon as no watched root contains them.
    #[must_use]
    pub const fn release() -> Self {
        Self {
            retention: TrackingRetention::Release,
        }
    }
}

/// One watched root.
struct ObservationEntry<F> {
    observers: Vec<Weak<dyn OcclusionObserver>>,
    /// Keeps the root force-visible while the entry exists.
    _force_visible: F,
}

impl<F> ObservationEntry<F> {
    fn prune(&mut self) {
        self.observers.retain(|weak| weak.strong_count() > 0);
    }

    fn contains(&self, observer: *const ()) -> bool {
        self.observers
            .iter()
            .any(|weak| weak.as_ptr().cast::<()>() == observer)
    }

    fn remove(&mut self, observer: *const ()) {
        self.observers
            .retain(|weak| weak.strong_count() > 0 && weak.as_ptr().cast::<()>() != observer);
    }
}

/// Caches per-window occlusion state and notifies observers of watched
/// subtrees when it changes.
///
/// The calculator never owns windows. Every operation that needs to walk the
/// hierarchy borrows the tree for the duration of the call; the host must
/// pass the same tree every time.
pub struct WindowOcclusionCalculator<P: OcclusionPrimitive> {
    config: CalculatorConfig,
    primitive: P,
    occlusion: OcclusionMap,
    tracked: BTreeSet<WindowId>,
    entries: BTreeMap<WindowId, ObservationEntry<P::ForceVisible>>,
    /// Observers waiting for the outermost pause to end before they are
    /// attached to their root.
    pending_attach: Vec<(WindowId, Weak<dyn OcclusionObserver>)>,
    pass_count: u64,
    tracer: Tracer,
}

impl<P: OcclusionPrimitive> fmt::Debug for WindowOcclusionCalculator<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowOcclusionCalculator")
            .field("config", &self.config)
            .field("occlusion", &self.occlusion)
            .field("tracked", &self.tracked.len())
            .field("roots", &self.entries.len())
            .field("pass_count", &self.pass_count)
            .finish_non_exhaustive()
    }
}

impl<P: OcclusionPrimitive> WindowOcclusionCalculator<P> {
    /// Creates a calculator driving `primitive` with the default
    /// configuration.
    #[must_use]
    pub fn new(primitive: P) -> Self {
        Self::with_config(primitive, CalculatorConfig::default())
    }

    /// Creates a calculator driving `primitive`.
    #[must_use]
    pub fn with_config(primitive: P, config: CalculatorConfig) -> Self {
        Self {
            config,
            primitive,
            occlusion: OcclusionMap::new(),
            tracked: BTreeSet::new(),
            entries: BTreeMap::new(),
            pending_attach: Vec::new(),
            pass_count: 0,
            tracer: Tracer::none(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> CalculatorConfig {
        self.config
    }

    /// Returns the primitive.
    #[must_use]
    pub fn primitive(&self) -> &P {
        &self.primitive
    }

    /// Returns the primitive mutably.
    ///
    /// Tracking and pausing must still go through the calculator, or its
    /// bookkeeping falls out of sync with the primitive.
    pub fn primitive_mut(&mut self) -> &mut P {
        &mut self.primitive
    }

    /// Installs a trace sink, returning the previous one.
    ///
    /// Without the `trace` feature the sink is dropped immediately.
    pub fn set_trace_sink(
        &mut self,
        sink: Option<Box<dyn OcclusionTraceSink>>,
    ) -> Option<Box<dyn OcclusionTraceSink>> {
        self.tracer.set_sink(sink)
    }

    /// Returns the last computed state of `window`, or
    /// [`Unknown`](OcclusionState::Unknown) if it was never computed or the
    /// window was destroyed.
    #[must_use]
    pub fn occlusion_state(&self, window: WindowId) -> OcclusionState {
        self.occlusion.get(window)
    }

    /// Returns the whole cache.
    #[must_use]
    pub fn occlusion(&self) -> &OcclusionMap {
        &self.occlusion
    }

    /// Returns the number of passes run so far.
    #[must_use]
    pub fn pass_count(&self) -> u64 {
        self.pass_count
    }

    /// Returns the number of windows tracked with the primitive.
    #[must_use]
    pub fn tracked_window_count(&self) -> usize {
        self.tracked.len()
    }

    /// Returns whether `window` is tracked with the primitive.
    #[must_use]
    pub fn is_tracked(&self, window: WindowId) -> bool {
        self.tracked.contains(&window)
    }

    /// Returns the number of watched roots.
    #[must_use]
    pub fn observed_root_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns the number of live observers watching `root`.
    #[must_use]
    pub fn observer_count(&self, root: WindowId) -> usize {
        self.entries.get(&root).map_or(0, |entry| {
            entry
                .observers
                .iter()
                .filter(|weak| weak.strong_count() > 0)
                .count()
        })
    }

    /// Enters a pause scope.
    ///
    /// Passes requested while the guard is alive are coalesced into at most
    /// one pass when the outermost guard is dropped. The guard dereferences
    /// to the calculator, so further operations can be batched through it.
    /// Observers added through the guard are attached after that pass.
    pub fn pause<'a>(&'a mut self, tree: &'a P::Tree) -> ScopedPause<'a, P> {
        self.primitive.pause();
        ScopedPause {
            calculator: self,
            tree,
        }
    }

    /// Starts delivering changes for `roots` and their subtrees to
    /// `observer`.
    ///
    /// All roots are set up inside one pause scope, so however many windows
    /// become tracked, exactly one pass runs. The observer is attached only
    /// after that pass, so it is not told about the initial states. Inside
    /// an outer [`pause`](Self::pause) the attachment waits for the pass
    /// that ends the outermost scope. Dead roots are ignored.
    pub fn add_observer<O: OcclusionObserver + 'static>(
        &mut self,
        tree: &P::Tree,
        roots: &[WindowId],
        observer: &Rc<O>,
    ) {
        let strong: Rc<dyn OcclusionObserver> = Rc::clone(observer) as Rc<dyn OcclusionObserver>;
        let mut paused = self.pause(tree);
        for &root in roots {
            if !tree.is_alive(root) {
                log::debug!("not watching dead root {root}");
                continue;
            }
            paused.ensure_entry(root);
            let added = paused.track_subtree(tree, root);
            log::debug!("watching root {root}, {added} windows newly tracked");
            paused.pending_attach.push((root, Rc::downgrade(&strong)));
        }
    }

    /// Detaches `observer` from every root, releasing roots left without
    /// observers.
    ///
    /// Removing an observer that is not registered is a no-op.
    pub fn remove_observer<O: OcclusionObserver + ?Sized>(
        &mut self,
        tree: &P::Tree,
        observer: &Rc<O>,
    ) {
        let target = Rc::as_ptr(observer).cast::<()>();
        let mut paused = self.pause(tree);
        paused
            .pending_attach
            .retain(|(_, weak)| weak.as_ptr().cast::<()>() != target);
        paused.sweep_entries(tree, Some(target));
    }

    /// Forgets everything about a destroyed window.
    ///
    /// Safe to call more than once, and for windows that were never seen.
    pub fn on_window_destroyed(&mut self, window: WindowId) {
        if self.tracked.remove(&window) {
            self.primitive.window_destroyed(window);
        }
        self.occlusion.remove(window);
        if self.entries.remove(&window).is_some() {
            log::debug!("watched root {window} was destroyed");
            self.tracer.entry(&EntryEvent {
                root: window,
                change: EntryChange::RootDestroyed,
                entries: self.entries.len(),
            });
        }
    }

    /// Applies a batch of tree mutations.
    ///
    /// Destroyed windows are forgotten, windows that appeared under a
    /// watched root start being tracked, and a single pass runs unless a
    /// pause scope is open.
    pub fn on_tree_changed(&mut self, tree: &P::Tree, changes: &TreeChanges) {
        if changes.is_empty() {
            return;
        }
        let mut paused = self.pause(tree);
        for &window in &changes.destroyed {
            paused.on_window_destroyed(window);
        }
        if changes.topology_changed {
            let roots: Vec<WindowId> = paused.entries.keys().copied().collect();
            for root in roots {
                paused.track_subtree(tree, root);
            }
            if paused.config.retention == TrackingRetention::Release {
                paused.release_unobserved(tree);
            }
        }
        paused.primitive.invalidate();
    }

    /// Requests a pass without describing what changed.
    ///
    /// The pass runs immediately unless a pause scope is open.
    pub fn invalidate(&mut self, tree: &P::Tree) {
        let mut paused = self.pause(tree);
        paused.primitive.invalidate();
    }

    /// Erases entries left without live observers, after detaching `target`
    /// if given. Roots with an attachment still pending are kept.
    fn sweep_entries(&mut self, tree: &P::Tree, target: Option<*const ()>) {
        let pending: BTreeSet<WindowId> =
            self.pending_attach.iter().map(|&(root, _)| root).collect();
        let mut released = Vec::new();
        self.entries.retain(|&root, entry| {
            match target {
                Some(target) => entry.remove(target),
                None => entry.prune(),
            }
            if entry.observers.is_empty() && !pending.contains(&root) {
                released.push(root);
                false
            } else {
                true
            }
        });
        for &root in &released {
            log::debug!("root {root} has no observers left");
            self.tracer.entry(&EntryEvent {
                root,
                change: EntryChange::Removed,
                entries: self.entries.len(),
            });
        }
        if !released.is_empty() && self.config.retention == TrackingRetention::Release {
            self.release_unobserved(tree);
        }
    }

    /// Attaches observers queued by [`add_observer`](Self::add_observer).
    fn attach_pending(&mut self) {
        for (root, weak) in core::mem::take(&mut self.pending_attach) {
            let Some(entry) = self.entries.get_mut(&root) else {
                continue;
            };
            entry.prune();
            if weak.strong_count() > 0 && !entry.contains(weak.as_ptr().cast::<()>()) {
                entry.observers.push(weak);
            }
        }
    }

    fn ensure_entry(&mut self, root: WindowId) {
        if self.entries.contains_key(&root) {
            return;
        }
        let force_visible = self.primitive.force_visible(root);
        self.entries.insert(
            root,
            ObservationEntry {
                observers: Vec::new(),
                _force_visible: force_visible,
            },
        );
        self.tracer.entry(&EntryEvent {
            root,
            change: EntryChange::Created,
            entries: self.entries.len(),
        });
    }

    /// Tracks `root` and every descendant not tracked yet. Returns how many
    /// windows were added.
    fn track_subtree(&mut self, tree: &P::Tree, root: WindowId) -> usize {
        let mut added = 0;
        for window in Descendants::new(tree, root) {
            if self.tracked.insert(window) {
                self.primitive.track(window);
                added += 1;
            }
        }
        added
    }

    /// Untracks every window no remaining root contains.
    fn release_unobserved(&mut self, tree: &P::Tree) {
        let entries = &self.entries;
        let stale: Vec<WindowId> = self
            .tracked
            .iter()
            .copied()
            .filter(|&window| !entries.keys().any(|&root| tree.contains(root, window)))
            .collect();
        for &window in &stale {
            self.tracked.remove(&window);
            self.primitive.untrack(window);
            self.occlusion.remove(window);
        }
        if !stale.is_empty() {
            log::debug!("released {} unobserved windows", stale.len());
        }
    }

    fn run_pass(&mut self, tree: &P::Tree) {
        self.pass_count += 1;
        let pass_index = self.pass_count;
        self.tracer.pass_begin(&PassBeginEvent {
            pass_index,
            tracked_windows: self.tracked.len(),
        });

        let mut pending = PendingChanges::new();
        self.primitive.compute(tree, &mut pending);
        let finished = pending.finish();

        let mut flushed = 0;
        let mut skipped = finished.skipped;
        let mut changed = 0;
        for (window, state) in finished.changes {
            if !tree.is_alive(window) {
                skipped += 1;
                continue;
            }
            flushed += 1;
            if self.set_occlusion_state(tree, window, state) {
                changed += 1;
            }
        }

        log::trace!(
            "pass {pass_index}: {} proposals, {flushed} flushed, {skipped} skipped, \
             {changed} changed",
            finished.proposal_count
        );
        self.tracer.pass_end(&PassEndEvent {
            pass_index,
            proposals: finished.proposal_count,
            flushed,
            skipped,
            changed,
        });
    }

    /// Stores a final state and notifies observers if it differs from the
    /// cache. Returns whether it did.
    fn set_occlusion_state(
        &mut self,
        tree: &P::Tree,
        window: WindowId,
        state: OcclusionState,
    ) -> bool {
        let Some(previous) = self.occlusion.update(window, state) else {
            return false;
        };
        log::trace!("window {window}: {previous} -> {state}");
        self.tracer.state_change(&StateChangeEvent {
            pass_index: self.pass_count,
            window,
            previous,
            current: state,
        });

        // Every matching root fires; a window can sit under several.
        for (&root, entry) in &self.entries {
            if !tree.contains(root, window) {
                continue;
            }
            for observer in entry.observers.iter().filter_map(Weak::upgrade) {
                #[cfg(feature = "trace-rich")]
                self.tracer.notify(&crate::trace::NotifyEvent {
                    pass_index: self.pass_count,
                    window,
                    root,
                });
                observer.on_window_occlusion_changed(window, &self.occlusion);
            }
        }
        true
    }
}

/// A pause scope on a [`WindowOcclusionCalculator`].
///
/// Dropping the outermost guard runs one pass if anything requested one
/// while it was alive.
#[must_use = "the pause ends as soon as the guard is dropped"]
pub struct ScopedPause<'a, P: OcclusionPrimitive> {
    calculator: &'a mut WindowOcclusionCalculator<P>,
    tree: &'a P::Tree,
}

impl<P: OcclusionPrimitive> fmt::Debug for ScopedPause<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedPause").finish_non_exhaustive()
    }
}

impl<P: OcclusionPrimitive> Deref for ScopedPause<'_, P> {
    type Target = WindowOcclusionCalculator<P>;

    fn deref(&self) -> &Self::Target {
        self.calculator
    }
}

impl<P: OcclusionPrimitive> DerefMut for ScopedPause<'_, P> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.calculator
    }
}

impl<P: OcclusionPrimitive> Drop for ScopedPause<'_, P> {
    fn drop(&mut self) {
        let calculator = &mut *self.calculator;
        calculator.primitive.unpause();
        if calculator.primitive.is_paused() {
            return;
        }
        calculator.sweep_entries(self.tree, None);
        if calculator.primitive.needs_pass() {
            calculator.run_pass(self.tree);
        }
        calculator.attach_pending();
    }
}
