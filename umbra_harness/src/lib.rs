// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reusable test doubles for driving an umbra occlusion calculator.
//!
//! - [`ScriptedPrimitive`] is an [`OcclusionPrimitive`](umbra_core::occlusion::OcclusionPrimitive)
//!   that proposes whatever the test tells it to and counts every call it
//!   receives, so batching and tracking can be asserted directly.
//! - [`RecordingObserver`] logs each notification together with the cached
//!   state it could read at callback time.
//!
//! ```
//! use std::rc::Rc;
//!
//! use umbra_core::kurbo::Rect;
//! use umbra_core::occlusion::{OcclusionState, WindowOcclusionCalculator};
//! use umbra_core::window::WindowStore;
//! use umbra_harness::{RecordingObserver, ScriptedPrimitive};
//!
//! let mut store = WindowStore::new();
//! let root = store.create_window(Rect::new(0.0, 0.0, 10.0, 10.0));
//!
//! let mut calc = WindowOcclusionCalculator::new(ScriptedPrimitive::<WindowStore>::new());
//! let observer = Rc::new(RecordingObserver::new());
//! calc.add_observer(&store, &[root], &observer);
//!
//! calc.primitive_mut().set_state(root, OcclusionState::Occluded);
//! calc.invalidate(&store);
//! assert_eq!(observer.count_for(root), 1);
//! ```

#![no_std]

extern crate alloc;

mod observer;
mod primitive;

pub use observer::{Notification, RecordingObserver};
pub use primitive::{PrimitiveCounters, ScriptedForceVisible, ScriptedPrimitive, Step};

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec;
    use umbra_core::kurbo::Rect;
    use umbra_core::occlusion::{OcclusionState, WindowOcclusionCalculator};
    use umbra_core::window::{WindowId, WindowStore};

    type Calculator = WindowOcclusionCalculator<ScriptedPrimitive<WindowStore>>;

    fn window(store: &mut WindowStore, parent: Option<WindowId>) -> WindowId {
        let w = store.create_window(Rect::new(0.0, 0.0, 10.0, 10.0));
        if let Some(parent) = parent {
            store.add_child(parent, w);
        }
        w
    }

    fn set(calc: &mut Calculator, store: &WindowStore, w: WindowId, state: OcclusionState) {
        calc.primitive_mut().set_state(w, state);
        calc.invalidate(store);
    }

    // ---------------------------------------------------------------------------
    // Batching and tracking
    // ---------------------------------------------------------------------------

    #[test]
    fn observing_many_roots_runs_one_pass() {
        let mut store = WindowStore::new();
        let a = window(&mut store, None);
        let b = window(&mut store, None);
        let c = window(&mut store, None);
        let child = window(&mut store, Some(b));
        store.evaluate();

        let mut calc = Calculator::new(ScriptedPrimitive::new());
        let observer = Rc::new(RecordingObserver::new());
        calc.add_observer(&store, &[a, b, c], &observer);

        let counters = calc.primitive().counters();
        assert_eq!(counters.passes, 1);
        assert_eq!(counters.pause, 1);
        assert_eq!(counters.unpause, 1);
        assert_eq!(counters.track, 4);
        assert!(calc.primitive().is_tracked(child));
        assert_eq!(calc.primitive().forced_roots(), 3);
    }

    #[test]
    fn removing_an_observer_runs_one_pass() {
        let mut store = WindowStore::new();
        let a = window(&mut store, None);
        let b = window(&mut store, None);

        let mut calc = Calculator::new(ScriptedPrimitive::new());
        let observer = Rc::new(RecordingObserver::new());
        calc.add_observer(&store, &[a, b], &observer);
        let before = calc.primitive().counters().passes;

        calc.remove_observer(&store, &observer);

        assert_eq!(calc.primitive().counters().passes, before + 1);
        assert_eq!(calc.primitive().forced_roots(), 0);
        assert_eq!(calc.observed_root_count(), 0);
    }

    #[test]
    fn explicit_pause_coalesces_invalidations() {
        let mut store = WindowStore::new();
        let root = window(&mut store, None);

        let mut calc = Calculator::new(ScriptedPrimitive::new());
        let observer = Rc::new(RecordingObserver::new());
        calc.add_observer(&store, &[root], &observer);
        let before = calc.primitive().counters().passes;

        {
            let mut paused = calc.pause(&store);
            paused.primitive_mut().set_state(root, OcclusionState::Visible);
            paused.invalidate(&store);
            paused.primitive_mut().set_state(root, OcclusionState::Occluded);
            paused.invalidate(&store);
            assert_eq!(paused.primitive().counters().passes, before);
        }

        assert_eq!(calc.primitive().counters().passes, before + 1);
        assert_eq!(observer.take(), vec![Notification {
            window: root,
            state: OcclusionState::Occluded,
        }]);
    }

    // ---------------------------------------------------------------------------
    // Notification properties
    // ---------------------------------------------------------------------------

    #[test]
    fn unknown_until_computed() {
        let mut store = WindowStore::new();
        let root = window(&mut store, None);
        let stranger = window(&mut store, None);

        let mut calc = Calculator::new(ScriptedPrimitive::new());
        assert_eq!(calc.occlusion_state(root), OcclusionState::Unknown);

        let observer = Rc::new(RecordingObserver::new());
        calc.add_observer(&store, &[root], &observer);
        assert_eq!(calc.occlusion_state(root), OcclusionState::Unknown);
        assert_eq!(calc.occlusion_state(stranger), OcclusionState::Unknown);
    }

    #[test]
    fn initial_states_are_not_notified() {
        let mut store = WindowStore::new();
        let root = window(&mut store, None);
        let child = window(&mut store, Some(root));

        let mut calc = Calculator::new(ScriptedPrimitive::new());
        calc.primitive_mut().set_state(root, OcclusionState::Visible);
        calc.primitive_mut().set_state(child, OcclusionState::Occluded);

        let observer = Rc::new(RecordingObserver::new());
        calc.add_observer(&store, &[root], &observer);

        assert!(observer.is_empty());
        assert_eq!(calc.occlusion_state(root), OcclusionState::Visible);
        assert_eq!(calc.occlusion_state(child), OcclusionState::Occluded);
    }

    #[test]
    fn observers_added_under_an_outer_pause_skip_initial_states() {
        let mut store = WindowStore::new();
        let root = window(&mut store, None);
        let child = window(&mut store, Some(root));

        let mut calc = Calculator::new(ScriptedPrimitive::new());
        calc.primitive_mut().set_state(root, OcclusionState::Visible);
        calc.primitive_mut().set_state(child, OcclusionState::Occluded);

        let observer = Rc::new(RecordingObserver::new());
        {
            let mut paused = calc.pause(&store);
            paused.add_observer(&store, &[root], &observer);
            assert_eq!(paused.primitive().counters().passes, 0);
        }

        assert_eq!(calc.primitive().counters().passes, 1);
        assert!(observer.is_empty());
        assert_eq!(calc.occlusion_state(child), OcclusionState::Occluded);

        set(&mut calc, &store, child, OcclusionState::Visible);
        assert_eq!(observer.take(), vec![Notification {
            window: child,
            state: OcclusionState::Visible,
        }]);
    }

    #[test]
    fn dropped_observers_release_their_roots_on_the_next_pass() {
        let mut store = WindowStore::new();
        let root = window(&mut store, None);

        let mut calc = Calculator::new(ScriptedPrimitive::new());
        let observer = Rc::new(RecordingObserver::new());
        calc.add_observer(&store, &[root], &observer);
        assert_eq!(calc.primitive().forced_roots(), 1);

        drop(observer);
        calc.invalidate(&store);

        assert_eq!(calc.observed_root_count(), 0);
        assert_eq!(calc.primitive().forced_roots(), 0);
    }

    #[test]
    fn unchanged_states_are_not_renotified() {
        let mut store = WindowStore::new();
        let root = window(&mut store, None);

        let mut calc = Calculator::new(ScriptedPrimitive::new());
        let observer = Rc::new(RecordingObserver::new());
        calc.add_observer(&store, &[root], &observer);

        set(&mut calc, &store, root, OcclusionState::Hidden);
        set(&mut calc, &store, root, OcclusionState::Hidden);
        calc.invalidate(&store);

        assert_eq!(observer.count_for(root), 1);
    }

    #[test]
    fn only_the_final_proposal_of_a_pass_is_applied() {
        let mut store = WindowStore::new();
        let root = window(&mut store, None);

        let mut calc = Calculator::new(ScriptedPrimitive::new());
        let observer = Rc::new(RecordingObserver::new());
        calc.add_observer(&store, &[root], &observer);

        calc.primitive_mut().push_script([
            Step::Propose(root, OcclusionState::Occluded),
            Step::Propose(root, OcclusionState::Hidden),
            Step::Propose(root, OcclusionState::Visible),
        ]);
        calc.invalidate(&store);

        assert_eq!(observer.take(), vec![Notification {
            window: root,
            state: OcclusionState::Visible,
        }]);
    }

    #[test]
    fn windows_destroyed_mid_pass_are_skipped() {
        let mut store = WindowStore::new();
        let root = window(&mut store, None);
        let child = window(&mut store, Some(root));

        let mut calc = Calculator::new(ScriptedPrimitive::new());
        let observer = Rc::new(RecordingObserver::new());
        calc.add_observer(&store, &[root], &observer);

        calc.primitive_mut().push_script([
            Step::Propose(child, OcclusionState::Visible),
            Step::Propose(root, OcclusionState::Visible),
            Step::Destroy(child),
        ]);
        calc.invalidate(&store);

        assert_eq!(calc.occlusion_state(child), OcclusionState::Unknown);
        assert_eq!(observer.count_for(child), 0);
        assert_eq!(observer.count_for(root), 1);
    }

    #[test]
    fn notifications_are_scoped_to_the_watched_subtree() {
        let mut store = WindowStore::new();
        let left = window(&mut store, None);
        let left_child = window(&mut store, Some(left));
        let right = window(&mut store, None);
        let right_child = window(&mut store, Some(right));

        let mut calc = Calculator::new(ScriptedPrimitive::new());
        let left_observer = Rc::new(RecordingObserver::new());
        let right_observer = Rc::new(RecordingObserver::new());
        calc.add_observer(&store, &[left], &left_observer);
        calc.add_observer(&store, &[right], &right_observer);

        set(&mut calc, &store, left_child, OcclusionState::Occluded);
        assert_eq!(left_observer.count_for(left_child), 1);
        assert!(right_observer.is_empty());

        set(&mut calc, &store, right_child, OcclusionState::Hidden);
        assert_eq!(right_observer.count_for(right_child), 1);
        assert_eq!(left_observer.len(), 1);
    }

    #[test]
    fn nested_roots_notify_every_enclosing_observer() {
        let mut store = WindowStore::new();
        let outer = window(&mut store, None);
        let inner = window(&mut store, Some(outer));
        let leaf = window(&mut store, Some(inner));

        let mut calc = Calculator::new(ScriptedPrimitive::new());
        let outer_observer = Rc::new(RecordingObserver::new());
        let inner_observer = Rc::new(RecordingObserver::new());
        calc.add_observer(&store, &[outer], &outer_observer);
        calc.add_observer(&store, &[inner], &inner_observer);

        set(&mut calc, &store, leaf, OcclusionState::Visible);
        assert_eq!(outer_observer.count_for(leaf), 1);
        assert_eq!(inner_observer.count_for(leaf), 1);

        set(&mut calc, &store, outer, OcclusionState::Visible);
        assert_eq!(outer_observer.count_for(outer), 1);
        assert_eq!(inner_observer.count_for(outer), 0);
    }

    #[test]
    fn destruction_resets_state_to_unknown() {
        let mut store = WindowStore::new();
        let root = window(&mut store, None);
        let child = window(&mut store, Some(root));

        let mut calc = Calculator::new(ScriptedPrimitive::new());
        let observer = Rc::new(RecordingObserver::new());
        calc.add_observer(&store, &[root], &observer);
        set(&mut calc, &store, child, OcclusionState::Visible);

        store.destroy_window(child);
        let changes = store.evaluate();
        calc.on_tree_changed(&store, &changes);

        assert_eq!(calc.occlusion_state(child), OcclusionState::Unknown);
        assert!(!calc.is_tracked(child));
        assert_eq!(calc.primitive().counters().destroyed, 1);
    }

    // ---------------------------------------------------------------------------
    // End to end
    // ---------------------------------------------------------------------------

    #[test]
    fn root_and_child_lifecycle() {
        let mut store = WindowStore::new();
        let r = window(&mut store, None);
        let c = window(&mut store, Some(r));
        store.evaluate();

        let mut calc = Calculator::new(ScriptedPrimitive::new());
        let observer = Rc::new(RecordingObserver::new());
        calc.add_observer(&store, &[r], &observer);
        assert!(observer.is_empty());

        set(&mut calc, &store, c, OcclusionState::Visible);
        assert_eq!(observer.take(), vec![Notification {
            window: c,
            state: OcclusionState::Visible,
        }]);
        assert_eq!(calc.occlusion_state(c), OcclusionState::Visible);

        calc.invalidate(&store);
        assert!(observer.is_empty());

        set(&mut calc, &store, c, OcclusionState::Occluded);
        assert_eq!(observer.take(), vec![Notification {
            window: c,
            state: OcclusionState::Occluded,
        }]);
        assert_eq!(calc.occlusion_state(c), OcclusionState::Occluded);

        store.destroy_window(c);
        let changes = store.evaluate();
        calc.on_tree_changed(&store, &changes);
        assert_eq!(calc.occlusion_state(c), OcclusionState::Unknown);
        assert_eq!(calc.occlusion_state(c), OcclusionState::Unknown);
        assert!(observer.is_empty());
    }
}
