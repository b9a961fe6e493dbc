// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An observer that records every notification it receives.

use alloc::vec::Vec;
use core::cell::RefCell;

use umbra_core::occlusion::{OcclusionMap, OcclusionObserver, OcclusionState};
use umbra_core::window::WindowId;

/// One delivered notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Notification {
    /// The window whose state changed.
    pub window: WindowId,
    /// The cached state read back from inside the callback.
    pub state: OcclusionState,
}

/// Records notifications in delivery order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    seen: RefCell<Vec<Notification>>,
}

impl RecordingObserver {
    /// Creates an observer with an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of notifications recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.borrow().len()
    }

    /// Returns whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.borrow().is_empty()
    }

    /// Returns how many notifications named `window`.
    #[must_use]
    pub fn count_for(&self, window: WindowId) -> usize {
        self.seen
            .borrow()
            .iter()
            .filter(|n| n.window == window)
            .count()
    }

    /// Drains the log.
    pub fn take(&self) -> Vec<Notification> {
        core::mem::take(&mut *self.seen.borrow_mut())
    }
}

impl OcclusionObserver for RecordingObserver {
    fn on_window_occlusion_changed(&self, window: WindowId, occlusion: &OcclusionMap) {
        self.seen.borrow_mut().push(Notification {
            window,
            state: occlusion.get(window),
        });
    }
}
