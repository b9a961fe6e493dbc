// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Occlusion state tracking and change notification.
//!
//! - [`WindowOcclusionCalculator`] caches one [`OcclusionState`] per window,
//!   batches recomputation, and notifies [`OcclusionObserver`]s of the roots
//!   whose subtree changed.
//! - [`OcclusionPrimitive`] is the computation it drives;
//!   [`OcclusionTracker`] is the bundled rectangle-based implementation.
//! - [`PendingChanges`] collects one pass's proposals and yields only the
//!   final value of each window still alive.

mod builder;
mod calculator;
mod primitive;
mod state;
mod tracker;

pub use builder::{ChangeBuilder, FinishedChanges, PendingChanges};
pub use calculator::{
    CalculatorConfig, OcclusionObserver, ScopedPause, TrackingRetention,
    WindowOcclusionCalculator,
};
pub use primitive::OcclusionPrimitive;
pub use state::{OcclusionMap, OcclusionState};
pub use tracker::{ForcedVisible, OcclusionTracker, TrackerConfig};
