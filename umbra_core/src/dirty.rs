// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! The window store uses multi-channel dirty tracking (via
//! [`understory_dirty`]) to record which windows were touched since the last
//! [`WindowStore::evaluate`](crate::window::WindowStore::evaluate). Each
//! channel represents an independent category of change.
//!
//! # Propagation semantics
//!
//! - **Propagating**: [`GEOMETRY`] and [`VISIBILITY`] use
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) and have dependency
//!   edges from child to parent. Moving or hiding a window changes the
//!   screen rectangle or effective visibility of every descendant, so the
//!   whole subtree is reported.
//!
//! - **Local-only**: [`STACKING`] is marked on the parent whose child order
//!   changed. Only that parent is reported.
//!
//! - **Structural**: [`TOPOLOGY`] is marked on topology mutations
//!   (add/remove child, create/destroy window).
//!
//! # Consumption
//!
//! Hosts never query dirty state directly. `evaluate` drains all channels
//! into [`TreeChanges`](crate::window::TreeChanges), which the occlusion
//! calculator consumes in
//! [`on_tree_changed`](crate::occlusion::WindowOcclusionCalculator::on_tree_changed).

use understory_dirty::Channel;

/// Bounds changed; descendants' screen rectangles change with it.
pub const GEOMETRY: Channel = Channel::new(0);

/// Shown/hidden or opacity flag changed; inherited by descendants.
pub const VISIBILITY: Channel = Channel::new(1);

/// Child stacking order changed on the marked parent.
pub const STACKING: Channel = Channel::new(2);

/// Tree topology changed.
pub const TOPOLOGY: Channel = Channel::new(3);
