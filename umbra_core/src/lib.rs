// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Window occlusion tracking with batched recomputation and deduplicated
//! change notification.
//!
//! `umbra_core` keeps the last known occlusion state of every watched window
//! and tells interested observers only when a state really changes. It is
//! `no_std` compatible (with `alloc`) and single-threaded.
//!
//! # Architecture
//!
//! ```text
//!   WindowStore mutations
//!       │
//!       ▼
//!   WindowStore::evaluate() ──► TreeChanges
//!                                   │
//!                                   ▼
//!   WindowOcclusionCalculator::on_tree_changed()
//!       │
//!       ▼
//!   OcclusionPrimitive::compute() ──► PendingChanges ──► finish()
//!                                                          │
//!                 ┌────────────────────────────────────────┘
//!                 ▼
//!   OcclusionMap diff ──► OcclusionObserver::on_window_occlusion_changed()
//! ```
//!
//! **[`window`]**: Struct-of-arrays window tree with generational handles,
//! plus the [`WindowTree`](window::WindowTree) and
//! [`WindowGeometry`](window::WindowGeometry) traits the engine reads
//! through. Hosts with their own window system implement the traits instead
//! of using [`WindowStore`](window::WindowStore).
//!
//! **[`dirty`]**: Multi-channel dirty tracking via `understory_dirty`.
//! GEOMETRY and VISIBILITY propagate to descendants; STACKING is local to the
//! parent; TOPOLOGY records structural edits.
//!
//! **[`occlusion`]**: The calculator, its observer registry, the per-pass
//! change builder, and the rectangle-based
//! [`OcclusionTracker`](occlusion::OcclusionTracker).
//!
//! **[`trace`]**: [`OcclusionTraceSink`](trace::OcclusionTraceSink) trait
//! and event types for pass instrumentation, with a zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! The engine also emits [`log`] records: registry changes at `debug`,
//! per-window transitions at `trace`.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-observer
//!   notification events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub use kurbo;

pub mod dirty;
pub mod occlusion;
pub mod trace;
pub mod window;
