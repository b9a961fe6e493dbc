// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for occlusion passes.
//!
//! This module provides an [`OcclusionTraceSink`] trait with per-event
//! methods that the calculator calls as it runs passes and maintains its
//! registry. All method bodies default to no-ops, so implementing only the
//! events you care about is fine.
//!
//! [`Tracer`] owns an optional boxed sink. When the `trace` feature is
//! **off**, every `Tracer` method compiles to nothing and installed sinks are
//! dropped immediately. When **on**, each method performs a single `Option`
//! branch before dispatching.
//!
//! A sink shared as `Rc<RefCell<S>>` is itself a sink, so a host can install
//! a clone and read the recorded data back later.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates [`NotifyEvent`] and the
//!   corresponding `OcclusionTraceSink` method.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::RefCell;

use crate::occlusion::OcclusionState;
use crate::window::WindowId;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// What happened to an observation entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryChange {
    /// A root started being watched.
    Created,
    /// The last observer of a root was removed.
    Removed,
    /// The watched root was destroyed.
    RootDestroyed,
}

impl EntryChange {
    /// Returns a short lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Removed => "removed",
            Self::RootDestroyed => "root-destroyed",
        }
    }
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted before the primitive starts a recomputation pass.
#[derive(Clone, Copy, Debug)]
pub struct PassBeginEvent {
    /// Monotonic pass counter, starting at 1.
    pub pass_index: u64,
    /// Number of windows the calculator tracks.
    pub tracked_windows: usize,
}

/// Emitted after a pass has been flushed into the cache.
#[derive(Clone, Copy, Debug)]
pub struct PassEndEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// Raw proposals made by the primitive, including overwritten ones.
    pub proposals: usize,
    /// Final values handed to the cache.
    pub flushed: usize,
    /// Windows dropped because they died before the pass ended.
    pub skipped: usize,
    /// Flushed values that differed from the cache.
    pub changed: usize,
}

/// Emitted when a window's cached state changes.
#[derive(Clone, Copy, Debug)]
pub struct StateChangeEvent {
    /// Pass that produced the change.
    pub pass_index: u64,
    /// The window.
    pub window: WindowId,
    /// Cached state before the change.
    pub previous: OcclusionState,
    /// Cached state after the change.
    pub current: OcclusionState,
}

/// Emitted when an observation entry is created or erased.
#[derive(Clone, Copy, Debug)]
pub struct EntryEvent {
    /// The watched root.
    pub root: WindowId,
    /// What happened.
    pub change: EntryChange,
    /// Number of entries after the change.
    pub entries: usize,
}

/// Emitted once per observer callback.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct NotifyEvent {
    /// Pass that produced the change.
    pub pass_index: u64,
    /// The window whose state changed.
    pub window: WindowId,
    /// The root of the entry the observer is attached to.
    pub root: WindowId,
}

// ---------------------------------------------------------------------------
// OcclusionTraceSink trait
// ---------------------------------------------------------------------------

/// Receives occlusion trace events.
///
/// All methods default to no-ops.
pub trait OcclusionTraceSink {
    /// Called before a pass starts.
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        _ = e;
    }

    /// Called after a pass has been flushed.
    fn on_pass_end(&mut self, e: &PassEndEvent) {
        _ = e;
    }

    /// Called for every real state transition.
    fn on_state_change(&mut self, e: &StateChangeEvent) {
        _ = e;
    }

    /// Called when an observation entry is created or erased.
    fn on_entry(&mut self, e: &EntryEvent) {
        _ = e;
    }

    /// Called before each observer callback.
    #[cfg(feature = "trace-rich")]
    fn on_notify(&mut self, e: &NotifyEvent) {
        _ = e;
    }
}

impl<S: OcclusionTraceSink + ?Sized> OcclusionTraceSink for Rc<RefCell<S>> {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        self.borrow_mut().on_pass_begin(e);
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        self.borrow_mut().on_pass_end(e);
    }

    fn on_state_change(&mut self, e: &StateChangeEvent) {
        self.borrow_mut().on_state_change(e);
    }

    fn on_entry(&mut self, e: &EntryEvent) {
        self.borrow_mut().on_entry(e);
    }

    #[cfg(feature = "trace-rich")]
    fn on_notify(&mut self, e: &NotifyEvent) {
        self.borrow_mut().on_notify(e);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A sink that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl OcclusionTraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Zero-cost wrapper around an optional sink.
///
/// With the `trace` feature off this is an empty struct and every method is
/// a no-op.
#[derive(Default)]
pub struct Tracer {
    #[cfg(feature = "trace")]
    sink: Option<Box<dyn OcclusionTraceSink>>,
}

impl core::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer")
            .field("active", &self.is_active())
            .finish()
    }
}

impl Tracer {
    /// Creates a tracer dispatching to `sink`.
    #[inline]
    #[must_use]
    pub fn new(sink: Box<dyn OcclusionTraceSink>) -> Self {
        let mut tracer = Self::none();
        tracer.set_sink(Some(sink));
        tracer
    }

    /// Creates a tracer with no sink.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Replaces the sink, returning the previous one.
    pub fn set_sink(
        &mut self,
        sink: Option<Box<dyn OcclusionTraceSink>>,
    ) -> Option<Box<dyn OcclusionTraceSink>> {
        #[cfg(feature = "trace")]
        {
            core::mem::replace(&mut self.sink, sink)
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            None
        }
    }

    /// Returns whether events reach a sink.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        #[cfg(feature = "trace")]
        {
            self.sink.is_some()
        }
        #[cfg(not(feature = "trace"))]
        {
            false
        }
    }

    /// Dispatches [`OcclusionTraceSink::on_pass_begin`].
    #[inline]
    pub fn pass_begin(&mut self, e: &PassBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pass_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Dispatches [`OcclusionTraceSink::on_pass_end`].
    #[inline]
    pub fn pass_end(&mut self, e: &PassEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pass_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Dispatches [`OcclusionTraceSink::on_state_change`].
    #[inline]
    pub fn state_change(&mut self, e: &StateChangeEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_state_change(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Dispatches [`OcclusionTraceSink::on_entry`].
    #[inline]
    pub fn entry(&mut self, e: &EntryEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_entry(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Dispatches [`OcclusionTraceSink::on_notify`].
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn notify(&mut self, e: &NotifyEvent) {
        if let Some(s) = &mut self.sink {
            s.on_notify(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    #[derive(Default)]
    struct CountingSink {
        begins: Vec<u64>,
        changes: usize,
        entries: Vec<EntryChange>,
    }

    impl OcclusionTraceSink for CountingSink {
        fn on_pass_begin(&mut self, e: &PassBeginEvent) {
            self.begins.push(e.pass_index);
        }

        fn on_state_change(&mut self, _e: &StateChangeEvent) {
            self.changes += 1;
        }

        fn on_entry(&mut self, e: &EntryEvent) {
            self.entries.push(e.change);
        }
    }

    fn w(idx: u32) -> WindowId {
        WindowId::from_raw_parts(idx, 0)
    }

    #[test]
    fn noop_sink_accepts_everything() {
        let mut sink = NoopSink;
        sink.on_pass_begin(&PassBeginEvent {
            pass_index: 1,
            tracked_windows: 0,
        });
        sink.on_pass_end(&PassEndEvent {
            pass_index: 1,
            proposals: 0,
            flushed: 0,
            skipped: 0,
            changed: 0,
        });
    }

    #[test]
    fn none_tracer_is_inactive() {
        let mut tracer = Tracer::none();
        assert!(!tracer.is_active());
        tracer.pass_begin(&PassBeginEvent {
            pass_index: 1,
            tracked_windows: 3,
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn shared_sink_receives_events() {
        let shared = Rc::new(RefCell::new(CountingSink::default()));
        let mut tracer = Tracer::new(Box::new(Rc::clone(&shared)));
        assert!(tracer.is_active());

        tracer.pass_begin(&PassBeginEvent {
            pass_index: 4,
            tracked_windows: 2,
        });
        tracer.state_change(&StateChangeEvent {
            pass_index: 4,
            window: w(1),
            previous: OcclusionState::Unknown,
            current: OcclusionState::Visible,
        });
        tracer.entry(&EntryEvent {
            root: w(0),
            change: EntryChange::Created,
            entries: 1,
        });

        let sink = shared.borrow();
        assert_eq!(sink.begins, &[4]);
        assert_eq!(sink.changes, 1);
        assert_eq!(sink.entries, &[EntryChange::Created]);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn set_sink_returns_previous() {
        let mut tracer = Tracer::new(Box::new(NoopSink));
        assert!(tracer.set_sink(None).is_some());
        assert!(!tracer.is_active());
    }

    #[cfg(not(feature = "trace"))]
    #[test]
    fn sinks_are_dropped_without_trace_feature() {
        let shared = Rc::new(RefCell::new(CountingSink::default()));
        let mut tracer = Tracer::new(Box::new(Rc::clone(&shared)));
        assert!(!tracer.is_active());
        tracer.entry(&EntryEvent {
            root: w(0),
            change: EntryChange::Removed,
            entries: 0,
        });
        assert!(shared.borrow().entries.is_empty());
        assert_eq!(Rc::strong_count(&shared), 1);
    }
}
