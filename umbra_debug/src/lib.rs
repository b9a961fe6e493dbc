// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for umbra
//! occlusion diagnostics.
//!
//! This crate provides
//! [`OcclusionTraceSink`](umbra_core::trace::OcclusionTraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from recorded
//!   bytes.
//!
//! Install a sink with
//! [`WindowOcclusionCalculator::set_trace_sink`](umbra_core::occlusion::WindowOcclusionCalculator::set_trace_sink);
//! wrap it in `Rc<RefCell<_>>` to keep access to it afterwards.

pub mod chrome;
pub mod pretty;
pub mod recorder;
