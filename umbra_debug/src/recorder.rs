// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`OcclusionTraceSink`] and encodes events into
//! a `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them
//! back as an iterator of [`RecordedEvent`].
//!
//! Window handles are stored as their slot index followed by their
//! generation, both `u32`.

use umbra_core::occlusion::OcclusionState;
use umbra_core::trace::{
    EntryChange, EntryEvent, NotifyEvent, OcclusionTraceSink, PassBeginEvent, PassEndEvent,
    StateChangeEvent,
};
use umbra_core::window::WindowId;

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_PASS_BEGIN: u8 = 1;
const TAG_PASS_END: u8 = 2;
const TAG_STATE_CHANGE: u8 = 3;
const TAG_ENTRY: u8 = 4;
const TAG_NOTIFY: u8 = 5;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// An [`OcclusionTraceSink`] that encodes events into a compact binary
/// buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_count(&mut self, v: usize) {
        self.write_u64(v as u64);
    }

    fn write_window(&mut self, w: WindowId) {
        self.write_u32(w.index());
        self.write_u32(w.generation());
    }

    fn write_state(&mut self, s: OcclusionState) {
        self.write_u8(match s {
            OcclusionState::Unknown => 0,
            OcclusionState::Visible => 1,
            OcclusionState::Occluded => 2,
            OcclusionState::Hidden => 3,
        });
    }

    fn write_entry_change(&mut self, c: EntryChange) {
        self.write_u8(match c {
            EntryChange::Created => 0,
            EntryChange::Removed => 1,
            EntryChange::RootDestroyed => 2,
        });
    }
}

impl OcclusionTraceSink for RecorderSink {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        self.write_u8(TAG_PASS_BEGIN);
        self.write_u64(e.pass_index);
        self.write_count(e.tracked_windows);
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        self.write_u8(TAG_PASS_END);
        self.write_u64(e.pass_index);
        self.write_count(e.proposals);
        self.write_count(e.flushed);
        self.write_count(e.skipped);
        self.write_count(e.changed);
    }

    fn on_state_change(&mut self, e: &StateChangeEvent) {
        self.write_u8(TAG_STATE_CHANGE);
        self.write_u64(e.pass_index);
        self.write_window(e.window);
        self.write_state(e.previous);
        self.write_state(e.current);
    }

    fn on_entry(&mut self, e: &EntryEvent) {
        self.write_u8(TAG_ENTRY);
        self.write_window(e.root);
        self.write_entry_change(e.change);
        self.write_count(e.entries);
    }

    fn on_notify(&mut self, e: &NotifyEvent) {
        self.write_u8(TAG_NOTIFY);
        self.write_u64(e.pass_index);
        self.write_window(e.window);
        self.write_window(e.root);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded trace event.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`PassBeginEvent`].
    PassBegin(PassBeginEvent),
    /// A [`PassEndEvent`].
    PassEnd(PassEndEvent),
    /// A [`StateChangeEvent`].
    StateChange(StateChangeEvent),
    /// An [`EntryEvent`].
    Entry(EntryEvent),
    /// A [`NotifyEvent`].
    Notify(NotifyEvent),
}

/// Returns an iterator that decodes events from recorded bytes.
///
/// Iteration stops at the first truncated record or unrecognized byte in a
/// tag or discriminant position.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over recorded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_count(&mut self) -> Option<usize> {
        usize::try_from(self.read_u64()?).ok()
    }

    fn read_window(&mut self) -> Option<WindowId> {
        let idx = self.read_u32()?;
        let generation = self.read_u32()?;
        Some(WindowId::from_raw_parts(idx, generation))
    }

    fn read_state(&mut self) -> Option<OcclusionState> {
        match self.read_u8()? {
            0 => Some(OcclusionState::Unknown),
            1 => Some(OcclusionState::Visible),
            2 => Some(OcclusionState::Occluded),
            3 => Some(OcclusionState::Hidden),
            _ => None,
        }
    }

    fn read_entry_change(&mut self) -> Option<EntryChange> {
        match self.read_u8()? {
            0 => Some(EntryChange::Created),
            1 => Some(EntryChange::Removed),
            2 => Some(EntryChange::RootDestroyed),
            _ => None,
        }
    }

    fn decode_pass_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PassBegin(PassBeginEvent {
            pass_index: self.read_u64()?,
            tracked_windows: self.read_count()?,
        }))
    }

    fn decode_pass_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PassEnd(PassEndEvent {
            pass_index: self.read_u64()?,
            proposals: self.read_count()?,
            flushed: self.read_count()?,
            skipped: self.read_count()?,
            changed: self.read_count()?,
        }))
    }

    fn decode_state_change(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::StateChange(StateChangeEvent {
            pass_index: self.read_u64()?,
            window: self.read_window()?,
            previous: self.read_state()?,
            current: self.read_state()?,
        }))
    }

    fn decode_entry(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Entry(EntryEvent {
            root: self.read_window()?,
            change: self.read_entry_change()?,
            entries: self.read_count()?,
        }))
    }

    fn decode_notify(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Notify(NotifyEvent {
            pass_index: self.read_u64()?,
            window: self.read_window()?,
            root: self.read_window()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_PASS_BEGIN => self.decode_pass_begin(),
            TAG_PASS_END => self.decode_pass_end(),
            TAG_STATE_CHANGE => self.decode_state_change(),
            TAG_ENTRY => self.decode_entry(),
            TAG_NOTIFY => self.decode_notify(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
