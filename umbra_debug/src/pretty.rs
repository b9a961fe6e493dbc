// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`OcclusionTraceSink`] and writes one line
//! per event to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use umbra_core::trace::{
    EntryEvent, NotifyEvent, OcclusionTraceSink, PassBeginEvent, PassEndEvent, StateChangeEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    notifications: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("notifications", &self.notifications)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::with_writer(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            notifications: true,
        }
    }

    /// Sets whether per-observer notification lines are written.
    ///
    /// They dominate the output when many observers watch nested roots.
    #[must_use]
    pub fn notifications(mut self, enabled: bool) -> Self {
        self.notifications = enabled;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<W: Write> OcclusionTraceSink for PrettyPrintSink<W> {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[pass:begin] pass={} tracked={}",
            e.pass_index, e.tracked_windows,
        );
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        let _ = writeln!(
            self.writer,
            "[pass:end] pass={} proposals={} flushed={} skipped={} changed={}",
            e.pass_index, e.proposals, e.flushed, e.skipped, e.changed,
        );
    }

    fn on_state_change(&mut self, e: &StateChangeEvent) {
        let _ = writeln!(
            self.writer,
            "[state] pass={} window={} {} -> {}",
            e.pass_index, e.window, e.previous, e.current,
        );
    }

    fn on_entry(&mut self, e: &EntryEvent) {
        let _ = writeln!(
            self.writer,
            "[entry] root={} {} entries={}",
            e.root,
            e.change.as_str(),
            e.entries,
        );
    }

    fn on_notify(&mut self, e: &NotifyEvent) {
        if !self.notifications {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[notify] pass={} window={} root={}",
            e.pass_index, e.window, e.root,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::occlusion::OcclusionState;
    use umbra_core::trace::EntryChange;
    use umbra_core::window::WindowId;

    #[test]
    fn pretty_print_state_change() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_state_change(&StateChangeEvent {
            pass_index: 3,
            window: WindowId::from_raw_parts(4, 1),
            previous: OcclusionState::Visible,
            current: OcclusionState::Hidden,
        });
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert!(output.contains("[state]"), "got: {output}");
        assert!(output.contains("pass=3"), "got: {output}");
        assert!(output.contains("visible -> hidden"), "got: {output}");
    }

    #[test]
    fn notifications_can_be_muted() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new()).notifications(false);
        let root = WindowId::from_raw_parts(0, 0);
        sink.on_notify(&NotifyEvent {
            pass_index: 1,
            window: WindowId::from_raw_parts(1, 0),
            root,
        });
        sink.on_entry(&EntryEvent {
            root,
            change: EntryChange::Removed,
            entries: 0,
        });
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert!(!output.contains("[notify]"), "got: {output}");
        assert!(output.contains("removed"), "got: {output}");
    }
}
