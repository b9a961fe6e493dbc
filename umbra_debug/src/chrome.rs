// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Occlusion events carry no timestamps, so each event's `ts` is its position
//! in the recording (one microsecond per event). Passes become duration
//! slices; everything else is an instant event inside them.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for (seq, recorded) in decode(bytes).enumerate() {
        let ts = seq as u64;
        match recorded {
            RecordedEvent::PassBegin(e) => {
                events.push(json!({
                    "ph": "B",
                    "name": "Pass",
                    "cat": "Occlusion",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "pass_index": e.pass_index,
                        "tracked_windows": e.tracked_windows,
                    }
                }));
            }
            RecordedEvent::PassEnd(e) => {
                events.push(json!({
                    "ph": "E",
                    "name": "Pass",
                    "cat": "Occlusion",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "pass_index": e.pass_index,
                        "proposals": e.proposals,
                        "flushed": e.flushed,
                        "skipped": e.skipped,
                        "changed": e.changed,
                    }
                }));
            }
            RecordedEvent::StateChange(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "StateChange",
                    "cat": "Occlusion",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "pass_index": e.pass_index,
                        "window": e.window.to_string(),
                        "previous": e.previous.as_str(),
                        "current": e.current.as_str(),
                    }
                }));
            }
            RecordedEvent::Entry(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Entry",
                    "cat": "Registry",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "root": e.root.to_string(),
                        "change": e.change.as_str(),
                        "entries": e.entries,
                    }
                }));
            }
            RecordedEvent::Notify(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Notify",
                    "cat": "Rich",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "pass_index": e.pass_index,
                        "window": e.window.to_string(),
                        "root": e.root.to_string(),
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}
