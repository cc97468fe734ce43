// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns matched lines into timecode records
//!
//! Shared by the regex scanner and the fragment walker. A record is held back
//! until its context window has received all following lines, so callers only
//! ever see final windows, in match order.

use std::collections::VecDeque;

use super::context::{ContextBuffer, ContextWindow, Snapshot, WindowTicket};
use super::timecode::{TimecodeLine, TimecodeRecord};
use crate::errors::CorrelateError;

/// Matches closer than this to the last emitted record are dropped.
pub const DEFAULT_DEDUP_GAP_SECONDS: i64 = 10;

/// Temporal deduplication against the last *emitted* record.
///
/// A negative gap disables suppression entirely.
#[derive(Debug, Clone, Copy)]
pub struct DedupGate {
    gap: Option<u64>,
    last_emitted: Option<u64>,
}

impl DedupGate {
    pub fn new(gap_seconds: i64) -> Self {
        Self {
            gap: u64::try_from(gap_seconds).ok(),
            last_emitted: None,
        }
    }

    /// Decide whether a candidate at `seconds` is emitted; admits move the baseline.
    pub fn admit(&mut self, seconds: u64) -> bool {
        let admitted = match (self.gap, self.last_emitted) {
            (None, _) | (_, None) => true,
            (Some(gap), Some(last)) => seconds > last.saturating_add(gap),
        };
        if admitted {
            self.last_emitted = Some(seconds);
        }
        admitted
    }
}

impl Default for DedupGate {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_GAP_SECONDS)
    }
}

#[derive(Debug)]
enum DeferredContext {
    Ready(Option<ContextWindow>),
    Waiting(WindowTicket),
}

#[derive(Debug)]
struct Deferred {
    timecode: TimecodeLine,
    context: DeferredContext,
}

#[derive(Debug)]
pub struct TimecodeCorrelator {
    total_context_lines: usize,
    buffer: Option<ContextBuffer>,
    gate: DedupGate,
    deferred: VecDeque<Deferred>,
}

impl TimecodeCorrelator {
    pub fn new(total_context_lines: usize, dedup_gap_seconds: i64) -> Self {
        Self {
            total_context_lines,
            buffer: ContextBuffer::for_total(total_context_lines),
            gate: DedupGate::new(dedup_gap_seconds),
            deferred: VecDeque::new(),
        }
    }

    /// Feed every line of the stream, matched or not, before correlating it.
    pub fn observe(&mut self, line: &str) {
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.push(line);
        }
    }

    /// Correlate a matched `line` with its raw timecode line.
    ///
    /// Returns whether a record was produced; `false` means the match fell
    /// within the dedup gap of the previous record.
    pub fn correlate(
        &mut self,
        line: &str,
        raw_timecode: &str,
        position: usize,
    ) -> Result<bool, CorrelateError> {
        let timecode = TimecodeLine::parse(raw_timecode, position + 1)?;
        if !self.gate.admit(timecode.seconds) {
            return Ok(false);
        }

        let context = match (self.total_context_lines, self.buffer.as_mut()) {
            (1, _) => DeferredContext::Ready(Some(vec![line.trim().to_string()])),
            (_, Some(buffer)) => match buffer.snapshot_preceding() {
                Snapshot::Sealed(window) => DeferredContext::Ready(Some(window)),
                Snapshot::Pending(ticket) => DeferredContext::Waiting(ticket),
            },
            (_, None) => DeferredContext::Ready(None),
        };
        self.deferred.push_back(Deferred { timecode, context });
        Ok(true)
    }

    /// True while some window still waits for lines not yet read.
    pub fn has_pending(&self) -> bool {
        self.buffer.as_ref().is_some_and(ContextBuffer::has_pending)
    }

    /// Next record whose context is final, if any.
    pub fn pop_ready(&mut self) -> Option<TimecodeRecord> {
        let front = self.deferred.front_mut()?;
        if let DeferredContext::Waiting(ticket) = front.context {
            let window = self.buffer.as_mut()?.take_sealed(ticket)?;
            front.context = DeferredContext::Ready(Some(window));
        }

        let Deferred { timecode, context } = self.deferred.pop_front()?;
        let DeferredContext::Ready(context) = context else {
            return None;
        };
        Some(TimecodeRecord {
            seconds: timecode.seconds,
            context,
        })
    }

    /// The stream ended; windows still waiting are final as they are.
    pub fn finish(&mut self) {
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.seal_all();
        }
    }
}
