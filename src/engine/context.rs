// SPDX-License-Identifier: MIT OR Apache-2.0

//! Circular buffer of recently read lines
//!
//! Lines are read strictly forward, so when a match is found the lines after
//! it are still unknown. A snapshot therefore returns the preceding lines
//! right away and keeps a pending request that later [`ContextBuffer::push`]
//! calls complete. Completed windows are handed back by ticket; nothing is
//! shared between the buffer and its callers.

use std::collections::VecDeque;

/// Ordered, trimmed lines surrounding a match.
pub type ContextWindow = Vec<String>;

/// Handle for a window that still waits for following lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowTicket(u64);

/// Result of [`ContextBuffer::snapshot_preceding`].
#[derive(Debug, PartialEq, Eq)]
pub enum Snapshot {
    /// No following lines were requested; the window is final.
    Sealed(ContextWindow),
    /// Following lines are still to come; redeem with [`ContextBuffer::take_sealed`].
    Pending(WindowTicket),
}

#[derive(Debug)]
struct PendingContext {
    ticket: WindowTicket,
    window: ContextWindow,
    remaining: usize,
}

#[derive(Debug)]
pub struct ContextBuffer {
    slots: Vec<Option<String>>,
    cursor: usize,
    following: usize,
    open: VecDeque<PendingContext>,
    sealed: VecDeque<(WindowTicket, ContextWindow)>,
    next_ticket: u64,
}

impl ContextBuffer {
    /// Create a buffer for windows of `total_context_lines` lines.
    ///
    /// One preceding slot is reserved for the line being processed, so the
    /// preceding part gets `total / 2 + 1` lines and the rest follows.
    pub fn new(total_context_lines: usize) -> Self {
        let preceding = total_context_lines / 2 + 1;
        let following = total_context_lines.saturating_sub(preceding);
        Self {
            slots: vec![None; preceding],
            cursor: 0,
            following,
            open: VecDeque::new(),
            sealed: VecDeque::new(),
            next_ticket: 0,
        }
    }

    /// Buffer for `total_context_lines`, or `None` when a single line (or no
    /// line at all) is enough and no buffering is needed.
    pub fn for_total(total_context_lines: usize) -> Option<Self> {
        (total_context_lines > 1).then(|| Self::new(total_context_lines))
    }

    pub fn preceding(&self) -> usize {
        self.slots.len()
    }

    pub fn following(&self) -> usize {
        self.following
    }

    /// Record the next line of the stream.
    pub fn push(&mut self, line: &str) {
        let line = line.trim();
        self.slots[self.cursor] = Some(line.to_string());
        self.cursor = (self.cursor + 1) % self.slots.len();

        for pending in self.open.iter_mut() {
            pending.window.push(line.to_string());
            pending.remaining -= 1;
        }

        // All requests start with the same countdown and shrink together, so
        // they complete in registration order.
        while self.open.front().is_some_and(|p| p.remaining == 0) {
            if let Some(done) = self.open.pop_front() {
                self.sealed.push_back((done.ticket, done.window));
            }
        }
    }

    /// Lines held in the buffer, oldest first, including the current one.
    ///
    /// Registers a pending request when following lines are configured.
    pub fn snapshot_preceding(&mut self) -> Snapshot {
        let len = self.slots.len();
        let window: ContextWindow = (0..len)
            .filter_map(|i| self.slots[(self.cursor + i) % len].clone())
            .collect();

        if self.following == 0 {
            return Snapshot::Sealed(window);
        }

        let ticket = WindowTicket(self.next_ticket);
        self.next_ticket += 1;
        self.open.push_back(PendingContext {
            ticket,
            window,
            remaining: self.following,
        });
        Snapshot::Pending(ticket)
    }

    /// True while any window still waits for following lines.
    pub fn has_pending(&self) -> bool {
        !self.open.is_empty()
    }

    pub fn is_sealed(&self, ticket: WindowTicket) -> bool {
        self.sealed.iter().any(|(t, _)| *t == ticket)
    }

    /// Take a completed window out of the buffer.
    pub fn take_sealed(&mut self, ticket: WindowTicket) -> Option<ContextWindow> {
        let position = self.sealed.iter().position(|(t, _)| *t == ticket)?;
        self.sealed.remove(position).map(|(_, window)| window)
    }

    /// End of stream: no more lines will arrive, so open windows are final.
    pub fn seal_all(&mut self) {
        while let Some(pending) = self.open.pop_front() {
            self.sealed.push_back((pending.ticket, pending.window));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(buffer: &mut ContextBuffer, lines: &[&str]) {
        for line in lines {
            buffer.push(line);
        }
    }

    #[test]
    fn sizes_split_total_around_current_line() {
        let b = ContextBuffer::new(5);
        assert_eq!((b.preceding(), b.following()), (3, 2));
        let b = ContextBuffer::new(2);
        assert_eq!((b.preceding(), b.following()), (2, 0));
        let b = ContextBuffer::new(4);
        assert_eq!((b.preceding(), b.following()), (3, 1));
    }

    #[test]
    fn no_buffer_for_single_line_or_none() {
        assert!(ContextBuffer::for_total(0).is_none());
        assert!(ContextBuffer::for_total(1).is_none());
        assert!(ContextBuffer::for_total(2).is_some());
    }

    #[test]
    fn snapshot_at_stream_start_holds_only_seen_lines() {
        let mut b = ContextBuffer::new(2);
        feed(&mut b, &["first\n"]);
        assert_eq!(b.snapshot_preceding(), Snapshot::Sealed(vec!["first".to_string()]));
        assert!(!b.has_pending());
    }

    #[test]
    fn snapshot_wraps_and_returns_oldest_first() {
        let mut b = ContextBuffer::new(2);
        feed(&mut b, &["a", "b", "c", "d", "e"]);
        assert_eq!(
            b.snapshot_preceding(),
            Snapshot::Sealed(vec!["d".to_string(), "e".to_string()])
        );
    }

    #[test]
    fn pending_window_is_completed_by_following_lines() {
        let mut b = ContextBuffer::new(5);
        feed(&mut b, &["a", "b", "c", "d"]);
        let Snapshot::Pending(ticket) = b.snapshot_preceding() else {
            panic!("expected pending snapshot");
        };
        assert!(b.has_pending());
        b.push("e");
        assert!(!b.is_sealed(ticket));
        b.push("  f  ");
        assert!(b.is_sealed(ticket));
        assert!(!b.has_pending());
        b.push("g");

        let window = b.take_sealed(ticket).expect("sealed window");
        assert_eq!(window, vec!["b", "c", "d", "e", "f"]);
        assert!(b.take_sealed(ticket).is_none());
    }

    #[test]
    fn overlapping_requests_complete_in_order() {
        let mut b = ContextBuffer::new(4);
        feed(&mut b, &["a"]);
        let Snapshot::Pending(first) = b.snapshot_preceding() else {
            panic!("expected pending");
        };
        b.push("b");
        let Snapshot::Pending(second) = b.snapshot_preceding() else {
            panic!("expected pending");
        };
        assert!(b.is_sealed(first));
        assert!(!b.is_sealed(second));
        b.push("c");

        assert_eq!(b.take_sealed(first).unwrap(), vec!["a", "b"]);
        assert_eq!(b.take_sealed(second).unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn seal_all_finalizes_short_windows_at_end_of_stream() {
        let mut b = ContextBuffer::new(6);
        feed(&mut b, &["a", "b"]);
        let Snapshot::Pending(ticket) = b.snapshot_preceding() else {
            panic!("expected pending");
        };
        b.push("c");
        b.seal_all();
        assert!(!b.has_pending());
        assert_eq!(b.take_sealed(ticket).unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn window_never_exceeds_total() {
        for total in 2..9 {
            let mut b = ContextBuffer::new(total);
            let lines: Vec<String> = (0..20).map(|i| format!("line {i}")).collect();
            let mut tickets = Vec::new();
            for line in &lines {
                b.push(line);
                if let Snapshot::Pending(t) = b.snapshot_preceding() {
                    tickets.push(t);
                }
            }
            b.seal_all();
            for t in tickets {
                assert!(b.take_sealed(t).unwrap().len() <= total);
            }
        }
    }
}
