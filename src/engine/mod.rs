// SPDX-License-Identifier: MIT OR Apache-2.0

//! Correlation engine - ties text matches to transcript timecodes
//!
//! Both search paths end here: the regex path feeds [`LineScanner`], the
//! index path feeds [`FragmentWalker`]. Each produces a lazy stream of
//! [`TimecodeRecord`]s, deduplicated in time and carrying a context window.

pub mod context;
pub mod correlator;
pub mod fragments;
pub mod line_scanner;
pub mod pair;
pub mod timecode;

pub use context::{ContextBuffer, ContextWindow, Snapshot, WindowTicket};
pub use correlator::{DedupGate, TimecodeCorrelator, DEFAULT_DEDUP_GAP_SECONDS};
pub use fragments::{Fragment, FragmentWalker};
pub use line_scanner::{LineScanner, ScanOptions};
pub use pair::{info_path_for, TranscriptPair, INFO_EXTENSION, TIMECODES_EXTENSION};
pub use timecode::{pretty_timestamp, TimecodeLine, TimecodeRecord};
