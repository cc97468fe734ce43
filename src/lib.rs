//! subgrep - Timecode search in YouTube subtitles library
//!
//! Shared modules for the subgrep CLI tool: the correlation engine that maps
//! text matches to transcript timecodes, plus subtitle conversion, metadata
//! and result rendering.

pub mod config;
pub mod engine;
pub mod errors;
pub mod output;
pub mod utils;
pub mod video;
pub mod vtt;
