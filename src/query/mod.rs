// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query module - subtitle source resolution and the search engines

pub mod index_search;
pub mod regex_search;
pub mod search;
pub mod source;
