// Copyright 2025 the Galley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Integration test suite for `galley`.
//!
//! - The `util` module holds the deterministic glyph provider, the recording
//!   render sink and the styled-text fixture shared by the test modules.
//! - We do not use the default Rust test harness; this `mod.rs` file is the
//!   entry point for all other tests, which makes sharing utility code
//!   between test modules straightforward.
//! - Tests are grouped by topic, one module each, with the topic leading the
//!   test name (`cursor_move_right` rather than `move_right_cursor`).

#![allow(missing_docs, reason = "we don't need docs for testing")]
#![allow(
    clippy::cast_possible_truncation,
    reason = "not critical for testing"
)]

mod geometry;
mod invalidation;
mod util;
