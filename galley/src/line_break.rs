// Copyright 2025 the Galley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Soft line-break policy.

use unicode_segmentation::UnicodeSegmentation;

/// Strategy object deciding where a line may softly break.
///
/// The typesetter prefers the most recent opportunity within the line over a
/// mid-run break; injecting a different policy customizes wrapping without
/// touching the engine (hyphenating policies would plug in here).
pub trait BreakPolicy {
    /// Byte offsets within `text` (relative to its start) before which a
    /// line may break, in ascending order. Offset `0` is never useful and
    /// may be omitted.
    fn break_opportunities(&self, text: &str) -> Vec<usize>;
}

/// The default policy: breaks are allowed at word boundaries.
#[derive(Copy, Clone, Debug, Default)]
pub struct WordBreakPolicy;

impl BreakPolicy for WordBreakPolicy {
    fn break_opportunities(&self, text: &str) -> Vec<usize> {
        text.split_word_bound_indices()
            .map(|(i, _)| i)
            .filter(|&i| i > 0)
            .collect()
    }
}
