// Copyright 2025 the Galley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bidirectional character/glyph index mapping.

use core::ops::Range;

/// Maps a contiguous character range to a contiguous glyph range.
///
/// A character range longer than one `char` mapping to a single glyph is a
/// ligature; a single character mapping to several glyphs is a multi-glyph
/// decomposition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapEntry {
    /// Byte range of the characters covered by this entry.
    pub char_range: Range<usize>,
    /// Range of glyph indices covered by this entry.
    pub glyph_range: Range<usize>,
}

/// Ordered mapping table between character positions and glyph positions.
///
/// Entries tile the typeset prefix of the text: each entry starts where the
/// previous one ended, in both index spaces. Both lookup directions are
/// binary searches over the cached boundaries.
#[derive(Clone, Debug, Default)]
pub struct CharGlyphMap {
    entries: Vec<MapEntry>,
}

impl CharGlyphMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the entries in order.
    pub fn entries(&self) -> &[MapEntry] {
        &self.entries
    }

    /// One past the last mapped character index.
    pub fn char_end(&self) -> usize {
        self.entries.last().map(|e| e.char_range.end).unwrap_or(0)
    }

    /// One past the last mapped glyph index.
    pub fn glyph_end(&self) -> usize {
        self.entries.last().map(|e| e.glyph_range.end).unwrap_or(0)
    }

    /// Appends an entry continuing the tiling in both index spaces.
    ///
    /// Panics if the entry does not extend the map monotonically; that is a
    /// contract violation in the glyph provider or typesetter, and layout
    /// cannot proceed safely from inconsistent state.
    pub fn push(&mut self, entry: MapEntry) {
        assert!(
            entry.char_range.start == self.char_end()
                && entry.glyph_range.start == self.glyph_end()
                && entry.char_range.end > entry.char_range.start
                && entry.glyph_range.end >= entry.glyph_range.start,
            "non-monotonic character/glyph mapping: {entry:?} cannot follow \
             char end {} / glyph end {}",
            self.char_end(),
            self.glyph_end(),
        );
        self.entries.push(entry);
    }

    /// Index of the entry whose character range contains `index`.
    pub fn entry_containing_char(&self, index: usize) -> Option<usize> {
        let i = self.entries.partition_point(|e| e.char_range.end <= index);
        (i < self.entries.len() && self.entries[i].char_range.start <= index).then_some(i)
    }

    /// Index of the entry whose glyph range contains `glyph`.
    ///
    /// Entries with empty glyph ranges never contain a glyph.
    pub fn entry_containing_glyph(&self, glyph: usize) -> Option<usize> {
        let i = self.entries.partition_point(|e| e.glyph_range.end <= glyph);
        (i < self.entries.len() && self.entries[i].glyph_range.start <= glyph).then_some(i)
    }

    /// Index of the last entry starting strictly before `index` in character
    /// space.
    pub fn entry_before_char(&self, index: usize) -> Option<usize> {
        let i = self.entries.partition_point(|e| e.char_range.start < index);
        i.checked_sub(1)
    }

    /// The glyph range covering the given character range, widened to entry
    /// boundaries.
    ///
    /// Empty or out-of-range inputs yield an empty range at the nearest
    /// mapped glyph boundary.
    pub fn glyph_range_for_chars(&self, range: Range<usize>) -> Range<usize> {
        if range.start >= range.end || range.start >= self.char_end() {
            let g = self.glyph_boundary_for_char(range.start.min(self.char_end()));
            return g..g;
        }
        let first = self.entry_containing_char(range.start).unwrap_or(0);
        let last = self
            .entries
            .partition_point(|e| e.char_range.start < range.end)
            .saturating_sub(1);
        self.entries[first].glyph_range.start..self.entries[last].glyph_range.end
    }

    /// The character range covering the given glyph range, widened to entry
    /// boundaries.
    pub fn char_range_for_glyphs(&self, range: Range<usize>) -> Range<usize> {
        if range.start >= range.end || range.start >= self.glyph_end() {
            let c = self.char_boundary_for_glyph(range.start.min(self.glyph_end()));
            return c..c;
        }
        let first = self.entry_containing_glyph(range.start).unwrap_or(0);
        let last = self
            .entries
            .partition_point(|e| e.glyph_range.start < range.end)
            .saturating_sub(1);
        self.entries[first].char_range.start..self.entries[last].char_range.end
    }

    /// The glyph boundary corresponding to a character boundary, rounding
    /// down to the enclosing entry's start when `index` falls inside an
    /// entry (e.g. inside a ligature).
    pub fn glyph_boundary_for_char(&self, index: usize) -> usize {
        if index >= self.char_end() {
            return self.glyph_end();
        }
        match self.entry_containing_char(index) {
            Some(i) => self.entries[i].glyph_range.start,
            None => 0,
        }
    }

    /// The character boundary corresponding to a glyph boundary, rounding
    /// down to the enclosing entry's start when `glyph` falls inside an
    /// entry.
    pub fn char_boundary_for_glyph(&self, glyph: usize) -> usize {
        if glyph >= self.glyph_end() {
            return self.char_end();
        }
        match self.entry_containing_glyph(glyph) {
            Some(i) => self.entries[i].char_range.start,
            None => 0,
        }
    }

    /// Drops every entry at or after the given character boundary.
    ///
    /// Character space is the one that stays unambiguous here: consecutive
    /// glyphless entries (blank lines) share a glyph boundary. The boundary
    /// must coincide with an entry start (the typesetter only cuts at
    /// cluster boundaries).
    pub fn truncate_at_char(&mut self, index: usize) {
        let i = self.entries.partition_point(|e| e.char_range.start < index);
        if let Some(e) = self.entries.get(i) {
            debug_assert_eq!(
                e.char_range.start, index,
                "mapping truncated inside a cluster"
            );
        }
        self.entries.truncate(i);
    }
}
