// Copyright 2025 the Galley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line fragments and their ordered store.

use core::ops::Range;

use peniko::kurbo::Rect;

use crate::container::ContainerId;

/// The geometric placement of one line's worth of glyphs within a container.
///
/// Within one container, fragments are ordered by glyph range start, never
/// overlap, and partition the container's typeset glyph range with no gaps.
/// A fragment may hold no glyphs while still covering characters: a blank
/// line is a newline with no glyph of its own. The trailing fragment of a
/// document may be empty in both ranges; it exists so the caret has geometry
/// at the end of text.
#[derive(Clone, Debug, PartialEq)]
pub struct LineFragment {
    /// The glyphs placed on this line.
    pub glyph_range: Range<usize>,
    /// The characters laid on this line, including any trailing newline.
    pub char_range: Range<usize>,
    /// Used rectangle in container coordinates.
    pub rect: Rect,
    /// Baseline offset from the top of `rect`.
    pub baseline: f32,
    /// Key of the owning container.
    pub container: ContainerId,
    /// Whether the line ended at an explicit break (`\n`) rather than a
    /// soft wrap.
    pub explicit_break: bool,
}

impl LineFragment {
    /// Whether the fragment holds no glyphs.
    pub fn is_empty(&self) -> bool {
        self.glyph_range.is_empty()
    }
}

/// Ordered collection of computed line fragments across all containers.
#[derive(Clone, Debug, Default)]
pub(crate) struct FragmentStore {
    fragments: Vec<LineFragment>,
}

impl FragmentStore {
    pub(crate) fn clear(&mut self) {
        self.fragments.clear();
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.fragments.len()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&LineFragment> {
        self.fragments.get(index)
    }

    pub(crate) fn last(&self) -> Option<&LineFragment> {
        self.fragments.last()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &LineFragment> {
        self.fragments.iter()
    }

    pub(crate) fn push(&mut self, fragment: LineFragment) {
        if let Some(prev) = self.fragments.last() {
            debug_assert!(
                fragment.glyph_range.start == prev.glyph_range.end
                    && fragment.container >= prev.container,
                "fragments must partition the glyph range in container order"
            );
        }
        self.fragments.push(fragment);
    }

    /// Drops the fragment at `index` and everything after it.
    pub(crate) fn truncate(&mut self, index: usize) {
        self.fragments.truncate(index);
    }

    /// Index of the fragment whose glyph range contains `glyph`.
    ///
    /// A boundary glyph index belongs to the latest fragment starting there,
    /// which skips empty fragments (blank lines) in favor of the line
    /// actually holding the glyph. One past the final glyph resolves to the
    /// last fragment (the end-of-text caret line).
    pub(crate) fn index_containing_glyph(&self, glyph: usize) -> Option<usize> {
        let i = self
            .fragments
            .partition_point(|f| f.glyph_range.start <= glyph)
            .checked_sub(1)?;
        (glyph <= self.fragments[i].glyph_range.end).then_some(i)
    }

    /// Index of the fragment whose character range contains `index`.
    ///
    /// A boundary index belongs to the later fragment; one past the end of
    /// text resolves to the last fragment.
    pub(crate) fn index_containing_char(&self, index: usize) -> Option<usize> {
        let i = self
            .fragments
            .partition_point(|f| f.char_range.start <= index)
            .checked_sub(1)?;
        (index <= self.fragments[i].char_range.end).then_some(i)
    }

    /// Fragments belonging to `container`, in order, with their store
    /// indices.
    pub(crate) fn container_fragments(
        &self,
        container: ContainerId,
    ) -> impl Iterator<Item = (usize, &LineFragment)> {
        self.fragments
            .iter()
            .enumerate()
            .filter(move |(_, f)| f.container == container)
    }

    /// Fragments of `container` whose rectangles intersect `rect`, in order.
    pub(crate) fn intersecting(
        &self,
        rect: Rect,
        container: ContainerId,
    ) -> impl Iterator<Item = &LineFragment> {
        self.fragments.iter().filter(move |f| {
            f.container == container
                && f.rect.x0 < rect.x1
                && f.rect.x1 > rect.x0
                && f.rect.y0 < rect.y1
                && f.rect.y1 > rect.y0
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{FragmentStore, LineFragment};
    use crate::container::ContainerId;
    use peniko::kurbo::Rect;

    fn frag(glyphs: core::ops::Range<usize>, chars: core::ops::Range<usize>, y: f64) -> LineFragment {
        LineFragment {
            glyph_range: glyphs,
            char_range: chars,
            rect: Rect::new(0.0, y, 50.0, y + 10.0),
            baseline: 8.0,
            container: ContainerId(0),
            explicit_break: false,
        }
    }

    #[test]
    fn containing_glyph_prefers_later_fragment_at_boundary() {
        let mut store = FragmentStore::default();
        store.push(frag(0..5, 0..5, 0.0));
        store.push(frag(5..11, 5..11, 10.0));
        assert_eq!(store.index_containing_glyph(4), Some(0));
        assert_eq!(store.index_containing_glyph(5), Some(1));
        assert_eq!(store.index_containing_glyph(11), Some(1));
        assert_eq!(store.index_containing_glyph(12), None);
    }

    #[test]
    fn containing_glyph_skips_blank_lines() {
        // "hello\n\nworld": the middle fragment is a blank line.
        let mut store = FragmentStore::default();
        store.push(frag(0..5, 0..6, 0.0));
        store.push(frag(5..5, 6..7, 10.0));
        store.push(frag(5..10, 7..12, 20.0));
        assert_eq!(store.index_containing_glyph(4), Some(0));
        assert_eq!(store.index_containing_glyph(5), Some(2));
        assert_eq!(store.index_containing_glyph(10), Some(2));
    }

    #[test]
    fn containing_char_addresses_the_blank_line() {
        let mut store = FragmentStore::default();
        store.push(frag(0..5, 0..6, 0.0));
        store.push(frag(5..5, 6..7, 10.0));
        store.push(frag(5..10, 7..12, 20.0));
        assert_eq!(store.index_containing_char(5), Some(0));
        assert_eq!(store.index_containing_char(6), Some(1));
        assert_eq!(store.index_containing_char(7), Some(2));
        assert_eq!(store.index_containing_char(12), Some(2));
        assert_eq!(store.index_containing_char(13), None);
    }

    #[test]
    fn intersecting_filters_by_rect() {
        let mut store = FragmentStore::default();
        store.push(frag(0..5, 0..5, 0.0));
        store.push(frag(5..11, 5..11, 10.0));
        let hits: Vec<_> = store
            .intersecting(Rect::new(0.0, 12.0, 50.0, 18.0), ContainerId(0))
            .collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].glyph_range, 5..11);
    }
}
