// Copyright 2025 the Galley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangle and point queries against the typeset layout.
//!
//! Every query brings the layout up to date first, so results always reflect
//! the current text. Out-of-range inputs yield well-defined empty results
//! ([`Rect::ZERO`], empty sequences, `None`) rather than errors; these
//! queries run continuously during interactive editing and must never abort
//! rendering.

#![allow(
    clippy::cast_possible_truncation,
    reason = "glyph metrics are f32; fractions are clamped to 0.0..=1.0"
)]

use core::ops::Range;

use peniko::kurbo::{Point, Rect};
use smallvec::SmallVec;

use crate::container::ContainerId;
use crate::engine::LayoutEngine;
use crate::fragment::LineFragment;
use crate::provider::GlyphProvider;
use crate::selection::Affinity;
use crate::storage::TextStorage;
use crate::style::Brush;

impl<B: Brush, P: GlyphProvider<B>> LayoutEngine<B, P> {
    /// Fragments of `container` intersecting `rect`, in order.
    ///
    /// Brings the layout up to date first; the draw loop enumerates lines
    /// through this.
    pub fn fragments_intersecting<'a, T: TextStorage<B> + ?Sized>(
        &'a mut self,
        text: &T,
        rect: Rect,
        container: ContainerId,
    ) -> impl Iterator<Item = &'a LineFragment> + 'a {
        self.ensure_layout(text);
        self.fragments.intersecting(rect, container)
    }

    /// The fragment containing the given glyph index, after ensuring the
    /// region is clean.
    pub fn fragment_containing_glyph<T: TextStorage<B> + ?Sized>(
        &mut self,
        text: &T,
        glyph: usize,
    ) -> Option<&LineFragment> {
        self.ensure_layout(text);
        let i = self.fragments.index_containing_glyph(glyph)?;
        self.fragments.get(i)
    }

    /// The fragment containing the given character index.
    ///
    /// Unlike [`fragment_containing_glyph`](Self::fragment_containing_glyph)
    /// this can address a blank line, whose fragment covers a newline
    /// character but no glyph.
    pub fn fragment_containing_char<T: TextStorage<B> + ?Sized>(
        &mut self,
        text: &T,
        index: usize,
    ) -> Option<&LineFragment> {
        self.ensure_layout(text);
        let i = self.fragments.index_containing_char(index)?;
        self.fragments.get(i)
    }

    /// Rectangles covering `glyph_range` within `container`, one per line
    /// fragment touched, each clipped to `selection` when given.
    ///
    /// The selection clip keeps a highlight from extending past the actual
    /// glyph extents on each line.
    pub fn rects_for_glyph_range<T: TextStorage<B> + ?Sized>(
        &mut self,
        text: &T,
        glyph_range: Range<usize>,
        selection: Option<Range<usize>>,
        container: ContainerId,
    ) -> SmallVec<[Rect; 4]> {
        self.ensure_layout(text);
        let mut out = SmallVec::new();
        let range = clamp_range(glyph_range, self.glyphs.len());
        for (_, frag) in self.fragments.container_fragments(container) {
            let mut sub = intersect(&range, &frag.glyph_range);
            if let Some(sel) = &selection {
                sub = intersect(&sub, sel);
            }
            if sub.is_empty() {
                continue;
            }
            let x0 = self.glyph_edge(frag, sub.start);
            let x1 = self.glyph_edge(frag, sub.end);
            out.push(Rect::new(x0, frag.rect.y0, x1, frag.rect.y1));
        }
        out
    }

    /// Rectangles covering a character range, widened to cluster boundaries.
    pub fn rects_for_char_range<T: TextStorage<B> + ?Sized>(
        &mut self,
        text: &T,
        char_range: Range<usize>,
        selection: Option<Range<usize>>,
        container: ContainerId,
    ) -> SmallVec<[Rect; 4]> {
        self.ensure_layout(text);
        let glyphs = self.map.glyph_range_for_chars(char_range);
        let selection = selection.map(|s| self.map.glyph_range_for_chars(s));
        self.rects_for_glyph_range(text, glyphs, selection, container)
    }

    /// The union of the per-fragment rectangles for `glyph_range`.
    pub fn bounding_rect<T: TextStorage<B> + ?Sized>(
        &mut self,
        text: &T,
        glyph_range: Range<usize>,
        container: ContainerId,
    ) -> Rect {
        self.rects_for_glyph_range(text, glyph_range, None, container)
            .into_iter()
            .reduce(|a, b| a.union(b))
            .unwrap_or(Rect::ZERO)
    }

    /// The glyph range whose fragments intersect `bounds`.
    pub fn glyph_range_for_rect<T: TextStorage<B> + ?Sized>(
        &mut self,
        text: &T,
        bounds: Rect,
        container: ContainerId,
    ) -> Range<usize> {
        self.ensure_layout(text);
        self.glyph_range_for_rect_without_layout(bounds, container)
    }

    /// Like [`glyph_range_for_rect`](Self::glyph_range_for_rect) but only
    /// consults already-clean fragments, never triggering re-typesetting.
    pub fn glyph_range_for_rect_without_layout(
        &self,
        bounds: Rect,
        container: ContainerId,
    ) -> Range<usize> {
        let mut range: Option<Range<usize>> = None;
        for frag in self.fragments.intersecting(bounds, container) {
            let r = range.get_or_insert(frag.glyph_range.clone());
            r.start = r.start.min(frag.glyph_range.start);
            r.end = r.end.max(frag.glyph_range.end);
        }
        range.unwrap_or(0..0)
    }

    /// The glyph under `point`, clamped into the nearest fragment.
    pub fn glyph_index_for_point<T: TextStorage<B> + ?Sized>(
        &mut self,
        text: &T,
        point: Point,
        container: ContainerId,
    ) -> Option<usize> {
        self.hit_test_point(text, point, container).map(|(i, _)| i)
    }

    /// The glyph under `point` plus the fraction of the distance through its
    /// advance (0.0 at the leading edge, 1.0 at the trailing edge).
    ///
    /// Points outside all fragments clamp: above the first line resolves to
    /// the first glyph at fraction 0.0, below the last line to the last
    /// glyph at fraction 1.0.
    pub fn hit_test_point<T: TextStorage<B> + ?Sized>(
        &mut self,
        text: &T,
        point: Point,
        container: ContainerId,
    ) -> Option<(usize, f32)> {
        self.ensure_layout(text);
        let frag = self.fragment_for_offset(point.y, container)?;
        self.hit_fragment(frag, point.x)
    }

    /// Baseline origin of a glyph in container coordinates.
    pub fn glyph_location<T: TextStorage<B> + ?Sized>(
        &mut self,
        text: &T,
        glyph: usize,
    ) -> Option<Point> {
        self.ensure_layout(text);
        let i = self.fragments.index_containing_glyph(glyph)?;
        let frag = self.fragments.get(i)?;
        Some(Point::new(
            self.glyph_edge(frag, glyph),
            frag.rect.y0 + f64::from(frag.baseline),
        ))
    }

    /// A zero-width caret rectangle placed before the character at
    /// `char_index`, spanning the line fragment's height.
    ///
    /// The index may be anywhere in the text, including inside a ligature
    /// (the rectangle interpolates proportionally across the ligature
    /// glyph's advance) and one past the end of text. Returns [`Rect::ZERO`]
    /// when the character is not in `container`.
    pub fn insertion_rect<T: TextStorage<B> + ?Sized>(
        &mut self,
        text: &T,
        char_index: usize,
        container: ContainerId,
    ) -> Rect {
        self.insertion_rect_with_affinity(text, char_index, Affinity::Downstream, container)
    }

    /// [`insertion_rect`](Self::insertion_rect) with explicit affinity: at a
    /// soft line-wrap boundary, an upstream caret sits at the end of the
    /// earlier line instead of the start of the later one.
    pub fn insertion_rect_with_affinity<T: TextStorage<B> + ?Sized>(
        &mut self,
        text: &T,
        char_index: usize,
        affinity: Affinity,
        container: ContainerId,
    ) -> Rect {
        self.ensure_layout(text);
        let Some((frag_idx, x)) = self.caret_geometry(char_index, affinity) else {
            return Rect::ZERO;
        };
        let frag = match self.fragments.get(frag_idx) {
            Some(f) if f.container == container => f,
            _ => return Rect::ZERO,
        };
        Rect::new(x, frag.rect.y0, x, frag.rect.y1)
    }

    // --- internal helpers; callers guarantee the layout is clean ---

    /// Horizontal position of a glyph boundary within a fragment, in
    /// container coordinates. `glyph` may equal the fragment's end.
    pub(crate) fn glyph_edge(&self, frag: &LineFragment, glyph: usize) -> f64 {
        if glyph >= frag.glyph_range.end {
            let width = frag
                .glyph_range
                .clone()
                .last()
                .and_then(|g| self.glyphs.get(g))
                .map(|g| g.x + g.advance)
                .unwrap_or(0.0);
            frag.rect.x0 + f64::from(width)
        } else {
            frag.rect.x0
                + self
                    .glyphs
                    .get(glyph)
                    .map(|g| f64::from(g.x))
                    .unwrap_or(0.0)
        }
    }

    /// The caret's fragment index and x position for a character boundary.
    ///
    /// A boundary inside a glyphless entry (a blank line's newline) resolves
    /// through character space, so the caret lands on the blank line rather
    /// than on the next line holding glyphs.
    pub(crate) fn caret_geometry(&self, char_index: usize, affinity: Affinity) -> Option<(usize, f64)> {
        if char_index > self.map.char_end() {
            return None;
        }
        let (glyph, within, glyphless) = if char_index == self.map.char_end() {
            (self.map.glyph_end(), None, false)
        } else {
            let i = self.map.entry_containing_char(char_index)?;
            let entry = &self.map.entries()[i];
            let frac = (char_index - entry.char_range.start) as f32
                / entry.char_range.len().max(1) as f32;
            let inside = (frac > 0.0 && !entry.glyph_range.is_empty())
                .then(|| (entry.glyph_range.clone(), frac));
            (entry.glyph_range.start, inside, entry.glyph_range.is_empty())
        };
        let mut frag_idx = if glyphless {
            self.fragments.index_containing_char(char_index)?
        } else {
            self.fragments.index_containing_glyph(glyph)?
        };
        if affinity == Affinity::Upstream && within.is_none() {
            if let (Some(frag), Some(prev_idx)) = (self.fragments.get(frag_idx), frag_idx.checked_sub(1)) {
                if frag.char_range.start == char_index {
                    if let Some(prev) = self.fragments.get(prev_idx) {
                        if prev.char_range.end == char_index && !prev.explicit_break {
                            frag_idx = prev_idx;
                        }
                    }
                }
            }
        }
        let frag = self.fragments.get(frag_idx)?;
        let mut x = self.glyph_edge(frag, glyph);
        if let Some((glyph_range, frac)) = within {
            let advance: f32 = glyph_range
                .filter_map(|g| self.glyphs.get(g))
                .map(|g| g.advance)
                .sum();
            x += f64::from(advance * frac);
        }
        Some((frag_idx, x))
    }

    /// The fragment a vertical offset resolves to, clamping outside offsets
    /// to the nearest fragment.
    pub(crate) fn fragment_for_offset(&self, y: f64, container: ContainerId) -> Option<&LineFragment> {
        let mut last = None;
        for (_, frag) in self.fragments.container_fragments(container) {
            if y < frag.rect.y1 {
                return Some(frag);
            }
            last = Some(frag);
        }
        last
    }

    /// Hit-tests a horizontal position within one fragment.
    pub(crate) fn hit_fragment(&self, frag: &LineFragment, x: f64) -> Option<(usize, f32)> {
        if frag.is_empty() {
            if frag.glyph_range.start < self.glyphs.len() {
                // A blank line: its position is the boundary before the next
                // line's first glyph.
                return Some((frag.glyph_range.start, 0.0));
            }
            // The trailing caret line; clamp to the nearest real glyph.
            let last = self.glyphs.len().checked_sub(1)?;
            return Some((last, 1.0));
        }
        let rel = (x - frag.rect.x0) as f32;
        let glyphs = &self.glyphs[frag.glyph_range.clone()];
        if rel <= 0.0 {
            return Some((frag.glyph_range.start, 0.0));
        }
        let width = glyphs.last().map(|g| g.x + g.advance).unwrap_or(0.0);
        if rel >= width {
            return Some((frag.glyph_range.end - 1, 1.0));
        }
        let i = glyphs.partition_point(|g| g.x + g.advance <= rel);
        let i = i.min(glyphs.len() - 1);
        let g = &glyphs[i];
        let fraction = if g.advance > 0.0 {
            ((rel - g.x) / g.advance).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Some((frag.glyph_range.start + i, fraction))
    }
}

fn clamp_range(range: Range<usize>, len: usize) -> Range<usize> {
    let end = range.end.min(len);
    range.start.min(end)..end
}

fn intersect(a: &Range<usize>, b: &Range<usize>) -> Range<usize> {
    let start = a.start.max(b.start);
    start..a.end.min(b.end).max(start)
}
