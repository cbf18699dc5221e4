// Copyright 2025 the Galley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Insertion-point movement.
//!
//! Movement is mapping-aware: the atomic unit of a horizontal step is a
//! mapping entry, so a ligature is crossed in one step regardless of how
//! many characters it covers. Vertical movement tracks the column of the
//! position the whole sequence of moves started from, so repeated up/down
//! strokes do not drift through intermediate roundings.

use core::ops::Range;

use crate::container::ContainerId;
use crate::engine::LayoutEngine;
use crate::provider::GlyphProvider;
use crate::selection::Affinity;
use crate::storage::TextStorage;
use crate::style::Brush;

/// Direction of an insertion-point move.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Movement {
    /// Toward smaller horizontal positions on the current line.
    Left,
    /// Toward larger horizontal positions on the current line.
    Right,
    /// Toward the previous line fragment.
    Up,
    /// Toward the next line fragment.
    Down,
}

impl<B: Brush, P: GlyphProvider<B>> LayoutEngine<B, P> {
    /// Moves the insertion point from `from` in `direction`.
    ///
    /// `original` anchors a multi-step sequence: repeated vertical moves pass
    /// the character index the sequence started at so the target column stays
    /// fixed. `distance` is a target geometric distance in container
    /// coordinates; the move never goes farther unless no shorter move
    /// exists. A distance of `0.0` requests the minimal mapping-aware move.
    ///
    /// The result differs from `from` unless `from` is already the furthest
    /// position in `direction` within its container. Movement never crosses
    /// container boundaries; flowing the caret between containers is the
    /// caller's responsibility.
    pub fn move_insertion<T: TextStorage<B> + ?Sized>(
        &mut self,
        text: &T,
        direction: Movement,
        from: usize,
        original: usize,
        distance: f32,
    ) -> usize {
        self.ensure_layout(text);
        let Some((frag_idx, _)) = self.caret_geometry(from, Affinity::Downstream) else {
            return from;
        };
        let container = match self.fragments.get(frag_idx) {
            Some(f) => f.container,
            None => return from,
        };
        let extent = self.container_char_extent(container);
        match direction {
            Movement::Left | Movement::Right => {
                self.horizontal(direction, from, distance, &extent)
            }
            Movement::Up | Movement::Down => {
                self.vertical(direction, from, original, distance, frag_idx, container, &extent)
            }
        }
    }

    /// The character extent covered by a container's fragments.
    fn container_char_extent(&self, container: ContainerId) -> Range<usize> {
        let mut range: Option<Range<usize>> = None;
        for (_, frag) in self.fragments.container_fragments(container) {
            let r = range.get_or_insert(frag.char_range.clone());
            r.end = frag.char_range.end;
        }
        range.unwrap_or(0..0)
    }

    /// One atomic step right: to the end of the mapping entry containing
    /// `from`, which exits a ligature as a single move.
    fn step_right(&self, from: usize, extent: &Range<usize>) -> usize {
        if from >= extent.end {
            return from;
        }
        match self.map.entry_containing_char(from) {
            Some(i) => self.map.entries()[i].char_range.end.min(extent.end),
            None => from,
        }
    }

    /// One atomic step left: to the start of the entry containing `from`,
    /// or of the previous entry when `from` sits on a boundary.
    fn step_left(&self, from: usize, extent: &Range<usize>) -> usize {
        if from <= extent.start {
            return from;
        }
        if let Some(i) = self.map.entry_containing_char(from) {
            let start = self.map.entries()[i].char_range.start;
            if start < from {
                return start.max(extent.start);
            }
        }
        match self.map.entry_before_char(from) {
            Some(i) => self.map.entries()[i].char_range.start.max(extent.start),
            None => extent.start,
        }
    }

    fn horizontal(
        &self,
        direction: Movement,
        from: usize,
        distance: f32,
        extent: &Range<usize>,
    ) -> usize {
        let step = |cur: usize| match direction {
            Movement::Left => self.step_left(cur, extent),
            _ => self.step_right(cur, extent),
        };
        if distance <= 0.0 {
            return step(from);
        }
        let Some((start_frag, start_x)) = self.caret_geometry(from, Affinity::Downstream) else {
            return from;
        };
        let mut accepted = None;
        let mut cur = from;
        loop {
            let next = step(cur);
            if next == cur {
                break;
            }
            let within = match self.caret_geometry(next, Affinity::Downstream) {
                Some((frag, x)) => frag == start_frag && (x - start_x).abs() <= f64::from(distance),
                None => false,
            };
            if within {
                accepted = Some(next);
                cur = next;
                continue;
            }
            // The shortest possible move already exceeds the target.
            if accepted.is_none() {
                accepted = Some(next);
            }
            break;
        }
        accepted.unwrap_or(from)
    }

    #[allow(
        clippy::too_many_arguments,
        reason = "internal helper taking the caller's already-resolved context"
    )]
    fn vertical(
        &self,
        direction: Movement,
        from: usize,
        original: usize,
        distance: f32,
        frag_idx: usize,
        container: ContainerId,
        extent: &Range<usize>,
    ) -> usize {
        let indices: Vec<usize> = self
            .fragments
            .container_fragments(container)
            .map(|(i, _)| i)
            .collect();
        let Some(pos) = indices.iter().position(|&i| i == frag_idx) else {
            return from;
        };
        let candidates: Vec<usize> = match direction {
            Movement::Up => indices[..pos].iter().rev().copied().collect(),
            _ => indices[pos + 1..].to_vec(),
        };
        if candidates.is_empty() {
            // Already on the furthest line; the furthest position in this
            // direction is the container extent.
            return match direction {
                Movement::Up => extent.start,
                _ => extent.end,
            };
        }

        let target_x = self
            .caret_geometry(original, Affinity::Downstream)
            .or_else(|| self.caret_geometry(from, Affinity::Downstream))
            .map(|(_, x)| x)
            .unwrap_or(0.0);
        let from_baseline = self
            .fragments
            .get(frag_idx)
            .map(|f| f.rect.y0 + f64::from(f.baseline))
            .unwrap_or(0.0);

        let mut chosen = candidates[0];
        if distance > 0.0 {
            for &cand in &candidates {
                let Some(frag) = self.fragments.get(cand) else {
                    break;
                };
                let baseline = frag.rect.y0 + f64::from(frag.baseline);
                if (baseline - from_baseline).abs() <= f64::from(distance) {
                    chosen = cand;
                } else {
                    break;
                }
            }
        }

        let result = self
            .char_boundary_near(chosen, target_x)
            .clamp(extent.start, extent.end);
        if result != from {
            return result;
        }
        // A soft-wrap boundary shares its character index between two lines;
        // nudge one atomic step so the move is still observable.
        match direction {
            Movement::Up => self.step_left(from, extent),
            _ => self.step_right(from, extent),
        }
    }

    /// The character boundary in a fragment closest to an x position,
    /// snapping to mapping-entry boundaries.
    fn char_boundary_near(&self, frag_idx: usize, x: f64) -> usize {
        let Some(frag) = self.fragments.get(frag_idx) else {
            return 0;
        };
        if frag.is_empty() {
            return frag.char_range.start;
        }
        let Some((glyph, _)) = self.hit_fragment(frag, x) else {
            return frag.char_range.start;
        };
        let Some(i) = self.map.entry_containing_glyph(glyph) else {
            return self.map.char_boundary_for_glyph(glyph);
        };
        let entry = &self.map.entries()[i];
        let x0 = self.glyph_edge(frag, entry.glyph_range.start);
        let advance: f64 = entry
            .glyph_range
            .clone()
            .filter_map(|g| self.glyphs.get(g))
            .map(|g| f64::from(g.advance))
            .sum();
        if advance > 0.0 && (x - x0) / advance >= 0.5 {
            entry.char_range.end
        } else {
            entry.char_range.start
        }
    }
}
