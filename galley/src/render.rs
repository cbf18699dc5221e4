// Copyright 2025 the Galley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Handing positioned glyphs to a rendering backend.
//!
//! The engine never draws; it walks its fragments and calls into a
//! [`RenderSink`] with fully positioned runs, grouped so each callback covers
//! a maximal span of glyphs sharing one brush. Backgrounds and glyphs are
//! separate passes because backends typically batch fills and glyph runs
//! differently.

use core::ops::Range;

use peniko::kurbo::{Point, Rect};
use smallvec::SmallVec;

use crate::container::ContainerId;
use crate::engine::LayoutEngine;
use crate::provider::{GlyphId, GlyphProvider};
use crate::storage::TextStorage;
use crate::style::Brush;

/// A glyph resolved to absolute view coordinates.
///
/// `x` is the pen position at the glyph's leading edge and `y` its baseline,
/// both including the draw origin.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PositionedGlyph {
    /// Glyph identifier in the provider's font system.
    pub id: GlyphId,
    /// Pen x position at the glyph's leading edge.
    pub x: f64,
    /// Baseline y position.
    pub y: f64,
}

/// Backend callbacks for the drawing passes.
pub trait RenderSink<B: Brush> {
    /// Fills one background rectangle behind a run of glyphs.
    fn fill_background(&mut self, rect: Rect, brush: &B);

    /// Draws one run of same-brush glyphs positioned on a common baseline.
    fn draw_glyph_run(&mut self, brush: &B, glyphs: &[PositionedGlyph]);
}

impl<B: Brush, P: GlyphProvider<B>> LayoutEngine<B, P> {
    /// Fills the background rectangles for `glyph_range` in `container`,
    /// offset by `origin`, one call per same-brush span per fragment.
    pub fn draw_background<T, S>(
        &mut self,
        text: &T,
        glyph_range: Range<usize>,
        origin: Point,
        container: ContainerId,
        sink: &mut S,
    ) where
        T: TextStorage<B> + ?Sized,
        S: RenderSink<B>,
    {
        self.ensure_layout(text);
        self.for_each_run(glyph_range, container, |engine, frag_idx, run| {
            let frag = match engine.fragments.get(frag_idx) {
                Some(f) => f,
                None => return,
            };
            let x0 = origin.x + engine.glyph_edge(frag, run.start);
            let x1 = origin.x + engine.glyph_edge(frag, run.end);
            let rect = Rect::new(x0, origin.y + frag.rect.y0, x1, origin.y + frag.rect.y1);
            let style = usize::from(engine.glyphs[run.start].style_index);
            sink.fill_background(rect, &engine.styles[style]);
        });
    }

    /// Draws the glyphs of `glyph_range` in `container`, offset by `origin`,
    /// one run per same-brush span per fragment.
    pub fn draw_glyphs<T, S>(
        &mut self,
        text: &T,
        glyph_range: Range<usize>,
        origin: Point,
        container: ContainerId,
        sink: &mut S,
    ) where
        T: TextStorage<B> + ?Sized,
        S: RenderSink<B>,
    {
        self.ensure_layout(text);
        self.for_each_run(glyph_range, container, |engine, frag_idx, run| {
            let frag = match engine.fragments.get(frag_idx) {
                Some(f) => f,
                None => return,
            };
            let baseline = origin.y + frag.rect.y0 + f64::from(frag.baseline);
            let positioned: SmallVec<[PositionedGlyph; 16]> = engine.glyphs[run.clone()]
                .iter()
                .map(|g| PositionedGlyph {
                    id: g.id,
                    x: origin.x + frag.rect.x0 + f64::from(g.x),
                    y: baseline,
                })
                .collect();
            let style = usize::from(engine.glyphs[run.start].style_index);
            sink.draw_glyph_run(&engine.styles[style], &positioned);
        });
    }

    /// Calls `f` once per maximal same-brush glyph run of `glyph_range`
    /// within each fragment of `container`. Layout must already be clean.
    fn for_each_run(
        &mut self,
        glyph_range: Range<usize>,
        container: ContainerId,
        mut f: impl FnMut(&Self, usize, Range<usize>),
    ) {
        let end = glyph_range.end.min(self.glyphs.len());
        let range = glyph_range.start.min(end)..end;
        let frags: SmallVec<[(usize, Range<usize>); 8]> = self
            .fragments
            .container_fragments(container)
            .map(|(i, frag)| (i, frag.glyph_range.clone()))
            .collect();
        for (frag_idx, frag_glyphs) in frags {
            let start = range.start.max(frag_glyphs.start);
            let end = range.end.min(frag_glyphs.end);
            if start >= end {
                continue;
            }
            let mut run_start = start;
            let mut style = self.glyphs[run_start].style_index;
            for i in run_start + 1..end {
                if self.glyphs[i].style_index != style {
                    f(self, frag_idx, run_start..i);
                    run_start = i;
                    style = self.glyphs[i].style_index;
                }
            }
            f(self, frag_idx, run_start..end);
        }
    }
}
