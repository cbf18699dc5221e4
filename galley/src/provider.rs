// Copyright 2025 the Galley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::ops::Range;

use crate::style::Brush;

/// Identifier of a glyph within the provider's font system.
///
/// Opaque to the engine; it is carried through layout and handed back to the
/// renderer unchanged.
pub type GlyphId = u32;

/// A maximal run of uniformly styled text handed to a [`GlyphProvider`].
#[derive(Debug)]
pub struct StyledRun<'a, B: Brush> {
    /// The run's text.
    pub text: &'a str,
    /// The run's byte range within the full document.
    pub range: Range<usize>,
    /// The style payload attached to the run.
    pub brush: &'a B,
}

/// One glyph produced by a [`GlyphProvider`], with its metrics.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ShapedGlyph {
    /// Glyph identifier in the provider's font system.
    pub id: GlyphId,
    /// Byte offset, within the run, of the first character this glyph
    /// renders.
    ///
    /// Cluster values must be monotonically non-decreasing over the returned
    /// sequence. Consecutive glyphs sharing a cluster decompose one character
    /// into several glyphs; a cluster step spanning more than one character
    /// is a ligature.
    pub cluster: usize,
    /// Horizontal advance.
    pub advance: f32,
    /// Distance from the baseline to the glyph's top.
    pub ascent: f32,
    /// Distance from the baseline to the glyph's bottom.
    pub descent: f32,
}

/// Vertical metrics used where no glyph supplies any: the empty document's
/// fragment and caret sizing at the end of text.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DefaultLineMetrics {
    /// Default ascent above the baseline.
    pub ascent: f32,
    /// Default descent below the baseline.
    pub descent: f32,
}

impl DefaultLineMetrics {
    /// The default line height.
    pub fn height(&self) -> f32 {
        self.ascent + self.descent
    }
}

/// The seam to the embedding application's font system.
///
/// Given a styled character run, a provider produces the glyphs that render
/// it together with their metrics and cluster mapping. The engine treats the
/// output as authoritative; a provider that violates cluster monotonicity is
/// a programming error and aborts layout.
pub trait GlyphProvider<B: Brush> {
    /// Shape one styled run into glyphs.
    fn glyphs_and_metrics(&self, run: StyledRun<'_, B>) -> Vec<ShapedGlyph>;

    /// Metrics of the default font, used when no glyph is available.
    fn default_line_metrics(&self) -> DefaultLineMetrics;
}
