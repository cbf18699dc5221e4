// Copyright 2025 the Galley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixtures shared across tests.

use core::ops::Range;

use galley::{
    ContainerId, DefaultLineMetrics, GlyphProvider, LayoutEngine, PositionedGlyph, RenderSink,
    ShapedGlyph, StyledRun, TextContainer, TextStorage,
};
use peniko::kurbo::{Rect, Size};

pub(crate) const ASCENT: f32 = 8.0;
pub(crate) const DESCENT: f32 = 2.0;
pub(crate) const LINE_HEIGHT: f64 = 10.0;
pub(crate) const LIGATURE_ADVANCE: f32 = 14.0;

/// Brush carrying an RGBA color.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) struct ColorBrush(pub(crate) [u8; 4]);

pub(crate) const RED: ColorBrush = ColorBrush([255, 0, 0, 255]);
pub(crate) const BLUE: ColorBrush = ColorBrush([0, 0, 255, 255]);

/// The advance the test provider gives each character.
///
/// "hello" is 48.0 wide and " world" is 49.2, so both halves of
/// `"hello world"` fit a 50-wide container but the whole string does not.
pub(crate) fn advance_of(c: char) -> f32 {
    match c {
        'h' | 'e' | 'l' | 'o' => 9.6,
        ' ' => 3.0,
        _ => 9.0,
    }
}

/// Deterministic shaper with fixed per-character advances.
///
/// Shapes `"fi"` into a single ligature glyph, `'é'` into a base glyph plus
/// a zero-advance combining glyph, and newlines into no glyph at all. Every
/// glyph has an ascent of 8.0 and a descent of 2.0, so lines are 10.0 tall.
pub(crate) struct FixedMetricsProvider;

impl GlyphProvider<ColorBrush> for FixedMetricsProvider {
    fn glyphs_and_metrics(&self, run: StyledRun<'_, ColorBrush>) -> Vec<ShapedGlyph> {
        let mut out = Vec::new();
        let mut iter = run.text.char_indices().peekable();
        while let Some((i, c)) = iter.next() {
            if c == '\n' {
                continue;
            }
            if c == 'f' && matches!(iter.peek(), Some(&(_, 'i'))) {
                iter.next();
                out.push(ShapedGlyph {
                    id: 0xF1,
                    cluster: i,
                    advance: LIGATURE_ADVANCE,
                    ascent: ASCENT,
                    descent: DESCENT,
                });
                continue;
            }
            if c == 'é' {
                out.push(ShapedGlyph {
                    id: u32::from('e'),
                    cluster: i,
                    advance: 9.0,
                    ascent: ASCENT,
                    descent: DESCENT,
                });
                out.push(ShapedGlyph {
                    id: 0xAC,
                    cluster: i,
                    advance: 0.0,
                    ascent: ASCENT,
                    descent: DESCENT,
                });
                continue;
            }
            out.push(ShapedGlyph {
                id: u32::from(c),
                cluster: i,
                advance: advance_of(c),
                ascent: ASCENT,
                descent: DESCENT,
            });
        }
        out
    }

    fn default_line_metrics(&self) -> DefaultLineMetrics {
        DefaultLineMetrics {
            ascent: ASCENT,
            descent: DESCENT,
        }
    }
}

pub(crate) type TestEngine = LayoutEngine<ColorBrush, FixedMetricsProvider>;

pub(crate) fn engine_with_container(width: f64, height: f64) -> (TestEngine, ContainerId) {
    let mut engine = LayoutEngine::new(FixedMetricsProvider);
    let id = engine.add_container(TextContainer::new(Size::new(width, height)));
    (engine, id)
}

/// Glyph ranges of the container's fragments, in order.
pub(crate) fn fragment_ranges(
    engine: &mut TestEngine,
    text: &str,
    container: ContainerId,
) -> Vec<Range<usize>> {
    engine
        .fragments_intersecting(text, Rect::new(-1e9, -1e9, 1e9, 1e9), container)
        .map(|f| f.glyph_range.clone())
        .collect()
}

/// Text with explicit style runs.
pub(crate) struct StyledText {
    pub(crate) text: String,
    pub(crate) runs: Vec<(Range<usize>, ColorBrush)>,
}

impl TextStorage<ColorBrush> for StyledText {
    fn len(&self) -> usize {
        self.text.len()
    }

    fn is_char_boundary(&self, index: usize) -> bool {
        self.text.as_str().is_char_boundary(index)
    }

    fn slice(&self, range: Range<usize>) -> &str {
        &self.text[range]
    }

    fn style_run(&self, index: usize) -> (Range<usize>, ColorBrush) {
        self.runs
            .iter()
            .find(|(r, _)| r.contains(&index))
            .map(|(r, b)| (r.clone(), *b))
            .unwrap_or((0..self.text.len(), ColorBrush::default()))
    }
}

/// Render sink recording every callback for inspection.
#[derive(Default)]
pub(crate) struct RecordingSink {
    pub(crate) backgrounds: Vec<(Rect, ColorBrush)>,
    pub(crate) runs: Vec<(ColorBrush, Vec<PositionedGlyph>)>,
}

impl RenderSink<ColorBrush> for RecordingSink {
    fn fill_background(&mut self, rect: Rect, brush: &ColorBrush) {
        self.backgrounds.push((rect, *brush));
    }

    fn draw_glyph_run(&mut self, brush: &ColorBrush, glyphs: &[PositionedGlyph]) {
        self.runs.push((*brush, glyphs.to_vec()));
    }
}

pub(crate) fn assert_near(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-4,
        "expected {expected}, got {actual}"
    );
}
