// Copyright 2025 the Galley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::ops::Range;

use peniko::kurbo::{Rect, Size};

/// Opaque key identifying a [`TextContainer`] within a
/// [`LayoutEngine`](crate::LayoutEngine).
///
/// Containers are ordered by key for multi-container flow. Fragments refer to
/// their container by key rather than by pointer, so the fragment store owns
/// all fragments by value with no back-references.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContainerId(pub(crate) usize);

impl ContainerId {
    /// The container's position in flow order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A bounded region constraining where line fragments may be placed.
///
/// The region is the container's bounding size minus any exclusion
/// rectangles; line breaking consumes the usable horizontal span left over on
/// each line band. Container coordinates have their origin at the container's
/// top left.
#[derive(Clone, Debug, PartialEq)]
pub struct TextContainer {
    /// Bounding size. A height of zero (or less) means unbounded.
    pub size: Size,
    /// Regions within the bounds that lines must avoid.
    pub exclusions: Vec<Rect>,
}

impl TextContainer {
    /// Creates a container of the given size with no exclusions.
    pub fn new(size: Size) -> Self {
        Self {
            size,
            exclusions: Vec::new(),
        }
    }

    /// Whether the container bounds line flow vertically.
    pub fn is_height_bounded(&self) -> bool {
        self.size.height > 0.0
    }

    /// The horizontal span usable by a line occupying the vertical band
    /// `y0..y1`.
    ///
    /// This is the widest gap between exclusions intersecting the band,
    /// leftmost on ties. A fully excluded (or zero-width) band yields an
    /// empty span; the typesetter degrades to one glyph per line rather than
    /// failing.
    pub fn usable_span(&self, y0: f64, y1: f64) -> Range<f64> {
        let width = self.size.width.max(0.0);
        let mut blocked: Vec<(f64, f64)> = self
            .exclusions
            .iter()
            .filter(|r| r.y0 < y1 && r.y1 > y0 && r.x1 > 0.0 && r.x0 < width)
            .map(|r| (r.x0.max(0.0), r.x1.min(width)))
            .collect();
        if blocked.is_empty() {
            return 0.0..width;
        }
        blocked.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut best = 0.0..0.0;
        let mut cursor = 0.0;
        for (x0, x1) in blocked {
            if x0 > cursor && x0 - cursor > best.end - best.start {
                best = cursor..x0;
            }
            cursor = cursor.max(x1);
        }
        if width > cursor && width - cursor > best.end - best.start {
            best = cursor..width;
        }
        best
    }
}
