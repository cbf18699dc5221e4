// Copyright 2025 the Galley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental text layout.
//!
//! Galley converts a styled character sequence into glyphs arranged as line
//! fragments inside one or more bounded containers, and answers the geometric
//! queries needed to render and navigate text interactively: point to
//! position, position to rectangle, and selection to rectangles.
//!
//! The crate owns no text. Callers keep their text in any type implementing
//! [`TextStorage`] and hand it to the [`LayoutEngine`] on each query; the
//! engine caches derived data (the character/glyph mapping, shaped glyphs and
//! line fragments) and re-typesets lazily, only for regions invalidated since
//! the previous query.
//!
//! Glyphs themselves come from a [`GlyphProvider`], the seam to whatever font
//! system the embedding application uses. All indices into text are byte
//! offsets aligned to `char` boundaries, and a "character range" is always
//! such a byte range.

mod container;
mod fragment;
mod invalidate;
mod line_break;
mod mapping;
mod provider;
mod storage;
mod style;

pub mod engine;
pub mod geometry;
pub mod navigate;
pub mod render;
pub mod selection;

pub use container::{ContainerId, TextContainer};
pub use engine::{Glyph, LayoutEngine};
pub use fragment::LineFragment;
pub use line_break::{BreakPolicy, WordBreakPolicy};
pub use mapping::{CharGlyphMap, MapEntry};
pub use navigate::Movement;
pub use provider::{DefaultLineMetrics, GlyphId, GlyphProvider, ShapedGlyph, StyledRun};
pub use render::{PositionedGlyph, RenderSink};
pub use selection::{Affinity, Granularity, Selection, SelectionModel};
pub use storage::TextStorage;
pub use style::Brush;
