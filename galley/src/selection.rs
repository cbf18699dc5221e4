// Copyright 2025 the Galley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Selection state shared between the layout engine and its views.
//!
//! A [`SelectionModel`] is the single owner of the current selection. Views
//! and the engine both read it, so an editing session keeps one model and
//! hands out references rather than copying selections around.

use core::ops::Range;

use peniko::kurbo::Rect;
use smallvec::SmallVec;
use unicode_segmentation::UnicodeSegmentation;

use crate::container::ContainerId;
use crate::engine::LayoutEngine;
use crate::provider::GlyphProvider;
use crate::storage::TextStorage;
use crate::style::Brush;

/// Which side of a character boundary a caret leans toward.
///
/// Only observable at a soft line wrap, where one character index has two
/// geometric positions: upstream puts the caret at the end of the earlier
/// line, downstream at the start of the later one.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Affinity {
    /// Toward the preceding line fragment.
    Upstream,
    /// Toward the following line fragment.
    #[default]
    Downstream,
}

/// Unit a selection snaps to when extended.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Granularity {
    /// Individual characters, widened only to cluster boundaries.
    #[default]
    Character,
    /// Whole words.
    Word,
    /// Whole visual lines (fragments).
    Line,
    /// Whole paragraphs, delimited by newlines.
    Paragraph,
}

/// A selected character range with its snapping unit and caret affinity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    /// Byte range of the selected characters; empty for a bare caret.
    pub range: Range<usize>,
    /// The unit the selection was made in; extensions snap to it.
    pub granularity: Granularity,
    /// Caret lean at the active end.
    pub affinity: Affinity,
}

impl Selection {
    /// A caret at `index` with downstream affinity.
    pub fn caret(index: usize) -> Self {
        Self {
            range: index..index,
            ..Self::default()
        }
    }

    /// Whether the selection is a bare caret.
    pub fn is_caret(&self) -> bool {
        self.range.is_empty()
    }
}

/// Shared selection state for one editing session.
///
/// Remembers the range the selection started from so that extending in
/// either direction (a shift-click, a drag) always keeps the original unit
/// selected, and carries the brush to apply to the next insertion when the
/// selection no longer touches the text it was styled from.
#[derive(Clone, Debug, Default)]
pub struct SelectionModel<B: Brush> {
    selection: Selection,
    original: Range<usize>,
    typing_brush: Option<B>,
    syncing: bool,
}

impl<B: Brush> SelectionModel<B> {
    /// Creates a model with an empty caret at the start of text.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current selection.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Replaces the selection and resets the extension anchor to it.
    pub fn set_selection(&mut self, selection: Selection) {
        self.original = selection.range.clone();
        self.selection = selection;
        self.typing_brush = None;
    }

    /// Collapses to a caret at `index`.
    pub fn set_caret(&mut self, index: usize) {
        self.set_selection(Selection::caret(index));
    }

    /// The anchor range extensions grow from.
    pub fn original_range(&self) -> &Range<usize> {
        &self.original
    }

    /// The brush to use for the next insertion, if one has been set while
    /// the selection was empty.
    pub fn typing_brush(&self) -> Option<&B> {
        self.typing_brush.as_ref()
    }

    /// Sets or clears the brush for the next insertion.
    pub fn set_typing_brush(&mut self, brush: Option<B>) {
        self.typing_brush = brush;
    }

    /// Extends the selection to include `index`, snapping both ends to the
    /// current granularity. The anchor range set by
    /// [`set_selection`](Self::set_selection) always stays selected.
    pub fn extend_to<P, T>(&mut self, engine: &mut LayoutEngine<B, P>, text: &T, index: usize)
    where
        P: GlyphProvider<B>,
        T: TextStorage<B> + ?Sized,
    {
        let granularity = self.selection.granularity;
        let unit = granular_range(engine, text, index.min(text.len()), granularity);
        let mut start = unit.start.min(self.original.start);
        let mut end = unit.end.max(self.original.end);
        // Coarser units snap the anchor outward too; a character-granularity
        // anchor is the exact position the selection started at.
        if granularity != Granularity::Character {
            let anchor = granular_range(engine, text, self.original.start, granularity);
            start = start.min(anchor.start);
            end = end.max(anchor.end);
        }
        self.selection.range = start..end;
    }

    /// Highlight rectangles for the selection within one container.
    pub fn highlight_rects<P, T>(
        &self,
        engine: &mut LayoutEngine<B, P>,
        text: &T,
        container: ContainerId,
    ) -> SmallVec<[Rect; 4]>
    where
        P: GlyphProvider<B>,
        T: TextStorage<B> + ?Sized,
    {
        if self.selection.is_caret() {
            return SmallVec::new();
        }
        let range = self.selection.range.clone();
        engine.rects_for_char_range(text, range.clone(), Some(range), container)
    }

    /// Marks the start of pushing this model's state into a view.
    ///
    /// Returns `false` when a sync is already in progress, so a view whose
    /// change handler writes back into the model does not recurse.
    pub fn begin_view_sync(&mut self) -> bool {
        if self.syncing {
            return false;
        }
        self.syncing = true;
        true
    }

    /// Marks the end of a view sync started with
    /// [`begin_view_sync`](Self::begin_view_sync).
    pub fn end_view_sync(&mut self) {
        self.syncing = false;
    }
}

/// The range of the granularity unit containing `index`.
fn granular_range<B, P, T>(
    engine: &mut LayoutEngine<B, P>,
    text: &T,
    index: usize,
    granularity: Granularity,
) -> Range<usize>
where
    B: Brush,
    P: GlyphProvider<B>,
    T: TextStorage<B> + ?Sized,
{
    match granularity {
        Granularity::Character => {
            engine.ensure_layout(text);
            let map = engine.char_glyph_map();
            match map.entry_containing_char(index) {
                Some(i) => map.entries()[i].char_range.clone(),
                None => index..index,
            }
        }
        Granularity::Word => {
            let all = text.slice(0..text.len());
            for (start, word) in all.split_word_bound_indices() {
                let end = start + word.len();
                if (start..end).contains(&index) {
                    return start..end;
                }
            }
            index..index
        }
        Granularity::Line => match engine.fragment_containing_char(text, index) {
            Some(frag) => frag.char_range.clone(),
            None => index..index,
        },
        Granularity::Paragraph => {
            let all = text.slice(0..text.len());
            let index = index.min(all.len());
            let start = all[..index].rfind('\n').map(|i| i + 1).unwrap_or(0);
            let end = all[index..]
                .find('\n')
                .map(|i| index + i + 1)
                .unwrap_or(all.len());
            start..end
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Granularity, Selection, SelectionModel};

    #[test]
    fn caret_is_empty() {
        let sel = Selection::caret(4);
        assert!(sel.is_caret());
        assert_eq!(sel.range, 4..4);
    }

    #[test]
    fn view_sync_guard_blocks_reentry() {
        let mut model: SelectionModel<()> = SelectionModel::new();
        assert!(model.begin_view_sync());
        assert!(!model.begin_view_sync());
        model.end_view_sync();
        assert!(model.begin_view_sync());
    }

    #[test]
    fn set_selection_clears_typing_brush() {
        let mut model: SelectionModel<()> = SelectionModel::new();
        model.set_typing_brush(Some(()));
        assert!(model.typing_brush().is_some());
        model.set_selection(Selection {
            range: 2..6,
            granularity: Granularity::Word,
            ..Selection::default()
        });
        assert!(model.typing_brush().is_none());
        assert_eq!(model.selection().range, 2..6);
    }
}
