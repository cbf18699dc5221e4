// Copyright 2025 the Galley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::ops::Range;
use std::sync::Arc;

use crate::style::Brush;

/// A block of styled text laid out by a [`LayoutEngine`].
///
/// The engine holds no copy of the text; it reads through this trait on each
/// query and caches only derived data. Implementations must keep indices
/// stable between [`text_edited`](crate::LayoutEngine::text_edited)
/// notifications — the engine and the storage must never disagree about what
/// the text currently is.
///
/// [`LayoutEngine`]: crate::LayoutEngine
pub trait TextStorage<B: Brush> {
    /// The length of the underlying text in bytes.
    fn len(&self) -> usize;

    /// Return `true` if the underlying text is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return whether `index` is a UTF-8 character boundary in the text.
    fn is_char_boundary(&self, index: usize) -> bool;

    /// Return the text for the given byte range.
    ///
    /// Both endpoints must be character boundaries within the text.
    fn slice(&self, range: Range<usize>) -> &str;

    /// Return the maximal run of uniform style containing `index`, along
    /// with its brush.
    ///
    /// Runs must tile the text: for any `index < len()`, the returned range
    /// contains `index`, and the run starting at one run's end is the next
    /// run.
    fn style_run(&self, index: usize) -> (Range<usize>, B);
}

impl<B: Brush> TextStorage<B> for str {
    fn len(&self) -> usize {
        Self::len(self)
    }

    fn is_char_boundary(&self, index: usize) -> bool {
        Self::is_char_boundary(self, index)
    }

    fn slice(&self, range: Range<usize>) -> &str {
        &self[range]
    }

    fn style_run(&self, _index: usize) -> (Range<usize>, B) {
        (0..Self::len(self), B::default())
    }
}

impl<B: Brush> TextStorage<B> for String {
    fn len(&self) -> usize {
        Self::len(self)
    }

    fn is_char_boundary(&self, index: usize) -> bool {
        self.as_str().is_char_boundary(index)
    }

    fn slice(&self, range: Range<usize>) -> &str {
        &self.as_str()[range]
    }

    fn style_run(&self, _index: usize) -> (Range<usize>, B) {
        (0..Self::len(self), B::default())
    }
}

impl<B: Brush> TextStorage<B> for Arc<str> {
    fn len(&self) -> usize {
        str::len(self)
    }

    fn is_char_boundary(&self, index: usize) -> bool {
        str::is_char_boundary(self, index)
    }

    fn slice(&self, range: Range<usize>) -> &str {
        &self[range]
    }

    fn style_run(&self, _index: usize) -> (Range<usize>, B) {
        (0..str::len(self), B::default())
    }
}
