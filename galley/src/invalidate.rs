// Copyright 2025 the Galley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-range tracking and redraw notification.

use core::ops::Range;

use smallvec::SmallVec;

/// Records the span of characters whose cached layout is stale.
///
/// Because a shifted line boundary cascades through every following line in
/// the container (and may overflow into the next container), everything from
/// the earliest dirty character onward is considered stale; the tracker
/// therefore only needs the merged span. Layout is recomputed lazily by the
/// next query that touches it.
#[derive(Clone, Debug, Default)]
pub(crate) struct InvalidationTracker {
    dirty: Option<Range<usize>>,
}

impl InvalidationTracker {
    pub(crate) fn is_clean(&self) -> bool {
        self.dirty.is_none()
    }

    /// Marks a character range stale, merging with any prior record.
    pub(crate) fn invalidate(&mut self, range: Range<usize>) {
        let merged = match self.dirty.take() {
            Some(d) => d.start.min(range.start)..d.end.max(range.end),
            None => range,
        };
        self.dirty = Some(merged);
    }

    /// The earliest stale character index, if any.
    pub(crate) fn dirty_start(&self) -> Option<usize> {
        self.dirty.as_ref().map(|d| d.start)
    }

    /// Clears the record once the typesetter has reprocessed it.
    pub(crate) fn clear(&mut self) {
        self.dirty = None;
    }
}

/// Coalesced pending-redraw notifications, in glyph space.
///
/// Pushing is idempotent: overlapping or adjacent ranges merge, so notifying
/// the same region twice schedules a single redraw. Draining is the rendering
/// collaborator's job; the queue never forces re-typesetting.
#[derive(Clone, Debug, Default)]
pub(crate) struct RedrawQueue {
    spans: SmallVec<[Range<usize>; 4]>,
}

impl RedrawQueue {
    /// Queues a glyph range for redraw.
    pub(crate) fn push(&mut self, range: Range<usize>) {
        if range.start >= range.end {
            return;
        }
        let mut merged = range;
        self.spans.retain(|span| {
            if span.start <= merged.end && span.end >= merged.start {
                merged = merged.start.min(span.start)..merged.end.max(span.end);
                false
            } else {
                true
            }
        });
        let at = self.spans.partition_point(|s| s.start < merged.start);
        self.spans.insert(at, merged);
    }

    /// Returns and clears the pending spans, in ascending order.
    pub(crate) fn take(&mut self) -> SmallVec<[Range<usize>; 4]> {
        core::mem::take(&mut self.spans)
    }

    #[cfg(test)]
    fn spans(&self) -> &[Range<usize>] {
        &self.spans
    }
}
