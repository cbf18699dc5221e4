// Copyright 2025 the Galley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The layout engine: cached layout state and the typesetter.

#![allow(
    clippy::cast_possible_truncation,
    reason = "glyph metrics are f32; container geometry narrows at bounded magnitudes"
)]

use core::fmt;
use core::ops::Range;

use peniko::kurbo::{Rect, Size};
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::container::{ContainerId, TextContainer};
use crate::fragment::{FragmentStore, LineFragment};
use crate::invalidate::{InvalidationTracker, RedrawQueue};
use crate::line_break::{BreakPolicy, WordBreakPolicy};
use crate::mapping::{CharGlyphMap, MapEntry};
use crate::provider::{GlyphId, GlyphProvider, StyledRun};
use crate::storage::TextStorage;
use crate::style::Brush;

/// A positioned rendering unit within a line fragment.
///
/// `x` is the offset from the fragment's left edge; vertical placement comes
/// from the fragment's baseline.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Glyph {
    /// Glyph identifier in the provider's font system.
    pub id: GlyphId,
    /// Index into the engine's style collection.
    pub style_index: u16,
    /// Horizontal offset from the owning fragment's left edge.
    pub x: f32,
    /// Horizontal advance.
    pub advance: f32,
    /// Ascent above the baseline.
    pub ascent: f32,
    /// Descent below the baseline.
    pub descent: f32,
}

/// Incremental layout engine.
///
/// Owns all cached derived state: the character/glyph mapping, shaped glyphs,
/// line fragments and the dirty-range record. The text itself stays with the
/// caller and is passed into each query; a query touching a stale region
/// re-typesets just that region (and the cascade behind it) before answering.
///
/// All operations are synchronous and single-threaded; callers must serialize
/// edits against queries.
pub struct LayoutEngine<B: Brush, P: GlyphProvider<B>> {
    provider: P,
    policy: Box<dyn BreakPolicy>,
    pub(crate) containers: Vec<TextContainer>,
    pub(crate) styles: Vec<B>,
    pub(crate) glyphs: Vec<Glyph>,
    pub(crate) map: CharGlyphMap,
    pub(crate) fragments: FragmentStore,
    tracker: InvalidationTracker,
    redraw: RedrawQueue,
    typeset_len: usize,
    laid_out: bool,
}

impl<B: Brush, P: GlyphProvider<B>> fmt::Debug for LayoutEngine<B, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutEngine")
            .field("containers", &self.containers.len())
            .field("glyphs", &self.glyphs.len())
            .field("fragments", &self.fragments.len())
            .field("clean", &self.tracker.is_clean())
            .finish_non_exhaustive()
    }
}

impl<B: Brush, P: GlyphProvider<B>> LayoutEngine<B, P> {
    /// Creates an engine with the default word-boundary break policy.
    pub fn new(provider: P) -> Self {
        Self::with_policy(provider, Box::new(WordBreakPolicy))
    }

    /// Creates an engine with a custom line-break policy.
    pub fn with_policy(provider: P, policy: Box<dyn BreakPolicy>) -> Self {
        Self {
            provider,
            policy,
            containers: Vec::new(),
            styles: Vec::new(),
            glyphs: Vec::new(),
            map: CharGlyphMap::new(),
            fragments: FragmentStore::default(),
            tracker: InvalidationTracker::default(),
            redraw: RedrawQueue::default(),
            typeset_len: 0,
            laid_out: false,
        }
    }

    /// The glyph provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Appends a container to the flow and returns its key.
    pub fn add_container(&mut self, container: TextContainer) -> ContainerId {
        self.containers.push(container);
        // Text that previously overflowed the last container may now flow on.
        self.invalidate_all();
        ContainerId(self.containers.len() - 1)
    }

    /// The container for the given key.
    pub fn container(&self, id: ContainerId) -> Option<&TextContainer> {
        self.containers.get(id.0)
    }

    /// The containers in flow order.
    pub fn containers(&self) -> &[TextContainer] {
        &self.containers
    }

    /// Resizes a container, discarding its fragments and everything flowing
    /// after them.
    pub fn set_container_size(&mut self, id: ContainerId, size: Size) {
        if let Some(c) = self.containers.get_mut(id.0) {
            if c.size != size {
                c.size = size;
                self.invalidate_container(id);
            }
        }
    }

    /// Replaces a container's exclusion rectangles.
    pub fn set_container_exclusions(&mut self, id: ContainerId, exclusions: Vec<Rect>) {
        if let Some(c) = self.containers.get_mut(id.0) {
            if c.exclusions != exclusions {
                c.exclusions = exclusions;
                self.invalidate_container(id);
            }
        }
    }

    /// The style collection referenced by [`Glyph::style_index`].
    pub fn styles(&self) -> &[B] {
        &self.styles
    }

    /// Number of glyphs currently typeset.
    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// The typeset glyphs, in order.
    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    /// The character/glyph mapping for the typeset region.
    pub fn char_glyph_map(&self) -> &CharGlyphMap {
        &self.map
    }

    /// Whether all typeset state is up to date.
    pub fn is_clean(&self) -> bool {
        self.laid_out && self.tracker.is_clean()
    }

    /// Marks a character range stale.
    ///
    /// Everything from the range's start onward is re-typeset by the next
    /// query, because a shifted line boundary cascades through the trailing
    /// fragments of the container and may overflow into the next one.
    pub fn invalidate_characters(&mut self, range: Range<usize>) {
        trace!(start = range.start, end = range.end, "invalidate characters");
        self.tracker.invalidate(range);
    }

    /// Marks the entire layout stale.
    pub fn invalidate_all(&mut self) {
        self.tracker.invalidate(0..self.typeset_len.max(1));
        self.laid_out = false;
    }

    /// Translates a storage edit notification into invalidation.
    ///
    /// `edited` is the replacement's range in the post-edit text and
    /// `change_in_length` the document length delta. The stale span widens to
    /// cluster boundaries one entry before the edit, so a change adjacent to
    /// a ligature-capable run re-shapes that run too.
    pub fn text_edited(&mut self, edited: Range<usize>, change_in_length: isize) {
        let entry_start = match self.map.entry_containing_char(edited.start) {
            Some(i) => Some(i),
            None => self.map.entry_before_char(edited.start),
        };
        let start = match entry_start {
            Some(i) => {
                let i = i.saturating_sub(1);
                self.map.entries()[i].char_range.start
            }
            None => 0,
        };
        let end = edited
            .end
            .max(edited.end.saturating_add_signed(-change_in_length));
        self.invalidate_characters(start.min(edited.start)..end.max(start));
    }

    /// Schedules a redraw notification for a glyph range.
    ///
    /// Idempotent, and never forces re-typesetting; re-typesetting happens
    /// lazily on the next geometry query.
    pub fn invalidate_display_glyphs(&mut self, range: Range<usize>) {
        let end = range.end.min(self.glyphs.len());
        self.redraw.push(range.start.min(end)..end);
    }

    /// Schedules a redraw notification for a character range.
    pub fn invalidate_display_characters(&mut self, range: Range<usize>) {
        let glyphs = self.map.glyph_range_for_chars(range.clone());
        // Beyond the typeset region the mapping is unknown; be conservative
        // and include everything to the end.
        let end = if range.end > self.map.char_end() {
            self.glyphs.len()
        } else {
            glyphs.end
        };
        self.redraw.push(glyphs.start..end.max(glyphs.start));
    }

    /// Drains the pending redraw spans (glyph ranges, ascending).
    pub fn take_pending_redraw(&mut self) -> SmallVec<[Range<usize>; 4]> {
        self.redraw.take()
    }

    fn invalidate_container(&mut self, id: ContainerId) {
        let first = self
            .fragments
            .iter()
            .find(|f| f.container >= id)
            .map(|f| f.char_range.start);
        if let Some(start) = first {
            self.invalidate_characters(start..self.map.char_end().max(start));
        }
    }

    pub(crate) fn style_index(&mut self, brush: &B) -> u16 {
        if let Some(i) = self.styles.iter().position(|s| s == brush) {
            return i as u16;
        }
        self.styles.push(brush.clone());
        (self.styles.len() - 1) as u16
    }

    /// Brings the cached layout up to date with `text`.
    ///
    /// Every geometry, navigation and selection query calls this first; the
    /// cost is proportional to the stale suffix, not the document size.
    pub fn ensure_layout<T: TextStorage<B> + ?Sized>(&mut self, text: &T) {
        let len = text.len();
        if self.laid_out && self.tracker.is_clean() && self.typeset_len == len {
            return;
        }
        if self.containers.is_empty() {
            self.glyphs.clear();
            self.map.clear();
            self.fragments.clear();
            self.tracker.clear();
            self.typeset_len = len;
            self.laid_out = false;
            return;
        }
        let old_glyph_len = self.glyphs.len();
        let dirty = self.tracker.dirty_start().unwrap_or(0).min(len);
        let (cut_fragment, cut_glyph, cut_char) = self.cut_before(dirty);
        debug!(dirty, cut_char, cut_glyph, "re-typesetting stale region");

        self.fragments.truncate(cut_fragment);
        self.glyphs.truncate(cut_glyph);
        self.map.truncate_at_char(cut_char);

        let (container_idx, y) = match self.fragments.last() {
            Some(f) => (f.container.0, f.rect.y1),
            None => (0, 0.0),
        };
        self.typeset(text, cut_char, container_idx, y);

        self.redraw
            .push(cut_glyph..self.glyphs.len().max(old_glyph_len));
        self.tracker.clear();
        self.typeset_len = len;
        self.laid_out = true;
    }

    /// Finds the fragment/glyph/character boundary to cut the cached layout
    /// at, given the first stale character.
    ///
    /// The cut lands one fragment before the fragment containing the stale
    /// character (a boundary shift can retroactively move the previous
    /// line's end), snapped back to a cluster boundary when a degenerate
    /// container split a cluster across fragments.
    fn cut_before(&self, dirty: usize) -> (usize, usize, usize) {
        if self.fragments.is_empty() {
            return (0, 0, 0);
        }
        let anchor = dirty.min(self.map.char_end());
        let Some(containing) = self.fragments.index_containing_char(anchor) else {
            return (0, 0, 0);
        };
        let mut frag_idx = containing.saturating_sub(1);
        loop {
            let (frag_start, frag_char) = match self.fragments.get(frag_idx) {
                Some(f) => (f.glyph_range.start, f.char_range.start),
                None => return (0, 0, 0),
            };
            let entry_start = match self.map.entry_containing_glyph(frag_start) {
                Some(i) => self.map.entries()[i].glyph_range.start,
                None => frag_start,
            };
            if entry_start < frag_start {
                frag_idx = match self.fragments.index_containing_glyph(entry_start) {
                    Some(i) => i,
                    None => return (0, 0, 0),
                };
                continue;
            }
            return (frag_idx, frag_start, frag_char);
        }
    }

    fn typeset<T: TextStorage<B> + ?Sized>(
        &mut self,
        text: &T,
        start: usize,
        container_idx: usize,
        y: f64,
    ) {
        let len = text.len();
        let defaults = self.provider.default_line_metrics();
        let mut clusters = self.shape(text, start);
        for offset in self.policy.break_opportunities(text.slice(start..len)) {
            let abs = offset + start;
            if let Some(c) = clusters.iter_mut().find(|c| c.char_range.start == abs) {
                c.opportunity = true;
            }
        }

        let mut filler = LineFiller {
            engine: self,
            container_idx,
            y,
            default_ascent: defaults.ascent,
            default_descent: defaults.descent,
        };
        filler.fill(&mut clusters);
        let container_idx = filler.container_idx;
        let y = filler.y;

        // Cursor placement needs a line at the end of text when the text is
        // empty or ends in an explicit break.
        let ends_with_break = len > 0
            && text.is_char_boundary(len - 1)
            && text.slice(len - 1..len) == "\n"
            && self.map.char_end() == len;
        if len == 0 || ends_with_break {
            let span = self.containers[container_idx].usable_span(y, y + f64::from(defaults.height()));
            let g = self.glyphs.len();
            self.fragments.push(LineFragment {
                glyph_range: g..g,
                char_range: len..len,
                rect: Rect::new(span.start, y, span.start, y + f64::from(defaults.height())),
                baseline: defaults.ascent,
                container: ContainerId(container_idx),
                explicit_break: false,
            });
        }
    }

    /// Shapes `start..` into clusters, validating the provider's cluster
    /// monotonicity.
    fn shape<T: TextStorage<B> + ?Sized>(&mut self, text: &T, start: usize) -> Vec<ShapedCluster> {
        let len = text.len();
        let mut clusters = Vec::new();
        let mut pos = start;
        while pos < len {
            let (run_range, brush) = text.style_run(pos);
            let run_end = run_range.end.min(len);
            debug_assert!(run_end > pos, "style runs must tile the text");
            let run_text = text.slice(pos..run_end);
            let style_index = self.style_index(&brush);
            let shaped = self.provider.glyphs_and_metrics(StyledRun {
                text: run_text,
                range: pos..run_end,
                brush: &brush,
            });

            let mut covered = 0;
            let mut i = 0;
            while i < shaped.len() {
                let cluster = shaped[i].cluster;
                assert!(
                    cluster >= covered && cluster < run_text.len(),
                    "glyph provider violated cluster monotonicity at byte {cluster} of run {pos}..{run_end}"
                );
                if cluster > covered {
                    // Characters the provider produced no glyph for still
                    // need mapping entries.
                    push_hidden_clusters(&mut clusters, pos + covered, &run_text[covered..cluster]);
                }
                let mut j = i + 1;
                while j < shaped.len() && shaped[j].cluster == cluster {
                    j += 1;
                }
                let mut next = if j < shaped.len() {
                    assert!(
                        shaped[j].cluster > cluster,
                        "glyph provider violated cluster monotonicity at byte {} of run {pos}..{run_end}",
                        shaped[j].cluster
                    );
                    shaped[j].cluster
                } else {
                    run_text.len()
                };
                // Text the provider elided before the next glyph stays out
                // of this cluster, so a newline in it becomes a hidden
                // cluster rather than part of the preceding one.
                let tail = &run_text[cluster..next];
                if tail.starts_with('\n') {
                    next = cluster + 1;
                } else if let Some(nl) = tail.find('\n') {
                    next = cluster + nl;
                }
                let mut glyphs: SmallVec<[Glyph; 2]> = SmallVec::new();
                let mut advance = 0.0f32;
                let mut ascent = 0.0f32;
                let mut descent = 0.0f32;
                for g in &shaped[i..j] {
                    glyphs.push(Glyph {
                        id: g.id,
                        style_index,
                        x: 0.0,
                        advance: g.advance,
                        ascent: g.ascent,
                        descent: g.descent,
                    });
                    advance += g.advance;
                    ascent = ascent.max(g.ascent);
                    descent = descent.max(g.descent);
                }
                let char_range = pos + cluster..pos + next;
                let newline = run_text[cluster..next].starts_with('\n');
                clusters.push(ShapedCluster {
                    char_range,
                    glyphs,
                    advance,
                    ascent,
                    descent,
                    newline,
                    opportunity: false,
                });
                covered = next;
                i = j;
            }
            if covered < run_text.len() {
                push_hidden_clusters(&mut clusters, pos + covered, &run_text[covered..]);
            }
            pos = run_end;
        }
        clusters
    }
}

/// One cluster produced by shaping: the atomic unit of line breaking and of
/// the character/glyph mapping.
struct ShapedCluster {
    char_range: Range<usize>,
    glyphs: SmallVec<[Glyph; 2]>,
    advance: f32,
    ascent: f32,
    descent: f32,
    newline: bool,
    opportunity: bool,
}

impl ShapedCluster {
    /// A cluster with no glyphs, covering characters the provider elided.
    fn hidden(char_range: Range<usize>, cluster_text: &str) -> Self {
        Self {
            char_range,
            glyphs: SmallVec::new(),
            advance: 0.0,
            ascent: 0.0,
            descent: 0.0,
            newline: cluster_text.starts_with('\n'),
            opportunity: false,
        }
    }
}

/// Splits text the provider produced no glyphs for into hidden clusters,
/// one per newline so each explicit break keeps its own cluster.
fn push_hidden_clusters(clusters: &mut Vec<ShapedCluster>, start: usize, text: &str) {
    let mut offset = 0;
    while offset < text.len() {
        let rest = &text[offset..];
        let len = if rest.starts_with('\n') {
            1
        } else {
            rest.find('\n').unwrap_or(rest.len())
        };
        clusters.push(ShapedCluster::hidden(
            start + offset..start + offset + len,
            &rest[..len],
        ));
        offset += len;
    }
}

/// Greedy line filling over a shaped cluster sequence.
struct LineFiller<'a, B: Brush, P: GlyphProvider<B>> {
    engine: &'a mut LayoutEngine<B, P>,
    container_idx: usize,
    y: f64,
    default_ascent: f32,
    default_descent: f32,
}

impl<B: Brush, P: GlyphProvider<B>> LineFiller<'_, B, P> {
    fn fill(&mut self, clusters: &mut [ShapedCluster]) {
        let mut i = 0;
        let mut line_start = 0;
        let mut prev_opportunity: Option<usize> = None;
        let mut x = 0.0f32;

        while i < clusters.len() {
            let avail = self.avail_width(clusters, line_start, i);
            if avail <= 0.0 {
                // Degenerate container: flush any accumulated line, then one
                // glyph per fragment.
                if i > line_start {
                    self.flush_line(clusters, line_start..i, false);
                }
                self.flush_degenerate(&mut clusters[i]);
                i += 1;
                line_start = i;
                prev_opportunity = None;
                x = 0.0;
                continue;
            }
            let c = &clusters[i];
            if c.newline {
                self.flush_line(clusters, line_start..i + 1, true);
                i += 1;
                line_start = i;
                prev_opportunity = None;
                x = 0.0;
                continue;
            }
            if i > line_start && x + c.advance > avail {
                // An overflow at an opportunity breaks right there; otherwise
                // retreat to the most recent one, or split mid-run when the
                // line has none.
                let break_at = if c.opportunity {
                    i
                } else {
                    prev_opportunity.unwrap_or(i)
                };
                self.flush_line(clusters, line_start..break_at, false);
                i = break_at;
                line_start = i;
                prev_opportunity = None;
                x = 0.0;
                continue;
            }
            if clusters[i].opportunity && i > line_start {
                prev_opportunity = Some(i);
            }
            x += clusters[i].advance;
            i += 1;
        }
        if i > line_start {
            self.flush_line(clusters, line_start..i, false);
        }
    }

    /// Usable width for the line currently being accumulated.
    fn avail_width(&self, clusters: &[ShapedCluster], line_start: usize, i: usize) -> f32 {
        let mut ascent = self.default_ascent;
        let mut descent = self.default_descent;
        for c in &clusters[line_start..=i.min(clusters.len() - 1)] {
            ascent = ascent.max(c.ascent);
            descent = descent.max(c.descent);
        }
        let height = f64::from(ascent + descent);
        let container = &self.engine.containers[self.container_idx];
        let span = container.usable_span(self.y, self.y + height);
        (span.end - span.start) as f32
    }

    /// Closes one line over `range`, emitting glyphs, map entries and the
    /// fragment.
    fn flush_line(&mut self, clusters: &mut [ShapedCluster], range: Range<usize>, explicit: bool) {
        let mut ascent = self.default_ascent;
        let mut descent = self.default_descent;
        for c in &clusters[range.clone()] {
            ascent = ascent.max(c.ascent);
            descent = descent.max(c.descent);
        }
        let line_height = f64::from(ascent + descent);
        self.advance_container(line_height);

        let container = &self.engine.containers[self.container_idx];
        let span = container.usable_span(self.y, self.y + line_height);
        let chars = clusters[range.start].char_range.start..clusters[range.end - 1].char_range.end;
        let glyph_start = self.engine.glyphs.len();
        let mut x = 0.0f32;
        for c in &mut clusters[range] {
            let cluster_glyph_start = self.engine.glyphs.len();
            for mut glyph in core::mem::take(&mut c.glyphs) {
                glyph.x = x;
                x += glyph.advance;
                self.engine.glyphs.push(glyph);
            }
            self.engine.map.push(MapEntry {
                char_range: c.char_range.clone(),
                glyph_range: cluster_glyph_start..self.engine.glyphs.len(),
            });
        }
        self.engine.fragments.push(LineFragment {
            glyph_range: glyph_start..self.engine.glyphs.len(),
            char_range: chars,
            rect: Rect::new(
                span.start,
                self.y,
                span.start + f64::from(x),
                self.y + line_height,
            ),
            baseline: ascent,
            container: ContainerId(self.container_idx),
            explicit_break: explicit,
        });
        self.y += line_height;
    }

    /// Emits one fragment per glyph for a zero-width band.
    fn flush_degenerate(&mut self, cluster: &mut ShapedCluster) {
        let line_height = f64::from(
            (cluster.ascent + cluster.descent).max(self.default_ascent + self.default_descent),
        );
        let baseline = cluster.ascent.max(self.default_ascent);
        let cluster_glyph_start = self.engine.glyphs.len();
        for mut glyph in core::mem::take(&mut cluster.glyphs) {
            self.advance_container(line_height);
            let container = &self.engine.containers[self.container_idx];
            let span = container.usable_span(self.y, self.y + line_height);
            glyph.x = 0.0;
            let advance = glyph.advance;
            let g = self.engine.glyphs.len();
            self.engine.glyphs.push(glyph);
            self.engine.fragments.push(LineFragment {
                glyph_range: g..g + 1,
                char_range: cluster.char_range.clone(),
                rect: Rect::new(
                    span.start,
                    self.y,
                    span.start + f64::from(advance),
                    self.y + line_height,
                ),
                baseline,
                container: ContainerId(self.container_idx),
                explicit_break: false,
            });
            self.y += line_height;
        }
        self.engine.map.push(MapEntry {
            char_range: cluster.char_range.clone(),
            glyph_range: cluster_glyph_start..self.engine.glyphs.len(),
        });
    }

    /// Moves to the next container when the current one's height is
    /// exhausted; the final container grows without bound.
    fn advance_container(&mut self, line_height: f64) {
        while self.container_idx + 1 < self.engine.containers.len() {
            let container = &self.engine.containers[self.container_idx];
            if container.is_height_bounded() && self.y + line_height > container.size.height {
                self.container_idx += 1;
                self.y = 0.0;
            } else {
                break;
            }
        }
    }
}
