// Copyright 2025 the Galley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometric queries: rects, hit testing and caret placement.

use galley::Affinity;
use peniko::kurbo::{Point, Rect};

use crate::util::{assert_near, engine_with_container, LIGATURE_ADVANCE, LINE_HEIGHT};

#[test]
fn geometry_ligature_is_one_glyph_for_two_chars() {
    let (mut engine, _) = engine_with_container(200.0, 0.0);
    let text = "fine";
    engine.ensure_layout(text);
    assert_eq!(engine.glyph_count(), 3);
    assert_eq!(engine.char_glyph_map().glyph_range_for_chars(0..2), 0..1);
    // A sub-range inside the ligature widens to the whole glyph.
    assert_eq!(engine.char_glyph_map().glyph_range_for_chars(1..2), 0..1);
}

#[test]
fn geometry_caret_inside_ligature_interpolates() {
    let (mut engine, id) = engine_with_container(200.0, 0.0);
    let rect = engine.insertion_rect("fine", 1, id);
    assert_near(rect.x0, f64::from(LIGATURE_ADVANCE) / 2.0);
    assert_near(rect.x1, rect.x0);
    assert_near(rect.y1 - rect.y0, LINE_HEIGHT);
}

#[test]
fn geometry_caret_at_end_of_text() {
    let (mut engine, id) = engine_with_container(200.0, 0.0);
    // "hi" is 9.6 + 9.0 wide.
    let rect = engine.insertion_rect("hi", 2, id);
    assert_near(rect.x0, 18.6);
    assert_near(rect.y0, 0.0);
}

#[test]
fn geometry_caret_affinity_at_soft_wrap() {
    let (mut engine, id) = engine_with_container(50.0, 0.0);
    let text = "hello world";
    let down = engine.insertion_rect_with_affinity(text, 5, Affinity::Downstream, id);
    assert_near(down.x0, 0.0);
    assert_near(down.y0, LINE_HEIGHT);
    let up = engine.insertion_rect_with_affinity(text, 5, Affinity::Upstream, id);
    assert_near(up.x0, 48.0);
    assert_near(up.y0, 0.0);
}

#[test]
fn geometry_caret_lands_on_the_blank_line() {
    let (mut engine, id) = engine_with_container(200.0, 0.0);
    // 'a' ends line one, the middle line is empty, 'b' opens line three.
    let text = "a\n\nb";
    let before = engine.insertion_rect(text, 1, id);
    assert_near(before.x0, 9.0);
    assert_near(before.y0, 0.0);
    let blank = engine.insertion_rect(text, 2, id);
    assert_near(blank.x0, 0.0);
    assert_near(blank.y0, LINE_HEIGHT);
    let after = engine.insertion_rect(text, 3, id);
    assert_near(after.x0, 0.0);
    assert_near(after.y0, 2.0 * LINE_HEIGHT);
}

#[test]
fn geometry_hit_test_on_the_blank_line() {
    let (mut engine, id) = engine_with_container(200.0, 0.0);
    let text = "a\n\nb";
    // A point on the empty middle line resolves to the boundary before 'b'.
    let (glyph, fraction) = engine
        .hit_test_point(text, Point::new(3.0, 15.0), id)
        .unwrap();
    assert_eq!(glyph, 1);
    assert_near(f64::from(fraction), 0.0);
}

#[test]
fn geometry_caret_out_of_range_is_zero() {
    let (mut engine, id) = engine_with_container(50.0, 0.0);
    assert_eq!(engine.insertion_rect("hi", 99, id), Rect::ZERO);
}

#[test]
fn geometry_hit_test_returns_glyph_and_fraction() {
    let (mut engine, id) = engine_with_container(200.0, 0.0);
    // 'a' and 'b' are 9.0 wide each.
    let (glyph, fraction) = engine
        .hit_test_point("ab", Point::new(4.5, 5.0), id)
        .unwrap();
    assert_eq!(glyph, 0);
    assert_near(f64::from(fraction), 0.5);
}

#[test]
fn geometry_hit_test_clamps_outside_points() {
    let (mut engine, id) = engine_with_container(200.0, 0.0);
    let text = "ab";
    // Far below and right of all text: last glyph, trailing edge.
    let (glyph, fraction) = engine
        .hit_test_point(text, Point::new(1000.0, 1000.0), id)
        .unwrap();
    assert_eq!(glyph, 1);
    assert_near(f64::from(fraction), 1.0);
    // Left of the line: first glyph, leading edge.
    let (glyph, fraction) = engine
        .hit_test_point(text, Point::new(-5.0, 5.0), id)
        .unwrap();
    assert_eq!(glyph, 0);
    assert_near(f64::from(fraction), 0.0);
}

#[test]
fn geometry_rects_cover_each_line_touched() {
    let (mut engine, id) = engine_with_container(50.0, 0.0);
    let text = "hello world";
    let rects = engine.rects_for_char_range(text, 0..11, None, id);
    assert_eq!(rects.len(), 2);
    assert_near(rects[0].x1, 48.0);
    assert_near(rects[1].x1, 49.2);
}

#[test]
fn geometry_rects_clip_to_selection() {
    let (mut engine, id) = engine_with_container(50.0, 0.0);
    let text = "hello world";
    let rects = engine.rects_for_char_range(text, 0..11, Some(3..8), id);
    assert_eq!(rects.len(), 2);
    // Line one: glyphs 3..5, from the second 'l' to the end of "hello".
    assert_near(rects[0].x0, 28.8);
    assert_near(rects[0].x1, 48.0);
    // Line two: glyphs 5..8, from the leading space up to 'r'.
    assert_near(rects[1].x0, 0.0);
    assert_near(rects[1].x1, 21.6);
}

#[test]
fn geometry_rects_out_of_range_are_empty() {
    let (mut engine, id) = engine_with_container(50.0, 0.0);
    let rects = engine.rects_for_char_range("hi", 40..50, None, id);
    assert!(rects.is_empty());
}

#[test]
fn geometry_bounding_rect_unions_lines() {
    let (mut engine, id) = engine_with_container(50.0, 0.0);
    let text = "hello world";
    engine.ensure_layout(text);
    let count = engine.glyph_count();
    let bounds = engine.bounding_rect(text, 0..count, id);
    assert_near(bounds.x0, 0.0);
    assert_near(bounds.y0, 0.0);
    assert_near(bounds.x1, 49.2);
    assert_near(bounds.y1, 2.0 * LINE_HEIGHT);
}

#[test]
fn geometry_glyph_location_is_baseline_origin() {
    let (mut engine, _id) = engine_with_container(50.0, 0.0);
    let point = engine.glyph_location("hello world", 6).unwrap();
    // Glyph 6 ('w') is second on line two, after the 3.0-wide space.
    assert_near(point.x, 3.0);
    assert_near(point.y, LINE_HEIGHT + 8.0);
}

#[test]
fn geometry_glyph_range_for_rect_round_trips() {
    let (mut engine, id) = engine_with_container(50.0, 0.0);
    let text = "hello world";
    let band = Rect::new(0.0, LINE_HEIGHT, 50.0, 2.0 * LINE_HEIGHT);
    assert_eq!(engine.glyph_range_for_rect(text, band, id), 5..11);
}

#[test]
fn geometry_decomposition_maps_one_char_to_two_glyphs() {
    let (mut engine, _) = engine_with_container(200.0, 0.0);
    let text = "é";
    engine.ensure_layout(text);
    assert_eq!(engine.glyph_count(), 2);
    let len = text.len();
    assert_eq!(engine.char_glyph_map().glyph_range_for_chars(0..len), 0..2);
    assert_eq!(engine.char_glyph_map().char_range_for_glyphs(1..2), 0..len);
}
