// Copyright 2025 the Galley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Invalidation, incremental re-typesetting and redraw notifications.

use crate::util::{assert_near, engine_with_container, fragment_ranges, LINE_HEIGHT};

#[test]
fn invalidation_preserves_geometry_of_unrelated_text() {
    let (mut engine, id) = engine_with_container(50.0, 0.0);
    let text = "hello world";
    let before = engine.rects_for_char_range(text, 0..5, None, id);
    engine.invalidate_characters(6..11);
    assert!(!engine.is_clean());
    let after = engine.rects_for_char_range(text, 0..5, None, id);
    assert_eq!(before, after);
}

#[test]
fn invalidation_text_edit_reflows_following_lines() {
    let (mut engine, id) = engine_with_container(50.0, 0.0);
    assert_eq!(
        fragment_ranges(&mut engine, "hello world", id),
        vec![0..5, 5..11]
    );
    // Replace "hello" with "hi": both words now share line one.
    engine.text_edited(0..2, -3);
    assert_eq!(
        fragment_ranges(&mut engine, "hi world", id),
        vec![0..3, 3..8]
    );
}

#[test]
fn invalidation_queries_reflect_the_latest_text() {
    let (mut engine, id) = engine_with_container(200.0, 0.0);
    engine.ensure_layout("ab");
    engine.text_edited(2..4, 2);
    assert_eq!(fragment_ranges(&mut engine, "abcd", id), vec![0..4]);
    assert!(engine.is_clean());
}

#[test]
fn invalidation_edit_past_a_blank_line_keeps_it() {
    let (mut engine, id) = engine_with_container(200.0, 0.0);
    assert_eq!(
        fragment_ranges(&mut engine, "hello\n\nworld", id),
        vec![0..5, 5..5, 5..10]
    );
    // Replace the 'o' of "world" in place; the cut lands on the blank line
    // and both newlines survive the re-typeset.
    engine.text_edited(8..9, 0);
    let text = "hello\n\nwxrld";
    assert_eq!(
        fragment_ranges(&mut engine, text, id),
        vec![0..5, 5..5, 5..10]
    );
    let blank = engine.insertion_rect(text, 6, id);
    assert_near(blank.y0, LINE_HEIGHT);
}

#[test]
fn invalidation_display_notification_is_idempotent() {
    let (mut engine, _id) = engine_with_container(50.0, 0.0);
    engine.ensure_layout("hello world");
    let _ = engine.take_pending_redraw();
    engine.invalidate_display_characters(0..5);
    engine.invalidate_display_characters(0..5);
    let spans = engine.take_pending_redraw();
    assert_eq!(spans.as_slice(), &[0..5]);
    assert!(engine.take_pending_redraw().is_empty());
}

#[test]
fn invalidation_display_never_retypesets() {
    let (mut engine, _id) = engine_with_container(50.0, 0.0);
    engine.ensure_layout("hello world");
    engine.invalidate_display_characters(0..11);
    assert!(engine.is_clean());
}

#[test]
fn invalidation_layout_schedules_a_redraw() {
    let (mut engine, _id) = engine_with_container(50.0, 0.0);
    engine.ensure_layout("hello world");
    let spans = engine.take_pending_redraw();
    assert_eq!(spans.as_slice(), &[0..11]);
}

#[test]
fn invalidation_length_change_alone_triggers_layout() {
    let (mut engine, id) = engine_with_container(200.0, 0.0);
    engine.ensure_layout("ab");
    // No explicit invalidation, but the text is longer than last seen.
    assert_eq!(fragment_ranges(&mut engine, "abcd", id), vec![0..4]);
}
