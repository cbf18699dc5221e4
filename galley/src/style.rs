// Copyright 2025 the Galley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Trait for opaque per-run style payloads.
///
/// A brush travels from [`TextStorage`](crate::TextStorage) style runs through
/// the [`GlyphProvider`](crate::GlyphProvider) and back out of the drawing
/// hooks; the engine never interprets it.
pub trait Brush: Clone + PartialEq + Default + core::fmt::Debug {}

impl<T: Clone + PartialEq + Default + core::fmt::Debug> Brush for T {}
