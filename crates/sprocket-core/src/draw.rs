//! Drawing primitives: [`Color`], the opaque [`Font`] handle, and the
//! [`Surface`] trait entities draw through in their `on_draw` hook.
//!
//! Coordinates are screen pixels with the origin at the top-left corner and
//! the y axis pointing down. Backends translate to whatever their device
//! expects.

use crate::math::Vec2;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// An RGBA color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(220, 50, 47);
    pub const GREEN: Color = Color::rgb(80, 200, 120);
    pub const BLUE: Color = Color::rgb(60, 120, 216);
    pub const YELLOW: Color = Color::rgb(240, 200, 60);
    /// Dark blue-gray, the default clear color while the engine is paused.
    pub const SLATE: Color = Color::rgb(47, 58, 74);

    /// Opaque color from RGB channels.
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Color from all four channels.
    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Channels as `[r, g, b, a]` floats in `0.0..=1.0`, the layout GPU
    /// backends consume.
    #[inline]
    pub fn as_f32_rgba(self) -> [f32; 4] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
            f32::from(self.a) / 255.0,
        ]
    }
}

// ---------------------------------------------------------------------------
// Font
// ---------------------------------------------------------------------------

/// An opaque font handle minted by a
/// [`FontProvider`](crate::capability::FontProvider).
///
/// `size` is the requested pixel height; `id` identifies the loaded face to
/// the backend that minted the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Font {
    id: u64,
    size: u32,
}

impl Font {
    pub fn new(id: u64, size: u32) -> Self {
        Self { id, size }
    }

    pub fn id(self) -> u64 {
        self.id
    }

    pub fn size(self) -> u32 {
        self.size
    }
}

// ---------------------------------------------------------------------------
// Surface
// ---------------------------------------------------------------------------

/// The draw target handed to every entity's `on_draw`.
///
/// A surface accumulates one frame's drawing; the owning window presents it
/// at the end of the frame. Implementations must not require draws to be
/// sorted or batched by the caller.
pub trait Surface {
    /// Surface width in pixels.
    fn width(&self) -> u32;

    /// Surface height in pixels.
    fn height(&self) -> u32;

    /// Flood the whole surface with `color`, discarding earlier draws this
    /// frame. The engine calls this once at the top of every frame.
    fn fill(&mut self, color: Color);

    /// Fill an axis-aligned rectangle. `origin` is the top-left corner.
    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Color);

    /// Fill a circle.
    fn fill_circle(&mut self, center: Vec2, radius: f64, color: Color);

    /// Draw `text` with its top-left corner at `origin`.
    fn draw_text(&mut self, font: Font, text: &str, origin: Vec2, color: Color);

    /// Draw `text` centered on `center`. Backends measure the rendered text
    /// themselves; callers never need font metrics.
    fn draw_text_centered(&mut self, font: Font, text: &str, center: Vec2, color: Color);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_is_opaque() {
        assert_eq!(Color::rgb(1, 2, 3).a, 255);
    }

    #[test]
    fn float_channels_are_normalized() {
        let c = Color::rgba(255, 0, 51, 255).as_f32_rgba();
        assert_eq!(c[0], 1.0);
        assert_eq!(c[1], 0.0);
        assert!((c[2] - 0.2).abs() < 1e-3);
        assert_eq!(c[3], 1.0);
    }

    #[test]
    fn font_handle_roundtrip() {
        let font = Font::new(7, 24);
        assert_eq!(font.id(), 7);
        assert_eq!(font.size(), 24);
    }
}
