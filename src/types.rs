//! Strongly-typed primitives shared by the style model and the renderer.
//!
//! Colors are packed integers so that they hash and compare exactly, which the
//! shadow cache relies on. Bounds and insets are whole pixels.

use std::fmt;

use crate::errors::ConfigError;

/// Reject NaN and infinite values coming from callers.
#[inline]
pub(crate) fn check_finite(field: &'static str, value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFinite { field, value })
    }
}

/// Non-negative lengths clamp rather than fail: a negative radius or
/// elevation means "none".
#[inline]
pub(crate) fn clamp_non_negative(value: f32) -> f32 {
    if value > 0.0 { value } else { 0.0 }
}

/// Color packed as 0xAARRGGBB (non-premultiplied).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Color(pub u32);

impl Color {
    pub const TRANSPARENT: Color = Color(0x0000_0000);
    pub const WHITE: Color = Color(0xFFFF_FFFF);
    pub const BLACK: Color = Color(0xFF00_0000);

    #[inline]
    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Color {
        Color((a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color::argb(0xFF, r, g, b)
    }

    /// Parse `#RRGGBB` or `#AARRGGBB`.
    pub fn from_hex(literal: &str) -> Result<Color, ConfigError> {
        let invalid = || ConfigError::InvalidColor(literal.to_string());
        let digits = literal.strip_prefix('#').ok_or_else(invalid)?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let value = u32::from_str_radix(digits, 16).map_err(|_| invalid())?;
        match digits.len() {
            6 => Ok(Color(0xFF00_0000 | value)),
            8 => Ok(Color(value)),
            _ => Err(invalid()),
        }
    }

    #[inline]
    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    #[inline]
    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub const fn blue(self) -> u8 {
        self.0 as u8
    }

    #[inline]
    pub const fn with_alpha(self, alpha: u8) -> Color {
        Color((self.0 & 0x00FF_FFFF) | (alpha as u32) << 24)
    }

    /// Scale this color's alpha by a 0..=255 opacity.
    pub fn modulate_alpha(self, alpha: u8) -> Color {
        // 0..=255 to 0..=256 so that 255 is an exact identity
        let scale = alpha as u32 + (alpha as u32 >> 7);
        self.with_alpha(((self.alpha() as u32 * scale) >> 8) as u8)
    }

    pub fn is_transparent(self) -> bool {
        self.alpha() == 0
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.red(), self.green(), self.blue(), self.alpha())
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}

/// Per-side insets in whole pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Insets {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Insets {
    pub const ZERO: Insets = Insets::new(0, 0, 0, 0);

    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub const fn uniform(inset: i32) -> Self {
        Self::new(inset, inset, inset, inset)
    }
}

/// Size of a drawing area in whole pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Bounds {
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Nothing can be drawn into a zero or negative area.
    #[inline]
    pub const fn is_degenerate(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Shrink by `insets`. The result may be degenerate.
    pub const fn inset(self, insets: Insets) -> Bounds {
        Bounds {
            width: self.width.saturating_sub(insets.left).saturating_sub(insets.right),
            height: self.height.saturating_sub(insets.top).saturating_sub(insets.bottom),
        }
    }

    /// Half of the shorter side: the largest corner radius that still fits.
    #[inline]
    pub fn max_corner_radius(self) -> f32 {
        (self.width.min(self.height).max(0) as f32) / 2.0
    }
}
