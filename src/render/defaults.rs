//! Default sizes and settings (all in pixels)

use crate::types::Color;

pub const ELEVATION: f32 = 0.0;
pub const BLUR_RADIUS: f32 = 8.0;
pub const STROKE_WIDTH: f32 = 0.0;
pub const ALPHA: u8 = 255;
pub const LIGHT_COLOR: Color = Color::WHITE;
pub const DARK_COLOR: Color = Color::BLACK;
pub const FILL_COLOR: Color = Color::TRANSPARENT;
pub const STROKE_COLOR: Color = Color::TRANSPARENT;
/// Box passes used to approximate a Gaussian
pub const BLUR_PASSES: usize = 3;
pub const CACHE_MAX_BYTES: usize = 32 * 1024 * 1024;
pub const CACHE_MAX_ENTRIES: usize = 200;
