//! Shadow rendering pipeline
//!
//! This module is organized into submodules:
//! - `defaults`: Default sizes and settings
//! - `geometry`: Outline computation and path creation
//! - `blur`: Box-blur approximation of a Gaussian
//! - `raster`: Offset, blurred and clipped shadow layers
//! - `variant`: Flat / Pressed / Basin composition rules

pub mod blur;
pub mod defaults;
pub mod geometry;
pub mod raster;
pub mod variant;

// Re-export commonly used items
pub use geometry::{Outline, OutlineShape, compute_outline};
pub use raster::{Coverage, ShadowLayer, ShadowRaster};
pub use variant::{Basin, Contribution, Flat, Pressed, ShapeVariant, VariantBehavior};

use tiny_skia::{Paint, Pixmap};

use crate::errors::RenderError;
use crate::types::Color;

/// Allocate a transparent pixmap, mapping failure to a render error.
pub(crate) fn new_pixmap(width: u32, height: u32) -> Result<Pixmap, RenderError> {
    Pixmap::new(width, height).ok_or(RenderError::Allocation { width, height })
}

/// `width` × `height` grown by `pad` on every side.
///
/// Sizes that do not fit in `u32` are reported as an allocation failure.
pub(crate) fn padded_size(width: u32, height: u32, pad: u32) -> Result<(u32, u32), RenderError> {
    let grow = |side: u32| pad.checked_mul(2).and_then(|both| side.checked_add(both));
    match (grow(width), grow(height)) {
        (Some(width), Some(height)) => Ok((width, height)),
        (width, height) => Err(RenderError::Allocation {
            width: width.unwrap_or(u32::MAX),
            height: height.unwrap_or(u32::MAX),
        }),
    }
}

/// Anti-aliased solid paint.
pub(crate) fn solid_paint(color: Color) -> Paint<'static> {
    let mut paint = Paint {
        anti_alias: true,
        ..Default::default()
    };
    paint.set_color(color.to_skia());
    paint
}
