//! Soft-shadow ("neumorphic") surface rendering.
//!
//! A [`ShapeSurface`] turns a rounded-rect or oval outline into an image
//! that looks raised above, or pressed into, its background. Two copies of
//! the outline, one in a light color offset toward the light source and one
//! in a dark color offset away from it, are blurred and clipped to either
//! side of the outline. Blurred layers live in a shared [`ShadowCache`], so
//! identical shapes never blur twice and pressing a shape only re-blends
//! cached layers.
//!
//! ```no_run
//! use std::sync::Arc;
//! use neumorph::{Appearance, Bounds, ShadowCache, ShapeSurface, Style};
//!
//! let cache = Arc::new(ShadowCache::default());
//! let mut surface = ShapeSurface::new(cache);
//! surface.set_appearance(Appearance::rounded(12.0));
//! surface.set_style(Style::new(6.0, 8.0)?);
//! surface.on_bounds_changed(Bounds::new(100, 60));
//!
//! let rendered = surface.render()?;
//! assert!(!rendered.is_empty());
//! # Ok::<(), miette::Report>(())
//! ```

pub mod cache;
pub mod errors;
mod log;
pub mod render;
pub mod style;
pub mod surface;
pub mod types;

pub use cache::{CacheConfig, CacheKey, CacheStats, ShadowCache};
pub use errors::{ConfigError, RenderError};
pub use render::{Outline, ShadowLayer, ShapeVariant, compute_outline};
pub use style::{
    Appearance, AppearanceBuilder, CornerFamily, CornerRadii, LightSource, PaintStyle, Style,
    Theme, VariantKind,
};
pub use surface::{Rendered, ShapeSurface, SurfaceStats};
pub use types::{Bounds, Color, Insets};
