//! Error types with diagnostics using miette
//!
//! Configuration errors are programming errors raised when a style value is
//! built. Render errors come out of raster generation.

use miette::Diagnostic;
use thiserror::Error;

use crate::style::CornerFamily;

// ============================================================================
// Configuration Errors
// ============================================================================

/// Errors raised while constructing style values
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be finite, got {value}")]
    #[diagnostic(code(neumorph::config::non_finite))]
    NonFinite { field: &'static str, value: f32 },

    #[error("unknown corner family id: {0}")]
    #[diagnostic(
        code(neumorph::config::unknown_corner_family),
        help("valid ids are 0 (rounded) and 1 (oval)")
    )]
    UnknownCornerFamily(i32),

    #[error("unknown shape variant id: {0}")]
    #[diagnostic(
        code(neumorph::config::unknown_variant),
        help("valid ids are 0 (flat), 1 (pressed) and 2 (basin)")
    )]
    UnknownVariant(i32),

    #[error("unknown light source id: {0}")]
    #[diagnostic(
        code(neumorph::config::unknown_light_source),
        help("valid ids are 0 (left-top), 1 (left-bottom), 2 (right-top) and 3 (right-bottom)")
    )]
    UnknownLightSource(i32),

    #[error("unsupported {family:?} configuration: {detail}")]
    #[diagnostic(code(neumorph::config::unsupported_combination))]
    UnsupportedCombination {
        family: CornerFamily,
        detail: &'static str,
    },

    #[error("invalid color literal: {0:?}")]
    #[diagnostic(
        code(neumorph::config::invalid_color),
        help("use #RRGGBB or #AARRGGBB")
    )]
    InvalidColor(String),
}

// ============================================================================
// Render Errors
// ============================================================================

/// Errors that occur while generating shadow rasters
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("cannot allocate a {width}x{height} raster")]
    #[diagnostic(code(neumorph::render::allocation))]
    Allocation { width: u32, height: u32 },

    #[error("outline cannot be converted to a fill path")]
    #[diagnostic(code(neumorph::render::invalid_path))]
    InvalidPath,
}
