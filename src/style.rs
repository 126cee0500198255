//! Style model: the plain values a host element forwards into a surface.
//!
//! All of these are cheap `Copy` values. A surface clones them freely; there is
//! no shared mutable style state.

use glam::{Vec2, vec2};

use crate::errors::ConfigError;
use crate::render::defaults;
use crate::types::{Bounds, Color, check_finite, clamp_non_negative};

/// How the corners of an outline are shaped
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum CornerFamily {
    #[default]
    Rounded,
    Oval,
}

impl CornerFamily {
    /// Map a host styling id (0 = rounded, 1 = oval).
    pub fn from_id(id: i32) -> Result<Self, ConfigError> {
        match id {
            0 => Ok(CornerFamily::Rounded),
            1 => Ok(CornerFamily::Oval),
            other => Err(ConfigError::UnknownCornerFamily(other)),
        }
    }
}

/// Four independent corner radii, in pixels.
///
/// Values are stored exactly as requested; clamping happens against concrete
/// bounds in [`CornerRadii::clamped`].
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct CornerRadii {
    pub top_left: f32,
    pub top_right: f32,
    pub bottom_left: f32,
    pub bottom_right: f32,
}

impl CornerRadii {
    pub const ZERO: CornerRadii = CornerRadii::uniform(0.0);

    pub const fn new(top_left: f32, top_right: f32, bottom_left: f32, bottom_right: f32) -> Self {
        Self {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
        }
    }

    pub const fn uniform(radius: f32) -> Self {
        Self::new(radius, radius, radius, radius)
    }

    pub fn is_uniform(&self) -> bool {
        self.top_left == self.top_right
            && self.top_left == self.bottom_left
            && self.top_left == self.bottom_right
    }

    /// Negative radii become 0, anything above `max` becomes `max`.
    pub fn clamped(self, max: f32) -> Self {
        let clamp = |r: f32| clamp_non_negative(r).min(max);
        Self {
            top_left: clamp(self.top_left),
            top_right: clamp(self.top_right),
            bottom_left: clamp(self.bottom_left),
            bottom_right: clamp(self.bottom_right),
        }
    }

    /// In clockwise order starting at the top-left corner.
    pub fn to_array(self) -> [f32; 4] {
        [self.top_left, self.top_right, self.bottom_right, self.bottom_left]
    }

    fn check_finite(self) -> Result<Self, ConfigError> {
        check_finite("top_left radius", self.top_left)?;
        check_finite("top_right radius", self.top_right)?;
        check_finite("bottom_left radius", self.bottom_left)?;
        check_finite("bottom_right radius", self.bottom_right)?;
        Ok(self)
    }
}

/// Corner family plus the radii used when the family is [`CornerFamily::Rounded`].
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Appearance {
    family: CornerFamily,
    radii: CornerRadii,
}

impl Appearance {
    /// Rounded rectangle with the same radius on every corner.
    pub const fn rounded(radius: f32) -> Self {
        Self {
            family: CornerFamily::Rounded,
            radii: CornerRadii::uniform(radius),
        }
    }

    /// Rounded rectangle with independent corner radii.
    pub const fn rounded_corners(radii: CornerRadii) -> Self {
        Self {
            family: CornerFamily::Rounded,
            radii,
        }
    }

    /// Ellipse inscribed in the bounds.
    pub const fn oval() -> Self {
        Self {
            family: CornerFamily::Oval,
            radii: CornerRadii::ZERO,
        }
    }

    pub fn builder() -> AppearanceBuilder {
        AppearanceBuilder::default()
    }

    pub fn family(&self) -> CornerFamily {
        self.family
    }

    /// Requested radii (unclamped).
    pub fn radii(&self) -> CornerRadii {
        self.radii
    }

    /// Radii actually used for `bounds`, each at most half the shorter side.
    pub fn effective_radii(&self, bounds: Bounds) -> CornerRadii {
        let max = bounds.max_corner_radius();
        match self.family {
            CornerFamily::Rounded => self.radii.clamped(max),
            CornerFamily::Oval => CornerRadii::uniform(max),
        }
    }
}

/// Validating builder for [`Appearance`], for values coming from a styling system.
#[derive(Clone, Debug, Default)]
pub struct AppearanceBuilder {
    family: CornerFamily,
    radius: Option<f32>,
    radii: Option<CornerRadii>,
}

impl AppearanceBuilder {
    pub fn family(mut self, family: CornerFamily) -> Self {
        self.family = family;
        self
    }

    pub fn corner_radius(mut self, radius: f32) -> Self {
        self.radius = Some(radius);
        self
    }

    pub fn corner_radii(mut self, radii: CornerRadii) -> Self {
        self.radii = Some(radii);
        self
    }

    pub fn build(self) -> Result<Appearance, ConfigError> {
        let radii = match (self.radius, self.radii) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::UnsupportedCombination {
                    family: self.family,
                    detail: "both a uniform radius and per-corner radii were given",
                });
            }
            (Some(r), None) => CornerRadii::uniform(check_finite("corner radius", r)?),
            (None, Some(radii)) => radii.check_finite()?,
            (None, None) => CornerRadii::ZERO,
        };

        match self.family {
            CornerFamily::Rounded => Ok(Appearance::rounded_corners(radii)),
            CornerFamily::Oval if self.radii.is_some() => Err(ConfigError::UnsupportedCombination {
                family: CornerFamily::Oval,
                detail: "oval outlines do not take per-corner radii",
            }),
            // A uniform size on an oval is ignored: the ellipse always fills the bounds.
            CornerFamily::Oval => Ok(Appearance::oval()),
        }
    }
}

/// Colors of the raised (light) and recessed (dark) shadow halves
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Theme {
    pub light: Color,
    pub dark: Color,
}

impl Theme {
    pub const fn new(light: Color, dark: Color) -> Self {
        Self { light, dark }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::new(defaults::LIGHT_COLOR, defaults::DARK_COLOR)
    }
}

/// Shadow spread and softness, in pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Style {
    elevation: f32,
    blur_radius: f32,
}

impl Style {
    /// Negative values are clamped to 0; NaN and infinities are rejected.
    pub fn new(elevation: f32, blur_radius: f32) -> Result<Self, ConfigError> {
        let elevation = check_finite("elevation", elevation)?;
        let blur_radius = check_finite("blur_radius", blur_radius)?;
        Ok(Self {
            elevation: clamp_non_negative(elevation),
            blur_radius: clamp_non_negative(blur_radius),
        })
    }

    pub fn elevation(&self) -> f32 {
        self.elevation
    }

    pub fn blur_radius(&self) -> f32 {
        self.blur_radius
    }

    /// Elevation 0 draws no shadow at all.
    pub fn casts_shadow(&self) -> bool {
        self.elevation > 0.0
    }

    /// Per-axis displacement of each shadow half from the outline.
    pub fn offset(&self) -> f32 {
        self.elevation / 2.0
    }

    /// Margin around the shape that holds the offset and the blurred edge.
    pub fn padding(&self) -> i32 {
        (self.elevation + self.blur_radius).ceil() as i32
    }
}

impl Default for Style {
    fn default() -> Self {
        Self {
            elevation: defaults::ELEVATION,
            blur_radius: defaults::BLUR_RADIUS,
        }
    }
}

/// Corner the light is assumed to come from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum LightSource {
    #[default]
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl LightSource {
    /// Map a host styling id (0 = left-top, 1 = left-bottom, 2 = right-top, 3 = right-bottom).
    pub fn from_id(id: i32) -> Result<Self, ConfigError> {
        match id {
            0 => Ok(LightSource::TopLeft),
            1 => Ok(LightSource::BottomLeft),
            2 => Ok(LightSource::TopRight),
            3 => Ok(LightSource::BottomRight),
            other => Err(ConfigError::UnknownLightSource(other)),
        }
    }

    pub fn is_left(self) -> bool {
        matches!(self, LightSource::TopLeft | LightSource::BottomLeft)
    }

    pub fn is_top(self) -> bool {
        matches!(self, LightSource::TopLeft | LightSource::TopRight)
    }

    /// Unit diagonal (per axis) pointing from the shape toward the light, Y down.
    pub fn toward_light(self) -> Vec2 {
        vec2(
            if self.is_left() { -1.0 } else { 1.0 },
            if self.is_top() { -1.0 } else { 1.0 },
        )
    }
}

/// Which shadow composition a surface uses
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum VariantKind {
    /// Raised: shadows outside the outline.
    #[default]
    Flat,
    /// Engraved: shadows inside the outline.
    Pressed,
    /// Raised rim around a recessed interior.
    Basin,
}

impl VariantKind {
    /// Map a host styling id (0 = flat, 1 = pressed, 2 = basin).
    pub fn from_id(id: i32) -> Result<Self, ConfigError> {
        match id {
            0 => Ok(VariantKind::Flat),
            1 => Ok(VariantKind::Pressed),
            2 => Ok(VariantKind::Basin),
            other => Err(ConfigError::UnknownVariant(other)),
        }
    }
}

/// Whether the outline is filled, stroked, or both
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum PaintStyle {
    Fill,
    Stroke,
    #[default]
    FillAndStroke,
}

impl PaintStyle {
    pub fn has_fill(self) -> bool {
        matches!(self, PaintStyle::Fill | PaintStyle::FillAndStroke)
    }

    pub fn has_stroke(self) -> bool {
        matches!(self, PaintStyle::Stroke | PaintStyle::FillAndStroke)
    }
}
