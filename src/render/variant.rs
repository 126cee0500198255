//! Shape variants: how the outer and inner shadow layers are combined
//!
//! A variant never renders anything itself. It answers, for a press fraction
//! `p` in `[0, 1]`, which cached layers to draw and at what opacity. Pressing
//! only changes these weights, so interactive feedback never re-blurs.

use enum_dispatch::enum_dispatch;

use super::raster::ShadowLayer;
use crate::style::VariantKind;

/// One layer to composite and its opacity in `[0, 1]`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contribution {
    pub layer: ShadowLayer,
    pub weight: f32,
}

impl Contribution {
    const fn new(layer: ShadowLayer, weight: f32) -> Self {
        Self { layer, weight }
    }

    /// Zero-weight contributions are skipped entirely, including raster generation.
    pub fn is_visible(&self) -> bool {
        self.weight > 0.0
    }
}

/// Clamp a press fraction to `[0, 1]`; NaN counts as released.
pub fn clamp_press(press: f32) -> f32 {
    if press.is_nan() { 0.0 } else { press.clamp(0.0, 1.0) }
}

/// Composition rule shared by all variants
#[enum_dispatch]
pub trait VariantBehavior {
    fn kind(&self) -> VariantKind;

    /// Layers to draw for press fraction `press`, in draw order.
    fn contributions(&self, press: f32) -> [Contribution; 2];
}

/// Raised: shadows outside the outline, fading to the inner layer as it is pressed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flat;

/// Engraved: shadows inside the outline, fading to the outer layer as it is pressed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pressed;

/// Raised rim around a recessed interior.
///
/// The interior always carries the inner layer at full strength. The rim is
/// the outer layer, which flattens away as the shape is pressed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Basin;

impl VariantBehavior for Flat {
    fn kind(&self) -> VariantKind {
        VariantKind::Flat
    }

    fn contributions(&self, press: f32) -> [Contribution; 2] {
        let p = clamp_press(press);
        [
            Contribution::new(ShadowLayer::Outer, 1.0 - p),
            Contribution::new(ShadowLayer::Inner, p),
        ]
    }
}

impl VariantBehavior for Pressed {
    fn kind(&self) -> VariantKind {
        VariantKind::Pressed
    }

    fn contributions(&self, press: f32) -> [Contribution; 2] {
        let p = clamp_press(press);
        [
            Contribution::new(ShadowLayer::Inner, 1.0 - p),
            Contribution::new(ShadowLayer::Outer, p),
        ]
    }
}

impl VariantBehavior for Basin {
    fn kind(&self) -> VariantKind {
        VariantKind::Basin
    }

    fn contributions(&self, press: f32) -> [Contribution; 2] {
        let [rim, _] = Flat.contributions(press);
        let [interior, _] = Pressed.contributions(0.0);
        [rim, interior]
    }
}

/// The variant a surface composes with
#[enum_dispatch(VariantBehavior)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeVariant {
    Flat,
    Pressed,
    Basin,
}

impl Default for ShapeVariant {
    fn default() -> Self {
        ShapeVariant::Flat(Flat)
    }
}

impl From<VariantKind> for ShapeVariant {
    fn from(kind: VariantKind) -> Self {
        match kind {
            VariantKind::Flat => Flat.into(),
            VariantKind::Pressed => Pressed.into(),
            VariantKind::Basin => Basin.into(),
        }
    }
}
