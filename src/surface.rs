//! ShapeSurface: the mutable object a host element owns
//!
//! A surface holds the current style values and two flags:
//! - `dirty`: the outline and shadow layers must be rebuilt. Set by changes
//!   to appearance, theme, style, variant, light source, insets and bounds.
//! - `composite_dirty`: only the final image must be recomposed. Set by
//!   press, z, alpha, paint and background changes.
//!
//! Setters compare against the current value and leave both flags alone
//! when nothing changed. [`ShapeSurface::render`] does at most one rebuild
//! and one composite per call and otherwise hands back the previous result.

use std::sync::Arc;

use glam::{IVec2, Vec2, ivec2, vec2};
use tiny_skia::{FillRule, FilterQuality, Mask, Pixmap, PixmapPaint, Stroke, Transform};

use crate::cache::{CacheKey, ShadowCache};
use crate::errors::{ConfigError, RenderError};
use crate::render::variant::clamp_press;
use crate::render::{
    Outline, ShadowLayer, ShadowRaster, ShapeVariant, VariantBehavior, compute_outline, defaults,
    new_pixmap, padded_size, solid_paint,
};
use crate::style::{Appearance, LightSource, PaintStyle, Style, Theme, VariantKind};
use crate::types::{Bounds, Color, Insets, check_finite, clamp_non_negative};

/// Work counters, for observing that unchanged state does no work
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SurfaceStats {
    /// Outline recomputations.
    pub outline_builds: u64,
    /// Shadow layers fetched from the cache (hit or miss) after a rebuild.
    pub shadow_updates: u64,
    /// Final images composed.
    pub composites: u64,
}

/// Result of [`ShapeSurface::render`]
#[derive(Clone, Debug, Default)]
pub struct Rendered {
    image: Option<Arc<Pixmap>>,
    origin: IVec2,
    outline: Option<Outline>,
}

impl Rendered {
    /// Composed image, or `None` for degenerate bounds.
    pub fn image(&self) -> Option<&Arc<Pixmap>> {
        self.image.as_ref()
    }

    /// Where the image's top-left pixel goes in host coordinates. Negative
    /// when shadows extend past the host's bounds.
    pub fn origin(&self) -> IVec2 {
        self.origin
    }

    /// Outline in host coordinates, for clipping the host's own content.
    pub fn outline(&self) -> Option<&Outline> {
        self.outline.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.image.is_none()
    }
}

#[derive(Clone, Debug, Default)]
struct Layers {
    outer: Option<Arc<Pixmap>>,
    inner: Option<Arc<Pixmap>>,
}

impl Layers {
    fn slot(&mut self, layer: ShadowLayer) -> &mut Option<Arc<Pixmap>> {
        match layer {
            ShadowLayer::Outer => &mut self.outer,
            ShadowLayer::Inner => &mut self.inner,
        }
    }

    fn get(&self, layer: ShadowLayer) -> Option<&Arc<Pixmap>> {
        match layer {
            ShadowLayer::Outer => self.outer.as_ref(),
            ShadowLayer::Inner => self.inner.as_ref(),
        }
    }
}

#[derive(Debug)]
pub struct ShapeSurface {
    cache: Arc<ShadowCache>,

    appearance: Appearance,
    theme: Theme,
    style: Style,
    variant: ShapeVariant,
    light_source: LightSource,
    insets: Insets,
    bounds: Bounds,

    press_fraction: f32,
    translation_z: f32,
    alpha: u8,
    fill_color: Color,
    stroke_color: Color,
    stroke_width: f32,
    paint_style: PaintStyle,
    background: Option<Arc<Pixmap>>,

    dirty: bool,
    composite_dirty: bool,
    outline: Option<Outline>,
    layers: Layers,
    last: Rendered,
    stats: SurfaceStats,
}

impl ShapeSurface {
    /// A surface with default style and empty bounds, drawing its shadows
    /// through `cache`.
    pub fn new(cache: Arc<ShadowCache>) -> Self {
        Self {
            cache,
            appearance: Appearance::default(),
            theme: Theme::default(),
            style: Style::default(),
            variant: ShapeVariant::default(),
            light_source: LightSource::default(),
            insets: Insets::ZERO,
            bounds: Bounds::default(),
            press_fraction: 0.0,
            translation_z: 0.0,
            alpha: defaults::ALPHA,
            fill_color: defaults::FILL_COLOR,
            stroke_color: defaults::STROKE_COLOR,
            stroke_width: defaults::STROKE_WIDTH,
            paint_style: PaintStyle::default(),
            background: None,
            dirty: true,
            composite_dirty: true,
            outline: None,
            layers: Layers::default(),
            last: Rendered::default(),
            stats: SurfaceStats::default(),
        }
    }

    /// Independent copy with the same parameters and cache. The copy starts
    /// dirty and renders on its own schedule.
    pub fn duplicate(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            background: self.background.clone(),
            outline: None,
            layers: Layers::default(),
            last: Rendered::default(),
            stats: SurfaceStats::default(),
            dirty: true,
            composite_dirty: true,
            ..*self
        }
    }

    // ------------------------------------------------------------------------
    // Geometry and raster parameters
    // ------------------------------------------------------------------------

    pub fn set_appearance(&mut self, appearance: Appearance) {
        if self.appearance != appearance {
            self.appearance = appearance;
            self.dirty = true;
        }
    }

    pub fn set_theme(&mut self, theme: Theme) {
        if self.theme != theme {
            self.theme = theme;
            self.dirty = true;
        }
    }

    pub fn set_style(&mut self, style: Style) {
        if self.style != style {
            self.style = style;
            self.dirty = true;
        }
    }

    pub fn set_variant(&mut self, kind: VariantKind) {
        if self.variant.kind() != kind {
            self.variant = ShapeVariant::from(kind);
            self.dirty = true;
        }
    }

    pub fn set_light_source(&mut self, light_source: LightSource) {
        if self.light_source != light_source {
            self.light_source = light_source;
            self.dirty = true;
        }
    }

    pub fn set_insets(&mut self, insets: Insets) {
        if self.insets != insets {
            self.insets = insets;
            self.dirty = true;
        }
    }

    /// The host was resized. Always invalidates.
    pub fn on_bounds_changed(&mut self, bounds: Bounds) {
        self.bounds = bounds;
        self.dirty = true;
    }

    // ------------------------------------------------------------------------
    // Composite-only parameters
    // ------------------------------------------------------------------------

    /// 0 is fully raised, 1 fully pressed. Clamped; NaN counts as 0.
    pub fn set_press_fraction(&mut self, press: f32) {
        let press = clamp_press(press);
        if self.press_fraction != press {
            self.press_fraction = press;
            self.composite_dirty = true;
        }
    }

    /// Lift (positive) or lower (negative) the surface relative to its elevation.
    pub fn set_translation_z(&mut self, translation_z: f32) -> Result<(), ConfigError> {
        let translation_z = check_finite("translation_z", translation_z)?;
        if self.translation_z != translation_z {
            self.translation_z = translation_z;
            self.composite_dirty = true;
        }
        Ok(())
    }

    pub fn set_z(&mut self, z: f32) -> Result<(), ConfigError> {
        let z = check_finite("z", z)?;
        self.set_translation_z(z - self.style.elevation())
    }

    pub fn set_alpha(&mut self, alpha: u8) {
        if self.alpha != alpha {
            self.alpha = alpha;
            self.composite_dirty = true;
        }
    }

    pub fn set_fill_color(&mut self, color: Color) {
        if self.fill_color != color {
            self.fill_color = color;
            self.composite_dirty = true;
        }
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        if self.stroke_color != color {
            self.stroke_color = color;
            self.composite_dirty = true;
        }
    }

    /// Negative widths clamp to 0, which draws no stroke.
    pub fn set_stroke_width(&mut self, width: f32) -> Result<(), ConfigError> {
        let width = clamp_non_negative(check_finite("stroke_width", width)?);
        if self.stroke_width != width {
            self.stroke_width = width;
            self.composite_dirty = true;
        }
        Ok(())
    }

    pub fn set_stroke(&mut self, color: Color, width: f32) -> Result<(), ConfigError> {
        self.set_stroke_width(width)?;
        self.set_stroke_color(color);
        Ok(())
    }

    pub fn set_paint_style(&mut self, paint_style: PaintStyle) {
        if self.paint_style != paint_style {
            self.paint_style = paint_style;
            self.composite_dirty = true;
        }
    }

    /// Image scaled to the shape and clipped to its outline, drawn over the fill.
    pub fn set_background(&mut self, background: Option<Arc<Pixmap>>) {
        let same = match (&self.background, &background) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if !same {
            self.background = background;
            self.composite_dirty = true;
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn appearance(&self) -> Appearance {
        self.appearance
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub fn variant(&self) -> VariantKind {
        self.variant.kind()
    }

    pub fn light_source(&self) -> LightSource {
        self.light_source
    }

    pub fn insets(&self) -> Insets {
        self.insets
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn press_fraction(&self) -> f32 {
        self.press_fraction
    }

    pub fn translation_z(&self) -> f32 {
        self.translation_z
    }

    pub fn z(&self) -> f32 {
        self.style.elevation() + self.translation_z
    }

    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    pub fn fill_color(&self) -> Color {
        self.fill_color
    }

    pub fn stroke_color(&self) -> Color {
        self.stroke_color
    }

    pub fn stroke_width(&self) -> f32 {
        self.stroke_width
    }

    pub fn paint_style(&self) -> PaintStyle {
        self.paint_style
    }

    pub fn cache(&self) -> &Arc<ShadowCache> {
        &self.cache
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn stats(&self) -> SurfaceStats {
        self.stats
    }

    /// Press used at composite time: the press fraction, or how far the
    /// surface has been lowered below its elevation, whichever is larger.
    pub fn effective_press(&self) -> f32 {
        let elevation = self.style.elevation();
        let lowered = if elevation > 0.0 {
            (-self.translation_z / elevation).clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.press_fraction.max(lowered)
    }

    /// Current handle to a shadow layer, if it has been fetched since the last rebuild.
    pub fn layer(&self, layer: ShadowLayer) -> Option<&Arc<Pixmap>> {
        self.layers.get(layer)
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    /// Bring the surface up to date and return the composed image.
    ///
    /// On error the outline is kept and the next call recomposes.
    pub fn render(&mut self) -> Result<Rendered, RenderError> {
        if self.dirty {
            self.rebuild();
        }
        if self.composite_dirty {
            self.last = self.composite()?;
            self.composite_dirty = false;
        }
        Ok(self.last.clone())
    }

    fn area(&self) -> Bounds {
        self.bounds.inset(self.insets)
    }

    fn rebuild(&mut self) {
        let area = self.area();
        self.layers = Layers::default();
        self.dirty = false;
        self.composite_dirty = true;

        if area.is_degenerate() {
            crate::log::debug!(
                "degenerate shape area {}x{}, nothing to draw",
                area.width,
                area.height
            );
            self.outline = None;
            return;
        }

        self.outline = Some(compute_outline(area, &self.appearance));
        self.stats.outline_builds += 1;
        crate::log::trace!(
            "rebuilt {}x{} {:?} outline",
            area.width,
            area.height,
            self.appearance.family()
        );
    }

    fn shadow_layer(
        &mut self,
        outline: &Outline,
        layer: ShadowLayer,
    ) -> Result<Arc<Pixmap>, RenderError> {
        if let Some(existing) = self.layers.get(layer) {
            return Ok(Arc::clone(existing));
        }

        let key = CacheKey::new(
            self.area(),
            &self.appearance,
            self.theme,
            self.style,
            self.light_source,
            layer,
        );
        let raster = ShadowRaster::new(outline.clone(), self.theme, self.style, self.light_source);
        let pixmap = self.cache.get_or_try_create(&key, || raster.render_layer(layer))?;

        self.stats.shadow_updates += 1;
        *self.layers.slot(layer) = Some(Arc::clone(&pixmap));
        Ok(pixmap)
    }

    /// Fill, background image, shadow layers, stroke, in that order.
    fn composite(&mut self) -> Result<Rendered, RenderError> {
        let Some(outline) = self.outline.clone() else {
            return Ok(Rendered::default());
        };

        let pad = if self.style.casts_shadow() {
            self.style.padding().max(0)
        } else {
            0
        };
        let size = outline.size();
        let (width, height) = padded_size(size.x as u32, size.y as u32, pad as u32)?;
        let mut canvas = new_pixmap(width, height)?;
        let placed = outline.translated(Vec2::splat(pad as f32));
        let path = placed.to_path()?;
        let opacity = self.alpha as f32 / 255.0;

        if self.paint_style.has_fill() && !self.fill_color.is_transparent() {
            let paint = solid_paint(self.fill_color.modulate_alpha(self.alpha));
            canvas.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }

        if let Some(background) = &self.background {
            let mut clip =
                Mask::new(width, height).ok_or(RenderError::Allocation { width, height })?;
            clip.fill_path(&path, FillRule::Winding, true, Transform::identity());

            let scale = size / vec2(background.width() as f32, background.height() as f32);
            let transform = Transform::from_row(scale.x, 0.0, 0.0, scale.y, pad as f32, pad as f32);
            let paint = PixmapPaint {
                opacity,
                quality: FilterQuality::Bilinear,
                ..Default::default()
            };
            canvas.draw_pixmap(0, 0, Pixmap::as_ref(background), &paint, transform, Some(&clip));
        }

        if self.style.casts_shadow() {
            let contributions = self.variant.contributions(self.effective_press());
            for contribution in contributions.iter().filter(|c| c.is_visible()) {
                let layer = self.shadow_layer(&outline, contribution.layer)?;
                let paint = PixmapPaint {
                    opacity: contribution.weight * opacity,
                    ..Default::default()
                };
                canvas.draw_pixmap(
                    0,
                    0,
                    Pixmap::as_ref(&layer),
                    &paint,
                    Transform::identity(),
                    None,
                );
            }
        }

        if self.paint_style.has_stroke()
            && self.stroke_width > 0.0
            && !self.stroke_color.is_transparent()
        {
            let paint = solid_paint(self.stroke_color.modulate_alpha(self.alpha));
            let stroke = Stroke {
                width: self.stroke_width,
                ..Default::default()
            };
            canvas.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }

        self.stats.composites += 1;
        Ok(Rendered {
            image: Some(Arc::new(canvas)),
            origin: ivec2(
                self.insets.left.saturating_sub(pad),
                self.insets.top.saturating_sub(pad),
            ),
            outline: Some(
                outline.translated(vec2(self.insets.left as f32, self.insets.top as f32)),
            ),
        })
    }
}
