//! ShadowRaster: offset, blurred copies of an outline in a single color
//!
//! Every raster is laid out in a padded buffer: the outline sits at
//! `(padding, padding)` and the buffer is `padding` pixels larger on every
//! side, where `padding = ceil(elevation + blur_radius)`. That margin holds
//! both the diagonal offset and the soft edge of the blur.

use glam::Vec2;
use tiny_skia::{BlendMode, FillRule, Mask, MaskType, Pixmap, PixmapPaint, Transform};

use super::geometry::Outline;
use super::{blur, new_pixmap, padded_size, solid_paint};
use crate::errors::RenderError;
use crate::style::{LightSource, Style, Theme};
use crate::types::Color;

/// Which side of the outline a cached layer is drawn on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShadowLayer {
    /// Light and dark silhouettes outside the outline (raised look).
    Outer,
    /// Light and dark rims inside the outline (recessed look).
    Inner,
}

/// What gets filled before blurring
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Coverage {
    /// The outline itself.
    Silhouette,
    /// Everything in the buffer except the outline.
    Frame,
}

impl Coverage {
    fn complement(self) -> Coverage {
        match self {
            Coverage::Silhouette => Coverage::Frame,
            Coverage::Frame => Coverage::Silhouette,
        }
    }
}

impl ShadowLayer {
    /// Shape painted for each half of the pair; the layer is then clipped to
    /// the complement of this coverage.
    pub fn coverage(self) -> Coverage {
        match self {
            ShadowLayer::Outer => Coverage::Silhouette,
            ShadowLayer::Inner => Coverage::Frame,
        }
    }
}

/// Renders the light/dark halves of a shadow pair for one outline
#[derive(Clone, Debug)]
pub struct ShadowRaster {
    outline: Outline,
    theme: Theme,
    style: Style,
    light_source: LightSource,
}

impl ShadowRaster {
    /// `outline` is expected at the origin (see [`super::compute_outline`]).
    pub fn new(outline: Outline, theme: Theme, style: Style, light_source: LightSource) -> Self {
        Self {
            outline,
            theme,
            style,
            light_source,
        }
    }

    pub fn padding(&self) -> u32 {
        self.style.padding().max(0) as u32
    }

    /// Outline size plus padding on every side. Fails if the total overflows `u32`.
    pub fn buffer_size(&self) -> Result<(u32, u32), RenderError> {
        let size = self.outline.size();
        padded_size(size.x as u32, size.y as u32, self.padding())
    }

    /// The outline as positioned inside the padded buffer.
    pub fn placed_outline(&self) -> Outline {
        self.outline.translated(Vec2::splat(self.padding() as f32))
    }

    /// Displacement of the light half; the dark half uses the negation.
    pub fn light_offset(&self) -> Vec2 {
        self.light_source.toward_light() * self.style.offset()
    }

    /// Fill `coverage` in `color`, shifted by `offset`, then blur.
    ///
    /// The result is unclipped; [`ShadowRaster::render_layer`] applies the clip.
    pub fn render(
        &self,
        color: Color,
        offset: Vec2,
        coverage: Coverage,
    ) -> Result<Pixmap, RenderError> {
        let (width, height) = self.buffer_size()?;
        let mut pixmap = new_pixmap(width, height)?;
        self.paint_coverage(&mut pixmap, color, offset, coverage)?;
        blur::blur_in_place(&mut pixmap, self.style.blur_radius());
        Ok(pixmap)
    }

    /// Both halves of the pair composited (light first) and clipped to one
    /// side of the outline.
    ///
    /// The outer layer has the light silhouette toward the light source and
    /// the dark one away from it. The inner layer paints frames instead, so the
    /// dark rim lands on the interior edge nearest the light and the light rim
    /// on the far edge.
    pub fn render_layer(&self, layer: ShadowLayer) -> Result<Pixmap, RenderError> {
        let coverage = layer.coverage();
        let offset = self.light_offset();

        let mut pixmap = self.render(self.theme.light, offset, coverage)?;
        let dark = self.render(self.theme.dark, -offset, coverage)?;
        pixmap.draw_pixmap(
            0,
            0,
            dark.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );

        let clip = self.clip_mask(coverage.complement())?;
        pixmap.apply_mask(&clip);

        crate::log::debug!(
            "rendered {:?} shadow layer {}x{} (elevation {}, blur {})",
            layer,
            pixmap.width(),
            pixmap.height(),
            self.style.elevation(),
            self.style.blur_radius()
        );
        Ok(pixmap)
    }

    fn clip_mask(&self, coverage: Coverage) -> Result<Mask, RenderError> {
        let (width, height) = self.buffer_size()?;
        let mut mask_pixmap = new_pixmap(width, height)?;
        self.paint_coverage(&mut mask_pixmap, Color::BLACK, Vec2::ZERO, coverage)?;
        Ok(Mask::from_pixmap(mask_pixmap.as_ref(), MaskType::Alpha))
    }

    fn paint_coverage(
        &self,
        pixmap: &mut Pixmap,
        color: Color,
        offset: Vec2,
        coverage: Coverage,
    ) -> Result<(), RenderError> {
        let path = self.placed_outline().translated(offset).to_path()?;
        let mut paint = solid_paint(color);

        match coverage {
            Coverage::Silhouette => {
                pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
            }
            Coverage::Frame => {
                pixmap.fill(color.to_skia());
                paint.blend_mode = BlendMode::Clear;
                pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::compute_outline;
    use crate::style::Appearance;
    use crate::types::Bounds;

    fn raster(light_source: LightSource) -> ShadowRaster {
        let outline = compute_outline(Bounds::new(100, 60), &Appearance::rounded(12.0));
        ShadowRaster::new(
            outline,
            Theme::new(Color::WHITE, Color::BLACK),
            Style::new(6.0, 8.0).unwrap(),
            light_source,
        )
    }

    fn pixel(pixmap: &Pixmap, x: u32, y: u32) -> (u8, u8) {
        let p = pixmap.pixel(x, y).unwrap();
        (p.alpha(), p.demultiply().red())
    }

    #[test]
    fn buffer_holds_offset_and_blur() {
        let raster = raster(LightSource::TopLeft);
        assert_eq!(raster.padding(), 14);
        assert_eq!(raster.buffer_size().unwrap(), (128, 88));
        assert_eq!(raster.placed_outline().origin(), Vec2::splat(14.0));
    }

    #[test]
    fn oversized_padding_fails_to_allocate() {
        let outline = compute_outline(Bounds::new(100, 60), &Appearance::rounded(12.0));
        let style = Style::new(3.0e9, 0.0).unwrap();
        let raster = ShadowRaster::new(outline, Theme::default(), style, LightSource::TopLeft);

        assert_eq!(raster.padding(), i32::MAX as u32);
        assert!(matches!(raster.buffer_size(), Err(RenderError::Allocation { .. })));
        assert!(matches!(
            raster.render_layer(ShadowLayer::Outer),
            Err(RenderError::Allocation { .. })
        ));
    }

    #[test]
    fn outer_layer_is_light_toward_the_light() {
        let layer = raster(LightSource::TopLeft).render_layer(ShadowLayer::Outer).unwrap();

        // Outline spans (14,14)..(114,74) in the buffer
        let (inside, _) = pixel(&layer, 64, 44);
        assert_eq!(inside, 0);

        let (above_alpha, above_red) = pixel(&layer, 64, 12);
        let (below_alpha, below_red) = pixel(&layer, 64, 76);
        assert!(above_alpha > 0 && below_alpha > 0);
        assert!(above_red > below_red, "{above_red} vs {below_red}");
    }

    #[test]
    fn light_source_flips_the_pair() {
        let layer = raster(LightSource::BottomRight).render_layer(ShadowLayer::Outer).unwrap();
        let (_, above_red) = pixel(&layer, 64, 12);
        let (_, below_red) = pixel(&layer, 64, 76);
        assert!(above_red < below_red, "{above_red} vs {below_red}");
    }

    #[test]
    fn inner_layer_stays_inside_the_outline() {
        let layer = raster(LightSource::TopLeft).render_layer(ShadowLayer::Inner).unwrap();

        let (outside, _) = pixel(&layer, 64, 8);
        assert_eq!(outside, 0);
        let (center, _) = pixel(&layer, 64, 44);
        assert_eq!(center, 0);

        let (top_alpha, top_red) = pixel(&layer, 64, 16);
        let (bottom_alpha, bottom_red) = pixel(&layer, 64, 72);
        assert!(top_alpha > 0 && bottom_alpha > 0);
        assert!(top_red < bottom_red, "{top_red} vs {bottom_red}");
    }

    #[test]
    fn layers_are_deterministic() {
        let raster = raster(LightSource::TopLeft);
        let a = raster.render_layer(ShadowLayer::Inner).unwrap();
        let b = raster.render_layer(ShadowLayer::Inner).unwrap();
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn single_render_is_one_blurred_silhouette() {
        let raster = raster(LightSource::TopLeft);
        let pixmap = raster.render(Color::BLACK, Vec2::ZERO, Coverage::Silhouette).unwrap();
        assert_eq!(pixel(&pixmap, 64, 44).0, 255);
        assert_eq!(pixel(&pixmap, 0, 0).0, 0);
    }

    #[test]
    fn degenerate_outline_fails_to_render() {
        let outline = compute_outline(Bounds::new(0, 50), &Appearance::rounded(4.0));
        let style = Style::new(4.0, 2.0).unwrap();
        let raster = ShadowRaster::new(outline, Theme::default(), style, LightSource::TopLeft);
        assert_eq!(raster.render_layer(ShadowLayer::Outer).unwrap_err(), RenderError::InvalidPath);
    }
}
