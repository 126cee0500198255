//! Outline geometry: rounded-rect and oval outlines with clamped corner radii
//!
//! An [`Outline`] is the region that defines a shape's visible boundary. It is
//! used three ways: filled to produce shadow rasters, as a clip mask when
//! compositing, and handed back to the host for clipping its own content.

use std::fmt::Write as _;

use glam::{Vec2, vec2};
use tiny_skia::{Path, PathBuilder, Rect};

use crate::errors::RenderError;
use crate::style::{Appearance, CornerFamily, CornerRadii};
use crate::types::Bounds;

/// Cubic bezier approximation of a quarter circle: 4/3 * tan(π/8)
const KAPPA: f32 = 0.552_284_8;

/// Resolved corner shape of an outline
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OutlineShape {
    /// Ellipse inscribed in the outline rectangle.
    Oval,
    /// Rounded rectangle; radii are already clamped.
    Rounded(CornerRadii),
}

/// A closed outline positioned in pixel space
#[derive(Clone, Debug, PartialEq)]
pub struct Outline {
    origin: Vec2,
    size: Vec2,
    shape: OutlineShape,
}

/// Compute the outline for `bounds` placed at the origin.
///
/// Rounded corners use `min(requested, shorter_side / 2)`, with negative
/// requests treated as 0. Pure function of its inputs.
pub fn compute_outline(bounds: Bounds, appearance: &Appearance) -> Outline {
    let shape = match appearance.family() {
        CornerFamily::Oval => OutlineShape::Oval,
        CornerFamily::Rounded => OutlineShape::Rounded(appearance.effective_radii(bounds)),
    };
    Outline {
        origin: Vec2::ZERO,
        size: vec2(bounds.width.max(0) as f32, bounds.height.max(0) as f32),
        shape,
    }
}

impl Outline {
    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn shape(&self) -> OutlineShape {
        self.shape
    }

    pub fn family(&self) -> CornerFamily {
        match self.shape {
            OutlineShape::Oval => CornerFamily::Oval,
            OutlineShape::Rounded(_) => CornerFamily::Rounded,
        }
    }

    /// Clamped corner radii, or `None` for ovals.
    pub fn radii(&self) -> Option<CornerRadii> {
        match self.shape {
            OutlineShape::Oval => None,
            OutlineShape::Rounded(radii) => Some(radii),
        }
    }

    pub fn center(&self) -> Vec2 {
        self.origin + self.size * 0.5
    }

    pub fn translated(&self, offset: Vec2) -> Outline {
        Outline {
            origin: self.origin + offset,
            ..self.clone()
        }
    }

    /// Whether `point` lies inside the outline (edges included).
    pub fn contains(&self, point: Vec2) -> bool {
        let local = point - self.origin;
        let (w, h) = (self.size.x, self.size.y);
        if local.x < 0.0 || local.y < 0.0 || local.x > w || local.y > h {
            return false;
        }

        match self.shape {
            OutlineShape::Oval => {
                let half = self.size * 0.5;
                if half.x <= 0.0 || half.y <= 0.0 {
                    return false;
                }
                let d = (local - half) / half;
                d.length_squared() <= 1.0
            }
            OutlineShape::Rounded(r) => {
                let corners = [
                    (
                        r.top_left,
                        local.x < r.top_left && local.y < r.top_left,
                        vec2(r.top_left, r.top_left),
                    ),
                    (
                        r.top_right,
                        local.x > w - r.top_right && local.y < r.top_right,
                        vec2(w - r.top_right, r.top_right),
                    ),
                    (
                        r.bottom_right,
                        local.x > w - r.bottom_right && local.y > h - r.bottom_right,
                        vec2(w - r.bottom_right, h - r.bottom_right),
                    ),
                    (
                        r.bottom_left,
                        local.x < r.bottom_left && local.y > h - r.bottom_left,
                        vec2(r.bottom_left, h - r.bottom_left),
                    ),
                ];
                corners
                    .iter()
                    .filter(|(radius, in_corner, _)| *radius > 0.0 && *in_corner)
                    .all(|(radius, _, center)| local.distance_squared(*center) <= radius * radius)
            }
        }
    }

    /// Fill path for rasterization and clipping.
    pub fn to_path(&self) -> Result<Path, RenderError> {
        let (x, y) = (self.origin.x, self.origin.y);
        let (w, h) = (self.size.x, self.size.y);
        if w <= 0.0 || h <= 0.0 {
            return Err(RenderError::InvalidPath);
        }
        let rect = Rect::from_xywh(x, y, w, h).ok_or(RenderError::InvalidPath)?;

        match self.shape {
            OutlineShape::Oval => PathBuilder::from_oval(rect).ok_or(RenderError::InvalidPath),
            OutlineShape::Rounded(r) if r == CornerRadii::ZERO => Ok(PathBuilder::from_rect(rect)),
            OutlineShape::Rounded(r) => {
                let (right, bottom) = (x + w, y + h);
                let mut pb = PathBuilder::new();
                pb.move_to(x + r.top_left, y);

                // Top edge, top-right corner
                pb.line_to(right - r.top_right, y);
                if r.top_right > 0.0 {
                    let k = r.top_right * KAPPA;
                    pb.cubic_to(
                        right - r.top_right + k,
                        y,
                        right,
                        y + r.top_right - k,
                        right,
                        y + r.top_right,
                    );
                }

                // Right edge, bottom-right corner
                pb.line_to(right, bottom - r.bottom_right);
                if r.bottom_right > 0.0 {
                    let k = r.bottom_right * KAPPA;
                    pb.cubic_to(
                        right,
                        bottom - r.bottom_right + k,
                        right - r.bottom_right + k,
                        bottom,
                        right - r.bottom_right,
                        bottom,
                    );
                }

                // Bottom edge, bottom-left corner
                pb.line_to(x + r.bottom_left, bottom);
                if r.bottom_left > 0.0 {
                    let k = r.bottom_left * KAPPA;
                    pb.cubic_to(
                        x + r.bottom_left - k,
                        bottom,
                        x,
                        bottom - r.bottom_left + k,
                        x,
                        bottom - r.bottom_left,
                    );
                }

                // Left edge, top-left corner
                pb.line_to(x, y + r.top_left);
                if r.top_left > 0.0 {
                    let k = r.top_left * KAPPA;
                    pb.cubic_to(x, y + r.top_left - k, x + r.top_left - k, y, x + r.top_left, y);
                }

                pb.close();
                pb.finish().ok_or(RenderError::InvalidPath)
            }
        }
    }

    /// SVG path data for this outline, clockwise from the top edge.
    pub fn to_svg_path(&self) -> String {
        let (x, y) = (self.origin.x, self.origin.y);
        let (w, h) = (self.size.x, self.size.y);
        let (right, bottom) = (x + w, y + h);
        let mut d = String::new();

        match self.shape {
            OutlineShape::Oval => {
                let (rx, ry) = (w / 2.0, h / 2.0);
                let cy = y + ry;
                let _ = write!(
                    d,
                    "M{x},{cy} A{rx},{ry} 0 0 1 {right},{cy} A{rx},{ry} 0 0 1 {x},{cy} Z"
                );
            }
            OutlineShape::Rounded(r) => {
                let arc = |d: &mut String, radius: f32, to_x: f32, to_y: f32| {
                    if radius > 0.0 {
                        let _ = write!(d, " A{radius},{radius} 0 0 1 {to_x},{to_y}");
                    }
                };
                let _ = write!(d, "M{},{y}", x + r.top_left);
                let _ = write!(d, " L{},{y}", right - r.top_right);
                arc(&mut d, r.top_right, right, y + r.top_right);
                let _ = write!(d, " L{right},{}", bottom - r.bottom_right);
                arc(&mut d, r.bottom_right, right - r.bottom_right, bottom);
                let _ = write!(d, " L{},{bottom}", x + r.bottom_left);
                arc(&mut d, r.bottom_left, x, bottom - r.bottom_left);
                let _ = write!(d, " L{x},{}", y + r.top_left);
                arc(&mut d, r.top_left, x + r.top_left, y);
                d.push_str(" Z");
            }
        }
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounded_outline_path_data() {
        let outline = compute_outline(Bounds::new(100, 60), &Appearance::rounded(12.0));
        insta::assert_snapshot!(
            outline.to_svg_path(),
            @"M12,0 L88,0 A12,12 0 0 1 100,12 L100,48 A12,12 0 0 1 88,60 L12,60 A12,12 0 0 1 0,48 L0,12 A12,12 0 0 1 12,0 Z"
        );
    }

    #[test]
    fn oval_outline_path_data() {
        let outline = compute_outline(Bounds::new(100, 60), &Appearance::oval());
        insta::assert_snapshot!(
            outline.to_svg_path(),
            @"M0,30 A50,30 0 0 1 100,30 A50,30 0 0 1 0,30 Z"
        );
    }

    #[test]
    fn square_corners_skip_arcs() {
        let appearance = Appearance::rounded_corners(CornerRadii::new(0.0, 8.0, 0.0, 0.0));
        let outline = compute_outline(Bounds::new(40, 20), &appearance);
        insta::assert_snapshot!(
            outline.to_svg_path(),
            @"M0,0 L32,0 A8,8 0 0 1 40,8 L40,20 L0,20 L0,0 Z"
        );
    }

    #[test]
    fn huge_radius_clamps_to_half_shorter_side() {
        let outline = compute_outline(Bounds::new(40, 40), &Appearance::rounded(1000.0));
        assert_eq!(outline.radii(), Some(CornerRadii::uniform(20.0)));
    }

    #[test]
    fn per_corner_radii_clamp_independently() {
        let appearance = Appearance::rounded_corners(CornerRadii::new(4.0, 50.0, -1.0, 10.0));
        let outline = compute_outline(Bounds::new(80, 40), &appearance);
        assert_eq!(outline.radii(), Some(CornerRadii::new(4.0, 20.0, 0.0, 10.0)));
    }

    #[test]
    fn rounded_contains_respects_corners() {
        let outline = compute_outline(Bounds::new(100, 60), &Appearance::rounded(12.0));
        assert!(outline.contains(vec2(50.0, 30.0)));
        assert!(outline.contains(vec2(12.0, 1.0)));
        assert!(!outline.contains(vec2(0.5, 0.5)));
        assert!(!outline.contains(vec2(99.5, 59.5)));
        assert!(!outline.contains(vec2(-1.0, 30.0)));
    }

    #[test]
    fn oval_contains() {
        let outline = compute_outline(Bounds::new(100, 60), &Appearance::oval());
        assert!(outline.contains(vec2(50.0, 30.0)));
        assert!(outline.contains(vec2(1.0, 30.0)));
        assert!(!outline.contains(vec2(5.0, 5.0)));
    }

    #[test]
    fn translation_moves_hit_test() {
        let outline = compute_outline(Bounds::new(10, 10), &Appearance::rounded(0.0))
            .translated(vec2(20.0, 5.0));
        assert!(outline.contains(vec2(25.0, 10.0)));
        assert!(!outline.contains(vec2(5.0, 5.0)));
        assert_eq!(outline.center(), vec2(25.0, 10.0));
    }

    #[test]
    fn paths_build_for_every_family() {
        let rounded = compute_outline(Bounds::new(30, 20), &Appearance::rounded(6.0));
        let square = compute_outline(Bounds::new(30, 20), &Appearance::rounded(0.0));
        let oval = compute_outline(Bounds::new(30, 20), &Appearance::oval());
        for outline in [rounded, square, oval] {
            let path = outline.to_path().unwrap();
            let b = path.bounds();
            assert_eq!((b.width(), b.height()), (30.0, 20.0));
        }
    }

    #[test]
    fn degenerate_outline_has_no_path() {
        let outline = compute_outline(Bounds::new(0, 50), &Appearance::rounded(4.0));
        assert_eq!(outline.to_path().unwrap_err(), RenderError::InvalidPath);
    }
}
