//! Placement of artwork on the machine workspace.
//!
//! A [`PlacementTransform`] is stored as a 2D affine matrix:
//!
//! ```text
//! | a  c  e |
//! | b  d  f |
//! | 0  0  1 |
//! ```
//!
//! built from two source->target reference point pairs and a rotation. The
//! logo's design-space shift is a separate, fixed mapping ([`design_shift`]).

use crate::error::{Result, ToolpathError};
use crate::types::Point2D;

const EPSILON: f64 = 1e-12;

/// Affine mapping from artwork-local coordinates to machine space.
///
/// Values are immutable; re-placing an artwork builds a new transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementTransform {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl PlacementTransform {
    pub fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Build the transform taking `p1_src -> p1_dst` and `p2_src -> p2_dst`
    /// by per-axis scale and translation, then rotating by `rotation`
    /// degrees about the midpoint of the two target points.
    pub fn compute(
        p1_src: Point2D,
        p1_dst: Point2D,
        p2_src: Point2D,
        p2_dst: Point2D,
        rotation: f64,
    ) -> Result<Self> {
        if p1_src.distance(&p2_src) < EPSILON {
            return Err(ToolpathError::DegenerateTransform(
                "source reference points coincide".to_string(),
            ));
        }
        if p1_dst.distance(&p2_dst) < EPSILON {
            return Err(ToolpathError::DegenerateTransform(
                "target reference points coincide".to_string(),
            ));
        }

        let span_x = p2_src.x - p1_src.x;
        let span_y = p2_src.y - p1_src.y;
        if span_x.abs() < EPSILON || span_y.abs() < EPSILON {
            return Err(ToolpathError::DegenerateTransform(format!(
                "source reference points span no area ({span_x} x {span_y})"
            )));
        }

        let target_x = p2_dst.x - p1_dst.x;
        let target_y = p2_dst.y - p1_dst.y;
        if target_x.abs() < EPSILON || target_y.abs() < EPSILON {
            return Err(ToolpathError::DegenerateTransform(format!(
                "target reference points span no area ({target_x} x {target_y})"
            )));
        }

        let sx = (p2_dst.x - p1_dst.x) / span_x;
        let sy = (p2_dst.y - p1_dst.y) / span_y;
        let place = Self {
            a: sx,
            b: 0.0,
            c: 0.0,
            d: sy,
            e: p1_dst.x - sx * p1_src.x,
            f: p1_dst.y - sy * p1_src.y,
        };

        let center = Point2D::new((p1_dst.x + p2_dst.x) / 2.0, (p1_dst.y + p2_dst.y) / 2.0);
        Ok(Self::rotation_about(center, rotation).compose(&place))
    }

    /// Rotation by `degrees` about `center`
    pub fn rotation_about(center: Point2D, degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: center.x - cos * center.x + sin * center.y,
            f: center.y - sin * center.x - cos * center.y,
        }
    }

    /// Compose two transforms: self * other (other is applied first)
    pub fn compose(&self, other: &PlacementTransform) -> PlacementTransform {
        PlacementTransform {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn apply(&self, point: Point2D) -> Point2D {
        Point2D::new(
            self.a * point.x + self.c * point.y + self.e,
            self.b * point.x + self.d * point.y + self.f,
        )
    }

    /// Inverse mapping, machine space back to artwork-local coordinates.
    pub fn invert(&self) -> Result<PlacementTransform> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < EPSILON {
            return Err(ToolpathError::DegenerateTransform(
                "transform is not invertible".to_string(),
            ));
        }
        Ok(PlacementTransform {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }
}

impl Default for PlacementTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Offset applied by [`design_shift`] unless a pattern overrides it.
pub const DEFAULT_SHIFT: Point2D = Point2D::new(-50.0, -50.0);

/// Convert a logo design coordinate into plotter coordinates: mirror the
/// x axis around 100 and translate by `offset`.
pub fn design_shift(point: Point2D, offset: Point2D) -> Point2D {
    Point2D::new(100.0 - point.x + offset.x, point.y + offset.y)
}
