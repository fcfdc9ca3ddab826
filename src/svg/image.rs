//! One artwork item of an SVG export.

use super::flatten::{self, PathElement};
use super::preprocess::preprocess;
use super::walker::PathSegments;
use crate::error::{Result, ToolpathError};
use crate::transform::PlacementTransform;
use crate::types::{PathToken, Point2D};
use image::{GrayImage, Luma};

/// Where an artwork sits on the workspace
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Machine position of the viewBox top-left corner
    pub point1: Point2D,
    /// Machine position of the viewBox bottom-right corner
    pub point2: Point2D,
    /// Degrees, about the midpoint of `point1` and `point2`
    pub rotation: f64,
    pub transform: PlacementTransform,
}

/// Normalized artwork with its placement and optional preview raster.
#[derive(Debug, Clone)]
pub struct VectorImage {
    raw: Vec<u8>,
    buf: Vec<u8>,
    viewbox_width: f64,
    viewbox_height: f64,
    warnings: Vec<String>,
    placement: Option<Placement>,
    preview: Option<GrayImage>,
}

impl VectorImage {
    /// Normalize `raw` SVG bytes.
    ///
    /// Fails with [`ToolpathError::EmptyArtwork`] when no drawable path is
    /// left after preprocessing.
    pub fn new(raw: impl Into<Vec<u8>>) -> Result<Self> {
        let raw = raw.into();
        let pre = preprocess(&raw)?;
        tracing::debug!(
            "Artwork loaded: viewBox {} x {}, {} warning(s)",
            pre.viewbox_width,
            pre.viewbox_height,
            pre.warnings.len()
        );

        Ok(Self {
            raw,
            buf: pre.buf,
            viewbox_width: pre.viewbox_width,
            viewbox_height: pre.viewbox_height,
            warnings: pre.warnings,
            placement: None,
            preview: None,
        })
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Normalized source handed to the flattener
    pub fn buf(&self) -> &[u8] {
        &self.buf
    }

    pub fn viewbox_width(&self) -> f64 {
        self.viewbox_width
    }

    pub fn viewbox_height(&self) -> f64 {
        self.viewbox_height
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Place the viewBox so its top-left corner lands on `point1` and its
    /// bottom-right corner on `point2`, then rotate by `rotation` degrees.
    ///
    /// Replaces any earlier placement.
    pub fn set_placement(&mut self, point1: Point2D, point2: Point2D, rotation: f64) -> Result<()> {
        let transform = PlacementTransform::compute(
            Point2D::new(0.0, 0.0),
            point1,
            Point2D::new(self.viewbox_width, self.viewbox_height),
            point2,
            rotation,
        )?;
        self.placement = Some(Placement {
            point1,
            point2,
            rotation,
            transform,
        });
        Ok(())
    }

    pub fn placement(&self) -> Option<&Placement> {
        self.placement.as_ref()
    }

    /// Attach an 8-bit grayscale preview covering the viewBox.
    ///
    /// Both dimensions must be non-zero.
    pub fn set_preview(&mut self, size: (u32, u32), bytes: Vec<u8>) -> Result<()> {
        let (width, height) = size;
        let expected = width as usize * height as usize;
        let actual = bytes.len();
        let preview = GrayImage::from_raw(width, height, bytes)
            .filter(|_| expected > 0 && actual == expected)
            .ok_or(ToolpathError::InvalidPreview { expected, actual })?;
        self.preview = Some(preview);
        Ok(())
    }

    pub fn preview(&self) -> Option<&GrayImage> {
        self.preview.as_ref()
    }

    /// Rasterize the path outlines into a `width` x `height` preview
    /// covering the viewBox: black strokes on white.
    pub fn render_outline(&self, width: u32, height: u32) -> Result<GrayImage> {
        let (w, h) = (width.max(1), height.max(1));
        let to_pixels = PlacementTransform::compute(
            Point2D::new(0.0, 0.0),
            Point2D::new(0.0, 0.0),
            Point2D::new(self.viewbox_width, self.viewbox_height),
            Point2D::new(w as f64, h as f64),
            0.0,
        )?;
        let paths = flatten::process(&self.elements()?, &to_pixels, f64::INFINITY, 0.5);

        let mut canvas = GrayImage::from_pixel(w, h, Luma([255u8]));
        for segment in paths.into_iter().flat_map(|tokens| PathSegments::new(tokens)) {
            let steps = segment.length().ceil().max(1.0) as usize;
            for i in 0..=steps {
                let t = i as f64 / steps as f64;
                let x = segment.start.x + (segment.end.x - segment.start.x) * t;
                let y = segment.start.y + (segment.end.y - segment.start.y) * t;
                // the far edge of the viewBox belongs to the last pixel
                if (0.0..=w as f64).contains(&x) && (0.0..=h as f64).contains(&y) {
                    let px = (x as u32).min(w - 1);
                    let py = (y as u32).min(h - 1);
                    canvas.put_pixel(px, py, Luma([0u8]));
                }
            }
        }
        Ok(canvas)
    }

    /// Path elements of the normalized source
    pub fn elements(&self) -> Result<Vec<PathElement>> {
        flatten::parse_elements(&self.buf)
    }

    /// Placed, flattened and clipped token streams, one per path element.
    ///
    /// Fails with [`ToolpathError::MissingPlacement`] before
    /// [`set_placement`](Self::set_placement) has been called.
    pub fn flattened_paths(&self, radius: f64, tolerance: f64) -> Result<Vec<Vec<PathToken>>> {
        let placement = self
            .placement
            .as_ref()
            .ok_or(ToolpathError::MissingPlacement { index: None })?;
        let elements = self.elements()?;
        Ok(flatten::process(
            &elements,
            &placement.transform,
            radius,
            tolerance,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &[u8] = br#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10"><path d="M0 0 L10 0 L10 10"/></svg>"#;

    #[test]
    fn test_placement_maps_corners() {
        let mut image = VectorImage::new(SQUARE).unwrap();
        image
            .set_placement(Point2D::new(-5.0, 5.0), Point2D::new(5.0, -5.0), 0.0)
            .unwrap();
        let paths = image.flattened_paths(85.0, 0.1).unwrap();
        assert_eq!(
            paths[0],
            vec![
                PathToken::Point(Point2D::new(-5.0, 5.0)),
                PathToken::Point(Point2D::new(5.0, 5.0)),
                PathToken::Point(Point2D::new(5.0, -5.0)),
            ]
        );
    }

    #[test]
    fn test_placement_replaces_previous() {
        let mut image = VectorImage::new(SQUARE).unwrap();
        image
            .set_placement(Point2D::new(0.0, 0.0), Point2D::new(10.0, 10.0), 0.0)
            .unwrap();
        image
            .set_placement(Point2D::new(0.0, 0.0), Point2D::new(20.0, 20.0), 0.0)
            .unwrap();
        let placement = image.placement().unwrap();
        assert_eq!(
            placement.transform.apply(Point2D::new(10.0, 10.0)),
            Point2D::new(20.0, 20.0)
        );
    }

    #[test]
    fn test_degenerate_placement_rejected() {
        let mut image = VectorImage::new(SQUARE).unwrap();
        let p = Point2D::new(3.0, 3.0);
        assert!(matches!(
            image.set_placement(p, p, 0.0),
            Err(ToolpathError::DegenerateTransform(_))
        ));
        assert!(image.placement().is_none());
    }

    #[test]
    fn test_unplaced_image_cannot_be_flattened() {
        let image = VectorImage::new(SQUARE).unwrap();
        assert!(matches!(
            image.flattened_paths(85.0, 0.1),
            Err(ToolpathError::MissingPlacement { index: None })
        ));
    }

    #[test]
    fn test_outline_follows_the_path() {
        let image = VectorImage::new(SQUARE).unwrap();
        let outline = image.render_outline(20, 20).unwrap();
        // top edge drawn, interior left blank
        assert_eq!(outline.get_pixel(10, 0).0[0], 0);
        assert_eq!(outline.get_pixel(19, 10).0[0], 0);
        assert_eq!(outline.get_pixel(5, 10).0[0], 255);
    }

    #[test]
    fn test_preview_size_checked() {
        let mut image = VectorImage::new(SQUARE).unwrap();
        assert!(image.set_preview((2, 2), vec![0, 0, 0, 0]).is_ok());
        assert!(matches!(
            image.set_preview((2, 2), vec![0; 5]),
            Err(ToolpathError::InvalidPreview {
                expected: 4,
                actual: 5
            })
        ));
    }

    #[test]
    fn test_empty_preview_rejected() {
        let mut image = VectorImage::new(SQUARE).unwrap();
        assert!(matches!(
            image.set_preview((0, 0), Vec::new()),
            Err(ToolpathError::InvalidPreview {
                expected: 0,
                actual: 0
            })
        ));
        assert!(image.set_preview((0, 3), Vec::new()).is_err());
        assert!(image.preview().is_none());
    }
}
