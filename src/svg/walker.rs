//! Lazy segment walk over the artwork of one export.
//!
//! [`SegmentWalk`] pulls one artwork item at a time: item `k + 1` is not
//! parsed until every segment of item `k` has been consumed. Progress is
//! pushed to a callback around the parse step of each item.

use super::image::VectorImage;
use crate::config::MachineSettings;
use crate::error::{Result, ToolpathError};
use crate::gcode::{DEFAULT_SPEED, HOME, LaserEmitter};
use crate::transform::PlacementTransform;
use crate::types::{PathToken, Point2D, Segment, Toolpath, ToolpathEvent};
use image::{GrayImage, ImageFormat, Luma};
use std::io::Cursor;
use std::iter::FusedIterator;

/// Consecutive point pairs of a token stream. A pen-up sentinel ends the
/// current subpath; no segment ever spans one.
#[derive(Debug, Clone)]
pub struct PathSegments<I> {
    tokens: I,
    last: Option<Point2D>,
}

impl<I: Iterator<Item = PathToken>> PathSegments<I> {
    pub fn new(tokens: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            tokens: tokens.into_iter(),
            last: None,
        }
    }
}

impl<I: Iterator<Item = PathToken>> Iterator for PathSegments<I> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        for token in self.tokens.by_ref() {
            match token {
                PathToken::PenUp => self.last = None,
                PathToken::Point(p) => {
                    if let Some(prev) = self.last.replace(p) {
                        return Some(Segment::new(prev, p));
                    }
                }
            }
        }
        None
    }
}

type TokenStream = std::vec::IntoIter<PathToken>;

/// Single-pass iterator over the segments of every artwork item, in
/// submission order. Yields at most one error, then stops.
pub struct SegmentWalk<'a, F: FnMut(f64)> {
    images: &'a [VectorImage],
    radius: f64,
    tolerance: f64,
    on_progress: F,
    next_image: usize,
    paths: std::vec::IntoIter<Vec<PathToken>>,
    current: PathSegments<TokenStream>,
    done: bool,
}

impl<'a, F: FnMut(f64)> SegmentWalk<'a, F> {
    fn new(images: &'a [VectorImage], radius: f64, tolerance: f64, on_progress: F) -> Self {
        Self {
            images,
            radius,
            tolerance,
            on_progress,
            next_image: 0,
            paths: Vec::new().into_iter(),
            current: PathSegments::new(Vec::new()),
            done: false,
        }
    }

    /// Parse and flatten the next artwork item
    fn load_next(&mut self) -> Result<()> {
        let image = &self.images[self.next_image];
        self.next_image += 1;
        let index = self.next_image;
        let total = self.images.len() as f64;

        (self.on_progress)((index as f64 - 0.5) / total);

        let placement = image
            .placement()
            .ok_or(ToolpathError::MissingPlacement { index: Some(index) })?;
        let elements = image.elements().map_err(|e| e.at_image(index))?;

        (self.on_progress)(index as f64 / total);

        let paths =
            super::flatten::process(&elements, &placement.transform, self.radius, self.tolerance);
        tracing::debug!(
            "Image {}/{}: {} path(s) from {} element(s)",
            index,
            self.images.len(),
            paths.len(),
            elements.len()
        );
        self.paths = paths.into_iter();
        Ok(())
    }
}

impl<F: FnMut(f64)> Iterator for SegmentWalk<'_, F> {
    type Item = Result<Segment>;

    fn next(&mut self) -> Option<Result<Segment>> {
        if self.done {
            return None;
        }
        loop {
            if let Some(segment) = self.current.next() {
                return Some(Ok(segment));
            }
            if let Some(path) = self.paths.next() {
                self.current = PathSegments::new(path);
                continue;
            }
            if self.next_image >= self.images.len() {
                self.done = true;
                return None;
            }
            if let Err(e) = self.load_next() {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}

impl<F: FnMut(f64)> FusedIterator for SegmentWalk<'_, F> {}

/// Walk `images` in order, placing and clipping each to the workspace disk.
///
/// For item `i` of `N`, `on_progress` receives `(i - 0.5) / N` before the
/// item is parsed and `i / N` after. Pass `|_| {}` to opt out.
pub fn walk<F: FnMut(f64)>(
    images: &[VectorImage],
    radius: f64,
    tolerance: f64,
    on_progress: F,
) -> SegmentWalk<'_, F> {
    SegmentWalk::new(images, radius, tolerance, on_progress)
}

/// Artwork of one export and the machine it is cut on.
#[derive(Debug, Clone)]
pub struct SvgFactory {
    pub radius: f64,
    pub tolerance: f64,
    pub pixel_per_mm: u32,
    pub speed: f64,
    images: Vec<VectorImage>,
}

impl SvgFactory {
    pub fn new(radius: f64) -> Self {
        Self::from_config(&MachineSettings {
            radius,
            ..MachineSettings::default()
        })
    }

    pub fn from_config(machine: &MachineSettings) -> Self {
        Self {
            radius: machine.radius,
            tolerance: machine.curve_tolerance,
            pixel_per_mm: machine.pixel_per_mm,
            speed: DEFAULT_SPEED,
            images: Vec::new(),
        }
    }

    pub fn add_image(&mut self, image: VectorImage) {
        self.images.push(image);
    }

    pub fn images(&self) -> &[VectorImage] {
        &self.images
    }

    pub fn images_mut(&mut self) -> &mut [VectorImage] {
        &mut self.images
    }

    pub fn walk<F: FnMut(f64)>(&self, on_progress: F) -> SegmentWalk<'_, F> {
        walk(&self.images, self.radius, self.tolerance, on_progress)
    }

    /// Full toolpath for every placed artwork item.
    ///
    /// Travel happens only where a segment does not start at the end of the
    /// previous one. Any error discards the whole program.
    pub fn generate_program<F: FnMut(f64)>(&self, on_progress: F) -> Result<Toolpath> {
        let mut emitter = LaserEmitter::new();
        let mut events = emitter.header("SVG");
        events.extend(emitter.set_speed(self.speed));

        let mut last_end: Option<Point2D> = None;
        let mut count = 0usize;
        for segment in self.walk(on_progress) {
            let segment = segment?;
            if last_end != Some(segment.start) {
                events.extend(emitter.close_to(segment.start));
            }
            events.extend(emitter.draw_to(segment.end, None));
            last_end = Some(segment.end);
            count += 1;
        }

        events.extend(emitter.turn_off());
        events.push(ToolpathEvent::RawCommand(HOME.to_string()));
        tracing::info!("SVG: {} segment(s) from {} image(s)", count, self.images.len());
        Ok(events)
    }

    /// PNG of every placed preview raster composited onto the workspace.
    ///
    /// The canvas is a white square covering the workspace disk at
    /// `pixel_per_mm`, machine +y pointing up. Overlapping previews keep the
    /// darker pixel.
    pub fn generate_preview(&self) -> Result<Vec<u8>> {
        let ppm = self.pixel_per_mm as f64;
        let size = (2.0 * self.radius * ppm).round().max(1.0) as u32;
        let mut canvas = GrayImage::from_pixel(size, size, Luma([255u8]));

        for image in &self.images {
            let (Some(preview), Some(placement)) = (image.preview(), image.placement()) else {
                continue;
            };
            composite(
                &mut canvas,
                preview,
                &placement.transform,
                (image.viewbox_width(), image.viewbox_height()),
                self.radius,
                ppm,
            )?;
        }

        let mut bytes = Vec::new();
        canvas.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

/// Inverse-map every canvas pixel into the preview raster, nearest neighbour.
fn composite(
    canvas: &mut GrayImage,
    preview: &GrayImage,
    transform: &PlacementTransform,
    viewbox: (f64, f64),
    radius: f64,
    ppm: f64,
) -> Result<()> {
    let inverse = transform.invert()?;
    let (vw, vh) = viewbox;
    let (pw, ph) = preview.dimensions();

    for (cx, cy, pixel) in canvas.enumerate_pixels_mut() {
        let machine = Point2D::new(
            (cx as f64 + 0.5) / ppm - radius,
            radius - (cy as f64 + 0.5) / ppm,
        );
        let local = inverse.apply(machine);
        if local.x < 0.0 || local.y < 0.0 || local.x >= vw || local.y >= vh {
            continue;
        }
        let px = ((local.x / vw * pw as f64) as u32).min(pw - 1);
        let py = ((local.y / vh * ph as f64) as u32).min(ph - 1);
        let value = preview.get_pixel(px, py).0[0];
        if value < pixel.0[0] {
            pixel.0[0] = value;
        }
    }
    Ok(())
}
