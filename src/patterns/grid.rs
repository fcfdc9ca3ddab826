use super::Pattern;
use crate::config::GridSettings;
use crate::gcode::LaserEmitter;
use crate::ordering::{Chord, order_chords};
use crate::types::{Point2D, Toolpath};

/// Chords covering a disk of `radius`, in scan order.
///
/// The primary set sits at offsets `0, pitch, 2 * pitch, ...` and is drawn
/// left to right / bottom to top; the secondary set sits half a pitch off
/// and is drawn in the opposite direction.
///
/// A zero pitch or a radius that is not a positive finite number yields no
/// chords.
pub fn grid_chords(radius: f64, pitch: u32) -> Vec<Chord> {
    if pitch == 0 || !radius.is_finite() || radius <= 0.0 {
        tracing::warn!("Grid: no chords for radius {} and pitch {}", radius, pitch);
        return Vec::new();
    }
    let pitch = pitch as f64;
    let mut chords = Vec::new();

    let mut k = 0u32;
    loop {
        let a = k as f64 * pitch;
        if a > radius {
            break;
        }
        let b = (radius * radius - a * a).sqrt();
        chords.push(Chord::horizontal(Point2D::new(-b, a), Point2D::new(b, a)));
        chords.push(Chord::horizontal(Point2D::new(-b, -a), Point2D::new(b, -a)));
        chords.push(Chord::vertical(Point2D::new(a, -b), Point2D::new(a, b)));
        chords.push(Chord::vertical(Point2D::new(-a, -b), Point2D::new(-a, b)));
        k += 1;
    }

    let mut k = 0u32;
    loop {
        let a = pitch / 2.0 + k as f64 * pitch;
        if a > radius {
            break;
        }
        let b = (radius * radius - a * a).sqrt();
        chords.push(Chord::horizontal(Point2D::new(b, a), Point2D::new(-b, a)));
        chords.push(Chord::horizontal(Point2D::new(b, -a), Point2D::new(-b, -a)));
        chords.push(Chord::vertical(Point2D::new(a, b), Point2D::new(a, -b)));
        chords.push(Chord::vertical(Point2D::new(-a, b), Point2D::new(-a, -b)));
        k += 1;
    }

    order_chords(chords)
}

/// Bed grid across the workspace disk
#[derive(Debug, Clone)]
pub struct Grid {
    pub radius: f64,
    pub settings: GridSettings,
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            radius: 85.0,
            settings: GridSettings::default(),
        }
    }
}

impl Grid {
    pub fn new(radius: f64, settings: GridSettings) -> Self {
        Self { radius, settings }
    }
}

impl Pattern for Grid {
    fn label(&self) -> &'static str {
        "Grid"
    }

    fn generate(&self) -> Toolpath {
        let chords = grid_chords(self.radius, self.settings.pitch);

        let mut emitter = LaserEmitter::new();
        let mut events = emitter.header(self.label());
        events.extend(emitter.set_speed(self.settings.speed));
        for chord in &chords {
            events.extend(emitter.close_to(chord.start));
            events.extend(emitter.draw_to(chord.end, None));
        }
        events.extend(emitter.turn_off());

        tracing::debug!(
            "Grid: {} chords across radius {}",
            chords.len(),
            self.radius
        );
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering::Axis;

    #[test]
    fn test_chord_count() {
        // primary offsets 0..=80 (9), secondary 5..=85 (9), four chords each
        let chords = grid_chords(85.0, 10);
        assert_eq!(chords.len(), 72);
    }

    #[test]
    fn test_chords_stay_on_the_disk() {
        for chord in grid_chords(85.0, 10) {
            assert!(chord.start.norm() <= 85.0 + 1e-9);
            assert!(chord.end.norm() <= 85.0 + 1e-9);
        }
    }

    #[test]
    fn test_unusable_parameters_yield_no_chords() {
        assert!(grid_chords(85.0, 0).is_empty());
        assert!(grid_chords(f64::NAN, 10).is_empty());
        assert!(grid_chords(f64::INFINITY, 10).is_empty());
        assert!(grid_chords(-5.0, 10).is_empty());
    }

    #[test]
    fn test_zero_pitch_grid_is_header_only() {
        let grid = Grid::new(
            85.0,
            GridSettings {
                pitch: 0,
                ..GridSettings::default()
            },
        );
        let events = grid.generate();
        assert!(!events.iter().any(|e| matches!(e, crate::types::ToolpathEvent::Draw(..))));
        assert_eq!(events.last(), Some(&crate::types::ToolpathEvent::LaserOff));
    }

    #[test]
    fn test_secondary_set_runs_backwards() {
        let chords = grid_chords(85.0, 10);
        let c = chords
            .iter()
            .find(|c| c.axis == Axis::Horizontal && c.key == 5.0)
            .unwrap();
        assert!(c.start.x > c.end.x);
    }
}
