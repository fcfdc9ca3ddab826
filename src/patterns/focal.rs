use super::Pattern;
use crate::config::FocalSettings;
use crate::gcode::{HOME, LaserEmitter};
use crate::types::{Point2D, Toolpath, ToolpathEvent};

/// Fixed-point scale of the sweep; keeps 0.02 mm steps exact.
const SCALE: f64 = 1000.0;

/// Focal heights from `start` down to `end` (exclusive) in `step`
/// decrements.
///
/// The loop runs on integers scaled by 1000 so no error accumulates over the
/// sweep; each value is divided back on output.
pub fn z_candidates(start: f64, end: f64, step: f64) -> Vec<f64> {
    let start = (start * SCALE).round() as i64;
    let end = (end * SCALE).round() as i64;
    let step = (step * SCALE).round() as i64;
    if step <= 0 {
        return Vec::new();
    }

    let mut output = Vec::new();
    let mut tmp = start;
    while tmp > end {
        output.push(tmp as f64 / SCALE);
        tmp -= step;
    }
    output
}

/// Focal length sweep: rows of 1 mm ticks, each at its own height
#[derive(Debug, Clone)]
pub struct FindFocal {
    pub settings: FocalSettings,
    pub object_height: f64,
}

impl Default for FindFocal {
    fn default() -> Self {
        Self {
            settings: FocalSettings::default(),
            object_height: 0.0,
        }
    }
}

impl FindFocal {
    pub fn new(settings: FocalSettings, object_height: f64) -> Self {
        Self {
            settings,
            object_height,
        }
    }

    pub fn candidates(&self) -> Vec<f64> {
        z_candidates(
            self.settings.focal_max,
            self.settings.focal_min,
            self.settings.focal_step,
        )
    }
}

impl Pattern for FindFocal {
    fn label(&self) -> &'static str {
        "FindFocal"
    }

    fn generate(&self) -> Toolpath {
        let s = &self.settings;
        let candidates = self.candidates();
        let half = s.row_length / 2.0;
        let tick_pitch = s.row_length / s.batch as f64;

        let mut emitter = LaserEmitter::new();
        let mut events = emitter.header(self.label());
        events.push(ToolpathEvent::RawCommand(format!(
            "G1 F5000 Z{}",
            s.focal_max + self.object_height
        )));
        events.extend(emitter.set_speed(s.speed));

        for (row, batch) in candidates.chunks(s.batch.max(1)).enumerate() {
            let y = row as f64 * s.row_pitch;
            events.extend(emitter.close_to(Point2D::new(-half, y)));
            for (k, z) in batch.iter().enumerate() {
                let x = -half + tick_pitch * k as f64;
                events.extend(emitter.draw_to(Point2D::new(x, y), Some(*z)));
                events.extend(emitter.draw_to(Point2D::new(x, y + 1.0), Some(*z)));
                events.extend(emitter.draw_to(Point2D::new(x, y), Some(*z)));
            }
            tracing::debug!("FindFocal: row {} done at y = {}", row, y);
        }

        events.extend(emitter.turn_off());
        events.push(ToolpathEvent::RawCommand(HOME.to_string()));
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_candidates() {
        let z = z_candidates(10.0, 0.1, 0.02);
        assert_eq!(z.len(), 495);
        assert_eq!(z[0], 10.0);
        assert_eq!(z[1], 9.98);
        assert_eq!(*z.last().unwrap(), 0.12);
    }

    #[test]
    fn test_candidates_do_not_drift() {
        // naive accumulation of 0.02 picks up error after a few hundred steps
        let z = z_candidates(10.0, 0.0, 0.02);
        assert_eq!(z.len(), 500);
        assert_eq!(z[250], 5.0);
        assert_eq!(*z.last().unwrap(), 0.02);
    }

    #[test]
    fn test_zero_step_yields_nothing() {
        assert!(z_candidates(10.0, 0.0, 0.0).is_empty());
    }

    #[test]
    fn test_rows_are_closed_before_drawing() {
        let events = FindFocal::default().generate();
        let moves: Vec<Point2D> = events
            .iter()
            .filter_map(|e| match e {
                ToolpathEvent::Move(p) => Some(*p),
                _ => None,
            })
            .collect();
        // 9 full rows of 50 and a final row of 45
        assert_eq!(moves.len(), 10);
        assert_eq!(moves[9], Point2D::new(-15.0, 45.0));
    }
}
