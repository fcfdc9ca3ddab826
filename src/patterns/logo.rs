use super::Pattern;
use crate::config::LogoSettings;
use crate::gcode::{LaserEmitter, RAISE_HEAD};
use crate::transform::design_shift;
use crate::types::{LaserPower, Point2D, Toolpath, ToolpathEvent};

const fn p(x: f64, y: f64) -> Point2D {
    Point2D::new(x, y)
}

/// Faint hexagon drawn first so the operator can check placement
pub const ALIGNMENT_FRAME: [Point2D; 7] = [
    p(50.0, 10.0),
    p(7.0, 35.0),
    p(7.0, 85.0),
    p(50.0, 110.0),
    p(93.3, 85.0),
    p(93.3, 35.0),
    p(50.0, 10.0),
];

pub const OUTER_HEXAGON: [Point2D; 7] = [
    p(50.0, 10.0),
    p(6.7, 35.0),
    p(6.7, 85.0),
    p(50.0, 110.0),
    p(93.3, 85.0),
    p(93.3, 35.0),
    p(50.0, 10.0),
];

pub const INNER_HEXAGON: [Point2D; 7] = [
    p(50.0, 40.0),
    p(32.7, 50.0),
    p(32.7, 70.0),
    p(50.0, 80.0),
    p(67.3, 70.0),
    p(67.3, 50.0),
    p(50.0, 40.0),
];

// Legs run parallel to the hexagon edges; their ends sit on x = 20, 37.3,
// 63 and 80.3.
pub const LEG_LEFT: [Point2D; 4] = [p(50.0, 40.0), p(37.3, 32.6), p(20.0, 42.6), p(20.0, 92.7)];

pub const LEG_TOP: [Point2D; 3] = [p(32.7, 70.0), p(32.7, 85.0), p(63.0, 102.5)];

pub const LEG_RIGHT: [Point2D; 4] = [p(50.0, 80.0), p(63.0, 87.5), p(80.3, 77.4), p(80.3, 27.5)];

pub const LEG_BOTTOM: [Point2D; 3] = [p(67.3, 50.0), p(67.3, 35.0), p(37.3, 17.3)];

/// One closed or open polyline of the logo, in design coordinates
#[derive(Debug, Clone, Copy)]
pub struct LogoStroke {
    pub vertices: &'static [Point2D],
    /// Alignment strokes run at travel speed and alignment power
    pub alignment: bool,
}

/// Drawing order of the logo
pub const STROKES: [LogoStroke; 7] = [
    LogoStroke {
        vertices: &ALIGNMENT_FRAME,
        alignment: true,
    },
    LogoStroke {
        vertices: &OUTER_HEXAGON,
        alignment: false,
    },
    LogoStroke {
        vertices: &INNER_HEXAGON,
        alignment: false,
    },
    LogoStroke {
        vertices: &LEG_LEFT,
        alignment: false,
    },
    LogoStroke {
        vertices: &LEG_TOP,
        alignment: false,
    },
    LogoStroke {
        vertices: &LEG_RIGHT,
        alignment: false,
    },
    LogoStroke {
        vertices: &LEG_BOTTOM,
        alignment: false,
    },
];

/// Alignment logo
#[derive(Debug, Clone, Default)]
pub struct Logo {
    pub settings: LogoSettings,
}

impl Logo {
    pub fn new(settings: LogoSettings) -> Self {
        Self { settings }
    }

    fn shift(&self, point: Point2D) -> Point2D {
        design_shift(point, Point2D::new(self.settings.shift_x, self.settings.shift_y))
    }

    /// Laser off, travel to `start`, laser on at `power`
    fn close_and_move_and_on(
        &self,
        emitter: &mut LaserEmitter,
        start: Point2D,
        power: LaserPower,
    ) -> Toolpath {
        let mut events = emitter.turn_off();
        events.extend(emitter.set_speed(self.settings.travel_speed));
        events.extend(emitter.move_to(self.shift(start)));
        events.extend(emitter.turn_on(power));
        events
    }
}

impl Pattern for Logo {
    fn label(&self) -> &'static str {
        "Logo"
    }

    fn generate(&self) -> Toolpath {
        let mut emitter = LaserEmitter::new();
        let mut events = emitter.header(self.label());
        events.extend(emitter.turn_half());

        for stroke in STROKES.iter() {
            let (power, speed) = if stroke.alignment {
                (self.settings.alignment_power, self.settings.travel_speed)
            } else {
                (self.settings.power, self.settings.speed)
            };

            events.extend(self.close_and_move_and_on(&mut emitter, stroke.vertices[0], power));
            events.extend(emitter.set_speed(speed));
            for vertex in stroke.vertices {
                events.extend(emitter.draw_to(self.shift(*vertex), None));
            }
        }

        events.extend(emitter.turn_off());
        events.push(ToolpathEvent::RawCommand(RAISE_HEAD.to_string()));

        tracing::debug!("Logo: {} strokes, {} events", STROKES.len(), events.len());
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strokes_start_at_their_first_vertex() {
        for stroke in STROKES.iter() {
            assert!(stroke.vertices.len() >= 3);
        }
        assert_eq!(STROKES.iter().filter(|s| s.alignment).count(), 1);
    }

    #[test]
    fn test_hexagons_are_closed() {
        for table in [&ALIGNMENT_FRAME, &OUTER_HEXAGON, &INNER_HEXAGON] {
            assert_eq!(table.first(), table.last());
        }
    }

    #[test]
    fn test_alignment_pass_power_and_speed() {
        let events = Logo::default().generate();
        let first_on = events
            .iter()
            .skip_while(|e| **e != ToolpathEvent::LaserOn(LaserPower::HALF))
            .skip(1)
            .find(|e| matches!(e, ToolpathEvent::LaserOn(_)));
        assert_eq!(first_on, Some(&ToolpathEvent::LaserOn(LaserPower(253))));
        assert_eq!(
            events.iter().find(|e| matches!(e, ToolpathEvent::SetSpeed(_))),
            Some(&ToolpathEvent::SetSpeed(400.0))
        );
    }

    #[test]
    fn test_every_point_is_shifted() {
        let events = Logo::default().generate();
        // (50, 10) in design space lands on (0, -40)
        assert!(events.contains(&ToolpathEvent::Move(Point2D::new(0.0, -40.0))));
    }
}
