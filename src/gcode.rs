//! Motion and laser command emission.
//!
//! [`LaserEmitter`] builds toolpath events the way the firmware expects them:
//! travel happens with the laser off, drawing with the laser on. Every method
//! returns the events it produced so callers compose programs by plain
//! concatenation. [`render_program`] turns a toolpath into the text program
//! sent to the controller.

use crate::types::{LaserPower, Point2D, Toolpath, ToolpathEvent};

/// Feed rate used until a pattern sets its own
pub const DEFAULT_SPEED: f64 = 300.0;

/// Raise the head clear of the work after a pattern
pub const RAISE_HEAD: &str = "G1 F5000 Z200";

/// Return to the machine origin
pub const HOME: &str = "G28";

/// Stateful command builder tracking laser state, power and feed rate.
#[derive(Debug, Clone)]
pub struct LaserEmitter {
    laser_on: bool,
    power: LaserPower,
    speed: Option<f64>,
}

impl Default for LaserEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl LaserEmitter {
    pub fn new() -> Self {
        Self {
            laser_on: false,
            power: LaserPower::MAX,
            speed: None,
        }
    }

    pub fn is_laser_on(&self) -> bool {
        self.laser_on
    }

    /// Power used by [`draw_to`](Self::draw_to) when it has to fire the laser
    pub fn set_power(&mut self, power: LaserPower) {
        self.power = power;
    }

    pub fn header(&mut self, label: &str) -> Toolpath {
        self.laser_on = false;
        vec![
            ToolpathEvent::Header(label.to_string()),
            ToolpathEvent::RawCommand(HOME.to_string()),
            ToolpathEvent::RawCommand("G90".to_string()),
            ToolpathEvent::LaserOff,
        ]
    }

    /// Feed rate is modal: nothing is emitted when it does not change.
    pub fn set_speed(&mut self, speed: f64) -> Toolpath {
        if self.speed == Some(speed) {
            return Vec::new();
        }
        self.speed = Some(speed);
        vec![ToolpathEvent::SetSpeed(speed)]
    }

    /// Travel move. Leaves the laser state untouched.
    pub fn move_to(&mut self, point: Point2D) -> Toolpath {
        vec![ToolpathEvent::Move(point)]
    }

    /// Drawing move; fires the laser first when it is off.
    pub fn draw_to(&mut self, point: Point2D, z: Option<f64>) -> Toolpath {
        let mut events = Vec::new();
        if !self.laser_on {
            events.extend(self.turn_on(self.power));
        }
        events.push(ToolpathEvent::Draw(point, z));
        events
    }

    /// Travel move with the laser guaranteed off.
    pub fn close_to(&mut self, point: Point2D) -> Toolpath {
        let mut events = Vec::new();
        if self.laser_on {
            events.extend(self.turn_off());
        }
        events.extend(self.move_to(point));
        events
    }

    pub fn turn_on(&mut self, power: LaserPower) -> Toolpath {
        self.laser_on = true;
        vec![ToolpathEvent::LaserOn(power)]
    }

    pub fn turn_off(&mut self) -> Toolpath {
        self.laser_on = false;
        vec![ToolpathEvent::LaserOff]
    }

    /// Half-power test fire
    pub fn turn_half(&mut self) -> Toolpath {
        self.turn_on(LaserPower::HALF)
    }
}

fn coord(n: f64) -> String {
    // avoid "-0.0000"
    let n = if n.abs() < 5e-5 { 0.0 } else { n };
    format!("{:.4}", n)
}

/// Render a toolpath into newline-joined firmware commands.
///
/// `SetSpeed` produces no line of its own; it sets the `F` word of the
/// following moves.
pub fn render_program(events: &[ToolpathEvent]) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(events.len());
    let mut speed = DEFAULT_SPEED;

    for event in events {
        match event {
            ToolpathEvent::Header(label) => lines.push(format!(";{}", label)),
            ToolpathEvent::SetSpeed(s) => speed = *s,
            ToolpathEvent::Move(p) => {
                lines.push(format!("G1 F{} X{} Y{}", speed, coord(p.x), coord(p.y)));
            }
            ToolpathEvent::Draw(p, None) => {
                lines.push(format!("G1 F{} X{} Y{}", speed, coord(p.x), coord(p.y)));
            }
            ToolpathEvent::Draw(p, Some(z)) => {
                lines.push(format!(
                    "G1 F{} X{} Y{} Z{}",
                    speed,
                    coord(p.x),
                    coord(p.y),
                    coord(*z)
                ));
            }
            ToolpathEvent::LaserOn(power) => lines.push(format!("X2O{}", power.0)),
            ToolpathEvent::LaserOff => lines.push(format!("X2O{}", LaserPower::MIN.0)),
            ToolpathEvent::RawCommand(cmd) => lines.push(cmd.clone()),
        }
    }

    let mut program = lines.join("\n");
    program.push('\n');
    program
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_turns_laser_on_once() {
        let mut e = LaserEmitter::new();
        let first = e.draw_to(Point2D::new(1.0, 2.0), None);
        let second = e.draw_to(Point2D::new(3.0, 4.0), None);
        assert_eq!(
            first,
            vec![
                ToolpathEvent::LaserOn(LaserPower::MAX),
                ToolpathEvent::Draw(Point2D::new(1.0, 2.0), None)
            ]
        );
        assert_eq!(second, vec![ToolpathEvent::Draw(Point2D::new(3.0, 4.0), None)]);
    }

    #[test]
    fn test_close_turns_laser_off_first() {
        let mut e = LaserEmitter::new();
        e.turn_on(LaserPower::MAX);
        let events = e.close_to(Point2D::new(0.0, 0.0));
        assert_eq!(
            events,
            vec![
                ToolpathEvent::LaserOff,
                ToolpathEvent::Move(Point2D::new(0.0, 0.0))
            ]
        );
        assert!(!e.is_laser_on());
    }

    #[test]
    fn test_speed_is_modal() {
        let mut e = LaserEmitter::new();
        assert_eq!(e.set_speed(400.0).len(), 1);
        assert!(e.set_speed(400.0).is_empty());
        assert_eq!(e.set_speed(300.0), vec![ToolpathEvent::SetSpeed(300.0)]);
    }

    #[test]
    fn test_render_program() {
        let events = vec![
            ToolpathEvent::Header("Grid".to_string()),
            ToolpathEvent::SetSpeed(400.0),
            ToolpathEvent::Move(Point2D::new(-1.5, 0.0)),
            ToolpathEvent::LaserOn(LaserPower(253)),
            ToolpathEvent::Draw(Point2D::new(2.0, -0.00001), Some(9.98)),
            ToolpathEvent::LaserOff,
            ToolpathEvent::RawCommand(HOME.to_string()),
        ];
        assert_eq!(
            render_program(&events),
            ";Grid\nG1 F400 X-1.5000 Y0.0000\nX2O253\nG1 F400 X2.0000 Y0.0000 Z9.9800\nX2O255\nG28\n"
        );
    }
}
