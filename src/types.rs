use serde::{Deserialize, Serialize};

/// 2D point in machine-space millimeters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Distance from the workspace origin
    pub fn norm(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

impl std::ops::Add for Point2D {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Point2D::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point2D {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Point2D::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Point2D::new(x, y)
    }
}

/// One continuous draw move. Laser state and focal height are carried by
/// the surrounding [`ToolpathEvent`]s, never by the segment itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point2D,
    pub end: Point2D,
}

impl Segment {
    pub fn new(start: Point2D, end: Point2D) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }
}

/// Laser power on the firmware's inverse scale: 0 fires at full power,
/// 255 is the weakest setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LaserPower(pub u8);

impl LaserPower {
    pub const MAX: LaserPower = LaserPower(0);
    pub const MIN: LaserPower = LaserPower(255);
    /// Test fire used to check alignment before a real pass
    pub const HALF: LaserPower = LaserPower(128);
}

impl Default for LaserPower {
    fn default() -> Self {
        LaserPower::MAX
    }
}

/// A single step of a toolpath program
#[derive(Debug, Clone, PartialEq)]
pub enum ToolpathEvent {
    /// Travel move; does not change the laser state.
    Move(Point2D),
    /// Drawing move with an optional focal height override.
    Draw(Point2D, Option<f64>),
    LaserOn(LaserPower),
    LaserOff,
    /// Feed rate (mm/min) for subsequent moves.
    SetSpeed(f64),
    Header(String),
    /// Firmware command emitted verbatim.
    RawCommand(String),
}

/// Ordered toolpath. Order is execution order on the machine.
pub type Toolpath = Vec<ToolpathEvent>;

/// Token of a flattened path stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathToken {
    Point(Point2D),
    /// Pen up: the next point starts a new subpath.
    PenUp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_arithmetic() {
        let p = Point2D::new(10.0, 20.0) - Point2D::new(5.0, 15.0);
        assert_eq!(p, Point2D::new(5.0, 5.0));
        assert_eq!(p + p, Point2D::new(10.0, 10.0));
    }

    #[test]
    fn test_segment_length() {
        let s = Segment::new(Point2D::new(0.0, 0.0), Point2D::new(3.0, 4.0));
        assert!((s.length() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_power_scale_is_inverse() {
        assert!(LaserPower::MAX.0 < LaserPower::HALF.0);
        assert!(LaserPower::HALF.0 < LaserPower::MIN.0);
        assert_eq!(LaserPower::default(), LaserPower::MAX);
    }
}
