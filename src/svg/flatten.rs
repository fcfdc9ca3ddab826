//! Path extraction and flattening.
//!
//! [`parse_elements`] reads normalized SVG into absolute path commands (all
//! group and element transforms already applied, coordinates in viewBox
//! units). [`process`] places those commands on the workspace, tessellates
//! curves into polylines and splits the result wherever a subpath starts or
//! leaves the workspace disk, producing token streams with pen-up sentinels.

use crate::error::{Result, ToolpathError};
use crate::transform::PlacementTransform;
use crate::types::{PathToken, Point2D};

/// Upper bound on the pieces a single curve is split into
const MAX_CURVE_STEPS: usize = 1000;

#[derive(Debug, Clone, PartialEq)]
pub enum PathCommand {
    MoveTo(Point2D),
    LineTo(Point2D),
    CurveTo {
        ctrl1: Point2D,
        ctrl2: Point2D,
        end: Point2D,
    },
    QuadTo {
        ctrl: Point2D,
        end: Point2D,
    },
    ClosePath,
}

/// One drawable SVG path in absolute viewBox coordinates
#[derive(Debug, Clone)]
pub struct PathElement {
    pub id: String,
    pub commands: Vec<PathCommand>,
}

/// Parse normalized SVG into path elements, in document order.
pub fn parse_elements(buf: &[u8]) -> Result<Vec<PathElement>> {
    let opt = usvg::Options::default();
    let tree = usvg::Tree::from_data(buf, &opt)
        .map_err(|e| ToolpathError::malformed(format!("Failed to parse SVG: {}", e)))?;

    let mut elements = Vec::new();
    let mut id_counter = 0;
    parse_group(tree.root(), &mut elements, &mut id_counter);
    Ok(elements)
}

fn parse_group(group: &usvg::Group, elements: &mut Vec<PathElement>, id_counter: &mut usize) {
    for child in group.children() {
        match child {
            usvg::Node::Group(g) => {
                parse_group(g, elements, id_counter);
            }
            usvg::Node::Path(path) => {
                if let Some(elem) = parse_path(path, id_counter) {
                    elements.push(elem);
                    *id_counter += 1;
                }
            }
            usvg::Node::Image(_) => {}
            usvg::Node::Text(_) => {}
        }
    }
}

fn parse_path(path: &usvg::Path, id_counter: &mut usize) -> Option<PathElement> {
    let ts = path.abs_transform();
    let map = |pt: usvg::tiny_skia_path::Point| -> Point2D {
        let (x, y) = (pt.x as f64, pt.y as f64);
        Point2D::new(
            ts.sx as f64 * x + ts.kx as f64 * y + ts.tx as f64,
            ts.ky as f64 * x + ts.sy as f64 * y + ts.ty as f64,
        )
    };

    let mut commands = Vec::new();
    for seg in path.data().segments() {
        match seg {
            usvg::tiny_skia_path::PathSegment::MoveTo(pt) => {
                commands.push(PathCommand::MoveTo(map(pt)));
            }
            usvg::tiny_skia_path::PathSegment::LineTo(pt) => {
                commands.push(PathCommand::LineTo(map(pt)));
            }
            usvg::tiny_skia_path::PathSegment::CubicTo(pt1, pt2, pt3) => {
                commands.push(PathCommand::CurveTo {
                    ctrl1: map(pt1),
                    ctrl2: map(pt2),
                    end: map(pt3),
                });
            }
            usvg::tiny_skia_path::PathSegment::QuadTo(pt1, pt2) => {
                commands.push(PathCommand::QuadTo {
                    ctrl: map(pt1),
                    end: map(pt2),
                });
            }
            usvg::tiny_skia_path::PathSegment::Close => {
                commands.push(PathCommand::ClosePath);
            }
        }
    }

    // a lone move draws nothing
    if !commands
        .iter()
        .any(|c| !matches!(c, PathCommand::MoveTo(_) | PathCommand::ClosePath))
    {
        return None;
    }

    let id = if path.id().is_empty() {
        format!("path_{}", id_counter)
    } else {
        path.id().to_string()
    };

    Some(PathElement { id, commands })
}

/// Number of line pieces needed to keep a Bezier within `tolerance` of its
/// polyline, from the largest second difference of the control polygon.
fn curve_steps(second_difference: f64, degree_factor: f64, tolerance: f64) -> usize {
    let n = (degree_factor * second_difference / tolerance).sqrt().ceil();
    if n.is_finite() {
        (n as usize).clamp(1, MAX_CURVE_STEPS)
    } else {
        1
    }
}

fn cubic_point(t: f64, p0: Point2D, c0: Point2D, c1: Point2D, p1: Point2D) -> Point2D {
    let mt = 1.0 - t;
    let mt2 = mt * mt;
    let mt3 = mt2 * mt;
    let t2 = t * t;
    let t3 = t2 * t;

    Point2D::new(
        mt3 * p0.x + 3.0 * mt2 * t * c0.x + 3.0 * mt * t2 * c1.x + t3 * p1.x,
        mt3 * p0.y + 3.0 * mt2 * t * c0.y + 3.0 * mt * t2 * c1.y + t3 * p1.y,
    )
}

fn quad_point(t: f64, p0: Point2D, c: Point2D, p1: Point2D) -> Point2D {
    let mt = 1.0 - t;
    Point2D::new(
        mt * mt * p0.x + 2.0 * mt * t * c.x + t * t * p1.x,
        mt * mt * p0.y + 2.0 * mt * t * c.y + t * t * p1.y,
    )
}

/// Collects placed points into a token stream, dropping points outside the
/// workspace and lifting the pen around them.
struct TokenSink {
    radius: f64,
    tokens: Vec<PathToken>,
}

impl TokenSink {
    fn pen_up(&mut self) {
        if matches!(self.tokens.last(), Some(PathToken::Point(_))) {
            self.tokens.push(PathToken::PenUp);
        }
    }

    fn point(&mut self, p: Point2D) {
        if p.norm() > self.radius {
            self.pen_up();
        } else {
            self.tokens.push(PathToken::Point(p));
        }
    }

    fn finish(mut self) -> Vec<PathToken> {
        if matches!(self.tokens.last(), Some(PathToken::PenUp)) {
            self.tokens.pop();
        }
        self.tokens
    }
}

/// Place and flatten path elements: one token stream per element.
///
/// Curves are tessellated in machine space so `tolerance` is in millimeters.
/// Points farther than `radius` from the origin are dropped and split the
/// subpath.
pub fn process(
    elements: &[PathElement],
    transform: &PlacementTransform,
    radius: f64,
    tolerance: f64,
) -> Vec<Vec<PathToken>> {
    elements
        .iter()
        .map(|element| {
            let mut sink = TokenSink {
                radius,
                tokens: Vec::new(),
            };
            let mut current = Point2D::default();
            let mut start = Point2D::default();

            for command in &element.commands {
                match command {
                    PathCommand::MoveTo(p) => {
                        let p = transform.apply(*p);
                        sink.pen_up();
                        sink.point(p);
                        current = p;
                        start = p;
                    }
                    PathCommand::LineTo(p) => {
                        let p = transform.apply(*p);
                        sink.point(p);
                        current = p;
                    }
                    PathCommand::QuadTo { ctrl, end } => {
                        let (c, e) = (transform.apply(*ctrl), transform.apply(*end));
                        let dd = (current - c - c + e).norm();
                        let n = curve_steps(dd, 0.25, tolerance);
                        for i in 1..=n {
                            sink.point(quad_point(i as f64 / n as f64, current, c, e));
                        }
                        current = e;
                    }
                    PathCommand::CurveTo { ctrl1, ctrl2, end } => {
                        let c1 = transform.apply(*ctrl1);
                        let c2 = transform.apply(*ctrl2);
                        let e = transform.apply(*end);
                        let dd = (current - c1 - c1 + c2)
                            .norm()
                            .max((c1 - c2 - c2 + e).norm());
                        let n = curve_steps(dd, 0.75, tolerance);
                        for i in 1..=n {
                            sink.point(cubic_point(i as f64 / n as f64, current, c1, c2, e));
                        }
                        current = e;
                    }
                    PathCommand::ClosePath => {
                        if current != start {
                            sink.point(start);
                        }
                        current = start;
                    }
                }
            }
            sink.finish()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(tokens: &[PathToken]) -> Vec<Point2D> {
        tokens
            .iter()
            .filter_map(|t| match t {
                PathToken::Point(p) => Some(*p),
                PathToken::PenUp => None,
            })
            .collect()
    }

    fn element(commands: Vec<PathCommand>) -> PathElement {
        PathElement {
            id: "p".to_string(),
            commands,
        }
    }

    #[test]
    fn test_parse_elements_applies_transforms() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10" viewBox="0 0 10 10"><g transform="translate(2 3)"><path d="M0 0 L4 1"/></g></svg>"#;
        let elements = parse_elements(svg).unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(
            elements[0].commands,
            vec![
                PathCommand::MoveTo(Point2D::new(2.0, 3.0)),
                PathCommand::LineTo(Point2D::new(6.0, 4.0))
            ]
        );
    }

    #[test]
    fn test_parse_garbage_is_malformed() {
        assert!(matches!(
            parse_elements(b"not svg at all"),
            Err(ToolpathError::MalformedPath { .. })
        ));
    }

    #[test]
    fn test_second_move_lifts_pen() {
        let e = element(vec![
            PathCommand::MoveTo(Point2D::new(0.0, 0.0)),
            PathCommand::LineTo(Point2D::new(1.0, 1.0)),
            PathCommand::MoveTo(Point2D::new(5.0, 5.0)),
            PathCommand::LineTo(Point2D::new(6.0, 6.0)),
        ]);
        let paths = process(&[e], &PlacementTransform::identity(), 85.0, 0.1);
        assert_eq!(
            paths[0],
            vec![
                PathToken::Point(Point2D::new(0.0, 0.0)),
                PathToken::Point(Point2D::new(1.0, 1.0)),
                PathToken::PenUp,
                PathToken::Point(Point2D::new(5.0, 5.0)),
                PathToken::Point(Point2D::new(6.0, 6.0)),
            ]
        );
    }

    #[test]
    fn test_close_returns_to_start() {
        let e = element(vec![
            PathCommand::MoveTo(Point2D::new(0.0, 0.0)),
            PathCommand::LineTo(Point2D::new(4.0, 0.0)),
            PathCommand::LineTo(Point2D::new(4.0, 4.0)),
            PathCommand::ClosePath,
        ]);
        let paths = process(&[e], &PlacementTransform::identity(), 85.0, 0.1);
        assert_eq!(points(&paths[0]).last(), Some(&Point2D::new(0.0, 0.0)));
    }

    #[test]
    fn test_curve_is_tessellated_within_tolerance() {
        // quarter circle approximation, radius 10
        let k = 5.522847498;
        let e = element(vec![
            PathCommand::MoveTo(Point2D::new(10.0, 0.0)),
            PathCommand::CurveTo {
                ctrl1: Point2D::new(10.0, k),
                ctrl2: Point2D::new(k, 10.0),
                end: Point2D::new(0.0, 10.0),
            },
        ]);
        let paths = process(&[e], &PlacementTransform::identity(), 85.0, 0.05);
        let pts = points(&paths[0]);
        assert!(pts.len() > 4);
        for p in &pts {
            assert!((p.norm() - 10.0).abs() < 0.05);
        }
        assert_eq!(pts.last(), Some(&Point2D::new(0.0, 10.0)));
    }

    #[test]
    fn test_points_outside_radius_split_the_path() {
        let e = element(vec![
            PathCommand::MoveTo(Point2D::new(0.0, 0.0)),
            PathCommand::LineTo(Point2D::new(10.0, 0.0)),
            PathCommand::LineTo(Point2D::new(100.0, 0.0)),
            PathCommand::LineTo(Point2D::new(0.0, 10.0)),
            PathCommand::LineTo(Point2D::new(0.0, 20.0)),
        ]);
        let paths = process(&[e], &PlacementTransform::identity(), 50.0, 0.1);
        assert_eq!(
            paths[0],
            vec![
                PathToken::Point(Point2D::new(0.0, 0.0)),
                PathToken::Point(Point2D::new(10.0, 0.0)),
                PathToken::PenUp,
                PathToken::Point(Point2D::new(0.0, 10.0)),
                PathToken::Point(Point2D::new(0.0, 20.0)),
            ]
        );
    }
}
