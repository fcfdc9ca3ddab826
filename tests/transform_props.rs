use laser_toolpath::{PlacementTransform, Point2D};
use proptest::prelude::*;

fn coord() -> impl Strategy<Value = f64> {
    -1000.0f64..1000.0
}

proptest! {
    #[test]
    fn identity_placement_returns_input(
        x1 in coord(), y1 in coord(),
        dx in 1.0f64..500.0, dy in 1.0f64..500.0,
        px in coord(), py in coord(),
    ) {
        let p1 = Point2D::new(x1, y1);
        let p2 = Point2D::new(x1 + dx, y1 + dy);
        let t = PlacementTransform::compute(p1, p1, p2, p2, 0.0).unwrap();
        let p = Point2D::new(px, py);
        prop_assert!(t.apply(p).distance(&p) < 1e-6);
    }

    #[test]
    fn inverse_undoes_placement(
        sx in 0.1f64..10.0, sy in 0.1f64..10.0,
        rotation in -360.0f64..360.0,
        px in coord(), py in coord(),
    ) {
        let t = PlacementTransform::compute(
            Point2D::new(0.0, 0.0),
            Point2D::new(-20.0, 15.0),
            Point2D::new(10.0, 10.0),
            Point2D::new(-20.0 + 10.0 * sx, 15.0 - 10.0 * sy),
            rotation,
        )
        .unwrap();
        let p = Point2D::new(px, py);
        let back = t.invert().unwrap().apply(t.apply(p));
        prop_assert!(back.distance(&p) < 1e-6);
    }
}
