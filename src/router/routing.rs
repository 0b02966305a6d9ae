//! Orthogonal (Manhattan) polylines between two anchors.

use super::Point;
use super::anchors::Side;

/// Anchor on a box side with its outward direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub point: Point,
    pub side: Side,
}

impl Anchor {
    /// The anchor pushed `offset` away from its box.
    #[inline]
    pub fn projected(&self, offset: f64) -> Point {
        let (dx, dy) = self.side.direction();
        Point::new(self.point.x + dx * offset, self.point.y + dy * offset)
    }
}

/// Orthogonal route from `from` to `to`, leaving and entering each box
/// perpendicular to its side.
pub fn manhattan(from: &Anchor, to: &Anchor, offset: f64) -> Vec<Point> {
    let (p1, p2) = (from.point, to.point);
    let a1 = from.projected(offset);
    let a2 = to.projected(offset);

    match (from.side.is_horizontal(), to.side.is_horizontal()) {
        (true, true) => {
            let mx = (a1.x + a2.x) / 2.0;
            vec![p1, a1, Point::new(mx, a1.y), Point::new(mx, a2.y), a2, p2]
        }
        (false, false) => {
            let my = (a1.y + a2.y) / 2.0;
            vec![p1, a1, Point::new(a1.x, my), Point::new(a2.x, my), a2, p2]
        }
        (true, false) => vec![p1, a1, Point::new(a2.x, a1.y), a2, p2],
        (false, true) => vec![p1, a1, Point::new(a1.x, a2.y), a2, p2],
    }
}

#[inline]
fn near(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}

/// Drop interior points that sit on a straight run, within `eps`. The
/// points next to each endpoint always stay so the line keeps leaving its
/// box perpendicular to the side.
pub fn simplify(points: &[Point], eps: f64) -> Vec<Point> {
    let n = points.len();
    if n <= 2 {
        return points.to_vec();
    }
    let mut out = Vec::with_capacity(n);
    out.push(points[0]);
    for i in 1..n - 1 {
        let b = points[i];
        if i == 1 || i == n - 2 {
            out.push(b);
            continue;
        }
        let a = out[out.len() - 1];
        let c = points[i + 1];
        let horizontal = near(a.y, b.y, eps) && near(b.y, c.y, eps);
        let vertical = near(a.x, b.x, eps) && near(b.x, c.x, eps);
        if !(horizontal || vertical) {
            out.push(b);
        }
    }
    out.push(points[n - 1]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn anchor(x: f64, y: f64, side: Side) -> Anchor {
        Anchor {
            point: Point::new(x, y),
            side,
        }
    }

    fn is_orthogonal(points: &[Point]) -> bool {
        points
            .windows(2)
            .all(|w| w[0].x == w[1].x || w[0].y == w[1].y)
    }

    #[test]
    fn test_horizontal_pair_shares_midline() {
        let pts = manhattan(
            &anchor(200.0, 50.0, Side::Right),
            &anchor(400.0, 150.0, Side::Left),
            12.0,
        );
        assert_eq!(
            pts,
            vec![
                Point::new(200.0, 50.0),
                Point::new(212.0, 50.0),
                Point::new(300.0, 50.0),
                Point::new(300.0, 150.0),
                Point::new(388.0, 150.0),
                Point::new(400.0, 150.0),
            ]
        );
        assert!(is_orthogonal(&pts));
    }

    #[test]
    fn test_mixed_sides_one_elbow() {
        let pts = manhattan(
            &anchor(200.0, 50.0, Side::Right),
            &anchor(500.0, 300.0, Side::Top),
            12.0,
        );
        assert_eq!(pts.len(), 5);
        assert_eq!(pts[2], Point::new(500.0, 50.0));
        assert!(is_orthogonal(&pts));

        let pts = manhattan(
            &anchor(100.0, 100.0, Side::Bottom),
            &anchor(400.0, 300.0, Side::Left),
            12.0,
        );
        assert_eq!(pts[2], Point::new(100.0, 300.0));
        assert!(is_orthogonal(&pts));
    }

    #[test]
    fn test_simplify_straight_run() {
        let pts = manhattan(
            &anchor(200.0, 50.0, Side::Right),
            &anchor(400.0, 50.0, Side::Left),
            12.0,
        );
        let s = simplify(&pts, 2.0);
        assert_eq!(
            s,
            vec![
                Point::new(200.0, 50.0),
                Point::new(212.0, 50.0),
                Point::new(388.0, 50.0),
                Point::new(400.0, 50.0),
            ]
        );
    }

    #[test]
    fn test_simplify_keeps_corners() {
        let pts = manhattan(
            &anchor(200.0, 50.0, Side::Right),
            &anchor(400.0, 150.0, Side::Left),
            12.0,
        );
        assert_eq!(simplify(&pts, 2.0), pts);
        assert_eq!(simplify(&pts[..2], 2.0), pts[..2].to_vec());
    }
}
