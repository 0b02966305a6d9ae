//! SVG path data for routed polylines.

use std::fmt::{self, Write};

use tracing::warn;

use super::Point;

/// `M`/`L` path through `points` with each interior corner rounded by a
/// quadratic curve of radius `min(radius, d1 / 2, d2 / 2)`. Corners whose
/// radius falls below 1, and collinear corners (within `eps`), stay sharp.
pub fn rounded_path(points: &[Point], radius: f64, eps: f64) -> String {
    let mut d = String::new();
    if let Err(e) = write_rounded(&mut d, points, radius, eps) {
        warn!(error = %e, "could not format link path");
        d.clear();
    }
    d
}

fn write_rounded(d: &mut String, points: &[Point], radius: f64, eps: f64) -> fmt::Result {
    let n = points.len();
    if n == 0 {
        return Ok(());
    }
    if n < 3 {
        for (i, p) in points.iter().enumerate() {
            let cmd = if i == 0 { "M" } else { " L" };
            write!(d, "{cmd}{},{}", p.x, p.y)?;
        }
        return Ok(());
    }

    write!(d, "M{},{}", points[0].x, points[0].y)?;
    for i in 1..n - 1 {
        let (prev, curr, next) = (points[i - 1], points[i], points[i + 1]);
        let collinear = ((prev.x - curr.x).abs() <= eps && (curr.x - next.x).abs() <= eps)
            || ((prev.y - curr.y).abs() <= eps && (curr.y - next.y).abs() <= eps);
        if collinear {
            write!(d, " L{},{}", curr.x, curr.y)?;
            continue;
        }
        let d1 = curr.distance(prev);
        let d2 = curr.distance(next);
        let r = radius.min(d1 / 2.0).min(d2 / 2.0);
        if r < 1.0 {
            write!(d, " L{},{}", curr.x, curr.y)?;
            continue;
        }
        let start = curr.toward(prev, r / d1);
        let end = curr.toward(next, r / d2);
        write!(
            d,
            " L{},{} Q{},{} {},{}",
            start.x, start.y, curr.x, curr.y, end.x, end.y
        )?;
    }
    let last = points[n - 1];
    write!(d, " L{},{}", last.x, last.y)
}
