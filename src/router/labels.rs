//! Cardinality markers near both ends of a routed line.

use super::{Point, RouterConfig};
use crate::model::Cardinality;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    End,
}

impl TextAnchor {
    pub fn as_str(self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::End => "end",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelPlacement {
    pub text: &'static str,
    pub x: f64,
    pub y: f64,
    pub anchor: TextAnchor,
}

/// -1, 0 or 1.
#[inline]
fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[inline]
fn or_one(v: f64) -> f64 {
    if v == 0.0 { 1.0 } else { v }
}

/// Labels for the start and end of `points` (at least two points).
pub fn place_labels(
    points: &[Point],
    from: Cardinality,
    to: Cardinality,
    config: &RouterConfig,
) -> Option<(LabelPlacement, LabelPlacement)> {
    let n = points.len();
    if n < 2 {
        return None;
    }
    let start = place(points[0], points[1], false, from, config);
    let end = place(points[n - 1], points[n - 2], true, to, config);
    Some((start, end))
}

/// `tip` is the endpoint on the box, `next` its neighbor along the line.
/// At the end of the line the segment direction is taken from `next`
/// toward `tip`, matching travel order.
fn place(
    tip: Point,
    next: Point,
    at_end: bool,
    card: Cardinality,
    config: &RouterConfig,
) -> LabelPlacement {
    let (near, off) = (config.label_near, config.label_offset);
    let horizontal = (tip.y - next.y).abs() <= config.label_axis_tolerance;
    let (dx, dy) = if at_end {
        (sign(tip.x - next.x), sign(tip.y - next.y))
    } else {
        (sign(next.x - tip.x), sign(next.y - tip.y))
    };
    // moving away from the tip: forward at the start, backward at the end
    let along = if at_end { -1.0 } else { 1.0 };

    if horizontal {
        let x = tip.x + along * near * or_one(dx);
        let anchor = match (at_end, dx >= 0.0) {
            (false, true) | (true, false) => TextAnchor::Start,
            _ => TextAnchor::End,
        };
        LabelPlacement {
            text: card.symbol(),
            x,
            y: tip.y - off - config.horizontal_lift,
            anchor,
        }
    } else {
        let y = tip.y + along * near * or_one(dy);
        let (a, b) = if at_end { (next, tip) } else { (tip, next) };
        let right = b.x > a.x;
        LabelPlacement {
            text: card.symbol(),
            x: tip.x + if right { -off } else { off },
            y,
            anchor: if right { TextAnchor::End } else { TextAnchor::Start },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> RouterConfig {
        RouterConfig::default()
    }

    #[test]
    fn test_horizontal_ends() {
        let pts = [
            Point::new(200.0, 50.0),
            Point::new(212.0, 50.0),
            Point::new(388.0, 50.0),
            Point::new(400.0, 50.0),
        ];
        let (s, e) = place_labels(&pts, Cardinality::Many, Cardinality::One, &config()).unwrap();
        assert_eq!(
            s,
            LabelPlacement {
                text: "*",
                x: 214.0,
                y: 42.0,
                anchor: TextAnchor::Start
            }
        );
        assert_eq!(
            e,
            LabelPlacement {
                text: "1",
                x: 386.0,
                y: 42.0,
                anchor: TextAnchor::End
            }
        );
    }

    #[test]
    fn test_leftward_line() {
        let pts = [Point::new(400.0, 50.0), Point::new(200.0, 50.0)];
        let (s, e) = place_labels(&pts, Cardinality::Many, Cardinality::One, &config()).unwrap();
        assert_eq!((s.x, s.anchor), (386.0, TextAnchor::End));
        assert_eq!((e.x, e.anchor), (214.0, TextAnchor::Start));
    }

    #[test]
    fn test_vertical_ends() {
        let pts = [
            Point::new(100.0, 100.0),
            Point::new(100.0, 112.0),
            Point::new(100.0, 300.0),
        ];
        let (s, e) = place_labels(&pts, Cardinality::Many, Cardinality::One, &config()).unwrap();
        assert_eq!((s.x, s.y, s.anchor), (106.0, 114.0, TextAnchor::Start));
        assert_eq!((e.x, e.y), (106.0, 286.0));
    }

    #[test]
    fn test_too_short() {
        assert!(place_labels(&[Point::new(0.0, 0.0)], Cardinality::One, Cardinality::One, &config()).is_none());
    }
}
