//! Iterative separation of overlapping boxes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::types::TableBox;

/// True when `a` and `b`, grown by `padding`, intersect.
pub fn rects_overlap(a: &TableBox, b: &TableBox, padding: f64) -> bool {
    !(a.x + a.w + padding <= b.x
        || b.x + b.w + padding <= a.x
        || a.y + a.h + padding <= b.y
        || b.y + b.h + padding <= a.y)
}

/// Push overlapping pairs apart along their center line by `step` per pass
/// until a pass moves nothing or `max_passes` is reached. Returns the number
/// of passes that moved something.
pub fn resolve_overlaps(
    boxes: &mut [TableBox],
    padding: f64,
    step: f64,
    max_passes: usize,
    seed: u64,
) -> usize {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut passes = 0;
    for _ in 0..max_passes {
        let mut moved = false;
        for i in 0..boxes.len() {
            for j in (i + 1)..boxes.len() {
                if !rects_overlap(&boxes[i], &boxes[j], padding) {
                    continue;
                }
                let (ax, ay) = boxes[i].center();
                let (bx, by) = boxes[j].center();
                let (mut dx, mut dy) = (ax - bx, ay - by);
                if dx == 0.0 && dy == 0.0 {
                    dx = rng.gen_range(-0.5..0.5);
                    dy = rng.gen_range(-0.5..0.5);
                }
                let len = dx.hypot(dy).max(1.0);
                let (ux, uy) = (dx / len * step, dy / len * step);

                boxes[i].x += ux;
                boxes[i].y += uy;
                boxes[j].x -= ux;
                boxes[j].y -= uy;
                moved = true;
            }
        }
        if !moved {
            break;
        }
        passes += 1;
    }
    passes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_predicate() {
        let a = TableBox::at("a", 0.0, 0.0, 100.0, 100.0);
        let b = TableBox::at("b", 110.0, 0.0, 100.0, 100.0);
        assert!(!rects_overlap(&a, &b, 0.0));
        assert!(!rects_overlap(&a, &b, 10.0));
        assert!(rects_overlap(&a, &b, 10.5));
    }

    #[test]
    fn test_separates_stacked_boxes() {
        let mut boxes: Vec<TableBox> = (0..4)
            .map(|i| TableBox::at(format!("t{i}"), 0.0, 0.0, 260.0, 120.0))
            .collect();
        let passes = resolve_overlaps(&mut boxes, 28.0, 10.0, 400, 7);
        assert!(passes > 0 && passes < 400);
        for i in 0..boxes.len() {
            for j in (i + 1)..boxes.len() {
                assert!(!rects_overlap(&boxes[i], &boxes[j], 28.0));
            }
        }
    }

    #[test]
    fn test_same_seed_same_result() {
        let make = || {
            let mut boxes = vec![
                TableBox::at("a", 0.0, 0.0, 100.0, 100.0),
                TableBox::at("b", 0.0, 0.0, 100.0, 100.0),
            ];
            resolve_overlaps(&mut boxes, 28.0, 10.0, 400, 42);
            boxes
        };
        assert_eq!(make(), make());
    }

    #[test]
    fn test_no_overlap_no_passes() {
        let mut boxes = vec![
            TableBox::at("a", 0.0, 0.0, 100.0, 100.0),
            TableBox::at("b", 500.0, 0.0, 100.0, 100.0),
        ];
        assert_eq!(resolve_overlaps(&mut boxes, 28.0, 10.0, 400, 0), 0);
        assert_eq!(boxes[1].x, 500.0);
    }
}
