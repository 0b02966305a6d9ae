//! Compact mode: tables shrink to their first rows and back.

use super::anim::{FrameGate, Tween};
use crate::layout::TableBox;

#[derive(Debug, Clone)]
struct Transition {
    heights: Vec<Tween<f64>>,
    opacity: Tween<f64>,
}

/// What a compaction frame changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompactionTick {
    pub changed: bool,
    pub finished: bool,
}

#[derive(Debug, Clone)]
pub struct Compaction {
    compact: bool,
    duration: f64,
    /// Opacity of rows past the compact row count.
    extra_opacity: f64,
    transition: Option<Transition>,
}

impl Compaction {
    pub fn new(compact: bool, duration: f64) -> Self {
        Self {
            compact,
            duration,
            extra_opacity: if compact { 0.0 } else { 1.0 },
            transition: None,
        }
    }

    pub fn is_compact(&self) -> bool {
        self.compact
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    pub fn extra_opacity(&self) -> f64 {
        self.extra_opacity
    }

    /// Extra rows stay displayed while they fade out and only disappear
    /// once compaction completes.
    pub fn extra_rows_visible(&self) -> bool {
        !self.compact || self.transition.is_some()
    }

    /// Flip the mode and start animating every box from its current height
    /// toward the new target.
    pub fn toggle(&mut self, boxes: &[TableBox], now: f64) -> bool {
        self.compact = !self.compact;
        let heights = boxes
            .iter()
            .map(|b| {
                let target = if self.compact { b.compact_h } else { b.full_h };
                Tween::new(b.h, target, now, self.duration)
            })
            .collect();
        let opacity_target = if self.compact { 0.0 } else { 1.0 };
        self.transition = Some(Transition {
            heights,
            opacity: Tween::new(self.extra_opacity, opacity_target, now, self.duration),
        });
        self.compact
    }

    /// Advance the running transition, requesting a router pass through
    /// `gate` while heights change.
    pub fn tick(&mut self, boxes: &mut [TableBox], now: f64, gate: &mut FrameGate) -> CompactionTick {
        let Some(t) = &self.transition else {
            return CompactionTick::default();
        };
        for (b, tween) in boxes.iter_mut().zip(&t.heights) {
            b.h = tween.sample(now);
        }
        self.extra_opacity = t.opacity.sample(now);
        let finished = t.opacity.is_done(now);
        if finished {
            self.transition = None;
        } else {
            gate.request();
        }
        CompactionTick {
            changed: true,
            finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxes() -> Vec<TableBox> {
        let mut b = TableBox::at("users", 0.0, 0.0, 260.0, 174.0);
        b.compact_h = 118.0;
        let small = TableBox::at("tags", 400.0, 0.0, 260.0, 62.0);
        vec![b, small]
    }

    #[test]
    fn test_toggle_round_trip() {
        let mut boxes = boxes();
        let mut gate = FrameGate::default();
        let mut c = Compaction::new(false, 260.0);

        assert!(c.toggle(&boxes, 0.0));
        let mid = c.tick(&mut boxes, 130.0, &mut gate);
        assert_eq!(mid, CompactionTick { changed: true, finished: false });
        assert_eq!(boxes[0].h, 146.0);
        assert!(c.extra_rows_visible());
        assert!(gate.take());

        let end = c.tick(&mut boxes, 260.0, &mut gate);
        assert!(end.finished);
        assert_eq!(boxes[0].h, 118.0);
        assert_eq!(boxes[1].h, 62.0);
        assert_eq!(c.extra_opacity(), 0.0);
        assert!(!c.extra_rows_visible());

        assert!(!c.toggle(&boxes, 1000.0));
        assert!(c.extra_rows_visible());
        c.tick(&mut boxes, 1260.0, &mut gate);
        assert_eq!(boxes[0].h, 174.0);
        assert_eq!(c.extra_opacity(), 1.0);
        assert_eq!(c.tick(&mut boxes, 2000.0, &mut gate), CompactionTick::default());
    }

    #[test]
    fn test_reverse_mid_animation() {
        let mut boxes = boxes();
        let mut gate = FrameGate::default();
        let mut c = Compaction::new(false, 260.0);
        c.toggle(&boxes, 0.0);
        c.tick(&mut boxes, 130.0, &mut gate);
        c.toggle(&boxes, 130.0);
        c.tick(&mut boxes, 130.0, &mut gate);
        assert_eq!(boxes[0].h, 146.0);
        c.tick(&mut boxes, 390.0, &mut gate);
        assert_eq!(boxes[0].h, 174.0);
    }
}
