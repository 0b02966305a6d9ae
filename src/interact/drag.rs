//! Dragging tables around the canvas.

use super::anim::FrameGate;
use crate::layout::TableBox;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Grab {
    index: usize,
    /// Pointer position relative to the box corner, in content space.
    dx: f64,
    dy: f64,
}

/// Moves one box with the pointer. Routing is requested through a
/// [`FrameGate`] so a burst of moves costs one router pass per frame; the
/// layout engine never re-runs.
#[derive(Debug, Default, Clone)]
pub struct DragController {
    grab: Option<Grab>,
}

/// Move `index` to the top of the paint order.
pub fn raise(order: &mut Vec<usize>, index: usize) {
    order.retain(|&i| i != index);
    order.push(index);
}

impl DragController {
    pub fn is_dragging(&self) -> bool {
        self.grab.is_some()
    }

    pub fn dragged(&self) -> Option<usize> {
        self.grab.map(|g| g.index)
    }

    /// Start dragging `index` from content point `(x, y)`.
    pub fn pointer_down(
        &mut self,
        boxes: &[TableBox],
        order: &mut Vec<usize>,
        index: usize,
        (x, y): (f64, f64),
    ) {
        let Some(b) = boxes.get(index) else {
            return;
        };
        raise(order, index);
        self.grab = Some(Grab {
            index,
            dx: x - b.x,
            dy: y - b.y,
        });
    }

    /// Follow the pointer. Returns true when a box moved.
    pub fn pointer_move(
        &mut self,
        boxes: &mut [TableBox],
        (x, y): (f64, f64),
        gate: &mut FrameGate,
    ) -> bool {
        let Some(g) = self.grab else {
            return false;
        };
        let Some(b) = boxes.get_mut(g.index) else {
            return false;
        };
        b.x = x - g.dx;
        b.y = y - g.dy;
        gate.request();
        true
    }

    /// Finish the drag, returning the box that was being dragged.
    pub fn pointer_up(&mut self) -> Option<usize> {
        self.grab.take().map(|g| g.index)
    }

    pub fn cancel(&mut self) {
        self.grab = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_moves_and_coalesces() {
        let mut boxes = vec![
            TableBox::at("users", 0.0, 0.0, 260.0, 100.0),
            TableBox::at("posts", 400.0, 0.0, 260.0, 100.0),
        ];
        let mut order = vec![0, 1];
        let mut gate = FrameGate::default();
        let mut drag = DragController::default();

        drag.pointer_down(&boxes, &mut order, 0, (10.0, 10.0));
        assert_eq!(order, vec![1, 0]);
        assert!(drag.pointer_move(&mut boxes, (60.0, 30.0), &mut gate));
        assert!(drag.pointer_move(&mut boxes, (110.0, 50.0), &mut gate));
        assert_eq!((boxes[0].x, boxes[0].y), (100.0, 40.0));
        assert!(gate.take());
        assert!(!gate.take());
        assert_eq!(drag.pointer_up(), Some(0));
        assert!(!drag.pointer_move(&mut boxes, (500.0, 500.0), &mut gate));
        assert_eq!(boxes[0].x, 100.0);
    }

    #[test]
    fn test_unknown_index_ignored() {
        let boxes = vec![TableBox::at("a", 0.0, 0.0, 10.0, 10.0)];
        let mut order = vec![0];
        let mut drag = DragController::default();
        drag.pointer_down(&boxes, &mut order, 3, (0.0, 0.0));
        assert!(!drag.is_dragging());
        assert_eq!(order, vec![0]);
    }
}
