//! Pointer normalisation, hit-testing and the drag/snap state machine.

use serde::{Deserialize, Serialize};

use crate::models::{Piece, Point};

/// Raw pointer position as delivered by the platform: client coordinates of
/// the event plus the first active touch, if it was a touch event.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerSample {
    pub client: Point,
    pub first_touch: Option<Point>,
}

/// Canvas element placement on the page (CSS pixels) and its backing store size.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanvasBounds {
    pub left: f64,
    pub top: f64,
    pub css_w: f64,
    pub css_h: f64,
    pub pixel_w: f64,
    pub pixel_h: f64,
}

/// Converts mouse or touch input into canvas-local pixel coordinates, so
/// hit testing still works when CSS scales the canvas element.
pub fn canvas_point(sample: PointerSample, bounds: CanvasBounds) -> Point {
    let src = sample.first_touch.unwrap_or(sample.client);
    Point::new(
        (src.x - bounds.left) * bounds.pixel_w / bounds.css_w.max(1.0),
        (src.y - bounds.top) * bounds.pixel_h / bounds.css_h.max(1.0),
    )
}

/// Topmost unlocked piece under `at`, if any.
pub fn hit_test(pieces: &[Piece], at: Point) -> Option<usize> {
    let mut order: Vec<usize> = (0..pieces.len()).filter(|&i| !pieces[i].locked).collect();
    // Stable sort: among equal z, earlier pieces win.
    order.sort_by(|&a, &b| pieces[b].z_index.cmp(&pieces[a].z_index));
    order.into_iter().find(|&i| pieces[i].hit(at))
}

/// Outcome of releasing the pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Release {
    /// Nothing was held.
    Idle,
    /// Piece dropped where it was released.
    Dropped(usize),
    /// Piece was close enough to its slot and is now locked.
    Snapped(usize),
}

#[derive(Clone, Debug, PartialEq)]
pub struct DragState {
    active: Option<usize>,
    offset: Point,
    next_z: u32,
}

impl Default for DragState {
    fn default() -> Self {
        DragState {
            active: None,
            offset: Point::default(),
            next_z: 1,
        }
    }
}

impl DragState {
    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn offset(&self) -> Point {
        self.offset
    }

    pub fn next_z(&self) -> u32 {
        self.next_z
    }

    /// Picks up the topmost piece under the pointer and raises it.
    /// Ignored while a piece is already held.
    pub fn pointer_down(&mut self, pieces: &mut [Piece], at: Point) -> Option<usize> {
        if self.active.is_some() {
            return None;
        }
        let idx = hit_test(pieces, at)?;
        let piece = &mut pieces[idx];
        self.active = Some(idx);
        self.offset = at.offset_from(piece.pos);
        piece.z_index = self.next_z;
        self.next_z += 1;
        log::debug!("picked piece ({}, {}) z={}", piece.row, piece.col, piece.z_index);
        Some(idx)
    }

    /// Moves the held piece with the pointer. No clamping to the canvas.
    pub fn pointer_move(&mut self, pieces: &mut [Piece], at: Point) -> bool {
        let Some(piece) = self.active.and_then(|i| pieces.get_mut(i)) else {
            return false;
        };
        piece.pos = at.offset_from(self.offset);
        true
    }

    pub fn pointer_up(&mut self, pieces: &mut [Piece], snap_distance: f64) -> Release {
        let Some(idx) = self.active.take() else {
            return Release::Idle;
        };
        let Some(piece) = pieces.get_mut(idx) else {
            return Release::Idle;
        };
        if piece.distance_to_target() < snap_distance {
            piece.lock_in_place();
            Release::Snapped(idx)
        } else {
            Release::Dropped(idx)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::build_outline;
    use crate::models::{EdgeTabs, Size};

    fn piece(row: usize, col: usize, pos: Point, target: Point) -> Piece {
        let size = Size::new(50.0, 50.0);
        Piece {
            row,
            col,
            target,
            pos,
            size,
            tabs: EdgeTabs::default(),
            outline: build_outline(size, EdgeTabs::default()),
            locked: false,
            z_index: 0,
        }
    }

    #[test]
    fn touch_point_takes_precedence_and_is_scaled() {
        let bounds = CanvasBounds {
            left: 10.0,
            top: 20.0,
            css_w: 100.0,
            css_h: 100.0,
            pixel_w: 200.0,
            pixel_h: 200.0,
        };
        let mouse = PointerSample {
            client: Point::new(60.0, 70.0),
            first_touch: None,
        };
        assert_eq!(canvas_point(mouse, bounds), Point::new(100.0, 100.0));
        let touch = PointerSample {
            client: Point::new(0.0, 0.0),
            first_touch: Some(Point::new(20.0, 30.0)),
        };
        assert_eq!(canvas_point(touch, bounds), Point::new(20.0, 20.0));
    }

    #[test]
    fn highest_z_wins_and_locked_pieces_are_ignored() {
        let mut pieces = vec![
            piece(0, 0, Point::new(0.0, 0.0), Point::new(500.0, 500.0)),
            piece(0, 1, Point::new(10.0, 10.0), Point::new(600.0, 500.0)),
        ];
        assert_eq!(hit_test(&pieces, Point::new(20.0, 20.0)), Some(0));
        pieces[1].z_index = 5;
        assert_eq!(hit_test(&pieces, Point::new(20.0, 20.0)), Some(1));
        pieces[1].locked = true;
        assert_eq!(hit_test(&pieces, Point::new(20.0, 20.0)), Some(0));
        assert_eq!(hit_test(&pieces, Point::new(300.0, 300.0)), None);
    }

    #[test]
    fn drag_moves_by_offset_and_raises_piece() {
        let mut pieces = vec![piece(0, 0, Point::new(0.0, 0.0), Point::new(500.0, 500.0))];
        let mut drag = DragState::default();
        assert_eq!(drag.pointer_down(&mut pieces, Point::new(5.0, 8.0)), Some(0));
        assert!(drag.is_dragging());
        assert_eq!(pieces[0].z_index, 1);
        assert_eq!(drag.next_z(), 2);
        assert!(drag.pointer_move(&mut pieces, Point::new(-95.0, 1008.0)));
        assert_eq!(pieces[0].pos, Point::new(-100.0, 1000.0));
        assert_eq!(drag.pointer_up(&mut pieces, 30.0), Release::Dropped(0));
        assert!(!drag.is_dragging());
        assert!(!drag.pointer_move(&mut pieces, Point::new(0.0, 0.0)));
        assert_eq!(drag.pointer_up(&mut pieces, 30.0), Release::Idle);
    }

    #[test]
    fn snap_threshold_is_strict() {
        let eps = 1e-6;
        for (dist, snaps) in [(30.0 - eps, true), (30.0 + eps, false)] {
            let mut pieces = vec![piece(0, 0, Point::new(0.0, 0.0), Point::new(0.0, 0.0))];
            let mut drag = DragState::default();
            drag.pointer_down(&mut pieces, Point::new(1.0, 1.0));
            drag.pointer_move(&mut pieces, Point::new(1.0 + dist, 1.0));
            let released = drag.pointer_up(&mut pieces, 30.0);
            assert_eq!(released == Release::Snapped(0), snaps);
            assert_eq!(pieces[0].locked, snaps);
            if snaps {
                assert_eq!(pieces[0].pos, pieces[0].target);
                assert_eq!(pieces[0].z_index, 0);
            }
        }
    }

    #[test]
    fn second_press_keeps_the_held_piece() {
        let mut pieces = vec![
            piece(0, 0, Point::new(0.0, 0.0), Point::new(500.0, 500.0)),
            piece(0, 1, Point::new(200.0, 0.0), Point::new(550.0, 500.0)),
        ];
        let mut drag = DragState::default();
        assert_eq!(drag.pointer_down(&mut pieces, Point::new(10.0, 20.0)), Some(0));
        assert_eq!(drag.offset(), Point::new(10.0, 20.0));
        assert_eq!(drag.pointer_down(&mut pieces, Point::new(225.0, 25.0)), None);
        assert_eq!(drag.active(), Some(0));
        assert_eq!(drag.offset(), Point::new(10.0, 20.0));
        assert_eq!(pieces[1].z_index, 0);
        assert_eq!(drag.next_z(), 2);
        assert_eq!(drag.pointer_up(&mut pieces, 30.0), Release::Dropped(0));
    }
}
