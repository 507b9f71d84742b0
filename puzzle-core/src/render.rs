//! Frame painting against an abstract 2D surface.
//!
//! The browser crate implements [`Surface`] on a canvas context; tests use a
//! recording surface.

use crate::constants::{
    GUIDE_COLOR, OUTLINE_COLOR, PLACEHOLDER_COLOR, SHADOW_COLOR, TAB_OVERFLOW_RATIO,
};
use crate::geometry::Outline;
use crate::models::{Piece, Point, PuzzleLayout, Rect, Size};

/// Subset of the canvas 2D API the renderer needs.
pub trait Surface {
    fn clear(&mut self, size: Size);
    /// Dashed rectangle marking where the finished puzzle goes.
    fn stroke_guide(&mut self, rect: Rect, color: &str);
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, by: Point);
    fn set_shadow(&mut self, color: &str, blur: f64, offset: Point);
    fn clip(&mut self, outline: &Outline);
    /// Draws `src` of the level image into `dst`, both in pixels.
    fn draw_image(&mut self, src: Rect, dst: Rect);
    fn fill(&mut self, outline: &Outline, color: &str);
    fn stroke(&mut self, outline: &Outline, color: &str, width: f64);
}

/// Locked pieces first, then loose pieces by ascending z so the held one is on top.
pub fn paint_order(pieces: &[Piece]) -> Vec<usize> {
    let mut locked: Vec<usize> = (0..pieces.len()).filter(|&i| pieces[i].locked).collect();
    let mut loose: Vec<usize> = (0..pieces.len()).filter(|&i| !pieces[i].locked).collect();
    loose.sort_by_key(|&i| pieces[i].z_index);
    locked.append(&mut loose);
    locked
}

/// Source and piece-local destination rectangles for texturing one piece.
///
/// Both are grown by the tab overflow margin so bulging tabs pick up the
/// neighbouring image content.
pub fn sample_regions(piece: &Piece, layout: &PuzzleLayout) -> (Rect, Rect) {
    let Size { w, h } = piece.size;
    let crop = layout.crop;
    let sx = crop.w / layout.target.w;
    let sy = crop.h / layout.target.h;
    let margin = w.max(h) * TAB_OVERFLOW_RATIO;
    let ox = crop.x + piece.col as f64 * w * sx;
    let oy = crop.y + piece.row as f64 * h * sy;
    let src = Rect::new(
        ox - margin * sx,
        oy - margin * sy,
        (w + 2.0 * margin) * sx,
        (h + 2.0 * margin) * sy,
    );
    let dst = Rect::new(-margin, -margin, w + 2.0 * margin, h + 2.0 * margin);
    (src, dst)
}

pub fn draw_piece<S: Surface + ?Sized>(
    surface: &mut S,
    piece: &Piece,
    layout: &PuzzleLayout,
    image_ready: bool,
) {
    surface.save();
    surface.translate(piece.pos);
    if !piece.locked {
        surface.set_shadow(SHADOW_COLOR, 10.0, Point::new(2.0, 2.0));
    }
    surface.save();
    surface.clip(&piece.outline);
    if image_ready {
        let (src, dst) = sample_regions(piece, layout);
        surface.draw_image(src, dst);
    } else {
        surface.fill(&piece.outline, PLACEHOLDER_COLOR);
    }
    surface.restore();
    surface.stroke(&piece.outline, OUTLINE_COLOR, 1.0);
    surface.restore();
}

/// Repaints the whole canvas. Without a layout only the clear happens.
pub fn render_frame<S: Surface + ?Sized>(
    surface: &mut S,
    viewport: Size,
    layout: Option<&PuzzleLayout>,
    pieces: &[Piece],
    image_ready: bool,
) {
    surface.clear(viewport);
    let Some(layout) = layout else {
        return;
    };
    surface.stroke_guide(layout.target, GUIDE_COLOR);
    for idx in paint_order(pieces) {
        draw_piece(surface, &pieces[idx], layout, image_ready);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::build_outline;
    use crate::models::EdgeTabs;

    #[derive(Clone, Debug, PartialEq)]
    pub(crate) enum Op {
        Clear,
        Guide(Rect),
        Save,
        Restore,
        Translate(Point),
        Shadow,
        Clip,
        Image(Rect, Rect),
        Fill(String),
        Stroke,
    }

    #[derive(Default)]
    pub(crate) struct Recorder {
        pub ops: Vec<Op>,
    }

    impl Surface for Recorder {
        fn clear(&mut self, _size: Size) {
            self.ops.push(Op::Clear);
        }
        fn stroke_guide(&mut self, rect: Rect, _color: &str) {
            self.ops.push(Op::Guide(rect));
        }
        fn save(&mut self) {
            self.ops.push(Op::Save);
        }
        fn restore(&mut self) {
            self.ops.push(Op::Restore);
        }
        fn translate(&mut self, by: Point) {
            self.ops.push(Op::Translate(by));
        }
        fn set_shadow(&mut self, _color: &str, _blur: f64, _offset: Point) {
            self.ops.push(Op::Shadow);
        }
        fn clip(&mut self, _outline: &Outline) {
            self.ops.push(Op::Clip);
        }
        fn draw_image(&mut self, src: Rect, dst: Rect) {
            self.ops.push(Op::Image(src, dst));
        }
        fn fill(&mut self, _outline: &Outline, color: &str) {
            self.ops.push(Op::Fill(color.to_string()));
        }
        fn stroke(&mut self, _outline: &Outline, _color: &str, _width: f64) {
            self.ops.push(Op::Stroke);
        }
    }

    fn layout() -> PuzzleLayout {
        PuzzleLayout {
            grid_size: 2,
            target: Rect::new(100.0, 100.0, 200.0, 100.0),
            crop: Rect::new(0.0, 0.0, 400.0, 200.0),
            piece_size: Size::new(100.0, 50.0),
        }
    }

    fn piece(row: usize, col: usize, x: f64, z: u32, locked: bool) -> Piece {
        let size = Size::new(100.0, 50.0);
        Piece {
            row,
            col,
            target: Point::default(),
            pos: Point::new(x, 0.0),
            size,
            tabs: EdgeTabs::default(),
            outline: build_outline(size, EdgeTabs::default()),
            locked,
            z_index: z,
        }
    }

    #[test]
    fn sample_region_includes_scaled_overflow_margin() {
        let (src, dst) = sample_regions(&piece(1, 1, 0.0, 0, false), &layout());
        // scale 2x, margin 50px
        assert_eq!(src, Rect::new(100.0, 0.0, 400.0, 300.0));
        assert_eq!(dst, Rect::new(-50.0, -50.0, 200.0, 150.0));
    }

    #[test]
    fn locked_first_then_loose_by_z() {
        let pieces = vec![
            piece(0, 0, 0.0, 7, false),
            piece(0, 1, 1.0, 0, true),
            piece(1, 0, 2.0, 2, false),
            piece(1, 1, 3.0, 0, true),
        ];
        assert_eq!(paint_order(&pieces), vec![1, 3, 2, 0]);
    }

    #[test]
    fn frame_without_layout_only_clears() {
        let mut rec = Recorder::default();
        render_frame(&mut rec, Size::new(10.0, 10.0), None, &[], true);
        assert_eq!(rec.ops, vec![Op::Clear]);
    }

    #[test]
    fn loose_piece_gets_shadow_and_placeholder_before_image_loads() {
        let mut rec = Recorder::default();
        let l = layout();
        render_frame(
            &mut rec,
            Size::new(400.0, 300.0),
            Some(&l),
            &[piece(0, 0, 5.0, 1, false)],
            false,
        );
        assert_eq!(
            rec.ops,
            vec![
                Op::Clear,
                Op::Guide(l.target),
                Op::Save,
                Op::Translate(Point::new(5.0, 0.0)),
                Op::Shadow,
                Op::Save,
                Op::Clip,
                Op::Fill(PLACEHOLDER_COLOR.to_string()),
                Op::Restore,
                Op::Stroke,
                Op::Restore,
            ]
        );
    }

    #[test]
    fn locked_piece_has_no_shadow() {
        let mut rec = Recorder::default();
        draw_piece(&mut rec, &piece(0, 0, 0.0, 0, true), &layout(), true);
        assert!(!rec.ops.contains(&Op::Shadow));
        assert!(rec.ops.iter().any(|op| matches!(op, Op::Image(..))));
    }
}
