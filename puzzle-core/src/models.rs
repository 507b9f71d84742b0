use serde::{Deserialize, Serialize};

use crate::constants::HIT_MARGIN_RATIO;
use crate::error::{PuzzleError, Result};
use crate::geometry::Outline;

/// Basic two dimensional point in canvas pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn offset_from(self, origin: Point) -> Point {
        Point::new(self.x - origin.x, self.y - origin.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from(v: (f64, f64)) -> Self {
        Point { x: v.0, y: v.1 }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub w: f64,
    pub h: f64,
}

impl Size {
    pub const fn new(w: f64, h: f64) -> Self {
        Size { w, h }
    }
}

/// Axis-aligned rectangle, origin at the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Rect { x, y, w, h }
    }

    pub fn from_origin(origin: Point, size: Size) -> Self {
        Rect::new(origin.x, origin.y, size.w, size.h)
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// True when the two rectangles share interior area; touching edges do not count.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn inflate(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x - dx, self.y - dy, self.w + 2.0 * dx, self.h + 2.0 * dy)
    }
}

/// Natural dimensions of a decoded level image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
}

impl ImageInfo {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PuzzleError::InvalidImage { width, height });
        }
        Ok(ImageInfo { width, height })
    }

    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Full-image crop; the source region mapped onto the target outline.
    pub fn full_crop(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f64, self.height as f64)
    }
}

/// Per-side tab polarity of one piece.
///
/// `0` is a straight border edge, `+1` indents into the piece and `-1` bulges
/// out of it. Neighbours always carry opposite values on their shared edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeTabs {
    pub top: i8,
    pub right: i8,
    pub bottom: i8,
    pub left: i8,
}

impl EdgeTabs {
    pub fn new(top: i8, right: i8, bottom: i8, left: i8) -> Result<Self> {
        for v in [top, right, bottom, left] {
            if !(-1..=1).contains(&v) {
                return Err(PuzzleError::InvalidPolarity(v));
            }
        }
        Ok(EdgeTabs {
            top,
            right,
            bottom,
            left,
        })
    }

    /// Sides in outline traversal order: top, right, bottom, left.
    pub fn sides(&self) -> [i8; 4] {
        [self.top, self.right, self.bottom, self.left]
    }
}

/// One jigsaw piece. The outline is stored in piece-local coordinates with the
/// cell's top-left corner at the origin.
#[derive(Clone, Debug)]
pub struct Piece {
    pub row: usize,
    pub col: usize,
    /// Correct top-left position inside the target outline.
    pub target: Point,
    /// Live, draggable top-left position.
    pub pos: Point,
    pub size: Size,
    pub tabs: EdgeTabs,
    pub outline: Outline,
    pub locked: bool,
    pub z_index: u32,
}

impl Piece {
    pub fn distance_to_target(&self) -> f64 {
        self.pos.distance(self.target)
    }

    /// Cell rectangle at the current position, ignoring tab overflow.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin(self.pos, self.size)
    }

    /// Two-phase hit test: padded bounding box first, then the curved outline.
    pub fn hit(&self, p: Point) -> bool {
        let slack = self
            .bounds()
            .inflate(self.size.w * HIT_MARGIN_RATIO, self.size.h * HIT_MARGIN_RATIO);
        if !slack.contains(p) {
            return false;
        }
        self.outline.contains(p.offset_from(self.pos))
    }

    /// Moves onto the target slot and freezes the piece in the background layer.
    pub(crate) fn lock_in_place(&mut self) {
        self.pos = self.target;
        self.locked = true;
        self.z_index = 0;
    }
}

/// Resolved geometry of the level currently on screen.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PuzzleLayout {
    pub grid_size: usize,
    pub target: Rect,
    pub crop: Rect,
    pub piece_size: Size,
}

impl PuzzleLayout {
    pub fn cell_origin(&self, row: usize, col: usize) -> Point {
        Point::new(
            self.target.x + col as f64 * self.piece_size.w,
            self.target.y + row as f64 * self.piece_size.h,
        )
    }
}
