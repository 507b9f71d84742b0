//! Tab polarity generation and piece outline construction.
//!
//! Every interior edge of the grid gets one random polarity. The two cells
//! sharing that edge read it with opposite signs, so one side indents exactly
//! where the other bulges and the pieces interlock.

use geo::{BoundingRect, Intersects};
use geo_types::{LineString, Polygon};
use lyon_geom::{CubicBezierSegment, point};
use rand::Rng;

use crate::constants::{CURVE_TOLERANCE, TAB_NECK_END, TAB_NECK_START, TAB_SIZE_RATIO};
use crate::error::{PuzzleError, Result};
use crate::models::{EdgeTabs, Point, Rect, Size};

/// Polarity of every interior edge of a square grid.
///
/// `vertical[row][col]` is the edge between `(row, col)` and `(row, col + 1)`;
/// `horizontal[row][col]` is the edge between `(row, col)` and `(row + 1, col)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TabMap {
    grid: usize,
    vertical: Vec<Vec<i8>>,
    horizontal: Vec<Vec<i8>>,
}

fn draw_polarity<R: Rng + ?Sized>(rng: &mut R) -> i8 {
    if rng.random_bool(0.5) { 1 } else { -1 }
}

impl TabMap {
    /// Draws each interior edge independently and uniformly from {-1, +1}.
    pub fn random<R: Rng + ?Sized>(grid: usize, rng: &mut R) -> Self {
        let inner = grid.saturating_sub(1);
        let vertical = (0..grid)
            .map(|_| (0..inner).map(|_| draw_polarity(rng)).collect())
            .collect();
        let horizontal = (0..inner)
            .map(|_| (0..grid).map(|_| draw_polarity(rng)).collect())
            .collect();
        TabMap {
            grid,
            vertical,
            horizontal,
        }
    }

    /// Builds a map from explicit polarities, checking shape and values.
    pub fn from_parts(
        grid: usize,
        vertical: Vec<Vec<i8>>,
        horizontal: Vec<Vec<i8>>,
    ) -> Result<Self> {
        if grid == 0 {
            return Err(PuzzleError::InvalidGridSize(0));
        }
        let inner = grid - 1;
        let shape_ok = vertical.len() == grid
            && vertical.iter().all(|r| r.len() == inner)
            && horizontal.len() == inner
            && horizontal.iter().all(|r| r.len() == grid);
        if !shape_ok {
            return Err(PuzzleError::InvalidGridSize(grid as i64));
        }
        if let Some(&bad) = vertical
            .iter()
            .chain(horizontal.iter())
            .flatten()
            .find(|v| v.abs() != 1)
        {
            return Err(PuzzleError::InvalidPolarity(bad));
        }
        Ok(TabMap {
            grid,
            vertical,
            horizontal,
        })
    }

    pub fn grid_size(&self) -> usize {
        self.grid
    }

    /// Tabs of cell `(row, col)`; perimeter sides are always straight.
    pub fn edge_tabs(&self, row: usize, col: usize) -> EdgeTabs {
        let last = self.grid - 1;
        EdgeTabs {
            top: if row == 0 {
                0
            } else {
                -self.horizontal[row - 1][col]
            },
            right: if col == last { 0 } else { self.vertical[row][col] },
            bottom: if row == last {
                0
            } else {
                self.horizontal[row][col]
            },
            left: if col == 0 {
                0
            } else {
                -self.vertical[row][col - 1]
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    CubicTo { ctrl1: Point, ctrl2: Point, to: Point },
    Close,
}

/// Closed piece outline in piece-local coordinates.
///
/// Keeps the exact path for painting and a flattened ring for hit-testing.
#[derive(Clone, Debug)]
pub struct Outline {
    commands: Vec<PathCommand>,
    ring: Polygon<f64>,
}

impl PartialEq for Outline {
    fn eq(&self, other: &Self) -> bool {
        self.commands == other.commands
    }
}

impl Outline {
    fn from_commands(commands: Vec<PathCommand>) -> Self {
        let ring = Polygon::new(LineString::from(flatten(&commands)), vec![]);
        Outline { commands, ring }
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    /// Polyline approximation of the outline, curves included.
    pub fn flatten(&self) -> Vec<Point> {
        self.ring
            .exterior()
            .coords()
            .map(|c| Point::new(c.x, c.y))
            .collect()
    }

    /// Point-in-outline test; points on the boundary count as inside.
    pub fn contains(&self, local: Point) -> bool {
        self.ring.intersects(&geo_types::Point::new(local.x, local.y))
    }

    /// Bounding box including tab overflow.
    pub fn bounds(&self) -> Rect {
        match self.ring.bounding_rect() {
            Some(r) => Rect::new(r.min().x, r.min().y, r.width(), r.height()),
            None => Rect::default(),
        }
    }
}

fn flatten(commands: &[PathCommand]) -> Vec<(f64, f64)> {
    let mut pts = Vec::new();
    let mut cursor = Point::default();
    for cmd in commands {
        match *cmd {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => {
                pts.push((p.x, p.y));
                cursor = p;
            }
            PathCommand::CubicTo { ctrl1, ctrl2, to } => {
                let curve = CubicBezierSegment {
                    from: point(cursor.x, cursor.y),
                    ctrl1: point(ctrl1.x, ctrl1.y),
                    ctrl2: point(ctrl2.x, ctrl2.y),
                    to: point(to.x, to.y),
                };
                curve.for_each_flattened(CURVE_TOLERANCE, &mut |segment| {
                    pts.push((segment.to.x, segment.to.y));
                });
                cursor = to;
            }
            PathCommand::Close => {}
        }
    }
    pts
}

/// Builds the outline of a `size` cell with the given tabs, traversing
/// top, right, bottom, left starting from the local origin.
pub fn build_outline(size: Size, tabs: EdgeTabs) -> Outline {
    let Size { w, h } = size;
    let tab = w.min(h) * TAB_SIZE_RATIO;
    let corners = [
        Point::new(0.0, 0.0),
        Point::new(w, 0.0),
        Point::new(w, h),
        Point::new(0.0, h),
    ];
    let mut cmds = vec![PathCommand::MoveTo(corners[0])];
    for (i, polarity) in tabs.sides().into_iter().enumerate() {
        edge(&mut cmds, corners[i], corners[(i + 1) % 4], polarity, tab);
    }
    cmds.push(PathCommand::Close);
    Outline::from_commands(cmds)
}

fn edge(cmds: &mut Vec<PathCommand>, from: Point, to: Point, polarity: i8, tab: f64) {
    if polarity == 0 {
        cmds.push(PathCommand::LineTo(to));
        return;
    }
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let len = dx.hypot(dy);
    // Unit normal; with clockwise traversal on a y-down canvas it points into the cell.
    let (nx, ny) = (-dy / len, dx / len);
    let s = polarity as f64 * tab;
    let along = |f: f64| Point::new(from.x + dx * f, from.y + dy * f);
    let lift = |p: Point, k: f64| Point::new(p.x + nx * s * k, p.y + ny * s * k);

    let neck_in = along(TAB_NECK_START);
    let neck_out = along(TAB_NECK_END);
    cmds.push(PathCommand::LineTo(neck_in));
    cmds.push(PathCommand::CubicTo {
        ctrl1: lift(neck_in, 0.2),
        ctrl2: lift(along(0.4), 0.9),
        to: lift(along(0.5), 1.0),
    });
    cmds.push(PathCommand::CubicTo {
        ctrl1: lift(along(0.6), 0.9),
        ctrl2: lift(neck_out, 0.2),
        to: neck_out,
    });
    cmds.push(PathCommand::LineTo(to));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn square(tabs: EdgeTabs) -> Outline {
        build_outline(Size::new(100.0, 100.0), tabs)
    }

    #[test]
    fn neighbours_carry_opposite_tabs() {
        let mut rng = StdRng::seed_from_u64(7);
        let map = TabMap::random(6, &mut rng);
        for r in 0..6 {
            for c in 0..6 {
                let a = map.edge_tabs(r, c);
                if c + 1 < 6 {
                    assert_eq!(a.right, -map.edge_tabs(r, c + 1).left);
                    assert_ne!(a.right, 0);
                }
                if r + 1 < 6 {
                    assert_eq!(a.bottom, -map.edge_tabs(r + 1, c).top);
                    assert_ne!(a.bottom, 0);
                }
            }
        }
    }

    #[test]
    fn perimeter_edges_are_straight() {
        let mut rng = StdRng::seed_from_u64(11);
        let n = 5;
        let map = TabMap::random(n, &mut rng);
        for i in 0..n {
            assert_eq!(map.edge_tabs(0, i).top, 0);
            assert_eq!(map.edge_tabs(n - 1, i).bottom, 0);
            assert_eq!(map.edge_tabs(i, 0).left, 0);
            assert_eq!(map.edge_tabs(i, n - 1).right, 0);
        }
    }

    #[test]
    fn single_cell_grid_has_no_tabs() {
        let mut rng = StdRng::seed_from_u64(1);
        let map = TabMap::random(1, &mut rng);
        assert_eq!(map.grid_size(), 1);
        assert_eq!(map.edge_tabs(0, 0), EdgeTabs::default());
    }

    #[test]
    fn same_seed_gives_identical_outlines() {
        let build = || {
            let mut rng = StdRng::seed_from_u64(42);
            let map = TabMap::random(4, &mut rng);
            build_outline(Size::new(37.5, 41.25), map.edge_tabs(1, 2))
        };
        let a = build();
        let b = build();
        assert_eq!(a, b);
        let bits = |o: &Outline| -> Vec<u64> {
            o.flatten()
                .iter()
                .flat_map(|p| [p.x.to_bits(), p.y.to_bits()])
                .collect()
        };
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn straight_edges_produce_plain_rectangle() {
        let o = square(EdgeTabs::default());
        assert_eq!(o.commands().len(), 6);
        assert_eq!(o.bounds(), Rect::new(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn negative_tab_bulges_out_positive_indents() {
        // tab depth is 25px on a 100px cell
        let bulge = square(EdgeTabs::new(0, -1, 0, 0).unwrap());
        assert!(bulge.contains(Point::new(115.0, 50.0)));
        assert!((bulge.bounds().right() - 125.0).abs() < 1e-6);

        let socket = square(EdgeTabs::new(0, 1, 0, 0).unwrap());
        assert!(!socket.contains(Point::new(90.0, 50.0)));
        assert!(socket.contains(Point::new(90.0, 10.0)));
        assert!((socket.bounds().right() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn mating_edges_fill_the_same_region() {
        // Right bulge of one cell must match the left socket of its neighbour.
        let left = square(EdgeTabs::new(0, -1, 0, 0).unwrap());
        let right = square(EdgeTabs::new(0, 0, 0, 1).unwrap());
        for y in [42.0, 50.0, 58.0] {
            let p = Point::new(110.0, y);
            assert!(left.contains(p));
            assert!(!right.contains(Point::new(p.x - 100.0, p.y)));
        }
    }

    #[test]
    fn from_parts_validates_shape_and_values() {
        let map = TabMap::from_parts(2, vec![vec![1], vec![-1]], vec![vec![1, 1]]).unwrap();
        assert_eq!(map.grid_size(), 2);
        assert_eq!(
            TabMap::from_parts(2, vec![vec![1], vec![0]], vec![vec![1, 1]]),
            Err(PuzzleError::InvalidPolarity(0))
        );
        assert_eq!(
            TabMap::from_parts(2, vec![vec![1]], vec![vec![1, 1]]),
            Err(PuzzleError::InvalidGridSize(2))
        );
    }
}
