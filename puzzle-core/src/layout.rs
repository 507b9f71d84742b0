//! On-screen placement: the target outline and the initial scatter.

use rand::Rng;

use crate::constants::{
    MAX_TARGET_HEIGHT_FRACTION, NARROW_TARGET_FRACTION, WIDE_TARGET_FRACTION, WIDE_VIEWPORT_PX,
};
use crate::error::{PuzzleError, Result};
use crate::models::{ImageInfo, Point, Rect, Size};

/// Centered target outline that keeps the image aspect ratio.
pub fn target_rect(viewport: Size, image: ImageInfo) -> Rect {
    let ratio = image.aspect();
    let fraction = if viewport.w > WIDE_VIEWPORT_PX {
        WIDE_TARGET_FRACTION
    } else {
        NARROW_TARGET_FRACTION
    };
    let mut w = viewport.w * fraction;
    let mut h = w / ratio;
    let max_h = viewport.h * MAX_TARGET_HEIGHT_FRACTION;
    if h > max_h {
        h = max_h;
        w = h * ratio;
    }
    Rect::new((viewport.w - w) / 2.0, (viewport.h - h) / 2.0, w, h)
}

/// Free space around the target outline where loose pieces start.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScatterArea {
    pub viewport: Size,
    pub target: Rect,
    pub header: f64,
    pub padding: f64,
}

impl ScatterArea {
    /// Top, bottom, left and right strips bounding the target.
    pub fn regions(&self) -> [Rect; 4] {
        let Size { w, h } = self.viewport;
        let t = self.target;
        let p = self.padding;
        [
            Rect::new(p, self.header, w - 2.0 * p, t.y - self.header),
            Rect::new(p, t.bottom(), w - 2.0 * p, h - t.bottom() - p),
            Rect::new(p, self.header, t.x - p, h - self.header),
            Rect::new(t.right(), self.header, w - t.right() - p, h - self.header),
        ]
    }

    /// Regions large enough to hold one whole piece.
    pub fn eligible(&self, piece: Size) -> Vec<Rect> {
        self.regions()
            .into_iter()
            .filter(|r| r.w > piece.w && r.h > piece.h)
            .collect()
    }

    /// Random position in a random eligible region with the piece fully inside it.
    pub fn scatter<R: Rng + ?Sized>(&self, piece: Size, rng: &mut R) -> Result<Point> {
        let usable = self.eligible(piece);
        if usable.is_empty() {
            return Err(PuzzleError::DegenerateLayout {
                piece_w: piece.w,
                piece_h: piece.h,
            });
        }
        let area = usable[rng.random_range(0..usable.len())];
        Ok(Point::new(
            rng.random_range(area.x..=area.right() - piece.w),
            rng.random_range(area.y..=area.bottom() - piece.h),
        ))
    }

    /// Somewhere along the bottom edge of the viewport.
    pub fn fallback<R: Rng + ?Sized>(&self, piece: Size, rng: &mut R) -> Point {
        let lo = self.padding;
        let hi = self.viewport.w - piece.w - self.padding;
        let x = if hi > lo {
            rng.random_range(lo..=hi)
        } else {
            lo
        };
        Point::new(x, self.viewport.h - piece.h - self.padding)
    }

    /// Best-effort start position: outside the target when geometry allows.
    pub fn safe_position<R: Rng + ?Sized>(&self, piece: Size, rng: &mut R) -> (Point, bool) {
        match self.scatter(piece, rng) {
            Ok(p) => (p, false),
            Err(_) => (self.fallback(piece, rng), true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn img(w: u32, h: u32) -> ImageInfo {
        ImageInfo::new(w, h).unwrap()
    }

    #[test]
    fn desktop_viewport_uses_sixty_percent_width() {
        let r = target_rect(Size::new(1000.0, 800.0), img(1200, 900));
        let want = Rect::new(200.0, 175.0, 600.0, 450.0);
        for (got, exp) in [(r.x, want.x), (r.y, want.y), (r.w, want.w), (r.h, want.h)] {
            assert!((got - exp).abs() < 1e-9, "{got} != {exp}");
        }
    }

    #[test]
    fn narrow_viewport_uses_nearly_full_width() {
        let r = target_rect(Size::new(400.0, 900.0), img(1000, 1000));
        assert!((r.w - 384.0).abs() < 1e-9);
        assert!((r.h - 384.0).abs() < 1e-9);
    }

    #[test]
    fn tall_image_is_height_clamped_and_width_recomputed() {
        let r = target_rect(Size::new(1000.0, 600.0), img(500, 1000));
        assert!((r.h - 420.0).abs() < 1e-9);
        assert!((r.w - 210.0).abs() < 1e-9);
        assert!((r.x - 395.0).abs() < 1e-9);
    }

    #[test]
    fn scattered_pieces_stay_out_of_target() {
        let viewport = Size::new(1000.0, 800.0);
        let target = target_rect(viewport, img(1200, 900));
        let area = ScatterArea {
            viewport,
            target,
            header: 80.0,
            padding: 10.0,
        };
        let piece = Size::new(target.w / 8.0, target.h / 8.0);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            let p = area.scatter(piece, &mut rng).unwrap();
            assert!(!Rect::from_origin(p, piece).overlaps(&target));
        }
    }

    #[test]
    fn cramped_viewport_reports_degenerate_layout_and_falls_back() {
        let viewport = Size::new(200.0, 200.0);
        let area = ScatterArea {
            viewport,
            target: Rect::new(5.0, 30.0, 190.0, 140.0),
            header: 80.0,
            padding: 10.0,
        };
        let piece = Size::new(60.0, 60.0);
        let mut rng = StdRng::seed_from_u64(9);
        assert!(matches!(
            area.scatter(piece, &mut rng),
            Err(PuzzleError::DegenerateLayout { .. })
        ));
        let (p, fell_back) = area.safe_position(piece, &mut rng);
        assert!(fell_back);
        assert_eq!(p.y, 200.0 - 60.0 - 10.0);
        assert!(p.x >= 10.0 && p.x <= 200.0 - 60.0 - 10.0);
    }
}
