//! The engine instance: one level's pieces, the drag state and the load
//! lifecycle, all mutated from a single event-processing thread.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use crate::config::PuzzleConfig;
use crate::error::{PuzzleError, Result};
use crate::geometry::{TabMap, build_outline};
use crate::interaction::{DragState, Release};
use crate::layout::{ScatterArea, target_rect};
use crate::models::{ImageInfo, Piece, Point, PuzzleLayout, Size};
use crate::render::{Surface, render_frame};

/// Notifications for the surrounding UI.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PuzzleEvent {
    LevelLoaded { level: u32, grid_size: usize },
    PieceSnapped { row: usize, col: usize },
    PuzzleCompleted { level: u32 },
    ImageLoadFailed { level: u32, asset: String, reason: String },
}

impl PuzzleEvent {
    /// DOM event name used by the browser front end.
    pub fn dom_name(&self) -> &'static str {
        match self {
            PuzzleEvent::LevelLoaded { .. } => "puzzle:levelloaded",
            PuzzleEvent::PieceSnapped { .. } => "puzzle:piecesnapped",
            PuzzleEvent::PuzzleCompleted { .. } => "puzzle:completed",
            PuzzleEvent::ImageLoadFailed { .. } => "puzzle:loadfailed",
        }
    }
}

/// Identifies one level load. Only the most recent ticket is honoured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LoadTicket(u64);

/// What the host must fetch before the level can be generated.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelRequest {
    pub ticket: LoadTicket,
    pub level: u32,
    pub grid_size: usize,
    pub asset: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LoadState {
    Idle,
    Pending(LevelRequest),
    Ready,
    Failed(PuzzleError),
}

/// Result of releasing the pointer, including whether that release finished the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointerUp {
    pub release: Release,
    pub completed: bool,
}

pub struct Engine {
    config: PuzzleConfig,
    rng: StdRng,
    viewport: Size,
    level: u32,
    generation: u64,
    load: LoadState,
    layout: Option<PuzzleLayout>,
    pieces: Vec<Piece>,
    drag: DragState,
    completed: bool,
    events: Vec<PuzzleEvent>,
}

impl Engine {
    /// All tab shapes and scatter positions derive from `seed`.
    pub fn new(config: PuzzleConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        Ok(Engine {
            config,
            rng: StdRng::seed_from_u64(seed),
            viewport: Size::default(),
            level: 0,
            generation: 0,
            load: LoadState::Idle,
            layout: None,
            pieces: Vec::new(),
            drag: DragState::default(),
            completed: false,
            events: Vec::new(),
        })
    }

    pub fn config(&self) -> &PuzzleConfig {
        &self.config
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn layout(&self) -> Option<&PuzzleLayout> {
        self.layout.as_ref()
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn drag(&self) -> &DragState {
        &self.drag
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Locked and total piece counts.
    pub fn progress(&self) -> (usize, usize) {
        let locked = self.pieces.iter().filter(|p| p.locked).count();
        (locked, self.pieces.len())
    }

    /// Canvas resized. Pieces and the target outline keep their geometry.
    pub fn resize(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    /// Starts loading `level`, discarding the current pieces and invalidating
    /// any load still in flight.
    pub fn begin_level(&mut self, level: u32) -> Result<LevelRequest> {
        let grid_size = self.config.grid_size_for_level(level)?;
        let asset = self.config.asset_for_level(level)?.to_string();
        self.generation += 1;
        self.level = level;
        self.layout = None;
        self.pieces.clear();
        self.drag = DragState::default();
        self.completed = false;
        let req = LevelRequest {
            ticket: LoadTicket(self.generation),
            level,
            grid_size,
            asset,
        };
        log::info!("loading level {level} ({grid_size}x{grid_size}) from {}", req.asset);
        self.load = LoadState::Pending(req.clone());
        Ok(req)
    }

    /// Re-issues the request for the current level, e.g. after a failed image load.
    pub fn retry(&mut self) -> Result<LevelRequest> {
        self.begin_level(self.level)
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        matches!(&self.load, LoadState::Pending(req) if req.ticket == ticket)
    }

    /// Image for `ticket` finished loading. Returns `Ok(false)` for a stale ticket.
    /// A viewport too small to give pieces any area is `DegenerateLayout`; the
    /// request stays pending so it can complete after a `resize`.
    pub fn complete_load(&mut self, ticket: LoadTicket, image: ImageInfo) -> Result<bool> {
        let LoadState::Pending(req) = &self.load else {
            log::warn!("ignoring image load with no level pending");
            return Ok(false);
        };
        if req.ticket != ticket {
            log::warn!("ignoring stale image load {:?}", ticket);
            return Ok(false);
        }
        let (level, grid_size) = (req.level, req.grid_size);
        if image.width == 0 || image.height == 0 {
            return Err(PuzzleError::InvalidImage {
                width: image.width,
                height: image.height,
            });
        }
        let target = target_rect(self.viewport, image);
        let piece_size = Size::new(target.w / grid_size as f64, target.h / grid_size as f64);
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !usable(piece_size.w) || !usable(piece_size.h) {
            return Err(PuzzleError::DegenerateLayout {
                piece_w: piece_size.w,
                piece_h: piece_size.h,
            });
        }
        self.generate(PuzzleLayout {
            grid_size,
            target,
            crop: image.full_crop(),
            piece_size,
        });
        self.load = LoadState::Ready;
        self.events.push(PuzzleEvent::LevelLoaded { level, grid_size });
        Ok(true)
    }

    /// Image for `ticket` failed. The failure is recorded for retry; stale
    /// failures are dropped and return `None`.
    pub fn fail_load(&mut self, ticket: LoadTicket, reason: impl Into<String>) -> Option<PuzzleError> {
        let LoadState::Pending(req) = &self.load else {
            return None;
        };
        if req.ticket != ticket {
            return None;
        }
        let (level, asset, reason) = (req.level, req.asset.clone(), reason.into());
        self.events.push(PuzzleEvent::ImageLoadFailed {
            level,
            asset: asset.clone(),
            reason: reason.clone(),
        });
        let err = PuzzleError::ImageLoad { asset, reason };
        log::warn!("{err}");
        self.load = LoadState::Failed(err.clone());
        Some(err)
    }

    fn generate(&mut self, layout: PuzzleLayout) {
        let PuzzleLayout {
            grid_size: grid,
            target,
            piece_size,
            ..
        } = layout;
        let tabs = TabMap::random(grid, &mut self.rng);
        let area = ScatterArea {
            viewport: self.viewport,
            target,
            header: self.config.header_height,
            padding: self.config.padding,
        };

        let mut fallbacks = 0usize;
        let mut pieces = Vec::with_capacity(grid * grid);
        for row in 0..grid {
            for col in 0..grid {
                let (pos, fell_back) = area.safe_position(piece_size, &mut self.rng);
                fallbacks += fell_back as usize;
                let edge_tabs = tabs.edge_tabs(row, col);
                pieces.push(Piece {
                    row,
                    col,
                    target: layout.cell_origin(row, col),
                    pos,
                    size: piece_size,
                    tabs: edge_tabs,
                    outline: build_outline(piece_size, edge_tabs),
                    locked: false,
                    z_index: 0,
                });
            }
        }
        if fallbacks > 0 {
            let err = PuzzleError::DegenerateLayout {
                piece_w: piece_size.w,
                piece_h: piece_size.h,
            };
            log::warn!("{err}; {fallbacks} pieces placed along the bottom edge");
        }
        log::debug!(
            "generated {} pieces, target {:?}, piece {:?}",
            pieces.len(),
            target,
            piece_size
        );
        self.layout = Some(layout);
        self.pieces = pieces;
    }

    /// Returns true when a piece was picked up.
    pub fn pointer_down(&mut self, at: Point) -> bool {
        self.drag.pointer_down(&mut self.pieces, at).is_some()
    }

    /// Returns true when the held piece moved.
    pub fn pointer_move(&mut self, at: Point) -> bool {
        self.drag.pointer_move(&mut self.pieces, at)
    }

    pub fn pointer_up(&mut self) -> PointerUp {
        let release = self.drag.pointer_up(&mut self.pieces, self.config.snap_distance);
        if let Release::Snapped(idx) = release {
            let p = &self.pieces[idx];
            log::info!("piece ({}, {}) snapped", p.row, p.col);
            self.events.push(PuzzleEvent::PieceSnapped {
                row: p.row,
                col: p.col,
            });
        }
        let completed = release != Release::Idle && self.check_win();
        PointerUp { release, completed }
    }

    /// True exactly once per level: the first time every piece is locked.
    pub fn check_win(&mut self) -> bool {
        if self.completed || self.pieces.is_empty() || !self.pieces.iter().all(|p| p.locked) {
            return false;
        }
        self.completed = true;
        log::info!("level {} complete", self.level);
        self.events.push(PuzzleEvent::PuzzleCompleted { level: self.level });
        true
    }

    pub fn drain_events(&mut self) -> Vec<PuzzleEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn render<S: Surface + ?Sized>(&self, surface: &mut S, image_ready: bool) {
        render_frame(
            surface,
            self.viewport,
            self.layout.as_ref(),
            &self.pieces,
            image_ready,
        );
    }
}
