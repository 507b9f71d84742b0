//! Jigsaw puzzle engine: tab geometry, layout, drag/snap interaction and
//! frame painting, independent of any windowing or browser API.

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod interaction;
pub mod layout;
pub mod models;
pub mod render;
pub mod session;

pub use config::PuzzleConfig;
pub use engine::{Engine, LevelRequest, LoadState, LoadTicket, PointerUp, PuzzleEvent};
pub use error::{PuzzleError, Result};
pub use geometry::{Outline, PathCommand, TabMap, build_outline};
pub use interaction::{CanvasBounds, DragState, PointerSample, Release, canvas_point};
pub use models::{EdgeTabs, ImageInfo, Piece, Point, PuzzleLayout, Rect, Size};
pub use render::Surface;
pub use session::{GameSession, LevelProgress, MemoryProgress, PlayerRecord};
