use thiserror::Error;

/// Errors surfaced by the puzzle engine.
///
/// Pointer interaction never fails; a miss or a stray move is simply a no-op.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PuzzleError {
    /// The level image could not be fetched or decoded. Retryable.
    #[error("failed to load image '{asset}': {reason}")]
    ImageLoad { asset: String, reason: String },

    /// The image loaded but reports no usable natural size.
    #[error("image has degenerate dimensions {width}x{height}")]
    InvalidImage { width: u32, height: u32 },

    /// No scatter region can hold a single piece. Recovered by fallback placement.
    #[error("no scatter region fits a {piece_w:.1}x{piece_h:.1} piece")]
    DegenerateLayout { piece_w: f64, piece_h: f64 },

    /// Grid dimension derived from the level is not positive.
    #[error("invalid grid size {0}")]
    InvalidGridSize(i64),

    /// Levels are 1-based.
    #[error("invalid level {0}")]
    InvalidLevel(u32),

    /// Tab polarity outside {-1, 0, +1}.
    #[error("invalid tab polarity {0}")]
    InvalidPolarity(i8),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for PuzzleError {
    fn from(e: serde_json::Error) -> Self {
        PuzzleError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PuzzleError>;
