/// Engine-wide numeric constants.
/// Values are expressed in canvas pixels unless noted otherwise.
pub const DEFAULT_SNAP_DISTANCE: f64 = 30.0;
pub const DEFAULT_BASE_GRID: usize = 8;
/// Height of the page header kept free of scattered pieces.
pub const DEFAULT_HEADER_HEIGHT: f64 = 80.0;
pub const DEFAULT_PADDING: f64 = 10.0;

/// Viewports wider than this get the narrower desktop target width.
pub const WIDE_VIEWPORT_PX: f64 = 800.0;
pub const WIDE_TARGET_FRACTION: f64 = 0.6;
pub const NARROW_TARGET_FRACTION: f64 = 0.96;
/// Maximum share of the viewport height used by the target outline.
pub const MAX_TARGET_HEIGHT_FRACTION: f64 = 0.7;

/// Tab depth relative to the shorter side of a cell.
pub const TAB_SIZE_RATIO: f64 = 0.25;
/// Where the tab neck starts and ends along an edge (fractions of its length).
pub const TAB_NECK_START: f64 = 0.35;
pub const TAB_NECK_END: f64 = 0.65;
/// Bounding-box slack for the cheap hit-test phase (fraction of piece size).
pub const HIT_MARGIN_RATIO: f64 = 0.3;
/// Texture overflow sampled around each cell so tabs are painted (fraction of max(w, h)).
pub const TAB_OVERFLOW_RATIO: f64 = 0.5;
/// Max deviation between a flattened tab curve and the true cubic (px).
pub const CURVE_TOLERANCE: f64 = 0.25;

pub const PLACEHOLDER_COLOR: &str = "#ff69b4";
pub const GUIDE_COLOR: &str = "rgba(255,20,147,0.3)";
pub const OUTLINE_COLOR: &str = "rgba(255,255,255,0.4)";
pub const SHADOW_COLOR: &str = "rgba(0,0,0,0.3)";
