use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BASE_GRID, DEFAULT_HEADER_HEIGHT, DEFAULT_PADDING, DEFAULT_SNAP_DISTANCE,
};
use crate::error::{PuzzleError, Result};

/// Engine options, loadable from JSON with camelCase keys. Missing keys take defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PuzzleConfig {
    /// Max distance (px) from the slot at which a released piece locks.
    pub snap_distance: f64,
    /// Grid size of level 1; each later level adds one row and column.
    pub base_grid_size: usize,
    /// Level images, cycled by `(level - 1) % len`.
    pub level_assets: Vec<String>,
    pub header_height: f64,
    pub padding: f64,
}

impl Default for PuzzleConfig {
    fn default() -> Self {
        PuzzleConfig {
            snap_distance: DEFAULT_SNAP_DISTANCE,
            base_grid_size: DEFAULT_BASE_GRID,
            level_assets: (1..=5)
                .map(|i| format!("assets/images/stage_{i}.png"))
                .collect(),
            header_height: DEFAULT_HEADER_HEIGHT,
            padding: DEFAULT_PADDING,
        }
    }
}

impl PuzzleConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let cfg: PuzzleConfig = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.snap_distance.is_finite() && self.snap_distance > 0.0) {
            return Err(PuzzleError::Config(format!(
                "snapDistance must be positive, got {}",
                self.snap_distance
            )));
        }
        if self.base_grid_size == 0 {
            return Err(PuzzleError::Config("baseGridSize must be at least 1".into()));
        }
        if self.level_assets.is_empty() {
            return Err(PuzzleError::Config("levelAssets is empty".into()));
        }
        if self.header_height < 0.0 || self.padding < 0.0 {
            return Err(PuzzleError::Config(
                "headerHeight and padding must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// Rows (and columns) for a 1-based level.
    pub fn grid_size_for_level(&self, level: u32) -> Result<usize> {
        if level == 0 {
            return Err(PuzzleError::InvalidLevel(level));
        }
        let size = self.base_grid_size as i64 + level as i64 - 1;
        if size <= 0 {
            return Err(PuzzleError::InvalidGridSize(size));
        }
        Ok(size as usize)
    }

    pub fn asset_for_level(&self, level: u32) -> Result<&str> {
        if level == 0 {
            return Err(PuzzleError::InvalidLevel(level));
        }
        if self.level_assets.is_empty() {
            return Err(PuzzleError::Config("levelAssets is empty".into()));
        }
        let idx = (level as usize - 1) % self.level_assets.len();
        Ok(&self.level_assets[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_game() {
        let cfg = PuzzleConfig::default();
        assert_eq!(cfg.snap_distance, 30.0);
        assert_eq!(cfg.base_grid_size, 8);
        assert_eq!(cfg.level_assets.len(), 5);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = PuzzleConfig::from_json(r#"{"snapDistance": 12.5, "levelAssets": ["a.png"]}"#)
            .unwrap();
        assert_eq!(cfg.snap_distance, 12.5);
        assert_eq!(cfg.base_grid_size, 8);
        assert_eq!(cfg.level_assets, vec!["a.png".to_string()]);
    }

    #[test]
    fn invalid_json_and_values_are_rejected() {
        assert!(matches!(
            PuzzleConfig::from_json("{not json"),
            Err(PuzzleError::Config(_))
        ));
        assert!(PuzzleConfig::from_json(r#"{"levelAssets": []}"#).is_err());
        assert!(PuzzleConfig::from_json(r#"{"snapDistance": -1}"#).is_err());
        assert!(PuzzleConfig::from_json(r#"{"baseGridSize": 0}"#).is_err());
    }

    #[test]
    fn grid_grows_per_level_and_level_zero_is_invalid() {
        let cfg = PuzzleConfig::default();
        assert_eq!(cfg.grid_size_for_level(1), Ok(8));
        assert_eq!(cfg.grid_size_for_level(4), Ok(11));
        assert_eq!(cfg.grid_size_for_level(0), Err(PuzzleError::InvalidLevel(0)));
        let broken = PuzzleConfig {
            base_grid_size: 0,
            ..PuzzleConfig::default()
        };
        assert_eq!(
            broken.grid_size_for_level(1),
            Err(PuzzleError::InvalidGridSize(0))
        );
    }

    #[test]
    fn assets_cycle() {
        let cfg = PuzzleConfig::default();
        assert_eq!(cfg.asset_for_level(1).unwrap(), "assets/images/stage_1.png");
        assert_eq!(cfg.asset_for_level(6).unwrap(), "assets/images/stage_1.png");
        assert_eq!(cfg.asset_for_level(7).unwrap(), "assets/images/stage_2.png");
    }
}
