//! TOML configuration describing a grid, its cell shape and its map legend.

use std::{
    collections::{BTreeMap, HashMap},
    fs, io,
    path::{Path, PathBuf},
};

use hexmap_core::{ConstantWeight, GridDimensions, HexShape, TileId};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::{layout::TileLayout, GridError, HexGrid, MapLoadError};

/// Failure raised while reading or applying a grid configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document is malformed or has unexpected keys.
    #[error("failed to parse grid configuration")]
    Parse(#[from] toml::de::Error),
    /// The configuration file could not be read.
    #[error("failed to read grid configuration at {}", .path.display())]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// A legend key is not exactly one character long.
    #[error("legend key `{key}` must be a single character")]
    InvalidLegendKey {
        /// Offending key.
        key: String,
    },
    /// The heuristic weight is negative or not a finite number.
    #[error("heuristic weight must be finite and non-negative, got {weight}")]
    InvalidHeuristicWeight {
        /// Rejected weight.
        weight: f32,
    },
    /// Neither the configuration nor a map supplied the grid dimensions.
    #[error("grid dimensions are missing; set [grid] columns and rows or provide a map")]
    MissingDimensions,
    /// The map did not satisfy the configuration.
    #[error(transparent)]
    Map(#[from] MapLoadError),
    /// The configured grid is invalid.
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Root of the grid configuration document.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GridConfig {
    /// Cell geometry shared by every hexagon.
    pub shape: ShapeConfig,
    /// Grid extents and search tuning.
    #[serde(default)]
    pub grid: GridSection,
    /// Glyph to tile identifier mapping used by chars maps.
    #[serde(default)]
    pub legend: BTreeMap<String, u32>,
}

/// `[shape]` table.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ShapeConfig {
    /// Horizontal origin of the grid in map pixels.
    #[serde(default)]
    pub origin_x: i32,
    /// Vertical origin of the grid in map pixels.
    #[serde(default)]
    pub origin_y: i32,
    /// Half of a hexagon's width.
    pub start_width: i32,
    /// Length of a hexagon's vertical sides.
    pub mid_height: i32,
    /// Height of a hexagon's slanted caps.
    pub end_height: i32,
}

impl ShapeConfig {
    /// Shape descriptor for the grid origin.
    #[must_use]
    pub const fn to_shape(&self) -> HexShape {
        HexShape::new(
            self.origin_x,
            self.origin_y,
            self.start_width,
            self.mid_height,
            self.end_height,
        )
    }
}

/// `[grid]` table.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GridSection {
    /// Number of storage columns; optional when a map supplies it.
    pub columns: Option<u32>,
    /// Number of rows; optional when a map supplies it.
    pub rows: Option<u32>,
    /// Tile identifiers that block path search.
    #[serde(default)]
    pub forbidden: Vec<u32>,
    /// Constant heuristic weight overriding the default.
    pub heuristic_weight: Option<f32>,
}

impl GridConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        let _ = config.heuristic()?;
        Ok(config)
    }

    /// Reads and parses a configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        debug!(path = %path.display(), "loaded grid configuration");
        Ok(config)
    }

    /// Shape descriptor of the grid origin.
    #[must_use]
    pub const fn shape(&self) -> HexShape {
        self.shape.to_shape()
    }

    /// Dimensions declared in `[grid]`, when both are present.
    #[must_use]
    pub fn dimensions(&self) -> Option<GridDimensions> {
        Some(GridDimensions::new(self.grid.columns?, self.grid.rows?))
    }

    /// Legend converted into a glyph lookup table.
    pub fn legend(&self) -> Result<HashMap<char, TileId>, ConfigError> {
        self.legend
            .iter()
            .map(|(key, id)| {
                let mut glyphs = key.chars();
                match (glyphs.next(), glyphs.next()) {
                    (Some(glyph), None) => Ok((glyph, TileId::new(*id))),
                    _ => Err(ConfigError::InvalidLegendKey { key: key.clone() }),
                }
            })
            .collect()
    }

    /// Builds an empty grid sized by `[grid]`.
    pub fn build_grid(&self) -> Result<HexGrid, ConfigError> {
        let dimensions = self.dimensions().ok_or(ConfigError::MissingDimensions)?;
        let mut grid = HexGrid::new(dimensions, self.shape())?;
        self.apply_search_settings(&mut grid)?;
        Ok(grid)
    }

    /// Builds a grid sized and filled by `layout`.
    ///
    /// When `[grid]` also declares dimensions the layout must match them.
    pub fn build_grid_from_layout(&self, layout: &TileLayout) -> Result<HexGrid, ConfigError> {
        if let Some(expected) = self.dimensions() {
            layout.expect_dimensions(expected)?;
        }
        let mut grid = HexGrid::from_layout(layout, self.shape())?;
        self.apply_search_settings(&mut grid)?;
        Ok(grid)
    }

    fn heuristic(&self) -> Result<Option<ConstantWeight>, ConfigError> {
        match self.grid.heuristic_weight {
            Some(weight) if !weight.is_finite() || weight < 0.0 => {
                Err(ConfigError::InvalidHeuristicWeight { weight })
            }
            weight => Ok(weight.map(ConstantWeight)),
        }
    }

    fn apply_search_settings(&self, grid: &mut HexGrid) -> Result<(), ConfigError> {
        let heuristic = self.heuristic()?;
        grid.set_forbidden(self.grid.forbidden.iter().copied().map(TileId::new));
        if let Some(heuristic) = heuristic {
            grid.set_heuristic(Box::new(heuristic));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexmap_core::HexCoord;

    const CONFIG: &str = r##"
[shape]
origin_x = 4
start_width = 16
mid_height = 16
end_height = 8

[grid]
columns = 6
rows = 5
forbidden = [9]
heuristic_weight = 2.5

[legend]
"." = 0
"#" = 9
"##;

    #[test]
    fn parses_every_section() {
        let config = GridConfig::from_toml_str(CONFIG).expect("valid config");
        assert_eq!(config.shape(), HexShape::new(4, 0, 16, 16, 8));
        assert_eq!(config.dimensions(), Some(GridDimensions::new(6, 5)));
        assert_eq!(config.grid.forbidden, vec![9]);

        let legend = config.legend().expect("valid legend");
        assert_eq!(legend.get(&'#'), Some(&TileId::new(9)));
        assert_eq!(legend.get(&'.'), Some(&TileId::new(0)));
    }

    #[test]
    fn build_grid_applies_search_settings() {
        let config = GridConfig::from_toml_str(CONFIG).expect("valid config");
        let grid = config.build_grid().expect("grid");
        assert_eq!(grid.dimensions(), GridDimensions::new(6, 5));
        assert!(grid.is_forbidden(TileId::new(9)));
        let weight = grid.heuristic_weight(HexCoord::new(0, 0), HexCoord::new(1, 1));
        assert!((weight - 2.5).abs() < f32::EPSILON);
    }

    #[test]
    fn heuristic_weight_must_be_finite_and_non_negative() {
        for weight in ["-1.0", "nan", "inf"] {
            let source = format!(
                "[shape]\nstart_width = 8\nmid_height = 8\nend_height = 4\n[grid]\nheuristic_weight = {weight}\n"
            );
            assert!(
                matches!(
                    GridConfig::from_toml_str(&source),
                    Err(ConfigError::InvalidHeuristicWeight { .. })
                ),
                "weight {weight} must be rejected"
            );
        }

        let mut config = GridConfig::from_toml_str(CONFIG).expect("valid config");
        config.grid.heuristic_weight = Some(f32::NAN);
        assert!(matches!(
            config.build_grid(),
            Err(ConfigError::InvalidHeuristicWeight { .. })
        ));
        config.grid.heuristic_weight = Some(0.0);
        assert!(config.build_grid().is_ok());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let error = GridConfig::from_toml_str("[shape]\nstart_width = 1\nmid_height = 1\nend_height = 1\nsize = 3\n")
            .expect_err("unknown key");
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn legend_keys_must_be_single_glyphs() {
        let config = GridConfig::from_toml_str(
            "[shape]\nstart_width = 1\nmid_height = 1\nend_height = 1\n[legend]\nab = 1\n",
        )
        .expect("valid toml");
        assert!(matches!(
            config.legend(),
            Err(ConfigError::InvalidLegendKey { key }) if key == "ab"
        ));
    }

    #[test]
    fn dimensions_come_from_the_map_when_omitted() {
        let config = GridConfig::from_toml_str("[shape]\nstart_width = 8\nmid_height = 8\nend_height = 4\n")
            .expect("valid toml");
        assert!(matches!(config.build_grid(), Err(ConfigError::MissingDimensions)));

        let layout = TileLayout::parse_numeric("0 1\n2 3\n4 5\n").expect("valid map");
        let grid = config.build_grid_from_layout(&layout).expect("grid");
        assert_eq!(grid.dimensions(), GridDimensions::new(2, 3));
    }

    #[test]
    fn map_must_match_declared_dimensions() {
        let config = GridConfig::from_toml_str(CONFIG).expect("valid config");
        let layout = TileLayout::parse_numeric("0 0\n0 0\n").expect("valid map");
        assert!(matches!(
            config.build_grid_from_layout(&layout),
            Err(ConfigError::Map(MapLoadError::DimensionMismatch { .. }))
        ));
    }
}
