//! Tabular map formats used to bulk-load tile identifiers.
//!
//! Two encodings are understood. The numeric format lists whitespace-separated
//! integers, one grid row per line. The chars format uses a single glyph per
//! cell, delimits rows with newlines or `/`, and resolves glyphs through a
//! legend. In both, row `j` of the input is grid row `j` and entry `i` of a row
//! is storage column `i`.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use hexmap_core::{GridDimensions, TileId};
use thiserror::Error;
use tracing::debug;

/// Row delimiter accepted by the chars format in addition to newlines.
pub const CHARS_ROW_DELIMITER: char = '/';

/// Failure raised while loading a tabular map.
#[derive(Debug, Error)]
pub enum MapLoadError {
    /// The input holds no rows at all.
    #[error("map contains no rows")]
    Empty,
    /// A row holds a different number of entries than the first row.
    #[error("row {row} has {found} entries, expected {expected}")]
    RaggedRow {
        /// Zero-based row that broke the rectangle.
        row: usize,
        /// Entries found in the first row.
        expected: usize,
        /// Entries found in the offending row.
        found: usize,
    },
    /// A numeric entry could not be parsed as a tile identifier.
    #[error("row {row}, column {column}: `{token}` is not a tile id")]
    InvalidToken {
        /// Zero-based row of the entry.
        row: usize,
        /// Zero-based storage column of the entry.
        column: usize,
        /// Offending token.
        token: String,
    },
    /// A glyph has no entry in the legend.
    #[error("row {row}, column {column}: glyph `{glyph}` is missing from the legend")]
    UnknownGlyph {
        /// Zero-based row of the glyph.
        row: usize,
        /// Zero-based storage column of the glyph.
        column: usize,
        /// Offending glyph.
        glyph: char,
    },
    /// The map does not match the dimensions it was expected to have.
    #[error(
        "map is {}x{}, expected {}x{}",
        .found.columns(),
        .found.rows(),
        .expected.columns(),
        .expected.rows()
    )]
    DimensionMismatch {
        /// Dimensions the caller asked for.
        expected: GridDimensions,
        /// Dimensions read from the map.
        found: GridDimensions,
    },
    /// The map file could not be read.
    #[error("failed to read map at {}", .path.display())]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

/// Rectangular block of tile identifiers stored row-major by storage column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileLayout {
    columns: usize,
    rows: usize,
    ids: Vec<TileId>,
}

impl TileLayout {
    /// Parses the numeric format.
    ///
    /// Blank lines are skipped.
    pub fn parse_numeric(source: &str) -> Result<Self, MapLoadError> {
        let mut builder = LayoutBuilder::default();
        for line in source.lines().filter(|line| !line.trim().is_empty()) {
            let row = builder.rows;
            let ids = line
                .split_whitespace()
                .enumerate()
                .map(|(column, token)| {
                    token
                        .parse::<u32>()
                        .map(TileId::new)
                        .map_err(|_| MapLoadError::InvalidToken {
                            row,
                            column,
                            token: token.to_owned(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            builder.push_row(ids)?;
        }
        builder.finish()
    }

    /// Parses the chars format, resolving each glyph through `legend`.
    ///
    /// Whitespace inside a row is ignored and rows left empty are skipped.
    pub fn parse_chars(source: &str, legend: &HashMap<char, TileId>) -> Result<Self, MapLoadError> {
        let mut builder = LayoutBuilder::default();
        for line in source.split(|glyph: char| glyph == '\n' || glyph == CHARS_ROW_DELIMITER) {
            let row = builder.rows;
            let ids = line
                .chars()
                .filter(|glyph| !glyph.is_whitespace())
                .enumerate()
                .map(|(column, glyph)| {
                    legend
                        .get(&glyph)
                        .copied()
                        .ok_or(MapLoadError::UnknownGlyph { row, column, glyph })
                })
                .collect::<Result<Vec<_>, _>>()?;
            if ids.is_empty() {
                continue;
            }
            builder.push_row(ids)?;
        }
        builder.finish()
    }

    /// Reads and parses a numeric map file.
    pub fn from_numeric_file(path: impl AsRef<Path>) -> Result<Self, MapLoadError> {
        let path = path.as_ref();
        let layout = Self::parse_numeric(&read_map(path)?)?;
        debug!(path = %path.display(), columns = layout.columns, rows = layout.rows, "loaded numeric map");
        Ok(layout)
    }

    /// Reads and parses a chars map file.
    pub fn from_chars_file(
        path: impl AsRef<Path>,
        legend: &HashMap<char, TileId>,
    ) -> Result<Self, MapLoadError> {
        let path = path.as_ref();
        let layout = Self::parse_chars(&read_map(path)?, legend)?;
        debug!(path = %path.display(), columns = layout.columns, rows = layout.rows, "loaded chars map");
        Ok(layout)
    }

    /// Number of storage columns.
    #[must_use]
    pub const fn columns(&self) -> usize {
        self.columns
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Dimensions of the layout, saturating at `u32::MAX`.
    #[must_use]
    pub fn dimensions(&self) -> GridDimensions {
        GridDimensions::new(
            u32::try_from(self.columns).unwrap_or(u32::MAX),
            u32::try_from(self.rows).unwrap_or(u32::MAX),
        )
    }

    /// Identifier stored at the provided storage column and row.
    #[must_use]
    pub fn tile(&self, column: usize, row: usize) -> Option<TileId> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        self.ids.get(row * self.columns + column).copied()
    }

    /// Rows of identifiers from top to bottom.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[TileId]> {
        self.ids.chunks(self.columns.max(1))
    }

    /// Fails unless the layout has exactly the expected dimensions.
    pub fn expect_dimensions(&self, expected: GridDimensions) -> Result<(), MapLoadError> {
        let found = self.dimensions();
        if found == expected {
            Ok(())
        } else {
            Err(MapLoadError::DimensionMismatch { expected, found })
        }
    }
}

#[derive(Default)]
struct LayoutBuilder {
    columns: usize,
    rows: usize,
    ids: Vec<TileId>,
}

impl LayoutBuilder {
    fn push_row(&mut self, row: Vec<TileId>) -> Result<(), MapLoadError> {
        if self.rows == 0 {
            self.columns = row.len();
        } else if row.len() != self.columns {
            return Err(MapLoadError::RaggedRow {
                row: self.rows,
                expected: self.columns,
                found: row.len(),
            });
        }
        self.ids.extend(row);
        self.rows += 1;
        Ok(())
    }

    fn finish(self) -> Result<TileLayout, MapLoadError> {
        if self.rows == 0 || self.columns == 0 {
            return Err(MapLoadError::Empty);
        }
        Ok(TileLayout {
            columns: self.columns,
            rows: self.rows,
            ids: self.ids,
        })
    }
}

fn read_map(path: &Path) -> Result<String, MapLoadError> {
    fs::read_to_string(path).map_err(|source| MapLoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legend() -> HashMap<char, TileId> {
        HashMap::from([('A', TileId::new(0)), ('B', TileId::new(1))])
    }

    #[test]
    fn numeric_rows_become_grid_rows() {
        let layout = TileLayout::parse_numeric("0 1 2\n\n3 4 5\n").expect("valid map");
        assert_eq!(layout.columns(), 3);
        assert_eq!(layout.rows(), 2);
        assert_eq!(layout.tile(2, 0), Some(TileId::new(2)));
        assert_eq!(layout.tile(0, 1), Some(TileId::new(3)));
        assert_eq!(layout.tile(3, 1), None);
        assert_eq!(layout.dimensions(), GridDimensions::new(3, 2));
    }

    #[test]
    fn numeric_map_rejects_ragged_rows() {
        let error = TileLayout::parse_numeric("0 0 0\n0 0\n").expect_err("ragged");
        assert!(matches!(
            error,
            MapLoadError::RaggedRow {
                row: 1,
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn numeric_map_rejects_non_numeric_tokens() {
        let error = TileLayout::parse_numeric("0 0\n0 x\n").expect_err("invalid token");
        match error {
            MapLoadError::InvalidToken { row, column, token } => {
                assert_eq!((row, column), (1, 1));
                assert_eq!(token, "x");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(matches!(
            TileLayout::parse_numeric("0 -1\n"),
            Err(MapLoadError::InvalidToken { .. })
        ));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(TileLayout::parse_numeric(" \n\n"), Err(MapLoadError::Empty)));
        assert!(matches!(TileLayout::parse_chars("//", &legend()), Err(MapLoadError::Empty)));
    }

    #[test]
    fn chars_rows_split_on_slashes_and_newlines() {
        let slashed = TileLayout::parse_chars("AAA/ABA/AAA", &legend()).expect("valid map");
        let lined = TileLayout::parse_chars("A A A\r\nA B A\nA A A\n", &legend()).expect("valid map");
        assert_eq!(slashed, lined);
        assert_eq!(slashed.tile(1, 1), Some(TileId::new(1)));
        assert_eq!(
            slashed.iter_rows().map(<[TileId]>::len).collect::<Vec<_>>(),
            vec![3, 3, 3]
        );
    }

    #[test]
    fn chars_map_rejects_unknown_glyphs() {
        let error = TileLayout::parse_chars("AA/AC", &legend()).expect_err("unknown glyph");
        assert!(matches!(
            error,
            MapLoadError::UnknownGlyph {
                row: 1,
                column: 1,
                glyph: 'C'
            }
        ));
    }

    #[test]
    fn dimension_checks_report_both_sizes() {
        let layout = TileLayout::parse_numeric("0 0\n0 0\n").expect("valid map");
        assert!(layout.expect_dimensions(GridDimensions::new(2, 2)).is_ok());
        let error = layout
            .expect_dimensions(GridDimensions::new(3, 2))
            .expect_err("mismatch");
        assert_eq!(error.to_string(), "map is 2x2, expected 3x2");
    }

    #[test]
    fn missing_files_surface_io_errors() {
        let error = TileLayout::from_numeric_file("/nonexistent/hexmap/map.txt").expect_err("missing");
        assert!(matches!(error, MapLoadError::Io { .. }));
    }
}
