use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::FIRST_FLOOR_TILE_ID;

pub const LAYOUT_FORMAT_VERSION: u32 = 1;
/// Upper bound on `cols * rows`.
pub const MAX_GRID_TILES: u64 = 256 * 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficeLayout {
    #[serde(default = "default_version")]
    pub version: u32,
    pub cols: u32,
    pub rows: u32,
    #[serde(default)]
    pub tiles: Vec<u16>,
    pub furniture: Vec<FurniturePlacement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FurniturePlacement {
    pub uid: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub col: i32,
    pub row: i32,
    #[serde(rename = "color", default, skip_serializing_if = "Option::is_none")]
    pub color_tint: Option<ColorTint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorTint {
    #[serde(rename = "h")]
    pub hue: f32,
    #[serde(rename = "s")]
    pub saturation: f32,
    #[serde(rename = "b")]
    pub brightness_delta: f32,
    #[serde(rename = "c")]
    pub contrast_delta: f32,
    #[serde(rename = "colorize", default)]
    pub colorize: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutValidationError {
    #[error("layout grid must be non-empty, got {cols}x{rows}")]
    EmptyGrid { cols: u32, rows: u32 },
    #[error("layout grid {cols}x{rows} exceeds the limit of {max} tiles")]
    GridTooLarge { cols: u32, rows: u32, max: u64 },
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error("duplicate furniture uid '{uid}'")]
    DuplicateUid { uid: String },
    #[error("furniture '{uid}' at ({col},{row}) lies outside the {cols}x{rows} grid")]
    OutOfBounds {
        uid: String,
        col: i32,
        row: i32,
        cols: u32,
        rows: u32,
    },
}

fn default_version() -> u32 {
    LAYOUT_FORMAT_VERSION
}

impl OfficeLayout {
    pub fn tile_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    /// Rejects empty or oversized grids. Runs before anything is sized from
    /// `cols * rows`.
    pub fn check_grid(&self) -> Result<(), LayoutValidationError> {
        if self.cols == 0 || self.rows == 0 {
            return Err(LayoutValidationError::EmptyGrid {
                cols: self.cols,
                rows: self.rows,
            });
        }
        let tiles = u64::from(self.cols) * u64::from(self.rows);
        if tiles > MAX_GRID_TILES {
            return Err(LayoutValidationError::GridTooLarge {
                cols: self.cols,
                rows: self.rows,
                max: MAX_GRID_TILES,
            });
        }
        Ok(())
    }

    /// An absent `tiles` array means a plain floor of the first pattern.
    pub(crate) fn fill_missing_tiles(&mut self) -> Result<(), LayoutValidationError> {
        self.check_grid()?;
        if self.tiles.is_empty() {
            self.tiles = vec![FIRST_FLOOR_TILE_ID; self.tile_count()];
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), LayoutValidationError> {
        self.check_grid()?;
        let expected = self.tile_count();
        if self.tiles.len() != expected {
            return Err(LayoutValidationError::TileCountMismatch {
                expected,
                actual: self.tiles.len(),
            });
        }

        let mut seen = HashSet::with_capacity(self.furniture.len());
        for placement in &self.furniture {
            if !seen.insert(placement.uid.as_str()) {
                return Err(LayoutValidationError::DuplicateUid {
                    uid: placement.uid.clone(),
                });
            }
            if !self.contains_cell(placement.col, placement.row) {
                return Err(LayoutValidationError::OutOfBounds {
                    uid: placement.uid.clone(),
                    col: placement.col,
                    row: placement.row,
                    cols: self.cols,
                    rows: self.rows,
                });
            }
        }
        Ok(())
    }

    pub fn contains_cell(&self, col: i32, row: i32) -> bool {
        col >= 0 && row >= 0 && (col as u32) < self.cols && (row as u32) < self.rows
    }

    pub fn tile_at(&self, col: u32, row: u32) -> Option<u16> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.tiles
            .get(row as usize * self.cols as usize + col as usize)
            .copied()
    }

    pub fn placements_of_kind<'a>(
        &'a self,
        kind: &'a str,
    ) -> impl Iterator<Item = &'a FurniturePlacement> + 'a {
        self.furniture
            .iter()
            .filter(move |placement| placement.kind == kind)
    }
}
