use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sprite_keys::SpriteKeyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FurnitureCategory {
    Desks,
    Chairs,
    Decor,
    Storage,
    Furniture,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FurnitureCatalogEntry {
    pub id: String,
    pub label: String,
    pub category: FurnitureCategory,
    #[serde(rename = "file")]
    pub sprite_file: String,
    pub width: u32,
    pub height: u32,
    pub footprint_w: u32,
    pub footprint_h: u32,
    pub is_desk: bool,
    pub can_place_on_walls: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("catalog id '{id}' is not a valid asset key: {source}")]
    InvalidId {
        id: String,
        #[source]
        source: SpriteKeyError,
    },
    #[error("duplicate catalog id '{id}'")]
    DuplicateId { id: String },
    #[error("catalog entry '{id}' has an empty sprite or footprint ({width}x{height}, footprint {footprint_w}x{footprint_h})")]
    EmptyDimensions {
        id: String,
        width: u32,
        height: u32,
        footprint_w: u32,
        footprint_h: u32,
    },
    #[error("catalog has no '{id}' entry to stand in for unknown furniture types")]
    MissingFallback { id: &'static str },
}
