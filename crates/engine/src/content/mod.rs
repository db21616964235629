mod catalog;
mod database;
mod export;
mod furniture;
mod hashing;
mod tiles;
mod types;

pub use catalog::{furniture_catalog, FALLBACK_FURNITURE_ID};
pub use database::AssetCatalog;
pub use export::{
    export_sprite_set, ExportManifest, ExportedSprite, SpriteExportError, SpriteGroup,
    MANIFEST_FILE_NAME,
};
pub use furniture::{generate_sprite, SpriteRule};
pub use hashing::sprite_digest_hex;
pub use tiles::{
    floor_pattern_for_tile, floor_sprite, floor_sprites, wall_sprite, wall_sprites,
    FIRST_FLOOR_TILE_ID, FLOOR_PATTERN_COUNT, TILE_SIZE_PX, WALL_EAST, WALL_HEIGHT_PX,
    WALL_MASK_COUNT, WALL_NORTH, WALL_SOUTH, WALL_TILE_ID, WALL_WEST,
};
pub use types::{CatalogError, FurnitureCatalogEntry, FurnitureCategory};
