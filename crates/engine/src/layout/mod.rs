mod defaults;
mod store;
mod types;

pub use defaults::{default_layout, DEFAULT_COLS, DEFAULT_ROWS};
pub use store::{
    parse_layout, FileLayoutSource, HttpLayoutSource, LayoutLoadError, LayoutOrigin,
    LayoutSource, LayoutStore, DEFAULT_HTTP_TIMEOUT, DEFAULT_LAYOUT_RELATIVE_PATH,
};
pub use types::{
    ColorTint, FurniturePlacement, LayoutValidationError, OfficeLayout, LAYOUT_FORMAT_VERSION,
    MAX_GRID_TILES,
};
