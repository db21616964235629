use super::types::{FurnitureCatalogEntry, FurnitureCategory};

/// Catalog id that unknown layout `type` references resolve to.
pub const FALLBACK_FURNITURE_ID: &str = "fallback";

struct EntrySpec {
    id: &'static str,
    label: &'static str,
    category: FurnitureCategory,
    size_px: (u32, u32),
    footprint: (u32, u32),
    is_desk: bool,
    can_place_on_walls: bool,
}

// Emission order of the furnitureAssetsLoaded catalog.
const BUILTIN_ENTRIES: &[EntrySpec] = &[
    EntrySpec {
        id: "desk",
        label: "Teller Desk",
        category: FurnitureCategory::Desks,
        size_px: (32, 32),
        footprint: (2, 2),
        is_desk: true,
        can_place_on_walls: false,
    },
    EntrySpec {
        id: "chair",
        label: "Customer Chair",
        category: FurnitureCategory::Chairs,
        size_px: (16, 16),
        footprint: (1, 1),
        is_desk: false,
        can_place_on_walls: false,
    },
    EntrySpec {
        id: "plant",
        label: "Potted Plant",
        category: FurnitureCategory::Decor,
        size_px: (16, 32),
        footprint: (1, 1),
        is_desk: false,
        can_place_on_walls: false,
    },
    EntrySpec {
        id: "cabinet",
        label: "Vault Cabinet",
        category: FurnitureCategory::Storage,
        size_px: (32, 32),
        footprint: (2, 2),
        is_desk: false,
        can_place_on_walls: false,
    },
    EntrySpec {
        id: "bookshelf",
        label: "Records Shelf",
        category: FurnitureCategory::Storage,
        size_px: (32, 16),
        footprint: (2, 1),
        is_desk: false,
        can_place_on_walls: true,
    },
    EntrySpec {
        id: "counter",
        label: "Service Counter",
        category: FurnitureCategory::Furniture,
        size_px: (48, 16),
        footprint: (3, 1),
        is_desk: false,
        can_place_on_walls: false,
    },
    EntrySpec {
        id: "portrait",
        label: "Founder Portrait",
        category: FurnitureCategory::Decor,
        size_px: (16, 16),
        footprint: (1, 1),
        is_desk: false,
        can_place_on_walls: true,
    },
    EntrySpec {
        id: FALLBACK_FURNITURE_ID,
        label: "Unknown Item",
        category: FurnitureCategory::Furniture,
        size_px: (16, 16),
        footprint: (1, 1),
        is_desk: false,
        can_place_on_walls: false,
    },
];

pub fn furniture_catalog() -> Vec<FurnitureCatalogEntry> {
    BUILTIN_ENTRIES
        .iter()
        .map(|spec| FurnitureCatalogEntry {
            id: spec.id.to_string(),
            label: spec.label.to_string(),
            category: spec.category,
            sprite_file: format!("{}.png", spec.id),
            width: spec.size_px.0,
            height: spec.size_px.1,
            footprint_w: spec.footprint.0,
            footprint_h: spec.footprint.1,
            is_desk: spec.is_desk,
            can_place_on_walls: spec.can_place_on_walls,
        })
        .collect()
}
