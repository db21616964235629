use crate::sprite::{Rgb, Sprite};

use super::types::{FurnitureCatalogEntry, FurnitureCategory};

pub const DESK_BORDER: Rgb = Rgb(0x5c, 0x3a, 0x1e);
pub const DESK_HIGHLIGHT: Rgb = Rgb(0xa0, 0x71, 0x4a);
pub const DESK_DIVIDER: Rgb = Rgb(0x4a, 0x2e, 0x17);
pub const DESK_SURFACE: Rgb = Rgb(0x8b, 0x5a, 0x2b);

pub const CHAIR_BORDER: Rgb = Rgb(0x3b, 0x2a, 0x1a);
pub const CHAIR_HIGHLIGHT: Rgb = Rgb(0x7a, 0x5a, 0x3a);
pub const CHAIR_BACK: Rgb = Rgb(0x5a, 0x3d, 0x24);
pub const CHAIR_SEAT: Rgb = Rgb(0x6b, 0x4a, 0x2e);
pub const CHAIR_LEG: Rgb = Rgb(0x2e, 0x21, 0x16);

pub const PLANT_LEAF_DARK: Rgb = Rgb(0x2e, 0x7d, 0x32);
pub const PLANT_LEAF_LIGHT: Rgb = Rgb(0x43, 0xa0, 0x47);
pub const PLANT_STEM: Rgb = Rgb(0x5d, 0x40, 0x37);
pub const PLANT_POT_RIM: Rgb = Rgb(0x8d, 0x4a, 0x2b);
pub const PLANT_POT: Rgb = Rgb(0xb5, 0x65, 0x3a);

pub const STORAGE_BORDER: Rgb = Rgb(0x37, 0x47, 0x4f);
pub const STORAGE_SHELF: Rgb = Rgb(0x26, 0x32, 0x38);
pub const STORAGE_BOOKS: [Rgb; 4] = [
    Rgb(0xc6, 0x28, 0x28),
    Rgb(0x15, 0x65, 0xc0),
    Rgb(0xf9, 0xa8, 0x25),
    Rgb(0x2e, 0x7d, 0x32),
];

pub const GENERIC_BORDER: Rgb = Rgb(0x4e, 0x4e, 0x4e);
pub const GENERIC_HIGHLIGHT: Rgb = Rgb(0x9e, 0x9e, 0x9e);
pub const GENERIC_FILL: Rgb = Rgb(0x75, 0x75, 0x75);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteRule {
    Desk,
    Chair,
    Plant,
    Storage,
    Generic,
}

impl SpriteRule {
    pub fn for_entry(entry: &FurnitureCatalogEntry) -> Self {
        match entry.category {
            FurnitureCategory::Desks => Self::Desk,
            FurnitureCategory::Chairs => Self::Chair,
            FurnitureCategory::Storage => Self::Storage,
            FurnitureCategory::Decor if entry.id.contains("plant") => Self::Plant,
            FurnitureCategory::Decor | FurnitureCategory::Furniture => Self::Generic,
        }
    }

    /// Frame color of the rectangular rules. Plants have no frame.
    pub fn border_color(self) -> Option<Rgb> {
        match self {
            Self::Desk => Some(DESK_BORDER),
            Self::Chair => Some(CHAIR_BORDER),
            Self::Plant => None,
            Self::Storage => Some(STORAGE_BORDER),
            Self::Generic => Some(GENERIC_BORDER),
        }
    }

    pub fn rasterize(self, width: u32, height: u32) -> Sprite {
        match self {
            Self::Desk => desk(width, height),
            Self::Chair => chair(width, height),
            Self::Plant => plant(width, height),
            Self::Storage => storage(width, height),
            Self::Generic => generic(width, height),
        }
    }
}

pub fn generate_sprite(entry: &FurnitureCatalogEntry) -> Sprite {
    SpriteRule::for_entry(entry).rasterize(entry.width, entry.height)
}

fn on_frame(x: u32, y: u32, width: u32, height: u32) -> bool {
    x == 0 || y == 0 || x + 1 == width || y + 1 == height
}

fn desk(width: u32, height: u32) -> Sprite {
    let divider_row = height / 2;
    Sprite::from_fn(width, height, |x, y| {
        let color = if on_frame(x, y, width, height) {
            DESK_BORDER
        } else if y == divider_row {
            DESK_DIVIDER
        } else if x == 1 || y == 1 {
            DESK_HIGHLIGHT
        } else {
            DESK_SURFACE
        };
        Some(color)
    })
}

fn chair(width: u32, height: u32) -> Sprite {
    let back_rows = height * 3 / 5;
    let seat_end = back_rows + height / 5;
    let leg_width = (width / 8).max(1);
    Sprite::from_fn(width, height, |x, y| {
        let side = x == 0 || x + 1 == width;
        if y < back_rows {
            let color = if side || y == 0 || y + 1 == back_rows {
                CHAIR_BORDER
            } else if x == 1 || y == 1 {
                CHAIR_HIGHLIGHT
            } else {
                CHAIR_BACK
            };
            return Some(color);
        }
        if y < seat_end {
            let color = if side || y == back_rows || y + 1 == seat_end {
                CHAIR_BORDER
            } else {
                CHAIR_SEAT
            };
            return Some(color);
        }
        let left_leg = x >= 1 && x < 1 + leg_width;
        let right_leg = x + 1 < width && x + 1 + leg_width >= width;
        (left_leg || right_leg).then_some(CHAIR_LEG)
    })
}

fn plant(width: u32, height: u32) -> Sprite {
    let canopy_rows = height * 2 / 5;
    let pot_rows = (height * 35 + 50) / 100;
    let pot_top = height.saturating_sub(pot_rows).max(canopy_rows);
    let center_x = width as f32 / 2.0;
    let center_y = canopy_rows as f32 / 2.0;
    let radius = width.min(canopy_rows) as f32 / 2.0;
    let stem_width = (width / 8).max(1);
    let stem_left = width.saturating_sub(stem_width) / 2;

    Sprite::from_fn(width, height, |x, y| {
        if y < canopy_rows {
            let dx = x as f32 + 0.5 - center_x;
            let dy = y as f32 + 0.5 - center_y;
            if dx * dx + dy * dy > radius * radius {
                return None;
            }
            return Some(if (x + y) % 3 == 0 {
                PLANT_LEAF_LIGHT
            } else {
                PLANT_LEAF_DARK
            });
        }
        if y < pot_top {
            return (x >= stem_left && x < stem_left + stem_width).then_some(PLANT_STEM);
        }
        if y == pot_top {
            return (x >= 1 && x + 1 < width).then_some(PLANT_POT_RIM);
        }
        if x < 2 || x + 2 >= width {
            return None;
        }
        Some(if y + 1 == height {
            PLANT_POT_RIM
        } else {
            PLANT_POT
        })
    })
}

fn storage(width: u32, height: u32) -> Sprite {
    let shelf_rows = (height / 3).max(1);
    Sprite::from_fn(width, height, |x, y| {
        let color = if on_frame(x, y, width, height) {
            STORAGE_BORDER
        } else if y % shelf_rows == 0 {
            STORAGE_SHELF
        } else {
            STORAGE_BOOKS[((x / 2 + y / shelf_rows) % 4) as usize]
        };
        Some(color)
    })
}

fn generic(width: u32, height: u32) -> Sprite {
    Sprite::from_fn(width, height, |x, y| {
        let color = if on_frame(x, y, width, height) {
            GENERIC_BORDER
        } else if x == 1 || y == 1 {
            GENERIC_HIGHLIGHT
        } else {
            GENERIC_FILL
        };
        Some(color)
    })
}
