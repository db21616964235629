use crate::content::{FIRST_FLOOR_TILE_ID, WALL_TILE_ID};

use super::types::{ColorTint, FurniturePlacement, OfficeLayout, LAYOUT_FORMAT_VERSION};

pub const DEFAULT_COLS: u32 = 21;
pub const DEFAULT_ROWS: u32 = 21;

const DESK_TINT: ColorTint = tint(30.0, 50.0, -20.0, 10.0);
const MANAGER_DESK_TINT: ColorTint = tint(25.0, 40.0, -30.0, 15.0);
const CHAIR_TINT: ColorTint = tint(35.0, 60.0, -10.0, 5.0);
const VAULT_TINT: ColorTint = tint(180.0, 30.0, -40.0, 20.0);

const DEFAULT_FURNITURE: &[(&str, &str, i32, i32, Option<ColorTint>)] = &[
    ("desk_1", "desk", 3, 3, Some(DESK_TINT)),
    ("desk_2", "desk", 7, 3, Some(DESK_TINT)),
    ("desk_3", "desk", 11, 3, Some(DESK_TINT)),
    ("desk_4", "desk", 16, 8, Some(MANAGER_DESK_TINT)),
    ("chair_1", "chair", 4, 7, Some(CHAIR_TINT)),
    ("chair_2", "chair", 8, 7, Some(CHAIR_TINT)),
    ("chair_3", "chair", 12, 7, Some(CHAIR_TINT)),
    ("chair_4", "chair", 16, 11, Some(CHAIR_TINT)),
    ("plant_1", "plant", 1, 1, None),
    ("plant_2", "plant", 19, 1, None),
    ("vault_1", "cabinet", 15, 17, Some(VAULT_TINT)),
    ("vault_2", "cabinet", 17, 17, Some(VAULT_TINT)),
];

const fn tint(hue: f32, saturation: f32, brightness_delta: f32, contrast_delta: f32) -> ColorTint {
    ColorTint {
        hue,
        saturation,
        brightness_delta,
        contrast_delta,
        colorize: true,
    }
}

/// Built-in bank floor: walled 21x21 room, four teller desks, a vault corner.
pub fn default_layout() -> OfficeLayout {
    let mut tiles = Vec::with_capacity((DEFAULT_COLS * DEFAULT_ROWS) as usize);
    for row in 0..DEFAULT_ROWS {
        for col in 0..DEFAULT_COLS {
            let perimeter = row == 0 || col == 0 || row + 1 == DEFAULT_ROWS || col + 1 == DEFAULT_COLS;
            tiles.push(if perimeter {
                WALL_TILE_ID
            } else {
                FIRST_FLOOR_TILE_ID
            });
        }
    }

    let furniture = DEFAULT_FURNITURE
        .iter()
        .map(|(uid, kind, col, row, color_tint)| FurniturePlacement {
            uid: uid.to_string(),
            kind: kind.to_string(),
            col: *col,
            row: *row,
            color_tint: *color_tint,
        })
        .collect();

    OfficeLayout {
        version: LAYOUT_FORMAT_VERSION,
        cols: DEFAULT_COLS,
        rows: DEFAULT_ROWS,
        tiles,
        furniture,
    }
}
