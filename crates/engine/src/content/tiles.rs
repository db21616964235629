use crate::sprite::{Rgb, Sprite};

pub const TILE_SIZE_PX: u32 = 16;
pub const WALL_HEIGHT_PX: u32 = 32;
pub const FLOOR_PATTERN_COUNT: usize = 7;
pub const WALL_MASK_COUNT: usize = 16;

pub const WALL_TILE_ID: u16 = 0;
pub const FIRST_FLOOR_TILE_ID: u16 = 1;

pub const WALL_NORTH: u8 = 1;
pub const WALL_EAST: u8 = 2;
pub const WALL_SOUTH: u8 = 4;
pub const WALL_WEST: u8 = 8;

pub const WALL_FILL: Rgb = Rgb(0x5a, 0x5a, 0x6e);
pub const WALL_CAP: Rgb = Rgb(0x7a, 0x7a, 0x90);
pub const WALL_EDGE: Rgb = Rgb(0x3a, 0x3a, 0x48);

const FLOOR_BASE_GRAY: u32 = 80;
const FLOOR_PATTERN_STEP: u32 = 15;
const FLOOR_CHECKER_BOOST: u32 = 10;
const WALL_EDGE_PX: u32 = 2;
const WALL_CAP_ROWS: u32 = 16;

pub fn floor_sprites() -> Vec<Sprite> {
    (0..FLOOR_PATTERN_COUNT as u32).map(floor_sprite).collect()
}

pub fn floor_sprite(pattern: u32) -> Sprite {
    let base = FLOOR_BASE_GRAY + FLOOR_PATTERN_STEP * pattern;
    Sprite::from_fn(TILE_SIZE_PX, TILE_SIZE_PX, |x, y| {
        let boost = if (x + y) % 2 == 0 {
            FLOOR_CHECKER_BOOST
        } else {
            0
        };
        Some(Rgb::gray((base + boost).min(255) as u8))
    })
}

/// Index `i` is the sprite for adjacency mask `i` (N=1, E=2, S=4, W=8).
pub fn wall_sprites() -> Vec<Sprite> {
    (0..WALL_MASK_COUNT as u8).map(wall_sprite).collect()
}

pub fn wall_sprite(mask: u8) -> Sprite {
    let open = |bit: u8| mask & bit == 0;
    Sprite::from_fn(TILE_SIZE_PX, WALL_HEIGHT_PX, |x, y| {
        let edge = (open(WALL_NORTH) && y < WALL_EDGE_PX)
            || (open(WALL_SOUTH) && y >= WALL_HEIGHT_PX - WALL_EDGE_PX)
            || (open(WALL_WEST) && x < WALL_EDGE_PX)
            || (open(WALL_EAST) && x >= TILE_SIZE_PX - WALL_EDGE_PX);
        let color = if edge {
            WALL_EDGE
        } else if y < WALL_CAP_ROWS {
            WALL_CAP
        } else {
            WALL_FILL
        };
        Some(color)
    })
}

pub fn floor_pattern_for_tile(tile_id: u16) -> Option<usize> {
    let pattern = tile_id.checked_sub(FIRST_FLOOR_TILE_ID)? as usize;
    (pattern < FLOOR_PATTERN_COUNT).then_some(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_set_has_seven_16px_tiles() {
        let sprites = floor_sprites();
        assert_eq!(sprites.len(), 7);
        for sprite in &sprites {
            assert_eq!((sprite.width(), sprite.height()), (16, 16));
        }
    }

    #[test]
    fn floor_gray_follows_pattern_and_checkerboard() {
        for (pattern, sprite) in floor_sprites().iter().enumerate() {
            let base = 80 + 15 * pattern as u8;
            assert_eq!(sprite.pixel(0, 0), Some(Some(Rgb::gray(base + 10))));
            assert_eq!(sprite.pixel(1, 0), Some(Some(Rgb::gray(base))));
            assert_eq!(sprite.pixel(3, 5), Some(Some(Rgb::gray(base + 10))));
        }
    }

    #[test]
    fn wall_set_has_sixteen_16x32_tiles() {
        let sprites = wall_sprites();
        assert_eq!(sprites.len(), 16);
        for sprite in &sprites {
            assert_eq!((sprite.width(), sprite.height()), (16, 32));
        }
    }

    #[test]
    fn wall_edges_follow_missing_neighbors() {
        let isolated = wall_sprite(0);
        assert_eq!(isolated.pixel(0, 20), Some(Some(WALL_EDGE)));
        assert_eq!(isolated.pixel(15, 20), Some(Some(WALL_EDGE)));
        assert_eq!(isolated.pixel(8, 0), Some(Some(WALL_EDGE)));
        assert_eq!(isolated.pixel(8, 31), Some(Some(WALL_EDGE)));

        let surrounded = wall_sprite(WALL_NORTH | WALL_EAST | WALL_SOUTH | WALL_WEST);
        assert_eq!(surrounded.pixel(0, 0), Some(Some(WALL_CAP)));
        assert_eq!(surrounded.pixel(15, 31), Some(Some(WALL_FILL)));

        let east_west_run = wall_sprite(WALL_EAST | WALL_WEST);
        assert_eq!(east_west_run.pixel(0, 20), Some(Some(WALL_FILL)));
        assert_eq!(east_west_run.pixel(8, 1), Some(Some(WALL_EDGE)));
    }

    #[test]
    fn every_mask_is_distinct() {
        let sprites = wall_sprites();
        for (i, a) in sprites.iter().enumerate() {
            for b in &sprites[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn tile_ids_map_to_floor_patterns() {
        assert_eq!(floor_pattern_for_tile(WALL_TILE_ID), None);
        assert_eq!(floor_pattern_for_tile(1), Some(0));
        assert_eq!(floor_pattern_for_tile(7), Some(6));
        assert_eq!(floor_pattern_for_tile(8), None);
    }
}
