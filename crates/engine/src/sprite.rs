use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const TRANSPARENT_WIRE: &str = "";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn gray(level: u8) -> Self {
        Self(level, level, level)
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    pub fn parse_hex(raw: &str) -> Result<Self, SpriteFormatError> {
        let invalid = || SpriteFormatError::InvalidColor {
            value: raw.to_string(),
        };
        let digits = raw.strip_prefix('#').ok_or_else(invalid)?;
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())
        };
        Ok(Self(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// One sprite cell. `None` is transparent.
pub type Pixel = Option<Rgb>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteFormatError {
    #[error("sprite row {row} has {actual} pixels, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("invalid sprite color '{value}' (expected '#rrggbb' or empty)")]
    InvalidColor { value: String },
}

/// Row-major pixel grid. Serializes as `height` rows of `width` color strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<String>>", into = "Vec<Vec<String>>")]
pub struct Sprite {
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,
}

impl Sprite {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![None; width as usize * height as usize],
        }
    }

    pub fn from_fn(width: u32, height: u32, mut paint: impl FnMut(u32, u32) -> Pixel) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(paint(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Pixel> {
        self.index_of(x, y).map(|index| self.pixels[index])
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: Pixel) -> bool {
        match self.index_of(x, y) {
            Some(index) => {
                self.pixels[index] = pixel;
                true
            }
            None => false,
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Pixel]> {
        // chunks() rejects a zero chunk size; an empty sprite has no rows anyway.
        self.pixels.chunks(self.width.max(1) as usize)
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(self.pixels.len() * 4);
        for pixel in &self.pixels {
            match pixel {
                Some(Rgb(r, g, b)) => rgba.extend_from_slice(&[*r, *g, *b, 255]),
                None => rgba.extend_from_slice(&[0, 0, 0, 0]),
            }
        }
        rgba
    }

    fn index_of(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }
}

impl From<Sprite> for Vec<Vec<String>> {
    fn from(sprite: Sprite) -> Self {
        sprite
            .rows()
            .map(|row| {
                row.iter()
                    .map(|pixel| match pixel {
                        Some(color) => color.to_hex(),
                        None => TRANSPARENT_WIRE.to_string(),
                    })
                    .collect()
            })
            .collect()
    }
}

impl TryFrom<Vec<Vec<String>>> for Sprite {
    type Error = SpriteFormatError;

    fn try_from(rows: Vec<Vec<String>>) -> Result<Self, Self::Error> {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        let mut pixels = Vec::with_capacity(width * rows.len());
        for (row_index, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(SpriteFormatError::RaggedRow {
                    row: row_index,
                    expected: width,
                    actual: row.len(),
                });
            }
            for value in row {
                if value == TRANSPARENT_WIRE {
                    pixels.push(None);
                } else {
                    pixels.push(Some(Rgb::parse_hex(value)?));
                }
            }
        }
        Ok(Self {
            width: width as u32,
            height: rows.len() as u32,
            pixels,
        })
    }
}
