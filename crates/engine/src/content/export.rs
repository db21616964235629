use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::sprite::Sprite;
use crate::sprite_keys::{validate_sprite_key, SpriteKeyError};

use super::database::AssetCatalog;
use super::hashing::sprite_digest_hex;
use super::tiles::{floor_sprites, wall_sprites};

pub const MANIFEST_FILE_NAME: &str = "sprites.manifest.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpriteGroup {
    Floor,
    Wall,
    Furniture,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedSprite {
    pub key: String,
    pub group: SpriteGroup,
    pub file: String,
    pub width: u32,
    pub height: u32,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportManifest {
    pub sprites: Vec<ExportedSprite>,
}

#[derive(Debug, Error)]
pub enum SpriteExportError {
    #[error("sprite key '{key}' cannot be used as a file name: {source}")]
    InvalidKey {
        key: String,
        #[source]
        source: SpriteKeyError,
    },
    #[error("failed to encode sprite '{key}' as png: {source}")]
    Encode {
        key: String,
        #[source]
        source: ImageError,
    },
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode export manifest: {0}")]
    Manifest(#[source] serde_json::Error),
}

/// Writes every tile and furniture sprite as `<key>.png` plus a digest manifest.
pub fn export_sprite_set(
    out_dir: &Path,
    catalog: &AssetCatalog,
) -> Result<ExportManifest, SpriteExportError> {
    let floors = floor_sprites();
    let walls = wall_sprites();
    let mut queue = Vec::<(String, SpriteGroup, &Sprite)>::new();
    for (pattern, sprite) in floors.iter().enumerate() {
        queue.push((format!("floor_{pattern}"), SpriteGroup::Floor, sprite));
    }
    for (mask, sprite) in walls.iter().enumerate() {
        queue.push((format!("wall_{mask}"), SpriteGroup::Wall, sprite));
    }
    for entry in catalog.entries() {
        if let Some(sprite) = catalog.sprite(&entry.id) {
            queue.push((entry.id.clone(), SpriteGroup::Furniture, sprite));
        }
    }

    let mut manifest = ExportManifest {
        sprites: Vec::with_capacity(queue.len()),
    };
    for (key, group, sprite) in queue {
        validate_sprite_key(&key).map_err(|source| SpriteExportError::InvalidKey {
            key: key.clone(),
            source,
        })?;
        let file = format!("{key}.png");
        let png = encode_png(&key, sprite)?;
        write_file_atomic(&out_dir.join(&file), &png)?;
        manifest.sprites.push(ExportedSprite {
            sha256: sprite_digest_hex(sprite),
            width: sprite.width(),
            height: sprite.height(),
            key,
            group,
            file,
        });
    }

    let text = serde_json::to_string_pretty(&manifest).map_err(SpriteExportError::Manifest)?;
    write_file_atomic(&out_dir.join(MANIFEST_FILE_NAME), text.as_bytes())?;
    info!(
        out_dir = %out_dir.display(),
        sprite_count = manifest.sprites.len(),
        "sprite_export_complete"
    );
    Ok(manifest)
}

fn encode_png(key: &str, sprite: &Sprite) -> Result<Vec<u8>, SpriteExportError> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(
            &sprite.to_rgba8(),
            sprite.width(),
            sprite.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|source| SpriteExportError::Encode {
            key: key.to_string(),
            source,
        })?;
    Ok(bytes)
}

fn write_file_atomic(path: &Path, bytes: &[u8]) -> Result<(), SpriteExportError> {
    let io_error = |source| SpriteExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("sprite");
    let staging = path.with_file_name(format!(".{file_name}.partial"));
    fs::write(&staging, bytes).map_err(io_error)?;
    if let Err(source) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(io_error(source));
    }
    Ok(())
}
