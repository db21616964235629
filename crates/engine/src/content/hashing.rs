use sha2::{Digest, Sha256};

use crate::sprite::Sprite;

/// SHA-256 over dimensions then RGBA bytes; equal digests mean equal sprites.
pub fn sprite_digest_hex(sprite: &Sprite) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sprite.width().to_le_bytes());
    hasher.update(sprite.height().to_le_bytes());
    hasher.update(sprite.to_rgba8());
    to_hex_lower(&hasher.finalize())
}

pub(crate) fn to_hex_lower(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        use std::fmt::Write as _;
        let _ = write!(&mut output, "{byte:02x}");
    }
    output
}
