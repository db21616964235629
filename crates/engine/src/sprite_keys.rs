use thiserror::Error;

const MAX_SPRITE_KEY_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteKeyError {
    #[error("sprite key must not be empty")]
    Empty,
    #[error("sprite key is {len} characters long, limit is {MAX_SPRITE_KEY_LEN}")]
    TooLong { len: usize },
    #[error("sprite key must not contain path separator '{separator}'")]
    PathSeparator { separator: char },
    #[error("sprite key must start with a lowercase letter")]
    LeadingNonLetter,
    #[error("sprite key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Keys double as file stems when sprites are exported, so they stay flat.
pub(crate) fn validate_sprite_key(key: &str) -> Result<(), SpriteKeyError> {
    let Some(first) = key.chars().next() else {
        return Err(SpriteKeyError::Empty);
    };
    if key.len() > MAX_SPRITE_KEY_LEN {
        return Err(SpriteKeyError::TooLong { len: key.len() });
    }
    for ch in key.chars() {
        if matches!(ch, '/' | '\\') {
            return Err(SpriteKeyError::PathSeparator { separator: ch });
        }
    }
    if !first.is_ascii_lowercase() {
        return Err(SpriteKeyError::LeadingNonLetter);
    }
    for ch in key.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '-') {
            continue;
        }
        return Err(SpriteKeyError::InvalidCharacter { character: ch });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_keys() {
        for key in ["desk", "floor_3", "wall-15", "vault_cabinet"] {
            assert!(validate_sprite_key(key).is_ok(), "key={key}");
        }
    }

    #[test]
    fn rejects_invalid_keys() {
        for key in ["", "/a", "a/b", r"a\b", "..", "3desk", "Desk", "a.b", "_x"] {
            assert!(validate_sprite_key(key).is_err(), "key={key}");
        }
    }

    #[test]
    fn reports_the_offending_character() {
        assert_eq!(
            validate_sprite_key("desk.png"),
            Err(SpriteKeyError::InvalidCharacter { character: '.' })
        );
        assert_eq!(
            validate_sprite_key("tiles/floor"),
            Err(SpriteKeyError::PathSeparator { separator: '/' })
        );
        assert_eq!(
            validate_sprite_key(&"a".repeat(65)),
            Err(SpriteKeyError::TooLong { len: 65 })
        );
    }
}
