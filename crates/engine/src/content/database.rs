use std::collections::{BTreeMap, HashMap};

use crate::sprite::Sprite;
use crate::sprite_keys::validate_sprite_key;

use super::catalog::{furniture_catalog, FALLBACK_FURNITURE_ID};
use super::furniture::generate_sprite;
use super::types::{CatalogError, FurnitureCatalogEntry};

/// Furniture catalog with its sprites rasterized once up front.
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    entries: Vec<FurnitureCatalogEntry>,
    index_by_id: HashMap<String, usize>,
    sprites: BTreeMap<String, Sprite>,
    fallback_index: usize,
}

impl AssetCatalog {
    pub fn builtin() -> Self {
        Self::from_entries(furniture_catalog()).expect("builtin furniture catalog is valid")
    }

    pub fn from_entries(entries: Vec<FurnitureCatalogEntry>) -> Result<Self, CatalogError> {
        let mut index_by_id = HashMap::with_capacity(entries.len());
        let mut sprites = BTreeMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            validate_sprite_key(&entry.id).map_err(|source| CatalogError::InvalidId {
                id: entry.id.clone(),
                source,
            })?;
            if entry.width == 0
                || entry.height == 0
                || entry.footprint_w == 0
                || entry.footprint_h == 0
            {
                return Err(CatalogError::EmptyDimensions {
                    id: entry.id.clone(),
                    width: entry.width,
                    height: entry.height,
                    footprint_w: entry.footprint_w,
                    footprint_h: entry.footprint_h,
                });
            }
            if index_by_id.insert(entry.id.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateId {
                    id: entry.id.clone(),
                });
            }
            sprites.insert(entry.id.clone(), generate_sprite(entry));
        }
        let fallback_index = *index_by_id
            .get(FALLBACK_FURNITURE_ID)
            .ok_or(CatalogError::MissingFallback {
                id: FALLBACK_FURNITURE_ID,
            })?;

        Ok(Self {
            entries,
            index_by_id,
            sprites,
            fallback_index,
        })
    }

    pub fn entries(&self) -> &[FurnitureCatalogEntry] {
        &self.entries
    }

    pub fn entry(&self, id: &str) -> Option<&FurnitureCatalogEntry> {
        self.index_by_id.get(id).map(|idx| &self.entries[*idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_by_id.contains_key(id)
    }

    pub fn fallback(&self) -> &FurnitureCatalogEntry {
        &self.entries[self.fallback_index]
    }

    /// Unknown ids resolve to the generic fallback entry.
    pub fn resolve(&self, id: &str) -> &FurnitureCatalogEntry {
        self.entry(id).unwrap_or_else(|| self.fallback())
    }

    pub fn sprite(&self, id: &str) -> Option<&Sprite> {
        self.sprites.get(id)
    }

    pub fn sprites(&self) -> &BTreeMap<String, Sprite> {
        &self.sprites
    }
}

impl Default for AssetCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::furniture::{SpriteRule, GENERIC_BORDER};
    use crate::content::types::FurnitureCategory;

    fn entry(id: &str) -> FurnitureCatalogEntry {
        FurnitureCatalogEntry {
            id: id.to_string(),
            label: id.to_string(),
            category: FurnitureCategory::Furniture,
            sprite_file: format!("{id}.png"),
            width: 16,
            height: 16,
            footprint_w: 1,
            footprint_h: 1,
            is_desk: false,
            can_place_on_walls: false,
        }
    }

    #[test]
    fn builtin_has_one_sprite_per_entry() {
        let catalog = AssetCatalog::builtin();
        assert_eq!(catalog.sprites().len(), catalog.entries().len());
        for entry in catalog.entries() {
            let sprite = catalog.sprite(&entry.id).expect("sprite");
            assert_eq!(sprite, &generate_sprite(entry));
        }
    }

    #[test]
    fn unknown_type_resolves_to_generic_fallback() {
        let catalog = AssetCatalog::builtin();
        assert!(!catalog.contains("teleporter"));
        let resolved = catalog.resolve("teleporter");
        assert_eq!(resolved.id, FALLBACK_FURNITURE_ID);
        assert_eq!(SpriteRule::for_entry(resolved), SpriteRule::Generic);
        let sprite = catalog.sprite(&resolved.id).expect("fallback sprite");
        assert_eq!(sprite.pixel(0, 0), Some(Some(GENERIC_BORDER)));
        assert_eq!(catalog.resolve("desk").id, "desk");
    }

    #[test]
    fn rejects_duplicate_ids() {
        let result = AssetCatalog::from_entries(vec![entry("fallback"), entry("fallback")]);
        assert_eq!(
            result.err(),
            Some(CatalogError::DuplicateId {
                id: "fallback".to_string()
            })
        );
    }

    #[test]
    fn rejects_missing_fallback_and_bad_ids() {
        let missing = AssetCatalog::from_entries(vec![entry("desk")]);
        assert!(matches!(missing, Err(CatalogError::MissingFallback { .. })));

        let bad = AssetCatalog::from_entries(vec![entry("fallback"), entry("Desk")]);
        assert!(matches!(bad, Err(CatalogError::InvalidId { .. })));
    }

    #[test]
    fn rejects_zero_sized_entries() {
        let mut flat = entry("fallback");
        flat.height = 0;
        assert!(matches!(
            AssetCatalog::from_entries(vec![flat]),
            Err(CatalogError::EmptyDimensions { .. })
        ));
    }
}
