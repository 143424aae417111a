use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::asset::{Asset, Category};

/// One user's full asset collection: a map from category to an ordered
/// list of assets (insertion order = display order). All eight
/// categories are always present, empty or not, so serialized records
/// keep a stable shape.
///
/// Exactly one portfolio is active in memory at a time, selected by the
/// active user key (or the transient anonymous default).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub assets: BTreeMap<Category, Vec<Asset>>,

    /// When a refresh cycle last persisted updated prices.
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
}

impl Default for Portfolio {
    fn default() -> Self {
        let mut assets = BTreeMap::new();
        for category in Category::ALL {
            assets.insert(category, Vec::new());
        }
        Self {
            assets,
            last_sync: None,
        }
    }
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assets in one category, in insertion order. Empty slice if the
    /// category key is somehow missing (tolerates hand-edited records).
    pub fn assets_in(&self, category: Category) -> &[Asset] {
        self.assets.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Append an asset to its category's list.
    pub fn add(&mut self, asset: Asset) {
        self.assets.entry(asset.category).or_default().push(asset);
    }

    /// Remove an asset by id. Returns the removed asset, or `None` if
    /// no asset with that id exists in the category.
    pub fn remove(&mut self, category: Category, id: Uuid) -> Option<Asset> {
        let list = self.assets.get_mut(&category)?;
        let idx = list.iter().position(|a| a.id == id)?;
        Some(list.remove(idx))
    }

    /// Find an asset by id within a category.
    pub fn find_mut(&mut self, category: Category, id: Uuid) -> Option<&mut Asset> {
        self.assets
            .get_mut(&category)?
            .iter_mut()
            .find(|a| a.id == id)
    }

    /// Iterate all assets across categories.
    pub fn iter_assets(&self) -> impl Iterator<Item = &Asset> {
        self.assets.values().flatten()
    }

    /// Total number of assets across all categories.
    pub fn asset_count(&self) -> usize {
        self.assets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.values().all(Vec::is_empty)
    }
}
