//! Save data and storage backends
//!
//! Features:
//! - Plain JSON save with per-field defaults, so old saves keep loading
//! - Pluggable [`SaveStore`] backends (file, LocalStorage, memory)
//! - Cloud reconciliation in [`sync`]
//!
//! Storage failures are reported as errors; callers decide how to degrade.

pub mod file;
pub mod sync;

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::settings::Settings;
use crate::sim::{KillStats, Modifiers};

pub use file::JsonFileStore;
#[cfg(target_arch = "wasm32")]
pub use file::LocalStorageStore;
pub use sync::{CloudSync, merge};

/// Cosmetic categories every save owns a default item in
pub const ITEM_CATEGORIES: [&str; 4] = ["skins", "trails", "bullets", "backgrounds"];
/// Equipped slot for each category
pub const EQUIP_SLOTS: [&str; 4] = ["skin", "trail", "bullet", "background"];
pub const DEFAULT_ITEM: &str = "default";

/// Totals across every game played
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LifetimeStats {
    pub total_games: u64,
    pub total_asteroids: u64,
    /// Pursuer kills
    pub total_aliens: u64,
    /// Swooper kills
    pub total_space_pirates: u64,
    /// Drifter kills
    pub total_jellyfish: u64,
    pub total_coins_earned: u64,
}

impl LifetimeStats {
    pub fn record_kills(&mut self, kills: &KillStats) {
        self.total_asteroids += u64::from(kills.asteroids);
        self.total_aliens += u64::from(kills.pursuers);
        self.total_space_pirates += u64::from(kills.swoopers);
        self.total_jellyfish += u64::from(kills.drifters);
    }

    /// Field-wise maximum
    pub fn max(&self, other: &LifetimeStats) -> LifetimeStats {
        LifetimeStats {
            total_games: self.total_games.max(other.total_games),
            total_asteroids: self.total_asteroids.max(other.total_asteroids),
            total_aliens: self.total_aliens.max(other.total_aliens),
            total_space_pirates: self.total_space_pirates.max(other.total_space_pirates),
            total_jellyfish: self.total_jellyfish.max(other.total_jellyfish),
            total_coins_earned: self.total_coins_earned.max(other.total_coins_earned),
        }
    }
}

/// Everything persisted between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SaveData {
    pub high_score: u64,
    /// Spendable currency
    pub total_coins: u64,
    /// Owned cosmetic ids per category
    pub owned_items: BTreeMap<String, BTreeSet<String>>,
    /// Equipped cosmetic id per slot
    pub equipped_items: BTreeMap<String, String>,
    pub stats: LifetimeStats,
    /// Unlocked achievement tier ids, in unlock order
    pub achievements: Vec<String>,
    pub modifiers: Modifiers,
    pub settings: Settings,
}

impl Default for SaveData {
    fn default() -> Self {
        let owned_items = ITEM_CATEGORIES
            .iter()
            .map(|c| (c.to_string(), BTreeSet::from([DEFAULT_ITEM.to_string()])))
            .collect();
        let equipped_items = EQUIP_SLOTS
            .iter()
            .map(|s| (s.to_string(), DEFAULT_ITEM.to_string()))
            .collect();
        Self {
            high_score: 0,
            total_coins: 0,
            owned_items,
            equipped_items,
            stats: LifetimeStats::default(),
            achievements: Vec::new(),
            modifiers: Modifiers::default(),
            settings: Settings::default(),
        }
    }
}

impl SaveData {
    /// Parse a save, filling anything an older version did not write
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let mut data: SaveData = serde_json::from_str(json)?;
        data.fill_defaults();
        Ok(data)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Make sure every category and slot has at least the default item
    pub fn fill_defaults(&mut self) {
        for category in ITEM_CATEGORIES {
            self.owned_items
                .entry(category.to_string())
                .or_default()
                .insert(DEFAULT_ITEM.to_string());
        }
        for slot in EQUIP_SLOTS {
            self.equipped_items
                .entry(slot.to_string())
                .or_insert_with(|| DEFAULT_ITEM.to_string());
        }
    }

    /// Add a game's coins to both the wallet and the lifetime total
    pub fn bank_coins(&mut self, coins: u32) {
        self.total_coins += u64::from(coins);
        self.stats.total_coins_earned += u64::from(coins);
    }

    /// Record a new high score. Cheated runs never count.
    pub fn submit_score(&mut self, score: u64, cheats: bool) -> bool {
        if cheats || score <= self.high_score {
            return false;
        }
        self.high_score = score;
        true
    }

    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements.iter().any(|a| a == id)
    }

    /// Returns false if already unlocked
    pub fn unlock_achievement(&mut self, id: &str) -> bool {
        if self.has_achievement(id) {
            return false;
        }
        self.achievements.push(id.to_string());
        true
    }
}

/// Opaque load/save backend
pub trait SaveStore {
    /// `Ok(None)` when nothing has been saved yet
    fn load(&self) -> anyhow::Result<Option<SaveData>>;
    fn save(&mut self, data: &SaveData) -> anyhow::Result<()>;
}

impl<T: SaveStore + ?Sized> SaveStore for Box<T> {
    fn load(&self) -> anyhow::Result<Option<SaveData>> {
        (**self).load()
    }

    fn save(&mut self, data: &SaveData) -> anyhow::Result<()> {
        (**self).save(data)
    }
}

/// Load a save, falling back to defaults on any failure
pub fn load_or_default<S: SaveStore + ?Sized>(store: &S) -> SaveData {
    match store.load() {
        Ok(Some(data)) => {
            log::info!("Loaded save data");
            data
        }
        Ok(None) => {
            log::info!("No save data, starting fresh");
            SaveData::default()
        }
        Err(e) => {
            log::warn!("Failed to load save data, using defaults: {e:#}");
            SaveData::default()
        }
    }
}

/// Save, logging instead of failing
pub fn save_or_warn<S: SaveStore + ?Sized>(store: &mut S, data: &SaveData) -> bool {
    match store.save(data) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Failed to save game data: {e:#}");
            false
        }
    }
}

/// In-memory store (tests, headless runs without a save path)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    json: Option<String>,
    pub saves: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with raw JSON (possibly corrupt)
    pub fn with_json(json: impl Into<String>) -> Self {
        Self { json: Some(json.into()), saves: 0 }
    }

    pub fn json(&self) -> Option<&str> {
        self.json.as_deref()
    }
}

impl SaveStore for MemoryStore {
    fn load(&self) -> anyhow::Result<Option<SaveData>> {
        match &self.json {
            Some(json) => Ok(Some(SaveData::from_json(json).context("parsing save data")?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, data: &SaveData) -> anyhow::Result<()> {
        self.json = Some(data.to_json().context("encoding save data")?);
        self.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_owns_default_items() {
        let data = SaveData::default();
        for category in ITEM_CATEGORIES {
            assert!(data.owned_items[category].contains(DEFAULT_ITEM));
        }
        assert_eq!(data.equipped_items["background"], DEFAULT_ITEM);
    }

    #[test]
    fn test_old_save_gets_backgrounds() {
        let json = r#"{
            "highScore": 1200,
            "totalCoins": 40,
            "ownedItems": {"skins": ["default", "neon"], "trails": ["default"], "bullets": ["default"]},
            "equippedItems": {"skin": "neon", "trail": "default", "bullet": "default"},
            "stats": {"totalGames": 3}
        }"#;
        let data = SaveData::from_json(json).unwrap();
        assert_eq!(data.high_score, 1200);
        assert!(data.owned_items["skins"].contains("neon"));
        assert!(data.owned_items["backgrounds"].contains(DEFAULT_ITEM));
        assert_eq!(data.equipped_items["background"], DEFAULT_ITEM);
        assert_eq!(data.stats.total_games, 3);
        assert_eq!(data.settings, Settings::default());
    }

    #[test]
    fn test_corrupt_save_falls_back_to_defaults() {
        let store = MemoryStore::with_json("{not json");
        assert!(store.load().is_err());
        assert_eq!(load_or_default(&store), SaveData::default());
    }

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());
        let mut data = SaveData::default();
        data.bank_coins(25);
        data.unlock_achievement("games_played_1");
        assert!(save_or_warn(&mut store, &data));
        assert_eq!(store.load().unwrap(), Some(data));
        assert_eq!(store.saves, 1);
    }

    #[test]
    fn test_cheated_score_not_recorded() {
        let mut data = SaveData::default();
        assert!(!data.submit_score(5000, true));
        assert!(data.submit_score(5000, false));
        assert!(!data.submit_score(4000, false));
        assert_eq!(data.high_score, 5000);
    }

    #[test]
    fn test_record_kills_by_archetype() {
        let mut stats = LifetimeStats::default();
        stats.record_kills(&KillStats { asteroids: 10, pursuers: 2, swoopers: 1, drifters: 3 });
        assert_eq!(stats.total_asteroids, 10);
        assert_eq!(stats.total_aliens, 2);
        assert_eq!(stats.total_space_pirates, 1);
        assert_eq!(stats.total_jellyfish, 3);
    }
}
