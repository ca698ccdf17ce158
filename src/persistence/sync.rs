//! Cloud save reconciliation
//!
//! The transport (accounts, network) lives outside this crate. A backend only
//! has to push and pull whole [`SaveData`] snapshots; [`merge`] decides what a
//! device keeps when both sides have progress.

use super::SaveData;

/// Remote save backend. Failures are reported, never raised.
pub trait CloudSync {
    /// Push a snapshot; false on failure
    fn save(&mut self, data: &SaveData) -> bool;
    /// Pull the remote snapshot, if there is one and it could be fetched
    fn load(&mut self) -> Option<SaveData>;
}

/// Combine local and remote progress.
///
/// Counters take the maximum of both sides, owned items and achievements are
/// unioned, and modifier flags are OR-ed. Equipped items and settings come
/// from the remote copy.
pub fn merge(local: &SaveData, remote: &SaveData) -> SaveData {
    let mut merged = local.clone();

    merged.total_coins = local.total_coins.max(remote.total_coins);
    merged.high_score = local.high_score.max(remote.high_score);
    merged.stats = local.stats.max(&remote.stats);

    for (category, items) in &remote.owned_items {
        merged
            .owned_items
            .entry(category.clone())
            .or_default()
            .extend(items.iter().cloned());
    }
    for id in &remote.achievements {
        if !merged.has_achievement(id) {
            merged.achievements.push(id.clone());
        }
    }

    merged.equipped_items = remote.equipped_items.clone();
    merged.settings = remote.settings.clone();
    merged.modifiers = local.modifiers.union(&remote.modifiers);
    merged.fill_defaults();
    merged
}
