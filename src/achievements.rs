//! Tiered achievements
//!
//! Each achievement tracks one lifetime metric and unlocks three tiers
//! (`{id}_1` .. `{id}_3`) as the metric passes each limit.

use crate::persistence::SaveData;

/// Value an achievement is measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    GamesPlayed,
    AsteroidsDestroyed,
    /// Pursuer kills
    AliensDefeated,
    CoinsEarned,
    HighScore,
    /// Level of the game in progress
    LevelReached,
}

impl Metric {
    fn value(&self, save: &SaveData, level: u32) -> u64 {
        match self {
            Metric::GamesPlayed => save.stats.total_games,
            Metric::AsteroidsDestroyed => save.stats.total_asteroids,
            Metric::AliensDefeated => save.stats.total_aliens,
            Metric::CoinsEarned => save.stats.total_coins_earned,
            Metric::HighScore => save.high_score,
            Metric::LevelReached => u64::from(level),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Tier {
    pub limit: u64,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub metric: Metric,
    pub tiers: [Tier; 3],
}

const fn tier(limit: u64, description: &'static str) -> Tier {
    Tier { limit, description }
}

pub const ACHIEVEMENTS: [Achievement; 6] = [
    Achievement {
        id: "games_played",
        name: "Space Cadet",
        metric: Metric::GamesPlayed,
        tiers: [tier(1, "Play your first game"), tier(10, "Play 10 games"), tier(50, "Play 50 games")],
    },
    Achievement {
        id: "asteroid_hunter",
        name: "Asteroid Hunter",
        metric: Metric::AsteroidsDestroyed,
        tiers: [
            tier(100, "Destroy 100 asteroids"),
            tier(1_000, "Destroy 1,000 asteroids"),
            tier(5_000, "Destroy 5,000 asteroids"),
        ],
    },
    Achievement {
        id: "alien_slayer",
        name: "Alien Slayer",
        metric: Metric::AliensDefeated,
        tiers: [
            tier(10, "Defeat 10 Cat Aliens"),
            tier(100, "Defeat 100 Cat Aliens"),
            tier(500, "Defeat 500 Cat Aliens"),
        ],
    },
    Achievement {
        id: "coin_collector",
        name: "Coin Collector",
        metric: Metric::CoinsEarned,
        tiers: [
            tier(500, "Earn 500 coins total"),
            tier(5_000, "Earn 5,000 coins total"),
            tier(25_000, "Earn 25,000 coins total"),
        ],
    },
    Achievement {
        id: "high_scorer",
        name: "Legendary",
        metric: Metric::HighScore,
        tiers: [
            tier(20_000, "Score 20,000 points"),
            tier(100_000, "Score 100,000 points"),
            tier(500_000, "Score 500,000 points"),
        ],
    },
    Achievement {
        id: "survivor",
        name: "Survivor",
        metric: Metric::LevelReached,
        tiers: [tier(5, "Reach Level 5"), tier(10, "Reach Level 10"), tier(20, "Reach Level 20")],
    },
];

const NUMERALS: [&str; 3] = ["I", "II", "III"];

/// A tier that has just been earned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unlocked {
    /// Tier id, e.g. `games_played_2`
    pub id: String,
    /// Display name, e.g. `Space Cadet II`
    pub name: String,
    pub description: &'static str,
}

/// Tiers whose limit is met but that the save does not hold yet.
/// Nothing unlocks while cheat modifiers are active.
pub fn check(save: &SaveData, level: u32, cheats: bool) -> Vec<Unlocked> {
    if cheats {
        return Vec::new();
    }
    let mut unlocked = Vec::new();
    for ach in &ACHIEVEMENTS {
        let value = ach.metric.value(save, level);
        for (i, tier) in ach.tiers.iter().enumerate() {
            let id = format!("{}_{}", ach.id, i + 1);
            if value >= tier.limit && !save.has_achievement(&id) {
                unlocked.push(Unlocked {
                    id,
                    name: format!("{} {}", ach.name, NUMERALS[i]),
                    description: tier.description,
                });
            }
        }
    }
    unlocked
}
