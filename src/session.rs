//! Game session state machine
//!
//! `Menu → Countdown → Playing ⇄ Paused`, `Playing → GameOver → Menu`.
//!
//! The session owns the save data, the single notification queue and the
//! audio manager. Only `Playing` advances the simulation; the notification
//! queue drains in every phase.

use log::{info, warn};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::achievements;
use crate::audio::{AudioManager, AudioSink};
use crate::consts::*;
use crate::persistence::{self, CloudSync, SaveData, SaveStore, merge};
use crate::settings::Settings;
use crate::sim::{GameEvent, Modifiers, Notice, NoticeChange, NoticeKind, NotificationQueue, TickInput, World, tick};

/// Top-level phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Menu,
    Countdown,
    Playing,
    Paused,
    GameOver,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Menu => "menu",
            SessionPhase::Countdown => "countdown",
            SessionPhase::Playing => "playing",
            SessionPhase::Paused => "paused",
            SessionPhase::GameOver => "gameover",
        }
    }
}

/// What a countdown update produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStep {
    /// A new number is showing
    Count(u8),
    Go,
    Finished,
}

/// 3-2-1-GO before a game starts
#[derive(Debug, Clone, PartialEq)]
pub struct Countdown {
    /// Number on screen; 0 while "GO!" shows
    count: u8,
    timer: f32,
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Countdown {
    pub fn new() -> Self {
        Self {
            count: COUNTDOWN_START,
            timer: COUNTDOWN_STEP,
        }
    }

    pub fn count(&self) -> u8 {
        self.count
    }

    pub fn label(&self) -> String {
        if self.count > 0 {
            self.count.to_string()
        } else {
            "GO!".to_string()
        }
    }

    pub fn update(&mut self, dt: f32) -> Option<CountdownStep> {
        self.timer -= dt;
        if self.timer > 0.0 {
            return None;
        }
        if self.count > 1 {
            self.count -= 1;
            self.timer += COUNTDOWN_STEP;
            Some(CountdownStep::Count(self.count))
        } else if self.count == 1 {
            self.count = 0;
            self.timer += COUNTDOWN_GO_TIME;
            Some(CountdownStep::Go)
        } else {
            Some(CountdownStep::Finished)
        }
    }
}

/// Results of the last finished game
#[derive(Debug, Clone, PartialEq)]
pub struct GameSummary {
    pub score: u64,
    pub level: u32,
    pub asteroids: u32,
    pub aliens: u32,
    pub coins: u32,
    pub new_high_score: bool,
}

/// One player's session: menus, the current game and persistence
pub struct Session<S: SaveStore> {
    phase: SessionPhase,
    countdown: Option<Countdown>,
    world: Option<World>,
    save: SaveData,
    store: S,
    cloud: Option<Box<dyn CloudSync>>,
    audio: AudioManager,
    notifications: NotificationQueue,
    seeds: Pcg32,
    last_game: Option<GameSummary>,
}

impl<S: SaveStore> Session<S> {
    /// Load the save (defaults on failure) and sit in the menu
    pub fn new(store: S, seed: u64) -> Self {
        let save = persistence::load_or_default(&store);
        let mut audio = AudioManager::silent();
        audio.apply_settings(&save.settings);
        Self {
            phase: SessionPhase::Menu,
            countdown: None,
            world: None,
            save,
            store,
            cloud: None,
            audio,
            notifications: NotificationQueue::default(),
            seeds: Pcg32::seed_from_u64(seed),
            last_game: None,
        }
    }

    pub fn with_cloud(mut self, cloud: Box<dyn CloudSync>) -> Self {
        self.cloud = Some(cloud);
        self
    }

    pub fn attach_audio(&mut self, sink: Box<dyn AudioSink>) {
        self.audio.attach(sink);
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn countdown(&self) -> Option<&Countdown> {
        self.countdown.as_ref()
    }

    /// Current (or just-finished) game
    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    pub fn world_mut(&mut self) -> Option<&mut World> {
        self.world.as_mut()
    }

    pub fn save_data(&self) -> &SaveData {
        &self.save
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.save.settings
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    pub fn last_game(&self) -> Option<&GameSummary> {
        self.last_game.as_ref()
    }

    pub fn audio_mut(&mut self) -> &mut AudioManager {
        &mut self.audio
    }

    /// Screen offset for the current shake, zero when shake is disabled.
    /// `rx`/`ry` are the renderer's random samples in `[0, 1)`.
    pub fn shake_offset(&self, rx: f32, ry: f32) -> (f32, f32) {
        match &self.world {
            Some(world) if self.save.settings.effective_screen_shake() => world.shake.offset(rx, ry),
            _ => (0.0, 0.0),
        }
    }

    // ------------------------------------------------------------------------
    // Menu actions
    // ------------------------------------------------------------------------

    /// Change settings and persist them
    pub fn update_settings(&mut self, f: impl FnOnce(&mut Settings)) {
        f(&mut self.save.settings);
        self.audio.apply_settings(&self.save.settings);
        self.persist();
    }

    /// Replace the whole modifier set. Takes effect from the next game.
    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        if self.save.modifiers != modifiers {
            self.save.modifiers = modifiers;
            self.persist();
        }
    }

    /// Flip a modifier by name. Takes effect from the next game.
    pub fn toggle_modifier(&mut self, name: &str) -> bool {
        if !self.save.modifiers.toggle(name) {
            return false;
        }
        info!("Modifier {name} toggled, cheats={}", self.save.modifiers.has_cheats());
        self.persist();
        true
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    /// Begin the 3-2-1-GO countdown. Restarting cancels a running countdown.
    /// Ignored mid-game.
    pub fn start(&mut self) -> bool {
        if matches!(self.phase, SessionPhase::Playing | SessionPhase::Paused) {
            return false;
        }
        self.audio.resume();
        self.countdown = Some(Countdown::new());
        self.phase = SessionPhase::Countdown;
        true
    }

    pub fn pause(&mut self) -> bool {
        if self.phase != SessionPhase::Playing {
            return false;
        }
        self.phase = SessionPhase::Paused;
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.phase != SessionPhase::Paused {
            return false;
        }
        self.phase = SessionPhase::Playing;
        true
    }

    /// Advance one frame. Returns what happened on the notification display.
    pub fn update(&mut self, dt: f32, input: &TickInput) -> Vec<NoticeChange> {
        match self.phase {
            SessionPhase::Countdown => self.update_countdown(dt),
            SessionPhase::Playing => self.update_playing(dt, input),
            SessionPhase::Menu | SessionPhase::Paused | SessionPhase::GameOver => {}
        }
        self.notifications.update(dt)
    }

    fn update_countdown(&mut self, dt: f32) {
        let Some(countdown) = self.countdown.as_mut() else {
            return;
        };
        if countdown.update(dt) == Some(CountdownStep::Finished) {
            self.countdown = None;
            self.begin_game();
        }
    }

    fn begin_game(&mut self) {
        let seed = self.seeds.random::<u64>();
        let modifiers = self.save.modifiers;
        self.world = Some(World::new(seed, modifiers));
        self.notifications.clear();
        self.last_game = None;
        self.phase = SessionPhase::Playing;

        self.save.stats.total_games += 1;
        self.persist();
        self.check_achievements();

        if modifiers.has_cheats() {
            self.notifications
                .push(Notice::new(NoticeKind::CheatWarning, CHEAT_WARNING_TIME));
        }
        info!("Game {} started", self.save.stats.total_games);
    }

    fn update_playing(&mut self, dt: f32, input: &TickInput) {
        let Some(world) = self.world.as_mut() else {
            return;
        };
        tick(world, input, dt);
        let events = world.take_events();
        let notices = world.take_notices();
        let game_over = world.game_over;

        for notice in notices {
            self.notifications.push(notice);
        }
        self.audio.play_events(&events);

        let progressed = events
            .iter()
            .any(|e| matches!(e, GameEvent::LevelAdvanced(_) | GameEvent::ComboMilestone(_)));
        if progressed {
            self.check_achievements();
        }
        if game_over {
            self.end_game();
        }
    }

    /// Bank the game's results. Only the first call per game does anything.
    pub fn end_game(&mut self) {
        if self.phase == SessionPhase::GameOver {
            return;
        }
        let Some(world) = self.world.as_ref() else {
            return;
        };
        let cheats = world.modifiers.has_cheats();
        let summary = GameSummary {
            score: world.score,
            level: world.level,
            asteroids: world.kills.asteroids,
            aliens: world.kills.aliens(),
            coins: world.coins_this_game,
            new_high_score: false,
        };
        let kills = world.kills;

        self.phase = SessionPhase::GameOver;
        self.save.bank_coins(summary.coins);
        self.save.stats.record_kills(&kills);
        let new_high_score = self.save.submit_score(summary.score, cheats);
        self.persist();
        self.check_achievements();

        info!(
            "Game over: score {} at level {}{}",
            summary.score,
            summary.level,
            if new_high_score { " (new high score)" } else { "" }
        );
        self.last_game = Some(GameSummary { new_high_score, ..summary });
    }

    /// Back to the menu. Quitting mid-game keeps the coins but nothing else.
    pub fn go_home(&mut self) {
        if matches!(self.phase, SessionPhase::Playing | SessionPhase::Paused) {
            if let Some(world) = self.world.as_ref() {
                let coins = world.coins_this_game;
                self.save.bank_coins(coins);
                self.persist();
                info!("Left game early, banked {coins} coins");
            }
        }
        self.countdown = None;
        self.world = None;
        self.phase = SessionPhase::Menu;
    }

    /// Pull and merge the cloud copy, then push the result. Returns false if
    /// no backend is attached or the push failed.
    pub fn sync_with_cloud(&mut self) -> bool {
        let Some(cloud) = self.cloud.as_mut() else {
            return false;
        };
        if let Some(remote) = cloud.load() {
            self.save = merge(&self.save, &remote);
        }
        let pushed = cloud.save(&self.save);
        self.audio.apply_settings(&self.save.settings);
        self.persist();
        if !pushed {
            warn!("Cloud sync failed");
            self.notifications
                .push(Notice::new(NoticeKind::SyncFailed, WAVE_CLEAR_NOTIFICATION_TIME));
        }
        pushed
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn persist(&mut self) {
        persistence::save_or_warn(&mut self.store, &self.save);
    }

    fn check_achievements(&mut self) {
        let (level, cheats) = match &self.world {
            Some(world) => (world.level, world.modifiers.has_cheats()),
            None => (0, self.save.modifiers.has_cheats()),
        };
        let unlocked = achievements::check(&self.save, level, cheats);
        if unlocked.is_empty() {
            return;
        }
        for ach in unlocked {
            info!("Achievement unlocked: {}", ach.name);
            self.save.unlock_achievement(&ach.id);
            self.notifications
                .push(Notice::new(NoticeKind::Achievement(ach.name), ACHIEVEMENT_NOTIFICATION_TIME));
        }
        self.persist();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    const DT: f32 = 1.0 / 60.0;

    fn run<S: SaveStore>(session: &mut Session<S>, secs: f32) -> Vec<NoticeChange> {
        let frames = (secs / DT).ceil() as u32;
        let mut changes = Vec::new();
        for _ in 0..frames {
            changes.extend(session.update(DT, &TickInput::default()));
        }
        changes
    }

    fn playing_session() -> Session<MemoryStore> {
        let mut session = Session::new(MemoryStore::new(), 7);
        session.start();
        run(&mut session, 3.6);
        assert_eq!(session.phase(), SessionPhase::Playing);
        session
    }

    struct FakeCloud {
        remote: Option<SaveData>,
        accept: bool,
        pushed: Vec<SaveData>,
    }

    impl CloudSync for FakeCloud {
        fn save(&mut self, data: &SaveData) -> bool {
            if self.accept {
                self.pushed.push(data.clone());
            }
            self.accept
        }

        fn load(&mut self) -> Option<SaveData> {
            self.remote.clone()
        }
    }

    #[test]
    fn test_countdown_steps() {
        let mut countdown = Countdown::new();
        assert_eq!(countdown.label(), "3");
        assert_eq!(countdown.update(0.5), None);
        assert_eq!(countdown.update(0.5), Some(CountdownStep::Count(2)));
        assert_eq!(countdown.update(1.0), Some(CountdownStep::Count(1)));
        assert_eq!(countdown.update(1.0), Some(CountdownStep::Go));
        assert_eq!(countdown.label(), "GO!");
        assert_eq!(countdown.update(0.25), None);
        assert_eq!(countdown.update(0.25), Some(CountdownStep::Finished));
    }

    #[test]
    fn test_countdown_leads_into_game() {
        let mut session = Session::new(MemoryStore::new(), 1);
        assert!(session.start());
        run(&mut session, 3.0);
        assert_eq!(session.phase(), SessionPhase::Countdown);
        assert!(session.world().is_none());
        run(&mut session, 0.6);
        assert_eq!(session.phase(), SessionPhase::Playing);
        assert_eq!(session.world().unwrap().asteroids.len(), 4);
    }

    #[test]
    fn test_restarting_countdown_cancels_previous() {
        let mut session = Session::new(MemoryStore::new(), 1);
        session.start();
        run(&mut session, 2.5);
        session.start();
        assert_eq!(session.countdown().unwrap().count(), COUNTDOWN_START);
        run(&mut session, 2.5);
        assert_eq!(session.phase(), SessionPhase::Countdown);
    }

    #[test]
    fn test_game_start_counts_and_unlocks_first_game() {
        let session = playing_session();
        assert_eq!(session.save_data().stats.total_games, 1);
        assert!(session.save_data().has_achievement("games_played_1"));
        assert!(session.store().saves >= 2);
        let stored = session.store().load().unwrap().unwrap();
        assert_eq!(stored.stats.total_games, 1);
        assert_eq!(
            session.notifications().current().map(|n| n.kind.clone()),
            Some(NoticeKind::Achievement("Space Cadet I".into()))
        );
    }

    #[test]
    fn test_cheat_warning_and_no_achievements() {
        let mut save = SaveData::default();
        save.modifiers = Modifiers { immortal_mode: true, ..Default::default() };
        let store = MemoryStore::with_json(save.to_json().unwrap());
        let mut session = Session::new(store, 3);
        session.start();
        let changes = run(&mut session, 3.6);
        assert!(session.save_data().achievements.is_empty());
        assert!(changes.iter().any(|c| matches!(
            c,
            NoticeChange::Shown(n) if n.kind == NoticeKind::CheatWarning
        )));
    }

    #[test]
    fn test_pause_freezes_world() {
        let mut session = playing_session();
        let clock = session.world().unwrap().clock;
        assert!(session.pause());
        assert!(!session.pause());
        run(&mut session, 1.0);
        assert_eq!(session.world().unwrap().clock, clock);
        assert!(session.resume());
        run(&mut session, 0.5);
        assert!(session.world().unwrap().clock > clock);
    }

    #[test]
    fn test_notifications_drain_while_paused() {
        let mut session = playing_session();
        session.pause();
        run(&mut session, 5.0);
        assert!(session.notifications().is_idle());
    }

    #[test]
    fn test_game_over_banks_results_once() {
        let mut session = playing_session();
        {
            let world = session.world_mut().unwrap();
            world.score = 3_000;
            world.coins_this_game = 12;
            world.kills.asteroids = 9;
            world.kills.pursuers = 2;
            world.lives = 1;
            world.lose_life();
        }
        session.update(DT, &TickInput::default());
        assert_eq!(session.phase(), SessionPhase::GameOver);
        session.end_game();
        session.end_game();

        let save = session.save_data();
        assert_eq!(save.total_coins, 12);
        assert_eq!(save.stats.total_coins_earned, 12);
        assert_eq!(save.stats.total_asteroids, 9);
        assert_eq!(save.stats.total_aliens, 2);
        assert_eq!(save.high_score, 3_000);
        let summary = session.last_game().unwrap();
        assert!(summary.new_high_score);
        assert_eq!(summary.aliens, 2);
    }

    #[test]
    fn test_cheated_game_keeps_high_score() {
        let mut save = SaveData::default();
        save.high_score = 100;
        save.modifiers.slow_mode = true;
        let mut session = Session::new(MemoryStore::with_json(save.to_json().unwrap()), 5);
        session.start();
        run(&mut session, 3.6);
        let world = session.world_mut().unwrap();
        world.score = 50_000;
        world.game_over = true;
        session.update(DT, &TickInput::default());
        assert_eq!(session.phase(), SessionPhase::GameOver);
        assert_eq!(session.save_data().high_score, 100);
    }

    #[test]
    fn test_go_home_banks_coins_only() {
        let mut session = playing_session();
        {
            let world = session.world_mut().unwrap();
            world.coins_this_game = 7;
            world.score = 9_999;
            world.kills.asteroids = 4;
        }
        session.pause();
        session.go_home();
        assert_eq!(session.phase(), SessionPhase::Menu);
        assert!(session.world().is_none());
        let save = session.save_data();
        assert_eq!(save.total_coins, 7);
        assert_eq!(save.high_score, 0);
        assert_eq!(save.stats.total_asteroids, 0);
    }

    #[test]
    fn test_start_ignored_mid_game() {
        let mut session = playing_session();
        assert!(!session.start());
        assert_eq!(session.phase(), SessionPhase::Playing);
    }

    #[test]
    fn test_corrupt_save_starts_fresh() {
        let session = Session::new(MemoryStore::with_json("]]"), 1);
        assert_eq!(session.save_data(), &SaveData::default());
        assert_eq!(session.phase(), SessionPhase::Menu);
    }

    #[test]
    fn test_sync_merges_and_pushes() {
        let mut remote = SaveData::default();
        remote.total_coins = 900;
        remote.achievements.push("coin_collector_1".into());
        let cloud = FakeCloud { remote: Some(remote), accept: true, pushed: Vec::new() };
        let mut session = Session::new(MemoryStore::new(), 1).with_cloud(Box::new(cloud));
        assert!(session.sync_with_cloud());
        assert_eq!(session.save_data().total_coins, 900);
        assert!(session.save_data().has_achievement("coin_collector_1"));
    }

    #[test]
    fn test_sync_failure_is_a_notification() {
        let cloud = FakeCloud { remote: None, accept: false, pushed: Vec::new() };
        let mut session = Session::new(MemoryStore::new(), 1).with_cloud(Box::new(cloud));
        assert!(!session.sync_with_cloud());
        let changes = session.update(DT, &TickInput::default());
        assert!(changes.iter().any(|c| matches!(
            c,
            NoticeChange::Shown(n) if n.kind == NoticeKind::SyncFailed
        )));
    }

    #[test]
    fn test_sync_without_backend_is_noop() {
        let mut session = Session::new(MemoryStore::new(), 1);
        assert!(!session.sync_with_cloud());
        assert!(session.notifications().is_idle());
    }

    #[test]
    fn test_toggle_modifier_persists() {
        let mut session = Session::new(MemoryStore::new(), 1);
        assert!(session.toggle_modifier("slowMode"));
        assert!(!session.toggle_modifier("turbo"));
        let stored = session.store().load().unwrap().unwrap();
        assert!(stored.modifiers.slow_mode);
    }

    #[test]
    fn test_shake_respects_reduced_motion() {
        let mut session = playing_session();
        session.world_mut().unwrap().shake.trigger(10.0, 1.0);
        assert_ne!(session.shake_offset(1.0, 1.0), (0.0, 0.0));
        session.update_settings(|s| s.reduced_motion = true);
        assert_eq!(session.shake_offset(1.0, 1.0), (0.0, 0.0));
    }
}
