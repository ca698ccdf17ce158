//! Asteroid Blaster entry point
//!
//! Native builds run a headless autopilot game; the web build wires the
//! session to the page.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::KeyboardEvent;

    use asteroid_blaster::audio::WebAudioSink;
    use asteroid_blaster::driver::{FrameDriver, Renderer};
    use asteroid_blaster::input::RawInput;
    use asteroid_blaster::persistence::{LocalStorageStore, SaveStore};
    use asteroid_blaster::sim::NoticeKind;
    use asteroid_blaster::{Session, SessionPhase};

    /// Mirrors the session into the page's HUD elements
    struct DomHud {
        document: web_sys::Document,
        last_phase: Option<SessionPhase>,
    }

    impl DomHud {
        fn set_text(&self, selector: &str, text: &str) {
            if let Some(el) = self.document.query_selector(selector).ok().flatten() {
                el.set_text_content(Some(text));
            }
        }
    }

    impl Renderer for DomHud {
        fn render<S: SaveStore>(&mut self, session: &Session<S>) {
            let phase = session.phase();
            if self.last_phase != Some(phase) {
                if let Some(root) = self.document.document_element() {
                    let _ = root.set_attribute("data-phase", phase.as_str());
                }
                self.last_phase = Some(phase);
            }

            if let Some(countdown) = session.countdown() {
                self.set_text("#countdown-text", &countdown.label());
            }
            if let Some(world) = session.world() {
                self.set_text("#hud-score .hud-value", &world.score.to_string());
                self.set_text("#hud-level .hud-value", &world.level.to_string());
                self.set_text("#hud-lives .hud-value", &world.lives.to_string());
                self.set_text("#hud-coins .hud-value", &world.coins_this_game.to_string());
            }
            let notice = match session.notifications().current().map(|n| &n.kind) {
                Some(NoticeKind::BossWave) => "BOSS WAVE!".to_string(),
                Some(NoticeKind::WaveCleared) => "WAVE CLEARED!".to_string(),
                Some(NoticeKind::LevelUp(level)) => format!("LEVEL {level}"),
                Some(NoticeKind::CheatWarning) => "Cheats active - no records".to_string(),
                Some(NoticeKind::Achievement(name)) => format!("Achievement: {name}"),
                Some(NoticeKind::SyncFailed) => "Cloud sync failed".to_string(),
                None => String::new(),
            };
            self.set_text("#notification", &notice);
        }
    }

    struct Game {
        driver: FrameDriver<LocalStorageStore, DomHud>,
        raw: RawInput,
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Asteroid Blaster starting...");

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document - cannot start");
            return;
        };

        let seed = js_sys::Date::now() as u64;
        let mut session = Session::new(LocalStorageStore::new(), seed);
        if let Some(sink) = WebAudioSink::new() {
            session.attach_audio(Box::new(sink));
        }
        let hud = DomHud {
            document: document.clone(),
            last_phase: None,
        };
        let game = Rc::new(RefCell::new(Game {
            driver: FrameDriver::new(session, hud),
            raw: RawInput::default(),
        }));

        setup_keyboard(&document, game.clone());
        setup_auto_pause(&document, game.clone());
        request_animation_frame(game);
    }

    fn set_key(raw: &mut RawInput, code: &str, down: bool) -> bool {
        match code {
            "ArrowLeft" | "KeyA" => raw.left = down,
            "ArrowRight" | "KeyD" => raw.right = down,
            "ArrowUp" | "KeyW" => raw.up = down,
            "ArrowDown" | "KeyS" => raw.down = down,
            "Space" => raw.fire_key = down,
            _ => return false,
        }
        true
    }

    fn setup_keyboard(document: &web_sys::Document, game: Rc<RefCell<Game>>) {
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                let code = event.code();
                if set_key(&mut g.raw, &code, true) {
                    event.prevent_default();
                    return;
                }
                let paused = g.driver.session().phase() == SessionPhase::Paused;
                match code.as_str() {
                    "Enter" => {
                        g.driver.session_mut().start();
                    }
                    "KeyP" | "Escape" if paused => {
                        g.driver.resume();
                    }
                    "KeyP" | "Escape" => {
                        g.driver.session_mut().pause();
                    }
                    "KeyH" => g.driver.session_mut().go_home(),
                    _ => {}
                }
            });
            let _ = document.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                set_key(&mut game.borrow_mut().raw, &event.code(), false);
            });
            let _ = document.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(document: &web_sys::Document, game: Rc<RefCell<Game>>) {
        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                let mut g = game.borrow_mut();
                if g.driver.session_mut().pause() {
                    log::info!("Auto-paused (tab hidden)");
                }
                g.raw = RawInput::default();
            }
        });
        let _ = document.add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            let raw = g.raw.clone();
            g.driver.frame(time, &raw);
        }
        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;

    use clap::Parser;

    use asteroid_blaster::driver::{FrameDriver, Renderer};
    use asteroid_blaster::input::RawInput;
    use asteroid_blaster::persistence::{JsonFileStore, MemoryStore, SaveStore};
    use asteroid_blaster::sim::{Modifiers, NoticeChange};
    use asteroid_blaster::{Session, SessionPhase};

    #[derive(Parser)]
    #[command(name = "asteroid-blaster")]
    #[command(about = "Run a headless Asteroid Blaster game flown by the autopilot")]
    pub struct Args {
        /// Session seed (each game derives its own seed from it)
        #[arg(long, default_value_t = 1)]
        seed: u64,

        /// Simulated seconds before giving up
        #[arg(long, default_value_t = 180.0)]
        seconds: f32,

        /// Frames per simulated second
        #[arg(long, default_value_t = 60)]
        fps: u32,

        /// Save file (omit for a throwaway in-memory save)
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Ship moves twice as fast
        #[arg(long)]
        fast: bool,

        /// Lives are never lost (cheat)
        #[arg(long)]
        immortal: bool,

        /// Hazards move at half speed (cheat)
        #[arg(long)]
        slow: bool,

        /// Faster hazards and bigger fields
        #[arg(long)]
        nightmare: bool,

        /// Bigger ship and bullets
        #[arg(long)]
        large: bool,
    }

    impl Args {
        fn modifiers(&self) -> Modifiers {
            Modifiers {
                fast_mode: self.fast,
                immortal_mode: self.immortal,
                slow_mode: self.slow,
                nightmare_mode: self.nightmare,
                large_mode: self.large,
            }
        }
    }

    /// Logs a line whenever the level changes
    #[derive(Default)]
    struct LogHud {
        level: u32,
    }

    impl Renderer for LogHud {
        fn render<S: SaveStore>(&mut self, session: &Session<S>) {
            let Some(world) = session.world() else {
                return;
            };
            if world.level != self.level {
                self.level = world.level;
                log::info!(
                    "Level {} | score {} | lives {} | coins {}",
                    world.level,
                    world.score,
                    world.lives,
                    world.coins_this_game
                );
            }
        }
    }

    pub fn run(args: Args) {
        let store: Box<dyn SaveStore> = match &args.save {
            Some(path) => Box::new(JsonFileStore::new(path)),
            None => Box::new(MemoryStore::new()),
        };
        let mut session = Session::new(store, args.seed);
        session.set_modifiers(args.modifiers());
        session.start();

        let mut driver = FrameDriver::new(session, LogHud::default());
        let raw = RawInput {
            autopilot: true,
            ..Default::default()
        };
        let frame_ms = 1000.0 / f64::from(args.fps.max(1));
        let total_frames = (f64::from(args.seconds) * f64::from(args.fps.max(1))).ceil() as u64;

        for frame in 0..total_frames {
            let (_, changes) = driver.frame(frame as f64 * frame_ms, &raw);
            for change in changes {
                if let NoticeChange::Shown(notice) = change {
                    log::info!("Notice: {:?}", notice.kind);
                }
            }
            if driver.session().phase() == SessionPhase::GameOver {
                break;
            }
        }

        let session = driver.session_mut();
        if session.phase() != SessionPhase::GameOver {
            log::info!("Time limit reached, leaving game");
            if let Some(world) = session.world() {
                println!("Stopped at level {} with score {}", world.level, world.score);
            }
            session.go_home();
        } else if let Some(summary) = session.last_game() {
            println!(
                "Game over: score {} | level {} | asteroids {} | aliens {} | coins {}{}",
                summary.score,
                summary.level,
                summary.asteroids,
                summary.aliens,
                summary.coins,
                if summary.new_high_score { " | NEW HIGH SCORE" } else { "" }
            );
        }

        let save = session.save_data();
        println!(
            "Wallet {} coins | high score {} | {} games | {} achievements",
            save.total_coins,
            save.high_score,
            save.stats.total_games,
            save.achievements.len()
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use clap::Parser;

    env_logger::init();
    log::info!("Asteroid Blaster (native) starting...");
    native::run(native::Args::parse());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
