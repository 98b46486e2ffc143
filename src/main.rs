//! Rift Runner entry point
//!
//! Native builds run a headless autopilot over the simulation and log a run
//! summary. Web builds export a `WebGame` handle that the page drives once per
//! animation frame and reads back as JSON snapshots.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use wasm_bindgen::prelude::*;

    use rift_runner::Tuning;
    use rift_runner::sim::{Game, GamePhase, Intent};

    /// Game handle owned by the page
    #[wasm_bindgen]
    pub struct WebGame {
        game: Game,
        intent: Intent,
    }

    #[wasm_bindgen]
    impl WebGame {
        /// Build a game. `tuning_json` may be empty for the defaults.
        #[wasm_bindgen(constructor)]
        pub fn new(seed: u64, tuning_json: &str) -> Result<WebGame, JsValue> {
            let tuning = if tuning_json.is_empty() {
                Tuning::default()
            } else {
                Tuning::from_json(tuning_json).map_err(|e| JsValue::from_str(&e.to_string()))?
            };
            log::info!("Rift Runner created with seed {}", seed);
            Ok(Self {
                game: Game::new(seed, tuning),
                intent: Intent::default(),
            })
        }

        pub fn start(&mut self) {
            self.game.start();
        }

        pub fn toggle_pause(&mut self) {
            self.game.toggle_pause();
        }

        pub fn restart(&mut self, seed: u64) {
            self.intent = Intent::default();
            self.game.restart(seed);
        }

        pub fn is_game_over(&self) -> bool {
            self.game.phase() == GamePhase::GameOver
        }

        pub fn score(&self) -> u32 {
            self.game.world().score()
        }

        /// Replace the held input. A hook press stays latched until a step
        /// consumes it.
        pub fn set_intent(&mut self, intent_json: &str) -> Result<(), JsValue> {
            let next: Intent = serde_json::from_str(intent_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
            let hook = self.intent.hook || next.hook;
            self.intent = next;
            self.intent.hook = hook;
            Ok(())
        }

        /// Advance by one animation frame of `dt` seconds; returns steps run
        pub fn frame(&mut self, dt: f32) -> u32 {
            self.game.frame(&mut self.intent, dt)
        }

        pub fn snapshot_json(&self) -> Result<String, JsValue> {
            serde_json::to_string(&self.game.snapshot()).map_err(|e| JsValue::from_str(&e.to_string()))
        }
    }

    pub fn init() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            return;
        }
        log::info!("Rift Runner (web) ready");
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::init();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = match args.next().map(|s| s.parse::<u64>()) {
        Some(Ok(seed)) => seed,
        Some(Err(e)) => {
            log::warn!("Ignoring bad seed argument: {}", e);
            rand::random()
        }
        None => rand::random(),
    };
    let tuning = args.next().map(|path| load_tuning(&path)).unwrap_or_default();

    log::info!("Rift Runner (native) starting, seed {}", seed);
    autopilot::run(seed, tuning, autopilot::RUN_SECONDS);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Read a tuning file, falling back to defaults on any error
#[cfg(not(target_arch = "wasm32"))]
fn load_tuning(path: &str) -> rift_runner::Tuning {
    use rift_runner::Tuning;

    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("Could not read tuning file {}: {}", path, e);
            return Tuning::default();
        }
    };
    match Tuning::from_json(&text) {
        Ok(tuning) => {
            log::info!("Loaded tuning from {}", path);
            tuning
        }
        Err(e) => {
            log::warn!("Invalid tuning file {}: {}", path, e);
            Tuning::default()
        }
    }
}

/// Scripted input for headless runs
#[cfg(not(target_arch = "wasm32"))]
mod autopilot {
    use rift_runner::Tuning;
    use rift_runner::consts::{SIM_DT, UNIT};
    use rift_runner::sim::{Game, GamePhase, Intent, Player};

    pub const RUN_SECONDS: f32 = 120.0;
    /// Seconds between jump attempts
    const JUMP_PERIOD: f32 = 0.9;
    /// Seconds the jump button is held per attempt
    const JUMP_HOLD: f32 = 0.2;
    /// Seconds between dimension toggles
    const TOGGLE_PERIOD: f32 = 7.0;

    fn intent_for(player: &Player, t: f32) -> Intent {
        let airborne = !player.on_ground;
        let falling = airborne && player.vel.y > 0.0;
        Intent {
            move_dir: 1,
            jump: t % JUMP_PERIOD < JUMP_HOLD,
            dash: player.energy >= 0.99,
            // Fire the grapple up and ahead once per fall, hang while falling
            hook: falling && !player.hook.is_active(),
            hook_hang: falling,
            hook_x: player.pos.x + 6.0 * UNIT,
            hook_y: player.pos.y - 6.0 * UNIT,
            toggle_dimension: t % TOGGLE_PERIOD < SIM_DT,
            ..Default::default()
        }
    }

    /// Drive runs back to back for `seconds` of simulated time
    pub fn run(seed: u64, tuning: Tuning, seconds: f32) {
        let mut game = Game::new(seed, tuning);
        game.start();

        let steps = (seconds / SIM_DT) as u32;
        let mut runs = 1;
        let mut best = 0;
        let mut run_time = 0.0;

        for _ in 0..steps {
            let intent = intent_for(game.world().player(), run_time);
            game.tick(&intent, SIM_DT);
            run_time += SIM_DT;

            if game.phase() == GamePhase::GameOver {
                let score = game.world().score();
                log::info!(
                    "Run {} over after {:.1}s: score {}, difficulty {}, x {:.0}",
                    runs,
                    run_time,
                    score,
                    game.world().difficulty(),
                    game.world().player().pos.x
                );
                best = best.max(score);
                runs += 1;
                run_time = 0.0;
                game.restart(seed.wrapping_add(runs));
            }
        }

        let world = game.world();
        best = best.max(world.score());
        log::info!(
            "Autopilot finished: {} run(s), best score {}, final dimension {:?}, sections live {}",
            runs,
            best,
            world.active(),
            world.active_layer().level.sections().len()
        );
    }
}
