//! Game lifecycle and fixed timestep driving
//!
//! The host feeds wall-clock frame deltas to [`Game::frame`], which runs whole
//! 1/60 s steps through the current phase.

use serde::{Deserialize, Serialize};

use super::controller::Intent;
use super::world::{Snapshot, World};
use crate::Tuning;
use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, world idle
    Menu,
    Running,
    Paused,
    /// Player died; only the death animation advances
    GameOver,
}

/// Accumulates wall-clock time into fixed steps
#[derive(Debug, Clone, Default)]
pub struct FixedStep {
    accumulator: f32,
}

impl FixedStep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Add a frame delta (clamped, non-finite counts as zero) and return how
    /// many steps to run
    pub fn push(&mut self, frame_dt: f32) -> u32 {
        let frame_dt = if frame_dt.is_finite() { frame_dt } else { 0.0 };
        self.accumulator += frame_dt.clamp(0.0, MAX_FRAME_DT);
        let mut steps = 0;
        while self.accumulator >= SIM_DT && steps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            steps += 1;
        }
        steps
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

/// Host-facing view: the world snapshot tagged with the lifecycle phase
#[derive(Debug, Serialize)]
pub struct GameSnapshot<'a> {
    pub phase: GamePhase,
    #[serde(flatten)]
    pub world: Snapshot<'a>,
}

/// A run: lifecycle phase plus the world it drives
#[derive(Debug, Clone)]
pub struct Game {
    phase: GamePhase,
    world: World,
    tuning: Tuning,
    clock: FixedStep,
}

impl Game {
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        Self {
            phase: GamePhase::Menu,
            world: World::new(seed, tuning.clone()),
            tuning,
            clock: FixedStep::new(),
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn snapshot(&self) -> GameSnapshot<'_> {
        GameSnapshot {
            phase: self.phase,
            world: self.world.snapshot(),
        }
    }

    /// Menu or Paused -> Running
    pub fn start(&mut self) {
        if matches!(self.phase, GamePhase::Menu | GamePhase::Paused) {
            self.phase = GamePhase::Running;
            log::info!("Run started");
        }
    }

    /// Running <-> Paused; ignored in Menu and GameOver
    pub fn toggle_pause(&mut self) {
        self.phase = match self.phase {
            GamePhase::Running => GamePhase::Paused,
            GamePhase::Paused => GamePhase::Running,
            other => {
                log::debug!("Pause ignored in {:?}", other);
                return;
            }
        };
        log::info!("Phase -> {:?}", self.phase);
    }

    /// Throw the world away and start a new run immediately
    pub fn restart(&mut self, seed: u64) {
        self.world = World::new(seed, self.tuning.clone());
        self.clock.reset();
        self.phase = GamePhase::Running;
        log::info!("Restarted with seed {}", seed);
    }

    /// One fixed step
    pub fn tick(&mut self, intent: &Intent, dt: f32) {
        match self.phase {
            GamePhase::Running => {
                self.world.update(intent, dt);
                if !self.world.player().alive {
                    self.phase = GamePhase::GameOver;
                    log::info!("Game over: score {}", self.world.score());
                }
            }
            GamePhase::GameOver => self.world.update_game_over(dt),
            GamePhase::Menu | GamePhase::Paused => {}
        }
    }

    /// Run however many fixed steps `frame_dt` covers. The one-shot hook
    /// press is consumed by the first step. Returns the step count.
    pub fn frame(&mut self, intent: &mut Intent, frame_dt: f32) -> u32 {
        let steps = self.clock.push(frame_dt);
        for _ in 0..steps {
            self.tick(intent, SIM_DT);
            intent.hook = false;
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> Game {
        Game::new(12345, Tuning::default())
    }

    #[test]
    fn test_menu_to_running() {
        let mut g = game();
        assert_eq!(g.phase(), GamePhase::Menu);

        // Nothing moves on the menu
        let before = g.world().player().pos;
        g.tick(&Intent::default(), SIM_DT);
        assert_eq!(g.world().player().pos, before);

        g.start();
        assert_eq!(g.phase(), GamePhase::Running);
        g.tick(&Intent::default(), SIM_DT);
        assert_ne!(g.world().player().pos, before);
    }

    #[test]
    fn test_tick_pause() {
        let mut g = game();
        g.toggle_pause();
        assert_eq!(g.phase(), GamePhase::Menu);

        g.start();
        g.toggle_pause();
        assert_eq!(g.phase(), GamePhase::Paused);

        let before = g.world().player().pos;
        g.tick(&Intent::default(), SIM_DT);
        assert_eq!(g.world().player().pos, before);

        g.toggle_pause();
        assert_eq!(g.phase(), GamePhase::Running);
    }

    #[test]
    fn test_death_leads_to_game_over() {
        let mut g = game();
        g.start();
        g.world_mut().player_mut().pos.y = 10_000.0;
        for _ in 0..70 {
            g.tick(&Intent::default(), SIM_DT);
        }
        assert_eq!(g.phase(), GamePhase::GameOver);

        // Only the animation keeps going
        let pos = g.world().player().pos;
        let anim_time = g.world().player().anim_time;
        g.tick(&Intent::default(), SIM_DT);
        assert_eq!(g.world().player().pos, pos);
        assert!(g.world().player().anim_time > anim_time);

        // Cannot pause or start out of game over
        g.toggle_pause();
        g.start();
        assert_eq!(g.phase(), GamePhase::GameOver);
    }

    #[test]
    fn test_restart_builds_fresh_world() {
        let mut g = game();
        g.start();
        let run = Intent {
            move_dir: 1,
            ..Default::default()
        };
        for _ in 0..60 {
            g.tick(&run, SIM_DT);
        }
        g.restart(1);
        assert_eq!(g.phase(), GamePhase::Running);
        assert_eq!(g.world().player().pos.x, 140.0);
        assert_eq!(g.world().score(), 0);
    }

    #[test]
    fn test_determinism() {
        let mut a = game();
        let mut b = game();
        a.start();
        b.start();

        let inputs = [
            Intent {
                move_dir: 1,
                ..Default::default()
            },
            Intent {
                move_dir: 1,
                jump: true,
                ..Default::default()
            },
            Intent {
                dash: true,
                ..Default::default()
            },
            Intent::default(),
        ];

        for _ in 0..30 {
            for intent in &inputs {
                a.tick(intent, SIM_DT);
                b.tick(intent, SIM_DT);
            }
        }

        assert_eq!(a.world().player().pos, b.world().player().pos);
        assert_eq!(a.world().score(), b.world().score());
        assert_eq!(
            a.world().active_layer().entities().hazards.len(),
            b.world().active_layer().entities().hazards.len()
        );
    }

    #[test]
    fn test_fixed_step_clamps_frame_delta() {
        let mut clock = FixedStep::new();
        // Half a second of stall is clamped to one 1/30 s frame
        let steps = clock.push(0.5);
        assert!((1..=2).contains(&steps));
        assert!(clock.accumulator() < SIM_DT);

        let mut clock = FixedStep::new();
        assert_eq!(clock.push(SIM_DT * 0.5), 0);
        assert_eq!(clock.push(SIM_DT * 0.6), 1);
        assert_eq!(clock.push(-1.0), 0);
    }

    #[test]
    fn test_fixed_step_ignores_non_finite_delta() {
        let mut clock = FixedStep::new();
        assert_eq!(clock.push(f32::NAN), 0);
        assert_eq!(clock.push(f32::INFINITY), 0);
        assert_eq!(clock.accumulator(), 0.0);
        assert_eq!(clock.push(SIM_DT), 1);
    }

    #[test]
    fn test_snapshot_reports_phase() {
        let mut g = game();
        let json = serde_json::to_string(&g.snapshot()).expect("snapshot serializes");
        assert!(json.contains("\"phase\":\"Menu\""));
        assert!(json.contains("\"score\":0"));

        g.start();
        g.toggle_pause();
        let json = serde_json::to_string(&g.snapshot()).expect("snapshot serializes");
        assert!(json.contains("\"phase\":\"Paused\""));
    }

    #[test]
    fn test_frame_consumes_hook_press() {
        let mut g = game();
        g.start();
        let mut intent = Intent {
            hook: true,
            hook_hang: true,
            hook_x: 140.0,
            hook_y: -200.0,
            ..Default::default()
        };
        let steps = g.frame(&mut intent, 1.0 / 30.0);
        assert!(steps >= 1);
        assert!(!intent.hook);
        assert!(intent.hook_hang);
    }
}
