//! Dual-dimension world
//!
//! Two independently populated layers share one player. The active layer is
//! an explicit id into a two-slot table; every per-frame system receives the
//! resolved layer as a parameter.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::controller::{Controller, Intent};
use super::entities::{BoosterKind, EntitySet, Platform, PlatformKind};
use super::fx::{
    BOOSTER_BURST_DURATION, FLOATING_NUMBER_DURATION, FxKind, FxQueues, GRAPPLE_TEXT_DURATION,
    TELEPORT_BURST_DURATION,
};
use super::generator::Style;
use super::level::LevelManager;
use super::player::{HookState, Player, TELEPORT_FADE_DURATION};
use super::rect::Rect;
use crate::{Tuning, clamp01};

/// Score points per difficulty tier
pub const SCORE_PER_DIFFICULTY: u32 = 1000;
/// Speed multiplier gained per difficulty tier
pub const MULTIPLIER_PER_DIFFICULTY: f32 = 0.2;
/// Wall starts this many units behind the layer's first platform
pub const WALL_START_OFFSET_UNITS: f32 = 20.0;
pub const WALL_WIDTH: f32 = 80.0;
pub const WALL_TOP: f32 = -3000.0;
pub const WALL_HEIGHT: f32 = 6000.0;
/// Spawn height above the first platform of layer A
const SPAWN_HEIGHT: f32 = 60.0;

/// Which dimension layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DimensionId {
    A,
    B,
}

impl DimensionId {
    pub fn other(self) -> Self {
        match self {
            DimensionId::A => DimensionId::B,
            DimensionId::B => DimensionId::A,
        }
    }

    fn index(self) -> usize {
        match self {
            DimensionId::A => 0,
            DimensionId::B => 1,
        }
    }
}

/// Hazard wall chasing the player from behind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PursuitWall {
    pub rect: Rect,
    pub speed: f32,
}

impl PursuitWall {
    /// Place the wall behind `first_x`
    pub fn behind(first_x: f32, unit: f32) -> Self {
        Self {
            rect: Rect::new(
                first_x - WALL_START_OFFSET_UNITS * unit,
                WALL_TOP,
                WALL_WIDTH,
                WALL_HEIGHT,
            ),
            speed: 0.0,
        }
    }

    /// Speed ramps linearly from the minimum to a fraction of max run speed
    pub fn advance(&mut self, elapsed: f32, tuning: &Tuning, dt: f32) {
        let t = clamp01(elapsed / tuning.wall_ramp_seconds);
        let min_speed = tuning.wall_min_speed_units * tuning.unit;
        let max_speed = tuning.run_speed_max * tuning.wall_max_speed_fraction;
        self.speed = min_speed + (max_speed - min_speed) * t;
        self.rect.x += self.speed * dt;
    }
}

/// Score and difficulty of one layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedState {
    /// Monotonic: furthest distance in units plus committed bonuses
    pub score: u32,
    pub difficulty: u32,
    pub multiplier: f32,
    pub last_style: Option<Style>,
}

impl Default for SpeedState {
    fn default() -> Self {
        Self {
            score: 0,
            difficulty: 0,
            multiplier: 1.0,
            last_style: None,
        }
    }
}

impl SpeedState {
    /// Fold in distance travelled; never lowers the score
    pub fn fold_distance(&mut self, x: f32, unit: f32) {
        let distance = (x / unit).floor().max(0.0) as u32;
        if distance > self.score {
            self.score = distance;
        }
        self.refresh_difficulty();
    }

    pub fn add_bonus(&mut self, value: u32) {
        self.score = self.score.saturating_add(value);
    }

    fn refresh_difficulty(&mut self) {
        let difficulty = self.score / SCORE_PER_DIFFICULTY;
        if difficulty != self.difficulty {
            self.difficulty = difficulty;
            self.multiplier = 1.0 + difficulty as f32 * MULTIPLIER_PER_DIFFICULTY;
            log::info!("Difficulty {} (x{:.1})", difficulty, self.multiplier);
        }
    }
}

/// Smooth-follow camera (top-left of the view in world space)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
}

impl Camera {
    /// Ease toward centering `target`; never scrolls left of the world start
    pub fn follow(&mut self, target: Vec2, tuning: &Tuning) {
        let goal_x = (target.x - tuning.view_width / 2.0).max(0.0);
        let goal_y = target.y - tuning.view_height / 2.0;
        self.x += (goal_x - self.x) * tuning.camera_lerp;
        self.y += (goal_y - self.y) * tuning.camera_lerp;
    }
}

/// One dimension's independent state
#[derive(Debug, Clone)]
pub struct Layer {
    pub id: DimensionId,
    pub level: LevelManager,
    pub fx: FxQueues,
    pub wall: PursuitWall,
    pub speed: SpeedState,
    /// Seconds this layer has been active
    pub elapsed: f32,
}

impl Layer {
    pub fn new(id: DimensionId, seed_platforms: Vec<Platform>, tuning: &Tuning) -> Self {
        let first_x = seed_platforms.first().map_or(0.0, |p| p.rect.x);
        Self {
            id,
            level: LevelManager::new(seed_platforms, tuning),
            fx: FxQueues::new(),
            wall: PursuitWall::behind(first_x, tuning.unit),
            speed: SpeedState::default(),
            elapsed: 0.0,
        }
    }

    pub fn entities(&self) -> &EntitySet {
        self.level.entities()
    }
}

/// Hand-placed starting platforms of a layer
pub fn seed_layout(id: DimensionId) -> Vec<Platform> {
    let rects: &[Rect] = match id {
        DimensionId::A => &[Rect::new(40.0, 200.0, 400.0, 40.0)],
        DimensionId::B => &[Rect::new(20.0, 210.0, 200.0, 40.0), Rect::new(260.0, 170.0, 260.0, 40.0)],
    };
    rects
        .iter()
        .map(|&r| Platform::new(r, PlatformKind::Static))
        .collect()
}

/// Everything a renderer needs for one frame
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub dimension: DimensionId,
    pub player: &'a Player,
    pub camera: Camera,
    pub score: u32,
    pub difficulty: u32,
    pub style: Option<Style>,
    pub entities: &'a EntitySet,
    pub fx: &'a FxQueues,
    pub wall: &'a PursuitWall,
}

/// The simulation: two layers, one player
#[derive(Debug, Clone)]
pub struct World {
    tuning: Tuning,
    rng: Pcg32,
    layers: [Layer; 2],
    active: DimensionId,
    player: Player,
    controller: Controller,
    camera: Camera,
    last_toggle: bool,
}

impl World {
    /// Build a fresh world. Invalid tuning falls back to defaults.
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let tuning = match tuning.validate() {
            Ok(()) => tuning,
            Err(err) => {
                log::warn!("Rejected tuning ({}), using defaults", err);
                Tuning::default()
            }
        };

        let layer_a = Layer::new(DimensionId::A, seed_layout(DimensionId::A), &tuning);
        let layer_b = Layer::new(DimensionId::B, seed_layout(DimensionId::B), &tuning);

        let spawn = layer_a
            .entities()
            .platforms
            .first()
            .map_or(Vec2::ZERO, |p| Vec2::new(p.rect.x + p.rect.width * 0.25, p.rect.y - SPAWN_HEIGHT));
        let player = Player::new(spawn, &tuning);

        Self {
            rng: Pcg32::seed_from_u64(seed),
            layers: [layer_a, layer_b],
            active: DimensionId::A,
            player,
            controller: Controller::new(),
            camera: Camera::default(),
            last_toggle: false,
            tuning,
        }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn active(&self) -> DimensionId {
        self.active
    }

    pub fn layer(&self, id: DimensionId) -> &Layer {
        &self.layers[id.index()]
    }

    pub fn layer_mut(&mut self, id: DimensionId) -> &mut Layer {
        &mut self.layers[id.index()]
    }

    pub fn active_layer(&self) -> &Layer {
        self.layer(self.active)
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn score(&self) -> u32 {
        self.active_layer().speed.score
    }

    pub fn difficulty(&self) -> u32 {
        self.active_layer().speed.difficulty
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        let layer = self.active_layer();
        Snapshot {
            dimension: self.active,
            player: &self.player,
            camera: self.camera,
            score: layer.speed.score,
            difficulty: layer.speed.difficulty,
            style: layer.speed.last_style,
            entities: layer.entities(),
            fx: &layer.fx,
            wall: &layer.wall,
        }
    }

    /// One fixed step of gameplay
    pub fn update(&mut self, intent: &Intent, dt: f32) {
        if intent.toggle_dimension && !self.last_toggle {
            self.switch_dimension();
        }
        self.last_toggle = intent.toggle_dimension;

        let tuning = &self.tuning;
        let player = &mut self.player;
        let layer = &mut self.layers[self.active.index()];

        layer.elapsed += dt;
        layer.wall.advance(layer.elapsed, tuning, dt);

        layer
            .level
            .update(player.pos.x, layer.speed.difficulty, dt, &mut self.rng);
        layer.speed.last_style = layer.level.last_style();

        self.controller
            .update(player, intent, &layer.level.entities().platforms, tuning, dt);

        apply_contacts(player, layer, tuning);
        check_death(player, tuning, dt);
        layer.speed.fold_distance(player.pos.x, tuning.unit);
        player.update_animation(dt);

        layer.fx.track_player(player, tuning.unit, dt);
        let committed = layer.fx.advance(dt);
        if committed > 0 {
            layer.speed.add_bonus(committed);
        }

        player.speed_boost_timer = (player.speed_boost_timer - dt).max(0.0);
        self.camera.follow(player.pos, tuning);
    }

    /// After the run ends only the death animation keeps playing
    pub fn update_game_over(&mut self, dt: f32) {
        self.player.update_animation(dt);
    }

    /// Flip to the other layer and land the player on a safe surface there
    pub fn switch_dimension(&mut self) {
        self.player.hook = HookState::None;

        let from = self.active;
        self.layers[from.index()].fx.spawn(
            FxKind::TeleportBurst,
            self.player.pos,
            TELEPORT_BURST_DURATION,
            0,
        );
        self.player.teleport_timer = TELEPORT_FADE_DURATION;

        self.active = from.other();
        let layer = &mut self.layers[self.active.index()];
        layer
            .fx
            .spawn(FxKind::TeleportBurst, self.player.pos, TELEPORT_BURST_DURATION, 0);

        // Make sure the arrival layer has terrain around the player
        layer
            .level
            .ensure_ahead(self.player.pos.x, layer.speed.difficulty, &mut self.rng);

        let landed = safe_snap(&mut self.player, &layer.level.entities().platforms);
        log::info!(
            "Switched {:?} -> {:?} at x={:.0} (landed on {:?})",
            from,
            self.active,
            self.player.pos.x,
            landed
        );
    }
}

/// Put the player on the best surface of `platforms`: the highest one whose
/// span contains the player's x, else the nearest platform center.
/// Returns the chosen platform id.
pub fn safe_snap(player: &mut Player, platforms: &[Platform]) -> Option<u32> {
    player.ground_platform = None;
    player.drop_through = None;

    let half_height = player.height / 2.0;
    let solid = || platforms.iter().filter(|p| p.collides());

    let spanning = solid()
        .filter(|p| p.rect.spans_x(player.pos.x))
        .min_by(|a, b| a.rect.y.total_cmp(&b.rect.y));

    let (platform, x) = match spanning {
        Some(p) => (p, player.pos.x),
        None => {
            let nearest = solid().min_by(|a, b| {
                let da = snap_distance(player, a, half_height);
                let db = snap_distance(player, b, half_height);
                da.total_cmp(&db)
            });
            let p = nearest?;
            (p, p.rect.center().x)
        }
    };

    player.pos = Vec2::new(x, platform.rect.y - half_height);
    player.vel.y = 0.0;
    player.on_ground = true;
    player.ground_platform = Some(platform.id);
    Some(platform.id)
}

fn snap_distance(player: &Player, platform: &Platform, half_height: f32) -> f32 {
    let surface = Vec2::new(platform.rect.center().x, platform.rect.y - half_height);
    surface.distance(player.pos)
}

/// Hazards, bonuses, boosters and the pursuit wall against the player
pub fn apply_contacts(player: &mut Player, layer: &mut Layer, tuning: &Tuning) {
    let bounds = player.bounds();
    let entities = layer.level.entities_mut();

    for hazard in &entities.hazards {
        if hazard.is_active() && bounds.intersects(&hazard.rect) {
            player.energy = (player.energy - tuning.hazard_energy_penalty).max(0.0);
            player.vel.y = -tuning.hazard_knockback;
            player.damage_timer = tuning.damage_duration;
        }
    }

    for bonus in &mut entities.bonuses {
        if bonus.collected || !bounds.intersects(&bonus.rect) {
            continue;
        }
        bonus.collected = true;
        let at = Vec2::new(bonus.rect.center().x, bonus.rect.y);
        layer
            .fx
            .spawn(FxKind::FloatingNumber, at, FLOATING_NUMBER_DURATION, bonus.value);
    }

    for booster in &mut entities.boosters {
        if !booster.enter(bounds.intersects(&booster.rect)) {
            continue;
        }
        match booster.kind {
            BoosterKind::Jump => {
                let launch = tuning.jump_velocity() * tuning.jump_boost_multiplier;
                if player.vel.y > launch {
                    player.vel.y = launch;
                }
                let feet = Vec2::new(player.pos.x, player.bottom());
                layer
                    .fx
                    .spawn(FxKind::TeleportBurst, feet, BOOSTER_BURST_DURATION, 0);
            }
            BoosterKind::Speed => {
                player.speed_boost_timer = tuning.speed_boost_duration;
            }
            BoosterKind::Grapple => {
                player.add_grapple_charge();
                let center = booster.rect.center();
                layer
                    .fx
                    .spawn(FxKind::TeleportBurst, center, BOOSTER_BURST_DURATION, 0);
                layer.fx.spawn(
                    FxKind::GrappleText,
                    Vec2::new(center.x, booster.rect.y),
                    GRAPPLE_TEXT_DURATION,
                    1,
                );
            }
        }
    }

    if player.can_act() && bounds.intersects(&layer.wall.rect) {
        player.start_death(tuning.death_duration);
        player.energy = 0.0;
        log::info!("Caught by the wall at x={:.0}", player.pos.x);
    }
}

/// Arm the death countdown on exhaustion or falling out, then run it down
pub fn check_death(player: &mut Player, tuning: &Tuning, dt: f32) {
    if !player.dying && player.energy <= 0.0 {
        player.start_death(tuning.death_duration);
        log::info!("Out of energy");
    }
    if !player.dying && player.pos.y > tuning.death_y {
        player.start_death(tuning.death_duration);
        log::info!("Fell out of the world");
    }

    if player.dying {
        player.death_timer = (player.death_timer - dt).max(0.0);
        if player.death_timer == 0.0 && player.alive {
            player.alive = false;
        }
    }
}
