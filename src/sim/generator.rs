//! Procedural section generation
//!
//! Builds one horizontal slice of the level: a stack of 8-12 platform layers
//! swept left to right into platforms and gaps, decorated with hazards, score
//! items and boosters, plus an optional moving platform. Hook nodes are
//! planned last, once every platform of the section exists.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entities::{
    Bonus, Booster, BoosterKind, EntitySet, Hazard, HazardKind, Platform, PlatformKind,
};
use super::planner::plan_hook_nodes;
use super::rect::Rect;
use crate::{chance, rand_range, rand_units};

/// Nominal section length range in units (before style bias)
pub const SECTION_MIN_UNITS: f32 = 200.0;
pub const SECTION_MAX_UNITS: f32 = 300.0;

/// Vertical layer spacing in units
pub const LAYER_SPACING_UNITS: f32 = 4.0;
/// Vertical jitter of non-ground layers (± units)
pub const LAYER_JITTER_UNITS: f32 = 0.4;

/// Segment width range in units
pub const SEGMENT_MIN_UNITS: f32 = 10.0;
pub const SEGMENT_MAX_UNITS: f32 = 22.0;

/// Gap chance bounds
pub const GAP_CHANCE_MIN: f32 = 0.05;
pub const GAP_CHANCE_MAX: f32 = 0.45;

/// Platform variant chances on non-ground layers (trap wins over thin)
pub const THIN_CHANCE: f32 = 0.18;
pub const TRAP_CHANCE: f32 = 0.25;

/// Obstacle density bounds
pub const OBSTACLE_DENSITY_MIN: f32 = 0.15;
pub const OBSTACLE_DENSITY_MAX: f32 = 0.85;

/// Booster chances on static platforms (cumulative thresholds)
pub const JUMP_BOOSTER_CHANCE: f32 = 0.06;
pub const SPEED_BOOSTER_CHANCE: f32 = 0.12;

/// Score items per section, regardless of per-roll odds
pub const MAX_BONUSES_PER_SECTION: usize = 18;

/// Platform heights (px)
const GROUND_HEIGHT: f32 = 40.0;
const PLATFORM_HEIGHT: f32 = 32.0;
const THIN_HEIGHT: f32 = 8.0;

const SAW_RADIUS: f32 = 14.0;

/// Generation preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Style {
    Factory,
    Station,
    Digital,
}

impl Style {
    pub const ALL: [Style; 3] = [Style::Factory, Style::Station, Style::Digital];

    pub fn as_str(&self) -> &'static str {
        match self {
            Style::Factory => "factory",
            Style::Station => "station",
            Style::Digital => "digital",
        }
    }

    fn index(self) -> usize {
        match self {
            Style::Factory => 0,
            Style::Station => 1,
            Style::Digital => 2,
        }
    }

    /// `difficulty mod 3`, advanced to the next style 35% of the time
    pub fn pick<R: Rng + ?Sized>(difficulty: u32, rng: &mut R) -> Self {
        let mut index = difficulty as usize % Self::ALL.len();
        if chance(rng, 0.35) {
            index = (index + 1) % Self::ALL.len();
        }
        Self::ALL[index]
    }

    /// Shift applied to the section length range (units)
    pub fn length_bias(&self) -> f32 {
        match self {
            Style::Factory => 20.0,
            Style::Station => -10.0,
            Style::Digital => 40.0,
        }
    }

    pub fn obstacle_bias(&self) -> f32 {
        match self {
            Style::Factory => 0.15,
            Style::Station => 0.05,
            Style::Digital => 0.2,
        }
    }

    /// Ground baseline jitter range (px)
    fn ground_jitter(&self) -> (f32, f32) {
        match self {
            Style::Factory => (-10.0, 10.0),
            Style::Station => (-5.0, 5.0),
            Style::Digital => (-20.0, 0.0),
        }
    }

    fn moving_bias(&self) -> f32 {
        match self {
            Style::Factory => 0.1,
            Style::Station => 0.0,
            Style::Digital => 0.05,
        }
    }

    fn moving_speed_bonus(&self) -> f32 {
        match self {
            Style::Digital => 10.0,
            _ => 0.0,
        }
    }

    fn obstacles(&self) -> &'static ObstacleProfile {
        &OBSTACLE_PROFILES[self.index()]
    }
}

/// Score value roll: `high` with probability `p_high`, else `low`
#[derive(Debug, Clone, Copy)]
struct ValueRoll {
    p_high: f32,
    high: u32,
    low: u32,
}

impl ValueRoll {
    const fn new(p_high: f32, high: u32, low: u32) -> Self {
        Self { p_high, high, low }
    }

    fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        if chance(rng, self.p_high) {
            self.high
        } else {
            self.low
        }
    }
}

/// Style-specific hazard mix and attached-reward odds
#[derive(Debug)]
struct ObstacleProfile {
    /// choice < spikes_cut -> spikes
    spikes_cut: f32,
    /// choice < laser_cut -> laser, else mid-air bonus
    laser_cut: f32,
    spike_bonus: f32,
    spike_value: ValueRoll,
    laser_bonus: f32,
    laser_value: ValueRoll,
    /// Grapple booster near spikes or lasers
    hazard_grapple: f32,
    /// Raise the laser base above the layer (units)
    laser_lift: Option<(f32, f32)>,
    /// Mid-air bonus chance (ground layer, upper layers)
    air_bonus: (f32, f32),
    /// Mid-air bonus height above the layer (units)
    air_height: (f32, f32),
    air_value: ValueRoll,
}

const OBSTACLE_PROFILES: [ObstacleProfile; 3] = [
    // Factory: spikes and lasers
    ObstacleProfile {
        spikes_cut: 0.5,
        laser_cut: 0.85,
        spike_bonus: 0.6,
        spike_value: ValueRoll::new(0.5, 10, 5),
        laser_bonus: 0.5,
        laser_value: ValueRoll::new(0.5, 10, 5),
        hazard_grapple: 0.06,
        laser_lift: None,
        air_bonus: (0.05, 0.15),
        air_height: (0.5, 2.0),
        air_value: ValueRoll::new(0.0, 5, 5),
    },
    // Station: safer, more bonuses
    ObstacleProfile {
        spikes_cut: 0.3,
        laser_cut: 0.6,
        spike_bonus: 0.4,
        spike_value: ValueRoll::new(0.6, 10, 5),
        laser_bonus: 0.35,
        laser_value: ValueRoll::new(0.5, 10, 5),
        hazard_grapple: 0.05,
        laser_lift: None,
        air_bonus: (0.08, 0.18),
        air_height: (0.5, 2.5),
        air_value: ValueRoll::new(0.0, 5, 5),
    },
    // Digital: lasers and airborne bonuses
    ObstacleProfile {
        spikes_cut: 0.35,
        laser_cut: 0.8,
        spike_bonus: 0.55,
        spike_value: ValueRoll::new(0.4, 20, 10),
        laser_bonus: 0.6,
        laser_value: ValueRoll::new(0.5, 10, 5),
        hazard_grapple: 0.07,
        laser_lift: Some((0.5, 2.0)),
        air_bonus: (0.06, 0.2),
        air_height: (1.0, 3.0),
        air_value: ValueRoll::new(0.4, 20, 10),
    },
];

/// Inputs for one section
#[derive(Debug, Clone, Copy)]
pub struct SectionParams {
    pub start_x: f32,
    pub base_ground_y: f32,
    pub unit: f32,
    pub difficulty: u32,
    pub hook_radius: f32,
    pub jump_height: f32,
}

/// A freshly generated section, not yet tagged or merged
#[derive(Debug, Clone)]
pub struct SectionBatch {
    pub style: Style,
    pub start_x: f32,
    pub end_x: f32,
    pub length_units: u32,
    pub entities: EntitySet,
}

/// Running state of one generation pass
struct Builder<'a, R: Rng + ?Sized> {
    rng: &'a mut R,
    unit: f32,
    out: EntitySet,
}

impl<R: Rng + ?Sized> Builder<'_, R> {
    fn bonus_room(&self) -> bool {
        self.out.bonuses.len() < MAX_BONUSES_PER_SECTION
    }

    /// Random x inside a platform, keeping `margin` (fraction of width) from both ends
    fn x_within(&mut self, platform: &Rect, margin: f32) -> f32 {
        let m = platform.width * margin;
        platform.x + rand_range(self.rng, m, platform.width - m)
    }

    fn add_spikes(&mut self, platform: &Rect) -> Rect {
        let w = platform.width;
        let spike_width = w * rand_range(self.rng, 0.3, 0.5);
        let margin = w * 0.1;
        let x = platform.x + rand_range(self.rng, margin, w - spike_width - margin);
        let rect = Rect::new(x, platform.y - 10.0, spike_width, 10.0);
        self.out.hazards.push(Hazard::new(rect, HazardKind::Spikes));
        rect
    }

    fn add_laser(&mut self, platform: &Rect, base_y: f32) -> Rect {
        let lx = self.x_within(platform, 0.2);
        let height = rand_range(self.rng, 80.0, 140.0);
        let rect = Rect::new(lx - 4.0, base_y - height, 8.0, height);
        let phase = rand_range(self.rng, 0.0, std::f32::consts::TAU);
        self.out
            .hazards
            .push(Hazard::new(rect, HazardKind::Laser { phase }));
        rect
    }

    fn add_saw(&mut self, platform: &Rect) -> Rect {
        let cx = self.x_within(platform, 0.2);
        let cy = platform.y - 18.0;
        let rect = Rect::new(cx - SAW_RADIUS, cy - SAW_RADIUS, SAW_RADIUS * 2.0, SAW_RADIUS * 2.0);
        let spin = rand_range(self.rng, 0.0, std::f32::consts::TAU);
        self.out.hazards.push(Hazard::new(rect, HazardKind::Saw { spin }));
        rect
    }

    fn add_jump_booster(&mut self, platform: &Rect) {
        let bx = self.x_within(platform, 0.2);
        let by = platform.y - 4.0;
        let u = self.unit;
        self.out.boosters.push(Booster::new(
            Rect::new(bx - u * 0.4, by - 8.0, u * 0.8, 12.0),
            BoosterKind::Jump,
        ));
    }

    fn add_speed_booster(&mut self, platform: &Rect) {
        let bx = self.x_within(platform, 0.2);
        let by = platform.y - 6.0;
        let u = self.unit;
        self.out.boosters.push(Booster::new(
            Rect::new(bx - u * 0.5, by - 4.0, u, 8.0),
            BoosterKind::Speed,
        ));
    }

    fn add_grapple_booster(&mut self, x: f32, y: f32) {
        let u = self.unit;
        self.out.boosters.push(Booster::new(
            Rect::new(x - u * 0.4, y - 8.0, u * 0.8, 16.0),
            BoosterKind::Grapple,
        ));
    }

    fn add_grapple_booster_near(&mut self, hazard: &Rect) {
        let lift = self.unit * rand_range(self.rng, 0.6, 1.4);
        self.add_grapple_booster(hazard.x + hazard.width / 2.0, hazard.y - lift);
    }

    fn add_bonus_near(&mut self, hazard: &Rect, value: u32) {
        let lift = self.unit * rand_range(self.rng, 0.5, 1.2);
        self.out
            .bonuses
            .push(Bonus::at(hazard.x + hazard.width / 2.0, hazard.y - lift, value));
    }

    fn add_bonus_on(&mut self, platform: &Rect, target_y: f32, value: u32) {
        let bx = self.x_within(platform, 0.2);
        self.out.bonuses.push(Bonus::at(bx, target_y, value));
    }

    /// Hazard attached to a non-trap platform, with its style-tuned rewards
    fn decorate_obstacle(&mut self, style: Style, platform: &Rect, layer_y: f32, is_ground: bool) {
        let profile = style.obstacles();
        let choice: f32 = self.rng.random();

        if choice < profile.spikes_cut {
            let spikes = self.add_spikes(platform);
            if self.bonus_room() && chance(self.rng, profile.spike_bonus) {
                let value = profile.spike_value.roll(self.rng);
                self.add_bonus_near(&spikes, value);
            }
            if chance(self.rng, profile.hazard_grapple) {
                self.add_grapple_booster_near(&spikes);
            }
        } else if choice < profile.laser_cut {
            let base_y = match profile.laser_lift {
                Some((lo, hi)) => layer_y - rand_range(self.rng, self.unit * lo, self.unit * hi),
                None => layer_y,
            };
            let laser = self.add_laser(platform, base_y);
            if self.bonus_room() && chance(self.rng, profile.laser_bonus) {
                let value = profile.laser_value.roll(self.rng);
                self.add_bonus_near(&laser, value);
            }
            if chance(self.rng, profile.hazard_grapple) {
                self.add_grapple_booster_near(&laser);
            }
        } else {
            let p = if is_ground {
                profile.air_bonus.0
            } else {
                profile.air_bonus.1
            };
            if self.bonus_room() && chance(self.rng, p) {
                let value = profile.air_value.roll(self.rng);
                let (lo, hi) = profile.air_height;
                let target_y = layer_y - rand_range(self.rng, self.unit * lo, self.unit * hi);
                self.add_bonus_on(platform, target_y, value);
            }
        }
    }
}

/// Generate one section starting at `params.start_x`
pub fn generate_section<R: Rng + ?Sized>(params: &SectionParams, rng: &mut R) -> SectionBatch {
    let unit = params.unit;
    let difficulty = params.difficulty;
    let d = difficulty as f32;

    let style = Style::pick(difficulty, rng);
    let length_units = rand_units(
        rng,
        SECTION_MIN_UNITS + style.length_bias(),
        SECTION_MAX_UNITS + style.length_bias(),
    );
    let length_px = length_units as f32 * unit;
    let start_x = params.start_x;
    let end_x = start_x + length_px;

    let mut b = Builder {
        rng,
        unit,
        out: EntitySet::default(),
    };

    let (jitter_lo, jitter_hi) = style.ground_jitter();
    let ground_y = params.base_ground_y + rand_range(b.rng, jitter_lo, jitter_hi);

    // Layer baselines, ground first, climbing upward (-y)
    let layer_count = rand_units(b.rng, 8.0, 13.0) as usize;
    let spacing = LAYER_SPACING_UNITS * unit;
    let jitter = LAYER_JITTER_UNITS * unit;
    let layers: Vec<f32> = (0..layer_count)
        .map(|i| {
            let base = ground_y - i as f32 * spacing;
            if i > 0 {
                base + rand_range(b.rng, -jitter, jitter)
            } else {
                base
            }
        })
        .collect();

    let base_gap_chance = 0.05 + d * 0.02 + style.obstacle_bias() * 0.2;

    for (li, &layer_y) in layers.iter().enumerate() {
        let is_ground = li == 0;
        let layer_bonus = if is_ground { 0.0 } else { 0.03 * li as f32 };
        let gap_chance = (base_gap_chance + layer_bonus).clamp(GAP_CHANCE_MIN, GAP_CHANCE_MAX);
        let obstacle_density = (0.2 + d * 0.1 + style.obstacle_bias() + li as f32 * 0.03)
            .clamp(OBSTACLE_DENSITY_MIN, OBSTACLE_DENSITY_MAX);

        let mut x = start_x;
        while x < end_x {
            let make_gap = chance(b.rng, gap_chance);
            let seg_width = rand_units(b.rng, SEGMENT_MIN_UNITS, SEGMENT_MAX_UNITS) as f32 * unit;

            if !make_gap {
                let mut kind = PlatformKind::Static;
                if !is_ground && chance(b.rng, THIN_CHANCE) {
                    kind = PlatformKind::Thin;
                }
                if !is_ground && chance(b.rng, TRAP_CHANCE) {
                    kind = PlatformKind::Trap;
                }
                let height = match (is_ground, kind) {
                    (true, _) => GROUND_HEIGHT,
                    (false, PlatformKind::Thin) => THIN_HEIGHT,
                    _ => PLATFORM_HEIGHT,
                };
                let rect = Rect::new(x, layer_y, seg_width, height);
                b.out.platforms.push(Platform::new(rect, kind));

                if kind == PlatformKind::Trap {
                    let saw = b.add_saw(&rect);
                    if b.bonus_room() && chance(b.rng, 0.8) {
                        let value = ValueRoll::new(0.4, 20, 10).roll(b.rng);
                        b.add_bonus_near(&saw, value);
                    }
                    if chance(b.rng, 0.08) {
                        b.add_grapple_booster_near(&saw);
                    }
                } else if chance(b.rng, obstacle_density) {
                    b.decorate_obstacle(style, &rect, layer_y, is_ground);
                }

                if kind == PlatformKind::Static {
                    let r: f32 = b.rng.random();
                    if r < JUMP_BOOSTER_CHANCE {
                        b.add_jump_booster(&rect);
                    } else if r < SPEED_BOOSTER_CHANCE {
                        b.add_speed_booster(&rect);
                    } else if b.bonus_room() && r < 0.15 && chance(b.rng, 0.25) {
                        let target_y = rect.y - rand_range(b.rng, unit * 0.5, unit * 1.5);
                        b.add_bonus_on(&rect, target_y, 5);
                    }
                }
            }

            x += seg_width;
            if make_gap {
                let gap_width = rand_units(b.rng, 6.0, 12.0 + d * 2.0) as f32 * unit;
                let mid_x = x + gap_width / 2.0;
                x += gap_width;

                if b.bonus_room() && chance(b.rng, 0.25) && gap_width > unit * 4.0 {
                    let jh = params.jump_height;
                    let mid_y = layer_y - rand_range(b.rng, jh * 0.3, jh * 0.8);
                    let value = ValueRoll::new(0.3, 20, 10).roll(b.rng);
                    b.out.bonuses.push(Bonus::at(mid_x, mid_y, value));
                }

                if chance(b.rng, 0.06) && gap_width > unit * 6.0 {
                    let jh = params.jump_height;
                    let mid_y = layer_y - rand_range(b.rng, jh * 0.4, jh * 0.9);
                    b.add_grapple_booster(mid_x, mid_y);
                }
            }
        }
    }

    // One elevated moving platform on a middle/upper layer
    let moving_chance = (0.25 + d * 0.05 + style.moving_bias()).clamp(0.2, 0.8);
    if chance(b.rng, moving_chance) {
        let width = rand_units(b.rng, 8.0, 14.0) as f32 * unit;
        let px = start_x
            + rand_range(
                b.rng,
                unit * 4.0,
                (unit * 8.0).max(length_px - width - unit * 4.0),
            );
        let min_layer = (layer_count / 3).max(1) as f32;
        let layer_index = rand_range(b.rng, min_layer, layer_count as f32).floor() as usize;
        let py = layers[layer_index.min(layer_count - 1)]
            - rand_range(b.rng, unit * 0.5, unit * 1.5);
        let range = unit * rand_range(b.rng, 6.0, 14.0);
        let speed = 30.0 + d * 20.0 + style.moving_speed_bonus();
        let dir = if chance(b.rng, 0.5) { -1.0 } else { 1.0 };

        b.out.platforms.push(Platform::new(
            Rect::new(px, py, width, PLATFORM_HEIGHT),
            PlatformKind::Moving {
                dir,
                range,
                origin_x: px,
                speed,
            },
        ));
    }

    let Builder { rng, out: mut entities, .. } = b;

    if params.hook_radius > 0.0 && params.jump_height > 0.0 {
        plan_hook_nodes(
            &mut entities.platforms,
            params.hook_radius,
            params.jump_height,
            unit,
            rng,
        );
    }

    log::debug!(
        "Generated {} section [{:.0}, {:.0}): {} layers, {} platforms, {} hazards, {} bonuses, {} boosters",
        style.as_str(),
        start_x,
        end_x,
        layer_count,
        entities.platforms.len(),
        entities.hazards.len(),
        entities.bonuses.len(),
        entities.boosters.len()
    );

    SectionBatch {
        style,
        start_x,
        end_x,
        length_units,
        entities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn params(start_x: f32, difficulty: u32) -> SectionParams {
        SectionParams {
            start_x,
            base_ground_y: 200.0,
            unit: UNIT,
            difficulty,
            hook_radius: HOOK_RADIUS,
            jump_height: JUMP_HEIGHT_UNITS * UNIT,
        }
    }

    #[test]
    fn test_section_span_matches_length() {
        let mut rng = Pcg32::seed_from_u64(1);
        let batch = generate_section(&params(440.0, 0), &mut rng);
        let expected = batch.length_units as f32 * UNIT;
        assert!((batch.end_x - batch.start_x - expected).abs() < 0.01);
        assert_eq!(batch.start_x, 440.0);
        // Style-shifted nominal range
        let bias = batch.style.length_bias();
        assert!(batch.length_units as f32 >= SECTION_MIN_UNITS + bias);
        assert!((batch.length_units as f32) < SECTION_MAX_UNITS + bias);
    }

    #[test]
    fn test_every_trap_has_a_saw() {
        let mut rng = Pcg32::seed_from_u64(42);
        for difficulty in 0..4 {
            let batch = generate_section(&params(0.0, difficulty), &mut rng);
            for trap in batch
                .entities
                .platforms
                .iter()
                .filter(|p| p.kind == PlatformKind::Trap)
            {
                let has_saw = batch.entities.hazards.iter().any(|h| {
                    h.is_saw()
                        && h.rect.center().x >= trap.rect.left()
                        && h.rect.center().x <= trap.rect.right()
                        && (h.rect.center().y - (trap.rect.y - 18.0)).abs() < 0.01
                });
                assert!(has_saw, "trap at x={} has no saw", trap.rect.x);
            }
        }
    }

    #[test]
    fn test_ground_layer_is_plain() {
        let mut rng = Pcg32::seed_from_u64(3);
        let batch = generate_section(&params(0.0, 0), &mut rng);
        // The lowest (largest y) static platforms form the ground layer
        let ground_y = batch
            .entities
            .platforms
            .iter()
            .filter(|p| !p.is_hook_node())
            .map(|p| p.rect.y)
            .fold(f32::MIN, f32::max);
        for p in batch
            .entities
            .platforms
            .iter()
            .filter(|p| (p.rect.y - ground_y).abs() < 0.01)
        {
            assert_eq!(p.kind, PlatformKind::Static);
            assert_eq!(p.rect.height, 40.0);
        }
    }

    #[test]
    fn test_style_pick_follows_difficulty() {
        let mut rng = Pcg32::seed_from_u64(9);
        for difficulty in 0..6u32 {
            let base = Style::ALL[difficulty as usize % 3];
            let next = Style::ALL[(difficulty as usize + 1) % 3];
            for _ in 0..20 {
                let s = Style::pick(difficulty, &mut rng);
                assert!(s == base || s == next);
            }
        }
    }

    #[test]
    fn test_at_most_one_moving_platform() {
        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..10 {
            let batch = generate_section(&params(0.0, 2), &mut rng);
            let moving = batch
                .entities
                .platforms
                .iter()
                .filter(|p| matches!(p.kind, PlatformKind::Moving { .. }))
                .count();
            assert!(moving <= 1);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_bonus_cap(seed in any::<u64>(), difficulty in 0u32..8) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let batch = generate_section(&params(0.0, difficulty), &mut rng);
            prop_assert!(batch.entities.bonuses.len() <= MAX_BONUSES_PER_SECTION);
        }

        #[test]
        fn prop_platforms_start_inside_section(seed in any::<u64>(), start in 0.0f32..100_000.0) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let batch = generate_section(&params(start, 1), &mut rng);
            for p in batch.entities.platforms.iter().filter(|p| !p.is_hook_node()) {
                prop_assert!(p.rect.x >= batch.start_x);
                prop_assert!(p.rect.x < batch.end_x);
            }
        }
    }
}
