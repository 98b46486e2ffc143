//! Level streaming: generate ahead of the player, cull behind
//!
//! The level manager owns a layer's canonical entity lists. Generated batches
//! are merged in here (tagged with a fresh section id) and culling is a
//! partition this manager performs; the generator never touches these lists.

use rand::Rng;
use serde::Serialize;

use super::entities::{EntitySet, Platform, SectionId};
use super::generator::{SectionParams, Style, generate_section};
use crate::Tuning;

/// Keep generating until the cursor is this far ahead of the player (units)
pub const LOOKAHEAD_UNITS: f32 = 220.0;
/// Sections ending further than this behind the player are dropped (units)
pub const BACK_BUFFER_UNITS: f32 = 100.0;
/// Maximum retained sections
pub const MAX_SECTIONS: usize = 6;
/// Ground baseline handed to the generator
pub const BASE_GROUND_Y: f32 = 200.0;
/// Generation cursor when a layer has no platforms at all
pub const DEFAULT_CURSOR_X: f32 = 40.0;

/// Bookkeeping for one generated section
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub id: SectionId,
    pub start_x: f32,
    pub end_x: f32,
    pub style: Style,
}

/// Streams sections for one dimension layer
#[derive(Debug, Clone)]
pub struct LevelManager {
    entities: EntitySet,
    /// Ascending by id (and therefore by x)
    sections: Vec<Section>,
    next_section_id: SectionId,
    next_section_start_x: f32,
    next_platform_id: u32,
    last_style: Option<Style>,
    unit: f32,
    hook_radius: f32,
    jump_height: f32,
}

impl LevelManager {
    /// Create a manager seeded with hand-placed starting platforms
    pub fn new(seed_platforms: Vec<Platform>, tuning: &Tuning) -> Self {
        let mut level = Self {
            entities: EntitySet::default(),
            sections: Vec::new(),
            next_section_id: 1,
            next_section_start_x: DEFAULT_CURSOR_X,
            next_platform_id: 1,
            last_style: None,
            unit: tuning.unit,
            hook_radius: tuning.hook_radius,
            jump_height: tuning.jump_height(),
        };
        for mut platform in seed_platforms {
            platform.id = level.allocate_platform_id();
            level.entities.platforms.push(platform);
        }
        level.reset_layout();
        level
    }

    fn allocate_platform_id(&mut self) -> u32 {
        let id = self.next_platform_id;
        self.next_platform_id += 1;
        id
    }

    pub fn entities(&self) -> &EntitySet {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut EntitySet {
        &mut self.entities
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn next_section_start_x(&self) -> f32 {
        self.next_section_start_x
    }

    /// Style of the most recently generated section
    pub fn last_style(&self) -> Option<Style> {
        self.last_style
    }

    /// Per-frame streaming: generate ahead, animate, then cull
    pub fn update<R: Rng + ?Sized>(&mut self, player_x: f32, difficulty: u32, dt: f32, rng: &mut R) {
        self.ensure_ahead(player_x, difficulty, rng);
        self.advance_entities(difficulty, dt);
        self.cull(player_x);
    }

    /// Generate sections until the cursor is a full lookahead past the player.
    /// Returns how many sections were added.
    pub fn ensure_ahead<R: Rng + ?Sized>(&mut self, player_x: f32, difficulty: u32, rng: &mut R) -> usize {
        let lookahead = LOOKAHEAD_UNITS * self.unit;
        let mut generated = 0;
        while self.next_section_start_x < player_x + lookahead {
            self.generate_section(difficulty, rng);
            generated += 1;
        }
        generated
    }

    /// Generate exactly one section at the cursor, merge it, and advance the cursor
    pub fn generate_section<R: Rng + ?Sized>(&mut self, difficulty: u32, rng: &mut R) -> SectionId {
        let params = SectionParams {
            start_x: self.next_section_start_x,
            base_ground_y: BASE_GROUND_Y,
            unit: self.unit,
            difficulty,
            hook_radius: self.hook_radius,
            jump_height: self.jump_height,
        };
        let batch = generate_section(&params, rng);

        let id = self.next_section_id;
        self.next_section_id += 1;

        let EntitySet {
            platforms,
            hazards,
            bonuses,
            boosters,
        } = batch.entities;

        for mut platform in platforms {
            platform.id = self.allocate_platform_id();
            platform.section = id;
            self.entities.platforms.push(platform);
        }
        self.entities
            .hazards
            .extend(hazards.into_iter().map(|mut h| {
                h.section = id;
                h
            }));
        self.entities
            .bonuses
            .extend(bonuses.into_iter().map(|mut b| {
                b.section = id;
                b
            }));
        self.entities
            .boosters
            .extend(boosters.into_iter().map(|mut b| {
                b.section = id;
                b
            }));

        self.sections.push(Section {
            id,
            start_x: batch.start_x,
            end_x: batch.end_x,
            style: batch.style,
        });
        self.next_section_start_x = batch.end_x;
        self.last_style = Some(batch.style);

        log::debug!(
            "Section {} ({}) spans [{:.0}, {:.0})",
            id,
            batch.style.as_str(),
            batch.start_x,
            batch.end_x
        );
        id
    }

    /// Move platforms, blink lasers and spin saws
    pub fn advance_entities(&mut self, difficulty: u32, dt: f32) {
        for platform in &mut self.entities.platforms {
            platform.advance(dt);
        }
        let laser_rate = 1.5 + difficulty as f32 * 0.4;
        for hazard in &mut self.entities.hazards {
            hazard.advance(dt, laser_rate);
        }
    }

    /// Drop the oldest sections while they are too far behind or too many.
    /// Returns how many sections were removed.
    pub fn cull(&mut self, player_x: f32) -> usize {
        let back_buffer = BACK_BUFFER_UNITS * self.unit;
        let mut removed = 0;
        while let Some(first) = self.sections.first() {
            let too_far_behind = first.end_x < player_x - back_buffer;
            let too_many = self.sections.len() > MAX_SECTIONS;
            if !too_far_behind && !too_many {
                break;
            }
            let section = self.sections.remove(0);
            self.entities.remove_section(section.id);
            log::debug!("Culled section {} (ended at {:.0})", section.id, section.end_x);
            removed += 1;
        }
        removed
    }

    /// Forget all section bookkeeping and re-seed the cursor from the
    /// rightmost existing platform edge. Section ids keep counting so tags
    /// left on surviving entities never match a new section.
    pub fn reset_layout(&mut self) {
        self.sections.clear();
        self.next_section_start_x = self
            .entities
            .platforms
            .iter()
            .map(|p| p.rect.right())
            .reduce(f32::max)
            .unwrap_or(DEFAULT_CURSOR_X);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::UNIT;
    use crate::sim::entities::{PlatformKind, SEED_SECTION};
    use crate::sim::rect::Rect;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn seeded() -> LevelManager {
        let seed = vec![Platform::new(
            Rect::new(40.0, 200.0, 400.0, 40.0),
            PlatformKind::Static,
        )];
        LevelManager::new(seed, &Tuning::default())
    }

    #[test]
    fn test_cursor_seeded_from_platforms() {
        let level = seeded();
        assert_eq!(level.next_section_start_x(), 440.0);
        assert!(level.sections().is_empty());
        assert_eq!(level.entities().platforms[0].section, SEED_SECTION);
    }

    #[test]
    fn test_cursor_defaults_without_platforms() {
        let level = LevelManager::new(Vec::new(), &Tuning::default());
        assert_eq!(level.next_section_start_x(), DEFAULT_CURSOR_X);
    }

    #[test]
    fn test_generate_advances_cursor_to_section_end() {
        let mut level = seeded();
        let mut rng = Pcg32::seed_from_u64(11);
        let id = level.generate_section(0, &mut rng);
        let section = level.sections().last().expect("section recorded");
        assert_eq!(section.id, id);
        assert_eq!(section.start_x, 440.0);
        assert_eq!(level.next_section_start_x(), section.end_x);
        assert_eq!(level.last_style(), Some(section.style));
    }

    #[test]
    fn test_ensure_ahead_reaches_lookahead() {
        let mut level = seeded();
        let mut rng = Pcg32::seed_from_u64(12);
        let player_x = 140.0;
        let n = level.ensure_ahead(player_x, 0, &mut rng);
        assert!(n >= 1);
        assert!(level.next_section_start_x() >= player_x + LOOKAHEAD_UNITS * UNIT);
        // Second call is a no-op
        assert_eq!(level.ensure_ahead(player_x, 0, &mut rng), 0);
    }

    #[test]
    fn test_sections_ascending_and_entities_tagged() {
        let mut level = seeded();
        let mut rng = Pcg32::seed_from_u64(13);
        for _ in 0..4 {
            level.generate_section(1, &mut rng);
        }
        let ids: Vec<_> = level.sections().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        for pair in level.sections().windows(2) {
            assert_eq!(pair[0].end_x, pair[1].start_x);
        }
        let known = |id: SectionId| id == SEED_SECTION || ids.contains(&id);
        let e = level.entities();
        assert!(e.platforms.iter().all(|p| known(p.section)));
        assert!(e.hazards.iter().all(|h| known(h.section)));
        assert!(e.bonuses.iter().all(|b| known(b.section)));
        assert!(e.boosters.iter().all(|b| known(b.section)));
    }

    #[test]
    fn test_platform_ids_unique() {
        let mut level = seeded();
        let mut rng = Pcg32::seed_from_u64(14);
        level.generate_section(0, &mut rng);
        level.generate_section(0, &mut rng);
        let mut ids: Vec<u32> = level.entities().platforms.iter().map(|p| p.id).collect();
        let n = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), n);
        assert!(!ids.contains(&0));
    }

    #[test]
    fn test_cull_caps_section_count_with_stationary_player() {
        let mut level = seeded();
        let mut rng = Pcg32::seed_from_u64(15);
        for _ in 0..9 {
            level.generate_section(0, &mut rng);
        }
        assert_eq!(level.sections().len(), 9);

        let removed = level.cull(140.0);
        assert_eq!(removed, 3);
        assert_eq!(level.sections().len(), MAX_SECTIONS);
        assert_eq!(level.sections()[0].id, 4);
        for culled in 1..=3 {
            assert!(!level.entities().has_section(culled));
        }
        // Seed platform survives culling
        assert!(level.entities().has_section(SEED_SECTION));
    }

    #[test]
    fn test_cull_drops_sections_far_behind() {
        let mut level = seeded();
        let mut rng = Pcg32::seed_from_u64(16);
        level.generate_section(0, &mut rng);
        level.generate_section(0, &mut rng);
        let first_end = level.sections()[0].end_x;

        // Just inside the back buffer: kept
        level.cull(first_end + BACK_BUFFER_UNITS * UNIT - 1.0);
        assert_eq!(level.sections().len(), 2);

        // Past the back buffer: dropped
        level.cull(first_end + BACK_BUFFER_UNITS * UNIT + 1.0);
        assert_eq!(level.sections().len(), 1);
        assert_eq!(level.sections()[0].id, 2);
    }

    #[test]
    fn test_reset_layout_reseeds_cursor() {
        let mut level = seeded();
        let mut rng = Pcg32::seed_from_u64(17);
        level.generate_section(0, &mut rng);
        let rightmost = level
            .entities()
            .platforms
            .iter()
            .map(|p| p.rect.right())
            .fold(f32::MIN, f32::max);
        level.reset_layout();
        assert!(level.sections().is_empty());
        assert_eq!(level.next_section_start_x(), rightmost);
    }

    #[test]
    fn test_reset_layout_keeps_section_ids_unique() {
        let mut level = seeded();
        let mut rng = Pcg32::seed_from_u64(17);
        let first = level.generate_section(0, &mut rng);
        assert_eq!(first, 1);
        level.reset_layout();
        let second = level.generate_section(0, &mut rng);
        assert_eq!(second, 2);
        assert_eq!(level.sections().len(), 1);
        assert_eq!(level.sections()[0].id, 2);
    }

    #[test]
    fn test_update_advances_lasers() {
        use crate::sim::entities::{Hazard, HazardKind};
        let mut level = seeded();
        level
            .entities_mut()
            .hazards
            .push(Hazard::new(Rect::default(), HazardKind::Laser { phase: 0.0 }));
        level.advance_entities(0, 1.0);
        match level.entities().hazards[0].kind {
            HazardKind::Laser { phase } => assert!((phase - 1.5).abs() < 1e-5),
            _ => unreachable!(),
        }
        level.advance_entities(2, 1.0);
        match level.entities().hazards[0].kind {
            HazardKind::Laser { phase } => assert!((phase - (1.5 + 2.3)).abs() < 1e-4),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_update_spins_saws() {
        use crate::sim::entities::{Hazard, HazardKind};
        let mut level = seeded();
        level
            .entities_mut()
            .hazards
            .push(Hazard::new(Rect::default(), HazardKind::Saw { spin: 0.0 }));
        level.advance_entities(3, 0.1);
        match level.entities().hazards[0].kind {
            HazardKind::Saw { spin } => assert!((spin - 0.6).abs() < 1e-5),
            _ => unreachable!(),
        }
    }
}
