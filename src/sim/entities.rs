//! Level entity types
//!
//! Each entity category is a tagged variant carrying exactly the fields its
//! kind needs. Every entity is tagged with the section that produced it so the
//! level manager can drop whole sections at once.

use serde::{Deserialize, Serialize};

use super::rect::Rect;

/// Section identifier (monotonically increasing per layer)
pub type SectionId = u32;

/// Section id reserved for the hand-placed starting platforms. Never culled.
pub const SEED_SECTION: SectionId = 0;

/// Laser is lethal while `sin(phase)` exceeds this
pub const LASER_ACTIVE_THRESHOLD: f32 = 0.2;

/// Visual spin rate of saws (rad/s)
pub const SAW_SPIN_RATE: f32 = 6.0;

/// Platform variants
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PlatformKind {
    #[default]
    Static,
    /// One-way platform the player can drop through
    Thin,
    /// Always carries a saw
    Trap,
    /// Oscillates horizontally around `origin_x`
    Moving {
        dir: f32,
        range: f32,
        origin_x: f32,
        speed: f32,
    },
    /// Grapple-only attachment point, never collides
    HookNode,
}

/// A platform entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    /// Stable id within a layer (0 until the level manager assigns one)
    pub id: u32,
    pub section: SectionId,
    pub rect: Rect,
    pub kind: PlatformKind,
    pub hookable: bool,
}

impl Platform {
    pub fn new(rect: Rect, kind: PlatformKind) -> Self {
        Self {
            id: 0,
            section: SEED_SECTION,
            rect,
            kind,
            hookable: true,
        }
    }

    pub fn is_hook_node(&self) -> bool {
        self.kind == PlatformKind::HookNode
    }

    pub fn is_thin(&self) -> bool {
        self.kind == PlatformKind::Thin
    }

    /// Whether the player can stand on this platform
    pub fn collides(&self) -> bool {
        !self.is_hook_node()
    }

    /// Advance a moving platform, reflecting at `origin_x ± range`
    pub fn advance(&mut self, dt: f32) {
        if let PlatformKind::Moving {
            ref mut dir,
            range,
            origin_x,
            speed,
        } = self.kind
        {
            self.rect.x += *dir * speed * dt;
            if self.rect.x > origin_x + range {
                self.rect.x = origin_x + range;
                *dir = -1.0;
            } else if self.rect.x < origin_x - range {
                self.rect.x = origin_x - range;
                *dir = 1.0;
            }
        }
    }
}

/// Hazard variants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HazardKind {
    Spikes,
    /// Blinks on and off sinusoidally
    Laser { phase: f32 },
    /// Circular blade; hit-tested by its bounding box
    Saw { spin: f32 },
}

/// A hazard entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hazard {
    pub section: SectionId,
    pub rect: Rect,
    pub kind: HazardKind,
}

impl Hazard {
    pub fn new(rect: Rect, kind: HazardKind) -> Self {
        Self {
            section: SEED_SECTION,
            rect,
            kind,
        }
    }

    /// Whether touching this hazard hurts right now
    pub fn is_active(&self) -> bool {
        match self.kind {
            HazardKind::Laser { phase } => phase.sin() > LASER_ACTIVE_THRESHOLD,
            HazardKind::Spikes | HazardKind::Saw { .. } => true,
        }
    }

    pub fn is_saw(&self) -> bool {
        matches!(self.kind, HazardKind::Saw { .. })
    }

    /// Advance laser blinking at `laser_rate` and saw spin at a fixed rate
    pub fn advance(&mut self, dt: f32, laser_rate: f32) {
        match self.kind {
            HazardKind::Laser { ref mut phase } => *phase += dt * laser_rate,
            HazardKind::Saw { ref mut spin } => *spin = (*spin + dt * SAW_SPIN_RATE) % std::f32::consts::TAU,
            HazardKind::Spikes => {}
        }
    }
}

/// A score pickup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bonus {
    pub section: SectionId,
    pub rect: Rect,
    pub value: u32,
    pub collected: bool,
}

impl Bonus {
    /// Standard 16×16 score item centered on `(cx, cy)`
    pub fn at(cx: f32, cy: f32, value: u32) -> Self {
        Self {
            section: SEED_SECTION,
            rect: Rect::new(cx - 8.0, cy - 8.0, 16.0, 16.0),
            value,
            collected: false,
        }
    }
}

/// Booster variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoosterKind {
    /// Spring launch
    Jump,
    /// Temporary run speed multiplier
    Speed,
    /// +1 grapple pull charge
    Grapple,
}

/// A booster pad / pickup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booster {
    pub section: SectionId,
    pub rect: Rect,
    pub kind: BoosterKind,
    /// Player overlapped it last frame; effects fire on entry only
    #[serde(default)]
    pub touching: bool,
}

impl Booster {
    pub fn new(rect: Rect, kind: BoosterKind) -> Self {
        Self {
            section: SEED_SECTION,
            rect,
            kind,
            touching: false,
        }
    }

    /// Record overlap for this frame. Returns true on the frame of entry.
    pub fn enter(&mut self, overlapping: bool) -> bool {
        let entered = overlapping && !self.touching;
        self.touching = overlapping;
        entered
    }
}

/// The entity lists of one dimension layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntitySet {
    pub platforms: Vec<Platform>,
    pub hazards: Vec<Hazard>,
    pub bonuses: Vec<Bonus>,
    pub boosters: Vec<Booster>,
}

impl EntitySet {
    /// Drop every entity tagged with `section`
    pub fn remove_section(&mut self, section: SectionId) {
        self.platforms.retain(|p| p.section != section);
        self.hazards.retain(|h| h.section != section);
        self.bonuses.retain(|b| b.section != section);
        self.boosters.retain(|b| b.section != section);
    }

    /// Whether any entity still carries `section`
    pub fn has_section(&self, section: SectionId) -> bool {
        self.platforms.iter().any(|p| p.section == section)
            || self.hazards.iter().any(|h| h.section == section)
            || self.bonuses.iter().any(|b| b.section == section)
            || self.boosters.iter().any(|b| b.section == section)
    }
}
