//! Rift Runner - An endless dual-dimension grappling platformer
//!
//! Core modules:
//! - `sim`: Simulation core (level generation, player physics, world orchestration)
//! - `tuning`: Data-driven game balance

pub mod sim;
pub mod tuning;

pub use tuning::{Tuning, TuningError};

use rand::Rng;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, driven by the host loop)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Largest wall-clock delta accepted per frame (spiral-of-death guard)
    pub const MAX_FRAME_DT: f32 = 1.0 / 30.0;
    /// Maximum substeps per frame
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Virtual "game unit" in pixels
    pub const UNIT: f32 = 48.0;
    /// Gravity (px/s²), +y points down
    pub const GRAVITY: f32 = 1200.0;

    /// Run speeds (4 and 6 units/sec)
    pub const RUN_SPEED_BASE: f32 = 4.0 * UNIT;
    pub const RUN_SPEED_MAX: f32 = 6.0 * UNIT;
    pub const RUN_SPEED_ACCEL: f32 = 0.6 * UNIT;

    /// Full jump height in units
    pub const JUMP_HEIGHT_UNITS: f32 = 4.9;

    /// Grapple reach (30 units)
    pub const HOOK_RADIUS: f32 = 30.0 * UNIT;
    /// Pull/cling travel speed (px/s)
    pub const HOOK_PULL_SPEED: f32 = 800.0;

    /// Dash
    pub const DASH_DISTANCE_UNITS: f32 = 8.0;
    pub const DASH_ENERGY_COST: f32 = 0.35;
    pub const DASH_SPEED: f32 = 20.0 * UNIT;

    /// Player collider
    pub const PLAYER_RADIUS: f32 = 18.0;
    pub const PLAYER_HEIGHT: f32 = 1.2 * UNIT;

    /// Guard for divisions by lengths (rope, ray direction)
    pub const EPSILON: f32 = 1e-3;

    /// Full jump launch velocity (px/s, negative = up)
    pub fn jump_velocity() -> f32 {
        -(2.0 * GRAVITY * JUMP_HEIGHT_UNITS * UNIT).sqrt()
    }
}

/// Uniform sample in `[min, max)`. Returns `min` for empty or inverted ranges.
#[inline]
pub fn rand_range<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max <= min {
        return min;
    }
    min + rng.random::<f32>() * (max - min)
}

/// `floor(rand_range(min, max))` as an integer count
#[inline]
pub fn rand_units<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> u32 {
    rand_range(rng, min, max).floor().max(0.0) as u32
}

/// Bernoulli trial with probability `p` (values outside [0, 1] saturate)
#[inline]
pub fn chance<R: Rng + ?Sized>(rng: &mut R, p: f32) -> bool {
    rng.random::<f32>() < p
}

/// Clamp to [0, 1]
#[inline]
pub fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}
