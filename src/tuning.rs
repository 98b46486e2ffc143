//! Data-driven game balance
//!
//! Everything the controller and world read at runtime lives here so a host
//! can ship a JSON override. Generation probabilities stay in the generator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors from loading a tuning document
#[derive(Debug, Error)]
pub enum TuningError {
    /// JSON could not be parsed
    #[error("Failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is outside its accepted range
    #[error("Tuning field '{field}' out of range: {value}")]
    OutOfRange { field: &'static str, value: f32 },
}

/// Gameplay tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === World ===
    pub unit: f32,
    pub gravity: f32,

    // === Movement ===
    pub run_speed_base: f32,
    pub run_speed_max: f32,
    pub run_speed_accel: f32,
    /// Vertical speed cap (px/s)
    pub max_fall_speed: f32,

    // === Jump ===
    pub jump_height_units: f32,
    /// Initial hop as a fraction of the full jump velocity
    pub jump_initial_fraction: f32,
    /// Window during which holding jump keeps strengthening it (s)
    pub jump_boost_window: f32,
    /// Minimum energy required to jump
    pub jump_min_energy: f32,

    // === Hook ===
    pub hook_radius: f32,
    pub hook_min_distance_units: f32,
    pub hook_pull_speed: f32,
    /// Slack beyond hook_radius before the rope snaps
    pub hook_release_slack: f32,
    /// Tangential swing acceleration as a multiple of run_speed_accel
    pub swing_accel_factor: f32,

    // === Dash ===
    pub dash_distance_units: f32,
    pub dash_energy_cost: f32,
    pub dash_speed: f32,

    // === Energy ===
    pub energy_drain: f32,
    pub energy_ground_recover: f32,
    pub energy_move_gain: f32,

    // === Grapple charges ===
    pub grapple_charges_start: u32,
    pub grapple_charges_max: u32,

    // === Boosters ===
    pub speed_boost_multiplier: f32,
    pub speed_boost_duration: f32,
    pub jump_boost_multiplier: f32,

    // === Damage / death ===
    pub hazard_energy_penalty: f32,
    pub hazard_knockback: f32,
    pub damage_duration: f32,
    pub death_duration: f32,
    pub death_y: f32,

    // === Pursuit wall ===
    pub wall_min_speed_units: f32,
    /// Final wall speed as a fraction of run_speed_max
    pub wall_max_speed_fraction: f32,
    pub wall_ramp_seconds: f32,

    // === Camera ===
    pub camera_lerp: f32,
    pub view_width: f32,
    pub view_height: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            unit: UNIT,
            gravity: GRAVITY,

            run_speed_base: RUN_SPEED_BASE,
            run_speed_max: RUN_SPEED_MAX,
            run_speed_accel: RUN_SPEED_ACCEL,
            max_fall_speed: 2000.0,

            jump_height_units: JUMP_HEIGHT_UNITS,
            jump_initial_fraction: 0.55,
            jump_boost_window: 0.18,
            jump_min_energy: 0.1,

            hook_radius: HOOK_RADIUS,
            hook_min_distance_units: 0.5,
            hook_pull_speed: HOOK_PULL_SPEED,
            hook_release_slack: 10.0,
            swing_accel_factor: 8.0,

            dash_distance_units: DASH_DISTANCE_UNITS,
            dash_energy_cost: DASH_ENERGY_COST,
            dash_speed: DASH_SPEED,

            energy_drain: 0.03,
            energy_ground_recover: 0.05,
            energy_move_gain: 0.12,

            grapple_charges_start: 2,
            grapple_charges_max: 5,

            speed_boost_multiplier: 1.5,
            speed_boost_duration: 3.0,
            jump_boost_multiplier: 1.8,

            hazard_energy_penalty: 0.4,
            hazard_knockback: 300.0,
            damage_duration: 0.3,
            death_duration: 1.0,
            death_y: 600.0,

            wall_min_speed_units: 0.5,
            wall_max_speed_fraction: 0.95,
            wall_ramp_seconds: 180.0,

            camera_lerp: 0.1,
            view_width: 960.0,
            view_height: 540.0,
        }
    }
}

impl Tuning {
    /// Parse and validate a JSON tuning document (missing fields use defaults)
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would break the physics
    pub fn validate(&self) -> Result<(), TuningError> {
        let positive = [
            ("unit", self.unit),
            ("gravity", self.gravity),
            ("run_speed_base", self.run_speed_base),
            ("run_speed_max", self.run_speed_max),
            ("max_fall_speed", self.max_fall_speed),
            ("jump_height_units", self.jump_height_units),
            ("jump_boost_window", self.jump_boost_window),
            ("hook_radius", self.hook_radius),
            ("hook_pull_speed", self.hook_pull_speed),
            ("death_duration", self.death_duration),
            ("wall_ramp_seconds", self.wall_ramp_seconds),
            ("view_width", self.view_width),
            ("view_height", self.view_height),
        ];
        for (field, value) in positive {
            if value <= 0.0 || !value.is_finite() {
                log::warn!("Rejecting tuning: {} = {}", field, value);
                return Err(TuningError::OutOfRange { field, value });
            }
        }

        let fractions = [
            ("jump_initial_fraction", self.jump_initial_fraction),
            ("jump_min_energy", self.jump_min_energy),
            ("dash_energy_cost", self.dash_energy_cost),
            ("hazard_energy_penalty", self.hazard_energy_penalty),
            ("camera_lerp", self.camera_lerp),
        ];
        for (field, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                log::warn!("Rejecting tuning: {} = {}", field, value);
                return Err(TuningError::OutOfRange { field, value });
            }
        }

        if self.grapple_charges_start > self.grapple_charges_max {
            return Err(TuningError::OutOfRange {
                field: "grapple_charges_start",
                value: self.grapple_charges_start as f32,
            });
        }

        Ok(())
    }

    /// Full jump velocity (negative = up)
    pub fn jump_velocity(&self) -> f32 {
        -(2.0 * self.gravity * self.jump_height_units * self.unit).sqrt()
    }

    /// Full jump height in pixels
    pub fn jump_height(&self) -> f32 {
        self.jump_height_units * self.unit
    }

    /// Minimum hook distance in pixels
    pub fn hook_min_distance(&self) -> f32 {
        self.hook_min_distance_units * self.unit
    }

    /// Dash translation in pixels
    pub fn dash_distance(&self) -> f32 {
        self.dash_distance_units * self.unit
    }
}
