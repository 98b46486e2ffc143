//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (one `Pcg32` per world)
//! - Stable iteration order (platforms in id order, sections oldest first)
//! - No rendering, audio or platform dependencies

pub mod collision;
pub mod controller;
pub mod entities;
pub mod fx;
pub mod generator;
pub mod level;
pub mod planner;
pub mod player;
pub mod rect;
pub mod tick;
pub mod world;

#[cfg(test)]
pub(crate) mod test_util;

pub use collision::{RayHit, raycast_hook, resolve_platforms};
pub use controller::{Controller, Intent};
pub use entities::{
    Bonus, Booster, BoosterKind, EntitySet, Hazard, HazardKind, Platform, PlatformKind, SEED_SECTION,
    SectionId,
};
pub use fx::{FxEvent, FxKind, FxQueues};
pub use generator::{SectionBatch, SectionParams, Style, generate_section};
pub use level::{LevelManager, Section};
pub use planner::plan_hook_nodes;
pub use player::{AnimState, HookState, Player};
pub use rect::Rect;
pub use tick::{FixedStep, Game, GamePhase, GameSnapshot};
pub use world::{Camera, DimensionId, Layer, PursuitWall, Snapshot, SpeedState, World};
