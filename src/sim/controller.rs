//! Player controller: per-frame intent to player motion
//!
//! Update order matters and is fixed:
//! 1. Refresh platform references (ids may have been culled)
//! 2. Energy
//! 3. Drop-through request
//! 4. Horizontal intent
//! 5. Hook acquisition / release
//! 6. Dash
//! 7. Jump
//! 8. Physics integration (free, swing or pull)
//! 9. Platform collision
//!
//! A hook acquired this frame is therefore already constraining motion in
//! step 8, and collisions always see this frame's movement.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{raycast_hook, resolve_platforms};
use super::entities::Platform;
use super::player::{DASH_VISUAL_DURATION, HookState, Player};
use crate::Tuning;
use crate::clamp01;

/// Horizontal speed cap as a multiple of boosted max run speed
pub const VX_CLAMP_FACTOR: f32 = 1.5;
/// Pull mode snaps to the anchor inside this distance (px)
pub const CLING_DISTANCE: f32 = 2.0;
/// Minimum downward speed after starting a drop-through (px/s)
pub const DROP_THROUGH_NUDGE: f32 = 50.0;
/// Dash wave visual duration (s)
pub const DASH_EFFECT_DURATION: f32 = 0.25;
/// Degenerate rope / projection guard
const ROPE_EPSILON: f32 = 1e-4;

/// Abstract input for one fixed step.
///
/// `hook` is a one-shot press (true only on the frame the pointer went down);
/// everything else is sampled as held state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub jump: bool,
    pub hook: bool,
    /// Aim point in world space
    pub hook_x: f32,
    pub hook_y: f32,
    pub dash: bool,
    pub toggle_dimension: bool,
    /// -1 left, 0 idle, +1 right
    pub move_dir: i8,
    /// Hang modifier held (pointer held)
    pub hook_hang: bool,
    /// Pull modifier held
    pub hook_pull: bool,
    pub drop_down: bool,
}

impl Intent {
    pub fn hook_target(&self) -> Vec2 {
        Vec2::new(self.hook_x, self.hook_y)
    }

    /// Horizontal direction as -1.0, 0.0 or 1.0
    pub fn move_axis(&self) -> f32 {
        self.move_dir.signum() as f32
    }
}

/// Edge detection and jump/dash bookkeeping that persists across frames
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Controller {
    last_jump: bool,
    last_dash: bool,
    jump_boost_timer: f32,
    /// Last nonzero horizontal direction (+1 / -1)
    last_move_dir: f32,
}

impl Default for Controller {
    fn default() -> Self {
        Self {
            last_jump: false,
            last_dash: false,
            jump_boost_timer: 0.0,
            last_move_dir: 1.0,
        }
    }
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_move_dir(&self) -> f32 {
        self.last_move_dir
    }

    /// Advance the player by one step against the active layer's platforms
    pub fn update(&mut self, player: &mut Player, intent: &Intent, platforms: &[Platform], tuning: &Tuning, dt: f32) {
        refresh_platform_refs(player, platforms);
        update_energy(player, tuning, dt);
        player.dash_effect_timer = (player.dash_effect_timer - dt).max(0.0);

        if intent.drop_down {
            request_drop_through(player, platforms);
        }

        let move_dir = intent.move_axis();
        self.try_hook(player, intent, platforms, tuning);
        self.try_dash(player, intent.dash, tuning);
        self.try_jump(player, intent.jump, tuning, dt);
        self.apply_physics(player, move_dir, tuning, dt);
        resolve_platforms(player, platforms);
    }

    /// Hook release rules, then acquisition on a hang press
    pub fn try_hook(&mut self, player: &mut Player, intent: &Intent, platforms: &[Platform], tuning: &Tuning) {
        if !player.can_act() {
            return;
        }

        let hang = intent.hook_hang;
        let pull = intent.hook_pull;

        match player.hook {
            HookState::Pull { anchor } => {
                if !hang {
                    player.hook = HookState::None;
                } else if !pull {
                    player.hook = HookState::Hang {
                        anchor,
                        rope_length: player.pos.distance(anchor),
                    };
                }
            }
            HookState::Hang { .. } if !hang => player.hook = HookState::None,
            _ => {}
        }

        if intent.hook && hang {
            let target = intent.hook_target();
            if target.distance(player.pos) > crate::consts::EPSILON {
                let hit = raycast_hook(
                    player.pos,
                    target,
                    platforms,
                    player.ground_platform,
                    tuning.hook_min_distance(),
                    tuning.hook_radius,
                );
                match hit {
                    Some(hit) => {
                        // Out of charges: a pull press behaves like a plain hang
                        if pull && player.grapple_charges > 0 {
                            player.grapple_charges -= 1;
                            player.hook = HookState::Pull { anchor: hit.point };
                            log::debug!(
                                "Hook pull to platform {} at {:?} ({} charges left)",
                                hit.platform_id,
                                hit.point,
                                player.grapple_charges
                            );
                        } else {
                            log::debug!("Hook hang on platform {} at {:?}", hit.platform_id, hit.point);
                            player.hook = HookState::Hang {
                                anchor: hit.point,
                                rope_length: player.pos.distance(hit.point),
                            };
                        }
                        player.vel.y = 0.0;
                    }
                    None => player.hook = HookState::None,
                }
            }
        }

        // Safety net against runaway swings
        let max_reach = tuning.hook_radius + tuning.hook_release_slack;
        if player.hook.anchor().is_some_and(|anchor| player.pos.distance(anchor) > max_reach) {
            player.hook = HookState::None;
        }
    }

    /// Rising-edge dash: teleport along the last move direction plus an impulse
    pub fn try_dash(&mut self, player: &mut Player, dash: bool, tuning: &Tuning) {
        let just_pressed = dash && !self.last_dash;
        self.last_dash = dash;
        if !player.can_act() {
            return;
        }

        if just_pressed && player.energy >= tuning.dash_energy_cost && self.last_move_dir != 0.0 {
            player.energy = (player.energy - tuning.dash_energy_cost).max(0.0);
            player.pos.x += tuning.dash_distance() * self.last_move_dir;
            player.vel.x += self.last_move_dir * tuning.dash_speed;
            player.dash_effect_timer = DASH_EFFECT_DURATION;
            player.dash_timer = DASH_VISUAL_DURATION;
            player.just_dashed = true;
        }
    }

    /// Variable-height jump: weak launch, then boosted while held
    pub fn try_jump(&mut self, player: &mut Player, jump: bool, tuning: &Tuning, dt: f32) {
        let just_pressed = jump && !self.last_jump;
        self.last_jump = jump;
        if !player.can_act() {
            return;
        }

        let window = tuning.jump_boost_window;
        let target = tuning.jump_velocity();
        let initial = target * tuning.jump_initial_fraction;

        if just_pressed && player.on_ground && player.energy > tuning.jump_min_energy {
            player.vel.y = initial;
            player.on_ground = false;
            self.jump_boost_timer = window;
        } else if !jump {
            self.jump_boost_timer = 0.0;
        }

        if jump && self.jump_boost_timer > 0.0 && player.vel.y < 0.0 {
            let t = clamp01((window - self.jump_boost_timer) / window);
            let desired = initial + (target - initial) * t;
            // Only ever strengthen the jump
            if player.vel.y > desired {
                player.vel.y = desired;
            }
            self.jump_boost_timer = (self.jump_boost_timer - dt).max(0.0);
        }
    }

    fn apply_physics(&mut self, player: &mut Player, move_dir: f32, tuning: &Tuning, dt: f32) {
        if !player.can_act() {
            player.vel.x = 0.0;
            player.vel.y += tuning.gravity * dt;
            player.pos += player.vel * dt;
            return;
        }

        let boost = player.speed_multiplier(tuning);
        match player.hook {
            HookState::Hang { anchor, rope_length } if rope_length > crate::consts::EPSILON => {
                swing(player, anchor, rope_length, move_dir, tuning, dt);
            }
            HookState::Pull { anchor } => pull(player, anchor, tuning, dt),
            _ => free_move(player, move_dir, boost, tuning, dt),
        }

        let max_vx = tuning.run_speed_max * VX_CLAMP_FACTOR * boost;
        player.vel.x = player.vel.x.clamp(-max_vx, max_vx);
        player.vel.y = player.vel.y.clamp(-tuning.max_fall_speed, tuning.max_fall_speed);

        if player.vel.x.abs() > 1.0 {
            self.last_move_dir = player.vel.x.signum();
        }
        player.facing = self.last_move_dir;
    }
}

/// Forget platform ids that no longer exist in `platforms`
fn refresh_platform_refs(player: &mut Player, platforms: &[Platform]) {
    let exists = |id: u32| platforms.iter().any(|p| p.id == id);
    if player.ground_platform.is_some_and(|id| !exists(id)) {
        player.ground_platform = None;
    }
    if player.drop_through.is_some_and(|id| !exists(id)) {
        player.drop_through = None;
    }
}

/// Passive drain, ground recovery and a speed-proportional gain
pub fn update_energy(player: &mut Player, tuning: &Tuning, dt: f32) {
    if !player.can_act() {
        return;
    }
    let recover = if player.on_ground {
        tuning.energy_ground_recover * dt
    } else {
        0.0
    };
    let movement = (player.vel.x.abs() / tuning.run_speed_base).min(2.0);
    let gain = tuning.energy_move_gain * movement * dt;
    player.energy = clamp01(player.energy - tuning.energy_drain * dt + recover + gain);
}

/// Start falling through the thin platform under the player, if any
fn request_drop_through(player: &mut Player, platforms: &[Platform]) {
    if !player.on_ground {
        return;
    }
    let Some(id) = player.ground_platform else {
        return;
    };
    if !platforms.iter().any(|p| p.id == id && p.is_thin()) {
        return;
    }
    player.drop_through = Some(id);
    player.on_ground = false;
    player.vel.y = player.vel.y.max(DROP_THROUGH_NUDGE);
}

fn free_move(player: &mut Player, move_dir: f32, boost: f32, tuning: &Tuning, dt: f32) {
    player.vel.x = move_dir * tuning.run_speed_max * boost;
    player.vel.y += tuning.gravity * dt;
    player.pos += player.vel * dt;
}

/// Pendulum step: drop radial velocity, add tangential gravity and input,
/// integrate, then project back onto the rope circle
fn swing(player: &mut Player, anchor: Vec2, rope_length: f32, move_dir: f32, tuning: &Tuning, dt: f32) {
    let mut radial = player.pos - anchor;
    let mut dist = radial.length();
    if dist < ROPE_EPSILON {
        radial = Vec2::new(0.0, rope_length);
        dist = rope_length;
    }
    let radial_dir = radial / dist;

    let mut vel = player.vel;
    vel -= radial_dir * vel.dot(radial_dir);

    let tangent = Vec2::new(-radial_dir.y, radial_dir.x);
    vel += tangent * (tuning.gravity * tangent.y) * dt;

    if move_dir != 0.0 {
        let accel = tuning.run_speed_accel * tuning.swing_accel_factor;
        // Input always pushes toward its world-space side
        let tangent_side = if tangent.x == 0.0 { 1.0 } else { tangent.x.signum() };
        let accel_sign = if tangent_side == move_dir.signum() { 1.0 } else { -1.0 };
        vel += tangent * accel_sign * accel * dt;
    }

    let mut offset = player.pos + vel * dt - anchor;
    let mut offset_len = offset.length();
    if offset_len < ROPE_EPSILON {
        offset = radial_dir * rope_length;
        offset_len = rope_length;
    }

    player.pos = anchor + offset / offset_len * rope_length;
    player.vel = vel;
}

/// Reel toward the anchor at a fixed speed, then cling
fn pull(player: &mut Player, anchor: Vec2, tuning: &Tuning, dt: f32) {
    let delta = anchor - player.pos;
    let dist = delta.length();
    if dist > CLING_DISTANCE {
        let step = dist.min(tuning.hook_pull_speed * dt);
        player.pos += delta / dist * step;
    } else {
        player.pos = anchor;
    }
    player.vel = Vec2::ZERO;
}
