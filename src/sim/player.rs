//! Player state shared by both dimension layers

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rect::Rect;
use crate::Tuning;

/// How long the dash sprite state lasts (s)
pub const DASH_VISUAL_DURATION: f32 = 0.2;
/// Teleport fade after a dimension switch (s)
pub const TELEPORT_FADE_DURATION: f32 = 0.25;

/// Grapple attachment
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum HookState {
    #[default]
    None,
    /// Pendulum swing on a rope of fixed length
    Hang { anchor: Vec2, rope_length: f32 },
    /// Reel straight toward the anchor, then cling
    Pull { anchor: Vec2 },
}

impl HookState {
    pub fn is_active(&self) -> bool {
        !matches!(self, HookState::None)
    }

    pub fn anchor(&self) -> Option<Vec2> {
        match *self {
            HookState::None => None,
            HookState::Hang { anchor, .. } | HookState::Pull { anchor } => Some(anchor),
        }
    }
}

/// Sprite animation selected each frame by priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnimState {
    #[default]
    Idle,
    Run,
    Jump,
    Hook,
    Dash,
    Hurt,
    Death,
}

/// The runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Collider center
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub height: f32,
    /// Stamina in [0, 1]
    pub energy: f32,
    pub alive: bool,
    /// Death countdown running
    pub dying: bool,
    /// +1 right, -1 left
    pub facing: f32,
    pub on_ground: bool,
    /// Grounded state at the end of the previous frame (jump dust)
    pub was_on_ground: bool,
    /// Platform id currently stood on
    pub ground_platform: Option<u32>,
    /// Thin platform id being dropped through
    pub drop_through: Option<u32>,
    pub hook: HookState,
    pub grapple_charges: u32,
    pub grapple_charges_max: u32,

    pub damage_timer: f32,
    /// Dash sprite state
    pub dash_timer: f32,
    /// Dash wave visual
    pub dash_effect_timer: f32,
    pub death_timer: f32,
    pub speed_boost_timer: f32,
    pub teleport_timer: f32,
    pub run_dust_cooldown: f32,
    /// Set by a dash, consumed by FX
    pub just_dashed: bool,

    pub anim: AnimState,
    pub anim_time: f32,
}

impl Player {
    pub fn new(pos: Vec2, tuning: &Tuning) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            radius: crate::consts::PLAYER_RADIUS,
            height: 1.2 * tuning.unit,
            energy: 1.0,
            alive: true,
            dying: false,
            facing: 1.0,
            on_ground: false,
            was_on_ground: false,
            ground_platform: None,
            drop_through: None,
            hook: HookState::None,
            grapple_charges: tuning.grapple_charges_start.min(tuning.grapple_charges_max),
            grapple_charges_max: tuning.grapple_charges_max,
            damage_timer: 0.0,
            dash_timer: 0.0,
            dash_effect_timer: 0.0,
            death_timer: 0.0,
            speed_boost_timer: 0.0,
            teleport_timer: 0.0,
            run_dust_cooldown: 0.0,
            just_dashed: false,
            anim: AnimState::Idle,
            anim_time: 0.0,
        }
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y - self.height / 2.0
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.height / 2.0
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x - self.radius
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.radius
    }

    /// Axis-aligned hit box
    pub fn bounds(&self) -> Rect {
        Rect::new(self.left(), self.top(), self.radius * 2.0, self.height)
    }

    /// Alive and not in the death countdown
    pub fn can_act(&self) -> bool {
        self.alive && !self.dying
    }

    /// Arm the death countdown (no-op if already dying)
    pub fn start_death(&mut self, duration: f32) {
        if self.dying {
            return;
        }
        self.dying = true;
        self.death_timer = duration;
        self.hook = HookState::None;
    }

    /// Run speed multiplier from an active speed booster
    pub fn speed_multiplier(&self, tuning: &Tuning) -> f32 {
        if self.speed_boost_timer > 0.0 {
            tuning.speed_boost_multiplier
        } else {
            1.0
        }
    }

    /// Add a grapple charge, saturating at the maximum
    pub fn add_grapple_charge(&mut self) -> bool {
        if self.grapple_charges >= self.grapple_charges_max {
            return false;
        }
        self.grapple_charges += 1;
        true
    }

    /// Tick visual timers and pick the animation state.
    ///
    /// Priority: death > hurt > dash > hook > airborne > run > idle.
    pub fn update_animation(&mut self, dt: f32) {
        self.damage_timer = (self.damage_timer - dt).max(0.0);
        self.dash_timer = (self.dash_timer - dt).max(0.0);
        self.anim_time += dt;

        let next = if !self.can_act() {
            AnimState::Death
        } else if self.damage_timer > 0.0 {
            AnimState::Hurt
        } else if self.dash_timer > 0.0 {
            AnimState::Dash
        } else if self.hook.is_active() {
            AnimState::Hook
        } else if !self.on_ground || self.vel.y.abs() > 0.1 {
            AnimState::Jump
        } else if self.vel.x.abs() > 0.1 {
            AnimState::Run
        } else {
            AnimState::Idle
        };

        if next != self.anim {
            self.anim = next;
            self.anim_time = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        Player::new(Vec2::new(100.0, 100.0), &Tuning::default())
    }

    #[test]
    fn test_bounds() {
        let p = player();
        let b = p.bounds();
        assert_eq!(b.x, 82.0);
        assert_eq!(b.width, 36.0);
        assert!((b.height - 57.6).abs() < 1e-4);
        assert!((p.bottom() - 128.8).abs() < 1e-4);
    }

    #[test]
    fn test_start_death_cancels_hook_once() {
        let mut p = player();
        p.hook = HookState::Pull {
            anchor: Vec2::ZERO,
        };
        p.start_death(1.0);
        assert!(p.dying);
        assert_eq!(p.hook, HookState::None);
        p.death_timer = 0.4;
        p.start_death(1.0);
        assert_eq!(p.death_timer, 0.4);
    }

    #[test]
    fn test_grapple_charge_saturates() {
        let mut p = player();
        p.grapple_charges = p.grapple_charges_max - 1;
        assert!(p.add_grapple_charge());
        assert!(!p.add_grapple_charge());
        assert_eq!(p.grapple_charges, p.grapple_charges_max);
    }

    #[test]
    fn test_animation_priority() {
        let mut p = player();
        p.on_ground = true;
        p.update_animation(0.016);
        assert_eq!(p.anim, AnimState::Idle);

        p.vel.x = 200.0;
        p.update_animation(0.016);
        assert_eq!(p.anim, AnimState::Run);
        assert_eq!(p.anim_time, 0.0);
        p.update_animation(0.016);
        assert!(p.anim_time > 0.0);

        p.on_ground = false;
        p.update_animation(0.016);
        assert_eq!(p.anim, AnimState::Jump);

        p.hook = HookState::Hang {
            anchor: Vec2::ZERO,
            rope_length: 10.0,
        };
        p.update_animation(0.016);
        assert_eq!(p.anim, AnimState::Hook);

        p.dash_timer = DASH_VISUAL_DURATION;
        p.update_animation(0.016);
        assert_eq!(p.anim, AnimState::Dash);

        p.damage_timer = 0.3;
        p.update_animation(0.016);
        assert_eq!(p.anim, AnimState::Hurt);

        p.start_death(1.0);
        p.update_animation(0.016);
        assert_eq!(p.anim, AnimState::Death);
    }
}
