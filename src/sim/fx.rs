//! Short-lived visual effects
//!
//! FX never affect physics, with one exception: a floating score number
//! commits its value to the layer score when it expires. Expired entries go
//! back to a per-kind pool and are reused by the next spawn.

use glam::Vec2;
use serde::Serialize;

use super::player::Player;

pub const RUN_DUST_DURATION: f32 = 0.4;
/// Seconds between run dust puffs
pub const RUN_DUST_INTERVAL: f32 = 0.15;
pub const JUMP_DUST_DURATION: f32 = 0.35;
pub const DASH_WAVE_DURATION: f32 = 0.25;
pub const TELEPORT_BURST_DURATION: f32 = 0.25;
pub const BOOSTER_BURST_DURATION: f32 = 0.2;
pub const FLOATING_NUMBER_DURATION: f32 = 0.5;
pub const GRAPPLE_TEXT_DURATION: f32 = 0.6;

/// Effect categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FxKind {
    RunDust,
    JumpDust,
    DashWave,
    TeleportBurst,
    FloatingNumber,
    GrappleText,
}

impl FxKind {
    pub const ALL: [FxKind; 6] = [
        FxKind::RunDust,
        FxKind::JumpDust,
        FxKind::DashWave,
        FxKind::TeleportBurst,
        FxKind::FloatingNumber,
        FxKind::GrappleText,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// One running effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FxEvent {
    pub pos: Vec2,
    /// Elapsed seconds
    pub t: f32,
    pub duration: f32,
    /// Score for floating numbers, charge delta for grapple texts
    pub value: u32,
}

/// FX lists of one layer
#[derive(Debug, Clone, Default, Serialize)]
pub struct FxQueues {
    active: [Vec<FxEvent>; 6],
    #[serde(skip)]
    pools: [Vec<FxEvent>; 6],
}

impl FxQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Running effects of one kind, oldest first
    pub fn list(&self, kind: FxKind) -> &[FxEvent] {
        &self.active[kind.index()]
    }

    /// Recycled entries waiting for reuse
    #[cfg(test)]
    pub(crate) fn pooled(&self, kind: FxKind) -> usize {
        self.pools[kind.index()].len()
    }

    pub fn len(&self) -> usize {
        self.active.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.active.iter().all(Vec::is_empty)
    }

    pub fn spawn(&mut self, kind: FxKind, pos: Vec2, duration: f32, value: u32) {
        let i = kind.index();
        let mut event = self.pools[i].pop().unwrap_or(FxEvent {
            pos,
            t: 0.0,
            duration,
            value,
        });
        event.pos = pos;
        event.t = 0.0;
        event.duration = duration;
        event.value = value;
        self.active[i].push(event);
    }

    /// Emit movement-driven effects for this frame: run dust, jump dust and
    /// the dash wave. Also ticks the teleport fade.
    pub fn track_player(&mut self, player: &mut Player, unit: f32, dt: f32) {
        let feet = player.bottom();

        if player.on_ground && player.vel.x.abs() > 0.1 && !player.dying {
            player.run_dust_cooldown -= dt;
            if player.run_dust_cooldown <= 0.0 {
                player.run_dust_cooldown = RUN_DUST_INTERVAL;
                let pos = Vec2::new(player.pos.x - player.facing * player.radius * 0.6, feet - 0.25 * unit);
                self.spawn(FxKind::RunDust, pos, RUN_DUST_DURATION, 0);
            }
        } else {
            player.run_dust_cooldown = 0.0;
        }

        if player.was_on_ground && !player.on_ground && !player.dying {
            self.spawn(FxKind::JumpDust, Vec2::new(player.pos.x, feet), JUMP_DUST_DURATION, 0);
        }
        player.was_on_ground = player.on_ground;

        if player.just_dashed {
            player.just_dashed = false;
            self.spawn(FxKind::DashWave, player.pos, DASH_WAVE_DURATION, 0);
        }

        player.teleport_timer = (player.teleport_timer - dt).max(0.0);
    }

    /// Age every effect, recycle the finished ones, and return the score
    /// committed by expiring floating numbers
    pub fn advance(&mut self, dt: f32) -> u32 {
        let mut committed = 0;
        for kind in FxKind::ALL {
            let i = kind.index();
            let (active, pool) = (&mut self.active[i], &mut self.pools[i]);
            let mut j = 0;
            while j < active.len() {
                active[j].t += dt;
                if active[j].t >= active[j].duration {
                    let done = active.remove(j);
                    if kind == FxKind::FloatingNumber {
                        committed += done.value;
                    }
                    pool.push(done);
                } else {
                    j += 1;
                }
            }
        }
        committed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tuning;
    use crate::consts::UNIT;

    #[test]
    fn test_floating_number_commits_on_expiry() {
        let mut fx = FxQueues::new();
        fx.spawn(FxKind::FloatingNumber, Vec2::ZERO, FLOATING_NUMBER_DURATION, 25);
        assert_eq!(fx.advance(0.3), 0);
        assert_eq!(fx.list(FxKind::FloatingNumber).len(), 1);
        assert_eq!(fx.advance(0.3), 25);
        assert!(fx.is_empty());
    }

    #[test]
    fn test_expired_entries_are_pooled_and_reused() {
        let mut fx = FxQueues::new();
        fx.spawn(FxKind::DashWave, Vec2::ZERO, DASH_WAVE_DURATION, 0);
        fx.advance(1.0);
        assert_eq!(fx.pooled(FxKind::DashWave), 1);

        fx.spawn(FxKind::DashWave, Vec2::new(5.0, 6.0), DASH_WAVE_DURATION, 0);
        assert_eq!(fx.pooled(FxKind::DashWave), 0);
        let wave = fx.list(FxKind::DashWave)[0];
        assert_eq!(wave.pos, Vec2::new(5.0, 6.0));
        assert_eq!(wave.t, 0.0);
    }

    #[test]
    fn test_grapple_text_never_scores() {
        let mut fx = FxQueues::new();
        fx.spawn(FxKind::GrappleText, Vec2::ZERO, GRAPPLE_TEXT_DURATION, 1);
        assert_eq!(fx.advance(1.0), 0);
    }

    #[test]
    fn test_run_dust_interval() {
        let mut fx = FxQueues::new();
        let mut player = Player::new(Vec2::new(0.0, 0.0), &Tuning::default());
        player.on_ground = true;
        player.was_on_ground = true;
        player.vel.x = 288.0;
        // One second at 60 Hz: a puff on the first frame then every ~0.15 s
        for _ in 0..60 {
            fx.track_player(&mut player, UNIT, 1.0 / 60.0);
        }
        let puffs = fx.list(FxKind::RunDust).len();
        assert!((6..=7).contains(&puffs), "got {puffs} puffs");
    }

    #[test]
    fn test_jump_dust_on_leaving_ground() {
        let mut fx = FxQueues::new();
        let mut player = Player::new(Vec2::new(0.0, 0.0), &Tuning::default());
        player.on_ground = true;
        fx.track_player(&mut player, UNIT, 0.016);
        assert!(fx.list(FxKind::JumpDust).is_empty());
        player.on_ground = false;
        fx.track_player(&mut player, UNIT, 0.016);
        assert_eq!(fx.list(FxKind::JumpDust).len(), 1);
        fx.track_player(&mut player, UNIT, 0.016);
        assert_eq!(fx.list(FxKind::JumpDust).len(), 1);
    }

    #[test]
    fn test_dash_wave_consumes_flag() {
        let mut fx = FxQueues::new();
        let mut player = Player::new(Vec2::new(0.0, 0.0), &Tuning::default());
        player.just_dashed = true;
        fx.track_player(&mut player, UNIT, 0.016);
        assert!(!player.just_dashed);
        assert_eq!(fx.list(FxKind::DashWave).len(), 1);
    }
}
