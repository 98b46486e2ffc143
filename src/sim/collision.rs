//! Collision queries against platforms, hazards and pickups
//!
//! Platforms are one-way floors: the player only ever lands on a top edge while
//! falling or resting. Hook nodes never collide and only answer raycasts.

use glam::Vec2;

use super::entities::Platform;
use super::player::Player;
use crate::consts::EPSILON;

/// Drop-through re-enables once the player's top clears the platform top by this much
pub const DROP_THROUGH_CLEARANCE: f32 = 4.0;
/// A platform top must be this far above the player center to be hookable
pub const HOOK_GROUND_TOLERANCE: f32 = 2.0;
/// Ray directions with a smaller vertical component never hit a top edge
const PARALLEL_EPSILON: f32 = 1e-4;

/// Result of a hook raycast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Attachment point
    pub point: Vec2,
    /// Distance along the ray
    pub distance: f32,
    pub platform_id: u32,
}

/// Land the player on platform tops.
///
/// Clears and recomputes `on_ground` / `ground_platform`. The active
/// drop-through platform is ignored until the player has fallen clear of it.
pub fn resolve_platforms(player: &mut Player, platforms: &[Platform]) {
    player.on_ground = false;

    let mut ground = None;
    for platform in platforms.iter().filter(|p| p.collides()) {
        let plat_top = platform.rect.top();

        if player.drop_through == Some(platform.id) {
            if player.top() > plat_top + DROP_THROUGH_CLEARANCE {
                player.drop_through = None;
            }
            continue;
        }

        let over = platform.rect.overlaps_x(player.left(), player.right());
        if over && player.bottom() >= plat_top && player.top() < plat_top && player.vel.y >= 0.0 {
            player.pos.y -= player.bottom() - plat_top;
            player.vel.y = 0.0;
            player.on_ground = true;
            ground = Some(platform.id);
        }
    }

    player.ground_platform = if player.on_ground { ground } else { None };
}

/// Cast the grapple ray from `origin` toward `target`.
///
/// Ordinary platforms are hit on their top edge, and only when that edge is
/// above `origin`. Hook nodes are hit when the ray passes within the node's
/// width of its anchor. Returns the nearest hit within `[min_dist, max_dist]`.
pub fn raycast_hook(
    origin: Vec2,
    target: Vec2,
    platforms: &[Platform],
    ignore: Option<u32>,
    min_dist: f32,
    max_dist: f32,
) -> Option<RayHit> {
    let delta = target - origin;
    if delta.length() <= EPSILON {
        return None;
    }
    let dir = delta.normalize();

    let mut best: Option<RayHit> = None;
    for platform in platforms {
        if !platform.hookable || ignore == Some(platform.id) {
            continue;
        }

        let candidate = if platform.is_hook_node() {
            ray_vs_node(origin, dir, platform, min_dist, max_dist)
        } else {
            ray_vs_top_edge(origin, dir, platform, min_dist, max_dist)
        };

        match (candidate, best) {
            (Some(hit), Some(b)) if hit.distance < b.distance => best = Some(hit),
            (Some(hit), None) => best = Some(hit),
            _ => {}
        }
    }
    best
}

fn ray_vs_node(origin: Vec2, dir: Vec2, node: &Platform, min_dist: f32, max_dist: f32) -> Option<RayHit> {
    let anchor = node.rect.top_center();
    let rel = anchor - origin;
    let proj = rel.dot(dir);
    if proj <= 0.0 || proj < min_dist || proj > max_dist {
        return None;
    }
    let perp_sq = rel.length_squared() - proj * proj;
    let radius = node.rect.width;
    if perp_sq > radius * radius {
        return None;
    }
    Some(RayHit {
        point: anchor,
        distance: proj,
        platform_id: node.id,
    })
}

fn ray_vs_top_edge(origin: Vec2, dir: Vec2, platform: &Platform, min_dist: f32, max_dist: f32) -> Option<RayHit> {
    let plat_top = platform.rect.top();
    // Never hook the surface under our feet
    if plat_top >= origin.y - HOOK_GROUND_TOLERANCE {
        return None;
    }
    if dir.y.abs() < PARALLEL_EPSILON {
        return None;
    }
    let t = (plat_top - origin.y) / dir.y;
    if t <= 0.0 || t < min_dist || t > max_dist {
        return None;
    }
    let hit_x = origin.x + dir.x * t;
    if !platform.rect.spans_x(hit_x) {
        return None;
    }
    Some(RayHit {
        point: Vec2::new(hit_x, plat_top),
        distance: t,
        platform_id: platform.id,
    })
}
