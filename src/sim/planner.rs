//! Reachability-aware hook node placement
//!
//! After a section's platforms exist, look for gaps a plain jump cannot clear
//! and drop small grapple-only nodes into them:
//! - vertical: a platform stacked above another, higher than a jump but inside
//!   hook reach, gets a node halfway up the shared span
//! - horizontal: a same-layer gap wider than a running jump gets a node at its
//!   midpoint
//!
//! Candidates are checked in order against nodes placed so far, so dense
//! clusters thin out naturally. Placement is throttled, so this is best-effort
//! fairness rather than a reachability guarantee.

use glam::Vec2;
use rand::Rng;

use super::entities::{Platform, PlatformKind};
use super::rect::Rect;
use crate::chance;

/// Fraction of otherwise valid candidates that become nodes
pub const NODE_THROTTLE: f32 = 0.4;
/// Usable fraction of the hook radius
pub const REACH_FACTOR: f32 = 0.9;
/// Rough horizontal jump distance as a multiple of jump height
pub const HORIZONTAL_JUMP_FACTOR: f32 = 1.6;

/// Add hook nodes to `platforms`. Returns how many were placed.
pub fn plan_hook_nodes<R: Rng + ?Sized>(
    platforms: &mut Vec<Platform>,
    hook_radius: f32,
    jump_height: f32,
    unit: f32,
    rng: &mut R,
) -> usize {
    let max_vertical_gap = hook_radius * REACH_FACTOR;
    let max_horizontal_jump = jump_height * HORIZONTAL_JUMP_FACTOR;

    // Snapshot of solid platforms, left to right; nodes never become candidates
    let mut sorted: Vec<Rect> = platforms
        .iter()
        .filter(|p| !p.is_hook_node())
        .map(|p| p.rect)
        .collect();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x));

    let before = platforms.len();

    // Vertical traversal between stacked platforms
    for a in &sorted {
        for b in &sorted {
            if b.y >= a.y {
                continue;
            }
            let vertical_gap = a.y - b.y;
            if vertical_gap <= jump_height || vertical_gap > max_vertical_gap {
                continue;
            }
            let Some((left, right)) = a.x_overlap(b) else {
                continue;
            };
            let mid = Vec2::new((left + right) / 2.0, (a.y + b.y) / 2.0);
            try_place(platforms, mid, unit, rng);
        }
    }

    // Horizontal traversal across wide same-layer gaps
    for (i, a) in sorted.iter().enumerate() {
        let neighbor = sorted[i + 1..]
            .iter()
            .filter(|b| (a.y - b.y).abs() <= unit * 0.5 && b.x >= a.right())
            .min_by(|p, q| p.x.total_cmp(&q.x));
        let Some(b) = neighbor else {
            continue;
        };

        let gap = b.x - a.right();
        if gap <= max_horizontal_jump {
            continue;
        }
        let mid = Vec2::new(a.right() + gap / 2.0, (a.y + b.y) / 2.0);
        if (a.y - mid.y).abs() > max_vertical_gap {
            continue;
        }
        try_place(platforms, mid, unit, rng);
    }

    let placed = platforms.len() - before;
    if placed > 0 {
        log::trace!("Placed {} hook nodes", placed);
    }
    placed
}

/// Whether an existing node sits within one unit of `point` on both axes
pub fn node_near(platforms: &[Platform], point: Vec2, unit: f32) -> bool {
    platforms.iter().filter(|p| p.is_hook_node()).any(|p| {
        let c = p.rect.top_center();
        (c.x - point.x).abs() < unit && (c.y - point.y).abs() < unit
    })
}

/// Grapple-only node whose anchor (top center) is `point`
pub fn hook_node_at(point: Vec2, unit: f32) -> Platform {
    Platform::new(
        Rect::new(point.x - unit * 0.25, point.y, unit * 0.5, 8.0),
        PlatformKind::HookNode,
    )
}

fn try_place<R: Rng + ?Sized>(platforms: &mut Vec<Platform>, mid: Vec2, unit: f32, rng: &mut R) {
    if node_near(platforms, mid, unit) {
        return;
    }
    if !chance(rng, NODE_THROTTLE) {
        return;
    }
    platforms.push(hook_node_at(mid, unit));
}
