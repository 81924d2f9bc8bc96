//! Spatial math for interpolation and separation checks.
//!
//! Everything works in a flat local frame; coordinates are meters.

use crate::models::Position;

/// Straight-line distance between two positions.
pub fn euclidean_distance(a: Position, b: Position) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z - b.z;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Linear interpolation between `a` and `b`; `ratio` 0 gives `a`, 1 gives `b`.
pub fn lerp(a: Position, b: Position, ratio: f64) -> Position {
    if ratio <= 0.0 {
        return a;
    }
    if ratio >= 1.0 {
        return b;
    }
    Position {
        x: a.x + (b.x - a.x) * ratio,
        y: a.y + (b.y - a.y) * ratio,
        z: a.z + (b.z - a.z) * ratio,
    }
}

/// Closest approach to the origin of a point moving linearly from `start`
/// to `end`.
///
/// Used on relative positions (other minus primary), so the origin means
/// "both drones at the same spot". Returns `(ratio, distance)` where `ratio`
/// in [0, 1] is where along the motion the minimum occurs.
pub fn closest_to_origin(start: Position, end: Position) -> (f64, f64) {
    let origin = Position::new(0.0, 0.0, 0.0);
    let (sx, sy, sz) = (end.x - start.x, end.y - start.y, end.z - start.z);
    let len_sq = sx * sx + sy * sy + sz * sz;

    if len_sq < 1e-12 {
        // No relative motion
        return (0.0, euclidean_distance(start, origin));
    }

    // Project origin onto the segment: t = ((O - S) . (E - S)) / |E - S|^2
    let t = (-(start.x * sx + start.y * sy + start.z * sz) / len_sq).clamp(0.0, 1.0);
    (t, euclidean_distance(lerp(start, end, t), origin))
}

/// Component-wise `a - b`.
pub fn relative(a: Position, b: Position) -> Position {
    Position::new(a.x - b.x, a.y - b.y, a.z - b.z)
}

/// Total length of a polyline.
pub fn path_length(points: &[Position]) -> f64 {
    points
        .windows(2)
        .map(|pair| euclidean_distance(pair[0], pair[1]))
        .sum()
}
