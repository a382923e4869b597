//! 2D vector helpers and toroidal wrap
//!
//! Thin layer over `glam::DVec2`. The engine integrates through these helpers
//! so the arithmetic order behind replays lives in one place.

use glam::DVec2;

use crate::rng::Mulberry32;

/// Magnitudes at or below this normalize to zero
pub const NORMALIZE_EPSILON: f64 = 1e-9;

#[inline]
pub fn add(a: DVec2, b: DVec2) -> DVec2 {
    a + b
}

#[inline]
pub fn sub(a: DVec2, b: DVec2) -> DVec2 {
    a - b
}

#[inline]
pub fn scale(v: DVec2, s: f64) -> DVec2 {
    v * s
}

#[inline]
pub fn magnitude(v: DVec2) -> f64 {
    v.length()
}

/// Unit vector, or zero when the input is (nearly) zero
#[inline]
pub fn normalize(v: DVec2) -> DVec2 {
    let len = v.length();
    if len <= NORMALIZE_EPSILON {
        DVec2::ZERO
    } else {
        v / len
    }
}

/// Unit vector pointing along `angle` (0 = +x)
#[inline]
pub fn from_angle(angle: f64) -> DVec2 {
    DVec2::new(angle.cos(), angle.sin())
}

#[inline]
pub fn distance(a: DVec2, b: DVec2) -> f64 {
    (a - b).length()
}

/// Linear sample in [min, max) from one draw
#[inline]
pub fn random_in_range(rng: &mut Mulberry32, min: f64, max: f64) -> f64 {
    min + rng.next_f64() * (max - min)
}

/// Single-step toroidal wrap into [0, width) × [0, height)
///
/// Assumes the point is less than one extent outside the viewport, which
/// holds for per-frame displacement under the clamped frame time.
#[inline]
pub fn wrap_position(pos: DVec2, width: f64, height: f64) -> DVec2 {
    DVec2::new(wrap_axis(pos.x, width), wrap_axis(pos.y, height))
}

#[inline]
fn wrap_axis(v: f64, extent: f64) -> f64 {
    let wrapped = if v < 0.0 {
        v + extent
    } else if v >= extent {
        v - extent
    } else {
        v
    };
    // v + extent rounds up to extent for tiny negative v
    if wrapped >= extent { 0.0 } else { wrapped }
}

/// Full modular wrap, for arbitrary displacement (viewport resizes)
pub fn wrap_position_euclid(pos: DVec2, width: f64, height: f64) -> DVec2 {
    let x = pos.x.rem_euclid(width);
    let y = pos.y.rem_euclid(height);
    DVec2::new(
        if x >= width { 0.0 } else { x },
        if y >= height { 0.0 } else { y },
    )
}
