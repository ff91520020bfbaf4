//! Speed shaping around the convergence point
//!
//! Tokens ease in on approach and ease out on departure. The profile only
//! scales the per-tick step; it never influences heading selection.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

/// Multiplier curve applied to the base angular speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedProfile {
    /// Arc radius around the pole where slowing applies (rad) (default: 1.2)
    pub deceleration_zone: f64,
    /// Multiplier at the pole (default: 0.15)
    pub min_multiplier: f64,
    /// Multiplier outside the zone (default: 1.0)
    pub max_multiplier: f64,
}

impl Default for SpeedProfile {
    fn default() -> Self {
        Self { deceleration_zone: 1.2, min_multiplier: 0.15, max_multiplier: 1.0 }
    }
}

impl SpeedProfile {
    /// Constant speed everywhere.
    pub fn flat() -> Self {
        Self { deceleration_zone: 0.0, min_multiplier: 1.0, max_multiplier: 1.0 }
    }

    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        self.deceleration_zone =
            clamp_finite(self.deceleration_zone, 0.0, TAU / 2.0, defaults.deceleration_zone);
        self.max_multiplier =
            clamp_finite(self.max_multiplier, 0.01, 10.0, defaults.max_multiplier);
        self.min_multiplier = clamp_finite(
            self.min_multiplier,
            0.01,
            self.max_multiplier,
            defaults.min_multiplier.min(self.max_multiplier),
        );
    }

    /// Step multiplier for a token `angular_distance` along its path.
    ///
    /// Cubic ease-out from `min_multiplier` at the pole to `max_multiplier`
    /// at the zone edge, measured from whichever side is closer.
    pub fn multiplier(&self, angular_distance: f64) -> f64 {
        let from_origin = distance_from_origin(angular_distance);
        if from_origin >= self.deceleration_zone {
            return self.max_multiplier;
        }

        let progress = (from_origin / self.deceleration_zone).clamp(0.0, 1.0);
        let eased = 1.0 - (1.0 - progress).powi(3);
        self.min_multiplier + (self.max_multiplier - self.min_multiplier) * eased
    }

    pub fn speed(&self, base_speed: f64, angular_distance: f64) -> f64 {
        base_speed * self.multiplier(angular_distance)
    }
}

/// Arc length to the pole going whichever way is shorter.
#[inline]
pub fn distance_from_origin(angular_distance: f64) -> f64 {
    angular_distance.min(TAU - angular_distance).max(0.0)
}

pub(crate) fn clamp_finite(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if !value.is_finite() {
        return fallback;
    }
    value.clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_slowest_at_pole() {
        let profile = SpeedProfile::default();
        assert!((profile.multiplier(0.0) - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_full_speed_outside_zone() {
        let profile = SpeedProfile::default();
        assert_eq!(profile.multiplier(1.2), 1.0);
        assert_eq!(profile.multiplier(PI), 1.0);
        assert_eq!(profile.speed(0.02, PI), 0.02);
    }

    #[test]
    fn test_symmetric_around_pole() {
        let profile = SpeedProfile::default();
        for d in [0.01, 0.1, 0.5, 1.0] {
            assert!((profile.multiplier(d) - profile.multiplier(TAU - d)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_monotonic_inside_zone() {
        let profile = SpeedProfile::default();
        let mut last = profile.multiplier(0.0);
        for i in 1..=120 {
            let m = profile.multiplier(i as f64 * 0.01);
            assert!(m >= last, "multiplier dropped at {}", i);
            last = m;
        }
        assert!((last - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_profile() {
        let profile = SpeedProfile::flat();
        assert_eq!(profile.multiplier(0.0), 1.0);
        assert_eq!(profile.multiplier(2.0), 1.0);
    }

    #[test]
    fn test_sanitize_orders_multipliers() {
        let mut profile =
            SpeedProfile { deceleration_zone: f64::NAN, min_multiplier: 5.0, max_multiplier: 2.0 };
        profile.sanitize();
        assert_eq!(profile.deceleration_zone, 1.2);
        assert_eq!(profile.min_multiplier, 2.0);
        assert_eq!(profile.max_multiplier, 2.0);
    }
}
