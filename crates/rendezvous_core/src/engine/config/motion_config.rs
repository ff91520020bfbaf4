//! Motion and timing parameters

use std::f64::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

use crate::engine::angles::normalize_deg;
use crate::engine::speed::{clamp_finite, SpeedProfile};

pub const MIN_ANGULAR_SPEED: f64 = 1.0e-4;
pub const MIN_NEAR_ORIGIN_TOLERANCE: f64 = 1.0e-6;
pub const MAX_NEAR_ORIGIN_TOLERANCE: f64 = 0.1;

/// Token kinematics and rendezvous timing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Base arc length per tick (rad) (default: 0.02, minimum 1e-4)
    pub angular_speed: f64,
    /// Wall-clock pause at the convergence point (ms) (default: 800, 0 = none)
    pub pause_duration_ms: u64,
    /// Arc length required since the last direction change before the next
    /// rendezvous counts (rad) (default: π/2)
    pub min_travel_distance: f64,
    /// Arc radius around the pole treated as "at the pole" (rad) (default: 0.005)
    pub near_origin_tolerance: f64,
    /// Arc length tokens restart at after a direction change (rad) (default: 0.02)
    pub post_change_distance: f64,
    /// Primary token's starting heading; the secondary starts opposite (default: 90)
    pub initial_azimuth: f64,
    pub speed: SpeedProfile,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            angular_speed: 0.02,
            pause_duration_ms: 800,
            min_travel_distance: FRAC_PI_2,
            near_origin_tolerance: 0.005,
            post_change_distance: 0.02,
            initial_azimuth: 90.0,
            speed: SpeedProfile::default(),
        }
    }
}

impl MotionConfig {
    /// Clamp every field into its working range.
    ///
    /// `post_change_distance` always ends up strictly above
    /// `near_origin_tolerance` so a fresh departure never reads as an arrival.
    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        self.angular_speed = clamp_angular_speed(self.angular_speed);
        self.min_travel_distance =
            clamp_finite(self.min_travel_distance, 0.0, 2.0 * PI, defaults.min_travel_distance);
        self.near_origin_tolerance = clamp_finite(
            self.near_origin_tolerance,
            MIN_NEAR_ORIGIN_TOLERANCE,
            MAX_NEAR_ORIGIN_TOLERANCE,
            defaults.near_origin_tolerance,
        );
        self.post_change_distance =
            clamp_finite(self.post_change_distance, 0.0, PI / 2.0, defaults.post_change_distance);
        if self.post_change_distance <= self.near_origin_tolerance {
            self.post_change_distance = self.near_origin_tolerance * 2.0;
        }
        self.initial_azimuth = if self.initial_azimuth.is_finite() {
            normalize_deg(self.initial_azimuth)
        } else {
            defaults.initial_azimuth
        };
        self.speed.sanitize();
    }
}

/// Non-positive speeds become the slowest allowed step; non-finite ones the default.
/// There is no upper bound: the scheduler never steps past the pole.
pub fn clamp_angular_speed(speed: f64) -> f64 {
    clamp_finite(speed, MIN_ANGULAR_SPEED, f64::MAX, MotionConfig::default().angular_speed)
}

/// Negative pauses mean "no pause".
pub fn clamp_pause_ms(pause_ms: i64) -> u64 {
    pause_ms.max(0) as u64
}
