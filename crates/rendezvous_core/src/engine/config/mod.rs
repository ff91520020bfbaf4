//! # Scheduler Configuration
//!
//! All tuning constants for selection, motion and timing in one place.
//!
//! ## Usage
//! ```rust
//! use rendezvous_core::engine::config::SchedulerConfig;
//!
//! let config = SchedulerConfig::default();
//! let instant = SchedulerConfig::instant();
//! ```

mod motion_config;
mod selection_config;

pub use motion_config::{
    clamp_angular_speed, clamp_pause_ms, MotionConfig, MAX_NEAR_ORIGIN_TOLERANCE, MIN_ANGULAR_SPEED,
    MIN_NEAR_ORIGIN_TOLERANCE,
};
pub use selection_config::SelectionConfig;

use serde::{Deserialize, Serialize};

/// Full scheduler setup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seed of the single random stream behind every heading draw (default: 42)
    pub seed: u64,
    pub selection: SelectionConfig,
    pub motion: MotionConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { seed: 42, selection: SelectionConfig::default(), motion: MotionConfig::default() }
    }
}

impl SchedulerConfig {
    /// Reference behaviour (800 ms pause, Q=8)
    pub fn realistic() -> Self {
        Self::default()
    }

    /// Direction changes happen the moment tokens meet
    pub fn instant() -> Self {
        let mut cfg = Self::default();
        cfg.motion.pause_duration_ms = 0;
        cfg
    }

    /// Even quantization only, opposition always excluded
    pub fn strict() -> Self {
        let mut cfg = Self::default();
        cfg.selection.force_even = true;
        cfg.selection.allow_opposition_when_coarse = false;
        cfg
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn sanitize(&mut self) {
        self.selection.sanitize();
        self.motion.sanitize();
    }

    /// Sanitized copy.
    pub fn sanitized(mut self) -> Self {
        self.sanitize();
        self
    }
}

// ========== Tests ==========

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_default_config() {
        let cfg = SchedulerConfig::default();
        assert_eq!(cfg.selection.quantization, 8);
        assert!(cfg.selection.allow_opposition_when_coarse);
        assert_eq!(cfg.motion.pause_duration_ms, 800);
        assert!((cfg.motion.angular_speed - 0.02).abs() < 1e-12);
        assert_eq!(cfg.motion.min_travel_distance, FRAC_PI_2);
        assert!(cfg.motion.post_change_distance > cfg.motion.near_origin_tolerance);
    }

    #[test]
    fn test_presets() {
        assert_eq!(SchedulerConfig::instant().motion.pause_duration_ms, 0);
        let strict = SchedulerConfig::strict();
        assert!(strict.selection.force_even);
        assert!(!strict.selection.allow_opposition_when_coarse);
        assert_eq!(SchedulerConfig::realistic(), SchedulerConfig::default());
    }

    #[test]
    fn test_sanitize_clamps_out_of_range() {
        let mut cfg = SchedulerConfig::default();
        cfg.selection.quantization = 1;
        cfg.motion.angular_speed = -3.0;
        cfg.motion.near_origin_tolerance = 0.05;
        cfg.motion.post_change_distance = 0.01;
        cfg.motion.initial_azimuth = -90.0;
        cfg.sanitize();

        assert_eq!(cfg.selection.quantization, 2);
        assert_eq!(cfg.motion.angular_speed, MIN_ANGULAR_SPEED);
        assert!(cfg.motion.post_change_distance > cfg.motion.near_origin_tolerance);
        assert_eq!(cfg.motion.initial_azimuth, 270.0);
    }

    #[test]
    fn test_sanitize_even_policy() {
        let mut cfg = SchedulerConfig::strict();
        cfg.selection.quantization = 7;
        assert_eq!(cfg.sanitized().selection.quantization, 8);
    }

    #[test]
    fn test_non_finite_speed_uses_default() {
        assert_eq!(clamp_angular_speed(f64::NAN), 0.02);
        assert_eq!(clamp_angular_speed(10.0), 10.0);
        assert_eq!(clamp_pause_ms(-5), 0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: SchedulerConfig =
            serde_json::from_str(r#"{"seed": 7, "motion": {"pause_duration_ms": 0}}"#).unwrap();
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.motion.pause_duration_ms, 0);
        assert_eq!(cfg.selection.quantization, 8);
        assert!((cfg.motion.angular_speed - 0.02).abs() < 1e-12);
    }
}
