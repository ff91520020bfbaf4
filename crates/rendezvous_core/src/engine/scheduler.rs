//! Convergence scheduler
//!
//! Drives two phase-locked tokens along great circles through a shared pole:
//! travel, meet, pause, split along freshly drawn headings, repeat.
//!
//! ## Tick
//! - Away from the pole: both paths advance by the same shaped step.
//! - At the pole after enough travel: pause (or change heading at once when
//!   the pause is zero). While paused both tokens are reported at the pole.
//! - Pause over (wall clock, not tick count): draw new headings, primary
//!   first, secondary constrained by the primary's choice.
//!
//! The scheduler owns the only random stream, so a seed fixes the whole dance.

use std::f64::consts::TAU;

use nalgebra::Vector3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::angles::opposite;
use super::config::{clamp_angular_speed, clamp_pause_ms, SchedulerConfig};
use super::events::{EventQueue, SchedulerEvent};
use super::geodesic::{convergence_point, GeodesicPath};
use super::selector::QuantizedAzimuthSelector;
use crate::error::{RendezvousError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Traveling,
    Frozen,
}

/// Pause bookkeeping; reset whenever a pause ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FreezeState {
    frozen: bool,
    start_ms: u64,
}

impl FreezeState {
    pub fn begin(&mut self, now_ms: u64) {
        self.frozen = true;
        self.start_ms = now_ms;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn start_ms(&self) -> u64 {
        self.start_ms
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.start_ms)
    }
}

/// Display positions on the unit sphere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Positions {
    pub primary: Vector3<f64>,
    pub secondary: Vector3<f64>,
}

/// Unit tangents of both paths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Velocities {
    pub primary: Vector3<f64>,
    pub secondary: Vector3<f64>,
}

/// Read-only snapshot for diagnostics and UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub frozen: bool,
    pub phase: Phase,
    /// 0.0 when travelling, 0.0..=1.0 through a pause
    pub freeze_progress: f64,
    pub primary_azimuth: f64,
    pub secondary_azimuth: f64,
    pub primary_distance: f64,
    pub secondary_distance: f64,
    pub speed_multiplier: f64,
    pub quantization: u32,
    pub pause_duration_ms: u64,
    pub angular_speed: f64,
    pub frame: u64,
    pub direction_changes: u64,
    pub halt_reason: Option<String>,
}

pub struct ConvergenceScheduler {
    config: SchedulerConfig,
    selector: QuantizedAzimuthSelector,
    rng: ChaCha8Rng,
    primary: GeodesicPath,
    secondary: GeodesicPath,
    freeze: FreezeState,
    last_change_distance: f64,
    /// Arc length since the last heading change, unwrapped
    travel_since_change: f64,
    running: bool,
    halt_reason: Option<String>,
    frame: u64,
    last_tick_ms: Option<u64>,
    direction_changes: u64,
    events: EventQueue,
}

impl Default for ConvergenceScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl ConvergenceScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let config = config.sanitized();
        let motion = config.motion;
        Self {
            selector: QuantizedAzimuthSelector::new(&config.selection),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            primary: GeodesicPath::new(motion.initial_azimuth, motion.post_change_distance),
            secondary: GeodesicPath::new(
                opposite(motion.initial_azimuth),
                motion.post_change_distance,
            ),
            freeze: FreezeState::default(),
            last_change_distance: motion.post_change_distance,
            travel_since_change: 0.0,
            running: false,
            halt_reason: None,
            frame: 0,
            last_tick_ms: None,
            direction_changes: 0,
            events: EventQueue::new(),
            config,
        }
    }

    // ========== Configuration ==========

    /// Runtime policy setters in one call. Out-of-range values are clamped.
    pub fn configure(
        &mut self,
        quantization: impl Into<f64>,
        pause_duration_ms: i64,
        angular_speed: f64,
    ) {
        self.set_quantization(quantization);
        self.set_pause_duration_ms(pause_duration_ms);
        self.set_angular_speed(angular_speed);
    }

    /// Applies to the next heading draw; paths in flight keep their heading.
    pub fn set_quantization(&mut self, requested: impl Into<f64>) -> u32 {
        let requested = requested.into();
        let quantization = self.selector.set_quantization(requested);
        if !requested.is_finite() || quantization as f64 != requested.floor() {
            warn!(requested, quantization, "quantization clamped");
        }
        info!(requested, quantization, "quantization set");
        self.config.selection.quantization = quantization;
        self.events.push(SchedulerEvent::QuantizationChanged { quantization });
        quantization
    }

    pub fn set_pause_duration_ms(&mut self, pause_duration_ms: i64) -> u64 {
        let pause = clamp_pause_ms(pause_duration_ms);
        if pause_duration_ms < 0 {
            warn!(requested = pause_duration_ms, "negative pause duration clamped to 0");
        }
        self.config.motion.pause_duration_ms = pause;
        pause
    }

    pub fn set_angular_speed(&mut self, angular_speed: f64) -> f64 {
        let speed = clamp_angular_speed(angular_speed);
        if speed != angular_speed {
            warn!(requested = angular_speed, speed, "angular speed clamped");
        }
        self.config.motion.angular_speed = speed;
        speed
    }

    pub fn set_policy(&mut self, force_even: bool, allow_opposition_when_coarse: bool) {
        self.selector.set_policy(force_even, allow_opposition_when_coarse);
        self.config.selection = self.selector.policy();
    }

    /// Restart the random stream.
    pub fn reseed(&mut self, seed: u64) {
        self.config.seed = seed;
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    // ========== Lifecycle ==========

    pub fn start(&mut self) {
        if self.running {
            warn!("start ignored: already running");
            return;
        }
        if let Some(reason) = &self.halt_reason {
            warn!(%reason, "start ignored: scheduler halted, reset first");
            return;
        }
        self.running = true;
        info!(
            primary_azimuth = self.primary.azimuth(),
            secondary_azimuth = self.secondary.azimuth(),
            "scheduler started"
        );
        self.events.push(SchedulerEvent::Started);
    }

    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        info!(frame = self.frame, "scheduler stopped");
        self.events.push(SchedulerEvent::Stopped);
    }

    /// Stop and put both tokens back on their initial headings.
    pub fn reset(&mut self) {
        self.stop();
        let motion = self.config.motion;
        self.primary = GeodesicPath::new(motion.initial_azimuth, motion.post_change_distance);
        self.secondary =
            GeodesicPath::new(opposite(motion.initial_azimuth), motion.post_change_distance);
        self.freeze.clear();
        self.last_change_distance = motion.post_change_distance;
        self.travel_since_change = 0.0;
        self.halt_reason = None;
        self.frame = 0;
        self.last_tick_ms = None;
        self.direction_changes = 0;
        info!("scheduler reset");
        self.events.push(SchedulerEvent::Reset);
    }

    // ========== Tick ==========

    /// One animation frame. `now_ms` is wall-clock time in milliseconds.
    pub fn tick(&mut self, now_ms: u64) {
        if !self.running {
            return;
        }
        self.frame += 1;
        self.last_tick_ms = Some(now_ms);

        if !self.primary.is_near_origin(self.config.motion.near_origin_tolerance) {
            self.freeze.clear();
            self.advance_paths();
            return;
        }

        if let Err(err) = self.handle_convergence(now_ms) {
            self.halt(err);
        }
    }

    fn handle_convergence(&mut self, now_ms: u64) -> Result<()> {
        let motion = self.config.motion;

        if !self.freeze.is_frozen() && self.travel_since_change > motion.min_travel_distance {
            if motion.pause_duration_ms == 0 {
                return self.change_direction(now_ms, false);
            }
            self.freeze.begin(now_ms);
            debug!(at_ms = now_ms, pause_ms = motion.pause_duration_ms, "freeze started");
            self.events.push(SchedulerEvent::FreezeStarted { at_ms: now_ms });
            return Ok(());
        }

        if self.freeze.is_frozen() {
            let elapsed_ms = self.freeze.elapsed_ms(now_ms);
            if elapsed_ms >= motion.pause_duration_ms {
                self.freeze.clear();
                debug!(at_ms = now_ms, elapsed_ms, "freeze ended");
                self.events.push(SchedulerEvent::FreezeEnded { at_ms: now_ms, elapsed_ms });
                return self.change_direction(now_ms, true);
            }
            return Ok(());
        }

        // At the pole without enough travel since the last change: keep moving
        self.advance_paths();
        Ok(())
    }

    /// Advance both paths by one shaped step, stopping exactly on the pole
    /// when the step would carry the primary past it.
    fn advance_paths(&mut self) {
        let to_pole = TAU - self.primary.angular_distance();
        let step = self.current_step().min(to_pole);
        self.primary.advance(step);
        self.secondary.advance(step);
        self.travel_since_change += step;
    }

    fn current_step(&self) -> f64 {
        let motion = &self.config.motion;
        motion.speed.speed(motion.angular_speed, self.primary.angular_distance())
    }

    fn change_direction(&mut self, now_ms: u64, frozen_before: bool) -> Result<()> {
        let primary_azimuth =
            self.selector.next_azimuth(self.primary.azimuth(), None, &mut self.rng);
        let secondary_azimuth = self.selector.next_azimuth(
            self.secondary.azimuth(),
            Some(primary_azimuth),
            &mut self.rng,
        );

        if !primary_azimuth.is_finite() || !secondary_azimuth.is_finite() {
            return Err(RendezvousError::SchedulerHalt {
                reason: format!(
                    "non-finite azimuth after direction change: primary={}, secondary={}",
                    primary_azimuth, secondary_azimuth
                ),
            });
        }

        let restart = self.config.motion.post_change_distance;
        self.primary.redirect(primary_azimuth, restart);
        self.secondary.redirect(secondary_azimuth, restart);
        self.last_change_distance = restart;
        self.travel_since_change = 0.0;
        self.direction_changes += 1;

        debug!(primary_azimuth, secondary_azimuth, frozen_before, "direction changed");
        self.events.push(SchedulerEvent::DirectionChanged {
            at_ms: now_ms,
            primary_azimuth,
            secondary_azimuth,
            frozen_before,
        });
        Ok(())
    }

    fn halt(&mut self, err: RendezvousError) {
        let reason = err.to_string();
        error!(%reason, frame = self.frame, "scheduler halted");
        self.running = false;
        self.halt_reason = Some(reason.clone());
        self.events.push(SchedulerEvent::Halted { reason });
    }

    // ========== Observation ==========

    /// Token positions; both sit on the pole while paused.
    pub fn positions(&self) -> Positions {
        if self.freeze.is_frozen() {
            let pole = convergence_point();
            return Positions { primary: pole, secondary: pole };
        }
        Positions { primary: self.primary.position(), secondary: self.secondary.position() }
    }

    pub fn velocities(&self) -> Velocities {
        Velocities {
            primary: self.primary.velocity_direction(),
            secondary: self.secondary.velocity_direction(),
        }
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.config.motion.speed.multiplier(self.primary.angular_distance())
    }

    /// Pause progress as of `now_ms`.
    pub fn freeze_progress_at(&self, now_ms: u64) -> f64 {
        if !self.freeze.is_frozen() {
            return 0.0;
        }
        let pause = self.config.motion.pause_duration_ms;
        if pause == 0 {
            return 1.0;
        }
        (self.freeze.elapsed_ms(now_ms) as f64 / pause as f64).clamp(0.0, 1.0)
    }

    /// Pause progress as of the last tick.
    pub fn freeze_progress(&self) -> f64 {
        self.freeze_progress_at(self.last_tick_ms.unwrap_or_else(|| self.freeze.start_ms()))
    }

    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            running: self.running,
            frozen: self.freeze.is_frozen(),
            phase: self.phase(),
            freeze_progress: self.freeze_progress(),
            primary_azimuth: self.primary.azimuth(),
            secondary_azimuth: self.secondary.azimuth(),
            primary_distance: self.primary.angular_distance(),
            secondary_distance: self.secondary.angular_distance(),
            speed_multiplier: self.speed_multiplier(),
            quantization: self.selector.quantization(),
            pause_duration_ms: self.config.motion.pause_duration_ms,
            angular_speed: self.config.motion.angular_speed,
            frame: self.frame,
            direction_changes: self.direction_changes,
            halt_reason: self.halt_reason.clone(),
        }
    }

    pub fn phase(&self) -> Phase {
        if self.freeze.is_frozen() {
            Phase::Frozen
        } else {
            Phase::Traveling
        }
    }

    pub fn drain_events(&mut self) -> Vec<SchedulerEvent> {
        self.events.drain()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_frozen(&self) -> bool {
        self.freeze.is_frozen()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn selector(&self) -> &QuantizedAzimuthSelector {
        &self.selector
    }

    pub fn primary(&self) -> &GeodesicPath {
        &self.primary
    }

    pub fn secondary(&self) -> &GeodesicPath {
        &self.secondary
    }

    pub fn last_change_distance(&self) -> f64 {
        self.last_change_distance
    }

    pub fn travel_since_change(&self) -> f64 {
        self.travel_since_change
    }
}
