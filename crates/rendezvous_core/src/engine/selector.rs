//! Quantized azimuth selection
//!
//! Picks the next heading for a token leaving the convergence point.
//!
//! ## Rules
//! - The compass is cut into `Q` equal steps starting at the entry heading.
//! - Only headings inside the forward cone survive (no reversals).
//! - With a peer heading, the exact opposite of the peer is removed so the two
//!   tokens never share one great circle in opposite directions.
//! - Survivors are sampled by roulette wheel: continuity kernel (σ=45°) times,
//!   when a peer is given, a separation kernel (σ=60°) peaked at 180°.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::angles::{
    angular_difference, gaussian_weight, normalize_deg, opposite, same_azimuth, ANGLE_EPSILON_DEG,
};
use super::config::SelectionConfig;
use crate::error::{RendezvousError, Result};

pub const DEFAULT_QUANTIZATION: u32 = 8;
pub const MIN_QUANTIZATION: u32 = 2;
pub const MAX_QUANTIZATION: u32 = 360;

/// Half-width of the forward cone around the entry heading (degrees).
/// Candidates at exactly this deviation are rejected.
pub const FORWARD_HALF_WIDTH_DEG: f64 = 90.0;

/// σ of the continuity kernel (deviation from the previous heading).
pub const CONTINUITY_SIGMA_DEG: f64 = 45.0;

/// σ of the separation kernel (deviation of the peer gap from 180°).
pub const SEPARATION_SIGMA_DEG: f64 = 60.0;

/// Weight given to a candidate identical to the peer heading.
pub const SAME_AZIMUTH_WEIGHT: f64 = 0.001;

/// Floor, clamp to `[2, 360]`, and optionally round up to even.
/// Non-finite input falls back to [`DEFAULT_QUANTIZATION`].
pub fn sanitize_quantization(requested: f64, force_even: bool) -> u32 {
    let mut q = if requested.is_finite() {
        requested.floor().clamp(MIN_QUANTIZATION as f64, MAX_QUANTIZATION as f64) as u32
    } else {
        DEFAULT_QUANTIZATION
    };
    if force_even && q % 2 != 0 {
        q += 1;
    }
    q
}

/// One sampling candidate with the factors that produced its weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedCandidate {
    pub azimuth: f64,
    /// Relative weight (not normalized)
    pub weight: f64,
    pub continuity_deviation: f64,
    /// Gap to the peer heading, when one was supplied
    pub separation: Option<f64>,
}

/// Compass layout for the current quantization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantizationRange {
    pub quantization: u32,
    pub step_deg: f64,
    /// Step indices `k` whose offset `k·step` stays inside the forward cone
    pub forward_steps: Vec<u32>,
}

/// Roulette wheel over relative weights.
///
/// Returns the first index whose cumulative weight reaches a uniform draw
/// scaled to the total. `None` when the total is not a positive finite number.
pub fn roulette_select<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Option<usize> {
    let total: f64 = weights.iter().sum();
    if weights.is_empty() || !total.is_finite() || total <= 0.0 {
        return None;
    }

    let draw = rng.gen::<f64>() * total;
    let mut cumulative = 0.0;
    for (i, w) in weights.iter().enumerate() {
        cumulative += w;
        if *w > 0.0 && cumulative >= draw {
            return Some(i);
        }
    }

    // Float residue: the draw landed past the accumulated sum
    weights.iter().rposition(|w| *w > 0.0)
}

#[derive(Debug, Clone)]
pub struct QuantizedAzimuthSelector {
    quantization: u32,
    force_even: bool,
    allow_opposition_when_coarse: bool,
}

impl Default for QuantizedAzimuthSelector {
    fn default() -> Self {
        Self::new(&SelectionConfig::default())
    }
}

impl QuantizedAzimuthSelector {
    pub fn new(config: &SelectionConfig) -> Self {
        Self {
            quantization: sanitize_quantization(config.quantization as f64, config.force_even),
            force_even: config.force_even,
            allow_opposition_when_coarse: config.allow_opposition_when_coarse,
        }
    }

    pub fn with_quantization(quantization: u32) -> Self {
        Self::new(&SelectionConfig { quantization, ..SelectionConfig::default() })
    }

    pub fn quantization(&self) -> u32 {
        self.quantization
    }

    /// Store a new quantization and return the sanitized value actually used.
    pub fn set_quantization(&mut self, requested: impl Into<f64>) -> u32 {
        let requested = requested.into();
        self.quantization = sanitize_quantization(requested, self.force_even);
        debug!(requested, sanitized = self.quantization, "quantization updated");
        self.quantization
    }

    /// Current policy as a config value.
    pub fn policy(&self) -> SelectionConfig {
        SelectionConfig {
            quantization: self.quantization,
            force_even: self.force_even,
            allow_opposition_when_coarse: self.allow_opposition_when_coarse,
        }
    }

    pub fn set_policy(&mut self, force_even: bool, allow_opposition_when_coarse: bool) {
        self.force_even = force_even;
        self.allow_opposition_when_coarse = allow_opposition_when_coarse;
        self.quantization = sanitize_quantization(self.quantization as f64, force_even);
    }

    pub fn step_deg(&self) -> f64 {
        360.0 / self.quantization as f64
    }

    /// Every quantized heading `k·step`, `k ∈ [0, Q)`.
    pub fn all_quantized_azimuths(&self) -> Vec<f64> {
        let step = self.step_deg();
        (0..self.quantization).map(|k| normalize_deg(k as f64 * step)).collect()
    }

    pub fn quantization_range(&self) -> QuantizationRange {
        let step = self.step_deg();
        let forward_steps = (0..self.quantization)
            .filter(|k| in_forward_cone(0.0, *k as f64 * step))
            .collect();
        QuantizationRange { quantization: self.quantization, step_deg: step, forward_steps }
    }

    fn forward_cone(&self, entry: f64) -> Vec<f64> {
        let step = self.step_deg();
        (0..self.quantization)
            .map(|k| normalize_deg(entry + k as f64 * step))
            .filter(|angle| in_forward_cone(entry, *angle))
            .collect()
    }

    /// Headings reachable from `entry`, minus the opposite of `peer`.
    ///
    /// Without a peer the result always contains `entry` itself. With a peer
    /// and `allow_opposition_when_coarse`, an exclusion that would empty the
    /// set is skipped.
    pub fn allowed_azimuths(&self, entry: f64, peer: Option<f64>) -> Vec<f64> {
        let forward = self.forward_cone(entry);
        let Some(peer) = peer else {
            return forward;
        };

        let blocked = opposite(peer);
        let filtered: Vec<f64> =
            forward.iter().copied().filter(|angle| !same_azimuth(*angle, blocked)).collect();

        if filtered.is_empty() && self.allow_opposition_when_coarse {
            debug!(
                entry,
                peer,
                quantization = self.quantization,
                "opposition retained: exclusion would leave no heading"
            );
            return forward;
        }
        filtered
    }

    /// Allowed headings with their sampling weights, in enumeration order.
    pub fn weighted_candidates(&self, previous: f64, peer: Option<f64>) -> Vec<WeightedCandidate> {
        self.allowed_azimuths(previous, peer)
            .into_iter()
            .map(|azimuth| {
                let continuity_deviation = angular_difference(azimuth, previous);
                let continuity = gaussian_weight(continuity_deviation, CONTINUITY_SIGMA_DEG);

                match peer {
                    None => WeightedCandidate {
                        azimuth,
                        weight: continuity,
                        continuity_deviation,
                        separation: None,
                    },
                    Some(peer) => {
                        let separation = angular_difference(azimuth, peer);
                        let weight = if same_azimuth(azimuth, peer) {
                            SAME_AZIMUTH_WEIGHT
                        } else {
                            continuity
                                * gaussian_weight((separation - 180.0).abs(), SEPARATION_SIGMA_DEG)
                        };
                        WeightedCandidate {
                            azimuth,
                            weight,
                            continuity_deviation,
                            separation: Some(separation),
                        }
                    }
                }
            })
            .collect()
    }

    /// Weighted draw; errors when nothing can be drawn.
    pub fn try_next_azimuth<R: Rng + ?Sized>(
        &self,
        previous: f64,
        peer: Option<f64>,
        rng: &mut R,
    ) -> Result<f64> {
        let candidates = self.weighted_candidates(previous, peer);
        let weights: Vec<f64> = candidates.iter().map(|c| c.weight).collect();

        match roulette_select(&weights, rng) {
            Some(idx) => {
                let chosen = candidates[idx];
                debug!(
                    previous,
                    ?peer,
                    azimuth = chosen.azimuth,
                    continuity = chosen.continuity_deviation,
                    separation = ?chosen.separation,
                    "azimuth selected"
                );
                Ok(chosen.azimuth)
            }
            None => Err(RendezvousError::DegenerateSelection {
                previous,
                peer,
                quantization: self.quantization,
            }),
        }
    }

    /// Weighted draw that never fails: degenerate cases keep `previous`.
    pub fn next_azimuth<R: Rng + ?Sized>(
        &self,
        previous: f64,
        peer: Option<f64>,
        rng: &mut R,
    ) -> f64 {
        match self.try_next_azimuth(previous, peer, rng) {
            Ok(azimuth) => azimuth,
            Err(err) => {
                debug!(%err, "keeping previous azimuth");
                previous
            }
        }
    }
}

/// Strictly inside the cone around `entry` (boundary rejected).
#[inline]
fn in_forward_cone(entry: f64, angle: f64) -> bool {
    let min_gap_from_reverse = (180.0 - FORWARD_HALF_WIDTH_DEG) + ANGLE_EPSILON_DEG;
    angular_difference(angle, opposite(entry)) > min_gap_from_reverse
}
