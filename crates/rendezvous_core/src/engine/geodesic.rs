//! Great-circle path through the convergence point
//!
//! A path is fully described by its departure heading and the arc length
//! travelled since departure. The convergence point is the pole `(0, 0, 1)`
//! at `angular_distance = 0`; the antipode is reached at `π`.

use std::f64::consts::TAU;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// The shared pole both tokens pass through.
pub fn convergence_point() -> Vector3<f64> {
    Vector3::new(0.0, 0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodesicPath {
    /// Departure heading (degrees, `[0, 360)`)
    azimuth_from_origin: f64,
    /// Arc length since departure (radians, `[0, 2π)`)
    angular_distance: f64,
}

impl GeodesicPath {
    pub fn new(azimuth_from_origin: f64, angular_distance: f64) -> Self {
        Self { azimuth_from_origin, angular_distance: wrap_distance(angular_distance) }
    }

    pub fn azimuth(&self) -> f64 {
        self.azimuth_from_origin
    }

    pub fn angular_distance(&self) -> f64 {
        self.angular_distance
    }

    /// Depart again along `azimuth`, already `angular_distance` away from the pole.
    pub fn redirect(&mut self, azimuth: f64, angular_distance: f64) {
        self.azimuth_from_origin = azimuth;
        self.angular_distance = wrap_distance(angular_distance);
    }

    /// Unit heading in the tangent plane of the pole.
    fn heading(&self) -> (f64, f64) {
        let azimuth_rad = self.azimuth_from_origin.to_radians();
        (azimuth_rad.sin(), -azimuth_rad.cos())
    }

    /// Point on the unit sphere.
    pub fn position(&self) -> Vector3<f64> {
        let (dx, dy) = self.heading();
        let (sin_d, cos_d) = self.angular_distance.sin_cos();
        Vector3::new(sin_d * dx, sin_d * dy, cos_d)
    }

    /// Unit tangent: d(position)/d(angular_distance). Display only.
    pub fn velocity_direction(&self) -> Vector3<f64> {
        let (dx, dy) = self.heading();
        let (sin_d, cos_d) = self.angular_distance.sin_cos();
        Vector3::new(cos_d * dx, cos_d * dy, -sin_d)
    }

    /// Move along the arc, wrapping at a full revolution.
    pub fn advance(&mut self, delta: f64) {
        self.angular_distance = wrap_distance(self.angular_distance + delta);
    }

    /// Within `tolerance` of the pole, approaching or departing.
    pub fn is_near_origin(&self, tolerance: f64) -> bool {
        self.angular_distance < tolerance || self.angular_distance > TAU - tolerance
    }
}

#[inline]
fn wrap_distance(distance: f64) -> f64 {
    let wrapped = distance.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}
