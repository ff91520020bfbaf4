//! Azimuth arithmetic helpers
//!
//! All functions are pure - degrees in, degrees out.
//! Compass convention: 0° and 180° lie on the equator's reference axis,
//! angles increase clockwise, results live in `[0, 360)`.

/// Tolerance used when comparing two azimuths for equality (degrees).
pub const ANGLE_EPSILON_DEG: f64 = 1.0e-9;

/// Wrap any angle into `[0, 360)`.
#[inline]
pub fn normalize_deg(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Smallest angular difference between two azimuths, in `[0, 180]`.
#[inline]
pub fn angular_difference(a: f64, b: f64) -> f64 {
    let diff = (normalize_deg(a) - normalize_deg(b)).abs();
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Azimuth equality up to [`ANGLE_EPSILON_DEG`], wrap-aware (359.999… == 0).
#[inline]
pub fn same_azimuth(a: f64, b: f64) -> bool {
    angular_difference(a, b) < ANGLE_EPSILON_DEG
}

/// The heading pointing the other way.
#[inline]
pub fn opposite(azimuth: f64) -> f64 {
    normalize_deg(azimuth + 180.0)
}

/// Unnormalized Gaussian kernel `exp(-0.5 (x/σ)²)`: 1.0 at zero deviation.
#[inline]
pub fn gaussian_weight(deviation: f64, sigma: f64) -> f64 {
    let normalized = deviation / sigma;
    (-0.5 * normalized * normalized).exp()
}
