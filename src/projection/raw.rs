//! Raw projection formulas on the unit sphere (radians in, unit plane out)
//!
//! The y axis points north here; the pixel flip happens in [`super::factory`].

use crate::core::geo::MAX_LATITUDE;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

const EPSILON: f64 = 1e-9;
const NEWTON_ITERATIONS: usize = 25;

/// A raw forward/inverse pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawProjection {
    Mercator,
    EqualEarth,
    NaturalEarth,
}

impl RawProjection {
    pub fn forward(&self, lambda: f64, phi: f64) -> Option<(f64, f64)> {
        let (x, y) = match self {
            RawProjection::Mercator => mercator(lambda, phi),
            RawProjection::EqualEarth => equal_earth(lambda, phi),
            RawProjection::NaturalEarth => natural_earth(lambda, phi),
        };
        (x.is_finite() && y.is_finite()).then_some((x, y))
    }

    pub fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let (lambda, phi) = match self {
            RawProjection::Mercator => mercator_invert(x, y),
            RawProjection::EqualEarth => equal_earth_invert(x, y)?,
            RawProjection::NaturalEarth => natural_earth_invert(x, y)?,
        };
        if !(lambda.is_finite() && phi.is_finite()) || lambda.abs() > PI + EPSILON {
            return None;
        }
        Some((lambda, phi))
    }

    /// Width and height of the projected world outline at scale 1
    pub fn world_extent(&self) -> (f64, f64) {
        let max_phi = match self {
            RawProjection::Mercator => MAX_LATITUDE.to_radians(),
            _ => FRAC_PI_2,
        };
        let (x, _) = self.forward(PI, 0.0).unwrap_or((PI, 0.0));
        let (_, y) = self.forward(0.0, max_phi).unwrap_or((0.0, FRAC_PI_2));
        (2.0 * x, 2.0 * y)
    }
}

fn mercator(lambda: f64, phi: f64) -> (f64, f64) {
    let phi = phi.clamp(-MAX_LATITUDE.to_radians(), MAX_LATITUDE.to_radians());
    (lambda, (FRAC_PI_4 + phi / 2.0).tan().ln())
}

fn mercator_invert(x: f64, y: f64) -> (f64, f64) {
    (x, 2.0 * y.exp().atan() - FRAC_PI_2)
}

// Equal Earth polynomial coefficients
const A1: f64 = 1.340264;
const A2: f64 = -0.081106;
const A3: f64 = 0.000893;
const A4: f64 = 0.003796;

fn equal_earth_m() -> f64 {
    3f64.sqrt() / 2.0
}

fn equal_earth(lambda: f64, phi: f64) -> (f64, f64) {
    let m = equal_earth_m();
    let l = (m * phi.sin()).asin();
    let l2 = l * l;
    let l6 = l2 * l2 * l2;
    (
        lambda * l.cos() / (m * (A1 + 3.0 * A2 * l2 + l6 * (7.0 * A3 + 9.0 * A4 * l2))),
        l * (A1 + A2 * l2 + l6 * (A3 + A4 * l2)),
    )
}

fn equal_earth_invert(x: f64, y: f64) -> Option<(f64, f64)> {
    let m = equal_earth_m();
    let mut l = y;
    let mut l2 = l * l;
    let mut l6 = l2 * l2 * l2;
    for _ in 0..NEWTON_ITERATIONS {
        let fy = l * (A1 + A2 * l2 + l6 * (A3 + A4 * l2)) - y;
        let fpy = A1 + 3.0 * A2 * l2 + l6 * (7.0 * A3 + 9.0 * A4 * l2);
        let delta = fy / fpy;
        l -= delta;
        l2 = l * l;
        l6 = l2 * l2 * l2;
        if delta.abs() < 1e-12 {
            break;
        }
    }
    let sin_phi = l.sin() / m;
    if sin_phi.abs() > 1.0 + EPSILON {
        return None;
    }
    Some((
        m * x * (A1 + 3.0 * A2 * l2 + l6 * (7.0 * A3 + 9.0 * A4 * l2)) / l.cos(),
        sin_phi.clamp(-1.0, 1.0).asin(),
    ))
}

/// Natural Earth horizontal stretch at `phi`
fn natural_earth_x_factor(phi: f64) -> f64 {
    let phi2 = phi * phi;
    let phi4 = phi2 * phi2;
    0.8707 - 0.131979 * phi2 + phi4 * (-0.013791 + phi4 * (0.003971 * phi2 - 0.001529 * phi4))
}

fn natural_earth_y(phi: f64) -> f64 {
    let phi2 = phi * phi;
    let phi4 = phi2 * phi2;
    phi * (1.007226 + phi2 * (0.015085 + phi4 * (-0.044475 + 0.028874 * phi2 - 0.005916 * phi4)))
}

/// Derivative of [`natural_earth_y`]
fn natural_earth_dy(phi: f64) -> f64 {
    let phi2 = phi * phi;
    let phi4 = phi2 * phi2;
    let tail = -0.044475 * 7.0 + 0.028874 * 9.0 * phi2 - 0.005916 * 11.0 * phi4;
    1.007226 + phi2 * (0.015085 * 3.0 + phi4 * tail)
}

fn natural_earth(lambda: f64, phi: f64) -> (f64, f64) {
    (lambda * natural_earth_x_factor(phi), natural_earth_y(phi))
}

fn natural_earth_invert(x: f64, y: f64) -> Option<(f64, f64)> {
    let mut phi = y;
    for _ in 0..NEWTON_ITERATIONS {
        let delta = (natural_earth_y(phi) - y) / natural_earth_dy(phi);
        phi -= delta;
        if delta.abs() <= EPSILON {
            break;
        }
    }
    if phi.abs() > FRAC_PI_2 + EPSILON {
        return None;
    }
    Some((x / natural_earth_x_factor(phi), phi))
}
