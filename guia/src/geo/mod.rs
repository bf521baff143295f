//! Geographic primitives
//!
//! Provides the [`Coordinate`] value type and great-circle distance between
//! two coordinates using the Haversine formula.

mod types;

pub use types::{Coordinate, CoordError, EARTH_RADIUS_M, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

/// Computes the great-circle distance between two coordinates in meters.
///
/// Uses the Haversine formula with a spherical Earth of radius
/// [`EARTH_RADIUS_M`]. The result is symmetric and exactly zero for identical
/// inputs. Inputs are not validated: NaN propagates to the result.
///
/// # Example
///
/// ```
/// use guia::geo::{distance, Coordinate};
///
/// let paulista = Coordinate { latitude: -23.5614, longitude: -46.6559 };
/// let se = Coordinate { latitude: -23.5505, longitude: -46.6333 };
/// let meters = distance(&paulista, &se);
/// assert!(meters > 2_000.0 && meters < 3_000.0);
/// ```
#[inline]
pub fn distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    // Absolute deltas keep the result bit-identical when arguments are swapped
    let d_phi = (b.latitude - a.latitude).abs().to_radians();
    let d_lambda = (b.longitude - a.longitude).abs().to_radians();

    let sin_phi = (d_phi / 2.0).sin();
    let sin_lambda = (d_lambda / 2.0).sin();
    let h = sin_phi * sin_phi + phi1.cos() * phi2.cos() * sin_lambda * sin_lambda;

    // Rounding can push h marginally above 1 for antipodal points
    let h = if h > 1.0 { 1.0 } else { h };
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}
