//! Haversine distance matrix provider (offline fallback when OSRM is unavailable).
//!
//! Uses great-circle distance in meters. Less accurate than OSRM (ignores
//! roads) but needs no network.

use crate::error::PlanError;
use crate::models::validate_coordinate;
use crate::traits::{DistanceMatrixProvider, LatLng};

/// Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine-based distance matrix provider.
///
/// Multiplies the straight-line distance by `detour_factor` to roughly
/// approximate road distance.
#[derive(Debug, Clone)]
pub struct HaversineMatrix {
    pub detour_factor: f64,
}

impl Default for HaversineMatrix {
    fn default() -> Self {
        Self { detour_factor: 1.0 }
    }
}

impl HaversineMatrix {
    pub fn new(detour_factor: f64) -> Self {
        Self { detour_factor }
    }

    /// Great-circle distance between two points in meters.
    pub fn haversine_m(from: LatLng, to: LatLng) -> f64 {
        let (lat1, lng1) = from;
        let (lat2, lng2) = to;

        let lat1_rad = lat1.to_radians();
        let lat2_rad = lat2.to_radians();
        let delta_lat = (lat2 - lat1).to_radians();
        let delta_lng = (lng2 - lng1).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_M * c
    }
}

impl DistanceMatrixProvider for HaversineMatrix {
    fn matrix_for(&self, locations: &[LatLng]) -> Result<Vec<Vec<f64>>, PlanError> {
        for location in locations {
            validate_coordinate(*location)?;
        }

        let n = locations.len();
        let mut matrix = vec![vec![0.0; n]; n];

        for (i, from) in locations.iter().enumerate() {
            for (j, to) in locations.iter().enumerate().skip(i + 1) {
                let meters = Self::haversine_m(*from, *to) * self.detour_factor;
                matrix[i][j] = meters;
                matrix[j][i] = meters;
            }
        }

        Ok(matrix)
    }
}
