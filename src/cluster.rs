//! Geographic clustering of delivery points, one group per rider.

use linfa::prelude::*;
use linfa_clustering::KMeans;
use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use crate::error::PlanError;
use crate::models::validate_coordinate;
use crate::traits::LatLng;

/// K-means tuning. Fixed seed so identical inputs give identical partitions.
#[derive(Debug, Clone)]
pub struct ClusterOptions {
    pub seed: u64,
    /// Independent k-means++ restarts; the best inertia wins.
    pub n_runs: usize,
    pub max_iterations: u64,
    pub tolerance: f64,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            seed: 42,
            n_runs: 100,
            max_iterations: 1000,
            tolerance: 1e-4,
        }
    }
}

/// Partition `points` into exactly `k` groups.
///
/// The depot is not a clustering input; it is only validated here and
/// prepended by callers when a group is turned into a route. With `k == 1`
/// the points come back unchanged, in input order. An underlying k-means
/// group may come back empty when points coincide.
pub fn cluster(
    points: &[LatLng],
    depot: LatLng,
    k: usize,
    options: &ClusterOptions,
) -> Result<Vec<Vec<LatLng>>, PlanError> {
    if k < 1 {
        return Err(PlanError::invalid("number of clusters must be at least 1"));
    }
    if points.len() < k {
        return Err(PlanError::invalid(format!(
            "number of clusters ({}) cannot exceed number of delivery points ({})",
            k,
            points.len()
        )));
    }
    validate_coordinate(depot)?;
    for point in points {
        validate_coordinate(*point)?;
    }

    if k == 1 {
        return Ok(vec![points.to_vec()]);
    }

    // Repeated coordinates (one customer, several orders) can leave fewer
    // distinct locations than clusters; then each location is its own group.
    let locations = distinct_locations(points);
    if locations.len() <= k {
        let mut groups: Vec<Vec<LatLng>> = vec![Vec::new(); k];
        for point in points {
            let slot = locations
                .iter()
                .position(|location| same_location(*location, *point))
                .unwrap_or(0);
            groups[slot].push(*point);
        }
        debug!(k, distinct = locations.len(), "fewer distinct locations than clusters");
        return Ok(groups);
    }

    let observations = Array2::from_shape_vec(
        (points.len(), 2),
        points.iter().flat_map(|(lat, lng)| [*lat, *lng]).collect(),
    )
    .map_err(|err| PlanError::Unexpected(format!("cannot shape observations: {}", err)))?;
    let dataset = Dataset::from(observations);

    let rng = StdRng::seed_from_u64(options.seed);
    let model = KMeans::params_with_rng(k, rng)
        .n_runs(options.n_runs)
        .max_n_iterations(options.max_iterations)
        .tolerance(options.tolerance)
        .fit(&dataset)
        .map_err(|err| PlanError::Unexpected(format!("k-means failed: {}", err)))?;
    let labels: Array1<usize> = model.predict(dataset.records());

    let mut groups: Vec<Vec<LatLng>> = vec![Vec::new(); k];
    for (point, &label) in points.iter().zip(labels.iter()) {
        let group = groups.get_mut(label).ok_or_else(|| {
            PlanError::Unexpected(format!("k-means produced label {} for k = {}", label, k))
        })?;
        group.push(*point);
    }

    debug!(
        k,
        sizes = ?groups.iter().map(Vec::len).collect::<Vec<_>>(),
        "clustered delivery points"
    );
    Ok(groups)
}

/// Split every group larger than `max_size` into near-equal slices.
///
/// Oversized groups are ordered by bearing around the depot (a sweep) and cut
/// into `ceil(len / max_size)` contiguous slices, so each slice stays a
/// compact wedge. Groups within the limit pass through untouched.
pub fn split_oversized(
    groups: Vec<Vec<LatLng>>,
    depot: LatLng,
    max_size: usize,
) -> Vec<Vec<LatLng>> {
    let max_size = max_size.max(1);
    let mut result = Vec::with_capacity(groups.len());

    for group in groups {
        if group.len() <= max_size {
            result.push(group);
            continue;
        }

        let mut swept = group;
        swept.sort_by(|a, b| bearing(depot, *a).total_cmp(&bearing(depot, *b)));

        let pieces = swept.len().div_ceil(max_size);
        let base = swept.len() / pieces;
        let extra = swept.len() % pieces;
        debug!(size = swept.len(), pieces, max_size, "splitting oversized cluster");

        let mut rest = swept.as_slice();
        for i in 0..pieces {
            let take = base + usize::from(i < extra);
            let (head, tail) = rest.split_at(take);
            result.push(head.to_vec());
            rest = tail;
        }
    }

    result
}

fn same_location(a: LatLng, b: LatLng) -> bool {
    a.0.to_bits() == b.0.to_bits() && a.1.to_bits() == b.1.to_bits()
}

fn distinct_locations(points: &[LatLng]) -> Vec<LatLng> {
    let mut locations: Vec<LatLng> = Vec::new();
    for point in points {
        if !locations.iter().any(|location| same_location(*location, *point)) {
            locations.push(*point);
        }
    }
    locations
}

fn bearing(origin: LatLng, point: LatLng) -> f64 {
    (point.0 - origin.0).atan2(point.1 - origin.1)
}
