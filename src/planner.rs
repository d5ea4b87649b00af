//! Route assignment engine: clustering → exact routing → load-aware assignment.

use std::collections::HashSet;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::cache::{PlanCache, PlanFingerprint, fingerprint};
use crate::cluster::{ClusterOptions, cluster, split_oversized};
use crate::error::PlanError;
use crate::models::{
    AssignedRoute, DEFAULT_MAX_RIDERS, DeliveryDetail, OrderRecord, PlanRequest, PlanResult,
    RiderProfile, validate_coordinate,
};
use crate::solver::{MAX_EXACT_NODES, solve_tour};
use crate::traits::{DistanceMatrixProvider, LatLng, PlanStore, RecordProvider};

#[derive(Debug, Clone)]
pub struct PlannerOptions {
    /// Largest `num_riders` a request may ask for.
    pub max_riders: usize,
    /// Largest number of stops routed as one exact tour; bigger clusters are split.
    pub max_cluster_size: usize,
    /// Solve clusters on the rayon pool.
    pub parallel: bool,
    pub cluster: ClusterOptions,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            max_riders: DEFAULT_MAX_RIDERS,
            max_cluster_size: 15,
            parallel: true,
            cluster: ClusterOptions::default(),
        }
    }
}

/// One solved cluster before it is given to a rider.
#[derive(Debug, Clone, PartialEq)]
pub struct SolvedRoute {
    /// Closed path: depot, stops..., depot.
    pub route: Vec<LatLng>,
    pub cost: f64,
}

pub struct RouteAssignmentEngine<R, M, S> {
    records: R,
    matrix_provider: M,
    cache: PlanCache<S>,
    options: PlannerOptions,
}

impl<R, M, S> RouteAssignmentEngine<R, M, S>
where
    R: RecordProvider,
    M: DistanceMatrixProvider + Sync,
    S: PlanStore,
{
    pub fn new(records: R, matrix_provider: M, store: S, options: PlannerOptions) -> Self {
        Self {
            records,
            matrix_provider,
            cache: PlanCache::new(store),
            options,
        }
    }

    pub fn cache(&self) -> &PlanCache<S> {
        &self.cache
    }

    pub fn matrix_provider(&self) -> &M {
        &self.matrix_provider
    }

    /// Plan routes for one delivery date.
    ///
    /// A cached plan for the same date, riders and orders is returned verbatim.
    /// Otherwise the plan is computed and stored before returning, even if the
    /// caller discards it.
    pub fn plan(&self, request: &PlanRequest) -> Result<PlanResult, PlanError> {
        request.validate(self.options.max_riders)?;
        let date = request.delivery_date;

        let orders = self.records.orders_for(date)?;
        if orders.is_empty() {
            return Err(PlanError::invalid(format!(
                "no delivery orders found for {}",
                date
            )));
        }

        let order_ids: Vec<i64> = orders.iter().map(|order| order.id).collect();
        let fingerprint = fingerprint(date, &request.rider_names, &order_ids)?;

        let lock = self.cache.lock_for(fingerprint);
        let outcome = {
            let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            self.plan_locked(request, &orders, &fingerprint)
        };
        drop(lock);
        self.cache.release(fingerprint);
        outcome
    }

    /// Cache lookup and, on a miss, compute and store. Caller holds the fingerprint lock.
    fn plan_locked(
        &self,
        request: &PlanRequest,
        orders: &[OrderRecord],
        fingerprint: &PlanFingerprint,
    ) -> Result<PlanResult, PlanError> {
        let date = request.delivery_date;
        if let Some(payload) = self.cache.lookup(date, fingerprint)? {
            return Ok(serde_json::from_value(payload)?);
        }

        info!(
            %date,
            riders = request.num_riders,
            orders = orders.len(),
            "planning routes"
        );
        let result = self.compute(request, orders)?;

        // Return what was stored so hits and misses are indistinguishable.
        let payload = serde_json::to_value(&result)?;
        self.cache.store_result(date, fingerprint, payload.clone())?;
        Ok(serde_json::from_value(payload)?)
    }

    fn compute(&self, request: &PlanRequest, orders: &[OrderRecord]) -> Result<PlanResult, PlanError> {
        let riders = self.load_riders(&request.rider_names)?;

        let depot = self
            .records
            .depot()?
            .ok_or_else(|| PlanError::invalid("no depot configured"))?;
        let depot_coordinate = depot.coordinate()?;

        let mut deliveries = Vec::with_capacity(orders.len());
        let mut points = Vec::with_capacity(orders.len());
        for order in orders {
            let resolved = order
                .customer_coordinate
                .filter(|coordinate| validate_coordinate(*coordinate).is_ok());
            if resolved.is_none() {
                warn!(order = order.id, customer = %order.customer_name, "customer has no coordinates");
            }

            deliveries.push(DeliveryDetail {
                customer_name: order.customer_name.clone(),
                latlng: resolved.map(|(lat, lng)| format!("{},{}", lat, lng)),
                address: order.address.clone(),
                product: order.product.clone(),
                delivery_date: order.delivery_date,
                origin: depot.name.clone(),
                error: resolved
                    .is_none()
                    .then(|| format!("Customer data not found for {}", order.customer_name)),
            });
            points.extend(resolved);
        }

        let groups = cluster(
            &points,
            depot_coordinate,
            request.num_riders,
            &self.options.cluster,
        )?;
        let max_cluster_size = self.options.max_cluster_size.min(MAX_EXACT_NODES - 1);
        let groups = split_oversized(groups, depot_coordinate, max_cluster_size);

        let solved = self.solve_groups(depot_coordinate, &groups)?;
        let routes = assign_routes(solved, &riders)?;

        Ok(PlanResult {
            deliveries,
            latlng: points.iter().map(|&p| to_pair(p)).collect(),
            clusters: groups
                .iter()
                .map(|group| {
                    std::iter::once(depot_coordinate)
                        .chain(group.iter().copied())
                        .chain(std::iter::once(depot_coordinate))
                        .map(to_pair)
                        .collect()
                })
                .collect(),
            routes,
        })
    }

    /// Profiles for the distinct requested names; every name must be known.
    fn load_riders(&self, names: &[String]) -> Result<Vec<RiderProfile>, PlanError> {
        let mut seen = HashSet::new();
        let unique: Vec<String> = names
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .cloned()
            .collect();

        let riders = self.records.riders_named(&unique)?;
        let missing: Vec<&str> = unique
            .iter()
            .filter(|name| !riders.iter().any(|rider| &rider.name == *name))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(PlanError::invalid(format!(
                "rider history not found for: {}",
                missing.join(", ")
            )));
        }
        if let Some(rider) = riders
            .iter()
            .find(|rider| !rider.total_distance.is_finite() || rider.total_distance < 0.0)
        {
            return Err(PlanError::invalid(format!(
                "rider {} has an invalid historical distance",
                rider.name
            )));
        }
        Ok(riders)
    }

    fn solve_groups(
        &self,
        depot: LatLng,
        groups: &[Vec<LatLng>],
    ) -> Result<Vec<SolvedRoute>, PlanError> {
        let work: Vec<&[LatLng]> = groups
            .iter()
            .filter(|group| !group.is_empty())
            .map(Vec::as_slice)
            .collect();
        let provider = &self.matrix_provider;

        // Both paths keep cluster order, so later sorting is deterministic.
        if self.options.parallel {
            work.par_iter()
                .map(|group| solve_group(provider, depot, group))
                .collect()
        } else {
            work.iter()
                .map(|group| solve_group(provider, depot, group))
                .collect()
        }
    }
}

fn solve_group<M>(provider: &M, depot: LatLng, group: &[LatLng]) -> Result<SolvedRoute, PlanError>
where
    M: DistanceMatrixProvider + ?Sized,
{
    let mut locations = Vec::with_capacity(group.len() + 1);
    locations.push(depot);
    locations.extend_from_slice(group);

    let matrix = provider.matrix_for(&locations)?;
    check_provider_matrix(&matrix, locations.len())?;

    let tour = solve_tour(&matrix)?;
    debug!(stops = group.len(), cost = tour.cost, "solved cluster route");
    Ok(SolvedRoute {
        route: tour.order.iter().map(|&i| locations[i]).collect(),
        cost: tour.cost,
    })
}

/// A provider matrix must be `n` by `n` with no NaN or negative cells.
fn check_provider_matrix(matrix: &[Vec<f64>], n: usize) -> Result<(), PlanError> {
    if matrix.len() != n {
        return Err(PlanError::UpstreamUnavailable(format!(
            "distance matrix has {} rows for {} locations",
            matrix.len(),
            n
        )));
    }
    for (i, row) in matrix.iter().enumerate() {
        if row.len() != n {
            return Err(PlanError::UpstreamUnavailable(format!(
                "distance matrix row {} has {} entries for {} locations",
                i,
                row.len(),
                n
            )));
        }
        if row.iter().any(|value| value.is_nan() || *value < 0.0) {
            return Err(PlanError::UpstreamUnavailable(format!(
                "distance matrix row {} has a negative or NaN entry",
                i
            )));
        }
    }
    Ok(())
}

/// Give the longest routes to the least-loaded riders.
///
/// Routes are ordered by cost, longest first; riders by historical distance,
/// smallest first (ties by name). The i-th route goes to rider `i % riders`.
pub fn assign_routes(
    mut routes: Vec<SolvedRoute>,
    riders: &[RiderProfile],
) -> Result<Vec<AssignedRoute>, PlanError> {
    if riders.is_empty() {
        return Err(PlanError::invalid("at least one rider is required"));
    }

    // Stable: equal costs keep cluster order.
    routes.sort_by(|a, b| b.cost.total_cmp(&a.cost));

    let mut queue: Vec<&RiderProfile> = riders.iter().collect();
    queue.sort_by(|a, b| {
        a.total_distance
            .total_cmp(&b.total_distance)
            .then_with(|| a.name.cmp(&b.name))
    });

    Ok(routes
        .into_iter()
        .enumerate()
        .map(|(i, route)| {
            let rider = queue[i % queue.len()];
            info!(rider = %rider.name, distance = route.cost, stops = route.route.len().saturating_sub(2), "assigned route");
            AssignedRoute {
                rider_name: rider.name.clone(),
                route: route.route.into_iter().map(to_pair).collect(),
                distance: route.cost,
            }
        })
        .collect())
}

fn to_pair((lat, lng): LatLng) -> [f64; 2] {
    [lat, lng]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(cost: f64) -> SolvedRoute {
        SolvedRoute {
            route: vec![(0.0, 0.0), (cost, 0.0), (0.0, 0.0)],
            cost,
        }
    }

    #[test]
    fn test_longest_route_to_least_loaded() {
        let riders = vec![
            RiderProfile::new("C", 100.0),
            RiderProfile::new("A", 0.0),
            RiderProfile::new("B", 5.0),
        ];
        let assigned = assign_routes(vec![route(10.0), route(50.0), route(30.0)], &riders).unwrap();
        let pairs: Vec<(&str, f64)> = assigned
            .iter()
            .map(|a| (a.rider_name.as_str(), a.distance))
            .collect();
        assert_eq!(pairs, vec![("A", 50.0), ("B", 30.0), ("C", 10.0)]);
    }

    #[test]
    fn test_round_robin_when_more_routes_than_riders() {
        let riders = vec![RiderProfile::new("A", 1.0), RiderProfile::new("B", 2.0)];
        let assigned = assign_routes(
            vec![route(1.0), route(2.0), route(3.0), route(4.0), route(5.0)],
            &riders,
        )
        .unwrap();
        let names: Vec<&str> = assigned.iter().map(|a| a.rider_name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "A", "B", "A"]);
    }

    #[test]
    fn test_equal_loads_break_ties_by_name() {
        let riders = vec![RiderProfile::new("Zed", 0.0), RiderProfile::new("Amy", 0.0)];
        let assigned = assign_routes(vec![route(9.0), route(3.0)], &riders).unwrap();
        assert_eq!(assigned[0].rider_name, "Amy");
        assert_eq!(assigned[1].rider_name, "Zed");
    }

    #[test]
    fn test_malformed_provider_matrix_is_upstream_failure() {
        let ragged = vec![vec![0.0], vec![1.0], vec![1.0]];
        let nan = vec![vec![0.0, f64::NAN], vec![1.0, 0.0]];
        let negative = vec![vec![0.0, -1.0], vec![1.0, 0.0]];

        for (matrix, n) in [(ragged, 3), (nan, 2), (negative, 2)] {
            let err = check_provider_matrix(&matrix, n).unwrap_err();
            assert!(err.is_retryable(), "{:?}", err);
        }
        assert!(check_provider_matrix(&[vec![0.0, f64::INFINITY], vec![1.0, 0.0]], 2).is_ok());
    }

    #[test]
    fn test_assign_requires_riders() {
        assert!(assign_routes(vec![route(1.0)], &[]).is_err());
    }
}
