//! Mock collaborators and a record builder.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDate;

use route_planner::PlanError;
use route_planner::haversine::HaversineMatrix;
use route_planner::models::{Depot, OrderRecord, RiderProfile};
use route_planner::store::InMemoryRecords;
use route_planner::traits::{DistanceMatrixProvider, LatLng};

use super::bangkok_locations::{DEPOT, Location};

pub fn delivery_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

/// Wraps a provider and counts matrix fetches.
pub struct CountingMatrix<P> {
    inner: P,
    calls: AtomicUsize,
}

impl<P> CountingMatrix<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CountingMatrix<HaversineMatrix> {
    pub fn haversine() -> Self {
        Self::new(HaversineMatrix::default())
    }
}

impl<P: DistanceMatrixProvider> DistanceMatrixProvider for CountingMatrix<P> {
    fn matrix_for(&self, locations: &[LatLng]) -> Result<Vec<Vec<f64>>, PlanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.matrix_for(locations)
    }
}

/// Matrix built cell by cell from a cost function over coordinates.
pub struct PairMatrix(pub fn(LatLng, LatLng) -> f64);

impl DistanceMatrixProvider for PairMatrix {
    fn matrix_for(&self, locations: &[LatLng]) -> Result<Vec<Vec<f64>>, PlanError> {
        Ok(locations
            .iter()
            .map(|from| {
                locations
                    .iter()
                    .map(|to| if from == to { 0.0 } else { (self.0)(*from, *to) })
                    .collect()
            })
            .collect())
    }
}

/// Upstream that is always down.
pub struct DownMatrix;

impl DistanceMatrixProvider for DownMatrix {
    fn matrix_for(&self, _locations: &[LatLng]) -> Result<Vec<Vec<f64>>, PlanError> {
        Err(PlanError::UpstreamUnavailable("connection refused".to_string()))
    }
}

/// Upstream that answers with one entry per row regardless of size.
pub struct RaggedMatrix;

impl DistanceMatrixProvider for RaggedMatrix {
    fn matrix_for(&self, locations: &[LatLng]) -> Result<Vec<Vec<f64>>, PlanError> {
        Ok(locations.iter().map(|_| vec![1.0]).collect())
    }
}

/// Builder for in-memory planning records with sensible defaults.
pub struct World {
    records: InMemoryRecords,
    next_id: i64,
}

impl World {
    pub fn new() -> Self {
        Self {
            records: InMemoryRecords {
                depot: Some(Depot {
                    name: DEPOT.name.to_string(),
                    address: "Bang Sue, Bangkok".to_string(),
                    latlng: Some(format!("{}, {}", DEPOT.lat, DEPOT.lng)),
                }),
                riders: Vec::new(),
                orders: Vec::new(),
            },
            next_id: 1,
        }
    }

    pub fn depot_latlng(mut self, latlng: Option<&str>) -> Self {
        if let Some(depot) = self.records.depot.as_mut() {
            depot.latlng = latlng.map(str::to_string);
        }
        self
    }

    pub fn without_depot(mut self) -> Self {
        self.records.depot = None;
        self
    }

    pub fn rider(mut self, name: &str, total_distance: f64) -> Self {
        self.records.riders.push(RiderProfile::new(name, total_distance));
        self
    }

    pub fn order_at(self, customer: &str, coordinate: LatLng) -> Self {
        self.push_order(customer, Some(coordinate), delivery_date())
    }

    pub fn location(self, location: &Location) -> Self {
        self.push_order(location.name, Some(location.coords()), delivery_date())
    }

    pub fn unresolved_order(self, customer: &str) -> Self {
        self.push_order(customer, None, delivery_date())
    }

    pub fn order_on(self, customer: &str, coordinate: LatLng, date: NaiveDate) -> Self {
        self.push_order(customer, Some(coordinate), date)
    }

    fn push_order(mut self, customer: &str, coordinate: Option<LatLng>, date: NaiveDate) -> Self {
        let id = self.next_id;
        self.next_id += 1;
        self.records.orders.push(OrderRecord {
            id,
            order_number: format!("ORD20240501-{:04}", id),
            customer_name: customer.to_string(),
            address: format!("{} address", customer),
            product: "Vaccine box".to_string(),
            delivery_date: date,
            customer_coordinate: coordinate,
        });
        self
    }

    pub fn build(self) -> InMemoryRecords {
        self.records
    }
}
