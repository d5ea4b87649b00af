//! Seams between the planning core and its collaborators.
//!
//! The core never talks to a database or an HTTP routing engine directly.
//! Concrete apps implement these for their own storage and transport.

use chrono::NaiveDate;

use crate::cache::CachedPlanResult;
use crate::error::PlanError;
use crate::models::{Depot, OrderRecord, RiderProfile};

/// Coordinate as (latitude, longitude) in degrees.
pub type LatLng = (f64, f64);

/// Provides a travel-distance matrix for a set of locations.
///
/// The matrix is indexed by the provided location order. Implementations must
/// fail explicitly on transport or malformed-response errors rather than
/// returning an empty or zero-filled matrix. Unroutable pairs are reported as
/// `f64::INFINITY`.
pub trait DistanceMatrixProvider {
    fn matrix_for(&self, locations: &[LatLng]) -> Result<Vec<Vec<f64>>, PlanError>;
}

/// Read access to the validated records a planning run needs.
pub trait RecordProvider {
    /// Orders scheduled for `date`, with customer coordinates resolved where possible.
    fn orders_for(&self, date: NaiveDate) -> Result<Vec<OrderRecord>, PlanError>;

    /// Rider profiles for the given names. Unknown names are simply absent.
    fn riders_named(&self, names: &[String]) -> Result<Vec<RiderProfile>, PlanError>;

    /// The single configured depot, if any.
    fn depot(&self) -> Result<Option<Depot>, PlanError>;
}

/// Durable keyed store for computed plans. Insert-only.
pub trait PlanStore {
    fn insert(&self, entry: CachedPlanResult) -> Result<(), PlanError>;

    fn find_by_date_and_digest(
        &self,
        date: NaiveDate,
        digest: &str,
    ) -> Result<Option<serde_json::Value>, PlanError>;
}

impl<T: DistanceMatrixProvider + ?Sized> DistanceMatrixProvider for Box<T> {
    fn matrix_for(&self, locations: &[LatLng]) -> Result<Vec<Vec<f64>>, PlanError> {
        (**self).matrix_for(locations)
    }
}

impl<T: PlanStore + ?Sized> PlanStore for Box<T> {
    fn insert(&self, entry: CachedPlanResult) -> Result<(), PlanError> {
        (**self).insert(entry)
    }

    fn find_by_date_and_digest(
        &self,
        date: NaiveDate,
        digest: &str,
    ) -> Result<Option<serde_json::Value>, PlanError> {
        (**self).find_by_date_and_digest(date, digest)
    }
}
