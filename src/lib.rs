//! route-planner core
//!
//! Per-day delivery route planning: cluster a date's orders among riders,
//! compute an exact visiting order per cluster, and hand the longest routes
//! to the least-loaded riders. Results are memoized by request fingerprint.

pub mod error;
pub mod traits;
pub mod models;
pub mod haversine;
pub mod osrm;
pub mod cluster;
pub mod solver;
pub mod cache;
pub mod store;
pub mod planner;

pub use error::PlanError;
pub use models::{PlanRequest, PlanResult};
pub use planner::{PlannerOptions, RouteAssignmentEngine};
