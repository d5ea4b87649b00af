//! Test fixtures for route-planner.
//!
//! Provides realistic test data:
//! - Bangkok delivery locations and a depot
//! - Mock matrix providers and a record builder

pub mod bangkok_locations;
pub mod providers;

pub use bangkok_locations::*;
pub use providers::*;
