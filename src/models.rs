//! Planning records, the validated request, and the result payload.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::traits::LatLng;

/// Upper bound on rider name length accepted in a request.
pub const MAX_RIDER_NAME_LEN: usize = 100;

/// Default cap on riders per planning request.
pub const DEFAULT_MAX_RIDERS: usize = 5;

/// An order to deliver on a given date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: i64,
    #[serde(default)]
    pub order_number: String,
    pub customer_name: String,
    pub address: String,
    pub product: String,
    pub delivery_date: NaiveDate,
    /// Resolved customer location. `None` when the customer could not be found.
    #[serde(default)]
    pub customer_coordinate: Option<LatLng>,
}

/// A rider and the distance they have driven so far (meters).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiderProfile {
    pub name: String,
    pub total_distance: f64,
}

impl RiderProfile {
    pub fn new(name: impl Into<String>, total_distance: f64) -> Self {
        Self {
            name: name.into(),
            total_distance,
        }
    }
}

/// The fixed origin every route starts from and returns to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Depot {
    pub name: String,
    #[serde(default)]
    pub address: String,
    /// Coordinate text, `"lat, lng"`.
    pub latlng: Option<String>,
}

impl Depot {
    pub fn coordinate(&self) -> Result<LatLng, PlanError> {
        let text = self
            .latlng
            .as_deref()
            .ok_or_else(|| PlanError::invalid("depot has no coordinates"))?;
        parse_latlng(text).map_err(|_| PlanError::invalid("invalid depot coordinates"))
    }
}

/// Parse `"lat, lng"` text into a coordinate.
pub fn parse_latlng(text: &str) -> Result<LatLng, PlanError> {
    let mut parts = text.split(',');
    let (Some(lat), Some(lng), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(PlanError::invalid(format!("malformed coordinate: {:?}", text)));
    };

    let parse = |value: &str| {
        value
            .trim()
            .parse::<f64>()
            .map_err(|_| PlanError::invalid(format!("malformed coordinate: {:?}", text)))
    };
    let coordinate = (parse(lat)?, parse(lng)?);
    validate_coordinate(coordinate)?;
    Ok(coordinate)
}

/// Reject non-finite or out-of-range coordinates.
pub fn validate_coordinate((lat, lng): LatLng) -> Result<(), PlanError> {
    if !lat.is_finite() || !lng.is_finite() || lat.abs() > 90.0 || lng.abs() > 180.0 {
        return Err(PlanError::invalid(format!(
            "coordinate out of range: ({}, {})",
            lat, lng
        )));
    }
    Ok(())
}

/// A statically validated "plan routes" request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub num_riders: usize,
    pub delivery_date: NaiveDate,
    pub rider_names: Vec<String>,
}

impl PlanRequest {
    /// Build a request, checking it against the default rider cap.
    pub fn new(
        num_riders: usize,
        delivery_date: NaiveDate,
        rider_names: Vec<String>,
    ) -> Result<Self, PlanError> {
        let request = Self {
            num_riders,
            delivery_date,
            rider_names,
        };
        request.validate(DEFAULT_MAX_RIDERS)?;
        Ok(request)
    }

    pub fn validate(&self, max_riders: usize) -> Result<(), PlanError> {
        if self.num_riders < 1 || self.num_riders > max_riders {
            return Err(PlanError::invalid(format!(
                "num_riders must be between 1 and {}, got {}",
                max_riders, self.num_riders
            )));
        }
        if self.rider_names.is_empty() {
            return Err(PlanError::invalid("rider_names must not be empty"));
        }
        if let Some(name) = self
            .rider_names
            .iter()
            .find(|name| name.trim().is_empty() || name.chars().count() > MAX_RIDER_NAME_LEN)
        {
            return Err(PlanError::invalid(format!("invalid rider name: {:?}", name)));
        }
        if self.rider_names.len() != self.num_riders {
            return Err(PlanError::invalid(
                "the number of rider names must match num_riders",
            ));
        }
        Ok(())
    }
}

/// Per-order line of the plan output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryDetail {
    pub customer_name: String,
    pub latlng: Option<String>,
    pub address: String,
    pub product: String,
    pub delivery_date: NaiveDate,
    pub origin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A solved route handed to a rider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignedRoute {
    pub rider_name: String,
    /// Closed path: depot, stops..., depot.
    pub route: Vec<[f64; 2]>,
    pub distance: f64,
}

/// Full result of one planning run. This is what gets cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    pub deliveries: Vec<DeliveryDetail>,
    pub latlng: Vec<[f64; 2]>,
    /// Depot-anchored groups: depot, members..., depot.
    pub clusters: Vec<Vec<[f64; 2]>>,
    pub routes: Vec<AssignedRoute>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn test_parse_latlng() {
        assert_eq!(parse_latlng("13.7563, 100.5018").unwrap(), (13.7563, 100.5018));
        assert_eq!(parse_latlng(" 1.5 ,2").unwrap(), (1.5, 2.0));
    }

    #[test]
    fn test_parse_latlng_rejects_garbage() {
        assert!(parse_latlng("").is_err());
        assert!(parse_latlng("13.7").is_err());
        assert!(parse_latlng("a, b").is_err());
        assert!(parse_latlng("1, 2, 3").is_err());
        assert!(parse_latlng("91.0, 0").is_err());
        assert!(parse_latlng("NaN, 0").is_err());
    }

    #[test]
    fn test_depot_without_coordinate() {
        let depot = Depot {
            name: "Hub".into(),
            address: String::new(),
            latlng: None,
        };
        assert!(matches!(depot.coordinate(), Err(PlanError::InvalidInput(_))));
    }

    #[test]
    fn test_request_bounds() {
        let names = |n: usize| (0..n).map(|i| format!("r{}", i)).collect::<Vec<_>>();
        assert!(PlanRequest::new(1, date(), names(1)).is_ok());
        assert!(PlanRequest::new(5, date(), names(5)).is_ok());
        assert!(PlanRequest::new(0, date(), names(0)).is_err());
        assert!(PlanRequest::new(6, date(), names(6)).is_err());
        assert!(PlanRequest::new(2, date(), names(3)).is_err());
    }

    #[test]
    fn test_request_rejects_blank_and_long_names() {
        assert!(PlanRequest::new(1, date(), vec!["  ".into()]).is_err());
        assert!(PlanRequest::new(1, date(), vec!["x".repeat(101)]).is_err());
        assert!(PlanRequest::new(1, date(), vec!["x".repeat(100)]).is_ok());
    }

    #[test]
    fn test_request_deserializes() {
        let json = r#"{"num_riders":2,"delivery_date":"2024-05-01","rider_names":["A","B"]}"#;
        let request: PlanRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.delivery_date, date());
        assert!(request.validate(DEFAULT_MAX_RIDERS).is_ok());
    }
}
