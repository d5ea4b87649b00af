//! OSRM HTTP adapter for distance matrices.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, error};

use crate::error::PlanError;
use crate::traits::{DistanceMatrixProvider, LatLng};

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    /// Table annotation to request: `distance` (meters) or `duration` (seconds).
    pub annotation: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "cycling".to_string(),
            annotation: "distance".to_string(),
            timeout_secs: 10,
        }
    }
}

impl OsrmConfig {
    /// Load from `OSRM_IP`, `OSRM_PROFILE` and `OSRM_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, PlanError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup, falling back to defaults for missing keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PlanError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = lookup("OSRM_IP") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(profile) = lookup("OSRM_PROFILE") {
            config.profile = profile;
        }
        if let Some(timeout) = lookup("OSRM_TIMEOUT_SECS") {
            config.timeout_secs = timeout.trim().parse().map_err(|_| {
                PlanError::invalid(format!("OSRM_TIMEOUT_SECS is not a number: {:?}", timeout))
            })?;
        }
        Ok(config)
    }

    fn table_url(&self, locations: &[LatLng]) -> String {
        let coords = locations
            .iter()
            .map(|(lat, lng)| format!("{:.6},{:.6}", lng, lat))
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/table/v1/{}/{}?annotations={}",
            self.base_url, self.profile, coords, self.annotation
        )
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, PlanError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| PlanError::Unexpected(format!("cannot build HTTP client: {}", err)))?;

        Ok(Self { config, client })
    }
}

impl DistanceMatrixProvider for OsrmClient {
    fn matrix_for(&self, locations: &[LatLng]) -> Result<Vec<Vec<f64>>, PlanError> {
        if locations.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.config.table_url(locations);
        debug!(points = locations.len(), "fetching OSRM table");

        let body = self
            .client
            .get(&url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.text())
            .map_err(|err| {
                error!(%url, %err, "OSRM table request failed");
                PlanError::from(err)
            })?;

        parse_table(&body, &self.config.annotation, locations.len())
    }
}

#[derive(Debug, Deserialize)]
struct OsrmTableResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    distances: Option<Vec<Vec<Option<f64>>>>,
    durations: Option<Vec<Vec<Option<f64>>>>,
}

/// Decode an OSRM `/table` body into an n×n matrix.
///
/// `null` cells mark unroutable pairs and become `f64::INFINITY`.
fn parse_table(body: &str, annotation: &str, expected: usize) -> Result<Vec<Vec<f64>>, PlanError> {
    let response: OsrmTableResponse = serde_json::from_str(body)
        .map_err(|err| PlanError::UpstreamUnavailable(format!("invalid OSRM response: {}", err)))?;

    if response.code != "Ok" {
        return Err(PlanError::UpstreamUnavailable(format!(
            "OSRM returned {}: {}",
            response.code,
            response.message.unwrap_or_default()
        )));
    }

    let table = match annotation {
        "duration" => response.durations,
        _ => response.distances,
    }
    .ok_or_else(|| {
        PlanError::UpstreamUnavailable(format!("OSRM response has no {} table", annotation))
    })?;

    if table.len() != expected || table.iter().any(|row| row.len() != expected) {
        return Err(PlanError::UpstreamUnavailable(format!(
            "OSRM table is not {}x{}",
            expected, expected
        )));
    }

    Ok(table
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|value| value.unwrap_or(f64::INFINITY))
                .collect()
        })
        .collect())
}
