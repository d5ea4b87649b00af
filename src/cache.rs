//! Plan fingerprinting and the durable result memo.
//!
//! A fingerprint identifies one planning request: the delivery date, the
//! rider names and the ids of that date's orders. Lists are sorted before
//! hashing so the digest ignores input ordering. Entries never expire.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::PlanError;
use crate::traits::PlanStore;

/// SHA-256 digest of a canonicalized planning request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlanFingerprint([u8; 32]);

impl PlanFingerprint {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for PlanFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Canonical form fed to the digest. Field order is alphabetical and fixed.
#[derive(Serialize)]
struct FingerprintKey<'a> {
    delivery_date: NaiveDate,
    orders: Vec<i64>,
    rider_names: Vec<&'a str>,
}

/// Derive the fingerprint for a planning request.
pub fn fingerprint(
    date: NaiveDate,
    rider_names: &[String],
    order_ids: &[i64],
) -> Result<PlanFingerprint, PlanError> {
    let mut riders: Vec<&str> = rider_names.iter().map(String::as_str).collect();
    riders.sort_unstable();
    let mut orders = order_ids.to_vec();
    orders.sort_unstable();

    let key = FingerprintKey {
        delivery_date: date,
        orders,
        rider_names: riders,
    };
    let encoded = serde_json::to_vec(&key)?;

    Ok(PlanFingerprint(Sha256::digest(&encoded).into()))
}

/// A stored plan. Created once per fingerprint, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPlanResult {
    pub delivery_date: NaiveDate,
    /// Hex-encoded [`PlanFingerprint`].
    pub fingerprint: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Memo of planning results over a [`PlanStore`].
///
/// Also hands out per-fingerprint locks so one process computes a given plan
/// once even under concurrent identical requests. Separate processes sharing
/// a store can still race and insert duplicates; that is tolerated since
/// results are immutable and re-derivable.
pub struct PlanCache<S> {
    store: S,
    locks: Mutex<HashMap<PlanFingerprint, Arc<Mutex<()>>>>,
}

impl<S: PlanStore> PlanCache<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The in-process lock guarding computation of `fingerprint`.
    pub fn lock_for(&self, fingerprint: PlanFingerprint) -> Arc<Mutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(fingerprint).or_default().clone()
    }

    /// Drop the lock for `fingerprint` once no caller holds it.
    ///
    /// Callers must drop their handle from [`lock_for`](Self::lock_for) first.
    pub fn release(&self, fingerprint: PlanFingerprint) {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if locks
            .get(&fingerprint)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&fingerprint);
        }
    }

    /// Number of fingerprints with a live lock entry.
    pub fn active_locks(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn lookup(
        &self,
        date: NaiveDate,
        fingerprint: &PlanFingerprint,
    ) -> Result<Option<serde_json::Value>, PlanError> {
        let found = self
            .store
            .find_by_date_and_digest(date, &fingerprint.to_hex())?;
        match &found {
            Some(_) => info!(%date, %fingerprint, "using cached route plan"),
            None => debug!(%date, %fingerprint, "no cached route plan"),
        }
        Ok(found)
    }

    pub fn store_result(
        &self,
        date: NaiveDate,
        fingerprint: &PlanFingerprint,
        payload: serde_json::Value,
    ) -> Result<(), PlanError> {
        self.store.insert(CachedPlanResult {
            delivery_date: date,
            fingerprint: fingerprint.to_hex(),
            payload,
            created_at: Utc::now(),
        })?;
        debug!(%date, %fingerprint, "stored route plan");
        Ok(())
    }
}
