//! Read-only sample store boundary.
//!
//! The host database owns measurement history. The engine only ever asks for
//! one entity's samples since an instant, plus the entity's latest timestamp.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use thiserror::Error;

use crate::error::EngineError;
use crate::types::Sample;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store cannot be reached at all.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// One entity's rows could not be read.
    #[error("corrupt rows for {entity_id}: {reason}")]
    Corrupt { entity_id: String, reason: String },
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => EngineError::UpstreamUnavailable(msg),
            StoreError::Corrupt { entity_id, reason } => {
                EngineError::MalformedSample { entity_id, reason }
            }
        }
    }
}

/// Source of time-stamped samples.
///
/// Implementations return samples in non-decreasing timestamp order and an
/// empty vec, not an error, when the window holds no data.
pub trait SampleStore: Send + Sync {
    fn fetch_samples(&self, entity_id: &str, since: DateTime<Utc>)
        -> Result<Vec<Sample>, StoreError>;

    /// Timestamp of the most recent sample, regardless of lookback window.
    fn last_observed(&self, entity_id: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
        let samples = self.fetch_samples(entity_id, DateTime::<Utc>::MIN_UTC)?;
        Ok(samples.iter().map(|s| s.timestamp).max())
    }
}

/// Append-only in-memory store, used by the binary and tests.
#[derive(Default)]
pub struct InMemorySampleStore {
    samples: RwLock<HashMap<String, Vec<Sample>>>,
}

impl InMemorySampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_samples(samples: impl IntoIterator<Item = Sample>) -> Self {
        let store = Self::new();
        for sample in samples {
            store.record(sample);
        }
        store
    }

    /// Append a sample, keeping the entity's history ordered by timestamp.
    pub fn record(&self, sample: Sample) {
        let mut guard = self.samples.write();
        let history = guard.entry(sample.entity_id.clone()).or_default();
        let pos = history.partition_point(|s| s.timestamp <= sample.timestamp);
        history.insert(pos, sample);
    }

    pub fn entity_count(&self) -> usize {
        self.samples.read().len()
    }

    pub fn sample_count(&self) -> usize {
        self.samples.read().values().map(Vec::len).sum()
    }
}

impl SampleStore for InMemorySampleStore {
    fn fetch_samples(
        &self,
        entity_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Sample>, StoreError> {
        let guard = self.samples.read();
        Ok(guard
            .get(entity_id)
            .map(|history| {
                history
                    .iter()
                    .filter(|s| s.timestamp >= since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn last_observed(&self, entity_id: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
        let guard = self.samples.read();
        Ok(guard
            .get(entity_id)
            .and_then(|history| history.last())
            .map(|s| s.timestamp))
    }
}
