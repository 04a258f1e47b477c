//! Per-entity sample series, sorted on construction.

use chrono::{DateTime, Utc};

use crate::error::EngineError;
use crate::types::Sample;
use crate::util;

/// Samples for one entity within a lookback window, ascending by timestamp.
#[derive(Debug, Clone)]
pub struct Series {
    entity_id: String,
    samples: Vec<Sample>,
}

impl Series {
    /// Build a series, sorted by timestamp. Rejects samples that belong to
    /// another entity or carry a non-finite value.
    pub fn new(entity_id: &str, mut samples: Vec<Sample>) -> Result<Self, EngineError> {
        for sample in &samples {
            if sample.entity_id != entity_id {
                return Err(EngineError::MalformedSample {
                    entity_id: entity_id.to_string(),
                    reason: format!("sample belongs to entity {}", sample.entity_id),
                });
            }
            if !sample.value.is_finite() {
                return Err(EngineError::MalformedSample {
                    entity_id: entity_id.to_string(),
                    reason: format!("non-finite value at {}", sample.timestamp.to_rfc3339()),
                });
            }
        }
        samples.sort_by_key(|s| s.timestamp);

        Ok(Self {
            entity_id: entity_id.to_string(),
            samples,
        })
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.samples.first().map(|s| s.timestamp)
    }

    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    /// Days elapsed since the first sample, one entry per sample.
    pub fn elapsed_days(&self) -> Vec<f64> {
        match self.first_timestamp() {
            Some(first) => self
                .samples
                .iter()
                .map(|s| util::days_between(first, s.timestamp))
                .collect(),
            None => Vec::new(),
        }
    }
}
