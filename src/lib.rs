//! Predictive analytics for network asset-management dashboards.
//!
//! Growth estimation, threshold projection and anomaly detection over
//! utilization samples, aggregated into ranked alerts and dashboard widgets.

pub mod cache;
pub mod error;
pub mod metrics;
pub mod predictive;
pub mod store;
pub mod types;
pub mod util;
pub mod widgets;

pub use error::{EngineError, EvaluationFailure};
pub use predictive::{evaluate_alerts, Alert, AlertReport, EvaluationOptions, Severity};
pub use store::{InMemorySampleStore, SampleStore, StoreError};
pub use types::{DashboardInput, InsightsConfig, Inventory, Sample, TrackedEntity};
