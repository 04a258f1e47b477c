//! Predictive analytics engine.
//!
//! Pure functions over in-memory sample series: weekly growth estimation,
//! threshold projection, anomaly detection, and the alert aggregator that runs
//! them across every tracked entity. Nothing here caches or persists.

pub mod alerts;
pub mod anomaly;
pub mod growth;
pub mod projection;
pub mod series;
pub mod trends;

pub use alerts::{evaluate_alerts, Alert, AlertKind, AlertReport, EvaluationOptions, Severity};
pub use anomaly::{detect_anomaly, AnomalyReading};
pub use growth::{estimate_growth, GrowthEstimate};
pub use projection::{project, weeks_to_threshold, Projection};
pub use series::Series;
pub use trends::{analyze_trend, trend_for_entity, TrendReport};
