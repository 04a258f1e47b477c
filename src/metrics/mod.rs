//! Derived inventory metrics: IP utilization, device health, data quality,
//! connectivity and capacity.
//!
//! Pure functions over inventory records supplied by the host database.

pub mod capacity;
pub mod health;
pub mod quality;
pub mod topology;
pub mod utilization;
