//! Latest-reading AQI service.
//!
//! A device pushes environmental readings, the service resolves an AQI
//! (from a trained estimator when one is loaded for the reading's location,
//! otherwise the device's own value) and dashboards poll the result.

pub mod api;
pub mod aqi;
pub mod config;
pub mod error;
pub mod estimator;
pub mod features;
pub mod model;
pub mod store;
pub mod types;

#[cfg(feature = "torchscript")]
pub mod torch;

pub use aqi::{Category, Trend};
pub use store::Location;
