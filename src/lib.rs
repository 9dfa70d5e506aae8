//! Synthetic telemetry for smart-meter test doubles.
//!
//! [`services::synthesizer`] turns a timestamp, an entropy source and a
//! [`models::profile::DeviceProfile`] into a [`models::snapshot::DeviceSnapshot`];
//! [`services::formatter`] wraps it in the device's flat or RPC envelope.

pub mod api_docs;
pub mod config;
pub mod controllers;
pub mod errors;
pub mod models;
pub mod routes;
pub mod services;
pub mod shared_state;
