pub mod device_service;
pub mod energy;
pub mod formatter;
pub mod power_model;
pub mod rounding;
pub mod synthesizer;
