pub mod device;
pub mod profile;
pub mod snapshot;
pub mod wire;
