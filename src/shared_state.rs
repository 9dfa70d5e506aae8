use std::sync::Arc;

use crate::config::{Config, DeviceConfig};

/// Read-only state shared by all handlers. Nothing in here is mutated after
/// startup, so requests never contend.
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self { config: Arc::new(config) }
    }

    pub fn device(&self, id: &str) -> Option<&DeviceConfig> {
        self.config.device(id)
    }
}
