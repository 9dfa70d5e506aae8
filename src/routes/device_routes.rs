use axum::{
    Router,
    routing::{get, post},
};

use crate::controllers::device_controller::{
    get_device_mock, get_device_status, list_devices, post_device_rpc,
};
use crate::shared_state::AppState;

/// Build the `/api/*` sub-router.
pub fn device_routes(state: AppState) -> Router {
    Router::new()
        .route("/devices",             get(list_devices))
        .route("/devices/{id}/status", get(get_device_status))
        .route("/devices/{id}/rpc",    post(post_device_rpc))
        .route("/devices/{id}/mock",   get(get_device_mock))
        .with_state(state)
}
