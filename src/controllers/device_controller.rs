use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};

use crate::models::device::{DeviceSummary, GET_STATUS_METHOD, RpcRequest};
use crate::services::device_service;
use crate::services::formatter::{MockResponse, RpcContext};
use crate::shared_state::AppState;

fn not_found(id: &str) -> Response {
    warn!(device = %id, "unknown device requested");
    (StatusCode::NOT_FOUND, Json(serde_json::json!({"error": "Device not found"}))).into_response()
}

/// Runs one synthesis cycle and logs (rather than masks) formatting failures.
fn synthesize(state: &AppState, id: &str, ctx: &RpcContext) -> Result<MockResponse, Response> {
    let Some(device) = state.device(id) else {
        return Err(not_found(id));
    };
    match device_service::respond_now(&device.profile, ctx) {
        Ok(mock) => {
            debug!(device = %id, bytes = mock.body.len(), "status synthesized");
            #[cfg(feature = "verbose_log")]
            debug!(device = %id, body = %mock.body, "synthesized payload");
            Ok(mock)
        }
        Err(e) => {
            error!(device = %id, error = %e, "failed to format status");
            let body = Json(serde_json::json!({"error": e.to_string()}));
            Err((StatusCode::INTERNAL_SERVER_ERROR, body).into_response())
        }
    }
}

/// Replays the engine's status, headers and body unchanged.
fn passthrough(mock: MockResponse) -> Response {
    let status =
        StatusCode::from_u16(mock.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, mock.body).into_response();
    let headers = response.headers_mut();
    for (name, values) in mock.headers {
        let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
            continue;
        };
        headers.remove(&name);
        for value in values {
            if let Ok(value) = HeaderValue::from_str(&value) {
                headers.append(name.clone(), value);
            }
        }
    }
    response
}

/// GET /api/devices
/// List all simulated devices
#[utoipa::path(
    get,
    path = "/api/devices",
    responses(
        (status = 200, description = "Configured devices", body = Vec<DeviceSummary>)
    )
)]
pub async fn list_devices(State(state): State<AppState>) -> impl IntoResponse {
    let devices: Vec<DeviceSummary> = state
        .config
        .devices
        .iter()
        .map(|d| DeviceSummary {
            id: d.id.clone(),
            name: d.name.clone(),
            meter: d.profile.meter,
            envelope: d.profile.envelope,
            mac: d.profile.identity.mac.clone(),
            device_id: d.profile.identity.device_id.clone(),
        })
        .collect();
    Json(devices).into_response()
}

/// GET /api/devices/{id}/status
/// Get a freshly synthesized status payload
///
/// The body is exactly what the emulated device would send: a flat component map,
/// or an RPC envelope (`id`, `src`, `dst`, `result`) with default correlation values.
#[utoipa::path(
    get,
    path = "/api/devices/{id}/status",
    params(
        ("id" = String, Path, description = "Configured device id")
    ),
    responses(
        (status = 200, description = "Device status in the device's wire format"),
        (status = 404, description = "Device not found"),
        (status = 500, description = "Payload could not be serialized")
    )
)]
pub async fn get_device_status(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Response {
    match synthesize(&state, &id, &RpcContext::default()) {
        Ok(mock) => passthrough(mock),
        Err(response) => response,
    }
}

/// POST /api/devices/{id}/rpc
/// JSON-RPC `Shelly.GetStatus`
///
/// The request's `id` and `src` are echoed back as the envelope's `id` and `dst`.
#[utoipa::path(
    post,
    path = "/api/devices/{id}/rpc",
    params(
        ("id" = String, Path, description = "Configured device id")
    ),
    request_body = RpcRequest,
    responses(
        (status = 200, description = "Device status in the device's wire format"),
        (status = 400, description = "Unsupported RPC method"),
        (status = 404, description = "Device not found")
    )
)]
pub async fn post_device_rpc(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<RpcRequest>,
) -> Response {
    if request.method != GET_STATUS_METHOD {
        warn!(device = %id, method = %request.method, "unsupported rpc method");
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": format!("unsupported method {}", request.method)})),
        )
            .into_response();
    }
    let ctx = RpcContext { id: request.id, dst: request.src };
    match synthesize(&state, &id, &ctx) {
        Ok(mock) => passthrough(mock),
        Err(response) => response,
    }
}

/// GET /api/devices/{id}/mock
/// Get the raw mock-server response triple
///
/// Returns `{statusCode, headers, body}` for frameworks that forward it themselves.
#[utoipa::path(
    get,
    path = "/api/devices/{id}/mock",
    params(
        ("id" = String, Path, description = "Configured device id")
    ),
    responses(
        (status = 200, description = "Mock response triple", body = MockResponse),
        (status = 404, description = "Device not found")
    )
)]
pub async fn get_device_mock(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Response {
    match synthesize(&state, &id, &RpcContext::default()) {
        Ok(mock) => Json(mock).into_response(),
        Err(response) => response,
    }
}
