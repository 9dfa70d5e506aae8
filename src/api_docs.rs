use utoipa::OpenApi;

use crate::controllers::device_controller;
use crate::models::{device, profile};
use crate::services::formatter;

#[derive(OpenApi)]
#[openapi(
    paths(
        device_controller::list_devices,
        device_controller::get_device_status,
        device_controller::post_device_rpc,
        device_controller::get_device_mock
    ),
    components(
        schemas(
            device::DeviceSummary,
            device::RpcRequest,
            profile::MeterKind,
            profile::EnvelopeStyle,
            formatter::MockResponse
        )
    ),
    tags(
        (name = "meter-telemetry-sim", description = "Smart meter telemetry simulation API")
    )
)]
pub struct ApiDoc;
