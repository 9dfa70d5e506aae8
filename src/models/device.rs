use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::profile::{EnvelopeStyle, MeterKind};

pub const GET_STATUS_METHOD: &str = "Shelly.GetStatus";

// ─── REST API types ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct DeviceSummary {
    pub id: String,
    pub name: String,
    pub meter: MeterKind,
    pub envelope: EnvelopeStyle,
    pub mac: String,
    pub device_id: String,
}

/// JSON-RPC request frame as sent by the companion app.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RpcRequest {
    pub id: i64,
    /// Caller identity; echoed back as `dst`.
    pub src: String,
    #[serde(default = "default_method")]
    pub method: String,
}

fn default_method() -> String {
    GET_STATUS_METHOD.to_string()
}
