use std::net::SocketAddr;

use axum::{Router, response::Html, routing::get};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_scalar::Scalar;

use meter_telemetry_sim::api_docs::ApiDoc;
use meter_telemetry_sim::config::Config;
use meter_telemetry_sim::routes::device_routes::device_routes;
use meter_telemetry_sim::shared_state::AppState;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    // 1. Load configuration
    let path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let config = match Config::load(&path) {
        Ok(c) => c,
        Err(e) => {
            error!(path = %path, error = %e, "failed to load configuration");
            return;
        }
    };
    info!(devices = config.devices.len(), "configuration loaded");
    for device in &config.devices {
        info!(
            device = %device.id,
            meter = ?device.profile.meter,
            envelope = ?device.profile.envelope,
            utc_offset_secs = device.profile.system.utc_offset_secs,
            "simulating device"
        );
    }

    // 2. Shared read-only state
    let server_port = config.server.port;
    let state = AppState::new(config);

    // 3. Axum HTTP server
    let app = Router::new()
        .nest("/api", device_routes(state))
        .route("/scalar", get(|| async {
            Html(Scalar::new(ApiDoc::openapi()).to_html())
        }))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], server_port));
    info!("API Server listening on http://{}", addr);
    info!("Scalar UI: http://{}/scalar", addr);

    if let Err(e) = axum_server::bind(addr).serve(app.into_make_service()).await {
        error!(error = %e, "HTTP server stopped");
    }
}
