use axum::{
    http::{header, HeaderValue, Method},
    response::Response,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use simulator::DiskLedger;

use crate::handlers::{self, AppState};
use crate::{ApiError, ApiResult, Config};

// Local dev frontends served by Vite and CRA.
const ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://localhost:3000"];

pub struct Server {
    config: Config,
    app_state: Arc<AppState>,
}

impl Server {
    pub fn new(config: Config, ledger: Arc<DiskLedger>) -> Self {
        Self {
            config,
            app_state: Arc::new(AppState { ledger }),
        }
    }

    pub async fn start(&self) -> ApiResult<()> {
        let app = router(self.app_state.clone());

        let addr = self.config.bind_address();
        tracing::info!("Starting API server on {}", addr);

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ApiError::InternalError(format!("Failed to bind to {}: {}", addr, e)))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| ApiError::InternalError(format!("Server error: {}", e)))?;

        Ok(())
    }
}

pub fn router(app_state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/", get(handlers::api_banner))
        .route("/health", get(handlers::health_check))
        // Disk state
        .route("/api/disk/stats", get(handlers::disk_stats))
        .route("/api/disk/initialize", post(handlers::initialize_disk))
        .route("/api/disk/reset", post(handlers::reset_disk))
        // File operations
        .route("/api/files/create", post(handlers::create_file))
        .route("/api/files/list", get(handlers::list_files))
        .route("/api/files/:file_id", delete(handlers::delete_file))
        // Performance
        .route("/api/performance/metrics", get(handlers::performance_metrics))
        .route("/api/performance/history", get(handlers::performance_history))
        .route("/api/performance/record", post(handlers::record_performance))
        // Fault injection
        .route("/api/simulation/crash", post(handlers::simulate_crash))
        .route("/api/simulation/recover", post(handlers::run_recovery))
        .route("/api/simulation/defragment", post(handlers::defragment_disk))
        // Demo catalog
        .route("/api/demos/list", get(handlers::list_demos))
        .route("/api/demos/run/:demo_id", post(handlers::run_demo))
        .with_state(app_state);

    api_routes
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer()),
        )
        .fallback(not_found)
}

fn cors_layer() -> CorsLayer {
    let origins = ALLOWED_ORIGINS.iter().copied().map(HeaderValue::from_static);

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .allow_credentials(true)
}

async fn not_found() -> ApiResult<Response> {
    Err(ApiError::NotFound("Not found".to_string()))
}
