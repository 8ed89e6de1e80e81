//! Web服务器

use axum::{
    routing::{get, post},
    Router,
};
use davinci_core::{Result, SurgeryError};
use davinci_dashboard::{DashboardAggregator, GeneralStatsAggregator};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::handlers::{api_root, get_doctor_contribution, get_general_data, get_surgery_dashboard, health};

/// 处理器共享状态
pub struct AppState {
    pub dashboard: Arc<DashboardAggregator>,
    pub general: Arc<GeneralStatsAggregator>,
}

pub struct WebServer {
    addr: SocketAddr,
    app: Router,
}

impl WebServer {
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        let app = create_app(Arc::new(state));
        Self { addr, app }
    }

    pub async fn run(self) -> Result<()> {
        info!("Starting web server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, self.app)
            .await
            .map_err(|e| SurgeryError::Internal(format!("Failed to start web server: {}", e)))?;

        Ok(())
    }
}

/// 构建路由
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(api_root))
        .route("/health", get(health))
        .nest("/admin", admin_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
}

/// 管理端路由
fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/get_surgery_dashboard", post(get_surgery_dashboard))
        .route("/get_doctor_contribution", post(get_doctor_contribution))
        .route("/get_general_data", post(get_general_data))
}
