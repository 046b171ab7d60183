pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod ui;

use crate::{annotation::AnnotationPipeline, models::ModelManager, Config, Result};
use axum::{
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer};

/// 处理器共享状态：配置、模型统计和标注流水线
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pipeline: Arc<AnnotationPipeline>,
    pub stats: Arc<crate::models::ModelStats>,
}

impl AppState {
    pub fn new(manager: &ModelManager) -> Result<Self> {
        Ok(Self {
            config: manager.config().clone(),
            pipeline: Arc::new(AnnotationPipeline::from_manager(manager)?),
            stats: Arc::new(manager.stats()),
        })
    }
}

pub async fn serve(config: Config) -> Result<()> {
    // 启动时加载一次模型
    let manager = ModelManager::load(config.clone())?;
    let state = AppState::new(&manager)?;

    let app = create_app(state);

    let addr: SocketAddr = config.bind_addr.parse().map_err(|e| {
        crate::utils::error::AnnotateError::Config(format!(
            "Invalid bind address {}: {}",
            config.bind_addr, e
        ))
    })?;

    tracing::info!(
        "Server starting on http://{} (workers={}, max_connections={})",
        addr,
        config.workers,
        config.server_config.max_connections
    );
    tracing::info!("API endpoints:");
    tracing::info!("  POST /annotate        - JSON base64 upload");
    tracing::info!("  POST /annotate/upload - Multipart file upload");
    tracing::info!("  GET  /                - Web UI");
    tracing::info!("  GET  /health          - Health check");
    tracing::info!("  GET  /api/info        - Service information");

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        crate::utils::error::AnnotateError::Internal(format!(
            "Failed to bind to address {}: {}",
            addr, e
        ))
    })?;

    axum::serve(listener, app).await.map_err(|e| {
        crate::utils::error::AnnotateError::Internal(format!("Server failed to start: {}", e))
    })?;

    Ok(())
}

pub fn create_app(state: AppState) -> Router {
    let server_config = &state.config.server_config;

    Router::new()
        .route("/annotate", post(handlers::annotate_json_handler))
        .route("/annotate/upload", post(handlers::annotate_upload_handler))
        .route("/", get(ui::index_handler))
        .route("/health", get(health_handler))
        .route("/api/info", get(info_handler))
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::request_logging))
        // Json/Multipart 自带 2MB 上限，统一放宽到配置值
        .layer(DefaultBodyLimit::max(server_config.max_request_size))
        .layer(RequestBodyLimitLayer::new(server_config.max_request_size))
        .layer(TimeoutLayer::new(Duration::from_secs(server_config.request_timeout)))
        .layer(axum::middleware::from_fn_with_state(
            middleware::ConnectionLimiter::new(server_config.max_connections),
            middleware::limit_connections,
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// 健康检查端点
async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// 服务信息端点
async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "service": "ONNX Age & Gender Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "models": *state.stats,
        "features": {
            "label_font": state.pipeline.has_label_font(),
            "per_request_threshold": true,
            "non_max_suppression": false
        }
    }))
}
