pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod quiz;
pub mod stream;
pub mod wire;

use crate::history::HistoryLedger;
use crate::models::OnnxModelLoader;
use crate::quiz::{MemoryQuizStore, QuizStore, QuizVerifier};
use crate::recognition::{RecognitionResource, RecognitionService, ResourceGuard};
use crate::utils::error::SignError;
use crate::{Config, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer};

/// 所有传输共享的进程级状态
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub recognition: RecognitionService,
    pub quiz: QuizVerifier,
}

impl AppState {
    pub fn new(config: Config, recognition: RecognitionService, quiz: QuizVerifier) -> Self {
        Self {
            config: Arc::new(config),
            recognition,
            quiz,
        }
    }

    /// 使用 ONNX 模型加载器和内存题库装配状态（不加载模型）
    pub fn from_config(config: Config) -> Result<Self> {
        let resource = RecognitionResource::new(
            Box::new(OnnxModelLoader::new(&config)),
            config.recognition_config.acceptance_threshold,
        );
        let guard = ResourceGuard::new(resource);
        let history = Arc::new(HistoryLedger::new(config.recognition_config.history_capacity));
        let recognition = RecognitionService::new(guard, history);

        let store: Arc<dyn QuizStore> = match &config.questions_path {
            Some(path) => Arc::new(MemoryQuizStore::from_file(path)?),
            None => Arc::new(MemoryQuizStore::with_default_questions()),
        };

        Ok(Self::new(config, recognition, QuizVerifier::new(store)))
    }
}

pub async fn serve(config: Config) -> Result<()> {
    let state = AppState::from_config(config.clone())?;

    // 启动时尝试加载模型；失败时服务照常启动，识别接口统一返回未就绪
    tracing::info!("Initializing recognition resource...");
    if let Err(e) = state
        .recognition
        .guard()
        .initialize(config.model_path(), config.labels_path())
        .await
    {
        tracing::warn!("Recognition resource not ready: {} (POST /api/init to retry)", e);
    }

    let app = create_app(state);

    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .map_err(|e| SignError::Config(format!("Invalid bind address {}: {}", config.bind_addr, e)))?;

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  POST /api/init            - Load models");
    tracing::info!("  POST /api/predict         - Single frame with annotation");
    tracing::info!("  POST /recognize/realtime  - Single frame");
    tracing::info!("  POST /recognize/upload    - Multipart image upload");
    tracing::info!("  POST /recognize/batch     - Ordered batch");
    tracing::info!("  GET  /recognize/history   - Recent recognitions");
    tracing::info!("  GET  /ws                  - Streaming recognition");
    tracing::info!("  GET  /quiz/questions      - Quiz questions");
    tracing::info!("  GET  /health              - Health check");

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| SignError::Internal(format!("Failed to bind to address {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| SignError::Internal(format!("Server failed: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}

pub fn create_app(state: AppState) -> Router {
    let server_config = state.config.server_config.clone();

    Router::new()
        // 模型与系统
        .route("/api/init", post(handlers::init_handler))
        .route("/health", get(handlers::health_handler))
        .route("/api/health", get(handlers::health_handler))
        .route("/api/info", get(handlers::info_handler))
        .route("/api/classes", get(handlers::classes_handler))
        .route("/api/service/info", get(handlers::service_info_handler))
        .route("/api/service/reset-stats", post(handlers::reset_stats_handler))
        // 识别
        .route("/api/predict", post(handlers::predict_handler))
        .route("/recognize/realtime", post(handlers::realtime_handler))
        .route("/recognize/upload", post(handlers::upload_handler))
        .route("/recognize/batch", post(handlers::batch_handler))
        .route(
            "/recognize/history",
            get(handlers::history_handler).delete(handlers::clear_history_handler),
        )
        .route("/ws", get(stream::ws_handler))
        // 答题
        .route("/quiz/questions", get(quiz::list_questions_handler))
        .route("/quiz/questions/:id", get(quiz::get_question_handler))
        .route("/quiz/submit", post(quiz::submit_handler))
        .route("/quiz/records", get(quiz::records_handler))
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::request_logging))
        .layer(RequestBodyLimitLayer::new(server_config.max_request_size))
        .layer(TimeoutLayer::new(Duration::from_secs(server_config.request_timeout)))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
