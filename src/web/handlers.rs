use super::extractors::{RequestId, Validate, ValidatedJson};
use super::wire::{ApiResponse, BatchItem, BatchResponse, RecognitionResponse};
use super::AppState;
use crate::recognition::ResourceState;
use crate::utils::error::{DecodeError, SignError};
use crate::Result;
use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;

/// 单帧识别请求（base64 或 data URL）
#[derive(Debug, Deserialize)]
pub struct RecognizeRequest {
    pub image: String,

    /// 是否返回带关键点标注的图像
    #[serde(default)]
    pub visualize: bool,
}

impl Validate for RecognizeRequest {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.image.trim().is_empty() {
            return Err("Image data cannot be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub images: Vec<String>,

    #[serde(default)]
    pub visualize: bool,
}

impl Validate for BatchRequest {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.images.is_empty() {
            return Err("Batch must contain at least one image".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct InitRequest {
    /// 先重置再加载
    #[serde(default)]
    pub reload: bool,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// 加载（或重新加载）模型
pub async fn init_handler(
    State(state): State<AppState>,
    body: Option<Json<InitRequest>>,
) -> Result<Json<serde_json::Value>> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let guard = state.recognition.guard();

    if request.reload {
        tracing::info!("Reloading recognition resource");
        guard.reset().await?;
    }

    let already_loaded = guard.is_ready();
    let summary = guard
        .initialize(state.config.model_path(), state.config.labels_path())
        .await?;

    let message = if already_loaded {
        "Model already loaded"
    } else {
        "Model loaded successfully"
    };

    Ok(Json(serde_json::json!({
        "success": true,
        "message": message,
        "num_classes": summary.num_classes,
        "classes": summary.classes,
    })))
}

/// 单帧识别，始终返回标注图像
pub async fn predict_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    ValidatedJson(request): ValidatedJson<RecognizeRequest>,
) -> Result<Json<RecognitionResponse>> {
    tracing::debug!(
        "Processing predict request: request_id={}, size={} chars",
        request_id,
        request.image.len()
    );

    let report = state
        .recognition
        .recognize_base64(&request.image, true)
        .await?;
    Ok(Json(report.into()))
}

/// 单帧识别
pub async fn realtime_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    ValidatedJson(request): ValidatedJson<RecognizeRequest>,
) -> Result<Json<RecognitionResponse>> {
    tracing::debug!(
        "Processing realtime request: request_id={}, size={} chars, visualize={}",
        request_id,
        request.image.len(),
        request.visualize
    );

    let report = state
        .recognition
        .recognize_base64(&request.image, request.visualize)
        .await?;
    Ok(Json(report.into()))
}

/// multipart 文件上传：`file` 字段为图像，可选 `visualize` 文本字段
pub async fn upload_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    mut multipart: Multipart,
) -> Result<Json<RecognitionResponse>> {
    let mut image_data: Option<Vec<u8>> = None;
    let mut visualize = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| SignError::InvalidInput(format!("Multipart error: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                if let Some(content_type) = field.content_type() {
                    if !content_type.starts_with("image/") {
                        return Err(DecodeError::UnsupportedFormat(content_type.to_string()).into());
                    }
                }

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| SignError::InvalidInput(format!("Failed to read file: {}", e)))?;
                image_data = Some(data.to_vec());
            }
            Some("visualize") => {
                let value = field.text().await.map_err(|e| {
                    SignError::InvalidInput(format!("Failed to read visualize field: {}", e))
                })?;
                visualize = matches!(value.trim(), "true" | "1");
            }
            _ => {}
        }
    }

    let image_data =
        image_data.ok_or_else(|| SignError::InvalidInput("No file field provided".to_string()))?;

    tracing::debug!(
        "Processing upload request: request_id={}, size={} bytes",
        request_id,
        image_data.len()
    );

    let report = state
        .recognition
        .recognize_bytes(&image_data, visualize)
        .await?;
    Ok(Json(report.into()))
}

/// 有序批量识别：逐张执行，单张失败只体现在对应元素上
pub async fn batch_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    ValidatedJson(request): ValidatedJson<BatchRequest>,
) -> Result<Json<BatchResponse>> {
    let max_batch_size = state.config.server_config.max_batch_size;
    if request.images.len() > max_batch_size {
        return Err(SignError::InvalidInput(format!(
            "Batch of {} images exceeds the limit of {}",
            request.images.len(),
            max_batch_size
        )));
    }

    tracing::info!(
        "Processing batch request: request_id={}, images={}",
        request_id,
        request.images.len()
    );

    let results = state
        .recognition
        .recognize_batch(&request.images, request.visualize)
        .await?;

    let results: Vec<BatchItem> = results.into_iter().map(BatchItem::from).collect();
    Ok(Json(BatchResponse {
        success: true,
        count: results.len(),
        results,
    }))
}

/// 最近识别结果，最旧在前
pub async fn history_handler(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Json<serde_json::Value> {
    let history = state.recognition.history();
    let entries = history.recent(query.limit);

    Json(serde_json::json!({
        "success": true,
        "count": entries.len(),
        "capacity": history.capacity(),
        "history": entries,
    }))
}

pub async fn clear_history_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.recognition.history().clear();
    Json(serde_json::json!({
        "success": true,
        "message": "History cleared",
    }))
}

/// 健康检查：未就绪时返回 503，与"未检测到手势"区分
pub async fn health_handler(State(state): State<AppState>) -> Response {
    let resource_state = state.recognition.guard().state();
    let ready = resource_state == ResourceState::Ready;
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = serde_json::json!({
        "status": if ready { "healthy" } else { "unavailable" },
        "model_loaded": ready,
        "state": resource_state,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    });

    (status, Json(body)).into_response()
}

/// 模型与服务配置信息
pub async fn info_handler(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let model = state.recognition.guard().model_info().await?;
    let max_num_hands = model.max_num_hands;
    let config = &state.config;

    Ok(Json(serde_json::json!({
        "success": true,
        "service": "Sign Language Recognition Service",
        "version": env!("CARGO_PKG_VERSION"),
        "model": model,
        "detector": {
            "model_path": config.landmark_model_path(),
            "min_detection_confidence": config.recognition_config.min_detection_confidence,
            "max_num_hands": max_num_hands,
        },
        "limits": {
            "max_request_size": config.server_config.max_request_size,
            "max_batch_size": config.server_config.max_batch_size,
            "request_timeout_secs": config.server_config.request_timeout,
            "history_capacity": config.recognition_config.history_capacity,
        },
        "onnx": {
            "intra_threads": config.onnx_config.intra_threads,
            "optimization_level": config.onnx_config.optimization_level,
        },
    })))
}

/// 当前可识别的标签列表
pub async fn classes_handler(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let guard = state.recognition.guard();
    guard.ensure_ready()?;

    let classes = guard.run(|resource| resource.labels().to_vec()).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "num_classes": classes.len(),
        "classes": classes,
    })))
}

pub async fn service_info_handler(State(state): State<AppState>) -> Json<ApiResponse<serde_json::Value>> {
    let stats = state.recognition.stats().snapshot();
    Json(ApiResponse::success(serde_json::json!({
        "is_initialized": state.recognition.guard().is_ready(),
        "state": state.recognition.guard().state(),
        "stats": stats,
        "history_size": state.recognition.history().len(),
    })))
}

pub async fn reset_stats_handler(State(state): State<AppState>) -> Json<ApiResponse<serde_json::Value>> {
    state.recognition.stats().reset();
    Json(ApiResponse::success(serde_json::json!({
        "message": "Statistics reset",
    })))
}
