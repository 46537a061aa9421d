use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::path::PathBuf;
use thiserror::Error;

/// 模型/标签初始化失败，阻止资源进入 Ready 状态
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InitError {
    #[error("Model file not found: {}", .0.display())]
    MissingModel(PathBuf),

    #[error("Label manifest not found: {}", .0.display())]
    MissingLabels(PathBuf),

    #[error("Model loading failed: {0}")]
    LoadFailure(String),
}

/// 单个请求的输入解码失败
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Empty image data")]
    Empty,

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),

    #[error("File too large: {0} bytes, max allowed: {1} bytes")]
    TooLarge(usize, usize),

    #[error("Invalid image dimensions: {0}")]
    InvalidDimensions(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

#[derive(Error, Debug)]
pub enum SignError {
    #[error(transparent)]
    Init(#[from] InitError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Recognition service is not ready")]
    NotReady,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Persistence failed: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ORT error: {0}")]
    Ort(#[from] ort::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl SignError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SignError::Decode(DecodeError::TooLarge(_, _)) => StatusCode::PAYLOAD_TOO_LARGE,
            SignError::Decode(DecodeError::UnsupportedFormat(_)) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            SignError::Decode(_) => StatusCode::BAD_REQUEST,
            SignError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            SignError::Json(_) => StatusCode::BAD_REQUEST,
            SignError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            SignError::Init(_) => StatusCode::SERVICE_UNAVAILABLE,
            SignError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            SignError::Init(InitError::MissingModel(_)) => "MODEL_NOT_FOUND",
            SignError::Init(InitError::MissingLabels(_)) => "LABELS_NOT_FOUND",
            SignError::Init(InitError::LoadFailure(_)) => "MODEL_LOAD_ERROR",
            SignError::Decode(DecodeError::Base64(_)) => "BASE64_DECODE_ERROR",
            SignError::Decode(DecodeError::TooLarge(_, _)) => "FILE_TOO_LARGE",
            SignError::Decode(DecodeError::UnsupportedFormat(_)) => "UNSUPPORTED_FORMAT",
            SignError::Decode(_) => "IMAGE_DECODE_ERROR",
            SignError::NotReady => "SERVICE_UNAVAILABLE",
            SignError::NotFound(_) => "NOT_FOUND",
            SignError::InvalidInput(_) => "INVALID_INPUT",
            SignError::Inference(_) => "INFERENCE_ERROR",
            SignError::Persistence(_) => "PERSISTENCE_ERROR",
            SignError::Config(_) => "CONFIG_ERROR",
            SignError::Io(_) => "IO_ERROR",
            SignError::Json(_) => "JSON_ERROR",
            SignError::Ort(_) => "ORT_ERROR",
            SignError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 客户端输入错误（区别于服务不可用和内部错误）
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// 统一的错误体，HTTP 与 WebSocket 共用
    pub fn to_body(&self) -> serde_json::Value {
        serde_json::json!({
            "success": false,
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        })
    }
}

impl IntoResponse for SignError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("Request failed: {} ({})", self, status);
        } else {
            tracing::warn!("Request rejected: {} ({})", self, status);
        }

        (status, axum::Json(self.to_body())).into_response()
    }
}
