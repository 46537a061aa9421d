use crate::recognition::RecognitionReport;
use crate::utils::error::SignError;
use serde::Serialize;

/// 通用成功响应包装
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: String,
    pub request_id: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// 单帧识别结果，HTTP 与 WebSocket 共用
#[derive(Debug, Clone, Serialize)]
pub struct RecognitionResponse {
    pub success: bool,
    pub detected: bool,
    pub word: Option<String>,
    pub confidence: f32,
    pub message: String,
    pub hands_count: usize,
    pub processing_time_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotated_image: Option<String>,
}

impl From<RecognitionReport> for RecognitionResponse {
    fn from(report: RecognitionReport) -> Self {
        let outcome = report.outcome;
        Self {
            success: true,
            detected: outcome.detected,
            message: outcome.message().to_string(),
            hands_count: outcome.hands.len(),
            processing_time_ms: outcome.processing_time.as_secs_f64() * 1000.0,
            word: outcome.label,
            confidence: outcome.confidence,
            annotated_image: report.annotated_image,
        }
    }
}

/// 批量结果中的一个元素：成功的识别结果或该元素自己的错误
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BatchItem {
    Recognized(RecognitionResponse),
    Failed(serde_json::Value),
}

impl From<crate::Result<RecognitionReport>> for BatchItem {
    fn from(result: crate::Result<RecognitionReport>) -> Self {
        match result {
            Ok(report) => BatchItem::Recognized(report.into()),
            Err(e) => BatchItem::Failed(e.to_body()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub success: bool,
    pub count: usize,
    pub results: Vec<BatchItem>,
}

/// WebSocket 下行消息
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    RecognitionResult {
        data: RecognitionResponse,
    },
    AnswerResponse {
        is_correct: bool,
        answer: Option<String>,
        correct_answer: Option<String>,
        message: String,
    },
    Echo {
        response: String,
    },
    Error {
        code: String,
        message: String,
    },
}

impl Outbound {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Outbound::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl From<SignError> for Outbound {
    fn from(e: SignError) -> Self {
        Outbound::error(e.error_code(), e.to_string())
    }
}
