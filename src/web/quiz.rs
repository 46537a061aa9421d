use super::extractors::{Validate, ValidatedJson};
use super::wire::ApiResponse;
use super::AppState;
use crate::quiz::{Question, QuizAttempt, QuizVerdict};
use crate::utils::error::SignError;
use crate::Result;
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct QuizSubmission {
    pub question_id: u64,
    pub user_id: u64,
    /// 识别出的手势标签
    pub user_gesture_result: String,
}

impl Validate for QuizSubmission {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.user_gesture_result.trim().is_empty() {
            return Err("user_gesture_result cannot be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordsQuery {
    pub user_id: u64,
}

pub async fn list_questions_handler(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Question>>>> {
    let questions = state.quiz.store().list_questions().await?;
    Ok(Json(ApiResponse::success(questions)))
}

pub async fn get_question_handler(
    State(state): State<AppState>,
    Path(question_id): Path<u64>,
) -> Result<Json<ApiResponse<Question>>> {
    let question = state
        .quiz
        .store()
        .find_question(question_id)
        .await?
        .ok_or_else(|| SignError::NotFound(format!("question {}", question_id)))?;
    Ok(Json(ApiResponse::success(question)))
}

/// 提交答题：比对并记录
pub async fn submit_handler(
    State(state): State<AppState>,
    ValidatedJson(submission): ValidatedJson<QuizSubmission>,
) -> Result<Json<ApiResponse<QuizVerdict>>> {
    let verdict = state
        .quiz
        .verify(
            submission.question_id,
            &submission.user_gesture_result,
            submission.user_id,
        )
        .await?;
    Ok(Json(ApiResponse::success(verdict)))
}

pub async fn records_handler(
    State(state): State<AppState>,
    Query(query): Query<RecordsQuery>,
) -> Result<Json<ApiResponse<Vec<QuizAttempt>>>> {
    let records = state.quiz.store().attempts_for_user(query.user_id).await?;
    Ok(Json(ApiResponse::success(records)))
}
