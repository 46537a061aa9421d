pub mod store;

pub use store::{default_questions, MemoryQuizStore, QuestionSeed, QuizStore};

use crate::utils::error::SignError;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

/// 题目
#[derive(Debug, Clone, Serialize)]
pub struct Question {
    pub id: u64,
    pub content: String,
    pub image_url: Option<String>,
    pub answer: String,
    pub difficulty: Difficulty,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 待写入的答题记录
#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub user_id: u64,
    pub question_id: u64,
    pub recognized_token: String,
    pub is_correct: bool,
}

/// 已写入的答题记录，写入后不再修改
#[derive(Debug, Clone, Serialize)]
pub struct QuizAttempt {
    pub id: u64,
    pub user_id: u64,
    pub question_id: u64,
    pub recognized_token: String,
    pub is_correct: bool,
    pub created_at: DateTime<Utc>,
}

/// 判题结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizVerdict {
    pub is_correct: bool,
    pub correct_answer: Option<String>,
    pub message: String,
}

impl QuizVerdict {
    /// 未检测到手势：不查询题目、不写记录
    pub fn no_gesture() -> Self {
        Self {
            is_correct: false,
            correct_answer: None,
            message: "No gesture detected or recognition failed".to_string(),
        }
    }
}

/// 忽略大小写与首尾空白的精确匹配
pub fn answers_match(predicted: &str, expected: &str) -> bool {
    predicted.trim().to_lowercase() == expected.trim().to_lowercase()
}

/// 答题校验流程
#[derive(Clone)]
pub struct QuizVerifier {
    store: Arc<dyn QuizStore>,
}

impl QuizVerifier {
    pub fn new(store: Arc<dyn QuizStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn QuizStore> {
        &self.store
    }

    /// 查询标准答案、比对、无论对错都写入一条记录
    pub async fn verify(
        &self,
        question_id: u64,
        predicted_token: &str,
        user_id: u64,
    ) -> Result<QuizVerdict> {
        let question = self
            .store
            .find_question(question_id)
            .await?
            .ok_or_else(|| SignError::NotFound(format!("question {}", question_id)))?;

        let is_correct = answers_match(predicted_token, &question.answer);

        let attempt = self
            .store
            .insert_attempt(NewAttempt {
                user_id,
                question_id,
                recognized_token: predicted_token.to_string(),
                is_correct,
            })
            .await?;

        tracing::info!(
            "Quiz attempt {}: user={}, question={}, token='{}', correct={}",
            attempt.id,
            user_id,
            question_id,
            predicted_token,
            is_correct
        );

        let message = if is_correct {
            "Correct, well done!".to_string()
        } else {
            format!(
                "Recognized '{}', but the expected answer is '{}'.",
                predicted_token, question.answer
            )
        };

        Ok(QuizVerdict {
            is_correct,
            correct_answer: Some(question.answer),
            message,
        })
    }

    /// 流式通道入口：未识别出手势时直接短路
    pub async fn verify_outcome(
        &self,
        question_id: u64,
        predicted_token: Option<&str>,
        user_id: u64,
    ) -> Result<QuizVerdict> {
        match predicted_token {
            Some(token) => self.verify(question_id, token, user_id).await,
            None => Ok(QuizVerdict::no_gesture()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier() -> (QuizVerifier, Arc<MemoryQuizStore>) {
        let store = Arc::new(MemoryQuizStore::with_default_questions());
        (QuizVerifier::new(store.clone()), store)
    }

    #[test]
    fn matching_ignores_case_and_whitespace() {
        assert!(answers_match(" Hello ", "hello"));
        assert!(answers_match("THANKS", " thanks\n"));
        assert!(!answers_match("helo", "hello"));
        assert!(!answers_match("hello world", "hello"));
    }

    #[tokio::test]
    async fn correct_attempt_is_recorded() {
        let (verifier, store) = verifier();
        let verdict = verifier.verify(1, " Hello ", 42).await.unwrap();

        assert!(verdict.is_correct);
        assert_eq!(verdict.correct_answer.as_deref(), Some("hello"));
        assert_eq!(store.attempt_count(), 1);
    }

    #[tokio::test]
    async fn incorrect_attempt_is_also_recorded() {
        let (verifier, store) = verifier();
        let verdict = verifier.verify(1, "thanks", 42).await.unwrap();

        assert!(!verdict.is_correct);
        assert!(verdict.message.contains("thanks"));
        let attempts = store.attempts_for_user(42).await.unwrap();
        assert_eq!(attempts.len(), 1);
        assert!(!attempts[0].is_correct);
        assert_eq!(attempts[0].recognized_token, "thanks");
    }

    #[tokio::test]
    async fn unknown_question_is_not_found() {
        let (verifier, store) = verifier();
        let err = verifier.verify(404, "hello", 1).await.unwrap_err();
        assert!(matches!(err, SignError::NotFound(_)));
        assert_eq!(store.attempt_count(), 0);
    }

    #[tokio::test]
    async fn missing_gesture_short_circuits() {
        let (verifier, store) = verifier();
        let verdict = verifier.verify_outcome(404, None, 1).await.unwrap();
        assert_eq!(verdict, QuizVerdict::no_gesture());
        assert_eq!(store.attempt_count(), 0);
    }
}
