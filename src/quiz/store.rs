use super::{Difficulty, NewAttempt, Question, QuizAttempt};
use crate::utils::error::SignError;
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// 持久化协作方：题目查询与答题记录写入
#[async_trait]
pub trait QuizStore: Send + Sync {
    async fn find_question(&self, question_id: u64) -> Result<Option<Question>>;

    async fn list_questions(&self) -> Result<Vec<Question>>;

    /// 写入一条答题记录，返回带 id 的记录
    async fn insert_attempt(&self, attempt: NewAttempt) -> Result<QuizAttempt>;

    async fn attempts_for_user(&self, user_id: u64) -> Result<Vec<QuizAttempt>>;
}

/// 题库种子文件中的一条题目
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionSeed {
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub answer: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub category: Option<String>,
}

impl QuestionSeed {
    fn new(content: &str, answer: &str, category: &str) -> Self {
        Self {
            content: content.to_string(),
            image_url: None,
            answer: answer.to_string(),
            difficulty: Difficulty::Easy,
            category: Some(category.to_string()),
        }
    }
}

/// 默认题库
pub fn default_questions() -> Vec<QuestionSeed> {
    vec![
        QuestionSeed::new("Sign 'hello'", "hello", "greetings"),
        QuestionSeed::new("Sign the number '1'", "1", "numbers"),
        QuestionSeed::new("Sign 'thanks'", "thanks", "greetings"),
        QuestionSeed::new("Sign 'me'", "me", "pronouns"),
    ]
}

/// 进程内存储
pub struct MemoryQuizStore {
    questions: RwLock<BTreeMap<u64, Question>>,
    attempts: RwLock<Vec<QuizAttempt>>,
    next_attempt_id: AtomicU64,
}

impl MemoryQuizStore {
    pub fn new(seeds: Vec<QuestionSeed>) -> Self {
        let now = Utc::now();
        let questions = seeds
            .into_iter()
            .zip(1u64..)
            .map(|(seed, id)| {
                let question = Question {
                    id,
                    content: seed.content,
                    image_url: seed.image_url,
                    answer: seed.answer,
                    difficulty: seed.difficulty,
                    category: seed.category,
                    created_at: now,
                };
                (id, question)
            })
            .collect();

        Self {
            questions: RwLock::new(questions),
            attempts: RwLock::new(Vec::new()),
            next_attempt_id: AtomicU64::new(1),
        }
    }

    pub fn with_default_questions() -> Self {
        Self::new(default_questions())
    }

    /// 从 JSON 数组文件加载题库
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let seeds: Vec<QuestionSeed> = serde_json::from_str(&raw)?;
        if seeds.is_empty() {
            return Err(SignError::Config(format!(
                "question file {} is empty",
                path.display()
            )));
        }
        tracing::info!("Loaded {} quiz questions from {}", seeds.len(), path.display());
        Ok(Self::new(seeds))
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.read().len()
    }
}

#[async_trait]
impl QuizStore for MemoryQuizStore {
    async fn find_question(&self, question_id: u64) -> Result<Option<Question>> {
        Ok(self.questions.read().get(&question_id).cloned())
    }

    async fn list_questions(&self) -> Result<Vec<Question>> {
        Ok(self.questions.read().values().cloned().collect())
    }

    async fn insert_attempt(&self, attempt: NewAttempt) -> Result<QuizAttempt> {
        let record = QuizAttempt {
            id: self.next_attempt_id.fetch_add(1, Ordering::Relaxed),
            user_id: attempt.user_id,
            question_id: attempt.question_id,
            recognized_token: attempt.recognized_token,
            is_correct: attempt.is_correct,
            created_at: Utc::now(),
        };
        self.attempts.write().push(record.clone());
        Ok(record)
    }

    async fn attempts_for_user(&self, user_id: u64) -> Result<Vec<QuizAttempt>> {
        Ok(self
            .attempts
            .read()
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn default_questions_are_numbered_from_one() {
        let store = MemoryQuizStore::with_default_questions();
        let questions = store.list_questions().await.unwrap();
        assert_eq!(questions.len(), 4);
        assert_eq!(questions[0].id, 1);
        assert_eq!(store.find_question(3).await.unwrap().unwrap().answer, "thanks");
        assert!(store.find_question(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn attempts_are_filtered_by_user() {
        let store = MemoryQuizStore::with_default_questions();
        for user_id in [7, 8, 7] {
            store
                .insert_attempt(NewAttempt {
                    user_id,
                    question_id: 1,
                    recognized_token: "hello".into(),
                    is_correct: true,
                })
                .await
                .unwrap();
        }

        let mine = store.attempts_for_user(7).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_ne!(mine[0].id, mine[1].id);
        assert_eq!(store.attempt_count(), 3);
    }

    #[test]
    fn loads_seed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"content": "Sign 'yes'", "answer": "yes", "difficulty": "medium"}}]"#
        )
        .unwrap();

        let store = MemoryQuizStore::from_file(file.path()).unwrap();
        let question = store.questions.read().get(&1).cloned().unwrap();
        assert_eq!(question.answer, "yes");
        assert_eq!(question.difficulty, Difficulty::Medium);
    }
}
