pub mod config;
pub mod history;
pub mod image;
pub mod models;
pub mod quiz;
pub mod recognition;
pub mod utils;
pub mod web;

// 重新导出主要类型
pub use config::Config;
pub use recognition::{PredictionOutcome, RecognitionService, ResourceGuard};
pub use utils::error::SignError;

pub type Result<T> = std::result::Result<T, SignError>;
