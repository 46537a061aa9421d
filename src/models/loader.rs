use super::{GestureClassifier, HandDetector, ModelLoader, OnnxGestureClassifier, OnnxHandDetector};
use crate::config::{Config, OnnxConfig, RecognitionConfig};
use crate::utils::error::InitError;
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::{Path, PathBuf};

/// 默认模型加载器：ONNX 关键点模型 + ONNX 分类模型
pub struct OnnxModelLoader {
    landmark_model_path: PathBuf,
    onnx_config: OnnxConfig,
    recognition_config: RecognitionConfig,
}

impl OnnxModelLoader {
    pub fn new(config: &Config) -> Self {
        Self {
            landmark_model_path: config.landmark_model_path(),
            onnx_config: config.onnx_config.clone(),
            recognition_config: config.recognition_config.clone(),
        }
    }
}

impl ModelLoader for OnnxModelLoader {
    fn load_detector(&self) -> Result<Box<dyn HandDetector>, InitError> {
        let detector = OnnxHandDetector::new(
            &self.landmark_model_path,
            &self.onnx_config,
            self.recognition_config.min_detection_confidence,
        )?;
        Ok(Box::new(detector))
    }

    fn load_classifier(&self, model_path: &Path) -> Result<Box<dyn GestureClassifier>, InitError> {
        let classifier = OnnxGestureClassifier::new(model_path, &self.onnx_config)?;
        Ok(Box::new(classifier))
    }
}

pub(crate) fn build_session(model_path: &Path, onnx_config: &OnnxConfig) -> Result<Session, InitError> {
    let level = match onnx_config.optimization_level {
        0 => GraphOptimizationLevel::Disable,
        1 => GraphOptimizationLevel::Level1,
        2 => GraphOptimizationLevel::Level2,
        _ => GraphOptimizationLevel::Level3,
    };

    let load_failure =
        |e: ort::Error| InitError::LoadFailure(format!("{}: {}", model_path.display(), e));

    Session::builder()
        .map_err(load_failure)?
        .with_optimization_level(level)
        .map_err(load_failure)?
        .with_intra_threads(onnx_config.intra_threads)
        .map_err(load_failure)?
        .commit_from_file(model_path)
        .map_err(load_failure)
}
